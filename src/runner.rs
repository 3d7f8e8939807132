//! Rewrite run orchestration.
//!
//! Resolves inputs once (prefix set, build mode, exclusion), scans the output
//! directory and rewrites each artifact, either sequentially or on the rayon
//! pool. Per-file counts are reduced into a [`RunSummary`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::config::Config;
use crate::error::RewriteError;
use crate::mode::{BuildMode, ExclusionRule};
use crate::report::{FileOutcome, RunSummary};
use crate::resources::index_static_root;
use crate::rewriter::Rewriter;
use crate::scanner::{scan_artifacts, ExclusionMatcher};

/// Run the rewrite over the configured output directory.
///
/// Configuration problems (static root, ignore patterns) surface before the
/// output directory is even scanned. The first per-file I/O error aborts the
/// run; files already rewritten stay rewritten.
pub fn run(config: &Config, progress: Option<&ProgressBar>) -> Result<RunSummary, RewriteError> {
    let ctx = config.build_context();
    let mode = BuildMode::resolve(&ctx);
    let rule = ExclusionRule::resolve(&ctx);

    let prefixes = index_static_root(&config.static_dir)?;
    let exclusion = ExclusionMatcher::compile(&rule)?;
    let rewriter = Rewriter::new(config.cdn_prefix.as_str(), &prefixes)?;

    let start = Instant::now();
    let artifacts = scan_artifacts(&ctx.out_dir, &exclusion)?;

    tracing::info!(
        "Rewriting {} artifact(s) in {} ({} build, {} prefix(es))",
        artifacts.len(),
        ctx.out_dir.display(),
        mode.as_str(),
        prefixes.len()
    );

    if let Some(pb) = progress {
        pb.set_length(artifacts.len() as u64);
    }

    let summary = if config.jobs > 1 {
        rewrite_parallel(&rewriter, &artifacts, &ctx.out_dir, progress)?
    } else {
        rewrite_sequential(&rewriter, &artifacts, &ctx.out_dir, progress)?
    };

    Ok(summary.finish(start.elapsed()))
}

/// Rewrite one artifact and log it when it changed
fn process_artifact(
    rewriter: &Rewriter,
    path: &Path,
    out_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<FileOutcome, RewriteError> {
    let outcome = rewriter.rewrite_file(path)?;

    if outcome.changed {
        let relative = path.strip_prefix(out_dir).unwrap_or(path);
        tracing::info!(
            "Updated: {} ({} replacement(s))",
            relative.display(),
            outcome.replacements
        );
    }
    if let Some(pb) = progress {
        pb.inc(1);
    }

    Ok(outcome)
}

/// One file at a time, in scan order
pub fn rewrite_sequential(
    rewriter: &Rewriter,
    artifacts: &[PathBuf],
    out_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<RunSummary, RewriteError> {
    let mut summary = RunSummary::new();
    for path in artifacts {
        let outcome = process_artifact(rewriter, path, out_dir, progress)?;
        summary.record(&outcome);
    }
    Ok(summary)
}

/// Files are independent; each read-transform-write stays inside one task and
/// partial summaries are merged once every task has finished
pub fn rewrite_parallel(
    rewriter: &Rewriter,
    artifacts: &[PathBuf],
    out_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<RunSummary, RewriteError> {
    artifacts
        .par_iter()
        .map(|path| process_artifact(rewriter, path, out_dir, progress))
        .try_fold(RunSummary::new, |mut summary, outcome| {
            summary.record(&outcome?);
            Ok(summary)
        })
        .try_reduce(RunSummary::new, |a, b| Ok(a.merge(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CdnPrefix;
    use crate::mode::DEFAULT_SSR_MANIFEST;
    use std::fs;
    use tempfile::TempDir;

    const CDN: &str = "https://cdn.example.com";

    /// Project with public/{logo.png,images/} and a small dist/ tree
    struct Fixture {
        _temp: TempDir,
        static_dir: PathBuf,
        out_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let static_dir = temp.path().join("public");
            let out_dir = temp.path().join("dist");

            fs::create_dir_all(static_dir.join("images")).unwrap();
            fs::write(static_dir.join("logo.png"), b"png").unwrap();
            fs::write(static_dir.join("images").join("hero.jpg"), b"jpg").unwrap();

            fs::create_dir_all(out_dir.join("assets")).unwrap();
            fs::write(
                out_dir.join("index.html"),
                r#"<img src="/logo.png"><img src='/images/hero.jpg'>"#,
            )
            .unwrap();
            fs::write(
                out_dir.join("assets").join("app.js"),
                r#"const logo="/logo.png";fetch("/api/data");"#,
            )
            .unwrap();
            fs::write(
                out_dir.join("assets").join("app.js.map"),
                r#"{"sources":["/logo.png"]}"#,
            )
            .unwrap();
            fs::write(out_dir.join("robots.txt"), "User-agent: *").unwrap();
            fs::write(
                out_dir.join("ssr-manifest.json"),
                r#"{"src/App.vue":["/logo.png"]}"#,
            )
            .unwrap();

            Self {
                _temp: temp,
                static_dir,
                out_dir,
            }
        }

        fn config(&self) -> Config {
            Config {
                cdn_prefix: CdnPrefix::validated(CDN).unwrap(),
                static_dir: self.static_dir.clone(),
                out_dir: self.out_dir.clone(),
                ignore: None,
                ssr_manifest: false,
                manifest_name: DEFAULT_SSR_MANIFEST.to_string(),
                ssr: false,
                jobs: 1,
                verbose: false,
            }
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.out_dir.join(rel)).unwrap()
        }

        fn snapshot(&self) -> Vec<(String, String)> {
            ["index.html", "assets/app.js", "assets/app.js.map", "robots.txt", "ssr-manifest.json"]
                .iter()
                .map(|rel| (rel.to_string(), self.read(rel)))
                .collect()
        }
    }

    // ==================== default build tests ====================

    #[test]
    fn test_run_default_build() {
        let fx = Fixture::new();
        let summary = run(&fx.config(), None).unwrap();

        assert_eq!(
            fx.read("index.html"),
            r#"<img src="https://cdn.example.com/logo.png"><img src='https://cdn.example.com/images/hero.jpg'>"#
        );
        assert_eq!(
            fx.read("assets/app.js"),
            r#"const logo="https://cdn.example.com/logo.png";fetch("/api/data");"#
        );
        assert_eq!(fx.read("robots.txt"), "User-agent: *");

        assert_eq!(summary.files_scanned, 5);
        assert_eq!(summary.files_changed, 4);
        assert_eq!(summary.replacements, 5);
    }

    #[test]
    fn test_run_second_time_is_noop() {
        let fx = Fixture::new();
        run(&fx.config(), None).unwrap();
        let after_first = fx.snapshot();

        let summary = run(&fx.config(), None).unwrap();

        assert_eq!(fx.snapshot(), after_first);
        assert_eq!(summary.files_changed, 0);
        assert_eq!(summary.replacements, 0);
    }

    #[test]
    fn test_run_unmatched_file_not_written() {
        let fx = Fixture::new();
        let robots = fx.out_dir.join("robots.txt");
        let before = fs::metadata(&robots).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        run(&fx.config(), None).unwrap();

        assert_eq!(fs::metadata(&robots).unwrap().modified().unwrap(), before);
    }

    // ==================== build mode tests ====================

    #[test]
    fn test_run_server_bundle_touches_nothing() {
        let fx = Fixture::new();
        let before = fx.snapshot();
        let config = Config {
            ssr: true,
            ..fx.config()
        };

        let summary = run(&config, None).unwrap();

        assert_eq!(fx.snapshot(), before);
        assert_eq!(summary.files_scanned, 0);
        assert_eq!(summary.files_changed, 0);
    }

    #[test]
    fn test_run_client_with_manifest_skips_manifest_only() {
        let fx = Fixture::new();
        let config = Config {
            ssr_manifest: true,
            ..fx.config()
        };

        let summary = run(&config, None).unwrap();

        assert_eq!(fx.read("ssr-manifest.json"), r#"{"src/App.vue":["/logo.png"]}"#);
        assert!(fx.read("assets/app.js.map").contains(CDN));
        assert_eq!(summary.files_scanned, 4);
        assert_eq!(summary.files_changed, 3);
    }

    #[test]
    fn test_run_explicit_ignore_excludes_source_maps() {
        let fx = Fixture::new();
        let config = Config {
            ignore: Some(vec!["**/*.map".to_string()]),
            ..fx.config()
        };

        run(&config, None).unwrap();

        assert_eq!(fx.read("assets/app.js.map"), r#"{"sources":["/logo.png"]}"#);
        assert!(fx.read("ssr-manifest.json").contains(CDN));
        assert!(fx.read("index.html").contains(CDN));
    }

    // ==================== parallel tests ====================

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Fixture::new();
        let parallel = Fixture::new();

        let seq_summary = run(&sequential.config(), None).unwrap();
        let par_summary = run(
            &Config {
                jobs: 4,
                ..parallel.config()
            },
            None,
        )
        .unwrap();

        assert_eq!(sequential.snapshot(), parallel.snapshot());
        assert_eq!(seq_summary.files_scanned, par_summary.files_scanned);
        assert_eq!(seq_summary.files_changed, par_summary.files_changed);
        assert_eq!(seq_summary.replacements, par_summary.replacements);
    }

    #[test]
    fn test_progress_bar_tracks_files() {
        let fx = Fixture::new();
        let pb = ProgressBar::hidden();

        run(&fx.config(), Some(&pb)).unwrap();

        assert_eq!(pb.length(), Some(5));
        assert_eq!(pb.position(), 5);
    }

    // ==================== failure tests ====================

    #[test]
    fn test_run_missing_static_dir_touches_nothing() {
        let fx = Fixture::new();
        let before = fx.snapshot();
        let config = Config {
            static_dir: fx.static_dir.join("missing"),
            ..fx.config()
        };

        let err = run(&config, None).unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(fx.snapshot(), before);
    }

    #[test]
    fn test_run_invalid_ignore_touches_nothing() {
        let fx = Fixture::new();
        let before = fx.snapshot();
        let config = Config {
            ignore: Some(vec!["[".to_string()]),
            ..fx.config()
        };

        let err = run(&config, None).unwrap_err();

        assert!(matches!(err, RewriteError::InvalidIgnorePattern { .. }));
        assert_eq!(fx.snapshot(), before);
    }

    #[test]
    fn test_run_missing_out_dir() {
        let fx = Fixture::new();
        let config = Config {
            out_dir: fx.out_dir.join("never-built"),
            ..fx.config()
        };

        let err = run(&config, None).unwrap_err();
        assert!(matches!(err, RewriteError::OutDirMissing { .. }));
    }

    #[test]
    fn test_io_error_aborts_remaining_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        for name in ["a.js", "b.js", "c.js"] {
            fs::write(out.join(name), r#"img("/logo.png")"#).unwrap();
        }

        let artifacts = scan_artifacts(&out, &ExclusionMatcher::Nothing).unwrap();
        assert_eq!(artifacts.len(), 3);

        // b.js turns into a directory after the scan, so reading it fails
        fs::remove_file(out.join("b.js")).unwrap();
        fs::create_dir(out.join("b.js")).unwrap();

        let prefixes = crate::resources::ResourcePrefixSet::from_names(["logo.png"]);
        let rewriter = Rewriter::new(CDN, &prefixes).unwrap();
        let err = rewrite_sequential(&rewriter, &artifacts, &out, None).unwrap_err();

        assert!(matches!(err, RewriteError::ReadFailed { ref path, .. } if path.ends_with("b.js")));
        assert_eq!(
            fs::read_to_string(out.join("a.js")).unwrap(),
            r#"img("https://cdn.example.com/logo.png")"#
        );
        assert!(out.join("b.js").is_dir());
        assert_eq!(
            fs::read_to_string(out.join("c.js")).unwrap(),
            r#"img("/logo.png")"#
        );
    }
}
