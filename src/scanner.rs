use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::RewriteError;
use crate::mode::ExclusionRule;

/// Compiled form of an [`ExclusionRule`]
#[derive(Debug)]
pub enum ExclusionMatcher {
    Nothing,
    Everything,
    Globs {
        /// Plain patterns: a match excludes the file
        excluded: GlobSet,
        /// `!pattern`: anything *not* matching is excluded
        negated: Vec<GlobMatcher>,
    },
}

/// `*` and `?` stop at `/`; only `**` crosses directories
fn build_glob(pattern: &str) -> Result<Glob, RewriteError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| RewriteError::InvalidIgnorePattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

impl ExclusionMatcher {
    /// Compile the rule.
    ///
    /// Patterns are glob patterns matched against the path relative to the
    /// output directory: `*.map` matches top-level source maps only,
    /// `**/*.map` matches them at any depth and `assets/**` covers everything
    /// below `assets`. A leading `!` inverts a pattern, so `!keep.json`
    /// excludes every file except `keep.json`. An invalid pattern is rejected
    /// here, before anything is walked.
    pub fn compile(rule: &ExclusionRule) -> Result<Self, RewriteError> {
        let patterns = match rule {
            ExclusionRule::Nothing => return Ok(ExclusionMatcher::Nothing),
            ExclusionRule::Everything => return Ok(ExclusionMatcher::Everything),
            ExclusionRule::Patterns(patterns) => patterns,
        };

        let mut excluded = GlobSetBuilder::new();
        let mut negated = Vec::new();
        for pattern in patterns {
            if pattern.trim().is_empty() {
                continue;
            }

            let body = pattern.trim_start_matches('!');
            let bangs = pattern.len() - body.len();
            let glob = build_glob(body)?;
            if bangs % 2 == 1 {
                negated.push(glob.compile_matcher());
            } else {
                excluded.add(glob);
            }
        }

        let excluded = excluded
            .build()
            .map_err(|e| RewriteError::InvalidIgnorePattern {
                pattern: patterns.join(", "),
                message: e.kind().to_string(),
            })?;

        Ok(ExclusionMatcher::Globs { excluded, negated })
    }

    /// Check a file path relative to the output directory
    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        match self {
            ExclusionMatcher::Nothing => false,
            ExclusionMatcher::Everything => true,
            ExclusionMatcher::Globs { excluded, negated } => {
                excluded.is_match(rel_path) || negated.iter().any(|g| !g.is_match(rel_path))
            }
        }
    }
}

/// Enumerate every non-directory file under `out_dir`, dot-files included.
///
/// Directory symlinks are not followed; a symlink resolving to a regular file is
/// kept. Entries come back sorted by file name at each level, so the list is
/// stable between runs over the same tree.
pub fn scan_artifacts(
    out_dir: &Path,
    exclusion: &ExclusionMatcher,
) -> Result<Vec<PathBuf>, RewriteError> {
    if !out_dir.is_dir() {
        return Err(RewriteError::OutDirMissing {
            path: out_dir.to_path_buf(),
        });
    }

    if let ExclusionMatcher::Everything = exclusion {
        tracing::debug!("All artifacts excluded for this build");
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();

    for entry in WalkDir::new(out_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| RewriteError::ScanFailed {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        // Symlinks count only when they resolve to a regular file
        if file_type.is_symlink() && !entry.path().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(out_dir).unwrap_or(path);
        if exclusion.is_excluded(relative) {
            tracing::debug!("Excluded {}", relative.display());
            continue;
        }

        artifacts.push(path.to_path_buf());
    }

    Ok(artifacts)
}
