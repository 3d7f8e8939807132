//! CLI configuration, config-file loading and runtime settings.

use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RewriteError;
use crate::mode::{BuildContext, DEFAULT_SSR_MANIFEST};

/// Default static resource directory
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Default build output directory
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Rewrite static asset references in build output to point at a CDN
#[derive(Parser, Debug, Default)]
#[command(name = "cdn-rewrite")]
#[command(version)]
#[command(about = "Rewrite static asset references in build output to point at a CDN")]
pub struct Cli {
    /// TOML config file (flags override its values)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CDN origin prepended to every rewritten reference
    #[arg(long)]
    pub cdn_prefix: Option<String>,

    /// Static resource directory whose top-level entries are rewritten
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Build output directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Glob patterns to exclude (comma-separated, overrides build mode)
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Option<Vec<String>>,

    /// Client build that emits an SSR manifest
    #[arg(long)]
    pub ssr_manifest: bool,

    /// File name of the SSR manifest
    #[arg(long)]
    pub manifest_name: Option<String>,

    /// Server-rendering server bundle (nothing is rewritten)
    #[arg(long)]
    pub ssr: bool,

    /// Skip rewriting entirely
    #[arg(long)]
    pub disable: bool,

    /// Number of parallel workers (0 = all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options read from a TOML config file
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    pub enabled: Option<bool>,
    pub cdn_prefix: Option<String>,
    pub static_resource_directory: Option<PathBuf>,
    pub ignore: Option<Vec<String>>,
    pub out_dir: Option<PathBuf>,
    pub ssr_manifest: Option<bool>,
    pub manifest_name: Option<String>,
    pub ssr: Option<bool>,
    pub jobs: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let content = fs::read_to_string(path).map_err(|source| RewriteError::ConfigFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse TOML content; `path` is only used for error reporting
    pub fn parse(content: &str, path: &Path) -> Result<Self, RewriteError> {
        toml::from_str(content).map_err(|source| RewriteError::ConfigFileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A CDN origin that looks like a URL: `http://`, `https://` or `//`, with a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnPrefix(String);

impl CdnPrefix {
    pub fn validated(s: &str) -> Result<Self, RewriteError> {
        if Self::validate_format(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(RewriteError::InvalidCdnPrefix {
                value: s.to_string(),
            })
        }
    }

    fn validate_format(s: &str) -> bool {
        if s.chars().any(char::is_whitespace) {
            return false;
        }
        let lower = s.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))
            .or_else(|| lower.strip_prefix("//"));

        match rest {
            Some(rest) => rest.split('/').next().is_some_and(|host| !host.is_empty()),
            None => false,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CdnPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute, normalized form of a directory; joined onto the working directory
/// when it doesn't exist yet
fn resolve_dir(path: PathBuf) -> PathBuf {
    match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) if path.is_relative() => std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path),
        Err(_) => path,
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// CDN origin
    pub cdn_prefix: CdnPrefix,
    /// Static resource root
    pub static_dir: PathBuf,
    /// Build output directory (absolute)
    pub out_dir: PathBuf,
    /// Explicit exclusion patterns
    pub ignore: Option<Vec<String>>,
    /// Client build with SSR manifest
    pub ssr_manifest: bool,
    /// SSR manifest file name
    pub manifest_name: String,
    /// SSR server bundle
    pub ssr: bool,
    /// Worker count; 1 runs sequentially
    pub jobs: usize,
    /// Enable verbose output
    pub verbose: bool,
}

impl Config {
    /// Create Config from CLI arguments, merging the config file if one is given.
    ///
    /// Returns `Ok(None)` when rewriting is disabled; nothing else is validated then.
    pub fn from_cli(cli: Cli) -> Result<Option<Self>, RewriteError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Flags take precedence over file values
    pub fn merge(cli: Cli, file: FileConfig) -> Result<Option<Self>, RewriteError> {
        let enabled = !cli.disable && file.enabled.unwrap_or(true);
        if !enabled {
            return Ok(None);
        }

        let raw_prefix = cli
            .cdn_prefix
            .or(file.cdn_prefix)
            .ok_or(RewriteError::MissingCdnPrefix)?;
        let cdn_prefix = CdnPrefix::validated(&raw_prefix)?;

        let static_dir = cli
            .static_dir
            .or(file.static_resource_directory)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        let static_dir = resolve_dir(static_dir);

        let out_dir = cli
            .out_dir
            .or(file.out_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let out_dir = resolve_dir(out_dir);

        let jobs = match cli.jobs.or(file.jobs).unwrap_or(1) {
            0 => num_cpus::get(),
            n => n,
        };

        Ok(Some(Config {
            cdn_prefix,
            static_dir,
            out_dir,
            ignore: cli.ignore.or(file.ignore),
            ssr_manifest: cli.ssr_manifest || file.ssr_manifest.unwrap_or(false),
            manifest_name: cli
                .manifest_name
                .or(file.manifest_name)
                .unwrap_or_else(|| DEFAULT_SSR_MANIFEST.to_string()),
            ssr: cli.ssr || file.ssr.unwrap_or(false),
            jobs,
            verbose: cli.verbose,
        }))
    }

    /// Build metadata for mode resolution
    pub fn build_context(&self) -> BuildContext {
        BuildContext {
            out_dir: self.out_dir.clone(),
            ssr_manifest: self.ssr_manifest,
            manifest_name: self.manifest_name.clone(),
            ssr: self.ssr,
            ignore: self.ignore.clone(),
        }
    }
}
