use std::path::PathBuf;
use thiserror::Error;

/// Rewrite error types
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("cdnPrefix is required")]
    MissingCdnPrefix,

    #[error("cdnPrefix must be a url (http://, https:// or //), got '{value}'")]
    InvalidCdnPrefix { value: String },

    #[error("Static resource directory not found: {path}")]
    StaticRootMissing { path: PathBuf },

    #[error("Static resource path is not a directory: {path}")]
    StaticRootNotDirectory { path: PathBuf },

    #[error("Failed to read static resource directory: {path}")]
    StaticRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidIgnorePattern { pattern: String, message: String },

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {path}")]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Output directory not found: {path} (did the build run?)")]
    OutDirMissing { path: PathBuf },

    #[error("Failed to scan output directory: {path}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build pattern for resource prefix '{prefix}'")]
    PatternBuild {
        prefix: String,
        #[source]
        source: regex::Error,
    },
}

impl RewriteError {
    /// True for errors raised while validating configuration, before any artifact is read.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RewriteError::MissingCdnPrefix
                | RewriteError::InvalidCdnPrefix { .. }
                | RewriteError::StaticRootMissing { .. }
                | RewriteError::StaticRootNotDirectory { .. }
                | RewriteError::StaticRootUnreadable { .. }
                | RewriteError::InvalidIgnorePattern { .. }
                | RewriteError::ConfigFileRead { .. }
                | RewriteError::ConfigFileParse { .. }
        )
    }
}
