//! Logging setup.
//!
//! Installs a global tracing subscriber on stderr, so stdout carries only the
//! run summary. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "cdn_rewrite=debug"
    } else {
        "cdn_rewrite=info"
    }
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Initialize tracing to write to stderr.
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let stderr_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    let subscriber = Registry::default()
        .with(build_env_filter(verbose))
        .with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
