//! # CDN Rewrite
//!
//! Post-processes a built web bundle so its static assets load from a CDN.
//!
//! Every top-level entry of the static resource directory becomes a resource
//! prefix (`public/logo.png` → `/logo.png`). Quoted literals in the build
//! output that start with one of those prefixes get the CDN origin in front.
//! Artifacts are treated as opaque text; nothing is parsed.
//!
//! ## Features
//!
//! - Build-mode aware exclusion (SSR manifest, SSR server bundle, explicit globs)
//! - Quote-preserving, idempotent rewriting
//! - Files are only written when their content changes
//! - Optional parallel processing using Rayon
//!
//! ## Usage
//!
//! ```ignore
//! use cdn_rewrite::resources::index_static_root;
//! use cdn_rewrite::rewriter::Rewriter;
//!
//! let prefixes = index_static_root(Path::new("public"))?;
//! let rewriter = Rewriter::new("https://cdn.example.com", &prefixes)?;
//! let outcome = rewriter.rewrite(r#"<img src="/logo.png">"#);
//! ```

/// CLI configuration, config file and validation
pub mod config;

/// Error types for rewrite operations
pub mod error;

/// Tracing subscriber setup
pub mod logging;

/// Build mode and exclusion rule resolution
pub mod mode;

/// Run summary accounting
pub mod report;

/// Resource prefix indexing
pub mod resources;

/// Quoted-literal rewriting
pub mod rewriter;

/// Run orchestration
pub mod runner;

/// Output directory scanning
pub mod scanner;
