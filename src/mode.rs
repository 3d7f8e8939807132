//! Build mode resolution and the artifact exclusion rule derived from it.
//!
//! Only artifacts served to a browser may point at the CDN. Server bundles keep
//! their local paths, and the SSR manifest is metadata rather than a reference
//! carrier.

use std::path::PathBuf;

/// Default file name of the SSR manifest emitted by client builds
pub const DEFAULT_SSR_MANIFEST: &str = "ssr-manifest.json";

/// Build output metadata delivered by the host pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Resolved output directory (absolute, normalized)
    pub out_dir: PathBuf,
    /// Client build that also emits an SSR manifest
    pub ssr_manifest: bool,
    /// File name of that manifest
    pub manifest_name: String,
    /// Server-rendering server bundle
    pub ssr: bool,
    /// Explicit exclusion patterns; overrides both mode signals
    pub ignore: Option<Vec<String>>,
}

/// Classification of the current build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Plain static/client build
    DefaultBuild,
    /// Client build emitting an SSR manifest
    ClientWithManifest { manifest: String },
    /// Server-rendering server bundle
    ServerBundle,
}

impl BuildMode {
    /// Manifest signal is checked before the server-bundle signal; first match wins.
    pub fn resolve(ctx: &BuildContext) -> Self {
        if ctx.ssr_manifest {
            BuildMode::ClientWithManifest {
                manifest: ctx.manifest_name.clone(),
            }
        } else if ctx.ssr {
            BuildMode::ServerBundle
        } else {
            BuildMode::DefaultBuild
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::DefaultBuild => "default",
            BuildMode::ClientWithManifest { .. } => "client+ssr-manifest",
            BuildMode::ServerBundle => "ssr-server",
        }
    }
}

/// Which artifacts are kept out of rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionRule {
    /// Nothing is excluded
    Nothing,
    /// Every artifact is excluded
    Everything,
    /// Glob patterns relative to the output directory
    Patterns(Vec<String>),
}

impl ExclusionRule {
    /// Explicit patterns win; otherwise the rule follows the build mode.
    pub fn resolve(ctx: &BuildContext) -> Self {
        if let Some(patterns) = &ctx.ignore {
            return ExclusionRule::Patterns(patterns.clone());
        }

        match BuildMode::resolve(ctx) {
            BuildMode::ClientWithManifest { manifest } => {
                ExclusionRule::Patterns(vec![format!("**/{manifest}")])
            }
            BuildMode::ServerBundle => ExclusionRule::Everything,
            BuildMode::DefaultBuild => ExclusionRule::Nothing,
        }
    }
}
