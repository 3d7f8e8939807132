//! Resource prefix indexing for the static-asset root.

use std::fs;
use std::path::Path;

use crate::error::RewriteError;

/// Top-level resource prefixes eligible for CDN rewriting.
///
/// Each entry is `/` followed by the name of one immediate child of the static root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePrefixSet(Vec<String>);

impl ResourcePrefixSet {
    /// Build a set from entry names (without the leading `/`)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| format!("/{}", name.as_ref()))
                .collect(),
        )
    }

    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Index the immediate children (files and directories) of the static root.
///
/// Not recursive. Entries are sorted by name. Names that are not valid UTF-8
/// can't be referenced from a text artifact and are skipped.
pub fn index_static_root(static_root: &Path) -> Result<ResourcePrefixSet, RewriteError> {
    if !static_root.exists() {
        return Err(RewriteError::StaticRootMissing {
            path: static_root.to_path_buf(),
        });
    }
    if !static_root.is_dir() {
        return Err(RewriteError::StaticRootNotDirectory {
            path: static_root.to_path_buf(),
        });
    }

    let unreadable = |source| RewriteError::StaticRootUnreadable {
        path: static_root.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(static_root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                tracing::warn!("Skipping non UTF-8 static entry {:?}", raw);
            }
        }
    }
    names.sort();

    let prefixes = ResourcePrefixSet::from_names(names);
    tracing::debug!(
        "Indexed {} resource prefix(es) from {}",
        prefixes.len(),
        static_root.display()
    );
    Ok(prefixes)
}
