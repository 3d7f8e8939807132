//! Quoted-literal rewriting of resource references.
//!
//! Artifacts are opaque text. A reference is a single- or double-quoted literal
//! on one line whose contents start with a resource prefix; it is re-emitted
//! with the CDN origin in front and its quotes untouched. Surrounding markup,
//! script or style syntax is never parsed.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use regex::{Captures, Regex};

use crate::error::RewriteError;
use crate::report::FileOutcome;
use crate::resources::ResourcePrefixSet;

/// Every character with special meaning in the `regex` crate's pattern syntax
pub const REGEX_META_CHARACTERS: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$', '#', '&', '-', '~',
];

/// Escape a resource name so it matches only itself
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if REGEX_META_CHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Result of rewriting one artifact's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub original: String,
    pub rewritten: String,
    pub replacements: u64,
}

impl RewriteOutcome {
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.original != self.rewritten
    }
}

#[derive(Debug)]
struct PrefixRule {
    prefix: String,
    pattern: Regex,
}

impl PrefixRule {
    fn new(prefix: &str) -> Result<Self, RewriteError> {
        let p = escape_literal(prefix);
        let source = format!(r#""(?P<dq>{p}[^"\r\n]*)"|'(?P<sq>{p}[^'\r\n]*)'"#);
        let pattern = Regex::new(&source).map_err(|source| RewriteError::PatternBuild {
            prefix: prefix.to_string(),
            source,
        })?;
        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }
}

/// Rewrites references to a fixed prefix set against one CDN origin
#[derive(Debug)]
pub struct Rewriter {
    cdn_prefix: String,
    rules: Vec<PrefixRule>,
}

impl Rewriter {
    /// Compile one pattern per resource prefix, in set order
    pub fn new(cdn_prefix: &str, prefixes: &ResourcePrefixSet) -> Result<Self, RewriteError> {
        let rules = prefixes
            .iter()
            .map(PrefixRule::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cdn_prefix: cdn_prefix.to_string(),
            rules,
        })
    }

    /// A literal that is already the CDN origin followed by a known prefix
    /// was produced by an earlier run and is left alone.
    fn is_already_rewritten(&self, body: &str) -> bool {
        body.strip_prefix(self.cdn_prefix.as_str())
            .is_some_and(|rest| self.rules.iter().any(|r| rest.starts_with(&r.prefix)))
    }

    /// Rewrite every quoted reference in `content`
    pub fn rewrite(&self, content: &str) -> RewriteOutcome {
        let mut current = content.to_string();
        let mut replacements = 0u64;

        for rule in &self.rules {
            let replaced = rule.pattern.replace_all(&current, |caps: &Captures<'_>| {
                let (quote, body) = match (caps.name("dq"), caps.name("sq")) {
                    (Some(m), _) => ('"', m.as_str()),
                    (None, Some(m)) => ('\'', m.as_str()),
                    (None, None) => return caps[0].to_string(),
                };

                if self.is_already_rewritten(body) {
                    return caps[0].to_string();
                }

                replacements += 1;
                format!("{quote}{}{body}{quote}", self.cdn_prefix)
            });

            let updated = match replaced {
                Cow::Borrowed(_) => None,
                Cow::Owned(text) => Some(text),
            };
            if let Some(text) = updated {
                current = text;
            }
        }

        RewriteOutcome {
            original: content.to_string(),
            rewritten: current,
            replacements,
        }
    }

    /// Read, rewrite and (only if changed) write back one artifact.
    ///
    /// Content that isn't valid UTF-8 is a binary asset: it is never written.
    pub fn rewrite_file(&self, path: &Path) -> Result<FileOutcome, RewriteError> {
        let bytes = fs::read(path).map_err(|source| RewriteError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!("Skipping binary artifact {}", path.display());
                return Ok(FileOutcome::binary(path));
            }
        };

        let outcome = self.rewrite(&content);
        let changed = outcome.is_changed();
        if changed {
            fs::write(path, outcome.rewritten.as_bytes()).map_err(|source| {
                RewriteError::WriteFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }

        Ok(FileOutcome {
            path: path.to_path_buf(),
            replacements: outcome.replacements,
            changed,
            binary: false,
        })
    }
}
