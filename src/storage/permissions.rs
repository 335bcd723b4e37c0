//! Extension policy
//!
//! Optional allow-list of file extensions accepted for upload.

use std::collections::HashSet;

/// Allow-list of extensions, each stored lower-cased with its leading dot.
/// `None` accepts every name.
#[derive(Debug, Clone, Default)]
pub struct ExtensionPolicy {
    allowed: Option<HashSet<String>>,
}

impl ExtensionPolicy {
    /// Policy that accepts every name
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build a policy from extension strings such as `.png` or `PNG`.
    ///
    /// Blank entries are ignored; if nothing remains the policy allows all.
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();

        Self {
            allowed: (!allowed.is_empty()).then_some(allowed),
        }
    }

    /// Parse a comma-separated list, e.g. `".png, .jpg"`
    pub fn parse(list: &str) -> Self {
        Self::from_extensions(list.split(','))
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    /// Check whether a (sanitized) file name may be stored
    pub fn is_allowed(&self, file_name: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.contains(&extension_of(file_name)),
        }
    }
}

fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().to_lowercase();
    match ext.as_str() {
        "" | "." => None,
        e if e.starts_with('.') => Some(ext),
        _ => Some(format!(".{}", ext)),
    }
}

/// Lower-cased extension including the dot, or an empty string.
/// A leading dot alone does not start an extension.
fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[idx..].to_lowercase(),
        _ => String::new(),
    }
}
