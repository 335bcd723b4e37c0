//! File name sanitization
//!
//! Turns a client-supplied name into a portable name that is safe to use as a
//! single path segment under the upload root.

use unicode_normalization::UnicodeNormalization;

/// Filesystems commonly cap a single name at 255 bytes
const MAX_NAME_LEN: usize = 255;

const RESERVED_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a file name.
///
/// Non-ASCII characters are decomposed and dropped, path separators and
/// whitespace become `_`, anything outside `[A-Za-z0-9_.-]` is removed and
/// leading or trailing `.`/`_` are stripped. The result may be empty; callers
/// decide how to reject that.
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return String::new();
    }

    let mut name = trimmed.to_string();
    let stem = name.split('.').next().unwrap_or_default();
    if RESERVED_DEVICE_NAMES
        .iter()
        .any(|device| device.eq_ignore_ascii_case(stem))
    {
        name.insert(0, '_');
    }

    // ASCII only at this point, so any byte index is a char boundary
    name.truncate(MAX_NAME_LEN);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_normal_names() {
        assert_eq!(sanitize_filename("test.py"), "test.py");
        assert_eq!(sanitize_filename("report-2024_v2.PDF"), "report-2024_v2.PDF");
    }

    #[test]
    fn test_whitespace_becomes_underscore() {
        assert_eq!(sanitize_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(sanitize_filename("tab\there \n.txt"), "tab_here_.txt");
    }

    #[test]
    fn test_strips_path_traversal() {
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("..\\..\\windows\\win.ini"), "windows_win.ini");
        assert_eq!(sanitize_filename("C:\\evil.exe"), "C_evil.exe");
    }

    #[test]
    fn test_unicode_is_folded_to_ascii() {
        assert_eq!(
            sanitize_filename("i contain cool \u{fc}ml\u{e4}uts.txt"),
            "i_contain_cool_umlauts.txt"
        );
        assert_eq!(sanitize_filename("\u{65e5}\u{672c}.txt"), "txt");
    }

    #[test]
    fn test_dot_names_collapse_to_empty() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("."), "");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("../.."), "");
        assert_eq!(sanitize_filename("\u{0}\u{1}"), "");
    }

    #[test]
    fn test_leading_dots_removed() {
        assert_eq!(sanitize_filename(".bashrc"), "bashrc");
        assert_eq!(sanitize_filename("__init__.py"), "init__.py");
    }

    #[test]
    fn test_reserved_device_names_are_prefixed() {
        assert_eq!(sanitize_filename("con.txt"), "_con.txt");
        assert_eq!(sanitize_filename("LPT1"), "_LPT1");
        assert_eq!(sanitize_filename("console.txt"), "console.txt");
    }

    #[test]
    fn test_truncates_long_names() {
        let long_name = "a".repeat(300) + ".txt";
        assert_eq!(sanitize_filename(&long_name).len(), MAX_NAME_LEN);
    }
}
