//! Output path derivation for secured containers

use std::path::{Path, PathBuf};

/// Default extension of secured containers, without the leading dot.
pub const SECURED_EXTENSION: &str = "ssf";

/// Extension separator prepended to user-supplied extensions that lack one.
const EXTENSION_SEPARATOR: char = '.';

/// Path of the container produced by encrypting `input`: the last
/// extension (if any) is replaced by `secured_ext`.
///
/// `report.pdf` becomes `report.ssf`, `archive.tar.gz` becomes
/// `archive.tar.ssf`.
pub fn secured_path(input: &Path, secured_ext: &str) -> PathBuf {
    input.with_extension(strip_separator(secured_ext))
}

/// Path of the plaintext recovered from `container`: its extension is
/// replaced by `requested_ext`.
///
/// The requested extension may be given with or without the leading dot.
/// An empty requested extension yields the container path with its
/// extension removed.
pub fn plaintext_path(container: &Path, requested_ext: &str) -> PathBuf {
    container.with_extension(strip_separator(requested_ext.trim()))
}

/// Whether `path` carries the secured container extension.
pub fn has_secured_extension(path: &Path, secured_ext: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext == strip_separator(secured_ext))
}

/// Ensure a non-empty extension starts with the separator, as entered
/// extensions like `txt` and `.txt` mean the same thing.
pub fn normalize_extension(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with(EXTENSION_SEPARATOR) {
        raw.to_string()
    } else {
        format!("{}{}", EXTENSION_SEPARATOR, raw)
    }
}

fn strip_separator(ext: &str) -> &str {
    ext.strip_prefix(EXTENSION_SEPARATOR).unwrap_or(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secured_path_replaces_extension() {
        assert_eq!(
            secured_path(Path::new("report.pdf"), SECURED_EXTENSION),
            PathBuf::from("report.ssf")
        );
        assert_eq!(
            secured_path(Path::new("dir/archive.tar.gz"), SECURED_EXTENSION),
            PathBuf::from("dir/archive.tar.ssf")
        );
    }

    #[test]
    fn test_secured_path_without_extension() {
        assert_eq!(
            secured_path(Path::new("notes"), SECURED_EXTENSION),
            PathBuf::from("notes.ssf")
        );
    }

    #[test]
    fn test_secured_path_custom_extension() {
        assert_eq!(
            secured_path(Path::new("report.pdf"), ".locked"),
            PathBuf::from("report.locked")
        );
    }

    #[test]
    fn test_plaintext_path() {
        assert_eq!(
            plaintext_path(Path::new("report.ssf"), "txt"),
            PathBuf::from("report.txt")
        );
        assert_eq!(
            plaintext_path(Path::new("report.ssf"), ".txt"),
            PathBuf::from("report.txt")
        );
        assert_eq!(
            plaintext_path(Path::new("report.ssf"), ""),
            PathBuf::from("report")
        );
    }

    #[test]
    fn test_has_secured_extension() {
        assert!(has_secured_extension(Path::new("report.ssf"), SECURED_EXTENSION));
        assert!(has_secured_extension(Path::new("a/b/report.ssf"), ".ssf"));
        assert!(!has_secured_extension(Path::new("report.txt"), SECURED_EXTENSION));
        assert!(!has_secured_extension(Path::new("report"), SECURED_EXTENSION));
        assert!(!has_secured_extension(Path::new("report.ssf.bak"), SECURED_EXTENSION));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("txt"), ".txt");
        assert_eq!(normalize_extension(".txt"), ".txt");
        assert_eq!(normalize_extension("  pdf "), ".pdf");
        assert_eq!(normalize_extension(""), "");
    }
}
