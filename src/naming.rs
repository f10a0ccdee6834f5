//! Entry and archive naming rules.
//!
//! Entry names inside the archive always use `/` as the separator and never
//! contain characters that common filesystems reject on extraction.

use std::time::{SystemTime, UNIX_EPOCH};

/// Default cap on entry name length, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Characters rejected by at least one mainstream filesystem.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

fn is_forbidden(c: char) -> bool {
    (c as u32) < 0x20 || RESERVED_CHARS.contains(&c)
}

/// Replace `\` with `/` and collapse runs of `/`.
fn unify_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Make `name` safe to use as an entry name.
///
/// Control characters and reserved characters become `_`, separators are
/// unified, and the result is cut to [`MAX_NAME_LEN`] characters.
pub fn sanitize_entry_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    unify_separators(&replaced)
        .chars()
        .take(MAX_NAME_LEN)
        .collect()
}

/// Unify separators, drop `.` and `..` segments, and strip leading and
/// trailing `/`.
pub fn normalize_path(path: &str) -> String {
    unify_separators(path)
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

/// Name of the directory entry for `path`, which always ends in `/`.
///
/// Returns `None` when nothing is left after normalization.
pub fn directory_entry_name(path: &str) -> Option<String> {
    let normalized = normalize_path(path);
    if normalized.is_empty() {
        None
    } else {
        Some(format!("{}/", normalized))
    }
}

/// Check an entry name against the naming rules.
///
/// Returns the reason the name is rejected, if any.
pub fn validate_entry_name(name: &str, max_len: usize) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Filename cannot be empty".to_string());
    }
    if name.chars().count() > max_len {
        return Err(format!("Filename exceeds maximum length: {}", max_len));
    }
    if name.chars().any(is_forbidden) {
        return Err("Filename contains dangerous characters".to_string());
    }
    Ok(())
}

/// Default download name: `download_<unix millis>.zip`.
pub fn archive_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("download_{}.zip", millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_sanitize_replaces_forbidden() {
        assert_eq!(sanitize_entry_name("a<b>c:d\"e|f?g*h.jpg"), "a_b_c_d_e_f_g_h.jpg");
        assert_eq!(sanitize_entry_name("tab\there\u{0}.png"), "tab_here_.png");
    }

    #[test]
    fn test_sanitize_separators() {
        assert_eq!(sanitize_entry_name("user\\\\media//clip.mp4"), "user/media/clip.mp4");
    }

    #[test]
    fn test_sanitize_keeps_unicode_and_truncates() {
        assert_eq!(sanitize_entry_name("한글파일.txt"), "한글파일.txt");
        let long = "é".repeat(300);
        assert_eq!(sanitize_entry_name(&long).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/photos//2024/"), "photos/2024");
        assert_eq!(normalize_path("\\videos\\"), "videos");
        assert_eq!(normalize_path("///"), "");
    }

    #[test]
    fn test_normalize_drops_relative_segments() {
        assert_eq!(normalize_path("../x"), "x");
        assert_eq!(normalize_path("./a/../b/./c"), "a/b/c");
        assert_eq!(normalize_path(".."), "");
        assert_eq!(directory_entry_name("../x").as_deref(), Some("x/"));
        assert_eq!(directory_entry_name("..\\.."), None);
    }

    #[test]
    fn test_directory_entry_name() {
        assert_eq!(directory_entry_name("photos").as_deref(), Some("photos/"));
        assert_eq!(directory_entry_name("a\\b/").as_deref(), Some("a/b/"));
        assert_eq!(directory_entry_name("/"), None);
    }

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("photo.jpg", MAX_NAME_LEN).is_ok());
        assert!(validate_entry_name("   ", MAX_NAME_LEN).is_err());
        assert!(validate_entry_name("what?.jpg", MAX_NAME_LEN).is_err());
        assert!(validate_entry_name("bell\u{7}.jpg", MAX_NAME_LEN).is_err());
        assert!(validate_entry_name("abcdef", 5).is_err());
    }

    #[test]
    fn test_archive_file_name() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(archive_file_name(now), "download_1700000000123.zip");
    }
}
