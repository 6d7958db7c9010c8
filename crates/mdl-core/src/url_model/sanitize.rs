//! Filename sanitization for names suggested by mirrors.

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

/// Room kept free for a ` (N)` de-duplication counter and the `.part` temp suffix.
const SUFFIX_ROOM: usize = " (4294967295)".len() + ".part".len();

/// Longest extension kept intact when a long name is shortened.
const MAX_EXT: usize = 16;

/// Sanitizes a mirror-suggested filename so it cannot escape the target directory.
///
/// - Replaces NUL, `/`, `\`, control characters and `:*?"<>|` with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing whitespace, dots and underscores
/// - Shortens the stem on a char boundary so the name, a ` (N)` counter and
///   `.part` still fit in 255 bytes; the extension is kept
///
/// Inner spaces are kept; mirror names such as `clip (1080p).mp4` stay readable.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let bad = c == '\0'
            || c == '/'
            || c == '\\'
            || c.is_control()
            || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|');
        let replacement = if bad { '_' } else { c };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '_');
    shorten(trimmed, NAME_MAX - SUFFIX_ROOM)
}

fn shorten(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let ext = match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_EXT => &name[i..],
        _ => "",
    };
    let stem = &name[..name.len() - ext.len()];
    let stem = truncate_bytes(stem, max - ext.len()).trim_end();
    format!("{}{}", stem, ext)
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("a/b\\c.mp4"), "a_b_c.mp4");
    }

    #[test]
    fn keeps_inner_spaces() {
        assert_eq!(
            sanitize_filename("  my clip (1080p, h264).mp4 "),
            "my clip (1080p, h264).mp4"
        );
    }

    #[test]
    fn replaces_reserved_punctuation() {
        assert_eq!(sanitize_filename("what?: \"yes\".mp3"), "what_ _yes_.mp3");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename("file\x00\x01name.mp4"), "file_name.mp4");
    }

    #[test]
    fn long_names_truncated_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename(&long);
        assert!(out.len() + SUFFIX_ROOM <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn long_names_keep_extension() {
        let out = sanitize_filename(&format!("{}.mp4", "a".repeat(300)));
        assert!(out.ends_with(".mp4"));
        assert_eq!(out.len(), NAME_MAX - SUFFIX_ROOM);
        assert!(out[..out.len() - 4].chars().all(|c| c == 'a'));
    }

    #[test]
    fn oversized_extension_is_not_kept_whole() {
        let out = sanitize_filename(&format!("clip.{}", "x".repeat(300)));
        assert_eq!(out.len(), NAME_MAX - SUFFIX_ROOM);
        assert!(out.starts_with("clip."));
    }
}
