//! Small helpers shared by the model types.

/// Reduce an identifier to characters that are safe inside a single path component.
///
/// ASCII alphanumerics, `-` and `_` are kept; everything else becomes `_`.
/// An empty input maps to `"unnamed"`.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_component("proj-42_a"), "proj-42_a");
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_component("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_component("a b"), "a_b");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_component("   "), "unnamed");
    }
}
