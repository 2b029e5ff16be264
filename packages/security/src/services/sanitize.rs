//! Input scrubbing for user-supplied text
//!
//! Removes a fixed denylist of substrings in a single sequential pass, then
//! trims surrounding whitespace. This is intentionally the original
//! denylist behavior, preserved for compatibility with existing callers:
//! it is NOT a robust XSS defense. Deletions are applied once, in order,
//! and are not re-applied to their own output, so overlapping or nested
//! payloads can survive (removing `<x>` from `java<x>script:` leaves
//! `javascript:` behind after the scheme pass has already run), and nothing
//! is entity-encoded. Treat the output as cleaned-up text, not as safe
//! HTML.

/// Substrings removed from user input, applied in this order.
const DENYLIST: [&str; 9] = [
    "<",
    ">",
    "\"",
    "'",
    "&",
    "javascript:",
    "vbscript:",
    "onload=",
    "onerror=",
];

/// Strip denylisted substrings from `input` and trim the result.
///
/// Empty input is returned unchanged.
pub fn sanitize_input(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut sanitized = input.to_string();
    for needle in DENYLIST {
        sanitized = sanitized.replace(needle, "");
    }
    sanitized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_tags_are_stripped() {
        let cleaned = sanitize_input("<script>alert(1)</script>");
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains('>'));
        assert_eq!(cleaned, "scriptalert(1)/script");
    }

    #[test]
    fn test_empty_input_passes_through() {
        assert_eq!(sanitize_input(""), "");
    }

    #[test]
    fn test_clean_input_is_only_trimmed() {
        assert_eq!(sanitize_input("  hello world  "), "hello world");
    }

    #[test]
    fn test_event_handlers_and_schemes_are_removed() {
        assert_eq!(sanitize_input("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_input("x onerror=alert(1)"), "x alert(1)");
    }

    #[test]
    fn test_single_pass_is_not_recursive() {
        // Documented limitation: each deletion runs once and is not
        // re-applied to its own output, so a scheme reassembled by the
        // scheme pass itself survives.
        assert_eq!(sanitize_input("javajavascript:script:x"), "javascript:x");
        // The bracket passes run before the scheme pass, so this one
        // happens to be neutralized; the defense is order-sensitive.
        assert_eq!(sanitize_input("java<>script:alert(1)"), "alert(1)");
    }
}
