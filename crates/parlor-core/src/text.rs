//! UTF-8-safe string truncation for log fields and previews.
//!
//! Chat text and device tokens end up in structured log fields, where a raw
//! `&s[..n]` slice panics if `n` lands inside a multi-byte character. These
//! helpers snap to the nearest char boundary so truncation is always safe.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
///
/// Returns the longest prefix of `s` whose byte length is ≤ `max_bytes`
/// and that does not split a multi-byte character. Used for token prefixes
/// in push-delivery logs.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // `floor_char_boundary` is nightly-only, so implement it ourselves.
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate `s` and append `suffix` (e.g. `"..."`) if the original exceeds
/// `max_bytes`.
///
/// The returned string is at most `max_bytes` bytes long including the
/// suffix. A string that already fits is returned unchanged. Used for
/// message-text previews in relay logs.
pub fn truncate_with_suffix(s: &str, max_bytes: usize, suffix: &str) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let body_budget = max_bytes.saturating_sub(suffix.len());
    let prefix = truncate_str(s, body_budget);
    format!("{prefix}{suffix}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── truncate_str ─────────────────────────────────────────────────────

    #[test]
    fn short_token_untouched() {
        assert_eq!(truncate_str("a1b2c3", 8), "a1b2c3");
    }

    #[test]
    fn token_prefix() {
        let token = "f0a1b2c3d4e5f60718293a4b5c6d7e8f";
        assert_eq!(truncate_str(token, 8), "f0a1b2c3");
    }

    #[test]
    fn exact_limit() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn empty_string() {
        assert_eq!(truncate_str("", 5), "");
    }

    #[test]
    fn zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn snaps_back_inside_two_byte_char() {
        // 'é' (U+00E9) is 2 bytes: c(0) a(1) f(2) é(3,4)
        let s = "café";
        assert_eq!(truncate_str(s, 4), "caf");
        assert_eq!(truncate_str(s, 5), "café");
    }

    #[test]
    fn snaps_back_inside_emoji() {
        // '👋' (U+1F44B) is 4 bytes: h(0) i(1) 👋(2..6)
        let s = "hi👋";
        assert_eq!(truncate_str(s, 3), "hi");
        assert_eq!(truncate_str(s, 5), "hi");
        assert_eq!(truncate_str(s, 6), "hi👋");
    }

    #[test]
    fn all_multibyte() {
        let s = "ありがと"; // each char is 3 bytes
        assert_eq!(truncate_str(s, 2), "");
        assert_eq!(truncate_str(s, 3), "あ");
        assert_eq!(truncate_str(s, 7), "あり");
        assert_eq!(truncate_str(s, 12), "ありがと");
    }

    // ── truncate_with_suffix ─────────────────────────────────────────────

    #[test]
    fn preview_fits() {
        assert_eq!(truncate_with_suffix("hi there", 20, "..."), "hi there");
    }

    #[test]
    fn preview_truncates_long_message() {
        assert_eq!(
            truncate_with_suffix("could you check my order status", 13, "..."),
            "could you ..."
        );
    }

    #[test]
    fn preview_respects_char_boundary() {
        // "héllo" → budget 4 lands inside 'é' (bytes 1..3), snaps to "h"
        assert_eq!(truncate_with_suffix("héllo there", 7, "..."), "héll...");
        assert_eq!(truncate_with_suffix("héllo there", 5, "..."), "h...");
    }

    #[test]
    fn suffix_longer_than_budget() {
        assert_eq!(truncate_with_suffix("hello", 2, "..."), "...");
    }

    #[test]
    fn exact_fit_keeps_original() {
        assert_eq!(truncate_with_suffix("abc", 3, "..."), "abc");
    }

    #[test]
    fn one_over_truncates() {
        assert_eq!(truncate_with_suffix("abcd", 3, "."), "ab.");
    }
}
