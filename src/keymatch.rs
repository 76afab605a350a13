//! Topic filter matching.
//!
//! Topics and filters are dot-separated segment sequences. A filter segment
//! `*` matches exactly one topic segment and `>` matches the rest of the
//! topic, including nothing at all.

/// Matches a concrete topic name against a filter pattern.
///
/// The shorter of the two sequences is treated as if padded with empty
/// segments. A filter that runs out early therefore only matches topic
/// segments that are empty, and a `*` matches a padded empty topic segment
/// just like a real one.
///
/// Total for any two strings; never allocates.
///
/// # Examples
///
/// ```
/// use attrbus::key_match;
///
/// assert!(key_match("a.b.c", "a.b.>"));
/// assert!(key_match("a.b.c", "a.*.c"));
/// assert!(!key_match("a.b.c", "a.b"));
/// assert!(!key_match("a.b.c", "a.*"));
/// ```
#[must_use]
pub fn key_match(topic: &str, filter: &str) -> bool {
    let mut topic_segs = topic.split('.');
    let mut filter_segs = filter.split('.');

    loop {
        match (filter_segs.next(), topic_segs.next()) {
            (None, None) => return true,
            (Some(">"), _) => return true,
            (Some("*"), _) => {}
            (Some(f), Some(t)) => {
                if f != t {
                    return false;
                }
            }
            // Padded topic segment: only an empty literal equals it.
            (Some(f), None) => {
                if !f.is_empty() {
                    return false;
                }
            }
            // Padded filter segment: an empty literal, so the topic segment must be empty too.
            (None, Some(t)) => {
                if !t.is_empty() {
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(key_match("a.b.c", "a.b.c"));
        assert!(!key_match("a.b.c", "a.b.d"));
        assert!(!key_match("a.b.c", "x.b.c"));
    }

    #[test]
    fn test_tail_wildcard() {
        assert!(key_match("a.b.c", "a.b.>"));
        assert!(key_match("a.b.c", "a.>"));
        assert!(key_match("a.b.c.d.e", "a.>"));
        assert!(!key_match("x.b.c", "a.>"));
    }

    #[test]
    fn test_tail_wildcard_matches_zero_remaining_segments() {
        assert!(key_match("a.b", "a.b.>"));
        assert!(key_match("a", "a.>"));
    }

    #[test]
    fn test_full_wildcard_matches_everything() {
        for topic in ["", "a", "a.b", "a.b.c", "..", "thermostat.temperature"] {
            assert!(key_match(topic, ">"), "{topic} should match >");
        }
    }

    #[test]
    fn test_single_wildcard() {
        assert!(key_match("a.b.c", "a.*.c"));
        assert!(key_match("a.b.c", "*.*.*"));
        assert!(!key_match("a.b.c", "a.*"));
        assert!(key_match("a", "*"));
    }

    #[test]
    fn test_single_wildcard_rejects_multi_segment_topics() {
        for topic in ["a.b", "a.b.c", "kitchen.light.level"] {
            assert!(!key_match(topic, "*"), "{topic} should not match *");
        }
    }

    #[test]
    fn test_missing_trailing_filter_segment_is_not_prefix_match() {
        assert!(!key_match("a.b.c", "a.b"));
        assert!(!key_match("owner1.temp", "owner1"));
    }

    #[test]
    fn test_longer_filter_does_not_match_shorter_topic() {
        assert!(!key_match("a.b", "a.b.c"));
        assert!(!key_match("bob", "bob.x"));
    }

    #[test]
    fn test_star_matches_padding_segment() {
        // Topic "a" is padded to ["a", ""]; the star consumes the empty pad.
        assert!(key_match("a", "a.*"));
        assert!(key_match("a", "a.*.*"));
        assert!(!key_match("a", "a.*.c"));
    }

    #[test]
    fn test_empty_strings_are_total() {
        assert!(key_match("", ""));
        assert!(key_match("", "*"));
        assert!(!key_match("", "a"));
        assert!(!key_match("a", ""));
        assert!(key_match("a.", "a"));
    }

    #[test]
    fn test_wildcard_tokens_in_topic_are_literals() {
        assert!(!key_match(">", "a"));
        assert!(key_match("*", "*"));
        assert!(!key_match("*", "a"));
    }
}
