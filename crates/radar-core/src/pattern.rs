//! Wildcard matching for target names and area names.
//!
//! `*` matches any run of characters (including none), `?` matches exactly one
//! character. Matching is anchored at both ends and ignores ASCII case.

/// True when `text` matches the wildcard `pattern`.
pub fn matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut p, mut t) = (0usize, 0usize);
    // Position of the last `*` seen and the text index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, absorbed)) = backtrack {
            p = star + 1;
            t = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns_are_anchored() {
        assert!(matches("Metadata/Chest", "Metadata/Chest"));
        assert!(!matches("Metadata/Chest", "Metadata/ChestLarge"));
        assert!(!matches("Chest", "Metadata/Chest"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(matches("*Chest*", "Metadata/ChestLarge"));
        assert!(matches("Metadata/*", "Metadata/"));
        assert!(matches("*", ""));
        assert!(matches("a*b*c", "axxbyyc"));
        assert!(!matches("a*b*c", "axxbyy"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(matches("Map?", "Map1"));
        assert!(!matches("Map?", "Map"));
        assert!(!matches("Map?", "Map12"));
    }

    #[test]
    fn case_is_ignored() {
        assert!(matches("*waypoint*", "Metadata/WayPoint"));
    }
}
