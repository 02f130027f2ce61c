//! Presence name assignment.

use scribble_protocol::SYSTEM_SENDER;

/// Name given to a participant who asks for an empty one.
pub const DEFAULT_NAME: &str = "guest";

/// Picks the first free name among `base`, `base-1`, `base-2`, ...
///
/// `base` is the trimmed request, or [`DEFAULT_NAME`] if that is empty.
/// The room's own sender name always counts as taken.
pub fn unique_name(requested: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let base = match requested.trim() {
        "" => DEFAULT_NAME,
        trimmed => trimmed,
    };
    let taken = |name: &str| name == SYSTEM_SENDER || is_taken(name);

    if !taken(base) {
        return base.to_owned();
    }
    (1u64..)
        .map(|i| format!("{base}-{i}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_free_name_is_kept() {
        assert_eq!(unique_name("alice", |_| false), "alice");
        assert_eq!(unique_name("  alice ", |_| false), "alice");
    }

    #[test]
    fn test_repeated_joins_get_sequential_suffixes() {
        let mut names = BTreeSet::new();
        for _ in 0..5 {
            let name = unique_name("bob", |n| names.contains(n));
            names.insert(name);
        }
        let expected: BTreeSet<String> = ["bob", "bob-1", "bob-2", "bob-3", "bob-4"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_first_unused_suffix_fills_gap() {
        let names: BTreeSet<&str> = ["bob", "bob-2"].into_iter().collect();
        assert_eq!(unique_name("bob", |n| names.contains(n)), "bob-1");
    }

    #[test]
    fn test_empty_request_becomes_guest() {
        assert_eq!(unique_name("   ", |_| false), "guest");
        assert_eq!(unique_name("", |n| n == "guest"), "guest-1");
    }

    #[test]
    fn test_system_name_is_reserved() {
        assert_eq!(unique_name(SYSTEM_SENDER, |_| false), format!("{SYSTEM_SENDER}-1"));
    }
}
