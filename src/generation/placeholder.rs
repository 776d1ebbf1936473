use super::PlaceholderContent;

/// Joins placeholder contributions into the final text
///
/// Contributions are ordered by ascending priority; equal priorities keep
/// their contribution order.
pub fn aggregate(contents: &[PlaceholderContent], separator: &str) -> String {
    let mut ordered: Vec<&PlaceholderContent> = contents.iter().collect();
    ordered.sort_by_key(|c| c.priority);
    ordered
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn contents(entries: &[(&str, i32)]) -> Vec<PlaceholderContent> {
        entries
            .iter()
            .map(|(text, priority)| PlaceholderContent::new(*text, *priority, "test"))
            .collect()
    }

    #[parameterized(
        ascending_priority = { &[("C", 50), ("A", 10), ("B", 30)], "A\nB\nC" },
        ties_keep_order = { &[("first", 5), ("second", 5), ("early", 1)], "early\nfirst\nsecond" },
        negative_first = { &[("x", 0), ("y", -10)], "y\nx" },
        single = { &[("only", 100)], "only" },
        empty = { &[], "" },
    )]
    fn test_aggregate(entries: &[(&str, i32)], expected: &str) {
        assert_eq!(aggregate(&contents(entries), "\n"), expected);
    }

    #[test]
    fn test_custom_separator() {
        let c = contents(&[("b", 2), ("a", 1)]);
        assert_eq!(aggregate(&c, ", "), "a, b");
    }
}
