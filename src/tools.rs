/// Makes an identifier usable as a SPARQL variable name.
pub fn normalize(identifier: &str) -> String {
    identifier.replace('.', "_").replace('-', "_")
}

/// File stem for an exported record: spaces become underscores.
pub fn file_stem(system_name: &str) -> String {
    system_name.replace(' ', "_")
}

/// File name for an arbitrary item key: anything but letters, digits and
/// spaces becomes an underscore.
pub fn sanitize_file_name(item: &str) -> String {
    item.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Cuts long report cells down to `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    } else {
        String::from(text)
    }
}

/// Splits a slice into runs of consecutive elements sharing a key.
pub struct GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    slice: &'a [T],
    key: F,
}

impl<'a, T, F, K> GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    pub fn new(slice: &'a [T], key: F) -> Self {
        GroupBy { slice, key }
    }
}

impl<'a, T, F, K> Iterator for GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    type Item = (K, &'a [T]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slice = self.slice;
        let (first, rest) = slice.split_first()?;
        let key_of = &mut self.key;
        let key = key_of(first);
        let len = 1 + rest.iter().take_while(|x| key == key_of(*x)).count();
        let (head, tail) = slice.split_at(len);
        self.slice = tail;
        Some((key, head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("F1.2-a"), "F1_2_a");
        assert_eq!(file_stem("Object Title"), "Object_Title");
        assert_eq!(sanitize_file_name("Model: A/B "), "Model_ A_B");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        assert_eq!(truncate(&"x".repeat(120), 100).len(), 100);
        assert!(truncate(&"x".repeat(120), 100).ends_with("..."));
    }

    #[test]
    fn test_group_by() {
        let rows = vec![("a", 1), ("a", 2), ("b", 3), ("a", 4)];
        let groups: Vec<_> = GroupBy::new(&rows, |&(k, _)| k)
            .map(|(k, g)| (k, g.len()))
            .collect();
        assert_eq!(groups, vec![("a", 2), ("b", 1), ("a", 1)]);
    }
}
