use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Rows sharing one key value, in their original relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, T> {
    pub key: K,
    pub rows: Vec<T>,
}

/// Partitions `rows` by `key_of`, one group per distinct key in first-seen order.
pub fn group_by<T, K, F>(rows: impl IntoIterator<Item = T>, mut key_of: F) -> Vec<Group<K, T>>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for row in rows {
        groups.entry(key_of(&row)).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, rows)| Group { key, rows })
        .collect()
}

/// Distinct key values in first-seen order.
pub fn unique_keys<T, K, F>(rows: &[T], key_of: F) -> Vec<K>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let keys: IndexSet<K> = rows.iter().map(key_of).collect();
    keys.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn groups_follow_first_seen_order() {
        let rows = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];
        let groups = group_by(rows, |row| row.0);

        let keys: Vec<&str> = groups.iter().map(|group| group.key).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(groups[0].rows, vec![("b", 1), ("b", 3)]);
        assert_eq!(groups[1].rows, vec![("a", 2), ("a", 5)]);
        assert_eq!(groups[2].rows, vec![("c", 4)]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let groups = group_by(Vec::<(u8, u8)>::new(), |row| row.0);
        assert!(groups.is_empty());
    }

    #[test]
    fn unique_keys_match_group_order() {
        let rows = vec![3, 1, 3, 2, 1];
        assert_eq!(unique_keys(&rows, |value| *value), vec![3, 1, 2]);
    }

    proptest! {
        #[test]
        fn grouping_preserves_rows_and_order(keys in proptest::collection::vec(0u8..6, 0..60)) {
            let rows: Vec<(u8, usize)> = keys.iter().copied().zip(0..).collect();
            let groups = group_by(rows.clone(), |row| row.0);

            let total: usize = groups.iter().map(|group| group.rows.len()).sum();
            prop_assert_eq!(total, rows.len());

            let mut flattened: Vec<(u8, usize)> =
                groups.iter().flat_map(|group| group.rows.clone()).collect();
            flattened.sort_by_key(|row| row.1);
            prop_assert_eq!(&flattened, &rows);

            let mut first_seen: Vec<u8> = Vec::new();
            for key in &keys {
                if !first_seen.contains(key) {
                    first_seen.push(*key);
                }
            }
            let group_keys: Vec<u8> = groups.iter().map(|group| group.key).collect();
            prop_assert_eq!(group_keys, first_seen);

            for group in &groups {
                prop_assert!(group.rows.iter().all(|row| row.0 == group.key));
                prop_assert!(group.rows.windows(2).all(|pair| pair[0].1 < pair[1].1));
            }
        }
    }
}
