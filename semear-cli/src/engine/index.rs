//! Natural-key to row-number index
//!
//! One linear scan over a table builds a map from composite natural key to
//! 1-based sheet row number. The index lives for a single write operation;
//! row numbers computed against one snapshot are invalid after any append or
//! delete, so callers re-read and rebuild rather than cache.

use std::collections::HashMap;

use log::debug;

use super::grid::Table;

/// An ordered tuple of field values identifying one logical row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey(Vec<String>);

impl NaturalKey {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Maps natural keys to sheet row numbers for one table snapshot.
pub struct KeyedRowIndex {
    key_fields: Vec<String>,
    map: HashMap<NaturalKey, usize>,
}

impl KeyedRowIndex {
    /// Scan `table` once, composing each row's key from `key_fields` in
    /// order. Only the first occurrence of a key is recorded: rows sharing a
    /// key with an earlier row are unreachable through the index. Sheet data
    /// may rely on that first-wins behavior, so duplicates are kept and
    /// logged, never silently collapsed.
    pub fn build(table: &Table, key_fields: &[&str]) -> Self {
        let mut map = HashMap::new();
        let mut shadowed = 0usize;

        for (i, row) in table.rows().iter().enumerate() {
            let key = NaturalKey::new(key_fields.iter().map(|f| row.get(f)));
            let row_number = Table::sheet_row(i);
            if map.contains_key(&key) {
                shadowed += 1;
                debug!(
                    "table '{}' row {} shadowed by earlier row with key {}",
                    table.name(),
                    row_number,
                    key
                );
            } else {
                map.insert(key, row_number);
            }
        }

        if shadowed > 0 {
            log::warn!(
                "table '{}': {} row(s) share a key with an earlier row and are unreachable by key",
                table.name(),
                shadowed
            );
        }

        Self {
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
            map,
        }
    }

    /// Sheet row number for a key, if the key was seen.
    pub fn lookup(&self, key: &NaturalKey) -> Option<usize> {
        self.map.get(key).copied()
    }

    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.map.contains_key(key)
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grid::Table;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        let mut grid = vec![vec!["Username".to_string(), "Materia".to_string()]];
        grid.extend(
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect()),
        );
        Table::from_grid("T", grid)
    }

    #[test]
    fn maps_keys_to_sheet_rows() {
        let t = table(vec![vec!["ana", "Fisica"], vec!["ana", "Quimica"]]);
        let index = KeyedRowIndex::build(&t, &["Username", "Materia"]);

        assert_eq!(index.lookup(&NaturalKey::new(["ana", "Fisica"])), Some(2));
        assert_eq!(index.lookup(&NaturalKey::new(["ana", "Quimica"])), Some(3));
        assert_eq!(index.lookup(&NaturalKey::new(["bia", "Fisica"])), None);
    }

    #[test]
    fn first_occurrence_wins_on_duplicates() {
        let t = table(vec![
            vec!["ana", "Fisica"],
            vec!["ana", "Fisica"],
            vec!["ana", "Quimica"],
        ]);
        let index = KeyedRowIndex::build(&t, &["Username", "Materia"]);

        // The duplicate at sheet row 3 is shadowed.
        assert_eq!(index.lookup(&NaturalKey::new(["ana", "Fisica"])), Some(2));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn key_composition_is_ordered() {
        let t = table(vec![vec!["ana", "Fisica"]]);
        let index = KeyedRowIndex::build(&t, &["Materia", "Username"]);

        assert_eq!(index.lookup(&NaturalKey::new(["Fisica", "ana"])), Some(2));
        assert_eq!(index.lookup(&NaturalKey::new(["ana", "Fisica"])), None);
    }
}
