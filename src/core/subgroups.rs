use std::collections::BTreeMap;

use crate::models::table::{PairTable, TableError};

/// Whether subgroups are keyed by individual attribute values or by the
/// unordered combination of the two sides' values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FairnessScope {
    Single,
    Pairwise,
}

/// Row membership of every subgroup of a sensitive attribute.
///
/// Built once per audit scope from the `left_<attr>` / `right_<attr>`
/// columns of the test split. A cell may carry several delimiter-separated
/// values; each value contributes membership. Keys are sorted, so iteration
/// order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SubgroupIndex {
    groups: BTreeMap<String, Vec<usize>>,
}

impl SubgroupIndex {
    pub fn build(
        test: &PairTable,
        sensitive_attribute: &str,
        scope: FairnessScope,
        value_delimiter: Option<char>,
    ) -> Result<Self, TableError> {
        let left = test.column(&format!("left_{}", sensitive_attribute))?;
        let right = test.column(&format!("right_{}", sensitive_attribute))?;

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, (left_cell, right_cell)) in left.iter().zip(right.iter()).enumerate() {
            let left_values = cell_values(left_cell, value_delimiter);
            let right_values = cell_values(right_cell, value_delimiter);

            let mut keys: Vec<String> = match scope {
                FairnessScope::Single => left_values
                    .iter()
                    .chain(right_values.iter())
                    .map(|v| v.to_string())
                    .collect(),
                FairnessScope::Pairwise => {
                    let mut keys = Vec::with_capacity(left_values.len() * right_values.len());
                    for a in &left_values {
                        for b in &right_values {
                            keys.push(pair_key(a, b));
                        }
                    }
                    keys
                }
            };

            // A pair counts at most once per subgroup, even when both sides
            // carry the same value.
            keys.sort();
            keys.dedup();
            for key in keys {
                groups.entry(key).or_default().push(row);
            }
        }

        Ok(Self { groups })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.groups.iter().map(|(key, rows)| (key.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn rows(&self, key: &str) -> Option<&[usize]> {
        self.groups.get(key).map(Vec::as_slice)
    }
}

fn cell_values(cell: &str, delimiter: Option<char>) -> Vec<&str> {
    match delimiter {
        Some(d) => cell
            .split(d)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect(),
        None => {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed]
            }
        }
    }
}

/// Unordered combination key, lexicographically normalized
fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}|{}", a, b)
    } else {
        format!("{}|{}", b, a)
    }
}
