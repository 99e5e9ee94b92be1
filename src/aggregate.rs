use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CategoryKey, CountTable, PivotTable};

/// Counts items per key, skipping items whose key is `None`. Keys come back
/// in their natural order.
pub fn count_by<T, K, F>(items: &[T], key: F) -> BTreeMap<K, u64>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut counts = BTreeMap::new();
    for item in items {
        if let Some(key) = key(item) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

pub fn count_table<K: Into<CategoryKey>>(
    counts: BTreeMap<K, u64>,
    key_label: &str,
    value_label: &str,
) -> CountTable {
    let rows = counts
        .into_iter()
        .map(|(key, count)| (key.into(), count))
        .collect();
    CountTable::new(key_label, value_label, rows)
}

/// Same as [`count_table`] but ordered by ascending count; equal counts keep
/// key order.
pub fn ranked_count_table<K: Into<CategoryKey>>(
    counts: BTreeMap<K, u64>,
    key_label: &str,
    value_label: &str,
) -> CountTable {
    let mut table = count_table(counts, key_label, value_label);
    table.rows.sort_by_key(|(_, count)| *count);
    table
}

/// Groups by two keys and reshapes into a row-by-column grid.
///
/// Every item with both keys present creates its group, even when `weight`
/// returns 0 for it; cells for combinations that never occur stay `None`.
pub fn pivot<T, R, C, FR, FC, FW>(
    items: &[T],
    row_key: FR,
    column_key: FC,
    weight: FW,
    labels: PivotLabels<'_>,
) -> PivotTable
where
    R: Ord + Into<CategoryKey>,
    C: Ord + Clone + Into<CategoryKey>,
    FR: Fn(&T) -> Option<R>,
    FC: Fn(&T) -> Option<C>,
    FW: Fn(&T) -> u64,
{
    let mut groups: BTreeMap<R, BTreeMap<C, u64>> = BTreeMap::new();
    let mut columns: BTreeSet<C> = BTreeSet::new();

    for item in items {
        let (Some(row), Some(column)) = (row_key(item), column_key(item)) else {
            continue;
        };
        columns.insert(column.clone());
        *groups.entry(row).or_default().entry(column).or_insert(0) += weight(item);
    }

    let rows = groups
        .into_iter()
        .map(|(row, cells)| {
            let values = columns
                .iter()
                .map(|column| cells.get(column).copied())
                .collect();
            (row.into(), values)
        })
        .collect();

    PivotTable {
        row_label: labels.row.to_string(),
        column_label: labels.column.to_string(),
        value_label: labels.value.to_string(),
        columns: columns.into_iter().map(Into::into).collect(),
        rows,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PivotLabels<'a> {
    pub row: &'a str,
    pub column: &'a str,
    pub value: &'a str,
}
