//! View evaluation: filtering and sorting rows under a [`ViewConfig`].
//!
//! Evaluation is pure. Callers pass the table's columns, its rows in
//! position order and a configuration; the result is the list of row
//! indices the view shows, in display order.

use crate::{parse_number, ColumnRef, ColumnType, FilterOperator, FilterRule, ViewConfig};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Read access to the cell values of one row.
pub trait RowValues<C> {
    /// Value of the cell in `column`, or `None` when the row has no such cell.
    fn value(&self, column: &C) -> Option<&str>;
}

impl<C: ColumnRef> RowValues<C> for HashMap<C, String> {
    fn value(&self, column: &C) -> Option<&str> {
        self.get(column).map(String::as_str)
    }
}

/// Apply filters (all must match) then the sort list to `rows`.
///
/// Rules naming a column absent from `columns` are ignored. The sort is
/// stable, so rows that compare equal keep their position order.
pub fn evaluate_view<C, R>(
    columns: &[(C, ColumnType)],
    rows: &[R],
    config: &ViewConfig<C>,
) -> Vec<usize>
where
    C: ColumnRef,
    R: RowValues<C>,
{
    let types: HashMap<&C, ColumnType> = columns.iter().map(|(c, t)| (c, *t)).collect();

    let filters: Vec<(&FilterRule<C>, ColumnType)> = config
        .filters()
        .iter()
        .filter_map(|rule| types.get(&rule.column_id).map(|t| (rule, *t)))
        .collect();

    let mut indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            filters
                .iter()
                .all(|(rule, column_type)| matches_filter(*column_type, row.value(&rule.column_id), rule))
        })
        .map(|(index, _)| index)
        .collect();

    let sorts: Vec<(&C, bool, ColumnType)> = config
        .sorting()
        .iter()
        .filter_map(|rule| {
            types
                .get(&rule.column_id)
                .map(|t| (&rule.column_id, rule.desc, *t))
        })
        .collect();

    if !sorts.is_empty() {
        indices.sort_by(|a, b| {
            for (column, desc, column_type) in &sorts {
                let ordering = compare_for_sort(
                    *column_type,
                    rows[*a].value(column),
                    rows[*b].value(column),
                    *desc,
                );
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    indices
}

/// Whether a cell value satisfies a filter rule.
///
/// A missing cell is treated as the empty string.
pub fn matches_filter<C>(column_type: ColumnType, value: Option<&str>, rule: &FilterRule<C>) -> bool {
    let cell = value.unwrap_or("");
    let target = rule.value.as_deref().unwrap_or("");
    match rule.operator {
        FilterOperator::IsEmpty => cell.trim().is_empty(),
        FilterOperator::IsNotEmpty => !cell.trim().is_empty(),
        FilterOperator::Contains => cell.to_lowercase().contains(&target.to_lowercase()),
        FilterOperator::NotContains => !cell.to_lowercase().contains(&target.to_lowercase()),
        FilterOperator::Equals => match (column_type, parse_number(cell), parse_number(target)) {
            (ColumnType::Number, Some(a), Some(b)) => a == b,
            _ => cell.trim().to_lowercase() == target.trim().to_lowercase(),
        },
        FilterOperator::GreaterThan => compare_operands(cell, target) == Some(Ordering::Greater),
        FilterOperator::LessThan => compare_operands(cell, target) == Some(Ordering::Less),
    }
}

// Empty cells never satisfy an ordering comparison.
fn compare_operands(cell: &str, target: &str) -> Option<Ordering> {
    if cell.trim().is_empty() {
        return None;
    }
    match (parse_number(cell), parse_number(target)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(cell.trim().to_lowercase().cmp(&target.trim().to_lowercase())),
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Text(String),
}

fn sort_key(column_type: ColumnType, value: Option<&str>) -> Option<SortKey> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match column_type {
        ColumnType::Number => parse_number(value).map(SortKey::Number),
        ColumnType::Text => Some(SortKey::Text(value.to_lowercase())),
    }
}

/// Compare two cells for sorting. Empty and unparsable values sort last
/// regardless of direction.
pub fn compare_for_sort(
    column_type: ColumnType,
    a: Option<&str>,
    b: Option<&str>,
    desc: bool,
) -> Ordering {
    match (sort_key(column_type, a), sort_key(column_type, b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = match (&a, &b) {
                (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
                _ => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            };
            if desc {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnId, EntityIdType, SortRule};
    use proptest::prelude::*;

    struct Fixture {
        name: ColumnId,
        age: ColumnId,
        rows: Vec<HashMap<ColumnId, String>>,
    }

    fn fixture(data: &[(&str, &str)]) -> Fixture {
        let name = ColumnId::now_v7();
        let age = ColumnId::now_v7();
        let rows = data
            .iter()
            .map(|(n, a)| {
                let mut row = HashMap::new();
                row.insert(name, n.to_string());
                row.insert(age, a.to_string());
                row
            })
            .collect();
        Fixture { name, age, rows }
    }

    fn columns(f: &Fixture) -> Vec<(ColumnId, ColumnType)> {
        vec![(f.name, ColumnType::Text), (f.age, ColumnType::Number)]
    }

    #[test]
    fn test_no_config_returns_rows_in_order() {
        let f = fixture(&[("b", "1"), ("a", "2")]);
        let config = ViewConfig::new();
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0, 1]);
    }

    #[test]
    fn test_number_sort_is_numeric_with_empties_last() {
        let f = fixture(&[("a", "10"), ("b", ""), ("c", "9"), ("d", "x")]);
        let mut config = ViewConfig::new();
        config.add_sort(f.age, false).ok();
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![2, 0, 1, 3]);

        config.set_sort_direction(0, true).ok();
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_multi_key_sort() {
        let f = fixture(&[("bob", "2"), ("Alice", "3"), ("bob", "1"), ("alice", "1")]);
        let mut config = ViewConfig::new();
        config.add_sort(f.name, false).ok();
        config.add_sort(f.age, true).ok();
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let f = fixture(&[("Alice", "30"), ("Alina", "12"), ("Bob", "40")]);
        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.name, FilterOperator::Contains, Some("ALI".into())));
        config.add_filter(FilterRule::new(f.age, FilterOperator::GreaterThan, Some("20".into())));
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0]);
    }

    #[test]
    fn test_empty_filters() {
        let f = fixture(&[("Alice", ""), ("Bob", " "), ("Cy", "3")]);
        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.age, FilterOperator::IsEmpty, None));
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0, 1]);

        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.age, FilterOperator::IsNotEmpty, None));
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![2]);
    }

    #[test]
    fn test_ordering_filters_skip_empty_cells() {
        let f = fixture(&[("a", ""), ("b", "1")]);
        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.age, FilterOperator::LessThan, Some("5".into())));
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![1]);
    }

    #[test]
    fn test_equals_is_numeric_on_number_columns() {
        let f = fixture(&[("a", "1.0"), ("b", "1"), ("c", "2")]);
        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.age, FilterOperator::Equals, Some("1".into())));
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0, 1]);
    }

    #[test]
    fn test_rules_on_unknown_columns_are_ignored() {
        let f = fixture(&[("a", "1"), ("b", "2")]);
        let ghost = ColumnId::now_v7();
        let config = ViewConfig::from_parts(
            vec![SortRule::desc(ghost)],
            vec![FilterRule::new(ghost, FilterOperator::IsNotEmpty, None)],
            Default::default(),
        );
        assert_eq!(evaluate_view(&columns(&f), &f.rows, &config), vec![0, 1]);
    }

    #[test]
    fn test_missing_cell_counts_as_empty() {
        let f = fixture(&[("a", "1")]);
        let mut rows = f.rows.clone();
        rows.push(HashMap::new());
        let mut config = ViewConfig::new();
        config.add_filter(FilterRule::new(f.name, FilterOperator::IsEmpty, None));
        assert_eq!(evaluate_view(&columns(&f), &rows, &config), vec![1]);
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_a_subset_permutation(values in prop::collection::vec("[a-c0-9]{0,3}", 0..20), desc in any::<bool>()) {
            let data: Vec<(&str, &str)> = values.iter().map(|v| (v.as_str(), v.as_str())).collect();
            let f = fixture(&data);
            let mut config = ViewConfig::new();
            config.add_sort(f.age, desc).ok();
            config.add_filter(FilterRule::new(f.name, FilterOperator::NotContains, Some("c".into())));
            let result = evaluate_view(&columns(&f), &f.rows, &config);

            let mut sorted = result.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), result.len());
            for index in &result {
                prop_assert!(!values[*index].contains('c'));
            }
            let expected = values.iter().filter(|v| !v.contains('c')).count();
            prop_assert_eq!(result.len(), expected);
        }
    }
}
