//! View configuration model
//!
//! A view stores three independent pieces of configuration over a table:
//! an ordered sort list, an ordered filter list and a column visibility map.
//! The model is generic over the column reference type so the client can
//! hold configurations that mention not-yet-confirmed columns, while the
//! persistence boundary only ever sees [`ColumnId`]s.
//!
//! At rest each piece is stored as its own JSON text field
//! ([`PersistedViewConfig`]). Decoding is lenient: a missing or malformed
//! field decodes to that field's empty default instead of failing.

use crate::{ColumnId, ViewConfigError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Anything that can name a column inside a view configuration.
pub trait ColumnRef: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

impl<T> ColumnRef for T where T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

// ============================================================================
// SORTING
// ============================================================================

/// One entry of a view's sort list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRule<C = ColumnId> {
    pub column_id: C,
    pub desc: bool,
}

impl<C> SortRule<C> {
    pub fn asc(column_id: C) -> Self {
        Self {
            column_id,
            desc: false,
        }
    }

    pub fn desc(column_id: C) -> Self {
        Self {
            column_id,
            desc: true,
        }
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Comparison applied by a filter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Contains,
    NotContains,
    Equals,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 7] = [
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::Equals,
        FilterOperator::GreaterThan,
        FilterOperator::LessThan,
        FilterOperator::IsEmpty,
        FilterOperator::IsNotEmpty,
    ];

    /// `is_empty` and `is_not_empty` carry no comparison value.
    pub fn takes_value(&self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
            FilterOperator::Equals => "equals",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::LessThan => "less_than",
            FilterOperator::IsEmpty => "is_empty",
            FilterOperator::IsNotEmpty => "is_not_empty",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| format!("Invalid filter operator: {}", s))
    }
}

/// One entry of a view's filter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule<C = ColumnId> {
    pub column_id: C,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl<C> FilterRule<C> {
    /// Build a rule, dropping the value for operators that take none.
    pub fn new(column_id: C, operator: FilterOperator, value: Option<String>) -> Self {
        let mut rule = Self {
            column_id,
            operator,
            value,
        };
        rule.normalize();
        rule
    }

    fn normalize(&mut self) {
        if !self.operator.takes_value() {
            self.value = None;
        } else if self.value.is_none() {
            self.value = Some(String::new());
        }
    }

    fn map_column<D>(self, column_id: D) -> FilterRule<D> {
        FilterRule {
            column_id,
            operator: self.operator,
            value: self.value,
        }
    }
}

// ============================================================================
// VIEW CONFIG
// ============================================================================

/// Sort, filter and visibility configuration of one view.
///
/// The sort list never holds two entries for the same column: every edit
/// path rejects duplicates and decoding keeps only the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    from = "RawViewConfig<C>",
    bound(
        serialize = "C: Serialize",
        deserialize = "C: Deserialize<'de> + ColumnRef"
    )
)]
pub struct ViewConfig<C: ColumnRef = ColumnId> {
    sorting: Vec<SortRule<C>>,
    filters: Vec<FilterRule<C>>,
    column_visibility: BTreeMap<C, bool>,
}

#[derive(Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "C: Deserialize<'de> + ColumnRef")
)]
struct RawViewConfig<C: ColumnRef> {
    #[serde(default)]
    sorting: Vec<SortRule<C>>,
    #[serde(default)]
    filters: Vec<FilterRule<C>>,
    #[serde(default)]
    column_visibility: BTreeMap<C, bool>,
}

impl<C: ColumnRef> From<RawViewConfig<C>> for ViewConfig<C> {
    fn from(raw: RawViewConfig<C>) -> Self {
        ViewConfig::from_parts(raw.sorting, raw.filters, raw.column_visibility)
    }
}

impl<C: ColumnRef> Default for ViewConfig<C> {
    fn default() -> Self {
        Self {
            sorting: Vec::new(),
            filters: Vec::new(),
            column_visibility: BTreeMap::new(),
        }
    }
}

impl<C: ColumnRef> ViewConfig<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a configuration from raw parts, dropping duplicate sort
    /// entries (first wins) and normalizing filter values.
    pub fn from_parts(
        sorting: Vec<SortRule<C>>,
        filters: Vec<FilterRule<C>>,
        column_visibility: BTreeMap<C, bool>,
    ) -> Self {
        let mut seen = HashSet::new();
        let sorting = sorting
            .into_iter()
            .filter(|rule| seen.insert(rule.column_id.clone()))
            .collect();
        let filters = filters
            .into_iter()
            .map(|mut rule| {
                rule.normalize();
                rule
            })
            .collect();
        Self {
            sorting,
            filters,
            column_visibility,
        }
    }

    /// The default configuration of a freshly created view: no sorting, no
    /// filters, every listed column explicitly visible.
    pub fn with_visible_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        Self {
            sorting: Vec::new(),
            filters: Vec::new(),
            column_visibility: columns.into_iter().map(|c| (c, true)).collect(),
        }
    }

    pub fn sorting(&self) -> &[SortRule<C>] {
        &self.sorting
    }

    pub fn filters(&self) -> &[FilterRule<C>] {
        &self.filters
    }

    pub fn column_visibility(&self) -> &BTreeMap<C, bool> {
        &self.column_visibility
    }

    pub fn is_empty(&self) -> bool {
        self.sorting.is_empty() && self.filters.is_empty() && self.column_visibility.is_empty()
    }

    // === Sorting ===

    /// Append a sort entry. Rejected if the column is already sorted on.
    pub fn add_sort(&mut self, column_id: C, desc: bool) -> Result<(), ViewConfigError> {
        if self.is_sorted_by(&column_id) {
            return Err(ViewConfigError::DuplicateSortColumn {
                column: column_id.to_string(),
            });
        }
        self.sorting.push(SortRule { column_id, desc });
        Ok(())
    }

    /// Point an existing sort entry at a different column.
    pub fn set_sort_column(&mut self, index: usize, column_id: C) -> Result<(), ViewConfigError> {
        self.check_sort_index(index)?;
        let taken_elsewhere = self
            .sorting
            .iter()
            .enumerate()
            .any(|(i, rule)| i != index && rule.column_id == column_id);
        if taken_elsewhere {
            return Err(ViewConfigError::DuplicateSortColumn {
                column: column_id.to_string(),
            });
        }
        self.sorting[index].column_id = column_id;
        Ok(())
    }

    pub fn set_sort_direction(&mut self, index: usize, desc: bool) -> Result<(), ViewConfigError> {
        self.check_sort_index(index)?;
        self.sorting[index].desc = desc;
        Ok(())
    }

    /// Flip an entry between ascending and descending; returns the new `desc`.
    pub fn toggle_sort_direction(&mut self, index: usize) -> Result<bool, ViewConfigError> {
        self.check_sort_index(index)?;
        let rule = &mut self.sorting[index];
        rule.desc = !rule.desc;
        Ok(rule.desc)
    }

    pub fn remove_sort(&mut self, index: usize) -> Result<SortRule<C>, ViewConfigError> {
        self.check_sort_index(index)?;
        Ok(self.sorting.remove(index))
    }

    pub fn is_sorted_by(&self, column_id: &C) -> bool {
        self.sorting.iter().any(|rule| &rule.column_id == column_id)
    }

    /// Columns that may still be appended to the sort list, in input order.
    pub fn selectable_sort_columns<'a, I>(&self, columns: I) -> Vec<C>
    where
        I: IntoIterator<Item = &'a C>,
        C: 'a,
    {
        columns
            .into_iter()
            .filter(|column| !self.is_sorted_by(column))
            .cloned()
            .collect()
    }

    fn check_sort_index(&self, index: usize) -> Result<(), ViewConfigError> {
        if index >= self.sorting.len() {
            return Err(ViewConfigError::SortIndexOutOfRange {
                index,
                len: self.sorting.len(),
            });
        }
        Ok(())
    }

    // === Filters ===

    pub fn add_filter(&mut self, rule: FilterRule<C>) {
        self.filters
            .push(FilterRule::new(rule.column_id, rule.operator, rule.value));
    }

    pub fn update_filter(&mut self, index: usize, rule: FilterRule<C>) -> Result<(), ViewConfigError> {
        self.check_filter_index(index)?;
        self.filters[index] = FilterRule::new(rule.column_id, rule.operator, rule.value);
        Ok(())
    }

    pub fn remove_filter(&mut self, index: usize) -> Result<FilterRule<C>, ViewConfigError> {
        self.check_filter_index(index)?;
        Ok(self.filters.remove(index))
    }

    fn check_filter_index(&self, index: usize) -> Result<(), ViewConfigError> {
        if index >= self.filters.len() {
            return Err(ViewConfigError::FilterIndexOutOfRange {
                index,
                len: self.filters.len(),
            });
        }
        Ok(())
    }

    // === Visibility ===

    /// Columns absent from the visibility map are visible.
    pub fn is_visible(&self, column_id: &C) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }

    pub fn set_visibility(&mut self, column_id: C, visible: bool) {
        self.column_visibility.insert(column_id, visible);
    }

    /// Flip a column's visibility; returns the new state.
    pub fn toggle_visibility(&mut self, column_id: C) -> bool {
        let visible = !self.is_visible(&column_id);
        self.column_visibility.insert(column_id, visible);
        visible
    }

    /// Visible columns, in input order.
    pub fn visible_columns<'a, I>(&self, columns: I) -> Vec<C>
    where
        I: IntoIterator<Item = &'a C>,
        C: 'a,
    {
        columns
            .into_iter()
            .filter(|column| self.is_visible(column))
            .cloned()
            .collect()
    }

    // === Column references ===

    /// Whether any part of the configuration mentions `column_id`.
    pub fn references(&self, column_id: &C) -> bool {
        self.is_sorted_by(column_id)
            || self.filters.iter().any(|rule| &rule.column_id == column_id)
            || self.column_visibility.contains_key(column_id)
    }

    /// Every column mentioned anywhere in the configuration.
    pub fn referenced_columns(&self) -> Vec<C> {
        let mut columns: Vec<C> = self
            .sorting
            .iter()
            .map(|rule| rule.column_id.clone())
            .chain(self.filters.iter().map(|rule| rule.column_id.clone()))
            .chain(self.column_visibility.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }

    /// Drop every reference to columns for which `keep` returns false.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&C) -> bool,
    {
        self.sorting.retain(|rule| keep(&rule.column_id));
        self.filters.retain(|rule| keep(&rule.column_id));
        self.column_visibility.retain(|column, _| keep(column));
    }

    /// Fail if the configuration mentions a column not in `columns`.
    pub fn validate_columns<'a, I>(&self, columns: I) -> Result<(), ViewConfigError>
    where
        I: IntoIterator<Item = &'a C>,
        C: 'a,
    {
        let known: HashSet<&C> = columns.into_iter().collect();
        match self
            .referenced_columns()
            .into_iter()
            .find(|column| !known.contains(column))
        {
            Some(column) => Err(ViewConfigError::UnknownColumn {
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Rewrite every column reference.
    pub fn map_columns<D, F>(self, mut f: F) -> ViewConfig<D>
    where
        D: ColumnRef,
        F: FnMut(C) -> D,
    {
        let sorting = self
            .sorting
            .into_iter()
            .map(|rule| SortRule {
                column_id: f(rule.column_id),
                desc: rule.desc,
            })
            .collect();
        let filters = self
            .filters
            .into_iter()
            .map(|rule| {
                let column = f(rule.column_id.clone());
                rule.map_column(column)
            })
            .collect();
        let column_visibility = self
            .column_visibility
            .into_iter()
            .map(|(column, visible)| (f(column), visible))
            .collect();
        ViewConfig::from_parts(sorting, filters, column_visibility)
    }

    /// Rewrite every column reference, stopping at the first failure.
    pub fn try_map_columns<D, E, F>(self, mut f: F) -> Result<ViewConfig<D>, E>
    where
        D: ColumnRef,
        F: FnMut(C) -> Result<D, E>,
    {
        let mut sorting = Vec::with_capacity(self.sorting.len());
        for rule in self.sorting {
            sorting.push(SortRule {
                column_id: f(rule.column_id)?,
                desc: rule.desc,
            });
        }
        let mut filters = Vec::with_capacity(self.filters.len());
        for rule in self.filters {
            let column = f(rule.column_id.clone())?;
            filters.push(rule.map_column(column));
        }
        let mut column_visibility = BTreeMap::new();
        for (column, visible) in self.column_visibility {
            column_visibility.insert(f(column)?, visible);
        }
        Ok(ViewConfig::from_parts(sorting, filters, column_visibility))
    }
}

// ============================================================================
// PERSISTENCE BOUNDARY
// ============================================================================

/// A view configuration as stored: each part is opaque JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedViewConfig {
    pub sorting: Option<String>,
    pub filters: Option<String>,
    pub column_visibility: Option<String>,
}

/// The three independently persisted parts of a view configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewConfigField {
    Sorting,
    Filters,
    ColumnVisibility,
}

impl fmt::Display for ViewConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ViewConfigField::Sorting => "sorting",
            ViewConfigField::Filters => "filters",
            ViewConfigField::ColumnVisibility => "column_visibility",
        };
        write!(f, "{}", value)
    }
}

/// Why a persisted field was replaced by its empty default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    Missing,
    Malformed(String),
}

/// Result of a lenient decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedViewConfig<C: ColumnRef = ColumnId> {
    pub config: ViewConfig<C>,
    pub defaulted: Vec<(ViewConfigField, DefaultReason)>,
}

impl<C: ColumnRef + Serialize> ViewConfig<C> {
    /// Serialize each part independently.
    pub fn to_persisted(&self) -> Result<PersistedViewConfig, serde_json::Error> {
        Ok(PersistedViewConfig {
            sorting: Some(serde_json::to_string(&self.sorting)?),
            filters: Some(serde_json::to_string(&self.filters)?),
            column_visibility: Some(serde_json::to_string(&self.column_visibility)?),
        })
    }
}

impl PersistedViewConfig {
    /// Decode each part independently, substituting the empty default for
    /// any part that is missing or does not parse.
    pub fn decode<C>(&self) -> DecodedViewConfig<C>
    where
        C: ColumnRef + DeserializeOwned,
    {
        let mut defaulted = Vec::new();
        let sorting: Vec<SortRule<C>> =
            decode_field(self.sorting.as_deref(), ViewConfigField::Sorting, &mut defaulted);
        let filters: Vec<FilterRule<C>> =
            decode_field(self.filters.as_deref(), ViewConfigField::Filters, &mut defaulted);
        let column_visibility: BTreeMap<C, bool> = decode_field(
            self.column_visibility.as_deref(),
            ViewConfigField::ColumnVisibility,
            &mut defaulted,
        );
        DecodedViewConfig {
            config: ViewConfig::from_parts(sorting, filters, column_visibility),
            defaulted,
        }
    }
}

fn decode_field<T>(
    raw: Option<&str>,
    field: ViewConfigField,
    defaulted: &mut Vec<(ViewConfigField, DefaultReason)>,
) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        defaulted.push((field, DefaultReason::Missing));
        return T::default();
    };
    match serde_json::from_str::<Option<T>>(raw) {
        Ok(Some(value)) => value,
        Ok(None) => {
            defaulted.push((field, DefaultReason::Missing));
            T::default()
        }
        Err(err) => {
            defaulted.push((field, DefaultReason::Malformed(err.to_string())));
            T::default()
        }
    }
}
