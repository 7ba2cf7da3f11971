//! Tabula Test Utilities
//!
//! Shared test infrastructure for the Tabula workspace:
//! - Proptest generators for identifiers, column types, cell values and
//!   view configurations
//! - Fixtures that build populated tables in an in-memory store

// Re-export the in-memory store from its source crate
pub use tabula_storage::InMemoryStore;

// Re-export core types for convenience
pub use tabula_core::{
    Base, BaseId, BaseTheme, Cell, CellId, Column, ColumnId, ColumnType, EntityIdType, EntityType,
    FilterOperator, FilterRule, Row, RowId, SortRule, Table, TableId, TabulaError, TabulaResult,
    Timestamp, View, ViewConfig, ViewId,
};

use uuid::Uuid;

/// Owner used by fixtures.
pub const TEST_USER: &str = "user-test";

/// A second user, for ownership checks.
pub const OTHER_USER: &str = "user-other";

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Tabula values.

    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    // === Identity Type Generators ===

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_column_id() -> impl Strategy<Value = ColumnId> {
        arb_uuid().prop_map(ColumnId::new)
    }

    pub fn arb_row_id() -> impl Strategy<Value = RowId> {
        arb_uuid().prop_map(RowId::new)
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    // === Enum Generators ===

    pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
        prop_oneof![Just(ColumnType::Text), Just(ColumnType::Number)]
    }

    pub fn arb_base_theme() -> impl Strategy<Value = BaseTheme> {
        prop_oneof![
            Just(BaseTheme::Blue),
            Just(BaseTheme::Teal),
            Just(BaseTheme::Green),
            Just(BaseTheme::Yellow),
            Just(BaseTheme::Orange),
            Just(BaseTheme::Red),
            Just(BaseTheme::Pink),
            Just(BaseTheme::Purple),
            Just(BaseTheme::Gray),
        ]
    }

    pub fn arb_filter_operator() -> impl Strategy<Value = FilterOperator> {
        proptest::sample::select(FilterOperator::ALL.to_vec())
    }

    // === Value Generators ===

    /// Short text values, including blanks and mixed case.
    pub fn arb_text_value() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            "[a-zA-Z ]{1,12}",
        ]
    }

    /// Values a NUMBER column accepts: empty or a finite number.
    pub fn arb_number_value() -> impl Strategy<Value = String> {
        prop_oneof![
            1 => Just(String::new()),
            4 => (-1_000_000i64..1_000_000i64).prop_map(|n| n.to_string()),
            2 => (-1.0e6f64..1.0e6f64).prop_map(|f| format!("{:.3}", f)),
        ]
    }

    /// A valid value for the given column type.
    pub fn arb_cell_value(column_type: ColumnType) -> BoxedStrategy<String> {
        match column_type {
            ColumnType::Text => arb_text_value().boxed(),
            ColumnType::Number => arb_number_value().boxed(),
        }
    }

    // === View Configuration Generators ===

    pub fn arb_sort_rule(columns: Vec<ColumnId>) -> impl Strategy<Value = SortRule> {
        (proptest::sample::select(columns), any::<bool>())
            .prop_map(|(column_id, desc)| SortRule { column_id, desc })
    }

    pub fn arb_filter_rule(columns: Vec<ColumnId>) -> impl Strategy<Value = FilterRule> {
        (
            proptest::sample::select(columns),
            arb_filter_operator(),
            prop::option::of(prop_oneof![arb_text_value(), arb_number_value()]),
        )
            .prop_map(|(column_id, operator, value)| FilterRule::new(column_id, operator, value))
    }

    /// A view configuration over `columns`. Sort entries may repeat a
    /// column; construction keeps the first.
    ///
    /// `columns` must not be empty.
    pub fn arb_view_config(columns: Vec<ColumnId>) -> impl Strategy<Value = ViewConfig> {
        let visibility = prop::collection::vec(
            (proptest::sample::select(columns.clone()), any::<bool>()),
            0..=columns.len(),
        )
        .prop_map(|entries| entries.into_iter().collect::<BTreeMap<_, _>>());
        (
            prop::collection::vec(arb_sort_rule(columns.clone()), 0..4),
            prop::collection::vec(arb_filter_rule(columns), 0..4),
            visibility,
        )
            .prop_map(|(sorting, filters, visibility)| {
                ViewConfig::from_parts(sorting, filters, visibility)
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built tables for common testing scenarios.

    use super::*;
    use std::collections::HashMap;
    use tabula_storage::{TableStore, ViewRecord};

    /// A table written to a store by [`seed_table`].
    #[derive(Debug, Clone)]
    pub struct SeededTable {
        pub base: Base,
        pub table: Table,
        pub columns: Vec<Column>,
        pub rows: Vec<Row>,
        pub cells: Vec<Cell>,
        pub view: View,
    }

    impl SeededTable {
        /// The cell of `row` in `column`, by index.
        pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
            let row_id = self.rows.get(row)?.row_id;
            let column_id = self.columns.get(column)?.column_id;
            self.cells
                .iter()
                .find(|cell| cell.row_id == row_id && cell.column_id == column_id)
        }
    }

    /// Write a base owned by `owner` with one table, the given columns, one
    /// row per entry of `values` and a default view.
    ///
    /// Missing trailing values in a row are stored as empty cells.
    pub async fn seed_table(
        store: &InMemoryStore,
        owner: &str,
        columns: &[(&str, ColumnType)],
        values: &[&[&str]],
    ) -> TabulaResult<SeededTable> {
        let base = Base::new(owner, "Fixture Base", BaseTheme::Blue);
        store.base_insert(&base).await?;
        let table = Table::new(base.base_id, "Fixture Table");
        store.table_insert(&table).await?;

        let mut stored_columns = Vec::with_capacity(columns.len());
        for (name, column_type) in columns {
            let column = Column::new(table.table_id, *name, *column_type, 0);
            let (column, _) = store.column_append(&column).await?;
            stored_columns.push(column);
        }

        let rows: Vec<Row> = values.iter().map(|_| Row::new(table.table_id, 0)).collect();
        let cells: Vec<Cell> = rows
            .iter()
            .zip(values)
            .flat_map(|(row, row_values)| {
                stored_columns.iter().enumerate().map(move |(i, column)| {
                    let mut cell = Cell::empty(row.row_id, column.column_id);
                    cell.value = row_values.get(i).copied().unwrap_or_default().to_string();
                    cell
                })
            })
            .collect();
        let (rows, _) = store.rows_append(table.table_id, &rows, &cells).await?;

        let view = View::new(
            table.table_id,
            "Grid view",
            ViewConfig::with_visible_columns(stored_columns.iter().map(|c| c.column_id)),
        );
        let record = ViewRecord::from_view(&view)
            .map_err(|e| TabulaError::Validation(tabula_core::ValidationError::InvalidValue {
                field: "view".to_string(),
                reason: e.to_string(),
            }))?;
        store.view_insert(&record).await?;

        Ok(SeededTable {
            base,
            table,
            columns: stored_columns,
            rows,
            cells,
            view,
        })
    }

    /// In-memory grid for view evaluation tests: a TEXT "Name" column and a
    /// NUMBER "Age" column over five people.
    pub fn people_grid() -> (Vec<(ColumnId, ColumnType)>, Vec<HashMap<ColumnId, String>>) {
        let name = ColumnId::now_v7();
        let age = ColumnId::now_v7();
        let people = [
            ("alice", "34"),
            ("Bob", "27"),
            ("carol", ""),
            ("Dave", "41"),
            ("eve", "27"),
        ];
        let rows = people
            .iter()
            .map(|(n, a)| HashMap::from([(name, n.to_string()), (age, a.to_string())]))
            .collect();
        (vec![(name, ColumnType::Text), (age, ColumnType::Number)], rows)
    }
}
