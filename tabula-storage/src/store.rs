//! Async storage trait for Tabula entities.

use crate::{BaseUpdate, ViewRecord, ViewUpdate};
use async_trait::async_trait;
use tabula_core::{
    Base, BaseId, Cell, CellId, Column, ColumnId, Row, RowId, TabulaResult, Table, TableId,
    ViewId,
};

/// Entity counts of one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub columns: usize,
    pub rows: usize,
    pub cells: usize,
    pub views: usize,
}

/// Storage for bases and everything they contain.
///
/// Multi-entity writes (`rows_append`, `column_append`, deletes) are atomic:
/// either every record is written or none is.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Check that the store can serve requests.
    async fn health_check(&self) -> TabulaResult<()> {
        Ok(())
    }

    // ========================================================================
    // BASE OPERATIONS
    // ========================================================================

    async fn base_insert(&self, base: &Base) -> TabulaResult<()>;

    async fn base_get(&self, id: BaseId) -> TabulaResult<Option<Base>>;

    /// All bases owned by `owner_id`, most recently updated first.
    async fn base_list_by_owner(&self, owner_id: &str) -> TabulaResult<Vec<Base>>;

    async fn base_update(&self, id: BaseId, update: BaseUpdate) -> TabulaResult<Base>;

    /// Bump `updated_at` after a change anywhere inside the base.
    async fn base_touch(&self, id: BaseId) -> TabulaResult<()>;

    /// Delete a base and everything in it. Returns false if it did not exist.
    async fn base_delete(&self, id: BaseId) -> TabulaResult<bool>;

    // ========================================================================
    // TABLE OPERATIONS
    // ========================================================================

    async fn table_insert(&self, table: &Table) -> TabulaResult<()>;

    async fn table_get(&self, id: TableId) -> TabulaResult<Option<Table>>;

    /// Tables of a base in creation order.
    async fn table_list_by_base(&self, base_id: BaseId) -> TabulaResult<Vec<Table>>;

    async fn table_counts(&self, id: TableId) -> TabulaResult<TableCounts>;

    // ========================================================================
    // COLUMN OPERATIONS
    // ========================================================================

    /// Append a column after the existing ones and seed an empty cell for it
    /// in every row of the table, in row position order. The stored position
    /// is assigned here.
    async fn column_append(&self, column: &Column) -> TabulaResult<(Column, Vec<Cell>)>;

    async fn column_get(&self, id: ColumnId) -> TabulaResult<Option<Column>>;

    /// Columns of a table ordered by position.
    async fn column_list_by_table(&self, table_id: TableId) -> TabulaResult<Vec<Column>>;

    async fn column_rename(&self, id: ColumnId, name: &str) -> TabulaResult<Column>;

    // ========================================================================
    // ROW OPERATIONS
    // ========================================================================

    /// Append rows after the existing ones, together with their cells.
    /// Positions are assigned here. Every row gets a cell for every column of
    /// the table; columns `cells` does not cover are seeded empty. Returns the
    /// stored rows in order and all written cells, grouped by row in column
    /// position order.
    async fn rows_append(
        &self,
        table_id: TableId,
        rows: &[Row],
        cells: &[Cell],
    ) -> TabulaResult<(Vec<Row>, Vec<Cell>)>;

    async fn row_get(&self, id: RowId) -> TabulaResult<Option<Row>>;

    /// Up to `limit` rows with position greater than `after`, in position order.
    async fn row_page(
        &self,
        table_id: TableId,
        after: Option<u64>,
        limit: usize,
    ) -> TabulaResult<Vec<Row>>;

    /// Delete a row and its cells. Returns false if it did not exist.
    async fn row_delete(&self, id: RowId) -> TabulaResult<bool>;

    // ========================================================================
    // CELL OPERATIONS
    // ========================================================================

    async fn cell_get(&self, id: CellId) -> TabulaResult<Option<Cell>>;

    async fn cell_update_value(&self, id: CellId, value: &str) -> TabulaResult<Cell>;

    /// Cells belonging to any of `row_ids`.
    async fn cells_for_rows(&self, row_ids: &[RowId]) -> TabulaResult<Vec<Cell>>;

    // ========================================================================
    // VIEW OPERATIONS
    // ========================================================================

    async fn view_insert(&self, view: &ViewRecord) -> TabulaResult<()>;

    async fn view_get(&self, id: ViewId) -> TabulaResult<Option<ViewRecord>>;

    /// Views of a table in creation order.
    async fn view_list_by_table(&self, table_id: TableId) -> TabulaResult<Vec<ViewRecord>>;

    async fn view_update(&self, id: ViewId, update: ViewUpdate) -> TabulaResult<ViewRecord>;

    /// Returns false if the view did not exist.
    async fn view_delete(&self, id: ViewId) -> TabulaResult<bool>;
}
