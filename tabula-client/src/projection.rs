//! Client-side projection of one table.
//!
//! A [`Projection`] is a plain value: columns in position order, rows in
//! display order with their cells keyed by column, and the table's views.
//! The sync engine keeps two of them (confirmed and visible) and rebuilds
//! one from the other, so every mutation entry point here is
//! deterministic.

use std::collections::HashMap;

use tabula_api::{RowData, TableDataResponse};
use tabula_core::{
    evaluate_view, Cell, CellId, Column, ColumnId, ColumnType, RowId, RowValues, Table, View,
    ViewConfig, ViewId,
};

use crate::keys::{Key, TempId};

pub type ColumnKey = Key<ColumnId>;
pub type RowKey = Key<RowId>;
pub type ViewKey = Key<ViewId>;

/// View configuration whose column references may still be speculative.
pub type LocalViewConfig = ViewConfig<ColumnKey>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnState {
    pub key: ColumnKey,
    pub name: String,
    pub column_type: ColumnType,
}

/// A cell value. `cell_id` is `None` until the server has created the cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellState {
    pub cell_id: Option<CellId>,
    pub value: String,
}

impl CellState {
    fn pending() -> Self {
        Self::default()
    }
}

impl From<&Cell> for CellState {
    fn from(cell: &Cell) -> Self {
        Self {
            cell_id: Some(cell.cell_id),
            value: cell.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
    pub key: RowKey,
    /// Server position; `None` while the row is speculative.
    pub position: Option<u64>,
    pub cells: HashMap<ColumnKey, CellState>,
}

impl RowState {
    fn from_row_data(row: &RowData) -> Self {
        Self {
            key: Key::Real(row.row_id),
            position: Some(row.position),
            cells: row
                .cells
                .iter()
                .map(|cell| (Key::Real(cell.column_id), CellState::from(cell)))
                .collect(),
        }
    }
}

impl RowValues<ColumnKey> for RowState {
    fn value(&self, column: &ColumnKey) -> Option<&str> {
        self.cells.get(column).map(|cell| cell.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub key: ViewKey,
    pub name: String,
    pub config: LocalViewConfig,
}

impl From<&View> for ViewState {
    fn from(view: &View) -> Self {
        Self {
            key: Key::Real(view.view_id),
            name: view.name.clone(),
            config: view.config.clone().map_columns(Key::Real),
        }
    }
}

/// In-memory state of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    table: Table,
    columns: Vec<ColumnState>,
    rows: Vec<RowState>,
    views: Vec<ViewState>,
}

impl Projection {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Assemble a projection from the pages of a table fetch. Columns and
    /// views are taken from the first page.
    pub fn from_pages(pages: Vec<TableDataResponse>) -> Option<Self> {
        let mut pages = pages.into_iter();
        let first = pages.next()?;

        let mut columns = first.columns;
        columns.sort_by_key(|column| column.position);
        let mut projection = Self::new(first.table);
        projection.columns = columns
            .iter()
            .map(|column| ColumnState {
                key: Key::Real(column.column_id),
                name: column.name.clone(),
                column_type: column.column_type,
            })
            .collect();
        projection.views = first.views.iter().map(ViewState::from).collect();

        let mut rows = first.rows;
        rows.extend(pages.flat_map(|page| page.rows));
        projection.upsert_rows(&rows);
        Some(projection)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    pub fn rows(&self) -> &[RowState] {
        &self.rows
    }

    pub fn views(&self) -> &[ViewState] {
        &self.views
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&ColumnState> {
        self.columns.iter().find(|column| &column.key == key)
    }

    pub fn row(&self, key: &RowKey) -> Option<&RowState> {
        self.rows.iter().find(|row| &row.key == key)
    }

    pub fn view(&self, key: &ViewKey) -> Option<&ViewState> {
        self.views.iter().find(|view| &view.key == key)
    }

    pub fn cell(&self, row: &RowKey, column: &ColumnKey) -> Option<&CellState> {
        self.row(row)?.cells.get(column)
    }

    /// Displayed value of a cell.
    pub fn value(&self, row: &RowKey, column: &ColumnKey) -> Option<&str> {
        self.cell(row, column).map(|cell| cell.value.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).sum()
    }

    /// Every temporary identifier still present anywhere in the projection.
    pub fn temp_ids(&self) -> Vec<TempId> {
        let mut temps: Vec<TempId> = self
            .columns
            .iter()
            .filter_map(|column| column.key.temp())
            .chain(self.rows.iter().flat_map(|row| {
                row.key
                    .temp()
                    .into_iter()
                    .chain(row.cells.keys().filter_map(|column| column.temp()))
            }))
            .chain(self.views.iter().flat_map(|view| {
                view.key.temp().into_iter().chain(
                    view.config
                        .referenced_columns()
                        .into_iter()
                        .filter_map(|column| column.temp()),
                )
            }))
            .collect();
        temps.sort();
        temps.dedup();
        temps
    }

    /// Rows the view shows, filtered and sorted. `None` for an unknown view.
    pub fn evaluate(&self, view: &ViewKey) -> Option<Vec<&RowState>> {
        let view = self.view(view)?;
        let columns: Vec<(ColumnKey, ColumnType)> = self
            .columns
            .iter()
            .map(|column| (column.key, column.column_type))
            .collect();
        let order = evaluate_view(&columns, &self.rows, &view.config);
        Some(order.into_iter().map(|index| &self.rows[index]).collect())
    }

    /// Columns the view shows, in position order.
    pub fn visible_columns(&self, view: &ViewKey) -> Option<Vec<&ColumnState>> {
        let view = self.view(view)?;
        Some(
            self.columns
                .iter()
                .filter(|column| view.config.is_visible(&column.key))
                .collect(),
        )
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Insert or replace a server row, keeping confirmed rows in position
    /// order ahead of speculative ones.
    pub(crate) fn upsert_row(&mut self, row: &RowData) {
        self.upsert_rows(std::slice::from_ref(row));
    }

    /// Batch form of [`Projection::upsert_row`].
    pub(crate) fn upsert_rows(&mut self, rows: &[RowData]) {
        let index: HashMap<RowKey, usize> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.key, i))
            .collect();
        let mut fresh = Vec::new();
        for row in rows {
            let state = RowState::from_row_data(row);
            match index.get(&state.key) {
                Some(&i) => self.rows[i] = state,
                None => fresh.push(state),
            }
        }
        if fresh.is_empty() {
            return;
        }
        self.rows.extend(fresh);
        // Stable: equal positions keep arrival order, speculative rows stay last.
        self.rows
            .sort_by_key(|row| row.position.map_or((1, 0), |position| (0, position)));
    }

    /// Append a speculative row with an empty cell for every column.
    pub(crate) fn push_pending_row(&mut self, key: RowKey) {
        let cells = self
            .columns
            .iter()
            .map(|column| (column.key, CellState::pending()))
            .collect();
        self.rows.push(RowState {
            key,
            position: None,
            cells,
        });
    }

    pub(crate) fn remove_row(&mut self, key: &RowKey) -> Option<RowState> {
        let index = self.rows.iter().position(|row| &row.key == key)?;
        Some(self.rows.remove(index))
    }

    /// Append a column and give every row an empty cell for it.
    pub(crate) fn push_column(&mut self, column: ColumnState) {
        for row in &mut self.rows {
            row.cells.entry(column.key).or_insert_with(CellState::pending);
        }
        self.columns.push(column);
    }

    /// Append a server column and attach the cells it was created with.
    /// Returns the cells whose row is not in the projection.
    pub(crate) fn push_server_column(&mut self, column: &Column, cells: &[Cell]) -> Vec<Cell> {
        let key = Key::Real(column.column_id);
        if self.column(&key).is_none() {
            self.push_column(ColumnState {
                key,
                name: column.name.clone(),
                column_type: column.column_type,
            });
        }
        let mut by_row: HashMap<RowKey, &Cell> =
            cells.iter().map(|cell| (Key::Real(cell.row_id), cell)).collect();
        for row in &mut self.rows {
            if let Some(cell) = by_row.remove(&row.key) {
                row.cells.insert(Key::Real(cell.column_id), CellState::from(cell));
            }
        }
        by_row.into_values().cloned().collect()
    }

    pub(crate) fn rename_column(&mut self, key: &ColumnKey, name: &str) -> bool {
        match self.columns.iter_mut().find(|column| &column.key == key) {
            Some(column) => {
                column.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_value(&mut self, row: &RowKey, column: &ColumnKey, value: &str) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|r| &r.key == row)
            .and_then(|r| r.cells.get_mut(column))
        {
            Some(cell) => {
                cell.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Store an authoritative cell. Ignored when its row is absent.
    pub(crate) fn set_server_cell(&mut self, cell: &Cell) {
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|row| row.key == Key::Real(cell.row_id))
        {
            row.cells
                .insert(Key::Real(cell.column_id), CellState::from(cell));
        }
    }

    pub(crate) fn upsert_view(&mut self, view: ViewState) {
        match self.views.iter_mut().find(|v| v.key == view.key) {
            Some(existing) => *existing = view,
            None => self.views.push(view),
        }
    }

    pub(crate) fn view_mut(&mut self, key: &ViewKey) -> Option<&mut ViewState> {
        self.views.iter_mut().find(|view| &view.key == key)
    }

    pub(crate) fn remove_view(&mut self, key: &ViewKey) -> Option<ViewState> {
        let index = self.views.iter().position(|view| &view.key == key)?;
        Some(self.views.remove(index))
    }

    /// Drop rows and views the predicates reject.
    pub(crate) fn retain(
        &mut self,
        keep_row: impl Fn(&RowKey) -> bool,
        keep_view: impl Fn(&ViewKey) -> bool,
    ) {
        self.rows.retain(|row| keep_row(&row.key));
        self.views.retain(|view| keep_view(&view.key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{BaseId, EntityIdType, Row, SortRule};

    fn page(rows: usize) -> TableDataResponse {
        let table = Table::new(BaseId::now_v7(), "Table 1");
        let column = Column::new(table.table_id, "Name", ColumnType::Text, 0);
        let rows: Vec<RowData> = (0..rows)
            .map(|i| {
                let row = Row::new(table.table_id, i as u64);
                let mut cell = Cell::empty(row.row_id, column.column_id);
                cell.value = format!("row {}", i);
                RowData::new(&row, vec![cell])
            })
            .collect();
        let view = View::new(
            table.table_id,
            "Grid view",
            ViewConfig::from_parts(vec![SortRule::desc(column.column_id)], Vec::new(), Default::default()),
        );
        TableDataResponse {
            table,
            columns: vec![column],
            rows,
            views: vec![view],
            next_cursor: None,
        }
    }

    #[test]
    fn test_from_pages_builds_real_keys() {
        let data = page(3);
        let projection = Projection::from_pages(vec![data]).expect("projection");
        assert_eq!(projection.row_count(), 3);
        assert_eq!(projection.cell_count(), 3);
        assert!(projection.temp_ids().is_empty());
    }

    #[test]
    fn test_pending_row_gets_empty_cells() {
        let mut projection = Projection::from_pages(vec![page(1)]).expect("projection");
        let temp = crate::keys::TempIds::new().mint();
        projection.push_pending_row(Key::Temp(temp));
        let row = projection.row(&Key::Temp(temp)).expect("pending row");
        assert_eq!(row.cells.len(), 1);
        assert!(row.cells.values().all(|cell| cell.cell_id.is_none() && cell.value.is_empty()));
        assert_eq!(projection.temp_ids(), vec![temp]);
    }

    #[test]
    fn test_evaluate_applies_view_sort() {
        let projection = Projection::from_pages(vec![page(3)]).expect("projection");
        let view = projection.views()[0].key;
        let column = projection.columns()[0].key;
        let rows = projection.evaluate(&view).expect("view exists");
        let values: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.value(&column))
            .collect();
        assert_eq!(values, vec!["row 2", "row 1", "row 0"]);
    }

    #[test]
    fn test_upsert_row_keeps_position_order() {
        let mut projection = Projection::from_pages(vec![page(2)]).expect("projection");
        let table_id = projection.table().table_id;
        let early = Row::new(table_id, 0);
        let late = Row::new(table_id, 10);
        projection.upsert_row(&RowData::new(&late, Vec::new()));
        projection.upsert_row(&RowData::new(&early, Vec::new()));
        let positions: Vec<Option<u64>> = projection.rows().iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![Some(0), Some(0), Some(1), Some(10)]);
    }
}
