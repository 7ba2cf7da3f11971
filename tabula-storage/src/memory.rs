//! In-memory [`TableStore`] used by the API server and tests.

use crate::{BaseUpdate, TableCounts, TableStore, ViewRecord, ViewUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tabula_core::{
    Base, BaseId, Cell, CellId, Column, ColumnId, EntityType, Row, RowId, StorageError,
    TabulaError, TabulaResult, Table, TableId, ViewId,
};

#[derive(Debug, Default)]
struct Inner {
    bases: HashMap<BaseId, Base>,
    tables: HashMap<TableId, Table>,
    columns: HashMap<ColumnId, Column>,
    rows: HashMap<RowId, Row>,
    // position -> row, per table
    table_rows: HashMap<TableId, BTreeMap<u64, RowId>>,
    // positions are never reused after a delete
    next_row_position: HashMap<TableId, u64>,
    cells: HashMap<CellId, Cell>,
    row_cells: HashMap<RowId, HashMap<ColumnId, CellId>>,
    views: HashMap<ViewId, ViewRecord>,
}

impl Inner {
    fn require_table(&self, id: TableId) -> TabulaResult<&Table> {
        self.tables
            .get(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::Table, id))
    }

    fn columns_of(&self, table_id: TableId) -> impl Iterator<Item = &Column> {
        self.columns
            .values()
            .filter(move |column| column.table_id == table_id)
    }

    fn remove_row(&mut self, id: RowId) -> bool {
        let Some(row) = self.rows.remove(&id) else {
            return false;
        };
        if let Some(positions) = self.table_rows.get_mut(&row.table_id) {
            positions.remove(&row.position);
        }
        if let Some(cells) = self.row_cells.remove(&id) {
            for cell_id in cells.values() {
                self.cells.remove(cell_id);
            }
        }
        true
    }

    fn remove_table(&mut self, id: TableId) {
        let row_ids: Vec<RowId> = self
            .table_rows
            .remove(&id)
            .map(|positions| positions.into_values().collect())
            .unwrap_or_default();
        for row_id in row_ids {
            self.remove_row(row_id);
        }
        self.next_row_position.remove(&id);
        self.columns.retain(|_, column| column.table_id != id);
        self.views.retain(|_, view| view.table_id != id);
        self.tables.remove(&id);
    }
}

fn already_exists(entity_type: EntityType) -> TabulaError {
    TabulaError::Storage(StorageError::InsertFailed {
        entity_type,
        reason: "already exists".to_string(),
    })
}

fn insert_failed(entity_type: EntityType, reason: impl Into<String>) -> TabulaError {
    TabulaError::Storage(StorageError::InsertFailed {
        entity_type,
        reason: reason.into(),
    })
}

/// In-memory storage behind a single lock, so multi-entity writes are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Number of stored bases.
    pub fn base_count(&self) -> TabulaResult<usize> {
        Ok(self.read()?.bases.len())
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn health_check(&self) -> TabulaResult<()> {
        let _inner = self.read()?;
        Ok(())
    }

    // === Base Operations ===

    async fn base_insert(&self, base: &Base) -> TabulaResult<()> {
        let mut inner = self.write()?;
        if inner.bases.contains_key(&base.base_id) {
            return Err(already_exists(EntityType::Base));
        }
        inner.bases.insert(base.base_id, base.clone());
        Ok(())
    }

    async fn base_get(&self, id: BaseId) -> TabulaResult<Option<Base>> {
        Ok(self.read()?.bases.get(&id).cloned())
    }

    async fn base_list_by_owner(&self, owner_id: &str) -> TabulaResult<Vec<Base>> {
        let inner = self.read()?;
        let mut bases: Vec<Base> = inner
            .bases
            .values()
            .filter(|base| base.owner_id == owner_id)
            .cloned()
            .collect();
        bases.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.base_id.cmp(&a.base_id))
        });
        Ok(bases)
    }

    async fn base_update(&self, id: BaseId, update: BaseUpdate) -> TabulaResult<Base> {
        let mut inner = self.write()?;
        let base = inner
            .bases
            .get_mut(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::Base, id))?;
        if let Some(name) = update.name {
            base.name = name;
        }
        if let Some(theme) = update.theme {
            base.theme = theme;
        }
        base.updated_at = Utc::now();
        Ok(base.clone())
    }

    async fn base_touch(&self, id: BaseId) -> TabulaResult<()> {
        let mut inner = self.write()?;
        let base = inner
            .bases
            .get_mut(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::Base, id))?;
        base.updated_at = Utc::now();
        Ok(())
    }

    async fn base_delete(&self, id: BaseId) -> TabulaResult<bool> {
        let mut inner = self.write()?;
        if inner.bases.remove(&id).is_none() {
            return Ok(false);
        }
        let table_ids: Vec<TableId> = inner
            .tables
            .values()
            .filter(|table| table.base_id == id)
            .map(|table| table.table_id)
            .collect();
        for table_id in table_ids {
            inner.remove_table(table_id);
        }
        Ok(true)
    }

    // === Table Operations ===

    async fn table_insert(&self, table: &Table) -> TabulaResult<()> {
        let mut inner = self.write()?;
        if !inner.bases.contains_key(&table.base_id) {
            return Err(TabulaError::not_found(EntityType::Base, table.base_id));
        }
        if inner.tables.contains_key(&table.table_id) {
            return Err(already_exists(EntityType::Table));
        }
        inner.tables.insert(table.table_id, table.clone());
        Ok(())
    }

    async fn table_get(&self, id: TableId) -> TabulaResult<Option<Table>> {
        Ok(self.read()?.tables.get(&id).cloned())
    }

    async fn table_list_by_base(&self, base_id: BaseId) -> TabulaResult<Vec<Table>> {
        let inner = self.read()?;
        let mut tables: Vec<Table> = inner
            .tables
            .values()
            .filter(|table| table.base_id == base_id)
            .cloned()
            .collect();
        tables.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.table_id.cmp(&b.table_id))
        });
        Ok(tables)
    }

    async fn table_counts(&self, id: TableId) -> TabulaResult<TableCounts> {
        let inner = self.read()?;
        inner.require_table(id)?;
        let row_ids: Vec<&RowId> = inner
            .table_rows
            .get(&id)
            .map(|positions| positions.values().collect())
            .unwrap_or_default();
        let cells = row_ids
            .iter()
            .filter_map(|row_id| inner.row_cells.get(*row_id))
            .map(HashMap::len)
            .sum();
        Ok(TableCounts {
            columns: inner.columns_of(id).count(),
            rows: row_ids.len(),
            cells,
            views: inner.views.values().filter(|v| v.table_id == id).count(),
        })
    }

    // === Column Operations ===

    async fn column_append(&self, column: &Column) -> TabulaResult<(Column, Vec<Cell>)> {
        let mut inner = self.write()?;
        inner.require_table(column.table_id)?;
        if inner.columns.contains_key(&column.column_id) {
            return Err(already_exists(EntityType::Column));
        }

        let position = inner
            .columns_of(column.table_id)
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);
        let mut stored = column.clone();
        stored.position = position;
        inner.columns.insert(stored.column_id, stored.clone());

        // Read rows under the same lock so a concurrent rows_append cannot
        // slip in between the column insert and the cell seeding.
        let row_ids: Vec<RowId> = inner
            .table_rows
            .get(&column.table_id)
            .map(|positions| positions.values().copied().collect())
            .unwrap_or_default();
        let mut cells = Vec::with_capacity(row_ids.len());
        for row_id in row_ids {
            let cell = Cell::empty(row_id, stored.column_id);
            inner
                .row_cells
                .entry(row_id)
                .or_default()
                .insert(cell.column_id, cell.cell_id);
            inner.cells.insert(cell.cell_id, cell.clone());
            cells.push(cell);
        }
        Ok((stored, cells))
    }

    async fn column_get(&self, id: ColumnId) -> TabulaResult<Option<Column>> {
        Ok(self.read()?.columns.get(&id).cloned())
    }

    async fn column_list_by_table(&self, table_id: TableId) -> TabulaResult<Vec<Column>> {
        let inner = self.read()?;
        let mut columns: Vec<Column> = inner.columns_of(table_id).cloned().collect();
        columns.sort_by_key(|column| column.position);
        Ok(columns)
    }

    async fn column_rename(&self, id: ColumnId, name: &str) -> TabulaResult<Column> {
        let mut inner = self.write()?;
        let column = inner
            .columns
            .get_mut(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::Column, id))?;
        column.name = name.to_string();
        Ok(column.clone())
    }

    // === Row Operations ===

    async fn rows_append(
        &self,
        table_id: TableId,
        rows: &[Row],
        cells: &[Cell],
    ) -> TabulaResult<(Vec<Row>, Vec<Cell>)> {
        let mut inner = self.write()?;
        inner.require_table(table_id)?;

        let mut batch = HashSet::with_capacity(rows.len());
        for row in rows {
            if row.table_id != table_id {
                return Err(insert_failed(EntityType::Row, "row belongs to another table"));
            }
            if inner.rows.contains_key(&row.row_id) || !batch.insert(row.row_id) {
                return Err(already_exists(EntityType::Row));
            }
        }
        let mut columns: Vec<&Column> = inner.columns_of(table_id).collect();
        columns.sort_by_key(|c| c.position);
        let column_order: Vec<ColumnId> = columns.iter().map(|c| c.column_id).collect();
        let table_columns: HashSet<ColumnId> = column_order.iter().copied().collect();
        let mut pairs = HashSet::with_capacity(cells.len());
        for cell in cells {
            if !batch.contains(&cell.row_id) {
                return Err(insert_failed(EntityType::Cell, "cell row is not in this batch"));
            }
            if !table_columns.contains(&cell.column_id) {
                return Err(TabulaError::not_found(EntityType::Column, cell.column_id));
            }
            if !pairs.insert((cell.row_id, cell.column_id)) || inner.cells.contains_key(&cell.cell_id)
            {
                return Err(already_exists(EntityType::Cell));
            }
        }

        let mut position = inner.next_row_position.get(&table_id).copied().unwrap_or(0);
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = row.clone();
            row.position = position;
            position += 1;
            inner
                .table_rows
                .entry(table_id)
                .or_default()
                .insert(row.position, row.row_id);
            inner.rows.insert(row.row_id, row.clone());
            stored.push(row);
        }
        inner.next_row_position.insert(table_id, position);

        // Columns the batch has no cell for get an empty one.
        let mut supplied: HashMap<(RowId, ColumnId), &Cell> =
            cells.iter().map(|c| ((c.row_id, c.column_id), c)).collect();
        let mut written = Vec::with_capacity(stored.len() * column_order.len());
        for row in &stored {
            for column_id in &column_order {
                let cell = supplied
                    .remove(&(row.row_id, *column_id))
                    .cloned()
                    .unwrap_or_else(|| Cell::empty(row.row_id, *column_id));
                inner
                    .row_cells
                    .entry(cell.row_id)
                    .or_default()
                    .insert(cell.column_id, cell.cell_id);
                inner.cells.insert(cell.cell_id, cell.clone());
                written.push(cell);
            }
        }
        Ok((stored, written))
    }

    async fn row_get(&self, id: RowId) -> TabulaResult<Option<Row>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    async fn row_page(
        &self,
        table_id: TableId,
        after: Option<u64>,
        limit: usize,
    ) -> TabulaResult<Vec<Row>> {
        let inner = self.read()?;
        let Some(positions) = inner.table_rows.get(&table_id) else {
            return Ok(Vec::new());
        };
        let range = match after {
            Some(after) => positions.range(after.saturating_add(1)..),
            None => positions.range(..),
        };
        Ok(range
            .take(limit)
            .filter_map(|(_, row_id)| inner.rows.get(row_id).cloned())
            .collect())
    }

    async fn row_delete(&self, id: RowId) -> TabulaResult<bool> {
        Ok(self.write()?.remove_row(id))
    }

    // === Cell Operations ===

    async fn cell_get(&self, id: CellId) -> TabulaResult<Option<Cell>> {
        Ok(self.read()?.cells.get(&id).cloned())
    }

    async fn cell_update_value(&self, id: CellId, value: &str) -> TabulaResult<Cell> {
        let mut inner = self.write()?;
        let cell = inner
            .cells
            .get_mut(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::Cell, id))?;
        cell.value = value.to_string();
        Ok(cell.clone())
    }

    async fn cells_for_rows(&self, row_ids: &[RowId]) -> TabulaResult<Vec<Cell>> {
        let inner = self.read()?;
        Ok(row_ids
            .iter()
            .filter_map(|row_id| inner.row_cells.get(row_id))
            .flat_map(|cells| cells.values())
            .filter_map(|cell_id| inner.cells.get(cell_id).cloned())
            .collect())
    }

    // === View Operations ===

    async fn view_insert(&self, view: &ViewRecord) -> TabulaResult<()> {
        let mut inner = self.write()?;
        inner.require_table(view.table_id)?;
        if inner.views.contains_key(&view.view_id) {
            return Err(already_exists(EntityType::View));
        }
        inner.views.insert(view.view_id, view.clone());
        Ok(())
    }

    async fn view_get(&self, id: ViewId) -> TabulaResult<Option<ViewRecord>> {
        Ok(self.read()?.views.get(&id).cloned())
    }

    async fn view_list_by_table(&self, table_id: TableId) -> TabulaResult<Vec<ViewRecord>> {
        let inner = self.read()?;
        let mut views: Vec<ViewRecord> = inner
            .views
            .values()
            .filter(|view| view.table_id == table_id)
            .cloned()
            .collect();
        views.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.view_id.cmp(&b.view_id))
        });
        Ok(views)
    }

    async fn view_update(&self, id: ViewId, update: ViewUpdate) -> TabulaResult<ViewRecord> {
        let mut inner = self.write()?;
        let view = inner
            .views
            .get_mut(&id)
            .ok_or_else(|| TabulaError::not_found(EntityType::View, id))?;
        if let Some(name) = update.name {
            view.name = name;
        }
        if let Some(config) = update.config {
            view.apply_config(config);
        }
        view.updated_at = Utc::now();
        Ok(view.clone())
    }

    async fn view_delete(&self, id: ViewId) -> TabulaResult<bool> {
        Ok(self.write()?.views.remove(&id).is_some())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{BaseTheme, ColumnType, EntityIdType, View, ViewConfig};

    struct Seeded {
        store: InMemoryStore,
        base: Base,
        table: Table,
        column: Column,
    }

    async fn seeded() -> TabulaResult<Seeded> {
        let store = InMemoryStore::new();
        let base = Base::new("user-1", "Untitled Base", BaseTheme::Blue);
        store.base_insert(&base).await?;
        let table = Table::new(base.base_id, "Table 1");
        store.table_insert(&table).await?;
        let column = Column::new(table.table_id, "Name", ColumnType::Text, 0);
        let (column, _) = store.column_append(&column).await?;
        Ok(Seeded {
            store,
            base,
            table,
            column,
        })
    }

    fn rows_with_cells(table_id: TableId, columns: &[ColumnId], n: usize) -> (Vec<Row>, Vec<Cell>) {
        let rows: Vec<Row> = (0..n).map(|_| Row::new(table_id, 0)).collect();
        let cells = rows
            .iter()
            .flat_map(|row| columns.iter().map(|c| Cell::empty(row.row_id, *c)))
            .collect();
        (rows, cells)
    }

    #[tokio::test]
    async fn test_base_insert_duplicate() -> TabulaResult<()> {
        let s = seeded().await?;
        assert!(s.store.base_insert(&s.base).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_append_assigns_increasing_positions() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 3);
        let (first, _) = s.store.rows_append(s.table.table_id, &rows, &cells).await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        let (second, _) = s.store.rows_append(s.table.table_id, &rows, &cells).await?;

        let positions: Vec<u64> = first.iter().chain(&second).map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);

        let counts = s.store.table_counts(s.table.table_id).await?;
        assert_eq!(counts.rows, 5);
        assert_eq!(counts.cells, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_append_is_atomic_on_bad_cell() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, mut cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        cells.push(Cell::empty(rows[0].row_id, s.column.column_id));

        assert!(s.store.rows_append(s.table.table_id, &rows, &cells).await.is_err());
        let counts = s.store.table_counts(s.table.table_id).await?;
        assert_eq!(counts.rows, 0);
        assert_eq!(counts.cells, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_row_page_uses_position_cursor() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 5);
        s.store.rows_append(s.table.table_id, &rows, &cells).await?;

        let page = s.store.row_page(s.table.table_id, None, 2).await?;
        assert_eq!(page.len(), 2);
        let next = s
            .store
            .row_page(s.table.table_id, Some(page[1].position), 10)
            .await?;
        assert_eq!(next.len(), 3);
        assert_eq!(next[0].position, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_column_append_seeds_cell_per_row() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        s.store.rows_append(s.table.table_id, &rows, &cells).await?;

        let age = Column::new(s.table.table_id, "Age", ColumnType::Number, 0);
        let (stored, age_cells) = s.store.column_append(&age).await?;
        assert_eq!(stored.position, 1);
        let seeded_rows: Vec<RowId> = age_cells.iter().map(|c| c.row_id).collect();
        assert_eq!(seeded_rows, vec![rows[0].row_id, rows[1].row_id]);
        assert!(age_cells.iter().all(|c| c.column_id == age.column_id && c.value.is_empty()));

        let counts = s.store.table_counts(s.table.table_id).await?;
        assert_eq!(counts.columns, 2);
        assert_eq!(counts.cells, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_append_fills_missing_columns() -> TabulaResult<()> {
        let s = seeded().await?;
        let age = Column::new(s.table.table_id, "Age", ColumnType::Number, 0);
        let (age, _) = s.store.column_append(&age).await?;

        // batch built before "Age" existed
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        let (_, written) = s.store.rows_append(s.table.table_id, &rows, &cells).await?;
        assert_eq!(written.len(), 4);
        assert_eq!(written[0].cell_id, cells[0].cell_id);
        assert_eq!(written[1].column_id, age.column_id);
        assert_eq!(s.store.table_counts(s.table.table_id).await?.cells, 4);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_column_and_rows_leave_no_gaps() -> TabulaResult<()> {
        let s = seeded().await?;
        let store = Arc::new(s.store);
        let table_id = s.table.table_id;
        let name_column = s.column.column_id;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let column = Column::new(table_id, format!("C{i}"), ColumnType::Text, 0);
                    store.column_append(&column).await.map(|_| ())
                } else {
                    let (rows, cells) = rows_with_cells(table_id, &[name_column], 1);
                    store.rows_append(table_id, &rows, &cells).await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle
                .await
                .map_err(|e| insert_failed(EntityType::Row, e.to_string()))??;
        }

        let counts = store.table_counts(table_id).await?;
        assert_eq!(counts.rows, 8);
        assert_eq!(counts.columns, 9);
        assert_eq!(counts.cells, counts.rows * counts.columns);
        Ok(())
    }

    #[tokio::test]
    async fn test_row_delete_removes_cells() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        s.store.rows_append(s.table.table_id, &rows, &cells).await?;

        assert!(s.store.row_delete(rows[0].row_id).await?);
        assert!(!s.store.row_delete(rows[0].row_id).await?);
        assert!(s.store.cell_get(cells[0].cell_id).await?.is_none());
        assert_eq!(s.store.table_counts(s.table.table_id).await?.cells, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_base_delete_cascades() -> TabulaResult<()> {
        let s = seeded().await?;
        let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], 2);
        s.store.rows_append(s.table.table_id, &rows, &cells).await?;
        let view = View::new(s.table.table_id, "Grid view", ViewConfig::new());
        let record = ViewRecord::from_view(&view)
            .map_err(|e| insert_failed(EntityType::View, e.to_string()))?;
        s.store.view_insert(&record).await?;

        assert!(s.store.base_delete(s.base.base_id).await?);
        assert!(s.store.table_get(s.table.table_id).await?.is_none());
        assert!(s.store.column_get(s.column.column_id).await?.is_none());
        assert!(s.store.row_get(rows[0].row_id).await?.is_none());
        assert!(s.store.view_get(view.view_id).await?.is_none());
        assert!(!s.store.base_delete(s.base.base_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_base_list_by_owner_orders_by_updated_at() -> TabulaResult<()> {
        let s = seeded().await?;
        let other = Base::new("user-1", "Second", BaseTheme::Teal);
        s.store.base_insert(&other).await?;
        s.store.base_insert(&Base::new("user-2", "Theirs", BaseTheme::Red)).await?;
        s.store.base_touch(s.base.base_id).await?;

        let bases = s.store.base_list_by_owner("user-1").await?;
        assert_eq!(bases.len(), 2);
        assert_eq!(bases[0].base_id, s.base.base_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() -> TabulaResult<()> {
        let store = InMemoryStore::new();
        let err = store
            .cell_update_value(CellId::now_v7(), "x")
            .await
            .err();
        assert!(err.is_some_and(|e| e.is_not_found()));
        let err = store.table_counts(TableId::now_v7()).await.err();
        assert!(err.is_some_and(|e| e.is_not_found()));
        Ok(())
    }

    mod paging_props {
        use super::*;
        use proptest::prelude::*;

        async fn walk(total: usize, deleted: Vec<usize>, limit: usize) -> TabulaResult<()> {
            let s = seeded().await?;
            let (rows, cells) = rows_with_cells(s.table.table_id, &[s.column.column_id], total);
            s.store.rows_append(s.table.table_id, &rows, &cells).await?;
            for index in &deleted {
                s.store.row_delete(rows[index % total].row_id).await?;
            }

            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let page = s.store.row_page(s.table.table_id, cursor, limit).await?;
                assert!(page.len() <= limit);
                let Some(last) = page.last() else {
                    break;
                };
                cursor = Some(last.position);
                seen.extend(page.iter().map(|r| r.position));
            }

            let expected: Vec<u64> = s
                .store
                .row_page(s.table.table_id, None, total + 1)
                .await?
                .iter()
                .map(|r| r.position)
                .collect();
            assert_eq!(seen, expected);
            assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
            assert_eq!(seen.len(), s.store.table_counts(s.table.table_id).await?.rows);
            Ok(())
        }

        proptest! {
            #[test]
            fn row_page_walk_visits_every_row_once(
                total in 1usize..60,
                deleted in prop::collection::vec(0usize..60, 0..10),
                limit in 1usize..8,
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");
                let result = runtime.block_on(walk(total, deleted, limit));
                prop_assert!(result.is_ok(), "{:?}", result.err());
            }
        }
    }
}
