//! Optimistic mutation queue.
//!
//! [`SyncEngine`] owns two projections of the same table:
//!
//! - `confirmed`: what the server has acknowledged.
//! - `visible`: `confirmed` with every pending local patch replayed on top,
//!   in the order the mutations began.
//!
//! Each mutation is a two-phase record: [`SyncEngine::begin`] applies its
//! patch and returns a [`MutationId`]; exactly one of
//! [`SyncEngine::confirm`] or [`SyncEngine::fail`] later resolves it. A
//! failure drops only that mutation's patch, so concurrent in-flight edits
//! to other entities survive the rollback.
//!
//! Out-of-order responses are guarded per entity: a confirmation older than
//! the newest one already applied to the same cell, column or view is
//! discarded, and deleted rows and views are tombstoned so a late response
//! cannot bring them back.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tabula_api::{ColumnCreatedResponse, RowData};
use tabula_core::{
    Cell, CellId, Column, ColumnId, ColumnType, EntityType, RowId, View, ViewConfig, ViewId,
};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::keys::{Key, TempId, TempIds};
use crate::projection::{
    ColumnKey, ColumnState, LocalViewConfig, Projection, RowKey, ViewKey, ViewState,
};
use crate::reconcile::IdRemap;

/// Identifier of one optimistic mutation. Monotonic, so it doubles as the
/// generation of the write it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationId(u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    AddRows,
    AddColumn,
    EditCell,
    DeleteRow,
    RenameColumn,
    CreateView,
    UpdateView,
    DeleteView,
}

/// A speculative change to the visible projection.
///
/// Applying a patch never fails: a patch whose target has disappeared
/// (deleted by a confirmed mutation or a refresh) is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalPatch {
    AddRows {
        keys: Vec<RowKey>,
    },
    AddColumn {
        key: ColumnKey,
        name: String,
        column_type: ColumnType,
    },
    EditCell {
        row: RowKey,
        column: ColumnKey,
        value: String,
    },
    DeleteRow {
        row: RowKey,
    },
    RenameColumn {
        column: ColumnKey,
        name: String,
    },
    CreateView {
        key: ViewKey,
        name: String,
        config: LocalViewConfig,
    },
    UpdateView {
        view: ViewKey,
        name: Option<String>,
        config: Option<LocalViewConfig>,
    },
    DeleteView {
        view: ViewKey,
    },
}

impl LocalPatch {
    pub fn kind(&self) -> MutationKind {
        match self {
            LocalPatch::AddRows { .. } => MutationKind::AddRows,
            LocalPatch::AddColumn { .. } => MutationKind::AddColumn,
            LocalPatch::EditCell { .. } => MutationKind::EditCell,
            LocalPatch::DeleteRow { .. } => MutationKind::DeleteRow,
            LocalPatch::RenameColumn { .. } => MutationKind::RenameColumn,
            LocalPatch::CreateView { .. } => MutationKind::CreateView,
            LocalPatch::UpdateView { .. } => MutationKind::UpdateView,
            LocalPatch::DeleteView { .. } => MutationKind::DeleteView,
        }
    }

    /// Temporary identifiers this patch introduces.
    pub fn speculative(&self) -> Vec<TempId> {
        match self {
            LocalPatch::AddRows { keys } => keys.iter().filter_map(Key::temp).collect(),
            LocalPatch::AddColumn { key, .. } => key.temp().into_iter().collect(),
            LocalPatch::CreateView { key, .. } => key.temp().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn apply(&self, projection: &mut Projection) {
        match self {
            LocalPatch::AddRows { keys } => {
                for key in keys {
                    projection.push_pending_row(*key);
                }
            }
            LocalPatch::AddColumn {
                key,
                name,
                column_type,
            } => projection.push_column(ColumnState {
                key: *key,
                name: name.clone(),
                column_type: *column_type,
            }),
            LocalPatch::EditCell { row, column, value } => {
                projection.set_value(row, column, value);
            }
            LocalPatch::DeleteRow { row } => {
                projection.remove_row(row);
            }
            LocalPatch::RenameColumn { column, name } => {
                projection.rename_column(column, name);
            }
            LocalPatch::CreateView { key, name, config } => projection.upsert_view(ViewState {
                key: *key,
                name: name.clone(),
                config: config.clone(),
            }),
            LocalPatch::UpdateView { view, name, config } => {
                if let Some(state) = projection.view_mut(view) {
                    if let Some(name) = name {
                        state.name = name.clone();
                    }
                    if let Some(config) = config {
                        state.config = config.clone();
                    }
                }
            }
            LocalPatch::DeleteView { view } => {
                projection.remove_view(view);
            }
        }
    }

    /// Rewrite references to entities the server has since confirmed.
    pub fn remap(&mut self, remap: &IdRemap) {
        match self {
            LocalPatch::AddRows { .. } | LocalPatch::AddColumn { .. } => {}
            LocalPatch::EditCell { row, column, .. } => {
                *row = remap.row(*row);
                *column = remap.column(*column);
            }
            LocalPatch::DeleteRow { row } => *row = remap.row(*row),
            LocalPatch::RenameColumn { column, .. } => *column = remap.column(*column),
            LocalPatch::CreateView { config, .. } => {
                *config = remap.config(std::mem::take(config));
            }
            LocalPatch::UpdateView { view, config, .. } => {
                *view = remap.view(*view);
                if let Some(config) = config {
                    *config = remap.config(std::mem::take(config));
                }
            }
            LocalPatch::DeleteView { view } => *view = remap.view(*view),
        }
    }
}

/// The server's answer to a mutation, applied to the confirmed projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// Rows in the same order as the temporary keys of the patch.
    RowsAdded { rows: Vec<RowData> },
    ColumnAdded { created: ColumnCreatedResponse },
    CellEdited { cell: Cell },
    RowDeleted { row_id: RowId },
    ColumnRenamed { column: Column },
    ViewCreated { view: View },
    ViewUpdated { view: View },
    ViewDeleted { view_id: ViewId },
}

/// Entity whose confirmed writes are ordered by mutation generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationKey {
    Cell(RowId, ColumnId),
    Column(ColumnId),
    View(ViewId),
}

#[derive(Debug, Clone)]
struct PendingMutation {
    id: MutationId,
    patch: LocalPatch,
    rollback: Projection,
    version_after_begin: u64,
}

/// Explicit state container for one table: confirmed state, pending
/// mutations and the visible projection derived from both.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    confirmed: Projection,
    visible: Projection,
    pending: Vec<PendingMutation>,
    next_mutation: u64,
    temp_ids: TempIds,
    remap: IdRemap,
    generations: HashMap<GenerationKey, MutationId>,
    deleted_rows: HashSet<RowId>,
    deleted_views: HashSet<ViewId>,
    // Cells of a confirmed column whose row was still in flight.
    orphan_cells: HashMap<RowId, Vec<Cell>>,
    version: u64,
}

impl SyncEngine {
    pub fn new(confirmed: Projection) -> Self {
        Self {
            visible: confirmed.clone(),
            confirmed,
            pending: Vec::new(),
            next_mutation: 0,
            temp_ids: TempIds::new(),
            remap: IdRemap::new(),
            generations: HashMap::new(),
            deleted_rows: HashSet::new(),
            deleted_views: HashSet::new(),
            orphan_cells: HashMap::new(),
            version: 0,
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// The projection the user sees.
    pub fn visible(&self) -> &Projection {
        &self.visible
    }

    /// Server-acknowledged state.
    pub fn confirmed(&self) -> &Projection {
        &self.confirmed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: MutationId) -> bool {
        self.pending.iter().any(|m| m.id == id)
    }

    /// Kinds of the unresolved mutations, oldest first.
    pub fn pending_kinds(&self) -> Vec<MutationKind> {
        self.pending.iter().map(|m| m.patch.kind()).collect()
    }

    /// Bumped by every state change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn remap(&self) -> &IdRemap {
        &self.remap
    }

    pub fn mint_temp(&mut self) -> TempId {
        self.temp_ids.mint()
    }

    // ========================================================================
    // REFERENCE CHECKS
    // ========================================================================

    /// Server id of a visible row. Fails for rows still awaiting creation.
    pub fn require_row(&self, key: RowKey) -> Result<RowId, SyncError> {
        let key = self.remap.row(key);
        require(key, self.visible.row(&key).is_some(), EntityType::Row)
    }

    pub fn require_column(&self, key: ColumnKey) -> Result<(ColumnId, ColumnType), SyncError> {
        let key = self.remap.column(key);
        let column = self.visible.column(&key);
        let id = require(key, column.is_some(), EntityType::Column)?;
        let column_type = column.map(|c| c.column_type).unwrap_or_default();
        Ok((id, column_type))
    }

    pub fn require_view(&self, key: ViewKey) -> Result<ViewId, SyncError> {
        let key = self.remap.view(key);
        require(key, self.visible.view(&key).is_some(), EntityType::View)
    }

    /// Server id of the cell at (`row`, `column`) and its column type.
    pub fn require_cell(
        &self,
        row: RowKey,
        column: ColumnKey,
    ) -> Result<(CellId, ColumnType), SyncError> {
        let (column_id, column_type) = self.require_column(column)?;
        let row_id = self.require_row(row)?;
        self.visible
            .cell(&Key::Real(row_id), &Key::Real(column_id))
            .and_then(|cell| cell.cell_id)
            .map(|cell_id| (cell_id, column_type))
            .ok_or_else(|| SyncError::unknown(EntityType::Cell, format!("{}/{}", row_id, column_id)))
    }

    /// Convert a local configuration into one the server accepts.
    pub fn require_config(&self, config: LocalViewConfig) -> Result<ViewConfig, SyncError> {
        self.remap.config(config).try_map_columns(|key| {
            require(key, self.visible.column(&key).is_some(), EntityType::Column)
        })
    }

    pub fn ensure_view_deletable(&self, key: ViewKey) -> Result<ViewId, SyncError> {
        let id = self.require_view(key)?;
        if self.visible.views().len() <= 1 {
            return Err(SyncError::LastView);
        }
        Ok(id)
    }

    // ========================================================================
    // TWO-PHASE RESOLUTION
    // ========================================================================

    /// Apply `patch` speculatively and open a pending record for it.
    pub fn begin(&mut self, patch: LocalPatch) -> MutationId {
        self.next_mutation += 1;
        let id = MutationId(self.next_mutation);
        let rollback = self.visible.clone();
        patch.apply(&mut self.visible);
        self.version += 1;
        debug!(mutation = %id, kind = ?patch.kind(), "Began optimistic mutation");
        self.pending.push(PendingMutation {
            id,
            patch,
            rollback,
            version_after_begin: self.version,
        });
        id
    }

    /// Resolve a pending mutation with the server's answer. Returns `false`
    /// when `id` is not pending.
    pub fn confirm(&mut self, id: MutationId, confirmation: Confirmation) -> bool {
        let Some(mutation) = self.take_pending(id) else {
            debug!(mutation = %id, "Ignoring confirmation of unknown mutation");
            return false;
        };
        self.apply_confirmation(id, &mutation.patch.speculative(), confirmation);
        for pending in &mut self.pending {
            pending.patch.remap(&self.remap);
        }
        self.rebuild();
        true
    }

    /// Resolve a pending mutation as failed, removing its patch. Returns
    /// `false` when `id` is not pending.
    pub fn fail(&mut self, id: MutationId) -> bool {
        let Some(mutation) = self.take_pending(id) else {
            debug!(mutation = %id, "Ignoring failure of unknown mutation");
            return false;
        };
        if self.version == mutation.version_after_begin {
            self.visible = mutation.rollback;
            self.version += 1;
        } else {
            self.rebuild();
        }
        warn!(mutation = %id, kind = ?mutation.patch.kind(), "Rolled back optimistic mutation");
        true
    }

    /// Replace the confirmed state with a fresh fetch. Tombstoned rows and
    /// views are dropped; pending patches are replayed on top.
    pub fn replace_confirmed(&mut self, mut projection: Projection) {
        let deleted_rows = &self.deleted_rows;
        let deleted_views = &self.deleted_views;
        projection.retain(
            |row| row.real().map_or(true, |id| !deleted_rows.contains(&id)),
            |view| view.real().map_or(true, |id| !deleted_views.contains(&id)),
        );
        self.confirmed = projection;
        let confirmed = &self.confirmed;
        self.orphan_cells
            .retain(|row_id, _| confirmed.row(&Key::Real(*row_id)).is_none());
        for pending in &mut self.pending {
            pending.patch.remap(&self.remap);
        }
        self.rebuild();
    }

    fn take_pending(&mut self, id: MutationId) -> Option<PendingMutation> {
        let index = self.pending.iter().position(|m| m.id == id)?;
        Some(self.pending.remove(index))
    }

    fn rebuild(&mut self) {
        let mut visible = self.confirmed.clone();
        for pending in self.pending.iter().filter(|m| !self.outdated(m)) {
            pending.patch.apply(&mut visible);
        }
        self.visible = visible;
        self.version += 1;
    }

    /// A pending write whose entity already holds a newer confirmed write.
    /// Replaying it would briefly show the older value.
    fn outdated(&self, mutation: &PendingMutation) -> bool {
        let key = match &mutation.patch {
            LocalPatch::EditCell {
                row: Key::Real(row),
                column: Key::Real(column),
                ..
            } => GenerationKey::Cell(*row, *column),
            LocalPatch::RenameColumn {
                column: Key::Real(column),
                ..
            } => GenerationKey::Column(*column),
            LocalPatch::UpdateView {
                view: Key::Real(view),
                ..
            } => GenerationKey::View(*view),
            _ => return false,
        };
        self.generations
            .get(&key)
            .is_some_and(|last| *last > mutation.id)
    }

    /// Record `id` as the newest write to `key`, or report it superseded.
    fn superseded(&mut self, key: GenerationKey, id: MutationId) -> bool {
        match self.generations.get(&key) {
            Some(last) if *last > id => true,
            _ => {
                self.generations.insert(key, id);
                false
            }
        }
    }

    fn apply_confirmation(&mut self, id: MutationId, temps: &[TempId], confirmation: Confirmation) {
        match confirmation {
            Confirmation::RowsAdded { rows } => {
                if temps.len() != rows.len() {
                    warn!(
                        mutation = %id,
                        expected = temps.len(),
                        received = rows.len(),
                        "Row count of confirmation differs from speculation"
                    );
                }
                for (temp, row) in temps.iter().zip(&rows) {
                    self.remap.record_row(*temp, row.row_id);
                }
                let live: Vec<RowData> = rows
                    .into_iter()
                    .filter(|r| !self.deleted_rows.contains(&r.row_id))
                    .map(|mut row| {
                        // A column confirmed while this row was in flight
                        // carried the row's cell; the row payload may not.
                        if let Some(orphans) = self.orphan_cells.remove(&row.row_id) {
                            for cell in orphans {
                                if !row.cells.iter().any(|c| c.column_id == cell.column_id) {
                                    row.cells.push(cell);
                                }
                            }
                        }
                        row
                    })
                    .collect();
                self.confirmed.upsert_rows(&live);
            }
            Confirmation::ColumnAdded { created } => {
                if let Some(temp) = temps.first() {
                    self.remap.record_column(*temp, created.column.column_id);
                }
                let orphans = self
                    .confirmed
                    .push_server_column(&created.column, &created.cells);
                for cell in orphans {
                    if !self.deleted_rows.contains(&cell.row_id) {
                        debug!(mutation = %id, row_id = %cell.row_id, "Holding cell for unconfirmed row");
                        self.orphan_cells.entry(cell.row_id).or_default().push(cell);
                    }
                }
            }
            Confirmation::CellEdited { cell } => {
                if self.superseded(GenerationKey::Cell(cell.row_id, cell.column_id), id) {
                    debug!(mutation = %id, cell_id = %cell.cell_id, "Discarding stale cell confirmation");
                    return;
                }
                self.confirmed.set_server_cell(&cell);
            }
            Confirmation::RowDeleted { row_id } => {
                self.deleted_rows.insert(row_id);
                self.orphan_cells.remove(&row_id);
                self.confirmed.remove_row(&Key::Real(row_id));
            }
            Confirmation::ColumnRenamed { column } => {
                if self.superseded(GenerationKey::Column(column.column_id), id) {
                    debug!(mutation = %id, column_id = %column.column_id, "Discarding stale rename");
                    return;
                }
                self.confirmed
                    .rename_column(&Key::Real(column.column_id), &column.name);
            }
            Confirmation::ViewCreated { view } => {
                if let Some(temp) = temps.first() {
                    self.remap.record_view(*temp, view.view_id);
                }
                if !self.deleted_views.contains(&view.view_id) {
                    self.confirmed.upsert_view(ViewState::from(&view));
                }
            }
            Confirmation::ViewUpdated { view } => {
                if self.superseded(GenerationKey::View(view.view_id), id)
                    || self.deleted_views.contains(&view.view_id)
                {
                    debug!(mutation = %id, view_id = %view.view_id, "Discarding stale view update");
                    return;
                }
                self.confirmed.upsert_view(ViewState::from(&view));
            }
            Confirmation::ViewDeleted { view_id } => {
                self.deleted_views.insert(view_id);
                self.confirmed.remove_view(&Key::Real(view_id));
            }
        }
    }
}

fn require<I: Copy>(key: Key<I>, present: bool, entity_type: EntityType) -> Result<I, SyncError>
where
    Key<I>: fmt::Display,
{
    match key {
        Key::Real(id) if present => Ok(id),
        Key::Temp(temp) if present => Err(SyncError::UnconfirmedReference { entity_type, temp }),
        _ => Err(SyncError::unknown(entity_type, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_api::TableDataResponse;
    use tabula_core::{BaseId, EntityIdType, Row, Table};

    struct Fixture {
        engine: SyncEngine,
        name: ColumnKey,
        rows: Vec<RowKey>,
        table: Table,
        name_id: ColumnId,
    }

    fn fixture() -> Fixture {
        let table = Table::new(BaseId::now_v7(), "Table 1");
        let column = Column::new(table.table_id, "Name", ColumnType::Text, 0);
        let rows: Vec<RowData> = ["alpha", "beta", "gamma"]
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let row = Row::new(table.table_id, i as u64);
                let mut cell = Cell::empty(row.row_id, column.column_id);
                cell.value = value.to_string();
                RowData::new(&row, vec![cell])
            })
            .collect();
        let views = vec![
            View::new(table.table_id, "Grid view", ViewConfig::with_visible_columns([column.column_id])),
            View::new(table.table_id, "Second", ViewConfig::new()),
        ];
        let data = TableDataResponse {
            table: table.clone(),
            columns: vec![column.clone()],
            rows: rows.clone(),
            views,
            next_cursor: None,
        };
        let projection = Projection::from_pages(vec![data]).expect("projection");
        Fixture {
            engine: SyncEngine::new(projection),
            name: Key::Real(column.column_id),
            rows: rows.iter().map(|r| Key::Real(r.row_id)).collect(),
            table,
            name_id: column.column_id,
        }
    }

    fn server_cell(engine: &SyncEngine, row: RowKey, column: ColumnKey, value: &str) -> Cell {
        let state = engine.confirmed().cell(&row, &column).expect("cell");
        Cell {
            cell_id: state.cell_id.expect("real cell"),
            row_id: row.real().expect("real row"),
            column_id: column.real().expect("real column"),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_failed_add_restores_snapshot() {
        let mut fx = fixture();
        let before = fx.engine.visible().clone();
        let temp = fx.engine.mint_temp();
        let id = fx.engine.begin(LocalPatch::AddRows {
            keys: vec![Key::Temp(temp)],
        });
        assert_eq!(fx.engine.visible().row_count(), 4);

        assert!(fx.engine.fail(id));
        assert_eq!(fx.engine.visible(), &before);
        assert!(fx.engine.visible().temp_ids().is_empty());
        assert!(!fx.engine.fail(id), "a mutation resolves exactly once");
    }

    #[test]
    fn test_failure_keeps_other_pending_patches() {
        let mut fx = fixture();
        let row = fx.rows[0];
        let edit = fx.engine.begin(LocalPatch::EditCell {
            row,
            column: fx.name,
            value: "Alice".to_string(),
        });
        let temp = fx.engine.mint_temp();
        fx.engine.begin(LocalPatch::AddRows {
            keys: vec![Key::Temp(temp)],
        });

        fx.engine.fail(edit);
        assert_eq!(fx.engine.visible().value(&row, &fx.name), Some("alpha"));
        assert!(fx.engine.visible().row(&Key::Temp(temp)).is_some());
        assert_eq!(fx.engine.pending_kinds(), vec![MutationKind::AddRows]);
    }

    #[test]
    fn test_confirmed_rows_replace_temp_ids() {
        let mut fx = fixture();
        let temps = [fx.engine.mint_temp(), fx.engine.mint_temp()];
        let id = fx.engine.begin(LocalPatch::AddRows {
            keys: temps.iter().map(|t| Key::Temp(*t)).collect(),
        });
        let rows: Vec<RowData> = (3..5)
            .map(|position| {
                let row = Row::new(fx.table.table_id, position);
                RowData::new(&row, vec![Cell::empty(row.row_id, fx.name_id)])
            })
            .collect();

        assert!(fx.engine.confirm(id, Confirmation::RowsAdded { rows: rows.clone() }));
        assert!(fx.engine.visible().temp_ids().is_empty());
        assert_eq!(fx.engine.visible().row_count(), 5);
        assert_eq!(fx.engine.visible(), fx.engine.confirmed());
        assert_eq!(
            fx.engine.remap().row(Key::Temp(temps[1])),
            Key::Real(rows[1].row_id)
        );
        assert_eq!(fx.engine.require_row(Key::Temp(temps[0])), Ok(rows[0].row_id));
    }

    #[test]
    fn test_column_confirmed_before_row_keeps_row_cell() {
        let mut fx = fixture();
        let row_temp = fx.engine.mint_temp();
        let add_row = fx.engine.begin(LocalPatch::AddRows {
            keys: vec![Key::Temp(row_temp)],
        });
        let column_temp = fx.engine.mint_temp();
        let add_column = fx.engine.begin(LocalPatch::AddColumn {
            key: Key::Temp(column_temp),
            name: "Notes".to_string(),
            column_type: ColumnType::Text,
        });

        // The server stored the row first, so the column seeded a cell for it,
        // but the row's response only carries the Name cell.
        let row = Row::new(fx.table.table_id, 3);
        let notes = Column::new(fx.table.table_id, "Notes", ColumnType::Text, 1);
        let cells: Vec<Cell> = fx
            .rows
            .iter()
            .filter_map(|key| key.real())
            .chain([row.row_id])
            .map(|row_id| Cell::empty(row_id, notes.column_id))
            .collect();
        let new_row_cell = cells[3].clone();

        assert!(fx.engine.confirm(
            add_column,
            Confirmation::ColumnAdded {
                created: ColumnCreatedResponse {
                    column: notes.clone(),
                    cells,
                },
            },
        ));
        assert!(fx.engine.confirm(
            add_row,
            Confirmation::RowsAdded {
                rows: vec![RowData::new(&row, vec![Cell::empty(row.row_id, fx.name_id)])],
            },
        ));

        let confirmed = fx.engine.confirmed();
        assert_eq!(confirmed.row_count(), 4);
        assert_eq!(confirmed.cell_count(), 8);
        assert_eq!(
            confirmed
                .cell(&Key::Real(row.row_id), &Key::Real(notes.column_id))
                .and_then(|cell| cell.cell_id),
            Some(new_row_cell.cell_id)
        );
        assert_eq!(fx.engine.visible(), confirmed);
        assert!(fx.engine.visible().temp_ids().is_empty());
        assert!(fx
            .engine
            .require_cell(Key::Real(row.row_id), Key::Real(notes.column_id))
            .is_ok());
    }

    #[test]
    fn test_temp_column_extends_every_row() {
        let mut fx = fixture();
        let temp = fx.engine.mint_temp();
        fx.engine.begin(LocalPatch::AddColumn {
            key: Key::Temp(temp),
            name: "Age".to_string(),
            column_type: ColumnType::Number,
        });
        let visible = fx.engine.visible();
        assert_eq!(visible.cell_count(), 6);
        assert!(visible
            .rows()
            .iter()
            .all(|row| row.cells.contains_key(&Key::Temp(temp))));
    }

    #[test]
    fn test_stale_cell_confirmation_is_discarded() {
        let mut fx = fixture();
        let row = fx.rows[1];
        let first = fx.engine.begin(LocalPatch::EditCell {
            row,
            column: fx.name,
            value: "one".to_string(),
        });
        let second = fx.engine.begin(LocalPatch::EditCell {
            row,
            column: fx.name,
            value: "two".to_string(),
        });
        let newer = server_cell(&fx.engine, row, fx.name, "two");
        let older = server_cell(&fx.engine, row, fx.name, "one");

        fx.engine.confirm(second, Confirmation::CellEdited { cell: newer });
        // The older edit is still pending but no longer shown.
        assert_eq!(fx.engine.visible().value(&row, &fx.name), Some("two"));
        fx.engine.confirm(first,Confirmation::CellEdited { cell: older });
        assert_eq!(fx.engine.visible().value(&row, &fx.name), Some("two"));
        assert_eq!(fx.engine.confirmed().value(&row, &fx.name), Some("two"));
    }

    #[test]
    fn test_deleted_row_is_not_resurrected_by_refresh() {
        let mut fx = fixture();
        let stale_fetch = fx.engine.confirmed().clone();
        let row = fx.rows[2];
        let id = fx.engine.begin(LocalPatch::DeleteRow { row });
        fx.engine.confirm(
            id,
            Confirmation::RowDeleted {
                row_id: row.real().expect("real"),
            },
        );

        fx.engine.replace_confirmed(stale_fetch);
        assert!(fx.engine.visible().row(&row).is_none());
        assert_eq!(fx.engine.visible().row_count(), 2);
    }

    #[test]
    fn test_unconfirmed_references_are_rejected() {
        let mut fx = fixture();
        let temp = fx.engine.mint_temp();
        fx.engine.begin(LocalPatch::AddRows {
            keys: vec![Key::Temp(temp)],
        });

        assert_eq!(
            fx.engine.require_cell(Key::Temp(temp), fx.name),
            Err(SyncError::UnconfirmedReference {
                entity_type: EntityType::Row,
                temp,
            })
        );
        assert!(matches!(
            fx.engine.require_row(Key::Real(RowId::now_v7())),
            Err(SyncError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_last_view_cannot_be_deleted() {
        let mut fx = fixture();
        let views: Vec<ViewKey> = fx.engine.visible().views().iter().map(|v| v.key).collect();
        let first = fx.engine.ensure_view_deletable(views[0]).map(|_| ());
        assert_eq!(first, Ok(()));
        fx.engine.begin(LocalPatch::DeleteView { view: views[0] });
        assert_eq!(fx.engine.ensure_view_deletable(views[1]), Err(SyncError::LastView));
    }
}
