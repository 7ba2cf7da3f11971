//! Table session: the client's entry points for one open table.
//!
//! Every mutation runs through [`TableSession::apply_optimistic`]: local
//! checks and the speculative patch happen under the engine lock, the
//! remote call runs without it, and the outcome resolves the pending
//! record. Remote failures never propagate as errors; they come back as
//! [`MutationOutcome::RolledBack`] after the projection has been reverted.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tabula_api::{
    AddBulkRowsRequest, AddBulkRowsResponse, AddColumnRequest, ColumnCreatedResponse,
    CreateViewRequest, DeleteResponse, EditCellRequest, RenameColumnRequest, RowData,
    TableDataParams, TableDataResponse, UpdateViewRequest,
};
use tabula_core::{Cell, Column, ColumnType, TableId, ValidationError, View, ViewConfigError};
use tracing::{debug, info, warn};

use crate::api_client::ApiClientError;
use crate::error::SyncError;
use crate::keys::Key;
use crate::mutation::{Confirmation, LocalPatch, MutationKind, SyncEngine};
use crate::projection::{
    ColumnKey, ColumnState, LocalViewConfig, Projection, RowKey, RowState, ViewKey,
};
use crate::remote::RemoteTables;

/// How an optimistic mutation ended.
#[derive(Debug)]
pub enum MutationOutcome<T> {
    /// The server accepted the mutation; the projection now holds its result.
    Confirmed(T),
    /// The remote call failed and the speculative patch was reverted.
    RolledBack(ApiClientError),
}

impl<T> MutationOutcome<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, MutationOutcome::Confirmed(_))
    }

    pub fn confirmed(&self) -> Option<&T> {
        match self {
            MutationOutcome::Confirmed(value) => Some(value),
            MutationOutcome::RolledBack(_) => None,
        }
    }

    pub fn into_confirmed(self) -> Option<T> {
        match self {
            MutationOutcome::Confirmed(value) => Some(value),
            MutationOutcome::RolledBack(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiClientError> {
        match self {
            MutationOutcome::Confirmed(_) => None,
            MutationOutcome::RolledBack(err) => Some(err),
        }
    }
}

pub type SyncResult<T> = Result<MutationOutcome<T>, SyncError>;

pub struct TableSession<R: RemoteTables> {
    remote: R,
    table_id: TableId,
    page_size: usize,
    engine: Mutex<SyncEngine>,
}

impl<R: RemoteTables> std::fmt::Debug for TableSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSession")
            .field("table_id", &self.table_id)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<R: RemoteTables> TableSession<R> {
    /// Fetch every page of a table and start a session over it.
    pub async fn open(remote: R, table_id: TableId, page_size: usize) -> Result<Self, ApiClientError> {
        let projection = fetch_projection(&remote, table_id, page_size).await?;
        info!(
            table_id = %table_id,
            rows = projection.row_count(),
            columns = projection.columns().len(),
            "Opened table"
        );
        Ok(Self {
            remote,
            table_id,
            page_size,
            engine: Mutex::new(SyncEngine::new(projection)),
        })
    }

    /// Refetch the table and replace the confirmed state. Pending mutations
    /// stay applied on top.
    pub async fn refresh(&self) -> Result<(), ApiClientError> {
        let projection = fetch_projection(&self.remote, self.table_id, self.page_size).await?;
        self.engine().replace_confirmed(projection);
        debug!(table_id = %self.table_id, "Refreshed table");
        Ok(())
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// A copy of the visible projection.
    pub fn snapshot(&self) -> Projection {
        self.engine().visible().clone()
    }

    /// A copy of the server-acknowledged projection.
    pub fn confirmed_snapshot(&self) -> Projection {
        self.engine().confirmed().clone()
    }

    pub fn pending_mutations(&self) -> Vec<MutationKind> {
        self.engine().pending_kinds()
    }

    /// Rows `view` shows, filtered and sorted.
    pub fn visible_rows(&self, view: ViewKey) -> Option<Vec<RowState>> {
        let engine = self.engine();
        let view = engine.remap().view(view);
        let rows = engine.visible().evaluate(&view)?;
        Some(rows.into_iter().cloned().collect())
    }

    /// Columns `view` shows, in position order.
    pub fn visible_columns(&self, view: ViewKey) -> Option<Vec<ColumnState>> {
        let engine = self.engine();
        let view = engine.remap().view(view);
        let columns = engine.visible().visible_columns(&view)?;
        Some(columns.into_iter().cloned().collect())
    }

    pub fn resolve_row(&self, key: RowKey) -> RowKey {
        self.engine().remap().row(key)
    }

    pub fn resolve_column(&self, key: ColumnKey) -> ColumnKey {
        self.engine().remap().column(key)
    }

    pub fn resolve_view(&self, key: ViewKey) -> ViewKey {
        self.engine().remap().view(key)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub async fn add_row(&self) -> SyncResult<RowData> {
        let table_id = self.table_id;
        self.apply_optimistic(
            |engine| {
                let key = Key::Temp(engine.mint_temp());
                Ok((LocalPatch::AddRows { keys: vec![key] }, ()))
            },
            |()| self.remote.add_row(table_id),
            |row| Confirmation::RowsAdded {
                rows: vec![row.clone()],
            },
        )
        .await
    }

    /// Append `row_count` rows with one remote call.
    pub async fn add_rows(&self, row_count: usize) -> SyncResult<AddBulkRowsResponse> {
        if row_count == 0 {
            return Err(ValidationError::InvalidValue {
                field: "row_count".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        let table_id = self.table_id;
        self.apply_optimistic(
            |engine| {
                let keys = (0..row_count).map(|_| Key::Temp(engine.mint_temp())).collect();
                Ok((LocalPatch::AddRows { keys }, AddBulkRowsRequest { row_count }))
            },
            |req| async move { self.remote.add_bulk_rows(table_id, &req).await },
            |created| Confirmation::RowsAdded {
                rows: created.rows.clone(),
            },
        )
        .await
    }

    pub async fn add_column(
        &self,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> SyncResult<ColumnCreatedResponse> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            }
            .into());
        }
        let table_id = self.table_id;
        self.apply_optimistic(
            |engine| {
                let patch = LocalPatch::AddColumn {
                    key: Key::Temp(engine.mint_temp()),
                    name: name.clone(),
                    column_type,
                };
                Ok((patch, AddColumnRequest { name, column_type }))
            },
            |req| async move { self.remote.add_column(table_id, &req).await },
            |created| Confirmation::ColumnAdded {
                created: created.clone(),
            },
        )
        .await
    }

    pub async fn edit_cell(
        &self,
        row: RowKey,
        column: ColumnKey,
        value: impl Into<String>,
    ) -> SyncResult<Cell> {
        let value = value.into();
        self.apply_optimistic(
            |engine| {
                let (cell_id, column_type) = engine.require_cell(row, column)?;
                column_type.validate_value(&value)?;
                let patch = LocalPatch::EditCell {
                    row: engine.remap().row(row),
                    column: engine.remap().column(column),
                    value: value.clone(),
                };
                Ok((patch, (cell_id, EditCellRequest { value })))
            },
            |(cell_id, req)| async move { self.remote.edit_cell(cell_id, &req).await },
            |cell| Confirmation::CellEdited { cell: cell.clone() },
        )
        .await
    }

    pub async fn delete_row(&self, row: RowKey) -> SyncResult<DeleteResponse> {
        self.apply_optimistic(
            |engine| {
                let row_id = engine.require_row(row)?;
                let patch = LocalPatch::DeleteRow {
                    row: Key::Real(row_id),
                };
                Ok((patch, row_id))
            },
            |row_id| async move {
                let deleted = self.remote.delete_row(row_id).await?;
                Ok::<_, ApiClientError>((row_id, deleted))
            },
            |(row_id, _)| Confirmation::RowDeleted { row_id: *row_id },
        )
        .await
        .map(|outcome| map_outcome(outcome, |(_, deleted)| deleted))
    }

    pub async fn rename_column(
        &self,
        column: ColumnKey,
        name: impl Into<String>,
    ) -> SyncResult<Column> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            }
            .into());
        }
        self.apply_optimistic(
            |engine| {
                let (column_id, _) = engine.require_column(column)?;
                let patch = LocalPatch::RenameColumn {
                    column: Key::Real(column_id),
                    name: name.clone(),
                };
                Ok((patch, (column_id, RenameColumnRequest { name })))
            },
            |(column_id, req)| async move { self.remote.rename_column(column_id, &req).await },
            |column| Confirmation::ColumnRenamed {
                column: column.clone(),
            },
        )
        .await
    }

    pub async fn create_view(
        &self,
        name: impl Into<String>,
        config: LocalViewConfig,
    ) -> SyncResult<View> {
        let name = name.into();
        let table_id = self.table_id;
        self.apply_optimistic(
            |engine| {
                let remote_config = engine.require_config(config.clone())?;
                let patch = LocalPatch::CreateView {
                    key: Key::Temp(engine.mint_temp()),
                    name: name.clone(),
                    config: engine.remap().config(config),
                };
                let req = CreateViewRequest {
                    name: Some(name),
                    config: Some(remote_config),
                };
                Ok((patch, req))
            },
            |req| async move { self.remote.create_view(table_id, &req).await },
            |view| Confirmation::ViewCreated { view: view.clone() },
        )
        .await
    }

    /// Update a view's name and/or configuration. The configuration is
    /// always sent whole.
    pub async fn update_view(
        &self,
        view: ViewKey,
        name: Option<String>,
        config: Option<LocalViewConfig>,
    ) -> SyncResult<View> {
        self.apply_optimistic(
            |engine| {
                let view_id = engine.require_view(view)?;
                let remote_config = config
                    .clone()
                    .map(|config| engine.require_config(config))
                    .transpose()?;
                let patch = LocalPatch::UpdateView {
                    view: Key::Real(view_id),
                    name: name.clone(),
                    config: config.map(|config| engine.remap().config(config)),
                };
                let req = UpdateViewRequest {
                    name,
                    config: remote_config,
                };
                Ok((patch, (view_id, req)))
            },
            |(view_id, req)| async move { self.remote.update_view(view_id, &req).await },
            |view| Confirmation::ViewUpdated { view: view.clone() },
        )
        .await
    }

    /// Edit the current configuration of a view in place and persist it.
    pub async fn edit_view<F>(&self, view: ViewKey, edit: F) -> SyncResult<View>
    where
        F: FnOnce(&mut LocalViewConfig) -> Result<(), ViewConfigError>,
    {
        let mut config = {
            let engine = self.engine();
            let key = engine.remap().view(view);
            engine
                .visible()
                .view(&key)
                .map(|state| state.config.clone())
                .ok_or_else(|| SyncError::unknown(tabula_core::EntityType::View, key))?
        };
        edit(&mut config)?;
        self.update_view(view, None, Some(config)).await
    }

    pub async fn delete_view(&self, view: ViewKey) -> SyncResult<DeleteResponse> {
        self.apply_optimistic(
            |engine| {
                let view_id = engine.ensure_view_deletable(view)?;
                let patch = LocalPatch::DeleteView {
                    view: Key::Real(view_id),
                };
                Ok((patch, view_id))
            },
            |view_id| async move {
                let deleted = self.remote.delete_view(view_id).await?;
                Ok::<_, ApiClientError>((view_id, deleted))
            },
            |(view_id, _)| Confirmation::ViewDeleted { view_id: *view_id },
        )
        .await
        .map(|outcome| map_outcome(outcome, |(_, deleted)| deleted))
    }

    // ========================================================================
    // OPTIMISTIC CORE
    // ========================================================================

    /// Check and speculate under the lock, call the remote without it, then
    /// resolve the pending record exactly once.
    pub async fn apply_optimistic<P, T, Prepare, Call, Fut, Confirm>(
        &self,
        prepare: Prepare,
        remote_call: Call,
        confirm: Confirm,
    ) -> SyncResult<T>
    where
        Prepare: FnOnce(&mut SyncEngine) -> Result<(LocalPatch, P), SyncError>,
        Call: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<T, ApiClientError>>,
        Confirm: FnOnce(&T) -> Confirmation,
    {
        let (id, kind, args) = {
            let mut engine = self.engine();
            let (patch, args) = prepare(&mut *engine)?;
            let kind = patch.kind();
            (engine.begin(patch), kind, args)
        };

        match remote_call(args).await {
            Ok(value) => {
                self.engine().confirm(id, confirm(&value));
                debug!(mutation = %id, ?kind, "Mutation confirmed");
                Ok(MutationOutcome::Confirmed(value))
            }
            Err(err) => {
                warn!(mutation = %id, ?kind, error = %err, "Remote call failed, reverting");
                self.engine().fail(id);
                Ok(MutationOutcome::RolledBack(err))
            }
        }
    }

    fn engine(&self) -> MutexGuard<'_, SyncEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn map_outcome<T, U>(outcome: MutationOutcome<T>, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
    match outcome {
        MutationOutcome::Confirmed(value) => MutationOutcome::Confirmed(f(value)),
        MutationOutcome::RolledBack(err) => MutationOutcome::RolledBack(err),
    }
}

async fn fetch_projection<R: RemoteTables + ?Sized>(
    remote: &R,
    table_id: TableId,
    page_size: usize,
) -> Result<Projection, ApiClientError> {
    let mut pages: Vec<TableDataResponse> = Vec::new();
    let mut cursor = None;
    loop {
        let page = remote
            .table_data(
                table_id,
                TableDataParams {
                    cursor,
                    limit: Some(page_size),
                },
            )
            .await?;
        let next = page.next_cursor;
        pages.push(page);
        match next {
            Some(next) if Some(next) != cursor => cursor = Some(next),
            _ => break,
        }
    }
    Projection::from_pages(pages)
        .ok_or_else(|| ApiClientError::InvalidResponse("table data had no pages".to_string()))
}
