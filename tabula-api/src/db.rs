//! Data-access service
//!
//! `DbClient` implements every table operation the API exposes on top of a
//! [`TableStore`]: ownership checks against the acting user, input
//! validation, seeding of new bases and tables, and pagination. Route
//! handlers and the in-process client both call it directly.

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::*;
use std::sync::Arc;
use tabula_core::{
    AccessError, Base, BaseId, BaseTheme, Cell, CellId, Column, ColumnId, ColumnType, EntityIdType,
    EntityType, Row, RowId, Table, TableId, TabulaError, View, ViewConfig, ViewId,
};
use tabula_storage::{BaseUpdate, InMemoryStore, TableStore, ViewRecord, ViewUpdate};

pub const DEFAULT_BASE_NAME: &str = "Untitled Base";
pub const DEFAULT_COLUMN_NAME: &str = "Name";
pub const DEFAULT_VIEW_NAME: &str = "Grid view";
pub const SEEDED_ROW_COUNT: usize = 4;

// ============================================================================
// LIMITS
// ============================================================================

/// Request size limits enforced by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLimits {
    pub max_bulk_rows: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for DataLimits {
    fn from(config: &ApiConfig) -> Self {
        Self {
            max_bulk_rows: config.max_bulk_rows,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl DataLimits {
    fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

// ============================================================================
// DB CLIENT
// ============================================================================

/// Table data service shared by every route.
#[derive(Clone)]
pub struct DbClient {
    store: Arc<dyn TableStore>,
    limits: DataLimits,
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl DbClient {
    pub fn new(store: Arc<dyn TableStore>, limits: DataLimits) -> Self {
        Self { store, limits }
    }

    /// A client over a fresh in-memory store.
    pub fn in_memory(limits: DataLimits) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), limits)
    }

    pub fn limits(&self) -> DataLimits {
        self.limits
    }

    /// Direct store access, for inspection in tests and health checks.
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Probe the backing store.
    pub async fn health_check(&self) -> ApiResult<()> {
        self.store.health_check().await?;
        Ok(())
    }

    // ========================================================================
    // OWNERSHIP RESOLUTION
    // ========================================================================

    async fn owned_base(&self, actor: &str, id: BaseId) -> ApiResult<Base> {
        if actor.trim().is_empty() {
            return Err(TabulaError::from(AccessError::MissingActor).into());
        }
        let base = self
            .store
            .base_get(id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::Base, id))?;
        if base.owner_id != actor {
            tracing::warn!(%actor, base_id = %id, "Rejected access to base owned by another user");
            return Err(TabulaError::from(AccessError::NotOwner {
                actor: actor.to_string(),
                entity_type: EntityType::Base,
                id: id.as_uuid(),
            })
            .into());
        }
        Ok(base)
    }

    async fn owned_table(&self, actor: &str, id: TableId) -> ApiResult<Table> {
        let table = self
            .store
            .table_get(id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::Table, id))?;
        self.owned_base(actor, table.base_id).await?;
        Ok(table)
    }

    async fn owned_row(&self, actor: &str, id: RowId) -> ApiResult<(Table, Row)> {
        let row = self
            .store
            .row_get(id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::Row, id))?;
        let table = self.owned_table(actor, row.table_id).await?;
        Ok((table, row))
    }

    async fn owned_column(&self, actor: &str, id: ColumnId) -> ApiResult<(Table, Column)> {
        let column = self
            .store
            .column_get(id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::Column, id))?;
        let table = self.owned_table(actor, column.table_id).await?;
        Ok((table, column))
    }

    async fn owned_view(&self, actor: &str, id: ViewId) -> ApiResult<(Table, ViewRecord)> {
        let view = self
            .store
            .view_get(id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::View, id))?;
        let table = self.owned_table(actor, view.table_id).await?;
        Ok((table, view))
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn decode_view(record: &ViewRecord) -> View {
        let (view, decoded) = record.decode();
        for (field, reason) in &decoded.defaulted {
            tracing::warn!(
                view_id = %record.view_id,
                %field,
                ?reason,
                "View config field replaced by its empty default"
            );
        }
        view
    }

    async fn views_of(&self, table_id: TableId) -> ApiResult<Vec<View>> {
        Ok(self
            .store
            .view_list_by_table(table_id)
            .await?
            .iter()
            .map(Self::decode_view)
            .collect())
    }

    async fn rows_with_cells(&self, rows: &[Row]) -> ApiResult<Vec<RowData>> {
        let row_ids: Vec<RowId> = rows.iter().map(|row| row.row_id).collect();
        let mut cells_by_row: std::collections::HashMap<RowId, Vec<Cell>> =
            std::collections::HashMap::with_capacity(rows.len());
        for cell in self.store.cells_for_rows(&row_ids).await? {
            cells_by_row.entry(cell.row_id).or_default().push(cell);
        }
        Ok(rows
            .iter()
            .map(|row| {
                let cells = cells_by_row.remove(&row.row_id).unwrap_or_default();
                RowData::new(row, cells)
            })
            .collect())
    }

    /// Append `count` rows; the store seeds one empty cell per column.
    async fn append_empty_rows(&self, table_id: TableId, count: usize) -> ApiResult<Vec<RowData>> {
        let rows: Vec<Row> = (0..count).map(|_| Row::new(table_id, 0)).collect();
        let (stored, cells) = self.store.rows_append(table_id, &rows, &[]).await?;

        let mut cells_by_row: std::collections::HashMap<RowId, Vec<Cell>> =
            std::collections::HashMap::with_capacity(stored.len());
        for cell in cells {
            cells_by_row.entry(cell.row_id).or_default().push(cell);
        }
        Ok(stored
            .iter()
            .map(|row| RowData::new(row, cells_by_row.remove(&row.row_id).unwrap_or_default()))
            .collect())
    }

    /// Create a table with one TEXT "Name" column, four empty rows and a
    /// "Grid view" showing the Name column.
    async fn seed_table(&self, base_id: BaseId, name: String) -> ApiResult<TableDataResponse> {
        let table = Table::new(base_id, name);
        self.store.table_insert(&table).await?;

        let column = Column::new(table.table_id, DEFAULT_COLUMN_NAME, ColumnType::Text, 0);
        let (column, _) = self.store.column_append(&column).await?;
        let rows = self
            .append_empty_rows(table.table_id, SEEDED_ROW_COUNT)
            .await?;

        let view = View::new(
            table.table_id,
            DEFAULT_VIEW_NAME,
            ViewConfig::with_visible_columns([column.column_id]),
        );
        self.store.view_insert(&ViewRecord::from_view(&view)?).await?;

        tracing::info!(table_id = %table.table_id, %base_id, "Seeded table");
        Ok(TableDataResponse {
            table,
            columns: vec![column],
            rows,
            views: vec![view],
            next_cursor: None,
        })
    }

    fn require_name(field: &str, name: &str) -> ApiResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ApiError::missing_field(field));
        }
        Ok(trimmed.to_string())
    }

    // ========================================================================
    // BASE OPERATIONS
    // ========================================================================

    /// Bases owned by `actor`, most recently updated first.
    pub async fn base_list_for_user(&self, actor: &str) -> ApiResult<ListBasesResponse> {
        if actor.trim().is_empty() {
            return Err(TabulaError::from(AccessError::MissingActor).into());
        }
        let mut bases = Vec::new();
        for base in self.store.base_list_by_owner(actor).await? {
            let first_table_id = self
                .store
                .table_list_by_base(base.base_id)
                .await?
                .first()
                .map(|table| table.table_id);
            bases.push(BaseSummary {
                base_id: base.base_id,
                name: base.name,
                theme: base.theme,
                updated_at: base.updated_at,
                first_table_id,
            });
        }
        Ok(ListBasesResponse { bases })
    }

    /// Create a base with one seeded table.
    pub async fn base_create(&self, actor: &str, req: &CreateBaseRequest) -> ApiResult<BaseResponse> {
        if actor.trim().is_empty() {
            return Err(TabulaError::from(AccessError::MissingActor).into());
        }
        let name = match req.name.as_deref() {
            Some(name) => Self::require_name("name", name)?,
            None => DEFAULT_BASE_NAME.to_string(),
        };
        let base = Base::new(actor, name, req.theme.unwrap_or(BaseTheme::Blue));
        self.store.base_insert(&base).await?;
        let seeded = self.seed_table(base.base_id, "Table 1".to_string()).await?;

        tracing::info!(base_id = %base.base_id, owner = %actor, "Created base");
        Ok(BaseResponse::new(base, vec![seeded.table]))
    }

    pub async fn base_get(&self, actor: &str, id: BaseId) -> ApiResult<BaseResponse> {
        let base = self.owned_base(actor, id).await?;
        let tables = self.store.table_list_by_base(id).await?;
        Ok(BaseResponse::new(base, tables))
    }

    pub async fn base_update(
        &self,
        actor: &str,
        id: BaseId,
        req: &UpdateBaseRequest,
    ) -> ApiResult<BaseResponse> {
        self.owned_base(actor, id).await?;
        if req.is_empty() {
            return Err(ApiError::invalid_input(
                "At least one field must be provided for update",
            ));
        }
        let name = req
            .name
            .as_deref()
            .map(|name| Self::require_name("name", name))
            .transpose()?;
        let base = self
            .store
            .base_update(
                id,
                BaseUpdate {
                    name,
                    theme: req.theme,
                },
            )
            .await?;
        let tables = self.store.table_list_by_base(id).await?;
        Ok(BaseResponse::new(base, tables))
    }

    pub async fn base_delete(&self, actor: &str, id: BaseId) -> ApiResult<DeleteResponse> {
        self.owned_base(actor, id).await?;
        let success = self.store.base_delete(id).await?;
        tracing::info!(base_id = %id, "Deleted base");
        Ok(DeleteResponse { success })
    }

    // ========================================================================
    // TABLE OPERATIONS
    // ========================================================================

    /// Create a seeded table in a base, named "Table N" unless a name is given.
    pub async fn table_create(
        &self,
        actor: &str,
        base_id: BaseId,
        req: &CreateTableRequest,
    ) -> ApiResult<TableDataResponse> {
        self.owned_base(actor, base_id).await?;
        let name = match req.name.as_deref() {
            Some(name) => Self::require_name("name", name)?,
            None => {
                let existing = self.store.table_list_by_base(base_id).await?.len();
                format!("Table {}", existing + 1)
            }
        };
        let seeded = self.seed_table(base_id, name).await?;
        self.store.base_touch(base_id).await?;
        Ok(seeded)
    }

    /// One page of rows plus the table's columns and views.
    pub async fn table_data(
        &self,
        actor: &str,
        table_id: TableId,
        params: TableDataParams,
    ) -> ApiResult<TableDataResponse> {
        let table = self.owned_table(actor, table_id).await?;
        let limit = self.limits.page_size(params.limit);

        // One extra row tells us whether another page exists.
        let mut rows = self
            .store
            .row_page(table_id, params.cursor, limit + 1)
            .await?;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|row| row.position)
        } else {
            None
        };

        Ok(TableDataResponse {
            columns: self.store.column_list_by_table(table_id).await?,
            rows: self.rows_with_cells(&rows).await?,
            views: self.views_of(table_id).await?,
            next_cursor,
            table,
        })
    }

    // ========================================================================
    // ROW OPERATIONS
    // ========================================================================

    /// Append one row with an empty cell per column.
    pub async fn row_add(&self, actor: &str, table_id: TableId) -> ApiResult<RowData> {
        let table = self.owned_table(actor, table_id).await?;
        let mut rows = self.append_empty_rows(table_id, 1).await?;
        self.store.base_touch(table.base_id).await?;
        rows.pop()
            .ok_or_else(|| ApiError::internal_error("Row append returned no rows"))
    }

    /// Append `row_count` empty rows in one atomic write.
    pub async fn rows_add_bulk(
        &self,
        actor: &str,
        table_id: TableId,
        req: &AddBulkRowsRequest,
    ) -> ApiResult<AddBulkRowsResponse> {
        let table = self.owned_table(actor, table_id).await?;
        if req.row_count == 0 || req.row_count > self.limits.max_bulk_rows {
            return Err(ApiError::invalid_range(
                "row_count",
                1,
                self.limits.max_bulk_rows,
            ));
        }
        let rows = self.append_empty_rows(table_id, req.row_count).await?;
        self.store.base_touch(table.base_id).await?;
        tracing::info!(%table_id, rows = rows.len(), "Added bulk rows");
        Ok(AddBulkRowsResponse { rows })
    }

    pub async fn row_delete(&self, actor: &str, row_id: RowId) -> ApiResult<DeleteResponse> {
        let (table, _) = self.owned_row(actor, row_id).await?;
        let success = self.store.row_delete(row_id).await?;
        self.store.base_touch(table.base_id).await?;
        Ok(DeleteResponse { success })
    }

    // ========================================================================
    // COLUMN OPERATIONS
    // ========================================================================

    /// Append a column and seed an empty cell for it in every existing row.
    pub async fn column_add(
        &self,
        actor: &str,
        table_id: TableId,
        req: &AddColumnRequest,
    ) -> ApiResult<ColumnCreatedResponse> {
        let table = self.owned_table(actor, table_id).await?;
        let name = Self::require_name("name", &req.name)?;
        let column = Column::new(table_id, name, req.column_type, 0);

        let (column, cells) = self.store.column_append(&column).await?;
        self.store.base_touch(table.base_id).await?;
        tracing::debug!(%table_id, column_id = %column.column_id, cells = cells.len(), "Added column");
        Ok(ColumnCreatedResponse { column, cells })
    }

    pub async fn column_rename(
        &self,
        actor: &str,
        column_id: ColumnId,
        req: &RenameColumnRequest,
    ) -> ApiResult<Column> {
        let (table, _) = self.owned_column(actor, column_id).await?;
        let name = Self::require_name("name", &req.name)?;
        let column = self.store.column_rename(column_id, &name).await?;
        self.store.base_touch(table.base_id).await?;
        Ok(column)
    }

    // ========================================================================
    // CELL OPERATIONS
    // ========================================================================

    /// Overwrite a cell value after checking it against the column type.
    pub async fn cell_edit(
        &self,
        actor: &str,
        cell_id: CellId,
        req: &EditCellRequest,
    ) -> ApiResult<Cell> {
        let cell = self
            .store
            .cell_get(cell_id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(EntityType::Cell, cell_id))?;
        let (table, column) = self.owned_column(actor, cell.column_id).await?;
        column
            .column_type
            .validate_value(&req.value)
            .map_err(TabulaError::from)?;

        let cell = self.store.cell_update_value(cell_id, &req.value).await?;
        self.store.base_touch(table.base_id).await?;
        tracing::debug!(%cell_id, "Edited cell");
        Ok(cell)
    }

    // ========================================================================
    // VIEW OPERATIONS
    // ========================================================================

    async fn check_view_config(&self, table_id: TableId, config: &ViewConfig) -> ApiResult<()> {
        let column_ids: Vec<ColumnId> = self
            .store
            .column_list_by_table(table_id)
            .await?
            .into_iter()
            .map(|column| column.column_id)
            .collect();
        config
            .validate_columns(&column_ids)
            .map_err(TabulaError::from)?;
        Ok(())
    }

    pub async fn view_create(
        &self,
        actor: &str,
        table_id: TableId,
        req: &CreateViewRequest,
    ) -> ApiResult<View> {
        let table = self.owned_table(actor, table_id).await?;
        let name = match req.name.as_deref() {
            Some(name) => Self::require_name("name", name)?,
            None => DEFAULT_VIEW_NAME.to_string(),
        };
        let config = req.config.clone().unwrap_or_default();
        self.check_view_config(table_id, &config).await?;

        let view = View::new(table_id, name, config);
        self.store.view_insert(&ViewRecord::from_view(&view)?).await?;
        self.store.base_touch(table.base_id).await?;
        Ok(view)
    }

    pub async fn view_update(
        &self,
        actor: &str,
        view_id: ViewId,
        req: &UpdateViewRequest,
    ) -> ApiResult<View> {
        let (table, _) = self.owned_view(actor, view_id).await?;
        if req.name.is_none() && req.config.is_none() {
            return Err(ApiError::invalid_input(
                "At least one field must be provided for update",
            ));
        }
        let name = req
            .name
            .as_deref()
            .map(|name| Self::require_name("name", name))
            .transpose()?;
        let config = match &req.config {
            Some(config) => {
                self.check_view_config(table.table_id, config).await?;
                Some(config.to_persisted()?)
            }
            None => None,
        };

        let record = self
            .store
            .view_update(view_id, ViewUpdate { name, config })
            .await?;
        self.store.base_touch(table.base_id).await?;
        Ok(Self::decode_view(&record))
    }

    /// Delete a view. A table always keeps at least one view.
    pub async fn view_delete(&self, actor: &str, view_id: ViewId) -> ApiResult<DeleteResponse> {
        let (table, _) = self.owned_view(actor, view_id).await?;
        let remaining = self.store.view_list_by_table(table.table_id).await?.len();
        if remaining <= 1 {
            return Err(ApiError::validation_failed(
                "A table must keep at least one view",
            ));
        }
        let success = self.store.view_delete(view_id).await?;
        self.store.base_touch(table.base_id).await?;
        Ok(DeleteResponse { success })
    }
}
