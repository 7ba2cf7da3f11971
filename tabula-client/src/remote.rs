//! The remote side of the sync protocol.
//!
//! [`RemoteTables`] is the set of data-access operations the client
//! consumes. [`crate::api_client::RestClient`] talks to the HTTP API;
//! [`InProcessRemote`] calls a [`DbClient`] directly, for embedding and
//! tests.

use async_trait::async_trait;
use tabula_api::{
    AddBulkRowsRequest, AddBulkRowsResponse, AddColumnRequest, BaseResponse,
    ColumnCreatedResponse, CreateBaseRequest, CreateTableRequest, CreateViewRequest, DbClient,
    DeleteResponse, EditCellRequest, ListBasesResponse, RenameColumnRequest, RowData,
    TableDataParams, TableDataResponse, UpdateBaseRequest, UpdateViewRequest,
};
use tabula_core::{BaseId, Cell, CellId, Column, ColumnId, RowId, TableId, View, ViewId};

use crate::api_client::ApiClientError;

#[async_trait]
pub trait RemoteTables: Send + Sync {
    async fn list_bases(&self) -> Result<ListBasesResponse, ApiClientError>;

    async fn create_base(&self, req: &CreateBaseRequest) -> Result<BaseResponse, ApiClientError>;

    async fn get_base(&self, id: BaseId) -> Result<BaseResponse, ApiClientError>;

    async fn update_base(
        &self,
        id: BaseId,
        req: &UpdateBaseRequest,
    ) -> Result<BaseResponse, ApiClientError>;

    async fn delete_base(&self, id: BaseId) -> Result<DeleteResponse, ApiClientError>;

    async fn create_table(
        &self,
        base_id: BaseId,
        req: &CreateTableRequest,
    ) -> Result<TableDataResponse, ApiClientError>;

    async fn table_data(
        &self,
        table_id: TableId,
        params: TableDataParams,
    ) -> Result<TableDataResponse, ApiClientError>;

    async fn add_row(&self, table_id: TableId) -> Result<RowData, ApiClientError>;

    async fn add_bulk_rows(
        &self,
        table_id: TableId,
        req: &AddBulkRowsRequest,
    ) -> Result<AddBulkRowsResponse, ApiClientError>;

    async fn add_column(
        &self,
        table_id: TableId,
        req: &AddColumnRequest,
    ) -> Result<ColumnCreatedResponse, ApiClientError>;

    async fn edit_cell(&self, cell_id: CellId, req: &EditCellRequest)
        -> Result<Cell, ApiClientError>;

    async fn delete_row(&self, row_id: RowId) -> Result<DeleteResponse, ApiClientError>;

    async fn rename_column(
        &self,
        column_id: ColumnId,
        req: &RenameColumnRequest,
    ) -> Result<Column, ApiClientError>;

    async fn create_view(
        &self,
        table_id: TableId,
        req: &CreateViewRequest,
    ) -> Result<View, ApiClientError>;

    async fn update_view(
        &self,
        view_id: ViewId,
        req: &UpdateViewRequest,
    ) -> Result<View, ApiClientError>;

    async fn delete_view(&self, view_id: ViewId) -> Result<DeleteResponse, ApiClientError>;
}

/// Remote backed by a [`DbClient`] in the same process, acting as one user.
#[derive(Debug, Clone)]
pub struct InProcessRemote {
    db: DbClient,
    user_id: String,
}

impl InProcessRemote {
    pub fn new(db: DbClient, user_id: impl Into<String>) -> Self {
        Self {
            db,
            user_id: user_id.into(),
        }
    }

    pub fn db(&self) -> &DbClient {
        &self.db
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl RemoteTables for InProcessRemote {
    async fn list_bases(&self) -> Result<ListBasesResponse, ApiClientError> {
        Ok(self.db.base_list_for_user(&self.user_id).await?)
    }

    async fn create_base(&self, req: &CreateBaseRequest) -> Result<BaseResponse, ApiClientError> {
        Ok(self.db.base_create(&self.user_id, req).await?)
    }

    async fn get_base(&self, id: BaseId) -> Result<BaseResponse, ApiClientError> {
        Ok(self.db.base_get(&self.user_id, id).await?)
    }

    async fn update_base(
        &self,
        id: BaseId,
        req: &UpdateBaseRequest,
    ) -> Result<BaseResponse, ApiClientError> {
        Ok(self.db.base_update(&self.user_id, id, req).await?)
    }

    async fn delete_base(&self, id: BaseId) -> Result<DeleteResponse, ApiClientError> {
        Ok(self.db.base_delete(&self.user_id, id).await?)
    }

    async fn create_table(
        &self,
        base_id: BaseId,
        req: &CreateTableRequest,
    ) -> Result<TableDataResponse, ApiClientError> {
        Ok(self.db.table_create(&self.user_id, base_id, req).await?)
    }

    async fn table_data(
        &self,
        table_id: TableId,
        params: TableDataParams,
    ) -> Result<TableDataResponse, ApiClientError> {
        Ok(self.db.table_data(&self.user_id, table_id, params).await?)
    }

    async fn add_row(&self, table_id: TableId) -> Result<RowData, ApiClientError> {
        Ok(self.db.row_add(&self.user_id, table_id).await?)
    }

    async fn add_bulk_rows(
        &self,
        table_id: TableId,
        req: &AddBulkRowsRequest,
    ) -> Result<AddBulkRowsResponse, ApiClientError> {
        Ok(self.db.rows_add_bulk(&self.user_id, table_id, req).await?)
    }

    async fn add_column(
        &self,
        table_id: TableId,
        req: &AddColumnRequest,
    ) -> Result<ColumnCreatedResponse, ApiClientError> {
        Ok(self.db.column_add(&self.user_id, table_id, req).await?)
    }

    async fn edit_cell(
        &self,
        cell_id: CellId,
        req: &EditCellRequest,
    ) -> Result<Cell, ApiClientError> {
        Ok(self.db.cell_edit(&self.user_id, cell_id, req).await?)
    }

    async fn delete_row(&self, row_id: RowId) -> Result<DeleteResponse, ApiClientError> {
        Ok(self.db.row_delete(&self.user_id, row_id).await?)
    }

    async fn rename_column(
        &self,
        column_id: ColumnId,
        req: &RenameColumnRequest,
    ) -> Result<Column, ApiClientError> {
        Ok(self.db.column_rename(&self.user_id, column_id, req).await?)
    }

    async fn create_view(
        &self,
        table_id: TableId,
        req: &CreateViewRequest,
    ) -> Result<View, ApiClientError> {
        Ok(self.db.view_create(&self.user_id, table_id, req).await?)
    }

    async fn update_view(
        &self,
        view_id: ViewId,
        req: &UpdateViewRequest,
    ) -> Result<View, ApiClientError> {
        Ok(self.db.view_update(&self.user_id, view_id, req).await?)
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<DeleteResponse, ApiClientError> {
        Ok(self.db.view_delete(&self.user_id, view_id).await?)
    }
}
