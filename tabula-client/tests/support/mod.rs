//! Shared harness for client integration tests: a remote over an in-memory
//! server that can fail or hold back chosen calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tabula_api::{
    AddBulkRowsRequest, AddBulkRowsResponse, AddColumnRequest, BaseResponse,
    ColumnCreatedResponse, CreateBaseRequest, CreateTableRequest, CreateViewRequest, DataLimits,
    DbClient, DeleteResponse, EditCellRequest, ListBasesResponse, RenameColumnRequest, RowData,
    TableDataParams, TableDataResponse, UpdateBaseRequest, UpdateViewRequest,
};
use tabula_client::{ApiClientError, InProcessRemote, RemoteTables, TableSession};
use tabula_core::{BaseId, Cell, CellId, Column, ColumnId, RowId, TableId, View, ViewId};
use tabula_test_utils::TEST_USER;
use tokio::sync::Notify;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    AddRow,
    AddBulkRows,
    AddColumn,
    EditCell,
    DeleteRow,
    RenameColumn,
    CreateView,
    UpdateView,
    DeleteView,
}

/// In-process remote with scripted failures and held responses. Every
/// mutating call yields once before running, so mutations started together
/// with `tokio::join!` are all in flight before any resolves.
pub struct FlakyRemote {
    inner: InProcessRemote,
    failures: Mutex<HashMap<Op, usize>>,
    held: Mutex<HashMap<Op, Arc<Notify>>>,
    calls: Mutex<HashMap<Op, usize>>,
}

impl FlakyRemote {
    pub fn new(inner: InProcessRemote) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &InProcessRemote {
        &self.inner
    }

    /// Fail the next `times` calls of `op` without reaching the server.
    pub fn fail_next(&self, op: Op, times: usize) {
        *self.failures.lock().unwrap().entry(op).or_default() += times;
    }

    /// Let the next call of `op` reach the server, then withhold its
    /// response until the returned gate is notified.
    pub fn hold_next(&self, op: Op) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().unwrap().insert(op, gate.clone());
        gate
    }

    /// Rows the server currently holds for `table_id`.
    pub async fn server_rows(&self, table_id: TableId) -> Result<usize, ApiClientError> {
        let params = TableDataParams {
            cursor: None,
            limit: Some(5_000),
        };
        Ok(self.inner.table_data(table_id, params).await?.rows.len())
    }

    /// Calls of `op` that reached the harness, failed or not.
    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    async fn run<T, F>(&self, op: Op, call: F) -> Result<T, ApiClientError>
    where
        F: Future<Output = Result<T, ApiClientError>> + Send,
    {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        tokio::task::yield_now().await;

        let fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&op) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if fail {
            return Err(ApiClientError::InvalidResponse(format!(
                "injected {:?} failure",
                op
            )));
        }

        let result = call.await;
        let gate = self.held.lock().unwrap().remove(&op);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }
}

#[async_trait]
impl RemoteTables for FlakyRemote {
    async fn list_bases(&self) -> Result<ListBasesResponse, ApiClientError> {
        self.inner.list_bases().await
    }

    async fn create_base(&self, req: &CreateBaseRequest) -> Result<BaseResponse, ApiClientError> {
        self.inner.create_base(req).await
    }

    async fn get_base(&self, id: BaseId) -> Result<BaseResponse, ApiClientError> {
        self.inner.get_base(id).await
    }

    async fn update_base(
        &self,
        id: BaseId,
        req: &UpdateBaseRequest,
    ) -> Result<BaseResponse, ApiClientError> {
        self.inner.update_base(id, req).await
    }

    async fn delete_base(&self, id: BaseId) -> Result<DeleteResponse, ApiClientError> {
        self.inner.delete_base(id).await
    }

    async fn create_table(
        &self,
        base_id: BaseId,
        req: &CreateTableRequest,
    ) -> Result<TableDataResponse, ApiClientError> {
        self.inner.create_table(base_id, req).await
    }

    async fn table_data(
        &self,
        table_id: TableId,
        params: TableDataParams,
    ) -> Result<TableDataResponse, ApiClientError> {
        self.inner.table_data(table_id, params).await
    }

    async fn add_row(&self, table_id: TableId) -> Result<RowData, ApiClientError> {
        self.run(Op::AddRow, self.inner.add_row(table_id)).await
    }

    async fn add_bulk_rows(
        &self,
        table_id: TableId,
        req: &AddBulkRowsRequest,
    ) -> Result<AddBulkRowsResponse, ApiClientError> {
        self.run(Op::AddBulkRows, self.inner.add_bulk_rows(table_id, req))
            .await
    }

    async fn add_column(
        &self,
        table_id: TableId,
        req: &AddColumnRequest,
    ) -> Result<ColumnCreatedResponse, ApiClientError> {
        self.run(Op::AddColumn, self.inner.add_column(table_id, req))
            .await
    }

    async fn edit_cell(
        &self,
        cell_id: CellId,
        req: &EditCellRequest,
    ) -> Result<Cell, ApiClientError> {
        self.run(Op::EditCell, self.inner.edit_cell(cell_id, req)).await
    }

    async fn delete_row(&self, row_id: RowId) -> Result<DeleteResponse, ApiClientError> {
        self.run(Op::DeleteRow, self.inner.delete_row(row_id)).await
    }

    async fn rename_column(
        &self,
        column_id: ColumnId,
        req: &RenameColumnRequest,
    ) -> Result<Column, ApiClientError> {
        self.run(Op::RenameColumn, self.inner.rename_column(column_id, req))
            .await
    }

    async fn create_view(
        &self,
        table_id: TableId,
        req: &CreateViewRequest,
    ) -> Result<View, ApiClientError> {
        self.run(Op::CreateView, self.inner.create_view(table_id, req))
            .await
    }

    async fn update_view(
        &self,
        view_id: ViewId,
        req: &UpdateViewRequest,
    ) -> Result<View, ApiClientError> {
        self.run(Op::UpdateView, self.inner.update_view(view_id, req))
            .await
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<DeleteResponse, ApiClientError> {
        self.run(Op::DeleteView, self.inner.delete_view(view_id)).await
    }
}

/// A freshly created base's first table, opened with a page size of 2 so
/// the four seeded rows arrive over several pages.
pub async fn open_seeded_table() -> TestResult<TableSession<FlakyRemote>> {
    let db = DbClient::in_memory(DataLimits::default());
    let inner = InProcessRemote::new(db, TEST_USER);
    let base = inner.create_base(&CreateBaseRequest::default()).await?;
    let table_id = base
        .tables
        .first()
        .map(|table| table.table_id)
        .ok_or("seeded base has no table")?;
    Ok(TableSession::open(FlakyRemote::new(inner), table_id, 2).await?)
}
