//! REST client for the Tabula API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tabula_api::{
    AddBulkRowsRequest, AddBulkRowsResponse, AddColumnRequest, ApiError as ApiServerError,
    BaseResponse, ColumnCreatedResponse, CreateBaseRequest, CreateTableRequest,
    CreateViewRequest, DeleteResponse, EditCellRequest, ListBasesResponse, RenameColumnRequest,
    RowData, TableDataParams, TableDataResponse, UpdateBaseRequest, UpdateViewRequest,
    USER_ID_HEADER,
};
use tabula_core::{BaseId, Cell, CellId, Column, ColumnId, RowId, TableId, View, ViewId};

use crate::config::ClientConfig;
use crate::remote::RemoteTables;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error: {0}")]
    Api(#[from] ApiServerError),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    /// The structured server error, when the server sent one.
    pub fn api_error(&self) -> Option<&ApiServerError> {
        match self {
            ApiClientError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let mut headers = HeaderMap::new();
        let user = HeaderValue::from_str(config.user_id.trim())
            .map_err(|e| ApiClientError::Config(format!("invalid user_id: {}", e)))?;
        headers.insert(USER_ID_HEADER, user);

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url).headers(self.headers.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .patch(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn delete_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .delete(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(serde_json::from_str::<T>(&text)?);
        }
        if let Ok(api_error) = serde_json::from_str::<ApiServerError>(&text) {
            return Err(ApiClientError::Api(api_error));
        }
        Err(ApiClientError::InvalidResponse(format!(
            "HTTP {}: {}",
            status.as_u16(),
            text
        )))
    }
}

#[async_trait]
impl RemoteTables for RestClient {
    async fn list_bases(&self) -> Result<ListBasesResponse, ApiClientError> {
        self.get_json::<_, ()>("/api/v1/bases", None).await
    }

    async fn create_base(&self, req: &CreateBaseRequest) -> Result<BaseResponse, ApiClientError> {
        self.post_json("/api/v1/bases", req).await
    }

    async fn get_base(&self, id: BaseId) -> Result<BaseResponse, ApiClientError> {
        let path = format!("/api/v1/bases/{}", id);
        self.get_json::<_, ()>(&path, None).await
    }

    async fn update_base(
        &self,
        id: BaseId,
        req: &UpdateBaseRequest,
    ) -> Result<BaseResponse, ApiClientError> {
        let path = format!("/api/v1/bases/{}", id);
        self.patch_json(&path, req).await
    }

    async fn delete_base(&self, id: BaseId) -> Result<DeleteResponse, ApiClientError> {
        let path = format!("/api/v1/bases/{}", id);
        self.delete_json(&path).await
    }

    async fn create_table(
        &self,
        base_id: BaseId,
        req: &CreateTableRequest,
    ) -> Result<TableDataResponse, ApiClientError> {
        let path = format!("/api/v1/bases/{}/tables", base_id);
        self.post_json(&path, req).await
    }

    async fn table_data(
        &self,
        table_id: TableId,
        params: TableDataParams,
    ) -> Result<TableDataResponse, ApiClientError> {
        let path = format!("/api/v1/tables/{}/data", table_id);
        self.get_json(&path, Some(&params)).await
    }

    async fn add_row(&self, table_id: TableId) -> Result<RowData, ApiClientError> {
        let path = format!("/api/v1/tables/{}/rows", table_id);
        self.post_json(&path, &serde_json::json!({})).await
    }

    async fn add_bulk_rows(
        &self,
        table_id: TableId,
        req: &AddBulkRowsRequest,
    ) -> Result<AddBulkRowsResponse, ApiClientError> {
        let path = format!("/api/v1/tables/{}/rows/bulk", table_id);
        self.post_json(&path, req).await
    }

    async fn add_column(
        &self,
        table_id: TableId,
        req: &AddColumnRequest,
    ) -> Result<ColumnCreatedResponse, ApiClientError> {
        let path = format!("/api/v1/tables/{}/columns", table_id);
        self.post_json(&path, req).await
    }

    async fn edit_cell(
        &self,
        cell_id: CellId,
        req: &EditCellRequest,
    ) -> Result<Cell, ApiClientError> {
        let path = format!("/api/v1/cells/{}", cell_id);
        self.patch_json(&path, req).await
    }

    async fn delete_row(&self, row_id: RowId) -> Result<DeleteResponse, ApiClientError> {
        let path = format!("/api/v1/rows/{}", row_id);
        self.delete_json(&path).await
    }

    async fn rename_column(
        &self,
        column_id: ColumnId,
        req: &RenameColumnRequest,
    ) -> Result<Column, ApiClientError> {
        let path = format!("/api/v1/columns/{}", column_id);
        self.patch_json(&path, req).await
    }

    async fn create_view(
        &self,
        table_id: TableId,
        req: &CreateViewRequest,
    ) -> Result<View, ApiClientError> {
        let path = format!("/api/v1/tables/{}/views", table_id);
        self.post_json(&path, req).await
    }

    async fn update_view(
        &self,
        view_id: ViewId,
        req: &UpdateViewRequest,
    ) -> Result<View, ApiClientError> {
        let path = format!("/api/v1/views/{}", view_id);
        self.patch_json(&path, req).await
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<DeleteResponse, ApiClientError> {
        let path = format!("/api/v1/views/{}", view_id);
        self.delete_json(&path).await
    }
}
