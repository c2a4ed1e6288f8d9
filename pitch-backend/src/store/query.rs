use super::{StoreError, StoreHandle};
use reqwest::header::{HeaderValue, CONTENT_RANGE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

const PREFER_HEADER: &str = "prefer";

/// A PostgREST read against one table, issued through the handle it came from.
#[derive(Debug, Clone)]
pub struct TableQuery<'a> {
    handle: &'a StoreHandle,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    limit: Option<usize>,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(handle: &'a StoreHandle, table: &str) -> Self {
        Self {
            handle,
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn url(&self) -> String {
        format!("{}/{}", self.handle.rest_url(), self.table)
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.handle
            .request(method, &self.url())
            .query(&self.params())
    }

    /// The GET request [`fetch`](Self::fetch) would send, without sending it.
    pub fn build(&self) -> Result<reqwest::Request, StoreError> {
        Ok(self.request(Method::GET).build()?)
    }

    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        let response = self.handle.send(self.request(Method::GET)).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(format!("rows from {}: {}", self.table, e)))
    }

    /// First matching row, or [`StoreError::NotFound`].
    pub async fn single<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        self.limit(1)
            .fetch::<T>()
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    /// Exact number of matching rows; no rows are transferred.
    pub async fn count(self) -> Result<u64, StoreError> {
        let request = self
            .request(Method::HEAD)
            .header(PREFER_HEADER, HeaderValue::from_static("count=exact"));
        let response = self.handle.send(request).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                StoreError::Decode(format!("missing or invalid Content-Range for {}", self.table))
            })
    }
}

/// Total from a PostgREST `Content-Range` value such as `0-24/3573` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}
