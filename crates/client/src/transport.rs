//! HTTP transport for the catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use shelfwatch_core::{Item, ItemId};

use crate::config::{ClientConfig, ConfigError};
use crate::dto::{ItemPatch, NewItem};
use crate::error::{ErrorBody, TransportError};
use crate::page::{Page, PageResponse};

/// Anything that can produce pages of items. The list view only needs this.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, TransportError>;
}

#[async_trait]
impl<S> PageSource for Arc<S>
where
    S: PageSource + ?Sized,
{
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, TransportError> {
        (**self).fetch_page(page, page_size).await
    }
}

/// REST client for `/products`.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl CatalogClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.api_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "health check failed");
                false
            }
        }
    }

    pub async fn get_item(&self, id: &ItemId) -> Result<Item, TransportError> {
        let req = self.http.get(self.url(&format!("/products/{}", id)));
        self.send::<Item>(req).await?.ok_or(TransportError::EmptyBody)
    }

    pub async fn create_item(&self, item: &NewItem) -> Result<Item, TransportError> {
        let req = self.http.post(self.url("/products")).json(item);
        self.send::<Item>(req).await?.ok_or(TransportError::EmptyBody)
    }

    pub async fn update_item(&self, id: &ItemId, patch: &ItemPatch) -> Result<Item, TransportError> {
        let req = self.http.put(self.url(&format!("/products/{}", id))).json(patch);
        self.send::<Item>(req).await?.ok_or(TransportError::EmptyBody)
    }

    pub async fn delete_item(&self, id: &ItemId) -> Result<(), TransportError> {
        let req = self.http.delete(self.url(&format!("/products/{}", id)));
        self.send_discarding(req).await
    }

    pub async fn create_items(&self, items: &[NewItem]) -> Result<Vec<Item>, TransportError> {
        let req = self.http.post(self.url("/products/batch")).json(items);
        Ok(self.send::<Vec<Item>>(req).await?.unwrap_or_default())
    }

    pub async fn delete_items(&self, ids: &[ItemId]) -> Result<(), TransportError> {
        let joined = ids.iter().map(ItemId::as_str).collect::<Vec<_>>().join(",");
        let req = self
            .http
            .delete(self.url("/products/batch"))
            .query(&[("ids", joined)]);
        self.send_discarding(req).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Send a request and decode a JSON body. `Ok(None)` means 204 No Content.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, TransportError> {
        let bytes = match self.execute(req).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| TransportError::Parse(e.to_string()))
    }

    async fn send_discarding(&self, req: RequestBuilder) -> Result<(), TransportError> {
        self.execute(req).await.map(|_| ())
    }

    async fn execute(&self, mut req: RequestBuilder) -> Result<Option<Vec<u8>>, TransportError> {
        req = req.header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let request = req.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "catalog request");

        let resp = self.http.execute(request).await?;
        let status = resp.status();
        debug!(%method, %url, status = status.as_u16(), "catalog response");

        if !status.is_success() {
            let body = resp.bytes().await.map(|b| ErrorBody::from_bytes(&b)).unwrap_or(ErrorBody::Empty);
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = resp.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait]
impl PageSource for CatalogClient {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, TransportError> {
        let req = self
            .http
            .get(self.url("/products"))
            .query(&[("page", page), ("size", page_size)]);

        let page = match self.send::<PageResponse>(req).await? {
            Some(body) => body.into_page(page),
            None => Page::empty(page),
        };
        debug!(
            page = page.current_page,
            total_pages = page.total_pages,
            items = page.items.len(),
            "fetched page"
        );
        Ok(page)
    }
}
