//! Per-surface operation clients, built lazily from the backend's Swagger
//! document and shared by every caller.
//!
//! The first caller for a surface fetches and parses the document; concurrent
//! callers wait for that same load. The outcome, success or failure, is kept
//! for the life of the registry.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::client::interceptors::{CookieSource, CsrfInterceptor, default_response_interceptor};
use crate::client::{ApiResponse, Params, SwaggerClient};
use crate::config::PortalConfig;
use crate::error::{RequestError, SpecLoadError};
use crate::request::{Payload, RequestOptions, request, request_raw};
use crate::surface::Surface;
use crate::swagger::SwaggerDocument;

type LoadOutcome = Result<Arc<SwaggerClient>, Arc<SpecLoadError>>;

/// Lazily loaded clients for the four API surfaces.
#[derive(Debug)]
pub struct ClientRegistry {
    config: PortalConfig,
    http: reqwest::Client,
    cookies: Arc<dyn CookieSource>,
    slots: [OnceCell<LoadOutcome>; 4],
}

impl ClientRegistry {
    /// A registry with a default HTTP client.
    pub fn new(config: PortalConfig, cookies: Arc<dyn CookieSource>) -> Self {
        Self::with_http_client(config, cookies, reqwest::Client::new())
    }

    /// A registry sending every spec fetch and operation call through `http`.
    pub fn with_http_client(
        config: PortalConfig,
        cookies: Arc<dyn CookieSource>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            http,
            cookies,
            slots: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Configuration the registry was built with.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// The client for a surface, loading its document on first use.
    ///
    /// A failed load is returned to every later caller without retrying.
    pub async fn client(&self, surface: Surface) -> Result<Arc<SwaggerClient>, Arc<SpecLoadError>> {
        self.slots[surface.slot()]
            .get_or_init(|| self.load(surface))
            .await
            .clone()
    }

    /// The client for a surface if its load already finished successfully.
    pub fn loaded(&self, surface: Surface) -> Option<Arc<SwaggerClient>> {
        self.slots[surface.slot()].get()?.as_ref().ok().cloned()
    }

    /// [`request`] against a surface's client.
    pub async fn request(
        &self,
        surface: Surface,
        operation_id: &str,
        params: &Params,
        options: &RequestOptions,
    ) -> Result<Payload, RequestError> {
        let client = self.client(surface).await?;
        request(&*client, operation_id, params, options).await
    }

    /// [`request_raw`] against a surface's client.
    pub async fn request_raw(
        &self,
        surface: Surface,
        operation_id: &str,
        params: &Params,
    ) -> Result<ApiResponse, RequestError> {
        let client = self.client(surface).await?;
        request_raw(&*client, operation_id, params).await
    }

    async fn load(&self, surface: Surface) -> LoadOutcome {
        match self.build(surface).await {
            Ok(client) => {
                info!(%surface, operations = client.operations().len(), "API client ready.");
                Ok(Arc::new(client))
            }
            Err(err) => {
                error!(%surface, error = %err, "Failed to load API spec.");
                Err(Arc::new(err))
            }
        }
    }

    async fn build(&self, surface: Surface) -> Result<SwaggerClient, SpecLoadError> {
        let spec_path = self.config.spec_path(surface);
        let spec_url = self
            .config
            .url_for(spec_path)
            .map_err(|source| SpecLoadError::InvalidUrl {
                surface,
                url: spec_path.to_string(),
                source,
            })?;
        let url = spec_url.to_string();
        let fetch_error = |source: reqwest::Error| SpecLoadError::Fetch {
            surface,
            url: url.clone(),
            source,
        };

        debug!(%surface, %url, "Fetching API spec.");
        let response = self
            .http
            .get(spec_url)
            .send()
            .await
            .map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpecLoadError::Status {
                surface,
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let text = response.text().await.map_err(fetch_error)?;
        let document = SwaggerDocument::from_yaml(&text)
            .map_err(|source| SpecLoadError::Parse { surface, source })?;

        let api_base = self
            .config
            .url_for(document.base_path())
            .map_err(|source| SpecLoadError::InvalidUrl {
                surface,
                url: document.base_path().to_string(),
                source,
            })?;

        let csrf = CsrfInterceptor::new(
            Arc::clone(&self.cookies),
            self.config.csrf_cookie.clone(),
            self.config.csrf_header.clone(),
        );
        Ok(SwaggerClient::new(surface, document, api_base, self.http.clone())?
            .with_request_interceptor(Arc::new(csrf))
            .with_response_interceptor(default_response_interceptor(surface)))
    }
}
