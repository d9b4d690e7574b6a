//! Swagger-driven request and normalization layer for the move office portal.
//!
//! The crate sits between callers and the four Swagger-described backends
//! (internal, admin, GHC and Prime). It loads each surface's document once,
//! dispatches `"tag.operationId"` operations against it, resolves the schema
//! key of a response and flattens the payload into an [`EntityStore`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), moveportal_core::RequestError> {
//! use moveportal_core::{ClientRegistry, CookieJar, Params, PortalConfig, RequestOptions, Surface};
//! use std::sync::Arc;
//!
//! let registry = ClientRegistry::new(PortalConfig::default(), Arc::new(CookieJar::default()));
//! let mut params = Params::new();
//! params.insert("shipmentID".into(), "abcd-1234".into());
//! let payload = registry
//!     .request(Surface::Ghc, "shipments.getShipment", &params, &RequestOptions::default())
//!     .await?;
//! # let _ = payload;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod registry;
pub mod request;
pub mod surface;
pub mod swagger;

pub use client::interceptors::{CookieJar, CookieSource};
pub use client::{ApiResponse, OperationClient, Params, ResponseBody, SwaggerClient};
pub use config::PortalConfig;
pub use entities::{EntityStore, EntityType, SchemaShape};
pub use error::{CallError, ConfigError, NormalizeError, RequestError, SpecLoadError};
pub use registry::ClientRegistry;
pub use request::{Payload, RequestOptions, request, request_raw};
pub use surface::Surface;
