//! Request and response interceptors installed on every operation client.
//!
//! Request interceptors run after the request is fully built and before it is
//! sent; response interceptors observe every response, success or not, before
//! the caller sees it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, warn};

use super::ApiResponse;
use crate::surface::Surface;

/// Read access to the cookies of the current session.
pub trait CookieSource: Send + Sync + Debug {
    /// Current value of the named cookie.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// In-memory cookie store shared between the caller and the clients.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<HashMap<String, String>>,
}

impl CookieJar {
    /// An empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    ///
    /// Pairs without `=` are skipped.
    pub fn from_cookie_header(header: &str) -> Self {
        let jar = Self::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.set(name, value.trim());
                }
            }
        }
        jar
    }

    /// Set or replace a cookie.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Remove a cookie, returning its last value.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl CookieSource for CookieJar {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

/// Hook run on every outgoing request.
pub trait RequestInterceptor: Send + Sync + Debug {
    /// Mutate the request before it is sent.
    fn before_send(&self, surface: Surface, request: &mut reqwest::Request);
}

/// Hook run on every response, including non-success ones.
pub trait ResponseInterceptor: Send + Sync + Debug {
    /// Observe the response; it is passed on unchanged.
    fn on_response(&self, surface: Surface, response: &ApiResponse);
}

/// Copies the anti-forgery token from a cookie into a request header.
#[derive(Debug)]
pub struct CsrfInterceptor {
    cookies: Arc<dyn CookieSource>,
    cookie_name: String,
    header_name: String,
}

impl CsrfInterceptor {
    /// Read `cookie_name` from `cookies` and send it as `header_name`.
    pub fn new(
        cookies: Arc<dyn CookieSource>,
        cookie_name: impl Into<String>,
        header_name: impl Into<String>,
    ) -> Self {
        Self {
            cookies,
            cookie_name: cookie_name.into(),
            header_name: header_name.into(),
        }
    }
}

impl RequestInterceptor for CsrfInterceptor {
    fn before_send(&self, surface: Surface, request: &mut reqwest::Request) {
        let Some(token) = self.cookies.cookie(&self.cookie_name) else {
            warn!(
                %surface,
                cookie = %self.cookie_name,
                url = %request.url(),
                "Anti-forgery cookie not found; sending request without token."
            );
            return;
        };

        let name = match HeaderName::from_bytes(self.header_name.as_bytes()) {
            Ok(name) => name,
            Err(err) => {
                warn!(%surface, header = %self.header_name, error = %err, "Invalid anti-forgery header name.");
                return;
            }
        };
        match HeaderValue::from_str(&token) {
            Ok(value) => {
                debug!(%surface, header = %name, "Attached anti-forgery token.");
                request.headers_mut().insert(name, value);
            }
            Err(err) => {
                warn!(%surface, cookie = %self.cookie_name, error = %err, "Anti-forgery cookie is not a valid header value.");
            }
        }
    }
}

/// Reports responses that mean the session has ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionObserver;

impl ResponseInterceptor for SessionObserver {
    fn on_response(&self, surface: Surface, response: &ApiResponse) {
        if response.status == 401 {
            warn!(%surface, url = %response.url, "Session is no longer valid (HTTP 401).");
        }
    }
}

/// Response interceptor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResponseInterceptor;

impl ResponseInterceptor for NoopResponseInterceptor {
    fn on_response(&self, _surface: Surface, _response: &ApiResponse) {}
}

/// The response interceptor a surface gets by default.
pub fn default_response_interceptor(surface: Surface) -> Arc<dyn ResponseInterceptor> {
    if surface.uses_session() {
        Arc::new(SessionObserver)
    } else {
        Arc::new(NoopResponseInterceptor)
    }
}
