//! Request envelope client
//!
//! Every backend call goes through [`ApiClient`]: it appends the path to the
//! configured base URL, forwards cookies, attaches the CSRF token on mutating
//! verbs and unwraps the `{code, data, errMessage, isSuccess}` envelope. The
//! caller gets `Ok(Some(data))`, `Ok(None)` for empty responses, or an
//! [`Error`].

use std::sync::Arc;

use libraryhub_core::auth::CsrfTokenResponse;
use libraryhub_core::cookies::{cookie_value, is_absolute_url, join_url, XSRF_COOKIE};
use libraryhub_core::envelope::{decode_response, is_no_content};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{ApiError, Error};
use crate::session::SessionStore;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Endpoint handing out fresh CSRF tokens.
pub const CSRF_TOKEN_PATH: &str = "/auth/csrf-token";

/// Per-call extras
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Applied last; replaces any header the client set itself
    pub headers: Vec<(String, String)>,
    /// `name=value; ...` sent as the `Cookie` header instead of the jar
    pub cookies: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Backend call that needs no CSRF token
    Read,
    /// Backend call that carries the CSRF token
    Write,
    /// Absolute URL outside the backend: no token, no cookies
    External,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    external: reqwest::Client,
    jar: Arc<Jar>,
    session: SessionStore,
    forwarded_cookies: Option<String>,
    csrf_refresh: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    /// Client with an empty cookie jar.
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self, Error> {
        Self::with_jar(config, session, Arc::new(Jar::default()))
    }

    /// Client sharing an existing cookie jar, e.g. one restored from disk.
    pub fn with_jar(config: &ApiConfig, session: SessionStore, jar: Arc<Jar>) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidRequest(format!("Invalid base URL {}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        let external = reqwest::Client::builder().build()?;

        Ok(Self {
            base_url,
            http,
            external,
            jar,
            session,
            forwarded_cookies: config.cookie.clone(),
            csrf_refresh: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Cookies the jar would send to the backend, as a header string.
    pub fn backend_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .filter(|v| !v.is_empty())
    }

    // --- Verbs ---

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<Option<T>, Error> {
        let request = self
            .http
            .get(self.url(path))
            .header(CONTENT_TYPE, "application/json");
        self.execute(request, Method::GET, path, options, Access::Read).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(request, Method::POST, path, options, Access::Write).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.put(self.url(path)).json(body);
        self.execute(request, Method::PUT, path, options, Access::Write).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<Option<T>, Error> {
        let request = self
            .http
            .delete(self.url(path))
            .header(CONTENT_TYPE, "application/json");
        self.execute(request, Method::DELETE, path, options, Access::Write).await
    }

    /// Multipart POST. An absolute `http(s)://` target is treated as an
    /// external upload endpoint and gets neither cookies nor the CSRF token.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        target: &str,
        form: reqwest::multipart::Form,
        options: &RequestOptions,
    ) -> Result<Option<T>, Error> {
        if is_absolute_url(target) {
            let request = self.external.post(target.trim()).multipart(form);
            return self
                .execute(request, Method::POST, target, options, Access::External)
                .await;
        }

        let request = self.http.post(self.url(target)).multipart(form);
        self.execute(request, Method::POST, target, options, Access::Write).await
    }

    // --- CSRF ---

    /// Fetch a fresh token from the backend and store it in the session,
    /// replacing whatever was there.
    pub async fn refresh_csrf_token(&self) -> Result<String, Error> {
        let _guard = self.csrf_refresh.lock().await;
        self.fetch_csrf_token(self.forwarded_cookies.as_deref()).await
    }

    /// Token for a mutating call: the session's, else the `XSRF-TOKEN`
    /// cookie, else a fresh one from the backend.
    ///
    /// Concurrent callers share a single refresh. When no token can be
    /// obtained the call goes out without one.
    async fn csrf_token(&self, cookies: Option<&str>) -> Option<String> {
        if let Some(token) = self.session.csrf_token() {
            return Some(token);
        }

        let _guard = self.csrf_refresh.lock().await;

        // Someone else may have refreshed while we waited.
        if let Some(token) = self.session.csrf_token() {
            return Some(token);
        }

        if let Some(token) = self.cookie_csrf_token(cookies) {
            log::debug!("Using CSRF token from {XSRF_COOKIE} cookie");
            self.session.set_csrf_token(Some(token.clone()));
            return Some(token);
        }

        match self.fetch_csrf_token(cookies).await {
            Ok(token) => Some(token),
            Err(err) => {
                log::warn!("CSRF token refresh failed, sending request without {CSRF_HEADER}: {err}");
                None
            }
        }
    }

    fn cookie_csrf_token(&self, cookies: Option<&str>) -> Option<String> {
        cookies
            .and_then(|c| cookie_value(c, XSRF_COOKIE))
            .map(str::to_string)
            .or_else(|| {
                let jar = self.backend_cookies()?;
                cookie_value(&jar, XSRF_COOKIE).map(str::to_string)
            })
    }

    /// Plain GET that never asks for a token itself. Caller holds the refresh lock.
    async fn fetch_csrf_token(&self, cookies: Option<&str>) -> Result<String, Error> {
        let mut request = self
            .http
            .get(self.url(CSRF_TOKEN_PATH))
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }

        log::debug!("GET {CSRF_TOKEN_PATH}");
        let response: Option<CsrfTokenResponse> = read_response(request.send().await?).await?;

        let token = response
            .map(|r| r.token_value)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::from_status(200, "CSRF token endpoint returned no token", None))?;

        self.session.set_csrf_token(Some(token.clone()));
        Ok(token)
    }

    // --- Plumbing ---

    fn url(&self, path: &str) -> String {
        join_url(self.base_url.as_str(), path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        method: Method,
        target: &str,
        options: &RequestOptions,
        access: Access,
    ) -> Result<Option<T>, Error> {
        if access != Access::External {
            let cookies = options.cookies.as_deref().or(self.forwarded_cookies.as_deref());

            if access == Access::Write {
                if let Some(token) = self.csrf_token(cookies).await {
                    request = request.header(CSRF_HEADER, token);
                }
            }
            if let Some(cookies) = cookies {
                request = request.header(COOKIE, cookies);
            }
        }

        if !options.headers.is_empty() {
            request = request.headers(header_overrides(&options.headers)?);
        }

        log::debug!("{method} {target}");
        let response = request.send().await?;
        read_response(response).await
    }
}

fn header_overrides(headers: &[(String, String)]) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("Invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidRequest(format!("Invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Turn a raw response into envelope data, deserialized as `T`.
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>, Error> {
    let status = response.status();
    let content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let no_content = is_no_content(status.as_u16(), content_length.as_deref());

    let body = if no_content {
        Vec::new()
    } else {
        response.bytes().await?.to_vec()
    };

    let Some(data) = decode_response(status.as_u16(), status.canonical_reason(), no_content, &body)? else {
        return Ok(None);
    };

    match T::deserialize(&data) {
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ApiError::from_status(
            status.as_u16(),
            format!("Failed to decode response data: {e}"),
            Some(data),
        )
        .into()),
    }
}
