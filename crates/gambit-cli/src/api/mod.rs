//! HTTP client for the hosted backend
//!
//! Talks to the storage, auth and REST endpoints of the backend-as-a-service
//! that holds the platform's data.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use gambit_core::{
    AuthBackend, AuthTokens, AuthUser, GambitError, ListOptions, ObjectStore, StorageEntry,
    UserRole,
};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use serde::Deserialize;
use tracing::debug;

pub struct Client {
    http: ReqwestClient,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl Client {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http: ReqwestClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    /// Act on behalf of a signed-in user instead of the anonymous key
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Bearer credential: an explicit token, then the user's, then the anonymous key
    pub(crate) fn bearer<'a>(&'a self, token: Option<&'a str>) -> &'a str {
        token
            .or(self.access_token.as_deref())
            .unwrap_or(&self.anon_key)
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(self.bearer(token))
    }

    /// Build `<base>/<prefix...>/<path segments>`, percent-encoding each segment
    fn endpoint(&self, prefix: &[&str], path: &str) -> String {
        let segments = prefix
            .iter()
            .copied()
            .chain(path.split('/').filter(|s| !s.is_empty()));

        match Url::parse(&self.base_url) {
            Ok(mut url) => {
                if let Ok(mut parts) = url.path_segments_mut() {
                    parts.pop_if_empty().extend(segments);
                }
                url.to_string()
            }
            Err(_) => format!(
                "{}/{}",
                self.base_url,
                segments.collect::<Vec<_>>().join("/")
            ),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(AuthTokens, AuthUser)> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("apikey", self.anon_key.as_str())
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .context("Failed to send login request")?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            anyhow::bail!(
                "Login failed: {}",
                error_message(&body).unwrap_or_else(|| "Invalid credentials".to_string())
            );
        }

        let login: LoginResponse =
            serde_json::from_str(&body).context("Failed to parse login response")?;

        Ok((
            AuthTokens {
                access_token: login.access_token,
                refresh_token: login.refresh_token,
                expires_in: login.expires_in,
            },
            login.user,
        ))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let _ = self
            .authorized(
                self.http.post(format!("{}/auth/v1/logout", self.base_url)),
                Some(token),
            )
            .send()
            .await;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    role: UserRole,
}

/// Pull a human readable message out of an error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value[*key].as_str().map(str::to_string))
}

async fn backend_error(response: Response) -> GambitError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GambitError::Backend {
        status: Some(status.as_u16()),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    }
}

fn transport_error(e: reqwest::Error) -> GambitError {
    GambitError::backend(e.to_string())
}

#[async_trait]
impl ObjectStore for Client {
    async fn list(
        &self,
        bucket: &str,
        folder: &str,
        options: &ListOptions,
    ) -> gambit_core::Result<Vec<StorageEntry>> {
        let url = self.endpoint(&["storage", "v1", "object", "list", bucket], "");
        debug!("POST {} prefix='{}' limit={}", url, folder, options.limit);

        let response = self
            .authorized(self.http.post(&url), None)
            .json(&serde_json::json!({
                "prefix": folder,
                "limit": options.limit,
                "offset": 0,
                "sortBy": options.sort_by,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&["storage", "v1", "object", "public", bucket], path)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> gambit_core::Result<String> {
        let url = self.endpoint(&["storage", "v1", "object", bucket], path);
        debug!("POST {} ({} bytes, {})", url, data.len(), content_type);

        let response = self
            .authorized(self.http.post(&url), None)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        Ok(path.to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> gambit_core::Result<()> {
        let url = self.endpoint(&["storage", "v1", "object", bucket], "");
        debug!("DELETE {} ({} paths)", url, paths.len());

        let response = self
            .authorized(self.http.delete(&url), None)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        Ok(())
    }
}

#[async_trait]
impl AuthBackend for Client {
    async fn current_user(&self, access_token: &str) -> gambit_core::Result<Option<AuthUser>> {
        let response = self
            .authorized(
                self.http.get(format!("{}/auth/v1/user", self.base_url)),
                Some(access_token),
            )
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(backend_error(response).await);
        }

        let user: AuthUser = response.json().await.map_err(transport_error)?;
        Ok(Some(user))
    }

    async fn fetch_role(&self, user_id: &str, access_token: &str) -> gambit_core::Result<UserRole> {
        let response = self
            .authorized(
                self.http
                    .get(format!("{}/rest/v1/profiles", self.base_url))
                    .query(&[("id", format!("eq.{}", user_id)), ("select", "role".to_string())]),
                Some(access_token),
            )
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let rows: Vec<ProfileRow> = response.json().await.map_err(transport_error)?;
        Ok(rows.into_iter().next().map(|r| r.role).unwrap_or_default())
    }
}
