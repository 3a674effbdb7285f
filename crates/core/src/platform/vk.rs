//! VK API client.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, multipart, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::value_to_param;
use super::{
    AccessToken, ApiError, CreateGroupParams, CreatedGroupPayload, PlatformApi, PlatformConnector,
    PlatformError, UploadedPhoto,
};
use crate::account::Account;
use crate::config::PlatformConfig;

/// VK client bound to one account's cookie and proxy.
pub struct VkClient {
    client: Client,
    config: PlatformConfig,
    cookie: String,
}

impl VkClient {
    pub fn new(
        config: PlatformConfig,
        cookie: impl Into<String>,
        proxy: Option<&str>,
    ) -> Result<Self, PlatformError> {
        let mut builder =
            Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if let Some(proxy) = proxy {
            let route = reqwest::Proxy::all(proxy).map_err(|e| PlatformError::InvalidProxy {
                proxy: proxy.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(route);
        }

        Ok(Self {
            client: builder.build()?,
            config,
            cookie: cookie.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), method)
    }

    /// Call an API method and decode its `response` field.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &AccessToken,
        params: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let mut query: Vec<(&str, String)> = vec![
            ("access_token", token.as_str().to_string()),
            ("v", self.config.api_version.clone()),
        ];
        query.extend(params.iter().cloned());

        debug!("Calling {}", method);
        let body: Value = self
            .client
            .get(self.method_url(method))
            .query(&query)
            .send()
            .await?
            .json()
            .await?;

        decode_envelope(body)
    }
}

/// Split a method response into its `error` or `response` part.
fn decode_envelope<T: DeserializeOwned>(mut body: Value) -> Result<T, PlatformError> {
    if let Some(error) = body.get_mut("error").map(Value::take) {
        if !error.is_null() {
            return Err(PlatformError::Api(ApiError::from_payload(error)));
        }
    }

    let response = body
        .get_mut("response")
        .map(Value::take)
        .ok_or_else(|| PlatformError::Decode(format!("no response field in {}", body)))?;

    serde_json::from_value(response).map_err(|e| PlatformError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadServer {
    upload_url: String,
}

#[async_trait]
impl PlatformApi for VkClient {
    async fn fetch_access_token(&self) -> Result<AccessToken, PlatformError> {
        let site = self.config.site_url.trim_end_matches('/');
        let form = [("version", "1"), ("app_id", self.config.app_id.as_str())];

        let response = self
            .client
            .post(&self.config.login_url)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9,ru;q=0.8")
            .header(header::COOKIE, &self.cookie)
            .header(header::ORIGIN, site)
            .header(header::REFERER, format!("{}/", site))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PlatformError::MissingToken(format!("HTTP {}: {}", status, text)));
        }

        let envelope: TokenEnvelope =
            serde_json::from_str(&text).map_err(|e| PlatformError::Decode(e.to_string()))?;

        envelope
            .data
            .and_then(|d| d.access_token)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or(PlatformError::MissingToken(text))
    }

    async fn create_group(
        &self,
        token: &AccessToken,
        params: &CreateGroupParams,
    ) -> Result<CreatedGroupPayload, PlatformError> {
        let mut query = vec![
            ("title", params.title.clone()),
            ("description", params.description.clone()),
            ("type", "group".to_string()),
            ("subtype", "2".to_string()),
        ];
        if let Some(answer) = &params.answer {
            query.push(("captcha_sid", answer.sid.clone()));
            query.push(("captcha_key", answer.key.clone()));
        }

        self.call("groups.create", token, &query).await
    }

    async fn owner_photo_upload_server(
        &self,
        token: &AccessToken,
        owner_id: i64,
    ) -> Result<String, PlatformError> {
        let server: UploadServer = self
            .call(
                "photos.getOwnerPhotoUploadServer",
                token,
                &[("owner_id", owner_id.to_string())],
            )
            .await?;
        Ok(server.upload_url)
    }

    async fn upload_photo(
        &self,
        upload_url: &str,
        photo: &Path,
    ) -> Result<UploadedPhoto, PlatformError> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.png".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = multipart::Form::new().part("photo", part);

        let body: Value = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            return Err(PlatformError::UploadRejected(error.to_string()));
        }

        let field = |name: &str| {
            body.get(name)
                .and_then(value_to_param)
                .ok_or_else(|| PlatformError::Decode(format!("upload response lacks '{}': {}", name, body)))
        };

        Ok(UploadedPhoto {
            server: field("server")?,
            photo: field("photo")?,
            hash: field("hash")?,
        })
    }

    async fn save_owner_photo(
        &self,
        token: &AccessToken,
        owner_id: i64,
        photo: &UploadedPhoto,
    ) -> Result<(), PlatformError> {
        let _: Value = self
            .call(
                "photos.saveOwnerPhoto",
                token,
                &[
                    ("owner_id", owner_id.to_string()),
                    ("server", photo.server.clone()),
                    ("hash", photo.hash.clone()),
                    ("photo", photo.photo.clone()),
                ],
            )
            .await?;
        Ok(())
    }
}

/// Builds a [`VkClient`] per account from shared platform settings.
pub struct VkConnector {
    config: PlatformConfig,
}

impl VkConnector {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }
}

/// Account's own User-Agent, else a stable pick from the pool keyed by
/// account name, else the shared fallback.
fn user_agent_for(config: &PlatformConfig, account: &Account) -> Option<String> {
    if let Some(ua) = account.user_agent() {
        return Some(ua.to_string());
    }
    let pool: Vec<&str> = config
        .user_agents
        .iter()
        .map(|ua| ua.trim())
        .filter(|ua| !ua.is_empty())
        .collect();
    if !pool.is_empty() {
        let mut hasher = DefaultHasher::new();
        account.name.hash(&mut hasher);
        let pick = (hasher.finish() % pool.len() as u64) as usize;
        return Some(pool[pick].to_string());
    }
    config.user_agent.clone()
}

impl PlatformConnector for VkConnector {
    fn connect(&self, account: &Account) -> Result<Arc<dyn PlatformApi>, PlatformError> {
        let mut config = self.config.clone();
        config.user_agent = user_agent_for(&self.config, account);
        debug!(
            "Connecting {} with user agent {:?}",
            account.name, config.user_agent
        );
        let client = VkClient::new(config, account.cookie.clone(), account.proxy_url())?;
        Ok(Arc::new(client))
    }
}
