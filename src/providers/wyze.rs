use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::CameraConfig;
use crate::core::credentials::{CredentialStore, TokenPair};

/// Error code the provider returns once an access token has lapsed.
const EXPIRED_TOKEN_CODE: &str = "2001";

#[derive(Debug, thiserror::Error)]
pub enum WyzeError {
    #[error("The access token has expired")]
    TokenExpired,
    #[error("Wyze API error {code}: {message}")]
    Api { code: String, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("credential store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone)]
pub struct Device {
    pub mac: String,
    pub nickname: String,
}

#[derive(Debug, Clone)]
pub struct CameraEvent {
    pub device_mac: String,
    pub alarm_description: String,
    /// Descriptive AI tags; unknown tag ids come through as `None` and are
    /// filtered out at formatting time.
    pub tags: Vec<Option<String>>,
}

/// Raw camera API calls, taking explicit tokens. Split from the session so
/// the expiry/refresh state machine can be driven by a fake in tests.
#[async_trait]
pub trait CameraApi: Send + Sync {
    async fn login(&self) -> Result<TokenPair, WyzeError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, WyzeError>;
    async fn list_devices(&self, access_token: &str) -> Result<Vec<Device>, WyzeError>;
    async fn list_events(
        &self,
        access_token: &str,
        device_mac: &str,
        begin: DateTime<Utc>,
    ) -> Result<Vec<CameraEvent>, WyzeError>;
}

/// Authenticated camera session.
///
/// Lifecycle: no stored credentials → full login, persist the pair. A call
/// failing with an expired token gets exactly one refresh (persisting the new
/// pair in full) and one retry. A failing refresh, or any other error,
/// propagates to the caller.
pub struct CameraSession<A, S> {
    api: A,
    store: S,
}

impl<A: CameraApi, S: CredentialStore> CameraSession<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    async fn tokens(&self) -> Result<TokenPair, WyzeError> {
        let pair = self
            .store
            .load()
            .await
            .map_err(|e| WyzeError::Store(e.to_string()))?;
        if !pair.is_empty() {
            return Ok(pair);
        }
        info!("No stored camera credentials, performing full login");
        let pair = self.api.login().await?;
        self.store
            .store(&pair)
            .await
            .map_err(|e| WyzeError::Store(e.to_string()))?;
        Ok(pair)
    }

    async fn refresh_and_store(&self, expired: &TokenPair) -> Result<TokenPair, WyzeError> {
        info!("Camera access token expired, refreshing once");
        let pair = self.api.refresh(&expired.refresh_token).await?;
        self.store
            .store(&pair)
            .await
            .map_err(|e| WyzeError::Store(e.to_string()))?;
        Ok(pair)
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, WyzeError> {
        let pair = self.tokens().await?;
        match self.api.list_devices(&pair.access_token).await {
            Err(WyzeError::TokenExpired) => {
                let pair = self.refresh_and_store(&pair).await?;
                self.api.list_devices(&pair.access_token).await
            }
            other => other,
        }
    }

    pub async fn list_events(
        &self,
        device_mac: &str,
        begin: DateTime<Utc>,
    ) -> Result<Vec<CameraEvent>, WyzeError> {
        let pair = self.tokens().await?;
        match self.api.list_events(&pair.access_token, device_mac, begin).await {
            Err(WyzeError::TokenExpired) => {
                let pair = self.refresh_and_store(&pair).await?;
                self.api.list_events(&pair.access_token, device_mac, begin).await
            }
            other => other,
        }
    }
}

// ── HTTP wire formats ──

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct RefreshData {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct DeviceListRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct DeviceListData {
    #[serde(default)]
    device_list: Vec<WireDevice>,
}

#[derive(Deserialize)]
struct WireDevice {
    mac: String,
    #[serde(default)]
    nickname: String,
}

#[derive(Serialize)]
struct EventListRequest<'a> {
    access_token: &'a str,
    device_mac_list: Vec<&'a str>,
    begin_time: i64,
    end_time: i64,
    count: u32,
}

#[derive(Deserialize)]
struct EventListData {
    #[serde(default)]
    event_list: Vec<WireEvent>,
}

#[derive(Deserialize)]
struct WireEvent {
    device_mac: String,
    #[serde(default)]
    event_value: String,
    #[serde(default)]
    tag_list: Vec<i64>,
}

fn alarm_description(event_value: &str) -> String {
    match event_value {
        "1" => "Motion".to_string(),
        "2" => "Sound".to_string(),
        "3" => "Smoke".to_string(),
        "4" => "CO".to_string(),
        other => other.to_string(),
    }
}

fn tag_description(tag: i64) -> Option<String> {
    match tag {
        101 => Some("person".to_string()),
        102 => Some("vehicle".to_string()),
        103 => Some("pet".to_string()),
        104 => Some("package".to_string()),
        _ => None,
    }
}

fn check<T>(envelope: ApiEnvelope<T>) -> Result<Option<T>, WyzeError> {
    if envelope.code == EXPIRED_TOKEN_CODE
        || envelope.msg.starts_with("The access token has expired")
    {
        return Err(WyzeError::TokenExpired);
    }
    if envelope.code != "1" {
        return Err(WyzeError::Api {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    Ok(envelope.data)
}

pub struct WyzeHttpApi {
    config: CameraConfig,
    client: Client,
}

impl WyzeHttpApi {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CameraApi for WyzeHttpApi {
    async fn login(&self) -> Result<TokenPair, WyzeError> {
        let url = format!("{}/api/user/login", self.config.auth_base_url);
        let res = self
            .client
            .post(&url)
            .header("keyid", &self.config.key_id)
            .header("apikey", &self.config.api_key)
            .json(&LoginRequest {
                email: &self.config.email,
                password: &self.config.password,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(WyzeError::Api {
                code: res.status().as_u16().to_string(),
                message: res.text().await.unwrap_or_default(),
            });
        }

        let parsed: LoginResponse = res.json().await?;
        Ok(TokenPair {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, WyzeError> {
        let url = format!("{}/app/user/refresh_token", self.config.api_base_url);
        let res = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let envelope: ApiEnvelope<RefreshData> = res.json().await?;
        let data = check(envelope)?.ok_or_else(|| WyzeError::Api {
            code: "1".to_string(),
            message: "refresh response carried no token data".to_string(),
        })?;
        Ok(TokenPair {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
        })
    }

    async fn list_devices(&self, access_token: &str) -> Result<Vec<Device>, WyzeError> {
        let url = format!("{}/app/v2/home_page/get_object_list", self.config.api_base_url);
        let res = self
            .client
            .post(&url)
            .json(&DeviceListRequest { access_token })
            .send()
            .await?;

        let envelope: ApiEnvelope<DeviceListData> = res.json().await?;
        let data = check(envelope)?;
        Ok(data
            .map(|d| d.device_list)
            .unwrap_or_default()
            .into_iter()
            .map(|d| Device {
                mac: d.mac,
                nickname: d.nickname,
            })
            .collect())
    }

    async fn list_events(
        &self,
        access_token: &str,
        device_mac: &str,
        begin: DateTime<Utc>,
    ) -> Result<Vec<CameraEvent>, WyzeError> {
        let url = format!("{}/app/v2/device/get_event_list", self.config.api_base_url);
        let res = self
            .client
            .post(&url)
            .json(&EventListRequest {
                access_token,
                device_mac_list: vec![device_mac],
                begin_time: begin.timestamp_millis(),
                end_time: Utc::now().timestamp_millis(),
                count: 20,
            })
            .send()
            .await?;

        let envelope: ApiEnvelope<EventListData> = res.json().await?;
        let data = check(envelope)?;
        Ok(data
            .map(|d| d.event_list)
            .unwrap_or_default()
            .into_iter()
            .map(|e| CameraEvent {
                device_mac: e.device_mac,
                alarm_description: alarm_description(&e.event_value),
                tags: e.tag_list.into_iter().map(tag_description).collect(),
            })
            .collect())
    }
}
