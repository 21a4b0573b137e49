use anyhow::{Context, Result};
use std::path::PathBuf;

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("Missing required environment variable {}", name))
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub latitude: String,
    pub longitude: String,
    pub api_key: String,
    pub base_url: String,
}

impl WeatherConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            latitude: required("LATITUDE")?,
            longitude: required("LONGITUDE")?,
            api_key: required("OPENWEATHERMAP_API_KEY")?,
            base_url: "https://api.openweathermap.org/data/3.0/onecall".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl MailboxConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: required("IMAP_HOST")?,
            port: 993,
            username: required("IMAP_USERNAME")?,
            password: required("IMAP_PASSWORD")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ThermostatConfig {
    pub username: String,
    pub password: String,
    pub zone_name: String,
    pub base_url: String,
}

impl ThermostatConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            username: required("HONEYWELL_USERNAME")?,
            password: required("HONEYWELL_PASSWORD")?,
            zone_name: "THERMOSTAT".to_string(),
            base_url: "https://www.mytotalconnectcomfort.com/portal".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub email: String,
    pub password: String,
    pub key_id: String,
    pub api_key: String,
    pub auth_base_url: String,
    pub api_base_url: String,
}

impl CameraConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            email: required("WYZE_EMAIL")?,
            password: required("WYZE_PASSWORD")?,
            key_id: required("WYZE_KEY_ID")?,
            api_key: required("WYZE_API_KEY")?,
            auth_base_url: "https://auth-prod.api.wyze.com".to_string(),
            api_base_url: "https://api.wyzecam.com".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScriptConfig {
    pub api_key: String,
    pub organization_id: String,
    pub model: String,
    pub base_url: String,
}

impl ScriptConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: required("OPENAI_ACCESS_TOKEN")?,
            organization_id: required("OPENAI_ORGANIZATION_ID")?,
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NarrationConfig {
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
}

impl NarrationConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: required("ELEVENLABS_API_KEY")?,
            voice_id: required("ELEVENLABS_VOICE_ID")?,
            model_id: "eleven_monolingual_v1".to_string(),
            base_url: "https://api.elevenlabs.io".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MixerConfig {
    pub bed_track: PathBuf,
    pub work_dir: PathBuf,
    pub output: PathBuf,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            bed_track: PathBuf::from("radio_intro_outro.mp3"),
            work_dir: PathBuf::from("work"),
            output: PathBuf::from("broadcast.mp3"),
        }
    }
}
