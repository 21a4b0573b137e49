use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::config::ThermostatConfig;

pub const UNAVAILABLE: &str = "Thermostat status unavailable";

#[derive(Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct Zone {
    name: String,
    mode: String,
    temperature: f64,
}

fn format_status(zone: &Zone) -> String {
    format!(
        "The thermostat is set to {} and the indoor temperature is {}",
        zone.mode, zone.temperature
    )
}

async fn try_collect(config: &ThermostatConfig) -> Result<String> {
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/session", config.base_url))
        .json(&SessionRequest {
            username: &config.username,
            password: &config.password,
        })
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(anyhow!("thermostat login returned {}", res.status()));
    }
    let session: SessionResponse = res.json().await?;

    let res = client
        .get(format!("{}/api/zones", config.base_url))
        .header("X-Session-Id", &session.session_id)
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(anyhow!("zone query returned {}", res.status()));
    }
    let zones: Vec<Zone> = res.json().await?;

    let zone = zones
        .into_iter()
        .find(|z| z.name == config.zone_name)
        .ok_or_else(|| anyhow!("no zone named {}", config.zone_name))?;
    Ok(format_status(&zone))
}

/// One thermostat sentence, or the fixed sentinel on any failure.
pub async fn collect(config: Result<ThermostatConfig>) -> String {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            warn!("Thermostat collector not configured: {}", e);
            return UNAVAILABLE.to_string();
        }
    };
    match try_collect(&config).await {
        Ok(sentence) => sentence,
        Err(e) => {
            warn!("Error getting thermostat status: {}", e);
            UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mode_and_temperature() {
        let zone = Zone {
            name: "THERMOSTAT".to_string(),
            mode: "Cool".to_string(),
            temperature: 72.0,
        };
        assert_eq!(
            format_status(&zone),
            "The thermostat is set to Cool and the indoor temperature is 72"
        );
    }

    #[tokio::test]
    async fn unreachable_provider_yields_sentinel() {
        let config = ThermostatConfig {
            username: "u".to_string(),
            password: "p".to_string(),
            zone_name: "THERMOSTAT".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        };
        assert_eq!(collect(Ok(config)).await, UNAVAILABLE);
    }

    #[tokio::test]
    async fn missing_configuration_yields_sentinel() {
        let out = collect(Err(anyhow!("Missing required environment variable HONEYWELL_USERNAME"))).await;
        assert_eq!(out, UNAVAILABLE);
    }
}
