use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::Deserialize;
use tracing::warn;

use crate::core::config::WeatherConfig;

pub const UNAVAILABLE: &str = "Weather data unavailable";

/// English ordinal suffix. The 11th/12th/13th family (and its repeats every
/// hundred: 111th, 213th, ...) takes "th" regardless of the final digit, so
/// the tens digit of `n % 100` is checked before the last-digit rule.
pub fn ordinalize(n: i64) -> String {
    let abs = n.abs();
    let suffix = if (11..=13).contains(&(abs % 100)) {
        "th"
    } else {
        match abs % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", n, suffix)
}

// ── one-call wire format ──

#[derive(Deserialize)]
struct OneCallResponse {
    current: Current,
    daily: Vec<Daily>,
}

#[derive(Deserialize)]
struct Current {
    dt: i64,
    temp: f64,
    feels_like: f64,
}

#[derive(Deserialize)]
struct Daily {
    #[serde(default)]
    summary: String,
    temp: DailyTemp,
    feels_like: DailyFeelsLike,
}

#[derive(Deserialize)]
struct DailyTemp {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct DailyFeelsLike {
    day: f64,
}

fn format_weather(data: &OneCallResponse, right_now: DateTime<Local>) -> Result<String> {
    let today = data.daily.first().ok_or_else(|| anyhow!("forecast carried no daily entries"))?;
    let tomorrow = data
        .daily
        .get(1)
        .ok_or_else(|| anyhow!("forecast carried no entry for tomorrow"))?;

    let day = i64::from(right_now.day());
    let parts = [
        "Today,".to_string(),
        right_now
            .format(&format!("%A, %B the {}", ordinalize(day)))
            .to_string(),
        format!("{}.", today.summary),
        format!(
            "Right now it's {} and feels like {}",
            data.current.temp.round(),
            data.current.feels_like.round()
        ),
        format!("with a low of {}", today.temp.min.round()),
        format!("with a high of {}.", today.temp.max.round()),
        format!("Tomorrow, {}", tomorrow.summary),
        format!(
            "and a high of {} and a heat index of {}",
            tomorrow.temp.max.round(),
            tomorrow.feels_like.day.round()
        ),
    ];

    Ok(parts.join(" "))
}

async fn try_collect(config: &WeatherConfig) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .get(&config.base_url)
        .query(&[
            ("lat", config.latitude.as_str()),
            ("lon", config.longitude.as_str()),
            ("appid", config.api_key.as_str()),
            ("units", "imperial"),
            // only current + daily forecasts are narrated
            ("exclude", "minutely,hourly"),
        ])
        .send()
        .await?;

    if !res.status().is_success() {
        return Err(anyhow!("weather provider returned {}", res.status()));
    }

    let data: OneCallResponse = res.json().await?;
    let right_now = Local
        .timestamp_opt(data.current.dt, 0)
        .single()
        .ok_or_else(|| anyhow!("invalid observation timestamp {}", data.current.dt))?;
    format_weather(&data, right_now)
}

/// One weather sentence, or the sentinel when the provider is unreachable.
pub async fn collect(config: Result<WeatherConfig>) -> String {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            warn!("Weather collector not configured: {}", e);
            return UNAVAILABLE.to_string();
        }
    };
    match try_collect(&config).await {
        Ok(sentence) => sentence,
        Err(e) => {
            warn!("Error getting weather event: {}", e);
            UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinalize_follows_last_digit_rule() {
        assert_eq!(ordinalize(1), "1st");
        assert_eq!(ordinalize(2), "2nd");
        assert_eq!(ordinalize(3), "3rd");
        assert_eq!(ordinalize(4), "4th");
        assert_eq!(ordinalize(21), "21st");
        assert_eq!(ordinalize(22), "22nd");
        assert_eq!(ordinalize(23), "23rd");
        assert_eq!(ordinalize(30), "30th");
    }

    #[test]
    fn ordinalize_teens_are_always_th() {
        assert_eq!(ordinalize(11), "11th");
        assert_eq!(ordinalize(12), "12th");
        assert_eq!(ordinalize(13), "13th");
    }

    #[test]
    fn ordinalize_teen_rule_repeats_every_hundred() {
        assert_eq!(ordinalize(111), "111th");
        assert_eq!(ordinalize(112), "112th");
        assert_eq!(ordinalize(113), "113th");
        assert_eq!(ordinalize(211), "211th");
        assert_eq!(ordinalize(212), "212th");
        assert_eq!(ordinalize(213), "213th");
        assert_eq!(ordinalize(121), "121st");
    }

    #[test]
    fn ordinalize_handles_negatives_via_absolute_value() {
        assert_eq!(ordinalize(-1), "-1st");
        assert_eq!(ordinalize(-11), "-11th");
        assert_eq!(ordinalize(-22), "-22nd");
    }

    #[test]
    fn formats_the_narrative_template() {
        let data = OneCallResponse {
            current: Current {
                dt: 0,
                temp: 71.4,
                feels_like: 73.6,
            },
            daily: vec![
                Daily {
                    summary: "Clear skies all day".to_string(),
                    temp: DailyTemp { min: 55.2, max: 78.9 },
                    feels_like: DailyFeelsLike { day: 80.1 },
                },
                Daily {
                    summary: "Scattered showers".to_string(),
                    temp: DailyTemp { min: 50.0, max: 68.4 },
                    feels_like: DailyFeelsLike { day: 66.0 },
                },
            ],
        };
        let right_now = Local.with_ymd_and_hms(2024, 6, 21, 8, 0, 0).unwrap();

        let sentence = format_weather(&data, right_now).unwrap();
        assert_eq!(
            sentence,
            "Today, Friday, June the 21st Clear skies all day. \
             Right now it's 71 and feels like 74 with a low of 55 with a high of 79. \
             Tomorrow, Scattered showers and a high of 68 and a heat index of 66"
        );
    }

    #[tokio::test]
    async fn unreachable_provider_yields_sentinel() {
        let config = WeatherConfig {
            latitude: "41.0".to_string(),
            longitude: "-87.0".to_string(),
            api_key: "k".to_string(),
            base_url: "http://127.0.0.1:9/onecall".to_string(),
        };
        assert_eq!(collect(Ok(config)).await, UNAVAILABLE);
    }

    #[tokio::test]
    async fn missing_configuration_yields_sentinel() {
        let out = collect(Err(anyhow!("Missing required environment variable LATITUDE"))).await;
        assert_eq!(out, UNAVAILABLE);
    }
}
