use anyhow::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::core::config::CameraConfig;
use crate::core::credentials::CredentialStore;
use crate::providers::wyze::{CameraApi, CameraEvent, CameraSession, WyzeHttpApi};

/// How far back to look for motion/sound events.
const LOOKBACK_HOURS: i64 = 12;

/// "<device> detected <alarm>", plus "and {heard|saw} <tags>" when the event
/// carries descriptive tags. "heard" applies exactly when the alarm type is
/// sound (case-insensitive); absent tags are dropped before joining.
fn format_camera_event(nickname: &str, alarm_description: &str, tags: &[Option<String>]) -> String {
    let event_text = format!("{} detected {}", nickname, alarm_description);
    let tags: Vec<String> = tags
        .iter()
        .flatten()
        .map(|tag| format!("a {}", tag))
        .collect();
    if tags.is_empty() {
        return event_text;
    }
    let verb = if alarm_description.eq_ignore_ascii_case("sound") {
        "heard"
    } else {
        "saw"
    };
    format!("{} and {} {}", event_text, verb, tags.join(" and "))
}

async fn try_collect<A, S>(session: &CameraSession<A, S>) -> Result<Vec<String>>
where
    A: CameraApi,
    S: CredentialStore,
{
    let devices = session.list_devices().await?;
    let names: HashMap<&str, &str> = devices
        .iter()
        .map(|d| (d.mac.as_str(), d.nickname.as_str()))
        .collect();

    let begin = Utc::now() - Duration::hours(LOOKBACK_HOURS);
    let mut events = Vec::new();
    // Query in device-list order so the narrated events come out in a stable
    // order run over run.
    for device in &devices {
        let device_events: Vec<CameraEvent> = session.list_events(&device.mac, begin).await?;
        for event in device_events {
            let nickname = names
                .get(event.device_mac.as_str())
                .copied()
                .unwrap_or(event.device_mac.as_str());
            events.push(format_camera_event(
                nickname,
                &event.alarm_description,
                &event.tags,
            ));
        }
    }
    Ok(events)
}

async fn collect_with<A, S>(session: &CameraSession<A, S>) -> Vec<String>
where
    A: CameraApi,
    S: CredentialStore,
{
    match try_collect(session).await {
        Ok(events) => events,
        Err(e) => {
            warn!("Error getting camera events: {}", e);
            Vec::new()
        }
    }
}

/// Camera detection sentences from the last 12 hours, or an empty list on
/// any failure (including authentication that cannot be recovered by the
/// session's single refresh).
pub async fn collect(config: Result<CameraConfig>, store: impl CredentialStore) -> Vec<String> {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            warn!("Camera collector not configured: {}", e);
            return Vec::new();
        }
    };
    let session = CameraSession::new(WyzeHttpApi::new(config), store);
    collect_with(&session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_alarms_use_heard_regardless_of_case() {
        let tags = vec![Some("person".to_string())];
        let sentence = format_camera_event("Back Porch", "Sound", &tags);
        assert_eq!(sentence, "Back Porch detected Sound and heard a person");

        let sentence = format_camera_event("Back Porch", "SOUND", &tags);
        assert!(sentence.contains("heard"));
    }

    #[test]
    fn non_sound_alarms_use_saw() {
        let tags = vec![Some("person".to_string()), Some("pet".to_string())];
        let sentence = format_camera_event("Front Door", "Motion", &tags);
        assert_eq!(
            sentence,
            "Front Door detected Motion and saw a person and a pet"
        );
    }

    #[test]
    fn none_tags_are_filtered_before_joining() {
        let tags = vec![None, Some("package".to_string()), None];
        let sentence = format_camera_event("Driveway", "Motion", &tags);
        assert_eq!(sentence, "Driveway detected Motion and saw a package");
    }

    #[test]
    fn all_none_tags_leave_the_bare_detection_sentence() {
        let tags = vec![None, None];
        let sentence = format_camera_event("Driveway", "Motion", &tags);
        assert_eq!(sentence, "Driveway detected Motion");
    }

    #[test]
    fn no_tags_leave_the_bare_detection_sentence() {
        let sentence = format_camera_event("Garage", "Smoke", &[]);
        assert_eq!(sentence, "Garage detected Smoke");
    }

    #[tokio::test]
    async fn events_follow_device_list_order() {
        use crate::core::credentials::TokenPair;
        use crate::providers::wyze::{Device, WyzeError};
        use async_trait::async_trait;
        use chrono::{DateTime, Utc};

        struct OrderedApi;

        #[async_trait]
        impl CameraApi for OrderedApi {
            async fn login(&self) -> Result<TokenPair, WyzeError> {
                unreachable!("tokens are already stored")
            }
            async fn refresh(&self, _r: &str) -> Result<TokenPair, WyzeError> {
                unreachable!()
            }
            async fn list_devices(&self, _t: &str) -> Result<Vec<Device>, WyzeError> {
                Ok(vec![
                    Device {
                        mac: "ZZ:99".to_string(),
                        nickname: "Back Porch".to_string(),
                    },
                    Device {
                        mac: "AA:11".to_string(),
                        nickname: "Front Door".to_string(),
                    },
                ])
            }
            async fn list_events(
                &self,
                _t: &str,
                mac: &str,
                _b: DateTime<Utc>,
            ) -> Result<Vec<CameraEvent>, WyzeError> {
                Ok(vec![CameraEvent {
                    device_mac: mac.to_string(),
                    alarm_description: "Motion".to_string(),
                    tags: vec![],
                }])
            }
        }

        struct SeededStore;

        #[async_trait]
        impl CredentialStore for SeededStore {
            async fn load(&self) -> Result<TokenPair> {
                Ok(TokenPair {
                    access_token: "t".to_string(),
                    refresh_token: "r".to_string(),
                })
            }
            async fn store(&self, _pair: &TokenPair) -> Result<()> {
                Ok(())
            }
        }

        let session = CameraSession::new(OrderedApi, SeededStore);
        let events = try_collect(&session).await.unwrap();
        assert_eq!(
            events,
            vec!["Back Porch detected Motion", "Front Door detected Motion"]
        );
    }

    #[tokio::test]
    async fn provider_failure_yields_empty_list() {
        use crate::core::credentials::TokenPair;
        use crate::providers::wyze::{Device, WyzeError};
        use async_trait::async_trait;
        use chrono::{DateTime, Utc};

        struct DownApi;

        #[async_trait]
        impl CameraApi for DownApi {
            async fn login(&self) -> Result<TokenPair, WyzeError> {
                Err(WyzeError::Api {
                    code: "503".to_string(),
                    message: "service unavailable".to_string(),
                })
            }
            async fn refresh(&self, _r: &str) -> Result<TokenPair, WyzeError> {
                unreachable!()
            }
            async fn list_devices(&self, _t: &str) -> Result<Vec<Device>, WyzeError> {
                unreachable!()
            }
            async fn list_events(
                &self,
                _t: &str,
                _m: &str,
                _b: DateTime<Utc>,
            ) -> Result<Vec<CameraEvent>, WyzeError> {
                unreachable!()
            }
        }

        struct EmptyStore;

        #[async_trait]
        impl CredentialStore for EmptyStore {
            async fn load(&self) -> Result<TokenPair> {
                Ok(TokenPair::default())
            }
            async fn store(&self, _pair: &TokenPair) -> Result<()> {
                Ok(())
            }
        }

        let session = CameraSession::new(DownApi, EmptyStore);
        assert!(try_collect(&session).await.is_err());
        assert!(collect_with(&session).await.is_empty());
    }
}
