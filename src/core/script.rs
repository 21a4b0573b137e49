use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::ScriptConfig;

/// Fixed persona and formatting constraints for the generated script. The
/// current hour is baked in so the broadcast announces its own air time.
pub fn base_script_prompt(now: DateTime<Local>) -> String {
    let current_time = now.format("%I:00 %p");
    format!(
        "In the style of a 1930's radio broadcaster, give a news update summarizing the below events.\n\
         Do not include prompts, headers, or asterisks in the output.\n\
         Do not read them all individually but group common events and summarize them.\n\
         Do not include sound or music prompts. Mention that the broadcast is for the current time of {current_time}\n\
         The news update should be verbose and loquacious but please do not refer to yourself as either.\n\
         The station name is 1.101 Cozy Castle Radio and your radio broadcaster name is Hotsy Totsy Harry Fitzgerald.\n\
         At some point in the broadcast advertise for a ridiculous fictional product from the 1930's or tell a joke, do not do both.\n\
         Give an introduction to the news report and a sign off.\n\
         Here are the events:"
    )
}

/// Persona prompt plus the newline-joined event list.
pub fn build_script_prompt(now: DateTime<Local>, events: &[String]) -> String {
    format!("{}\n{}", base_script_prompt(now), events.join("\n"))
}

#[async_trait]
pub trait ScriptService: Send + Sync {
    /// Submit the full prompt in a single request and return the generated
    /// text raw; no post-processing or validation of its content.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ── chat-completion wire format ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOwned,
}

#[derive(Deserialize)]
struct ChatMessageOwned {
    content: String,
}

pub struct OpenAiScriptService {
    config: ScriptConfig,
    client: Client,
}

impl OpenAiScriptService {
    pub fn new(config: ScriptConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ScriptService for OpenAiScriptService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("OpenAI-Organization", &self.config.organization_id)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(anyhow!(
                "Script generation API error: {}",
                res.text().await.unwrap_or_default()
            ));
        }

        let parsed: ChatResponse = res.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("script generation returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prompt_mentions_the_current_hour() {
        let now = Local.with_ymd_and_hms(2024, 6, 21, 18, 42, 0).unwrap();
        let prompt = base_script_prompt(now);
        assert!(prompt.contains("06:00 PM"));
        assert!(prompt.contains("1930's radio broadcaster"));
    }

    #[test]
    fn events_are_newline_joined_after_the_persona() {
        let now = Local.with_ymd_and_hms(2024, 6, 21, 6, 0, 0).unwrap();
        let events = vec![
            "Weather: sunny, high 70.".to_string(),
            "Camera: Front Door detected Motion and saw a person.".to_string(),
        ];
        let prompt = build_script_prompt(now, &events);
        assert!(prompt.starts_with(&base_script_prompt(now)));
        assert!(prompt.ends_with(
            "Here are the events:\nWeather: sunny, high 70.\n\
             Camera: Front Door detected Motion and saw a person."
        ));
    }

    #[test]
    fn empty_event_list_still_produces_the_persona_prompt() {
        let now = Local.with_ymd_and_hms(2024, 6, 21, 6, 0, 0).unwrap();
        let prompt = build_script_prompt(now, &[]);
        assert!(prompt.ends_with("Here are the events:\n"));
    }
}
