use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tracing::info;

use crate::core::config::NarrationConfig;

#[async_trait]
pub trait NarrationService: Send + Sync {
    /// Render the script text to a speech audio file. A non-success response
    /// is fatal for the run.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

pub struct ElevenLabsNarration {
    config: NarrationConfig,
    client: Client,
}

impl ElevenLabsNarration {
    pub fn new(config: NarrationConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl NarrationService for ElevenLabsNarration {
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let url = format!(
            "{}/v1/text-to-speech/{}/stream",
            self.config.base_url, self.config.voice_id
        );

        let res = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header("Accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.config.model_id,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(anyhow!(
                "Non-success status code while streaming {}",
                res.status().as_u16()
            ));
        }

        // Write the audio to disk as it arrives rather than buffering the
        // whole payload.
        let mut file = tokio::fs::File::create(out_path).await?;
        let mut stream = res.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!("Wrote {} bytes of narration to {:?}", written, out_path);
        Ok(())
    }
}

/// Embedded media duration in whole seconds. A missing file or unparsable
/// metadata yields 0; duration is only a padding parameter downstream, not a
/// correctness gate.
pub fn audio_length_seconds(path: &Path) -> u64 {
    if !path.exists() {
        return 0;
    }
    match mp3_duration::from_path(path) {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_has_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(audio_length_seconds(&dir.path().join("nope.mp3")), 0);
    }

    #[test]
    fn unparsable_metadata_has_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.mp3");
        std::fs::write(&path, b"this is not an mpeg frame").unwrap();
        assert_eq!(audio_length_seconds(&path), 0);
    }
}
