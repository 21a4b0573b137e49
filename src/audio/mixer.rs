use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

use crate::audio::narration::audio_length_seconds;
use crate::core::config::MixerConfig;

#[async_trait]
pub trait AudioMixer: Send + Sync {
    /// Combine narration audio with the fixed intro/outro bed into the final
    /// artifact, returning its path.
    async fn mix(&self, narration: &Path, output: &Path) -> Result<PathBuf>;
}

/// One sox invocation in the chain. Stages are strictly ordered: each one's
/// output file is the next one's input, so the chain cannot be reordered or
/// resumed mid-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub args: Vec<String>,
}

pub struct SoxMixer {
    bed_track: PathBuf,
    work_dir: PathBuf,
}

impl SoxMixer {
    pub fn new(config: &MixerConfig) -> Self {
        Self {
            bed_track: config.bed_track.clone(),
            work_dir: config.work_dir.clone(),
        }
    }

    fn work_file(&self, name: &str) -> String {
        self.work_dir.join(name).to_string_lossy().into_owned()
    }

    /// The full ordered plan. Pure: no filesystem access, so the chain's
    /// shape is checkable without sox or real audio.
    pub fn stage_plan(&self, narration: &Path, narration_secs: u64, output: &Path) -> Vec<Stage> {
        let bed = self.bed_track.to_string_lossy().into_owned();
        let narration = narration.to_string_lossy().into_owned();
        let output = output.to_string_lossy().into_owned();

        let resampled_bed = self.work_file("radio_intro_outro_resampled.mp3");
        let padded_narration = self.work_file("padded_vocals.mp3");
        let faded_bed = self.work_file("faded_intro_outro.mp3");
        let padded_outro = self.work_file("padded_outro.mp3");
        let mixed = self.work_file("mixed_broadcast.wav");
        let compressed = self.work_file("compressed_broadcast.wav");

        vec![
            // bed and narration must share the mixer's native sample rate
            Stage {
                name: "resample_bed",
                args: str_args(&[&bed, &resampled_bed, "rate", "-h", "44100"]),
            },
            // 10 seconds of silence before the narration starts
            Stage {
                name: "pad_narration",
                args: str_args(&[&narration, &padded_narration, "pad", "10@0"]),
            },
            // 5s fade-in, 25s clip, 20s fade-out
            Stage {
                name: "fade_bed",
                args: str_args(&[&resampled_bed, &faded_bed, "fade", "5", "25", "20"]),
            },
            // delay the outro copy of the bed until the narration has ended
            Stage {
                name: "pad_outro",
                args: str_args(&[
                    &faded_bed,
                    &padded_outro,
                    "pad",
                    &format!("{}@0", narration_secs),
                ]),
            },
            // intro bed, narration, outro bed as channels at fixed gains
            Stage {
                name: "multiplex",
                args: str_args(&[
                    "-M", "-v", "0.3", &faded_bed, "-v", "1.2", &padded_narration, "-v", "0.4",
                    &padded_outro, &mixed,
                ]),
            },
            // dynamic range compression, fade-in, peak normalize to -3 dB
            Stage {
                name: "compress",
                args: str_args(&[
                    &mixed,
                    &compressed,
                    "fade",
                    "5",
                    "compand",
                    "0.3,1",
                    "6:-70,-60,-20",
                    "-5",
                    "-90",
                    "0.2",
                    "norm",
                    "-3",
                ]),
            },
            // single channel, final output encoding
            Stage {
                name: "downmix",
                args: str_args(&[&compressed, &output, "remix", "-"]),
            },
        ]
    }

    async fn run_stage(&self, stage: &Stage) -> Result<()> {
        info!("Mixer stage: {}", stage.name);
        let output = Command::new("sox").args(&stage.args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("mixer stage {} failed: {}", stage.name, stderr));
        }
        Ok(())
    }

    async fn run_chain(&self, stages: &[Stage]) -> Result<()> {
        for stage in stages {
            self.run_stage(stage).await?;
        }
        Ok(())
    }

    async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove mixer work dir {:?}: {}", self.work_dir, e);
            }
        }
    }
}

fn str_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl AudioMixer for SoxMixer {
    async fn mix(&self, narration: &Path, output: &Path) -> Result<PathBuf> {
        let narration_secs = audio_length_seconds(narration);

        // A failed run must never leave a stale artifact looking like success.
        if tokio::fs::try_exists(output).await.unwrap_or(false) {
            tokio::fs::remove_file(output).await.ok();
        }
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let stages = self.stage_plan(narration, narration_secs, output);
        let result = self.run_chain(&stages).await;

        // Intermediates go away whether or not the chain finished.
        self.cleanup().await;
        result?;

        Ok(output.to_path_buf())
    }
}
