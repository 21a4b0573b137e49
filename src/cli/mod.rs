use anyhow::Result;
use chrono::Local;
use console::style;
use std::path::Path;
use std::time::Instant;
use tracing::warn;

use crate::audio::mixer::SoxMixer;
use crate::audio::narration::ElevenLabsNarration;
use crate::collectors::{camera, mailbox, thermostat, weather};
use crate::core::config::{
    CameraConfig, MailboxConfig, MixerConfig, NarrationConfig, ScriptConfig, ThermostatConfig,
    WeatherConfig,
};
use crate::core::credentials::{CREDENTIALS_PATH, FileCredentialStore};
use crate::core::pipeline::produce;
use crate::core::record::{RECORD_PATH, RunRecord};
use crate::core::script::OpenAiScriptService;
use crate::core::terminal;
use crate::logging;

/// Narration lands here before mixing and is removed afterwards.
const NARRATION_PATH: &str = "vocals_file.mp3";

fn print_help() {
    println!(
        "\n {} {} [run]\n\n Produces one broadcast: collects events, generates and narrates\n a script, and mixes the final audio into broadcast.mp3.\n",
        style("Usage:").bold(),
        style("cozycast").green()
    );
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("help") {
        print_help();
        return Ok(());
    }

    logging::init();
    let start = Instant::now();
    terminal::print_step(terminal::MIC, "Starting Broadcast Generation...");

    let record_path = Path::new(RECORD_PATH);
    let mut record = RunRecord::load(record_path);
    record.created_at = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

    // Collectors run one after another; each isolates its own failures, so a
    // dead source contributes nothing instead of ending the run.
    terminal::print_step(terminal::SUN, "Collecting Weather Data");
    record.events.push(weather::collect(WeatherConfig::from_env()).await);

    terminal::print_step(terminal::MAIL, "Collecting Email Events");
    record.events.extend(mailbox::collect(MailboxConfig::from_env()).await);

    terminal::print_step(terminal::CAMERA, "Collecting Camera Events");
    let store = FileCredentialStore::new(CREDENTIALS_PATH);
    record.events.extend(camera::collect(CameraConfig::from_env(), store).await);

    terminal::print_step(terminal::THERMO, "Collecting Thermostat Status");
    record.events.push(thermostat::collect(ThermostatConfig::from_env()).await);

    let result = run_production(&mut record).await;

    // The narration file is an intermediate; it goes away on both outcomes.
    tokio::fs::remove_file(NARRATION_PATH).await.ok();

    match result {
        Ok(()) => {
            record.error.clear();
            record.save(record_path)?;
            let elapsed = start.elapsed().as_secs_f64();
            terminal::print_success(&format!("You're done! (Completed in {:.2} seconds)", elapsed));
            Ok(())
        }
        Err(e) => Err(record_failure(&mut record, record_path, e)),
    }
}

/// Record a fatal pipeline error and persist what was produced so far.
/// Partial progress is preserved, not discarded: whatever events, prompt, or
/// script were produced stay on the record. A failing save is logged rather
/// than returned, so the pipeline error itself always reaches the caller.
fn record_failure(record: &mut RunRecord, path: &Path, e: anyhow::Error) -> anyhow::Error {
    record.error = format!("{:#}", e);
    if let Err(save_err) = record.save(path) {
        warn!("Failed to save the run record after an error: {:#}", save_err);
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn pipeline_error_survives_a_failed_record_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = RunRecord::default();

        // Saving over a directory path fails, but the original error must
        // still be the one reported.
        let err = record_failure(&mut record, dir.path(), anyhow!("Script generation API error: 429"));
        assert_eq!(err.to_string(), "Script generation API error: 429");
        assert_eq!(record.error, "Script generation API error: 429");
    }

    #[test]
    fn record_failure_persists_partial_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.json");

        let mut record = RunRecord {
            events: vec!["Weather data unavailable".to_string()],
            script: "half a script".to_string(),
            ..Default::default()
        };
        record_failure(&mut record, &path, anyhow!("Non-success status code while streaming 500"));

        let saved = RunRecord::load(&path);
        assert_eq!(saved.events, vec!["Weather data unavailable".to_string()]);
        assert_eq!(saved.script, "half a script");
        assert_eq!(saved.error, "Non-success status code while streaming 500");
    }
}

async fn run_production(record: &mut RunRecord) -> Result<()> {
    let script_service = OpenAiScriptService::new(ScriptConfig::from_env()?);
    let narration_service = ElevenLabsNarration::new(NarrationConfig::from_env()?);
    let mixer_config = MixerConfig::default();
    let mixer = SoxMixer::new(&mixer_config);

    produce(
        record,
        &script_service,
        &narration_service,
        &mixer,
        Path::new(NARRATION_PATH),
        &mixer_config.output,
        Local::now(),
    )
    .await
}
