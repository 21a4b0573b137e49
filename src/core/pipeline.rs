use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::info;

use crate::audio::mixer::AudioMixer;
use crate::audio::narration::NarrationService;
use crate::core::record::RunRecord;
use crate::core::script::{ScriptService, build_script_prompt};
use crate::core::terminal;

/// Run the production stages against an already-collected record:
/// prompt assembly → script generation → narration → mixing.
///
/// The record is mutated as each stage completes, so on a fatal error the
/// caller can persist whatever was produced up to that point. Collector
/// events are expected to already be on the record.
pub async fn produce(
    record: &mut RunRecord,
    script_service: &dyn ScriptService,
    narration_service: &dyn NarrationService,
    mixer: &dyn AudioMixer,
    narration_path: &Path,
    output_path: &Path,
    now: DateTime<Local>,
) -> Result<()> {
    record.script_prompt = build_script_prompt(now, &record.events);

    terminal::print_step(terminal::PEN, "Generating Script");
    record.script = script_service.generate(&record.script_prompt).await?;
    info!("Generated a {}-character script", record.script.len());

    terminal::print_step(terminal::VOICE, "Getting Vocals");
    narration_service.synthesize(&record.script, narration_path).await?;

    terminal::print_step(terminal::NOTES, "Mixing Audio");
    let artifact = mixer.mix(narration_path, output_path).await?;
    record.audio_file = artifact.to_string_lossy().into_owned();

    Ok(())
}
