//! Export presets as WAV files with JSON sidecars.

use anyhow::{Context, Result};
use serde::Serialize;
use sfbank_core::{Preset, Sample, SoundFont};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the export command.
#[derive(Debug, Clone)]
pub struct ExportArgs {
    /// Directory to write into; created if missing
    pub output: PathBuf,
    /// Preset names to export; empty means every preset
    pub presets: Vec<String>,
}

/// What an export run wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub presets: usize,
    pub samples: usize,
    pub skipped: usize,
}

/// Playback metadata written next to each WAV file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleMetadata {
    /// Loop start and end, relative to the first sample point
    loop_range: [u32; 2],
    original_pitch: u8,
    pan: Option<i16>,
    pitch_correction: i8,
    sample_rate: u32,
}

/// Entry of `samples.json`, with paths relative to the output directory.
#[derive(Debug, Serialize)]
struct SampleFiles {
    wav: String,
    metadata: String,
}

/// Make a name safe to use as a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}

fn select_presets<'a>(font: &'a SoundFont, names: &[String]) -> Result<Vec<&'a Preset>> {
    if names.is_empty() {
        return Ok(font.presets.iter().collect());
    }

    names
        .iter()
        .map(|name| {
            font.presets
                .iter()
                .find(|preset| &preset.name == name)
                .with_context(|| format!("No preset named '{}' in bank", name))
        })
        .collect()
}

fn write_wav(path: &Path, sample: &Sample) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for frame in sample.data().frames() {
        writer.write_sample(frame)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write every sample reachable from the selected presets.
///
/// Layout: `<output>/<preset>/<sample>.wav` and `<sample>.metadata.json`, plus
/// `<output>/samples.json` indexing them by sample name. Distinct samples whose
/// names collide get their sample index appended, both on disk and in the index.
pub fn export(font: &SoundFont, args: &ExportArgs) -> Result<ExportSummary> {
    let presets = select_presets(font, &args.presets)?;
    let mut summary = ExportSummary::default();
    let mut index: BTreeMap<String, SampleFiles> = BTreeMap::new();
    // Which sample owns each `samples.json` key.
    let mut index_owners: BTreeMap<String, usize> = BTreeMap::new();

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    for preset in presets {
        let preset_dir = sanitize_file_name(&preset.name);
        let dir = args.output.join(&preset_dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        log::info!("Exporting preset '{}' to {}", preset.name, dir.display());

        let mut written = HashSet::new();
        let mut stems = HashSet::new();
        for preset_zone in &preset.zones {
            let Some(instrument) = font.instrument(preset_zone.instrument) else {
                continue;
            };
            for zone in &instrument.zones {
                let Some(sample) = font.sample(zone.sample) else {
                    continue;
                };
                if !written.insert(sample.index()) {
                    continue;
                }
                if sample.link_type().is_rom() {
                    log::warn!(
                        "Skipping ROM sample '{}' in preset '{}': no PCM data in file",
                        sample.name(),
                        preset.name
                    );
                    summary.skipped += 1;
                    continue;
                }

                let mut stem = sanitize_file_name(sample.name());
                if !stems.insert(stem.clone()) {
                    let unique = format!("{}_{}", stem, sample.index());
                    log::warn!(
                        "Sample #{} '{}' clashes with a file in preset '{}'; writing '{}'",
                        sample.index(),
                        sample.name(),
                        preset.name,
                        unique
                    );
                    stem = unique;
                    stems.insert(stem.clone());
                }
                let wav = format!("{}.wav", stem);
                let metadata = format!("{}.metadata.json", stem);

                write_wav(&dir.join(&wav), sample)?;
                let (loop_start, loop_end) = sample.loop_range();
                write_json(
                    &dir.join(&metadata),
                    &SampleMetadata {
                        loop_range: [loop_start, loop_end],
                        original_pitch: sample.original_pitch(),
                        pan: zone.pan,
                        pitch_correction: sample.pitch_correction(),
                        sample_rate: sample.sample_rate(),
                    },
                )?;

                log::debug!("Wrote {}/{}", preset_dir, wav);

                let mut key = sample.name().to_string();
                match index_owners.get(&key) {
                    Some(&owner) if owner != sample.index() => {
                        let unique = format!("{} #{}", key, sample.index());
                        log::warn!(
                            "Sample #{} shares the name '{}' with sample #{}; indexed as '{}'",
                            sample.index(),
                            key,
                            owner,
                            unique
                        );
                        key = unique;
                    }
                    _ => {}
                }
                index_owners.insert(key.clone(), sample.index());
                index.insert(
                    key,
                    SampleFiles {
                        wav: format!("{}/{}", preset_dir, wav),
                        metadata: format!("{}/{}", preset_dir, metadata),
                    },
                );
                summary.samples += 1;
            }
        }
        summary.presets += 1;
    }

    write_json(&args.output.join("samples.json"), &index)?;

    log::info!(
        "Exported {} samples from {} presets ({} skipped)",
        summary.samples,
        summary.presets,
        summary.skipped
    );

    Ok(summary)
}
