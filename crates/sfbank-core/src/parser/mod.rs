//! SF2 decoder
//!
//! Decoding runs leaf to root: the RIFF tree is tokenized, every record table
//! is decoded on its own, samples are bound to the PCM pool, and only then are
//! instrument zones (which select samples) and preset zones (which select
//! instruments) resolved.

use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;
use crate::types::SoundFont;

pub mod error;
pub mod generators;
pub mod modulators;
pub mod records;
pub mod riff;

mod info;
mod samples;
mod zones;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Decode a complete SF2 file.
///
/// The bank keeps `buffer` alive and every sample's data is a window into
/// it. Non-fatal findings go to `sink`; anything fatal aborts with an
/// [`Error`] and no partial bank.
pub fn decode(buffer: impl Into<Arc<[u8]>>, sink: &mut dyn DiagnosticSink) -> Result<SoundFont> {
    let buffer: Arc<[u8]> = buffer.into();
    let bytes: &[u8] = &buffer;

    let root = riff::parse_riff(bytes)?;
    let info = riff::require_list(root.children(), "INFO")?;
    let sdta = riff::require_list(root.children(), "sdta")?;
    let pdta = riff::require_list(root.children(), "pdta")?.children();

    let smpl = riff::require_chunk(sdta.children(), "smpl")?;
    let phdr = riff::require_chunk(pdta, "phdr")?;
    let pbag = riff::require_chunk(pdta, "pbag")?;
    let pmod = riff::require_chunk(pdta, "pmod")?;
    let pgen = riff::require_chunk(pdta, "pgen")?;
    let inst = riff::require_chunk(pdta, "inst")?;
    let ibag = riff::require_chunk(pdta, "ibag")?;
    let imod = riff::require_chunk(pdta, "imod")?;
    let igen = riff::require_chunk(pdta, "igen")?;
    let shdr = riff::require_chunk(pdta, "shdr")?;

    let header = info::read_header(bytes, info.children())?;

    let preset_headers = records::read_preset_headers(bytes, phdr)?;
    let preset_bags = records::read_bags(bytes, "pbag", pbag)?;
    let preset_modulators = records::read_modulators(bytes, "pmod", pmod)?;
    let preset_generators = records::read_generators(bytes, "pgen", pgen)?;
    let instrument_headers = records::read_instrument_headers(bytes, inst)?;
    let instrument_bags = records::read_bags(bytes, "ibag", ibag)?;
    let instrument_modulators = records::read_modulators(bytes, "imod", imod)?;
    let instrument_generators = records::read_generators(bytes, "igen", igen)?;
    let sample_headers = records::read_sample_headers(bytes, shdr)?;

    let samples = samples::build_samples(sample_headers, &buffer, smpl, sink)?;

    let instruments = zones::resolve_instruments(
        &instrument_headers,
        &zones::ZoneTables {
            bag_chunk: "ibag",
            generator_chunk: "igen",
            modulator_chunk: "imod",
            bags: &instrument_bags,
            generators: &instrument_generators,
            modulators: &instrument_modulators,
        },
        &samples,
        sink,
    )?;

    let presets = zones::resolve_presets(
        &preset_headers,
        &zones::ZoneTables {
            bag_chunk: "pbag",
            generator_chunk: "pgen",
            modulator_chunk: "pmod",
            bags: &preset_bags,
            generators: &preset_generators,
            modulators: &preset_modulators,
        },
        &instruments,
        sink,
    )?;

    log::debug!(
        "Decoded '{}': {} presets, {} instruments, {} samples",
        header.bank_name,
        presets.len(),
        instruments.len(),
        samples.len()
    );

    Ok(SoundFont {
        header,
        presets,
        instruments,
        samples,
        buffer,
    })
}
