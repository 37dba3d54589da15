//! Decoded SoundFont bank types.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::parser::generators::{Generator, MidiRange};
use crate::parser::modulators::Modulator;
use crate::parser::records::{SampleHeader, SampleLinkType};

/// The three kinds of entity in a bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Preset,
    Instrument,
    Sample,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Preset => "preset",
            EntityKind::Instrument => "instrument",
            EntityKind::Sample => "sample",
        })
    }
}

/// `{major, minor}` pair used by `ifil` and `iver`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionTag {
    pub major: u16,
    pub minor: u16,
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Bank metadata from the `INFO` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundFontHeader {
    /// `ifil`
    pub version: VersionTag,
    /// `INAM`
    pub bank_name: String,
    /// `isng`
    pub sound_engine: String,
    /// `irom`
    pub wavetable_rom: Option<String>,
    /// `iver`
    pub wavetable_revision: Option<VersionTag>,
    /// `ICRD`
    pub creation_date: Option<String>,
    /// `IENG`
    pub engineers: Option<String>,
    /// `IPRD`
    pub product: Option<String>,
    /// `ICOP`
    pub copyright: Option<String>,
    /// `ICMT`
    pub comments: Option<String>,
    /// `ISFT`
    pub tools: Option<String>,
}

/// Zero-copy window onto a sample's 16-bit PCM in the bank buffer.
#[derive(Clone)]
pub struct SampleData {
    buffer: Arc<[u8]>,
    range: Range<usize>,
}

impl SampleData {
    pub(crate) fn new(buffer: Arc<[u8]>, range: Range<usize>) -> Self {
        Self { buffer, range }
    }

    /// Raw little-endian bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[self.range.clone()]
    }

    /// Sample points, decoded on the fly.
    pub fn frames(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes()
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.range.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Absolute byte range inside the bank buffer.
    pub fn byte_range(&self) -> Range<usize> {
        self.range.clone()
    }
}

impl fmt::Debug for SampleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleData")
            .field("range", &self.range)
            .field("frames", &self.len())
            .finish()
    }
}

/// A sample header bound to its PCM data.
#[derive(Clone, Debug)]
pub struct Sample {
    pub header: SampleHeader,
    pub(crate) data: SampleData,
    pub(crate) linked: Option<usize>,
}

impl Sample {
    pub fn index(&self) -> usize {
        self.header.index
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn original_pitch(&self) -> u8 {
        self.header.original_pitch
    }

    pub fn pitch_correction(&self) -> i8 {
        self.header.pitch_correction
    }

    pub fn link_type(&self) -> SampleLinkType {
        self.header.link_type
    }

    /// Loop points relative to this sample's first point.
    pub fn loop_range(&self) -> (u32, u32) {
        (
            self.header.loop_start.saturating_sub(self.header.start),
            self.header.loop_end.saturating_sub(self.header.start),
        )
    }

    /// Index of the other half of a resolved stereo pair.
    pub fn linked_index(&self) -> Option<usize> {
        self.linked
    }
}

/// Generators and modulators of one zone, with the ranges pulled out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    /// Index of the zone's bag record.
    pub bag_index: usize,
    pub key_range: Option<MidiRange>,
    pub velocity_range: Option<MidiRange>,
    pub generators: Vec<Generator>,
    pub modulators: Vec<Modulator>,
}

impl Zone {
    /// True when both ranges contain the request; an absent range is full.
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.key_range.unwrap_or(MidiRange::FULL).contains(key)
            && self.velocity_range.unwrap_or(MidiRange::FULL).contains(velocity)
    }
}

/// Instrument zone bound to a sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentZone {
    /// Index into [`SoundFont::samples`].
    pub sample: usize,
    /// `pan` generator, signed view.
    pub pan: Option<i16>,
    pub zone: Zone,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instrument {
    pub index: usize,
    pub name: String,
    /// First zone when it selects no sample. Exposed, never applied.
    pub global_zone: Option<Zone>,
    pub zones: Vec<InstrumentZone>,
}

/// Preset zone bound to an instrument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetZone {
    /// Index into [`SoundFont::instruments`].
    pub instrument: usize,
    pub zone: Zone,
}

impl PresetZone {
    pub fn key_range(&self) -> Option<MidiRange> {
        self.zone.key_range
    }

    pub fn velocity_range(&self) -> Option<MidiRange> {
        self.zone.velocity_range
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub index: usize,
    pub name: String,
    /// MIDI program number.
    pub preset: u16,
    pub bank: u16,
    pub library: u32,
    pub genre: u32,
    pub morphology: u32,
    /// First zone when it selects no instrument. Exposed, never applied.
    pub global_zone: Option<Zone>,
    pub zones: Vec<PresetZone>,
}

/// A fully decoded, immutable SoundFont bank.
#[derive(Clone, Debug)]
pub struct SoundFont {
    pub header: SoundFontHeader,
    pub presets: Vec<Preset>,
    pub instruments: Vec<Instrument>,
    pub samples: Vec<Sample>,
    pub(crate) buffer: Arc<[u8]>,
}

impl SoundFont {
    pub fn preset(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn instrument(&self, index: usize) -> Option<&Instrument> {
        self.instruments.get(index)
    }

    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Find a preset by MIDI bank and program number.
    pub fn find_preset(&self, bank: u16, program: u16) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|preset| preset.bank == bank && preset.preset == program)
    }

    /// The other half of `sample`'s stereo pair, if it was resolved.
    pub fn linked_sample(&self, sample: &Sample) -> Option<&Sample> {
        sample.linked.and_then(|index| self.samples.get(index))
    }

    pub fn sample_headers(&self) -> impl Iterator<Item = &SampleHeader> + '_ {
        self.samples.iter().map(|sample| &sample.header)
    }

    /// The buffer the bank was decoded from.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    /// Get a human-readable info string.
    pub fn info(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SoundFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = &self.header;
        let mut optional = Vec::new();

        if let Some(copyright) = &header.copyright {
            optional.push(format!("Copyright © {}", copyright));
        }
        if let Some(date) = &header.creation_date {
            optional.push(format!("Created {}", date));
        }
        if let Some(engineers) = &header.engineers {
            optional.push(format!("Engineers: {}", engineers));
        }
        if let Some(product) = &header.product {
            optional.push(format!("Product: {}", product));
        }
        if let Some(rom) = &header.wavetable_rom {
            match header.wavetable_revision {
                Some(revision) => optional.push(format!("Wavetable ROM: {} v{}", rom, revision)),
                None => optional.push(format!("Wavetable ROM: {}", rom)),
            }
        }
        if let Some(tools) = &header.tools {
            optional.push(format!("Tools used: {}", tools));
        }
        if let Some(comments) = &header.comments {
            optional.push(comments.clone());
        }

        writeln!(f, "SoundFont bank:")?;
        writeln!(f, "  Bank name: {}", header.bank_name)?;
        writeln!(f, "  Version {}", header.version)?;
        writeln!(f, "  Optimized for {}", header.sound_engine)?;
        for line in optional {
            writeln!(f, "  {}", line)?;
        }
        writeln!(f, "  Contains:")?;
        writeln!(f, "    {} presets", self.presets.len())?;
        writeln!(f, "    {} instruments", self.instruments.len())?;
        writeln!(f, "    {} samples", self.samples.len())
    }
}
