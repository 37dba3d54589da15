//! Fixed-stride record tables from the `pdta` list.
//!
//! Every table ends in a terminal record whose only job is to bound the extent
//! of the record before it. Tables are kept whole in a [`Table`] so that the
//! zone resolver can reach the terminal record by index, while callers that
//! want real entities only see [`Table::entities`].

use std::ops::Range;

use nom::bytes::complete::take;
use nom::number::complete::{le_i16, le_i8, le_u16, le_u32, le_u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::parser::error::Error;
use crate::parser::generators::{Generator, GeneratorType, GeneratorValue};
use crate::parser::modulators::{
    Modulator, ModulatorDestination, ModulatorSource, Transform,
};

type Result<T> = std::result::Result<T, Error>;

pub const PRESET_HEADER_SIZE: usize = 38;
pub const INSTRUMENT_HEADER_SIZE: usize = 22;
pub const BAG_SIZE: usize = 4;
pub const GENERATOR_SIZE: usize = 4;
pub const MODULATOR_SIZE: usize = 10;
pub const SAMPLE_HEADER_SIZE: usize = 46;

const NAME_SIZE: usize = 20;

/// A decoded record table, terminal record included.
#[derive(Clone, Debug)]
pub struct Table<T> {
    records: Vec<T>,
}

impl<T> Table<T> {
    /// Wrap decoded records; the last one is taken to be the terminal record.
    pub(crate) fn new(chunk: &'static str, records: Vec<T>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::MissingTerminalRecord(chunk));
        }
        Ok(Self { records })
    }

    /// Every record except the terminal one.
    pub fn entities(&self) -> &[T] {
        &self.records[..self.records.len() - 1]
    }

    pub fn terminal(&self) -> &T {
        &self.records[self.records.len() - 1]
    }

    /// All records, terminal included.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `phdr` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetHeader {
    pub index: usize,
    pub name: String,
    /// MIDI program number.
    pub preset: u16,
    pub bank: u16,
    /// First `pbag` record of this preset.
    pub bag_index: u16,
    pub library: u32,
    pub genre: u32,
    pub morphology: u32,
}

/// `inst` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentHeader {
    pub index: usize,
    pub name: String,
    /// First `ibag` record of this instrument.
    pub bag_index: u16,
}

/// `pbag`/`ibag` record: where a zone's generators and modulators start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bag {
    pub generator_index: u16,
    pub modulator_index: u16,
}

/// Left or right channel of a stereo pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StereoSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleLinkType {
    Mono,
    Right,
    Left,
    Linked,
    RomMono,
    RomRight,
    RomLeft,
    RomLinked,
}

impl SampleLinkType {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Mono),
            2 => Some(Self::Right),
            4 => Some(Self::Left),
            8 => Some(Self::Linked),
            0x8001 => Some(Self::RomMono),
            0x8002 => Some(Self::RomRight),
            0x8004 => Some(Self::RomLeft),
            0x8008 => Some(Self::RomLinked),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Right => 2,
            Self::Left => 4,
            Self::Linked => 8,
            Self::RomMono => 0x8001,
            Self::RomRight => 0x8002,
            Self::RomLeft => 0x8004,
            Self::RomLinked => 0x8008,
        }
    }

    /// Sample data lives in a wavetable ROM rather than in `smpl`.
    pub fn is_rom(self) -> bool {
        self.code() & 0x8000 != 0
    }

    pub fn side(self) -> Option<StereoSide> {
        match self {
            Self::Left | Self::RomLeft => Some(StereoSide::Left),
            Self::Right | Self::RomRight => Some(StereoSide::Right),
            _ => None,
        }
    }
}

/// `shdr` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleHeader {
    pub index: usize,
    pub name: String,
    /// First sample point in the PCM pool.
    pub start: u32,
    /// One past the last sample point.
    pub end: u32,
    /// Absolute sample point, not relative to `start`.
    pub loop_start: u32,
    /// Absolute sample point, not relative to `start`.
    pub loop_end: u32,
    pub sample_rate: u32,
    /// MIDI key of the recorded pitch.
    pub original_pitch: u8,
    /// Cents.
    pub pitch_correction: i8,
    pub sample_link: u16,
    pub link_type: SampleLinkType,
}

/// Read a NUL-padded name slot.
pub(crate) fn fixed_str(slot: &[u8]) -> String {
    let len = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..len]).into_owned()
}

/// Split a chunk into `stride`-sized records and decode each one.
fn read_records<'a, T>(
    bytes: &'a [u8],
    chunk: &'static str,
    range: Range<usize>,
    stride: usize,
    mut record: impl FnMut(usize, &'a [u8]) -> IResult<&'a [u8], T>,
) -> Result<Vec<T>> {
    let data = &bytes[range];
    if data.len() % stride != 0 {
        return Err(Error::TableSize {
            chunk,
            len: data.len(),
            stride,
        });
    }

    let records = data
        .chunks_exact(stride)
        .enumerate()
        .map(|(index, slot)| {
            record(index, slot).map(|(_, value)| value).map_err(|_| Error::TableSize {
                chunk,
                len: data.len(),
                stride,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("`{}`: {} records", chunk, records.len());

    Ok(records)
}

pub fn read_preset_headers(bytes: &[u8], range: Range<usize>) -> Result<Table<PresetHeader>> {
    let records = read_records(bytes, "phdr", range, PRESET_HEADER_SIZE, |index, input| {
        let (input, (name, preset, bank, bag_index, library, genre, morphology)) =
            tuple((take(NAME_SIZE), le_u16, le_u16, le_u16, le_u32, le_u32, le_u32))(input)?;
        Ok((
            input,
            PresetHeader {
                index,
                name: fixed_str(name),
                preset,
                bank,
                bag_index,
                library,
                genre,
                morphology,
            },
        ))
    })?;
    Table::new("phdr", records)
}

pub fn read_instrument_headers(
    bytes: &[u8],
    range: Range<usize>,
) -> Result<Table<InstrumentHeader>> {
    let records = read_records(bytes, "inst", range, INSTRUMENT_HEADER_SIZE, |index, input| {
        let (input, (name, bag_index)) = tuple((take(NAME_SIZE), le_u16))(input)?;
        Ok((
            input,
            InstrumentHeader {
                index,
                name: fixed_str(name),
                bag_index,
            },
        ))
    })?;
    Table::new("inst", records)
}

pub fn read_bags(bytes: &[u8], chunk: &'static str, range: Range<usize>) -> Result<Table<Bag>> {
    let records = read_records(bytes, chunk, range, BAG_SIZE, |_, input| {
        let (input, (generator_index, modulator_index)) = tuple((le_u16, le_u16))(input)?;
        Ok((
            input,
            Bag {
                generator_index,
                modulator_index,
            },
        ))
    })?;
    Table::new(chunk, records)
}

pub fn read_generators(
    bytes: &[u8],
    chunk: &'static str,
    range: Range<usize>,
) -> Result<Table<Generator>> {
    let raw = read_records(bytes, chunk, range, GENERATOR_SIZE, |_, input| {
        tuple((le_u16, le_u16))(input)
    })?;

    let records = raw
        .into_iter()
        .enumerate()
        .map(|(index, (code, value))| {
            let kind = GeneratorType::from_code(code)
                .ok_or(Error::UnknownGenerator { chunk, index, code })?;
            Ok(Generator {
                index,
                kind,
                value: GeneratorValue(value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Table::new(chunk, records)
}

pub fn read_modulators(
    bytes: &[u8],
    chunk: &'static str,
    range: Range<usize>,
) -> Result<Table<Modulator>> {
    let records = read_records(bytes, chunk, range, MODULATOR_SIZE, |index, input| {
        let (input, (source, destination, amount, amount_source, transform)) =
            tuple((le_u16, le_u16, le_i16, le_u16, le_u16))(input)?;
        Ok((
            input,
            Modulator {
                index,
                source: ModulatorSource::from_raw(source),
                destination: ModulatorDestination::from_raw(destination),
                amount,
                amount_source: ModulatorSource::from_raw(amount_source),
                transform: Transform::from_raw(transform),
            },
        ))
    })?;
    Table::new(chunk, records)
}

/// Decode `shdr`, dropping the terminal record.
///
/// The terminal record ("EOS") is all zeros in practice, including a link type
/// of 0, so link types are only validated on real samples.
pub fn read_sample_headers(bytes: &[u8], range: Range<usize>) -> Result<Vec<SampleHeader>> {
    type RawSampleHeader<'a> = (&'a [u8], u32, u32, u32, u32, u32, u8, i8, u16, u16);

    let raw: Vec<RawSampleHeader<'_>> =
        read_records(bytes, "shdr", range, SAMPLE_HEADER_SIZE, |_, input| {
            tuple((
                take(NAME_SIZE),
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u32,
                le_u8,
                le_i8,
                le_u16,
                le_u16,
            ))(input)
        })?;
    let raw = Table::new("shdr", raw)?;

    raw.entities()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let &(
                name,
                start,
                end,
                loop_start,
                loop_end,
                sample_rate,
                original_pitch,
                pitch_correction,
                sample_link,
                link_code,
            ) = record;
            let name = fixed_str(name);
            let link_type = SampleLinkType::from_code(link_code).ok_or_else(|| {
                Error::UnknownSampleLinkType {
                    index,
                    name: name.clone(),
                    code: link_code,
                }
            })?;
            Ok(SampleHeader {
                index,
                name,
                start,
                end,
                loop_start,
                loop_end,
                sample_rate,
                original_pitch,
                pitch_correction,
                sample_link,
                link_type,
            })
        })
        .collect()
}
