use thiserror::Error;

use crate::parser::generators::GeneratorType;
use crate::types::EntityKind;

/// Errors that abort decoding of a SoundFont bank
///
/// Every variant is fatal: the decoder never returns a partially built bank.
/// Recoverable oddities (unused samples, one-sided stereo links, ...) are not
/// errors and are reported through a [`DiagnosticSink`](crate::DiagnosticSink)
/// instead.
///
/// The errors fall into a few categories:
///
/// - Container errors: the RIFF structure itself is broken or is not an `sfbk`
/// - Missing data: a mandatory chunk, list or the version tag is absent
/// - Table errors: a record table is the wrong size or holds an unknown code
/// - Graph errors: zone or link indices that do not describe a valid hierarchy
#[derive(Error, Debug)]
pub enum Error {
    /// The RIFF container could not be tokenized
    ///
    /// Raised when a chunk header is truncated or a chunk claims more bytes
    /// than its parent holds.
    #[error("Malformed RIFF container: {0}")]
    Riff(String),

    /// The outer RIFF chunk does not carry the `sfbk` form type
    #[error("Not a SoundFont 2 bank: expected RIFF form 'sfbk', found '{0}'")]
    NotASoundFont(String),

    /// A mandatory data chunk is absent
    ///
    /// All nine `pdta` tables and the `smpl` pool are mandatory.
    #[error("File invalid: mandatory `{0}` chunk missing")]
    MissingChunk(&'static str),

    /// A mandatory `LIST` chunk (`INFO`, `sdta` or `pdta`) is absent
    #[error("File invalid: mandatory `LIST/{0}` chunk missing")]
    MissingList(&'static str),

    /// The `INFO` list has no usable `ifil` version tag
    #[error("SoundFont file does not contain any file version information")]
    MissingVersion,

    /// A record table's byte length is not a whole number of records
    #[error("Chunk `{chunk}` is {len} bytes, which is not a multiple of its {stride}-byte record size")]
    TableSize {
        /// Chunk id of the table
        chunk: &'static str,
        /// Byte length of the chunk payload
        len: usize,
        /// Width of one record
        stride: usize,
    },

    /// A record table holds no records, so it lacks its terminal record
    #[error("Chunk `{0}` has no terminal record")]
    MissingTerminalRecord(&'static str),

    /// A generator record carries an operator code outside the SF2 set
    #[error("No generator type found for value {code} (record {index} of `{chunk}`)")]
    UnknownGenerator {
        /// Chunk id of the generator table (`pgen` or `igen`)
        chunk: &'static str,
        /// Position of the record in its table
        index: usize,
        /// The raw operator code
        code: u16,
    },

    /// A sample header carries a link type outside the SF2 set
    #[error("Sample #{index} ('{name}') has unrecognised link type {code}")]
    UnknownSampleLinkType {
        /// Position of the sample header
        index: usize,
        /// Sample name
        name: String,
        /// The raw link type code
        code: u16,
    },

    /// A start index is greater than the end index that bounds it
    #[error("Record {index} of `{chunk}` spans {start}..{end}, which runs backwards")]
    NegativeRange {
        /// Chunk id of the table holding the offending start index
        chunk: &'static str,
        /// Position of the record holding the start index
        index: usize,
        /// Start index
        start: usize,
        /// End index supplied by the following record
        end: usize,
    },

    /// An index points past the end of the table it refers into
    #[error("Index {index} points past the end of `{chunk}` ({len} records)")]
    IndexOutOfRange {
        /// Chunk id of the table being indexed
        chunk: &'static str,
        /// The offending index
        index: usize,
        /// Number of records in the table
        len: usize,
    },

    /// A zone holds more than one identifying generator
    ///
    /// The identifying generator (`instrument` in preset zones, `sampleID` in
    /// instrument zones) is the zone's only selector of what it binds to, so
    /// two of them are contradictory.
    #[error("Each zone should have only one `{generator}` generator; zone {zone} of {kind} '{name}' has multiple")]
    DuplicateGenerator {
        /// Kind of entity owning the zone
        kind: EntityKind,
        /// Name of the entity owning the zone
        name: String,
        /// Bag index of the zone
        zone: usize,
        /// The repeated generator
        generator: GeneratorType,
    },

    /// An identifying generator selects an entity that does not exist
    #[error("{kind} '{name}' refers to non-existent {target} index {index}")]
    MissingReference {
        /// Kind of the referring entity
        kind: EntityKind,
        /// Name of the referring entity
        name: String,
        /// Kind of the referenced entity
        target: EntityKind,
        /// The out-of-range index
        index: usize,
    },

    /// A sample's data window is not inside the `smpl` chunk
    #[error("Sample #{index} ('{name}') covers sample points {start}..{end}, outside the {len}-point `smpl` pool")]
    SampleOutOfBounds {
        /// Position of the sample header
        index: usize,
        /// Sample name
        name: String,
        /// Start offset in sample points
        start: u32,
        /// End offset in sample points
        end: u32,
        /// Size of the PCM pool in sample points
        len: usize,
    },
}
