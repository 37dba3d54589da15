//! SoundFont 2 bank decoding.
//!
//! This crate decodes SF2 files into an immutable, fully linked bank:
//! - RIFF container walking and `INFO` metadata
//! - Record tables for presets, instruments, zones, generators, modulators and samples
//! - Zone resolution, binding preset zones to instruments and instrument zones to samples
//! - Stereo sample pairing
//!
//! # Architecture
//!
//! Decoding is a pure function of a byte buffer. It does no I/O and never
//! prints: non-fatal findings are handed to a [`DiagnosticSink`], fatal ones
//! come back as a [`DecodeError`]. Sample data is not copied; every sample is
//! a window into the buffer, which the bank keeps alive.
//!
//! On top of the decoder sit:
//! - A file loader that attaches path context to errors
//! - Zone matching for key/velocity lookups
//! - Rhai bindings for inspecting banks from scripts
//!
//! # Example
//!
//! ```ignore
//! use sfbank_core::{find_matching_zones, load_soundfont, Diagnostics};
//!
//! let mut diagnostics = Diagnostics::new();
//! let font = load_soundfont("path/to/bank.sf2", &mut diagnostics)?;
//!
//! // Which samples does program 0 play for middle C at velocity 100?
//! let piano = font.find_preset(0, 0).expect("no piano");
//! for hit in find_matching_zones(&font, piano, 60, 100) {
//!     println!("{} at {} Hz", hit.sample.name(), hit.sample.sample_rate());
//! }
//! ```

pub mod api;
pub mod diagnostics;
pub mod loader;
pub mod parser;
pub mod types;
pub mod zone_matcher;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::*;
pub use diagnostics::*;
pub use loader::*;
pub use types::*;
pub use zone_matcher::*;

// Re-export decoder entry points for convenience
pub use parser::decode;
pub use parser::error::Error as DecodeError;
pub use parser::generators::{Generator, GeneratorType, GeneratorValue, MidiRange};
pub use parser::modulators::Modulator;
pub use parser::records::{SampleHeader, SampleLinkType};
