//! Rhai API for SoundFont banks.
//!
//! This module provides the types that can be registered with a Rhai engine
//! to inspect decoded banks from scripts. Loading is left to the embedding
//! code, which decides where files come from and where warnings go.

use std::sync::Arc;

use rhai::{Array, Dynamic, Engine};

use crate::types::SoundFont;

/// A shared handle to a decoded bank for use in scripts.
///
/// Cloning the handle is cheap; scripts never see a copy of the sample data.
#[derive(Clone, Debug)]
pub struct SoundFontHandle {
    font: Arc<SoundFont>,
}

impl SoundFontHandle {
    pub fn new(font: Arc<SoundFont>) -> Self {
        Self { font }
    }

    /// The bank behind the handle.
    pub fn font(&self) -> &Arc<SoundFont> {
        &self.font
    }

    pub fn get_bank_name(&mut self) -> String {
        self.font.header.bank_name.clone()
    }

    /// File format version as `major.minor`.
    pub fn get_version(&mut self) -> String {
        self.font.header.version.to_string()
    }

    pub fn get_num_presets(&mut self) -> i64 {
        self.font.presets.len() as i64
    }

    pub fn get_num_instruments(&mut self) -> i64 {
        self.font.instruments.len() as i64
    }

    pub fn get_num_samples(&mut self) -> i64 {
        self.font.samples.len() as i64
    }

    /// Preset names in file order.
    pub fn preset_names(&mut self) -> Array {
        self.font
            .presets
            .iter()
            .map(|preset| Dynamic::from(preset.name.clone()))
            .collect()
    }

    /// Get a human-readable info string.
    pub fn info(&mut self) -> String {
        self.font.info()
    }
}

impl From<SoundFont> for SoundFontHandle {
    fn from(font: SoundFont) -> Self {
        Self::new(Arc::new(font))
    }
}

/// Register the SoundFont types with a Rhai engine.
///
/// This registers `SoundFontHandle` as `SoundFont` with its getters and
/// methods. A `load_soundfont` function must be registered separately by the
/// embedding code.
pub fn register_soundfont_types(engine: &mut Engine) {
    engine.register_type_with_name::<SoundFontHandle>("SoundFont");

    engine.register_get("bank_name", SoundFontHandle::get_bank_name);
    engine.register_get("version", SoundFontHandle::get_version);
    engine.register_get("num_presets", SoundFontHandle::get_num_presets);
    engine.register_get("num_instruments", SoundFontHandle::get_num_instruments);
    engine.register_get("num_samples", SoundFontHandle::get_num_samples);

    engine.register_fn("preset_names", SoundFontHandle::preset_names);
    engine.register_fn("info", SoundFontHandle::info);
}
