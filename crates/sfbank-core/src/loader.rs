//! SoundFont file loading.

use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::parser::decode;
use crate::types::SoundFont;
use anyhow::{Context, Result};
use std::path::Path;

/// Load and decode an SF2 file from disk.
///
/// The whole file is read into one buffer that the returned bank keeps alive;
/// sample data is never copied out of it. Decode warnings go to `sink`.
///
/// # Example
///
/// ```ignore
/// let mut diagnostics = Diagnostics::new();
/// let font = load_soundfont("banks/GeneralUser.sf2", &mut diagnostics)?;
/// for warning in diagnostics.warnings() {
///     eprintln!("{}", warning);
/// }
/// ```
pub fn load_soundfont<P: AsRef<Path>>(
    path: P,
    sink: &mut dyn DiagnosticSink,
) -> Result<SoundFont> {
    let path = path.as_ref();

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read SoundFont file: {}", path.display()))?;

    log::info!("Loading SoundFont from {} ({} bytes)", path.display(), bytes.len());

    let font = decode(bytes, sink)
        .with_context(|| format!("Failed to decode SoundFont file: {}", path.display()))?;

    log::info!(
        "Loaded '{}': {} presets, {} instruments, {} samples",
        font.header.bank_name,
        font.presets.len(),
        font.instruments.len(),
        font.samples.len()
    );

    Ok(font)
}

/// Like [`load_soundfont`], with warnings sent to the log.
pub fn load_soundfont_logged<P: AsRef<Path>>(path: P) -> Result<SoundFont> {
    load_soundfont(path, &mut LogSink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, Warning};
    use crate::parser::Error;
    use crate::testing::{generator, link, SoundFontBuilder};
    use std::io::Write;

    fn write_bank(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_load_from_disk() {
        let _ = env_logger::builder().is_test(true).try_init();

        let bytes = SoundFontBuilder::new()
            .preset("Bells", 14, 0)
            .preset_zone(&[(generator::INSTRUMENT, 0)])
            .instrument("Bells")
            .instrument_zone(&[(generator::SAMPLE_ID, 0)])
            .sample("Bell", &[3, -3], link::MONO, 0)
            .sample("Spare", &[1], link::MONO, 0)
            .build();
        let file = write_bank(&bytes);

        let mut diagnostics = Diagnostics::new();
        let font = load_soundfont(file.path(), &mut diagnostics).unwrap();
        assert_eq!(font.presets[0].name, "Bells");
        assert_eq!(font.samples.len(), 2);
        assert!(matches!(
            diagnostics.warnings(),
            [Warning::UnusedSample { index: 1, .. }]
        ));
    }

    #[test]
    fn test_decode_errors_keep_their_type() {
        let bytes = SoundFontBuilder::new().omit_chunk("shdr").build();
        let file = write_bank(&bytes);

        let err = load_soundfont(file.path(), &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingChunk("shdr"))
        ));
        assert!(format!("{:#}", err).contains("Failed to decode SoundFont file"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_soundfont_logged(dir.path().join("absent.sf2")).unwrap_err();
        assert!(err.to_string().contains("Failed to read SoundFont file"));
    }
}
