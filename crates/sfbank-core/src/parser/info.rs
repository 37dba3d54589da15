//! `INFO` list decoding.

use nom::number::complete::le_u16;
use nom::sequence::tuple;

use crate::parser::error::Error;
use crate::parser::records::fixed_str;
use crate::parser::riff::{find_chunk, Chunk};
use crate::types::{SoundFontHeader, VersionTag};

type Result<T> = std::result::Result<T, Error>;

fn read_version(bytes: &[u8], chunks: &[Chunk], id: &str) -> Option<VersionTag> {
    let range = find_chunk(chunks, id)?;
    let (_, (major, minor)) =
        tuple((le_u16::<_, nom::error::Error<&[u8]>>, le_u16))(&bytes[range]).ok()?;
    Some(VersionTag { major, minor })
}

fn read_text(bytes: &[u8], chunks: &[Chunk], id: &str) -> Option<String> {
    find_chunk(chunks, id).map(|range| fixed_str(&bytes[range]))
}

/// Like [`read_text`], but an empty string counts as absent.
fn read_optional_text(bytes: &[u8], chunks: &[Chunk], id: &str) -> Option<String> {
    read_text(bytes, chunks, id).filter(|text| !text.is_empty())
}

/// Decode bank metadata from the children of `LIST/INFO`.
///
/// `ifil` is the only field whose absence is fatal.
pub fn read_header(bytes: &[u8], info: &[Chunk]) -> Result<SoundFontHeader> {
    let version = read_version(bytes, info, "ifil").ok_or(Error::MissingVersion)?;

    let header = SoundFontHeader {
        version,
        bank_name: read_text(bytes, info, "INAM").unwrap_or_default(),
        sound_engine: read_text(bytes, info, "isng").unwrap_or_default(),
        wavetable_rom: read_optional_text(bytes, info, "irom"),
        wavetable_revision: read_version(bytes, info, "iver"),
        creation_date: read_optional_text(bytes, info, "ICRD"),
        engineers: read_optional_text(bytes, info, "IENG"),
        product: read_optional_text(bytes, info, "IPRD"),
        copyright: read_optional_text(bytes, info, "ICOP"),
        comments: read_optional_text(bytes, info, "ICMT"),
        tools: read_optional_text(bytes, info, "ISFT"),
    };

    log::debug!(
        "SoundFont v{} '{}' for {}",
        header.version,
        header.bank_name,
        header.sound_engine
    );

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_chunks(entries: &[(&str, &[u8])]) -> (Vec<u8>, Vec<Chunk>) {
        let mut bytes = Vec::new();
        let mut chunks = Vec::new();
        for (id, payload) in entries {
            let start = bytes.len();
            bytes.extend_from_slice(payload);
            let mut fourcc = [0u8; 4];
            fourcc.copy_from_slice(id.as_bytes());
            chunks.push(Chunk::Data {
                id: crate::parser::riff::FourCc(fourcc),
                data: start..bytes.len(),
            });
        }
        (bytes, chunks)
    }

    #[test]
    fn test_reads_mandatory_and_optional_fields() {
        let (bytes, chunks) = info_chunks(&[
            ("ifil", &[2, 0, 1, 0]),
            ("isng", b"EMU8000\0"),
            ("INAM", b"General MIDI\0\0"),
            ("irom", b"1MGM\0\0"),
            ("iver", &[1, 0, 3, 0]),
            ("ICOP", b"\0\0"),
        ]);
        let header = read_header(&bytes, &chunks).unwrap();
        assert_eq!(header.version, VersionTag { major: 2, minor: 1 });
        assert_eq!(header.bank_name, "General MIDI");
        assert_eq!(header.sound_engine, "EMU8000");
        assert_eq!(header.wavetable_rom.as_deref(), Some("1MGM"));
        assert_eq!(header.wavetable_revision, Some(VersionTag { major: 1, minor: 3 }));
        assert_eq!(header.copyright, None);
        assert_eq!(header.engineers, None);
    }

    #[test]
    fn test_missing_version_is_fatal() {
        let (bytes, chunks) = info_chunks(&[("INAM", b"Bank\0")]);
        assert!(matches!(
            read_header(&bytes, &chunks),
            Err(Error::MissingVersion)
        ));
    }

    #[test]
    fn test_short_version_is_fatal() {
        let (bytes, chunks) = info_chunks(&[("ifil", &[2, 0])]);
        assert!(matches!(
            read_header(&bytes, &chunks),
            Err(Error::MissingVersion)
        ));
    }
}
