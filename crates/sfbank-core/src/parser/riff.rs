//! RIFF chunk tokenizer and chunk locator.
//!
//! Turns the raw container into a tree of [`Chunk`]s whose data ranges are
//! absolute offsets into the original buffer, then lets the decoder look up
//! the lists and tables it needs by name.

use std::fmt;
use std::ops::Range;

use nom::bytes::complete::take;
use nom::number::complete::le_u32;
use nom::IResult;

use crate::parser::error::Error;

type Result<T> = std::result::Result<T, Error>;

/// Four-character chunk identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Compare against an id written as a string, e.g. `"pdta"`.
    pub fn is(&self, id: &str) -> bool {
        self.0 == id.as_bytes()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({})", self)
    }
}

/// One node of the chunk tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chunk {
    /// A leaf chunk; `data` is the payload's absolute byte range.
    Data { id: FourCc, data: Range<usize> },
    /// A `RIFF` or `LIST` chunk with its form type and children.
    List {
        id: FourCc,
        form: FourCc,
        children: Vec<Chunk>,
    },
}

impl Chunk {
    pub fn id(&self) -> FourCc {
        match self {
            Chunk::Data { id, .. } | Chunk::List { id, .. } => *id,
        }
    }

    pub fn children(&self) -> &[Chunk] {
        match self {
            Chunk::Data { .. } => &[],
            Chunk::List { children, .. } => children,
        }
    }
}

fn chunk_header(input: &[u8]) -> IResult<&[u8], (FourCc, u32)> {
    let (input, id) = take(4usize)(input)?;
    let (input, size) = le_u32(input)?;
    let mut fourcc = [0u8; 4];
    fourcc.copy_from_slice(id);
    Ok((input, (FourCc(fourcc), size)))
}

fn riff_err(msg: String) -> Error {
    Error::Riff(msg)
}

/// Tokenize a full `RIFF/sfbk` container.
pub fn parse_riff(bytes: &[u8]) -> Result<Chunk> {
    let (_, (id, size)) =
        chunk_header(bytes).map_err(|_| riff_err("file is shorter than a RIFF header".into()))?;
    if !id.is("RIFF") {
        return Err(riff_err(format!("expected 'RIFF' chunk id, found '{}'", id)));
    }
    let end = 8usize
        .checked_add(size as usize)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            riff_err(format!(
                "RIFF chunk declares {} bytes but the file holds {}",
                size,
                bytes.len().saturating_sub(8)
            ))
        })?;
    let (form, children) = parse_list(bytes, id, 8, end)?;
    if !form.is("sfbk") {
        return Err(Error::NotASoundFont(form.to_string()));
    }
    Ok(Chunk::List { id, form, children })
}

/// Parse the body of a list chunk spanning `start..end` (after its header).
fn parse_list(bytes: &[u8], id: FourCc, start: usize, end: usize) -> Result<(FourCc, Vec<Chunk>)> {
    let body = &bytes[start..end];
    let (_, form) = take::<_, _, nom::error::Error<&[u8]>>(4usize)(body)
        .map_err(|_| riff_err(format!("'{}' chunk at offset {} has no form type", id, start)))?;
    let mut fourcc = [0u8; 4];
    fourcc.copy_from_slice(form);
    let form = FourCc(fourcc);

    let mut children = Vec::new();
    let mut offset = start + 4;
    while offset < end {
        let (_, (child_id, size)) = chunk_header(&bytes[offset..end]).map_err(|_| {
            riff_err(format!("truncated chunk header at offset {} inside '{}'", offset, form))
        })?;
        let data_start = offset + 8;
        let data_end = data_start
            .checked_add(size as usize)
            .filter(|&data_end| data_end <= end)
            .ok_or_else(|| {
                riff_err(format!(
                    "chunk '{}' at offset {} declares {} bytes, overrunning '{}'",
                    child_id, offset, size, form
                ))
            })?;

        if child_id.is("LIST") {
            let (form, grandchildren) = parse_list(bytes, child_id, data_start, data_end)?;
            children.push(Chunk::List {
                id: child_id,
                form,
                children: grandchildren,
            });
        } else {
            children.push(Chunk::Data {
                id: child_id,
                data: data_start..data_end,
            });
        }

        // Chunks are word aligned; an odd size is followed by one pad byte.
        offset = data_end + (size as usize & 1);
    }

    log::trace!("LIST/{} holds {} chunks", form, children.len());

    Ok((form, children))
}

/// Depth-first search for a `LIST` chunk with the given form type.
pub fn find_list<'a>(chunks: &'a [Chunk], form: &str) -> Option<&'a Chunk> {
    for chunk in chunks {
        if let Chunk::List {
            form: list_form,
            children,
            ..
        } = chunk
        {
            if list_form.is(form) {
                return Some(chunk);
            }
            if let Some(found) = find_list(children, form) {
                return Some(found);
            }
        }
    }
    None
}

/// Find a direct child data chunk by id, returning its payload range.
pub fn find_chunk(chunks: &[Chunk], id: &str) -> Option<Range<usize>> {
    chunks.iter().find_map(|chunk| match chunk {
        Chunk::Data { id: chunk_id, data } if chunk_id.is(id) => Some(data.clone()),
        _ => None,
    })
}

pub fn require_list<'a>(chunks: &'a [Chunk], form: &'static str) -> Result<&'a Chunk> {
    find_list(chunks, form).ok_or(Error::MissingList(form))
}

pub fn require_chunk(chunks: &[Chunk], id: &'static str) -> Result<Range<usize>> {
    find_chunk(chunks, id).ok_or(Error::MissingChunk(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn list(id: &[u8; 4], form: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = form.to_vec();
        for child in children {
            payload.extend_from_slice(child);
        }
        chunk(id, &payload)
    }

    #[test]
    fn test_parse_nested_lists_with_absolute_ranges() {
        let bytes = list(
            b"RIFF",
            b"sfbk",
            &[
                list(b"LIST", b"INFO", &[chunk(b"INAM", b"abc")]),
                list(b"LIST", b"sdta", &[chunk(b"smpl", &[1, 2, 3, 4])]),
            ],
        );
        let root = parse_riff(&bytes).expect("valid container");

        let info = find_list(root.children(), "INFO").unwrap();
        let inam = find_chunk(info.children(), "INAM").unwrap();
        assert_eq!(&bytes[inam], b"abc");

        // The odd-sized INAM is padded, so smpl must still land on its data.
        let sdta = find_list(root.children(), "sdta").unwrap();
        let smpl = find_chunk(sdta.children(), "smpl").unwrap();
        assert_eq!(&bytes[smpl], &[1u8, 2, 3, 4]);
    }

    #[test]
    fn test_find_list_searches_nested_lists() {
        let bytes = list(
            b"RIFF",
            b"sfbk",
            &[list(
                b"LIST",
                b"sdta",
                &[list(b"LIST", b"pdta", &[chunk(b"phdr", &[])])],
            )],
        );
        let root = parse_riff(&bytes).unwrap();
        let pdta = find_list(root.children(), "pdta").expect("nested pdta");
        assert!(find_chunk(pdta.children(), "phdr").is_some());
    }

    #[test]
    fn test_wrong_form_is_rejected() {
        let bytes = list(b"RIFF", b"WAVE", &[]);
        match parse_riff(&bytes) {
            Err(Error::NotASoundFont(form)) => assert_eq!(form, "WAVE"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_overrunning_chunk_is_rejected() {
        let mut bytes = list(b"RIFF", b"sfbk", &[chunk(b"INAM", b"abcd")]);
        // Inflate INAM's declared size past the end of the RIFF body.
        bytes[16..20].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(parse_riff(&bytes), Err(Error::Riff(_))));
    }

    #[test]
    fn test_require_chunk_names_missing_id() {
        match require_chunk(&[], "inst") {
            Err(Error::MissingChunk(id)) => assert_eq!(id, "inst"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
