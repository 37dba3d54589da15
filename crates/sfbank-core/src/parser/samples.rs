//! Sample graph building: data windows and stereo links.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use crate::diagnostics::{DiagnosticSink, Warning};
use crate::parser::error::Error;
use crate::parser::records::SampleHeader;
use crate::types::{Sample, SampleData};

type Result<T> = std::result::Result<T, Error>;

/// Byte window of `header` inside the `smpl` payload at `pool`.
fn data_window(header: &SampleHeader, pool: &Range<usize>) -> Result<Range<usize>> {
    if header.link_type.is_rom() {
        // ROM samples index into wavetable ROM, not the pool.
        return Ok(pool.start..pool.start);
    }

    let points = pool.len() / 2;
    let out_of_bounds = || Error::SampleOutOfBounds {
        index: header.index,
        name: header.name.clone(),
        start: header.start,
        end: header.end,
        len: points,
    };

    let (start, end) = (header.start as usize, header.end as usize);
    if start > end || end > points {
        return Err(out_of_bounds());
    }
    let start = start.checked_mul(2).ok_or_else(out_of_bounds)? + pool.start;
    let end = end.checked_mul(2).ok_or_else(out_of_bounds)? + pool.start;
    Ok(start..end)
}

/// Pair up left/right samples that point at each other.
///
/// Links are resolved in ascending index order once every header is known. A
/// link is kept only when its partner is a left/right sample pointing back at
/// it, so every resolved link is mutual and no resolved link is replaced.
fn resolve_links(samples: &mut [Sample], sink: &mut dyn DiagnosticSink) {
    let pending: BTreeMap<usize, usize> = samples
        .iter()
        .filter(|sample| sample.link_type().side().is_some())
        .map(|sample| (sample.index(), sample.header.sample_link as usize))
        .collect();

    for (&index, &partner) in &pending {
        if partner >= samples.len() || partner == index {
            sink.warn(Warning::DanglingLink {
                sample: index,
                name: samples[index].name().to_string(),
                partner,
            });
            continue;
        }
        if pending.get(&partner) != Some(&index) {
            sink.warn(Warning::AsymmetricLink {
                sample: index,
                name: samples[index].name().to_string(),
                partner,
            });
            continue;
        }
        samples[index].linked = Some(partner);
        samples[partner].linked = Some(index);
    }
}

/// Bind every sample header to its PCM window, then resolve stereo links.
pub fn build_samples(
    headers: Vec<SampleHeader>,
    buffer: &Arc<[u8]>,
    pool: Range<usize>,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Sample>> {
    let mut samples = headers
        .into_iter()
        .map(|header| {
            let window = data_window(&header, &pool)?;
            Ok(Sample {
                header,
                data: SampleData::new(Arc::clone(buffer), window),
                linked: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    resolve_links(&mut samples, sink);

    log::debug!(
        "Built {} samples over a {}-point pool",
        samples.len(),
        pool.len() / 2
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::records::SampleLinkType;

    fn header(
        index: usize,
        start: u32,
        end: u32,
        link_type: SampleLinkType,
        link: u16,
    ) -> SampleHeader {
        SampleHeader {
            index,
            name: format!("S{}", index),
            start,
            end,
            loop_start: start + 1,
            loop_end: end.saturating_sub(1),
            sample_rate: 44100,
            original_pitch: 60,
            pitch_correction: 0,
            sample_link: link,
            link_type,
        }
    }

    fn pool_buffer() -> (Arc<[u8]>, Range<usize>) {
        // Eight bytes of unrelated data, then eight sample points.
        let mut bytes = vec![0xAAu8; 8];
        for point in 0i16..8 {
            bytes.extend((point * 100).to_le_bytes());
        }
        (bytes.into(), 8..24)
    }

    #[test]
    fn test_windows_are_zero_copy_slices_of_the_pool() {
        let (buffer, pool) = pool_buffer();
        let samples = build_samples(
            vec![header(0, 2, 5, SampleLinkType::Mono, 0)],
            &buffer,
            pool,
            &mut Diagnostics::new(),
        )
        .unwrap();

        let data = samples[0].data();
        assert_eq!(data.byte_range(), 12..18);
        assert_eq!(data.len(), 3);
        assert_eq!(data.frames().collect::<Vec<_>>(), vec![200, 300, 400]);
        assert_eq!(samples[0].loop_range(), (1, 2));
        assert_eq!(data.bytes().as_ptr(), buffer[12..].as_ptr());
    }

    #[test]
    fn test_window_past_the_pool_is_fatal() {
        let (buffer, pool) = pool_buffer();
        let result = build_samples(
            vec![header(0, 4, 9, SampleLinkType::Mono, 0)],
            &buffer,
            pool,
            &mut Diagnostics::new(),
        );
        assert!(matches!(
            result,
            Err(Error::SampleOutOfBounds {
                start: 4,
                end: 9,
                len: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_rom_samples_have_no_data() {
        let (buffer, pool) = pool_buffer();
        let samples = build_samples(
            vec![header(0, 1000, 2000, SampleLinkType::RomMono, 0)],
            &buffer,
            pool,
            &mut Diagnostics::new(),
        )
        .unwrap();
        assert!(samples[0].data().is_empty());
    }

    #[test]
    fn test_mutual_stereo_pair_is_linked_both_ways() {
        let (buffer, pool) = pool_buffer();
        let headers = vec![
            header(0, 0, 2, SampleLinkType::Mono, 0),
            header(1, 2, 4, SampleLinkType::Left, 2),
            header(2, 4, 6, SampleLinkType::Right, 1),
        ];
        let mut diagnostics = Diagnostics::new();
        let samples = build_samples(headers, &buffer, pool, &mut diagnostics).unwrap();

        assert_eq!(samples[1].linked_index(), Some(2));
        assert_eq!(samples[2].linked_index(), Some(1));
        assert_eq!(samples[0].linked_index(), None);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_link_to_unlinked_partner_warns() {
        let (buffer, pool) = pool_buffer();
        let headers = vec![
            header(0, 0, 2, SampleLinkType::Left, 1),
            header(1, 2, 4, SampleLinkType::Mono, 0),
        ];
        let mut diagnostics = Diagnostics::new();
        let samples = build_samples(headers, &buffer, pool, &mut diagnostics).unwrap();

        assert_eq!(samples[0].linked_index(), None);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::AsymmetricLink {
                sample: 0,
                name: "S0".to_string(),
                partner: 1,
            }]
        );
    }

    #[test]
    fn test_link_past_the_table_warns() {
        let (buffer, pool) = pool_buffer();
        let headers = vec![header(0, 0, 2, SampleLinkType::Right, 40)];
        let mut diagnostics = Diagnostics::new();
        build_samples(headers, &buffer, pool, &mut diagnostics).unwrap();
        assert!(matches!(
            diagnostics.warnings(),
            [Warning::DanglingLink { partner: 40, .. }]
        ));
    }

    #[test]
    fn test_third_sample_cannot_steal_a_linked_partner() {
        let (buffer, pool) = pool_buffer();
        let headers = vec![
            header(0, 0, 2, SampleLinkType::Left, 2),
            header(1, 2, 4, SampleLinkType::Left, 2),
            header(2, 4, 6, SampleLinkType::Right, 0),
        ];
        let mut diagnostics = Diagnostics::new();
        let samples = build_samples(headers, &buffer, pool, &mut diagnostics).unwrap();

        assert_eq!(samples[0].linked_index(), Some(2));
        assert_eq!(samples[2].linked_index(), Some(0));
        assert_eq!(samples[1].linked_index(), None);
        for sample in &samples {
            if let Some(partner) = sample.linked_index() {
                assert_eq!(samples[partner].linked_index(), Some(sample.index()));
            }
        }
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::AsymmetricLink {
                sample: 1,
                name: "S1".to_string(),
                partner: 2,
            }]
        );
    }
}
