//! Zone resolution.
//!
//! Turns the flat header/bag/generator/modulator tables into per-entity zone
//! lists. Nothing on disk says where an entity's zones end: the extent of
//! header `i` is bounded by header `i + 1`, and the extent of bag `z` by bag
//! `z + 1`. The terminal records exist only to close the last span.

use std::ops::Range;

use crate::diagnostics::{DiagnosticSink, Warning};
use crate::parser::error::Error;
use crate::parser::generators::{Generator, GeneratorType};
use crate::parser::modulators::Modulator;
use crate::parser::records::{Bag, InstrumentHeader, PresetHeader, Table};
use crate::types::{EntityKind, Instrument, InstrumentZone, Preset, PresetZone, Sample, Zone};

type Result<T> = std::result::Result<T, Error>;

/// One level of the hierarchy: a bag table and the tables it indexes into.
pub struct ZoneTables<'a> {
    pub bag_chunk: &'static str,
    pub generator_chunk: &'static str,
    pub modulator_chunk: &'static str,
    pub bags: &'a Table<Bag>,
    pub generators: &'a Table<Generator>,
    pub modulators: &'a Table<Modulator>,
}

/// Bags belonging to header `entity`, given every header's bag start
/// (terminal header included).
pub fn zone_span(
    header_chunk: &'static str,
    bag_chunk: &'static str,
    bag_starts: &[u16],
    entity: usize,
    bag_count: usize,
) -> Result<Range<usize>> {
    let start = bag_starts[entity] as usize;
    let end = bag_starts[entity + 1] as usize;
    if start > end {
        return Err(Error::NegativeRange {
            chunk: header_chunk,
            index: entity,
            start,
            end,
        });
    }
    // Every zone needs the bag after it, so the last usable bag is the terminal.
    if end >= bag_count {
        return Err(Error::IndexOutOfRange {
            chunk: bag_chunk,
            index: end,
            len: bag_count,
        });
    }
    Ok(start..end)
}

fn checked_span(
    bag_chunk: &'static str,
    target_chunk: &'static str,
    zone: usize,
    start: u16,
    end: u16,
    target_len: usize,
) -> Result<Range<usize>> {
    let (start, end) = (start as usize, end as usize);
    if start > end {
        return Err(Error::NegativeRange {
            chunk: bag_chunk,
            index: zone,
            start,
            end,
        });
    }
    // The terminal record of the target table is never part of a zone.
    if end >= target_len {
        return Err(Error::IndexOutOfRange {
            chunk: target_chunk,
            index: end,
            len: target_len,
        });
    }
    Ok(start..end)
}

/// Generator records of bag `zone`.
pub fn generator_span(tables: &ZoneTables<'_>, zone: usize) -> Result<Range<usize>> {
    let bags = tables.bags.records();
    checked_span(
        tables.bag_chunk,
        tables.generator_chunk,
        zone,
        bags[zone].generator_index,
        bags[zone + 1].generator_index,
        tables.generators.len(),
    )
}

/// Modulator records of bag `zone`.
pub fn modulator_span(tables: &ZoneTables<'_>, zone: usize) -> Result<Range<usize>> {
    let bags = tables.bags.records();
    checked_span(
        tables.bag_chunk,
        tables.modulator_chunk,
        zone,
        bags[zone].modulator_index,
        bags[zone + 1].modulator_index,
        tables.modulators.len(),
    )
}

/// A zone after its generators have been scanned once.
struct ScannedZone {
    zone: Zone,
    /// Unsigned view of the identifying generator.
    target: Option<u16>,
    /// Signed view of `pan`.
    pan: Option<i16>,
}

/// A zone that selects a sample or an instrument.
struct BoundZone {
    zone: Zone,
    target: u16,
    pan: Option<i16>,
}

fn scan_zone(
    tables: &ZoneTables<'_>,
    zone: usize,
    identifying: GeneratorType,
    kind: EntityKind,
    name: &str,
) -> Result<ScannedZone> {
    let generators = &tables.generators.records()[generator_span(tables, zone)?];
    let modulators = &tables.modulators.records()[modulator_span(tables, zone)?];

    let mut scanned = ScannedZone {
        zone: Zone {
            bag_index: zone,
            key_range: None,
            velocity_range: None,
            generators: generators.to_vec(),
            modulators: modulators.to_vec(),
        },
        target: None,
        pan: None,
    };

    for generator in generators {
        match generator.kind {
            GeneratorType::KeyRange => scanned.zone.key_range = Some(generator.value.range()),
            GeneratorType::VelRange => {
                scanned.zone.velocity_range = Some(generator.value.range())
            }
            GeneratorType::Pan => scanned.pan = Some(generator.value.signed()),
            other if other == identifying => {
                if scanned.target.is_some() {
                    return Err(Error::DuplicateGenerator {
                        kind,
                        name: name.to_string(),
                        zone,
                        generator: identifying,
                    });
                }
                scanned.target = Some(generator.value.unsigned());
            }
            _ => {}
        }
    }

    Ok(scanned)
}

/// Zones of one entity, split into the leading global zone and the bound ones.
struct EntityZones {
    global: Option<Zone>,
    bound: Vec<BoundZone>,
}

fn entity_zones(
    tables: &ZoneTables<'_>,
    span: Range<usize>,
    identifying: GeneratorType,
    kind: EntityKind,
    name: &str,
    sink: &mut dyn DiagnosticSink,
) -> Result<EntityZones> {
    let first = span.start;
    let mut zones = EntityZones {
        global: None,
        bound: Vec::with_capacity(span.len()),
    };

    for zone in span {
        let scanned = scan_zone(tables, zone, identifying, kind, name)?;
        match scanned.target {
            Some(target) => zones.bound.push(BoundZone {
                zone: scanned.zone,
                target,
                pan: scanned.pan,
            }),
            None if zone == first => zones.global = Some(scanned.zone),
            None => sink.warn(Warning::UnboundZone {
                kind,
                name: name.to_string(),
                zone,
            }),
        }
    }

    Ok(zones)
}

/// Build every instrument, binding its zones to `samples`.
///
/// Samples that no zone selects are reported once each, in index order.
pub fn resolve_instruments(
    headers: &Table<InstrumentHeader>,
    tables: &ZoneTables<'_>,
    samples: &[Sample],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Instrument>> {
    let bag_starts: Vec<u16> = headers.records().iter().map(|h| h.bag_index).collect();
    let mut used = vec![false; samples.len()];
    let mut instruments = Vec::with_capacity(headers.entities().len());

    for header in headers.entities() {
        let span = zone_span(
            "inst",
            tables.bag_chunk,
            &bag_starts,
            header.index,
            tables.bags.len(),
        )?;
        let zones = entity_zones(
            tables,
            span,
            GeneratorType::SampleId,
            EntityKind::Instrument,
            &header.name,
            sink,
        )?;

        let mut bound = Vec::with_capacity(zones.bound.len());
        for bound_zone in zones.bound {
            let sample = bound_zone.target as usize;
            if sample >= samples.len() {
                return Err(Error::MissingReference {
                    kind: EntityKind::Instrument,
                    name: header.name.clone(),
                    target: EntityKind::Sample,
                    index: sample,
                });
            }
            used[sample] = true;
            bound.push(InstrumentZone {
                sample,
                pan: bound_zone.pan,
                zone: bound_zone.zone,
            });
        }

        instruments.push(Instrument {
            index: header.index,
            name: header.name.clone(),
            global_zone: zones.global,
            zones: bound,
        });
    }

    for (sample, _) in samples.iter().zip(&used).filter(|(_, used)| !**used) {
        sink.warn(Warning::UnusedSample {
            index: sample.index(),
            name: sample.name().to_string(),
        });
    }

    log::debug!("Resolved {} instruments", instruments.len());

    Ok(instruments)
}

/// Build every preset, binding its zones to `instruments`.
pub fn resolve_presets(
    headers: &Table<PresetHeader>,
    tables: &ZoneTables<'_>,
    instruments: &[Instrument],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Preset>> {
    let bag_starts: Vec<u16> = headers.records().iter().map(|h| h.bag_index).collect();
    let mut used = vec![false; instruments.len()];
    let mut presets = Vec::with_capacity(headers.entities().len());

    for header in headers.entities() {
        let span = zone_span(
            "phdr",
            tables.bag_chunk,
            &bag_starts,
            header.index,
            tables.bags.len(),
        )?;
        let zones = entity_zones(
            tables,
            span,
            GeneratorType::Instrument,
            EntityKind::Preset,
            &header.name,
            sink,
        )?;

        let mut bound = Vec::with_capacity(zones.bound.len());
        for bound_zone in zones.bound {
            let instrument = bound_zone.target as usize;
            if instrument >= instruments.len() {
                return Err(Error::MissingReference {
                    kind: EntityKind::Preset,
                    name: header.name.clone(),
                    target: EntityKind::Instrument,
                    index: instrument,
                });
            }
            used[instrument] = true;
            bound.push(PresetZone {
                instrument,
                zone: bound_zone.zone,
            });
        }

        presets.push(Preset {
            index: header.index,
            name: header.name.clone(),
            preset: header.preset,
            bank: header.bank,
            library: header.library,
            genre: header.genre,
            morphology: header.morphology,
            global_zone: zones.global,
            zones: bound,
        });
    }

    for (instrument, _) in instruments.iter().zip(&used).filter(|(_, used)| !**used) {
        sink.warn(Warning::UnusedInstrument {
            index: instrument.index,
            name: instrument.name.clone(),
        });
    }

    log::debug!("Resolved {} presets", presets.len());

    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::generators::{GeneratorValue, MidiRange};
    use crate::parser::modulators::{ModulatorDestination, ModulatorSource, Transform};

    fn generators(records: &[(GeneratorType, u16)]) -> Table<Generator> {
        let mut records: Vec<Generator> = records
            .iter()
            .enumerate()
            .map(|(index, &(kind, value))| Generator {
                index,
                kind,
                value: GeneratorValue(value),
            })
            .collect();
        records.push(Generator {
            index: records.len(),
            kind: GeneratorType::StartAddrsOffset,
            value: GeneratorValue(0),
        });
        Table::new("igen", records).unwrap()
    }

    fn bags(generator_starts: &[u16]) -> Table<Bag> {
        let starts: Vec<(u16, u16)> = generator_starts.iter().map(|&start| (start, 0)).collect();
        bags_with_modulators(&starts)
    }

    /// Bags from `(generator start, modulator start)` pairs, terminal included.
    fn bags_with_modulators(starts: &[(u16, u16)]) -> Table<Bag> {
        let records = starts
            .iter()
            .map(|&(generator_index, modulator_index)| Bag {
                generator_index,
                modulator_index,
            })
            .collect();
        Table::new("ibag", records).unwrap()
    }

    /// `count` modulators plus the terminal record. Modulator `i` has amount
    /// `i * 100` so slices can be told apart.
    fn modulators(count: usize) -> Table<Modulator> {
        let records = (0..=count)
            .map(|index| Modulator {
                index,
                source: ModulatorSource::from_raw(0),
                destination: ModulatorDestination::from_raw(0),
                amount: (index * 100) as i16,
                amount_source: ModulatorSource::from_raw(0),
                transform: Transform::from_raw(0),
            })
            .collect();
        Table::new("imod", records).unwrap()
    }

    fn no_modulators() -> Table<Modulator> {
        modulators(0)
    }

    fn instrument_headers(bag_starts: &[u16]) -> Table<InstrumentHeader> {
        let records = bag_starts
            .iter()
            .enumerate()
            .map(|(index, &bag_index)| InstrumentHeader {
                index,
                name: format!("Inst {}", index),
                bag_index,
            })
            .collect();
        Table::new("inst", records).unwrap()
    }

    fn preset_headers(bag_starts: &[u16]) -> Table<PresetHeader> {
        let records = bag_starts
            .iter()
            .enumerate()
            .map(|(index, &bag_index)| PresetHeader {
                index,
                name: format!("Preset {}", index),
                preset: index as u16,
                bank: 0,
                bag_index,
                library: 0,
                genre: 0,
                morphology: 0,
            })
            .collect();
        Table::new("phdr", records).unwrap()
    }

    fn samples(count: usize) -> Vec<Sample> {
        let buffer: std::sync::Arc<[u8]> = vec![0u8; 4].into();
        (0..count)
            .map(|index| Sample {
                header: crate::parser::records::SampleHeader {
                    index,
                    name: format!("Sample {}", index),
                    start: 0,
                    end: 2,
                    loop_start: 0,
                    loop_end: 2,
                    sample_rate: 22050,
                    original_pitch: 60,
                    pitch_correction: 0,
                    sample_link: 0,
                    link_type: crate::parser::records::SampleLinkType::Mono,
                },
                data: crate::types::SampleData::new(buffer.clone(), 0..4),
                linked: None,
            })
            .collect()
    }

    fn instruments(count: usize) -> Vec<Instrument> {
        (0..count)
            .map(|index| Instrument {
                index,
                name: format!("Inst {}", index),
                global_zone: None,
                zones: Vec::new(),
            })
            .collect()
    }

    fn tables<'a>(
        bags: &'a Table<Bag>,
        generators: &'a Table<Generator>,
        modulators: &'a Table<Modulator>,
    ) -> ZoneTables<'a> {
        ZoneTables {
            bag_chunk: "ibag",
            generator_chunk: "igen",
            modulator_chunk: "imod",
            bags,
            generators,
            modulators,
        }
    }

    #[test]
    fn test_zone_span_is_bounded_by_next_header() {
        // Preset 1 starts at bag 2 and the next header at bag 5: three zones.
        let span = zone_span("phdr", "pbag", &[0, 2, 5], 1, 6).unwrap();
        assert_eq!(span, 2..5);
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn test_zone_span_rejects_backwards_headers() {
        match zone_span("inst", "ibag", &[0, 4, 2], 1, 6) {
            Err(Error::NegativeRange {
                chunk,
                index,
                start,
                end,
            }) => {
                assert_eq!(chunk, "inst");
                assert_eq!(index, 1);
                assert_eq!((start, end), (4, 2));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zone_span_needs_a_closing_bag() {
        assert!(matches!(
            zone_span("inst", "ibag", &[0, 3], 0, 3),
            Err(Error::IndexOutOfRange {
                chunk: "ibag",
                index: 3,
                len: 3
            })
        ));
    }

    #[test]
    fn test_three_zones_are_resolved_in_order() {
        let generators = generators(&[
            (GeneratorType::KeyRange, 0x3C00),
            (GeneratorType::SampleId, 0),
            (GeneratorType::KeyRange, 0x7F3D),
            (GeneratorType::Pan, 0x81),
            (GeneratorType::SampleId, 1),
            (GeneratorType::SampleId, 2),
        ]);
        let bags = bags(&[0, 2, 5, 6]);
        let modulators = no_modulators();
        let headers = instrument_headers(&[0, 3]);
        let samples = samples(3);
        let mut diagnostics = Diagnostics::new();

        let instruments = resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(instruments.len(), 1);
        let zones = &instruments[0].zones;
        assert_eq!(zones.len(), 3);
        assert_eq!(
            zones.iter().map(|zone| zone.sample).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(zones[0].zone.key_range, Some(MidiRange::new(0, 60)));
        assert_eq!(zones[1].zone.key_range, Some(MidiRange::new(61, 127)));
        assert_eq!(zones[1].pan, Some(-1));
        assert_eq!(zones[1].zone.generators.len(), 3);
        assert_eq!(zones[2].zone.key_range, None);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_identifying_generator_names_the_zone() {
        let generators = generators(&[
            (GeneratorType::SampleId, 0),
            (GeneratorType::SampleId, 1),
        ]);
        let bags = bags(&[0, 2]);
        let modulators = no_modulators();
        let headers = instrument_headers(&[0, 1]);

        match resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples(2),
            &mut Diagnostics::new(),
        ) {
            Err(Error::DuplicateGenerator {
                kind,
                zone,
                generator,
                ..
            }) => {
                assert_eq!(kind, EntityKind::Instrument);
                assert_eq!(zone, 0);
                assert_eq!(generator, GeneratorType::SampleId);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reference_past_the_sample_table_is_fatal() {
        let generators = generators(&[(GeneratorType::SampleId, 7)]);
        let bags = bags(&[0, 1]);
        let modulators = no_modulators();
        let headers = instrument_headers(&[0, 1]);

        let err = resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples(2),
            &mut Diagnostics::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingReference { index: 7, .. }));
        assert!(err.to_string().contains("non-existent sample index 7"));
    }

    #[test]
    fn test_first_zone_without_selector_is_global() {
        let generators = generators(&[
            (GeneratorType::VelRange, 0x7F40),
            (GeneratorType::SampleId, 0),
        ]);
        let bags = bags(&[0, 1, 2]);
        let modulators = no_modulators();
        let headers = instrument_headers(&[0, 2]);
        let mut diagnostics = Diagnostics::new();

        let instruments = resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples(1),
            &mut diagnostics,
        )
        .unwrap();

        let instrument = &instruments[0];
        assert_eq!(instrument.zones.len(), 1);
        // Global ranges are exposed but not applied to the bound zones.
        let global = instrument.global_zone.as_ref().unwrap();
        assert_eq!(global.velocity_range, Some(MidiRange::new(64, 127)));
        assert_eq!(instrument.zones[0].zone.velocity_range, None);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_later_zone_without_selector_is_dropped_with_warning() {
        let generators = generators(&[
            (GeneratorType::SampleId, 0),
            (GeneratorType::KeyRange, 0x7F00),
        ]);
        let bags = bags(&[0, 1, 2]);
        let modulators = no_modulators();
        let headers = instrument_headers(&[0, 2]);
        let mut diagnostics = Diagnostics::new();

        let instruments = resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples(1),
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(instruments[0].zones.len(), 1);
        assert!(instruments[0].global_zone.is_none());
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnboundZone {
                kind: EntityKind::Instrument,
                name: "Inst 0".to_string(),
                zone: 1,
            }]
        );
    }

    #[test]
    fn test_unused_instruments_are_reported_once() {
        let generators = generators(&[(GeneratorType::Instrument, 1)]);
        let bags = bags(&[0, 1]);
        let modulators = no_modulators();
        let headers = preset_headers(&[0, 1]);
        let instruments = instruments(3);
        let mut diagnostics = Diagnostics::new();

        let presets = resolve_presets(
            &headers,
            &tables(&bags, &generators, &modulators),
            &instruments,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].zones[0].instrument, 1);
        let unused: Vec<usize> = diagnostics
            .warnings()
            .iter()
            .filter_map(|warning| match warning {
                Warning::UnusedInstrument { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(unused, vec![0, 2]);
    }

    #[test]
    fn test_generator_span_past_table_end() {
        let generators = generators(&[(GeneratorType::SampleId, 0)]);
        let bags = bags(&[0, 9]);
        let modulators = no_modulators();
        assert!(matches!(
            generator_span(&tables(&bags, &generators, &modulators), 0),
            Err(Error::IndexOutOfRange {
                chunk: "igen",
                index: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_each_zone_gets_only_its_own_modulators() {
        let generators = generators(&[
            (GeneratorType::SampleId, 0),
            (GeneratorType::SampleId, 1),
        ]);
        // Zone 0 owns modulator 0, zone 1 owns modulators 1 and 2.
        let bags = bags_with_modulators(&[(0, 0), (1, 1), (2, 3)]);
        let modulators = modulators(3);
        let headers = instrument_headers(&[0, 2]);

        let instruments = resolve_instruments(
            &headers,
            &tables(&bags, &generators, &modulators),
            &samples(2),
            &mut Diagnostics::new(),
        )
        .unwrap();

        let zones = &instruments[0].zones;
        let amounts = |zone: usize| -> Vec<i16> {
            zones[zone].zone.modulators.iter().map(|m| m.amount).collect()
        };
        assert_eq!(amounts(0), vec![0]);
        assert_eq!(amounts(1), vec![100, 200]);
        assert_eq!(zones[1].zone.modulators[0].index, 1);
    }

    #[test]
    fn test_modulator_span_past_table_end() {
        let generators = generators(&[(GeneratorType::SampleId, 0)]);
        let bags = bags_with_modulators(&[(0, 0), (1, 4)]);
        let modulators = modulators(2);
        assert!(matches!(
            modulator_span(&tables(&bags, &generators, &modulators), 0),
            Err(Error::IndexOutOfRange {
                chunk: "imod",
                index: 4,
                len: 3
            })
        ));
    }

    #[test]
    fn test_modulator_span_rejects_backwards_bags() {
        let generators = generators(&[(GeneratorType::SampleId, 0)]);
        let bags = bags_with_modulators(&[(0, 2), (1, 1)]);
        let modulators = modulators(2);
        match modulator_span(&tables(&bags, &generators, &modulators), 0) {
            Err(Error::NegativeRange {
                chunk,
                index,
                start,
                end,
            }) => {
                assert_eq!(chunk, "ibag");
                assert_eq!(index, 0);
                assert_eq!((start, end), (2, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_modulator_span_reaching_the_terminal_is_rejected() {
        let generators = generators(&[(GeneratorType::SampleId, 0)]);
        let bags = bags_with_modulators(&[(0, 0), (1, 3)]);
        let modulators = modulators(2);
        let span = modulator_span(&tables(&bags, &generators, &modulators), 0);
        assert!(matches!(span, Err(Error::IndexOutOfRange { index: 3, .. })));
    }
}
