//! Zone matching for note lookups.

use crate::types::*;

/// One sample that should sound for a note, with the zones that selected it.
#[derive(Clone, Copy, Debug)]
pub struct ZoneMatch<'a> {
    pub preset_zone: &'a PresetZone,
    pub instrument: &'a Instrument,
    pub instrument_zone: &'a InstrumentZone,
    pub sample: &'a Sample,
}

/// Find every sample a preset plays for the given key and velocity.
///
/// A sample matches when both its preset zone and its instrument zone accept
/// the key and velocity. Zones without a range accept everything. Global
/// zones are not consulted.
///
/// # Arguments
///
/// * `font` - The bank `preset` belongs to
/// * `preset` - The preset to search
/// * `key` - MIDI note number (0-127)
/// * `velocity` - MIDI velocity (0-127)
///
/// # Returns
///
/// Matches in zone order: preset zones first, then instrument zones within each.
pub fn find_matching_zones<'a>(
    font: &'a SoundFont,
    preset: &'a Preset,
    key: u8,
    velocity: u8,
) -> Vec<ZoneMatch<'a>> {
    let mut result = Vec::new();

    for preset_zone in &preset.zones {
        if !preset_zone.zone.matches(key, velocity) {
            continue;
        }
        let Some(instrument) = font.instrument(preset_zone.instrument) else {
            continue;
        };

        for instrument_zone in &instrument.zones {
            if !instrument_zone.zone.matches(key, velocity) {
                continue;
            }
            if let Some(sample) = font.sample(instrument_zone.sample) {
                result.push(ZoneMatch {
                    preset_zone,
                    instrument,
                    instrument_zone,
                    sample,
                });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::decode;
    use crate::testing::{generator, link, SoundFontBuilder};

    fn split_keyboard() -> SoundFont {
        // Preset layers a piano over the whole keyboard with soft strings
        // above middle C.
        let bytes = SoundFontBuilder::new()
            .preset("Piano + Strings", 0, 0)
            .preset_zone(&[(generator::INSTRUMENT, 0)])
            .preset_zone(&[
                (generator::KEY_RANGE, 0x7F3C),
                (generator::VEL_RANGE, 0x3F00),
                (generator::INSTRUMENT, 1),
            ])
            .instrument("Piano")
            .instrument_zone(&[(generator::KEY_RANGE, 0x3B00), (generator::SAMPLE_ID, 0)])
            .instrument_zone(&[(generator::KEY_RANGE, 0x7F3C), (generator::SAMPLE_ID, 1)])
            .instrument("Strings")
            .instrument_zone(&[(generator::SAMPLE_ID, 2)])
            .sample("Piano Low", &[1, 2], link::MONO, 0)
            .sample("Piano High", &[3, 4], link::MONO, 0)
            .sample("Strings", &[5, 6], link::MONO, 0)
            .build();
        decode(bytes, &mut Diagnostics::new()).unwrap()
    }

    fn sample_names(matches: &[ZoneMatch<'_>]) -> Vec<String> {
        matches.iter().map(|m| m.sample.name().to_string()).collect()
    }

    #[test]
    fn test_low_key_only_hits_piano() {
        let font = split_keyboard();
        let matches = find_matching_zones(&font, &font.presets[0], 40, 30);
        assert_eq!(sample_names(&matches), vec!["Piano Low"]);
        assert_eq!(matches[0].instrument.name, "Piano");
    }

    #[test]
    fn test_soft_high_key_layers_both_instruments() {
        let font = split_keyboard();
        let matches = find_matching_zones(&font, &font.presets[0], 72, 30);
        assert_eq!(sample_names(&matches), vec!["Piano High", "Strings"]);
    }

    #[test]
    fn test_velocity_range_excludes_layer() {
        let font = split_keyboard();
        let matches = find_matching_zones(&font, &font.presets[0], 72, 100);
        assert_eq!(sample_names(&matches), vec!["Piano High"]);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let font = split_keyboard();
        assert_eq!(
            sample_names(&find_matching_zones(&font, &font.presets[0], 59, 63)),
            vec!["Piano Low"]
        );
        assert_eq!(
            sample_names(&find_matching_zones(&font, &font.presets[0], 60, 63)),
            vec!["Piano High", "Strings"]
        );
    }
}
