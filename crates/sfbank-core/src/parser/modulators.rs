//! Modulator operators.
//!
//! A modulator record names a controller source, a destination generator, an
//! amount, a second source that scales the amount, and a transform. Operator
//! words that fall outside the known palette are kept as `Undefined` values
//! rather than rejected; the decoder only exposes them.

use crate::parser::generators::GeneratorType;

/// Controller palette used when a source is not a MIDI continuous controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneralController {
    /// Treated as a constant 1; not a way to switch the modulator off.
    NoController,
    NoteOnVelocity,
    NoteOnKeyNumber,
    PolyPressure,
    ChannelPressure,
    PitchWheel,
    PitchWheelSensitivity,
    /// Output of another modulator. Not valid as an amount source.
    Link,
    Undefined(u8),
}

impl GeneralController {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::NoController,
            2 => Self::NoteOnVelocity,
            3 => Self::NoteOnKeyNumber,
            10 => Self::PolyPressure,
            13 => Self::ChannelPressure,
            14 => Self::PitchWheel,
            16 => Self::PitchWheelSensitivity,
            127 => Self::Link,
            other => Self::Undefined(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoController => "No Controller",
            Self::NoteOnVelocity => "Note-On Velocity",
            Self::NoteOnKeyNumber => "Note-On Key Number",
            Self::PolyPressure => "Poly Pressure",
            Self::ChannelPressure => "Channel Pressure",
            Self::PitchWheel => "Pitch Wheel",
            Self::PitchWheelSensitivity => "Pitch Wheel Sensitivity",
            Self::Link => "Link",
            Self::Undefined(_) => "Undefined",
        }
    }
}

/// Where a modulator source reads its value from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Controller {
    General(GeneralController),
    /// MIDI continuous controller number.
    Midi(u8),
}

/// Shape applied to a source value before it is scaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceCurve {
    Linear,
    Concave,
    Convex,
    Switch,
    Undefined(u8),
}

/// Decoded 16-bit modulator source word.
///
/// Bit layout: 0-6 controller index, 7 continuous-controller flag,
/// 8 direction, 9 polarity, 10-15 curve type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModulatorSource {
    pub controller: Controller,
    /// Maps max to min instead of min to max.
    pub descending: bool,
    /// Maps to -1..1 instead of 0..1.
    pub bipolar: bool,
    pub curve: SourceCurve,
    /// The undecoded word.
    pub raw: u16,
}

impl ModulatorSource {
    pub fn from_raw(raw: u16) -> Self {
        let index = (raw & 0x7F) as u8;
        let controller = if raw & 0x80 != 0 {
            Controller::Midi(index)
        } else {
            Controller::General(GeneralController::from_index(index))
        };
        let curve = match (raw >> 10) as u8 {
            0 => SourceCurve::Linear,
            1 => SourceCurve::Concave,
            2 => SourceCurve::Convex,
            3 => SourceCurve::Switch,
            other => SourceCurve::Undefined(other),
        };
        Self {
            controller,
            descending: raw & 0x100 != 0,
            bipolar: raw & 0x200 != 0,
            curve,
            raw,
        }
    }
}

/// What a modulator's output is summed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModulatorDestination {
    Generator(GeneratorType),
    /// Feeds the source of another modulator in the same zone.
    Link(u16),
    Undefined(u16),
}

impl ModulatorDestination {
    pub fn from_raw(raw: u16) -> Self {
        if raw & 0x8000 != 0 {
            return Self::Link(raw & 0x7FFF);
        }
        match GeneratorType::from_code(raw) {
            Some(kind) => Self::Generator(kind),
            None => Self::Undefined(raw),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transform {
    Linear,
    /// output = |input|
    AbsoluteValue,
    Undefined(u16),
}

impl Transform {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Linear,
            2 => Self::AbsoluteValue,
            other => Self::Undefined(other),
        }
    }
}

/// One decoded `pmod`/`imod` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulator {
    /// Position in its table.
    pub index: usize,
    pub source: ModulatorSource,
    pub destination: ModulatorDestination,
    pub amount: i16,
    pub amount_source: ModulatorSource,
    pub transform: Transform,
}
