//! Generator operators and amounts.

use std::fmt;

/// Declares the closed set of SF2 generator operators together with their
/// on-disk codes and canonical names.
macro_rules! generator_types {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// SF2 generator operator.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum GeneratorType {
            $(
                #[doc = $name]
                $variant,
            )*
        }

        impl GeneratorType {
            /// Look up an operator by its on-disk code.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// The operator's on-disk code.
            pub fn code(self) -> u16 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Operator name as it appears in SoundFont 2.01 documents.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

generator_types! {
    StartAddrsOffset = 0 => "startAddrsOffset",
    EndAddrsOffset = 1 => "endAddrsOffset",
    StartloopAddrsOffset = 2 => "startloopAddrsOffset",
    EndloopAddrsOffset = 3 => "endloopAddrsOffset",
    StartAddrsCoarseOffset = 4 => "startAddrsCoarseOffset",
    ModLfoToPitch = 5 => "modLfoToPitch",
    VibLfoToPitch = 6 => "vibLfoToPitch",
    ModEnvToPitch = 7 => "modEnvToPitch",
    InitialFilterFc = 8 => "initialFilterFc",
    InitialFilterQ = 9 => "initialFilterQ",
    ModLfoToFilterFc = 10 => "modLfoToFilterFc",
    ModEnvToFilterFc = 11 => "modEnvToFilterFc",
    EndAddrsCoarseOffset = 12 => "endAddrsCoarseOffset",
    ModLfoToVolume = 13 => "modLfoToVolume",
    Unused1 = 14 => "unused1",
    ChorusEffectsSend = 15 => "chorusEffectsSend",
    ReverbEffectsSend = 16 => "reverbEffectsSend",
    Pan = 17 => "pan",
    Unused2 = 18 => "unused2",
    Unused3 = 19 => "unused3",
    Unused4 = 20 => "unused4",
    DelayModLfo = 21 => "delayModLFO",
    FreqModLfo = 22 => "freqModLFO",
    DelayVibLfo = 23 => "delayVibLFO",
    FreqVibLfo = 24 => "freqVibLFO",
    DelayModEnv = 25 => "delayModEnv",
    AttackModEnv = 26 => "attackModEnv",
    HoldModEnv = 27 => "holdModEnv",
    DecayModEnv = 28 => "decayModEnv",
    SustainModEnv = 29 => "sustainModEnv",
    ReleaseModEnv = 30 => "releaseModEnv",
    KeynumToModEnvHold = 31 => "keynumToModEnvHold",
    KeynumToModEnvDecay = 32 => "keynumToModEnvDecay",
    DelayVolEnv = 33 => "delayVolEnv",
    AttackVolEnv = 34 => "attackVolEnv",
    HoldVolEnv = 35 => "holdVolEnv",
    DecayVolEnv = 36 => "decayVolEnv",
    SustainVolEnv = 37 => "sustainVolEnv",
    ReleaseVolEnv = 38 => "releaseVolEnv",
    KeynumToVolEnvHold = 39 => "keynumToVolEnvHold",
    KeynumToVolEnvDecay = 40 => "keynumToVolEnvDecay",
    Instrument = 41 => "instrument",
    Reserved1 = 42 => "reserved1",
    KeyRange = 43 => "keyRange",
    VelRange = 44 => "velRange",
    StartloopAddrsCoarseOffset = 45 => "startloopAddrsCoarseOffset",
    Keynum = 46 => "keynum",
    Velocity = 47 => "velocity",
    InitialAttenuation = 48 => "initialAttenuation",
    Reserved2 = 49 => "reserved2",
    EndloopAddrsCoarseOffset = 50 => "endloopAddrsCoarseOffset",
    CoarseTune = 51 => "coarseTune",
    FineTune = 52 => "fineTune",
    SampleId = 53 => "sampleID",
    SampleModes = 54 => "sampleModes",
    Reserved3 = 55 => "reserved3",
    ScaleTuning = 56 => "scaleTuning",
    ExclusiveClass = 57 => "exclusiveClass",
    OverridingRootKey = 58 => "overridingRootKey",
    Unused5 = 59 => "unused5",
    EndOper = 60 => "endOper",
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive MIDI key or velocity range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MidiRange {
    pub low: u8,
    pub high: u8,
}

impl MidiRange {
    /// The whole 0-127 MIDI range.
    pub const FULL: MidiRange = MidiRange { low: 0, high: 127 };

    pub fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }
}

impl fmt::Display for MidiRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Raw 16-bit generator amount.
///
/// The same field means different things depending on the operator, so it is
/// kept raw and read through one of three views:
///
/// - [`range`](Self::range) for `keyRange`/`velRange`
/// - [`signed`](Self::signed) for `pan` and other small signed amounts
/// - [`unsigned`](Self::unsigned) for `instrument`/`sampleID` selectors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorValue(pub u16);

impl GeneratorValue {
    /// Low byte is the lower bound, high byte the upper bound.
    pub fn range(self) -> MidiRange {
        MidiRange {
            low: (self.0 & 0xFF) as u8,
            high: (self.0 >> 8) as u8,
        }
    }

    /// 7-bit sign-magnitude: bit 7 is the sign, bits 0-6 the magnitude.
    ///
    /// This is not two's complement; `0x81` reads as `-1`, not `-127`.
    pub fn signed(self) -> i16 {
        let magnitude = (self.0 & 0x7F) as i16;
        if self.0 & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn unsigned(self) -> u16 {
        self.0
    }
}

/// One decoded `pgen`/`igen` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Generator {
    /// Position in its table.
    pub index: usize,
    pub kind: GeneratorType,
    pub value: GeneratorValue,
}
