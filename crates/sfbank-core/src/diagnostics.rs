//! Non-fatal decode diagnostics.
//!
//! The decoder never prints. Anything worth telling the caller that does not
//! stop decoding is handed to a [`DiagnosticSink`] passed into
//! [`decode`](crate::decode), so callers decide whether warnings are logged,
//! collected for assertions, or dropped.

use std::fmt;

use crate::types::EntityKind;

/// Something odd about a bank that does not prevent decoding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// No instrument zone selects this sample. It is still decoded.
    UnusedSample { index: usize, name: String },
    /// No preset zone selects this instrument. It is still decoded.
    UnusedInstrument { index: usize, name: String },
    /// A left/right sample points at a partner that is not a left/right sample
    /// pointing back at it. The link is left unresolved.
    AsymmetricLink {
        sample: usize,
        name: String,
        partner: usize,
    },
    /// A left/right sample points at itself or past the end of `shdr`.
    DanglingLink {
        sample: usize,
        name: String,
        partner: usize,
    },
    /// A zone other than the first has no identifying generator and was
    /// dropped.
    UnboundZone {
        kind: EntityKind,
        name: String,
        zone: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnusedSample { index, name } => {
                write!(f, "Unused sample index {} ('{}')", index, name)
            }
            Warning::UnusedInstrument { index, name } => {
                write!(f, "Unused instrument index {} ('{}')", index, name)
            }
            Warning::AsymmetricLink {
                sample,
                name,
                partner,
            } => write!(
                f,
                "Sample #{} ({}) links to sample #{} but sample #{} does not seem to have a link",
                sample, name, partner, partner
            ),
            Warning::DanglingLink {
                sample,
                name,
                partner,
            } => write!(
                f,
                "Sample #{} ({}) links to sample #{}, which is not a valid partner",
                sample, name, partner
            ),
            Warning::UnboundZone { kind, name, zone } => write!(
                f,
                "Zone {} of {} '{}' selects nothing and is not the first zone; ignoring it",
                zone, kind, name
            ),
        }
    }
}

/// Receiver for [`Warning`]s raised while decoding.
pub trait DiagnosticSink {
    fn warn(&mut self, warning: Warning);
}

impl<F: FnMut(Warning)> DiagnosticSink for F {
    fn warn(&mut self, warning: Warning) {
        self(warning)
    }
}

/// Collects warnings in the order they were raised.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl DiagnosticSink for Diagnostics {
    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Forwards warnings to `log::warn!`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
    }
}
