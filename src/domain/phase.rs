//! Phase tables, used by beam-steering (BSM) modules.

use crate::constants::MAX_N_PHASES;
use crate::error::{ArcpError, Result};

/// One entry in a [`PhaseTable`]: a channel and its phase, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseEntry {
    /// Channel number.
    pub channel: u16,
    /// Phase.
    pub phase: f32,
}

/// An ordered list of [`PhaseEntry`] values, capped at
/// [`crate::constants::MAX_N_PHASES`] entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseTable {
    entries: Vec<PhaseEntry>,
}

impl PhaseTable {
    /// An empty phase table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a phase table from a list of entries, rejecting one that
    /// exceeds the domain maximum.
    pub fn from_entries(entries: Vec<PhaseEntry>) -> Result<Self> {
        if entries.len() > usize::from(MAX_N_PHASES) {
            return Err(ArcpError::Local("phase table exceeds 32 entries"));
        }
        Ok(Self { entries })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries, in order.
    pub fn entries(&self) -> &[PhaseEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_cap_rejected() {
        let entries = vec![PhaseEntry { channel: 0, phase: 0.0 }; 33];
        assert!(PhaseTable::from_entries(entries).is_err());
    }

    #[test]
    fn at_cap_accepted() {
        let entries = vec![PhaseEntry { channel: 0, phase: 0.0 }; 32];
        assert!(PhaseTable::from_entries(entries).is_ok());
    }
}
