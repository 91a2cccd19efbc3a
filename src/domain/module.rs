//! Module type tagging, shared by system-ID and system-status records.

/// The class of slave module an ARCP node identifies itself as.
///
/// The wire value is a signed byte. `-1` is a sentinel used both for
/// "uninitialized" and for "don't care"; this library treats them as the
/// same value and does not attempt to distinguish them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleType {
    /// Uninitialized / don't-care sentinel (wire value -1).
    None,
    /// VHF transmitter module (wire value 1).
    Stx2,
    /// Beam-steering module (wire value 2).
    Bsm,
    /// Any other value observed on the wire (including the master's own
    /// `0`), preserved verbatim rather than rejected, so that a decoder
    /// never refuses a structurally valid common-fields record just
    /// because of an unrecognized module type in the tag byte.
    Other(i8),
}

impl ModuleType {
    pub(crate) fn from_wire(v: i8) -> Self {
        match v {
            -1 => ModuleType::None,
            1 => ModuleType::Stx2,
            2 => ModuleType::Bsm,
            other => ModuleType::Other(other),
        }
    }

    pub(crate) fn to_wire(self) -> i8 {
        match self {
            ModuleType::None => -1,
            ModuleType::Stx2 => 1,
            ModuleType::Bsm => 2,
            ModuleType::Other(v) => v,
        }
    }
}

impl Default for ModuleType {
    fn default() -> Self {
        ModuleType::None
    }
}
