//! Trigger parameters, as carried by `SET_TRIG_PARAM`.

/// Trigger sources.
pub mod trigger_source {
    /// External trigger.
    pub const EXT: u8 = 0x00;
    /// Internal trigger.
    pub const INT: u8 = 0x01;
}

/// External trigger option flags (a bitmask).
pub mod ext_trigger_options {
    /// Normal.
    pub const NORMAL: u8 = 0x00;
    /// Invert the trigger.
    pub const INVERT: u8 = 0x01;
    /// Treat the trigger as a gate.
    pub const IS_GATE: u8 = 0x02;
    /// Mask covering the bits this library understands.
    pub const MASK: u8 = INVERT | IS_GATE;
}

/// Trigger parameters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TriggerParams {
    /// Trigger source (see [`trigger_source`]).
    pub source: u8,
    /// External trigger options (see [`ext_trigger_options`]).
    pub ext_options: u8,
    /// Internal trigger frequency.
    pub internal_freq: u16,
    /// Pulse predelay.
    pub predelay: u16,
}
