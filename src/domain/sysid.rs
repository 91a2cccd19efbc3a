//! System identification data, returned by `GET_SYSID`.

use crate::domain::module::ModuleType;

/// STX2-specific identification fields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stx2SysId {
    /// Bitmap of installed RF cards.
    pub card_map: u16,
    /// Pulse slot length, in nanoseconds.
    pub pulse_slot_length: u32,
}

/// BSM-specific identification fields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BsmSysId {
    /// Bitmap of installed beam-steering channels.
    pub channel_map: u16,
}

/// The module-specific tail of a [`SysId`]. Absent when the module type is
/// neither STX2 nor BSM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SysIdData {
    /// No module-specific tail.
    None,
    /// STX2 tail.
    Stx2(Stx2SysId),
    /// BSM tail.
    Bsm(BsmSysId),
}

/// System identification data: module type, firmware/logic versions, and a
/// module-specific tail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SysId {
    /// Module type.
    pub module_type: ModuleType,
    /// Module hardware version.
    pub module_version: u16,
    /// Firmware version.
    pub firmware_version: u16,
    /// Control board logic version.
    pub ctrl_board_logic_version: u16,
    /// Module-specific tail.
    pub data: SysIdData,
}
