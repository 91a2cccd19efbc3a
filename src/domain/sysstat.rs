//! System status data, returned by `GET_SYSSTAT`.

use crate::constants::{
    BSM_MAX_N_FANS, BSM_MAX_N_TEMPERATURES, STX2_EXTCOMB_MAX_N_OUTPUTS,
    STX2_EXTCOMB_MAX_N_TEMPERATURES, STX2_MAX_N_CHASSIS_FANS, STX2_MAX_N_RF_CARDS,
    STX2_MAX_N_RF_CARD_OUTPUTS, STX2_MAX_N_UNITS,
};
use crate::domain::module::ModuleType;
use crate::error::{ArcpError, Result};

/// Status of one RF output on an RF card or external-combiner unit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RfOutputStat {
    /// Forward power, in watts.
    pub forward_power: u16,
    /// Return loss.
    pub return_loss: i16,
}

/// Status of one STX2 RF card.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RfCardStat {
    /// Supply rail, in millivolts.
    pub rail_supply: u16,
    /// Heatsink temperature.
    pub heatsink_temp: i16,
    /// Per-output status, capped at
    /// [`crate::constants::STX2_MAX_N_RF_CARD_OUTPUTS`] entries.
    outputs: Vec<RfOutputStat>,
}

impl RfCardStat {
    /// Builds an RF card status, rejecting one with too many outputs.
    pub fn new(rail_supply: u16, heatsink_temp: i16, outputs: Vec<RfOutputStat>) -> Result<Self> {
        if outputs.len() > usize::from(STX2_MAX_N_RF_CARD_OUTPUTS) {
            return Err(ArcpError::Local("RF card has too many outputs"));
        }
        Ok(Self {
            rail_supply,
            heatsink_temp,
            outputs,
        })
    }

    /// The per-output status entries.
    pub fn outputs(&self) -> &[RfOutputStat] {
        &self.outputs
    }
}

/// Status of one externally-connected STX2 unit (combiner/splitter, TR
/// switch, controller, driver, or PA).
///
/// Only the external-combiner/splitter type (`0x01`) carries an extended
/// payload on the wire; every other recognized or unrecognized unit type
/// carries just the common `flags`/`unit_type` pair.
#[derive(Clone, Debug, PartialEq)]
pub enum StxUnitStat {
    /// A unit whose type doesn't carry an extended payload this library
    /// decodes, or one this library doesn't specifically recognize.
    Generic {
        /// Status flags.
        flags: u8,
        /// Raw unit type byte.
        unit_type: u8,
    },
    /// An external combiner/splitter (and TR-switch) unit.
    ExtCombinerSplitter {
        /// Status flags.
        flags: u8,
        /// Per-channel temperatures, capped at
        /// [`crate::constants::STX2_EXTCOMB_MAX_N_TEMPERATURES`] entries.
        temperatures: Vec<i8>,
        /// Per-output status, capped at
        /// [`crate::constants::STX2_EXTCOMB_MAX_N_OUTPUTS`] entries.
        outputs: Vec<RfOutputStat>,
    },
}

impl StxUnitStat {
    /// Wire value for the external-combiner/splitter unit type.
    pub const EXT_COMBINER_SPLITTER_TYPE: u8 = 0x01;

    /// Builds an external-combiner/splitter unit status, rejecting one
    /// whose temperature or output list exceeds the domain maximum.
    pub fn ext_combiner_splitter(
        flags: u8,
        temperatures: Vec<i8>,
        outputs: Vec<RfOutputStat>,
    ) -> Result<Self> {
        if temperatures.len() > usize::from(STX2_EXTCOMB_MAX_N_TEMPERATURES) {
            return Err(ArcpError::Local(
                "external combiner unit has too many temperatures",
            ));
        }
        if outputs.len() > usize::from(STX2_EXTCOMB_MAX_N_OUTPUTS) {
            return Err(ArcpError::Local(
                "external combiner unit has too many outputs",
            ));
        }
        Ok(StxUnitStat::ExtCombinerSplitter {
            flags,
            temperatures,
            outputs,
        })
    }

    /// The unit's status flags, regardless of variant.
    pub fn flags(&self) -> u8 {
        match self {
            StxUnitStat::Generic { flags, .. } => *flags,
            StxUnitStat::ExtCombinerSplitter { flags, .. } => *flags,
        }
    }

    /// The unit's wire type byte, regardless of variant.
    pub fn unit_type(&self) -> u8 {
        match self {
            StxUnitStat::Generic { unit_type, .. } => *unit_type,
            StxUnitStat::ExtCombinerSplitter { .. } => Self::EXT_COMBINER_SPLITTER_TYPE,
        }
    }
}

/// STX2-specific status fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stx2Stat {
    /// Device status bitmap.
    pub status_code: u16,
    /// Size, in bytes, of the chassis-level data that follows (carried
    /// verbatim for forward compatibility; this library does not interpret
    /// it beyond framing the fan-speed array that follows).
    pub chassis_datasize: u8,
    /// Supply rail, in millivolts.
    pub rail_supply: u16,
    /// Auxiliary power rail, in millivolts.
    pub rail_aux: u16,
    /// Ambient temperature.
    pub ambient_temp: i8,
    fan_speed: Vec<u16>,
    /// Bitmap of installed RF cards.
    pub card_map: u16,
    rf_cards: Vec<RfCardStat>,
    units: Vec<StxUnitStat>,
}

impl Stx2Stat {
    /// Builds a status record from its scalar fields, with empty fan,
    /// RF-card, and unit lists. Use the `set_*` methods to populate those.
    pub fn new(
        status_code: u16,
        chassis_datasize: u8,
        rail_supply: u16,
        rail_aux: u16,
        ambient_temp: i8,
        card_map: u16,
    ) -> Self {
        Self {
            status_code,
            chassis_datasize,
            rail_supply,
            rail_aux,
            ambient_temp,
            card_map,
            ..Self::default()
        }
    }

    /// Sets the chassis fan-speed list, rejecting one exceeding
    /// [`crate::constants::STX2_MAX_N_CHASSIS_FANS`] entries.
    pub fn set_fan_speed(&mut self, fan_speed: Vec<u16>) -> Result<()> {
        if fan_speed.len() > usize::from(STX2_MAX_N_CHASSIS_FANS) {
            return Err(ArcpError::Local("too many chassis fans"));
        }
        self.fan_speed = fan_speed;
        Ok(())
    }

    /// Chassis fan speeds.
    pub fn fan_speed(&self) -> &[u16] {
        &self.fan_speed
    }

    /// Sets the RF card status list, rejecting one exceeding
    /// [`crate::constants::STX2_MAX_N_RF_CARDS`] entries.
    pub fn set_rf_cards(&mut self, rf_cards: Vec<RfCardStat>) -> Result<()> {
        if rf_cards.len() > usize::from(STX2_MAX_N_RF_CARDS) {
            return Err(ArcpError::Local("too many RF cards"));
        }
        self.rf_cards = rf_cards;
        Ok(())
    }

    /// RF card statuses.
    pub fn rf_cards(&self) -> &[RfCardStat] {
        &self.rf_cards
    }

    /// Sets the external-unit status list, rejecting one exceeding
    /// [`crate::constants::STX2_MAX_N_UNITS`] entries.
    pub fn set_units(&mut self, units: Vec<StxUnitStat>) -> Result<()> {
        if units.len() > usize::from(STX2_MAX_N_UNITS) {
            return Err(ArcpError::Local("too many external units"));
        }
        self.units = units;
        Ok(())
    }

    /// External unit statuses.
    pub fn units(&self) -> &[StxUnitStat] {
        &self.units
    }
}

/// BSM-specific status fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BsmStat {
    /// Device status bitmap.
    pub status_code: u16,
    /// Supply rail, in millivolts.
    pub rail_supply: u16,
    /// Auxiliary power rail, in millivolts.
    pub rail_aux: u16,
    /// Ambient temperature.
    pub ambient_temp: i8,
    /// Bitmap of installed beam-steering channels.
    pub channel_map: u16,
    fan_speed: Vec<u16>,
    heatsink_temp: Vec<i8>,
}

impl BsmStat {
    /// Builds a status record from its scalar fields, with empty fan and
    /// heatsink-temperature lists. Use the `set_*` methods to populate those.
    pub fn new(
        status_code: u16,
        rail_supply: u16,
        rail_aux: u16,
        ambient_temp: i8,
        channel_map: u16,
    ) -> Self {
        Self {
            status_code,
            rail_supply,
            rail_aux,
            ambient_temp,
            channel_map,
            ..Self::default()
        }
    }

    /// Sets the fan-speed list, rejecting one exceeding
    /// [`crate::constants::BSM_MAX_N_FANS`] entries.
    pub fn set_fan_speed(&mut self, fan_speed: Vec<u16>) -> Result<()> {
        if fan_speed.len() > usize::from(BSM_MAX_N_FANS) {
            return Err(ArcpError::Local("too many fans"));
        }
        self.fan_speed = fan_speed;
        Ok(())
    }

    /// Fan speeds.
    pub fn fan_speed(&self) -> &[u16] {
        &self.fan_speed
    }

    /// Sets the heatsink-temperature list, rejecting one exceeding
    /// [`crate::constants::BSM_MAX_N_TEMPERATURES`] entries.
    pub fn set_heatsink_temp(&mut self, heatsink_temp: Vec<i8>) -> Result<()> {
        if heatsink_temp.len() > usize::from(BSM_MAX_N_TEMPERATURES) {
            return Err(ArcpError::Local("too many heatsink temperatures"));
        }
        self.heatsink_temp = heatsink_temp;
        Ok(())
    }

    /// Heatsink temperatures.
    pub fn heatsink_temp(&self) -> &[i8] {
        &self.heatsink_temp
    }
}

/// The module-specific tail of a [`SysStat`]. Absent when the module type is
/// neither STX2 nor BSM.
#[derive(Clone, Debug, PartialEq)]
pub enum SysStatData {
    /// No module-specific tail.
    None,
    /// STX2 tail.
    Stx2(Stx2Stat),
    /// BSM tail.
    Bsm(BsmStat),
}

/// System status data: module type, a coarse status code, and a
/// module-specific tail.
#[derive(Clone, Debug, PartialEq)]
pub struct SysStat {
    /// Module type.
    pub module_type: ModuleType,
    /// Coarse module status.
    pub module_status: i8,
    /// Module-specific tail.
    pub data: SysStatData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rf_card_rejects_too_many_outputs() {
        let outputs = vec![RfOutputStat::default(); 9];
        assert!(RfCardStat::new(0, 0, outputs).is_err());
    }

    #[test]
    fn ext_combiner_rejects_too_many_temperatures() {
        let temps = vec![0i8; 5];
        assert!(StxUnitStat::ext_combiner_splitter(0, temps, Vec::new()).is_err());
    }

    #[test]
    fn ext_combiner_unit_type_is_fixed() {
        let unit = StxUnitStat::ext_combiner_splitter(0, vec![1, 2], Vec::new()).unwrap();
        assert_eq!(unit.unit_type(), StxUnitStat::EXT_COMBINER_SPLITTER_TYPE);
    }

    #[test]
    fn stx2_stat_rejects_too_many_fans() {
        let mut stat = Stx2Stat::default();
        assert!(stat.set_fan_speed(vec![0; 9]).is_err());
    }
}
