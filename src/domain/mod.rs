//! Domain types for ARCP: the request/response payloads, independent of
//! their wire encoding.

pub mod module;
pub mod phase;
pub mod pulse;
pub mod sysid;
pub mod sysstat;
pub mod trigger;

pub use module::ModuleType;
pub use phase::{PhaseEntry, PhaseTable};
pub use pulse::{Pulse, PulseCode, PulseSeqEntry, PulseSequence, PulseShape};
pub use sysid::{BsmSysId, Stx2SysId, SysId, SysIdData};
pub use sysstat::{BsmStat, RfCardStat, RfOutputStat, Stx2Stat, SysStat, SysStatData, StxUnitStat};
pub use trigger::TriggerParams;
