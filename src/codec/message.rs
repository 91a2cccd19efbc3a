//! L3: the ARCP message codec.
//!
//! A full frame on the wire is `magic(4) | msg_length(2) | exchange_id(2) |
//! msg_type(1) | protocol_version(2) | body`, where `msg_length` counts the
//! whole frame including the 11-byte header. Framing ([`crate::framing`])
//! owns the magic number and length; this module owns everything after it.

use crate::codec::cursor::{Reader, Writer};
use crate::constants::{HEADER_SIZE, MAX_PULSECODE_SIZE, MAX_PULSESEQ_LEN};
use crate::domain::module::ModuleType;
use crate::domain::phase::{PhaseEntry, PhaseTable};
use crate::domain::pulse::{Pulse, PulseCode, PulseSeqEntry, PulseSequence, PulseShape};
use crate::domain::sysid::{BsmSysId, Stx2SysId, SysId, SysIdData};
use crate::domain::sysstat::{
    BsmStat, RfCardStat, RfOutputStat, Stx2Stat, StxUnitStat, SysStat, SysStatData,
};
use crate::domain::trigger::TriggerParams;
use crate::error::{ArcpError, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Whether a message is a command or a response. Unlike [`CommandId`] and
/// [`ResponseId`], this tag has no catch-all: every byte value other than
/// the two defined here is a framing error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MsgType {
    /// A command, sent master to slave.
    Command = 0,
    /// A response, sent slave to master.
    Response = 1,
}

/// The 5-byte portion of the header that follows `magic` and `msg_length`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    /// Exchange correlation ID.
    pub exchange_id: u16,
    /// Command or response.
    pub msg_type: MsgType,
    /// Protocol version the sender is using for this message.
    pub protocol_version: u16,
}

impl Header {
    pub(crate) fn decode(r: &mut Reader) -> Result<Self> {
        let exchange_id = r.u16()?;
        let msg_type_byte = r.u8()?;
        let msg_type = MsgType::try_from_primitive(msg_type_byte)
            .map_err(|_| ArcpError::BadMsg(format!("unknown msg_type {}", msg_type_byte)))?;
        let protocol_version = r.u16()?;
        Ok(Self {
            exchange_id,
            msg_type,
            protocol_version,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<()> {
        w.u16(self.exchange_id)?;
        w.u8(self.msg_type.into())?;
        w.u16(self.protocol_version)
    }
}

/// Command message IDs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandId {
    /// Reset the module.
    Reset,
    /// No-op liveness check.
    Ping,
    /// Request a [`SysId`] response.
    GetSysId,
    /// Request a [`SysStat`] response.
    GetSysStat,
    /// Enable or disable the module.
    SetModuleEnable,
    /// Program a pulse parameter slot.
    SetPulseParam,
    /// Program the pulse sequence.
    SetPulseSeq,
    /// Select the active pulse-sequence index.
    SetPulseSeqIndex,
    /// Program trigger parameters.
    SetTrigParam,
    /// Enable or disable user control.
    SetUsrCtlEnable,
    /// Program a phase table (BSM only, protocol version 1.1+).
    SetPhase,
    /// A command ID this library doesn't recognize.
    Other(i16),
}

impl CommandId {
    pub(crate) fn from_wire(v: i16) -> Self {
        match v {
            0x0000 => CommandId::Reset,
            0x0001 => CommandId::Ping,
            0x0002 => CommandId::GetSysId,
            0x0010 => CommandId::GetSysStat,
            0x0020 => CommandId::SetModuleEnable,
            0x0101 => CommandId::SetPulseParam,
            0x0102 => CommandId::SetPulseSeq,
            0x0103 => CommandId::SetPulseSeqIndex,
            0x0110 => CommandId::SetTrigParam,
            0x01f0 => CommandId::SetUsrCtlEnable,
            0x0200 => CommandId::SetPhase,
            other => CommandId::Other(other),
        }
    }

    pub(crate) fn to_wire(self) -> i16 {
        match self {
            CommandId::Reset => 0x0000,
            CommandId::Ping => 0x0001,
            CommandId::GetSysId => 0x0002,
            CommandId::GetSysStat => 0x0010,
            CommandId::SetModuleEnable => 0x0020,
            CommandId::SetPulseParam => 0x0101,
            CommandId::SetPulseSeq => 0x0102,
            CommandId::SetPulseSeqIndex => 0x0103,
            CommandId::SetTrigParam => 0x0110,
            CommandId::SetUsrCtlEnable => 0x01f0,
            CommandId::SetPhase => 0x0200,
            CommandId::Other(v) => v,
        }
    }
}

/// Response message IDs. Values below [`ResponseId::Unk`]'s wire value are
/// protocol-level error codes, surfaced as [`ArcpError`] rather than as a
/// decoded [`Response`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseId {
    /// The slave didn't recognize the command.
    Unk,
    /// The command was rejected.
    Nak,
    /// The command was accepted.
    Ack,
    /// A [`SysId`] record.
    SysId,
    /// A [`SysStat`] record.
    SysStat,
    /// A response ID this library doesn't recognize.
    Other(i16),
}

impl ResponseId {
    pub(crate) fn from_wire(v: i16) -> Self {
        match v {
            -2 => ResponseId::Unk,
            -1 => ResponseId::Nak,
            0 => ResponseId::Ack,
            0x02 => ResponseId::SysId,
            0x10 => ResponseId::SysStat,
            other => ResponseId::Other(other),
        }
    }

    pub(crate) fn to_wire(self) -> i16 {
        match self {
            ResponseId::Unk => -2,
            ResponseId::Nak => -1,
            ResponseId::Ack => 0,
            ResponseId::SysId => 0x02,
            ResponseId::SysStat => 0x10,
            ResponseId::Other(v) => v,
        }
    }
}

/// A decoded command body (everything in a command message after the ID).
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `RESET`.
    Reset,
    /// `PING`.
    Ping,
    /// `GET_SYSID`.
    GetSysId,
    /// `GET_SYSSTAT`.
    GetSysStat,
    /// `SET_MODULE_ENABLE`.
    SetModuleEnable {
        /// Enable the module.
        enable: bool,
    },
    /// `SET_PULSE_PARAM`.
    SetPulseParam {
        /// Pulse-parameter table slot to program.
        pulse_map_index: u8,
        /// The pulse parameters.
        pulse: Pulse,
    },
    /// `SET_PULSE_SEQ`.
    SetPulseSeq {
        /// The new pulse sequence.
        seq: PulseSequence,
    },
    /// `SET_PULSE_SEQ_IDX`.
    SetPulseSeqIndex {
        /// The sequence index to make active.
        seq_index: u16,
    },
    /// `SET_TRIG_PARAM`.
    SetTrigParam {
        /// The new trigger parameters.
        trig: TriggerParams,
    },
    /// `SET_USRCTL_ENABLE`.
    SetUsrCtlEnable {
        /// Enable user control.
        enable: bool,
    },
    /// `SET_PHASE`.
    SetPhase {
        /// Phase-table slot to program.
        phase_slot: u16,
        /// The phase table.
        phases: PhaseTable,
    },
    /// A command ID this library doesn't recognize. Carries no payload: an
    /// unmatched ID reads no additional fields off the wire.
    Other {
        /// The raw command ID.
        id: i16,
    },
}

impl Command {
    /// This command's wire ID.
    pub fn id(&self) -> CommandId {
        match self {
            Command::Reset => CommandId::Reset,
            Command::Ping => CommandId::Ping,
            Command::GetSysId => CommandId::GetSysId,
            Command::GetSysStat => CommandId::GetSysStat,
            Command::SetModuleEnable { .. } => CommandId::SetModuleEnable,
            Command::SetPulseParam { .. } => CommandId::SetPulseParam,
            Command::SetPulseSeq { .. } => CommandId::SetPulseSeq,
            Command::SetPulseSeqIndex { .. } => CommandId::SetPulseSeqIndex,
            Command::SetTrigParam { .. } => CommandId::SetTrigParam,
            Command::SetUsrCtlEnable { .. } => CommandId::SetUsrCtlEnable,
            Command::SetPhase { .. } => CommandId::SetPhase,
            Command::Other { id } => CommandId::Other(*id),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.i16(self.id().to_wire())?;
        match self {
            Command::Reset
            | Command::Ping
            | Command::GetSysId
            | Command::GetSysStat
            | Command::Other { .. } => Ok(()),
            Command::SetModuleEnable { enable } => w.i8(*enable as i8),
            Command::SetPulseParam {
                pulse_map_index,
                pulse,
            } => encode_pulse_param(w, *pulse_map_index, pulse),
            Command::SetPulseSeq { seq } => encode_pulse_seq(w, seq),
            Command::SetPulseSeqIndex { seq_index } => w.u16(*seq_index),
            Command::SetTrigParam { trig } => encode_trig_param(w, trig),
            Command::SetUsrCtlEnable { enable } => w.i8(*enable as i8),
            Command::SetPhase {
                phase_slot,
                phases,
            } => encode_set_phase(w, *phase_slot, phases),
        }
    }

    fn decode(id: i16, r: &mut Reader) -> Result<Self> {
        Ok(match CommandId::from_wire(id) {
            CommandId::Reset => Command::Reset,
            CommandId::Ping => Command::Ping,
            CommandId::GetSysId => Command::GetSysId,
            CommandId::GetSysStat => Command::GetSysStat,
            CommandId::SetModuleEnable => Command::SetModuleEnable {
                enable: r.i8()? != 0,
            },
            CommandId::SetPulseParam => {
                let (pulse_map_index, pulse) = decode_pulse_param(r)?;
                Command::SetPulseParam {
                    pulse_map_index,
                    pulse,
                }
            }
            CommandId::SetPulseSeq => Command::SetPulseSeq {
                seq: decode_pulse_seq(r)?,
            },
            CommandId::SetPulseSeqIndex => Command::SetPulseSeqIndex {
                seq_index: r.u16()?,
            },
            CommandId::SetTrigParam => Command::SetTrigParam {
                trig: decode_trig_param(r)?,
            },
            CommandId::SetUsrCtlEnable => Command::SetUsrCtlEnable {
                enable: r.i8()? != 0,
            },
            CommandId::SetPhase => {
                let (phase_slot, phases) = decode_set_phase(r)?;
                Command::SetPhase {
                    phase_slot,
                    phases,
                }
            }
            CommandId::Other(id) => Command::Other { id },
        })
    }
}

/// A decoded response body (everything in a response message after the ID
/// and the info code).
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The slave didn't recognize the command.
    Unk {
        /// Slave-supplied info code.
        info_code: i16,
    },
    /// The command was rejected.
    Nak {
        /// Slave-supplied info code, usually an error detail.
        info_code: i16,
    },
    /// The command was accepted.
    Ack {
        /// Slave-supplied info code.
        info_code: i16,
    },
    /// `GET_SYSID` succeeded.
    SysId {
        /// Slave-supplied info code.
        info_code: i16,
        /// The system identification record.
        sysid: SysId,
    },
    /// `GET_SYSSTAT` succeeded.
    SysStat {
        /// Slave-supplied info code.
        info_code: i16,
        /// The system status record.
        sysstat: SysStat,
    },
    /// A response ID this library doesn't recognize. Carries no payload
    /// beyond the info code.
    Other {
        /// The raw response ID.
        id: i16,
        /// Slave-supplied info code.
        info_code: i16,
    },
}

impl Response {
    /// This response's wire ID.
    pub fn id(&self) -> ResponseId {
        match self {
            Response::Unk { .. } => ResponseId::Unk,
            Response::Nak { .. } => ResponseId::Nak,
            Response::Ack { .. } => ResponseId::Ack,
            Response::SysId { .. } => ResponseId::SysId,
            Response::SysStat { .. } => ResponseId::SysStat,
            Response::Other { id, .. } => ResponseId::Other(*id),
        }
    }

    /// This response's info code.
    pub fn info_code(&self) -> i16 {
        match self {
            Response::Unk { info_code }
            | Response::Nak { info_code }
            | Response::Ack { info_code }
            | Response::SysId { info_code, .. }
            | Response::SysStat { info_code, .. } => *info_code,
            Response::Other { info_code, .. } => *info_code,
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.i16(self.id().to_wire())?;
        w.i16(self.info_code())?;
        match self {
            Response::Unk { .. }
            | Response::Nak { .. }
            | Response::Ack { .. }
            | Response::Other { .. } => Ok(()),
            Response::SysId { sysid, .. } => encode_sysid(w, sysid),
            Response::SysStat { sysstat, .. } => encode_sysstat(w, sysstat),
        }
    }

    fn decode(id: i16, r: &mut Reader) -> Result<Self> {
        let info_code = r.i16()?;
        Ok(match ResponseId::from_wire(id) {
            ResponseId::Unk => Response::Unk { info_code },
            ResponseId::Nak => Response::Nak { info_code },
            ResponseId::Ack => Response::Ack { info_code },
            ResponseId::SysId => Response::SysId {
                info_code,
                sysid: decode_sysid(r)?,
            },
            ResponseId::SysStat => Response::SysStat {
                info_code,
                sysstat: decode_sysstat(r)?,
            },
            ResponseId::Other(id) => Response::Other { id, info_code },
        })
    }
}

/// A decoded ARCP message: a header plus its command or response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// A command message.
    Command(Header, Command),
    /// A response message.
    Response(Header, Response),
}

impl Message {
    /// The message's header.
    pub fn header(&self) -> &Header {
        match self {
            Message::Command(h, _) => h,
            Message::Response(h, _) => h,
        }
    }

    /// Encodes this message's header tail and body, everything in the
    /// frame after `magic` and `msg_length`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        match self {
            Message::Command(header, command) => {
                header.encode(&mut w)?;
                command.encode(&mut w)?;
            }
            Message::Response(header, response) => {
                header.encode(&mut w)?;
                response.encode(&mut w)?;
            }
        }
        Ok(w.into_bytes())
    }

    /// Decodes a message from the header tail and body, everything in the
    /// frame after `magic` and `msg_length`.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new(body);
        let header = Header::decode(&mut r)?;
        match header.msg_type {
            MsgType::Command => {
                let id = r.i16()?;
                let command = Command::decode(id, &mut r)?;
                Ok(Message::Command(header, command))
            }
            MsgType::Response => {
                let id = r.i16()?;
                let response = Response::decode(id, &mut r)?;
                Ok(Message::Response(header, response))
            }
        }
    }

    /// The total frame size, including the 11-byte header, that encoding
    /// this message will produce.
    pub fn wire_len(&self) -> Result<u16> {
        let len = match self {
            Message::Command(_, command) => HEADER_SIZE + 2 + command_payload_len(command)?,
            Message::Response(_, response) => HEADER_SIZE + 2 + 2 + response_payload_len(response)?,
        };
        u16::try_from(len).map_err(|_| ArcpError::Local("message exceeds maximum size"))
    }
}

fn command_payload_len(command: &Command) -> Result<usize> {
    Ok(match command {
        Command::Reset | Command::Ping | Command::GetSysId | Command::GetSysStat => 0,
        Command::Other { .. } => 0,
        Command::SetModuleEnable { .. } | Command::SetUsrCtlEnable { .. } => 1,
        Command::SetPulseParam { pulse, .. } => {
            let code_bytes = match &pulse.code {
                Some(code) if code.len() != 0 => 2 + usize::from((code.len() - 1) / 8 + 1),
                _ => 2,
            };
            1 + 1 + 2 + 2 + 4 + code_bytes
        }
        Command::SetPulseSeq { seq } => 2 + seq.len() * 2,
        Command::SetPulseSeqIndex { .. } => 2,
        Command::SetTrigParam { .. } => 6,
        Command::SetPhase { phases, .. } => 2 + 2 + phases.len() * 6,
    })
}

fn response_payload_len(response: &Response) -> Result<usize> {
    Ok(match response {
        Response::Unk { .. } | Response::Nak { .. } | Response::Ack { .. } => 0,
        Response::Other { .. } => 0,
        Response::SysId { sysid, .. } => {
            7 + match sysid.data {
                SysIdData::None => 0,
                SysIdData::Stx2(_) => 6,
                SysIdData::Bsm(_) => 2,
            }
        }
        Response::SysStat { sysstat, .. } => {
            2 + match &sysstat.data {
                SysStatData::None => 0,
                SysStatData::Stx2(stat) => {
                    let mut len = 13 + 2 * stat.fan_speed().len();
                    for card in stat.rf_cards() {
                        len += 5 + 4 * card.outputs().len();
                    }
                    if !stat.units().is_empty() {
                        len += 2 * stat.units().len();
                        for unit in stat.units() {
                            if let StxUnitStat::ExtCombinerSplitter {
                                temperatures,
                                outputs,
                                ..
                            } = unit
                            {
                                len += 2 + temperatures.len() + 4 * outputs.len();
                            }
                        }
                    }
                    len
                }
                SysStatData::Bsm(stat) => {
                    11 + 2 * stat.fan_speed().len() + stat.heatsink_temp().len()
                }
            }
        }
    })
}

fn encode_pulse_param(w: &mut Writer, pulse_map_index: u8, pulse: &Pulse) -> Result<()> {
    w.u8(pulse_map_index)?;
    w.i8(pulse.shape.to_wire())?;
    w.u16(pulse.ampl)?;
    w.u16(pulse.options)?;
    w.u32(pulse.width_ns)?;
    match &pulse.code {
        Some(code) if code.len() != 0 => {
            w.u16(code.len())?;
            w.bytes(code.data())
        }
        _ => w.u16(0),
    }
}

fn decode_pulse_param(r: &mut Reader) -> Result<(u8, Pulse)> {
    let pulse_map_index = r.u8()?;
    let shape = PulseShape::from_wire(r.i8()?);
    let ampl = r.u16()?;
    let options = r.u16()?;
    let width_ns = r.u32()?;
    let len = r.u16()?;
    if len > MAX_PULSECODE_SIZE {
        return Err(ArcpError::BadMsg("pulse code exceeds maximum length".into()));
    }
    let code = if len == 0 {
        None
    } else {
        let nbytes = usize::from((len - 1) / 8 + 1);
        Some(PulseCode::from_raw(len, r.bytes(nbytes)?))
    };
    Ok((
        pulse_map_index,
        Pulse {
            shape,
            ampl,
            options,
            width_ns,
            code,
        },
    ))
}

fn encode_pulse_seq(w: &mut Writer, seq: &PulseSequence) -> Result<()> {
    if seq.len() > usize::from(MAX_PULSESEQ_LEN) {
        return Err(ArcpError::BadMsg("pulse sequence exceeds maximum length".into()));
    }
    w.u16(seq.len() as u16)?;
    for entry in seq.entries() {
        w.u8(entry.slot)?;
        w.u8(entry.flags)?;
    }
    Ok(())
}

fn decode_pulse_seq(r: &mut Reader) -> Result<PulseSequence> {
    let len = r.u16()?;
    if len > MAX_PULSESEQ_LEN {
        return Err(ArcpError::BadMsg("pulse sequence exceeds maximum length".into()));
    }
    let mut entries = Vec::with_capacity(usize::from(len));
    for _ in 0..len {
        let slot = r.u8()?;
        let flags = r.u8()?;
        entries.push(PulseSeqEntry { slot, flags });
    }
    PulseSequence::from_entries(entries)
}

fn encode_trig_param(w: &mut Writer, trig: &TriggerParams) -> Result<()> {
    w.u8(trig.source)?;
    w.u8(trig.ext_options)?;
    w.u16(trig.internal_freq)?;
    w.u16(trig.predelay)
}

fn decode_trig_param(r: &mut Reader) -> Result<TriggerParams> {
    Ok(TriggerParams {
        source: r.u8()?,
        ext_options: r.u8()?,
        internal_freq: r.u16()?,
        predelay: r.u16()?,
    })
}

fn encode_set_phase(w: &mut Writer, phase_slot: u16, phases: &PhaseTable) -> Result<()> {
    w.u16(phase_slot)?;
    w.u16(phases.len() as u16)?;
    for entry in phases.entries() {
        w.u16(entry.channel)?;
        w.f32(entry.phase)?;
    }
    Ok(())
}

fn decode_set_phase(r: &mut Reader) -> Result<(u16, PhaseTable)> {
    use crate::constants::MAX_N_PHASES;

    let phase_slot = r.u16()?;
    let n_phases = r.u16()?;
    if n_phases > MAX_N_PHASES {
        return Err(ArcpError::BadMsg("phase table exceeds maximum length".into()));
    }
    let mut entries = Vec::with_capacity(usize::from(n_phases));
    for _ in 0..n_phases {
        let channel = r.u16()?;
        let phase = r.f32()?;
        entries.push(PhaseEntry { channel, phase });
    }
    Ok((phase_slot, PhaseTable::from_entries(entries)?))
}

fn encode_sysid(w: &mut Writer, sysid: &SysId) -> Result<()> {
    w.i8(sysid.module_type.to_wire())?;
    w.u16(sysid.module_version)?;
    w.u16(sysid.firmware_version)?;
    w.u16(sysid.ctrl_board_logic_version)?;
    match sysid.data {
        SysIdData::Stx2(Stx2SysId {
            card_map,
            pulse_slot_length,
        }) => {
            w.u16(card_map)?;
            w.u32(pulse_slot_length)
        }
        SysIdData::Bsm(BsmSysId { channel_map }) => w.u16(channel_map),
        SysIdData::None => Ok(()),
    }
}

fn decode_sysid(r: &mut Reader) -> Result<SysId> {
    let module_type = ModuleType::from_wire(r.i8()?);
    let module_version = r.u16()?;
    let firmware_version = r.u16()?;
    let ctrl_board_logic_version = r.u16()?;
    let data = match module_type {
        ModuleType::Stx2 => SysIdData::Stx2(Stx2SysId {
            card_map: r.u16()?,
            pulse_slot_length: r.u32()?,
        }),
        ModuleType::Bsm => SysIdData::Bsm(BsmSysId {
            channel_map: r.u16()?,
        }),
        ModuleType::None | ModuleType::Other(_) => SysIdData::None,
    };
    Ok(SysId {
        module_type,
        module_version,
        firmware_version,
        ctrl_board_logic_version,
        data,
    })
}

fn encode_sysstat(w: &mut Writer, sysstat: &SysStat) -> Result<()> {
    w.i8(sysstat.module_type.to_wire())?;
    w.i8(sysstat.module_status)?;
    match &sysstat.data {
        SysStatData::Stx2(stat) => encode_stx2stat(w, stat),
        SysStatData::Bsm(stat) => encode_bsmstat(w, stat),
        SysStatData::None => Ok(()),
    }
}

fn encode_stx2stat(w: &mut Writer, stat: &Stx2Stat) -> Result<()> {
    w.u16(stat.status_code)?;
    w.u8(stat.chassis_datasize)?;
    w.u16(stat.rail_supply)?;
    w.u16(stat.rail_aux)?;
    w.i8(stat.ambient_temp)?;
    w.u8(stat.fan_speed().len() as u8)?;
    for fan in stat.fan_speed() {
        w.u16(*fan)?;
    }
    w.u16(stat.card_map)?;
    w.u8(stat.rf_cards().len() as u8)?;
    for card in stat.rf_cards() {
        w.u16(card.rail_supply)?;
        w.i16(card.heatsink_temp)?;
        w.u8(card.outputs().len() as u8)?;
        for out in card.outputs() {
            w.u16(out.forward_power)?;
            w.i16(out.return_loss)?;
        }
    }
    w.u8(stat.units().len() as u8)?;
    for unit in stat.units() {
        w.u8(unit.flags())?;
        w.u8(unit.unit_type())?;
        if let StxUnitStat::ExtCombinerSplitter {
            temperatures,
            outputs,
            ..
        } = unit
        {
            w.u8(temperatures.len() as u8)?;
            for t in temperatures {
                w.i8(*t)?;
            }
            w.u8(outputs.len() as u8)?;
            for out in outputs {
                w.u16(out.forward_power)?;
                w.i16(out.return_loss)?;
            }
        }
    }
    Ok(())
}

fn encode_bsmstat(w: &mut Writer, stat: &BsmStat) -> Result<()> {
    w.u16(stat.status_code)?;
    w.u16(stat.rail_supply)?;
    w.u16(stat.rail_aux)?;
    w.i8(stat.ambient_temp)?;
    w.u16(stat.channel_map)?;
    w.u8(stat.fan_speed().len() as u8)?;
    for fan in stat.fan_speed() {
        w.u16(*fan)?;
    }
    w.u8(stat.heatsink_temp().len() as u8)?;
    for t in stat.heatsink_temp() {
        w.i8(*t)?;
    }
    Ok(())
}

fn decode_sysstat(r: &mut Reader) -> Result<SysStat> {
    let module_type = ModuleType::from_wire(r.i8()?);
    let module_status = r.i8()?;
    let data = match module_type {
        ModuleType::Stx2 => SysStatData::Stx2(decode_stx2stat(r)?),
        ModuleType::Bsm => SysStatData::Bsm(decode_bsmstat(r)?),
        ModuleType::None | ModuleType::Other(_) => SysStatData::None,
    };
    Ok(SysStat {
        module_type,
        module_status,
        data,
    })
}

fn decode_stx2stat(r: &mut Reader) -> Result<Stx2Stat> {
    use crate::constants::{
        STX2_EXTCOMB_MAX_N_OUTPUTS, STX2_EXTCOMB_MAX_N_TEMPERATURES, STX2_MAX_N_CHASSIS_FANS,
        STX2_MAX_N_RF_CARDS, STX2_MAX_N_RF_CARD_OUTPUTS, STX2_MAX_N_UNITS,
    };

    let status_code = r.u16()?;
    let chassis_datasize = r.u8()?;
    let rail_supply = r.u16()?;
    let rail_aux = r.u16()?;
    let ambient_temp = r.i8()?;

    let n_fans = r.u8()?;
    if n_fans > STX2_MAX_N_CHASSIS_FANS {
        return Err(ArcpError::BadMsg("too many chassis fans in SYSSTAT".into()));
    }
    let mut fan_speed = Vec::with_capacity(usize::from(n_fans));
    for _ in 0..n_fans {
        fan_speed.push(r.u16()?);
    }

    let card_map = r.u16()?;
    let mut stat = Stx2Stat::new(
        status_code,
        chassis_datasize,
        rail_supply,
        rail_aux,
        ambient_temp,
        card_map,
    );
    stat.set_fan_speed(fan_speed)?;

    let n_rf_cards = r.u8()?;
    if n_rf_cards > STX2_MAX_N_RF_CARDS {
        return Err(ArcpError::BadMsg("too many RF cards in SYSSTAT".into()));
    }
    let mut rf_cards = Vec::with_capacity(usize::from(n_rf_cards));
    for _ in 0..n_rf_cards {
        let rail_supply = r.u16()?;
        let heatsink_temp = r.i16()?;
        let n_outputs = r.u8()?;
        if n_outputs > STX2_MAX_N_RF_CARD_OUTPUTS {
            return Err(ArcpError::BadMsg("too many RF card outputs in SYSSTAT".into()));
        }
        let mut outputs = Vec::with_capacity(usize::from(n_outputs));
        for _ in 0..n_outputs {
            outputs.push(RfOutputStat {
                forward_power: r.u16()?,
                return_loss: r.i16()?,
            });
        }
        rf_cards.push(RfCardStat::new(rail_supply, heatsink_temp, outputs)?);
    }
    stat.set_rf_cards(rf_cards)?;

    let n_units = r.u8()?;
    if n_units > STX2_MAX_N_UNITS {
        return Err(ArcpError::BadMsg("too many external units in SYSSTAT".into()));
    }
    let mut units = Vec::with_capacity(usize::from(n_units));
    for _ in 0..n_units {
        let flags = r.u8()?;
        let unit_type = r.u8()?;
        let unit = if unit_type == StxUnitStat::EXT_COMBINER_SPLITTER_TYPE {
            let n_temps = r.u8()?;
            if n_temps > STX2_EXTCOMB_MAX_N_TEMPERATURES {
                return Err(ArcpError::BadMsg(
                    "too many external combiner temperatures in SYSSTAT".into(),
                ));
            }
            let mut temperatures = Vec::with_capacity(usize::from(n_temps));
            for _ in 0..n_temps {
                temperatures.push(r.i8()?);
            }
            let n_outputs = r.u8()?;
            if n_outputs > STX2_EXTCOMB_MAX_N_OUTPUTS {
                return Err(ArcpError::BadMsg(
                    "too many external combiner outputs in SYSSTAT".into(),
                ));
            }
            let mut outputs = Vec::with_capacity(usize::from(n_outputs));
            for _ in 0..n_outputs {
                outputs.push(RfOutputStat {
                    forward_power: r.u16()?,
                    return_loss: r.i16()?,
                });
            }
            StxUnitStat::ext_combiner_splitter(flags, temperatures, outputs)?
        } else {
            StxUnitStat::Generic { flags, unit_type }
        };
        units.push(unit);
    }
    stat.set_units(units)?;

    Ok(stat)
}

fn decode_bsmstat(r: &mut Reader) -> Result<BsmStat> {
    use crate::constants::{BSM_MAX_N_FANS, BSM_MAX_N_TEMPERATURES};

    let mut stat = BsmStat::new(r.u16()?, r.u16()?, r.u16()?, r.i8()?, r.u16()?);

    let n_fans = r.u8()?;
    if n_fans > BSM_MAX_N_FANS {
        return Err(ArcpError::BadMsg("too many fans in SYSSTAT".into()));
    }
    let mut fan_speed = Vec::with_capacity(usize::from(n_fans));
    for _ in 0..n_fans {
        fan_speed.push(r.u16()?);
    }
    stat.set_fan_speed(fan_speed)?;

    let n_temps = r.u8()?;
    if n_temps > BSM_MAX_N_TEMPERATURES {
        return Err(ArcpError::BadMsg(
            "too many heatsink temperatures in SYSSTAT".into(),
        ));
    }
    let mut heatsink_temp = Vec::with_capacity(usize::from(n_temps));
    for _ in 0..n_temps {
        heatsink_temp.push(r.i8()?);
    }
    stat.set_heatsink_temp(heatsink_temp)?;

    Ok(stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(msg_type: MsgType) -> Header {
        Header {
            exchange_id: 7,
            msg_type,
            protocol_version: crate::constants::VERSION_1_1,
        }
    }

    #[test]
    fn ping_round_trips() {
        let msg = Message::Command(header(MsgType::Command), Command::Ping);
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn ack_round_trips() {
        let msg = Message::Response(
            header(MsgType::Response),
            Response::Ack { info_code: 0 },
        );
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn set_pulse_param_with_code_round_trips() {
        let mut code = PulseCode::with_length(12).unwrap();
        code.set_bit(0, true).unwrap();
        code.set_bit(11, true).unwrap();
        let msg = Message::Command(
            header(MsgType::Command),
            Command::SetPulseParam {
                pulse_map_index: 3,
                pulse: Pulse {
                    shape: PulseShape::Square,
                    ampl: 100,
                    options: 0,
                    width_ns: 5000,
                    code: Some(code),
                },
            },
        );
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn monopulse_code_encodes_as_zero_length() {
        let msg = Message::Command(
            header(MsgType::Command),
            Command::SetPulseParam {
                pulse_map_index: 0,
                pulse: Pulse {
                    shape: PulseShape::Empty,
                    ampl: 0,
                    options: 0,
                    width_ns: 0,
                    code: None,
                },
            },
        );
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        match decoded {
            Message::Command(_, Command::SetPulseParam { pulse, .. }) => {
                assert!(pulse.code.is_none());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn sysid_stx2_round_trips() {
        let msg = Message::Response(
            header(MsgType::Response),
            Response::SysId {
                info_code: 0,
                sysid: SysId {
                    module_type: ModuleType::Stx2,
                    module_version: 1,
                    firmware_version: 2,
                    ctrl_board_logic_version: 3,
                    data: SysIdData::Stx2(Stx2SysId {
                        card_map: 0x0f,
                        pulse_slot_length: 123456,
                    }),
                },
            },
        );
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn unknown_command_id_decodes_with_no_payload() {
        let msg = Message::Command(header(MsgType::Command), Command::Other { id: 0x7fff });
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn set_phase_rejects_oversized_phase_count_as_badmsg() {
        // 33 phase entries, one past MAX_N_PHASES, each with valid bytes
        // behind it so the failure can only come from the cap check, not
        // from the reader simply running out of bytes.
        let mut w = Writer::new();
        header(MsgType::Command).encode(&mut w).unwrap();
        w.i16(CommandId::SetPhase.to_wire()).unwrap();
        w.u16(0).unwrap();
        w.u16(33).unwrap();
        for _ in 0..33u16 {
            w.u16(0).unwrap();
            w.f32(0.0).unwrap();
        }
        match Message::decode(&w.into_bytes()) {
            Err(ArcpError::BadMsg(_)) => {}
            other => panic!("expected BadMsg, got {:?}", other),
        }
    }

    #[test]
    fn sysstat_rejects_oversized_ext_combiner_temperature_count_as_badmsg() {
        // One external unit, ext-combiner type, with 5 temperatures (one
        // past STX2_EXTCOMB_MAX_N_TEMPERATURES), each byte present so the
        // failure can only come from the cap check.
        let mut w = Writer::new();
        header(MsgType::Response).encode(&mut w).unwrap();
        w.i16(ResponseId::SysStat.to_wire()).unwrap();
        w.i16(0).unwrap(); // info_code
        w.i8(ModuleType::Stx2.to_wire()).unwrap();
        w.i8(0).unwrap(); // module_status
        w.u16(0).unwrap(); // status_code
        w.u8(7).unwrap(); // chassis_datasize
        w.u16(0).unwrap(); // rail_supply
        w.u16(0).unwrap(); // rail_aux
        w.i8(0).unwrap(); // ambient_temp
        w.u8(0).unwrap(); // n_chassis_fans
        w.u16(0).unwrap(); // card_map
        w.u8(0).unwrap(); // n_rf_cards
        w.u8(1).unwrap(); // n_units
        w.u8(0).unwrap(); // unit flags
        w.u8(StxUnitStat::EXT_COMBINER_SPLITTER_TYPE).unwrap(); // unit_type
        w.u8(5).unwrap(); // n_temperatures, one past the cap of 4
        for _ in 0..5u8 {
            w.i8(0).unwrap();
        }
        w.u8(0).unwrap(); // n_outputs
        match Message::decode(&w.into_bytes()) {
            Err(ArcpError::BadMsg(_)) => {}
            other => panic!("expected BadMsg, got {:?}", other),
        }
    }

    #[test]
    fn wire_len_matches_encoded_length() {
        let msg = Message::Command(header(MsgType::Command), Command::Ping);
        let bytes = msg.encode().unwrap();
        assert_eq!(
            msg.wire_len().unwrap() as usize,
            bytes.len() + HEADER_SIZE - 5
        );
    }
}
