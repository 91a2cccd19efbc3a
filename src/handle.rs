//! L5: the exchange engine. A [`Handle`] wraps a transport and correlates
//! commands with their responses, negotiating a protocol version per
//! connection.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU16, Ordering};

use crate::codec::{Command, CommandId, Header, Message, MsgType, Response, ResponseId};
use crate::constants::CURRENT_VERSION;
use crate::domain::phase::PhaseTable;
use crate::domain::pulse::{Pulse, PulseSequence};
use crate::domain::sysid::SysId;
use crate::domain::sysstat::SysStat;
use crate::domain::trigger::TriggerParams;
use crate::error::{ArcpError, Result};
use crate::framing::{read_frame, write_arcp_frame, Frame, FrameMode};

// Global across every handle in the process: exchange IDs only need to be
// unique per connection in practice, but a shared counter is simpler and
// costs nothing.
static EXCHANGE_ID: AtomicU16 = AtomicU16::new(0);

fn next_exchange_id() -> u16 {
    EXCHANGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Outcome of a [`Handle::get_sysid`]/[`Handle::get_sysstat`] exchange.
///
/// The matching data response, a NAK, or an UNK are all accepted responses
/// to a system-info request, the same whitelist `arcp_do_get_sys_info`
/// applies (`expected_resp_id | NAK | UNK`). Only an ID outside that
/// whitelist is an [`ArcpError::BadResponse`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SysInfo<T> {
    /// The requested record.
    Data(T),
    /// The peer rejected the request.
    Nak {
        /// Peer-supplied info code.
        info_code: i16,
    },
    /// The peer didn't recognize the request.
    Unk {
        /// Peer-supplied info code.
        info_code: i16,
    },
}

/// A correlated ARCP connection over any `Read + Write` transport (a TCP
/// stream, a mock duplex pipe in tests, or a serial port).
///
/// A `Handle` allows one outstanding exchange at a time; it is not `Sync`
/// across concurrent use from multiple threads against the same connection.
pub struct Handle<S> {
    stream: S,
    protocol_version: u16,
}

impl<S: Read + Write> Handle<S> {
    /// Wraps `stream` in a new handle, assuming the highest protocol
    /// version this library speaks until a peer's response clamps it down.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            protocol_version: CURRENT_VERSION,
        }
    }

    /// The protocol version currently negotiated for this connection.
    pub fn protocol_version(&self) -> u16 {
        self.protocol_version
    }

    /// Access to the underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutable access to the underlying transport.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn write_message(&mut self, msg: &Message) -> Result<()> {
        let body = msg.encode()?;
        let wire_len = msg.wire_len()?;
        log::trace!(
            "writing {:?} message, exchange_id={}",
            msg.header().msg_type,
            msg.header().exchange_id
        );
        write_arcp_frame(&mut self.stream, &body, wire_len)
    }

    fn read_message(&mut self) -> Result<Message> {
        match read_frame(&mut self.stream, FrameMode::Arcp)? {
            Frame::Arcp(body) => Message::decode(&body),
            Frame::Ascii(line) => Err(ArcpError::BadMsg(format!(
                "expected an ARCP frame, got an ASCII line ({:?})",
                line
            ))),
        }
    }

    /// Sends `command` and waits for the correlated response, clamping this
    /// connection's negotiated protocol version downward if the peer
    /// reports an older one.
    fn exchange(&mut self, command: Command) -> Result<Response> {
        let exchange_id = next_exchange_id();
        let cmd_header = Header {
            exchange_id,
            msg_type: MsgType::Command,
            protocol_version: self.protocol_version,
        };
        self.write_message(&Message::Command(cmd_header, command))?;

        let msg = self.read_message()?;
        let (resp_header, response) = match msg {
            Message::Response(h, r) => (h, r),
            Message::Command(..) => return Err(ArcpError::NotResp),
        };

        if resp_header.exchange_id != exchange_id {
            return Err(ArcpError::Sequence {
                expected: exchange_id,
                got: resp_header.exchange_id,
            });
        }
        if cmd_header.protocol_version < resp_header.protocol_version {
            return Err(ArcpError::BadProtoVer {
                command: cmd_header.protocol_version,
                response: resp_header.protocol_version,
            });
        }
        // Never ratchet the version up: only ever settle on the lower of
        // what we asked for and what the peer actually speaks.
        if resp_header.protocol_version < self.protocol_version {
            self.protocol_version = resp_header.protocol_version;
        }
        log::debug!(
            "exchange {} complete: {:?}",
            exchange_id,
            response.id()
        );
        Ok(response)
    }

    /// Resets the module. Valid responses: ACK, NAK.
    pub fn reset(&mut self) -> Result<Response> {
        let resp = self.exchange(Command::Reset)?;
        match resp.id() {
            ResponseId::Ack | ResponseId::Nak => Ok(resp),
            _ => Err(bad_response(CommandId::Reset, &resp)),
        }
    }

    /// Checks the module is alive. The only valid response is ACK.
    pub fn ping(&mut self) -> Result<Response> {
        let resp = self.exchange(Command::Ping)?;
        match resp.id() {
            ResponseId::Ack => Ok(resp),
            _ => Err(bad_response(CommandId::Ping, &resp)),
        }
    }

    /// Requests the module's system identification record. A NAK or UNK is
    /// a legitimate protocol outcome, not a [`BadResponse`](ArcpError::BadResponse)
    /// error, so it is returned as [`SysInfo::Nak`]/[`SysInfo::Unk`] rather
    /// than an `Err`.
    pub fn get_sysid(&mut self) -> Result<SysInfo<SysId>> {
        let resp = self.exchange(Command::GetSysId)?;
        match resp {
            Response::SysId { sysid, .. } => Ok(SysInfo::Data(sysid)),
            Response::Nak { info_code } => Ok(SysInfo::Nak { info_code }),
            Response::Unk { info_code } => Ok(SysInfo::Unk { info_code }),
            _ => Err(bad_response(CommandId::GetSysId, &resp)),
        }
    }

    /// Requests the module's system status record. A NAK or UNK is a
    /// legitimate protocol outcome, not a [`BadResponse`](ArcpError::BadResponse)
    /// error, so it is returned as [`SysInfo::Nak`]/[`SysInfo::Unk`] rather
    /// than an `Err`.
    pub fn get_sysstat(&mut self) -> Result<SysInfo<SysStat>> {
        let resp = self.exchange(Command::GetSysStat)?;
        match resp {
            Response::SysStat { sysstat, .. } => Ok(SysInfo::Data(sysstat)),
            Response::Nak { info_code } => Ok(SysInfo::Nak { info_code }),
            Response::Unk { info_code } => Ok(SysInfo::Unk { info_code }),
            _ => Err(bad_response(CommandId::GetSysStat, &resp)),
        }
    }

    /// Enables or disables the module.
    pub fn set_module_enable(&mut self, enable: bool) -> Result<Response> {
        let resp = self.exchange(Command::SetModuleEnable { enable })?;
        match resp.id() {
            ResponseId::Ack | ResponseId::Nak | ResponseId::Unk => Ok(resp),
            _ => Err(bad_response(CommandId::SetModuleEnable, &resp)),
        }
    }

    /// Programs a pulse-parameter table slot.
    pub fn set_pulse_param(&mut self, pulse_map_index: u8, pulse: Pulse) -> Result<Response> {
        let resp = self.exchange(Command::SetPulseParam {
            pulse_map_index,
            pulse,
        })?;
        validate_nak_or(resp, CommandId::SetPulseParam, &[ResponseId::Ack, ResponseId::Unk])
    }

    /// Programs the module's pulse sequence.
    pub fn set_pulse_seq(&mut self, seq: PulseSequence) -> Result<Response> {
        let resp = self.exchange(Command::SetPulseSeq { seq })?;
        validate_nak_or(resp, CommandId::SetPulseSeq, &[ResponseId::Ack, ResponseId::Unk])
    }

    /// Selects the active pulse-sequence index.
    pub fn set_pulse_seq_index(&mut self, seq_index: u16) -> Result<Response> {
        let resp = self.exchange(Command::SetPulseSeqIndex { seq_index })?;
        match resp.id() {
            ResponseId::Ack | ResponseId::Nak | ResponseId::Unk => Ok(resp),
            _ => Err(bad_response(CommandId::SetPulseSeqIndex, &resp)),
        }
    }

    /// Programs trigger parameters.
    pub fn set_trig_param(&mut self, trig: TriggerParams) -> Result<Response> {
        let resp = self.exchange(Command::SetTrigParam { trig })?;
        validate_nak_or(resp, CommandId::SetTrigParam, &[ResponseId::Ack, ResponseId::Unk])
    }

    /// Enables or disables user control of the module.
    pub fn set_usrctl_enable(&mut self, enable: bool) -> Result<Response> {
        let resp = self.exchange(Command::SetUsrCtlEnable { enable })?;
        match resp.id() {
            ResponseId::Ack | ResponseId::Nak | ResponseId::Unk => Ok(resp),
            _ => Err(bad_response(CommandId::SetUsrCtlEnable, &resp)),
        }
    }

    /// Programs a beam-steering phase table. Only valid for protocol
    /// version 1.1 and later; on an older negotiated connection this
    /// returns a synthetic UNK response without touching the wire, exactly
    /// as an old slave would respond to an unrecognized command.
    pub fn set_phase(&mut self, phase_slot: u16, phases: PhaseTable) -> Result<Response> {
        if self.protocol_version < crate::constants::VERSION_1_1 {
            return Ok(Response::Unk { info_code: 0 });
        }
        let resp = self.exchange(Command::SetPhase {
            phase_slot,
            phases,
        })?;
        validate_nak_or(resp, CommandId::SetPhase, &[ResponseId::Ack, ResponseId::Unk])
    }

    /// Reads the next command addressed to this handle, for slave-side use.
    pub fn read_command(&mut self) -> Result<(Header, Command)> {
        match self.read_message()? {
            Message::Command(header, command) => Ok((header, command)),
            Message::Response(..) => Err(ArcpError::NotCmd),
        }
    }

    fn send_response(&mut self, cmd_header: &Header, response: Response) -> Result<()> {
        if cmd_header.msg_type != MsgType::Command {
            return Err(ArcpError::Internal(
                "send_response called with a response header",
            ));
        }
        // A slave backs its negotiated version down to match an older
        // master, the same rule `exchange` applies on the master side.
        if cmd_header.protocol_version < self.protocol_version {
            self.protocol_version = cmd_header.protocol_version;
        }
        let resp_header = Header {
            exchange_id: cmd_header.exchange_id,
            msg_type: MsgType::Response,
            protocol_version: self.protocol_version,
        };
        self.write_message(&Message::Response(resp_header, response))
    }

    /// Slave-side: acknowledges `cmd_header`.
    pub fn send_ack(&mut self, cmd_header: &Header) -> Result<()> {
        self.send_response(cmd_header, Response::Ack { info_code: 0 })
    }

    /// Slave-side: rejects `cmd_header` with `info_code`.
    pub fn send_nak(&mut self, cmd_header: &Header, info_code: i16) -> Result<()> {
        self.send_response(cmd_header, Response::Nak { info_code })
    }

    /// Slave-side: reports that `cmd_header`'s command wasn't recognized.
    pub fn send_unk(&mut self, cmd_header: &Header) -> Result<()> {
        self.send_response(cmd_header, Response::Unk { info_code: 0 })
    }

    /// Slave-side: answers a `GET_SYSID` command.
    pub fn send_sysid(&mut self, cmd_header: &Header, sysid: SysId) -> Result<()> {
        self.send_response(
            cmd_header,
            Response::SysId {
                info_code: 0,
                sysid,
            },
        )
    }

    /// Slave-side: answers a `GET_SYSSTAT` command.
    pub fn send_sysstat(&mut self, cmd_header: &Header, sysstat: SysStat) -> Result<()> {
        self.send_response(
            cmd_header,
            Response::SysStat {
                info_code: 0,
                sysstat,
            },
        )
    }
}

fn bad_response(command: CommandId, response: &Response) -> ArcpError {
    ArcpError::BadResponse {
        command: command.to_wire(),
        response: response.id().to_wire(),
    }
}

/// Common validation for "set parameter" style commands: a NAK whose
/// `info_code` falls in the protocol-error range (below `ARCP_RESP`, i.e.
/// more negative than -2) is surfaced as the corresponding error rather
/// than a plain `Response::Nak`. Otherwise the response must be ACK or one
/// of `extra_ok`.
fn validate_nak_or(
    resp: Response,
    command: CommandId,
    extra_ok: &[ResponseId],
) -> Result<Response> {
    if let Response::Nak { info_code } = resp {
        if info_code <= -3 {
            return Err(nak_override_error(info_code));
        }
        return Ok(Response::Nak { info_code });
    }
    if resp.id() == ResponseId::Ack || extra_ok.contains(&resp.id()) {
        return Ok(resp);
    }
    Err(bad_response(command, &resp))
}

/// Maps an `info_code` in the protocol-error range to the error it stands
/// for. Codes outside the recognized range are preserved as
/// `UnknownResp` rather than silently coerced.
fn nak_override_error(info_code: i16) -> ArcpError {
    match info_code {
        -128 => ArcpError::Internal("peer reported an internal error"),
        -127 => ArcpError::Local("peer reported a local resource error"),
        -126 => ArcpError::Sequence {
            expected: 0,
            got: 0,
        },
        -125 => ArcpError::BadMsg("peer reported a malformed message".into()),
        -124 => ArcpError::BadProtoVer {
            command: 0,
            response: 0,
        },
        -123 => ArcpError::BadResponse {
            command: 0,
            response: 0,
        },
        -122 => ArcpError::ConnTimeout,
        -121 => ArcpError::ConnDropped,
        -120 => ArcpError::UnknownResp(info_code),
        -119 => ArcpError::NotResp,
        other => ArcpError::UnknownResp(other),
    }
}

