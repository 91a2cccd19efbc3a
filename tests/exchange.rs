//! End-to-end exercise of the handle-level exchange API over an in-memory
//! loopback stream: writing a request immediately synthesizes a response,
//! so no threads or sockets are needed.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use arcp::codec::{Message, MsgType, Response};
use arcp::domain::{BsmStat, SysStatData};
use arcp::error::ArcpError;
use arcp::framing::write_arcp_frame;
use arcp::handle::Handle;

/// A duplex stream whose `write` synthesizes a reply via `respond` and
/// queues it for the next `read`.
struct LoopStream<F: FnMut(Message) -> Vec<u8>> {
    inbound: VecDeque<u8>,
    respond: F,
    writes: usize,
}

impl<F: FnMut(Message) -> Vec<u8>> LoopStream<F> {
    fn new(respond: F) -> Self {
        Self {
            inbound: VecDeque::new(),
            respond,
            writes: 0,
        }
    }
}

impl<F: FnMut(Message) -> Vec<u8>> Read for LoopStream<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbound.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl<F: FnMut(Message) -> Vec<u8>> Write for LoopStream<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        // `Handle` always writes a frame's magic+length+body in one call.
        let msg = Message::decode(&buf[6..]).expect("test sent a well-formed frame");
        let reply = (self.respond)(msg);
        self.inbound.extend(reply);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn frame_bytes(msg: &Message) -> Vec<u8> {
    let body = msg.encode().unwrap();
    let wire_len = msg.wire_len().unwrap();
    let mut out = Vec::new();
    write_arcp_frame(&mut out, &body, wire_len).unwrap();
    out
}

fn ack_reply(request: &Message, protocol_version: u16) -> Vec<u8> {
    let header = arcp::codec::Header {
        exchange_id: request.header().exchange_id,
        msg_type: MsgType::Response,
        protocol_version,
    };
    frame_bytes(&Message::Response(header, Response::Ack { info_code: 0 }))
}

#[test]
fn scenario_a_ping_round_trips() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        ack_reply(&req, req.header().protocol_version)
    }));
    let resp = handle.ping().unwrap();
    assert_eq!(resp, Response::Ack { info_code: 0 });
}

#[test]
fn scenario_a_ping_literal_bytes_decode_as_expected() {
    // Command bytes from the literal end-to-end fixture (header tail and
    // body, i.e. everything after magic and msg_length): exchange_id
    // 0x002A, PING.
    let command_hex = [0x00, 0x2A, 0x00, 0x00, 0x01, 0x00, 0x01];
    let msg = Message::decode(&command_hex).unwrap();
    match msg {
        Message::Command(header, command) => {
            assert_eq!(header.exchange_id, 0x002A);
            assert_eq!(header.protocol_version, 0x0001);
            assert_eq!(command.id(), arcp::codec::CommandId::Ping);
        }
        _ => panic!("wrong variant"),
    }

    let response_hex = [0x00, 0x2A, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    let msg = Message::decode(&response_hex).unwrap();
    match msg {
        Message::Response(header, response) => {
            assert_eq!(header.exchange_id, 0x002A);
            assert_eq!(response, Response::Ack { info_code: 0 });
        }
        _ => panic!("wrong variant"),
    }
}

#[test]
fn scenario_b_get_sysstat_bsm_minimal() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let mut bsm = BsmStat::new(0x0000, 5000, 3000, 25, 0x000F);
        bsm.set_fan_speed(vec![1500]).unwrap();
        bsm.set_heatsink_temp(vec![30]).unwrap();
        let sysstat = arcp::domain::SysStat {
            module_type: arcp::domain::ModuleType::Bsm,
            module_status: 0,
            data: SysStatData::Bsm(bsm),
        };
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id,
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(
            header,
            Response::SysStat {
                info_code: 0,
                sysstat,
            },
        ))
    }));

    let sysstat = match handle.get_sysstat().unwrap() {
        arcp::SysInfo::Data(sysstat) => sysstat,
        other => panic!("expected a data response, got {:?}", other),
    };
    match sysstat.data {
        SysStatData::Bsm(bsm) => {
            assert_eq!(bsm.rail_supply, 5000);
            assert_eq!(bsm.fan_speed().len(), 1);
            assert_eq!(bsm.fan_speed()[0], 1500);
        }
        _ => panic!("expected a BSM status"),
    }
}

#[test]
fn get_sysstat_nak_is_not_bad_response() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id,
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(header, Response::Nak { info_code: -200 }))
    }));
    match handle.get_sysstat().unwrap() {
        arcp::SysInfo::Nak { info_code } => assert_eq!(info_code, -200),
        other => panic!("expected SysInfo::Nak, got {:?}", other),
    }
}

#[test]
fn get_sysid_unk_is_not_bad_response() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id,
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(header, Response::Unk { info_code: 0 }))
    }));
    match handle.get_sysid().unwrap() {
        arcp::SysInfo::Unk { info_code } => assert_eq!(info_code, 0),
        other => panic!("expected SysInfo::Unk, got {:?}", other),
    }
}

#[test]
fn scenario_c_set_phase_on_1_0_connection_returns_unk_without_writing() {
    let mut handle = Handle::new(LoopStream::new(|req| ack_reply(&req, 0x0100)));
    // Negotiate down to 1.0 via an ordinary exchange first.
    handle.ping().unwrap();
    assert_eq!(handle.protocol_version(), 0x0100);

    let writes_before = handle.get_ref().writes;
    let resp = handle
        .set_phase(0, arcp::domain::PhaseTable::new())
        .unwrap();
    assert_eq!(resp, Response::Unk { info_code: 0 });
    assert_eq!(
        handle.get_ref().writes,
        writes_before,
        "set_phase must not touch the wire on a 1.0 connection"
    );
}

#[test]
fn scenario_d_correlation_mismatch_returns_sequence_error() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id.wrapping_add(1),
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(header, Response::Ack { info_code: 0 }))
    }));

    match handle.ping() {
        Err(ArcpError::Sequence { .. }) => {}
        other => panic!("expected a Sequence error, got {:?}", other),
    }
}

#[test]
fn scenario_e_resync_after_garbage() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let mut junk = vec![0xFFu8; 37];
        // None of the 37 bytes happen to form the magic number in any
        // 4-byte window.
        for (i, b) in junk.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(17).wrapping_add(1);
        }
        junk.extend(ack_reply(&req, req.header().protocol_version));
        junk
    }));
    let resp = handle.ping().unwrap();
    assert_eq!(resp, Response::Ack { info_code: 0 });
}

#[test]
fn set_module_enable_accepts_unk() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id,
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(header, Response::Unk { info_code: 0 }))
    }));
    let resp = handle.set_module_enable(true).unwrap();
    assert_eq!(resp, Response::Unk { info_code: 0 });
}

#[test]
fn set_usrctl_enable_accepts_ack_and_rejects_unexpected_ids() {
    let mut handle = Handle::new(LoopStream::new(|req| {
        ack_reply(&req, req.header().protocol_version)
    }));
    let resp = handle.set_usrctl_enable(false).unwrap();
    assert_eq!(resp, Response::Ack { info_code: 0 });

    let mut bad_handle = Handle::new(LoopStream::new(|req| {
        let header = arcp::codec::Header {
            exchange_id: req.header().exchange_id,
            msg_type: MsgType::Response,
            protocol_version: req.header().protocol_version,
        };
        frame_bytes(&Message::Response(
            header,
            Response::SysId {
                info_code: 0,
                sysid: arcp::domain::SysId {
                    module_type: arcp::domain::ModuleType::None,
                    module_version: 0,
                    firmware_version: 0,
                    ctrl_board_logic_version: 0,
                    data: arcp::domain::SysIdData::None,
                },
            },
        ))
    }));
    match bad_handle.set_usrctl_enable(true) {
        Err(ArcpError::BadResponse { .. }) => {}
        other => panic!("expected a BadResponse error, got {:?}", other),
    }
}

#[test]
fn scenario_f_oversized_frame_rejected() {
    let mut handle = Handle::new(LoopStream::new(|_req| {
        let mut out = Vec::new();
        out.extend_from_slice(&arcp::constants::MAGIC.to_be_bytes());
        out.extend_from_slice(&2048u16.to_be_bytes());
        out
    }));
    match handle.ping() {
        Err(ArcpError::BadMsg(_)) => {}
        other => panic!("expected a BadMsg error, got {:?}", other),
    }
}
