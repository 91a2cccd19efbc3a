//! Protocol-wide constants: sizes, the magic number, and the radar-network
//! address-space conventions documented for users of the wire format.
//!
//! None of the address-space constants are consulted by the codec; they're
//! carried here, as in `arcp.h`, purely for callers that need to derive a
//! module's IP or MAC address from its ARCP network address.

/// The 4-byte ASCII magic number ("ARCP") that opens every frame.
pub const MAGIC: u32 = 0x4152_4350;

/// Default TCP port ARCP-enabled modules listen on.
pub const TCP_PORT: u16 = 49490;

/// Maximum size of an ARCP message, in bytes, including the header.
pub const MAX_MSG_SIZE: usize = 1024;

/// Size of the fixed ARCP header, in bytes.
pub const HEADER_SIZE: usize = 11;

/// Maximum size of a pulse code, in bits.
pub const MAX_PULSECODE_SIZE: u16 = 512;

/// Maximum number of entries in a pulse sequence.
pub const MAX_PULSESEQ_LEN: u16 = 1024;

/// Maximum number of entries in a phase table.
pub const MAX_N_PHASES: u16 = 32;

/// Maximum number of chassis fans reported by an STX2.
pub const STX2_MAX_N_CHASSIS_FANS: u8 = 8;

/// Maximum number of RF cards reported by an STX2.
pub const STX2_MAX_N_RF_CARDS: u8 = 9;

/// Maximum number of outputs an STX2 RF card is expected to have.
pub const STX2_MAX_N_RF_CARD_OUTPUTS: u8 = 8;

/// Maximum number of STX2 units possible on a single controller card.
pub const STX2_MAX_N_UNITS: u8 = 10;

/// Maximum number of temperatures in an STX2 external-combiner status.
pub const STX2_EXTCOMB_MAX_N_TEMPERATURES: u8 = 4;

/// Maximum number of outputs on an STX2 external-combiner unit.
pub const STX2_EXTCOMB_MAX_N_OUTPUTS: u8 = 6;

/// Maximum number of fans reported by a BSM.
pub const BSM_MAX_N_FANS: u8 = 8;

/// Maximum number of heatsink temperatures reported by a BSM.
pub const BSM_MAX_N_TEMPERATURES: u8 = 8;

/// Protocol version 1.0, encoded as `(major << 8) | minor`.
pub const VERSION_1_0: u16 = 0x0100;

/// Protocol version 1.1, encoded as `(major << 8) | minor`.
pub const VERSION_1_1: u16 = 0x0101;

/// The highest protocol version this library negotiates.
pub const CURRENT_VERSION: u16 = VERSION_1_1;

/// Radar-network address-space conventions (§1: "documented constants for
/// users", not consulted by the codec).
pub mod address_space {
    /// System PCs.
    pub const CLASS_SYSPC: u16 = 0x0001;
    /// Transmit modules.
    pub const CLASS_TM: u16 = 0x0002;
    /// TM power supplies.
    pub const CLASS_TM_PS: u16 = 0x0003;
    /// RF router: combiner, beam-steering, etc.
    pub const CLASS_RF_ROUTER: u16 = 0x0004;
    /// General support module.
    pub const CLASS_SUPPORT_MOD: u16 = 0x0100;

    /// Base address for the system-PC block.
    pub const SYSPC_ADDR_BASE: u16 = 0x0100;
    /// Address mask for the system-PC block.
    pub const SYSPC_ADDR_MASK: u16 = 0x000f;
    /// Base address for the transmit-module block.
    pub const TM_ADDR_BASE: u16 = 0x1000;
    /// Address mask for the transmit-module block.
    pub const TM_ADDR_MASK: u16 = 0x00ff;
    /// Base address for the TM power-supply block.
    pub const TM_PS_ADDR_BASE: u16 = 0x1200;
    /// Address mask for the TM power-supply block.
    pub const TM_PS_ADDR_MASK: u16 = 0x00ff;
    /// Base address for the TM router block.
    pub const TM_ROUTER_ADDR_BASE: u16 = 0x1400;
    /// Address mask for the TM router block.
    pub const TM_ROUTER_ADDR_MASK: u16 = 0x00ff;
    /// Base address for the support-module block.
    pub const SUPPORT_MOD_BASE: u16 = 0x2000;
    /// Address mask for the support-module block.
    pub const SUPPORT_MOD_MASK: u16 = 0x001f;

    /// Fixed upper 16 bits of every radar-network IPv4 address (172.16/16).
    pub const RN_BASE: u32 = 0xac10_0000;
    /// Mask selecting the fixed upper 16 bits of a radar-network address.
    pub const RN_MASK: u32 = 0xffff_0000;

    /// First four octets of the locally-administered MAC prefix used by
    /// radar-network modules; the last two octets carry the ARCP address.
    pub const MAC_BASE: [u8; 4] = [0x42, 0x54, 0x52, 0x44];

    /// Derives the IPv4 address of a module from its ARCP network address.
    pub fn ipv4_of(arcp_addr: u16) -> std::net::Ipv4Addr {
        let word = RN_BASE | u32::from(arcp_addr);
        std::net::Ipv4Addr::new(
            (word >> 24) as u8,
            (word >> 16) as u8,
            (word >> 8) as u8,
            word as u8,
        )
    }

    /// Derives the locally-administered MAC address of a module from its
    /// ARCP network address.
    pub fn mac_of(arcp_addr: u16) -> [u8; 6] {
        let [hi, lo] = arcp_addr.to_be_bytes();
        [
            MAC_BASE[0],
            MAC_BASE[1],
            MAC_BASE[2],
            MAC_BASE[3],
            hi,
            lo,
        ]
    }
}
