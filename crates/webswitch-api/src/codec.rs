//! Enumeration codecs: human-readable device states ↔ form wire codes.
//!
//! Each semantic domain (speed/duplex, loop function, ...) gets one static
//! [`EnumCodec`] table. Labels come from the enum's `Display`/`FromStr`
//! (the exact strings the web UI prints); codes are what the CGI forms
//! submit. Unknown labels and unknown codes are errors in both
//! directions. Mapping an unrecognized speed code to `Auto` would
//! silently rewrite user intent on the next apply.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Error;

/// Immutable `{ wire code ↔ value }` table scoped to one domain.
#[derive(Debug)]
pub struct EnumCodec<T: 'static> {
    domain: &'static str,
    entries: &'static [(&'static str, T)],
}

impl<T> EnumCodec<T>
where
    T: Copy + PartialEq + FromStr + Into<&'static str> + 'static,
{
    pub const fn new(domain: &'static str, entries: &'static [(&'static str, T)]) -> Self {
        Self { domain, entries }
    }

    /// Name used in [`Error::Codec`].
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Wire code for `value`.
    ///
    /// Fails when the variant exists in Rust but this device domain has no
    /// code for it.
    pub fn encode(&self, value: T) -> Result<&'static str, Error> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(code, _)| *code)
            .ok_or_else(|| self.error(value.into()))
    }

    /// Value for a wire code (surrounding whitespace ignored).
    pub fn decode(&self, code: &str) -> Result<T, Error> {
        let code = code.trim();
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| *v)
            .ok_or_else(|| self.error(code))
    }

    /// Value for a human label as printed by the web UI.
    pub fn parse_label(&self, label: &str) -> Result<T, Error> {
        let label = label.trim();
        let value = T::from_str(label).map_err(|_| self.error(label))?;
        // Labels outside this domain's table are as unknown as bad codes.
        self.encode(value)?;
        Ok(value)
    }

    /// Human label → wire code.
    pub fn encode_label(&self, label: &str) -> Result<&'static str, Error> {
        self.encode(self.parse_label(label)?)
    }

    /// Wire code → human label.
    pub fn decode_label(&self, code: &str) -> Result<&'static str, Error> {
        self.decode(code).map(Into::into)
    }

    /// Every value this domain knows, in table order.
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// Every wire code, in table order.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    fn error(&self, value: &str) -> Error {
        Error::Codec {
            domain: self.domain,
            value: value.to_owned(),
        }
    }
}

/// Enabled/disabled switches rendered as `Enable`/`Disable` and submitted
/// as `1`/`0`.
#[derive(Debug)]
pub struct ToggleCodec {
    domain: &'static str,
    on: &'static str,
    off: &'static str,
}

impl ToggleCodec {
    pub const fn new(domain: &'static str) -> Self {
        Self {
            domain,
            on: "1",
            off: "0",
        }
    }

    pub fn encode(&self, enabled: bool) -> &'static str {
        if enabled { self.on } else { self.off }
    }

    pub fn decode(&self, code: &str) -> Result<bool, Error> {
        let code = code.trim();
        if code == self.on {
            Ok(true)
        } else if code == self.off {
            Ok(false)
        } else {
            Err(self.error(code))
        }
    }

    pub fn parse_label(&self, label: &str) -> Result<bool, Error> {
        let label = label.trim();
        if ["Enable", "Enabled", "On"]
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
        {
            Ok(true)
        } else if ["Disable", "Disabled", "Off"]
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
        {
            Ok(false)
        } else {
            Err(self.error(label))
        }
    }

    fn error(&self, value: &str) -> Error {
        Error::Codec {
            domain: self.domain,
            value: value.to_owned(),
        }
    }
}

// ── Port settings ────────────────────────────────────────────────────

/// Configured (or negotiated) link speed and duplex.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum SpeedDuplex {
    #[strum(serialize = "Auto")]
    #[serde(rename = "Auto")]
    Auto,
    #[strum(serialize = "10M/Half")]
    #[serde(rename = "10M/Half")]
    Half10M,
    #[strum(serialize = "10M/Full")]
    #[serde(rename = "10M/Full")]
    Full10M,
    #[strum(serialize = "100M/Half")]
    #[serde(rename = "100M/Half")]
    Half100M,
    #[strum(serialize = "100M/Full")]
    #[serde(rename = "100M/Full")]
    Full100M,
    #[strum(serialize = "1000M/Full")]
    #[serde(rename = "1000M/Full")]
    Full1000M,
    #[strum(serialize = "2500M/Full")]
    #[serde(rename = "2500M/Full")]
    Full2500M,
    #[strum(serialize = "5G/Full")]
    #[serde(rename = "5G/Full")]
    Full5G,
    #[strum(serialize = "10G/Full")]
    #[serde(rename = "10G/Full")]
    Full10G,
}

pub static SPEED_DUPLEX: EnumCodec<SpeedDuplex> = EnumCodec::new(
    "speed/duplex",
    &[
        ("0", SpeedDuplex::Auto),
        ("1", SpeedDuplex::Half10M),
        ("2", SpeedDuplex::Full10M),
        ("3", SpeedDuplex::Half100M),
        ("4", SpeedDuplex::Full100M),
        ("5", SpeedDuplex::Full1000M),
        ("6", SpeedDuplex::Full2500M),
        ("7", SpeedDuplex::Full5G),
        ("8", SpeedDuplex::Full10G),
    ],
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum FlowControl {
    Off,
    On,
}

pub static FLOW_CONTROL: EnumCodec<FlowControl> = EnumCodec::new(
    "flow control",
    &[("0", FlowControl::Off), ("1", FlowControl::On)],
);

/// Maximum frame size accepted on all ports (jumbo frame setting).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum FrameSize {
    #[strum(serialize = "1522")]
    #[serde(rename = "1522")]
    Bytes1522,
    #[strum(serialize = "1536")]
    #[serde(rename = "1536")]
    Bytes1536,
    #[strum(serialize = "1552")]
    #[serde(rename = "1552")]
    Bytes1552,
    #[strum(serialize = "9216")]
    #[serde(rename = "9216")]
    Bytes9216,
}

pub static FRAME_SIZE: EnumCodec<FrameSize> = EnumCodec::new(
    "frame size",
    &[
        ("0", FrameSize::Bytes1522),
        ("1", FrameSize::Bytes1536),
        ("2", FrameSize::Bytes1552),
        ("3", FrameSize::Bytes9216),
    ],
);

pub static PORT_STATE: ToggleCodec = ToggleCodec::new("port state");

pub static EEE_STATE: ToggleCodec = ToggleCodec::new("eee");

// ── Loop / STP ───────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum LoopFunction {
    #[strum(serialize = "Off")]
    #[serde(rename = "Off")]
    Off,
    #[strum(serialize = "Loop Detection")]
    #[serde(rename = "Loop Detection")]
    LoopDetection,
    #[strum(serialize = "Loop Prevention")]
    #[serde(rename = "Loop Prevention")]
    LoopPrevention,
    #[strum(serialize = "Spanning Tree")]
    #[serde(rename = "Spanning Tree")]
    SpanningTree,
}

pub static LOOP_FUNCTION: EnumCodec<LoopFunction> = EnumCodec::new(
    "loop function",
    &[
        ("0", LoopFunction::Off),
        ("1", LoopFunction::LoopDetection),
        ("2", LoopFunction::LoopPrevention),
        ("3", LoopFunction::SpanningTree),
    ],
);

pub static LOOP_PORT_STATE: ToggleCodec = ToggleCodec::new("loop port state");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum StpVersion {
    #[strum(serialize = "STP")]
    #[serde(rename = "STP")]
    Stp,
    #[strum(serialize = "RSTP")]
    #[serde(rename = "RSTP")]
    Rstp,
}

pub static STP_VERSION: EnumCodec<StpVersion> = EnumCodec::new(
    "stp version",
    &[("0", StpVersion::Stp), ("1", StpVersion::Rstp)],
);

pub static STP_STATE: ToggleCodec = ToggleCodec::new("stp state");

// ── VLAN ─────────────────────────────────────────────────────────────

/// Per-port membership value of the static VLAN form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum VlanMembership {
    Untagged,
    Tagged,
    #[strum(serialize = "Not Member")]
    #[serde(rename = "Not Member")]
    NotMember,
}

pub static VLAN_MEMBERSHIP: EnumCodec<VlanMembership> = EnumCodec::new(
    "vlan membership",
    &[
        ("0", VlanMembership::Untagged),
        ("1", VlanMembership::Tagged),
        ("2", VlanMembership::NotMember),
    ],
);

/// Which ingress frames a port accepts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum AcceptFrameType {
    All,
    #[strum(serialize = "Tag-only")]
    #[serde(rename = "Tag-only")]
    TagOnly,
    #[strum(serialize = "Untag-only")]
    #[serde(rename = "Untag-only")]
    UntagOnly,
}

pub static ACCEPT_FRAME_TYPE: EnumCodec<AcceptFrameType> = EnumCodec::new(
    "accept frame type",
    &[
        ("0", AcceptFrameType::All),
        ("1", AcceptFrameType::TagOnly),
        ("2", AcceptFrameType::UntagOnly),
    ],
);

// ── Storm control / bandwidth ────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum StormType {
    Broadcast,
    #[strum(serialize = "Known Multicast")]
    #[serde(rename = "Known Multicast")]
    KnownMulticast,
    #[strum(serialize = "Unknown Unicast")]
    #[serde(rename = "Unknown Unicast")]
    UnknownUnicast,
    #[strum(serialize = "Unknown Multicast")]
    #[serde(rename = "Unknown Multicast")]
    UnknownMulticast,
}

pub static STORM_TYPE: EnumCodec<StormType> = EnumCodec::new(
    "storm type",
    &[
        ("1", StormType::Broadcast),
        ("2", StormType::KnownMulticast),
        ("3", StormType::UnknownUnicast),
        ("4", StormType::UnknownMulticast),
    ],
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum BandwidthDirection {
    Ingress,
    Egress,
}

pub static BANDWIDTH_DIRECTION: EnumCodec<BandwidthDirection> = EnumCodec::new(
    "bandwidth direction",
    &[
        ("0", BandwidthDirection::Ingress),
        ("1", BandwidthDirection::Egress),
    ],
);

/// `state` field shared by the storm-control and bandwidth forms.
pub static RATE_LIMIT_STATE: ToggleCodec = ToggleCodec::new("rate limit state");

// ── QoS ──────────────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum QosMode {
    #[strum(serialize = "Port Based")]
    #[serde(rename = "Port Based")]
    PortBased,
    #[strum(serialize = "802.1p")]
    #[serde(rename = "802.1p")]
    Dot1p,
    #[strum(serialize = "DSCP")]
    #[serde(rename = "DSCP")]
    Dscp,
}

pub static QOS_MODE: EnumCodec<QosMode> = EnumCodec::new(
    "qos mode",
    &[
        ("0", QosMode::PortBased),
        ("1", QosMode::Dot1p),
        ("2", QosMode::Dscp),
    ],
);

// ── IGMP ─────────────────────────────────────────────────────────────

pub static IGMP_STATE: ToggleCodec = ToggleCodec::new("igmp snooping");

// ── Trunks / MAC table ───────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TrunkType {
    Static,
    #[strum(serialize = "LACP")]
    #[serde(rename = "LACP")]
    Lacp,
}

pub static TRUNK_TYPE: EnumCodec<TrunkType> = EnumCodec::new(
    "trunk type",
    &[("0", TrunkType::Static), ("1", TrunkType::Lacp)],
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum MacEntryType {
    Dynamic,
    Static,
}

pub static MAC_ENTRY_TYPE: EnumCodec<MacEntryType> = EnumCodec::new(
    "mac entry type",
    &[("0", MacEntryType::Dynamic), ("1", MacEntryType::Static)],
);
