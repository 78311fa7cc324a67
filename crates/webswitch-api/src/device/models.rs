// Device configuration value types
//
// Plain values decoded fresh on every read. They carry no session state
// and can be persisted by callers as-is. `Option` fields are `None` when
// the device shows the setting as off / auto / not applicable, which is
// a different state from zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{
    AcceptFrameType, FlowControl, LoopFunction, MacEntryType, QosMode, SpeedDuplex, StormType,
    StpVersion, TrunkType,
};
use crate::device::ports::PortRef;

// ── System ───────────────────────────────────────────────────────────

/// Contents of the `info.cgi` system information table.
///
/// Everything except the MAC is optional: the rows vary by firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub device_model: Option<String>,
    pub mac_address: Option<MacAddress>,
    pub ip_address: Option<String>,
    pub netmask: Option<String>,
    pub gateway: Option<String>,
    pub firmware_version: Option<String>,
    pub firmware_date: Option<String>,
    pub hardware_version: Option<String>,
}

// ── Ports ────────────────────────────────────────────────────────────

/// One row of the port settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    pub port: String,
    pub enabled: bool,
    pub speed_duplex: SpeedDuplex,
    /// Negotiated speed; `None` while the link is down.
    pub actual_speed_duplex: Option<SpeedDuplex>,
    pub flow_control: FlowControl,
    /// Negotiated flow control; `None` while the link is down.
    pub actual_flow_control: Option<FlowControl>,
}

/// Settings applied to a set of ports in one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettingsUpdate {
    pub enabled: bool,
    pub speed_duplex: SpeedDuplex,
    pub flow_control: FlowControl,
}

// ── VLAN ─────────────────────────────────────────────────────────────

/// A static 802.1Q VLAN.
///
/// Numeric port references are 1-based port numbers; trunk groups are
/// kept by name (`Trunk2`), exactly as the device lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub untagged_ports: Vec<PortRef>,
    #[serde(default)]
    pub tagged_ports: Vec<PortRef>,
}

/// Port-based VLAN settings (PVID and ingress filtering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortVlanSettings {
    pub port: String,
    pub pvid: u16,
    pub accept_frame_type: AcceptFrameType,
}

// ── Loop / STP ───────────────────────────────────────────────────────

/// Loop protection configuration.
///
/// Timers and per-port statuses only exist while the function is
/// [`LoopFunction::LoopPrevention`]; for every other function they are
/// `None`, not zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopProtocol {
    pub function: LoopFunction,
    pub interval_time: Option<u32>,
    pub recover_time: Option<u32>,
    pub port_statuses: Option<Vec<LoopPortStatus>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPortStatus {
    pub port: String,
    pub enabled: bool,
    pub loop_state: String,
    pub loop_status: String,
}

/// Desired loop prevention state for one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPortSetting {
    pub port: PortRef,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpGlobalSettings {
    pub enabled: bool,
    pub version: StpVersion,
    pub priority: u32,
    pub max_age: u32,
    pub hello_time: u32,
    pub forward_delay: u32,
    /// Read-only root bridge status; ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_bridge: Option<StpRootBridge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpRootBridge {
    pub priority: u32,
    pub mac_address: MacAddress,
    pub path_cost: u32,
    /// `None` when this switch is the root.
    pub root_port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpPortSettings {
    pub port: String,
    pub enabled: bool,
    pub state: String,
    pub role: String,
    /// `None` when the path cost is computed automatically.
    pub path_cost: Option<u32>,
    pub priority: u32,
}

// ── Storm control / bandwidth ────────────────────────────────────────

/// Storm-control rates for one port in kbps; `None` means off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StormControlEntry {
    pub port: String,
    /// Line-rate ceiling the device reports for the port.
    pub max_rate: Option<u32>,
    pub broadcast_rate: Option<u32>,
    pub known_multicast_rate: Option<u32>,
    pub unknown_unicast_rate: Option<u32>,
    pub unknown_multicast_rate: Option<u32>,
}

impl StormControlEntry {
    pub fn rate(&self, storm_type: StormType) -> Option<u32> {
        match storm_type {
            StormType::Broadcast => self.broadcast_rate,
            StormType::KnownMulticast => self.known_multicast_rate,
            StormType::UnknownUnicast => self.unknown_unicast_rate,
            StormType::UnknownMulticast => self.unknown_multicast_rate,
        }
    }
}

/// Ingress/egress rate limits for one port in kbps; `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthEntry {
    pub port: String,
    pub ingress_rate: Option<u32>,
    pub egress_rate: Option<u32>,
}

// ── IGMP ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgmpSnooping {
    pub enabled: bool,
    pub report_suppression: bool,
    pub ports: Vec<IgmpPortState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgmpPortState {
    pub port: String,
    pub enabled: bool,
}

// ── QoS ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosSettings {
    pub mode: QosMode,
    pub port_priorities: Vec<PortPriority>,
}

/// Egress queue a port's traffic is mapped to. Queues are 1-based both
/// here and in the QoS forms; only port IDs are shifted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPriority {
    pub port: String,
    pub queue: u8,
}

/// WRR weight of an egress queue (1-based, on the wire too); `None` is
/// strict priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueWeight {
    pub queue: u8,
    pub weight: Option<u32>,
}

// ── MAC tables ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMacEntry {
    pub mac: MacAddress,
    pub vlan_id: u16,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacTableEntry {
    pub mac: MacAddress,
    pub vlan_id: u16,
    pub entry_type: MacEntryType,
    pub port: String,
}

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated or dash-separated hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Six colon-separated hex octets.
    pub fn is_valid(&self) -> bool {
        let octets: Vec<&str> = self.0.split(':').collect();
        octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── Trunks ───────────────────────────────────────────────────────────

/// A link aggregation group. `id` is the 1-based group number
/// (`Trunk1` is group 1); members are physical ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrunkGroup {
    pub id: u8,
    pub trunk_type: TrunkType,
    pub members: Vec<PortRef>,
}
