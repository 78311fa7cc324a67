// webswitch-api: Async Rust client for switches managed through a CGI web UI
//
// The device has no API, only HTML pages. This crate treats them as one:
// cookie pseudo-auth and session checks (`client`), typed extraction from
// markup (`markup`), wire-code tables (`codec`), port name resolution and
// one adapter per configuration page (`device`).

pub mod auth;
pub mod client;
pub mod codec;
pub mod device;
pub mod error;
pub mod form;
pub mod markup;
pub mod transport;

pub use auth::{Credentials, SessionState};
pub use client::SwitchClient;
pub use device::models::{
    BandwidthEntry, IgmpPortState, IgmpSnooping, LoopPortSetting, LoopPortStatus, LoopProtocol,
    MacAddress, MacTableEntry, PortPriority, PortSettings, PortSettingsUpdate, PortVlanSettings,
    QosSettings, QueueWeight, StaticMacEntry, StormControlEntry, StpGlobalSettings,
    StpPortSettings, StpRootBridge, SystemInfo, TrunkGroup, Vlan,
};
pub use device::{PortEntry, PortKind, PortRef, PortTable, expand_port_list};
pub use error::Error;
pub use form::FormFields;
pub use transport::{ClientConfig, CommitPolicy};
pub use tokio_util::sync::CancellationToken;
