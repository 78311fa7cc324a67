// Device configuration surfaces
//
// One module per web UI page. Each adds inherent methods to
// `SwitchClient`: reads scrape and decode a page, writes resolve and
// encode everything before the first POST so a bad port name or enum
// value never reaches the device as a half-built form.

mod bandwidth;
mod eee;
mod igmp;
mod loop_protection;
mod mac;
pub mod models;
pub(crate) mod page;
mod port;
pub mod ports;
mod qos;
mod storm;
mod stp;
mod system;
mod trunk;
mod vlan;

pub use ports::{PortEntry, PortKind, PortRef, PortTable, expand_port_list};
