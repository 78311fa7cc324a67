// Port identity resolution
//
// Maps display names ("Port 3", "Trunk2") to the numeric IDs forms use.
// The table comes from the port settings page and is fetched on every
// call: creating or deleting a trunk group changes it, and a resolver
// that never caches never serves a stale mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::SwitchClient;
use crate::device::page::{FromRow, PageSpec, Row};
use crate::error::Error;

/// The port settings status table; its first column lists every logical
/// port in wire order. Two header rows (group titles, then Config/Actual).
pub(crate) const PORT_PAGE: PageSpec = PageSpec::status("/port.cgi", 2);

const TRUNK_PREFIX: &str = "Trunk";

/// A port as a caller names it: 1-based number or display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    Id(u16),
    Name(String),
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for PortRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<u16>()
            .map_or_else(|_| Self::Name(s.to_owned()), Self::Id))
    }
}

impl From<u16> for PortRef {
    fn from(id: u16) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for PortRef {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|never| match never {})
    }
}

impl From<String> for PortRef {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    Physical,
    Trunk,
}

/// One logical port of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEntry {
    /// 1-based, user-facing.
    pub id: u16,
    pub name: String,
    pub kind: PortKind,
}

impl PortEntry {
    /// 0-based ID used in form field names and values. An entry built
    /// with `id: 0` maps to wire ID 0 rather than wrapping.
    pub fn wire_id(&self) -> u16 {
        self.id.saturating_sub(1)
    }
}

struct PortName(String);

impl FromRow for PortName {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self(row.cell(0, "Port")?.to_owned()))
    }
}

/// Snapshot of the device's port table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortTable {
    entries: Vec<PortEntry>,
}

impl PortTable {
    /// Build from display names in wire order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .zip(1_u16..)
            .map(|(name, id)| {
                let name = name.into();
                let kind = if name.starts_with(TRUNK_PREFIX) {
                    PortKind::Trunk
                } else {
                    PortKind::Physical
                };
                PortEntry { id, name, kind }
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortEntry> {
        self.entries.iter()
    }

    /// Physical ports only (trunk groups excluded).
    pub fn physical(&self) -> impl Iterator<Item = &PortEntry> {
        self.entries.iter().filter(|e| e.kind == PortKind::Physical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based ID for a display name.
    pub fn resolve_id(&self, name: &str) -> Result<u16, Error> {
        let wanted = name.trim();
        self.entries
            .iter()
            .find(|e| e.name == wanted)
            .map(|e| e.id)
            .ok_or_else(|| Error::PortNotFound {
                port: name.to_owned(),
            })
    }

    /// Display name for a 1-based ID.
    pub fn resolve_name(&self, id: u16) -> Result<&str, Error> {
        self.by_id(id)
            .map(|e| e.name.as_str())
            .ok_or_else(|| Error::PortNotFound {
                port: id.to_string(),
            })
    }

    /// Look up a reference by number or by name.
    pub fn resolve(&self, port: &PortRef) -> Result<&PortEntry, Error> {
        let found = match port {
            PortRef::Id(id) => self.by_id(*id),
            PortRef::Name(name) => {
                let wanted = name.trim();
                self.entries.iter().find(|e| e.name == wanted)
            }
        };
        found.ok_or_else(|| Error::PortNotFound {
            port: port.to_string(),
        })
    }

    /// Resolve every reference, failing on the first unknown one.
    pub fn resolve_all<'a>(&'a self, ports: &[PortRef]) -> Result<Vec<&'a PortEntry>, Error> {
        ports.iter().map(|p| self.resolve(p)).collect()
    }

    fn by_id(&self, id: u16) -> Option<&PortEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Expand a device port list (`"1-3,5,Trunk2"`) into references.
///
/// Numeric ranges become individual IDs, named entries are kept
/// verbatim. `"-"` and empty strings mean "no ports".
pub fn expand_port_list(raw: &str) -> Vec<PortRef> {
    let mut ports = Vec::new();
    for token in raw.split(',').map(str::trim) {
        if token.is_empty() || token == "-" {
            continue;
        }
        if let Some((lo, hi)) = token.split_once('-') {
            if let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u16>(), hi.trim().parse::<u16>()) {
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                ports.extend((lo..=hi).map(PortRef::Id));
                continue;
            }
        }
        ports.push(PortRef::from(token));
    }
    ports
}

impl SwitchClient {
    /// Fetch the live port table.
    pub async fn port_table(&self) -> Result<PortTable, Error> {
        let names: Vec<PortName> = self.read_rows(&PORT_PAGE).await?;
        let table = PortTable::from_names(names.into_iter().map(|n| n.0));
        debug!(ports = table.len(), "port table fetched");
        Ok(table)
    }

    /// 1-based ID of the port displayed as `name`.
    pub async fn resolve_port_id(&self, name: &str) -> Result<u16, Error> {
        self.port_table().await?.resolve_id(name)
    }

    /// Display name of the port with 1-based `id`.
    pub async fn resolve_port_name(&self, id: u16) -> Result<String, Error> {
        self.port_table().await?.resolve_name(id).map(str::to_owned)
    }

    pub async fn resolve_port(&self, port: &PortRef) -> Result<PortEntry, Error> {
        self.port_table().await?.resolve(port).cloned()
    }

    /// Resolve the target ports of a port-scoped form against one fresh
    /// table. An empty selection is refused; the forms need at least one
    /// `portid`.
    pub(crate) async fn resolve_targets(&self, ports: &[PortRef]) -> Result<Vec<PortEntry>, Error> {
        if ports.is_empty() {
            return Err(Error::InvalidRequest {
                message: "no ports selected".into(),
            });
        }
        let table = self.port_table().await?;
        let entries = table.resolve_all(ports)?;
        Ok(entries.into_iter().cloned().collect())
    }
}
