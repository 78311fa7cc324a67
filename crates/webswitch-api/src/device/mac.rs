// Static MAC entries and the forwarding table (mac.cgi)

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::MAC_ENTRY_TYPE;
use crate::device::models::{MacAddress, MacTableEntry, StaticMacEntry};
use crate::device::page::{FromRow, INT, PageSpec, Row};
use crate::device::ports::PortRef;
use crate::error::Error;
use crate::form::FormFields;

const STATIC_MAC_PATH: &str = "/mac.cgi?page=static";
const MAC_TABLE_PATH: &str = "/mac.cgi?page=fwd_tbl";

const STATIC_MAC_PAGE: PageSpec = PageSpec::status(STATIC_MAC_PATH, 1);
const MAC_TABLE_PAGE: PageSpec = PageSpec::status(MAC_TABLE_PATH, 1);

// Column 0 of both tables is a running row number.

impl FromRow for StaticMacEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            mac: MacAddress::new(row.cell(1, "MAC")?),
            vlan_id: INT.parse_as(row.cell(2, "VLAN")?).unwrap_or_default(),
            port: row.cell(3, "Port")?.to_owned(),
        })
    }
}

impl FromRow for MacTableEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            mac: MacAddress::new(row.cell(1, "MAC")?),
            vlan_id: INT.parse_as(row.cell(2, "VLAN")?).unwrap_or_default(),
            entry_type: MAC_ENTRY_TYPE.parse_label(row.cell(3, "Type")?)?,
            port: row.cell(4, "Port")?.to_owned(),
        })
    }
}

impl SwitchClient {
    pub async fn list_static_macs(&self) -> Result<Vec<StaticMacEntry>, Error> {
        self.read_rows(&STATIC_MAC_PAGE).await
    }

    /// Learned and static entries of the forwarding database.
    pub async fn list_mac_table(&self) -> Result<Vec<MacTableEntry>, Error> {
        self.read_rows(&MAC_TABLE_PAGE).await
    }

    pub async fn add_static_mac(
        &self,
        mac: &MacAddress,
        vlan_id: u16,
        port: &PortRef,
    ) -> Result<(), Error> {
        check_mac(mac)?;
        let entry = self.resolve_port(port).await?;
        let fields = FormFields::new("add")
            .with("mac", mac)
            .with("vid", vlan_id)
            .with("port", entry.wire_id());
        debug!(%mac, vlan_id, port = %entry.name, "adding static MAC");
        self.submit_form(STATIC_MAC_PATH, &fields).await?;
        Ok(())
    }

    pub async fn delete_static_mac(&self, mac: &MacAddress, vlan_id: u16) -> Result<(), Error> {
        check_mac(mac)?;
        let fields = FormFields::new("del")
            .with("mac", mac)
            .with("vid", vlan_id);
        debug!(%mac, vlan_id, "deleting static MAC");
        self.submit_form(STATIC_MAC_PATH, &fields).await?;
        Ok(())
    }
}

fn check_mac(mac: &MacAddress) -> Result<(), Error> {
    if mac.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidRequest {
            message: format!("malformed MAC address {mac:?}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::MacEntryType;
    use crate::device::page::decode_rows;

    #[test]
    fn decodes_forwarding_table() {
        let body = r#"<table>
            <tr><th>No.</th><th>MAC Address</th><th>VLAN</th><th>Type</th><th>Port</th></tr>
            <tr><td>1</td><td>00-11-22-AA-BB-CC</td><td>1</td><td>Dynamic</td><td>Port 3</td></tr>
            <tr><td>2</td><td>00:11:22:aa:bb:cd</td><td>20</td><td>Static</td><td>Trunk1</td></tr>
        </table>"#;
        let rows: Vec<MacTableEntry> = decode_rows(&MAC_TABLE_PAGE, body).unwrap();
        assert_eq!(rows[0].mac.as_str(), "00:11:22:aa:bb:cc");
        assert_eq!(rows[0].entry_type, MacEntryType::Dynamic);
        assert_eq!(rows[1].vlan_id, 20);
        assert_eq!(rows[1].port, "Trunk1");
    }

    #[test]
    fn decodes_static_entries() {
        let body = r#"<table>
            <tr><th>No.</th><th>MAC Address</th><th>VLAN</th><th>Port</th></tr>
            <tr><td>1</td><td>00-11-22-AA-BB-CC</td><td>10</td><td>Port 2</td></tr>
        </table>"#;
        let rows: Vec<StaticMacEntry> = decode_rows(&STATIC_MAC_PAGE, body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vlan_id, 10);
    }

    #[test]
    fn malformed_mac_is_invalid_request() {
        assert!(matches!(
            check_mac(&MacAddress::new("00:11")),
            Err(Error::InvalidRequest { .. })
        ));
        assert!(check_mac(&MacAddress::new("00-11-22-33-44-55")).is_ok());
    }
}
