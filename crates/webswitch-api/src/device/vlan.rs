// 802.1Q VLANs (vlan.cgi)
//
// The static VLAN form has no "changed ports only" mode: every write
// carries one membership field per port on the device, so the port table
// is enumerated before each submission.

use std::collections::BTreeSet;

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{ACCEPT_FRAME_TYPE, AcceptFrameType, VLAN_MEMBERSHIP, VlanMembership};
use crate::device::models::{PortVlanSettings, Vlan};
use crate::device::page::{FromRow, INT, PageSpec, Row, push_port_ids};
use crate::device::ports::{PortRef, PortTable, expand_port_list};
use crate::error::Error;
use crate::form::FormFields;

const STATIC_VLAN_PATH: &str = "/vlan.cgi?page=static";
const PORT_VLAN_PATH: &str = "/vlan.cgi?page=port_based";

const STATIC_VLAN_PAGE: PageSpec = PageSpec::status(STATIC_VLAN_PATH, 1);
const PORT_VLAN_PAGE: PageSpec = PageSpec::status(PORT_VLAN_PATH, 1);

impl FromRow for Vlan {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        // Column 2 ("Member Ports") is the union of the next two.
        Ok(Self {
            id: INT.parse_as(row.cell(0, "VLAN ID")?).unwrap_or_default(),
            name: row.cell(1, "VLAN Name")?.to_owned(),
            tagged_ports: expand_port_list(row.cell(3, "Tagged Ports")?),
            untagged_ports: expand_port_list(row.cell(4, "Untagged Ports")?),
        })
    }
}

impl FromRow for PortVlanSettings {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            pvid: INT.parse_as(row.cell(1, "PVID")?).unwrap_or_default(),
            accept_frame_type: ACCEPT_FRAME_TYPE.parse_label(row.cell(2, "Accepted Frame Type")?)?,
        })
    }
}

impl SwitchClient {
    pub async fn list_vlans(&self) -> Result<Vec<Vlan>, Error> {
        self.read_rows(&STATIC_VLAN_PAGE).await
    }

    /// The static VLAN `vid`, or `None` if the device has no such VLAN.
    pub async fn read_vlan(&self, vid: u16) -> Result<Option<Vlan>, Error> {
        Ok(self.list_vlans().await?.into_iter().find(|v| v.id == vid))
    }

    /// Create or replace a static VLAN.
    ///
    /// Every port not listed as tagged or untagged is submitted as "not a
    /// member". Unknown ports and ports listed both tagged and untagged
    /// fail before anything is sent.
    pub async fn set_vlan(&self, vlan: &Vlan) -> Result<(), Error> {
        let table = self.port_table().await?;
        let fields = vlan_form(vlan, &table)?;
        debug!(
            vid = vlan.id,
            untagged = vlan.untagged_ports.len(),
            tagged = vlan.tagged_ports.len(),
            "writing static VLAN"
        );
        self.submit_form(STATIC_VLAN_PATH, &fields).await?;
        Ok(())
    }

    pub async fn delete_vlan(&self, vid: u16) -> Result<(), Error> {
        let fields = FormFields::new("del").with(format!("remove_{vid}"), "on");
        debug!(vid, "deleting static VLAN");
        self.submit_form(STATIC_VLAN_PATH, &fields).await?;
        Ok(())
    }

    pub async fn read_port_vlan_settings(&self) -> Result<Vec<PortVlanSettings>, Error> {
        self.read_rows(&PORT_VLAN_PAGE).await
    }

    /// Set PVID and accepted frame type on `ports`.
    pub async fn set_port_vlan(
        &self,
        ports: &[PortRef],
        pvid: u16,
        accept_frame_type: AcceptFrameType,
    ) -> Result<(), Error> {
        let frame_type = ACCEPT_FRAME_TYPE.encode(accept_frame_type)?;
        let targets = self.resolve_targets(ports).await?;

        let mut fields = FormFields::new("pvid");
        push_port_ids(&mut fields, &targets);
        fields.push("pvid", pvid).push("frame_type", frame_type);
        debug!(pvid, %accept_frame_type, ports = targets.len(), "setting port VLAN");
        self.submit_form(PORT_VLAN_PATH, &fields).await?;
        Ok(())
    }
}

fn vlan_form(vlan: &Vlan, table: &PortTable) -> Result<FormFields, Error> {
    let ids = |ports: &[PortRef]| -> Result<BTreeSet<u16>, Error> {
        Ok(table.resolve_all(ports)?.iter().map(|e| e.id).collect())
    };
    let untagged = ids(&vlan.untagged_ports)?;
    let tagged = ids(&vlan.tagged_ports)?;

    if let Some(id) = untagged.intersection(&tagged).next() {
        let name = table.resolve_name(*id)?;
        return Err(Error::InvalidRequest {
            message: format!("{name} is both tagged and untagged in VLAN {}", vlan.id),
        });
    }

    let mut fields = FormFields::new("add")
        .with("vid", vlan.id)
        .with("vname", &vlan.name);
    for entry in table.iter() {
        let membership = if untagged.contains(&entry.id) {
            VlanMembership::Untagged
        } else if tagged.contains(&entry.id) {
            VlanMembership::Tagged
        } else {
            VlanMembership::NotMember
        };
        fields.push(
            format!("vlanPort_{}", entry.wire_id()),
            VLAN_MEMBERSHIP.encode(membership)?,
        );
    }
    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::page::decode_rows;

    fn six_ports() -> PortTable {
        PortTable::from_names((1..=6).map(|i| format!("Port {i}")))
    }

    fn vlan(untagged: Vec<PortRef>, tagged: Vec<PortRef>) -> Vlan {
        vlan_with(10, "lab", untagged, tagged)
    }

    #[test]
    fn every_port_gets_a_membership_field() {
        let v = vlan(vec![PortRef::Id(1), PortRef::Id(2)], vec![PortRef::Id(4)]);
        let fields = vlan_form(&v, &six_ports()).unwrap();

        assert_eq!(fields.get("vid"), Some("10"));
        let membership: Vec<_> = (0..6)
            .map(|wire| fields.get(&format!("vlanPort_{wire}")).unwrap())
            .collect();
        assert_eq!(membership, ["0", "0", "2", "1", "2", "2"]);
    }

    #[test]
    fn overlapping_membership_is_invalid() {
        let v = vlan(vec![PortRef::Id(1), PortRef::Id(2)], vec!["Port 2".into()]);
        let err = vlan_form(&v, &six_ports()).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { ref message } if message.contains("Port 2")));
    }

    #[test]
    fn unknown_port_fails_before_encoding() {
        let v = vlan(vec![PortRef::Id(9)], vec![]);
        assert!(matches!(
            vlan_form(&v, &six_ports()),
            Err(Error::PortNotFound { .. })
        ));
    }

    #[test]
    fn decodes_static_vlan_rows() {
        let body = r#"<html><body><form><table><tr><td>VID <input name="vid"></td></tr></table></form>
            <table>
              <tr><th>VLAN ID</th><th>VLAN Name</th><th>Member Ports</th><th>Tagged Ports</th><th>Untagged Ports</th></tr>
              <tr><td>1</td><td>Default</td><td>1-8</td><td>-</td><td>1-8</td></tr>
              <tr><td>20</td><td>iot</td><td>1,3,Trunk2</td><td>3,Trunk2</td><td>1</td></tr>
            </table></body></html>"#;
        let vlans: Vec<Vlan> = decode_rows(&STATIC_VLAN_PAGE, body).unwrap();
        assert_eq!(vlans.len(), 2);
        assert_eq!(vlans[0].untagged_ports.len(), 8);
        assert!(vlans[0].tagged_ports.is_empty());
        assert_eq!(
            vlans[1],
            vlan_with(20, "iot", vec![PortRef::Id(1)], vec![PortRef::Id(3), "Trunk2".into()])
        );
    }

    fn vlan_with(id: u16, name: &str, untagged: Vec<PortRef>, tagged: Vec<PortRef>) -> Vlan {
        Vlan {
            id,
            name: name.into(),
            untagged_ports: untagged,
            tagged_ports: tagged,
        }
    }

    #[test]
    fn decodes_pvid_rows() {
        let body = r#"<table>
              <tr><th>Port</th><th>PVID</th><th>Accepted Frame Type</th></tr>
              <tr><td>Port 1</td><td>1</td><td>All</td></tr>
              <tr><td>Port 2</td><td>20</td><td>Tag-only</td></tr>
            </table>"#;
        let rows: Vec<PortVlanSettings> = decode_rows(&PORT_VLAN_PAGE, body).unwrap();
        assert_eq!(rows[1].pvid, 20);
        assert_eq!(rows[1].accept_frame_type, AcceptFrameType::TagOnly);
    }
}
