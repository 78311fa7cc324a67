// Link aggregation groups (trunk.cgi)
//
// Creating or deleting a group changes the port table (trunks are listed
// after the physical ports), which is one reason the resolver never caches.

use std::collections::BTreeSet;

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::TRUNK_TYPE;
use crate::device::models::TrunkGroup;
use crate::device::page::{FromRow, PageSpec, Row};
use crate::device::ports::{PortKind, PortTable, expand_port_list};
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::IntParser;

const TRUNK_PATH: &str = "/trunk.cgi";
const TRUNK_PAGE: PageSpec = PageSpec::status(TRUNK_PATH, 1);

const GROUP: IntParser<'static> = IntParser::new().trim_prefix("Trunk");

impl FromRow for TrunkGroup {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            id: GROUP.parse_as(row.cell(0, "Group")?).unwrap_or_default(),
            trunk_type: TRUNK_TYPE.parse_label(row.cell(1, "Type")?)?,
            members: expand_port_list(row.cell(2, "Member Ports")?),
        })
    }
}

impl SwitchClient {
    pub async fn list_trunk_groups(&self) -> Result<Vec<TrunkGroup>, Error> {
        self.read_rows(&TRUNK_PAGE).await
    }

    /// Create or replace a trunk group. Members must be physical ports.
    pub async fn set_trunk_group(&self, group: &TrunkGroup) -> Result<(), Error> {
        let table = self.port_table().await?;
        let fields = trunk_form(group, &table)?;
        debug!(group = group.id, members = group.members.len(), "writing trunk group");
        self.submit_form(TRUNK_PATH, &fields).await?;
        Ok(())
    }

    pub async fn delete_trunk_group(&self, id: u8) -> Result<(), Error> {
        let fields = FormFields::new("del").with("group", id);
        debug!(group = id, "deleting trunk group");
        self.submit_form(TRUNK_PATH, &fields).await?;
        Ok(())
    }
}

fn trunk_form(group: &TrunkGroup, table: &PortTable) -> Result<FormFields, Error> {
    let mut members = BTreeSet::new();
    for entry in table.resolve_all(&group.members)? {
        if entry.kind != PortKind::Physical {
            return Err(Error::InvalidRequest {
                message: format!("{} cannot be a member of Trunk{}", entry.name, group.id),
            });
        }
        members.insert(entry.id);
    }

    let mut fields = FormFields::new("add")
        .with("group", group.id)
        .with("type", TRUNK_TYPE.encode(group.trunk_type)?);
    for entry in table.physical() {
        let member = members.contains(&entry.id);
        fields.push(format!("member_{}", entry.wire_id()), u8::from(member));
    }
    Ok(fields)
}
