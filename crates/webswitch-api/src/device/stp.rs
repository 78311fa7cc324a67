use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{STP_STATE, STP_VERSION};
use crate::device::models::{MacAddress, StpGlobalSettings, StpPortSettings, StpRootBridge};
use crate::device::page::{
    FromRow, KeyValueTable, PageSpec, Row, optional_u32, parse_u32, push_port_ids,
};
use crate::device::ports::PortRef;
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, STATUS_TABLE, select_named};

const STP_PATH: &str = "/stp.cgi";
const STP_PORT_PATH: &str = "/stp.cgi?page=port";
const STP_PORT_PAGE: PageSpec = PageSpec::status(STP_PORT_PATH, 1);

impl FromRow for StpPortSettings {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            enabled: STP_STATE.parse_label(row.cell(1, "State")?)?,
            state: row.cell(2, "Port State")?.to_owned(),
            role: row.cell(3, "Role")?.to_owned(),
            path_cost: optional_u32(row.cell(4, "Path Cost")?),
            priority: parse_u32(row.cell(5, "Priority")?),
        })
    }
}

impl SwitchClient {
    /// Bridge-wide spanning tree settings plus the current root bridge.
    pub async fn read_stp_global_settings(&self) -> Result<StpGlobalSettings, Error> {
        let body = self.get_page(STP_PATH).await?;
        parse_stp_global(&body)
    }

    /// Write the bridge settings. `root_bridge` is status only and ignored.
    pub async fn set_stp_global_settings(&self, settings: &StpGlobalSettings) -> Result<(), Error> {
        let fields = FormFields::new("stp")
            .with("stp_en", STP_STATE.encode(settings.enabled))
            .with("version", STP_VERSION.encode(settings.version)?)
            .with("priority", settings.priority)
            .with("max_age", settings.max_age)
            .with("hello", settings.hello_time)
            .with("fwd_delay", settings.forward_delay);
        debug!(enabled = settings.enabled, version = %settings.version, "setting STP");
        self.submit_form(STP_PATH, &fields).await?;
        Ok(())
    }

    pub async fn read_stp_port_settings(&self) -> Result<Vec<StpPortSettings>, Error> {
        self.read_rows(&STP_PORT_PAGE).await
    }

    /// Per-port STP participation. A `path_cost` of `None` lets the
    /// device compute it from link speed (submitted as 0).
    pub async fn set_stp_port(
        &self,
        ports: &[PortRef],
        enabled: bool,
        path_cost: Option<u32>,
        priority: u32,
    ) -> Result<(), Error> {
        let targets = self.resolve_targets(ports).await?;
        let mut fields = FormFields::new("stp_port");
        push_port_ids(&mut fields, &targets);
        fields
            .push("state", STP_STATE.encode(enabled))
            .push("path_cost", path_cost.unwrap_or(0))
            .push("priority", priority);
        debug!(ports = targets.len(), enabled, ?path_cost, priority, "setting STP ports");
        self.submit_form(STP_PORT_PATH, &fields).await?;
        Ok(())
    }
}

fn parse_stp_global(body: &str) -> Result<StpGlobalSettings, Error> {
    let doc = Document::parse(body, STP_PATH)?;
    let input = |name: &str| doc.extract_input_value(name).map(|v| parse_u32(&v));

    Ok(StpGlobalSettings {
        enabled: STP_STATE.decode(&doc.extract_selected_value(&select_named("stp_en"))?)?,
        version: STP_VERSION.decode(&doc.extract_selected_value(&select_named("version"))?)?,
        priority: input("priority")?,
        max_age: input("max_age")?,
        hello_time: input("hello")?,
        forward_delay: input("fwd_delay")?,
        root_bridge: root_bridge(&doc)?,
    })
}

/// The status table exists only while STP runs; without a root MAC there
/// is no root to report.
fn root_bridge(doc: &Document) -> Result<Option<StpRootBridge>, Error> {
    let rows = match doc.extract_table(STATUS_TABLE, 0) {
        Ok(rows) => rows,
        Err(Error::FieldNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let table = KeyValueTable::from_rows(rows);
    let Some(mac) = table.get("Root MAC Address") else {
        return Ok(None);
    };

    Ok(Some(StpRootBridge {
        priority: table.get("Root Priority").map(parse_u32).unwrap_or_default(),
        mac_address: MacAddress::new(mac),
        path_cost: table.get("Root Path Cost").map(parse_u32).unwrap_or_default(),
        root_port: table
            .get("Root Port")
            .filter(|p| *p != "-")
            .map(str::to_owned),
    }))
}
