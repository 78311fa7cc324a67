use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{BANDWIDTH_DIRECTION, BandwidthDirection, RATE_LIMIT_STATE};
use crate::device::models::BandwidthEntry;
use crate::device::page::{FromRow, PageSpec, Row, optional_u32, push_port_ids};
use crate::device::ports::PortRef;
use crate::error::Error;
use crate::form::FormFields;

const BANDWIDTH_PATH: &str = "/qos.cgi?page=bandwidth";
const BANDWIDTH_PAGE: PageSpec = PageSpec::status(BANDWIDTH_PATH, 1);

impl FromRow for BandwidthEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            ingress_rate: optional_u32(row.cell(1, "Ingress Rate")?),
            egress_rate: optional_u32(row.cell(2, "Egress Rate")?),
        })
    }
}

impl SwitchClient {
    pub async fn read_bandwidth_control(&self) -> Result<Vec<BandwidthEntry>, Error> {
        self.read_rows(&BANDWIDTH_PAGE).await
    }

    /// Rate-limit one direction on `ports`; `None` removes the limit.
    pub async fn set_bandwidth_control(
        &self,
        ports: &[PortRef],
        direction: BandwidthDirection,
        rate: Option<u32>,
    ) -> Result<(), Error> {
        let direction_code = BANDWIDTH_DIRECTION.encode(direction)?;
        let targets = self.resolve_targets(ports).await?;

        let mut fields = FormFields::new("bandwidth");
        push_port_ids(&mut fields, &targets);
        fields
            .push("type", direction_code)
            .push("state", RATE_LIMIT_STATE.encode(rate.is_some()))
            .push("rate", rate.unwrap_or(0));
        debug!(%direction, ?rate, ports = targets.len(), "setting bandwidth control");
        self.submit_form(BANDWIDTH_PATH, &fields).await?;
        Ok(())
    }
}
