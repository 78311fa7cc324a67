// Storm control (storm.cgi)

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{RATE_LIMIT_STATE, STORM_TYPE, StormType};
use crate::device::models::StormControlEntry;
use crate::device::page::{FromRow, PageSpec, Row, optional_u32, push_port_ids};
use crate::device::ports::PortRef;
use crate::error::Error;
use crate::form::FormFields;

const STORM_PATH: &str = "/storm.cgi";
const STORM_PAGE: PageSpec = PageSpec::status(STORM_PATH, 1);

impl FromRow for StormControlEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        let max_rate = optional_u32(row.cell(1, "Max Rate")?);
        // The firmware shows a disabled class at the port's max rate, so a
        // rate equal to it cannot be told apart from "off" and reads as off.
        let rate = |idx: usize, column: &str| -> Result<Option<u32>, Error> {
            Ok(optional_u32(row.cell(idx, column)?).filter(|r| Some(*r) != max_rate))
        };
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            max_rate,
            broadcast_rate: rate(2, "Broadcast")?,
            known_multicast_rate: rate(3, "Known Multicast")?,
            unknown_unicast_rate: rate(4, "Unknown Unicast")?,
            unknown_multicast_rate: rate(5, "Unknown Multicast")?,
        })
    }
}

impl SwitchClient {
    pub async fn read_storm_control(&self) -> Result<Vec<StormControlEntry>, Error> {
        self.read_rows(&STORM_PAGE).await
    }

    /// Limit one traffic class on `ports` to `rate` kbps, or turn the
    /// limit off with `None`. A rate of `Some(0)` drops the class entirely.
    pub async fn set_storm_control(
        &self,
        ports: &[PortRef],
        storm_type: StormType,
        rate: Option<u32>,
    ) -> Result<(), Error> {
        let mut fields = FormFields::new("storm");
        fields.push("stormType", STORM_TYPE.encode(storm_type)?);
        let targets = self.resolve_targets(ports).await?;

        push_port_ids(&mut fields, &targets);
        fields
            .push("state", RATE_LIMIT_STATE.encode(rate.is_some()))
            .push("rate", rate.unwrap_or(0));
        debug!(%storm_type, ?rate, ports = targets.len(), "setting storm control");
        self.submit_form(STORM_PATH, &fields).await?;
        Ok(())
    }
}
