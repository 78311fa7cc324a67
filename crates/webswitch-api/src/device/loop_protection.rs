// Loop protection (loop.cgi)
//
// The page always shows the function select. Timers and the per-port
// table only mean something under Loop Prevention; under any other
// function they are reported as absent rather than zero.

use std::collections::HashMap;

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{LOOP_FUNCTION, LOOP_PORT_STATE, LoopFunction};
use crate::device::models::{LoopPortSetting, LoopPortStatus, LoopProtocol};
use crate::device::page::{FromRow, PageSpec, Row, decode_table, optional_u32};
use crate::device::ports::PortTable;
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, select_named};

const LOOP_PATH: &str = "/loop.cgi";
const LOOP_PAGE: PageSpec = PageSpec::status(LOOP_PATH, 1);

impl FromRow for LoopPortStatus {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            enabled: LOOP_PORT_STATE.parse_label(row.cell(1, "Enable")?)?,
            loop_state: row.cell(2, "Loop State")?.to_owned(),
            loop_status: row.cell(3, "Loop Status")?.to_owned(),
        })
    }
}

impl SwitchClient {
    pub async fn read_loop_protocol(&self) -> Result<LoopProtocol, Error> {
        let body = self.get_page(LOOP_PATH).await?;
        parse_loop_protocol(&body)
    }

    /// Select the loop protection function.
    ///
    /// Timers are sent only when given. Every port receives an enable
    /// field; ports missing from `ports` are disabled. Out-of-range
    /// timers are left for the device to reject.
    pub async fn set_loop_protocol(
        &self,
        function: LoopFunction,
        interval_time: Option<u32>,
        recover_time: Option<u32>,
        ports: &[LoopPortSetting],
    ) -> Result<(), Error> {
        let table = self.port_table().await?;
        let fields = loop_form(function, interval_time, recover_time, ports, &table)?;
        debug!(%function, ?interval_time, ?recover_time, "setting loop protection");
        self.submit_form(LOOP_PATH, &fields).await?;
        Ok(())
    }
}

fn parse_loop_protocol(body: &str) -> Result<LoopProtocol, Error> {
    let doc = Document::parse(body, LOOP_PATH)?;
    let function = LOOP_FUNCTION.decode(&doc.extract_selected_value(&select_named("func"))?)?;

    if function != LoopFunction::LoopPrevention {
        return Ok(LoopProtocol {
            function,
            interval_time: None,
            recover_time: None,
            port_statuses: None,
        });
    }

    Ok(LoopProtocol {
        function,
        interval_time: optional_u32(&doc.extract_input_value("interval")?),
        recover_time: optional_u32(&doc.extract_input_value("recover")?),
        port_statuses: Some(decode_table(&doc, &LOOP_PAGE)?),
    })
}

fn loop_form(
    function: LoopFunction,
    interval_time: Option<u32>,
    recover_time: Option<u32>,
    ports: &[LoopPortSetting],
    table: &PortTable,
) -> Result<FormFields, Error> {
    let mut enabled = HashMap::with_capacity(ports.len());
    for setting in ports {
        enabled.insert(table.resolve(&setting.port)?.id, setting.enabled);
    }

    let mut fields = FormFields::new("loop").with("func", LOOP_FUNCTION.encode(function)?);
    if let Some(interval) = interval_time {
        fields.push("interval", interval);
    }
    if let Some(recover) = recover_time {
        fields.push("recover", recover);
    }
    for entry in table.iter() {
        let on = enabled.get(&entry.id).copied().unwrap_or(false);
        fields.push(format!("lpEn_{}", entry.wire_id()), LOOP_PORT_STATE.encode(on));
    }
    Ok(fields)
}
