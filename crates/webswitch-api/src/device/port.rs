// Port settings and jumbo frames (port.cgi)

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{
    FLOW_CONTROL, FRAME_SIZE, FlowControl, FrameSize, PORT_STATE, SPEED_DUPLEX, SpeedDuplex,
};
use crate::device::models::{PortSettings, PortSettingsUpdate};
use crate::device::page::{FromRow, Row, push_port_ids};
use crate::device::ports::{PORT_PAGE, PortRef};
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, select_named};

const PORT_PATH: &str = "/port.cgi";
const JUMBO_PATH: &str = "/port.cgi?page=jumbo";

/// What the "actual" columns show for a port without link.
const LINK_DOWN: &[&str] = &["Link Down", "-", ""];

impl FromRow for PortSettings {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            enabled: PORT_STATE.parse_label(row.cell(1, "State")?)?,
            speed_duplex: SPEED_DUPLEX.parse_label(row.cell(2, "Speed/Duplex Config")?)?,
            actual_speed_duplex: negotiated(row.cell(3, "Speed/Duplex Actual")?, |s| {
                SPEED_DUPLEX.parse_label(s)
            })?,
            flow_control: FLOW_CONTROL.parse_label(row.cell(4, "Flow Control Config")?)?,
            actual_flow_control: negotiated(row.cell(5, "Flow Control Actual")?, |s| {
                FLOW_CONTROL.parse_label(s)
            })?,
        })
    }
}

fn negotiated<T>(
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, Error>,
) -> Result<Option<T>, Error> {
    if LINK_DOWN.iter().any(|s| s.eq_ignore_ascii_case(raw.trim())) {
        Ok(None)
    } else {
        parse(raw).map(Some)
    }
}

impl SwitchClient {
    /// Read state, speed/duplex and flow control of every port.
    pub async fn read_port_settings(&self) -> Result<Vec<PortSettings>, Error> {
        self.read_rows(&PORT_PAGE).await
    }

    /// Apply one set of port settings to `ports`.
    pub async fn set_port_settings(
        &self,
        ports: &[PortRef],
        update: PortSettingsUpdate,
    ) -> Result<(), Error> {
        let mut fields = port_settings_form(update)?;
        let targets = self.resolve_targets(ports).await?;
        push_port_ids(&mut fields, &targets);
        debug!(ports = targets.len(), ?update, "applying port settings");
        self.submit_form(PORT_PATH, &fields).await?;
        Ok(())
    }

    /// Maximum frame size accepted on all ports.
    pub async fn read_frame_size(&self) -> Result<FrameSize, Error> {
        let body = self.get_page(JUMBO_PATH).await?;
        parse_frame_size(&body)
    }

    pub async fn set_frame_size(&self, size: FrameSize) -> Result<(), Error> {
        let fields = FormFields::new("jumbo").with("jumbo", FRAME_SIZE.encode(size)?);
        debug!(%size, "setting jumbo frame size");
        self.submit_form(JUMBO_PATH, &fields).await?;
        Ok(())
    }
}

fn parse_frame_size(body: &str) -> Result<FrameSize, Error> {
    let doc = Document::parse(body, JUMBO_PATH)?;
    FRAME_SIZE.decode(&doc.extract_selected_value(&select_named("jumbo"))?)
}

fn port_settings_form(update: PortSettingsUpdate) -> Result<FormFields, Error> {
    let speed: &str = SPEED_DUPLEX.encode(update.speed_duplex)?;
    let flow: &str = FLOW_CONTROL.encode(update.flow_control)?;
    Ok(FormFields::new("port")
        .with("state", PORT_STATE.encode(update.enabled))
        .with("speed_duplex", speed)
        .with("flow", flow))
}

impl PortSettingsUpdate {
    pub fn new(enabled: bool, speed_duplex: SpeedDuplex, flow_control: FlowControl) -> Self {
        Self {
            enabled,
            speed_duplex,
            flow_control,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::page::decode_rows;

    const PAGE: &str = r#"<html><body>
        <form><table><tr><td><select name="state"></select></td></tr></table></form>
        <table>
          <tr><th rowspan="2">Port</th><th rowspan="2">State</th><th colspan="2">Speed/Duplex</th><th colspan="2">Flow Control</th></tr>
          <tr><th>Config</th><th>Actual</th><th>Config</th><th>Actual</th></tr>
          <tr><td>Port 1</td><td>Enable</td><td>Auto</td><td>1000M/Full</td><td>Off</td><td>Off</td></tr>
          <tr><td>Port 2</td><td>Disable</td><td>100M/Full</td><td>Link Down</td><td>On</td><td>Link Down</td></tr>
          <tr><td>Trunk1</td><td>Enable</td><td>Auto</td><td>2500M/Full</td><td>Off</td><td>On</td></tr>
        </table></body></html>"#;

    #[test]
    fn decodes_port_rows() {
        let rows: Vec<PortSettings> = decode_rows(&PORT_PAGE, PAGE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            PortSettings {
                port: "Port 2".into(),
                enabled: false,
                speed_duplex: SpeedDuplex::Full100M,
                actual_speed_duplex: None,
                flow_control: FlowControl::On,
                actual_flow_control: None,
            }
        );
        assert_eq!(rows[0].actual_speed_duplex, Some(SpeedDuplex::Full1000M));
        assert_eq!(rows[2].actual_flow_control, Some(FlowControl::On));
    }

    #[test]
    fn unknown_speed_label_is_codec_error() {
        let page = PAGE.replace("100M/Full</td><td>Link", "40G/Full</td><td>Link");
        let err = decode_rows::<PortSettings>(&PORT_PAGE, &page).unwrap_err();
        assert!(matches!(err, Error::Codec { domain: "speed/duplex", .. }));
    }

    #[test]
    fn jumbo_select_decodes_by_value() {
        let body = r#"<select name="jumbo"><option value="0">1522</option>
            <option value="3" selected>9216</option></select>"#;
        assert_eq!(parse_frame_size(body).unwrap(), FrameSize::Bytes9216);
    }

    #[test]
    fn form_encodes_codes() {
        let fields = port_settings_form(PortSettingsUpdate::new(
            true,
            SpeedDuplex::Full1000M,
            FlowControl::Off,
        ))
        .unwrap();
        assert_eq!(fields.get("cmd"), Some("port"));
        assert_eq!(fields.get("state"), Some("1"));
        assert_eq!(fields.get("speed_duplex"), Some("5"));
        assert_eq!(fields.get("flow"), Some("0"));
    }
}
