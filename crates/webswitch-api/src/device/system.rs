use crate::client::SwitchClient;
use crate::device::models::{MacAddress, SystemInfo};
use crate::device::page::KeyValueTable;
use crate::error::Error;
use crate::markup::{Document, STATUS_TABLE};

const INFO_PATH: &str = "/info.cgi";

impl SwitchClient {
    /// Read the system information page.
    pub async fn read_system_info(&self) -> Result<SystemInfo, Error> {
        let body = self.get_page(INFO_PATH).await?;
        parse_system_info(&body)
    }
}

fn parse_system_info(body: &str) -> Result<SystemInfo, Error> {
    let doc = Document::parse(body, INFO_PATH)?;
    let table = KeyValueTable::from_rows(doc.extract_table(STATUS_TABLE, 0)?);
    let text = |key: &str| table.get(key).map(str::to_owned);

    Ok(SystemInfo {
        device_model: text("Device Model").or_else(|| text("Device Type")),
        mac_address: table.get("MAC Address").map(MacAddress::new),
        ip_address: text("IP Address"),
        netmask: text("Netmask").or_else(|| text("Subnet Mask")),
        gateway: text("Gateway"),
        firmware_version: text("Firmware Version"),
        firmware_date: text("Firmware Date"),
        hardware_version: text("Hardware Version"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_info_table() {
        let body = r#"<html><body><table>
            <tr><th>Device Model</th><td>SWTG118AS</td></tr>
            <tr><th>MAC Address</th><td>1C-2A-A3-00-11-22</td></tr>
            <tr><th>IP Address</th><td>192.168.2.1</td></tr>
            <tr><th>Subnet Mask</th><td>255.255.255.0</td></tr>
            <tr><th>Gateway</th><td>192.168.2.254</td></tr>
            <tr><th>Firmware Version</th><td>V1.06</td></tr>
        </table></body></html>"#;
        let info = parse_system_info(body).unwrap();
        assert_eq!(info.device_model.as_deref(), Some("SWTG118AS"));
        assert_eq!(info.mac_address.unwrap().as_str(), "1c:2a:a3:00:11:22");
        assert_eq!(info.netmask.as_deref(), Some("255.255.255.0"));
        assert_eq!(info.firmware_version.as_deref(), Some("V1.06"));
        assert!(info.hardware_version.is_none());
    }

    #[test]
    fn page_without_table_is_field_not_found() {
        let err = parse_system_info("<html><body><p>hi</p></body></html>").unwrap_err();
        assert!(err.is_not_found());
    }
}
