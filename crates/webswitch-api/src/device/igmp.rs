// IGMP snooping (igmp.cgi)
//
// The per-port form has no port-scoped update: changing one port means
// resubmitting the whole table. Two concurrent updates for different
// ports would each read the old table and overwrite the other, so
// `configure_port_igmp_snooping` holds the session's IGMP lock across
// the read and the write. Other domains do not take this lock.

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::IGMP_STATE;
use crate::device::models::{IgmpPortState, IgmpSnooping};
use crate::device::page::{FromRow, PageSpec, Row, decode_table};
use crate::device::ports::{PortRef, PortTable};
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, select_named};

const IGMP_PATH: &str = "/igmp.cgi";
const IGMP_PAGE: PageSpec = PageSpec::status(IGMP_PATH, 1);

impl FromRow for IgmpPortState {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            enabled: IGMP_STATE.parse_label(row.cell(1, "Snooping")?)?,
        })
    }
}

impl SwitchClient {
    pub async fn read_igmp_snooping(&self) -> Result<IgmpSnooping, Error> {
        let body = self.get_page(IGMP_PATH).await?;
        parse_igmp(&body)
    }

    /// Switch-wide snooping and report suppression.
    pub async fn set_igmp_snooping(
        &self,
        enabled: bool,
        report_suppression: bool,
    ) -> Result<(), Error> {
        let fields = FormFields::new("igmp")
            .with("igmp_en", IGMP_STATE.encode(enabled))
            .with("report_sup", IGMP_STATE.encode(report_suppression));
        debug!(enabled, report_suppression, "setting IGMP snooping");
        self.submit_form(IGMP_PATH, &fields).await?;
        Ok(())
    }

    /// Enable or disable snooping on one port, keeping every other port
    /// as the device currently reports it.
    pub async fn configure_port_igmp_snooping(
        &self,
        port: &PortRef,
        enabled: bool,
    ) -> Result<(), Error> {
        let _guard = self.igmp_port_lock().lock().await;
        self.configure_port_igmp_snooping_unguarded(port, enabled)
            .await
    }

    async fn configure_port_igmp_snooping_unguarded(
        &self,
        port: &PortRef,
        enabled: bool,
    ) -> Result<(), Error> {
        let current = self.read_igmp_snooping().await?;
        let fields = igmp_port_form(&current.ports, port, enabled)?;
        debug!(%port, enabled, "setting IGMP snooping on port");
        self.submit_form(IGMP_PATH, &fields).await?;
        Ok(())
    }
}

fn parse_igmp(body: &str) -> Result<IgmpSnooping, Error> {
    let doc = Document::parse(body, IGMP_PATH)?;
    Ok(IgmpSnooping {
        enabled: IGMP_STATE.decode(&doc.extract_selected_value(&select_named("igmp_en"))?)?,
        report_suppression: IGMP_STATE
            .decode(&doc.extract_selected_value(&select_named("report_sup"))?)?,
        ports: decode_table(&doc, &IGMP_PAGE)?,
    })
}

/// One `igmpPort_<wire>` field per row of the snooping table (rows are in
/// wire order), with only `target` changed.
fn igmp_port_form(
    ports: &[IgmpPortState],
    target: &PortRef,
    enabled: bool,
) -> Result<FormFields, Error> {
    let table = PortTable::from_names(ports.iter().map(|p| p.port.as_str()));
    let target_id = table.resolve(target)?.id;

    let mut fields = FormFields::new("igmp_port");
    for (entry, state) in table.iter().zip(ports) {
        let on = if entry.id == target_id {
            enabled
        } else {
            state.enabled
        };
        fields.push(format!("igmpPort_{}", entry.wire_id()), IGMP_STATE.encode(on));
    }
    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;
    use crate::transport::ClientConfig;

    // ── Form encoding ────────────────────────────────────────────────

    fn state(port: &str, enabled: bool) -> IgmpPortState {
        IgmpPortState {
            port: port.into(),
            enabled,
        }
    }

    #[test]
    fn form_keeps_other_ports() {
        let ports = [
            state("Port 1", true),
            state("Port 2", false),
            state("Port 3", true),
        ];
        let fields = igmp_port_form(&ports, &PortRef::Id(2), true).unwrap();
        assert_eq!(fields.get("igmpPort_0"), Some("1"));
        assert_eq!(fields.get("igmpPort_1"), Some("1"));
        assert_eq!(fields.get("igmpPort_2"), Some("1"));

        let fields = igmp_port_form(&ports, &"Port 3".into(), false).unwrap();
        assert_eq!(fields.get("igmpPort_2"), Some("0"));
        assert_eq!(fields.get("igmpPort_0"), Some("1"));
    }

    #[test]
    fn unknown_port_is_rejected() {
        let ports = [state("Port 1", true)];
        assert!(matches!(
            igmp_port_form(&ports, &PortRef::Id(4), true),
            Err(Error::PortNotFound { .. })
        ));
    }

    #[test]
    fn parses_page() {
        let snooping = parse_igmp(&render(&[true, false])).unwrap();
        assert!(snooping.enabled);
        assert!(!snooping.report_suppression);
        assert_eq!(snooping.ports, vec![state("Port 1", true), state("Port 2", false)]);
    }

    // ── Read-modify-write race ───────────────────────────────────────

    fn render(ports: &[bool]) -> String {
        let rows: String = ports
            .iter()
            .enumerate()
            .map(|(i, on)| {
                let label = if *on { "Enable" } else { "Disable" };
                format!("<tr><td>Port {}</td><td>{label}</td></tr>", i + 1)
            })
            .collect();
        format!(
            r#"<html><body><form>
            <select name="igmp_en"><option value="0">Disable</option><option value="1" selected>Enable</option></select>
            <select name="report_sup"><option value="0" selected>Disable</option><option value="1">Enable</option></select>
            </form>
            <table><tr><th>Port</th><th>Snooping</th></tr>{rows}</table></body></html>"#
        )
    }

    /// Fake device: GET renders the current table (slowly), POST applies
    /// every `igmpPort_<n>` field it receives.
    #[derive(Clone)]
    struct IgmpDevice {
        ports: Arc<Mutex<Vec<bool>>>,
    }

    impl Respond for IgmpDevice {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let mut ports = self.ports.lock().unwrap();
            if request.method.as_str() == "GET" {
                return ResponseTemplate::new(200)
                    .set_body_string(render(&ports))
                    .set_delay(Duration::from_millis(200));
            }
            let form = FormFields::decode(&String::from_utf8_lossy(&request.body));
            for (name, value) in form.iter() {
                if let Some(idx) = name.strip_prefix("igmpPort_") {
                    let idx: usize = idx.parse().unwrap();
                    ports[idx] = value == "1";
                }
            }
            ResponseTemplate::new(200).set_body_string("<html><body>OK</body></html>")
        }
    }

    async fn device() -> (MockServer, SwitchClient, Arc<Mutex<Vec<bool>>>) {
        let server = MockServer::start().await;
        let ports = Arc::new(Mutex::new(vec![false; 4]));

        Mock::given(method("GET"))
            .and(path("/info.cgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>info</body></html>"))
            .mount(&server)
            .await;
        Mock::given(path("/igmp.cgi"))
            .respond_with(IgmpDevice {
                ports: Arc::clone(&ports),
            })
            .mount(&server)
            .await;

        let config = ClientConfig::from_parts(&server.uri(), "admin", "admin").unwrap();
        let client = SwitchClient::connect(config).await.unwrap();
        (server, client, ports)
    }

    #[tokio::test]
    async fn locked_updates_both_land() {
        let (_server, client, ports) = device().await;

        let (a, b) = tokio::join!(
            client.configure_port_igmp_snooping(&PortRef::Id(1), true),
            client.configure_port_igmp_snooping(&PortRef::Id(3), true),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(*ports.lock().unwrap(), vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn unlocked_updates_lose_one() {
        let (_server, client, ports) = device().await;

        let (a, b) = tokio::join!(
            client.configure_port_igmp_snooping_unguarded(&PortRef::Id(1), true),
            client.configure_port_igmp_snooping_unguarded(&PortRef::Id(3), true),
        );
        a.unwrap();
        b.unwrap();

        let enabled = ports.lock().unwrap().iter().filter(|on| **on).count();
        assert_eq!(enabled, 1, "one of the two updates must have been overwritten");
    }
}
