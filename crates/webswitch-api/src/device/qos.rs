// QoS mode, port priorities and queue weights (qos.cgi)

use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::{QOS_MODE, QosMode};
use crate::device::models::{PortPriority, QosSettings, QueueWeight};
use crate::device::page::{FromRow, PageSpec, Row, decode_table, optional_u32, push_port_ids};
use crate::device::ports::{PortEntry, PortRef};
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, IntParser, select_named};

const QOS_PATH: &str = "/qos.cgi";
const WEIGHTS_PATH: &str = "/qos.cgi?page=weights";

const QOS_PAGE: PageSpec = PageSpec::status(QOS_PATH, 1);
const WEIGHTS_PAGE: PageSpec = PageSpec::status(WEIGHTS_PATH, 1);

/// Queue cells read `1`..`8` or `Queue 1`..`Queue 8`.
const QUEUE: IntParser<'static> = IntParser::new().trim_prefix("Queue ").default(1);

impl FromRow for PortPriority {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            port: row.cell(0, "Port")?.to_owned(),
            queue: QUEUE.parse_as(row.cell(1, "Priority Queue")?).unwrap_or(1),
        })
    }
}

impl FromRow for QueueWeight {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            queue: QUEUE.parse_as(row.cell(0, "Queue")?).unwrap_or(1),
            weight: optional_u32(row.cell(1, "Weight")?),
        })
    }
}

impl SwitchClient {
    pub async fn read_qos_settings(&self) -> Result<QosSettings, Error> {
        let body = self.get_page(QOS_PATH).await?;
        parse_qos(&body)
    }

    pub async fn set_qos_mode(&self, mode: QosMode) -> Result<(), Error> {
        let fields = FormFields::new("qos_mode").with("qos_mode", QOS_MODE.encode(mode)?);
        debug!(%mode, "setting QoS mode");
        self.submit_form(QOS_PATH, &fields).await?;
        Ok(())
    }

    /// Map `ports` to egress queue `queue` (1-based, submitted as is).
    pub async fn set_port_priority(&self, ports: &[PortRef], queue: u8) -> Result<(), Error> {
        let targets = self.resolve_targets(ports).await?;
        let fields = port_priority_form(&targets, queue);
        debug!(queue, ports = targets.len(), "setting port priority");
        self.submit_form(QOS_PATH, &fields).await?;
        Ok(())
    }

    pub async fn read_queue_weights(&self) -> Result<Vec<QueueWeight>, Error> {
        self.read_rows(&WEIGHTS_PAGE).await
    }

    /// Set the WRR weight of `queue`; `None` makes it strict priority
    /// (submitted as weight 0).
    pub async fn set_queue_weight(&self, queue: u8, weight: Option<u32>) -> Result<(), Error> {
        let fields = queue_weight_form(queue, weight);
        debug!(queue, ?weight, "setting queue weight");
        self.submit_form(WEIGHTS_PATH, &fields).await?;
        Ok(())
    }
}

// Unlike port IDs, queue numbers are not shifted to 0-based: the QoS
// forms number queues 1..8 exactly as the page prints them.

fn port_priority_form(targets: &[PortEntry], queue: u8) -> FormFields {
    let mut fields = FormFields::new("port_priority");
    push_port_ids(&mut fields, targets);
    fields.push("queue", queue);
    fields
}

fn queue_weight_form(queue: u8, weight: Option<u32>) -> FormFields {
    FormFields::new("weight")
        .with("queue", queue)
        .with("weight", weight.unwrap_or(0))
}

fn parse_qos(body: &str) -> Result<QosSettings, Error> {
    let doc = Document::parse(body, QOS_PATH)?;
    let mode = doc.extract_selected_value(&select_named("qos_mode"))?;
    Ok(QosSettings {
        mode: QOS_MODE.decode(&mode)?,
        port_priorities: decode_table(&doc, &QOS_PAGE)?,
    })
}

impl QueueWeight {
    /// Weight 0 on the wire is strict priority too.
    pub fn is_strict(&self) -> bool {
        self.weight.is_none_or(|w| w == 0)
    }
}
