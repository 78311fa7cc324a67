use tracing::debug;

use crate::client::SwitchClient;
use crate::codec::EEE_STATE;
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, select_named};

const EEE_PATH: &str = "/eee.cgi";

impl SwitchClient {
    /// Whether Energy Efficient Ethernet is enabled switch-wide.
    pub async fn read_eee(&self) -> Result<bool, Error> {
        let body = self.get_page(EEE_PATH).await?;
        parse_eee(&body)
    }

    pub async fn set_eee(&self, enabled: bool) -> Result<(), Error> {
        let fields = FormFields::new("eee").with("eee", EEE_STATE.encode(enabled));
        debug!(enabled, "setting EEE");
        self.submit_form(EEE_PATH, &fields).await?;
        Ok(())
    }
}

fn parse_eee(body: &str) -> Result<bool, Error> {
    let doc = Document::parse(body, EEE_PATH)?;
    EEE_STATE.decode(&doc.extract_selected_value(&select_named("eee"))?)
}
