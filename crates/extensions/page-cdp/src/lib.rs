//! Live page access for FormPilot over the Chrome DevTools Protocol.
//!
//! [`CdpPage`] implements the engine's page traits against the tab the
//! user is working in; every element operation runs as a function called
//! on the element's remote object.

mod cdp;
mod page;
mod scripts;

pub use cdp::{CdpClient, CdpError, PageInfo, PageSession};
pub use page::{CdpElement, CdpPage};

/// Connect to Chrome at `endpoint` and attach to its foremost tab.
pub async fn connect_active_page(endpoint: &str) -> Result<(CdpClient, CdpPage), CdpError> {
    let client = CdpClient::connect(endpoint).await?;
    let session = client.attach_active_page().await?;
    Ok((client, CdpPage::new(session)))
}
