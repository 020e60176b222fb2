//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome/Chromium started with remote debugging:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let session = client.attach_active_page().await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::{PageInfo, RemoteObject};
pub use session::PageSession;
