//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// The browser WebSocket, shared by the client and every page session.
pub(crate) struct Transport {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
}

impl Transport {
    /// Send a command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// CDP client attached to a running Chrome.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    transport: Arc<Transport>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at its debugging endpoint, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&http_endpoint)?;

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;
        let (ws_sink, ws_source) = ws_stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = tokio::spawn(receive_loop(ws_source, pending.clone()));

        info!("Connected to {}", version.browser);

        Ok(Self {
            http_endpoint,
            transport: Arc::new(Transport {
                ws_tx: tokio::sync::Mutex::new(ws_sink),
                request_id: AtomicU64::new(1),
                pending,
            }),
            _recv_task: recv_task,
        })
    }

    /// List open targets, most recently focused first.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Attach to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    /// Attach to the tab the user is looking at.
    pub async fn attach_active_page(&self) -> Result<PageSession, CdpError> {
        let pages = self.list_pages().await?;
        let page = pages
            .iter()
            .find(|p| p.is_tab())
            .ok_or_else(|| CdpError::PageNotFound("no open tab".to_string()))?;
        info!("Attaching to \"{}\" ({})", page.title, page.url);
        self.attach_page(&page.id).await
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

async fn receive_loop(mut ws_source: WsSource, pending: Pending) {
    while let Some(msg) = ws_source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                trace!("CDP recv: {}", text);
                match serde_json::from_str::<CdpResponse>(&text) {
                    Ok(resp) => dispatch(resp, &pending),
                    Err(e) => warn!("Failed to parse CDP message: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("WebSocket closed");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
    // Dropping the senders fails every outstanding call with SessionClosed.
    pending.lock().clear();
}

/// Route a response to its waiting caller. Events are ignored.
fn dispatch(resp: CdpResponse, pending: &Pending) {
    let Some(id) = resp.id else { return };
    let Some(tx) = pending.lock().remove(&id) else {
        return;
    };
    let result = match resp.error {
        Some(error) => Err(CdpError::Protocol {
            code: error.code,
            message: error.message,
        }),
        None => Ok(resp.result.unwrap_or(Value::Null)),
    };
    let _ = tx.send(result);
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
