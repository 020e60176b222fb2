//! CDP session attached to a single page.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use super::client::Transport;
use super::error::CdpError;
use super::protocol::RemoteObject;

/// A session attached to a single page target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Evaluate an expression and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;
        Ok(remote_result(result)?.value.unwrap_or(Value::Null))
    }

    /// Evaluate an expression and return a handle to its result.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": false,
                })),
            )
            .await?;
        remote_result(result)
    }

    /// Call `function` with `this` bound to the object and return its JSON value.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(call_params(object_id, function, args, true)),
            )
            .await?;
        Ok(remote_result(result)?.value.unwrap_or(Value::Null))
    }

    /// Call `function` with `this` bound to the object and return a handle
    /// to its result.
    pub async fn call_function_handle(
        &self,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(call_params(object_id, function, args, false)),
            )
            .await?;
        remote_result(result)
    }

    /// Type `text` into the focused element as if entered by the user.
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }
}

fn call_params(object_id: &str, function: &str, args: &[Value], by_value: bool) -> Value {
    json!({
        "objectId": object_id,
        "functionDeclaration": function,
        "arguments": args.iter().map(|v| json!({ "value": v })).collect::<Vec<_>>(),
        "returnByValue": by_value,
        "awaitPromise": true,
    })
}

/// Extract the result object, surfacing thrown exceptions.
fn remote_result(result: Value) -> Result<RemoteObject, CdpError> {
    if let Some(exception) = result.get("exceptionDetails") {
        let text = exception["exception"]["description"]
            .as_str()
            .or_else(|| exception["text"].as_str())
            .unwrap_or("Unknown error");
        return Err(CdpError::JavaScript(text.to_string()));
    }
    Ok(serde_json::from_value(result["result"].clone())?)
}
