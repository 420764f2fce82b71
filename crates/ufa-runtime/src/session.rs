//! # Command Session
//!
//! Line-delimited JSON protocol between a client and the dispatcher.
//!
//! ```text
//! -> {"kind":"invoke","function":"createUFA","args":["UFA-1","SELLER","{...}"]}
//! <- {"ok":true,"payload":""}
//! -> {"kind":"query","function":"getUFADetails","args":["UFA-1"]}
//! <- {"ok":true,"payload":"{\"netCharge\":\"1000\",...}"}
//! -> {"kind":"query","function":"nope"}
//! <- {"ok":false,"error":"unknown function: nope"}
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use ufa_chaincode::adapters::CommandDispatcher;
use ufa_chaincode::ports::UfaChaincodeApi;

/// Which dispatcher entry point a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// One-time setup.
    Init,
    /// Mutating function.
    Invoke,
    /// Read-only function.
    Query,
}

/// One request line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Request {
    /// Entry point.
    pub kind: RequestKind,
    /// Function name; ignored for `init`.
    #[serde(default)]
    pub function: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// One response line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Response body, UTF-8 decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn success(body: &[u8]) -> Self {
        Self {
            ok: true,
            payload: Some(String::from_utf8_lossy(body).into_owned()),
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            error: Some(message.into()),
        }
    }
}

/// Totals for a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Requests answered.
    pub requests: u64,
    /// Requests answered with `ok: false`.
    pub failures: u64,
}

/// Handle one request line. Blank lines yield `None`.
pub fn handle_line<A: UfaChaincodeApi>(
    dispatcher: &CommandDispatcher<A>,
    line: &str,
) -> Option<Response> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed request line");
            return Some(Response::failure(format!("malformed request: {e}")));
        }
    };

    debug!(kind = ?request.kind, function = %request.function, "Handling request");
    let outcome = match request.kind {
        RequestKind::Init => dispatcher.init(),
        RequestKind::Invoke => dispatcher.invoke(&request.function, &request.args),
        RequestKind::Query => dispatcher.query(&request.function, &request.args),
    };

    Some(match outcome {
        Ok(body) => Response::success(&body),
        Err(e) => {
            debug!(function = %request.function, error = %e, "Request failed");
            Response::failure(e.to_string())
        }
    })
}

/// Serve requests from `reader` until end of input, answering on `writer`.
pub async fn serve<A, R, W>(
    dispatcher: &CommandDispatcher<A>,
    reader: R,
    mut writer: W,
) -> Result<SessionSummary>
where
    A: UfaChaincodeApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = SessionSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("reading request")? {
        let Some(response) = handle_line(dispatcher, &line) else {
            continue;
        };

        summary.requests += 1;
        if !response.ok {
            summary.failures += 1;
        }

        let mut encoded = serde_json::to_string(&response).context("encoding response")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("writing response")?;
        writer.flush().await.context("flushing response")?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use ufa_chaincode::service::{ServiceConfig, UfaChaincodeService};

    fn make_dispatcher() -> CommandDispatcher<impl UfaChaincodeApi> {
        let service = UfaChaincodeService::in_memory(ServiceConfig::default()).unwrap();
        CommandDispatcher::new(service)
    }

    fn responses(output: &[u8]) -> Vec<Value> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dispatcher = make_dispatcher();
        assert_eq!(handle_line(&dispatcher, "   "), None);
    }

    #[test]
    fn test_malformed_request() {
        let dispatcher = make_dispatcher();

        let response = handle_line(&dispatcher, r#"{"kind":"delete"}"#).unwrap();

        assert!(!response.ok);
        assert!(response.error.unwrap().starts_with("malformed request"));
    }

    #[test]
    fn test_response_encoding() {
        assert_eq!(
            serde_json::to_string(&Response::success(b"")).unwrap(),
            r#"{"ok":true,"payload":""}"#
        );
        assert_eq!(
            serde_json::to_string(&Response::failure("boom")).unwrap(),
            r#"{"ok":false,"error":"boom"}"#
        );
    }

    #[tokio::test]
    async fn test_serve_session() {
        let dispatcher = make_dispatcher();
        let input = concat!(
            r#"{"kind":"invoke","function":"createUFA","args":["UFA-1","SELLER","{\"netCharge\":\"1000\",\"chargeTolerance\":\"5\"}"]}"#,
            "\n\n",
            r#"{"kind":"query","function":"getUFADetails","args":["UFA-1"]}"#,
            "\n",
            r#"{"kind":"invoke","function":"createUFA","args":["UFA-2","GUEST","{}"]}"#,
            "\n",
            r#"{"kind":"query","function":"probe"}"#,
            "\n",
        );
        let mut output = Vec::new();

        let summary = serve(&dispatcher, input.as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(
            summary,
            SessionSummary {
                requests: 4,
                failures: 1
            }
        );

        let lines = responses(&output);
        assert_eq!(lines[0], serde_json::json!({"ok": true, "payload": ""}));
        assert_eq!(
            lines[1]["payload"],
            r#"{"netCharge":"1000","chargeTolerance":"5"}"#
        );
        assert_eq!(lines[2]["ok"], false);
        assert_eq!(
            lines[2]["error"],
            "Validation failure: \nUser is not authorized to create a UFA"
        );
        assert_eq!(lines[3]["ok"], true);
    }
}
