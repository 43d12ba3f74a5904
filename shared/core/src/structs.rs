use common::enums::stream_state::StreamState;
use serde::{Deserialize, Serialize};
use serde_json::{from_str, from_value, Value};
use tickflow_error::{ErrorKind, TickflowError};

/// Inbound envelope `{type, payload, request_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(rename = "type", default)]
    pub request_type: String,
    #[serde(default)]
    pub payload: Value,
    pub request_id: u64,
}

impl RpcRequest {
    pub fn new(request_type: &str, payload: Value, request_id: u64) -> Self {
        Self {
            request_type: request_type.to_string(),
            payload,
            request_id,
        }
    }

    /// Decodes one inbound line. A line that is valid JSON with a numeric
    /// `request_id` but a bad envelope still yields that id so the caller
    /// can reject it.
    pub fn parse_line(line: &str) -> Result<Self, (Option<u64>, TickflowError)> {
        let value: Value = from_str(line).map_err(|error| (None, TickflowError::from(error)))?;
        let request_id = value.get("request_id").and_then(Value::as_u64);
        from_value(value).map_err(|error| {
            let error = TickflowError::new_invalid_payload(format!("malformed request: {}", error));
            (request_id, error)
        })
    }
}

/// Exactly one is sent per request, carrying either `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub request_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl RpcResponse {
    pub fn ok(request_id: u64, result: Value) -> Self {
        Self {
            request_id,
            result: Some(result),
            error: None,
            error_kind: None,
        }
    }

    pub fn rejected(request_id: u64, error: &TickflowError) -> Self {
        Self {
            request_id,
            result: None,
            error: Some(error.reason()),
            error_kind: Some(error.kind),
        }
    }

    pub fn into_result(self) -> Result<Value, TickflowError> {
        match self.error {
            Some(reason) => Err(TickflowError::with_kind(
                self.error_kind.unwrap_or_default(),
                String::from("Rejected"),
                reason,
            )),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePayload {
    pub exchange_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvPayload {
    pub exchange_id: String,
    pub symbol: String,
    pub timeframe: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvStreamPayload {
    pub exchange_id: String,
    pub symbol: String,
    pub timeframe: String,
    pub stream_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamIdPayload {
    pub stream_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartedResult {
    pub started: bool,
}

#[derive(Debug, Serialize)]
pub struct StoppedResult {
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct DestroyedResult {
    pub destroyed: bool,
}

#[derive(Debug, Serialize)]
pub struct StreamStatusResult {
    pub status: StreamState,
    pub shards: Vec<StreamState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn test_request_defaults() {
        let request: RpcRequest = from_str(r#"{"request_id": 3}"#).unwrap();
        assert_eq!(request.request_type, "");
        assert_eq!(request.payload, Value::Null);
    }

    #[test]
    fn test_bad_envelope_keeps_request_id() {
        let (request_id, error) = RpcRequest::parse_line(r#"{"type": 5, "request_id": 9}"#)
            .unwrap_err();
        assert_eq!(request_id, Some(9));
        assert_eq!(error.kind, ErrorKind::Request);
        let response = RpcResponse::rejected(9, &error);
        assert_eq!(response.error_kind, Some(ErrorKind::Request));
        assert!(response.error.unwrap().starts_with("Invalid Payload: malformed request"));

        let (request_id, _) =
            RpcRequest::parse_line(r#"{"type": null, "request_id": 10}"#).unwrap_err();
        assert_eq!(request_id, Some(10));
    }

    #[test]
    fn test_unanswerable_lines() {
        let (request_id, _) = RpcRequest::parse_line("not json").unwrap_err();
        assert_eq!(request_id, None);
        let (request_id, _) =
            RpcRequest::parse_line(r#"{"type": "FETCH_MARKETS"}"#).unwrap_err();
        assert_eq!(request_id, None);
        let (request_id, _) =
            RpcRequest::parse_line(r#"{"type": "FETCH_MARKETS", "request_id": "7"}"#).unwrap_err();
        assert_eq!(request_id, None);

        let request = RpcRequest::parse_line(r#"{"type": "FETCH_MARKETS", "request_id": 7}"#)
            .unwrap();
        assert_eq!(request, RpcRequest::new("FETCH_MARKETS", Value::Null, 7));
    }

    #[test]
    fn test_response_shapes() {
        let ok = to_value(RpcResponse::ok(1, json!({"started": true}))).unwrap();
        assert_eq!(ok, json!({"request_id": 1, "result": {"started": true}}));

        let error = TickflowError::new_unknown_exchange("kraken");
        let rejected = to_value(RpcResponse::rejected(2, &error)).unwrap();
        assert_eq!(
            rejected,
            json!({
                "request_id": 2,
                "error": "Unknown Exchange: unknown exchange id kraken",
                "error_kind": "request"
            })
        );
    }

    #[test]
    fn test_into_result_keeps_kind() {
        let response = RpcResponse::rejected(9, &TickflowError::new_timeout(String::from("slow")));
        let error = response.into_result().unwrap_err();
        assert!(error.is_timeout());
        assert_eq!(error.description, "Timeout: slow");
    }
}
