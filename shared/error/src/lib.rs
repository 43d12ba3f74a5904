use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;
use std::{
    env::VarError,
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    io::Error as IoError,
    num::{ParseFloatError, ParseIntError},
};
use tokio_tungstenite::tungstenite::Error as TungsteniteError;
use url::ParseError as UrlParseError;

/// Coarse classification used by the host to decide whether to retry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Socket open failure, abrupt close, malformed frame.
    Transport,
    /// Exchange reported rejection (e.g. subscribe refused).
    Protocol,
    /// Unknown command, unknown exchange, failed downstream fetch.
    #[default]
    Request,
    /// No response within the RPC window.
    Timeout,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let str = match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Request => "request",
            Self::Timeout => "timeout",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickflowError {
    pub kind: ErrorKind,
    pub title: String,
    pub description: String,
}

impl TickflowError {
    pub fn new(title: String, description: String) -> Self {
        Self {
            kind: ErrorKind::Request,
            title,
            description,
        }
    }

    pub fn with_kind(kind: ErrorKind, title: String, description: String) -> Self {
        Self {
            kind,
            title,
            description,
        }
    }

    pub fn new_unsuccessful_response(description: String) -> Self {
        Self::new(String::from("Unsuccessful Response"), description)
    }

    pub fn new_unknown_command(command: &str) -> Self {
        Self::new(
            String::from("Unknown Command"),
            format!("unknown command type {}", command),
        )
    }

    pub fn new_unknown_exchange(exchange_id: &str) -> Self {
        Self::new(
            String::from("Unknown Exchange"),
            format!("unknown exchange id {}", exchange_id),
        )
    }

    pub fn new_invalid_payload(description: String) -> Self {
        Self::new(String::from("Invalid Payload"), description)
    }

    pub fn new_timeout(description: String) -> Self {
        Self::with_kind(ErrorKind::Timeout, String::from("Timeout"), description)
    }

    pub fn new_transport(description: String) -> Self {
        Self::with_kind(
            ErrorKind::Transport,
            String::from("Transport Error"),
            description,
        )
    }

    pub fn new_protocol(description: String) -> Self {
        Self::with_kind(
            ErrorKind::Protocol,
            String::from("Protocol Error"),
            description,
        )
    }

    pub fn new_client_destroyed(exchange_id: &str) -> Self {
        Self::new(
            String::from("Client Destroyed"),
            format!("{} client was destroyed", exchange_id),
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Human readable reason attached to rejected responses.
    pub fn reason(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }
}

impl Display for TickflowError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.title, self.description)
    }
}

impl Error for TickflowError {}

impl From<VarError> for TickflowError {
    fn from(error: VarError) -> Self {
        Self::new(String::from("Var Error"), error.to_string())
    }
}

impl From<UrlParseError> for TickflowError {
    fn from(error: UrlParseError) -> Self {
        Self::new(String::from("Url Parse Error"), error.to_string())
    }
}

impl From<TungsteniteError> for TickflowError {
    fn from(error: TungsteniteError) -> Self {
        Self::with_kind(
            ErrorKind::Transport,
            String::from("Tungstenite Error"),
            error.to_string(),
        )
    }
}

impl From<SerdeError> for TickflowError {
    fn from(error: SerdeError) -> Self {
        Self::new(String::from("Serde Error"), error.to_string())
    }
}

impl From<ParseFloatError> for TickflowError {
    fn from(error: ParseFloatError) -> Self {
        Self::new(String::from("Parse Float Error"), error.to_string())
    }
}

impl From<ReqwestError> for TickflowError {
    fn from(error: ReqwestError) -> Self {
        Self::new(String::from("Reqwest Error"), error.to_string())
    }
}

impl From<ParseIntError> for TickflowError {
    fn from(error: ParseIntError) -> Self {
        Self::new(String::from("Parse Int Error"), error.to_string())
    }
}

impl From<IoError> for TickflowError {
    fn from(error: IoError) -> Self {
        Self::with_kind(
            ErrorKind::Transport,
            String::from("I/O Error"),
            error.to_string(),
        )
    }
}
