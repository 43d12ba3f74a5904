use super::structs::{EventMessage, PushMessage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OkxWsMessage {
    None,
    Event(EventMessage),
    Push(PushMessage),
}

impl Default for OkxWsMessage {
    fn default() -> Self {
        OkxWsMessage::None
    }
}
