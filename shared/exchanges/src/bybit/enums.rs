use super::structs::{OpWsMessage, TopicWsMessage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BybitWsMessage {
    None,
    Op(OpWsMessage),
    Topic(TopicWsMessage),
}

impl Default for BybitWsMessage {
    fn default() -> Self {
        BybitWsMessage::None
    }
}
