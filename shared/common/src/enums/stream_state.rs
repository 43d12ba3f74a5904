use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl StreamState {
    /// Conservative status of a sharded stream: connected only when every
    /// shard is connected, disconnected only when every shard is.
    pub fn aggregate(states: &[StreamState]) -> StreamState {
        if states.is_empty() || states.iter().all(|s| *s == StreamState::Disconnected) {
            return StreamState::Disconnected;
        }
        if states.iter().all(|s| *s == StreamState::Connected) {
            return StreamState::Connected;
        }
        StreamState::Connecting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_requires_all_shards_connected() {
        use StreamState::*;
        assert_eq!(StreamState::aggregate(&[]), Disconnected);
        assert_eq!(
            StreamState::aggregate(&[Connected, Connected, Connected]),
            Connected
        );
        assert_eq!(
            StreamState::aggregate(&[Connected, Connecting, Connected]),
            Connecting
        );
        assert_eq!(
            StreamState::aggregate(&[Connected, Reconnecting]),
            Connecting
        );
        assert_eq!(
            StreamState::aggregate(&[Disconnected, Connected]),
            Connecting
        );
        assert_eq!(
            StreamState::aggregate(&[Disconnected, Disconnected]),
            Disconnected
        );
    }
}
