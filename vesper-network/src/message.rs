use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The sixteen gossip message kinds. Wire representation is the lowercase
/// snake_case variant name, e.g. `"get_chain"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Version,
    Verack,
    Ping,
    Pong,
    GetPeers,
    Peers,
    GetBlocks,
    Blocks,
    NewBlock,
    NewTransaction,
    GetChain,
    Chain,
    GetMempool,
    Mempool,
    RegisterValidator,
    ValidatorList,
    GetValidators,
}

/// `{type, data, timestamp, sender}`, the envelope every frame carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub data: Value,
    pub timestamp: f64,
    pub sender: String,
}

impl Envelope {
    pub fn new(kind: MessageKind, data: Value, sender: impl Into<String>, timestamp: f64) -> Self {
        Self {
            kind,
            data,
            timestamp,
            sender: sender.into(),
        }
    }

    /// Parses a raw frame, returning `None` (rather than an error) for
    /// malformed JSON or an unrecognized `type` — both are silently
    /// dropped on the gossip path per the wire contract.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).expect("envelope always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_fails_to_parse() {
        let raw = r#"{"type":"smoke_signal","data":{},"timestamp":0.0,"sender":"x"}"#;
        assert!(Envelope::parse(raw).is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let env = Envelope::new(MessageKind::Ping, serde_json::json!({"nonce": 1.0}), "abc", 5.0);
        let frame = env.to_frame();
        let parsed = Envelope::parse(&frame).unwrap();
        assert_eq!(parsed.kind, MessageKind::Ping);
        assert_eq!(parsed.sender, "abc");
    }

    #[test]
    fn wire_name_is_snake_case() {
        let env = Envelope::new(MessageKind::GetChain, Value::Null, "x", 0.0);
        assert!(env.to_frame().contains("\"get_chain\""));
    }
}
