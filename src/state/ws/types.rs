use serde::Deserialize;
use serde_json::Value;

pub const SYSTEM_MESSAGES: &[&str] = &["connected", "ack"];

#[derive(Debug, Deserialize, Clone)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// A backend resource changed, named `entity:operation`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEvent {
    pub kind: String,
    pub entity: String,
    pub operation: String,
    pub id: Option<Value>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    System(String),
    Entity(EntityEvent),
    Unknown(String),
}

impl From<InboundMessage> for Inbound {
    fn from(message: InboundMessage) -> Self {
        if SYSTEM_MESSAGES.contains(&message.kind.as_str()) {
            return Self::System(message.kind);
        }

        match message.kind.split_once(':') {
            Some((entity, operation)) if !entity.is_empty() && !operation.is_empty() => {
                Self::Entity(EntityEvent {
                    entity: entity.to_string(),
                    operation: operation.to_string(),
                    kind: message.kind,
                    id: message.id,
                    payload: message.payload,
                })
            }

            _ => Self::Unknown(message.kind),
        }
    }
}
