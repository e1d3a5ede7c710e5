use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScholarError;
use crate::models::Rating;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScholarRequest {
    Ping,
    Health,
    CreateSession {
        name: Option<String>,
    },
    ListSessions,
    GetSession {
        session_id: Uuid,
    },
    Ask {
        session_id: Uuid,
        question: String,
    },
    History {
        session_id: Uuid,
    },
    Rate {
        exchange_id: Uuid,
        rating: Rating,
        feedback: Option<String>,
    },
    Feedback {
        exchange_id: Uuid,
        feedback: String,
    },
    DeleteSession {
        session_id: Uuid,
    },
    Stats,
    Export {
        session_id: Uuid,
    },
}

/// Broad failure category, so transports can pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Invalid,
    NotFound,
    Internal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScholarResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default)]
    pub error_kind: Option<ErrorKind>,
    pub version: String,
}

impl ScholarResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            error_kind: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::Internal, msg)
    }

    pub fn rejected(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            error_kind: Some(kind),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub fn decode_request(bytes: &[u8]) -> Result<ScholarRequest, ScholarError> {
    rmp_serde::from_slice(bytes).map_err(|e| ScholarError::Ipc(format!("Deserialization error: {}", e)))
}

pub fn encode_response(response: &ScholarResponse) -> Result<Vec<u8>, ScholarError> {
    rmp_serde::to_vec_named(response).map_err(|e| ScholarError::Ipc(format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_tagged_by_action() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(ScholarRequest::Ask {
            session_id: id,
            question: "Explain photosynthesis".to_string(),
        })
        .unwrap();
        assert_eq!(json["action"], "ask");
        assert_eq!(json["session_id"], id.to_string());
    }

    #[test]
    fn test_rate_request_from_msgpack() {
        let exchange_id = Uuid::new_v4();
        let bytes = rmp_serde::to_vec_named(&serde_json::json!({
            "action": "rate",
            "exchange_id": exchange_id,
            "rating": "up",
            "feedback": null,
        }))
        .unwrap();

        match decode_request(&bytes).unwrap() {
            ScholarRequest::Rate { exchange_id: id, rating, feedback } => {
                assert_eq!(id, exchange_id);
                assert_eq!(rating, Rating::Up);
                assert!(feedback.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_an_ipc_error() {
        let err = decode_request(&[0xc1, 0x00]).unwrap_err();
        assert!(matches!(err, ScholarError::Ipc(_)));
    }

    #[test]
    fn test_rejected_response_carries_kind() {
        let resp = ScholarResponse::rejected(ErrorKind::NotFound, "no such session");
        assert!(!resp.is_ok());
        assert_eq!(resp.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(resp.error.as_deref(), Some("no such session"));
    }
}
