//! Wire protocol shared with the companion service.
//!
//! One JSON object per text frame, `{"event": <name>, "data": <payload>}`.
//! Events without a payload omit `data`. Messages carry no sequence numbers
//! and no acknowledgements; delivery order is whatever the transport gives us.

use serde::{Deserialize, Serialize};

/// Every message that crosses the channel, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// Announce this bridge to the companion service, sent once per connect.
    ClientConnected,
    /// Full replacement text for the assembly pane.
    AsmCode(String),
    /// Full replacement text for the source pane; also our reply to
    /// [`RequestCCode`](Self::RequestCCode).
    CCode(String),
    /// Text to append to the source pane.
    AddCCode(String),
    /// The companion asks for the source pane's current content.
    RequestCCode,
    /// Ask the companion to extract the selected region.
    ExtractData(String),
    /// The companion's answer to [`ExtractData`](Self::ExtractData).
    ExtractedData(ExtractOutcome),
}

/// Payload of an `extracted_data` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOutcome {
    pub status: ExtractStatus,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractStatus {
    Ok,
    Error,
}

impl ProtocolMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }

    /// Wire event name, for logs.
    pub fn event(&self) -> &'static str {
        match self {
            ProtocolMessage::ClientConnected => "client_connected",
            ProtocolMessage::AsmCode(_) => "asm_code",
            ProtocolMessage::CCode(_) => "c_code",
            ProtocolMessage::AddCCode(_) => "add_c_code",
            ProtocolMessage::RequestCCode => "request_c_code",
            ProtocolMessage::ExtractData(_) => "extract_data",
            ProtocolMessage::ExtractedData(_) => "extracted_data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_events_have_no_data_field() {
        assert_eq!(
            ProtocolMessage::ClientConnected.encode().unwrap(),
            r#"{"event":"client_connected"}"#
        );
        assert_eq!(
            ProtocolMessage::RequestCCode.encode().unwrap(),
            r#"{"event":"request_c_code"}"#
        );
    }

    #[test]
    fn text_events_carry_a_string() {
        assert_eq!(
            ProtocolMessage::AsmCode("MOV R0".into()).encode().unwrap(),
            r#"{"event":"asm_code","data":"MOV R0"}"#
        );
        assert_eq!(
            ProtocolMessage::ExtractData("gUnk_123".into())
                .encode()
                .unwrap(),
            r#"{"event":"extract_data","data":"gUnk_123"}"#
        );
    }

    #[test]
    fn extracted_data_carries_status_and_text() {
        let frame = r#"{"event":"extracted_data","data":{"status":"ok","text":"const u8 x;"}}"#;
        let message = ProtocolMessage::decode(frame).unwrap();
        assert_eq!(
            message,
            ProtocolMessage::ExtractedData(ExtractOutcome {
                status: ExtractStatus::Ok,
                text: "const u8 x;".into(),
            })
        );

        let frame = r#"{"event":"extracted_data","data":{"status":"error","text":"no symbol"}}"#;
        match ProtocolMessage::decode(frame).unwrap() {
            ProtocolMessage::ExtractedData(outcome) => {
                assert_eq!(outcome.status, ExtractStatus::Error);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_events_fail_to_decode() {
        assert!(ProtocolMessage::decode(r#"{"event":"load_mgba","data":""}"#).is_err());
        assert!(ProtocolMessage::decode("not json").is_err());
    }
}
