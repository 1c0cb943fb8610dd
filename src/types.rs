use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::provider::Message;

#[derive(Deserialize)]
pub struct SendForm {
    pub payload: Option<String>,
}

/// What the `payload` form field decodes to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Client secret document, kept as raw JSON text.
    pub credentials: Box<RawValue>,
    /// Token JSON, either a bare string or a token object.
    pub token: Box<RawValue>,
    /// Full RFC 2822 message.
    #[serde(default)]
    pub message_body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("failed to decode payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to unmarshal payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Payload {
    /// Standard padded base64, then JSON. Line breaks in the base64 text
    /// are ignored, so output wrapped at 76 columns decodes.
    pub fn decode(encoded: &str) -> Result<Self, PayloadError> {
        let unwrapped: Vec<u8> = encoded
            .bytes()
            .filter(|b| !matches!(b, b'\r' | b'\n'))
            .collect();
        let decoded = STANDARD.decode(unwrapped)?;
        Ok(serde_json::from_slice(&decoded)?)
    }
}

#[derive(Serialize)]
pub struct SendResponse {
    /// Serialized token JSON, `null` when it could not be read back.
    pub token: Option<String>,
    pub output: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn decodes_payload() {
        let payload = Payload::decode(&encode(
            r#"{"credentials":{"web":{"client_id":"x"}},"token":"abc","messageBody":"Subject: hi\r\n\r\nbody"}"#,
        ))
        .unwrap();

        assert_eq!(payload.credentials.get(), r#"{"web":{"client_id":"x"}}"#);
        assert_eq!(payload.token.get(), r#""abc""#);
        assert_eq!(payload.message_body, "Subject: hi\r\n\r\nbody");
    }

    #[test]
    fn message_body_defaults_to_empty() {
        let payload = Payload::decode(&encode(r#"{"credentials":{},"token":{}}"#)).unwrap();
        assert!(payload.message_body.is_empty());
    }

    #[test]
    fn ignores_line_breaks_in_base64() {
        let json = format!(
            r#"{{"credentials":{{"web":{{}}}},"token":"abc","messageBody":"{}"}}"#,
            "x".repeat(120)
        );
        let wrapped = encode(&json)
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n")
            + "\n";

        let payload = Payload::decode(&wrapped).unwrap();

        assert_eq!(payload.token.get(), r#""abc""#);
        assert_eq!(payload.message_body.len(), 120);
    }

    #[test]
    fn bad_base64_names_decode_stage() {
        let err = Payload::decode("not*base64").unwrap_err();
        assert!(matches!(err, PayloadError::Base64(_)));
        assert!(err.to_string().starts_with("failed to decode payload: "));
    }

    #[test]
    fn bad_json_names_unmarshal_stage() {
        let err = Payload::decode(&encode("{oops")).unwrap_err();
        assert!(matches!(err, PayloadError::Json(_)));
        assert!(err.to_string().starts_with("failed to unmarshal payload: "));
    }

    #[test]
    fn missing_credentials_is_a_json_error() {
        let err = Payload::decode(&encode(r#"{"token":"abc"}"#)).unwrap_err();
        assert!(matches!(err, PayloadError::Json(_)));
    }

    #[test]
    fn send_response_shape() {
        let response = SendResponse {
            token: None,
            output: Message {
                id: "m".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"token": null, "output": {"id": "m"}})
        );
    }
}
