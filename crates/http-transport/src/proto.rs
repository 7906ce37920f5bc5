use bubble_chat_protocol::{Envelope, History, Message, Role, Session};
use serde_json::{Map, Value};

use crate::config::EnvelopeFields;

/// Keys that may carry a human-readable reason in an error body, in
/// priority order.
const ERROR_DETAIL_FIELDS: [&str; 3] = ["detail", "message", "mensaje"];

const SUCCESS_STATUS: &str = "success";

// ------------------------
// Types sent to the server
// ------------------------

pub fn create_chat_body(
    session: &Session,
    text: &str,
    user_key_field: &str,
) -> Value {
    let mut body = Map::new();
    body.insert("user_query".to_owned(), Value::from(text));
    body.insert("user_id".to_owned(), Value::from(session.user_id()));
    body.insert(user_key_field.to_owned(), Value::from(session.user_key()));
    Value::Object(body)
}

// ------------------------------
// Types received from the server
// ------------------------------

/// Decodes a history payload in either accepted shape: a bare array of
/// messages, or a success envelope whose data is that array.
///
/// Anything else (including bodies that aren't JSON) is an empty history.
pub fn decode_history(body: &[u8], fields: &EnvelopeFields) -> History {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("history payload is not JSON: {err}");
            return History::Empty;
        }
    };

    let entries = match &payload {
        Value::Array(entries) => entries,
        Value::Object(envelope) if is_success(envelope, fields) => {
            match envelope.get(&fields.data) {
                Some(Value::Array(entries)) => entries,
                _ => {
                    debug!("history envelope has no `{}` array", fields.data);
                    return History::Empty;
                }
            }
        }
        _ => {
            debug!("unrecognized history payload: {payload}");
            return History::Empty;
        }
    };

    let messages = entries
        .iter()
        .filter_map(|entry| {
            let message = decode_history_entry(entry);
            if message.is_none() {
                warn!("skipping malformed history entry: {entry}");
            }
            message
        })
        .collect();
    History::from_messages(messages)
}

fn decode_history_entry(entry: &Value) -> Option<Message> {
    let role = entry.get("role")?.as_str()?;
    let content = entry.get("content")?.as_str()?;
    if content.is_empty() {
        return None;
    }
    Some(Message {
        role: Role::from_wire(role),
        content: content.to_owned(),
    })
}

/// Decodes a complete JSON reply to a chat message.
///
/// Only a success status with a non-empty string payload is a success;
/// every other shape is an application-level failure whose reason is the
/// message field, or the body itself.
pub fn decode_envelope(body: &[u8], fields: &EnvelopeFields) -> Envelope {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(payload) => payload,
        Err(_) => {
            let raw = String::from_utf8_lossy(body);
            return Envelope::Failure(raw.into_owned());
        }
    };

    let Value::Object(envelope) = &payload else {
        return Envelope::Failure(payload.to_string());
    };

    if is_success(envelope, fields) {
        if let Some(Value::String(data)) = envelope.get(&fields.data) {
            if !data.is_empty() {
                return Envelope::Success(data.clone());
            }
        }
    }

    let reason = envelope
        .get(&fields.message)
        .and_then(Value::as_str)
        .filter(|reason| !reason.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| find_detail(envelope))
        .unwrap_or_else(|| payload.to_string());
    Envelope::Failure(reason)
}

/// Extracts a human-readable reason from an error response body.
///
/// If the body is a JSON object with a detail-like field, that field is the
/// reason; otherwise it's the raw text. Parse failures are not errors.
pub fn extract_error_message(body: &str) -> String {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_owned();
    };
    find_detail(&object).unwrap_or_else(|| body.trim().to_owned())
}

fn find_detail(object: &Map<String, Value>) -> Option<String> {
    ERROR_DETAIL_FIELDS
        .iter()
        .find_map(|field| match object.get(*field)? {
            Value::Null => None,
            Value::String(detail) => Some(detail.clone()),
            // FastAPI validation errors put a list here.
            detail => Some(detail.to_string()),
        })
}

#[inline]
fn is_success(envelope: &Map<String, Value>, fields: &EnvelopeFields) -> bool {
    envelope.get(&fields.status).and_then(Value::as_str) == Some(SUCCESS_STATUS)
}

#[cfg(test)]
mod tests {
    use bubble_chat_protocol::SessionBuilder;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_chat_body() {
        let session = SessionBuilder::with_identity("u-1", "k-9").build().unwrap();
        assert_eq!(
            create_chat_body(&session, "Hola", "cliente_clave"),
            json!({
                "user_query": "Hola",
                "user_id": "u-1",
                "cliente_clave": "k-9",
            })
        );
        assert_eq!(
            create_chat_body(&session, "Hola", "listaPrecio"),
            json!({
                "user_query": "Hola",
                "user_id": "u-1",
                "listaPrecio": "k-9",
            })
        );
    }

    #[test]
    fn test_decode_history_variants() {
        let fields = EnvelopeFields::default();
        let expected = History::Messages(vec![
            Message::user("Hi"),
            Message::bot("Hello! How can I help?"),
        ]);

        let bare = br#"[
            {"role": "user", "content": "Hi"},
            {"role": "bot", "content": "Hello! How can I help?"}
        ]"#;
        assert_eq!(decode_history(bare, &fields), expected);

        let enveloped = br#"{"status": "success", "data": [
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello! How can I help?"}
        ]}"#;
        assert_eq!(decode_history(enveloped, &fields), expected);

        let spanish = br#"{"estatus": "success", "datos": [
            {"role": "user", "content": "Hi"},
            {"role": "bot", "content": "Hello! How can I help?"}
        ]}"#;
        assert_eq!(decode_history(spanish, &EnvelopeFields::spanish()), expected);
    }

    #[test]
    fn test_decode_empty_or_malformed_history() {
        let fields = EnvelopeFields::default();
        let payloads: [&[u8]; 8] = [
            b"[]",
            br#"{"status": "success", "data": []}"#,
            br#"{"status": "fail"}"#,
            br#"{"status": "success"}"#,
            br#"{"status": "success", "data": "nope"}"#,
            b"null",
            b"",
            b"<html>oops</html>",
        ];
        for payload in payloads {
            assert_eq!(
                decode_history(payload, &fields),
                History::Empty,
                "{}",
                String::from_utf8_lossy(payload)
            );
        }
    }

    #[test]
    fn test_decode_history_skips_bad_entries() {
        let payload = br#"[
            {"role": "user", "content": "kept"},
            {"role": "user"},
            {"content": "no role"},
            {"role": "bot", "content": ""},
            {"role": "bot", "content": 42},
            "garbage"
        ]"#;
        assert_eq!(
            decode_history(payload, &EnvelopeFields::default()),
            History::Messages(vec![Message::user("kept")])
        );
    }

    #[test]
    fn test_decode_envelope() {
        let fields = EnvelopeFields::default();
        assert_eq!(
            decode_envelope(br#"{"status":"success","data":"Hi there"}"#, &fields),
            Envelope::Success("Hi there".to_owned())
        );
        assert_eq!(
            decode_envelope(br#"{"status":"error","mensaje":"bad input"}"#, &fields),
            Envelope::Failure("bad input".to_owned())
        );
        assert_eq!(
            decode_envelope(br#"{"status":"error","detail":"nope"}"#, &fields),
            Envelope::Failure("nope".to_owned())
        );
        assert_eq!(
            decode_envelope(br#"{"status":"success","data":""}"#, &fields),
            Envelope::Failure(r#"{"data":"","status":"success"}"#.to_owned())
        );
        assert_eq!(
            decode_envelope(b"[1,2]", &fields),
            Envelope::Failure("[1,2]".to_owned())
        );
        assert_eq!(
            decode_envelope(b"not json", &fields),
            Envelope::Failure("not json".to_owned())
        );

        let spanish = EnvelopeFields::spanish();
        assert_eq!(
            decode_envelope(br#"{"estatus":"success","datos":"Hola"}"#, &spanish),
            Envelope::Success("Hola".to_owned())
        );
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"detail": "Clave no valida"}"#),
            "Clave no valida"
        );
        assert_eq!(
            extract_error_message(r#"{"message": "rate limited"}"#),
            "rate limited"
        );
        assert_eq!(
            extract_error_message(r#"{"mensaje": "sin datos"}"#),
            "sin datos"
        );
        assert_eq!(
            extract_error_message(r#"{"detail": [{"msg": "field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
        assert_eq!(
            extract_error_message(r#"{"error": "other"}"#),
            r#"{"error": "other"}"#
        );
        assert_eq!(
            extract_error_message("Internal Server Error\n"),
            "Internal Server Error"
        );
        assert_eq!(extract_error_message(""), "");
    }
}
