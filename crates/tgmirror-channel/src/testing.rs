//! Bot API stand-in for handler tests

use serde_json::{json, Value};
use teloxide::Bot;
use url::Url;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CHANNEL_ID: i64 = -1001234567890;
pub const LOG_CHAT_ID: i64 = -1009876543210;
/// Id of every message the stand-in reports as sent or edited
pub const SENT_MESSAGE_ID: i32 = 500;

pub fn bot(server: &MockServer) -> Bot {
    Bot::new("123:abc").set_api_url(Url::parse(&server.uri()).unwrap())
}

pub fn log_chat_message(message_id: i32) -> Value {
    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": {"id": LOG_CHAT_ID, "type": "supergroup", "title": "Mirror log"},
        "text": "entry"
    })
}

/// Answer the Bot API methods the mirror calls
pub async fn mount_telegram(server: &MockServer) {
    let sent = json!({"ok": true, "result": log_chat_message(SENT_MESSAGE_ID)});
    for name in ["sendmessage", "editmessagetext", "editmessagereplymarkup"] {
        Mock::given(method("POST"))
            .and(path_regex(format!("(?i)/{name}$")))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent.clone()))
            .mount(server)
            .await;
    }
    for name in ["answercallbackquery", "deletemessage"] {
        Mock::given(method("POST"))
            .and(path_regex(format!("(?i)/{name}$")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
            .mount(server)
            .await;
    }
}

/// Bot API method name, or method and path for any other request
pub fn call_name(request: &Request) -> String {
    let path = request.url.path();
    if path.starts_with("/bot") {
        path.rsplit('/').next().unwrap_or_default().to_lowercase()
    } else {
        format!("{} {}", request.method, path)
    }
}

/// Every request the server saw, in order
pub async fn calls(server: &MockServer) -> Vec<(String, Value)> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            (call_name(request), body)
        })
        .collect()
}

pub fn names(calls: &[(String, Value)]) -> Vec<&str> {
    calls.iter().map(|(name, _)| name.as_str()).collect()
}
