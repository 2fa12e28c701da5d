//! JSON envelopes written to standard output.

use serde::Serialize;
use serde_json::{json, Value};

/// `{"success": true, ...body}`.
#[derive(Serialize)]
pub struct Success<'a, T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

impl<'a, T: Serialize> Success<'a, T> {
    pub fn new(body: &'a T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

pub fn success_json<T: Serialize>(body: &T) -> String {
    serde_json::to_string_pretty(&Success::new(body))
        .unwrap_or_else(|err| failure_json(&format!("failed to serialize result: {err}")))
}

pub fn failure_value(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

pub fn failure_json(message: &str) -> String {
    failure_value(message).to_string()
}
