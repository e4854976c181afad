use std::io;

use serde::Serialize;
use serde_json::Value;
use stashbook_client::{ClientError, FailureEnvelope, SuccessEnvelope};

/// Version of the JSON output shape, independent of the binary version.
const JSON_VERSION: &str = "v1";

#[derive(Serialize)]
struct JsonSuccess<'a> {
    ok: bool,
    version: &'static str,
    data: &'a Value,
}

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    pretty(&JsonSuccess {
        ok: true,
        version: JSON_VERSION,
        data: &success.data,
    })
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    pretty(&FailureEnvelope::from(error))
}

fn pretty(value: &impl Serialize) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
