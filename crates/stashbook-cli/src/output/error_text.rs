use serde_json::Value;
use stashbook_client::ClientError;

use super::format;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![error.message.clone(), String::new()];

    let mut facts = vec![("code:".to_string(), error.code.clone())];
    if let Some(Value::Object(data)) = &error.data {
        facts.extend(data.iter().filter_map(|(key, value)| {
            Some((format!("{}:", key.replace('_', " ")), flatten(value)?))
        }));
    }
    let rows = facts
        .iter()
        .map(|(label, value)| (label.as_str(), value.clone()))
        .collect::<Vec<(&str, String)>>();
    lines.extend(format::labelled(&rows));

    lines.push(String::new());
    lines.push("Next steps:".to_string());
    let fallback = [fallback_step(error)];
    let steps = if error.recovery_steps.is_empty() {
        &fallback[..]
    } else {
        &error.recovery_steps[..]
    };
    for (number, step) in (1..).zip(steps) {
        lines.push(format!("  {number}. {step}"));
    }

    lines.join("\n")
}

fn fallback_step(error: &ClientError) -> String {
    if error.is_internal() {
        "Rerun with `--verbose` to see where stashbook stopped.".to_string()
    } else {
        "Run `stashbook --help` for usage.".to_string()
    }
}

/// Scalars and lists of scalars read fine on one line; nested objects stay JSON-only.
fn flatten(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
                _ => None,
            })
            .collect::<Option<Vec<String>>>()
            .map(|items| items.join(", ")),
        Value::Null | Value::Object(_) => None,
    }
}
