use std::io;

use serde_json::Value;

use super::format;

pub fn render_banks(data: &Value) -> io::Result<String> {
    let banks = data
        .get("banks")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("banks output requires banks"))?;

    let count_label = if banks.len() == 1 {
        "1 supported bank.".to_string()
    } else {
        format!("{} supported banks.", banks.len())
    };

    let mut lines = vec![count_label];
    for bank in banks {
        lines.push(String::new());
        lines.push(format!(
            "{} ({})",
            text(bank, "display_name"),
            text(bank, "id")
        ));
        lines.extend(format::labelled(&[
            ("File prefix:", format!("{}*", text(bank, "filename_prefix"))),
            ("Columns:", joined(bank, "raw_columns")),
            ("Sign:", text(bank, "sign_convention").to_string()),
            ("Table:", text(bank, "table").to_string()),
        ]));
    }

    Ok(lines.join("\n"))
}

fn text<'a>(bank: &'a Value, key: &str) -> &'a str {
    bank.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

fn joined(bank: &Value, key: &str) -> String {
    bank.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<&str>>()
                .join(", ")
        })
        .unwrap_or_default()
}
