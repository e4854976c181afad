use std::io;

use serde_json::Value;

use super::format::{self, Column};

pub fn render_insights(data: &Value) -> io::Result<String> {
    let outcome = data
        .get("outcome")
        .ok_or_else(|| io::Error::other("insights output requires outcome"))?;
    let bank_name = text(data, "bank_name");
    let from = text(data, "from");
    let to = text(data, "to");

    let Some(aggregate) = outcome.get("aggregate") else {
        return Ok([
            format!("No {bank_name} transactions between {from} and {to}."),
            String::new(),
            "Run `stashbook import list` to see which statements are loaded.".to_string(),
        ]
        .join("\n"));
    };

    let mut lines = vec![format!("{bank_name}: {from} to {to}")];
    lines.push(String::new());
    lines.push("Totals:".to_string());
    lines.extend(format::labelled(&[
        ("Money in (credit):", text(aggregate, "total_credit").to_string()),
        ("Money out (debit):", text(aggregate, "total_debit").to_string()),
        (
            "Transactions:",
            aggregate
                .get("transaction_count")
                .and_then(Value::as_i64)
                .unwrap_or(0)
                .to_string(),
        ),
    ]));

    lines.push(String::new());
    lines.push("By category:".to_string());
    lines.extend(render_categories(aggregate));

    lines.push(String::new());
    lines.push("By day:".to_string());
    lines.extend(render_days(aggregate));

    Ok(lines.join("\n"))
}

/// Largest categories first; ties keep alphabetical order.
fn render_categories(aggregate: &Value) -> Vec<String> {
    let Some(categories) = aggregate.get("by_category").and_then(Value::as_object) else {
        return vec!["  None.".to_string()];
    };

    let mut rows = categories
        .iter()
        .map(|(detail, amount)| {
            let amount_text = amount.as_str().unwrap_or("0.00").to_string();
            let sort_key = amount_text.parse::<f64>().unwrap_or(0.0);
            (detail.clone(), amount_text, sort_key)
        })
        .collect::<Vec<(String, String, f64)>>();
    rows.sort_by(|left, right| right.2.total_cmp(&left.2));

    let columns = [
        Column::left("Detail").flexible(),
        Column::right("Amount"),
    ];
    let table_rows = rows
        .into_iter()
        .map(|(detail, amount, _)| vec![detail, amount])
        .collect::<Vec<Vec<String>>>();

    format::table(&columns, &table_rows, format::terminal_width())
}

fn render_days(aggregate: &Value) -> Vec<String> {
    let Some(days) = aggregate.get("by_day").and_then(Value::as_object) else {
        return vec!["  None.".to_string()];
    };

    let columns = [
        Column::left("Date"),
        Column::right("Credit"),
        Column::right("Debit"),
    ];
    let table_rows = days
        .iter()
        .map(|(day, totals)| {
            vec![
                day.clone(),
                text(totals, "credit").to_string(),
                text(totals, "debit").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    format::table(&columns, &table_rows, format::terminal_width())
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_insights;

    #[test]
    fn no_data_renders_hint() {
        let payload = json!({
            "bank_name": "American Express",
            "from": "2024-03-01",
            "to": "2024-03-31",
            "outcome": { "kind": "no_data" }
        });

        let rendered = render_insights(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with(
                "No American Express transactions between 2024-03-01 and 2024-03-31."
            ));
        }
    }

    #[test]
    fn aggregate_lists_largest_category_first() {
        let payload = json!({
            "bank_name": "Scotia Bank Debit",
            "from": "2024-03-01",
            "to": "2024-03-05",
            "outcome": {
                "kind": "data",
                "aggregate": {
                    "total_credit": "2500.00",
                    "total_debit": "1600.00",
                    "transaction_count": 4,
                    "by_category": {
                        "loblaws": "100.00",
                        "payroll deposit": "2500.00",
                        "rent": "1500.00"
                    },
                    "by_day": {
                        "2024-03-01": { "credit": "2500.00", "debit": "0" },
                        "2024-03-05": { "credit": "0", "debit": "1535.90" }
                    }
                }
            }
        });

        let rendered = render_insights(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Money out (debit):  1600.00"));
            let payroll = text.find("payroll deposit");
            let rent = text.find("rent");
            let loblaws = text.find("loblaws");
            assert!(payroll < rent && rent < loblaws);
            assert!(text.contains("1535.90"));
        }
    }
}
