use std::cmp;
use std::io;

use chrono::{Local, TimeZone};
use serde_json::Value;

use super::format::{self, Column};

/// Rows listed per problem section before the rest is summarized as a count.
const PREVIEW_LIMIT: usize = 10;

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let summary = data
        .get("summary")
        .and_then(Value::as_object)
        .ok_or_else(|| io::Error::other("import output requires summary"))?;

    let mut lines = vec![value_str(data, "message").to_string()];
    lines.push(String::new());
    lines.push("Summary:".to_string());

    let mut entries = Vec::new();
    if let Some(import_id) = data.get("import_id").and_then(Value::as_str) {
        entries.push(("Import ID:", import_id.to_string()));
    }
    entries.push((
        "Bank:",
        format!(
            "{} ({})",
            value_str(data, "bank_name"),
            value_str(data, "bank_id")
        ),
    ));
    entries.push(("Status:", value_str(data, "status").to_string()));
    entries.push(("Rows read:", get_i64(summary, "rows_read").to_string()));
    entries.push(("Rows dropped:", get_i64(summary, "rows_dropped").to_string()));
    entries.push((
        "Empty detail:",
        get_i64(summary, "rows_empty_detail").to_string(),
    ));
    entries.push(("Inserted:", get_i64(summary, "inserted").to_string()));
    entries.push(("Duplicates:", get_i64(summary, "duplicates").to_string()));
    entries.push(("Rejected:", get_i64(summary, "rejected").to_string()));
    lines.extend(format::labelled(&entries));

    let dropped = render_dropped_rows(data);
    if !dropped.is_empty() {
        lines.push(String::new());
        lines.extend(dropped);
    }

    let empty_detail = render_empty_detail_rows(data);
    if !empty_detail.is_empty() {
        lines.push(String::new());
        lines.extend(empty_detail);
    }

    let rejected = render_rejected_rows(data);
    if !rejected.is_empty() {
        lines.push(String::new());
        lines.extend(rejected);
    }

    lines.push(String::new());
    if dry_run {
        lines.push("No rows were written because this was a dry run.".to_string());
        lines.push(format!(
            "Run `stashbook import create {}` to write them.",
            value_str(data, "path")
        ));
    } else {
        lines.push(format!("Ledger: {}", value_str(data, "db_path")));
    }

    Ok(lines.join("\n"))
}

pub fn render_import_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("import list output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "No imports found yet.",
            "",
            "Run your first import:",
            "  1. stashbook import create --help",
            "  2. stashbook import create --dry-run <path>",
            "  3. stashbook import create <path>",
        ]
        .join("\n"));
    }

    let mut ordered_rows = rows.to_vec();
    ordered_rows.sort_by(compare_import_rows);

    let count_label = if ordered_rows.len() == 1 {
        "1 import found.".to_string()
    } else {
        format!("{} imports found.", ordered_rows.len())
    };

    let columns = [
        Column::left("Import ID"),
        Column::left("Bank"),
        Column::left("Created (local)"),
        Column::left("Source").flexible(),
        Column::right("Rows Read"),
        Column::right("Inserted"),
        Column::right("Rejected"),
    ];

    let table_rows = ordered_rows
        .iter()
        .map(|row| {
            vec![
                value_str(row, "import_id").to_string(),
                value_str(row, "bank_id").to_string(),
                format_created_local(row),
                row.get("source_name")
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string(),
                value_i64(row, "rows_read").to_string(),
                value_i64(row, "inserted").to_string(),
                value_i64(row, "rejected").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![count_label, String::new(), "Imports:".to_string()];
    lines.extend(format::table(&columns, &table_rows, format::terminal_width()));

    Ok(lines.join("\n"))
}

fn render_dropped_rows(data: &Value) -> Vec<String> {
    let rows = array(data, "dropped_rows");
    if rows.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["Dropped rows:".to_string()];
    for row in rows.iter().take(PREVIEW_LIMIT) {
        lines.push(format!(
            "  Row {}: {} ({})",
            value_i64(row, "row"),
            value_str(row, "reason"),
            value_str(row, "field")
        ));
    }
    push_remainder(&mut lines, rows.len());
    lines
}

fn render_empty_detail_rows(data: &Value) -> Vec<String> {
    let rows = array(data, "empty_detail_rows");
    if rows.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["Rows with no usable detail (not stored):".to_string()];
    for row in rows.iter().take(PREVIEW_LIMIT) {
        lines.push(format!(
            "  Row {}: \"{}\"",
            value_i64(row, "row"),
            value_str(row, "raw_detail")
        ));
    }
    push_remainder(&mut lines, rows.len());
    lines
}

fn render_rejected_rows(data: &Value) -> Vec<String> {
    let rows = array(data, "rejected_rows");
    if rows.is_empty() {
        return Vec::new();
    }

    let columns = [
        Column::right("Row"),
        Column::left("Date"),
        Column::left("Type"),
        Column::left("Detail").flexible(),
        Column::right("Amount"),
        Column::left("Reason").flexible(),
    ];

    let table_rows = rows
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|row| {
            let reason = match row.get("message").and_then(Value::as_str) {
                Some(message) => format!("{}: {message}", value_str(row, "reason")),
                None => value_str(row, "reason").to_string(),
            };
            vec![
                value_i64(row, "row").to_string(),
                value_str(row, "transaction_date").to_string(),
                value_str(row, "purchase_type").to_string(),
                value_str(row, "detail").to_string(),
                value_str(row, "amount").to_string(),
                reason,
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec!["Rows not inserted:".to_string()];
    lines.extend(format::table(&columns, &table_rows, format::terminal_width()));
    push_remainder(&mut lines, rows.len());
    lines
}

fn push_remainder(lines: &mut Vec<String>, total: usize) {
    let hidden = total.saturating_sub(PREVIEW_LIMIT);
    if hidden > 0 {
        lines.push(format!("  ... and {hidden} more (use --json for all rows)"));
    }
}

fn array<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn value_str<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("unknown")
}

fn value_i64(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn get_i64(map: &serde_json::Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn compare_import_rows(left: &Value, right: &Value) -> cmp::Ordering {
    let left_created_at = parse_created_at(left).unwrap_or(0);
    let right_created_at = parse_created_at(right).unwrap_or(0);

    right_created_at
        .cmp(&left_created_at)
        .then_with(|| value_str(right, "import_id").cmp(value_str(left, "import_id")))
}

fn parse_created_at(row: &Value) -> Option<i64> {
    let raw = row.get("created_at")?;
    if let Some(value) = raw.as_i64() {
        return Some(value);
    }
    raw.as_str().and_then(|text| text.parse::<i64>().ok())
}

fn format_created_local(row: &Value) -> String {
    let Some(created_at) = parse_created_at(row) else {
        return "unknown".to_string();
    };
    let Some(local_dt) = Local.timestamp_opt(created_at, 0).single() else {
        return "unknown".to_string();
    };
    local_dt.format("%Y-%m-%d %H:%M:%S %:z").to_string()
}
