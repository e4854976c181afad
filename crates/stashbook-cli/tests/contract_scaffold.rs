use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

const AMEX_STATEMENT: &str = "\
03/15/2024,STARBUCKS #4512  TORONTO ON,6.25
03/16/2024,PAYMENT FROM - *****12*3456,-500.00
03/17/2024,LOBLAWS 1021,42.50
";

static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

struct CliRun {
    code: Option<i32>,
    stdout: String,
}

impl CliRun {
    fn success(&self) -> bool {
        self.code == Some(0)
    }
}

fn unique_test_home() -> PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(value) => value.as_nanos(),
        Err(_) => 0,
    };
    let sequence = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!(
        "stashbook-cli-test-{}-{stamp}-{sequence}",
        std::process::id()
    ));
    path
}

fn run_cli_in_home(home: &Path, args: &[&str]) -> CliRun {
    let mut command = Command::new(env!("CARGO_BIN_EXE_stashbook"));
    command.args(args);
    command.env("STASHBOOK_HOME", home).env("COLUMNS", "200");
    command.env_remove("RUST_LOG");
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let output = command.output();
    assert!(output.is_ok());
    if let Ok(result) = output {
        let stdout = String::from_utf8(result.stdout);
        assert!(stdout.is_ok());
        if let Ok(stdout_text) = stdout {
            return CliRun {
                code: result.status.code(),
                stdout: stdout_text,
            };
        }
    }

    CliRun {
        code: None,
        stdout: String::new(),
    }
}

fn run_cli(args: &[&str]) -> (CliRun, PathBuf) {
    let home = unique_test_home();
    let run = run_cli_in_home(&home, args);
    (run, home)
}

fn write_source_file(home: &Path, name: &str, body: &str) -> PathBuf {
    let create_home = fs::create_dir_all(home);
    assert!(create_home.is_ok());

    let source_path = home.join(name);
    let write = fs::write(&source_path, body);
    assert!(write.is_ok());
    source_path
}

fn parse_json(body: &str) -> Value {
    let parsed = serde_json::from_str::<Value>(body);
    assert!(parsed.is_ok(), "not json: {body}");
    if let Ok(value) = parsed {
        return value;
    }
    Value::Null
}

fn assert_text_error_contract(body: &str, code: &str) {
    let code_value = body
        .lines()
        .find_map(|line| line.trim().strip_prefix("code:"))
        .map(str::trim);
    assert_eq!(code_value, Some(code));
    assert!(body.contains("\nNext steps:\n  1. "));
}

fn assert_json_error_contract(body: &str, code: &str) -> Value {
    let payload = parse_json(body);
    assert_eq!(payload["error"]["code"], Value::String(code.to_string()));
    assert!(payload["error"]["message"].is_string());
    assert!(payload["error"]["recovery_steps"].is_array());
    payload
}

fn assert_pipe_close_does_not_panic(args: &[&str], expect_success: bool) {
    let home = unique_test_home();
    let mut producer = Command::new(env!("CARGO_BIN_EXE_stashbook"));
    producer.args(args);
    producer.env("STASHBOOK_HOME", &home);
    producer.stdout(Stdio::piped());
    producer.stderr(Stdio::piped());

    let producer_spawn = producer.spawn();
    assert!(producer_spawn.is_ok());
    if let Ok(mut producer_child) = producer_spawn {
        let producer_stdout = producer_child.stdout.take();
        let producer_stderr = producer_child.stderr.take();
        assert!(producer_stdout.is_some());
        assert!(producer_stderr.is_some());

        if let Some(stdout_pipe) = producer_stdout {
            let mut reader = BufReader::new(stdout_pipe);
            let mut first_line = String::new();
            let read_result = reader.read_line(&mut first_line);
            assert!(read_result.is_ok());
            assert!(!first_line.is_empty());
            drop(reader);
        }

        let status = producer_child.wait();
        assert!(status.is_ok());
        if let Ok(exit_status) = status {
            assert_eq!(exit_status.success(), expect_success);
        }

        if let Some(mut stderr_pipe) = producer_stderr {
            let mut stderr_bytes = Vec::new();
            let stderr_read = stderr_pipe.read_to_end(&mut stderr_bytes);
            assert!(stderr_read.is_ok());
            let stderr = String::from_utf8(stderr_bytes);
            assert!(stderr.is_ok());
            if let Ok(stderr_text) = stderr {
                assert!(!stderr_text.contains("Broken pipe"));
                assert!(!stderr_text.contains("failed printing to stdout"));
            }
        }
    }
}

#[test]
fn root_command_uses_short_plaintext_help() {
    let (run, _) = run_cli(&[]);
    assert!(run.success());
    assert!(run.stdout.starts_with("Stashbook - bank statement ledger"));
    assert!(run.stdout.contains("stashbook banks"));
}

#[test]
fn help_and_version_return_success_output() {
    let (help, _) = run_cli(&["--help"]);
    assert!(help.success());
    assert!(help.stdout.contains("stashbook import create --dry-run <path>"));
    assert!(help.stdout.contains("STASHBOOK_HOME"));

    let (version, _) = run_cli(&["--version"]);
    assert!(version.success());
    assert!(version.stdout.contains("stashbook"));
}

#[test]
fn import_create_help_explains_file_prefixes() {
    let (run, _) = run_cli(&["import", "create", "--help"]);
    assert!(run.success());
    assert!(run.stdout.contains("amex_credit*"));
    assert!(run.stdout.contains("--bank"));
    assert!(run.stdout.contains("--dry-run"));
}

#[test]
fn help_output_pipe_close_does_not_panic() {
    assert_pipe_close_does_not_panic(&["--help"], true);
}

#[test]
fn error_output_pipe_close_does_not_panic() {
    assert_pipe_close_does_not_panic(&["import", "create", "nothing_here.csv"], false);
}

#[test]
fn banks_plaintext_and_json_contracts_are_supported() {
    let (text, home) = run_cli(&["banks"]);
    assert!(text.success());
    assert!(text.stdout.starts_with("3 supported banks."));
    assert!(text.stdout.contains("American Express (amex_green)"));
    assert!(!home.join("ledger.db").exists());

    let (json, _) = run_cli(&["banks", "--json"]);
    assert!(json.success());
    let payload = parse_json(&json.stdout);
    assert_eq!(payload["ok"], Value::Bool(true));
    assert_eq!(payload["version"], "v1");
    assert_eq!(payload["data"]["banks"][1]["id"], "scotia_visa_credit");
}

#[test]
fn import_then_insights_round_trip_through_the_binary() {
    let home = unique_test_home();
    let source = write_source_file(&home, "amex_credit_march.csv", AMEX_STATEMENT);
    let source_arg = source.display().to_string();

    let imported = run_cli_in_home(&home, &["import", "create", &source_arg, "--json"]);
    assert!(imported.success());
    let payload = parse_json(&imported.stdout);
    assert_eq!(payload["data"]["status"], "inserted");
    assert_eq!(payload["data"]["summary"]["inserted"], 3);
    assert!(payload["data"]["import_id"].is_string());
    assert!(home.join("ledger.db").exists());

    let insights = run_cli_in_home(
        &home,
        &[
            "insights",
            "--bank",
            "amex_green",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-31",
            "--json",
        ],
    );
    assert!(insights.success());
    let summary = parse_json(&insights.stdout);
    let aggregate = &summary["data"]["outcome"]["aggregate"];
    assert_eq!(summary["data"]["outcome"]["kind"], "data");
    assert_eq!(aggregate["total_debit"], "48.75");
    assert_eq!(aggregate["total_credit"], "500.00");
    assert_eq!(aggregate["by_category"]["internal transfer"], "500.00");

    let text = run_cli_in_home(
        &home,
        &[
            "insights",
            "--bank",
            "amex_green",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-31",
        ],
    );
    assert!(text.success());
    assert!(text.stdout.starts_with("American Express: 2024-03-01 to 2024-03-31"));
    assert!(text.stdout.contains("starbucks"));
}

#[test]
fn reimport_reports_duplicates_in_plaintext() {
    let home = unique_test_home();
    let source = write_source_file(&home, "amex_credit_march.csv", AMEX_STATEMENT);
    let source_arg = source.display().to_string();

    let first = run_cli_in_home(&home, &["import", "create", &source_arg]);
    assert!(first.success());
    assert!(first.stdout.contains("Import ID:"));

    let second = run_cli_in_home(&home, &["import", "create", &source_arg]);
    assert!(second.success());
    assert!(second.stdout.contains("Rows not inserted:"));
    assert!(second.stdout.contains("duplicate_key"));

    let listed = run_cli_in_home(&home, &["import", "list", "--json"]);
    assert!(listed.success());
    let payload = parse_json(&listed.stdout);
    assert_eq!(payload["data"]["rows"].as_array().map(Vec::len), Some(2));
}

#[test]
fn dry_run_writes_nothing() {
    let home = unique_test_home();
    let source = write_source_file(&home, "amex_credit_march.csv", AMEX_STATEMENT);
    let source_arg = source.display().to_string();

    let dry_run = run_cli_in_home(&home, &["import", "create", "--dry-run", &source_arg]);
    assert!(dry_run.success());
    assert!(
        dry_run
            .stdout
            .contains("No rows were written because this was a dry run.")
    );

    let listed = run_cli_in_home(&home, &["import", "list"]);
    assert!(listed.success());
    assert!(listed.stdout.starts_with("No imports found yet."));
}

#[test]
fn insights_without_data_is_a_successful_no_data_outcome() {
    let (run, _) = run_cli(&[
        "insights",
        "--bank",
        "scotia_visa_credit",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
    ]);
    assert!(run.success());
    assert!(run.stdout.starts_with("No Scotia Bank Credit transactions"));
}

#[test]
fn reversed_range_is_a_user_error() {
    let (run, home) = run_cli(&[
        "insights",
        "--bank",
        "amex_green",
        "--from",
        "2024-03-31",
        "--to",
        "2024-03-01",
        "--json",
    ]);
    assert_eq!(run.code, Some(1));
    assert_json_error_contract(&run.stdout, "invalid_date_range");
    assert!(!home.join("ledger.db").exists());
}

#[test]
fn unrecognized_file_name_uses_plaintext_error_contract() {
    let home = unique_test_home();
    let source = write_source_file(&home, "chase_march.csv", AMEX_STATEMENT);
    let source_arg = source.display().to_string();

    let run = run_cli_in_home(&home, &["import", "create", &source_arg]);
    assert_eq!(run.code, Some(1));
    assert_text_error_contract(&run.stdout, "unrecognized_source");
    assert!(run.stdout.contains("amex_credit"));
    assert!(!home.join("ledger.db").exists());
}

#[test]
fn malformed_date_argument_is_invalid_argument_json() {
    let (run, _) = run_cli(&[
        "insights",
        "--bank",
        "amex_green",
        "--from",
        "2024-3-1",
        "--to",
        "2024-03-31",
        "--json",
    ]);
    assert_eq!(run.code, Some(1));
    let payload = assert_json_error_contract(&run.stdout, "invalid_argument");
    assert_eq!(
        payload["error"]["recovery_steps"][0],
        "Run `stashbook insights --help` for usage."
    );
}

#[test]
fn corrupt_ledger_exits_with_internal_code() {
    let home = unique_test_home();
    let _ = write_source_file(
        &home,
        "ledger.db",
        "this is not sqlite, just text padding past the header",
    );

    let run = run_cli_in_home(&home, &["import", "list", "--json"]);
    assert_eq!(run.code, Some(2));
    let payload = parse_json(&run.stdout);
    let code = payload["error"]["code"].as_str().unwrap_or_default();
    assert!(
        code == "ledger_corrupt" || code == "migration_failed",
        "unexpected code {code}"
    );
}
