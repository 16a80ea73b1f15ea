#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const SCENARIO_A: &str = "Buy when RSI(14) crosses above 30 and volume spikes 1.5x average. \
                          Exit at RSI 70 or 5% profit.";

const SCENARIO_B: &[&str] = &[
    "Indicator",
    "Signal Generation",
    "Simple",
    "No",
    "Personal",
    "Rapid Prototype",
    "None",
    "Standard OHLCV",
    "No",
    "Basic",
    "Basic",
];

fn intake(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pine-intake").unwrap();
    cmd.current_dir(dir.path()).env("PINE_INTAKE_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    intake(dir).arg("init").assert().success();
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn start_session(dir: &TempDir) -> String {
    let v = json_output(intake(dir).args(["session", "start"]));
    v["session"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// init / config
// ---------------------------------------------------------------------------

#[test]
fn init_creates_layout() {
    let dir = TempDir::new().unwrap();
    intake(&dir).arg("init").assert().success();

    assert!(dir.path().join(".pine-intake").is_dir());
    assert!(dir.path().join(".pine-intake/sessions").is_dir());
    assert!(dir.path().join(".pine-intake/config.yaml").exists());
    assert!(dir.path().join("projects/analysis").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    intake(&dir).arg("init").assert().success();
    intake(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}

#[test]
fn config_validate_after_init() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    intake(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_requires_init() {
    let dir = TempDir::new().unwrap();
    intake(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".pine-intake/config.yaml"),
        "refinement:\n  max_attempts: 0\n",
    )
    .unwrap();
    intake(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("max_attempts"));
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn tree_validate_reports_depth() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args(["tree", "validate"]));
    assert_eq!(v["valid"], true);
    assert_eq!(v["depth"], 14);
    assert_eq!(v["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn tree_show_lists_root_question() {
    let dir = TempDir::new().unwrap();
    intake(&dir)
        .args(["tree", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("script_type"))
        .stdout(predicate::str::contains("Indicator -> indicator_purpose"));
}

// ---------------------------------------------------------------------------
// session
// ---------------------------------------------------------------------------

#[test]
fn session_scenario_b_end_to_end() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_session(&dir);

    let mut last = Value::Null;
    for input in SCENARIO_B {
        last = json_output(intake(&dir).args(["session", "answer", &id, input]));
    }
    assert_eq!(last["status"], "complete");
    assert_eq!(last["answers"], 11);

    let v = json_output(intake(&dir).args([
        "session", "finish", &id, "--confirm", "yes", "--save",
    ]));
    assert_eq!(v["status"], "accepted");
    assert_eq!(v["specification"]["detected_type"], "indicator");
    assert_eq!(v["specification"]["subtype"], "Simple Signals");

    let path = v["path"].as_str().unwrap();
    assert!(path.contains("projects/analysis/analysis_"));
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved["analysis_id"], v["analysis_id"]);
    assert_eq!(saved["detailed_spec"]["subtype"], "Simple Signals");
}

#[test]
fn session_invalid_answer_reprompts() {
    let dir = TempDir::new().unwrap();
    let id = start_session(&dir);
    intake(&dir)
        .args(["session", "answer", &id, "banana"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please choose one of: Indicator, Strategy, Library",
        ));

    let v = json_output(intake(&dir).args(["session", "show", &id]));
    assert_eq!(v["question"]["id"], "script_type");
    assert_eq!(v["complete"], false);
}

#[test]
fn session_not_sure_shows_help_without_advancing() {
    let dir = TempDir::new().unwrap();
    let id = start_session(&dir);
    intake(&dir)
        .args(["session", "answer", &id, "Indicator"])
        .assert()
        .success();

    let v = json_output(intake(&dir).args(["session", "answer", &id, "Not sure"]));
    assert_eq!(v["status"], "help");
    assert_eq!(v["question"]["id"], "indicator_purpose");
    assert_eq!(v["answers"], 1);
    assert!(v["message"].as_str().unwrap().contains("Signal generation"));
}

#[test]
fn session_finish_requires_completion() {
    let dir = TempDir::new().unwrap();
    let id = start_session(&dir);
    intake(&dir)
        .args(["session", "finish", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not complete"));
}

#[test]
fn session_rewind_drops_later_answers() {
    let dir = TempDir::new().unwrap();
    let id = start_session(&dir);
    for input in ["Strategy", "Breakout", "Moderate"] {
        intake(&dir)
            .args(["session", "answer", &id, input])
            .assert()
            .success();
    }
    let v = json_output(intake(&dir).args(["session", "rewind", &id, "strategy_purpose"]));
    assert_eq!(v["answers"], 1);
    assert_eq!(v["question"]["id"], "strategy_purpose");
}

#[test]
fn session_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    intake(&dir)
        .args(["session", "show", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session not found"));
}

#[test]
fn session_list_and_discard() {
    let dir = TempDir::new().unwrap();
    let id = start_session(&dir);
    let v = json_output(intake(&dir).args(["session", "list"]));
    assert_eq!(v.as_array().unwrap().len(), 1);

    intake(&dir)
        .args(["session", "discard", &id])
        .assert()
        .success();
    let v = json_output(intake(&dir).args(["session", "list"]));
    assert!(v.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// interview
// ---------------------------------------------------------------------------

#[test]
fn interview_over_stdin() {
    let dir = TempDir::new().unwrap();
    let mut input = SCENARIO_B.join("\n");
    input.push_str("\nyes\n");
    intake(&dir)
        .arg("interview")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Subtype: Simple Signals"))
        .stdout(predicate::str::contains("Accepted (analysis"));
}

#[test]
fn interview_reprompts_and_helps() {
    let dir = TempDir::new().unwrap();
    let mut input = String::from("banana\nnot sure\n");
    input.push_str(&SCENARIO_B.join("\n"));
    input.push('\n');
    intake(&dir)
        .arg("interview")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Please choose one of:"))
        .stdout(predicate::str::contains("A strategy also"))
        .stdout(predicate::str::contains("Specification not confirmed."));
}

#[test]
fn interview_truncated_input_fails() {
    let dir = TempDir::new().unwrap();
    intake(&dir)
        .arg("interview")
        .write_stdin("Indicator\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input ended"));
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[test]
fn analyze_scenario_a() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args(["analyze", "--text", SCENARIO_A]));
    assert_eq!(v["status"], "pending");
    let spec = &v["specification"];
    assert_eq!(spec["main_indicators"], serde_json::json!(["rsi"]));
    assert_eq!(spec["detected_type"], "strategy");
    assert_eq!(spec["strategy_type"], "custom");
    assert!(spec["implementation_requirements"]["entry_logic"][0]
        .as_str()
        .unwrap()
        .starts_with("buy when"));
}

#[test]
fn analyze_reads_stdin_and_prints_summary() {
    let dir = TempDir::new().unwrap();
    intake(&dir)
        .args(["analyze", "--title", "RSI Scalper", "--author", "Chart Lab"])
        .write_stdin(SCENARIO_A)
        .assert()
        .success()
        .stdout(predicate::str::contains("Source: RSI Scalper"))
        .stdout(predicate::str::contains("Detected Type: STRATEGY"))
        .stdout(predicate::str::contains("Is this understanding correct?"));
}

#[test]
fn analyze_refinement_then_accept() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args([
        "analyze",
        "--text",
        SCENARIO_A,
        "--confirm",
        "You missed the MACD",
        "--confirm",
        "looks good",
    ]));
    assert_eq!(v["status"], "accepted");
    assert_eq!(v["refinements"][0]["route"], "missing_components");
    assert_eq!(
        v["specification"]["main_indicators"],
        serde_json::json!(["rsi", "macd"])
    );
}

#[test]
fn analyze_refinement_limit() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".pine-intake/config.yaml"),
        "refinement:\n  max_attempts: 1\n",
    )
    .unwrap();
    intake(&dir)
        .args([
            "analyze", "--text", SCENARIO_A, "--confirm", "add MACD", "--confirm", "add ATR",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refinement limit reached"));
}

#[test]
fn analyze_invalid_utf8_falls_back_to_description() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("transcript.bin");
    std::fs::write(&file, [b'R', b'S', b'I', 0xff, 0xfe]).unwrap();

    intake(&dir)
        .args(["analyze", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("not valid UTF-8 (byte offset 3)"))
        .stdout(predicate::str::contains("--describe"));

    let v = json_output(
        intake(&dir)
            .args(["analyze", "--file"])
            .arg(&file)
            .args(["--describe", "An RSI divergence indicator"]),
    );
    assert_eq!(v["specification"]["detected_type"], "indicator");
}

#[test]
fn analyze_empty_transcript_uses_description() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args([
        "analyze",
        "--text",
        "",
        "--describe",
        "An RSI divergence indicator",
    ]));
    assert_eq!(v["status"], "pending");
    assert_eq!(v["specification"]["detected_type"], "indicator");
    assert_eq!(v["specification"]["main_indicators"], serde_json::json!(["rsi"]));
}

#[test]
fn analyze_unrelated_text_asks_for_description() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args(["analyze", "--text", "The weather is lovely today."]));
    assert_eq!(v["status"], "needs_description");
    assert!(v["reason"].as_str().unwrap().contains("No trading content"));

    let output = intake(&dir)
        .args(["analyze", "--text", "   "])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No transcript text was provided."));
    assert!(!stdout.contains("nothing to assemble"));

    let v = json_output(intake(&dir).args([
        "analyze",
        "--text",
        "",
        "--describe",
        "something nice",
    ]));
    assert_eq!(v["status"], "needs_description");
    assert!(v["message"].as_str().unwrap().contains("description did not mention"));
}

#[test]
fn analyze_reports_unsupported_concepts() {
    let dir = TempDir::new().unwrap();
    let v = json_output(intake(&dir).args([
        "analyze",
        "--text",
        "An RSI indicator that uses machine learning and the order book.",
    ]));
    let feasibility = &v["specification"]["feasibility"];
    assert_eq!(feasibility["overall"], "limited");
    assert_eq!(feasibility["limitations"].as_array().unwrap().len(), 2);
}
