//! Integration tests for the comply CLI
//!
//! Each test runs the binary end-to-end inside a fresh temporary project.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A comply command acting as a fixed user, isolated from any global config
fn comply(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("comply").unwrap();
    cmd.current_dir(tmp.path())
        .env("COMPLY_AUTHOR", "dpo")
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".xdg"))
        .env_remove("COMPLY_PAGE_SIZE")
        .env("NO_COLOR", "1");
    cmd
}

fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    comply(&tmp).arg("init").assert().success();
    tmp
}

/// Run a creating command with `--format id` and return the printed ID
fn create(tmp: &TempDir, args: &[&str]) -> String {
    let output = comply(tmp)
        .args(args)
        .args(["--format", "id"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn create_checklist(tmp: &TempDir, name: &str) -> String {
    create(tmp, &["checklist", "new", name, "--category", "Governança"])
}

fn add_item(tmp: &TempDir, checklist: &str, name: &str, extra: &[&str]) -> String {
    let mut args = vec!["checklist", "item", "add", checklist, name];
    args.extend_from_slice(extra);
    create(tmp, &args)
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    comply(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LGPD compliance toolkit"))
        .stdout(predicate::str::contains("checklist"))
        .stdout(predicate::str::contains("risk"));
}

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();
    comply(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized comply project"));

    assert!(tmp.path().join(".comply").is_dir());
    assert!(tmp.path().join(".comply/config.yaml").is_file());
}

#[test]
fn test_init_twice_is_reported() {
    let tmp = setup_test_project();
    comply(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();
    comply(&tmp).args(["checklist", "list"]).assert().failure();
}

// ============================================================================
// Checklists and items
// ============================================================================

#[test]
fn test_checklist_new_and_list() {
    let tmp = setup_test_project();
    let id = create_checklist(&tmp, "Adequação LGPD");
    assert!(id.starts_with("CHK-"), "unexpected id {}", id);

    comply(&tmp)
        .args(["checklist", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Adequação LGPD"));

    comply(&tmp)
        .args(["checklist", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn test_checklist_new_requires_name() {
    let tmp = setup_test_project();
    comply(&tmp).args(["checklist", "new"]).assert().failure();
}

#[test]
fn test_item_add_edit_and_show() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(
        &tmp,
        &checklist,
        "Mapear dados pessoais",
        &["--risk", "alto", "--priority", "alta"],
    );
    assert!(item.starts_with("ITEM-"), "unexpected id {}", item);

    comply(&tmp)
        .args(["checklist", "item", "edit", &item, "--status", "concluido"])
        .assert()
        .success();

    let json = stdout_of(comply(&tmp).args([
        "checklist",
        "item",
        "list",
        &checklist,
        "--format",
        "json",
    ]));
    assert!(json.contains("\"success\": true"));
    assert!(json.contains("Mapear dados pessoais"));
    assert!(json.contains("\"concluido\""));

    comply(&tmp)
        .args(["checklist", "show", &checklist])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mapear dados pessoais"));
}

#[test]
fn test_item_edit_notifies_checklist_author() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Nomear encarregado", &[]);

    comply(&tmp)
        .args(["checklist", "item", "edit", &item, "--status", "em_andamento"])
        .assert()
        .success();

    let json = stdout_of(comply(&tmp).args(["notify", "list", "--format", "json"]));
    assert!(json.contains("item_atualizado"));
    comply(&tmp)
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn test_item_filter_by_status() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    add_item(&tmp, &checklist, "Política de privacidade", &["--status", "concluido"]);
    add_item(&tmp, &checklist, "Registro de operações", &[]);

    let out = stdout_of(comply(&tmp).args([
        "checklist",
        "item",
        "list",
        &checklist,
        "--status",
        "pendente",
        "--format",
        "json",
    ]));
    assert!(out.contains("Registro de operações"));
    assert!(!out.contains("Política de privacidade"));
}

#[test]
fn test_item_invalid_status_rejected() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    comply(&tmp)
        .args([
            "checklist",
            "item",
            "add",
            &checklist,
            "Item",
            "--status",
            "finished",
        ])
        .assert()
        .failure();
}

#[test]
fn test_show_unknown_checklist_fails() {
    let tmp = setup_test_project();
    comply(&tmp)
        .args(["checklist", "show", "CHK-01J00000000000000000000000"])
        .assert()
        .failure();
}

#[test]
fn test_checklist_delete_with_yes() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Temporário");
    comply(&tmp)
        .args(["checklist", "delete", &checklist, "--yes"])
        .assert()
        .success();
    comply(&tmp)
        .args(["checklist", "show", &checklist])
        .assert()
        .failure();
}

// ============================================================================
// Evidence
// ============================================================================

#[test]
fn test_evidence_upload_accepts_text_file() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Política de privacidade", &[]);
    let file = write_file(tmp.path(), "politica.txt", "Política de privacidade v1");

    comply(&tmp)
        .args(["checklist", "evidence", "upload", &item])
        .arg(&file)
        .args(["--note", "versão aprovada"])
        .assert()
        .success();

    comply(&tmp)
        .args(["checklist", "evidence", "list", &item])
        .assert()
        .success()
        .stdout(predicate::str::contains("politica.txt"));
}

#[test]
fn test_item_delete_removes_its_evidence() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Termo de consentimento", &[]);
    let file = write_file(tmp.path(), "termo.txt", "Termo v2");

    comply(&tmp)
        .args(["checklist", "evidence", "upload", &item])
        .arg(&file)
        .assert()
        .success();
    let dir = tmp.path().join("evidence").join(&item);
    assert!(dir.is_dir());

    comply(&tmp)
        .args(["checklist", "item", "delete", &item, "--yes"])
        .assert()
        .success();
    assert!(!dir.exists());
    assert!(tmp.path().join("evidence").is_dir());

    let out = stdout_of(comply(&tmp).args(["checklist", "show", &checklist, "--format", "json"]));
    assert!(!out.contains("Termo de consentimento"));
}

#[test]
fn test_evidence_upload_rejects_unknown_extension() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Política de privacidade", &[]);
    let file = write_file(tmp.path(), "script.exe", "MZ");

    comply(&tmp)
        .args(["checklist", "evidence", "upload", &item])
        .arg(&file)
        .assert()
        .failure();
}

#[test]
fn test_evidence_upload_missing_file_fails() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Política de privacidade", &[]);

    comply(&tmp)
        .args(["checklist", "evidence", "upload", &item, "nao-existe.pdf"])
        .assert()
        .failure();
}

// ============================================================================
// Risks
// ============================================================================

#[test]
fn test_risk_assess_and_matrix() {
    let tmp = setup_test_project();
    let risk = create(
        &tmp,
        &["risk", "new", "Vazamento de dados de clientes", "--category", "Segurança"],
    );
    assert!(risk.starts_with("RISK-"), "unexpected id {}", risk);

    comply(&tmp)
        .args([
            "risk",
            "assess",
            &risk,
            "-p",
            "4",
            "-i",
            "5",
            "--residual-probability",
            "2",
            "--residual-impact",
            "3",
        ])
        .assert()
        .success();

    comply(&tmp)
        .args(["risk", "matrix", "--mode", "inerente"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vazamento"));

    comply(&tmp)
        .args(["risk", "matrix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P \\ I"));
}

#[test]
fn test_risk_assess_out_of_range_fails() {
    let tmp = setup_test_project();
    let risk = create(&tmp, &["risk", "new", "Acesso indevido"]);
    comply(&tmp)
        .args(["risk", "assess", &risk, "-p", "6", "-i", "2"])
        .assert()
        .failure();
}

#[test]
fn test_risk_residual_requires_both_values() {
    let tmp = setup_test_project();
    let risk = create(&tmp, &["risk", "new", "Acesso indevido"]);
    comply(&tmp)
        .args([
            "risk",
            "assess",
            &risk,
            "-p",
            "3",
            "-i",
            "3",
            "--residual-probability",
            "2",
        ])
        .assert()
        .failure();
}

#[test]
fn test_risk_invalid_transition_fails_unless_forced() {
    let tmp = setup_test_project();
    let risk = create(&tmp, &["risk", "new", "Retenção excessiva"]);

    comply(&tmp)
        .args(["risk", "status", &risk, "fechado"])
        .assert()
        .failure();

    comply(&tmp)
        .args(["risk", "status", &risk, "fechado", "--force"])
        .assert()
        .success();
}

/// Path of the stored file for an entity id
fn entity_file(tmp: &TempDir, dir: &str, id: &str) -> std::path::PathBuf {
    fs::read_dir(tmp.path().join(dir))
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.file_name().unwrap().to_string_lossy().starts_with(id))
        .unwrap()
}

#[test]
fn test_hand_edited_out_of_scale_risk_is_reported_as_skipped() {
    let tmp = setup_test_project();
    let risk = create(&tmp, &["risk", "new", "Planilha exposta"]);
    comply(&tmp)
        .args(["risk", "assess", &risk, "-p", "4", "-i", "5"])
        .assert()
        .success();

    let path = entity_file(&tmp, "risks", &risk);
    let edited: Vec<String> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim_start().starts_with("inherent_level:"))
        .filter(|l| !l.trim_start().starts_with("residual_level:"))
        .map(|l| {
            let trimmed = l.trim_start();
            let indent = &l[..l.len() - trimmed.len()];
            if trimmed.starts_with("probability:") {
                format!("{}probability: 20", indent)
            } else if trimmed.starts_with("impact:") {
                format!("{}impact: 20", indent)
            } else {
                l.to_string()
            }
        })
        .collect();
    fs::write(&path, edited.join("\n") + "\n").unwrap();

    let json = stdout_of(comply(&tmp).args(["risk", "matrix", "--mode", "inerente", "--format", "json"]));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let skipped = value["data"]["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["id"], risk.as_str());
    assert_eq!(skipped[0]["reason"], "out_of_range");
    assert_eq!(skipped[0]["probability"], 20);

    // No residual pair on file, so the residual view reports it as missing
    let json = stdout_of(comply(&tmp).args(["risk", "matrix", "--format", "json"]));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["data"]["skipped"][0]["reason"], "missing_coordinates");

    comply(&tmp).args(["risk", "show", &risk]).assert().success();
    comply(&tmp).args(["risk", "dashboard"]).assert().success();
    comply(&tmp).arg("dashboard").assert().success();
}

#[test]
fn test_risk_plan_lifecycle() {
    let tmp = setup_test_project();
    let risk = create(&tmp, &["risk", "new", "Backup sem criptografia"]);

    comply(&tmp)
        .args([
            "risk",
            "plan",
            "add",
            &risk,
            "Criptografar backups",
            "--owner",
            "ti",
            "--due",
            "2030-01-31",
        ])
        .assert()
        .success();

    let json = stdout_of(comply(&tmp).args(["risk", "show", &risk, "--format", "json"]));
    assert!(json.contains("Criptografar backups"));
}

// ============================================================================
// Trainings
// ============================================================================

#[test]
fn test_training_assign_start_complete() {
    let tmp = setup_test_project();
    let training = create(
        &tmp,
        &["training", "new", "Fundamentos da LGPD", "--duration", "60"],
    );
    assert!(training.starts_with("TRN-"), "unexpected id {}", training);

    comply(&tmp)
        .args(["training", "assign", &training, "ana", "bruno", "--due", "2030-06-30"])
        .assert()
        .success();

    comply(&tmp)
        .args(["training", "start", &training, "--user", "ana"])
        .assert()
        .success();
    comply(&tmp)
        .args(["training", "complete", &training, "--user", "ana", "--score", "90"])
        .assert()
        .success();

    let json = stdout_of(comply(&tmp).args(["training", "show", &training, "--format", "json"]));
    assert!(json.contains("\"concluido\""));
    assert!(json.contains("bruno"));
}

#[test]
fn test_training_score_out_of_range_fails() {
    let tmp = setup_test_project();
    let training = create(&tmp, &["training", "new", "Incidentes de segurança"]);
    comply(&tmp)
        .args(["training", "assign", &training, "ana"])
        .assert()
        .success();
    comply(&tmp)
        .args(["training", "complete", &training, "--user", "ana", "--score", "120"])
        .assert()
        .failure();
}

// ============================================================================
// Notifications and deadlines
// ============================================================================

#[test]
fn test_check_deadlines_with_reference_date() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    add_item(&tmp, &checklist, "Relatório de impacto", &["--due", "2030-01-03"]);
    add_item(&tmp, &checklist, "Item distante", &["--due", "2030-03-01"]);

    comply(&tmp)
        .args([
            "notify",
            "check-deadlines",
            "--today",
            "2030-01-01",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"created\": 1"));

    // Already notified within the last day
    comply(&tmp)
        .args([
            "notify",
            "check-deadlines",
            "--today",
            "2030-01-01",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"created\": 0"));

    let json = stdout_of(comply(&tmp).args(["notify", "list", "--format", "json"]));
    assert!(json.contains("vencimento_proximo"));
}

#[test]
fn test_notify_read_all_clears_unread() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    let item = add_item(&tmp, &checklist, "Nomear encarregado", &[]);
    comply(&tmp)
        .args(["checklist", "item", "edit", &item, "--name", "Nomear DPO"])
        .assert()
        .success();

    comply(&tmp).args(["notify", "read-all"]).assert().success();
    comply(&tmp)
        .args(["notify", "count", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\": 0"));
}

// ============================================================================
// Audit trail
// ============================================================================

#[test]
fn test_audit_list_records_changes() {
    let tmp = setup_test_project();
    create_checklist(&tmp, "Adequação LGPD");

    comply(&tmp)
        .args(["audit", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 1"));

    let json = stdout_of(comply(&tmp).args(["audit", "list", "--user", "dpo", "--format", "json"]));
    assert!(json.contains("\"success\": true"));
    assert!(json.contains("Adequação LGPD"));
}

#[test]
fn test_audit_export_csv_to_file() {
    let tmp = setup_test_project();
    create_checklist(&tmp, "Adequação LGPD");
    let out = tmp.path().join("auditoria.csv");

    comply(&tmp)
        .args(["audit", "export", "--as", "csv", "-o"])
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("ID,"));
    assert!(content.contains("Usuário"));
    assert!(content.contains("dpo"));
}

#[test]
fn test_audit_export_is_itself_audited() {
    let tmp = setup_test_project();
    comply(&tmp)
        .args(["audit", "export", "--as", "json"])
        .assert()
        .success();

    comply(&tmp)
        .args(["audit", "list", "--action", "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_audit_stats() {
    let tmp = setup_test_project();
    create_checklist(&tmp, "Adequação LGPD");
    comply(&tmp).args(["audit", "stats"]).assert().success();
}

// ============================================================================
// Dashboard and config
// ============================================================================

#[test]
fn test_dashboard_json_envelope() {
    let tmp = setup_test_project();
    let checklist = create_checklist(&tmp, "Adequação LGPD");
    add_item(&tmp, &checklist, "Política de privacidade", &["--status", "concluido"]);
    add_item(&tmp, &checklist, "Registro de operações", &["--risk", "alto"]);

    let json = stdout_of(comply(&tmp).args(["dashboard", "--format", "json"]));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["checklists"], 1);
    assert_eq!(value["data"]["metrics"]["total"], 2);
    assert_eq!(value["data"]["metrics"]["overall_percent"], 50);
}

#[test]
fn test_dashboard_text_on_empty_project() {
    let tmp = setup_test_project();
    comply(&tmp)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compliance dashboard"));
}

#[test]
fn test_config_set_and_show() {
    let tmp = setup_test_project();
    comply(&tmp)
        .args(["config", "set", "severity.medio", "10"])
        .assert()
        .success();
    comply(&tmp)
        .args(["config", "show", "severity.medio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10"));
}

#[test]
fn test_config_rejects_unordered_severity() {
    let tmp = setup_test_project();
    comply(&tmp)
        .args(["config", "set", "severity.baixo", "15"])
        .assert()
        .failure();
    comply(&tmp)
        .args(["config", "show", "severity.baixo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let tmp = setup_test_project();
    comply(&tmp)
        .args(["config", "set", "nope", "1"])
        .assert()
        .failure();
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    comply(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("comply"));
}
