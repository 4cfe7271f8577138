// Imports used by all tests in this file
use assert_cmd::prelude::*;
use std::process::Command;
use assert_fs::prelude::*;
use serde_json::Value;
use predicates::prelude::*;

mod util;

use util::{USER_SERVICE, fixture_dir, read};

// Spawn the binary inside the fixture dir so config lookup is hermetic.
fn scopedit(tmp: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scopedit").expect("bin");
    cmd.current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .env_remove("SCOPEDIT_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn edit_with_method_scope_succeeds() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["edit", "service.py", "--old", "return None", "--new", "return False"])
        .args(["--within-method", "authenticate_user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied"));

    let lines: Vec<String> = read(&tmp, "service.py").lines().map(String::from).collect();
    assert_eq!(lines[16], "        return False");
    assert_eq!(lines[22], "        return None");
}

#[test]
fn ambiguous_edit_exits_2_with_json_suggestions() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    let out = scopedit(&tmp)
        .args(["--json", "edit", "service.py", "--old", "return None", "--new", "return False"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let v: Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(v["success"], false);
    assert_eq!(v["errorKind"], "ambiguous_occurrence");
    let suggestions = v["suggestions"].as_array().expect("suggestions");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0]["strategy"], "surrounding_context");
    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
}

#[test]
fn ambiguous_edit_renders_suggestions_for_humans() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["edit", "service.py", "--old", "return None", "--new", "return False"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("occurs 2 times"))
        .stderr(predicate::str::contains("Suggestions:"));
}

#[test]
fn missing_scope_exits_4() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["edit", "service.py", "--old", "return None", "--new", "return False"])
        .args(["--within-class", "AdminService"])
        .assert()
        .code(4);
}

#[test]
fn old_text_can_come_from_a_file() {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    tmp.child("old.txt").write_str("import uuid").expect("write");
    tmp.child("new.txt").write_str("import uuid as _uuid").expect("write");

    scopedit(&tmp)
        .args(["--quiet", "edit", "service.py", "--old-file", "old.txt", "--new-file", "new.txt"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(read(&tmp, "service.py").contains("        import uuid as _uuid\n"));
}

#[test]
fn preview_prints_diff_and_leaves_file() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["preview", "service.py", "--old", "self.users = []", "--new", "self.users = list()"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- a/service.py"))
        .stdout(predicate::str::contains("-        self.users = []"))
        .stdout(predicate::str::contains("+        self.users = list()"));

    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
}

#[test]
fn validate_reports_occurrences_as_json() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    let out = scopedit(&tmp)
        .args(["--json", "validate", "service.py", "--old", "return session_id", "--new", "return sid"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let v: Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(v["validation"]["occurrenceCount"], 2);
    assert_eq!(v["validation"]["isUnique"], false);
    let lines: Vec<u64> = v["occurrences"]
        .as_array()
        .expect("occurrences")
        .iter()
        .filter_map(|o| o["line"].as_u64())
        .collect();
    assert_eq!(lines, vec![16, 33]);
}

#[test]
fn unsafe_edit_exits_5() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["edit", "service.py", "--old", "str(uuid.uuid4())", "--new", "str(uuid.uuid4()"])
        .assert()
        .code(5);
    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
}

#[test]
fn batch_applies_ops_file() {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    tmp.child("ops.json")
        .write_str(
            r#"[
  {"oldString": "return None", "newString": "return False", "context": {"withinMethod": "authenticate_user"}},
  {"oldString": "return None", "newString": "return False", "context": {"withinMethod": "find_user_by_username"}}
]"#,
        )
        .expect("write ops");

    let out = scopedit(&tmp)
        .args(["--json", "batch", "service.py", "--ops", "ops.json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(v["editsApplied"], 2);
    assert_eq!(v["linesChanged"], 2);
    assert!(!read(&tmp, "service.py").contains("return None"));
}

#[test]
fn scopes_lists_qualified_names() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["scopes", "service.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UserService::authenticate_user"))
        .stdout(predicate::str::contains("class"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    scopedit(&tmp).arg("init").assert().success();
    tmp.child("scopedit.toml").assert(predicate::str::contains("[engine]"));

    scopedit(&tmp)
        .arg("init")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("--force"));

    scopedit(&tmp).args(["init", "--force"]).assert().success();
}

#[test]
fn config_file_is_honoured() {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    tmp.child("scopedit.toml")
        .write_str("[preview]\ncontext_lines = 0\n")
        .expect("write config");

    scopedit(&tmp)
        .args(["preview", "service.py", "--old", "import uuid", "--new", "import secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@@ -30,1 +30,1 @@"))
        .stdout(predicate::str::contains("session_id = str").not());
}

#[test]
fn validate_missing_text_exits_4_even_when_multiple_allowed() {
    let tmp = fixture_dir("service.py", USER_SERVICE);

    scopedit(&tmp)
        .args(["validate", "service.py", "--old", "return maybe", "--new", "return sure", "--allow-multiple"])
        .assert()
        .code(4);
}
