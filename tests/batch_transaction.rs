//! Integration tests for transactional batches
//!
//! Every batch either lands completely (one write) or leaves the
//! file byte-for-byte as it was.

mod util;

use anyhow::Result;
use scopedit::{EditContext, EditEngine, EditError, EditOperation, ScopeKind};
use util::{USER_SERVICE, fixture_dir, read};

#[test]
fn all_operations_land_in_one_write() -> Result<()> {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    let mut engine = EditEngine::open(tmp.path().join("service.py"))?;

    let ops = vec![
        EditOperation::new("self.users = []", "self.users: list = []"),
        EditOperation::new("return None", "return False")
            .within(EditContext::for_scope(ScopeKind::Method, "find_user_by_username")),
        EditOperation::new("import uuid", "import uuid as _uuid"),
    ];

    let res = engine.multi_edit(&ops)?;
    assert!(res.success);
    assert_eq!(res.edits_applied, 3);
    assert_eq!(res.lines_changed, 3);

    let on_disk = read(&tmp, "service.py");
    assert_eq!(on_disk, engine.content());
    assert!(on_disk.contains("self.users: list = []"));
    assert_eq!(on_disk.matches("return None").count(), 1);
    assert!(on_disk.contains("        return False\n    \n    def verify_password"));
    Ok(())
}

#[test]
fn failing_validation_reports_the_operation_index() -> Result<()> {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    let mut engine = EditEngine::open(tmp.path().join("service.py"))?;

    let ops = vec![
        EditOperation::new("self.users = []", "self.users = list()"),
        EditOperation::new("return None", "return False"),
    ];

    let err = engine.multi_edit(&ops).unwrap_err();
    match &err {
        EditError::Batch { index, source } => {
            assert_eq!(*index, 2);
            assert!(matches!(**source, EditError::AmbiguousOccurrence { count: 2, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
    assert_eq!(engine.content(), USER_SERVICE);
    Ok(())
}

#[test]
fn conflicting_operations_roll_back() -> Result<()> {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    let mut engine = EditEngine::open(tmp.path().join("service.py"))?;
    let cid_before = engine.cid().to_string();

    // Both valid against the original; the first removes the second's target.
    let ops = vec![
        EditOperation::new("return user.password == password", "return check(user, password)"),
        EditOperation::new("user.password == password", "user.password_hash == hash(password)"),
    ];

    let err = engine.multi_edit(&ops).unwrap_err();
    assert!(matches!(err, EditError::Transaction { index: 2, .. }));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
    assert_eq!(engine.content(), USER_SERVICE);
    assert_eq!(engine.cid(), cid_before);
    assert_eq!(engine.scopes().find(ScopeKind::Method, "verify_password").len(), 1);
    Ok(())
}

#[test]
fn empty_batch_is_invalid_input() -> Result<()> {
    let mut engine = EditEngine::in_memory("x = 1\n", None)?;
    let err = engine.multi_edit(&[]).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.class(), "input");
    Ok(())
}

#[test]
fn operations_deserialize_from_camel_case_json() -> Result<()> {
    let raw = r#"[
        {"oldString": "return None", "newString": "return False",
         "context": {"withinMethod": "authenticate_user"}},
        {"oldString": "import uuid", "newString": "import secrets"}
    ]"#;
    let ops: Vec<EditOperation> = serde_json::from_str(raw)?;
    assert_eq!(ops[0].context.within_method.as_deref(), Some("authenticate_user"));
    assert!(ops[0].context.require_unique);
    assert_eq!(ops[1].context, EditContext::default());

    let mut engine = EditEngine::in_memory(USER_SERVICE, Some(scopedit::Language::Python))?;
    let res = engine.multi_edit(&ops)?;
    assert_eq!(res.edits_applied, 2);
    assert!(engine.content().contains("        import secrets\n"));
    Ok(())
}

#[test]
fn first_operation_failing_touches_nothing() -> Result<()> {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    let mut engine = EditEngine::open(tmp.path().join("service.py"))?;

    let ops = vec![
        EditOperation::new("self.sessions", "self.active"),
        EditOperation::new("import uuid", "import secrets"),
    ];

    let err = engine.multi_edit(&ops).unwrap_err();
    assert!(matches!(err, EditError::Batch { index: 1, .. }));
    assert_eq!(err.class(), "not_found");
    assert_eq!(read(&tmp, "service.py"), USER_SERVICE);
    assert_eq!(engine.content(), USER_SERVICE);
    Ok(())
}

#[test]
fn failed_write_restores_the_staged_batch() -> Result<()> {
    let tmp = fixture_dir("service.py", USER_SERVICE);
    let path = tmp.path().join("service.py");
    let mut engine = EditEngine::open(&path)?;
    let cid_before = engine.cid().to_string();

    // Every operation stages cleanly; the write is refused.
    let changed = format!("{USER_SERVICE}\n# touched\n");
    std::fs::write(&path, &changed)?;

    let ops = vec![
        EditOperation::new("self.users = []", "self.users: list = []"),
        EditOperation::new("import uuid", "import uuid as _uuid"),
    ];

    let err = engine.multi_edit(&ops).unwrap_err();
    assert!(matches!(err, EditError::FileChanged { .. }));
    assert_eq!(err.exit_code(), 7);
    assert_eq!(engine.content(), USER_SERVICE);
    assert_eq!(engine.cid(), cid_before);
    assert_eq!(engine.state(), scopedit::core::EditState::Rejected);
    assert_eq!(read(&tmp, "service.py"), changed);
    Ok(())
}
