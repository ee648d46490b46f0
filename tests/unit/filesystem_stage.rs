//! Filesystem stage: archive, relay, extract, ownership, permissions.

#![allow(clippy::expect_used)]

use wpmig::application::services::filesystem::{
    migrate_filesystem, resolve_source_path, FilesystemParams,
};
use wpmig::domain::exec::ExecOutput;

use crate::mocks::{err_output, ok_output, RecordingReporter, ScriptedShell};

fn params() -> FilesystemParams {
    FilesystemParams {
        source_path: "/var/www/html".to_string(),
        dest_path: "/var/www/html".to_string(),
        web_user: "www-data".to_string(),
        create_backup: true,
    }
}

fn source_rules() -> Vec<(&'static str, ExecOutput)> {
    vec![
        ("tar -czf", ok_output("")),
        ("du -h", ok_output("250M")),
        ("find", ok_output("4200")),
        ("rm -f", ok_output("")),
    ]
}

fn fresh_dest_rules() -> Vec<(&'static str, ExecOutput)> {
    vec![
        ("test -d", err_output("")),
        ("sudo mkdir -p", ok_output("")),
        ("tar -xzf", ok_output("")),
        ("chown", ok_output("")),
        ("-type d", ok_output("")),
        ("-type f -exec chmod", ok_output("")),
        ("chmod 640", ok_output("")),
        ("find", ok_output("4200")),
        ("rm -f", ok_output("")),
    ]
}

fn existing_dest_rules() -> Vec<(&'static str, ExecOutput)> {
    let mut rules = fresh_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "test -d");
    rules.insert(0, ("test -d", ok_output("")));
    rules.push(("cp -r", ok_output("")));
    rules.push(("rm -rf", ok_output("")));
    rules
}

#[tokio::test]
async fn test_fresh_destination_is_created_not_cleared() {
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(fresh_dest_rules());
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(verdict.passed);
    assert_eq!(verdict.payload.as_deref(), Some("/var/www/html"));
    assert!(dst.ran("sudo mkdir -p"));
    assert!(!dst.ran("rm -rf"));
    assert!(!dst.ran("cp -r"));
}

#[tokio::test]
async fn test_existing_destination_is_backed_up_then_cleared() {
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(existing_dest_rules());
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(verdict.passed);
    assert!(dst.ran("cp -r /var/www/html /var/www/html_backup_"));
    assert!(dst.ran("rm -rf /var/www/html/*"));
    assert!(!dst.ran("sudo mkdir -p"));
}

#[tokio::test]
async fn test_backup_failure_aborts_before_clearing() {
    let mut rules = existing_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "cp -r");
    rules.insert(0, ("cp -r", err_output("cp: cannot create directory: No space left on device")));
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    // Without the copy there is nothing to restore from, so the existing
    // tree must never be cleared.
    assert!(!verdict.passed);
    assert!(verdict.message.contains("backup copy failed"));
    assert!(!dst.ran("rm -rf"));
    assert!(!dst.ran("tar -xzf"));
}

#[tokio::test]
async fn test_no_backup_flag_skips_the_copy() {
    let mut rules = existing_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "cp -r");
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();
    let params = FilesystemParams { create_backup: false, ..params() };

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params)
        .await
        .expect("stage runs");

    assert!(verdict.passed);
    assert!(!dst.ran("cp -r"));
}

#[tokio::test]
async fn test_count_mismatch_warns_but_does_not_abort() {
    let mut rules = fresh_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "find");
    rules.push(("find", ok_output("4190")));
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(verdict.passed);
    assert!(reporter.saw("warn: file counts differ: 4200 on source, 4190 on destination"));
}

#[tokio::test]
async fn test_chown_failure_warns_but_continues() {
    let mut rules = fresh_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "chown");
    rules.push(("chown", err_output("chown: changing ownership: Operation not permitted")));
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(verdict.passed);
    assert!(reporter.saw("warn: chown failed"));
}

#[tokio::test]
async fn test_chmod_failure_aborts_stage() {
    let mut rules = fresh_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "-type d");
    rules.insert(0, ("-type d", err_output("find: permission denied")));
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(!verdict.passed);
    assert!(verdict.message.contains("chmod failed"));
}

#[tokio::test]
async fn test_source_path_override_wins_when_it_holds_a_config() {
    let src = ScriptedShell::new(vec![("test -f /srv/wp/wp-config.php", ok_output(""))]);
    let reporter = RecordingReporter::default();

    let path = resolve_source_path(&src, &reporter, Some("/srv/wp"), "/var/www/html")
        .await
        .expect("resolves");

    assert_eq!(path, "/srv/wp");
}

#[tokio::test]
async fn test_stale_source_path_override_falls_back_to_detected() {
    let src = ScriptedShell::new(vec![("test -f", err_output(""))]);
    let reporter = RecordingReporter::default();

    let path = resolve_source_path(&src, &reporter, Some("/srv/nowhere"), "/var/www/html")
        .await
        .expect("resolves");

    assert_eq!(path, "/var/www/html");
    assert!(reporter.saw("warn: no wp-config.php under configured path /srv/nowhere"));
}

#[tokio::test]
async fn test_no_source_path_override_keeps_detected_without_probing() {
    let src = ScriptedShell::new(vec![]);
    let reporter = RecordingReporter::default();

    let path = resolve_source_path(&src, &reporter, None, "/var/www/html")
        .await
        .expect("resolves");

    assert_eq!(path, "/var/www/html");
}

#[tokio::test]
async fn test_extract_failure_aborts_before_permissions() {
    let mut rules = fresh_dest_rules();
    rules.retain(|(pattern, _)| *pattern != "tar -xzf");
    rules.insert(0, ("tar -xzf", err_output("tar: Unexpected EOF in archive")));
    let src = ScriptedShell::new(source_rules());
    let dst = ScriptedShell::new(rules);
    let reporter = RecordingReporter::default();

    let verdict = migrate_filesystem(&src, &dst, &reporter, &params())
        .await
        .expect("stage runs");

    assert!(!verdict.passed);
    assert!(!dst.ran("chmod"));
}
