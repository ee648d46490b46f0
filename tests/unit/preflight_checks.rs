//! Preflight check ordering and hard-stop behavior.

#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use wpmig::application::services::preflight::run_preflight;
use wpmig::domain::exec::ExecOutput;

use crate::mocks::{
    endpoint, err_output, ok_output, RecordingReporter, ScriptedFactory, ScriptedShell,
};

fn passing_source_rules() -> Vec<(&'static str, ExecOutput)> {
    vec![
        ("test -f /var/www/html/wp-config.php", ok_output("")),
        ("wp-includes/version.php", ok_output("6.4.3")),
        ("DB_NAME", ok_output("blog")),
        ("DB_USER", ok_output("wp")),
        ("DB_PASSWORD", ok_output("s3cret")),
        ("DB_HOST", ok_output("localhost")),
        ("wp_posts", ok_output("47")),
        ("du -sm", ok_output("1024")),
    ]
}

fn passing_dest_rules() -> Vec<(&'static str, ExecOutput)> {
    vec![
        ("is-active apache2", ok_output("active")),
        ("is-active mysql", ok_output("active")),
        ("php -v", ok_output("8.2.7")),
        ("df -m", ok_output("4096")),
    ]
}

#[tokio::test]
async fn test_all_checks_pass_on_healthy_servers() {
    let factory = ScriptedFactory::new(vec![
        Ok(ScriptedShell::new(passing_source_rules())),
        Ok(ScriptedShell::new(passing_dest_rules())),
    ]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("preflight runs");

    assert!(report.passed());
    assert_eq!(report.checks.len(), 6);
    assert_eq!(report.wp_path.as_deref(), Some("/var/www/html"));
    let creds = report.source_creds.expect("credentials extracted");
    assert_eq!(creds.name, "blog");
    assert_eq!(creds.user, "wp");
}

#[tokio::test]
async fn test_source_connect_failure_stops_before_destination() {
    // No second session scripted: reaching for it would fail the test.
    let factory = ScriptedFactory::new(vec![Err(anyhow!("connection refused"))]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("connect failure is a check outcome, not an error");

    assert!(!report.passed());
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].name, "ssh-source");
    assert!(reporter.saw("fail: cannot reach source server"));
}

#[tokio::test]
async fn test_destination_connect_failure_closes_source_session() {
    let closes = Arc::new(AtomicUsize::new(0));
    let src = ScriptedShell::new(vec![]).with_close_counter(Arc::clone(&closes));
    let factory = ScriptedFactory::new(vec![Ok(src), Err(anyhow!("auth failed"))]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("preflight runs");

    assert!(!report.passed());
    assert_eq!(report.checks.len(), 2);
    assert_eq!(report.checks[1].name, "ssh-destination");
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_wordpress_still_checks_destination_stack() {
    let src_closes = Arc::new(AtomicUsize::new(0));
    let dst_closes = Arc::new(AtomicUsize::new(0));
    let src = ScriptedShell::new(vec![("test -f", err_output(""))])
        .with_close_counter(Arc::clone(&src_closes));
    let dst = ScriptedShell::new(vec![
        ("is-active apache2", ok_output("active")),
        ("is-active mysql", ok_output("active")),
        ("php -v", ok_output("8.2.7")),
    ])
    .with_close_counter(Arc::clone(&dst_closes));
    let factory = ScriptedFactory::new(vec![Ok(src), Ok(dst)]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("preflight runs");

    // The install check fails but the stack check still runs; only the two
    // checks that need the install path are skipped.
    assert!(!report.passed());
    assert_eq!(report.checks.len(), 4);
    assert_eq!(report.checks[2].name, "wordpress-install");
    assert!(!report.checks[2].passed);
    let lamp = report.checks.iter().find(|c| c.name == "lamp-stack").expect("lamp check");
    assert!(lamp.passed);
    assert!(report.wp_path.is_none());
    assert!(report.checks.iter().all(|c| c.name != "database-access" && c.name != "disk-space"));
    // Both sessions are closed even when later checks are skipped.
    assert_eq!(src_closes.load(Ordering::SeqCst), 1);
    assert_eq!(dst_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_insufficient_disk_space_fails_only_that_check() {
    let mut dest_rules = passing_dest_rules();
    dest_rules.retain(|(pattern, _)| *pattern != "df -m");
    dest_rules.push(("df -m", ok_output("2047")));
    let factory = ScriptedFactory::new(vec![
        Ok(ScriptedShell::new(passing_source_rules())),
        Ok(ScriptedShell::new(dest_rules)),
    ]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("preflight runs");

    assert!(!report.passed());
    let disk = report.checks.iter().find(|c| c.name == "disk-space").expect("disk check");
    assert!(!disk.passed);
    assert!(disk.message.contains("2048 MB"));
    // The other five checks are unaffected.
    assert_eq!(report.checks.iter().filter(|c| c.passed).count(), 5);
}

#[tokio::test]
async fn test_incomplete_stack_names_missing_services() {
    let mut dest_rules = passing_dest_rules();
    dest_rules.retain(|(pattern, _)| *pattern != "is-active mysql");
    dest_rules.push(("is-active mysql", err_output("inactive")));
    let factory = ScriptedFactory::new(vec![
        Ok(ScriptedShell::new(passing_source_rules())),
        Ok(ScriptedShell::new(dest_rules)),
    ]);
    let reporter = RecordingReporter::default();

    let report = run_preflight(&factory, &endpoint("10.0.0.1"), &endpoint("10.0.0.2"), &reporter)
        .await
        .expect("preflight runs");

    let lamp = report.checks.iter().find(|c| c.name == "lamp-stack").expect("lamp check");
    assert!(!lamp.passed);
    assert!(lamp.message.contains("database server"));
}
