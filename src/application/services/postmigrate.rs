//! Post-migration configuration: rewrite wp-config.php on the destination
//! and verify the result.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::settle;
use crate::domain::credentials::DbCredentials;
use crate::domain::exec::Verdict;
use crate::domain::plan::{Criticality, StageLog, StepDisposition, StepSpec};
use crate::domain::shell::php_string_escape;
use crate::domain::wpconfig;

const DB_DIRECTIVES: StepSpec = StepSpec {
    id: "db-directives",
    label: "point wp-config.php at the destination database",
    criticality: Criticality::Critical,
};
// A salt that cannot be rewritten only forces users to log in again;
// the stage carries on to verification either way.
const SALTS: StepSpec = StepSpec {
    id: "salts",
    label: "regenerate authentication keys and salts",
    criticality: Criticality::BestEffort,
};
const DEBUG_SETTINGS: StepSpec = StepSpec {
    id: "debug-settings",
    label: "set debug flags",
    criticality: Criticality::BestEffort,
};
const VERIFY: StepSpec = StepSpec {
    id: "verify",
    label: "verify wp-config.php",
    criticality: Criticality::Critical,
};

/// Rewrite the destination wp-config.php: database directives, fresh
/// salts, optional debug defines, then a syntax check.
pub async fn run_post_migration(
    destination: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    wp_path: &str,
    creds: &DbCredentials,
    enable_debug: bool,
) -> Result<Verdict<()>> {
    reporter.section("Post-migration configuration");
    let mut log = StageLog::new("postmigrate");

    reporter.step(DB_DIRECTIVES.label);
    let directives = [
        ("DB_NAME", creds.name.as_str()),
        ("DB_USER", creds.user.as_str()),
        ("DB_PASSWORD", creds.password.as_str()),
        ("DB_HOST", creds.host.as_str()),
    ];
    let mut failed = Vec::new();
    for (name, value) in directives {
        let out = destination
            .exec(&wpconfig::replace_string_directive(wp_path, name, value))
            .await?;
        if !out.ok() {
            failed.push(name);
        }
    }
    let message = if failed.is_empty() {
        format!("database directives point at {}", creds.locator())
    } else {
        format!("could not rewrite: {}", failed.join(", "))
    };
    if settle(&mut log, &DB_DIRECTIVES, reporter, failed.is_empty(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    reporter.step(SALTS.label);
    let mut failed = Vec::new();
    for (key, value) in wpconfig::generate_salts() {
        let count = directive_count(destination, wp_path, key).await?;
        let command = if count > 0 {
            wpconfig::rewrite_directive_line(wp_path, key, &value)
        } else {
            let line = format!("define( '{key}', '{}' );", php_string_escape(&value));
            wpconfig::insert_before_sentinel(wp_path, &line)
        };
        if !destination.exec(&command).await?.ok() {
            reporter.warn(&format!("could not rewrite {key}"));
            failed.push(key);
        }
    }
    let message = if failed.is_empty() {
        "all 8 keys and salts regenerated".to_string()
    } else {
        format!("could not rewrite salts: {}", failed.join(", "))
    };
    settle(&mut log, &SALTS, reporter, failed.is_empty(), message);

    reporter.step(DEBUG_SETTINGS.label);
    let ok = apply_debug_settings(destination, wp_path, enable_debug).await?;
    let message = if !ok {
        "could not rewrite debug defines (continuing)".to_string()
    } else if enable_debug {
        "WP_DEBUG enabled with logging, display off".to_string()
    } else {
        "WP_DEBUG disabled".to_string()
    };
    settle(&mut log, &DEBUG_SETTINGS, reporter, ok, message);

    reporter.step(VERIFY.label);
    let config_path = format!("{wp_path}/{}", wpconfig::CONFIG_MARKER);
    let exists = destination.exec(&wpconfig::file_exists(&config_path)).await?;
    if !exists.ok() {
        let message = format!("{config_path} missing after rewrite");
        settle(&mut log, &VERIFY, reporter, false, message.clone());
        return Ok(Verdict::fail(message));
    }
    let mode = destination.exec(&wpconfig::file_mode(&config_path)).await?;
    if mode.stdout.trim() != "640" {
        reporter.warn(&format!(
            "wp-config.php permissions are {} (expected 640)",
            mode.stdout.trim()
        ));
    }
    let lint = destination.exec(&wpconfig::php_lint(&config_path)).await?;
    let message = if lint.ok() {
        "wp-config.php present and syntactically valid".to_string()
    } else {
        format!("php -l failed: {}", lint.detail())
    };
    if settle(&mut log, &VERIFY, reporter, lint.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    Ok(Verdict::pass("destination wp-config.php updated and verified"))
}

/// WP_DEBUG is always written with the requested value; the WP_DEBUG_LOG
/// and WP_DEBUG_DISPLAY companions are only touched when debugging is on.
/// Every write checks for an existing define first, so repeated runs
/// rewrite in place instead of stacking duplicate lines.
async fn apply_debug_settings(
    destination: &impl RemoteShell,
    wp_path: &str,
    enable: bool,
) -> Result<bool> {
    let debug_ok = if directive_count(destination, wp_path, "WP_DEBUG").await? > 0 {
        destination
            .exec(&wpconfig::replace_bool_directive(wp_path, "WP_DEBUG", enable))
            .await?
            .ok()
    } else {
        destination
            .exec(&wpconfig::insert_before_sentinel(
                wp_path,
                &wpconfig::bool_define_line("WP_DEBUG", enable),
            ))
            .await?
            .ok()
    };
    if !enable || !debug_ok {
        return Ok(debug_ok);
    }
    let log_ok =
        upsert_bool_define(destination, wp_path, "WP_DEBUG_LOG", true, "'WP_DEBUG'").await?;
    let display_ok =
        upsert_bool_define(destination, wp_path, "WP_DEBUG_DISPLAY", false, "'WP_DEBUG_LOG'")
            .await?;
    Ok(log_ok && display_ok)
}

/// Rewrite a boolean define in place when present, otherwise chain it in
/// after the line matching `anchor`.
async fn upsert_bool_define(
    destination: &impl RemoteShell,
    wp_path: &str,
    name: &str,
    value: bool,
    anchor: &str,
) -> Result<bool> {
    let command = if directive_count(destination, wp_path, name).await? > 0 {
        wpconfig::replace_bool_directive(wp_path, name, value)
    } else {
        wpconfig::insert_after(wp_path, anchor, &wpconfig::bool_define_line(name, value))
    };
    Ok(destination.exec(&command).await?.ok())
}

async fn directive_count(
    destination: &impl RemoteShell,
    wp_path: &str,
    name: &str,
) -> Result<u32> {
    let out = destination.exec(&wpconfig::count_directive(wp_path, name)).await?;
    Ok(out.stdout.trim().parse().unwrap_or(0))
}
