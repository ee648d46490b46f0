//! WordPress installation knowledge: probe paths, wp-config.php directive
//! extraction and rewriting, security salts, and the remote command text
//! for every migration operation.
//!
//! Everything here is pure string construction — no I/O. The command
//! builders return [`RemoteCommand`] values executed elsewhere, which keeps
//! the exact shell lines testable without a server.

use rand::Rng;

use crate::domain::shell::{
    php_string_escape, sed_replacement_escape, sh_quote, RemoteCommand,
};

/// Well-known WordPress install locations probed in order.
pub const PROBE_PATHS: [&str; 3] =
    ["/var/www/html", "/var/www/wordpress", "/usr/share/nginx/html"];

/// File whose presence marks a directory as a WordPress install root.
pub const CONFIG_MARKER: &str = "wp-config.php";

/// Line in wp-config.php before which custom defines must land.
pub const SENTINEL: &str = "That's all, stop editing";

/// The eight authentication keys and salts WordPress defines.
pub const SALT_KEYS: [&str; 8] = [
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

/// Alphabet for generated salts: letters, digits, and the punctuation set
/// WordPress itself uses in its secret-key service output.
pub const SALT_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+[]{}|;:,.<>?";

/// Length of each generated salt value.
pub const SALT_LEN: usize = 64;

/// Draw one salt value from the given RNG.
#[must_use]
pub fn generate_salt<R: Rng>(rng: &mut R) -> String {
    (0..SALT_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SALT_CHARSET.len());
            char::from(SALT_CHARSET[idx])
        })
        .collect()
}

/// Fresh values for all eight salt keys, from the OS entropy source.
#[must_use]
pub fn generate_salts() -> Vec<(&'static str, String)> {
    let mut rng = rand::rngs::OsRng;
    SALT_KEYS.iter().map(|key| (*key, generate_salt(&mut rng))).collect()
}

/// Escape a value for interpolation into a single-quoted SQL string.
#[must_use]
pub fn sql_string_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// ── probes ──────────────────────────────────────────────────────────────

/// `test -f <path>/wp-config.php` — exit 0 marks a WordPress root.
#[must_use]
pub fn marker_probe(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("test -f {}", sh_quote(&format!("{path}/{CONFIG_MARKER}"))))
}

/// Read the installed WordPress version out of `wp-includes/version.php`.
#[must_use]
pub fn wp_version(path: &str) -> RemoteCommand {
    let file = sh_quote(&format!("{path}/wp-includes/version.php"));
    RemoteCommand::script(format!("grep \"wp_version =\" {file} | cut -d\\' -f2"))
}

/// Extract one `define('NAME', 'value')` directive from wp-config.php.
///
/// Same grep/cut shape the stock config file supports: the value is the
/// fourth single-quote-delimited field of the matching line.
#[must_use]
pub fn extract_directive(wp_path: &str, name: &str) -> RemoteCommand {
    let file = sh_quote(&format!("{wp_path}/{CONFIG_MARKER}"));
    RemoteCommand::script(format!("grep {} {file} | cut -d\\' -f4", sh_quote(name)))
}

/// Count posts as a liveness probe against the source database.
#[must_use]
pub fn db_probe(creds_user: &str, creds_password: &str, creds_host: &str, db: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "mysql -u {} -p{} -h {} {} -e {}",
        sh_quote(creds_user),
        sh_quote(creds_password),
        sh_quote(creds_host),
        sh_quote(db),
        sh_quote("SELECT COUNT(*) FROM wp_posts;"),
    ))
}

/// Size of the WordPress tree in megabytes (first field of `du -sm`).
#[must_use]
pub fn dir_size_mb(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("du -sm {} | cut -f1", sh_quote(path)))
}

/// Free megabytes on the filesystem holding /var/www.
#[must_use]
pub fn free_space_mb() -> RemoteCommand {
    RemoteCommand::script("df -m /var/www | tail -1 | awk '{print $4}'")
}

/// Exit 0 when any of the candidate services is active.
#[must_use]
pub fn web_server_active() -> RemoteCommand {
    RemoteCommand::script(
        "systemctl is-active apache2 || systemctl is-active httpd || systemctl is-active nginx",
    )
}

/// Exit 0 when MySQL or MariaDB is active.
#[must_use]
pub fn db_server_active() -> RemoteCommand {
    RemoteCommand::script("systemctl is-active mysql || systemctl is-active mariadb")
}

/// PHP version string, second word of the first `php -v` line.
#[must_use]
pub fn php_version() -> RemoteCommand {
    RemoteCommand::script("php -v | head -n1 | awk '{print $2}'")
}

/// Remote hostname, for the migration summary.
#[must_use]
pub fn hostname() -> RemoteCommand {
    RemoteCommand::script("hostname")
}

// ── database stage ──────────────────────────────────────────────────────

#[must_use]
pub fn make_dir(path: &str) -> RemoteCommand {
    RemoteCommand::builder("mkdir").opt("-p").arg(path).build()
}

/// `mysqldump` into a file, stderr folded in so auth failures surface in
/// the dump file check rather than vanishing.
#[must_use]
pub fn dump_database(creds_user: &str, creds_password: &str, creds_host: &str, db: &str, out: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "mysqldump -u {} -p{} -h {} {} > {} 2>&1",
        sh_quote(creds_user),
        sh_quote(creds_password),
        sh_quote(creds_host),
        sh_quote(db),
        sh_quote(out),
    ))
}

#[must_use]
pub fn gzip_file(path: &str) -> RemoteCommand {
    RemoteCommand::builder("gzip").opt("-f").arg(path).build()
}

/// Human-readable size of a file (first field of `du -h`).
#[must_use]
pub fn file_size_human(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("du -h {} | cut -f1", sh_quote(path)))
}

#[must_use]
pub fn gunzip_keep(src: &str, dst: &str) -> RemoteCommand {
    RemoteCommand::script(format!("gunzip -c {} > {}", sh_quote(src), sh_quote(dst)))
}

/// Import a plain SQL file into the destination database.
#[must_use]
pub fn import_database(
    creds_user: &str,
    creds_password: &str,
    creds_host: &str,
    db: &str,
    file: &str,
) -> RemoteCommand {
    RemoteCommand::script(format!(
        "mysql -u {} -p{} -h {} {} < {}",
        sh_quote(creds_user),
        sh_quote(creds_password),
        sh_quote(creds_host),
        sh_quote(db),
        sh_quote(file),
    ))
}

#[must_use]
pub fn remove_file(path: &str) -> RemoteCommand {
    RemoteCommand::builder("rm").opt("-f").arg(path).build()
}

/// List databases visible to the given account; used to decide whether the
/// destination database already exists.
#[must_use]
pub fn show_databases(creds_user: &str, creds_password: &str, creds_host: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "mysql -u {} -p{} -h {} -e {}",
        sh_quote(creds_user),
        sh_quote(creds_password),
        sh_quote(creds_host),
        sh_quote("SHOW DATABASES;"),
    ))
}

/// Create the destination database and grant the application user, via a
/// passwordless `mysql -u root` heredoc. Identifiers are backtick-quoted,
/// string literals escaped.
#[must_use]
pub fn create_database(db: &str, user: &str, password: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "mysql -u root <<'EOF'\n\
         CREATE DATABASE IF NOT EXISTS `{db}`;\n\
         CREATE USER IF NOT EXISTS '{user}'@'localhost' IDENTIFIED BY '{pw}';\n\
         GRANT ALL PRIVILEGES ON `{db}`.* TO '{user}'@'localhost';\n\
         FLUSH PRIVILEGES;\n\
         EOF",
        db = db,
        user = sql_string_escape(user),
        pw = sql_string_escape(password),
    ))
}

/// Rewrite `siteurl` and `home` in `wp_options` for the new URL.
#[must_use]
pub fn update_site_urls(
    creds_user: &str,
    creds_password: &str,
    creds_host: &str,
    db: &str,
    new_url: &str,
) -> RemoteCommand {
    let url = sql_string_escape(new_url);
    RemoteCommand::script(format!(
        "mysql -u {} -p{} -h {} {} <<'EOF'\n\
         UPDATE wp_options SET option_value = '{url}' WHERE option_name = 'siteurl';\n\
         UPDATE wp_options SET option_value = '{url}' WHERE option_name = 'home';\n\
         EOF",
        sh_quote(creds_user),
        sh_quote(creds_password),
        sh_quote(creds_host),
        sh_quote(db),
    ))
}

// ── filesystem stage ────────────────────────────────────────────────────

/// Pack the WordPress tree into an archive, relative to its parent so the
/// extracted layout is position independent.
#[must_use]
pub fn archive_tree(src: &str, archive: &str) -> RemoteCommand {
    RemoteCommand::script(format!("cd {} && tar -czf {} .", sh_quote(src), sh_quote(archive)))
}

#[must_use]
pub fn extract_tree(archive: &str, dst: &str) -> RemoteCommand {
    RemoteCommand::script(format!("cd {} && tar -xzf {}", sh_quote(dst), sh_quote(archive)))
}

/// Count of regular files under a tree, for the post-extract sanity check.
#[must_use]
pub fn file_count(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("find {} -type f | wc -l", sh_quote(path)))
}

#[must_use]
pub fn dir_exists(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("test -d {}", sh_quote(path)))
}

#[must_use]
pub fn copy_tree(src: &str, dst: &str) -> RemoteCommand {
    RemoteCommand::builder("cp").opt("-r").arg(src).arg(dst).build()
}

/// Empty a directory's contents while keeping the directory itself. The
/// glob must stay outside the quoted path for the shell to expand it.
#[must_use]
pub fn clear_dir_contents(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("rm -rf {}/*", sh_quote(path)))
}

#[must_use]
pub fn sudo_make_dir(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("sudo mkdir -p {}", sh_quote(path)))
}

#[must_use]
pub fn chown_tree(owner: &str, path: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "sudo chown -R {}:{} {}",
        sh_quote(owner),
        sh_quote(owner),
        sh_quote(path),
    ))
}

/// 755 for directories.
#[must_use]
pub fn chmod_dirs(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "sudo find {} -type d -exec chmod 755 {{}} \\;",
        sh_quote(path),
    ))
}

/// 644 for regular files.
#[must_use]
pub fn chmod_files(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "sudo find {} -type f -exec chmod 644 {{}} \\;",
        sh_quote(path),
    ))
}

/// wp-config.php is tightened to 640 after the blanket file pass.
#[must_use]
pub fn chmod_config(wp_path: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "sudo chmod 640 {}",
        sh_quote(&format!("{wp_path}/{CONFIG_MARKER}")),
    ))
}

// ── wp-config.php rewriting ─────────────────────────────────────────────

fn config_file(wp_path: &str) -> String {
    sh_quote(&format!("{wp_path}/{CONFIG_MARKER}"))
}

/// Replace a string-valued `define` in place, tolerating the varying
/// whitespace WordPress emits after the opening paren.
#[must_use]
pub fn replace_string_directive(wp_path: &str, name: &str, value: &str) -> RemoteCommand {
    let script = format!(
        "s/define( *'{name}'.*/define( '{name}', '{value}' );/",
        name = name,
        value = sed_replacement_escape(&php_string_escape(value)),
    );
    RemoteCommand::script(format!("sed -i {} {}", sh_quote(&script), config_file(wp_path)))
}

/// Replace a boolean-valued `define` in place.
#[must_use]
pub fn replace_bool_directive(wp_path: &str, name: &str, value: bool) -> RemoteCommand {
    let script = format!(
        "s/define( *'{name}'.*/define( '{name}', {value} );/",
        name = name,
        value = value,
    );
    RemoteCommand::script(format!("sed -i {} {}", sh_quote(&script), config_file(wp_path)))
}

/// Rewrite the whole line defining `name` with a fresh value, matching on
/// the key rather than the old value. Used for salts, whose current values
/// are unknown and full of sed metacharacters.
#[must_use]
pub fn rewrite_directive_line(wp_path: &str, name: &str, value: &str) -> RemoteCommand {
    let script = format!(
        "/define([[:space:]]*'{name}'/c\\define( '{name}', '{value}' );",
        name = name,
        value = sed_replacement_escape(&php_string_escape(value)),
    );
    RemoteCommand::script(format!("sed -i {} {}", sh_quote(&script), config_file(wp_path)))
}

/// How many lines define `name`; 0 means the directive must be inserted
/// rather than rewritten. `|| true` keeps grep's no-match exit code from
/// reading as a failure.
#[must_use]
pub fn count_directive(wp_path: &str, name: &str) -> RemoteCommand {
    RemoteCommand::script(format!(
        "grep -c {} {} || true",
        sh_quote(&format!("'{name}'")),
        config_file(wp_path),
    ))
}

/// Insert a line immediately before the stop-editing sentinel.
#[must_use]
pub fn insert_before_sentinel(wp_path: &str, line: &str) -> RemoteCommand {
    let script = format!("/{SENTINEL}/i\\{line}");
    RemoteCommand::script(format!("sed -i {} {}", sh_quote(&script), config_file(wp_path)))
}

/// Insert a line immediately after the first line matching `anchor`.
#[must_use]
pub fn insert_after(wp_path: &str, anchor: &str, line: &str) -> RemoteCommand {
    let script = format!("/{anchor}/a\\{line}");
    RemoteCommand::script(format!("sed -i {} {}", sh_quote(&script), config_file(wp_path)))
}

/// A `define` line ready for insertion, boolean-valued.
#[must_use]
pub fn bool_define_line(name: &str, value: bool) -> String {
    format!("define( '{name}', {value} );")
}

// ── verification ────────────────────────────────────────────────────────

#[must_use]
pub fn file_exists(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("test -f {}", sh_quote(path)))
}

/// Octal permission bits of a file.
#[must_use]
pub fn file_mode(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("stat -c '%a' {}", sh_quote(path)))
}

/// PHP syntax check of the rewritten config.
#[must_use]
pub fn php_lint(path: &str) -> RemoteCommand {
    RemoteCommand::script(format!("php -l {}", sh_quote(path)))
}
