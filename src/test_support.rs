use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// Creates a fresh directory under the system temp dir, unique per process and call.
pub fn scratch_dir(label: &str) -> io::Result<PathBuf> {
    let serial = NEXT_SCRATCH.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "hierarchy_explorer_{label}_{}_{serial}",
        std::process::id()
    ));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn discard_scratch_dir(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

/// Points a spawned explorer binary at an isolated seed and log directory.
///
/// Every `HIERARCHY_*` variable is set explicitly so a developer's `.env` cannot leak in.
pub fn apply_explorer_test_env(
    command: &mut Command,
    seed_path: Option<&Path>,
    log_dir: &Path,
    allow_user_delete: bool,
) {
    match seed_path {
        Some(path) => command.env("HIERARCHY_SEED_PATH", path.as_os_str()),
        None => command.env("HIERARCHY_SEED_PATH", ""),
    };
    command.env(
        "HIERARCHY_ALLOW_USER_DELETE",
        if allow_user_delete { "true" } else { "false" },
    );
    command.env("HIERARCHY_BIND", "127.0.0.1:0");
    command.env("HIERARCHY_LOG_DIR", log_dir.as_os_str());
    command.env("HIERARCHY_FILE_LOG", "debug");
    command.env("RUST_LOG", "error");
}
