//! Path existence probing.

use super::process_ops::{execute_shell_cmd, ProcessOps};
use crate::policy::ExecOptions;
use std::fs;
use std::path::Path;

/// Does `path` exist as a directory (`is_directory`) or as a regular file?
///
/// The unprivileged check runs first. Only when it cannot see the entry and
/// `as_root` is set is a privileged `test -d`/`test -f` issued through `hal`.
/// Inspection errors and absence both yield `false`.
pub fn exists_path(hal: &dyn ProcessOps, path: &Path, is_directory: bool, as_root: bool) -> bool {
    let found = match fs::metadata(path) {
        Ok(meta) if is_directory => meta.is_dir(),
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    };
    if found || !as_root {
        return found;
    }

    let flag = if is_directory { "-d" } else { "-f" };
    let script = format!("test {flag} \"$1\" && echo 1");
    let path_arg = path.to_string_lossy();
    let args = ["-c", script.as_str(), "sh", &*path_arg];
    !execute_shell_cmd(hal, "sh", &args, &ExecOptions::privileged())
        .trim()
        .is_empty()
}
