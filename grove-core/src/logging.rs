use std::path::Path;

/// Initialise `env_logger`, appending to `log_file` when it can be opened.
///
/// Respects `RUST_LOG`; defaults to `info`. Falls back to stderr if the file
/// (or its parent directory) cannot be created.
pub fn init_with(log_file: Option<&Path>) {
    use env_logger::{Env, Target};
    use std::fs;
    use std::io;

    let target = log_file
        .and_then(|path| {
            (|| -> io::Result<Target> {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Ok(Target::Pipe(Box::new(file)))
            })()
            .ok()
        })
        .unwrap_or(Target::Stderr);

    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(target)
        .try_init();
}
