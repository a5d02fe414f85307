//! Filesystem helpers shared by the run outputs.

#[cfg(feature = "cli")]
pub mod verbosity;

use color_eyre::eyre::{Report, Result, WrapErr};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

/// Create the parent directory of `path` if it does not exist yet.
///
/// ## Examples
///
/// ```rust
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("nested").join("file.json");
/// tangle::utils::create_parent_dir(&path)?;
/// assert!(dir.path().join("nested").exists());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn create_parent_dir<P>(path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directory: {parent:?}"))?;
        }
    }
    Ok(())
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T, P>(value: &T, path: &P) -> Result<(), Report>
where
    T: Serialize,
    P: AsRef<Path> + Debug,
{
    create_parent_dir(path)?;
    let output = serde_json::to_string_pretty(value)
        .wrap_err_with(|| format!("Failed to serialize: {path:?}"))?;
    std::fs::write(path, output).wrap_err_with(|| format!("Failed to write: {path:?}"))?;
    Ok(())
}

/// Write text, such as a DOT graph, to `path`, creating parent directories.
pub fn write_text<P>(text: &str, path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    create_parent_dir(path)?;
    std::fs::write(path, text).wrap_err_with(|| format!("Failed to write: {path:?}"))?;
    Ok(())
}
