//! Private-file helpers shared by the key and credential stores.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Write `contents` to `path` atomically with owner-only permissions.
///
/// Writes to a `.tmp` sibling first, syncs it, then renames it over the
/// target so a concurrent reader sees either the old file or the new one,
/// never a torn write.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the write,
/// permission change, or rename fails.
pub fn write_private_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    create_parent(path)?;

    let tmp_path = temp_sibling(path, ".tmp");
    write_synced(&tmp_path, contents)?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e)
            .with_context(|| format!("failed to rename temp file to {}", path.display()));
    }
    Ok(())
}

/// Create `path` with `contents` and owner-only permissions, unless it
/// already exists.
///
/// The file is fully written and synced under a per-process temp name, then
/// hard-linked into place. Linking fails if the target exists, so a file
/// published by another process is never replaced.
///
/// Returns `false` when `path` already existed and was left untouched.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the write,
/// permission change, or link fails for any reason other than an existing
/// target.
pub fn write_private_new(path: &Path, contents: &[u8]) -> anyhow::Result<bool> {
    create_parent(path)?;

    let tmp_path = temp_sibling(path, &format!(".{}.tmp", std::process::id()));
    write_synced(&tmp_path, contents)?;

    let linked = fs::hard_link(&tmp_path, path);
    let _ = fs::remove_file(&tmp_path);
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to link temp file to {}", path.display())),
    }
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn write_synced(tmp_path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let mut file = fs::File::create(tmp_path)
        .with_context(|| format!("failed to create temp file {}", tmp_path.display()))?;
    enforce_private_file_permissions(tmp_path)?;
    file.write_all(contents)
        .with_context(|| format!("failed to write temp file {}", tmp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file {}", tmp_path.display()))?;
    Ok(())
}

/// Restrict a file to owner read/write where the platform supports it.
///
/// # Errors
///
/// Returns an error if permissions cannot be updated.
pub fn enforce_private_file_permissions(path: &Path) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

fn temp_sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
