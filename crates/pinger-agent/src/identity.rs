use std::fs;
use std::path::Path;

use anyhow::Context;
use uuid::Uuid;

/// Returns this installation's anonymous client identity, generating and
/// persisting one on first use. The identity is opaque to the server; it only
/// scopes target ownership and the per-client quota.
pub fn load_or_create_client_id(path: &Path) -> anyhow::Result<String> {
    if let Ok(existing) = fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let id = Uuid::new_v4().to_string();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating state directory {}", parent.display()))?;
    }
    fs::write(path, &id).with_context(|| format!("writing client id to {}", path.display()))?;

    Ok(id)
}
