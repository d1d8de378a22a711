//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the directory holding a data file exists before a store opens it.
pub async fn ensure_data_dir(file_path: &str) -> anyhow::Result<()> {
    let Some(parent) = Path::new(file_path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    if tokio::fs::metadata(parent).await.is_err() {
        warn!(dir = %parent.display(), "data directory missing; creating");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent_dirs() -> anyhow::Result<()> {
        let base = std::env::temp_dir().join(format!("staybook_env_{}", std::process::id()));
        let file = base.join("nested/objects.json");
        ensure_data_dir(file.to_str().unwrap()).await?;
        assert!(tokio::fs::metadata(file.parent().unwrap()).await.is_ok());
        let _ = tokio::fs::remove_dir_all(&base).await;
        Ok(())
    }

    #[tokio::test]
    async fn bare_filename_is_fine() -> anyhow::Result<()> {
        ensure_data_dir("objects.json").await
    }
}
