use super::config::{default_config_path, VaultConfig};
use std::path::PathBuf;

/// Write a commented default configuration file
///
/// Refuses to overwrite an existing file unless `force` is set.
pub async fn execute(path: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

    if path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    VaultConfig::create_default(&path)?;
    println!("📝 Wrote default configuration: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_config_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        execute(Some(path.to_string_lossy().to_string()), false)
            .await
            .unwrap();

        assert!(path.exists());
        assert!(VaultConfig::load(&path).is_ok());
    }

    #[tokio::test]
    async fn test_init_config_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[governance]\nrequired_quorum = 5\n").unwrap();

        let path_arg = path.to_string_lossy().to_string();
        assert!(execute(Some(path_arg.clone()), false).await.is_err());
        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.governance.required_quorum, 5);

        execute(Some(path_arg), true).await.unwrap();
        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.governance.required_quorum, 2);
    }
}
