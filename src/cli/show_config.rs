use super::config::VaultConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Print the effective governance parameters
///
/// Reads `--config` if given, else the default path, else built-in defaults.
pub async fn execute(config: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.map(PathBuf::from);
    let config = VaultConfig::load_or_default(path.as_deref())?;
    let params = config.governance.to_params()?;

    println!("⚙️  Governance parameters");
    println!("   Required quorum: {}", params.required_quorum);
    println!("   Timelock:        {}", human(params.timelock));
    println!("   Expiry window:   {}", human(params.expiry_window));
    println!();
    println!("   Log level: {}", config.logging.level);
    match &config.logging.file {
        Some(file) => println!("   Log file:  {}", file.display()),
        None => println!("   Log file:  (stderr)"),
    }

    Ok(())
}

fn human(duration: Duration) -> String {
    format!(
        "{} ({}s)",
        humantime::format_duration(duration),
        duration.as_secs()
    )
}
