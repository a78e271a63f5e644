use clap::{Parser, Subcommand};

pub mod config;
pub mod init_config;
pub mod logging;
pub mod show_config;
pub mod simulate;
pub mod version;

#[derive(Parser)]
#[command(name = "quorum-vault")]
#[command(author = "Quorum Vault Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the quorum vault", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    InitConfig {
        /// Where to write it (default: ~/.config/quorum-vault/config.toml)
        #[arg(long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective governance parameters
    ShowConfig {
        /// Path to config file (default: ~/.config/quorum-vault/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Replay a JSON scenario against an in-memory vault
    Simulate {
        /// Scenario file
        #[arg(long)]
        scenario: String,

        /// Path to config file (default: ~/.config/quorum-vault/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { path, force } => init_config::execute(path, force).await,
        Commands::ShowConfig { config } => show_config::execute(config).await,
        Commands::Simulate {
            scenario,
            config,
            json,
        } => simulate::execute(scenario, config, json).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init_config() {
        let cli = Cli::parse_from(["quorum-vault", "init-config"]);

        match cli.command {
            Commands::InitConfig { path, force } => {
                assert_eq!(path, None);
                assert!(!force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_init_config_with_options() {
        let cli = Cli::parse_from([
            "quorum-vault",
            "init-config",
            "--path",
            "/etc/quorum-vault/config.toml",
            "--force",
        ]);

        match cli.command {
            Commands::InitConfig { path, force } => {
                assert_eq!(path, Some("/etc/quorum-vault/config.toml".to_string()));
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_show_config() {
        let cli = Cli::parse_from(["quorum-vault", "show-config", "--config", "/tmp/c.toml"]);

        match cli.command {
            Commands::ShowConfig { config } => {
                assert_eq!(config, Some("/tmp/c.toml".to_string()));
            }
            _ => panic!("Expected ShowConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_simulate() {
        let cli = Cli::parse_from([
            "quorum-vault",
            "simulate",
            "--scenario",
            "demos/withdrawal.json",
            "--json",
        ]);

        match cli.command {
            Commands::Simulate {
                scenario,
                config,
                json,
            } => {
                assert_eq!(scenario, "demos/withdrawal.json");
                assert_eq!(config, None);
                assert!(json);
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn test_cli_simulate_requires_scenario() {
        let result = Cli::try_parse_from(["quorum-vault", "simulate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["quorum-vault", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
