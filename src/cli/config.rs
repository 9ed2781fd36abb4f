use std::path::Path;

use orgchart::{
    Config,
    domain::{IncumbentPolicy, LevelPolicy},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let mut config = Config::load_or_default(config_path).map_err(|e| anyhow::anyhow!("{e}"))?;

        match self.command {
            Subcommand::Show => {
                println!("Configuration:");
                println!("  digits: {}", config.digits());
                println!(
                    "  level_policy: {} ({})",
                    level_policy_label(config.level_policy),
                    match config.level_policy {
                        LevelPolicy::Renumber => "descendants follow a moved unit",
                        LevelPolicy::Preserve => "descendants keep their stored level",
                    }
                    .dim()
                );
                println!(
                    "  incumbent_policy: {} ({})",
                    incumbent_policy_label(config.incumbent_policy),
                    match config.incumbent_policy {
                        IncumbentPolicy::Clear => "references to deleted positions are cleared",
                        IncumbentPolicy::Retain => "references to deleted positions are kept",
                    }
                    .dim()
                );
                println!("  enforce_levels: {}", config.enforce_levels);
            }
            Subcommand::Set { key, value } => {
                apply(&mut config, &key, &value)?;
                config
                    .save(config_path)
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("{key} = {value}").success());
            }
        }

        Ok(())
    }
}

fn apply(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "level_policy" => {
            config.level_policy = match value {
                "renumber" => LevelPolicy::Renumber,
                "preserve" => LevelPolicy::Preserve,
                _ => anyhow::bail!("Value must be 'renumber' or 'preserve'"),
            };
        }
        "incumbent_policy" => {
            config.incumbent_policy = match value {
                "clear" => IncumbentPolicy::Clear,
                "retain" => IncumbentPolicy::Retain,
                _ => anyhow::bail!("Value must be 'clear' or 'retain'"),
            };
        }
        "enforce_levels" => {
            config.enforce_levels = value
                .parse::<bool>()
                .map_err(|_| anyhow::anyhow!("Value must be 'true' or 'false'"))?;
        }
        _ => anyhow::bail!(
            "Unknown configuration key: '{key}'\nSupported keys: level_policy, \
             incumbent_policy, enforce_levels"
        ),
    }
    Ok(())
}

const fn level_policy_label(policy: LevelPolicy) -> &'static str {
    match policy {
        LevelPolicy::Renumber => "renumber",
        LevelPolicy::Preserve => "preserve",
    }
}

const fn incumbent_policy_label(policy: IncumbentPolicy) -> &'static str {
    match policy {
        IncumbentPolicy::Clear => "clear",
        IncumbentPolicy::Retain => "retain",
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn settings_are_saved_and_reloaded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("orgchart.toml");

        for (key, value) in [
            ("level_policy", "preserve"),
            ("incumbent_policy", "retain"),
            ("enforce_levels", "false"),
        ] {
            Command {
                command: Subcommand::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                },
            }
            .run(&path)
            .unwrap();
        }

        let config = Config::load(&path).unwrap();
        assert_eq!(config.level_policy, LevelPolicy::Preserve);
        assert_eq!(config.incumbent_policy, IncumbentPolicy::Retain);
        assert!(!config.enforce_levels);

        Command {
            command: Subcommand::Show,
        }
        .run(&path)
        .unwrap();
    }

    #[test_case("level_policy", "sideways")]
    #[test_case("incumbent_policy", "maybe")]
    #[test_case("enforce_levels", "yes")]
    #[test_case("digits", "4")]
    fn bad_settings_are_rejected(key: &str, value: &str) {
        let mut config = Config::default();
        assert!(apply(&mut config, key, value).is_err());
        assert_eq!(config, Config::default());
    }
}
