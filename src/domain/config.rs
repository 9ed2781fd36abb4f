use std::path::Path;

use serde::{Deserialize, Serialize};

/// What happens to the levels of a unit's descendants when the unit is moved
/// or nested under a new parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelPolicy {
    /// Descendants keep their stored level, even if it no longer matches
    /// their depth.
    Preserve,
    /// Every descendant's level is recomputed as the moved unit's new level
    /// plus its depth below it.
    #[default]
    Renumber,
}

/// What happens to an employee whose position is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncumbentPolicy {
    /// The employee's `position_id` is cleared, as are unit manager
    /// references to the deleted position.
    #[default]
    Clear,
    /// References are left in place and reported as dangling.
    Retain,
}

/// Configuration for the organization chart engine.
///
/// Controls identifier formatting and the policies the mutation engine
/// applies where the data model leaves a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of digits identifiers are padded to.
    ///
    /// For example, 'O-001' (3 digits) or 'O-0001' (4 digits).
    digits: usize,

    /// Level renumbering applied on move and nest-merge.
    pub level_policy: LevelPolicy,

    /// Treatment of incumbents when positions are deleted.
    pub incumbent_policy: IncumbentPolicy,

    /// Whether a new unit's level must be exactly one below its parent.
    pub enforce_levels: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            digits: default_digits(),
            level_policy: LevelPolicy::default(),
            incumbent_policy: IncumbentPolicy::default(),
            enforce_levels: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration at `path`, falling back to the defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of digits for padding identifiers.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Returns this configuration with the given level policy.
    #[must_use]
    pub const fn with_level_policy(mut self, policy: LevelPolicy) -> Self {
        self.level_policy = policy;
        self
    }

    /// Returns this configuration with the given incumbent policy.
    #[must_use]
    pub const fn with_incumbent_policy(mut self, policy: IncumbentPolicy) -> Self {
        self.incumbent_policy = policy;
        self
    }

    /// Returns this configuration with level enforcement switched on or off.
    #[must_use]
    pub const fn with_enforce_levels(mut self, enforce: bool) -> Self {
        self.enforce_levels = enforce;
        self
    }
}

const fn default_digits() -> usize {
    3
}

const fn default_enforce_levels() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_digits")]
        digits: usize,

        #[serde(default)]
        level_policy: LevelPolicy,

        #[serde(default)]
        incumbent_policy: IncumbentPolicy,

        #[serde(default = "default_enforce_levels")]
        enforce_levels: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                digits,
                level_policy,
                incumbent_policy,
                enforce_levels,
            } => Self {
                digits,
                level_policy,
                incumbent_policy,
                enforce_levels,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            digits: config.digits,
            level_policy: config.level_policy,
            incumbent_policy: config.incumbent_policy,
            enforce_levels: config.enforce_levels,
        }
    }
}
