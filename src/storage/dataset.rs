//! The YAML seed dataset the repository is loaded from.

use std::{io, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Config, Employee, InsertError, JobClassification, OrganizationalUnit, Position, Repository,
};

/// Errors that can occur when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The dataset file could not be read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),
    /// The dataset is not valid YAML, or does not match the expected shape.
    #[error("failed to parse dataset: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A record could not be added to the repository.
    #[error("invalid dataset: {0}")]
    Insert(#[from] InsertError),
}

/// The four record collections, as they appear in a dataset file.
///
/// ```yaml
/// units:
///   - id: O-001
///     code: ACME
///     name: Acme Corp
///     valid_from: 2015-01-01
///     level: 1
///     unit_type: company
/// positions: []
/// job_classifications: []
/// employees: []
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Organizational units, parents before children by convention.
    #[serde(default)]
    pub units: Vec<OrganizationalUnit>,
    /// Positions.
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Job classifications.
    #[serde(default)]
    pub job_classifications: Vec<JobClassification>,
    /// Employees.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

impl Dataset {
    /// Reads a dataset from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_yaml(&content)?;
        tracing::debug!(
            path = %path.display(),
            units = dataset.units.len(),
            positions = dataset.positions.len(),
            employees = dataset.employees.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Parses a dataset from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid dataset.
    pub fn from_yaml(content: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds a repository holding every record, in dataset order.
    ///
    /// References between records are not checked here; see
    /// [`Repository::check_references`].
    ///
    /// # Errors
    ///
    /// Returns an error if an identifier is repeated or has the wrong prefix
    /// for its collection.
    pub fn into_repository(self, config: Config) -> Result<Repository, LoadError> {
        let mut repository = Repository::new(config);
        for unit in self.units {
            repository.insert_unit(unit)?;
        }
        for classification in self.job_classifications {
            repository.insert_classification(classification)?;
        }
        for position in self.positions {
            repository.insert_position(position)?;
        }
        for employee in self.employees {
            repository.insert_employee(employee)?;
        }
        Ok(repository)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Dataset;
    use crate::domain::{Config, EntityId, Repository};

    pub const ACME: &str = include_str!("../../fixtures/acme.yaml");

    /// The seed organization from `fixtures/acme.yaml`.
    pub fn acme() -> Repository {
        acme_with(Config::default())
    }

    pub fn acme_with(config: Config) -> Repository {
        Dataset::from_yaml(ACME)
            .unwrap()
            .into_repository(config)
            .unwrap()
    }

    pub fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }
}
