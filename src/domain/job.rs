use serde::{Deserialize, Serialize};

use crate::domain::EntityId;

/// A role template referenced by positions.
///
/// Classifications are reference data; nothing in the mutation engine
/// changes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobClassification {
    /// Unique identifier.
    pub id: EntityId,
    /// Generic job title.
    pub title: String,
    /// Job family, e.g. "Engineering".
    #[serde(default)]
    pub family: String,
    /// Seniority level within the family.
    #[serde(default)]
    pub level: String,
    /// Pay grade.
    #[serde(default)]
    pub pay_grade: String,
    /// Requirements a candidate must meet.
    #[serde(default)]
    pub requirements: Vec<String>,
}
