use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::EntityId;

/// Lifecycle status shared by units and positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// In use; included in the organization tree.
    #[default]
    Active,
    /// Retired; kept for history but excluded from the tree.
    Inactive,
}

impl Status {
    /// Returns `true` for [`Status::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The structural type of an organizational unit.
///
/// Types are ordered from the top of the hierarchy down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// The root of the organization.
    Company,
    /// A top-level business division.
    Division,
    /// A department within a division.
    Department,
    /// A team within a department (or directly within a division).
    Team,
}

impl UnitType {
    /// The unit types a unit of this type may be merged into.
    ///
    /// Units only merge sideways or up the type hierarchy: divisions into
    /// divisions, departments into divisions or departments, and teams into
    /// any of the three. A company never merges.
    #[must_use]
    pub const fn merge_targets(self) -> &'static [Self] {
        match self {
            Self::Company => &[],
            Self::Division => &[Self::Division],
            Self::Department => &[Self::Division, Self::Department],
            Self::Team => &[Self::Division, Self::Department, Self::Team],
        }
    }

    /// Whether a unit of this type may be merged into a unit of type `target`.
    #[must_use]
    pub fn can_merge_into(self, target: Self) -> bool {
        self.merge_targets().contains(&target)
    }

    /// Lowercase label, as used in the dataset and on the command line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Division => "division",
            Self::Department => "department",
            Self::Team => "team",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A node of the organizational structure: the company, a division, a
/// department or a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationalUnit {
    /// Unique identifier.
    pub id: EntityId,
    /// Human-readable code, unique by convention.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Short name.
    #[serde(default)]
    pub abbreviation: String,
    /// Cost center the unit books against.
    #[serde(default)]
    pub cost_center: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Status,
    /// First day the unit is valid.
    pub valid_from: NaiveDate,
    /// Last day the unit is valid, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    /// Depth in the hierarchy; 1 is the company root.
    pub level: u32,
    /// Structural type.
    pub unit_type: UnitType,
    /// The parent unit. Only the root has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    /// The position that leads this unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_position_id: Option<EntityId>,
}

impl OrganizationalUnit {
    /// Whether this unit is the active company root (level 1, no parent).
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.level == 1 && self.parent_id.is_none()
    }
}

/// The fields a caller supplies when adding a unit.
///
/// The repository assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUnit {
    /// Human-readable code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Short name.
    pub abbreviation: String,
    /// Cost center.
    pub cost_center: String,
    /// Structural type.
    pub unit_type: UnitType,
    /// Parent unit; `None` only for a company.
    pub parent_id: Option<EntityId>,
    /// Depth in the hierarchy.
    pub level: u32,
    /// Leading position, if already known.
    pub manager_position_id: Option<EntityId>,
    /// First day the unit is valid.
    pub valid_from: NaiveDate,
}

impl NewUnit {
    /// A new unit of the given type directly under `parent`, one level below
    /// it.
    #[must_use]
    pub fn under(
        parent: &OrganizationalUnit,
        unit_type: UnitType,
        code: impl Into<String>,
        name: impl Into<String>,
        valid_from: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            abbreviation: String::new(),
            cost_center: parent.cost_center.clone(),
            unit_type,
            parent_id: Some(parent.id),
            level: parent.level + 1,
            manager_position_id: None,
            valid_from,
        }
    }

    pub(crate) fn into_unit(self, id: EntityId) -> OrganizationalUnit {
        OrganizationalUnit {
            id,
            code: self.code,
            name: self.name,
            abbreviation: self.abbreviation,
            cost_center: self.cost_center,
            status: Status::Active,
            valid_from: self.valid_from,
            valid_to: None,
            level: self.level,
            unit_type: self.unit_type,
            parent_id: self.parent_id,
            manager_position_id: self.manager_position_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(UnitType::Division, UnitType::Division, true)]
    #[test_case(UnitType::Division, UnitType::Department, false)]
    #[test_case(UnitType::Department, UnitType::Division, true)]
    #[test_case(UnitType::Department, UnitType::Department, true)]
    #[test_case(UnitType::Department, UnitType::Team, false)]
    #[test_case(UnitType::Team, UnitType::Division, true)]
    #[test_case(UnitType::Team, UnitType::Department, true)]
    #[test_case(UnitType::Team, UnitType::Team, true)]
    #[test_case(UnitType::Company, UnitType::Company, false)]
    #[test_case(UnitType::Team, UnitType::Company, false)]
    fn merge_rule_only_goes_sideways_or_up(source: UnitType, target: UnitType, allowed: bool) {
        assert_eq!(source.can_merge_into(target), allowed);
    }

    #[test]
    fn new_unit_under_parent_is_one_level_down() {
        let parent = OrganizationalUnit {
            id: EntityId::unit(10).unwrap(),
            code: "ENG".to_string(),
            name: "Engineering".to_string(),
            abbreviation: "ENG".to_string(),
            cost_center: "CC-200".to_string(),
            status: Status::Active,
            valid_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            valid_to: None,
            level: 2,
            unit_type: UnitType::Division,
            parent_id: EntityId::unit(1),
            manager_position_id: None,
        };

        let unit = NewUnit::under(
            &parent,
            UnitType::Department,
            "PLT",
            "Platform",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );

        assert_eq!(unit.level, 3);
        assert_eq!(unit.parent_id, Some(parent.id));
        assert_eq!(unit.cost_center, "CC-200");
    }

    #[test]
    fn status_and_type_use_lowercase_labels() {
        assert_eq!(serde_json::to_string(&Status::Inactive).unwrap(), "\"inactive\"");
        assert_eq!(
            serde_json::to_string(&UnitType::Department).unwrap(),
            "\"department\""
        );
    }
}
