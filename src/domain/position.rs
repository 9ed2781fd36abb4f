use serde::{Deserialize, Serialize};

use crate::domain::{EntityId, unit::Status};

/// Whether a position is occupied or being recruited for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiringStatus {
    /// An incumbent holds the position.
    Filled,
    /// Nobody holds the position and no search is open.
    #[default]
    Vacant,
    /// Recruitment is in progress.
    Hiring,
}

/// Where the holder of a position is expected to work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    /// On site at the office location.
    #[default]
    Onsite,
    /// Split between office and remote.
    Hybrid,
    /// Fully remote.
    Remote,
}

/// A staffing slot attached to an organizational unit.
///
/// A position sits in two independent hierarchies: structurally it belongs to
/// a unit (`organizational_unit_id`), and for management reporting it reports
/// to another position (`reports_to_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique identifier.
    pub id: EntityId,
    /// Human-readable code.
    pub code: String,
    /// Job title.
    pub title: String,
    /// Full-time equivalent.
    #[serde(default = "default_fte")]
    pub fte: f32,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Status,
    /// Whether the position is filled.
    #[serde(default)]
    pub hiring_status: HiringStatus,
    /// Expected work arrangement.
    #[serde(default)]
    pub work_mode: WorkMode,
    /// Office the position is based at.
    #[serde(default)]
    pub office_location: String,
    /// Free-text area of responsibility.
    #[serde(default)]
    pub focus_area: String,
    /// The unit this position belongs to.
    pub organizational_unit_id: EntityId,
    /// The role template this position instantiates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_classification_id: Option<EntityId>,
    /// The manager position this one reports to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_to_id: Option<EntityId>,
    /// The employee currently occupying this position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incumbent_id: Option<EntityId>,
}

const fn default_fte() -> f32 {
    1.0
}

impl Position {
    /// Whether an employee currently holds the position.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.incumbent_id.is_some()
    }
}

/// The fields a caller supplies when adding a position.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    /// Human-readable code.
    pub code: String,
    /// Job title.
    pub title: String,
    /// The unit the position belongs to.
    pub organizational_unit_id: EntityId,
    /// The role template.
    pub job_classification_id: Option<EntityId>,
    /// The manager position.
    pub reports_to_id: Option<EntityId>,
}

impl NewPosition {
    pub(crate) fn into_position(self, id: EntityId) -> Position {
        Position {
            id,
            code: self.code,
            title: self.title,
            fte: default_fte(),
            status: Status::Active,
            hiring_status: HiringStatus::Vacant,
            work_mode: WorkMode::default(),
            office_location: String::new(),
            focus_area: String::new(),
            organizational_unit_id: self.organizational_unit_id,
            job_classification_id: self.job_classification_id,
            reports_to_id: self.reports_to_id,
            incumbent_id: None,
        }
    }
}
