//! Domain models for the organization chart.
//!
//! Records follow the O-S-C-P model: organizational units (`O`) form the
//! structural tree, positions (`S`) are staffing slots within units, job
//! classifications (`C`) are role templates, and employees (`P`) hold
//! positions. Everything lives in a flat [`Repository`]; the
//! [`OrgUnitNode`] tree is derived from it.

/// Typed record identifiers such as `O-001`.
pub mod id;
pub use id::{EntityId, EntityKind, Error as IdError};

mod config;
pub use config::{Config, IncumbentPolicy, LevelPolicy};

/// Organizational units and their types.
pub mod unit;
pub use unit::{NewUnit, OrganizationalUnit, Status, UnitType};

/// Positions, the staffing slots within units.
pub mod position;
pub use position::{HiringStatus, NewPosition, Position, WorkMode};

/// Job classifications.
pub mod job;
pub use job::JobClassification;

/// Employees.
pub mod employee;
pub use employee::{Employee, EmployeeStatus, NewEmployee};

pub mod repository;
pub use repository::{IdentifiersExhausted, InsertError, NotFound, Repository};

pub mod hierarchy;
pub use hierarchy::{format_hierarchy_compact, format_hierarchy_display};

pub mod tree;
pub use tree::{BuildError, OrgUnitNode, build_tree, find_node_by_id};

pub mod mutation;
pub use mutation::{
    AddPositionError, AddUnitError, DeleteImpact, DeleteOutcome, InvalidTargetReason, MergeError, MergeMode,
    MergeOutcome, MoveError, MoveOutcome,
};

pub mod integrity;
pub use integrity::{DanglingReference, Issue};
