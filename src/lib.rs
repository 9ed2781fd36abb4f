//! Organization chart engine.
//!
//! Organizational units, positions, job classifications and employees are
//! held in a flat [`Repository`]. From it the engine builds the unit tree,
//! walks hierarchy and reporting chains, and applies structural edits: move,
//! merge, cascade delete and add.
//!
//! ```
//! use orgchart::EntityId;
//!
//! let id: EntityId = "O-001".parse().unwrap();
//! assert_eq!(id.to_string(), "O-001");
//! ```

pub mod domain;
pub use domain::{
    Config, EntityId, EntityKind, OrgUnitNode, Repository, build_tree, find_node_by_id,
};

/// Dataset loading and the organization chart service.
pub mod storage;
pub use storage::{Dataset, OrgChart};
