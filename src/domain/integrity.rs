//! Consistency checks over the repository.
//!
//! None of these checks fail an operation. They report records that point at
//! something that is not there, parent links that loop, and stored levels
//! that disagree with the tree.

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{EntityId, Repository};

/// A reference from one record to another that does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DanglingReference {
    /// A position belongs to a unit that does not exist.
    #[error("position {position} belongs to missing unit {unit}")]
    PositionUnit {
        /// The position.
        position: EntityId,
        /// The missing unit.
        unit: EntityId,
    },
    /// A position's incumbent does not exist.
    #[error("position {position} is held by missing employee {employee}")]
    PositionIncumbent {
        /// The position.
        position: EntityId,
        /// The missing employee.
        employee: EntityId,
    },
    /// A position's incumbent holds a different position, or none.
    #[error("position {position} is held by {employee}, who does not hold it")]
    IncumbentMismatch {
        /// The position.
        position: EntityId,
        /// The employee named as incumbent.
        employee: EntityId,
    },
    /// An employee holds a position that does not exist.
    #[error("employee {employee} holds missing position {position}")]
    EmployeePosition {
        /// The employee.
        employee: EntityId,
        /// The missing position.
        position: EntityId,
    },
    /// A unit's parent does not exist.
    #[error("unit {unit} has missing parent {parent}")]
    UnitParent {
        /// The unit.
        unit: EntityId,
        /// The missing parent.
        parent: EntityId,
    },
    /// A unit's manager position does not exist.
    #[error("unit {unit} is managed by missing position {position}")]
    UnitManager {
        /// The unit.
        unit: EntityId,
        /// The missing position.
        position: EntityId,
    },
    /// A position reports to a position that does not exist.
    #[error("position {position} reports to missing position {manager}")]
    PositionReportsTo {
        /// The position.
        position: EntityId,
        /// The missing manager position.
        manager: EntityId,
    },
}

/// A problem found by [`Repository::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "issue", content = "detail", rename_all = "snake_case")]
pub enum Issue {
    /// A reference does not resolve.
    #[error(transparent)]
    Dangling(#[from] DanglingReference),
    /// These units are each other's ancestors.
    #[error("units form a cycle: {}", join(.0))]
    UnitCycle(Vec<EntityId>),
    /// These positions report to each other.
    #[error("positions form a reporting cycle: {}", join(.0))]
    ReportingCycle(Vec<EntityId>),
    /// A unit's stored level does not sit directly below its parent.
    #[error("unit {unit} is at level {level} but should be at level {expected}")]
    LevelMismatch {
        /// The unit.
        unit: EntityId,
        /// Its stored level.
        level: u32,
        /// The level implied by its parent.
        expected: u32,
    },
    /// No active unit can serve as the root.
    #[error("no active root unit")]
    NoRoot,
    /// More than one active unit is a root.
    #[error("several active root units: {}", join(.0))]
    MultipleRoots(Vec<EntityId>),
}

fn join(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Repository {
    /// Finds every reference between records that does not hold, in
    /// storage order: units first, then positions, then employees.
    #[must_use]
    pub fn check_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for unit in self.units() {
            if let Some(parent) = unit.parent_id.filter(|&p| self.unit(p).is_none()) {
                dangling.push(DanglingReference::UnitParent {
                    unit: unit.id,
                    parent,
                });
            }
            if let Some(position) = unit
                .manager_position_id
                .filter(|&p| self.position(p).is_none())
            {
                dangling.push(DanglingReference::UnitManager {
                    unit: unit.id,
                    position,
                });
            }
        }

        for position in self.positions() {
            if self.unit(position.organizational_unit_id).is_none() {
                dangling.push(DanglingReference::PositionUnit {
                    position: position.id,
                    unit: position.organizational_unit_id,
                });
            }
            if let Some(manager) = position.reports_to_id.filter(|&p| self.position(p).is_none()) {
                dangling.push(DanglingReference::PositionReportsTo {
                    position: position.id,
                    manager,
                });
            }
            if let Some(employee) = position.incumbent_id {
                match self.employee(employee) {
                    None => dangling.push(DanglingReference::PositionIncumbent {
                        position: position.id,
                        employee,
                    }),
                    Some(holder) if holder.position_id != Some(position.id) => {
                        dangling.push(DanglingReference::IncumbentMismatch {
                            position: position.id,
                            employee,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for employee in self.employees() {
            if let Some(position) = employee.position_id.filter(|&p| self.position(p).is_none()) {
                dangling.push(DanglingReference::EmployeePosition {
                    employee: employee.id,
                    position,
                });
            }
        }

        dangling
    }

    /// Runs every consistency check and returns the problems found.
    ///
    /// An empty result means the tree can be built and every reference
    /// resolves.
    #[must_use]
    pub fn validate(&self) -> Vec<Issue> {
        let mut issues: Vec<Issue> = self
            .check_references()
            .into_iter()
            .map(Issue::from)
            .collect();

        let unit_links = self
            .units()
            .filter_map(|unit| Some((unit.id, unit.parent_id?)));
        let unit_cycles = cycles(unit_links);

        let reporting_links = self
            .positions()
            .filter_map(|position| Some((position.id, position.reports_to_id?)));
        issues.extend(cycles(reporting_links).into_iter().map(Issue::ReportingCycle));

        let roots: Vec<_> = self
            .units()
            .filter(|unit| unit.is_root() && unit.status.is_active())
            .map(|unit| unit.id)
            .collect();
        match roots.len() {
            0 => issues.push(Issue::NoRoot),
            1 => {}
            _ => issues.push(Issue::MultipleRoots(roots)),
        }

        for unit in self.units() {
            if unit_cycles.iter().any(|cycle| cycle.contains(&unit.id)) {
                continue;
            }
            let expected = match unit.parent_id {
                None => 1,
                Some(parent) => match self.unit(parent) {
                    Some(parent) => parent.level + 1,
                    None => continue,
                },
            };
            if unit.level != expected {
                issues.push(Issue::LevelMismatch {
                    unit: unit.id,
                    level: unit.level,
                    expected,
                });
            }
        }

        issues.extend(unit_cycles.into_iter().map(Issue::UnitCycle));
        issues
    }
}

/// Groups of nodes that reach themselves by following child → parent edges,
/// each sorted, in sorted order.
fn cycles(links: impl Iterator<Item = (EntityId, EntityId)>) -> Vec<Vec<EntityId>> {
    let graph: DiGraphMap<EntityId, ()> = links.map(|(child, parent)| (child, parent, ())).collect();

    let mut cycles: Vec<Vec<EntityId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|&n| graph.contains_edge(n, n))
        })
        .map(|mut component| {
            component.sort();
            component
        })
        .collect();

    cycles.sort();
    cycles
}
