//! Traversals over the two parent-pointer hierarchies.
//!
//! The *unit tree* is formed by `OrganizationalUnit::parent_id` and describes
//! structural placement. The *reporting tree* is formed by
//! `Position::reports_to_id` and describes who manages whom. They overlap in
//! the records they touch but are otherwise independent, so each has its own
//! set of functions here.

use std::collections::{HashSet, VecDeque};

use crate::domain::{
    EntityId, Repository,
    employee::Employee,
    position::Position,
    repository::NotFound,
    unit::OrganizationalUnit,
};

/// Separator used when rendering a chain as a breadcrumb.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

impl Repository {
    /// Returns the chain of units from `unit_id` up to the root, inclusive of
    /// both ends.
    ///
    /// Returns an empty chain if `unit_id` does not resolve. If a `parent_id`
    /// along the way does not resolve, the chain silently stops at the last
    /// unit that did; the same happens if the parent pointers loop back on
    /// themselves. Callers that need to detect either situation should check
    /// whether the last unit in the chain is a root.
    #[must_use]
    pub fn hierarchy_chain(&self, unit_id: EntityId) -> Vec<&OrganizationalUnit> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(unit_id);

        while let Some(id) = next {
            let Some(unit) = self.unit(id) else {
                if !chain.is_empty() {
                    tracing::debug!(%unit_id, missing = %id, "hierarchy chain truncated");
                }
                break;
            };
            if !seen.insert(id) {
                tracing::warn!(%unit_id, repeated = %id, "cyclic parent chain truncated");
                break;
            }
            chain.push(unit);
            next = unit.parent_id;
        }

        chain
    }

    /// The direct parent of a unit, if it has one and it resolves.
    #[must_use]
    pub fn parent_unit(&self, unit_id: EntityId) -> Option<&OrganizationalUnit> {
        self.unit(unit_id)
            .and_then(|unit| unit.parent_id)
            .and_then(|parent| self.unit(parent))
    }

    /// The direct children of a unit, in storage order. Includes inactive
    /// children.
    pub fn child_units(
        &self,
        unit_id: EntityId,
    ) -> impl Iterator<Item = &OrganizationalUnit> + '_ {
        self.units
            .values()
            .filter(move |unit| unit.parent_id == Some(unit_id))
    }

    /// Collects every descendant of a unit (children, grandchildren, ...),
    /// breadth first, excluding the unit itself.
    ///
    /// This is the closure used by both the cascade delete and its impact
    /// preview. Units are visited at most once, so malformed cyclic data
    /// cannot make this loop.
    #[must_use]
    pub fn collect_descendants(&self, unit_id: EntityId) -> Vec<EntityId> {
        let mut visited = HashSet::from([unit_id]);
        let mut descendants = Vec::new();
        let mut queue = VecDeque::from([unit_id]);

        while let Some(next) = queue.pop_front() {
            for child in self.child_units(next) {
                if visited.insert(child.id) {
                    descendants.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }

        descendants
    }

    /// Whether `candidate` lies strictly below `ancestor` in the unit tree.
    #[must_use]
    pub fn is_descendant(&self, ancestor: EntityId, candidate: EntityId) -> bool {
        self.hierarchy_chain(candidate)
            .iter()
            .skip(1)
            .any(|unit| unit.id == ancestor)
    }

    /// Whether the unit and every unit above it is active, up to a root.
    ///
    /// Units failing this are left out of the built tree.
    #[must_use]
    pub fn is_in_active_tree(&self, unit_id: EntityId) -> bool {
        let chain = self.hierarchy_chain(unit_id);
        chain.last().is_some_and(|top| top.is_root())
            && chain.iter().all(|unit| unit.status.is_active())
    }

    /// Returns the reporting chain from a position up through its managers,
    /// bottom-up and inclusive of `position_id`.
    ///
    /// Truncation follows the same rules as [`Repository::hierarchy_chain`].
    #[must_use]
    pub fn reporting_chain(&self, position_id: EntityId) -> Vec<&Position> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(position_id);

        while let Some(id) = next {
            let Some(position) = self.position(id) else {
                break;
            };
            if !seen.insert(id) {
                tracing::warn!(%position_id, repeated = %id, "cyclic reporting chain truncated");
                break;
            }
            chain.push(position);
            next = position.reports_to_id;
        }

        chain
    }

    /// Positions reporting directly to `position_id`, in storage order.
    pub fn direct_reports(&self, position_id: EntityId) -> impl Iterator<Item = &Position> + '_ {
        self.positions
            .values()
            .filter(move |position| position.reports_to_id == Some(position_id))
    }

    /// The unit an employee works in, derived from their position.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the employee does not exist. An employee
    /// without a (resolvable) position has no unit.
    pub fn employee_unit(&self, employee_id: EntityId) -> Result<Option<&OrganizationalUnit>, NotFound> {
        let employee = self.require_employee(employee_id)?;
        Ok(employee
            .position_id
            .and_then(|position| self.position(position))
            .and_then(|position| self.unit(position.organizational_unit_id)))
    }

    /// The line manager of an employee: the incumbent of the position their
    /// own position reports to.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the employee does not exist. Vacant manager
    /// positions and unresolved references yield `None`.
    pub fn line_manager(&self, employee_id: EntityId) -> Result<Option<&Employee>, NotFound> {
        let employee = self.require_employee(employee_id)?;
        Ok(employee
            .position_id
            .and_then(|position| self.position(position))
            .and_then(|position| position.reports_to_id)
            .and_then(|manager| self.position(manager))
            .and_then(|manager| manager.incumbent_id)
            .and_then(|incumbent| self.employee(incumbent)))
    }
}

/// Renders a bottom-up chain top-down, names joined by `" > "`.
#[must_use]
pub fn format_hierarchy_display(chain: &[&OrganizationalUnit]) -> String {
    chain
        .iter()
        .rev()
        .map(|unit| unit.name.as_str())
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEPARATOR)
}

/// Renders only the last two levels of a bottom-up chain, top-down: the unit
/// and its parent.
#[must_use]
pub fn format_hierarchy_compact(chain: &[&OrganizationalUnit]) -> String {
    let top_down: Vec<_> = chain.iter().rev().map(|unit| unit.name.as_str()).collect();
    let start = top_down.len().saturating_sub(2);
    top_down[start..].join(BREADCRUMB_SEPARATOR)
}
