//! The organization tree, built from the flat [`Repository`].
//!
//! The [`OrgUnitNode`] tree is a read-only projection. It is rebuilt from
//! scratch whenever the repository changes and is never edited in place.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    EntityId, Repository,
    position::Position,
    unit::{OrganizationalUnit, UnitType},
};

/// Errors that can occur when building the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// There is no active unit at level 1 to act as the root.
    #[error("no organization structure configured: no active level 1 unit")]
    NoRootUnit,
    /// A unit was reached twice on the same path from the root.
    #[error("organizational unit {0} is its own ancestor")]
    Cycle(EntityId),
}

/// A unit in the organization tree, with its children and positions
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgUnitNode {
    /// The unit's identifier.
    pub id: EntityId,
    /// The unit's code.
    pub code: String,
    /// The unit's name.
    pub name: String,
    /// The unit's structural type.
    pub unit_type: UnitType,
    /// The unit's stored level.
    pub level: u32,
    /// Name of the employee holding the unit's manager position.
    pub manager_name: Option<String>,
    /// The unit's cost center.
    pub cost_center: String,
    /// Filled positions in this unit and all units below it.
    pub employee_count: usize,
    /// Active child units, in storage order.
    pub children: Vec<OrgUnitNode>,
    /// Active positions directly in this unit, in storage order.
    pub positions: Vec<Position>,
}

impl OrgUnitNode {
    /// Depth-first search for the node with the given identifier, starting
    /// with this node.
    #[must_use]
    pub fn find(&self, id: EntityId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Iterates over this node and all nodes below it, depth first, parents
    /// before children.
    pub fn iter(&self) -> impl Iterator<Item = &Self> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of filled positions directly in this unit.
    #[must_use]
    pub fn filled_positions(&self) -> usize {
        self.positions.iter().filter(|p| p.is_filled()).count()
    }
}

/// Finds a node anywhere in the tree. See [`OrgUnitNode::find`].
#[must_use]
pub fn find_node_by_id(tree: &OrgUnitNode, id: EntityId) -> Option<&OrgUnitNode> {
    tree.find(id)
}

/// Builds the organization tree from the repository.
///
/// The root is the first active unit (in storage order) at level 1. Below
/// it, only active units and active positions are included. Each node's
/// `employee_count` is the number of its own filled positions plus the counts
/// of its children.
///
/// # Errors
///
/// Returns [`BuildError::NoRootUnit`] if there is no active level 1 unit, or
/// [`BuildError::Cycle`] if the parent links loop.
#[instrument(level = "debug", skip(repository), fields(units = repository.unit_count()))]
pub fn build_tree(repository: &Repository) -> Result<OrgUnitNode, BuildError> {
    let root = repository
        .units()
        .find(|unit| unit.level == 1 && unit.status.is_active())
        .ok_or(BuildError::NoRootUnit)?;

    let builder = Builder::new(repository);
    let mut path = HashSet::new();
    builder.node(root, &mut path)
}

/// Lookup tables for a single build.
struct Builder<'a> {
    repository: &'a Repository,
    children: HashMap<EntityId, Vec<&'a OrganizationalUnit>>,
    positions: HashMap<EntityId, Vec<&'a Position>>,
}

impl<'a> Builder<'a> {
    fn new(repository: &'a Repository) -> Self {
        let mut children: HashMap<_, Vec<_>> = HashMap::new();
        for unit in repository.units().filter(|u| u.status.is_active()) {
            if let Some(parent) = unit.parent_id {
                children.entry(parent).or_default().push(unit);
            }
        }

        let mut positions: HashMap<_, Vec<_>> = HashMap::new();
        for position in repository.positions().filter(|p| p.status.is_active()) {
            positions
                .entry(position.organizational_unit_id)
                .or_default()
                .push(position);
        }

        Self {
            repository,
            children,
            positions,
        }
    }

    fn node(
        &self,
        unit: &OrganizationalUnit,
        path: &mut HashSet<EntityId>,
    ) -> Result<OrgUnitNode, BuildError> {
        if !path.insert(unit.id) {
            return Err(BuildError::Cycle(unit.id));
        }

        let children = self
            .children
            .get(&unit.id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|child| self.node(child, path))
            .collect::<Result<Vec<_>, _>>()?;

        path.remove(&unit.id);

        let positions: Vec<Position> = self
            .positions
            .get(&unit.id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&position| position.clone())
            .collect();

        let employee_count = positions.iter().filter(|p| p.is_filled()).count()
            + children.iter().map(|c| c.employee_count).sum::<usize>();

        let manager_name = unit
            .manager_position_id
            .and_then(|position| self.repository.incumbent_name(position));

        Ok(OrgUnitNode {
            id: unit.id,
            code: unit.code.clone(),
            name: unit.name.clone(),
            unit_type: unit.unit_type,
            level: unit.level,
            manager_name,
            cost_center: unit.cost_center.clone(),
            employee_count,
            children,
            positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{repository::fixtures::*, unit::Status};

    #[test]
    fn example_organization_counts_the_filled_position() {
        let repo = example();
        let tree = build_tree(&repo).unwrap();

        assert_eq!(tree.id, id("O-001"));
        assert_eq!(tree.children.len(), 1);
        let division = &tree.children[0];
        assert_eq!(division.id, id("O-010"));
        assert_eq!(division.employee_count, 1);
        assert_eq!(tree.employee_count, 1);
        assert_eq!(division.children[0].positions[0].id, id("S-011"));
    }

    #[test]
    fn every_active_unit_and_position_appears_once() {
        let repo = deep();
        let tree = build_tree(&repo).unwrap();

        let mut unit_ids: Vec<_> = tree.iter().map(|node| node.id).collect();
        unit_ids.sort();
        let mut expected: Vec<_> = repo.units().map(|u| u.id).collect();
        expected.sort();
        assert_eq!(unit_ids, expected);

        for position in repo.positions() {
            let holders: Vec<_> = tree
                .iter()
                .filter(|node| node.positions.iter().any(|p| p.id == position.id))
                .map(|node| node.id)
                .collect();
            assert_eq!(holders, vec![position.organizational_unit_id]);
        }
    }

    #[test]
    fn employee_count_is_own_filled_plus_children() {
        let repo = deep();
        let tree = build_tree(&repo).unwrap();

        for node in tree.iter() {
            let children: usize = node.children.iter().map(|c| c.employee_count).sum();
            assert_eq!(node.employee_count, node.filled_positions() + children);
        }
        assert_eq!(tree.employee_count, 6);
        assert_eq!(tree.find(id("O-002")).unwrap().employee_count, 4);
        assert_eq!(tree.find(id("O-003")).unwrap().employee_count, 1);
    }

    #[test]
    fn building_twice_gives_equal_trees() {
        let repo = deep();
        assert_eq!(build_tree(&repo).unwrap(), build_tree(&repo).unwrap());
    }

    #[test]
    fn children_keep_storage_order() {
        let repo = deep();
        let tree = build_tree(&repo).unwrap();
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Engineering", "Sales"]);
    }

    #[test]
    fn inactive_units_and_positions_are_excluded() {
        let mut repo = deep();
        repo.units.get_mut(&id("O-004")).unwrap().status = Status::Inactive;
        repo.positions.get_mut(&id("S-007")).unwrap().status = Status::Inactive;

        let tree = build_tree(&repo).unwrap();

        // The inactive department takes its whole subtree with it.
        assert!(tree.find(id("O-004")).is_none());
        assert!(tree.find(id("O-006")).is_none());
        let product = tree.find(id("O-005")).unwrap();
        assert!(product.positions.is_empty());
        assert_eq!(tree.find(id("O-002")).unwrap().employee_count, 1);
    }

    #[test]
    fn manager_name_comes_from_the_manager_position_incumbent() {
        let mut repo = deep();
        repo.units.get_mut(&id("O-002")).unwrap().manager_position_id = Some(id("S-002"));
        repo.units.get_mut(&id("O-003")).unwrap().manager_position_id = Some(id("S-003"));

        let tree = build_tree(&repo).unwrap();

        assert_eq!(
            tree.find(id("O-002")).unwrap().manager_name.as_deref(),
            Some("Le Huy")
        );
        // Vacant manager position.
        assert_eq!(tree.find(id("O-003")).unwrap().manager_name, None);
    }

    #[test]
    fn missing_root_is_an_error() {
        let mut repo = deep();
        repo.units.get_mut(&id("O-001")).unwrap().status = Status::Inactive;
        assert_eq!(build_tree(&repo), Err(BuildError::NoRootUnit));
        assert_eq!(build_tree(&Repository::default()), Err(BuildError::NoRootUnit));
    }

    #[test]
    fn units_on_a_detached_cycle_are_left_out() {
        let mut repo = deep();
        repo.units.get_mut(&id("O-004")).unwrap().parent_id = Some(id("O-006"));

        let tree = build_tree(&repo).unwrap();

        assert!(tree.find(id("O-004")).is_none());
        assert!(tree.find(id("O-006")).is_none());
        assert!(tree.find(id("O-005")).is_some());
    }

    #[test]
    fn a_cycle_through_the_root_is_an_error() {
        let mut repo = deep();
        repo.units.get_mut(&id("O-001")).unwrap().parent_id = Some(id("O-008"));

        assert_eq!(build_tree(&repo), Err(BuildError::Cycle(id("O-001"))));
    }

    #[test]
    fn find_returns_none_for_unknown_ids() {
        let repo = deep();
        let tree = build_tree(&repo).unwrap();
        assert!(find_node_by_id(&tree, id("O-999")).is_none());
        assert_eq!(find_node_by_id(&tree, id("O-008")).unwrap().name, "Backups");
    }
}
