//! The organization chart service.
//!
//! [`OrgChart`] owns a [`Repository`] together with the tree built from it,
//! and keeps the two in step. Every mutation is applied to a staged copy of
//! the repository; the copy and its freshly built tree replace the current
//! state only once both steps succeed.

use std::path::Path;

use thiserror::Error;
use tracing::instrument;

use crate::{
    domain::{
        AddPositionError, AddUnitError, BuildError, Config, DeleteImpact, DeleteOutcome, EntityId,
        IdentifiersExhausted, MergeError, MergeOutcome, MoveError, MoveOutcome, NewEmployee,
        NewPosition, NewUnit, NotFound, OrgUnitNode, Repository, build_tree,
    },
    storage::dataset::{Dataset, LoadError},
};

/// Errors that can occur when changing the chart.
///
/// The chart is left unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// A referenced record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The unit could not be moved.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The units could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// The unit could not be added.
    #[error(transparent)]
    AddUnit(#[from] AddUnitError),
    /// The position could not be added.
    #[error(transparent)]
    AddPosition(#[from] AddPositionError),
    /// No identifier is left to assign.
    #[error(transparent)]
    Exhausted(#[from] IdentifiersExhausted),
    /// The change would leave the organization without a valid tree.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The change succeeded, but its result would not be visible in the tree.
    #[error("unit {0} would not be reachable from the root")]
    Unreachable(EntityId),
}

/// Errors that can occur when opening a chart.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The dataset does not form a valid tree.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// A repository paired with its current organization tree.
#[derive(Debug, Clone)]
pub struct OrgChart {
    repository: Repository,
    tree: OrgUnitNode,
}

impl OrgChart {
    /// Builds the tree for a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository does not form a tree.
    pub fn new(repository: Repository) -> Result<Self, BuildError> {
        let tree = build_tree(&repository)?;
        warn_dangling(&repository);
        Ok(Self { repository, tree })
    }

    /// Loads a dataset file and builds its tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be loaded or does not form a
    /// tree.
    #[instrument(skip(config))]
    pub fn load(path: &Path, config: Config) -> Result<Self, OpenError> {
        let repository = Dataset::load(path)?.into_repository(config)?;
        Ok(Self::new(repository)?)
    }

    /// The current organization tree.
    #[must_use]
    pub const fn tree(&self) -> &OrgUnitNode {
        &self.tree
    }

    /// The current records.
    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Finds a unit's node in the current tree.
    #[must_use]
    pub fn find_node(&self, id: EntityId) -> Option<&OrgUnitNode> {
        self.tree.find(id)
    }

    /// Reports what a cascade delete of `unit_id` would remove, without
    /// removing anything.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the unit does not exist.
    pub fn preview_delete_impact(&self, unit_id: EntityId) -> Result<DeleteImpact, NotFound> {
        self.repository.preview_delete_impact(unit_id)
    }

    /// See [`Repository::move_unit`].
    ///
    /// On success the new parent is present in the new tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the move is rejected, would break the tree, or
    /// would place the unit outside the tree.
    pub fn move_unit(
        &mut self,
        unit_id: EntityId,
        new_parent_id: EntityId,
        new_level: u32,
    ) -> Result<MoveOutcome, ChartError> {
        self.commit_with(
            |repo| repo.move_unit(unit_id, new_parent_id, new_level),
            |tree, _| reachable(tree, new_parent_id),
        )
    }

    /// See [`Repository::move_position`].
    ///
    /// # Errors
    ///
    /// Returns an error if either record does not exist, or if the unit is
    /// not in the tree.
    pub fn move_position(
        &mut self,
        position_id: EntityId,
        new_unit_id: EntityId,
    ) -> Result<EntityId, ChartError> {
        self.commit_with(
            |repo| repo.move_position(position_id, new_unit_id),
            |tree, _| reachable(tree, new_unit_id),
        )
    }

    /// See [`Repository::merge_units`].
    ///
    /// On success the merge target is present in the new tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge is rejected, or if the target would not
    /// be reachable from the root afterwards.
    pub fn merge_units(
        &mut self,
        source_id: EntityId,
        target_id: EntityId,
    ) -> Result<MergeOutcome, ChartError> {
        self.commit_with(
            |repo| repo.merge_units(source_id, target_id),
            |tree, outcome| reachable(tree, outcome.target),
        )
    }

    /// See [`Repository::merge_position`].
    ///
    /// # Errors
    ///
    /// Returns an error if either record does not exist, or if the unit is
    /// not in the tree.
    pub fn merge_position(
        &mut self,
        position_id: EntityId,
        target_unit_id: EntityId,
    ) -> Result<EntityId, ChartError> {
        self.commit_with(
            |repo| repo.merge_position(position_id, target_unit_id),
            |tree, _| reachable(tree, target_unit_id),
        )
    }

    /// See [`Repository::delete_unit_cascade`].
    ///
    /// # Errors
    ///
    /// Returns an error if the unit does not exist, or if it is the root.
    pub fn delete_unit_cascade(&mut self, unit_id: EntityId) -> Result<DeleteOutcome, ChartError> {
        self.commit(|repo| repo.delete_unit_cascade(unit_id))
    }

    /// See [`Repository::delete_position`].
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist.
    pub fn delete_position(&mut self, position_id: EntityId) -> Result<DeleteOutcome, ChartError> {
        self.commit(|repo| repo.delete_position(position_id))
    }

    /// See [`Repository::add_unit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the unit is rejected or would not be in the tree.
    pub fn add_unit(&mut self, unit: NewUnit) -> Result<EntityId, ChartError> {
        self.commit_with(|repo| repo.add_unit(unit), |tree, &id| reachable(tree, id))
    }

    /// See [`Repository::add_position`].
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced record does not exist, or if no
    /// identifier is left.
    pub fn add_position(&mut self, position: NewPosition) -> Result<EntityId, ChartError> {
        self.commit(|repo| repo.add_position(position))
    }

    /// See [`Repository::add_employee`].
    ///
    /// # Errors
    ///
    /// Returns an error if no employee identifier is left.
    pub fn add_employee(&mut self, employee: NewEmployee) -> Result<EntityId, ChartError> {
        self.commit(|repo| repo.add_employee(employee))
    }

    /// See [`Repository::assign_incumbent`].
    ///
    /// # Errors
    ///
    /// Returns an error if either record does not exist.
    pub fn assign_incumbent(
        &mut self,
        position_id: EntityId,
        employee_id: EntityId,
    ) -> Result<Option<EntityId>, ChartError> {
        self.commit(|repo| repo.assign_incumbent(position_id, employee_id))
    }

    /// See [`Repository::vacate_position`].
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist.
    pub fn vacate_position(&mut self, position_id: EntityId) -> Result<Option<EntityId>, ChartError> {
        self.commit(|repo| repo.vacate_position(position_id))
    }

    fn commit<T, E>(
        &mut self,
        apply: impl FnOnce(&mut Repository) -> Result<T, E>,
    ) -> Result<T, ChartError>
    where
        ChartError: From<E>,
    {
        self.commit_with(apply, |_, _| Ok(()))
    }

    #[instrument(level = "trace", skip_all)]
    fn commit_with<T, E>(
        &mut self,
        apply: impl FnOnce(&mut Repository) -> Result<T, E>,
        check: impl FnOnce(&OrgUnitNode, &T) -> Result<(), ChartError>,
    ) -> Result<T, ChartError>
    where
        ChartError: From<E>,
    {
        let mut staged = self.repository.clone();
        let value = apply(&mut staged)?;
        let tree = build_tree(&staged)?;
        check(&tree, &value)?;

        warn_dangling(&staged);
        self.repository = staged;
        self.tree = tree;
        Ok(value)
    }
}

fn reachable(tree: &OrgUnitNode, unit_id: EntityId) -> Result<(), ChartError> {
    tree.find(unit_id)
        .map(|_| ())
        .ok_or(ChartError::Unreachable(unit_id))
}

fn warn_dangling(repository: &Repository) {
    for reference in repository.check_references() {
        tracing::warn!("dangling reference: {reference}");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        domain::{IncumbentPolicy, Status, UnitType},
        storage::dataset::fixtures::{ACME, acme, acme_with, id},
    };

    fn chart() -> OrgChart {
        OrgChart::new(acme()).unwrap()
    }

    #[test]
    fn opening_builds_the_tree() {
        let chart = chart();
        let tree = chart.tree();

        assert_eq!(tree.name, "Acme Corp");
        assert_eq!(tree.manager_name.as_deref(), Some("Pham Mai"));
        assert_eq!(tree.employee_count, 6);
        assert_eq!(chart.find_node(id("O-002")).unwrap().employee_count, 4);
        assert_eq!(chart.find_node(id("O-003")).unwrap().employee_count, 1);
        // Finance is inactive.
        assert!(chart.find_node(id("O-008")).is_none());
    }

    #[test]
    fn load_reads_a_dataset_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ACME.as_bytes()).unwrap();

        let chart = OrgChart::load(file.path(), Config::default()).unwrap();
        assert_eq!(chart.tree().id, id("O-001"));

        let mut empty = tempfile::NamedTempFile::new().unwrap();
        empty.write_all(b"units: []\n").unwrap();
        assert!(matches!(
            OrgChart::load(empty.path(), Config::default()),
            Err(OpenError::Build(BuildError::NoRootUnit))
        ));
    }

    #[test]
    fn mutations_rebuild_the_tree() {
        let mut chart = chart();

        // Infrastructure moves from Platform to Operations.
        chart.move_unit(id("O-007"), id("O-003"), 3).unwrap();

        assert_eq!(chart.find_node(id("O-003")).unwrap().employee_count, 2);
        assert_eq!(chart.find_node(id("O-004")).unwrap().employee_count, 1);
        assert_eq!(chart.tree().employee_count, 6);
        assert_eq!(chart.tree(), &build_tree(chart.repository()).unwrap());
    }

    #[test]
    fn rejected_mutations_leave_the_chart_unchanged() {
        let mut chart = chart();
        let before = chart.clone();

        assert!(matches!(
            chart.move_unit(id("O-002"), id("O-007"), 5),
            Err(ChartError::Move(MoveError::Cyclic { .. }))
        ));
        assert!(matches!(
            chart.merge_units(id("O-003"), id("O-004")),
            Err(ChartError::Merge(MergeError::InvalidTarget { .. }))
        ));
        assert!(matches!(
            chart.delete_position(id("S-099")),
            Err(ChartError::NotFound(_))
        ));

        assert_eq!(chart.repository(), before.repository());
        assert_eq!(chart.tree(), before.tree());
    }

    #[test]
    fn deleting_the_root_is_refused() {
        let mut chart = chart();
        let before = chart.repository().clone();

        assert_eq!(
            chart.delete_unit_cascade(id("O-001")),
            Err(ChartError::Build(BuildError::NoRootUnit))
        );
        assert_eq!(chart.repository(), &before);
    }

    #[test]
    fn delete_matches_its_preview() {
        let mut chart = chart();

        let impact = chart.preview_delete_impact(id("O-002")).unwrap();
        let outcome = chart.delete_unit_cascade(id("O-002")).unwrap();

        assert_eq!(outcome.impact(), impact);
        assert_eq!(impact.descendant_count, 3);
        assert_eq!(impact.position_count, 5);
        assert_eq!(chart.tree().employee_count, 2);
        assert_eq!(
            outcome.vacated_employees,
            vec![id("P-002"), id("P-003"), id("P-004"), id("P-005")]
        );
    }

    #[test]
    fn retained_incumbents_stay_dangling() {
        let mut chart =
            OrgChart::new(acme_with(Config::default().with_incumbent_policy(IncumbentPolicy::Retain)))
                .unwrap();

        let outcome = chart.delete_unit_cascade(id("O-006")).unwrap();

        assert_eq!(outcome.dangling_employees, vec![id("P-006")]);
        assert!(!chart.repository().check_references().is_empty());
    }

    #[test]
    fn merge_target_is_always_in_the_new_tree() {
        let mut chart = chart();

        let outcome = chart.merge_units(id("O-005"), id("O-004")).unwrap();

        let target = chart.find_node(outcome.target).unwrap();
        assert_eq!(target.name, "Platform");
        assert_eq!(target.employee_count, 3);
        assert_eq!(target.positions.len(), 3);
    }

    #[test]
    fn merging_under_an_inactive_branch_is_refused() {
        let mut repo = acme();
        // Finance is active but sits under an inactive division.
        repo.units.get_mut(&id("O-008")).unwrap().status = Status::Active;
        repo.units.get_mut(&id("O-003")).unwrap().status = Status::Inactive;
        let mut chart = OrgChart::new(repo).unwrap();
        let before = chart.repository().clone();

        assert_eq!(
            chart.merge_units(id("O-007"), id("O-008")),
            Err(ChartError::Unreachable(id("O-008")))
        );
        assert_eq!(chart.repository(), &before);
    }

    #[test]
    fn moving_into_an_inactive_branch_is_refused() {
        let mut repo = acme();
        repo.units.get_mut(&id("O-003")).unwrap().status = Status::Inactive;
        let mut chart = OrgChart::new(repo).unwrap();
        let before = chart.clone();

        assert_eq!(
            chart.move_unit(id("O-005"), id("O-003"), 3),
            Err(ChartError::Move(MoveError::InactiveTarget(id("O-003"))))
        );
        assert_eq!(
            chart.move_position(id("S-005"), id("O-003")),
            Err(ChartError::Move(MoveError::InactiveTarget(id("O-003"))))
        );

        // Operations is active but sits under the inactive division.
        assert_eq!(
            chart.move_unit(id("O-005"), id("O-006"), 4),
            Err(ChartError::Unreachable(id("O-006")))
        );
        assert_eq!(
            chart.move_position(id("S-005"), id("O-006")),
            Err(ChartError::Unreachable(id("O-006")))
        );

        assert_eq!(chart.repository(), before.repository());
        assert_eq!(chart.tree(), before.tree());
    }

    #[test]
    fn adding_under_an_inactive_branch_is_refused() {
        let mut repo = acme();
        repo.units.get_mut(&id("O-003")).unwrap().status = Status::Inactive;
        let mut chart = OrgChart::new(repo).unwrap();
        let before = chart.repository().clone();
        let division = before.unit(id("O-003")).unwrap().clone();
        let department = before.unit(id("O-006")).unwrap().clone();

        let date = division.valid_from;

        assert_eq!(
            chart.add_unit(NewUnit::under(&division, UnitType::Department, "X", "X", date)),
            Err(ChartError::AddUnit(AddUnitError::InactiveParent(id("O-003"))))
        );
        assert_eq!(
            chart.add_unit(NewUnit::under(&department, UnitType::Team, "Y", "Y", date)),
            Err(ChartError::Unreachable(id("O-009")))
        );
        assert_eq!(chart.repository(), &before);
    }

    #[test]
    fn added_units_appear_in_the_tree() {
        let mut chart = chart();
        let parent = chart.repository().unit(id("O-006")).unwrap().clone();
        let valid_from = parent.valid_from;

        let new_id = chart
            .add_unit(NewUnit::under(&parent, UnitType::Team, "OPS-LOG-WH", "Warehouse", valid_from))
            .unwrap();

        assert_eq!(new_id, id("O-009"));
        let node = chart.find_node(new_id).unwrap();
        assert_eq!(node.level, 4);
        assert_eq!(node.cost_center, "CC-3100");
    }

    #[test]
    fn staffing_changes_update_counts() {
        let mut chart = chart();

        chart.assign_incumbent(id("S-008"), id("P-007")).unwrap();
        assert_eq!(chart.find_node(id("O-005")).unwrap().employee_count, 2);

        chart.vacate_position(id("S-001")).unwrap();
        assert_eq!(chart.tree().manager_name, None);
        assert_eq!(chart.tree().employee_count, 6);

        let hire = chart
            .add_employee(NewEmployee {
                code: "E008".to_string(),
                first_name: "Hoa".to_string(),
                last_name: "Dang".to_string(),
                email: String::new(),
                hire_date: None,
            })
            .unwrap();
        assert_eq!(hire, id("P-008"));
        assert_eq!(chart.tree().employee_count, 6);

        chart.assign_incumbent(id("S-003"), hire).unwrap();
        assert_eq!(chart.find_node(id("O-003")).unwrap().employee_count, 2);
        assert_eq!(chart.tree().employee_count, 7);
    }
}
