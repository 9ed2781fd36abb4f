//! Structural edits to the organization: move, merge, cascade delete and
//! add.
//!
//! Every operation validates its inputs before touching the repository, so a
//! rejected operation leaves the repository exactly as it was.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    EntityId, EntityKind, Repository,
    config::{IncumbentPolicy, LevelPolicy},
    employee::NewEmployee,
    position::{HiringStatus, NewPosition},
    repository::{IdentifiersExhausted, NotFound},
    unit::{NewUnit, OrganizationalUnit, UnitType},
};

/// Errors that can occur when moving a unit or position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// A referenced record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The new parent is the unit itself or one of its descendants.
    #[error("cannot move {unit} under {parent}: {parent} is {unit} or one of its descendants")]
    Cyclic {
        /// The unit being moved.
        unit: EntityId,
        /// The requested parent.
        parent: EntityId,
    },
    /// The requested level does not sit directly below the new parent.
    #[error("cannot move {unit} to level {level}: its new parent is at level {parent_level}")]
    InvalidLevel {
        /// The unit being moved.
        unit: EntityId,
        /// The requested level.
        level: u32,
        /// The level of the new parent.
        parent_level: u32,
    },
    /// The destination unit is inactive and would not appear in the tree.
    #[error("cannot move into {0}: the unit is inactive")]
    InactiveTarget(EntityId),
}

/// Errors that can occur when merging units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A referenced record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The target is the source itself or one of its descendants.
    #[error("cannot merge {unit} into {target}: {target} is {unit} or one of its descendants")]
    Cyclic {
        /// The unit being merged away.
        unit: EntityId,
        /// The unit being merged into.
        target: EntityId,
    },
    /// The target is not an allowed destination for the source.
    #[error("cannot merge {unit} into {target}: {reason}")]
    InvalidTarget {
        /// The unit being merged away.
        unit: EntityId,
        /// The unit being merged into.
        target: EntityId,
        /// Why the target is not allowed.
        reason: InvalidTargetReason,
    },
}

/// Why a merge target was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTargetReason {
    /// The type hierarchy forbids merging these types.
    #[error("a {unit_type} cannot be merged into a {target_type}")]
    TypeRule {
        /// Type of the unit being merged away.
        unit_type: UnitType,
        /// Type of the target unit.
        target_type: UnitType,
    },
    /// The target is inactive and would not appear in the tree.
    #[error("the target is inactive")]
    Inactive,
}

/// Errors that can occur when adding a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddUnitError {
    /// The parent or manager position does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The level is not directly below the parent's.
    #[error("a unit under a level {parent_level} parent must be at level {expected}, not {level}")]
    InvalidLevel {
        /// The requested level.
        level: u32,
        /// The level the unit must have.
        expected: u32,
        /// The parent's level.
        parent_level: u32,
    },
    /// Only companies may be created without a parent.
    #[error("a {0} must have a parent unit")]
    MissingParent(UnitType),
    /// Companies are roots and cannot have a parent.
    #[error("a company cannot be placed under another unit")]
    CompanyWithParent,
    /// An active root already exists.
    #[error("the organization already has a root unit ({0})")]
    DuplicateRoot(EntityId),
    /// The parent is inactive, so the new unit would not appear in the tree.
    #[error("cannot add a unit under {0}: the unit is inactive")]
    InactiveParent(EntityId),
    /// No unit identifier is left to assign.
    #[error(transparent)]
    Exhausted(#[from] IdentifiersExhausted),
}

/// Errors that can occur when adding a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddPositionError {
    /// The unit, classification or manager position does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// No position identifier is left to assign.
    #[error(transparent)]
    Exhausted(#[from] IdentifiersExhausted),
}

/// The result of moving a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    /// The unit's parent before the move.
    pub previous_parent: Option<EntityId>,
    /// Descendants whose level was changed to match their new depth.
    pub renumbered: Vec<EntityId>,
}

/// Which of the two merge behaviours was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Same-level merge: the source's contents moved to the target and the
    /// source was deleted.
    Consolidate,
    /// Cross-level merge: the source, with its subtree, now sits under the
    /// target.
    Nest,
}

/// The result of merging two units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// The behaviour applied.
    pub mode: MergeMode,
    /// The unit the caller should navigate to.
    pub target: EntityId,
    /// Units that now have the target as their parent.
    pub relocated_units: Vec<EntityId>,
    /// Positions that now belong to the target.
    pub relocated_positions: Vec<EntityId>,
    /// Descendants whose level was changed to match their new depth.
    pub renumbered: Vec<EntityId>,
}

/// What a cascade delete of a unit would remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteImpact {
    /// Units below the deleted unit.
    pub descendant_count: usize,
    /// Positions in the deleted unit and all units below it.
    pub position_count: usize,
}

/// The records removed or updated by a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Units removed, the deleted unit first.
    pub removed_units: Vec<EntityId>,
    /// Positions removed.
    pub removed_positions: Vec<EntityId>,
    /// Employees whose position was removed and whose assignment was cleared.
    pub vacated_employees: Vec<EntityId>,
    /// Employees whose position was removed but who still reference it.
    pub dangling_employees: Vec<EntityId>,
}

impl DeleteOutcome {
    /// The counts in the form [`Repository::preview_delete_impact`] reports.
    #[must_use]
    pub fn impact(&self) -> DeleteImpact {
        DeleteImpact {
            descendant_count: self.removed_units.len().saturating_sub(1),
            position_count: self.removed_positions.len(),
        }
    }
}

impl Repository {
    /// Moves a unit under a new parent at the given level.
    ///
    /// Descendant levels follow the configured [`LevelPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotFound`] if either unit is missing,
    /// [`MoveError::Cyclic`] if `new_parent_id` is the unit or lies below it,
    /// [`MoveError::InactiveTarget`] if the new parent is inactive,
    /// and [`MoveError::InvalidLevel`] if levels are enforced and `new_level`
    /// is not one below the new parent.
    #[instrument(skip(self))]
    pub fn move_unit(
        &mut self,
        unit_id: EntityId,
        new_parent_id: EntityId,
        new_level: u32,
    ) -> Result<MoveOutcome, MoveError> {
        let unit = self.require_unit(unit_id)?;
        let parent = self.require_unit(new_parent_id)?;

        if unit_id == new_parent_id || self.is_descendant(unit_id, new_parent_id) {
            return Err(MoveError::Cyclic {
                unit: unit_id,
                parent: new_parent_id,
            });
        }

        if !parent.status.is_active() {
            return Err(MoveError::InactiveTarget(new_parent_id));
        }

        if self.config().enforce_levels && new_level != parent.level + 1 {
            return Err(MoveError::InvalidLevel {
                unit: unit_id,
                level: new_level,
                parent_level: parent.level,
            });
        }

        let previous_parent = unit.parent_id;
        self.reparent(unit_id, new_parent_id, new_level);
        let renumbered = self.apply_level_policy(unit_id);

        tracing::debug!(
            %unit_id,
            %new_parent_id,
            new_level,
            renumbered = renumbered.len(),
            "moved unit"
        );

        Ok(MoveOutcome {
            previous_parent,
            renumbered,
        })
    }

    /// Moves a position to another unit. Returns the unit it was in before.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotFound`] if the position or unit does not
    /// exist, and [`MoveError::InactiveTarget`] if the unit is inactive.
    #[instrument(skip(self))]
    pub fn move_position(
        &mut self,
        position_id: EntityId,
        new_unit_id: EntityId,
    ) -> Result<EntityId, MoveError> {
        self.require_position(position_id)?;
        if !self.require_unit(new_unit_id)?.status.is_active() {
            return Err(MoveError::InactiveTarget(new_unit_id));
        }

        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(NotFound::new(position_id))?;
        let previous = std::mem::replace(&mut position.organizational_unit_id, new_unit_id);

        tracing::debug!(%position_id, from = %previous, to = %new_unit_id, "moved position");
        Ok(previous)
    }

    /// Checks whether `source_id` may be merged into `target_id`, without
    /// changing anything.
    ///
    /// # Errors
    ///
    /// Returns the error [`Repository::merge_units`] would return.
    pub fn validate_merge(&self, source_id: EntityId, target_id: EntityId) -> Result<(), MergeError> {
        let source = self.require_unit(source_id)?;
        let target = self.require_unit(target_id)?;

        if source_id == target_id || self.is_descendant(source_id, target_id) {
            return Err(MergeError::Cyclic {
                unit: source_id,
                target: target_id,
            });
        }

        if !source.unit_type.can_merge_into(target.unit_type) {
            return Err(MergeError::InvalidTarget {
                unit: source_id,
                target: target_id,
                reason: InvalidTargetReason::TypeRule {
                    unit_type: source.unit_type,
                    target_type: target.unit_type,
                },
            });
        }

        if !target.status.is_active() {
            return Err(MergeError::InvalidTarget {
                unit: source_id,
                target: target_id,
                reason: InvalidTargetReason::Inactive,
            });
        }

        Ok(())
    }

    /// Merges one unit into another.
    ///
    /// If both units are at the same level the merge *consolidates*: the
    /// source's child units and positions move to the target, and the source
    /// is deleted. Otherwise the merge *nests*: the source, with its subtree
    /// intact, is placed under the target one level below it, and descendant
    /// levels follow the configured [`LevelPolicy`].
    ///
    /// # Errors
    ///
    /// See [`Repository::validate_merge`].
    #[instrument(skip(self))]
    pub fn merge_units(
        &mut self,
        source_id: EntityId,
        target_id: EntityId,
    ) -> Result<MergeOutcome, MergeError> {
        self.validate_merge(source_id, target_id)?;
        let source_level = self.require_unit(source_id)?.level;
        let target_level = self.require_unit(target_id)?.level;

        let outcome = if source_level == target_level {
            let relocated_units: Vec<_> = self.child_units(source_id).map(|u| u.id).collect();
            for &child in &relocated_units {
                if let Some(unit) = self.units.get_mut(&child) {
                    unit.parent_id = Some(target_id);
                }
            }

            let relocated_positions: Vec<_> =
                self.positions_in(source_id).map(|p| p.id).collect();
            for &position in &relocated_positions {
                if let Some(position) = self.positions.get_mut(&position) {
                    position.organizational_unit_id = target_id;
                }
            }

            self.units.shift_remove(&source_id);

            MergeOutcome {
                mode: MergeMode::Consolidate,
                target: target_id,
                relocated_units,
                relocated_positions,
                renumbered: Vec::new(),
            }
        } else {
            self.reparent(source_id, target_id, target_level + 1);
            let renumbered = self.apply_level_policy(source_id);

            MergeOutcome {
                mode: MergeMode::Nest,
                target: target_id,
                relocated_units: vec![source_id],
                relocated_positions: Vec::new(),
                renumbered,
            }
        };

        tracing::debug!(
            %source_id,
            %target_id,
            mode = ?outcome.mode,
            units = outcome.relocated_units.len(),
            positions = outcome.relocated_positions.len(),
            "merged units"
        );

        Ok(outcome)
    }

    /// Merges a position into another unit.
    ///
    /// Positions have no level, so this always relocates the position to the
    /// target unit; the position itself is kept. Returns the unit it was in
    /// before.
    ///
    /// # Errors
    ///
    /// See [`Repository::move_position`].
    pub fn merge_position(
        &mut self,
        position_id: EntityId,
        target_unit_id: EntityId,
    ) -> Result<EntityId, MoveError> {
        self.move_position(position_id, target_unit_id)
    }

    /// Reports how many units and positions a cascade delete of `unit_id`
    /// would remove.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the unit does not exist.
    pub fn preview_delete_impact(&self, unit_id: EntityId) -> Result<DeleteImpact, NotFound> {
        let (closure, positions) = self.delete_closure(unit_id)?;
        Ok(DeleteImpact {
            descendant_count: closure.len() - 1,
            position_count: positions.len(),
        })
    }

    /// Deletes a unit together with every unit below it and every position
    /// in any of those units.
    ///
    /// References to the removed positions are handled according to the
    /// configured [`IncumbentPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the unit does not exist.
    #[instrument(skip(self))]
    pub fn delete_unit_cascade(&mut self, unit_id: EntityId) -> Result<DeleteOutcome, NotFound> {
        let (closure, positions) = self.delete_closure(unit_id)?;

        let mut outcome = self.remove_positions(&positions);
        for id in &closure {
            self.units.shift_remove(id);
        }
        outcome.removed_units = closure;

        tracing::debug!(
            %unit_id,
            units = outcome.removed_units.len(),
            positions = outcome.removed_positions.len(),
            "deleted unit"
        );
        Ok(outcome)
    }

    /// Deletes a single position.
    ///
    /// References to it are handled according to the configured
    /// [`IncumbentPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the position does not exist.
    #[instrument(skip(self))]
    pub fn delete_position(&mut self, position_id: EntityId) -> Result<DeleteOutcome, NotFound> {
        self.require_position(position_id)?;
        Ok(self.remove_positions(&[position_id]))
    }

    /// Adds a unit and returns its newly assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent or manager position does not exist,
    /// if the parent is inactive, if the type and parent do not fit
    /// together, or if levels are enforced and the level is not one below the
    /// parent.
    #[instrument(skip(self, unit), fields(name = %unit.name, unit_type = %unit.unit_type))]
    pub fn add_unit(&mut self, unit: NewUnit) -> Result<EntityId, AddUnitError> {
        match (unit.unit_type, unit.parent_id) {
            (UnitType::Company, Some(_)) => return Err(AddUnitError::CompanyWithParent),
            (UnitType::Company, None) => {
                if let Some(root) = self.units().find(|u| u.is_root() && u.status.is_active()) {
                    return Err(AddUnitError::DuplicateRoot(root.id));
                }
                if self.config().enforce_levels && unit.level != 1 {
                    return Err(AddUnitError::InvalidLevel {
                        level: unit.level,
                        expected: 1,
                        parent_level: 0,
                    });
                }
            }
            (unit_type, None) => return Err(AddUnitError::MissingParent(unit_type)),
            (_, Some(parent_id)) => {
                let parent = self.require_unit(parent_id)?;
                if !parent.status.is_active() {
                    return Err(AddUnitError::InactiveParent(parent_id));
                }
                if self.config().enforce_levels && unit.level != parent.level + 1 {
                    return Err(AddUnitError::InvalidLevel {
                        level: unit.level,
                        expected: parent.level + 1,
                        parent_level: parent.level,
                    });
                }
            }
        }

        if let Some(manager) = unit.manager_position_id {
            self.require_position(manager)?;
        }

        let id = self.next_id(EntityKind::Unit)?;
        self.units.insert(id, unit.into_unit(id));
        tracing::debug!(%id, "added unit");
        Ok(id)
    }

    /// Adds a vacant position and returns its newly assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AddPositionError::NotFound`] if the unit, classification or
    /// manager position does not exist.
    pub fn add_position(&mut self, position: NewPosition) -> Result<EntityId, AddPositionError> {
        self.require_unit(position.organizational_unit_id)?;
        if let Some(classification) = position.job_classification_id {
            self.require_classification(classification)?;
        }
        if let Some(manager) = position.reports_to_id {
            self.require_position(manager)?;
        }

        let id = self.next_id(EntityKind::Position)?;
        self.positions.insert(id, position.into_position(id));
        tracing::debug!(%id, "added position");
        Ok(id)
    }

    /// Adds an employee without a position and returns the new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifiersExhausted`] if no employee identifier is left.
    pub fn add_employee(&mut self, employee: NewEmployee) -> Result<EntityId, IdentifiersExhausted> {
        let id = self.next_id(EntityKind::Employee)?;
        self.employees.insert(id, employee.into_employee(id));
        tracing::debug!(%id, "added employee");
        Ok(id)
    }

    /// Places an employee in a position, keeping both sides of the
    /// assignment in step.
    ///
    /// The employee leaves any position they held before, and any previous
    /// incumbent of the position is unassigned. Returns the previous
    /// incumbent, if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the position or employee does not exist.
    #[instrument(skip(self))]
    pub fn assign_incumbent(
        &mut self,
        position_id: EntityId,
        employee_id: EntityId,
    ) -> Result<Option<EntityId>, NotFound> {
        self.require_position(position_id)?;
        let previous_position = self.require_employee(employee_id)?.position_id;

        if let Some(previous) = previous_position
            .filter(|&p| p != position_id && self.positions.contains_key(&p))
        {
            self.vacate_position(previous)?;
        }

        let previous_incumbent = self
            .vacate_position(position_id)?
            .filter(|&incumbent| incumbent != employee_id);

        if let Some(position) = self.positions.get_mut(&position_id) {
            position.incumbent_id = Some(employee_id);
            position.hiring_status = HiringStatus::Filled;
        }
        if let Some(employee) = self.employees.get_mut(&employee_id) {
            employee.position_id = Some(position_id);
        }

        Ok(previous_incumbent)
    }

    /// Removes the incumbent from a position, clearing both sides of the
    /// assignment. Returns the former incumbent, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the position does not exist.
    pub fn vacate_position(&mut self, position_id: EntityId) -> Result<Option<EntityId>, NotFound> {
        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(NotFound::new(position_id))?;
        let incumbent = position.incumbent_id.take();
        if incumbent.is_some() {
            position.hiring_status = HiringStatus::Vacant;
        }

        if let Some(employee) = incumbent.and_then(|id| self.employees.get_mut(&id)) {
            if employee.position_id == Some(position_id) {
                employee.position_id = None;
            }
        }

        Ok(incumbent)
    }

    /// Units in the active tree that `source_id` could be merged into, in
    /// storage order.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the source does not exist.
    pub fn merge_candidates(
        &self,
        source_id: EntityId,
    ) -> Result<Vec<&OrganizationalUnit>, NotFound> {
        self.require_unit(source_id)?;
        Ok(self
            .units()
            .filter(|target| self.validate_merge(source_id, target.id).is_ok())
            .filter(|target| self.is_in_active_tree(target.id))
            .collect())
    }

    /// Units in the active tree that `unit_id` could be moved under, in
    /// storage order.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the unit does not exist.
    pub fn move_candidates(&self, unit_id: EntityId) -> Result<Vec<&OrganizationalUnit>, NotFound> {
        self.require_unit(unit_id)?;
        let excluded: HashSet<_> = std::iter::once(unit_id)
            .chain(self.collect_descendants(unit_id))
            .collect();
        Ok(self
            .units()
            .filter(|target| !excluded.contains(&target.id) && self.is_in_active_tree(target.id))
            .collect())
    }
}

impl Repository {
    fn reparent(&mut self, unit_id: EntityId, parent_id: EntityId, level: u32) {
        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.parent_id = Some(parent_id);
            unit.level = level;
        }
    }

    /// Brings descendant levels in line with `unit_id`'s level if the
    /// configured policy asks for it. Returns the units whose level changed.
    fn apply_level_policy(&mut self, unit_id: EntityId) -> Vec<EntityId> {
        match self.config().level_policy {
            LevelPolicy::Preserve => Vec::new(),
            LevelPolicy::Renumber => self.renumber_descendants(unit_id),
        }
    }

    fn renumber_descendants(&mut self, unit_id: EntityId) -> Vec<EntityId> {
        let mut levels: HashMap<EntityId, u32> = HashMap::new();
        if let Some(unit) = self.unit(unit_id) {
            levels.insert(unit_id, unit.level);
        }

        // Breadth first, so every parent's level is known before its children.
        let mut changed = Vec::new();
        for descendant in self.collect_descendants(unit_id) {
            let Some(unit) = self.units.get_mut(&descendant) else {
                continue;
            };
            let Some(parent_level) = unit.parent_id.and_then(|p| levels.get(&p).copied()) else {
                continue;
            };
            let level = parent_level + 1;
            if unit.level != level {
                unit.level = level;
                changed.push(descendant);
            }
            levels.insert(descendant, level);
        }
        changed
    }

    /// The unit, its descendants, and the positions in any of them.
    fn delete_closure(&self, unit_id: EntityId) -> Result<(Vec<EntityId>, Vec<EntityId>), NotFound> {
        self.require_unit(unit_id)?;
        let mut closure = vec![unit_id];
        closure.extend(self.collect_descendants(unit_id));

        let members: HashSet<_> = closure.iter().copied().collect();
        let positions = self
            .positions()
            .filter(|position| members.contains(&position.organizational_unit_id))
            .map(|position| position.id)
            .collect();

        Ok((closure, positions))
    }

    fn remove_positions(&mut self, ids: &[EntityId]) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();
        let policy = self.config().incumbent_policy;

        for &id in ids {
            let Some(position) = self.positions.shift_remove(&id) else {
                continue;
            };
            outcome.removed_positions.push(id);

            let Some(incumbent) = position.incumbent_id else {
                continue;
            };
            let Some(employee) = self.employees.get_mut(&incumbent) else {
                continue;
            };
            if employee.position_id != Some(id) {
                continue;
            }
            match policy {
                IncumbentPolicy::Clear => {
                    employee.position_id = None;
                    outcome.vacated_employees.push(incumbent);
                }
                IncumbentPolicy::Retain => {
                    tracing::warn!(
                        employee = %incumbent,
                        position = %id,
                        "employee still references deleted position"
                    );
                    outcome.dangling_employees.push(incumbent);
                }
            }
        }

        if policy == IncumbentPolicy::Clear {
            let removed: HashSet<_> = outcome.removed_positions.iter().copied().collect();
            for unit in self.units.values_mut() {
                if unit.manager_position_id.is_some_and(|p| removed.contains(&p)) {
                    unit.manager_position_id = None;
                }
            }
            for position in self.positions.values_mut() {
                if position.reports_to_id.is_some_and(|p| removed.contains(&p)) {
                    position.reports_to_id = None;
                }
            }
        }

        outcome
    }
}
