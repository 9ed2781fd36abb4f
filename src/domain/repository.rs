//! The flat, in-memory store of organizational records.
//!
//! The [`Repository`] holds units, positions, job classifications and
//! employees keyed by [`EntityId`]. Relationships between records are plain
//! identifier fields; the repository does not cache any derived structure, so
//! the tree built from it is always consistent with the latest mutation.

use std::num::NonZeroU32;

use indexmap::IndexMap;
use thiserror::Error;

use crate::domain::{
    Config, EntityId, EntityKind,
    employee::Employee,
    job::JobClassification,
    position::Position,
    unit::OrganizationalUnit,
};

/// A referenced record does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} {id} not found")]
pub struct NotFound {
    /// The kind of record that was looked up.
    pub kind: EntityKind,
    /// The identifier that did not resolve.
    pub id: EntityId,
}

impl NotFound {
    /// A lookup of `id` failed; the kind is taken from the identifier.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            kind: id.kind(),
            id,
        }
    }
}

/// Errors that can occur when inserting a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// A record with the same identifier already exists.
    #[error("duplicate identifier {0}")]
    Duplicate(EntityId),
    /// The identifier names a different kind of record.
    #[error("identifier {id} cannot be used for a {expected}")]
    WrongKind {
        /// The offending identifier.
        id: EntityId,
        /// The kind of record being inserted.
        expected: EntityKind,
    },
}

/// Every identifier of a kind is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no {0} identifiers left")]
pub struct IdentifiersExhausted(pub EntityKind);

/// The in-memory store of units, positions, job classifications and
/// employees.
///
/// Each collection preserves insertion order, which is the order children
/// and positions appear in when the tree is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repository {
    pub(crate) units: IndexMap<EntityId, OrganizationalUnit>,
    pub(crate) positions: IndexMap<EntityId, Position>,
    pub(crate) classifications: IndexMap<EntityId, JobClassification>,
    pub(crate) employees: IndexMap<EntityId, Employee>,
    config: Config,
}

impl Repository {
    /// Creates an empty repository using the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration the mutation engine applies.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Inserts a unit as-is, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already used or is not a unit
    /// identifier.
    pub fn insert_unit(&mut self, unit: OrganizationalUnit) -> Result<(), InsertError> {
        check_new_id(unit.id, EntityKind::Unit, self.units.contains_key(&unit.id))?;
        self.units.insert(unit.id, unit);
        Ok(())
    }

    /// Inserts a position as-is, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already used or is not a
    /// position identifier.
    pub fn insert_position(&mut self, position: Position) -> Result<(), InsertError> {
        check_new_id(
            position.id,
            EntityKind::Position,
            self.positions.contains_key(&position.id),
        )?;
        self.positions.insert(position.id, position);
        Ok(())
    }

    /// Inserts a job classification as-is, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already used or is not a
    /// classification identifier.
    pub fn insert_classification(
        &mut self,
        classification: JobClassification,
    ) -> Result<(), InsertError> {
        check_new_id(
            classification.id,
            EntityKind::Classification,
            self.classifications.contains_key(&classification.id),
        )?;
        self.classifications
            .insert(classification.id, classification);
        Ok(())
    }

    /// Inserts an employee as-is, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already used or is not an
    /// employee identifier.
    pub fn insert_employee(&mut self, employee: Employee) -> Result<(), InsertError> {
        check_new_id(
            employee.id,
            EntityKind::Employee,
            self.employees.contains_key(&employee.id),
        )?;
        self.employees.insert(employee.id, employee);
        Ok(())
    }

    /// Looks up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&OrganizationalUnit> {
        self.units.get(&id)
    }

    /// Looks up a position.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<&Position> {
        self.positions.get(&id)
    }

    /// Looks up a job classification.
    #[must_use]
    pub fn classification(&self, id: EntityId) -> Option<&JobClassification> {
        self.classifications.get(&id)
    }

    /// Looks up an employee.
    #[must_use]
    pub fn employee(&self, id: EntityId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    /// All units, in storage order.
    pub fn units(&self) -> impl Iterator<Item = &OrganizationalUnit> + '_ {
        self.units.values()
    }

    /// All positions, in storage order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.positions.values()
    }

    /// All job classifications, in storage order.
    pub fn classifications(&self) -> impl Iterator<Item = &JobClassification> + '_ {
        self.classifications.values()
    }

    /// All employees, in storage order.
    pub fn employees(&self) -> impl Iterator<Item = &Employee> + '_ {
        self.employees.values()
    }

    /// The number of units, active or not.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// The number of positions, active or not.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions directly assigned to a unit, in storage order.
    pub fn positions_in(&self, unit_id: EntityId) -> impl Iterator<Item = &Position> + '_ {
        self.positions
            .values()
            .filter(move |position| position.organizational_unit_id == unit_id)
    }

    /// The name of the employee holding a position, if any.
    #[must_use]
    pub fn incumbent_name(&self, position_id: EntityId) -> Option<String> {
        let incumbent = self.position(position_id)?.incumbent_id?;
        self.employee(incumbent).map(Employee::full_name)
    }

    /// Returns the next free identifier of the given kind.
    ///
    /// This is one more than the largest number currently in use for that
    /// kind, so identifiers of deleted records are not reused while a higher
    /// one exists.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifiersExhausted`] if the largest number in use is
    /// already the maximum.
    pub fn next_id(&self, kind: EntityKind) -> Result<EntityId, IdentifiersExhausted> {
        let max = match kind {
            EntityKind::Unit => self.units.keys().map(EntityId::number).max(),
            EntityKind::Position => self.positions.keys().map(EntityId::number).max(),
            EntityKind::Classification => {
                self.classifications.keys().map(EntityId::number).max()
            }
            EntityKind::Employee => self.employees.keys().map(EntityId::number).max(),
        };

        let number = match max {
            None => NonZeroU32::MIN,
            Some(n) => n.checked_add(1).ok_or(IdentifiersExhausted(kind))?,
        };
        Ok(EntityId::new(kind, number))
    }

    pub(crate) fn require_unit(&self, id: EntityId) -> Result<&OrganizationalUnit, NotFound> {
        self.unit(id).ok_or(NotFound::new(id))
    }

    pub(crate) fn require_position(&self, id: EntityId) -> Result<&Position, NotFound> {
        self.position(id).ok_or(NotFound::new(id))
    }

    pub(crate) fn require_employee(&self, id: EntityId) -> Result<&Employee, NotFound> {
        self.employee(id).ok_or(NotFound::new(id))
    }

    pub(crate) fn require_classification(
        &self,
        id: EntityId,
    ) -> Result<&JobClassification, NotFound> {
        self.classification(id).ok_or(NotFound::new(id))
    }
}

fn check_new_id(id: EntityId, expected: EntityKind, exists: bool) -> Result<(), InsertError> {
    if id.kind() != expected {
        return Err(InsertError::WrongKind { id, expected });
    }
    if exists {
        return Err(InsertError::Duplicate(id));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built organizations shared by the domain tests.

    use chrono::NaiveDate;

    use super::Repository;
    use crate::domain::{
        Config, EntityId,
        employee::{Employee, EmployeeStatus},
        position::{HiringStatus, Position, WorkMode},
        unit::{OrganizationalUnit, Status, UnitType},
    };

    pub fn id(s: &str) -> EntityId {
        EntityId::try_from(s).unwrap()
    }

    pub fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    pub fn unit(
        unit_id: &str,
        name: &str,
        unit_type: UnitType,
        level: u32,
        parent: Option<&str>,
    ) -> OrganizationalUnit {
        OrganizationalUnit {
            id: id(unit_id),
            code: unit_id.replace('-', ""),
            name: name.to_string(),
            abbreviation: String::new(),
            cost_center: format!("CC-{unit_id}"),
            status: Status::Active,
            valid_from: date(),
            valid_to: None,
            level,
            unit_type,
            parent_id: parent.map(id),
            manager_position_id: None,
        }
    }

    pub fn position(position_id: &str, unit_id: &str, incumbent: Option<&str>) -> Position {
        Position {
            id: id(position_id),
            code: position_id.replace('-', ""),
            title: format!("Title {position_id}"),
            fte: 1.0,
            status: Status::Active,
            hiring_status: if incumbent.is_some() {
                HiringStatus::Filled
            } else {
                HiringStatus::Vacant
            },
            work_mode: WorkMode::Onsite,
            office_location: String::new(),
            focus_area: String::new(),
            organizational_unit_id: id(unit_id),
            job_classification_id: None,
            reports_to_id: None,
            incumbent_id: incumbent.map(id),
        }
    }

    pub fn employee(employee_id: &str, first: &str, last: &str, position: Option<&str>) -> Employee {
        Employee {
            id: id(employee_id),
            code: employee_id.replace('-', ""),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            phone: String::new(),
            status: EmployeeStatus::Active,
            hire_date: None,
            position_id: position.map(id),
        }
    }

    /// The example organization:
    ///
    /// ```text
    /// O-001 Acme (company, 1)
    /// └── O-010 Operations (division, 2)
    ///     └── O-011 Logistics (department, 3)   S-011 held by P-003
    /// ```
    pub fn example() -> Repository {
        let mut repo = Repository::new(Config::default());
        repo.insert_unit(unit("O-001", "Acme", UnitType::Company, 1, None))
            .unwrap();
        repo.insert_unit(unit(
            "O-010",
            "Operations",
            UnitType::Division,
            2,
            Some("O-001"),
        ))
        .unwrap();
        repo.insert_unit(unit(
            "O-011",
            "Logistics",
            UnitType::Department,
            3,
            Some("O-010"),
        ))
        .unwrap();
        repo.insert_position(position("S-011", "O-011", Some("P-003")))
            .unwrap();
        repo.insert_employee(employee("P-003", "Lan", "Tran", Some("S-011")))
            .unwrap();
        repo
    }

    /// A deeper organization used for move and merge tests:
    ///
    /// ```text
    /// O-001 Acme (company, 1)                        S-001 (P-001)
    /// ├── O-002 Engineering (division, 2)            S-002 (P-002)
    /// │   ├── O-004 Platform (department, 3)         S-004 (P-004), S-005 vacant
    /// │   │   └── O-006 Storage (team, 4)            S-006 (P-006)
    /// │   │       └── O-008 Backups (team, 5)
    /// │   └── O-005 Product (department, 3)          S-007 (P-007)
    /// └── O-003 Sales (division, 2)                  S-003 vacant
    ///     └── O-007 Field Sales (department, 3)      S-008 (P-008)
    /// ```
    pub fn deep() -> Repository {
        let mut repo = Repository::new(Config::default());
        for unit in [
            unit("O-001", "Acme", UnitType::Company, 1, None),
            unit("O-002", "Engineering", UnitType::Division, 2, Some("O-001")),
            unit("O-003", "Sales", UnitType::Division, 2, Some("O-001")),
            unit("O-004", "Platform", UnitType::Department, 3, Some("O-002")),
            unit("O-005", "Product", UnitType::Department, 3, Some("O-002")),
            unit("O-006", "Storage", UnitType::Team, 4, Some("O-004")),
            unit("O-007", "Field Sales", UnitType::Department, 3, Some("O-003")),
            unit("O-008", "Backups", UnitType::Team, 5, Some("O-006")),
        ] {
            repo.insert_unit(unit).unwrap();
        }
        for position in [
            position("S-001", "O-001", Some("P-001")),
            position("S-002", "O-002", Some("P-002")),
            position("S-003", "O-003", None),
            position("S-004", "O-004", Some("P-004")),
            position("S-005", "O-004", None),
            position("S-006", "O-006", Some("P-006")),
            position("S-007", "O-005", Some("P-007")),
            position("S-008", "O-007", Some("P-008")),
        ] {
            repo.insert_position(position).unwrap();
        }
        for (employee_id, first, last, position_id) in [
            ("P-001", "Mai", "Pham", "S-001"),
            ("P-002", "Huy", "Le", "S-002"),
            ("P-004", "Linh", "Vo", "S-004"),
            ("P-006", "Nam", "Do", "S-006"),
            ("P-007", "Thu", "Bui", "S-007"),
            ("P-008", "Khoa", "Ngo", "S-008"),
        ] {
            repo.insert_employee(employee(employee_id, first, last, Some(position_id)))
                .unwrap();
        }
        repo
    }
}
