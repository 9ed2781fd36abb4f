use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::EntityId;

/// Employment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    /// Onboarding has not completed.
    #[default]
    Pending,
    /// Currently employed.
    Active,
    /// Employment ended by the employer.
    Terminated,
    /// Employment ended by the employee.
    Resigned,
    /// Signed, with a start date in the future.
    Future,
}

/// A person employed by the organization.
///
/// The employee's unit and line manager are not stored here; they follow
/// from the position (see [`Repository::employee_unit`] and
/// [`Repository::line_manager`]).
///
/// [`Repository::employee_unit`]: crate::domain::Repository::employee_unit
/// [`Repository::line_manager`]: crate::domain::Repository::line_manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier.
    pub id: EntityId,
    /// Human-readable code, e.g. a personnel number.
    pub code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Work e-mail address.
    #[serde(default)]
    pub email: String,
    /// Work phone number.
    #[serde(default)]
    pub phone: String,
    /// Employment status.
    #[serde(default)]
    pub status: EmployeeStatus,
    /// First working day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    /// The position currently held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<EntityId>,
}

impl Employee {
    /// The display name, family name first.
    ///
    /// If either part is empty the other is returned on its own.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{} {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, _) => self.first_name.clone(),
        }
    }
}

/// The fields a caller supplies when adding an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    /// Human-readable code.
    pub code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Work e-mail address.
    pub email: String,
    /// First working day.
    pub hire_date: Option<NaiveDate>,
}

impl NewEmployee {
    pub(crate) fn into_employee(self, id: EntityId) -> Employee {
        Employee {
            id,
            code: self.code,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: String::new(),
            status: EmployeeStatus::Pending,
            hire_date: self.hire_date,
            position_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("An", "Nguyen", "Nguyen An"; "both parts")]
    #[test_case("", "Nguyen", "Nguyen"; "family name only")]
    #[test_case("An", "", "An"; "given name only")]
    fn full_name_is_family_name_first(first: &str, last: &str, expected: &str) {
        let employee = NewEmployee {
            code: "E1".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            hire_date: None,
        }
        .into_employee(EntityId::employee(1).unwrap());

        assert_eq!(employee.full_name(), expected);
    }
}
