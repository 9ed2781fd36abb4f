use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

/// The kind of record an [`EntityId`] refers to.
///
/// Each kind has a single-letter prefix, following the O-S-C-P model:
/// organizational unit, slot (position), classification, person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// An organizational unit (`O`).
    Unit,
    /// A position, or staffing slot (`S`).
    Position,
    /// A job classification (`C`).
    Classification,
    /// A person, i.e. an employee (`P`).
    Employee,
}

impl EntityKind {
    /// All kinds, in prefix order.
    pub const ALL: [Self; 4] = [
        Self::Unit,
        Self::Position,
        Self::Classification,
        Self::Employee,
    ];

    /// The single-letter prefix used in identifiers of this kind.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Unit => 'O',
            Self::Position => 'S',
            Self::Classification => 'C',
            Self::Employee => 'P',
        }
    }

    /// A human-readable noun for this kind, used in error messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Unit => "organizational unit",
            Self::Position => "position",
            Self::Classification => "job classification",
            Self::Employee => "employee",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| prefix.len() == 1 && prefix.starts_with(kind.prefix()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Identifier of a record in the repository.
///
/// Format: `{PREFIX}-{N}`, where:
/// - `PREFIX` is the single uppercase letter of the [`EntityKind`]
/// - `N` is a positive non-zero integer (e.g. `001`, `42`)
///
/// Examples: `O-001`, `S-011`, `P-003`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    kind: EntityKind,
    number: NonZeroU32,
}

impl EntityId {
    /// Create an identifier from pre-validated parts.
    #[must_use]
    pub const fn new(kind: EntityKind, number: NonZeroU32) -> Self {
        Self { kind, number }
    }

    /// Create a unit identifier (`O-n`).
    ///
    /// Returns `None` if `number` is zero.
    #[must_use]
    pub fn unit(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(|n| Self::new(EntityKind::Unit, n))
    }

    /// Create a position identifier (`S-n`).
    ///
    /// Returns `None` if `number` is zero.
    #[must_use]
    pub fn position(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(|n| Self::new(EntityKind::Position, n))
    }

    /// Create an employee identifier (`P-n`).
    ///
    /// Returns `None` if `number` is zero.
    #[must_use]
    pub fn employee(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(|n| Self::new(EntityKind::Employee, n))
    }

    /// Returns the kind of record this identifier refers to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the numeric component.
    #[must_use]
    pub const fn number(&self) -> NonZeroU32 {
        self.number
    }

    /// Parses an identifier and checks that it is of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid identifier, or if it
    /// names a different kind of record.
    pub fn parse_as(kind: EntityKind, s: &str) -> Result<Self, Error> {
        let id: Self = s.parse()?;
        if id.kind == kind {
            Ok(id)
        } else {
            Err(Error::WrongKind {
                id: s.to_string(),
                expected: kind,
            })
        }
    }

    /// Returns a displayable representation with the specified digit width.
    ///
    /// # Examples
    ///
    /// ```
    /// use orgchart::EntityId;
    ///
    /// let id = EntityId::unit(7).unwrap();
    ///
    /// assert_eq!(id.display(3).to_string(), "O-007");
    /// assert_eq!(id.display(1).to_string(), "O-7");
    /// ```
    #[must_use]
    pub const fn display(&self, digits: usize) -> FormattedId {
        FormattedId { id: *self, digits }
    }
}

/// A wrapper type that formats an [`EntityId`] with a specified digit width.
#[derive(Debug, Clone, Copy)]
pub struct FormattedId {
    id: EntityId,
    digits: usize,
}

impl fmt::Display for FormattedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}",
            self.id.kind.prefix(),
            self.id.number,
            width = self.digits
        )
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(DEFAULT_DIGITS).fmt(f)
    }
}

/// The digit width used when no configuration is at hand.
pub const DEFAULT_DIGITS: usize = 3;

/// Errors that can occur while parsing an identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed structure.
    #[error("Invalid identifier format: {0}")]
    Syntax(String),

    /// Prefix is not one of the known kinds.
    #[error("Invalid identifier '{0}': unknown prefix '{1}' (expected one of O, S, C, P)")]
    Prefix(String, String),

    /// Non-numeric or zero number.
    #[error("Invalid number in identifier '{0}': expected a non-zero integer, got {1}")]
    Number(String, String),

    /// Valid identifier, but of the wrong kind for the context.
    #[error("Expected {expected} identifier, got '{id}'")]
    WrongKind {
        /// The identifier as given.
        id: String,
        /// The kind the context required.
        expected: EntityKind,
    },
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((prefix, number)) = s.split_once('-') else {
            return Err(Error::Syntax(s.to_string()));
        };

        if prefix.is_empty() || number.is_empty() {
            return Err(Error::Syntax(s.to_string()));
        }

        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| Error::Prefix(s.to_string(), prefix.to_string()))?;

        if !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Number(s.to_string(), number.to_string()));
        }

        let number = number
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| Error::Number(s.to_string(), number.to_string()))?;

        Ok(Self::new(kind, number))
    }
}

impl TryFrom<&str> for EntityId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("O-001", EntityKind::Unit, 1; "unit")]
    #[test_case("S-011", EntityKind::Position, 11; "position")]
    #[test_case("C-2", EntityKind::Classification, 2; "classification without padding")]
    #[test_case("P-1000", EntityKind::Employee, 1000; "employee wider than default")]
    fn parses_valid_identifiers(input: &str, kind: EntityKind, number: u32) {
        let id = EntityId::try_from(input).unwrap();
        assert_eq!(id.kind(), kind);
        assert_eq!(id.number().get(), number);
    }

    #[test_case(""; "empty")]
    #[test_case("O001"; "no dash")]
    #[test_case("-001"; "no prefix")]
    #[test_case("O-"; "no number")]
    fn rejects_malformed_identifiers(input: &str) {
        assert!(matches!(EntityId::try_from(input), Err(Error::Syntax(_))));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert!(matches!(
            EntityId::try_from("X-001"),
            Err(Error::Prefix(_, _))
        ));
        assert!(matches!(
            EntityId::try_from("o-001"),
            Err(Error::Prefix(_, _))
        ));
        assert!(matches!(
            EntityId::try_from("OS-001"),
            Err(Error::Prefix(_, _))
        ));
    }

    #[test]
    fn rejects_zero_and_non_numeric_numbers() {
        assert!(matches!(
            EntityId::try_from("O-000"),
            Err(Error::Number(_, _))
        ));
        assert!(matches!(
            EntityId::try_from("O-12a"),
            Err(Error::Number(_, _))
        ));
        assert!(matches!(
            EntityId::try_from("O--1"),
            Err(Error::Number(_, _))
        ));
    }

    #[test_case(1, 3, "O-001")]
    #[test_case(42, 3, "O-042")]
    #[test_case(1000, 3, "O-1000")]
    #[test_case(5, 5, "O-00005")]
    fn display_pads_to_digit_width(number: u32, digits: usize, expected: &str) {
        let id = EntityId::unit(number).unwrap();
        assert_eq!(id.display(digits).to_string(), expected);
    }

    #[test]
    fn parse_as_checks_kind() {
        let id = EntityId::parse_as(EntityKind::Position, "S-011").unwrap();
        assert_eq!(id, EntityId::position(11).unwrap());

        let err = EntityId::parse_as(EntityKind::Unit, "S-011").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected organizational unit identifier, got 'S-011'"
        );
    }

    #[test]
    fn ordering_groups_by_kind_then_number() {
        let mut ids = vec![
            EntityId::position(2).unwrap(),
            EntityId::unit(10).unwrap(),
            EntityId::unit(2).unwrap(),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                EntityId::unit(2).unwrap(),
                EntityId::unit(10).unwrap(),
                EntityId::position(2).unwrap(),
            ]
        );
    }

    #[test]
    fn serializes_as_string() {
        let id = EntityId::unit(10).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"O-010\"");
        let back: EntityId = serde_json::from_str("\"O-010\"").unwrap();
        assert_eq!(back, id);
    }
}
