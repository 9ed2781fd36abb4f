use chrono::NaiveDate;
use orgchart::{
    EntityId, OrgChart,
    domain::{NewUnit, UnitType},
};
use tracing::instrument;

use crate::cli::{parse_position_id, parse_unit_id, print_result, terminal::Colorize};

fn parse_unit_type(s: &str) -> Result<UnitType, String> {
    match s.to_lowercase().as_str() {
        "company" => Ok(UnitType::Company),
        "division" => Ok(UnitType::Division),
        "department" => Ok(UnitType::Department),
        "team" => Ok(UnitType::Team),
        other => Err(format!(
            "unknown unit type '{other}' (expected company, division, department or team)"
        )),
    }
}

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The type of unit to add
    #[arg(long = "type", short = 't', value_parser = parse_unit_type)]
    unit_type: UnitType,

    /// The unit's display name
    #[arg(long, short)]
    name: String,

    /// The unit's code
    #[arg(long)]
    code: String,

    /// The parent unit (required for everything but a company)
    #[arg(long, short, value_parser = parse_unit_id)]
    parent: Option<EntityId>,

    /// The unit's level (defaults to one below the parent)
    #[arg(long)]
    level: Option<u32>,

    /// Short name
    #[arg(long)]
    abbreviation: Option<String>,

    /// Cost center (defaults to the parent's)
    #[arg(long)]
    cost_center: Option<String>,

    /// The position leading the unit
    #[arg(long, value_parser = parse_position_id)]
    manager: Option<EntityId>,

    /// First day the unit is valid (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    valid_from: Option<NaiveDate>,
}

impl Command {
    #[instrument(skip(chart))]
    pub fn run(self, chart: &mut OrgChart) -> anyhow::Result<()> {
        let digits = chart.repository().config().digits();
        let unit = self.into_new_unit(chart);
        let name = unit.name.clone();

        let id = chart.add_unit(unit)?;

        println!(
            "{}",
            format!("✅ Added {} {name}", id.display(digits)).success()
        );
        print_result(chart, Some(id));
        Ok(())
    }

    fn into_new_unit(self, chart: &OrgChart) -> NewUnit {
        let valid_from = self
            .valid_from
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let mut unit = match self.parent.and_then(|id| chart.repository().unit(id)) {
            Some(parent) => NewUnit::under(parent, self.unit_type, self.code, self.name, valid_from),
            None => NewUnit {
                code: self.code,
                name: self.name,
                abbreviation: String::new(),
                cost_center: String::new(),
                unit_type: self.unit_type,
                // An unresolved parent is passed through so the chart reports it.
                parent_id: self.parent,
                level: 1,
                manager_position_id: None,
                valid_from,
            },
        };

        if let Some(level) = self.level {
            unit.level = level;
        }
        if let Some(abbreviation) = self.abbreviation {
            unit.abbreviation = abbreviation;
        }
        if let Some(cost_center) = self.cost_center {
            unit.cost_center = cost_center;
        }
        unit.manager_position_id = self.manager;

        unit
    }
}

#[cfg(test)]
mod tests {
    use orgchart::{domain::AddUnitError, storage::ChartError};
    use test_case::test_case;

    use super::*;
    use crate::cli::tests::{chart, id};

    fn command(unit_type: UnitType, parent: Option<&str>) -> Command {
        Command {
            unit_type,
            name: "Customs".to_string(),
            code: "OPS-LOG-CUS".to_string(),
            parent: parent.map(id),
            level: None,
            abbreviation: None,
            cost_center: None,
            manager: None,
            valid_from: NaiveDate::from_ymd_opt(2026, 1, 1),
        }
    }

    #[test_case("Team", UnitType::Team)]
    #[test_case("department", UnitType::Department)]
    #[test_case("COMPANY", UnitType::Company)]
    fn unit_types_parse_case_insensitively(input: &str, expected: UnitType) {
        assert_eq!(parse_unit_type(input).unwrap(), expected);
    }

    #[test]
    fn unknown_unit_types_are_rejected() {
        assert!(parse_unit_type("squad").is_err());
    }

    #[test]
    fn units_are_added_below_their_parent() {
        let mut chart = chart();

        command(UnitType::Team, Some("O-006")).run(&mut chart).unwrap();

        let added = chart.repository().unit(id("O-009")).unwrap();
        assert_eq!(added.level, 4);
        assert_eq!(added.cost_center, "CC-3100");
        assert!(chart.find_node(id("O-009")).is_some());
    }

    #[test_case(UnitType::Company, None; "second root")]
    #[test_case(UnitType::Team, None; "team without parent")]
    #[test_case(UnitType::Team, Some("O-099"); "unknown parent")]
    fn invalid_units_are_rejected(unit_type: UnitType, parent: Option<&str>) {
        let mut chart = chart();

        let error = command(unit_type, parent).run(&mut chart).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<ChartError>(),
            Some(ChartError::AddUnit(
                AddUnitError::DuplicateRoot(_)
                    | AddUnitError::MissingParent(_)
                    | AddUnitError::NotFound(_)
            ))
        ));
        assert_eq!(chart.repository().unit_count(), 8);
    }

    #[test]
    fn explicit_levels_are_checked() {
        let mut chart = chart();
        let mut command = command(UnitType::Team, Some("O-006"));
        command.level = Some(6);

        let error = command.run(&mut chart).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<ChartError>(),
            Some(ChartError::AddUnit(AddUnitError::InvalidLevel { expected: 4, .. }))
        ));
    }
}
