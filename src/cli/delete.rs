use orgchart::{EntityId, OrgChart, Repository, domain::DeleteOutcome};
use tracing::instrument;

use crate::cli::{
    parse_position_id, parse_unit_id, print_result, prompt_to_proceed, terminal::Colorize,
};

#[derive(Debug, clap::Parser)]
pub struct Unit {
    /// The unit to delete, together with every unit and position below it
    #[clap(value_parser = parse_unit_id)]
    unit: EntityId,

    /// Show what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Unit {
    #[instrument(skip(chart))]
    pub fn run(self, chart: &mut OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();

        let impact = chart.preview_delete_impact(self.unit)?;
        let parent = repository.unit(self.unit).and_then(|unit| unit.parent_id);

        if !self.yes || self.dry_run {
            println!(
                "Will delete {} and {} unit(s) below it, with {} position(s):",
                self.unit.display(digits),
                impact.descendant_count,
                impact.position_count
            );
            print_doomed(repository, self.unit, digits);
        }

        if self.dry_run {
            println!("{}", "Dry run: nothing was deleted".dim());
            return Ok(());
        }
        if !self.yes {
            prompt_to_proceed()?;
        }

        let outcome = chart.delete_unit_cascade(self.unit)?;

        println!(
            "{}",
            format!(
                "✅ Deleted {} unit(s) and {} position(s)",
                outcome.removed_units.len(),
                outcome.removed_positions.len()
            )
            .success()
        );
        report_incumbents(&outcome, digits);
        print_result(chart, parent);
        Ok(())
    }
}

fn print_doomed(repository: &Repository, unit_id: EntityId, digits: usize) {
    let units: Vec<_> = std::iter::once(unit_id)
        .chain(repository.collect_descendants(unit_id))
        .collect();

    for &id in &units {
        let Some(unit) = repository.unit(id) else {
            continue;
        };
        println!("  • {} {}", id.display(digits), unit.name);
        for position in repository.positions_in(id) {
            let holder = repository
                .incumbent_name(position.id)
                .unwrap_or_else(|| "vacant".to_string());
            println!(
                "      {} {} {}",
                position.id.display(digits),
                position.title,
                format!("({holder})").dim()
            );
        }
    }
}

fn report_incumbents(outcome: &DeleteOutcome, digits: usize) {
    if !outcome.vacated_employees.is_empty() {
        println!(
            "{} employee(s) no longer hold a position: {}",
            outcome.vacated_employees.len(),
            join(&outcome.vacated_employees, digits)
        );
    }
    if !outcome.dangling_employees.is_empty() {
        println!(
            "{}",
            format!(
                "⚠️  {} employee(s) still reference a deleted position: {}",
                outcome.dangling_employees.len(),
                join(&outcome.dangling_employees, digits)
            )
            .warning()
        );
    }
}

fn join(ids: &[EntityId], digits: usize) -> String {
    ids.iter()
        .map(|id| id.display(digits).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, clap::Parser)]
pub struct Position {
    /// The position to delete
    #[clap(value_parser = parse_position_id)]
    position: EntityId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Position {
    #[instrument(skip(chart))]
    pub fn run(self, chart: &mut OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();

        let Some(position) = repository.position(self.position) else {
            anyhow::bail!("Position {} not found", self.position.display(digits));
        };
        let unit = position.organizational_unit_id;

        if !self.yes {
            println!(
                "Will delete position {} {}",
                self.position.display(digits),
                position.title
            );
            prompt_to_proceed()?;
        }

        let outcome = chart.delete_position(self.position)?;

        println!(
            "{}",
            format!("✅ Deleted position {}", self.position.display(digits)).success()
        );
        report_incumbents(&outcome, digits);
        print_result(chart, Some(unit));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use orgchart::{
        Config,
        domain::{BuildError, IncumbentPolicy},
        storage::{ChartError, Dataset},
    };

    use super::*;
    use crate::cli::tests::{ACME, chart, id};

    #[test]
    fn cascade_delete_removes_the_subtree() {
        let mut chart = chart();
        let command = Unit {
            unit: id("O-002"),
            dry_run: false,
            yes: true,
        };

        command.run(&mut chart).unwrap();

        let repository = chart.repository();
        for unit in ["O-002", "O-004", "O-005", "O-007"] {
            assert!(repository.unit(id(unit)).is_none());
        }
        assert_eq!(repository.position_count(), 3);
        assert_eq!(repository.employee(id("P-002")).unwrap().position_id, None);
        assert_eq!(chart.tree().employee_count, 2);
    }

    #[test]
    fn dry_run_leaves_the_chart_alone() {
        let mut chart = chart();
        let before = chart.repository().clone();
        let command = Unit {
            unit: id("O-003"),
            dry_run: true,
            yes: false,
        };

        command.run(&mut chart).unwrap();

        assert_eq!(chart.repository(), &before);
    }

    #[test]
    fn the_root_cannot_be_deleted() {
        let mut chart = chart();
        let command = Unit {
            unit: id("O-001"),
            dry_run: false,
            yes: true,
        };

        let error = command.run(&mut chart).unwrap_err();

        assert_eq!(
            error.downcast_ref::<ChartError>(),
            Some(&ChartError::Build(BuildError::NoRootUnit))
        );
        assert!(chart.repository().unit(id("O-001")).is_some());
    }

    #[test]
    fn single_positions_can_be_deleted_under_either_policy() {
        let mut chart = chart();
        Position {
            position: id("S-005"),
            yes: true,
        }
        .run(&mut chart)
        .unwrap();
        assert_eq!(chart.repository().employee(id("P-004")).unwrap().position_id, None);

        let config = Config::default().with_incumbent_policy(IncumbentPolicy::Retain);
        let repository = Dataset::from_yaml(ACME)
            .unwrap()
            .into_repository(config)
            .unwrap();
        let mut chart = OrgChart::new(repository).unwrap();
        Position {
            position: id("S-005"),
            yes: true,
        }
        .run(&mut chart)
        .unwrap();
        assert_eq!(
            chart.repository().employee(id("P-004")).unwrap().position_id,
            Some(id("S-005"))
        );
    }
}
