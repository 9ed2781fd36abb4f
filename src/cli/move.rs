use orgchart::{EntityId, OrgChart};
use tracing::instrument;

use crate::cli::{
    parse_position_id, parse_unit_id, print_result, prompt_to_proceed, terminal::Colorize,
};

#[derive(Debug, clap::Parser)]
pub struct Unit {
    /// The unit to move
    #[clap(value_parser = parse_unit_id)]
    unit: EntityId,

    /// The new parent unit. Omit to list the units it can be moved under.
    #[clap(value_parser = parse_unit_id)]
    parent: Option<EntityId>,

    /// The unit's new level (defaults to one below the new parent)
    #[arg(long)]
    level: Option<u32>,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Unit {
    #[instrument(skip(chart))]
    pub fn run(self, chart: &mut OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();

        let Some(unit) = repository.unit(self.unit) else {
            anyhow::bail!("Unit {} not found", self.unit.display(digits));
        };
        let name = unit.name.clone();

        let Some(parent_id) = self.parent else {
            let candidates = repository.move_candidates(self.unit)?;
            println!("{name} can be moved under:");
            for candidate in candidates {
                println!(
                    "  • {} {} {}",
                    candidate.id.display(digits),
                    candidate.name,
                    format!("(L{})", candidate.level).dim()
                );
            }
            return Ok(());
        };

        let Some(parent) = repository.unit(parent_id) else {
            anyhow::bail!("Unit {} not found", parent_id.display(digits));
        };
        let level = self.level.unwrap_or(parent.level + 1);

        if !self.yes {
            println!(
                "Will move {} {} under {} {} at level {level}",
                self.unit.display(digits),
                name,
                parent_id.display(digits),
                parent.name
            );
            let descendants = repository.collect_descendants(self.unit).len();
            if descendants > 0 {
                println!("{descendants} unit(s) below it move along.");
            }
            prompt_to_proceed()?;
        }

        let outcome = chart.move_unit(self.unit, parent_id, level)?;

        println!(
            "{}",
            format!("✅ Moved {} {}", self.unit.display(digits), name).success()
        );
        if !outcome.renumbered.is_empty() {
            println!(
                "{}",
                format!(
                    "Renumbered {} unit(s) below it to match their new depth",
                    outcome.renumbered.len()
                )
                .dim()
            );
        }
        print_result(chart, Some(parent_id));
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Position {
    /// The position to move
    #[clap(value_parser = parse_position_id)]
    position: EntityId,

    /// The unit to move it to
    #[clap(value_parser = parse_unit_id)]
    unit: EntityId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Position {
    #[instrument(skip(chart))]
    pub fn run(self, chart: &mut OrgChart) -> anyhow::Result<()> {
        let digits = chart.repository().config().digits();

        if !self.yes {
            println!(
                "Will move position {} to unit {}",
                self.position.display(digits),
                self.unit.display(digits)
            );
            prompt_to_proceed()?;
        }

        let previous = chart.move_position(self.position, self.unit)?;

        println!(
            "{}",
            format!(
                "✅ Moved {} from {} to {}",
                self.position.display(digits),
                previous.display(digits),
                self.unit.display(digits)
            )
            .success()
        );
        print_result(chart, Some(self.unit));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use orgchart::storage::ChartError;

    use super::*;
    use crate::cli::tests::{chart, id};

    #[test]
    fn moving_defaults_to_one_level_below_the_parent() {
        let mut chart = chart();
        let command = Unit {
            unit: id("O-007"),
            parent: Some(id("O-003")),
            level: None,
            yes: true,
        };

        command.run(&mut chart).unwrap();

        let moved = chart.repository().unit(id("O-007")).unwrap();
        assert_eq!(moved.parent_id, Some(id("O-003")));
        assert_eq!(moved.level, 3);
        assert_eq!(chart.find_node(id("O-003")).unwrap().employee_count, 2);
    }

    #[test]
    fn without_a_parent_only_candidates_are_listed() {
        let mut chart = chart();
        let before = chart.repository().clone();
        let command = Unit {
            unit: id("O-004"),
            parent: None,
            level: None,
            yes: true,
        };

        command.run(&mut chart).unwrap();

        assert_eq!(chart.repository(), &before);
    }

    #[test]
    fn cyclic_moves_are_reported() {
        let mut chart = chart();
        let command = Unit {
            unit: id("O-002"),
            parent: Some(id("O-007")),
            level: None,
            yes: true,
        };

        let error = command.run(&mut chart).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<ChartError>(),
            Some(ChartError::Move(_))
        ));
    }

    #[test]
    fn positions_move_between_units() {
        let mut chart = chart();
        let command = Position {
            position: id("S-008"),
            unit: id("O-004"),
            yes: true,
        };

        command.run(&mut chart).unwrap();

        assert_eq!(
            chart
                .repository()
                .position(id("S-008"))
                .unwrap()
                .organizational_unit_id,
            id("O-004")
        );
    }
}
