use clap::Parser;
use orgchart::{EntityId, OrgChart};
use tracing::instrument;

use super::terminal::{Colorize, breadcrumb};

#[derive(Debug, Parser)]
pub struct Command {
    /// The unit to start from
    #[clap(value_parser = super::parse_unit_id)]
    unit: EntityId,

    /// Only show the unit and its parent
    #[arg(long)]
    compact: bool,

    /// List every unit on its own line with its level
    #[arg(long, short)]
    long: bool,
}

impl Command {
    #[instrument(level = "debug", skip(chart))]
    pub fn run(self, chart: &OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();
        let chain = repository.hierarchy_chain(self.unit);

        if chain.is_empty() {
            anyhow::bail!("unit {} not found", self.unit.display(digits));
        }

        if self.long {
            for (depth, unit) in chain.iter().rev().enumerate() {
                println!(
                    "{}{} {} {}",
                    "  ".repeat(depth),
                    unit.id.display(digits).to_string().dim(),
                    unit.name,
                    format!("(L{})", unit.level).dim()
                );
            }
        } else {
            println!("{}", breadcrumb(&chain, self.compact));
        }

        if chain.last().is_some_and(|top| !top.is_root()) {
            println!(
                "{}",
                "The chain does not reach the root unit; run `org validate` for details.".warning()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::{chart, id};

    #[test]
    fn chains_print_for_known_units() {
        let chart = chart();
        for long in [false, true] {
            let command = Command {
                unit: id("O-007"),
                compact: false,
                long,
            };
            command.run(&chart).unwrap();
        }
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let chart = chart();
        let command = Command {
            unit: id("O-042"),
            compact: true,
            long: false,
        };
        assert_eq!(
            command.run(&chart).unwrap_err().to_string(),
            "unit O-042 not found"
        );
    }
}
