use clap::Parser;
use orgchart::{EntityId, EntityKind, OrgChart, Repository, domain::Position};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Command {
    /// A position (S-) or employee (P-)
    #[clap(value_parser = super::parse_id)]
    id: EntityId,
}

impl Command {
    #[instrument(level = "debug", skip(chart))]
    pub fn run(self, chart: &OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();
        let position = resolve_position(repository, self.id)?;

        println!("{}", "Reporting line".dim());
        for (depth, step) in repository.reporting_chain(position).iter().rev().enumerate() {
            println!("{}{}", "  ".repeat(depth), line(repository, step, digits));
        }

        let reports: Vec<_> = repository.direct_reports(position).collect();
        if !reports.is_empty() {
            println!("\n{}", "Direct reports".dim());
            for report in reports {
                println!("  • {}", line(repository, report, digits));
            }
        }

        if self.id.kind() == EntityKind::Employee {
            match repository.line_manager(self.id)? {
                Some(manager) => println!(
                    "\nLine manager: {} {}",
                    manager.id.display(digits),
                    manager.full_name()
                ),
                None => println!("\n{}", "No line manager".warning()),
            }
        }

        Ok(())
    }
}

/// The position a report should start from: the position itself, or the one
/// an employee holds.
fn resolve_position(repository: &Repository, id: EntityId) -> anyhow::Result<EntityId> {
    let digits = repository.config().digits();
    let position = match id.kind() {
        EntityKind::Position => id,
        EntityKind::Employee => repository
            .employee(id)
            .ok_or_else(|| anyhow::anyhow!("employee {} not found", id.display(digits)))?
            .position_id
            .ok_or_else(|| anyhow::anyhow!("employee {} holds no position", id.display(digits)))?,
        kind => anyhow::bail!("expected a position or employee, got a {kind}"),
    };

    if repository.position(position).is_none() {
        anyhow::bail!("position {} not found", position.display(digits));
    }
    Ok(position)
}

fn line(repository: &Repository, position: &Position, digits: usize) -> String {
    let holder = repository
        .incumbent_name(position.id)
        .unwrap_or_else(|| "vacant".warning());
    format!(
        "{} {} ({holder})",
        position.id.display(digits).to_string().dim(),
        position.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::{chart, id};

    #[test]
    fn employees_resolve_to_their_position() {
        let chart = chart();
        let repository = chart.repository();

        assert_eq!(resolve_position(repository, id("P-004")).unwrap(), id("S-005"));
        assert_eq!(resolve_position(repository, id("S-003")).unwrap(), id("S-003"));
        assert_eq!(
            resolve_position(repository, id("P-007")).unwrap_err().to_string(),
            "employee P-007 holds no position"
        );
        assert!(resolve_position(repository, id("O-001")).is_err());
        assert!(resolve_position(repository, id("S-077")).is_err());
    }

    #[test]
    fn reports_print_for_positions_and_employees() {
        let chart = chart();
        for record in ["S-002", "P-004", "P-001"] {
            Command { id: id(record) }.run(&chart).unwrap();
        }
    }
}
