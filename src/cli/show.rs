use clap::Parser;
use orgchart::{
    EntityId, EntityKind, OrgChart, Repository,
    domain::{Employee, JobClassification, OrganizationalUnit, Position},
};
use serde_json::json;
use tracing::instrument;

use super::terminal::{Colorize, breadcrumb};

#[derive(Debug, Parser)]
pub struct Command {
    /// The identifier of the record to display (O-, S-, C- or P-)
    #[clap(value_parser = super::parse_id)]
    id: EntityId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(self, chart), fields(id = %self.id))]
    pub fn run(self, chart: &OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();
        let not_found = || anyhow::anyhow!("{} {} not found", self.id.kind(), self.id.display(digits));

        match (self.id.kind(), self.output) {
            (EntityKind::Unit, OutputFormat::Pretty) => {
                let unit = repository.unit(self.id).ok_or_else(not_found)?;
                show_unit(chart, unit, digits);
            }
            (EntityKind::Position, OutputFormat::Pretty) => {
                let position = repository.position(self.id).ok_or_else(not_found)?;
                show_position(repository, position, digits);
            }
            (EntityKind::Classification, OutputFormat::Pretty) => {
                let classification = repository.classification(self.id).ok_or_else(not_found)?;
                show_classification(repository, classification, digits);
            }
            (EntityKind::Employee, OutputFormat::Pretty) => {
                let employee = repository.employee(self.id).ok_or_else(not_found)?;
                show_employee(repository, employee, digits)?;
            }
            (_, OutputFormat::Json) => {
                let value = record_json(chart, self.id)?.ok_or_else(not_found)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }

        Ok(())
    }
}

fn record_json(chart: &OrgChart, id: EntityId) -> serde_json::Result<Option<serde_json::Value>> {
    let repository = chart.repository();
    Ok(match id.kind() {
        EntityKind::Unit => match repository.unit(id) {
            Some(unit) => Some(json!({
                "unit": unit,
                "chain": repository
                    .hierarchy_chain(id)
                    .iter()
                    .map(|u| u.id)
                    .collect::<Vec<_>>(),
                "employee_count": chart.find_node(id).map(|node| node.employee_count),
            })),
            None => None,
        },
        EntityKind::Position => repository.position(id).map(serde_json::to_value).transpose()?,
        EntityKind::Classification => repository
            .classification(id)
            .map(serde_json::to_value)
            .transpose()?,
        EntityKind::Employee => match repository.employee(id) {
            Some(employee) => Some(json!({
                "employee": employee,
                "unit": repository.employee_unit(id).ok().flatten().map(|u| u.id),
                "line_manager": repository.line_manager(id).ok().flatten().map(|e| e.id),
            })),
            None => None,
        },
    })
}

fn show_unit(chart: &OrgChart, unit: &OrganizationalUnit, digits: usize) {
    let repository = chart.repository();

    println!("# {} {}", unit.id.display(digits), unit.name);
    println!("{}\n", breadcrumb(&repository.hierarchy_chain(unit.id), false).dim());

    println!("{}", "Details".dim());
    println!("  Code:        {}", unit.code);
    if !unit.abbreviation.is_empty() {
        println!("  Abbrev.:     {}", unit.abbreviation);
    }
    println!("  Type:        {} (level {})", unit.unit_type, unit.level);
    println!("  Status:      {:?}", unit.status);
    println!("  Cost center: {}", unit.cost_center);
    match unit.valid_to {
        Some(to) => println!("  Valid:       {} to {to}", unit.valid_from),
        None => println!("  Valid:       from {}", unit.valid_from),
    }
    if let Some(manager) = unit.manager_position_id {
        let holder = repository
            .incumbent_name(manager)
            .unwrap_or_else(|| "vacant".to_string());
        println!("  Manager:     {} ({holder})", manager.display(digits));
    }
    match chart.find_node(unit.id) {
        Some(node) => println!("  Staffed:     {}", node.employee_count),
        None => println!("  {}", "Not part of the active organization".warning()),
    }

    let positions: Vec<_> = repository.positions_in(unit.id).collect();
    if !positions.is_empty() {
        println!("\n{}", "Positions".dim());
        for position in positions {
            let holder = repository
                .incumbent_name(position.id)
                .unwrap_or_else(|| format!("{:?}", position.hiring_status).to_lowercase());
            println!(
                "  • {} {} ({holder})",
                position.id.display(digits),
                position.title
            );
        }
    }

    let children: Vec<_> = repository.child_units(unit.id).collect();
    if !children.is_empty() {
        println!("\n{}", "Units".dim());
        for child in children {
            println!("  • {} {}", child.id.display(digits), child.name);
        }
    }
}

fn show_position(repository: &Repository, position: &Position, digits: usize) {
    println!("# {} {}", position.id.display(digits), position.title);
    println!(
        "{}\n",
        breadcrumb(
            &repository.hierarchy_chain(position.organizational_unit_id),
            false
        )
        .dim()
    );

    println!("{}", "Details".dim());
    println!("  Code:      {}", position.code);
    println!("  FTE:       {}", position.fte);
    println!("  Hiring:    {:?}", position.hiring_status);
    println!("  Work mode: {:?}", position.work_mode);
    if !position.office_location.is_empty() {
        println!("  Office:    {}", position.office_location);
    }
    if !position.focus_area.is_empty() {
        println!("  Focus:     {}", position.focus_area);
    }
    if let Some(classification) = position
        .job_classification_id
        .and_then(|id| repository.classification(id))
    {
        println!(
            "  Role:      {} {}",
            classification.id.display(digits),
            classification.title
        );
    }
    match position.incumbent_id {
        Some(employee) => println!(
            "  Held by:   {} {}",
            employee.display(digits),
            repository
                .incumbent_name(position.id)
                .unwrap_or_else(|| "(missing)".warning())
        ),
        None => println!("  Held by:   {}", "vacant".warning()),
    }
    if let Some(manager) = position.reports_to_id {
        println!("  Reports to: {}", manager.display(digits));
    }
}

fn show_classification(
    repository: &Repository,
    classification: &JobClassification,
    digits: usize,
) {
    println!(
        "# {} {}\n",
        classification.id.display(digits),
        classification.title
    );
    println!("{}", "Details".dim());
    println!("  Family:    {}", classification.family);
    println!("  Level:     {}", classification.level);
    println!("  Pay grade: {}", classification.pay_grade);

    if !classification.requirements.is_empty() {
        println!("\n{}", "Requirements".dim());
        for requirement in &classification.requirements {
            println!("  • {requirement}");
        }
    }

    let positions: Vec<_> = repository
        .positions()
        .filter(|p| p.job_classification_id == Some(classification.id))
        .collect();
    if !positions.is_empty() {
        println!("\n{}", "Positions".dim());
        for position in positions {
            println!("  • {} {}", position.id.display(digits), position.title);
        }
    }
}

fn show_employee(repository: &Repository, employee: &Employee, digits: usize) -> anyhow::Result<()> {
    println!("# {} {}\n", employee.id.display(digits), employee.full_name());
    println!("{}", "Details".dim());
    println!("  Code:    {}", employee.code);
    if !employee.email.is_empty() {
        println!("  Email:   {}", employee.email);
    }
    println!("  Status:  {:?}", employee.status);
    if let Some(hired) = employee.hire_date {
        println!("  Hired:   {hired}");
    }

    match employee.position_id.and_then(|id| repository.position(id)) {
        Some(position) => {
            println!(
                "  Holds:   {} {}",
                position.id.display(digits),
                position.title
            );
        }
        None => println!("  Holds:   {}", "no position".warning()),
    }
    if let Some(unit) = repository.employee_unit(employee.id)? {
        println!(
            "  Unit:    {}",
            breadcrumb(&repository.hierarchy_chain(unit.id), false)
        );
    }
    if let Some(manager) = repository.line_manager(employee.id)? {
        println!(
            "  Manager: {} {}",
            manager.id.display(digits),
            manager.full_name()
        );
    }
    Ok(())
}
