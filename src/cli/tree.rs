use std::fmt::{self, Write};

use clap::Parser;
use orgchart::{
    EntityId, OrgChart, Repository,
    domain::{OrgUnitNode, Position},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
pub struct Command {
    /// Print the subtree below this unit instead of the whole organization
    #[clap(value_parser = super::parse_unit_id)]
    unit: Option<EntityId>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// List the positions in each unit
    #[arg(long, short)]
    positions: bool,

    /// Only print this many levels below the starting unit
    #[arg(long)]
    depth: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(self, chart))]
    pub fn run(self, chart: &OrgChart) -> anyhow::Result<()> {
        let repository = chart.repository();
        let digits = repository.config().digits();

        let node = match self.unit {
            Some(id) => chart.find_node(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "unit {} is not part of the active organization",
                    id.display(digits)
                )
            })?,
            None => chart.tree(),
        };

        match self.output {
            OutputFormat::Pretty => {
                let options = RenderOptions {
                    positions: self.positions,
                    max_depth: self.depth,
                    ..RenderOptions::new(repository)
                };
                print!("{}", render(node, &options));
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(node)?),
        }

        Ok(())
    }
}

pub struct RenderOptions<'a> {
    repository: &'a Repository,
    digits: usize,
    positions: bool,
    max_depth: Option<usize>,
}

impl<'a> RenderOptions<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self {
            repository,
            digits: repository.config().digits(),
            positions: false,
            max_depth: None,
        }
    }
}

enum Entry<'a> {
    Position(&'a Position),
    Unit(&'a OrgUnitNode),
}

/// Renders a subtree with box-drawing branches, one unit per line.
pub fn render(root: &OrgUnitNode, options: &RenderOptions<'_>) -> String {
    let mut out = String::new();
    render_into(&mut out, root, options).expect("writing to a String never fails");
    out
}

fn render_into(out: &mut String, root: &OrgUnitNode, options: &RenderOptions<'_>) -> fmt::Result {
    writeln!(out, "{}", unit_label(root, options.digits))?;
    render_children(out, root, options, "", 1)
}

fn render_children(
    out: &mut String,
    node: &OrgUnitNode,
    options: &RenderOptions<'_>,
    prefix: &str,
    depth: usize,
) -> fmt::Result {
    if options.max_depth.is_some_and(|max| depth > max) {
        return Ok(());
    }

    let mut entries = Vec::new();
    if options.positions {
        entries.extend(node.positions.iter().map(Entry::Position));
    }
    entries.extend(node.children.iter().map(Entry::Unit));

    let count = entries.len();
    for (index, entry) in entries.into_iter().enumerate() {
        let (branch, continuation) = if index + 1 == count {
            ("└─ ", "   ")
        } else {
            ("├─ ", "│  ")
        };
        match entry {
            Entry::Position(position) => {
                writeln!(
                    out,
                    "{prefix}{branch}{}",
                    position_label(position, options.repository, options.digits)
                )?;
            }
            Entry::Unit(child) => {
                writeln!(out, "{prefix}{branch}{}", unit_label(child, options.digits))?;
                render_children(
                    out,
                    child,
                    options,
                    &format!("{prefix}{continuation}"),
                    depth + 1,
                )?;
            }
        }
    }
    Ok(())
}

fn unit_label(node: &OrgUnitNode, digits: usize) -> String {
    let manager = node
        .manager_name
        .as_deref()
        .map(|name| format!(", led by {name}"))
        .unwrap_or_default();
    format!(
        "{} {} {}",
        node.id.display(digits).to_string().dim(),
        node.name.bold(),
        format!(
            "({} L{}, {} staffed{manager})",
            node.unit_type, node.level, node.employee_count
        )
        .dim()
    )
}

fn position_label(position: &Position, repository: &Repository, digits: usize) -> String {
    let holder = repository
        .incumbent_name(position.id)
        .unwrap_or_else(|| "vacant".warning());
    format!(
        "{} {} · {holder}",
        position.id.display(digits).to_string().dim(),
        position.title
    )
}
