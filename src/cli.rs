use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
};

mod add;
mod chain;
mod config;
mod delete;
mod merge;
mod r#move;
mod reports;
mod show;
mod terminal;
mod tree;
mod validate;

use clap::ArgAction;
use orgchart::{
    Config, EntityId, EntityKind, OrgChart, Repository, domain::OrgUnitNode, storage::Dataset,
};

use self::terminal::Colorize;

/// Parse an identifier, accepting a lowercase prefix.
///
/// This is a CLI boundary function; `o-12` and `O-012` name the same unit.
fn parse_id(s: &str) -> Result<EntityId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

fn parse_as(kind: EntityKind, s: &str) -> Result<EntityId, String> {
    EntityId::parse_as(kind, &s.to_uppercase()).map_err(|e| format!("{e}"))
}

fn parse_unit_id(s: &str) -> Result<EntityId, String> {
    parse_as(EntityKind::Unit, s)
}

fn parse_position_id(s: &str) -> Result<EntityId, String> {
    parse_as(EntityKind::Position, s)
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The YAML dataset to load the organization from
    #[arg(short, long, default_value = "org.yaml", global = true)]
    data: PathBuf,

    /// The engine configuration file
    #[arg(short, long, default_value = "orgchart.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.unwrap_or_default().run(&self.data, &self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Print the organization tree (default)
    Tree(tree::Command),

    /// Show details of a unit, position, classification or employee
    Show(show::Command),

    /// Print the chain of units from a unit up to the root
    Chain(chain::Command),

    /// Print the reporting line of a position or employee
    Reports(reports::Command),

    /// Move a unit under a new parent
    Move(r#move::Unit),

    /// Move a position to another unit
    MovePosition(r#move::Position),

    /// Merge a unit into another unit
    ///
    /// Units at the same level are consolidated: the source's contents move
    /// to the target and the source is removed. Otherwise the source is
    /// nested under the target with its subtree intact.
    Merge(merge::Unit),

    /// Merge a position into another unit
    MergePosition(merge::Position),

    /// Delete a unit together with everything below it
    Delete(delete::Unit),

    /// Delete a single position
    DeletePosition(delete::Position),

    /// Add a unit
    Add(add::Command),

    /// Check the dataset for broken references, cycles and level gaps
    Validate(validate::Command),

    /// Show or modify configuration settings
    Config(config::Command),
}

impl Default for Command {
    fn default() -> Self {
        Self::Tree(tree::Command::default())
    }
}

impl Command {
    fn run(self, data: &Path, config_path: &Path) -> anyhow::Result<()> {
        if let Self::Config(command) = self {
            return command.run(config_path);
        }

        let config = Config::load_or_default(config_path).map_err(|e| anyhow::anyhow!("{e}"))?;

        if let Self::Validate(command) = self {
            let repository = load_repository(data, config)?;
            return command.run(&repository);
        }

        let mut chart = OrgChart::load(data, config)?;
        match self {
            Self::Tree(command) => command.run(&chart)?,
            Self::Show(command) => command.run(&chart)?,
            Self::Chain(command) => command.run(&chart)?,
            Self::Reports(command) => command.run(&chart)?,
            Self::Move(command) => command.run(&mut chart)?,
            Self::MovePosition(command) => command.run(&mut chart)?,
            Self::Merge(command) => command.run(&mut chart)?,
            Self::MergePosition(command) => command.run(&mut chart)?,
            Self::Delete(command) => command.run(&mut chart)?,
            Self::DeletePosition(command) => command.run(&mut chart)?,
            Self::Add(command) => command.run(&mut chart)?,
            Self::Validate(_) | Self::Config(_) => unreachable!("handled above"),
        }
        Ok(())
    }
}

fn load_repository(data: &Path, config: Config) -> anyhow::Result<Repository> {
    Ok(Dataset::load(data)?.into_repository(config)?)
}

fn prompt_to_proceed() -> io::Result<()> {
    eprint!("\nProceed? (y/N) ");
    let stdin = std::io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    if !line.trim().eq_ignore_ascii_case("y") {
        println!("Cancelled");
        std::process::exit(130);
    }
    Ok(())
}

/// Prints the part of the tree a mutation touched, followed by a reminder
/// that nothing was written back.
fn print_result(chart: &OrgChart, focus: Option<EntityId>) {
    let node: &OrgUnitNode = focus
        .and_then(|id| chart.find_node(id))
        .unwrap_or_else(|| chart.tree());
    let options = tree::RenderOptions::new(chart.repository());
    println!("\n{}", tree::render(node, &options));
    println!("{}", "The dataset file was not modified.".dim());
}
