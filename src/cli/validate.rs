use clap::Parser;
use orgchart::{Repository, domain::Issue};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
pub struct Command {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(repository))]
    pub fn run(self, repository: &Repository) -> anyhow::Result<()> {
        let issues = repository.validate();

        if !self.quiet {
            match self.output {
                OutputFormat::Table => print_table(&issues),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
            }
        }

        if !issues.is_empty() {
            anyhow::bail!("Validation found {} issue(s)", issues.len());
        }
        Ok(())
    }
}

fn print_table(issues: &[Issue]) {
    if issues.is_empty() {
        println!("{}", "✅ No issues found".success());
        return;
    }

    println!(
        "{}",
        format!("⚠️  {} issue(s) found:", issues.len()).warning()
    );
    for issue in issues {
        println!("  • {issue}");
    }
}
