use orgchart::{EntityId, OrgChart, domain::MergeMode};
use tracing::instrument;

use crate::cli::{
    parse_position_id, parse_unit_id, print_result, prompt_to_proceed, terminal::Colorize,
};

#[derive(Debug, clap::Parser)]
pub struct Unit {
    /// The unit to merge away
    #[clap(value_parser = parse_unit_id)]
    source: EntityId,

    /// The unit to merge into. Omit to list the allowed targets.
    #[clap(value_parser = parse_unit_id)]
    target: Option<EntityId>,

    /// Show what the merge would do without doing it
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

        let Some(target_id) = self.target else {
            let candidates = repository.merge_candidates(self.source)?;
            if candidates.is_empty() {
                println!(
                    "{}",
                    format!("{} cannot be merged into any unit", self.source.display(digits))
                        .warning()
                );
            } else {
                println!("{} can be merged into:", self.source.display(digits));
                for candidate in candidates {
                    println!(
                        "  • {} {} {}",
                        candidate.id.display(digits),
                        candidate.name,
                        format!("({} L{})", candidate.unit_type, candidate.level).dim()
                    );
                }
            }
            return Ok(());
        };

        repository.validate_merge(self.source, target_id)?;
        let (Some(source), Some(target)) = (repository.unit(self.source), repository.unit(target_id))
        else {
            anyhow::bail!("Unit {} not found", self.source.display(digits));
        };

        let mode = if source.level == target.level {
            MergeMode::Consolidate
        } else {
            MergeMode::Nest
        };

        if !self.yes || self.dry_run {
            match mode {
                MergeMode::Consolidate => {
                    let units = repository.child_units(self.source).count();
                    let positions = repository.positions_in(self.source).count();
                    println!(
                        "Will consolidate {} {} into {} {}: {units} unit(s) and {positions} position(s) move across, then {} is removed",
                        self.source.display(digits),
                        source.name,
                        target_id.display(digits),
                        target.name,
                        self.source.display(digits),
                    );
                }
                MergeMode::Nest => println!(
                    "Will nest {} {} (level {}) under {} {} (level {}) with its subtree intact",
                    self.source.display(digits),
                    source.name,
                    source.level,
                    target_id.display(digits),
                    target.name,
                    target.level,
                ),
            }
        }

        if self.dry_run {
            println!("{}", "Dry run: nothing was merged".dim());
            return Ok(());
        }
        if !self.yes {
            prompt_to_proceed()?;
        }

        let outcome = chart.merge_units(self.source, target_id)?;

        let verb = match outcome.mode {
            MergeMode::Consolidate => "Consolidated",
            MergeMode::Nest => "Nested",
        };
        println!(
            "{}",
            format!(
                "✅ {verb} {} into {}",
                self.source.display(digits),
                outcome.target.display(digits)
            )
            .success()
        );
        print_result(chart, Some(outcome.target));
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Position {
    /// The position to merge
    #[clap(value_parser = parse_position_id)]
    position: EntityId,

    /// The unit to merge it into
    #[clap(value_parser = parse_unit_id)]
    target: EntityId,

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
                "Will merge position {} into unit {}",
                self.position.display(digits),
                self.target.display(digits)
            );
            prompt_to_proceed()?;
        }

        chart.merge_position(self.position, self.target)?;

        println!(
            "{}",
            format!(
                "✅ Merged {} into {}",
                self.position.display(digits),
                self.target.display(digits)
            )
            .success()
        );
        print_result(chart, Some(self.target));
        Ok(())
    }
}
