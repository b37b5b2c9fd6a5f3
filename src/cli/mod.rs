// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands a config to the matching Layer 2 use case and
// prints what came back. No corpus logic lives here.

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{Commands, EvaluateArgs, GenerateArgs, StatsArgs, TasksArgs, ValidateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "form-corpus",
    version = "0.1.0",
    about = "Validate, balance and persist a synthetic form-definition corpus."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => run_generate(args),
            Commands::Tasks(args)    => run_tasks(args),
            Commands::Validate(args) => run_validate(args),
            Commands::Stats(args)    => run_stats(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::{GenerateConfig, GenerateUseCase};
    use crate::infra::inbox::DirectoryGenerator;

    let config: GenerateConfig = args.into();
    let generator = DirectoryGenerator::new(config.inbox_dir.clone());
    let summary = GenerateUseCase::new(config, generator).execute()?;

    println!(
        "Committed {} batch(es), abandoned {}. Accepted {} form(s), rejected {}. Generated partition: {} form(s).",
        summary.batches_committed,
        summary.batches_abandoned,
        summary.forms_accepted,
        summary.forms_rejected,
        summary.corpus_size,
    );
    Ok(())
}

fn run_tasks(args: TasksArgs) -> Result<()> {
    use crate::application::tasks_use_case::TasksUseCase;
    use crate::corpus::instructions::TemplateInstructionWriter;

    let summary = TasksUseCase::new(args.into(), TemplateInstructionWriter::new()).execute()?;
    println!(
        "Stamped {}/{} form(s); {} masked task(s); {} form(s) kept their previous tasks.",
        summary.forms_stamped,
        summary.forms_total,
        summary.tasks_masked,
        summary.forms_skipped,
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    use crate::application::report_use_case::validate_file;

    let report = validate_file(&args.file, args.strict)?;
    for form in &report.forms {
        let verdict = if form.is_valid() { "ok" } else { "REJECTED" };
        println!("{:<24} {}", form.form_id, verdict);
        for v in &form.violations {
            println!("    {}", v);
        }
        for w in &form.warnings {
            println!("    warning: {}", w);
        }
    }
    println!("\n{} accepted, {} rejected", report.accepted(), report.rejected());

    if report.rejected() > 0 {
        bail!("{} form(s) failed validation", report.rejected());
    }
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    use crate::application::report_use_case::corpus_stats;

    let report = corpus_stats(&args.paths.into())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.manual.total_forms > 0 {
        println!("{}", report.manual.render("Hand-authored forms"));
    }
    if report.generated.total_forms > 0 {
        println!("{}", report.generated.render("Generated forms"));
    }
    println!("{}", report.combined.render("All forms"));
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let result = EvaluateUseCase::new(args.paths.into()).evaluate(&args.form_id, &args.submission)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for field in &result.field_results {
        let mark = if field.matched { "✓" } else { "✗" };
        let kind = if field.required { "required" } else { "optional" };
        println!("{} {:<24} ({}, {})", mark, field.field_id, field.kind, kind);
    }
    println!(
        "\nAccuracy {}%  (required {}%, optional {}%)",
        result.accuracy, result.required_field_score, result.optional_field_score,
    );
    if !result.missing_fields.is_empty() {
        println!("Missing: {}", result.missing_fields.join(", "));
    }
    if !result.extra_fields.is_empty() {
        println!("Extra:   {}", result.extra_fields.join(", "));
    }
    Ok(())
}
