//! fixrisk CLI - defect-risk ranking from git history.

use std::io::{stdout, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fixrisk::batch::{score_repository, BatchFile, BatchRunner};
use fixrisk::cli::{BatchArgs, Cli, Command, EvaluateArgs, InitArgs, RunArgs, ScoreArgs};
use fixrisk::config::Config;
use fixrisk::core::{Error, Result};
use fixrisk::eval::{evaluate_analysis, GroundTruth};
use fixrisk::git::GitRepo;
use fixrisk::output::{self, EvaluatedAnalysis, FixList, Format, Render};
use fixrisk::risk::Analyzer;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };

    let format: Format = cli.format.map_or(config.output.format.into(), Into::into);
    output::set_color(config.output.color && !cli.no_color && stdout().is_terminal());

    match cli.command {
        Command::Score(args) => score(args, config, format),
        Command::Evaluate(args) => evaluate(args, config, format),
        Command::Batch(args) => batch(args, config, format),
        Command::Fixes(args) => fixes(args, config, format),
        Command::Init(args) => init(args),
    }
}

fn score(args: ScoreArgs, mut config: Config, format: Format) -> Result<()> {
    args.run.apply(&mut config);
    let analyzer = Analyzer::from_config(&config)?;
    let mut analysis = score_repository(&config.run, &analyzer)?;
    if let Some(top) = args.top.or(config.output.top) {
        analysis.limit(top);
    }
    emit(format, &analysis)
}

fn evaluate(args: EvaluateArgs, mut config: Config, format: Format) -> Result<()> {
    args.run.apply(&mut config);
    let analyzer = Analyzer::from_config(&config)?;
    config.run.validate()?;
    let truth = GroundTruth::load(&args.ground_truth)?;
    let analysis = score_repository(&config.run, &analyzer)?;
    let evaluation = evaluate_analysis(&analysis, &truth, &args.prediction.rule());
    emit(
        format,
        &EvaluatedAnalysis {
            analysis: &analysis,
            evaluation: &evaluation,
        },
    )
}

fn batch(args: BatchArgs, mut config: Config, format: Format) -> Result<()> {
    if let Some(key) = args.key {
        config.output.key = key.into();
    }
    let analyzer = Analyzer::from_config(&config)?;
    let file = BatchFile::load(&args.file)?;
    let report = BatchRunner::new(&analyzer)
        .with_rule(args.prediction.rule())
        .with_default_clone_to(args.clone_to.or(config.run.clone_to.clone()))
        .run(&file);

    emit(format, &report)?;
    if report.is_success() {
        Ok(())
    } else {
        Err(Error::analysis(format!(
            "{} of {} batch rows failed",
            report.failures(),
            report.rows.len()
        )))
    }
}

fn fixes(args: RunArgs, mut config: Config, format: Format) -> Result<()> {
    args.apply(&mut config);
    let analyzer = Analyzer::from_config(&config)?;
    let window = config.run.validate()?;
    let repo = GitRepo::for_run(&config.run)?;
    let history = repo.history(config.run.branch.as_deref())?;
    let list = FixList(analyzer.fix_commits(&history, &window)?);
    emit(format, &list)
}

fn init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(Error::config(format!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        )));
    }
    std::fs::write(&args.path, Config::default_toml())?;
    eprintln!("Wrote {}", args.path.display());
    Ok(())
}

fn emit<T: Render>(format: Format, data: &T) -> Result<()> {
    let mut out = stdout().lock();
    format.render(data, &mut out)?;
    out.flush()?;
    Ok(())
}
