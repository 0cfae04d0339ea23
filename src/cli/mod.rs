//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::eval::PredictionRule;
use crate::risk::KeyMode;

/// fixrisk - Rank files by defect risk from their git history.
#[derive(Parser)]
#[command(name = "fixrisk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score files by defect risk
    #[command(alias = "risk")]
    Score(ScoreArgs),

    /// Score files and compare the prediction with ground truth
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Run every row of a batch file
    Batch(BatchArgs),

    /// List fix commits and the files they touched
    Fixes(RunArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

/// Repository, branch and window of a run.
#[derive(Args, Default)]
pub struct RunArgs {
    /// Repository URL or local path
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Checkout destination for remote repositories
    #[arg(long)]
    pub clone_to: Option<PathBuf>,

    /// Branch to analyze (defaults to HEAD)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// How files are keyed in the output
    #[arg(short, long, value_enum)]
    pub key: Option<KeyArg>,
}

impl RunArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(repo) = &self.repo {
            config.run.repository = repo.clone();
        }
        if let Some(clone_to) = &self.clone_to {
            config.run.clone_to = Some(clone_to.clone());
        }
        if let Some(branch) = &self.branch {
            config.run.branch = Some(branch.clone());
        }
        if let Some(from) = &self.from {
            config.run.from_date = Some(from.clone());
        }
        if let Some(to) = &self.to {
            config.run.to_date = Some(to.clone());
        }
        if let Some(key) = self.key {
            config.output.key = key.into();
        }
    }
}

#[derive(Args)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Show only the N highest-risk files
    #[arg(short = 'n', long)]
    pub top: Option<usize>,
}

/// How predictions are drawn from scores.
#[derive(Args, Default)]
pub struct PredictionArgs {
    /// Predict only the N highest-risk files
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Predict only files scoring above this
    #[arg(long, default_value = "0.0")]
    pub min_score: f64,
}

impl PredictionArgs {
    pub fn rule(&self) -> PredictionRule {
        PredictionRule {
            min_score: self.min_score,
            top: self.top,
        }
    }
}

#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Known-defective files: one path per line, or CSV with a modified_files column
    #[arg(short, long)]
    pub ground_truth: PathBuf,

    #[command(flatten)]
    pub prediction: PredictionArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Batch file with [[run]] tables
    pub file: PathBuf,

    /// Checkout destination for rows that do not set clone_to
    #[arg(long)]
    pub clone_to: Option<PathBuf>,

    /// How files are keyed in the output
    #[arg(short, long, value_enum)]
    pub key: Option<KeyArg>,

    #[command(flatten)]
    pub prediction: PredictionArgs,
}

#[derive(Args)]
pub struct InitArgs {
    /// Destination of the configuration file
    #[arg(default_value = "fixrisk.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

impl From<OutputFormat> for crate::output::Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Self::Json,
            OutputFormat::Markdown => Self::Markdown,
            OutputFormat::Text => Self::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeyArg {
    /// Full repository-relative path
    Path,
    /// File name only (files sharing a name are summed)
    Basename,
}

impl From<KeyArg> for KeyMode {
    fn from(key: KeyArg) -> Self {
        match key {
            KeyArg::Path => KeyMode::Path,
            KeyArg::Basename => KeyMode::Basename,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_format_json() {
        let cli = Cli::try_parse_from(["fixrisk", "-f", "json", "score"]).unwrap();
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn test_cli_format_after_subcommand() {
        let cli = Cli::try_parse_from(["fixrisk", "score", "--format", "markdown"]).unwrap();
        assert!(matches!(cli.format, Some(OutputFormat::Markdown)));
    }

    #[test]
    fn test_cli_format_defaults_to_config() {
        let cli = Cli::try_parse_from(["fixrisk", "score"]).unwrap();
        assert!(cli.format.is_none());
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::try_parse_from(["fixrisk", "-c", "fixrisk.toml", "score"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("fixrisk.toml")));
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["fixrisk", "-v", "score"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_command_score() {
        let cli = Cli::try_parse_from([
            "fixrisk", "score", "--repo", "https://github.com/o/r", "--branch", "main",
            "--from", "2024-01-01", "--to", "2024-03-31", "--key", "basename", "-n", "10",
        ])
        .unwrap();
        let Command::Score(args) = cli.command else {
            panic!("expected score command");
        };
        assert_eq!(args.run.repo.as_deref(), Some("https://github.com/o/r"));
        assert_eq!(args.run.key, Some(KeyArg::Basename));
        assert_eq!(args.top, Some(10));
    }

    #[test]
    fn test_command_score_alias() {
        let cli = Cli::try_parse_from(["fixrisk", "risk"]).unwrap();
        assert!(matches!(cli.command, Command::Score(_)));
    }

    #[test]
    fn test_command_evaluate_requires_ground_truth() {
        assert!(Cli::try_parse_from(["fixrisk", "evaluate"]).is_err());

        let cli = Cli::try_parse_from([
            "fixrisk", "eval", "-g", "truth.csv", "--min-score", "0.25", "--top", "5",
        ])
        .unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate command");
        };
        assert_eq!(args.ground_truth, PathBuf::from("truth.csv"));
        let rule = args.prediction.rule();
        assert_eq!(rule.min_score, 0.25);
        assert_eq!(rule.top, Some(5));
    }

    #[test]
    fn test_command_batch() {
        let cli = Cli::try_parse_from(["fixrisk", "batch", "runs.toml", "--clone-to", "/tmp/x"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        assert_eq!(args.file, PathBuf::from("runs.toml"));
        assert_eq!(args.clone_to, Some(PathBuf::from("/tmp/x")));
        assert_eq!(args.prediction.min_score, 0.0);
    }

    #[test]
    fn test_command_init_default_path() {
        let cli = Cli::try_parse_from(["fixrisk", "init"]).unwrap();
        let Command::Init(args) = cli.command else {
            panic!("expected init command");
        };
        assert_eq!(args.path, PathBuf::from("fixrisk.toml"));
        assert!(!args.force);
    }

    #[test]
    fn test_run_args_apply_overrides_config() {
        let mut config = Config::default();
        config.run.branch = Some("develop".to_string());
        let args = RunArgs {
            repo: Some("/srv/repo".to_string()),
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-31".to_string()),
            key: Some(KeyArg::Basename),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.run.repository, "/srv/repo");
        assert_eq!(config.run.branch.as_deref(), Some("develop"));
        assert_eq!(config.run.from_date.as_deref(), Some("2024-01-01"));
        assert_eq!(config.output.key, KeyMode::Basename);
    }
}
