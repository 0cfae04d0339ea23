//! Output formatters for analysis results.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::batch::BatchReport;
use crate::core::Result;
use crate::eval::EvaluationReport;
use crate::risk::{Analysis, FixCommit};

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    Markdown,
    #[default]
    Text,
}

impl From<crate::config::OutputFormat> for Format {
    fn from(format: crate::config::OutputFormat) -> Self {
        match format {
            crate::config::OutputFormat::Json => Format::Json,
            crate::config::OutputFormat::Markdown => Format::Markdown,
            crate::config::OutputFormat::Text => Format::Text,
        }
    }
}

/// Turn colored output on or off for the whole process.
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}

/// A result that can be rendered in every [`Format`].
pub trait Render: Serialize {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl Format {
    pub fn render<T: Render, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => format_json(data, writer),
            Format::Markdown => data.write_markdown(writer),
            Format::Text => data.write_text(writer),
        }
    }
}

fn format_json<T: Serialize, W: Write>(data: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, data)?;
    writeln!(writer)?;
    Ok(())
}

fn score(value: f64) -> String {
    format!("{value:.4}")
}

fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

fn short_id(id: &str) -> String {
    id.chars().take(10).collect()
}

/// Escape a value for a markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

impl Render for Analysis {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{} {}", "Defect risk".bold(), self.window)?;
        if let Some(reference) = self.reference_time {
            writeln!(writer, "Reference time: {}", reference.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        let s = &self.summary;
        writeln!(
            writer,
            "Commits: {} ({} fixes), eligible changes: {}, developers: {}",
            s.commits_scanned, s.fix_commits, s.eligible_changes, s.developers
        )?;

        if self.is_empty() {
            writeln!(writer, "\nNo files with activity in this window.")?;
            return Ok(());
        }

        writeln!(writer, "\n{}", "Weights".bold())?;
        for w in self.weights.iter() {
            writeln!(writer, "  {:<18} {}", w.signal.as_str(), score(w.weight))?;
        }

        let max = self.ranking.first().map_or(0.0, |r| r.score);
        writeln!(writer, "\n{}", format!("  {:>8}  {}", "SCORE", self.key_mode.as_str().to_uppercase()).bold())?;
        for entry in &self.ranking {
            let value = format!("{:>8}", score(entry.score));
            let value = if entry.score > 0.0 && entry.score >= max * 0.5 {
                value.red()
            } else if entry.score > 0.0 {
                value.yellow()
            } else {
                value.dimmed()
            };
            writeln!(writer, "  {value}  {}", entry.key)?;
        }
        Ok(())
    }

    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Defect risk\n")?;
        writeln!(writer, "**Window**: {}\n", self.window)?;
        if let Some(reference) = self.reference_time {
            writeln!(writer, "**Reference time**: {}\n", reference.to_rfc3339())?;
        }
        let s = &self.summary;
        writeln!(writer, "| Commits | Fix commits | Eligible changes | Files | Developers |")?;
        writeln!(writer, "| --- | --- | --- | --- | --- |")?;
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} |\n",
            s.commits_scanned, s.fix_commits, s.eligible_changes, s.files_scored, s.developers
        )?;

        if self.is_empty() {
            writeln!(writer, "_No files with activity in this window._")?;
            return Ok(());
        }

        writeln!(writer, "## Weights\n")?;
        writeln!(writer, "| Signal | Variance | Weight |")?;
        writeln!(writer, "| --- | --- | --- |")?;
        for w in self.weights.iter() {
            writeln!(writer, "| {} | {} | {} |", w.signal, score(w.variance), score(w.weight))?;
        }

        writeln!(writer, "\n## Ranking\n")?;
        writeln!(writer, "| Rank | {} | Score |", self.key_mode.as_str())?;
        writeln!(writer, "| --- | --- | --- |")?;
        for (i, entry) in self.ranking.iter().enumerate() {
            writeln!(writer, "| {} | {} | {} |", i + 1, cell(&entry.key), score(entry.score))?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl Render for EvaluationReport {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Total files in ground truth: {}", self.ground_truth_total)?;
        writeln!(writer, "Total files predicted: {}", self.predicted_total)?;

        writeln!(writer, "\n{}", "False positives (predicted, not in ground truth):".bold())?;
        for path in &self.false_positives {
            writeln!(writer, "  {}", path.yellow())?;
        }
        writeln!(writer, "\n{}", "False negatives (in ground truth, not predicted):".bold())?;
        for path in &self.false_negatives {
            writeln!(writer, "  {}", path.red())?;
        }

        writeln!(writer, "\nPrecision: {}", ratio(self.precision))?;
        writeln!(writer, "Recall: {}", ratio(self.recall))?;
        writeln!(writer, "F1 Score: {}", ratio(self.f1))?;
        Ok(())
    }

    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Evaluation\n")?;
        writeln!(writer, "| Ground truth | Predicted | TP | FP | FN | Precision | Recall | F1 |")?;
        writeln!(writer, "| --- | --- | --- | --- | --- | --- | --- | --- |")?;
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            self.ground_truth_total,
            self.predicted_total,
            self.true_positives.len(),
            self.false_positives.len(),
            self.false_negatives.len(),
            ratio(self.precision),
            ratio(self.recall),
            ratio(self.f1)
        )?;
        for (title, paths) in [
            ("False positives", &self.false_positives),
            ("False negatives", &self.false_negatives),
        ] {
            writeln!(writer, "## {title}\n")?;
            if paths.is_empty() {
                writeln!(writer, "_None_\n")?;
            } else {
                for path in paths {
                    writeln!(writer, "- `{path}`")?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

/// An analysis together with its evaluation.
#[derive(Debug, Serialize)]
pub struct EvaluatedAnalysis<'a> {
    pub analysis: &'a Analysis,
    pub evaluation: &'a EvaluationReport,
}

impl Render for EvaluatedAnalysis<'_> {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.analysis.write_text(writer)?;
        writeln!(writer)?;
        self.evaluation.write_text(writer)
    }

    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.analysis.write_markdown(writer)?;
        self.evaluation.write_markdown(writer)
    }
}

impl Render for BatchReport {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        for row in &self.rows {
            writeln!(writer, "{} {}", format!("[{}]", row.row).bold(), row.repository)?;
            if let Some(error) = &row.error {
                writeln!(writer, "  {} {error}", "failed:".red())?;
            }
            if let Some(analysis) = &row.analysis {
                analysis.write_text(writer)?;
            }
            if let Some(evaluation) = &row.evaluation {
                writeln!(writer)?;
                evaluation.write_text(writer)?;
            }
            writeln!(writer)?;
        }
        writeln!(
            writer,
            "{} rows, {} failed",
            self.rows.len(),
            self.failures()
        )?;
        Ok(())
    }

    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Batch\n")?;
        writeln!(writer, "| Row | Repository | Files | Precision | Recall | F1 | Error |")?;
        writeln!(writer, "| --- | --- | --- | --- | --- | --- | --- |")?;
        for row in &self.rows {
            let files = row
                .analysis
                .as_ref()
                .map_or("-".to_string(), |a| a.summary.files_scored.to_string());
            let (p, r, f) = row.evaluation.as_ref().map_or(
                ("-".to_string(), "-".to_string(), "-".to_string()),
                |e| (ratio(e.precision), ratio(e.recall), ratio(e.f1)),
            );
            writeln!(
                writer,
                "| {} | {} | {files} | {p} | {r} | {f} | {} |",
                row.row,
                cell(&row.repository),
                cell(row.error.as_deref().unwrap_or("-"))
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// Fix commits of a window.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct FixList(pub Vec<FixCommit>);

impl Render for FixList {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.0.is_empty() {
            writeln!(writer, "No fix commits in this window.")?;
            return Ok(());
        }
        for fix in &self.0 {
            let short = short_id(&fix.id);
            let date = fix
                .timestamp
                .map_or("-".to_string(), |t| t.format("%Y-%m-%d").to_string());
            writeln!(writer, "{} {date} {}", short.yellow(), fix.summary)?;
            for file in &fix.files {
                writeln!(writer, "    {file}")?;
            }
        }
        Ok(())
    }

    fn write_markdown<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Fix commits\n")?;
        if self.0.is_empty() {
            writeln!(writer, "_No items_")?;
            return Ok(());
        }
        writeln!(writer, "| Commit | Date | Summary | Files |")?;
        writeln!(writer, "| --- | --- | --- | --- |")?;
        for fix in &self.0 {
            let date = fix
                .timestamp
                .map_or("-".to_string(), |t| t.format("%Y-%m-%d").to_string());
            writeln!(
                writer,
                "| {} | {date} | {} | {} |",
                short_id(&fix.id),
                cell(&fix.summary),
                cell(&fix.files.join(", "))
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
