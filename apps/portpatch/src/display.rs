//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use portpatch_ops::OperationResult;
use portpatch_types::{
    ApplyReport, ColorChoice, PatchOutcome, PatchRecord, ResolutionReport, RunReport,
};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Run(report) => self.render_run_report(report),
            OperationResult::Resolve(report) => self.render_resolution(report),
            OperationResult::Apply(report) => self.render_apply_report(report),
        }
    }

    fn render_run_report(&self, report: &RunReport) -> io::Result<()> {
        let records: Vec<&PatchRecord> = report
            .download_failures
            .iter()
            .chain(&report.remote.records)
            .chain(&report.local.records)
            .collect();
        if !records.is_empty() {
            self.term.write_line(&self.outcome_table(&records).to_string())?;
        }

        if !report.unreachable.is_empty() {
            self.term.write_line(&format!(
                "Unreachable sources: {}",
                report.unreachable.join(", ")
            ))?;
        }

        self.render_tally(report.applied, report.skipped)?;
        if !report.download_failures.is_empty() {
            self.term.write_line(&format!(
                "{} patches could not be downloaded",
                report.download_failures.len()
            ))?;
        }
        self.term
            .write_line(&format!("Completed in {}ms", report.duration_ms))
    }

    fn render_apply_report(&self, report: &ApplyReport) -> io::Result<()> {
        if report.records.is_empty() {
            self.term
                .write_line(&format!("No {} patches to apply.", report.pass))?;
        } else {
            let records: Vec<&PatchRecord> = report.records.iter().collect();
            self.term.write_line(&self.outcome_table(&records).to_string())?;
        }
        self.render_tally(report.applied, report.skipped)
    }

    fn render_resolution(&self, report: &ResolutionReport) -> io::Result<()> {
        if report.patch_set.is_empty() {
            self.term.write_line("No patches resolved.")?;
        } else {
            let mut table = self.table(&["Order", "Source", "Patch", "Path"]);
            for (index, patch) in report.patch_set.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(index + 1),
                    Cell::new(&patch.source),
                    Cell::new(&patch.file_name),
                    Cell::new(patch.path.display()),
                ]);
            }
            self.term.write_line(&table.to_string())?;
        }

        for candidate in &report.failed {
            self.term.write_line(&format!(
                "Download failed: {}/{} ({})",
                candidate.source, candidate.file_name, candidate.url
            ))?;
        }
        if !report.unreachable.is_empty() {
            self.term.write_line(&format!(
                "Unreachable sources: {}",
                report.unreachable.join(", ")
            ))?;
        }

        self.term.write_line(&format!(
            "resolved {} of {} discovered patches at {}",
            report.patch_set.len(),
            report.discovered(),
            report.reference
        ))
    }

    fn render_tally(&self, applied: usize, skipped: usize) -> io::Result<()> {
        let style = if self.supports_color() {
            Style::new().bold()
        } else {
            Style::new()
        };
        self.term.write_line(
            &style
                .apply_to(format!("applied {applied}, skipped {skipped}"))
                .to_string(),
        )
    }

    fn outcome_table(&self, records: &[&PatchRecord]) -> Table {
        let mut table = self.table(&["Source", "Patch", "Outcome"]);
        for record in records {
            table.add_row(vec![
                Cell::new(&record.source),
                Cell::new(&record.file_name),
                self.format_outcome(record.outcome),
            ]);
        }
        table
    }

    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if self.supports_color() {
            table.set_header(
                headers
                    .iter()
                    .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
            );
        } else {
            table.set_header(headers.iter().map(Cell::new));
        }
        table
    }

    fn format_outcome(&self, outcome: PatchOutcome) -> Cell {
        let cell = Cell::new(outcome);
        if !self.supports_color() {
            return cell;
        }
        match outcome {
            PatchOutcome::Applied => cell.fg(Color::Green),
            PatchOutcome::SkippedDoesNotApply => cell.fg(Color::Yellow),
            PatchOutcome::DownloadFailed => cell.fg(Color::Red),
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
