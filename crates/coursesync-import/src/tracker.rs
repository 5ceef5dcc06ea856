//! Per-line outcomes, run counters and the sinks that render them.
//!
//! ```text
//! ReconciliationEngine ──► ResultTracker ──► OutputSink
//!                              │               ├─ SilentSink
//!                              │               ├─ PlainTextSink (tab separated)
//!                              ▼               └─ StructuredSink (serde)
//!                          RunSummary
//! ```

use coursesync_core::CourseSnapshot;
use serde::{Deserialize, Serialize};
use std::io::Write;

// ============================================================================
// Outcomes
// ============================================================================

/// Terminal state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Unchanged,
    Errored,
}

impl Action {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Errored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// 1-based record number in file order.
    pub line: usize,
    pub success: bool,
    pub action: Action,
    pub statuses: Vec<String>,
    pub course: Option<CourseSnapshot>,
    /// Why an existing course or page was updated, e.g. `"fullname is different"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    /// Imports never delete; kept for report compatibility.
    pub deleted: usize,
    pub unchanged: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn count(&mut self, action: Action) {
        self.total += 1;
        match action {
            Action::Created => self.created += 1,
            Action::Updated => self.updated += 1,
            Action::Unchanged => self.unchanged += 1,
            Action::Errored => self.errors += 1,
        }
    }

    /// Fixed-format summary lines.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Courses total: {}", self.total),
            format!("Courses created: {}", self.created),
            format!("Courses updated: {}", self.updated),
            format!("Courses deleted: {}", self.deleted),
            format!("Courses not updated: {}", self.unchanged),
            format!("Courses errors: {}", self.errors),
        ]
    }
}

// ============================================================================
// Sinks
// ============================================================================

pub trait OutputSink {
    fn start(&mut self) {}

    fn line(&mut self, outcome: &ImportOutcome);

    fn finish(&mut self, _summary: &RunSummary) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentSink;

impl OutputSink for SilentSink {
    fn line(&mut self, _outcome: &ImportOutcome) {}
}

/// Tab-separated text, buffered and optionally copied to a writer.
#[derive(Default)]
pub struct PlainTextSink {
    buffer: String,
    passthrough: Option<Box<dyn Write>>,
}

impl PlainTextSink {
    pub const COLUMNS: [&'static str; 6] =
        ["line", "result", "id", "shortname", "fullname", "idnumber"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passthrough(writer: Box<dyn Write>) -> Self {
        Self {
            buffer: String::new(),
            passthrough: Some(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::with_passthrough(Box::new(std::io::stdout()))
    }

    /// Everything written so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
        if let Some(out) = self.passthrough.as_mut() {
            if let Err(err) = writeln!(out, "{text}") {
                tracing::warn!(error = %err, "failed to write result line");
            }
        }
    }
}

impl std::fmt::Debug for PlainTextSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainTextSink")
            .field("buffer", &self.buffer)
            .field("passthrough", &self.passthrough.is_some())
            .finish()
    }
}

impl OutputSink for PlainTextSink {
    fn start(&mut self) {
        self.emit(&Self::COLUMNS.join("\t"));
    }

    fn line(&mut self, outcome: &ImportOutcome) {
        let indicator = if outcome.success { "OK" } else { "NOK" };
        let (id, shortname, fullname, idnumber) = match &outcome.course {
            Some(c) => (
                c.id.map(|id| id.to_string()).unwrap_or_default(),
                c.shortname.as_str(),
                c.fullname.as_str(),
                c.idnumber.as_str(),
            ),
            None => (String::new(), "", "", ""),
        };
        let row = format!(
            "{}\t{indicator}\t{id}\t{shortname}\t{fullname}\t{idnumber}",
            outcome.line
        );
        self.emit(&row);
        self.emit(&outcome.statuses.join("\t  "));
    }

    fn finish(&mut self, summary: &RunSummary) {
        for line in summary.lines() {
            self.emit(&line);
        }
        if let Some(out) = self.passthrough.as_mut() {
            if let Err(err) = out.flush() {
                tracing::warn!(error = %err, "failed to flush result output");
            }
        }
    }
}

/// Serializable report of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub outcomes: Vec<ImportOutcome>,
    pub summary: Option<RunSummary>,
}

/// Collects outcomes into a [`StructuredReport`].
#[derive(Debug, Default)]
pub struct StructuredSink {
    report: StructuredReport,
}

impl StructuredSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> &StructuredReport {
        &self.report
    }

    pub fn into_report(self) -> StructuredReport {
        self.report
    }
}

impl OutputSink for StructuredSink {
    fn line(&mut self, outcome: &ImportOutcome) {
        self.report.outcomes.push(outcome.clone());
    }

    fn finish(&mut self, summary: &RunSummary) {
        self.report.summary = Some(*summary);
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Accumulates outcomes and counters for one run and forwards them to a sink.
pub struct ResultTracker<'s> {
    sink: &'s mut dyn OutputSink,
    outcomes: Vec<ImportOutcome>,
    summary: RunSummary,
}

impl<'s> ResultTracker<'s> {
    pub fn new(sink: &'s mut dyn OutputSink) -> Self {
        Self {
            sink,
            outcomes: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn start(&mut self) {
        self.sink.start();
    }

    pub fn output(&mut self, outcome: ImportOutcome) {
        self.summary.count(outcome.action);
        self.sink.line(&outcome);
        self.outcomes.push(outcome);
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Emit the summary and hand back everything recorded.
    pub fn finish(self) -> (Vec<ImportOutcome>, RunSummary) {
        self.sink.finish(&self.summary);
        (self.outcomes, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(line: usize, action: Action, statuses: &[&str]) -> ImportOutcome {
        ImportOutcome {
            line,
            success: action.is_success(),
            action,
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            course: action.is_success().then(|| CourseSnapshot {
                id: Some(3),
                shortname: "S1".to_string(),
                fullname: "F1".to_string(),
                idnumber: "C1".to_string(),
            }),
            changes: Vec::new(),
        }
    }

    #[test]
    fn counters_follow_actions() {
        let mut sink = SilentSink;
        let mut tracker = ResultTracker::new(&mut sink);
        tracker.output(outcome(1, Action::Created, &["Course Created"]));
        tracker.output(outcome(2, Action::Unchanged, &["Course Not Updated"]));
        tracker.output(outcome(3, Action::Errored, &["Invalid Import Record"]));
        let (outcomes, summary) = tracker.finish();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                created: 1,
                updated: 0,
                deleted: 0,
                unchanged: 1,
                errors: 1,
            }
        );
    }

    #[test]
    fn plain_text_layout() {
        let mut sink = PlainTextSink::new();
        {
            let mut tracker = ResultTracker::new(&mut sink);
            tracker.start();
            tracker.output(outcome(
                1,
                Action::Updated,
                &["Course Updated", "Page Activity Updated"],
            ));
            tracker.output(outcome(2, Action::Errored, &["Invalid Import Record"]));
            tracker.finish();
        }
        let lines: Vec<&str> = sink.buffer().lines().collect();
        assert_eq!(lines[0], "line\tresult\tid\tshortname\tfullname\tidnumber");
        assert_eq!(lines[1], "1\tOK\t3\tS1\tF1\tC1");
        assert_eq!(lines[2], "Course Updated\t  Page Activity Updated");
        assert_eq!(lines[3], "2\tNOK\t\t\t\t");
        assert_eq!(lines[4], "Invalid Import Record");
        assert_eq!(lines[5], "Courses total: 2");
        assert_eq!(lines[10], "Courses errors: 1");
    }

    #[test]
    fn structured_sink_collects_report() {
        let mut sink = StructuredSink::new();
        {
            let mut tracker = ResultTracker::new(&mut sink);
            tracker.output(outcome(1, Action::Created, &["Course Created"]));
            tracker.finish();
        }
        let report = sink.into_report();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.summary.unwrap().created, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["action"], "created");
    }
}
