//! TAP report writer.
//!
//! One report spans the whole run. Lines are written and flushed one at a
//! time so `tail -f` on the report shows results as they happen.

use std::fs::{self, File};
use std::io::{self, LineWriter, Write};
use std::path::Path;

use eyre::{Context, Result};

use crate::model::{AttemptOutcome, TransferAttempt};

pub const TAP_VERSION: u32 = 14;

/// Optional TAP extras. Both are off by default so the report holds exactly
/// the header, the batch comments and one line per attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Emit a YAML diagnostic block after each failing line.
    pub diagnostics: bool,
    /// Emit a trailing `1..N` plan when the report is finished.
    pub plan: bool,
}

pub struct TapReporter<W: Write> {
    writer: W,
    options: ReportOptions,
    results: u64,
}

impl TapReporter<LineWriter<File>> {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create report directory {}", parent.display())
                })?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create report file {}", path.display()))?;
        Ok(Self::new(LineWriter::new(file)))
    }
}

impl<W: Write> TapReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            options: ReportOptions::default(),
            results: 0,
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of result lines written so far.
    pub fn results(&self) -> u64 {
        self.results
    }

    pub fn write_header(&mut self, version: u32) -> io::Result<()> {
        self.line(&format!("TAP version {version}"))
    }

    pub fn write_batch_comment(&mut self, batch_size: u32, expected_total: u64) -> io::Result<()> {
        self.line(&format!(
            "# Total tests for batch size {batch_size}: {expected_total}"
        ))
    }

    pub fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.line(&format!("# {}", single_line(text)))
    }

    pub fn write_result(&mut self, attempt: &TransferAttempt) -> io::Result<()> {
        let status = if attempt.is_ok() { "ok" } else { "not ok" };
        let description = escape_description(&attempt.description());
        self.line(&format!("{status} {} - {description}", attempt.ordinal))?;
        self.results += 1;

        if self.options.diagnostics && !attempt.is_ok() {
            self.write_diagnostics(attempt)?;
        }
        Ok(())
    }

    /// Flush, write the plan if enabled, and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.options.plan {
            let plan = format!("1..{}", self.results);
            self.line(&plan)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_diagnostics(&mut self, attempt: &TransferAttempt) -> io::Result<()> {
        let mut block = vec!["  ---".to_string()];
        match &attempt.outcome {
            AttemptOutcome::UploadFailed {
                stage,
                cause,
                transient,
            } => {
                block.push(format!("  message: {}", yaml_quote(cause)));
                block.push(format!("  severity: {}", if *transient { "transient" } else { "fail" }));
                block.push(format!("  stage: {}", yaml_quote(&stage.to_string())));
                block.push(format!("  file: {}", yaml_quote(&attempt.source)));
            }
            AttemptOutcome::ConnectionFailed { cause } => {
                block.push(format!("  message: {}", yaml_quote(cause)));
                block.push("  severity: connection".to_string());
            }
            AttemptOutcome::ListingFailed { cause } => {
                block.push(format!("  message: {}", yaml_quote(cause)));
                block.push("  severity: listing".to_string());
                block.push(format!("  local_dir: {}", yaml_quote(&attempt.source)));
            }
            AttemptOutcome::Uploaded { .. } => return Ok(()),
        }
        if let Some(remote) = &attempt.remote_path {
            block.push(format!("  remote_path: {}", yaml_quote(remote)));
        }
        block.push(format!("  at: {}", yaml_quote(&attempt.at.to_rfc3339())));
        block.push("  ...".to_string());

        for line in block {
            self.line(&line)?;
        }
        Ok(())
    }

    fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()
    }
}

fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep descriptions on one line and escape TAP 14 directive markers.
fn escape_description(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in single_line(text).chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '#' => out.push_str("\\#"),
            _ => out.push(c),
        }
    }
    out
}

fn yaml_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransferStage;
    use chrono::Local;

    fn uploaded(ordinal: u64, source: &str) -> TransferAttempt {
        TransferAttempt {
            ordinal,
            source: source.to_string(),
            remote_path: Some(format!("/ingress/{source}")),
            outcome: AttemptOutcome::Uploaded {
                bytes: 1,
                elapsed_ms: 1,
            },
            at: Local::now(),
        }
    }

    fn failed(ordinal: u64, source: &str, cause: &str) -> TransferAttempt {
        TransferAttempt {
            ordinal,
            source: source.to_string(),
            remote_path: Some(format!("/ingress/{source}")),
            outcome: AttemptOutcome::UploadFailed {
                stage: TransferStage::CreateRemote,
                cause: cause.to_string(),
                transient: false,
            },
            at: Local::now(),
        }
    }

    fn render(reporter: TapReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.finish().unwrap()).unwrap()
    }

    #[test]
    fn writes_header_comment_and_results() {
        let mut reporter = TapReporter::new(Vec::new());
        reporter.write_header(TAP_VERSION).unwrap();
        reporter.write_batch_comment(2, 4).unwrap();
        reporter.write_result(&uploaded(1, "a.txt")).unwrap();
        reporter
            .write_result(&failed(2, "b.txt", "permission denied"))
            .unwrap();
        reporter
            .write_result(&TransferAttempt::connection_failure(
                3,
                "a.txt",
                "connection refused",
                Local::now(),
            ))
            .unwrap();
        assert_eq!(reporter.results(), 3);

        assert_eq!(
            render(reporter),
            "TAP version 14\n\
             # Total tests for batch size 2: 4\n\
             ok 1 - Successfully uploaded a.txt\n\
             not ok 2 - Error uploading b.txt: permission denied\n\
             not ok 3 - Connection error: connection refused\n"
        );
    }

    #[test]
    fn descriptions_stay_on_one_line() {
        let mut reporter = TapReporter::new(Vec::new());
        reporter
            .write_result(&failed(1, "c#1.txt", "line one\nline two"))
            .unwrap();
        assert_eq!(
            render(reporter),
            "not ok 1 - Error uploading c\\#1.txt: line one line two\n"
        );
    }

    #[test]
    fn optional_plan_and_diagnostics() {
        let mut reporter = TapReporter::new(Vec::new()).with_options(ReportOptions {
            diagnostics: true,
            plan: true,
        });
        reporter.write_result(&uploaded(1, "a.txt")).unwrap();
        reporter
            .write_result(&failed(2, "b.txt", "quota \"exceeded\""))
            .unwrap();
        let text = render(reporter);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "ok 1 - Successfully uploaded a.txt");
        assert_eq!(lines[1], "not ok 2 - Error uploading b.txt: quota \"exceeded\"");
        assert_eq!(lines[2], "  ---");
        assert_eq!(lines[3], "  message: \"quota \\\"exceeded\\\"\"");
        assert!(lines.contains(&"  remote_path: \"/ingress/b.txt\""));
        assert_eq!(lines[lines.len() - 2], "  ...");
        assert_eq!(lines[lines.len() - 1], "1..2");
    }

    #[test]
    fn create_truncates_existing_report() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("reports/run.tap");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale content\n").unwrap();

        let mut reporter = TapReporter::create(&path).unwrap();
        reporter.write_header(TAP_VERSION).unwrap();
        // Visible before finish: every line is flushed as written.
        assert_eq!(fs::read_to_string(&path).unwrap(), "TAP version 14\n");
        reporter.finish().unwrap();
    }
}
