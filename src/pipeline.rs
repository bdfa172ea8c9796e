use std::io::{BufRead, Error, ErrorKind, Result, Write};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::{
    aggregate::{Aggregator, GroupKey, Grouping, Snapshot},
    files::{open_reader, open_writer},
    record::{Layout, RawRecord, Validator},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Draining,
    Done,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub lines: usize,
    pub malformed: usize,
    pub ineligible: usize,
    pub zip_records: usize,
    pub date_records: usize,
    pub zip_groups: usize,
    pub date_groups: usize,
    pub zip_lines: usize,
    pub date_lines: usize,
}

/// Feeds contribution lines into the by-zip and by-date aggregations.
///
/// Every record with a valid zip produces a line on `zip_out` straight
/// away. The by-date groups are only written by `finish`, once, sorted
/// by recipient and then date string.
pub struct Pipeline<W: Write> {
    layout: Layout,
    validator: Validator,
    by_zip: Aggregator,
    by_date: Aggregator,
    zip_out: W,
    date_out: W,
    phase: Phase,
    summary: RunSummary,
    opt_prog: Option<ProgressBar>,
}

impl<W: Write> Pipeline<W> {
    pub fn new(layout: Layout, zip_out: W, date_out: W) -> Result<Pipeline<W>> {
        layout.check()?;
        let validator = Validator::new(&layout)?;
        Ok(Pipeline {
            layout,
            validator,
            by_zip: Aggregator::new(Grouping::Zip),
            by_date: Aggregator::new(Grouping::Date),
            zip_out,
            date_out,
            phase: Phase::Running,
            summary: RunSummary::default(),
            opt_prog: None,
        })
    }

    pub fn with_progress(mut self, prog: ProgressBar) -> Pipeline<W> {
        self.opt_prog = Some(prog);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Processes one line (without its terminator).
    pub fn consume(&mut self, line: &str) -> Result<()> {
        if self.phase != Phase::Running {
            return Err(Error::new(
                ErrorKind::Other,
                format!("cannot consume input in phase {:?}", self.phase),
            ));
        }
        self.summary.lines += 1;
        if let Some(prog) = &self.opt_prog {
            prog.inc(1);
        }

        let raw = match RawRecord::parse(line, &self.layout) {
            None => {
                self.summary.malformed += 1;
                return Ok(());
            }
            Some(raw) => raw,
        };
        let contrib = match self.validator.validate(&raw) {
            None => {
                self.summary.ineligible += 1;
                return Ok(());
            }
            Some(contrib) => contrib,
        };

        if let Some(zip) = contrib.zip {
            self.summary.zip_records += 1;
            let key = GroupKey::new(contrib.recipient, zip);
            let snap = Snapshot::of(self.by_zip.record(key.clone(), contrib.amount));
            snap.write(&mut self.zip_out, &key)
                .map_err(|err| output_error(self.by_zip.grouping(), err))?;
            self.summary.zip_lines += 1;
        }
        if let Some(date) = contrib.date {
            self.summary.date_records += 1;
            self.by_date
                .record(GroupKey::new(contrib.recipient, date), contrib.amount);
        }
        Ok(())
    }

    /// Writes the by-date groups, flushes both outputs and returns the
    /// totals for the run.
    pub fn finish(&mut self) -> Result<RunSummary> {
        if self.phase != Phase::Running {
            return Err(Error::new(
                ErrorKind::Other,
                format!("cannot finish in phase {:?}", self.phase),
            ));
        }
        self.phase = Phase::Draining;
        self.summary.date_lines = self
            .by_date
            .write_sorted(&mut self.date_out)
            .map_err(|err| output_error(self.by_date.grouping(), err))?;
        self.zip_out
            .flush()
            .map_err(|err| output_error(self.by_zip.grouping(), err))?;
        self.date_out
            .flush()
            .map_err(|err| output_error(self.by_date.grouping(), err))?;
        self.summary.zip_groups = self.by_zip.len();
        self.summary.date_groups = self.by_date.len();
        if let Some(prog) = &self.opt_prog {
            prog.finish_and_clear();
        }
        self.phase = Phase::Done;
        Ok(self.summary.clone())
    }

    /// Consumes every line of `reader`, then finishes. Lines that are not
    /// valid UTF-8 are decoded lossily.
    pub fn run(&mut self, reader: &mut dyn BufRead) -> Result<RunSummary> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(trim_eol(&buf));
            self.consume(&line)?;
        }
        self.finish()
    }

    pub fn into_outputs(self) -> (W, W) {
        (self.zip_out, self.date_out)
    }
}

fn output_error(grouping: Grouping, err: Error) -> Error {
    Error::new(err.kind(), format!("writing {} output: {}", grouping, err))
}

fn trim_eol(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn spinner() -> Result<ProgressBar> {
    let sty = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} lines ({per_sec})")
        .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
    let prog = ProgressBar::new_spinner();
    prog.set_style(sty);
    Ok(prog)
}

pub fn run_files(
    input: &str,
    zip_name: &str,
    date_name: &str,
    layout: Layout,
    verbose: bool,
) -> Result<RunSummary> {
    let mut reader = open_reader(input)?;
    let zip_out = open_writer(zip_name)?;
    let date_out = open_writer(date_name)?;
    let mut pipeline = Pipeline::new(layout, zip_out, date_out)?;
    if verbose {
        pipeline = pipeline.with_progress(spinner()?);
    }
    let mut summary = pipeline.run(reader.as_mut())?;
    summary.input = input.to_string();
    Ok(summary)
}
