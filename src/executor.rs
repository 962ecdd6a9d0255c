/// Batch Executor and Multi-Batch Runner
///
/// The executor owns the live connection. `execute` submits one batch:
/// inline directive comments are stripped and applied first, the text goes to
/// the driver as a single unit, and every returned row-set is rendered unless
/// the call is silent. `run` splits a larger payload on `GO` terminator lines
/// and feeds the segments to `execute` strictly in sequence.
use crate::driver::{Cancel, Driver, RowSet};
use crate::error::Result;
use crate::format;
use std::io::{self, Write};
use std::time::Instant;
use tracing::debug;

/// Per-call execution options. `verbose` and `timing` are OR-ed with the
/// executor's session defaults; inline directives override both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecOptions {
    pub verbose: bool,
    pub timing: bool,
    pub silent: bool,
}

#[derive(Debug, Clone, Copy)]
enum Toggle {
    VerboseOn,
    VerboseOff,
    TimingOn,
    TimingOff,
}

const MARKERS: [(&str, Toggle); 4] = [
    ("-- cheetah/verbose ON", Toggle::VerboseOn),
    ("-- cheetah/verbose OFF", Toggle::VerboseOff),
    ("-- cheetah/timing ON", Toggle::TimingOn),
    ("-- cheetah/timing OFF", Toggle::TimingOff),
];

/// Strips every directive marker from `sql` and applies the toggles to
/// `options` in text order, so the last marker for an option wins.
pub fn apply_directives(sql: &str, options: &mut ExecOptions) -> String {
    let mut hits: Vec<(usize, usize, Toggle)> = Vec::new();
    for (marker, toggle) in MARKERS {
        let mut from = 0;
        while let Some(found) = sql[from..].find(marker) {
            let start = from + found;
            hits.push((start, start + marker.len(), toggle));
            from = start + marker.len();
        }
    }
    hits.sort_by_key(|(start, _, _)| *start);

    let mut cleaned = String::with_capacity(sql.len());
    let mut cursor = 0;
    for (start, end, toggle) in &hits {
        cleaned.push_str(&sql[cursor..*start]);
        cursor = *end;
        match toggle {
            Toggle::VerboseOn => options.verbose = true,
            Toggle::VerboseOff => options.verbose = false,
            Toggle::TimingOn => options.timing = true,
            Toggle::TimingOff => options.timing = false,
        }
    }
    cleaned.push_str(&sql[cursor..]);
    cleaned
}

/// Splits on lines consisting solely of the batch terminator `GO`
/// (case-insensitive). Whitespace-only segments are discarded; `GO` embedded
/// in a longer line never splits.
pub fn split_batches(sql: &str) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    for line in sql.lines() {
        if line.trim().eq_ignore_ascii_case("GO") {
            batches.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    batches.push(current);
    batches.retain(|b| !b.trim().is_empty());
    batches
}

/// Short description of a batch for the verbose echo: the leading keyword,
/// or the first line when the batch starts with a comment.
fn batch_description(sql: &str) -> String {
    let trimmed = sql.trim();
    let first_word = trimmed.split_whitespace().next().unwrap_or("");
    if first_word.starts_with("--") {
        trimmed.lines().next().unwrap_or("").to_string()
    } else {
        first_word.to_string()
    }
}

pub struct Executor {
    driver: Box<dyn Driver>,
    /// Session-level default for the verbose echo
    pub verbose: bool,
    /// Session-level default for timing lines
    pub timing: bool,
    /// Treat a rejected batch as fatal (file/stdin default); interactive
    /// sessions report and keep going.
    pub stop_on_error: bool,
    out: Box<dyn Write>,
    /// At most one request is outstanding on the connection at a time.
    current: Option<Box<dyn Cancel>>,
}

impl Executor {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Executor {
            driver,
            verbose: false,
            timing: false,
            stop_on_error: true,
            out: Box::new(io::stdout()),
            current: None,
        }
    }

    /// Redirects rendered output; used by tests and kept for piping.
    pub fn set_output(&mut self, out: Box<dyn Write>) {
        self.out = out;
    }

    /// Executes one batch. On driver rejection the error is written to the
    /// output stream; with `stop_on_error` the connection is closed and the
    /// error propagates, otherwise an empty result is returned so callers
    /// can continue.
    pub fn execute(&mut self, sql: &str, options: ExecOptions) -> Result<Vec<RowSet>> {
        let mut opts = ExecOptions {
            verbose: options.verbose || self.verbose,
            timing: options.timing || self.timing,
            silent: options.silent,
        };
        let sql = apply_directives(sql, &mut opts);
        let started = Instant::now();

        if opts.verbose && !opts.silent {
            eprintln!("{}", batch_description(&sql));
        }
        debug!(len = sql.len(), "submitting batch");

        debug_assert!(self.current.is_none());
        self.current = self.driver.canceller();
        let outcome = self.driver.submit(&sql);
        self.current = None;

        let rowsets = match outcome {
            Err(e) => {
                if !opts.silent {
                    writeln!(self.out, "ERROR: {}", e)?;
                }
                if self.stop_on_error {
                    self.driver.close();
                    return Err(e);
                }
                return Ok(Vec::new());
            }
            Ok(rowsets) => rowsets,
        };

        if !opts.silent {
            for rowset in &rowsets {
                if !rowset.rows.is_empty() {
                    writeln!(self.out, "{}", format::render(rowset))?;
                }
                writeln!(self.out, "{}", format::row_count_line(rowset.row_count()))?;
            }
            if opts.timing {
                writeln!(self.out, "Time: {} ms", started.elapsed().as_millis())?;
            }
            self.out.flush()?;
        }
        Ok(rowsets)
    }

    /// Splits `sql` on `GO` terminator lines and executes the segments
    /// strictly in order; segment n+1 starts only after segment n finished.
    /// Directive toggles are batch-scoped: each segment starts from the
    /// caller-supplied `options`.
    pub fn run(&mut self, sql: &str, options: ExecOptions) -> Result<Vec<Vec<RowSet>>> {
        let batches = split_batches(sql);
        let mut results = Vec::with_capacity(batches.len());
        for batch in &batches {
            results.push(self.execute(batch, options)?);
        }
        Ok(results)
    }
}
