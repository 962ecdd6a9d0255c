/// Interactive session.
///
/// A line loop over two prompt modes: primary (statement boundary) and
/// continuation (mid-statement). Static commands and built-in meta-commands
/// are only recognized while the statement buffer is empty; every other line
/// joins the buffer. A line ending in `;` marks a statement boundary and
/// restores the primary prompt, but nothing runs until a lone `GO` line
/// dispatches the whole buffer. Interrupt while text is pending discards it;
/// interrupt at an empty prompt ends the session.
use crate::commands::{self, StaticCommand};
use crate::error::Result;
use crate::executor::{ExecOptions, Executor};
use crate::suggest::{Completion, SuggestionIndex, COLLECTOR_SQL};
use rustyline::completion::{Completer, Pair};
use rustyline::config::{CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

const CONTINUATION_PROMPT: &str = "-> ";
const HISTORY_SIZE: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptMode {
    Primary,
    Continuation,
}

pub struct Session {
    executor: Executor,
    prompt: String,
    prompt_mode: PromptMode,
    index: Rc<RefCell<SuggestionIndex>>,
    buffer: Rc<RefCell<String>>,
}

impl Session {
    /// Wraps an executor for interactive use. Rejected batches are reported
    /// and the loop keeps going.
    pub fn new(mut executor: Executor, prompt: String) -> Self {
        executor.stop_on_error = false;
        Session {
            executor,
            prompt,
            prompt_mode: PromptMode::Primary,
            index: Rc::new(RefCell::new(SuggestionIndex::new())),
            buffer: Rc::new(RefCell::new(String::new())),
        }
    }

    /// Reads lines until `\q`, end of input, or an idle interrupt.
    pub fn run(&mut self) -> Result<()> {
        let config = Config::builder()
            .max_history_size(HISTORY_SIZE)
            .completion_type(CompletionType::List)
            .build();
        let mut editor: Editor<SessionHelper> = Editor::with_config(config);
        editor.set_helper(Some(SessionHelper {
            index: Rc::clone(&self.index),
            buffer: Rc::clone(&self.buffer),
        }));

        self.refresh_suggestions();

        loop {
            let prompt = match self.prompt_mode {
                PromptMode::Primary => self.prompt.clone(),
                PromptMode::Continuation => CONTINUATION_PROMPT.to_string(),
            };
            match editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str());
                    }
                    if self.handle_line(&line)? == LineOutcome::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    if self.interrupt() == LineOutcome::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// One line of input. Commands apply only at a statement boundary with
    /// nothing pending; a lone `GO` runs the buffer; everything else
    /// accumulates, with the prompt style tracking whether the last line
    /// closed a statement.
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        if self.buffer.borrow().is_empty() {
            let trimmed = line.trim();
            if let Some(command) = commands::static_command(trimmed) {
                self.prompt_mode = PromptMode::Primary;
                return match command {
                    StaticCommand::Help => {
                        println!("{}", commands::HELP_TEXT);
                        Ok(LineOutcome::Continue)
                    }
                    StaticCommand::Quit => Ok(LineOutcome::Quit),
                    StaticCommand::UpdateSuggestions => {
                        self.refresh_suggestions();
                        Ok(LineOutcome::Continue)
                    }
                };
            }
            if let Some(sql) = commands::resolve(trimmed) {
                self.executor.execute(&sql, ExecOptions::default())?;
                self.prompt_mode = PromptMode::Primary;
                return Ok(LineOutcome::Continue);
            }
        }

        if line.trim().eq_ignore_ascii_case("GO") {
            self.dispatch_buffer()?;
            self.prompt_mode = PromptMode::Primary;
            return Ok(LineOutcome::Continue);
        }

        {
            let mut buffer = self.buffer.borrow_mut();
            buffer.push_str(line);
            buffer.push('\n');
        }
        // the boundary check is on the raw line; `;  ` stays mid-statement
        self.prompt_mode = if line.ends_with(';') {
            PromptMode::Primary
        } else {
            PromptMode::Continuation
        };
        Ok(LineOutcome::Continue)
    }

    /// Interrupt: discard pending text, or quit when there is none.
    pub fn interrupt(&mut self) -> LineOutcome {
        if self.buffer.borrow().is_empty() {
            LineOutcome::Quit
        } else {
            self.buffer.borrow_mut().clear();
            self.prompt_mode = PromptMode::Primary;
            LineOutcome::Continue
        }
    }

    pub fn has_pending_text(&self) -> bool {
        !self.buffer.borrow().is_empty()
    }

    /// Re-runs the catalog collector silently and swaps the suggestion
    /// mapping wholesale. Failures leave the old mapping in place.
    pub fn refresh_suggestions(&mut self) {
        let opts = ExecOptions {
            silent: true,
            ..Default::default()
        };
        match self.executor.execute(COLLECTOR_SQL, opts) {
            Ok(rowsets) => {
                if let Some(rowset) = rowsets.first() {
                    self.index.borrow_mut().rebuild(rowset);
                    debug!(entries = rowset.row_count(), "suggestion index rebuilt");
                }
            }
            Err(e) => warn!(error = %e, "suggestion refresh failed"),
        }
    }

    fn dispatch_buffer(&mut self) -> Result<()> {
        let sql = std::mem::take(&mut *self.buffer.borrow_mut());
        if sql.trim().is_empty() {
            return Ok(());
        }
        self.executor.run(&sql, ExecOptions::default())?;
        Ok(())
    }
}

/// Characters that end an identifier token when scanning left from the
/// cursor. Brackets and dots stay inside the token.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ',' | ';' | '='))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Candidates for the token under the cursor, against the buffered statement
/// plus the line being edited.
fn completion_candidates(
    index: &SuggestionIndex,
    buffer: &str,
    line: &str,
    pos: usize,
) -> (usize, Vec<Pair>) {
    let start = word_start(line, pos);
    let word = &line[start..pos];
    if word.is_empty() {
        return (start, Vec::new());
    }
    let context = format!("{}{}", buffer, line);
    let pairs = match index.complete(word, &context) {
        Completion::Single(hit) => vec![pair(hit)],
        Completion::List(hits) => hits.into_iter().map(pair).collect(),
        Completion::Empty => Vec::new(),
    };
    (start, pairs)
}

fn pair(candidate: String) -> Pair {
    Pair {
        display: candidate.clone(),
        replacement: candidate,
    }
}

pub struct SessionHelper {
    index: Rc<RefCell<SuggestionIndex>>,
    buffer: Rc<RefCell<String>>,
}

impl Completer for SessionHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let index = self.index.borrow();
        let buffer = self.buffer.borrow();
        Ok(completion_candidates(&index, &buffer, line, pos))
    }
}

impl Hinter for SessionHelper {
    type Hint = String;
}

impl Highlighter for SessionHelper {}
impl Validator for SessionHelper {}
impl Helper for SessionHelper {}
