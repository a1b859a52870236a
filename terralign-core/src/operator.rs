//! Operator I/O Boundary for Interactive Refinement
//!
//! The ground-trend estimator can be steered by a human: the operator
//! inspects the current fit, adjusts the polynomial degree, and prunes
//! bad ground-contact points. The numeric core never talks to a screen or
//! keyboard directly — it renders through this trait, so tests drive the
//! exact same state machine with scripted answers and no display at all.
//!
//! The interaction is deliberately synchronous and modal: the estimator
//! blocks until the operator answers, and it always renders the current
//! fit before asking anything.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::{
    errors::{ProcessingError, ProcessingResult},
    trend::extrema::Extremum,
};

/// Snapshot of the current fit, handed to [`Operator::render`]
///
/// Point indices shown to the operator are positions in `points` as
/// currently displayed; the estimator re-renders after every change.
#[derive(Debug)]
pub struct FitView<'a> {
    /// Canonical time base (microseconds, may contain NaN)
    pub times: &'a [f64],
    /// The signal being trend-corrected
    pub signal: &'a [f64],
    /// Currently surviving ground-contact candidates
    pub points: &'a [Extremum],
    /// Trend evaluated over the time base; None when the fit fell back
    pub trend: Option<&'a [f64]>,
    /// Polynomial degree of the displayed fit
    pub degree: usize,
}

/// Injected display/input channel for the interactive refinement loop
pub trait Operator {
    /// Show the current fit to the operator
    ///
    /// Non-blocking for the computation; whatever acknowledgement the
    /// medium needs happens before the next [`Operator::prompt`] returns.
    fn render(&mut self, view: &FitView<'_>);

    /// Ask the operator a question and block for the answer
    fn prompt(&mut self, text: &str) -> ProcessingResult<String>;
}

/// Console-backed operator: renders a textual fit summary, prompts on
/// stdin/stdout
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn render(&mut self, view: &FitView<'_>) {
        println!(
            "fit: degree {}, {} surviving points over {} samples{}",
            view.degree,
            view.points.len(),
            view.signal.len(),
            if view.trend.is_some() { "" } else { " (fit infeasible, zero trend)" },
        );
        for (i, p) in view.points.iter().enumerate() {
            println!("  [{i:3}] t={:.0} us  value={:.2}", p.time, p.value);
        }
    }

    fn prompt(&mut self, text: &str) -> ProcessingResult<String> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes()).map_err(ProcessingError::OperatorIo)?;
        stdout.flush().map_err(ProcessingError::OperatorIo)?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line).map_err(ProcessingError::OperatorIo)?;
        if read == 0 {
            return Err(ProcessingError::InvalidInput("operator input channel closed".into()));
        }
        Ok(line.trim().to_string())
    }
}

/// Scripted operator for tests: returns pre-baked answers in order
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    /// Number of renders observed (fit-before-prompt assertions)
    pub renders: usize,
}

impl ScriptedOperator {
    /// Build from a list of answers, consumed front to back
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect(), renders: 0 }
    }

    /// Check if every scripted answer was consumed
    pub fn exhausted(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Operator for ScriptedOperator {
    fn render(&mut self, _view: &FitView<'_>) {
        self.renders += 1;
    }

    fn prompt(&mut self, text: &str) -> ProcessingResult<String> {
        self.answers.pop_front().ok_or_else(|| {
            ProcessingError::InvalidInput(format!("script ran out of answers at prompt: {text}"))
        })
    }
}
