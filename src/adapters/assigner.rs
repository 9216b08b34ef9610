//! Strategy assigners for holdings that are not yet in the cache.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::domain::strategy::Strategy;
use crate::ports::assigner_port::StrategyAssigner;

/// Assigns from explicit `TICKER=STRATEGY` pairs, falling back to an
/// optional default.
#[derive(Debug, Default)]
pub struct FixedAssigner {
    assignments: BTreeMap<String, Strategy>,
    default: Option<Strategy>,
}

impl FixedAssigner {
    pub fn new(assignments: BTreeMap<String, Strategy>, default: Option<Strategy>) -> Self {
        let assignments = assignments
            .into_iter()
            .map(|(t, s)| (t.to_uppercase(), s))
            .collect();
        Self {
            assignments,
            default,
        }
    }
}

impl StrategyAssigner for FixedAssigner {
    fn assign(&mut self, ticker: &str, _weight: f64) -> Option<Strategy> {
        self.assignments
            .get(&ticker.to_uppercase())
            .copied()
            .or(self.default)
    }
}

/// Leaves every new holding pending.
#[derive(Debug, Default)]
pub struct PendingAssigner;

impl StrategyAssigner for PendingAssigner {
    fn assign(&mut self, _ticker: &str, _weight: f64) -> Option<Strategy> {
        None
    }
}

/// Asks on a terminal. Accepts a menu number or a strategy name; a blank
/// answer or end of input leaves the ticker pending.
pub struct PromptAssigner<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptAssigner<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn print_menu(&mut self, ticker: &str, weight: f64) -> std::io::Result<()> {
        writeln!(
            self.output,
            "Select strategy for {} ({:.2}% of portfolio):",
            ticker,
            weight * 100.0
        )?;
        for (i, strategy) in Strategy::ALL.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, strategy)?;
        }
        write!(self.output, "> ")?;
        self.output.flush()
    }

    fn parse_answer(answer: &str) -> Option<Strategy> {
        if let Ok(n) = answer.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Strategy::ALL.get(i)).copied();
        }
        answer.parse().ok()
    }
}

impl<R: BufRead, W: Write> StrategyAssigner for PromptAssigner<R, W> {
    fn assign(&mut self, ticker: &str, weight: f64) -> Option<Strategy> {
        loop {
            if let Err(e) = self.print_menu(ticker, weight) {
                tracing::warn!(error = %e, "failed to write strategy prompt");
                return None;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read strategy choice");
                    return None;
                }
            }

            let answer = line.trim();
            if answer.is_empty() {
                return None;
            }
            match Self::parse_answer(answer) {
                Some(strategy) => return Some(strategy),
                None => {
                    let _ = writeln!(self.output, "Unknown choice '{}'", answer);
                }
            }
        }
    }
}
