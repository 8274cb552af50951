// src/executor.rs - one record's pass over the operation list
use crate::eval::{evaluate, evaluate_text};
use crate::query::compile::Step;
use crate::value::{LogRecord, Value};
use crate::variables::Scope;
use std::ops::ControlFlow;

/// Terminal state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every reachable operation ran; the record is emitted
    Done,
    /// `skipRecord` was reached; the record is dropped
    Skipped,
}

/// What a finished pass leaves behind
#[derive(Debug)]
pub struct PassResult {
    pub outcome: PassOutcome,
    /// Bindings made before the pass ended, to be committed to the run
    pub transient: Scope,
    pub color: Option<String>,
}

struct Skip;

/// State of a pass in progress
pub(crate) struct Pass<'r> {
    record: &'r LogRecord,
    persistent: &'r Scope,
    transient: Scope,
    color: Option<String>,
}

impl<'r> Pass<'r> {
    pub(crate) fn new(record: &'r LogRecord, persistent: &'r Scope) -> Self {
        Pass {
            record,
            persistent,
            transient: Scope::new(),
            color: None,
        }
    }

    pub(crate) fn run(mut self, steps: &[Step]) -> PassResult {
        let outcome = match self.execute(steps) {
            ControlFlow::Continue(()) => PassOutcome::Done,
            ControlFlow::Break(Skip) => PassOutcome::Skipped,
        };
        PassResult {
            outcome,
            transient: self.transient,
            color: self.color,
        }
    }

    /// Nested branches share this pass, so a skip at any depth unwinds all
    /// the way out.
    fn execute(&mut self, steps: &[Step]) -> ControlFlow<Skip> {
        for step in steps {
            match step {
                Step::Branch {
                    expression,
                    pattern,
                    then_steps,
                    else_steps,
                } => {
                    let captures = {
                        let text = evaluate_text(
                            expression,
                            self.record,
                            &self.transient,
                            self.persistent,
                        );
                        pattern.captures(&text)
                    };
                    let branch = match captures {
                        Some(bindings) => {
                            for (name, text) in bindings {
                                self.transient.set(name, Value::String(text));
                            }
                            then_steps
                        }
                        None => else_steps,
                    };
                    self.execute(branch)?;
                }
                Step::Set { target, expression } => {
                    let value =
                        evaluate(expression, self.record, &self.transient, self.persistent)
                            .into_owned();
                    self.transient.set(target.clone(), value);
                }
                Step::ColorBy(expression) => {
                    let color =
                        evaluate_text(expression, self.record, &self.transient, self.persistent)
                            .into_owned();
                    self.color = Some(color);
                }
                Step::Skip => return ControlFlow::Break(Skip),
            }
        }
        ControlFlow::Continue(())
    }
}
