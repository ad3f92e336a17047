//! Ordered multi-step workflows without transactions
//!
//! Each step commits on its own. A `required` step aborts the workflow; if
//! earlier steps already committed, the error becomes
//! [`Error::PartialFailure`] naming them. A `best_effort` step only leaves a
//! warning behind.

use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A best-effort step that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWarning {
    pub step: &'static str,
    pub message: String,
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

#[derive(Debug)]
pub struct Saga {
    workflow: &'static str,
    completed: Vec<&'static str>,
    warnings: Vec<StepWarning>,
}

impl Saga {
    pub fn new(workflow: &'static str) -> Self {
        Self {
            workflow,
            completed: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Steps committed so far, in order
    pub fn completed(&self) -> &[&'static str] {
        &self.completed
    }

    pub async fn required<T, F>(&mut self, step: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match fut.await {
            Ok(value) => {
                debug!(workflow = self.workflow, step, "step completed");
                self.completed.push(step);
                Ok(value)
            }
            Err(source) if self.completed.is_empty() => Err(source),
            Err(source) => {
                warn!(
                    workflow = self.workflow,
                    step,
                    completed = ?self.completed,
                    error = %source,
                    "workflow stopped after partial commit"
                );
                Err(Error::PartialFailure {
                    workflow: self.workflow,
                    completed: self.completed.clone(),
                    failed_step: step,
                    source: Box::new(source),
                })
            }
        }
    }

    pub async fn best_effort<T, F>(&mut self, step: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        match fut.await {
            Ok(value) => {
                debug!(workflow = self.workflow, step, "step completed");
                self.completed.push(step);
                Some(value)
            }
            Err(e) => {
                warn!(workflow = self.workflow, step, error = %e, "best-effort step failed");
                self.warnings.push(StepWarning {
                    step,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// Record a step skipped because there was nothing to do
    pub fn skip(&self, step: &'static str) {
        debug!(workflow = self.workflow, step, "step skipped");
    }

    pub fn into_warnings(self) -> Vec<StepWarning> {
        self.warnings
    }
}
