//! Step plans — each migration stage is an ordered list of tagged steps.
//!
//! The abort/continue decision after every step is driven by the step's
//! [`Criticality`] tag, not by ad-hoc control flow inside the stage.

/// Failure policy for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts the enclosing stage and the run.
    Critical,
    /// Failure is logged and the stage continues.
    BestEffort,
}

/// Static description of one step within a stage.
#[derive(Debug, Clone, Copy)]
pub struct StepSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub criticality: Criticality,
}

/// What the stage runner should do after recording a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDisposition {
    Continue,
    Abort,
}

/// Recorded outcome of one executed step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub id: &'static str,
    pub passed: bool,
    pub message: String,
}

/// Ordered log of step outcomes for one stage.
#[derive(Debug)]
pub struct StageLog {
    stage: &'static str,
    outcomes: Vec<StepOutcome>,
}

impl StageLog {
    #[must_use]
    pub fn new(stage: &'static str) -> Self {
        Self { stage, outcomes: Vec::new() }
    }

    #[must_use]
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Record one step outcome and return the policy decision for it:
    /// a failed `Critical` step aborts, everything else continues.
    pub fn record(
        &mut self,
        spec: &StepSpec,
        passed: bool,
        message: impl Into<String>,
    ) -> StepDisposition {
        self.outcomes.push(StepOutcome { id: spec.id, passed, message: message.into() });
        if !passed && spec.criticality == Criticality::Critical {
            StepDisposition::Abort
        } else {
            StepDisposition::Continue
        }
    }
}
