//! Application services — one use-case per module.
//!
//! Services orchestrate domain logic through ports. They never touch
//! infrastructure types directly, which keeps every stage testable with
//! scripted mocks.

pub mod configure;
pub mod database;
pub mod filesystem;
pub mod postmigrate;
pub mod preflight;
pub mod relay;

use crate::application::ports::ProgressReporter;
use crate::domain::plan::{Criticality, StageLog, StepDisposition, StepSpec};

/// Record a step outcome, mirror it to the reporter, and return the
/// abort/continue decision. Best-effort failures surface as warnings.
fn settle(
    log: &mut StageLog,
    spec: &StepSpec,
    reporter: &impl ProgressReporter,
    passed: bool,
    message: String,
) -> StepDisposition {
    if passed {
        reporter.success(&message);
    } else if spec.criticality == Criticality::BestEffort {
        reporter.warn(&message);
    } else {
        reporter.fail(&message);
    }
    log.record(spec, passed, message)
}
