use std::fmt;

use serde::Serialize;

/// States of one pipeline invocation. `Completed`, `Rejected` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Fetching,
    Probing,
    Validating,
    Transcribing,
    Aligning,
    Completed,
    Rejected,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Fetching => "FETCHING",
            PipelineState::Probing => "PROBING",
            PipelineState::Validating => "VALIDATING",
            PipelineState::Transcribing => "TRANSCRIBING",
            PipelineState::Aligning => "ALIGNING",
            PipelineState::Completed => "COMPLETED",
            PipelineState::Rejected => "REJECTED",
            PipelineState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Completed | PipelineState::Rejected | PipelineState::Failed
        )
    }

    /// Legal edges of the state machine. `Validating → Completed` is the end of an
    /// inspection run, which stops after the gate.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Fetching, Probing)
                | (Probing, Validating)
                | (Validating, Transcribing)
                | (Validating, Rejected)
                | (Validating, Completed)
                | (Transcribing, Aligning)
                | (Aligning, Completed)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The stage an invocation failed in, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedStage {
    Ingest,
    Transcribe,
    Align,
}

impl FailedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedStage::Ingest => "ingest",
            FailedStage::Transcribe => "transcribe",
            FailedStage::Align => "align",
        }
    }
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
