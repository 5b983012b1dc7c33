//! Dispatch request, stages, and outcomes.

use serde::Serialize;

use crate::error::{ErrorKind, FileMailerError};

use super::archive::BuiltArchive;

/// The sole external input of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub recipient: String,
}

impl DispatchRequest {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

/// Boolean view of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub success: bool,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Selecting,
    Archiving,
    Rendering,
    Attaching,
    Sending,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Selecting => "selecting",
            Self::Archiving => "archiving",
            Self::Rendering => "rendering",
            Self::Attaching => "attaching",
            Self::Sending => "sending",
        };
        f.write_str(s)
    }
}

/// Terminal state of one dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Every stage completed and the transport accepted the message.
    Delivered { archive: BuiltArchive },
    /// The pipeline stopped at `stage`; nothing after it ran.
    Failed {
        stage: Stage,
        error: FileMailerError,
    },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn result(&self) -> DispatchResult {
        DispatchResult {
            success: self.is_success(),
        }
    }

    /// Classification of the failure, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Delivered { .. } => None,
            Self::Failed { error, .. } => Some(error.kind()),
        }
    }

    /// Stage the pipeline stopped at, if it failed.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Delivered { .. } => None,
            Self::Failed { stage, .. } => Some(*stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_collapses_to_false() {
        let outcome = DispatchOutcome::Failed {
            stage: Stage::Rendering,
            error: FileMailerError::TemplateNotFound("x".into()),
        };
        assert_eq!(outcome.result(), DispatchResult { success: false });
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Template));
        assert_eq!(outcome.failed_stage(), Some(Stage::Rendering));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Archiving.to_string(), "archiving");
    }
}
