use std::fmt;

use capture_core::YearStop;

/// Step of a page fetch; used in log context and debug snapshot names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Launch,
    Navigate,
    Consent,
    Render,
    Capture,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Launch => "launch",
            Stage::Navigate => "navigate",
            Stage::Consent => "consent",
            Stage::Render => "render",
            Stage::Capture => "capture",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (stage={stage}): {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub stage: Stage,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
        }
    }

    /// How the failure ends the current year, or `None` when the whole run
    /// cannot continue (no browser session can be started).
    pub fn year_stop(&self) -> Option<YearStop> {
        match self.kind {
            FailureKind::Launch => None,
            FailureKind::RenderTimeout => Some(YearStop::RenderTimeout),
            FailureKind::Navigation
            | FailureKind::Timeout
            | FailureKind::NavigationExhausted { .. }
            | FailureKind::Browser => Some(YearStop::FetchExhausted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Launch,
    Navigation,
    Timeout,
    NavigationExhausted { attempts: u32 },
    RenderTimeout,
    Browser,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Launch => write!(f, "browser launch failed"),
            FailureKind::Navigation => write!(f, "navigation error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::NavigationExhausted { attempts } => {
                write!(f, "navigation failed after {attempts} attempts")
            }
            FailureKind::RenderTimeout => write!(f, "listing render timeout"),
            FailureKind::Browser => write!(f, "browser error"),
        }
    }
}
