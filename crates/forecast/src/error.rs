use thiserror::Error;

/// Failure of the statistical model to fit a series.
///
/// Never surfaced to report callers: the guarded provider turns it into a
/// degraded forecast for the affected unit only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFitError {
    #[error("insufficient history: need {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("degenerate series: {0}")]
    Degenerate(String),

    #[error("normal equations are singular")]
    Singular,

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),
}

/// Failure to deliver a low-stock alert. Logged and swallowed by the policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("alert queue is full")]
    QueueFull,

    #[error("alert channel closed")]
    Closed,

    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid agent config: {0}")]
    InvalidConfig(String),

    #[error("failed to build forecast worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
