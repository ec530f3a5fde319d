use thiserror::Error;

/// Errors surfaced by a pipeline run.
///
/// All three variants are terminal for the run: the first one observed aborts
/// the remaining stages. Task-level failures carry the originating task name;
/// a timeout is not attributable to a single task.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The task body returned an error.
    #[error("task '{name}' failed: {source}")]
    TaskFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The task body panicked; the payload was recovered at the unit boundary.
    #[error("task '{name}' panicked: {message}")]
    TaskPanicked { name: String, message: String },

    /// The deadline elapsed before the stage finished.
    #[error("stage execution timeout")]
    StageTimeout,
}

impl ExecutorError {
    /// Name of the task the failure is attributable to, when there is one.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            Self::TaskFailed { name, .. } | Self::TaskPanicked { name, .. } => Some(name),
            Self::StageTimeout => None,
        }
    }

    /// Whether the run failed because the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::StageTimeout)
    }
}
