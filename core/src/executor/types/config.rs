use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Run-scoped execution options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOpts {
    /// Maximum tasks in flight at once. `None` dispatches every task of a
    /// stage together; values below 1 are clamped to 1.
    pub max_concurrency: Option<usize>,

    /// Overall deadline for the whole run, measured from run entry. Overrides
    /// a deadline attached to the builder.
    pub timeout: Option<Duration>,
}
