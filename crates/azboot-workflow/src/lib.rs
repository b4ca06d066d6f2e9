pub mod ensure;
pub mod error;
pub mod preflight;
pub mod report;
pub mod setup;
pub mod validate;

pub use ensure::{ensure, Ensured};
pub use error::WorkflowError;
pub use preflight::preflight;
pub use report::{
    CheckKind, CheckResult, CheckStatus, NoProgress, Progress, ResourceKind, SetupReport,
    SetupSummary, Step, StepStatus, ValidationReport,
};
pub use setup::{run_setup, SetupParams, DEFAULT_ROLE, DEFAULT_SUBJECT_VALUE};
pub use validate::{run_validation, ValidateParams};
