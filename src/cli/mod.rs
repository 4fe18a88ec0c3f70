//! Command line support: option strings, exit codes and the release pipeline
//! behind `punch`.

pub mod exit_codes;
pub mod options;
pub mod orchestration;

pub use options::parse_option_string;
pub use orchestration::{
    execute_release, file_summaries, plan_release, run_punch_workflow, ExecutionReport,
    FileReport, PunchWorkflowArgs, ReleasePlan, WorkflowResult,
};
