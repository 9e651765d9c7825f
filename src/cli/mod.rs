//! Command line workflows, independent of the argument parser.

pub mod orchestration;

pub use orchestration::{
    run_workflow, show, toggle_code_lens, CustomVersionArgs, WorkflowArgs, WorkflowResult,
};
