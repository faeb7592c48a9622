//! `engine` crate — domain models, DAG validation, the workflow store, and
//! the execution engine itself.

pub mod dag;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;

pub use dag::validate_dag;
pub use engine::{ResultMap, StoredWorkflowRunner, WorkflowEngine};
pub use error::EngineError;
pub use models::{Edge, Node, Workflow};
pub use store::WorkflowStore;

#[cfg(test)]
mod engine_tests;
