//! Service layer for veriscan-api

pub mod dashboard;
pub mod image_store;
pub mod offline;
pub mod orchestrator;
pub mod workflow;

pub use image_store::ImageStore;
pub use orchestrator::{BarcodeScanOutcome, Orchestrator};
pub use workflow::{HttpWorkflowClient, WorkflowEngine};
