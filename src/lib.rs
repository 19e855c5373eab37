//! SonarQube infrastructure-as-code provider.
//!
//! This crate maps declarative resource configuration onto the SonarQube
//! web API and keeps local state synchronized with the server across the
//! standard lifecycle: create, read (refresh), delete, and import of
//! pre-existing resources.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **Schema types**: Types for describing the provider configuration and
//!   resource schemas, including force-new and default markers
//! - **ProviderService trait**: The lifecycle contract an orchestrator
//!   drives, with [`SonarqubeProvider`] as its implementation
//! - **ApiClient**: A shared HTTP client for the SonarQube web API with
//!   token or basic authentication
//! - **ResourceState**: The per-instance state record the operations
//!   reconcile against remote state
//! - **Error types**: The transport/remote/decode error taxonomy
//! - **Logging**: Integration with `tracing` for structured logging
//! - **Testing**: A [`testing::ProviderTester`] harness for driving the
//!   lifecycle in tests
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_provider_sonarqube::{ProviderService, SonarqubeProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hemmer_provider_sonarqube::init_logging();
//!
//!     let provider = SonarqubeProvider::new();
//!     provider
//!         .configure(json!({
//!             "url": "https://sonarqube.example.com",
//!             "token": std::env::var("SONAR_TOKEN")?,
//!         }))
//!         .await?;
//!
//!     let state = provider
//!         .create(
//!             "sonarqube_project",
//!             json!({
//!                 "name": "Demo",
//!                 "project": "demo-key",
//!                 "visibility": "private",
//!             }),
//!         )
//!         .await?;
//!
//!     println!("created project {}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Resource Lifecycle
//!
//! Every `sonarqube_project` attribute is force-new: there is no in-place
//! update, so any configuration change plans as destroy-then-recreate. A
//! read that finds the remote project gone clears the identifier and
//! reports the resource absent, which makes the orchestrator schedule
//! recreation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod logging;
pub mod project;
pub mod provider;
pub mod schema;
pub mod state;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::ApiClient;
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::{ProviderService, SonarqubeProvider};
pub use schema::ProviderSchema;
pub use state::ResourceState;
pub use types::{AttributeChange, ImportedResource, PlanResult};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
