//! The `sonarqube_project` resource.
//!
//! Maps declarative project configuration (name, key, visibility) onto the
//! server's `api/projects` endpoints and reconciles the responses back into
//! the local [`ResourceState`]. There is no in-place update: every
//! configuration attribute is force-new, so changes destroy and recreate
//! the project.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::client::{expect_status, read_json, ApiClient};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};
use crate::state::ResourceState;

/// The resource type name this module serves.
pub const RESOURCE_TYPE: &str = "sonarqube_project";

/// Visibility applied when the configuration does not set one.
pub const DEFAULT_VISIBILITY: &str = "public";

/// The visibility values the server accepts.
pub const VISIBILITIES: [&str; 2] = ["public", "private"];

/// A project as the server reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProject {
    /// The unique project key; doubles as the local identifier.
    pub key: String,
    /// Display name.
    pub name: String,
    /// `"public"` or `"private"`.
    pub visibility: String,
}

#[derive(Debug, Deserialize)]
struct CreateProjectResponse {
    project: RemoteProject,
}

#[derive(Debug, Deserialize)]
struct SearchProjectsResponse {
    components: Vec<RemoteProject>,
}

/// Outcome of refreshing a project from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The project was found and the local state refreshed from it.
    Found,
    /// The project no longer exists remotely; the identifier was cleared
    /// so the orchestrator schedules recreation.
    Gone,
}

/// Schema for the `sonarqube_project` resource.
///
/// All three attributes are force-new: the server offers no in-place
/// rename or visibility change through this API, so any change replaces
/// the project.
pub fn schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_force_new()
                .with_description("Display name of the project"),
        )
        .with_attribute(
            "project",
            Attribute::required_string()
                .with_force_new()
                .with_description("Unique key of the project on the server"),
        )
        .with_attribute(
            "visibility",
            Attribute::optional_string()
                .with_force_new()
                .with_default(json!(DEFAULT_VISIBILITY))
                .with_description("Project visibility, \"public\" or \"private\""),
        )
}

/// Create the project on the server and record its key as the identifier.
///
/// Issues `POST api/projects/create`. Any non-200 answer fails with the
/// response body verbatim; a 200 answer whose body does not decode fails
/// with a decode error rather than leaving the identifier unset.
#[instrument(skip_all, fields(project = state.get_str("project").unwrap_or_default()))]
pub async fn create(client: &ApiClient, state: &mut ResourceState) -> Result<(), ProviderError> {
    let name = require_string(state, "name")?;
    let project = require_string(state, "project")?;
    let visibility = state
        .get_str("visibility")
        .unwrap_or(DEFAULT_VISIBILITY)
        .to_string();

    let response = client
        .post(
            "api/projects/create",
            &[
                ("name", name.as_str()),
                ("project", project.as_str()),
                ("visibility", visibility.as_str()),
            ],
        )
        .await?;
    let response = expect_status(response, StatusCode::OK).await?;
    let created: CreateProjectResponse = read_json(response).await?;

    state.set("visibility", visibility);
    state.set_id(created.project.key);
    info!(key = state.id(), "project created");
    Ok(())
}

/// Refresh the local state from the server.
///
/// Issues `GET api/projects/search` for the identifier and scans the
/// returned components for a matching key. On a match the local `name`,
/// `project` and `visibility` are overwritten from the remote entry; when
/// the key is missing the identifier is cleared and [`ReadOutcome::Gone`]
/// is returned.
#[instrument(skip_all, fields(key = state.id()))]
pub async fn read(
    client: &ApiClient,
    state: &mut ResourceState,
) -> Result<ReadOutcome, ProviderError> {
    let key = state.id().to_string();
    if key.is_empty() {
        return Err(ProviderError::Validation(
            "resource has no identifier to read".to_string(),
        ));
    }

    let response = client
        .get("api/projects/search", &[("projects", key.as_str())])
        .await?;
    let response = expect_status(response, StatusCode::OK).await?;
    let found: SearchProjectsResponse = read_json(response).await?;

    match found.components.into_iter().find(|c| c.key == key) {
        Some(remote) => {
            state.set("name", remote.name);
            state.set("visibility", remote.visibility);
            state.set("project", remote.key.clone());
            state.set_id(remote.key);
            Ok(ReadOutcome::Found)
        },
        None => {
            info!(key, "project no longer exists remotely");
            state.clear_id();
            Ok(ReadOutcome::Gone)
        },
    }
}

/// Delete the project on the server.
///
/// Issues `POST api/projects/delete`; only a 204 counts as success. The
/// local record is left untouched, since the orchestrator removes it once
/// the operation succeeds.
#[instrument(skip_all, fields(key = state.id()))]
pub async fn delete(client: &ApiClient, state: &ResourceState) -> Result<(), ProviderError> {
    let response = client
        .post("api/projects/delete", &[("projects", state.id())])
        .await?;
    expect_status(response, StatusCode::NO_CONTENT).await?;
    info!(key = state.id(), "project deleted");
    Ok(())
}

/// Adopt an existing project by key.
///
/// Seeds a state with the supplied identifier and delegates to [`read`];
/// fails with [`ProviderError::NotFound`] when the server has no project
/// under that key.
#[instrument(skip(client))]
pub async fn import(client: &ApiClient, id: &str) -> Result<ResourceState, ProviderError> {
    let mut state = ResourceState::with_id(id);
    match read(client, &mut state).await? {
        ReadOutcome::Found => Ok(state),
        ReadOutcome::Gone => Err(ProviderError::NotFound(id.to_string())),
    }
}

fn require_string(state: &ResourceState, name: &str) -> Result<String, ProviderError> {
    state
        .get_str(name)
        .map(str::to_owned)
        .ok_or_else(|| ProviderError::Validation(format!("missing required attribute '{}'", name)))
}
