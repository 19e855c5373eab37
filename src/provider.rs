//! The provider service contract and its SonarQube implementation.
//!
//! [`ProviderService`] is the lifecycle contract an orchestrator drives:
//! schema discovery, configuration, plan, and the per-resource
//! create/read/delete/import operations. [`SonarqubeProvider`] implements
//! it for the `sonarqube_project` resource type.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::project;
use crate::schema::{Attribute, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::state::ResourceState;
use crate::types::{AttributeChange, ImportedResource, PlanResult};
use crate::validation;

/// Trait that provider implementations must implement.
///
/// State is exchanged as `serde_json::Value` records. A provider signals
/// that a resource no longer exists by returning `Value::Null` from
/// [`read`](ProviderService::read); the orchestrator then drops the record
/// and schedules recreation.
///
/// There is no update operation: providers whose resources are
/// replace-only (like this one) express every change as destroy-then-create
/// via [`plan`](ProviderService::plan) marking `requires_replace`.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all resource types.
    fn schema(&self) -> ProviderSchema;

    /// Resource type names this provider serves, derived from the schema.
    fn resource_types(&self) -> Vec<String> {
        self.schema().resources.keys().cloned().collect()
    }

    /// Validate the provider configuration before configuring.
    /// Returns diagnostics (errors and warnings).
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&self.schema().provider, &config))
    }

    /// Configure the provider with credentials and settings.
    /// Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))?;
        Ok(validation::validate(resource, &config))
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource, returning its state.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    ///
    /// Returns `Value::Null` when the remote entity no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value)
        -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for resource type '{}'",
            resource_type
        )))
    }
}

/// Provider for a SonarQube server.
///
/// Holds the shared [`ApiClient`] once [`configure`](ProviderService::configure)
/// has run; every lifecycle call clones that client, so operations for
/// different resource instances never contend on shared mutable state.
#[derive(Default)]
pub struct SonarqubeProvider {
    client: RwLock<Option<ApiClient>>,
}

impl SonarqubeProvider {
    /// Create an unconfigured provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider around an already-built client. Useful in tests.
    pub fn with_client(client: ApiClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }

    async fn client(&self) -> Result<ApiClient, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration(
                "provider is not configured; call configure() first".to_string(),
            )
        })
    }
}

#[async_trait::async_trait]
impl ProviderService for SonarqubeProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(
                Schema::v0()
                    .with_attribute(
                        "url",
                        Attribute::required_string()
                            .with_description("Base URL of the SonarQube server"),
                    )
                    .with_attribute(
                        "token",
                        Attribute::optional_string()
                            .sensitive()
                            .with_description("User token, used as Basic login with empty password"),
                    )
                    .with_attribute("user", Attribute::optional_string())
                    .with_attribute("password", Attribute::optional_string().sensitive()),
            )
            .with_resource(project::RESOURCE_TYPE, project::schema())
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validation::validate(&self.schema().provider, &config);
        if diagnostics
            .iter()
            .any(|d| matches!(d.severity, DiagnosticSeverity::Error))
        {
            return Ok(diagnostics);
        }

        let url = config.get("url").and_then(Value::as_str).unwrap_or_default();
        let mut client = match ApiClient::new(url) {
            Ok(client) => client,
            Err(e) => {
                return Ok(vec![Diagnostic::error("Invalid SonarQube server URL")
                    .with_detail(e.to_string())
                    .with_attribute("url")]);
            },
        };

        if let Some(token) = config.get("token").and_then(Value::as_str) {
            client = client.with_token(token);
        } else if let Some(user) = config.get("user").and_then(Value::as_str) {
            let password = config.get("password").and_then(Value::as_str);
            client = client.with_basic_auth(user, password);
        }

        info!(url, "provider configured");
        *self.client.write().await = Some(client);
        Ok(vec![])
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))?;
        let mut diagnostics = validation::validate(resource, &config);

        if resource_type == project::RESOURCE_TYPE {
            if let Some(visibility) = config.get("visibility").and_then(Value::as_str) {
                if !project::VISIBILITIES.contains(&visibility) {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid visibility '{}'", visibility))
                            .with_detail("Must be \"public\" or \"private\"")
                            .with_attribute("visibility"),
                    );
                }
            }
        }

        Ok(diagnostics)
    }

    #[instrument(skip_all, fields(resource_type))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        match resource_type {
            project::RESOURCE_TYPE => Ok(plan_for_schema(
                &project::schema(),
                prior_state.as_ref(),
                &proposed_state,
            )),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip_all, fields(resource_type))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        match resource_type {
            project::RESOURCE_TYPE => {
                let client = self.client().await?;
                let mut state = ResourceState::from_value(planned_state)?;
                project::create(&client, &mut state).await?;
                Ok(state.into_value())
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip_all, fields(resource_type))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        match resource_type {
            project::RESOURCE_TYPE => {
                let client = self.client().await?;
                let mut state = ResourceState::from_value(current_state)?;
                match project::read(&client, &mut state).await? {
                    project::ReadOutcome::Found => Ok(state.into_value()),
                    project::ReadOutcome::Gone => Ok(Value::Null),
                }
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip_all, fields(resource_type))]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        match resource_type {
            project::RESOURCE_TYPE => {
                let client = self.client().await?;
                let state = ResourceState::from_value(current_state)?;
                project::delete(&client, &state).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip_all, fields(resource_type, id))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        match resource_type {
            project::RESOURCE_TYPE => {
                let client = self.client().await?;
                let state = project::import(&client, id).await?;
                Ok(vec![ImportedResource::new(
                    project::RESOURCE_TYPE,
                    state.into_value(),
                )])
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

/// Diff prior against proposed state attribute-by-attribute.
///
/// Schema defaults are applied to the planned state first. For an existing
/// resource, any change to a force-new attribute marks the plan as
/// requiring replacement; unchanged states plan as no-ops.
fn plan_for_schema(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let mut planned = proposed.clone();
    if let Value::Object(map) = &mut planned {
        for (name, attr) in &schema.attributes {
            if let Some(default) = &attr.default {
                if map.get(name).map_or(true, Value::is_null) {
                    map.insert(name.clone(), default.clone());
                }
            }
        }
    }

    let prior = match prior {
        None => {
            let changes = schema
                .attributes
                .keys()
                .filter_map(|name| {
                    planned
                        .get(name)
                        .filter(|v| !v.is_null())
                        .map(|v| AttributeChange::added(name, v.clone()))
                })
                .collect();
            return PlanResult::with_changes(planned, changes, false);
        },
        Some(prior) => prior,
    };

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for (name, attr) in &schema.attributes {
        let before = prior.get(name).filter(|v| !v.is_null());
        let after = planned.get(name).filter(|v| !v.is_null());
        if before != after {
            changes.push(AttributeChange::new(
                name,
                before.cloned(),
                after.cloned(),
            ));
            requires_replace = requires_replace || attr.force_new;
        }
    }

    if changes.is_empty() {
        return PlanResult::no_change(prior.clone());
    }

    // Carry the identifier forward so the planned state stays addressable.
    if let Value::Object(map) = &mut planned {
        if let Some(id) = prior.get("id") {
            map.entry("id").or_insert(id.clone());
        }
    }
    PlanResult::with_changes(planned, changes, requires_replace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_lists_project_resource() {
        let provider = SonarqubeProvider::new();
        let schema = provider.schema();
        assert!(schema.resources.contains_key("sonarqube_project"));
        assert!(schema.provider.attributes.contains_key("url"));
        assert!(schema.provider.attributes["token"].flags.sensitive);
        assert_eq!(provider.resource_types(), vec!["sonarqube_project"]);
    }

    #[test]
    fn test_plan_create_applies_visibility_default() {
        let plan = plan_for_schema(
            &project::schema(),
            None,
            &json!({"name": "demo", "project": "demo-key"}),
        );

        assert_eq!(plan.planned_state["visibility"], "public");
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 3);
    }

    #[test]
    fn test_plan_identical_states_is_no_op() {
        let state = json!({
            "id": "demo-key",
            "name": "demo",
            "project": "demo-key",
            "visibility": "public"
        });
        let plan = plan_for_schema(&project::schema(), Some(&state), &state);

        assert!(plan.changes.is_empty());
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state, state);
    }

    #[test]
    fn test_plan_marks_replacement_on_change() {
        let prior = json!({
            "id": "demo-key",
            "name": "demo",
            "project": "demo-key",
            "visibility": "public"
        });
        let proposed = json!({
            "name": "renamed",
            "project": "demo-key",
            "visibility": "public"
        });
        let plan = plan_for_schema(&project::schema(), Some(&prior), &proposed);

        assert!(plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "name");
        // The identifier survives the diff.
        assert_eq!(plan.planned_state["id"], "demo-key");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_refuses_operations() {
        let provider = SonarqubeProvider::new();
        let err = provider
            .create("sonarqube_project", json!({"name": "demo", "project": "demo-key"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type_is_rejected() {
        let provider = SonarqubeProvider::new();
        let err = provider
            .plan("sonarqube_group", None, json!({}), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config_checks_visibility_enum() {
        let provider = SonarqubeProvider::new();
        let diagnostics = provider
            .validate_resource_config(
                "sonarqube_project",
                json!({"name": "demo", "project": "demo-key", "visibility": "internal"}),
            )
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("visibility".to_string()));
    }

    #[tokio::test]
    async fn test_validate_provider_config_requires_url() {
        let provider = SonarqubeProvider::new();
        let diagnostics = provider
            .validate_provider_config(json!({"token": "secret"}))
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("url".to_string()));
    }

    #[tokio::test]
    async fn test_configure_rejects_unparsable_url() {
        let provider = SonarqubeProvider::new();
        let diagnostics = provider
            .configure(json!({"url": "not a url"}))
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("url".to_string()));
    }
}
