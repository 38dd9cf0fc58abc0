use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::diagnostics::{Diagnostic, Diagnostics};

/// Failure of a single lifecycle step, surfaced to the host as an error
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{summary}: {detail}")]
pub struct ResourceError {
    pub summary: String,
    pub detail: String,
    pub attribute: Option<String>,
}

impl ResourceError {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl From<ResourceError> for Diagnostic {
    fn from(err: ResourceError) -> Self {
        let diagnostic = Diagnostic::error(err.summary, err.detail);
        match err.attribute {
            Some(attribute) => diagnostic.at(attribute),
            None => diagnostic,
        }
    }
}

impl From<ResourceError> for Diagnostics {
    fn from(err: ResourceError) -> Self {
        Diagnostic::from(err).into()
    }
}

pub trait ResourceResultExt<T> {
    /// Turns any error into a [`ResourceError`] whose detail is the full
    /// error chain.
    fn summarize(self, summary: &str) -> Result<T, ResourceError>;
}

impl<T, E> ResourceResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn summarize(self, summary: &str) -> Result<T, ResourceError> {
        self.map_err(|e| ResourceError::new(summary, format!("{:#}", anyhow::Error::new(e))))
    }
}

/// Outcome of planning a change against the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanModification<M> {
    pub plan: M,
    /// Attributes whose change cannot be applied in place.
    pub requires_replace: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Lifecycle of one kind of managed object.
///
/// Models are plain serde structs. Optional attributes that the user left
/// unset, and computed attributes not yet known, are `None`.
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    /// Type name without the provider prefix, e.g. `user`.
    fn type_name(&self) -> &'static str;

    /// Attributes that cannot change without destroying the object.
    fn replace_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Attributes filled in by the server. Carried over from state while the
    /// plan leaves them unknown.
    fn computed_attributes(&self) -> &'static [&'static str] {
        &["id"]
    }

    /// Attributes that are sent to the server but never stored in state.
    fn write_only_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Resource-specific plan checks. `state` is `None` on create.
    async fn modify_plan(
        &self,
        plan: Self::Model,
        _state: Option<&Self::Model>,
        _diagnostics: &mut Diagnostics,
    ) -> Self::Model {
        plan
    }

    async fn create(&self, plan: Self::Model) -> Result<Self::Model, ResourceError>;

    /// `Ok(None)` means the object is gone and must be removed from state.
    async fn read(&self, state: Self::Model) -> Result<Option<Self::Model>, ResourceError>;

    async fn update(
        &self,
        plan: Self::Model,
        state: Self::Model,
    ) -> Result<Self::Model, ResourceError>;

    async fn delete(&self, state: Self::Model) -> Result<(), ResourceError>;

    /// Builds the minimal state needed for a subsequent [`Resource::read`].
    async fn import(&self, id: &str) -> Result<Self::Model, ResourceError>;
}

/// Splits an import id of the form `<cluster>:<ref>` or `<ref>`.
pub fn parse_import_id(id: &str) -> (Option<String>, String) {
    match id.split_once(':') {
        Some((cluster, reference)) => (Some(cluster.to_string()), reference.to_string()),
        None => (None, id.to_string()),
    }
}

/// [`Resource`] with its model erased to JSON, so resources of different
/// kinds can share one registry.
#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;
    async fn modify_plan(&self, plan: Value, state: Option<Value>) -> PlanModification<Value>;
    async fn create(&self, plan: Value) -> Result<Value, Diagnostics>;
    async fn read(&self, state: Value) -> Result<Option<Value>, Diagnostics>;
    async fn update(&self, plan: Value, state: Value) -> Result<Value, Diagnostics>;
    async fn delete(&self, state: Value) -> Result<(), Diagnostics>;
    /// Imports the object and reads its full state.
    async fn import(&self, id: &str) -> Result<Value, Diagnostics>;
}

fn decode<M: DeserializeOwned>(value: Value) -> Result<M, Diagnostics> {
    serde_json::from_value(value)
        .map_err(|e| Diagnostic::error("Invalid resource data", e.to_string()).into())
}

fn encode<M: Serialize>(model: &M, write_only: &[&str]) -> Result<Value, Diagnostics> {
    let mut value = serde_json::to_value(model)
        .map_err(|e| Diagnostics::from(Diagnostic::error("Invalid resource data", e.to_string())))?;
    if let Value::Object(map) = &mut value {
        for attribute in write_only {
            if let Some(v) = map.get_mut(*attribute) {
                *v = Value::Null;
            }
        }
    }
    Ok(value)
}

fn attribute<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&Value::Null)
}

#[async_trait]
impl<R: Resource> DynResource for R {
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    async fn modify_plan(&self, plan: Value, state: Option<Value>) -> PlanModification<Value> {
        let mut diagnostics = Diagnostics::new();

        let decoded = decode::<R::Model>(plan.clone()).and_then(|plan| {
            let state = state.clone().map(decode::<R::Model>).transpose()?;
            Ok((plan, state))
        });
        let (plan_model, state_model) = match decoded {
            Ok(models) => models,
            Err(e) => {
                return PlanModification {
                    plan,
                    requires_replace: Vec::new(),
                    diagnostics: e,
                }
            }
        };

        let plan_model =
            Resource::modify_plan(self, plan_model, state_model.as_ref(), &mut diagnostics).await;
        let mut planned = match encode(&plan_model, &[]) {
            Ok(value) => value,
            Err(e) => {
                diagnostics.extend(e);
                plan
            }
        };

        let mut requires_replace = Vec::new();
        if let Some(state) = &state {
            let write_only = self.write_only_attributes();
            let computed = self.computed_attributes();

            // A write-only value is never in state, so only a configured
            // value can be compared, which would always differ.
            requires_replace = self
                .replace_attributes()
                .iter()
                .filter(|a| !write_only.contains(a))
                .filter(|a| {
                    let planned_value = attribute(&planned, a);
                    !(computed.contains(a) && planned_value.is_null())
                        && planned_value != attribute(state, a)
                })
                .map(|a| a.to_string())
                .collect();

            if requires_replace.is_empty() {
                if let Value::Object(map) = &mut planned {
                    for a in computed {
                        let carried = attribute(state, a);
                        if map.get(*a).map_or(true, Value::is_null) && !carried.is_null() {
                            map.insert(a.to_string(), carried.clone());
                        }
                    }
                }
            }
        }

        debug!(
            "Planned {} with replacement on {:?}",
            Resource::type_name(self),
            requires_replace
        );

        PlanModification {
            plan: planned,
            requires_replace,
            diagnostics,
        }
    }

    async fn create(&self, plan: Value) -> Result<Value, Diagnostics> {
        let created = Resource::create(self, decode(plan)?).await?;
        encode(&created, self.write_only_attributes())
    }

    async fn read(&self, state: Value) -> Result<Option<Value>, Diagnostics> {
        match Resource::read(self, decode(state)?).await? {
            Some(model) => Ok(Some(encode(&model, self.write_only_attributes())?)),
            None => Ok(None),
        }
    }

    async fn update(&self, plan: Value, state: Value) -> Result<Value, Diagnostics> {
        let updated = Resource::update(self, decode(plan)?, decode(state)?).await?;
        encode(&updated, self.write_only_attributes())
    }

    async fn delete(&self, state: Value) -> Result<(), Diagnostics> {
        Resource::delete(self, decode(state)?).await?;
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<Value, Diagnostics> {
        let imported = Resource::import(self, id).await?;
        match Resource::read(self, imported).await? {
            Some(model) => encode(&model, self.write_only_attributes()),
            None => Err(Diagnostic::error(
                "Cannot import resource",
                format!("{} '{}' not found", Resource::type_name(self), id),
            )
            .into()),
        }
    }
}
