use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::check_replicated_storage;
use crate::dbops::{Client, SettingsProfile, SettingsProfileTarget};
use crate::framework::{Diagnostics, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsProfileAssociationModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub settings_profile_id: Option<String>,
    #[serde(default)]
    pub settings_profile_name: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    /// UUID or name of the user.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SettingsProfileAssociationModel {
    fn target(&self) -> Result<SettingsProfileTarget, ResourceError> {
        SettingsProfileTarget::from_ids(self.role_id.as_deref(), self.user_id.as_deref())
            .summarize("Invalid Association Target")
    }
}

pub struct SettingsProfileAssociationResource {
    client: Arc<dyn Client>,
}

impl SettingsProfileAssociationResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }

    /// Looks the profile up by id when known, by name otherwise.
    async fn find_settings_profile(
        &self,
        model: &SettingsProfileAssociationModel,
    ) -> Result<Option<SettingsProfile>, ResourceError> {
        let cluster_name = model.cluster_name.as_deref();
        let id = model.settings_profile_id.as_deref().filter(|id| !id.is_empty());
        let name = model
            .settings_profile_name
            .as_deref()
            .filter(|name| !name.is_empty());

        match (id, name) {
            (Some(id), _) => self
                .client
                .get_settings_profile(id, cluster_name)
                .await
                .summarize("Error Looking Up Settings Profile"),
            (None, Some(name)) => self
                .client
                .get_settings_profile_by_name(name, cluster_name)
                .await
                .summarize("Error Looking Up Settings Profile"),
            (None, None) => Ok(None),
        }
    }

    async fn resolve_settings_profile(
        &self,
        plan: &SettingsProfileAssociationModel,
    ) -> Result<SettingsProfile, ResourceError> {
        if let Some(profile) = self.find_settings_profile(plan).await? {
            return Ok(profile);
        }

        Err(match (&plan.settings_profile_id, &plan.settings_profile_name) {
            (Some(id), _) => ResourceError::new(
                "Settings Profile Not Found",
                format!("Settings profile with ID {id:?} was not found"),
            )
            .at("settings_profile_id"),
            (None, Some(name)) => ResourceError::new(
                "Settings Profile Not Found",
                format!("Settings profile with name {name:?} was not found"),
            )
            .at("settings_profile_name"),
            (None, None) => ResourceError::new(
                "Missing Settings Profile Reference",
                "Either settings_profile_id or settings_profile_name must be provided.",
            ),
        })
    }
}

#[async_trait]
impl Resource for SettingsProfileAssociationResource {
    type Model = SettingsProfileAssociationModel;

    fn type_name(&self) -> &'static str {
        "settings_profile_association"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &[
            "cluster_name",
            "settings_profile_id",
            "settings_profile_name",
            "role_id",
            "user_id",
        ]
    }

    fn computed_attributes(&self) -> &'static [&'static str] {
        &["settings_profile_id", "settings_profile_name"]
    }

    async fn modify_plan(
        &self,
        plan: SettingsProfileAssociationModel,
        state: Option<&SettingsProfileAssociationModel>,
        diagnostics: &mut Diagnostics,
    ) -> SettingsProfileAssociationModel {
        // Once created, both profile attributes are known.
        if state.is_none()
            && plan.settings_profile_id.is_some() == plan.settings_profile_name.is_some()
        {
            diagnostics.add_error(
                "Invalid Settings Profile Reference",
                "Exactly one of 'settings_profile_id' or 'settings_profile_name' must be specified.",
            );
        }
        if plan.role_id.is_some() == plan.user_id.is_some() {
            diagnostics.add_error(
                "Invalid Association Target",
                "Exactly one of 'role_id' or 'user_id' must be specified.",
            );
        }
        if diagnostics.has_error() {
            return plan;
        }

        check_replicated_storage(
            &self.client,
            plan.cluster_name.as_deref(),
            "SettingsProfileAssociation resource",
            diagnostics,
        )
        .await;

        plan
    }

    async fn create(
        &self,
        plan: SettingsProfileAssociationModel,
    ) -> Result<SettingsProfileAssociationModel, ResourceError> {
        let profile = self.resolve_settings_profile(&plan).await?;
        let target = plan.target()?;

        self.client
            .associate_settings_profile(&profile.id, &target, plan.cluster_name.as_deref())
            .await
            .summarize("Error Associating Settings Profile")?;
        info!("Settings profile {} associated with {:?}", profile.name, target);

        Ok(SettingsProfileAssociationModel {
            settings_profile_id: Some(profile.id),
            settings_profile_name: Some(profile.name),
            ..plan
        })
    }

    async fn read(
        &self,
        mut state: SettingsProfileAssociationModel,
    ) -> Result<Option<SettingsProfileAssociationModel>, ResourceError> {
        // A deleted profile takes its associations with it.
        let Some(profile) = self.find_settings_profile(&state).await? else {
            return Ok(None);
        };

        let cluster_name = state.cluster_name.as_deref();
        let still_associated = match state.target()? {
            SettingsProfileTarget::Role(role_id) => self
                .client
                .get_role(&role_id, cluster_name)
                .await
                .summarize("Error Getting Role")?
                .is_some_and(|role| role.has_settings_profile(&profile.name)),
            SettingsProfileTarget::User(reference) => {
                let user = if uuid::Uuid::parse_str(&reference).is_ok() {
                    self.client.get_user_by_uuid(&reference, cluster_name).await
                } else {
                    self.client.get_user_by_name(&reference, cluster_name).await
                };
                user.summarize("Error Getting User")?
                    .is_some_and(|user| user.has_settings_profile(&profile.name))
            }
        };

        if !still_associated {
            return Ok(None);
        }

        state.settings_profile_id = Some(profile.id);
        state.settings_profile_name = Some(profile.name);
        Ok(Some(state))
    }

    async fn update(
        &self,
        _plan: SettingsProfileAssociationModel,
        _state: SettingsProfileAssociationModel,
    ) -> Result<SettingsProfileAssociationModel, ResourceError> {
        Err(ResourceError::new(
            "Update Not Supported",
            "Update operation is not supported for clickhousedbops_settings_profile_association resource",
        ))
    }

    async fn delete(&self, state: SettingsProfileAssociationModel) -> Result<(), ResourceError> {
        let profile_id = match state.settings_profile_id.clone().filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => match self.find_settings_profile(&state).await? {
                Some(profile) => profile.id,
                None => return Ok(()),
            },
        };

        self.client
            .disassociate_settings_profile(
                &profile_id,
                &state.target()?,
                state.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Deleting ClickHouse SettingsProfileAssociation")
    }

    async fn import(&self, _id: &str) -> Result<SettingsProfileAssociationModel, ResourceError> {
        Err(ResourceError::new(
            "Import Not Supported",
            "clickhousedbops_settings_profile_association cannot be imported",
        ))
    }
}
