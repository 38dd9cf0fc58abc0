use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::Client;
use crate::framework::{parse_import_id, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsProfileModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Parent profiles, applied in order.
    #[serde(default)]
    pub inherit_from: Vec<String>,
}

pub struct SettingsProfileResource {
    client: Arc<dyn Client>,
}

impl SettingsProfileResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

fn profile_id(state: &SettingsProfileModel) -> Result<&str, ResourceError> {
    state.id.as_deref().ok_or_else(|| {
        ResourceError::new("Missing Settings Profile ID", "state has no settings profile id")
            .at("id")
    })
}

#[async_trait]
impl Resource for SettingsProfileResource {
    type Model = SettingsProfileModel;

    fn type_name(&self) -> &'static str {
        "settings_profile"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &["cluster_name"]
    }

    async fn create(
        &self,
        plan: SettingsProfileModel,
    ) -> Result<SettingsProfileModel, ResourceError> {
        let profile = self
            .client
            .create_settings_profile(&plan.name, &plan.inherit_from, plan.cluster_name.as_deref())
            .await
            .summarize("Error Creating ClickHouse Settings Profile")?;
        info!("Settings profile {} created", profile.name);

        Ok(SettingsProfileModel {
            cluster_name: plan.cluster_name,
            id: Some(profile.id),
            name: profile.name,
            inherit_from: profile.inherit_from,
        })
    }

    async fn read(
        &self,
        state: SettingsProfileModel,
    ) -> Result<Option<SettingsProfileModel>, ResourceError> {
        let profile = self
            .client
            .get_settings_profile(profile_id(&state)?, state.cluster_name.as_deref())
            .await
            .summarize("Error Reading ClickHouse Settings Profile")?;

        Ok(profile.map(|profile| SettingsProfileModel {
            cluster_name: state.cluster_name,
            id: Some(profile.id),
            name: profile.name,
            inherit_from: profile.inherit_from,
        }))
    }

    async fn update(
        &self,
        plan: SettingsProfileModel,
        state: SettingsProfileModel,
    ) -> Result<SettingsProfileModel, ResourceError> {
        let profile = self
            .client
            .update_settings_profile(
                profile_id(&state)?,
                &plan.name,
                &plan.inherit_from,
                plan.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Updating ClickHouse Settings Profile")?;

        Ok(SettingsProfileModel {
            cluster_name: plan.cluster_name,
            id: Some(profile.id),
            name: profile.name,
            inherit_from: profile.inherit_from,
        })
    }

    async fn delete(&self, state: SettingsProfileModel) -> Result<(), ResourceError> {
        self.client
            .delete_settings_profile(profile_id(&state)?, state.cluster_name.as_deref())
            .await
            .summarize("Error Deleting ClickHouse Settings Profile")
    }

    /// Accepts `[<cluster>:]<UUID or name>`.
    async fn import(&self, id: &str) -> Result<SettingsProfileModel, ResourceError> {
        let (cluster_name, reference) = parse_import_id(id);

        let id = if uuid::Uuid::parse_str(&reference).is_ok() {
            reference
        } else {
            self.client
                .get_settings_profile_by_name(&reference, cluster_name.as_deref())
                .await
                .summarize("Cannot import settings profile by name")?
                .ok_or_else(|| {
                    ResourceError::new(
                        "Cannot import settings profile by name",
                        "Settings profile not found",
                    )
                })?
                .id
        };

        Ok(SettingsProfileModel {
            cluster_name,
            id: Some(id),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dbops::DbOpsClient;
    use crate::infrastructure::clickhouse::mock::MockClickhouseClient;

    const PROFILE_ID: &str = "9d8c7b6a-5f4e-4d3c-8b2a-190817263544";

    fn resource(mock: &Arc<MockClickhouseClient>) -> SettingsProfileResource {
        SettingsProfileResource::new(Arc::new(DbOpsClient::new(mock.clone())))
    }

    fn mock_profile(mock: &MockClickhouseClient, name: &str, parents: &[&str]) {
        mock.respond(
            &format!("WHERE `id` = '{PROFILE_ID}'"),
            vec![json!({ "name": name })],
        );
        mock.respond(
            &format!("WHERE `profile_name` = '{name}'"),
            parents
                .iter()
                .map(|p| json!({ "inherit_profile": p }))
                .collect(),
        );
    }

    #[tokio::test]
    async fn test_read_refreshes_inheritance() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &["base"]);

        let state = SettingsProfileModel {
            id: Some(PROFILE_ID.to_string()),
            name: "limited".to_string(),
            inherit_from: vec!["base".to_string(), "gone".to_string()],
            ..Default::default()
        };
        let read = resource(&mock).read(state).await.unwrap().unwrap();
        assert_eq!(read.inherit_from, vec!["base"]);
    }

    #[tokio::test]
    async fn test_update_renames_in_place() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &[]);
        mock_profile(&mock, "restricted", &["base"]);

        let state = SettingsProfileModel {
            id: Some(PROFILE_ID.to_string()),
            name: "limited".to_string(),
            ..Default::default()
        };
        let plan = SettingsProfileModel {
            name: "restricted".to_string(),
            inherit_from: vec!["base".to_string()],
            ..Default::default()
        };

        let updated = resource(&mock).update(plan, state).await.unwrap();
        assert_eq!(updated.id.as_deref(), Some(PROFILE_ID));
        assert_eq!(
            mock.executed(),
            vec!["ALTER SETTINGS PROFILE `limited` RENAME TO `restricted` ADD PROFILES 'base';"]
        );
    }

    #[tokio::test]
    async fn test_import_missing_profile_by_name() {
        let mock = Arc::new(MockClickhouseClient::new());
        let err = resource(&mock).import("c1:limited").await.unwrap_err();
        assert_eq!(err.detail, "Settings profile not found");
    }
}
