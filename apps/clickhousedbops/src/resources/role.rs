use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::{Client, RoleUpdate};
use crate::framework::{parse_import_id, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// UUID of the role.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings_profile: Option<String>,
}

pub struct RoleResource {
    client: Arc<dyn Client>,
}

impl RoleResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }

    fn id(state: &RoleModel) -> Result<&str, ResourceError> {
        state
            .id
            .as_deref()
            .ok_or_else(|| ResourceError::new("Missing Role ID", "state has no role id").at("id"))
    }
}

#[async_trait]
impl Resource for RoleResource {
    type Model = RoleModel;

    fn type_name(&self) -> &'static str {
        "role"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &["cluster_name"]
    }

    async fn create(&self, plan: RoleModel) -> Result<RoleModel, ResourceError> {
        let role = self
            .client
            .create_role(
                &plan.name,
                plan.settings_profile.as_deref(),
                plan.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Creating ClickHouse Role")?;
        info!("Role {} created with id {}", role.name, role.id);

        Ok(RoleModel {
            id: Some(role.id),
            name: role.name,
            ..plan
        })
    }

    async fn read(&self, mut state: RoleModel) -> Result<Option<RoleModel>, ResourceError> {
        let Some(role) = self
            .client
            .get_role(Self::id(&state)?, state.cluster_name.as_deref())
            .await
            .summarize("Error Reading ClickHouse Role")?
        else {
            return Ok(None);
        };

        state.name = role.name.clone();
        state.settings_profile = state
            .settings_profile
            .filter(|profile| role.has_settings_profile(profile));

        Ok(Some(state))
    }

    async fn update(&self, plan: RoleModel, state: RoleModel) -> Result<RoleModel, ResourceError> {
        let role = self
            .client
            .update_role(
                Self::id(&state)?,
                &RoleUpdate {
                    name: plan.name.clone(),
                    drop_settings_profile: state.settings_profile.clone(),
                    add_settings_profile: plan.settings_profile.clone(),
                },
                plan.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Updating ClickHouse Role")?;

        Ok(RoleModel {
            id: Some(role.id),
            name: role.name,
            ..plan
        })
    }

    async fn delete(&self, state: RoleModel) -> Result<(), ResourceError> {
        self.client
            .delete_role(Self::id(&state)?, state.cluster_name.as_deref())
            .await
            .summarize("Error Deleting ClickHouse Role")
    }

    /// Accepts `[<cluster>:]<UUID or name>`.
    async fn import(&self, id: &str) -> Result<RoleModel, ResourceError> {
        let (cluster_name, reference) = parse_import_id(id);

        let id = if uuid::Uuid::parse_str(&reference).is_ok() {
            reference
        } else {
            self.client
                .find_role_by_name(&reference, cluster_name.as_deref())
                .await
                .summarize("Cannot import role by name")?
                .ok_or_else(|| ResourceError::new("Cannot import role by name", "Role not found"))?
                .id
        };

        Ok(RoleModel {
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

    const ROLE_ID: &str = "0f1e2d3c-4b5a-4968-8776-655443322110";

    fn resource(mock: &Arc<MockClickhouseClient>) -> RoleResource {
        RoleResource::new(Arc::new(DbOpsClient::new(mock.clone())))
    }

    fn mock_role(mock: &MockClickhouseClient, name: &str, profiles: &[&str]) {
        mock.respond(
            &format!("WHERE `id` = '{ROLE_ID}'"),
            vec![json!({ "name": name })],
        );
        mock.respond(
            &format!("WHERE `role_name` = '{name}'"),
            profiles
                .iter()
                .map(|p| json!({ "inherit_profile": p }))
                .collect(),
        );
    }

    fn state(settings_profile: Option<&str>) -> RoleModel {
        RoleModel {
            id: Some(ROLE_ID.to_string()),
            name: "reader".to_string(),
            settings_profile: settings_profile.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_read_keeps_attached_profile() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_role(&mock, "reader", &["limited"]);
        let read = resource(&mock)
            .read(state(Some("limited")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, state(Some("limited")));
    }

    #[tokio::test]
    async fn test_read_drops_detached_profile() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_role(&mock, "reader", &["other"]);
        let read = resource(&mock)
            .read(state(Some("limited")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.settings_profile, None);
    }

    #[tokio::test]
    async fn test_read_missing_role() {
        let mock = Arc::new(MockClickhouseClient::new());
        assert_eq!(resource(&mock).read(state(None)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_swaps_profile() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_role(&mock, "reader", &["old"]);
        mock_role(&mock, "reader", &["new"]);

        let updated = resource(&mock)
            .update(state(Some("new")), state(Some("old")))
            .await
            .unwrap();
        assert_eq!(updated.settings_profile.as_deref(), Some("new"));
        assert_eq!(
            mock.executed(),
            vec!["ALTER ROLE `reader` DROP PROFILES 'old' ADD PROFILE 'new';"]
        );
    }

    #[tokio::test]
    async fn test_import_by_name() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            "FROM system.roles WHERE `name` = 'reader'",
            vec![json!({ "id": ROLE_ID })],
        );
        mock_role(&mock, "reader", &[]);

        let imported = resource(&mock).import("reader").await.unwrap();
        assert_eq!(imported.id.as_deref(), Some(ROLE_ID));
        assert_eq!(imported.cluster_name, None);
    }

    #[tokio::test]
    async fn test_delete_without_id_fails() {
        let mock = Arc::new(MockClickhouseClient::new());
        let err = resource(&mock)
            .delete(RoleModel::default())
            .await
            .unwrap_err();
        assert_eq!(err.attribute.as_deref(), Some("id"));
    }
}
