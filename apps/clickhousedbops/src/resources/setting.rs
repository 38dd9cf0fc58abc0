use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::{Client, Setting};
use crate::framework::{
    parse_import_id, Diagnostics, Resource, ResourceError, ResourceResultExt,
};
use crate::querybuilder::Writability;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub settings_profile_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub writability: Option<Writability>,
}

impl SettingModel {
    fn to_setting(&self) -> Setting {
        Setting {
            settings_profile_id: self.settings_profile_id.clone(),
            name: self.name.clone(),
            value: self.value.clone(),
            min: self.min.clone(),
            max: self.max.clone(),
            writability: self.writability,
        }
    }

    fn with_setting(self, setting: Setting) -> Self {
        Self {
            cluster_name: self.cluster_name,
            settings_profile_id: setting.settings_profile_id,
            name: setting.name,
            value: setting.value,
            min: setting.min,
            max: setting.max,
            writability: setting.writability,
        }
    }
}

pub struct SettingResource {
    client: Arc<dyn Client>,
}

impl SettingResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SettingResource {
    type Model = SettingModel;

    fn type_name(&self) -> &'static str {
        "setting"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &["cluster_name", "settings_profile_id", "name"]
    }

    fn computed_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    async fn modify_plan(
        &self,
        plan: SettingModel,
        _state: Option<&SettingModel>,
        diagnostics: &mut Diagnostics,
    ) -> SettingModel {
        if plan.value.is_none()
            && plan.min.is_none()
            && plan.max.is_none()
            && plan.writability.is_none()
        {
            diagnostics.add_error(
                "Invalid Setting Configuration",
                "At least one of 'value', 'min', 'max' or 'writability' must be specified.",
            );
        }
        plan
    }

    async fn create(&self, plan: SettingModel) -> Result<SettingModel, ResourceError> {
        let setting = self
            .client
            .create_setting(&plan.to_setting(), plan.cluster_name.as_deref())
            .await
            .summarize("Error Creating ClickHouse Setting")?;
        info!(
            "Setting {} added to settings profile {}",
            setting.name, setting.settings_profile_id
        );
        Ok(plan.with_setting(setting))
    }

    async fn read(&self, state: SettingModel) -> Result<Option<SettingModel>, ResourceError> {
        let setting = self
            .client
            .get_setting(
                &state.settings_profile_id,
                &state.name,
                state.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Reading ClickHouse Setting")?;
        Ok(setting.map(|setting| state.with_setting(setting)))
    }

    async fn update(
        &self,
        plan: SettingModel,
        _state: SettingModel,
    ) -> Result<SettingModel, ResourceError> {
        let setting = self
            .client
            .update_setting(&plan.to_setting(), plan.cluster_name.as_deref())
            .await
            .summarize("Error Updating ClickHouse Setting")?;
        Ok(plan.with_setting(setting))
    }

    async fn delete(&self, state: SettingModel) -> Result<(), ResourceError> {
        self.client
            .delete_setting(
                &state.settings_profile_id,
                &state.name,
                state.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Deleting ClickHouse Setting")
    }

    /// Accepts `[<cluster>:]<settings profile UUID>:<setting name>`.
    async fn import(&self, id: &str) -> Result<SettingModel, ResourceError> {
        let Some((profile_ref, name)) = id.rsplit_once(':') else {
            return Err(ResourceError::new(
                "Invalid Import ID",
                "expected [<cluster>:]<settings profile id>:<setting name>",
            ));
        };
        let (cluster_name, settings_profile_id) = parse_import_id(profile_ref);

        Ok(SettingModel {
            cluster_name,
            settings_profile_id,
            name: name.to_string(),
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

    const PROFILE_ID: &str = "2b3c4d5e-6f70-4182-93a4-b5c6d7e8f901";

    fn resource(mock: &Arc<MockClickhouseClient>) -> SettingResource {
        SettingResource::new(Arc::new(DbOpsClient::new(mock.clone())))
    }

    #[tokio::test]
    async fn test_modify_plan_requires_a_value_or_constraint() {
        let mock = Arc::new(MockClickhouseClient::new());
        let mut diagnostics = Diagnostics::new();
        resource(&mock)
            .modify_plan(
                SettingModel {
                    settings_profile_id: PROFILE_ID.to_string(),
                    name: "max_threads".to_string(),
                    ..Default::default()
                },
                None,
                &mut diagnostics,
            )
            .await;
        assert!(diagnostics.has_error());
    }

    #[tokio::test]
    async fn test_read_picks_up_server_values() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            &format!("WHERE `id` = '{PROFILE_ID}'"),
            vec![json!({ "name": "limited" })],
        );
        mock.respond(
            "`setting_name` = 'max_threads'",
            vec![json!({
                "setting_name": "max_threads",
                "value": "8",
                "min": null,
                "max": null,
                "writability": "CONST",
            })],
        );

        let state = SettingModel {
            settings_profile_id: PROFILE_ID.to_string(),
            name: "max_threads".to_string(),
            value: Some("4".to_string()),
            ..Default::default()
        };
        let read = resource(&mock).read(state).await.unwrap().unwrap();
        assert_eq!(read.value.as_deref(), Some("8"));
        assert_eq!(read.writability, Some(Writability::Const));
    }

    #[tokio::test]
    async fn test_import_id_forms() {
        let mock = Arc::new(MockClickhouseClient::new());
        let resource = resource(&mock);

        let imported = resource
            .import(&format!("c1:{PROFILE_ID}:max_threads"))
            .await
            .unwrap();
        assert_eq!(imported.cluster_name.as_deref(), Some("c1"));
        assert_eq!(imported.settings_profile_id, PROFILE_ID);
        assert_eq!(imported.name, "max_threads");

        let imported = resource
            .import(&format!("{PROFILE_ID}:max_threads"))
            .await
            .unwrap();
        assert_eq!(imported.cluster_name, None);

        assert!(resource.import("max_threads").await.is_err());
    }
}
