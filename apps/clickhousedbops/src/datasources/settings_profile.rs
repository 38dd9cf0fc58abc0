use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dbops::Client;
use crate::framework::{DataSource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsProfileDataModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// UUID of the profile, filled in by the lookup.
    #[serde(default)]
    pub id: Option<String>,
}

/// Resolves a settings profile name to its UUID.
pub struct SettingsProfileDataSource {
    client: Arc<dyn Client>,
}

impl SettingsProfileDataSource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SettingsProfileDataSource {
    type Model = SettingsProfileDataModel;

    fn type_name(&self) -> &'static str {
        "settings_profile"
    }

    async fn read(
        &self,
        config: SettingsProfileDataModel,
    ) -> Result<SettingsProfileDataModel, ResourceError> {
        if config.name.is_empty() {
            return Err(ResourceError::new("Invalid input", "name must not be empty").at("name"));
        }

        let profile = self
            .client
            .get_settings_profile_by_name(&config.name, config.cluster_name.as_deref())
            .await
            .summarize("Error Reading Settings Profile")?
            .ok_or_else(|| {
                ResourceError::new(
                    "Not found",
                    format!("settings profile {:?} not found", config.name),
                )
            })?;
        debug!("Settings profile {} has id {}", profile.name, profile.id);

        Ok(SettingsProfileDataModel {
            id: Some(profile.id),
            ..config
        })
    }
}
