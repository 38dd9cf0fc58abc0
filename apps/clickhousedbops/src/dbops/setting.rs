use tracing::info;

use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{
    AlterSetting, Field, QueryBuilder, Select, SettingAction, Where, Writability,
};

/// One setting element of a settings profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setting {
    pub settings_profile_id: String,
    pub name: String,
    pub value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub writability: Option<Writability>,
}

impl Setting {
    fn alter(&self, profile_name: &str, action: SettingAction) -> AlterSetting {
        AlterSetting::new(profile_name, &self.name, action)
            .value(self.value.as_deref())
            .min(self.min.as_deref())
            .max(self.max.as_deref())
            .writability(self.writability)
    }
}

impl DbOpsClient {
    async fn settings_profile_name(
        &self,
        settings_profile_id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<String>, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("name")], "system.settings_profiles")
                    .with_cluster(cluster_name)
                    .where_([Where::equals("id", settings_profile_id)]),
            )
            .await?;

        match rows.first() {
            Some(row) => Ok(Some(row.get_string("name")?)),
            None => Ok(None),
        }
    }

    pub async fn create_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError> {
        let profile_name = self
            .settings_profile_name(&setting.settings_profile_id, cluster_name)
            .await?
            .ok_or_else(|| {
                DbOpsError::not_found("settings profile", &setting.settings_profile_id)
            })?;

        let sql = setting
            .alter(&profile_name, SettingAction::Add)
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Added setting {} to profile {}", setting.name, profile_name);

        self.get_setting(&setting.settings_profile_id, &setting.name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("setting", &setting.name))
    }

    pub async fn get_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Setting>, DbOpsError> {
        let Some(profile_name) = self
            .settings_profile_name(settings_profile_id, cluster_name)
            .await?
        else {
            return Ok(None);
        };

        let rows = self
            .select(
                Select::new(
                    vec![
                        Field::new("setting_name"),
                        Field::new("value"),
                        Field::new("min"),
                        Field::new("max"),
                        Field::new("writability"),
                    ],
                    "system.settings_profile_elements",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("profile_name", &profile_name),
                    Where::equals("setting_name", name),
                ]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        Ok(Some(Setting {
            settings_profile_id: settings_profile_id.to_string(),
            name: row.get_string("setting_name")?,
            value: row.get_nullable_string("value")?,
            min: row.get_nullable_string("min")?,
            max: row.get_nullable_string("max")?,
            writability: row
                .get_nullable_string("writability")?
                .as_deref()
                .and_then(Writability::from_sql),
        }))
    }

    /// Replaces the value and constraints of an existing setting element.
    pub async fn update_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError> {
        let profile_name = self
            .settings_profile_name(&setting.settings_profile_id, cluster_name)
            .await?
            .ok_or_else(|| {
                DbOpsError::not_found("settings profile", &setting.settings_profile_id)
            })?;

        let sql = setting
            .alter(&profile_name, SettingAction::Modify)
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Modified setting {} in profile {}", setting.name, profile_name);

        self.get_setting(&setting.settings_profile_id, &setting.name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("setting", &setting.name))
    }

    pub async fn delete_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let Some(profile_name) = self
            .settings_profile_name(settings_profile_id, cluster_name)
            .await?
        else {
            return Ok(());
        };

        let sql = AlterSetting::new(&profile_name, name, SettingAction::Drop)
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Dropped setting {} from profile {}", name, profile_name);
        Ok(())
    }
}
