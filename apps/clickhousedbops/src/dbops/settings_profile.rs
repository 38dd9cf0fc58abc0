use itertools::Itertools;
use tracing::info;

use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{
    AlterSettingsProfile, CreateSettingsProfile, DropSettingsProfile, Field, Order, QueryBuilder,
    QueryBuilderError, Select, Where,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsProfile {
    pub id: String,
    pub name: String,
    /// Parent profiles, in `index` order.
    pub inherit_from: Vec<String>,
}

impl DbOpsClient {
    pub async fn create_settings_profile(
        &self,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError> {
        let sql = CreateSettingsProfile::new(name)
            .with_cluster(cluster_name)
            .inherit_from(inherit_from)
            .build()?;
        self.exec(&sql).await?;
        info!("Created settings profile {}", name);

        self.get_settings_profile_by_name(name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("settings profile", name))
    }

    pub async fn get_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("name")], "system.settings_profiles")
                    .with_cluster(cluster_name)
                    .where_([Where::equals("id", id)]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let name = row.get_string("name")?;

        let inherit_from = self
            .select(
                Select::new(
                    vec![Field::new("inherit_profile")],
                    "system.settings_profile_elements",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("profile_name", &name),
                    Where::differs("inherit_profile", None::<String>),
                ])
                .order_by(Field::new("index"), Order::Asc),
            )
            .await?
            .iter()
            .map(|row| row.get_nullable_string("inherit_profile"))
            .filter_map_ok(|profile| profile)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .unique()
            .collect();

        Ok(Some(SettingsProfile {
            id: id.to_string(),
            name,
            inherit_from,
        }))
    }

    pub async fn get_settings_profile_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![Field::new("id").to_string_fn()],
                    "system.settings_profiles",
                )
                .with_cluster(cluster_name)
                .where_([Where::equals("name", name)]),
            )
            .await?;

        match rows.first() {
            Some(row) => {
                self.get_settings_profile(&row.get_string("id")?, cluster_name)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Renames the profile and reconciles its parents with `inherit_from`.
    pub async fn update_settings_profile(
        &self,
        id: &str,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError> {
        let existing = self
            .get_settings_profile(id, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("settings profile", id))?;

        match AlterSettingsProfile::new(&existing.name)
            .rename_to(Some(name))
            .with_cluster(cluster_name)
            .inherit_from(&existing.inherit_from, inherit_from)
            .build()
        {
            Ok(sql) => {
                self.exec(&sql).await?;
                info!("Updated settings profile {}", existing.name);
            }
            Err(QueryBuilderError::NoChange) => {}
            Err(e) => return Err(e.into()),
        }

        self.get_settings_profile(id, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("settings profile", id))
    }

    pub async fn delete_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let Some(profile) = self.get_settings_profile(id, cluster_name).await? else {
            return Ok(());
        };

        let sql = DropSettingsProfile::new(&profile.name)
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Dropped settings profile {}", profile.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::infrastructure::clickhouse::mock::MockClickhouseClient;

    const PROFILE_ID: &str = "9d8c7b6a-5f4e-4d3c-8b2a-190817263544";

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
    async fn test_create_settings_profile() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            "FROM system.settings_profiles WHERE `name` = 'limited'",
            vec![json!({ "id": PROFILE_ID })],
        );
        mock_profile(&mock, "limited", &["base", "readonly"]);
        let client = DbOpsClient::new(mock.clone());

        let profile = client
            .create_settings_profile(
                "limited",
                &["base".to_string(), "readonly".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(profile.id, PROFILE_ID);
        assert_eq!(profile.inherit_from, vec!["base", "readonly"]);
        assert_eq!(
            mock.executed(),
            vec!["CREATE SETTINGS PROFILE IF NOT EXISTS `limited` SETTINGS INHERIT 'base', INHERIT 'readonly';"]
        );
    }

    #[tokio::test]
    async fn test_inheritance_is_read_in_index_order() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &[]);
        let client = DbOpsClient::new(mock.clone());

        client
            .get_settings_profile(PROFILE_ID, Some("c1"))
            .await
            .unwrap();

        let selected = mock.selected();
        assert_eq!(
            selected[1],
            "SELECT `inherit_profile` FROM clusterAllReplicas('c1', system.settings_profile_elements) \
             WHERE `profile_name` = 'limited' AND `inherit_profile` IS NOT NULL ORDER BY `index` ASC;"
        );
    }

    #[tokio::test]
    async fn test_missing_profile_by_name() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock);
        assert!(client
            .get_settings_profile_by_name("nope", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_settings_profile_diffs_inheritance() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &["a", "b"]);
        mock_profile(&mock, "limited2", &["b", "c"]);
        let client = DbOpsClient::new(mock.clone());

        let profile = client
            .update_settings_profile(
                PROFILE_ID,
                "limited2",
                &["b".to_string(), "c".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(profile.name, "limited2");
        assert_eq!(
            mock.executed(),
            vec!["ALTER SETTINGS PROFILE `limited` RENAME TO `limited2` DROP PROFILES 'a', 'b' ADD PROFILES 'b', 'c';"]
        );
    }

    #[tokio::test]
    async fn test_update_settings_profile_reorders_inheritance() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &["a", "b"]);
        mock_profile(&mock, "limited", &["b", "a"]);
        let client = DbOpsClient::new(mock.clone());

        let profile = client
            .update_settings_profile(
                PROFILE_ID,
                "limited",
                &["b".to_string(), "a".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(profile.inherit_from, vec!["b", "a"]);
        assert_eq!(
            mock.executed(),
            vec!["ALTER SETTINGS PROFILE `limited` DROP PROFILES 'a', 'b' ADD PROFILES 'b', 'a';"]
        );
    }

    #[tokio::test]
    async fn test_update_settings_profile_without_changes() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &["a"]);
        mock_profile(&mock, "limited", &["a"]);
        let client = DbOpsClient::new(mock.clone());

        client
            .update_settings_profile(PROFILE_ID, "limited", &["a".to_string()], None)
            .await
            .unwrap();
        assert!(mock.executed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_settings_profile() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock, "limited", &[]);
        let client = DbOpsClient::new(mock.clone());

        client
            .delete_settings_profile(PROFILE_ID, None)
            .await
            .unwrap();
        assert_eq!(
            mock.executed(),
            vec!["DROP SETTINGS PROFILE IF EXISTS `limited`;"]
        );

        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());
        client
            .delete_settings_profile(PROFILE_ID, None)
            .await
            .unwrap();
        assert!(mock.executed().is_empty());
    }
}
