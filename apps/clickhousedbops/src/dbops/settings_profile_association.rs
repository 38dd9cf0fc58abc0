use tracing::info;

use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{AlterRole, AlterUser, QueryBuilder};

/// What a settings profile gets attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsProfileTarget {
    /// A role, by UUID.
    Role(String),
    /// A user, by UUID or name.
    User(String),
}

impl SettingsProfileTarget {
    pub fn from_ids(role_id: Option<&str>, user_id: Option<&str>) -> Result<Self, DbOpsError> {
        match (role_id, user_id) {
            (Some(role), None) => Ok(SettingsProfileTarget::Role(role.to_string())),
            (None, Some(user)) => Ok(SettingsProfileTarget::User(user.to_string())),
            (Some(_), Some(_)) => Err(DbOpsError::InvalidArgument(
                "only one of role_id or user_id can be set".to_string(),
            )),
            (None, None) => Err(DbOpsError::InvalidArgument(
                "neither role_id nor user_id were specified".to_string(),
            )),
        }
    }
}

impl DbOpsClient {
    async fn settings_profile_name_for_association(
        &self,
        settings_profile_id: &str,
        cluster_name: Option<&str>,
    ) -> Result<String, DbOpsError> {
        self.get_settings_profile(settings_profile_id, cluster_name)
            .await?
            .map(|profile| profile.name)
            .ok_or_else(|| DbOpsError::not_found("settings profile", settings_profile_id))
    }

    /// Roles gain the profile next to their existing ones; a user has its
    /// settings replaced by the profile.
    pub async fn associate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let profile_name = self
            .settings_profile_name_for_association(settings_profile_id, cluster_name)
            .await?;

        let sql = match target {
            SettingsProfileTarget::Role(role_id) => {
                let role = self
                    .get_role(role_id, cluster_name)
                    .await?
                    .ok_or_else(|| DbOpsError::not_found("role", role_id))?;
                AlterRole::new(&role.name)
                    .with_cluster(cluster_name)
                    .add_settings_profile(Some(&profile_name))
                    .build()?
            }
            SettingsProfileTarget::User(reference) => {
                let user = self
                    .resolve_user(reference, cluster_name)
                    .await?
                    .ok_or_else(|| DbOpsError::not_found("user", reference))?;
                AlterUser::new(&user.name)
                    .with_cluster(cluster_name)
                    .set_settings_profile(Some(&profile_name))
                    .build()?
            }
        };

        self.exec(&sql).await?;
        info!("Associated settings profile {} with {:?}", profile_name, target);
        Ok(())
    }

    pub async fn disassociate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let profile_name = self
            .settings_profile_name_for_association(settings_profile_id, cluster_name)
            .await?;

        let sql = match target {
            SettingsProfileTarget::Role(role_id) => {
                let role = self
                    .get_role(role_id, cluster_name)
                    .await?
                    .ok_or_else(|| DbOpsError::not_found("role", role_id))?;
                AlterRole::new(&role.name)
                    .with_cluster(cluster_name)
                    .drop_settings_profile(Some(&profile_name))
                    .build()?
            }
            SettingsProfileTarget::User(reference) => {
                let user = self
                    .resolve_user(reference, cluster_name)
                    .await?
                    .ok_or_else(|| DbOpsError::not_found("user", reference))?;
                AlterUser::new(&user.name)
                    .with_cluster(cluster_name)
                    .clear_settings()
                    .build()?
            }
        };

        self.exec(&sql).await?;
        info!(
            "Disassociated settings profile {} from {:?}",
            profile_name, target
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::infrastructure::clickhouse::mock::MockClickhouseClient;

    const PROFILE_ID: &str = "11111111-2222-4333-8444-555555555555";
    const ROLE_ID: &str = "66666666-7777-4888-9999-aaaaaaaaaaaa";
    const USER_ID: &str = "bbbbbbbb-cccc-4ddd-8eee-ffffffffffff";

    fn mock_profile(mock: &MockClickhouseClient) {
        mock.respond(
            &format!("WHERE `id` = '{PROFILE_ID}'"),
            vec![json!({ "name": "limited" })],
        );
    }

    fn mock_role(mock: &MockClickhouseClient) {
        mock.respond(
            &format!("WHERE `id` = '{ROLE_ID}'"),
            vec![json!({ "name": "reader" })],
        );
    }

    fn mock_user(mock: &MockClickhouseClient) {
        mock.respond(
            &format!("WHERE `id` = '{USER_ID}'"),
            vec![json!({
                "id": USER_ID,
                "name": "john",
                "auth_params": "{}",
                "default_roles_list": "[]",
            })],
        );
    }

    #[test]
    fn test_target_requires_exactly_one_id() {
        assert_eq!(
            SettingsProfileTarget::from_ids(Some("r"), None).unwrap(),
            SettingsProfileTarget::Role("r".to_string())
        );
        assert_eq!(
            SettingsProfileTarget::from_ids(None, Some("u")).unwrap(),
            SettingsProfileTarget::User("u".to_string())
        );
        assert!(SettingsProfileTarget::from_ids(None, None).is_err());
        assert!(SettingsProfileTarget::from_ids(Some("r"), Some("u")).is_err());
    }

    #[tokio::test]
    async fn test_associate_with_role() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock);
        mock_role(&mock);
        let client = DbOpsClient::new(mock.clone());

        client
            .associate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::Role(ROLE_ID.to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            mock.executed(),
            vec!["ALTER ROLE `reader` ADD PROFILE 'limited';"]
        );
    }

    #[tokio::test]
    async fn test_associate_with_user_by_uuid() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock);
        mock_user(&mock);
        let client = DbOpsClient::new(mock.clone());

        client
            .associate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::User(USER_ID.to_string()),
                Some("c1"),
            )
            .await
            .unwrap();
        assert_eq!(
            mock.executed(),
            vec!["ALTER USER `john` ON CLUSTER 'c1' SETTINGS PROFILE 'limited';"]
        );
    }

    #[tokio::test]
    async fn test_disassociate_from_role_and_user() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock_profile(&mock);
        mock_role(&mock);
        mock_profile(&mock);
        mock_user(&mock);
        let client = DbOpsClient::new(mock.clone());

        client
            .disassociate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::Role(ROLE_ID.to_string()),
                None,
            )
            .await
            .unwrap();
        client
            .disassociate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::User(USER_ID.to_string()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            mock.executed(),
            vec![
                "ALTER ROLE `reader` DROP PROFILES 'limited';",
                "ALTER USER `john` SETTINGS NONE;",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_profile_role_or_user() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());
        let err = client
            .associate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::Role(ROLE_ID.to_string()),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbOpsError::NotFound {
                kind: "settings profile",
                ..
            }
        ));

        mock_profile(&mock);
        let err = client
            .associate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::Role(ROLE_ID.to_string()),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbOpsError::NotFound { kind: "role", .. }));

        mock_profile(&mock);
        let err = client
            .associate_settings_profile(
                PROFILE_ID,
                &SettingsProfileTarget::User("ghost".to_string()),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbOpsError::NotFound { kind: "user", .. }));
        assert!(mock.executed().is_empty());
    }
}
