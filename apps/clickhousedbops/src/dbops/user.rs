use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DbOpsClient, DbOpsError};
use crate::infrastructure::clickhouse::Row;
use crate::querybuilder::{
    AlterUser, CreateUser, DropUser, Field, Identification, QueryBuilder, QueryBuilderError,
    Select, Where,
};

/// Desired state of a user being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub identification: Option<Identification>,
    pub default_role: Option<String>,
    pub settings_profile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub ssl_certificate_cn: Option<String>,
    pub default_roles: Vec<String>,
    pub settings_profiles: Vec<String>,
}

impl User {
    pub fn has_settings_profile(&self, profile_name: &str) -> bool {
        self.settings_profiles.iter().any(|p| p == profile_name)
    }
}

#[derive(Deserialize)]
struct AuthParams {
    #[serde(default)]
    common_names: Vec<String>,
}

/// `auth_params` is a JSON string on older servers and an array of JSON
/// strings (one per authentication method) on newer ones.
fn ssl_certificate_cn(row: &Row) -> Result<Option<String>, DbOpsError> {
    let params = match row.get_string_array("auth_params") {
        Ok(list) => list,
        Err(_) => row
            .get_nullable_string("auth_params")?
            .into_iter()
            .collect(),
    };

    Ok(params
        .iter()
        .filter_map(|p| serde_json::from_str::<AuthParams>(p).ok())
        .flat_map(|p| p.common_names)
        .next())
}

/// Parses the `toString()` rendering of an `Array(String)`, e.g. `['a','b']`.
pub(crate) fn parse_role_list(value: &str) -> Vec<String> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

impl DbOpsClient {
    pub async fn create_user(
        &self,
        user: &NewUser,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError> {
        let mut query = CreateUser::new(&user.name)
            .with_cluster(cluster_name)
            .with_default_role(user.default_role.as_deref())
            .with_settings_profile(user.settings_profile.as_deref());
        if let Some(identification) = &user.identification {
            query = query.identified(identification.clone());
        }

        self.exec(&query.build()?).await?;
        info!("Created user {}", user.name);

        self.get_user_by_name(&user.name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("user", &user.name))
    }

    pub async fn get_user_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        self.fetch_user(Where::equals("name", name), cluster_name)
            .await
    }

    pub async fn get_user_by_uuid(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        self.fetch_user(Where::equals("id", id), cluster_name).await
    }

    async fn fetch_user(
        &self,
        filter: Where,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![
                        Field::new("id").to_string_fn(),
                        Field::new("name"),
                        Field::new("auth_params"),
                        Field::new("default_roles_list").to_string_fn(),
                    ],
                    "system.users",
                )
                .with_cluster(cluster_name)
                .where_([filter]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let mut user = User {
            id: row.get_string("id")?,
            name: row.get_string("name")?,
            ssl_certificate_cn: ssl_certificate_cn(row)?,
            default_roles: parse_role_list(&row.get_string("default_roles_list")?),
            settings_profiles: Vec::new(),
        };

        user.settings_profiles = self
            .select(
                Select::new(
                    vec![Field::new("inherit_profile")],
                    "system.settings_profile_elements",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("user_name", &user.name),
                    Where::differs("inherit_profile", None::<String>),
                ]),
            )
            .await?
            .iter()
            .map(|row| row.get_nullable_string("inherit_profile"))
            .filter_map_ok(|profile| profile)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .unique()
            .collect();

        debug!("Fetched user {:?}", user);
        Ok(Some(user))
    }

    /// Renames a user. Renaming to the current name is a no-op.
    pub async fn update_user(
        &self,
        current_name: &str,
        new_name: &str,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError> {
        match AlterUser::new(current_name)
            .rename_to(Some(new_name))
            .with_cluster(cluster_name)
            .build()
        {
            Ok(sql) => {
                self.exec(&sql).await?;
                info!("Renamed user {} to {}", current_name, new_name);
            }
            Err(QueryBuilderError::NoChange) => {}
            Err(e) => return Err(e.into()),
        }

        self.get_user_by_name(new_name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("user", new_name))
    }

    pub async fn delete_user(&self, name: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError> {
        if self.get_user_by_name(name, cluster_name).await?.is_none() {
            return Ok(());
        }

        let sql = DropUser::new(name).with_cluster(cluster_name).build()?;
        self.exec(&sql).await?;
        info!("Dropped user {}", name);
        Ok(())
    }

    /// Resolves a user reference that is either a UUID or a name.
    pub(crate) async fn resolve_user(
        &self,
        reference: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        if uuid::Uuid::parse_str(reference).is_ok() {
            self.get_user_by_uuid(reference, cluster_name).await
        } else {
            self.get_user_by_name(reference, cluster_name).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::infrastructure::clickhouse::mock::MockClickhouseClient;

    const USER_ID: &str = "6a4f2b7e-9b3c-4a0e-8d3f-1c2b3a4d5e6f";

    fn user_row(name: &str) -> serde_json::Value {
        json!({
            "id": USER_ID,
            "name": name,
            "auth_params": "{}",
            "default_roles_list": "['reader','writer']",
        })
    }

    #[test]
    fn test_parse_role_list() {
        assert_eq!(parse_role_list("[]"), Vec::<String>::new());
        assert_eq!(parse_role_list(""), Vec::<String>::new());
        assert_eq!(parse_role_list("['a']"), vec!["a".to_string()]);
        assert_eq!(
            parse_role_list("['a', 'b','c']"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_ssl_certificate_cn_from_string_and_array() {
        let row = Row::new(
            json!({"auth_params": "{\"common_names\":[\"client.example\"]}"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(
            ssl_certificate_cn(&row).unwrap(),
            Some("client.example".to_string())
        );

        let row = Row::new(
            json!({"auth_params": ["{}", "{\"common_names\":[\"cn2\"]}"]})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(ssl_certificate_cn(&row).unwrap(), Some("cn2".to_string()));

        let row = Row::new(json!({"auth_params": null}).as_object().unwrap().clone());
        assert_eq!(ssl_certificate_cn(&row).unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_user_reads_back_state() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond("FROM system.users WHERE `name` = 'john'", vec![user_row("john")]);
        mock.respond(
            "FROM system.settings_profile_elements WHERE `user_name` = 'john'",
            vec![
                json!({"inherit_profile": "limited"}),
                json!({"inherit_profile": "limited"}),
            ],
        );
        let client = DbOpsClient::new(mock.clone());

        let user = client
            .create_user(
                &NewUser {
                    name: "john".to_string(),
                    identification: Some(Identification::Sha256Hash("abc".to_string())),
                    default_role: None,
                    settings_profile: Some("limited".to_string()),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            mock.executed(),
            vec![
                "CREATE USER IF NOT EXISTS `john` IDENTIFIED WITH sha256_hash BY 'abc' SETTINGS PROFILE 'limited';"
            ]
        );
        assert_eq!(user.id, USER_ID);
        assert_eq!(user.default_roles, vec!["reader", "writer"]);
        assert_eq!(user.settings_profiles, vec!["limited"]);
        assert!(user.has_settings_profile("limited"));
    }

    #[tokio::test]
    async fn test_create_user_not_found_after_create() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        let err = client
            .create_user(
                &NewUser {
                    name: "ghost".to_string(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbOpsError::NotFound { kind: "user", .. }));
    }

    #[tokio::test]
    async fn test_get_user_on_cluster_uses_all_replicas() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        assert!(client
            .get_user_by_uuid(USER_ID, Some("c1"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            mock.selected(),
            vec![format!(
                "SELECT toString(`id`) AS `id`, `name`, `auth_params`, toString(`default_roles_list`) AS `default_roles_list` \
                 FROM clusterAllReplicas('c1', system.users) WHERE `id` = '{USER_ID}';"
            )]
        );
    }

    #[tokio::test]
    async fn test_update_user_renames() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond("WHERE `name` = 'jane'", vec![user_row("jane")]);
        let client = DbOpsClient::new(mock.clone());

        let user = client.update_user("john", "jane", Some("c")).await.unwrap();
        assert_eq!(user.name, "jane");
        assert_eq!(
            mock.executed(),
            vec!["ALTER USER `john` RENAME TO `jane` ON CLUSTER 'c';"]
        );
    }

    #[tokio::test]
    async fn test_update_user_same_name_runs_nothing() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond("WHERE `name` = 'john'", vec![user_row("john")]);
        let client = DbOpsClient::new(mock.clone());

        client.update_user("john", "john", None).await.unwrap();
        assert!(mock.executed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_noop() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        client.delete_user("john", None).await.unwrap();
        assert!(mock.executed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond("WHERE `name` = 'john'", vec![user_row("john")]);
        let client = DbOpsClient::new(mock.clone());

        client.delete_user("john", None).await.unwrap();
        assert_eq!(mock.executed(), vec!["DROP USER IF EXISTS `john`;"]);
    }

    #[tokio::test]
    async fn test_resolve_user_by_uuid_or_name() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        client.resolve_user(USER_ID, None).await.unwrap();
        client.resolve_user("john", None).await.unwrap();
        let selected = mock.selected();
        assert!(selected[0].contains("WHERE `id` = "));
        assert!(selected[1].contains("WHERE `name` = 'john'"));
    }
}
