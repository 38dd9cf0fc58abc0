use tracing::info;

use super::{DbOpsClient, DbOpsError, Grantee};
use crate::querybuilder::{
    Field, GrantPrivilege, QueryBuilder, RevokePrivilege, Select, Where,
};

/// A privilege on `database.table(column)`. Unset scopes mean "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeGrant {
    pub privilege: String,
    pub database: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub grantee: Grantee,
    pub grant_option: bool,
}

impl DbOpsClient {
    pub async fn grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<PrivilegeGrant, DbOpsError> {
        let sql = GrantPrivilege::new(&grant.privilege, grant.grantee.name())
            .on_database(grant.database.as_deref())
            .on_table(grant.table.as_deref())
            .on_column(grant.column.as_deref())
            .with_cluster(cluster_name)
            .with_grant_option(grant.grant_option)
            .build()?;
        self.exec(&sql).await?;
        info!(
            "Granted {} to {}",
            grant.privilege,
            grant.grantee.name()
        );

        self.get_grant_privilege(grant, cluster_name)
            .await?
            .ok_or_else(|| {
                DbOpsError::not_found(
                    "privilege grant",
                    format!("{} to {}", grant.privilege, grant.grantee.name()),
                )
            })
    }

    /// Looks up the row of `system.grants` matching the privilege, its scope
    /// and the grantee. `grant_option` is read back, not matched.
    pub async fn get_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<Option<PrivilegeGrant>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![
                        Field::new("access_type"),
                        Field::new("database"),
                        Field::new("table"),
                        Field::new("column"),
                        Field::new("user_name"),
                        Field::new("role_name"),
                        Field::new("grant_option"),
                    ],
                    "system.grants",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("access_type", &grant.privilege),
                    Where::equals("database", grant.database.as_deref()),
                    Where::equals("table", grant.table.as_deref()),
                    Where::equals("column", grant.column.as_deref()),
                    Where::equals(grant.grantee.column(), grant.grantee.name()),
                ]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        Ok(Some(PrivilegeGrant {
            privilege: row.get_string("access_type")?,
            database: row.get_nullable_string("database")?,
            table: row.get_nullable_string("table")?,
            column: row.get_nullable_string("column")?,
            grantee: Grantee::from_names(
                row.get_nullable_string("user_name")?.as_deref(),
                row.get_nullable_string("role_name")?.as_deref(),
            )?,
            grant_option: row.get_bool("grant_option")?,
        }))
    }

    pub async fn revoke_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let sql = RevokePrivilege::new(&grant.privilege, grant.grantee.name())
            .on_database(grant.database.as_deref())
            .on_table(grant.table.as_deref())
            .on_column(grant.column.as_deref())
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!(
            "Revoked {} from {}",
            grant.privilege,
            grant.grantee.name()
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
    use crate::querybuilder::QueryBuilderError;

    fn select_on_analytics() -> PrivilegeGrant {
        PrivilegeGrant {
            privilege: "SELECT".to_string(),
            database: Some("analytics".to_string()),
            table: None,
            column: None,
            grantee: Grantee::Role("reader".to_string()),
            grant_option: true,
        }
    }

    #[tokio::test]
    async fn test_grant_privilege_reads_back() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            "FROM system.grants",
            vec![json!({
                "access_type": "SELECT",
                "database": "analytics",
                "table": null,
                "column": null,
                "user_name": null,
                "role_name": "reader",
                "grant_option": true,
            })],
        );
        let client = DbOpsClient::new(mock.clone());

        let grant = client
            .grant_privilege(&select_on_analytics(), None)
            .await
            .unwrap();

        assert_eq!(grant, select_on_analytics());
        assert_eq!(
            mock.executed(),
            vec!["GRANT SELECT ON `analytics`.* TO `reader` WITH GRANT OPTION;"]
        );
        assert_eq!(
            mock.selected()[0],
            "SELECT `access_type`, `database`, `table`, `column`, `user_name`, `role_name`, `grant_option` \
             FROM system.grants WHERE `access_type` = 'SELECT' AND `database` = 'analytics' \
             AND `table` IS NULL AND `column` IS NULL AND `role_name` = 'reader';"
        );
    }

    #[tokio::test]
    async fn test_missing_privilege_grant() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock);
        assert_eq!(
            client
                .get_grant_privilege(&select_on_analytics(), Some("c1"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_invalid_privilege_is_rejected_before_running() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        let mut grant = select_on_analytics();
        grant.privilege = "select; DROP".to_string();
        let err = client.grant_privilege(&grant, None).await.unwrap_err();

        assert!(matches!(
            err,
            DbOpsError::QueryBuilder(QueryBuilderError::InvalidPrivilege(_))
        ));
        assert!(mock.executed().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_column_privilege_from_user() {
        let mock = Arc::new(MockClickhouseClient::new());
        let client = DbOpsClient::new(mock.clone());

        let grant = PrivilegeGrant {
            privilege: "SELECT".to_string(),
            database: Some("db".to_string()),
            table: Some("events".to_string()),
            column: Some("ts".to_string()),
            grantee: Grantee::User("john".to_string()),
            grant_option: false,
        };
        client
            .revoke_grant_privilege(&grant, Some("c1"))
            .await
            .unwrap();
        assert_eq!(
            mock.executed(),
            vec!["REVOKE ON CLUSTER 'c1' SELECT(`ts`) ON `db`.`events` FROM `john`;"]
        );
    }
}
