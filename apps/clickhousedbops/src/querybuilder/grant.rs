use std::sync::LazyLock;

use regex::Regex;

use super::{backtick, ensure_name, finish, push_cluster, QueryBuilder, QueryBuilderError};

static PRIVILEGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9 _]*$").unwrap());

/// `GRANT [ON CLUSTER 'c'] <role> TO <grantee> [WITH ADMIN OPTION]`
#[derive(Debug, Clone, Default)]
pub struct GrantRole {
    role_name: String,
    grantee: String,
    cluster_name: Option<String>,
    admin_option: bool,
}

impl GrantRole {
    pub fn new(role_name: impl Into<String>, grantee: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            grantee: grantee.into(),
            ..Default::default()
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn with_admin_option(mut self, admin_option: bool) -> Self {
        self.admin_option = admin_option;
        self
    }
}

impl QueryBuilder for GrantRole {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.role_name, "GRANT")?;
        ensure_name(&self.grantee, "GRANT")?;

        let mut tokens = vec!["GRANT".to_string()];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        tokens.push(backtick(&self.role_name));
        tokens.push("TO".to_string());
        tokens.push(backtick(&self.grantee));
        if self.admin_option {
            tokens.push("WITH ADMIN OPTION".to_string());
        }
        Ok(finish(tokens))
    }
}

/// `REVOKE [ON CLUSTER 'c'] <role> FROM <grantee>`
#[derive(Debug, Clone, Default)]
pub struct RevokeRole {
    role_name: String,
    grantee: String,
    cluster_name: Option<String>,
}

impl RevokeRole {
    pub fn new(role_name: impl Into<String>, grantee: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            grantee: grantee.into(),
            cluster_name: None,
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for RevokeRole {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.role_name, "REVOKE")?;
        ensure_name(&self.grantee, "REVOKE")?;

        let mut tokens = vec!["REVOKE".to_string()];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        tokens.push(backtick(&self.role_name));
        tokens.push("FROM".to_string());
        tokens.push(backtick(&self.grantee));
        Ok(finish(tokens))
    }
}

/// Shared target of privilege grants and revokes: `PRIV[(col)] ON db.tbl`.
#[derive(Debug, Clone, Default)]
struct PrivilegeTarget {
    privilege: String,
    database: Option<String>,
    table: Option<String>,
    column: Option<String>,
}

impl PrivilegeTarget {
    fn tokens(&self) -> Result<Vec<String>, QueryBuilderError> {
        if !PRIVILEGE_PATTERN.is_match(&self.privilege) {
            return Err(QueryBuilderError::InvalidPrivilege(self.privilege.clone()));
        }

        let privilege = match &self.column {
            Some(column) => format!("{}({})", self.privilege, backtick(column)),
            None => self.privilege.clone(),
        };
        let database = self.database.as_deref().map_or("*".to_string(), backtick);
        let table = self.table.as_deref().map_or("*".to_string(), backtick);

        Ok(vec![privilege, "ON".to_string(), format!("{database}.{table}")])
    }
}

/// `GRANT [ON CLUSTER 'c'] PRIV[(col)] ON db.tbl TO <grantee> [WITH GRANT OPTION]`
#[derive(Debug, Clone, Default)]
pub struct GrantPrivilege {
    target: PrivilegeTarget,
    grantee: String,
    cluster_name: Option<String>,
    grant_option: bool,
}

impl GrantPrivilege {
    pub fn new(privilege: impl Into<String>, grantee: impl Into<String>) -> Self {
        Self {
            target: PrivilegeTarget {
                privilege: privilege.into(),
                ..Default::default()
            },
            grantee: grantee.into(),
            ..Default::default()
        }
    }

    pub fn on_database(mut self, database: Option<&str>) -> Self {
        self.target.database = database.map(str::to_string);
        self
    }

    pub fn on_table(mut self, table: Option<&str>) -> Self {
        self.target.table = table.map(str::to_string);
        self
    }

    pub fn on_column(mut self, column: Option<&str>) -> Self {
        self.target.column = column.map(str::to_string);
        self
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn with_grant_option(mut self, grant_option: bool) -> Self {
        self.grant_option = grant_option;
        self
    }
}

impl QueryBuilder for GrantPrivilege {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.grantee, "GRANT")?;

        let mut tokens = vec!["GRANT".to_string()];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        tokens.extend(self.target.tokens()?);
        tokens.push("TO".to_string());
        tokens.push(backtick(&self.grantee));
        if self.grant_option {
            tokens.push("WITH GRANT OPTION".to_string());
        }
        Ok(finish(tokens))
    }
}

/// `REVOKE [ON CLUSTER 'c'] PRIV[(col)] ON db.tbl FROM <grantee>`
#[derive(Debug, Clone, Default)]
pub struct RevokePrivilege {
    target: PrivilegeTarget,
    grantee: String,
    cluster_name: Option<String>,
}

impl RevokePrivilege {
    pub fn new(privilege: impl Into<String>, grantee: impl Into<String>) -> Self {
        Self {
            target: PrivilegeTarget {
                privilege: privilege.into(),
                ..Default::default()
            },
            grantee: grantee.into(),
            cluster_name: None,
        }
    }

    pub fn on_database(mut self, database: Option<&str>) -> Self {
        self.target.database = database.map(str::to_string);
        self
    }

    pub fn on_table(mut self, table: Option<&str>) -> Self {
        self.target.table = table.map(str::to_string);
        self
    }

    pub fn on_column(mut self, column: Option<&str>) -> Self {
        self.target.column = column.map(str::to_string);
        self
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for RevokePrivilege {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.grantee, "REVOKE")?;

        let mut tokens = vec!["REVOKE".to_string()];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        tokens.extend(self.target.tokens()?);
        tokens.push("FROM".to_string());
        tokens.push(backtick(&self.grantee));
        Ok(finish(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_role() {
        assert_eq!(
            GrantRole::new("reader", "john").build().unwrap(),
            "GRANT `reader` TO `john`;"
        );
    }

    #[test]
    fn test_grant_role_on_cluster_with_admin_option() {
        let sql = GrantRole::new("reader", "john")
            .with_cluster(Some("c1"))
            .with_admin_option(true)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "GRANT ON CLUSTER 'c1' `reader` TO `john` WITH ADMIN OPTION;"
        );
    }

    #[test]
    fn test_grant_role_requires_grantee() {
        assert_eq!(
            GrantRole::new("reader", "").build().unwrap_err(),
            QueryBuilderError::EmptyResourceName { statement: "GRANT" }
        );
    }

    #[test]
    fn test_revoke_role() {
        let sql = RevokeRole::new("reader", "john")
            .with_cluster(Some("c1"))
            .build()
            .unwrap();
        assert_eq!(sql, "REVOKE ON CLUSTER 'c1' `reader` FROM `john`;");
    }

    #[test]
    fn test_grant_privilege_on_everything() {
        let sql = GrantPrivilege::new("SELECT", "reader").build().unwrap();
        assert_eq!(sql, "GRANT SELECT ON *.* TO `reader`;");
    }

    #[test]
    fn test_grant_privilege_on_column_with_grant_option() {
        let sql = GrantPrivilege::new("SELECT", "reader")
            .on_database(Some("analytics"))
            .on_table(Some("events"))
            .on_column(Some("user_id"))
            .with_cluster(Some("c"))
            .with_grant_option(true)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "GRANT ON CLUSTER 'c' SELECT(`user_id`) ON `analytics`.`events` TO `reader` WITH GRANT OPTION;"
        );
    }

    #[test]
    fn test_grant_privilege_database_only() {
        let sql = GrantPrivilege::new("ALTER UPDATE", "writer")
            .on_database(Some("db"))
            .build()
            .unwrap();
        assert_eq!(sql, "GRANT ALTER UPDATE ON `db`.* TO `writer`;");
    }

    #[test]
    fn test_grant_privilege_rejects_injection() {
        let err = GrantPrivilege::new("SELECT ON *.* TO admin; --", "reader")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryBuilderError::InvalidPrivilege(_)));

        let err = GrantPrivilege::new("select", "reader").build().unwrap_err();
        assert!(matches!(err, QueryBuilderError::InvalidPrivilege(_)));
    }

    #[test]
    fn test_revoke_privilege() {
        let sql = RevokePrivilege::new("INSERT", "writer")
            .on_database(Some("db"))
            .on_table(Some("t"))
            .build()
            .unwrap();
        assert_eq!(sql, "REVOKE INSERT ON `db`.`t` FROM `writer`;");
    }
}
