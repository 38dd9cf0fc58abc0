use tracing::{debug, info, warn};

use super::user::parse_role_list;
use super::{DbOpsClient, DbOpsError, Grantee};
use crate::querybuilder::{AlterUser, Field, GrantRole, QueryBuilder, RevokeRole, Select, Where};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role_name: String,
    pub grantee: Grantee,
    pub admin_option: bool,
}

impl DbOpsClient {
    /// Grants a role. When the grantee is a user the role also becomes one of
    /// its default roles; failing to do so only logs a warning.
    pub async fn grant_role(
        &self,
        grant: &RoleGrant,
        cluster_name: Option<&str>,
    ) -> Result<RoleGrant, DbOpsError> {
        let sql = GrantRole::new(&grant.role_name, grant.grantee.name())
            .with_cluster(cluster_name)
            .with_admin_option(grant.admin_option)
            .build()?;
        self.exec(&sql).await?;
        info!("Granted role {} to {}", grant.role_name, grant.grantee.name());

        if let Some(user_name) = grant.grantee.user_name() {
            if let Err(e) = self
                .change_default_roles(user_name, &grant.role_name, true, cluster_name)
                .await
            {
                warn!(
                    "Could not activate role {} as default role of user {}: {}",
                    grant.role_name, user_name, e
                );
            }
        }

        self.get_grant_role(&grant.role_name, &grant.grantee, cluster_name)
            .await?
            .ok_or_else(|| {
                DbOpsError::not_found(
                    "role grant",
                    format!("{} to {}", grant.role_name, grant.grantee.name()),
                )
            })
    }

    pub async fn get_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<Option<RoleGrant>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![
                        Field::new("granted_role_name"),
                        Field::new("user_name"),
                        Field::new("role_name"),
                        Field::new("with_admin_option"),
                    ],
                    "system.role_grants",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("granted_role_name", role_name),
                    Where::equals(grantee.column(), grantee.name()),
                ]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let grantee = Grantee::from_names(
            row.get_nullable_string("user_name")?.as_deref(),
            row.get_nullable_string("role_name")?.as_deref(),
        )?;

        Ok(Some(RoleGrant {
            role_name: row.get_string("granted_role_name")?,
            grantee,
            admin_option: row.get_bool("with_admin_option")?,
        }))
    }

    /// Revokes a role. A user grantee also loses it from its default roles,
    /// on a best-effort basis.
    pub async fn revoke_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let sql = RevokeRole::new(role_name, grantee.name())
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Revoked role {} from {}", role_name, grantee.name());

        if let Some(user_name) = grantee.user_name() {
            if let Err(e) = self
                .change_default_roles(user_name, role_name, false, cluster_name)
                .await
            {
                warn!(
                    "Could not remove role {} from default roles of user {}: {}",
                    role_name, user_name, e
                );
            }
        }

        Ok(())
    }

    async fn default_roles(
        &self,
        user_name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Vec<String>>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![Field::new("default_roles_list").to_string_fn()],
                    "system.users",
                )
                .with_cluster(cluster_name)
                .where_([Where::equals("name", user_name)]),
            )
            .await?;

        match rows.first() {
            Some(row) => Ok(Some(parse_role_list(
                &row.get_string("default_roles_list")?,
            ))),
            None => Ok(None),
        }
    }

    /// Adds `role_name` to (or removes it from) the default roles of a user.
    /// Nothing is executed when the user is gone or the list would not change.
    async fn change_default_roles(
        &self,
        user_name: &str,
        role_name: &str,
        activate: bool,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let Some(mut roles) = self.default_roles(user_name, cluster_name).await? else {
            debug!("User {} not found, default roles left untouched", user_name);
            return Ok(());
        };

        let present = roles.iter().any(|r| r == role_name);
        match (activate, present) {
            (true, false) => roles.push(role_name.to_string()),
            (false, true) => roles.retain(|r| r != role_name),
            _ => return Ok(()),
        }

        let sql = AlterUser::new(user_name)
            .with_cluster(cluster_name)
            .default_roles(roles)
            .build()?;
        self.exec(&sql).await
    }
}
