//! # DB Ops
//!
//! Reads and writes ClickHouse access-control objects. Every operation renders
//! its statements with the [`querybuilder`](crate::querybuilder), runs them
//! through a [`ClickhouseClient`] and reads the resulting state back from the
//! `system.*` tables.
//!
//! All operations take an optional cluster name. When set, DDL is sent with
//! `ON CLUSTER` and reads go through `clusterAllReplicas`.
//!
//! Lookups return `Ok(None)` when the object does not exist. Deletes of
//! objects that are already gone succeed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::infrastructure::clickhouse::{ClickhouseClient, ClickhouseError, Row};
use crate::querybuilder::{QueryBuilder, QueryBuilderError, Select};

pub mod database;
pub mod grant_privilege;
pub mod grant_role;
pub mod role;
pub mod setting;
pub mod settings_profile;
pub mod settings_profile_association;
pub mod storage;
pub mod user;

pub use database::Database;
pub use grant_privilege::PrivilegeGrant;
pub use grant_role::RoleGrant;
pub use role::{Role, RoleUpdate};
pub use setting::Setting;
pub use settings_profile::SettingsProfile;
pub use settings_profile_association::SettingsProfileTarget;
pub use user::{NewUser, User};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DbOpsError {
    #[error("error building query: {0}")]
    QueryBuilder(#[from] QueryBuilderError),

    #[error("error running query: {0}")]
    Clickhouse(#[from] ClickhouseError),

    #[error("{kind} '{reference}' not found")]
    NotFound {
        kind: &'static str,
        reference: String,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

impl DbOpsError {
    pub(crate) fn not_found(kind: &'static str, reference: impl Into<String>) -> Self {
        DbOpsError::NotFound {
            kind,
            reference: reference.into(),
        }
    }
}

/// The receiver of a role or privilege grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    User(String),
    Role(String),
}

impl Grantee {
    /// Exactly one of the two names must be provided.
    pub fn from_names(user_name: Option<&str>, role_name: Option<&str>) -> Result<Self, DbOpsError> {
        match (user_name, role_name) {
            (Some(user), None) => Ok(Grantee::User(user.to_string())),
            (None, Some(role)) => Ok(Grantee::Role(role.to_string())),
            (Some(_), Some(_)) => Err(DbOpsError::InvalidArgument(
                "only one of grantee user name or grantee role name can be set".to_string(),
            )),
            (None, None) => Err(DbOpsError::InvalidArgument(
                "either grantee user name or grantee role name must be set".to_string(),
            )),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Grantee::User(name) | Grantee::Role(name) => name,
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        match self {
            Grantee::User(name) => Some(name),
            Grantee::Role(_) => None,
        }
    }

    pub fn role_name(&self) -> Option<&str> {
        match self {
            Grantee::Role(name) => Some(name),
            Grantee::User(_) => None,
        }
    }

    /// `system.role_grants` and `system.grants` name the grantee column after its kind.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Grantee::User(_) => "user_name",
            Grantee::Role(_) => "role_name",
        }
    }
}

#[async_trait]
pub trait Client: Send + Sync {
    // Users
    async fn create_user(
        &self,
        user: &NewUser,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError>;
    async fn get_user_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError>;
    async fn get_user_by_uuid(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError>;
    async fn update_user(
        &self,
        current_name: &str,
        new_name: &str,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError>;
    async fn delete_user(&self, name: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError>;

    // Roles
    async fn create_role(
        &self,
        name: &str,
        settings_profile: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError>;
    async fn get_role(&self, id: &str, cluster_name: Option<&str>)
        -> Result<Option<Role>, DbOpsError>;
    async fn find_role_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Role>, DbOpsError>;
    async fn update_role(
        &self,
        id: &str,
        update: &RoleUpdate,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError>;
    async fn delete_role(&self, id: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError>;

    // Settings profiles
    async fn create_settings_profile(
        &self,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError>;
    async fn get_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError>;
    async fn get_settings_profile_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError>;
    async fn update_settings_profile(
        &self,
        id: &str,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError>;
    async fn delete_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;

    // Settings
    async fn create_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError>;
    async fn get_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Setting>, DbOpsError>;
    async fn update_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError>;
    async fn delete_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;

    // Settings profile associations
    async fn associate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;
    async fn disassociate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;

    // Role grants
    async fn grant_role(
        &self,
        grant: &RoleGrant,
        cluster_name: Option<&str>,
    ) -> Result<RoleGrant, DbOpsError>;
    async fn get_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<Option<RoleGrant>, DbOpsError>;
    async fn revoke_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;

    // Privilege grants
    async fn grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<PrivilegeGrant, DbOpsError>;
    async fn get_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<Option<PrivilegeGrant>, DbOpsError>;
    async fn revoke_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError>;

    // Databases
    async fn create_database(
        &self,
        name: &str,
        comment: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Database, DbOpsError>;
    async fn get_database(
        &self,
        uuid: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError>;
    async fn find_database_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError>;
    async fn delete_database(&self, uuid: &str, cluster_name: Option<&str>)
        -> Result<(), DbOpsError>;

    // Storage
    async fn is_replicated_storage(&self) -> Result<bool, DbOpsError>;
}

/// [`Client`] backed by a live ClickHouse connection.
#[derive(Clone)]
pub struct DbOpsClient {
    clickhouse: Arc<dyn ClickhouseClient>,
}

impl DbOpsClient {
    pub fn new(clickhouse: Arc<dyn ClickhouseClient>) -> Self {
        Self { clickhouse }
    }

    pub(crate) async fn exec(&self, sql: &str) -> Result<(), DbOpsError> {
        self.clickhouse.exec(sql).await?;
        Ok(())
    }

    pub(crate) async fn select(&self, query: Select) -> Result<Vec<Row>, DbOpsError> {
        let sql = query.build()?;
        Ok(self.clickhouse.select(&sql).await?)
    }
}

#[async_trait]
impl Client for DbOpsClient {
    async fn create_user(
        &self,
        user: &NewUser,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError> {
        DbOpsClient::create_user(self, user, cluster_name).await
    }

    async fn get_user_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        DbOpsClient::get_user_by_name(self, name, cluster_name).await
    }

    async fn get_user_by_uuid(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<User>, DbOpsError> {
        DbOpsClient::get_user_by_uuid(self, id, cluster_name).await
    }

    async fn update_user(
        &self,
        current_name: &str,
        new_name: &str,
        cluster_name: Option<&str>,
    ) -> Result<User, DbOpsError> {
        DbOpsClient::update_user(self, current_name, new_name, cluster_name).await
    }

    async fn delete_user(&self, name: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError> {
        DbOpsClient::delete_user(self, name, cluster_name).await
    }

    async fn create_role(
        &self,
        name: &str,
        settings_profile: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError> {
        DbOpsClient::create_role(self, name, settings_profile, cluster_name).await
    }

    async fn get_role(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Role>, DbOpsError> {
        DbOpsClient::get_role(self, id, cluster_name).await
    }

    async fn find_role_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Role>, DbOpsError> {
        DbOpsClient::find_role_by_name(self, name, cluster_name).await
    }

    async fn update_role(
        &self,
        id: &str,
        update: &RoleUpdate,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError> {
        DbOpsClient::update_role(self, id, update, cluster_name).await
    }

    async fn delete_role(&self, id: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError> {
        DbOpsClient::delete_role(self, id, cluster_name).await
    }

    async fn create_settings_profile(
        &self,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError> {
        DbOpsClient::create_settings_profile(self, name, inherit_from, cluster_name).await
    }

    async fn get_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError> {
        DbOpsClient::get_settings_profile(self, id, cluster_name).await
    }

    async fn get_settings_profile_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<SettingsProfile>, DbOpsError> {
        DbOpsClient::get_settings_profile_by_name(self, name, cluster_name).await
    }

    async fn update_settings_profile(
        &self,
        id: &str,
        name: &str,
        inherit_from: &[String],
        cluster_name: Option<&str>,
    ) -> Result<SettingsProfile, DbOpsError> {
        DbOpsClient::update_settings_profile(self, id, name, inherit_from, cluster_name).await
    }

    async fn delete_settings_profile(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::delete_settings_profile(self, id, cluster_name).await
    }

    async fn create_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError> {
        DbOpsClient::create_setting(self, setting, cluster_name).await
    }

    async fn get_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Setting>, DbOpsError> {
        DbOpsClient::get_setting(self, settings_profile_id, name, cluster_name).await
    }

    async fn update_setting(
        &self,
        setting: &Setting,
        cluster_name: Option<&str>,
    ) -> Result<Setting, DbOpsError> {
        DbOpsClient::update_setting(self, setting, cluster_name).await
    }

    async fn delete_setting(
        &self,
        settings_profile_id: &str,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::delete_setting(self, settings_profile_id, name, cluster_name).await
    }

    async fn associate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::associate_settings_profile(self, settings_profile_id, target, cluster_name)
            .await
    }

    async fn disassociate_settings_profile(
        &self,
        settings_profile_id: &str,
        target: &SettingsProfileTarget,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::disassociate_settings_profile(self, settings_profile_id, target, cluster_name)
            .await
    }

    async fn grant_role(
        &self,
        grant: &RoleGrant,
        cluster_name: Option<&str>,
    ) -> Result<RoleGrant, DbOpsError> {
        DbOpsClient::grant_role(self, grant, cluster_name).await
    }

    async fn get_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<Option<RoleGrant>, DbOpsError> {
        DbOpsClient::get_grant_role(self, role_name, grantee, cluster_name).await
    }

    async fn revoke_grant_role(
        &self,
        role_name: &str,
        grantee: &Grantee,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::revoke_grant_role(self, role_name, grantee, cluster_name).await
    }

    async fn grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<PrivilegeGrant, DbOpsError> {
        DbOpsClient::grant_privilege(self, grant, cluster_name).await
    }

    async fn get_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<Option<PrivilegeGrant>, DbOpsError> {
        DbOpsClient::get_grant_privilege(self, grant, cluster_name).await
    }

    async fn revoke_grant_privilege(
        &self,
        grant: &PrivilegeGrant,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::revoke_grant_privilege(self, grant, cluster_name).await
    }

    async fn create_database(
        &self,
        name: &str,
        comment: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Database, DbOpsError> {
        DbOpsClient::create_database(self, name, comment, cluster_name).await
    }

    async fn get_database(
        &self,
        uuid: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError> {
        DbOpsClient::get_database(self, uuid, cluster_name).await
    }

    async fn find_database_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError> {
        DbOpsClient::find_database_by_name(self, name, cluster_name).await
    }

    async fn delete_database(
        &self,
        uuid: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        DbOpsClient::delete_database(self, uuid, cluster_name).await
    }

    async fn is_replicated_storage(&self) -> Result<bool, DbOpsError> {
        DbOpsClient::is_replicated_storage(self).await
    }
}
