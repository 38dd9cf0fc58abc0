use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::{Client, Grantee, PrivilegeGrant};
use crate::framework::{Diagnostics, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantPrivilegeModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// e.g. `SELECT` or `ALTER UPDATE`.
    #[serde(default)]
    pub privilege_name: String,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub grantee_user_name: Option<String>,
    #[serde(default)]
    pub grantee_role_name: Option<String>,
    #[serde(default)]
    pub grant_option: bool,
}

impl GrantPrivilegeModel {
    fn to_grant(&self) -> Result<PrivilegeGrant, ResourceError> {
        Ok(PrivilegeGrant {
            privilege: self.privilege_name.clone(),
            database: self.database_name.clone(),
            table: self.table_name.clone(),
            column: self.column_name.clone(),
            grantee: Grantee::from_names(
                self.grantee_user_name.as_deref(),
                self.grantee_role_name.as_deref(),
            )
            .summarize("Invalid Grantee")?,
            grant_option: self.grant_option,
        })
    }

    fn with_grant(self, grant: PrivilegeGrant) -> Self {
        Self {
            cluster_name: self.cluster_name,
            privilege_name: grant.privilege,
            database_name: grant.database,
            table_name: grant.table,
            column_name: grant.column,
            grantee_user_name: grant.grantee.user_name().map(str::to_string),
            grantee_role_name: grant.grantee.role_name().map(str::to_string),
            grant_option: grant.grant_option,
        }
    }
}

pub struct GrantPrivilegeResource {
    client: Arc<dyn Client>,
}

impl GrantPrivilegeResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for GrantPrivilegeResource {
    type Model = GrantPrivilegeModel;

    fn type_name(&self) -> &'static str {
        "grant_privilege"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &[
            "cluster_name",
            "privilege_name",
            "database_name",
            "table_name",
            "column_name",
            "grantee_user_name",
            "grantee_role_name",
            "grant_option",
        ]
    }

    fn computed_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    async fn modify_plan(
        &self,
        plan: GrantPrivilegeModel,
        _state: Option<&GrantPrivilegeModel>,
        diagnostics: &mut Diagnostics,
    ) -> GrantPrivilegeModel {
        if let Err(e) = plan.to_grant() {
            diagnostics.push(e.into());
        }
        if plan.table_name.is_some() && plan.database_name.is_none() {
            diagnostics.add_attribute_error(
                "table_name",
                "Invalid Privilege Scope",
                "'table_name' requires 'database_name' to be set.",
            );
        }
        if plan.column_name.is_some() && plan.table_name.is_none() {
            diagnostics.add_attribute_error(
                "column_name",
                "Invalid Privilege Scope",
                "'column_name' requires 'table_name' to be set.",
            );
        }
        plan
    }

    async fn create(
        &self,
        plan: GrantPrivilegeModel,
    ) -> Result<GrantPrivilegeModel, ResourceError> {
        let granted = self
            .client
            .grant_privilege(&plan.to_grant()?, plan.cluster_name.as_deref())
            .await
            .summarize("Error Creating ClickHouse Privilege Grant")?;
        info!(
            "Privilege {} granted to {}",
            granted.privilege,
            granted.grantee.name()
        );

        Ok(plan.with_grant(granted))
    }

    async fn read(
        &self,
        state: GrantPrivilegeModel,
    ) -> Result<Option<GrantPrivilegeModel>, ResourceError> {
        let grant = self
            .client
            .get_grant_privilege(&state.to_grant()?, state.cluster_name.as_deref())
            .await
            .summarize("Error Reading ClickHouse Privilege Grant")?;

        Ok(grant.map(|grant| state.with_grant(grant)))
    }

    async fn update(
        &self,
        _plan: GrantPrivilegeModel,
        _state: GrantPrivilegeModel,
    ) -> Result<GrantPrivilegeModel, ResourceError> {
        Err(ResourceError::new(
            "Update Not Supported",
            "Update operation is not supported for clickhousedbops_grant_privilege resource",
        ))
    }

    async fn delete(&self, state: GrantPrivilegeModel) -> Result<(), ResourceError> {
        self.client
            .revoke_grant_privilege(&state.to_grant()?, state.cluster_name.as_deref())
            .await
            .summarize("Error Deleting ClickHouse Privilege Grant")
    }

    async fn import(&self, _id: &str) -> Result<GrantPrivilegeModel, ResourceError> {
        Err(ResourceError::new(
            "Import Not Supported",
            "clickhousedbops_grant_privilege cannot be imported",
        ))
    }
}
