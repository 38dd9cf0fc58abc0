use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::{Client, Grantee, RoleGrant};
use crate::framework::{Diagnostics, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRoleModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub grantee_user_name: Option<String>,
    #[serde(default)]
    pub grantee_role_name: Option<String>,
    #[serde(default)]
    pub with_admin_option: bool,
}

impl GrantRoleModel {
    fn grantee(&self) -> Result<Grantee, ResourceError> {
        Grantee::from_names(
            self.grantee_user_name.as_deref(),
            self.grantee_role_name.as_deref(),
        )
        .summarize("Invalid Grantee")
    }

    fn with_grant(self, grant: RoleGrant) -> Self {
        Self {
            cluster_name: self.cluster_name,
            role_name: grant.role_name,
            grantee_user_name: grant.grantee.user_name().map(str::to_string),
            grantee_role_name: grant.grantee.role_name().map(str::to_string),
            with_admin_option: grant.admin_option,
        }
    }
}

pub struct GrantRoleResource {
    client: Arc<dyn Client>,
}

impl GrantRoleResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for GrantRoleResource {
    type Model = GrantRoleModel;

    fn type_name(&self) -> &'static str {
        "grant_role"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &[
            "cluster_name",
            "role_name",
            "grantee_user_name",
            "grantee_role_name",
            "with_admin_option",
        ]
    }

    fn computed_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    async fn modify_plan(
        &self,
        plan: GrantRoleModel,
        _state: Option<&GrantRoleModel>,
        diagnostics: &mut Diagnostics,
    ) -> GrantRoleModel {
        if let Err(e) = plan.grantee() {
            diagnostics.push(e.into());
        }
        plan
    }

    async fn create(&self, plan: GrantRoleModel) -> Result<GrantRoleModel, ResourceError> {
        let grant = RoleGrant {
            role_name: plan.role_name.clone(),
            grantee: plan.grantee()?,
            admin_option: plan.with_admin_option,
        };

        let granted = self
            .client
            .grant_role(&grant, plan.cluster_name.as_deref())
            .await
            .summarize("Error Creating ClickHouse Role Grant")?;
        info!(
            "Role {} granted to {}",
            granted.role_name,
            granted.grantee.name()
        );

        Ok(plan.with_grant(granted))
    }

    async fn read(&self, state: GrantRoleModel) -> Result<Option<GrantRoleModel>, ResourceError> {
        let grant = self
            .client
            .get_grant_role(
                &state.role_name,
                &state.grantee()?,
                state.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Reading ClickHouse Role Grant")?;

        Ok(grant.map(|grant| state.with_grant(grant)))
    }

    async fn update(
        &self,
        _plan: GrantRoleModel,
        _state: GrantRoleModel,
    ) -> Result<GrantRoleModel, ResourceError> {
        Err(ResourceError::new(
            "Update Not Supported",
            "Update operation is not supported for clickhousedbops_grant_role resource",
        ))
    }

    async fn delete(&self, state: GrantRoleModel) -> Result<(), ResourceError> {
        self.client
            .revoke_grant_role(
                &state.role_name,
                &state.grantee()?,
                state.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Deleting ClickHouse Role Grant")
    }

    async fn import(&self, _id: &str) -> Result<GrantRoleModel, ResourceError> {
        Err(ResourceError::new(
            "Import Not Supported",
            "clickhousedbops_grant_role cannot be imported",
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dbops::DbOpsClient;
    use crate::infrastructure::clickhouse::mock::MockClickhouseClient;

    fn resource(mock: &Arc<MockClickhouseClient>) -> GrantRoleResource {
        GrantRoleResource::new(Arc::new(DbOpsClient::new(mock.clone())))
    }

    fn to_user(user: &str) -> GrantRoleModel {
        GrantRoleModel {
            role_name: "reader".to_string(),
            grantee_user_name: Some(user.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_modify_plan_rejects_ambiguous_grantee() {
        let mock = Arc::new(MockClickhouseClient::new());
        let mut plan = to_user("john");
        plan.grantee_role_name = Some("writer".to_string());

        let mut diagnostics = Diagnostics::new();
        resource(&mock)
            .modify_plan(plan, None, &mut diagnostics)
            .await;
        assert!(diagnostics.has_error());
    }

    #[tokio::test]
    async fn test_create_to_role_with_admin_option() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            "`granted_role_name` = 'reader'",
            vec![json!({
                "granted_role_name": "reader",
                "user_name": null,
                "role_name": "writer",
                "with_admin_option": true,
            })],
        );

        let plan = GrantRoleModel {
            role_name: "reader".to_string(),
            grantee_role_name: Some("writer".to_string()),
            with_admin_option: true,
            ..Default::default()
        };
        let state = resource(&mock).create(plan.clone()).await.unwrap();
        assert_eq!(state, plan);
        assert_eq!(
            mock.executed(),
            vec!["GRANT `reader` TO `writer` WITH ADMIN OPTION;"]
        );
    }

    #[tokio::test]
    async fn test_read_removes_revoked_grant() {
        let mock = Arc::new(MockClickhouseClient::new());
        assert_eq!(resource(&mock).read(to_user("john")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_picks_up_admin_option_drift() {
        let mock = Arc::new(MockClickhouseClient::new());
        mock.respond(
            "`granted_role_name` = 'reader'",
            vec![json!({
                "granted_role_name": "reader",
                "user_name": "john",
                "role_name": null,
                "with_admin_option": true,
            })],
        );

        let read = resource(&mock)
            .read(to_user("john"))
            .await
            .unwrap()
            .unwrap();
        assert!(read.with_admin_option);
    }

    #[tokio::test]
    async fn test_update_is_rejected() {
        let mock = Arc::new(MockClickhouseClient::new());
        assert!(resource(&mock)
            .update(to_user("john"), to_user("jane"))
            .await
            .is_err());
    }
}
