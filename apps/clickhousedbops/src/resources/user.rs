use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::check_replicated_storage;
use crate::dbops::{Client, NewUser};
use crate::framework::{
    parse_import_id, Diagnostics, Resource, ResourceError, ResourceResultExt,
};
use crate::querybuilder::Identification;

static SHA256_HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{64}$").unwrap());

const AUTH_CONFLICT: &str =
    "Exactly one of 'ssl_certificate_cn' or 'password_sha256_hash_wo' must be specified.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// Equals the user name.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ssl_certificate_cn: Option<String>,
    #[serde(default)]
    pub password_sha256_hash_wo: Option<String>,
    /// Bumped to force the password to be set again.
    #[serde(default)]
    pub password_sha256_hash_wo_version: Option<i32>,
    #[serde(default)]
    pub default_role: Option<String>,
    #[serde(default)]
    pub settings_profile: Option<String>,
}

pub struct UserResource {
    client: Arc<dyn Client>,
}

impl UserResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for UserResource {
    type Model = UserModel;

    fn type_name(&self) -> &'static str {
        "user"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &[
            "cluster_name",
            "ssl_certificate_cn",
            "password_sha256_hash_wo",
            "password_sha256_hash_wo_version",
            "default_role",
            "settings_profile",
        ]
    }

    fn write_only_attributes(&self) -> &'static [&'static str] {
        &["password_sha256_hash_wo"]
    }

    async fn modify_plan(
        &self,
        plan: UserModel,
        _state: Option<&UserModel>,
        diagnostics: &mut Diagnostics,
    ) -> UserModel {
        let password_set = plan.password_sha256_hash_wo.is_some();
        let cn_set = plan.ssl_certificate_cn.is_some();
        if password_set == cn_set {
            for attribute in ["ssl_certificate_cn", "password_sha256_hash_wo"] {
                diagnostics.add_attribute_error(
                    attribute,
                    "Invalid Authentication Configuration",
                    AUTH_CONFLICT,
                );
            }
            return plan;
        }

        if let Some(hash) = &plan.password_sha256_hash_wo {
            if !SHA256_HASH_PATTERN.is_match(hash) {
                diagnostics.add_attribute_error(
                    "password_sha256_hash_wo",
                    "Invalid Attribute Value",
                    "password_sha256_hash must be a valid SHA256 hash",
                );
                return plan;
            }
        }

        check_replicated_storage(
            &self.client,
            plan.cluster_name.as_deref(),
            "User resource",
            diagnostics,
        )
        .await;

        plan
    }

    async fn create(&self, plan: UserModel) -> Result<UserModel, ResourceError> {
        let identification = match (&plan.password_sha256_hash_wo, &plan.ssl_certificate_cn) {
            (Some(hash), _) => Some(Identification::Sha256Hash(hash.clone())),
            (None, Some(cn)) => Some(Identification::SslCertificateCn(cn.clone())),
            (None, None) => None,
        };

        let user = self
            .client
            .create_user(
                &NewUser {
                    name: plan.name.clone(),
                    identification,
                    default_role: plan.default_role.clone(),
                    settings_profile: plan.settings_profile.clone(),
                },
                plan.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Creating ClickHouse User")?;
        info!("User {} created", user.name);

        Ok(UserModel {
            id: Some(user.name.clone()),
            name: user.name,
            ..plan
        })
    }

    async fn read(&self, mut state: UserModel) -> Result<Option<UserModel>, ResourceError> {
        let id = state.id.clone().unwrap_or_else(|| state.name.clone());
        let Some(user) = self
            .client
            .get_user_by_name(&id, state.cluster_name.as_deref())
            .await
            .summarize("Error Reading ClickHouse User")?
        else {
            return Ok(None);
        };

        state.id = Some(user.name.clone());
        state.name = user.name.clone();
        if user.ssl_certificate_cn.is_some() {
            state.ssl_certificate_cn = user.ssl_certificate_cn.clone();
        }

        // Keep the configured profile while it is still attached, otherwise
        // surface what the server has so the drift shows up in the plan.
        state.settings_profile = match (&state.settings_profile, user.settings_profiles.first()) {
            (_, None) => None,
            (Some(wanted), Some(_)) if user.has_settings_profile(wanted) => Some(wanted.clone()),
            (Some(_), Some(first)) => Some(first.clone()),
            (None, Some(_)) => None,
        };

        Ok(Some(state))
    }

    async fn update(&self, plan: UserModel, state: UserModel) -> Result<UserModel, ResourceError> {
        let current = state.id.clone().unwrap_or_else(|| state.name.clone());
        let user = self
            .client
            .update_user(&current, &plan.name, plan.cluster_name.as_deref())
            .await
            .summarize("Error Updating ClickHouse User")?;

        Ok(UserModel {
            id: Some(user.name.clone()),
            name: user.name,
            ssl_certificate_cn: user.ssl_certificate_cn.or(plan.ssl_certificate_cn.clone()),
            ..plan
        })
    }

    async fn delete(&self, state: UserModel) -> Result<(), ResourceError> {
        let id = state.id.unwrap_or(state.name);
        self.client
            .delete_user(&id, state.cluster_name.as_deref())
            .await
            .summarize("Error Deleting ClickHouse User")
    }

    /// Accepts `[<cluster>:]<name or UUID>`.
    async fn import(&self, id: &str) -> Result<UserModel, ResourceError> {
        let (cluster_name, reference) = parse_import_id(id);

        let name = if uuid::Uuid::parse_str(&reference).is_ok() {
            self.client
                .get_user_by_uuid(&reference, cluster_name.as_deref())
                .await
                .summarize("Cannot import user by UUID")?
                .ok_or_else(|| ResourceError::new("Cannot import user by UUID", "User not found"))?
                .name
        } else {
            reference
        };

        Ok(UserModel {
            cluster_name,
            id: Some(name.clone()),
            name,
            ..Default::default()
        })
    }
}
