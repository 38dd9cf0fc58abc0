//! Managed ClickHouse access-control objects.
//!
//! Each resource owns a shared [`Client`] and maps its model onto dbops calls.

use std::sync::Arc;

use crate::dbops::Client;
use crate::framework::Diagnostics;

pub mod database;
pub mod grant_privilege;
pub mod grant_role;
pub mod role;
pub mod setting;
pub mod settings_profile;
pub mod settings_profile_association;
pub mod user;

pub use database::DatabaseResource;
pub use grant_privilege::GrantPrivilegeResource;
pub use grant_role::GrantRoleResource;
pub use role::RoleResource;
pub use setting::SettingResource;
pub use settings_profile::SettingsProfileResource;
pub use settings_profile_association::SettingsProfileAssociationResource;
pub use user::UserResource;

/// With a `replicated` user directory, access entities already reach every
/// replica and `ON CLUSTER` statements can fail.
pub(crate) async fn check_replicated_storage(
    client: &Arc<dyn Client>,
    cluster_name: Option<&str>,
    resource_label: &str,
    diagnostics: &mut Diagnostics,
) {
    match client.is_replicated_storage().await {
        Ok(true) if cluster_name.is_some() => diagnostics.add_warning(
            "Invalid configuration",
            format!(
                "Your ClickHouse cluster seems to be using Replicated storage for users, please \
                 remove the 'cluster_name' attribute from your {resource_label} definition if you \
                 encounter any errors."
            ),
        ),
        Ok(_) => {}
        Err(e) => diagnostics.add_error(
            "Error Checking if service is using replicated storage",
            e.to_string(),
        ),
    }
}
