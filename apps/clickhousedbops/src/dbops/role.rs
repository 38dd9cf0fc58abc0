use itertools::Itertools;
use tracing::info;

use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{
    AlterRole, CreateRole, DropRole, Field, QueryBuilder, QueryBuilderError, Select, Where,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub settings_profiles: Vec<String>,
}

impl Role {
    pub fn has_settings_profile(&self, profile_name: &str) -> bool {
        self.settings_profiles.iter().any(|p| p == profile_name)
    }
}

/// In-place changes to a role: rename, and swapping the settings profile
/// this resource previously attached for a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    pub name: String,
    pub drop_settings_profile: Option<String>,
    pub add_settings_profile: Option<String>,
}

impl DbOpsClient {
    pub async fn create_role(
        &self,
        name: &str,
        settings_profile: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError> {
        let sql = CreateRole::new(name)
            .with_cluster(cluster_name)
            .with_settings_profile(settings_profile)
            .build()?;
        self.exec(&sql).await?;
        info!("Created role {}", name);

        self.find_role_by_name(name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("role", name))
    }

    pub async fn get_role(
        &self,
        id: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Role>, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("name")], "system.roles")
                    .with_cluster(cluster_name)
                    .where_([Where::equals("id", id)]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let name = row.get_string("name")?;

        let settings_profiles = self
            .select(
                Select::new(
                    vec![Field::new("inherit_profile")],
                    "system.settings_profile_elements",
                )
                .with_cluster(cluster_name)
                .where_([
                    Where::equals("role_name", &name),
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

        Ok(Some(Role {
            id: id.to_string(),
            name,
            settings_profiles,
        }))
    }

    pub async fn find_role_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Role>, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("id").to_string_fn()], "system.roles")
                    .with_cluster(cluster_name)
                    .where_([Where::equals("name", name)]),
            )
            .await?;

        match rows.first() {
            Some(row) => self.get_role(&row.get_string("id")?, cluster_name).await,
            None => Ok(None),
        }
    }

    pub async fn update_role(
        &self,
        id: &str,
        update: &RoleUpdate,
        cluster_name: Option<&str>,
    ) -> Result<Role, DbOpsError> {
        let existing = self
            .get_role(id, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("role", id))?;

        let query = AlterRole::new(&existing.name)
            .rename_to(Some(update.name.as_str()))
            .with_cluster(cluster_name)
            .drop_settings_profile(
                update
                    .drop_settings_profile
                    .as_deref()
                    .filter(|p| existing.has_settings_profile(p)),
            )
            .add_settings_profile(update.add_settings_profile.as_deref());

        match query.build() {
            Ok(sql) => {
                self.exec(&sql).await?;
                info!("Updated role {}", existing.name);
            }
            Err(QueryBuilderError::NoChange) => {}
            Err(e) => return Err(e.into()),
        }

        self.get_role(id, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("role", id))
    }

    pub async fn delete_role(&self, id: &str, cluster_name: Option<&str>) -> Result<(), DbOpsError> {
        let Some(role) = self.get_role(id, cluster_name).await? else {
            return Ok(());
        };

        let sql = DropRole::new(&role.name).with_cluster(cluster_name).build()?;
        self.exec(&sql).await?;
        info!("Dropped role {}", role.name);
        Ok(())
    }
}
