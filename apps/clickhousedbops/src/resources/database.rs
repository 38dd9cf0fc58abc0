use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dbops::{Client, Database};
use crate::framework::{parse_import_id, Resource, ResourceError, ResourceResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseModel {
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl DatabaseModel {
    fn with_database(self, database: Database) -> Self {
        Self {
            cluster_name: self.cluster_name,
            uuid: Some(database.uuid),
            name: database.name,
            comment: database.comment,
        }
    }

    fn uuid(&self) -> Result<&str, ResourceError> {
        self.uuid.as_deref().ok_or_else(|| {
            ResourceError::new("Missing Database UUID", "state has no database uuid").at("uuid")
        })
    }
}

pub struct DatabaseResource {
    client: Arc<dyn Client>,
}

impl DatabaseResource {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DatabaseResource {
    type Model = DatabaseModel;

    fn type_name(&self) -> &'static str {
        "database"
    }

    fn replace_attributes(&self) -> &'static [&'static str] {
        &["cluster_name", "uuid", "name", "comment"]
    }

    fn computed_attributes(&self) -> &'static [&'static str] {
        &["uuid"]
    }

    async fn create(&self, plan: DatabaseModel) -> Result<DatabaseModel, ResourceError> {
        let database = self
            .client
            .create_database(
                &plan.name,
                plan.comment.as_deref(),
                plan.cluster_name.as_deref(),
            )
            .await
            .summarize("Error Creating ClickHouse Database")?;
        info!("Database {} created with uuid {}", database.name, database.uuid);

        Ok(plan.with_database(database))
    }

    async fn read(&self, state: DatabaseModel) -> Result<Option<DatabaseModel>, ResourceError> {
        let database = self
            .client
            .get_database(state.uuid()?, state.cluster_name.as_deref())
            .await
            .summarize("Error Reading ClickHouse Database")?;

        Ok(database.map(|database| state.with_database(database)))
    }

    async fn update(
        &self,
        _plan: DatabaseModel,
        _state: DatabaseModel,
    ) -> Result<DatabaseModel, ResourceError> {
        Err(ResourceError::new(
            "Update Not Supported",
            "Update operation is not supported for clickhousedbops_database resource",
        ))
    }

    async fn delete(&self, state: DatabaseModel) -> Result<(), ResourceError> {
        self.client
            .delete_database(state.uuid()?, state.cluster_name.as_deref())
            .await
            .summarize("Error Deleting ClickHouse Database")
    }

    /// Accepts `[<cluster>:]<UUID or name>`.
    async fn import(&self, id: &str) -> Result<DatabaseModel, ResourceError> {
        let (cluster_name, reference) = parse_import_id(id);

        let uuid = if uuid::Uuid::parse_str(&reference).is_ok() {
            reference
        } else {
            self.client
                .find_database_by_name(&reference, cluster_name.as_deref())
                .await
                .summarize("Cannot import database by name")?
                .ok_or_else(|| {
                    ResourceError::new("Cannot import database by name", "Database not found")
                })?
                .uuid
        };

        Ok(DatabaseModel {
            cluster_name,
            uuid: Some(uuid),
            ..Default::default()
        })
    }
}
