use tracing::info;

use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{CreateDatabase, DropDatabase, Field, QueryBuilder, Select, Where};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    pub uuid: String,
    pub name: String,
    pub comment: Option<String>,
}

impl DbOpsClient {
    pub async fn create_database(
        &self,
        name: &str,
        comment: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Result<Database, DbOpsError> {
        let sql = CreateDatabase::new(name)
            .with_cluster(cluster_name)
            .with_comment(comment)
            .build()?;
        self.exec(&sql).await?;
        info!("Created database {}", name);

        self.find_database_by_name(name, cluster_name)
            .await?
            .ok_or_else(|| DbOpsError::not_found("database", name))
    }

    pub async fn get_database(
        &self,
        uuid: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError> {
        let rows = self
            .select(
                Select::new(
                    vec![Field::new("name"), Field::new("comment")],
                    "system.databases",
                )
                .with_cluster(cluster_name)
                .where_([Where::equals("uuid", uuid)]),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        Ok(Some(Database {
            uuid: uuid.to_string(),
            name: row.get_string("name")?,
            // `comment` is an empty string when unset.
            comment: row
                .get_nullable_string("comment")?
                .filter(|c| !c.is_empty()),
        }))
    }

    pub async fn find_database_by_name(
        &self,
        name: &str,
        cluster_name: Option<&str>,
    ) -> Result<Option<Database>, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("uuid").to_string_fn()], "system.databases")
                    .with_cluster(cluster_name)
                    .where_([Where::equals("name", name)]),
            )
            .await?;

        match rows.first() {
            Some(row) => self.get_database(&row.get_string("uuid")?, cluster_name).await,
            None => Ok(None),
        }
    }

    pub async fn delete_database(
        &self,
        uuid: &str,
        cluster_name: Option<&str>,
    ) -> Result<(), DbOpsError> {
        let Some(database) = self.get_database(uuid, cluster_name).await? else {
            return Ok(());
        };

        let sql = DropDatabase::new(&database.name)
            .with_cluster(cluster_name)
            .build()?;
        self.exec(&sql).await?;
        info!("Dropped database {}", database.name);
        Ok(())
    }
}
