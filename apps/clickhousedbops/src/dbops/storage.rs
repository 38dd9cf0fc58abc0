use super::{DbOpsClient, DbOpsError};
use crate::querybuilder::{Field, Select, Where};

impl DbOpsClient {
    /// Whether access entities are kept in a `replicated` user directory. In
    /// that case they already propagate to every node without `ON CLUSTER`.
    pub async fn is_replicated_storage(&self) -> Result<bool, DbOpsError> {
        let rows = self
            .select(
                Select::new(vec![Field::new("type")], "system.user_directories")
                    .where_([Where::equals("type", "replicated")]),
            )
            .await?;
        Ok(!rows.is_empty())
    }
}
