use super::{backtick, ensure_name, finish, push_cluster, quote, QueryBuilder, QueryBuilderError};

#[derive(Debug, Clone, Default)]
pub struct CreateDatabase {
    database_name: String,
    cluster_name: Option<String>,
    comment: Option<String>,
}

impl CreateDatabase {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Default::default()
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn with_comment(mut self, comment: Option<&str>) -> Self {
        self.comment = comment.map(str::to_string);
        self
    }
}

impl QueryBuilder for CreateDatabase {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.database_name, "CREATE DATABASE")?;

        let mut tokens = vec![
            "CREATE".to_string(),
            "DATABASE".to_string(),
            "IF".to_string(),
            "NOT".to_string(),
            "EXISTS".to_string(),
            backtick(&self.database_name),
        ];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        if let Some(comment) = &self.comment {
            tokens.push(format!("COMMENT {}", quote(comment)));
        }
        Ok(finish(tokens))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DropDatabase {
    database_name: String,
    cluster_name: Option<String>,
}

impl DropDatabase {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            cluster_name: None,
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for DropDatabase {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.database_name, "DROP DATABASE")?;

        let mut tokens = vec![
            "DROP".to_string(),
            "DATABASE".to_string(),
            "IF".to_string(),
            "EXISTS".to_string(),
            backtick(&self.database_name),
        ];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        Ok(finish(tokens))
    }
}
