use super::{backtick, ensure_name, finish, push_cluster, quote, QueryBuilder, QueryBuilderError};

/// `CREATE ROLE IF NOT EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct CreateRole {
    resource_name: String,
    settings_profile: Option<String>,
    cluster_name: Option<String>,
}

impl CreateRole {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    pub fn with_settings_profile(mut self, profile_name: Option<&str>) -> Self {
        self.settings_profile = profile_name.map(str::to_string);
        self
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for CreateRole {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "CREATE ROLE")?;

        let mut tokens: Vec<String> = ["CREATE", "ROLE", "IF", "NOT", "EXISTS"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        tokens.push(backtick(&self.resource_name));
        push_cluster(&mut tokens, self.cluster_name.as_deref());

        if let Some(profile) = &self.settings_profile {
            tokens.push(format!("SETTINGS PROFILE {}", quote(profile)));
        }

        Ok(finish(tokens))
    }
}

/// `ALTER ROLE ...`
#[derive(Debug, Clone, Default)]
pub struct AlterRole {
    resource_name: String,
    old_settings_profile: Option<String>,
    new_settings_profile: Option<String>,
    new_name: Option<String>,
    cluster_name: Option<String>,
    set_settings_profile: Option<String>,
    if_exists: bool,
}

impl AlterRole {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn rename_to(mut self, new_name: Option<&str>) -> Self {
        self.new_name = new_name.map(str::to_string);
        self
    }

    pub fn drop_settings_profile(mut self, profile_name: Option<&str>) -> Self {
        self.old_settings_profile = profile_name.map(str::to_string);
        self
    }

    pub fn add_settings_profile(mut self, profile_name: Option<&str>) -> Self {
        self.new_settings_profile = profile_name.map(str::to_string);
        self
    }

    /// Legacy `SETTINGS PROFILE '<name>'` clause, replacing every settings element.
    pub fn set_settings_profile(mut self, profile_name: Option<&str>) -> Self {
        self.set_settings_profile = profile_name.map(str::to_string);
        self
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for AlterRole {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "ALTER ROLE")?;

        let mut any_changes = false;
        let mut tokens = vec!["ALTER".to_string(), "ROLE".to_string()];
        if self.if_exists {
            tokens.push("IF".to_string());
            tokens.push("EXISTS".to_string());
        }
        tokens.push(backtick(&self.resource_name));

        if let Some(new_name) = &self.new_name {
            if *new_name != self.resource_name {
                any_changes = true;
                tokens.push(format!("RENAME TO {}", backtick(new_name)));
            }
        }

        push_cluster(&mut tokens, self.cluster_name.as_deref());

        let old = self.old_settings_profile.as_deref();
        let new = self.new_settings_profile.as_deref();

        if let Some(old_profile) = old {
            if new != Some(old_profile) {
                any_changes = true;
                tokens.push(format!("DROP PROFILES {}", quote(old_profile)));
            }
        }
        if let Some(new_profile) = new {
            if old != Some(new_profile) {
                any_changes = true;
                tokens.push(format!("ADD PROFILE {}", quote(new_profile)));
            }
        }

        if let Some(profile) = &self.set_settings_profile {
            any_changes = true;
            tokens.push(format!("SETTINGS PROFILE {}", quote(profile)));
        }

        if !any_changes {
            return Err(QueryBuilderError::NoChange);
        }

        Ok(finish(tokens))
    }
}

/// `DROP ROLE IF EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct DropRole {
    resource_name: String,
    cluster_name: Option<String>,
}

impl DropRole {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            cluster_name: None,
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }
}

impl QueryBuilder for DropRole {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "DROP ROLE")?;
        let mut tokens = vec![
            "DROP".to_string(),
            "ROLE".to_string(),
            "IF".to_string(),
            "EXISTS".to_string(),
            backtick(&self.resource_name),
        ];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        Ok(finish(tokens))
    }
}
