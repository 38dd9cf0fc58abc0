use super::{backtick, ensure_name, finish, push_cluster, quote, QueryBuilder, QueryBuilderError};

/// Authentication method of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    Sha256Hash(String),
    SslCertificateCn(String),
}

impl Identification {
    fn sql(&self) -> String {
        match self {
            Identification::Sha256Hash(hash) => {
                format!("IDENTIFIED WITH sha256_hash BY {}", quote(hash))
            }
            Identification::SslCertificateCn(cn) => {
                format!("IDENTIFIED WITH ssl_certificate CN {}", quote(cn))
            }
        }
    }
}

/// `CREATE USER IF NOT EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    resource_name: String,
    identified: Option<Identification>,
    default_role: Option<String>,
    settings_profile: Option<String>,
    cluster_name: Option<String>,
}

impl CreateUser {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    pub fn identified(mut self, identification: Identification) -> Self {
        self.identified = Some(identification);
        self
    }

    pub fn with_default_role(mut self, role_name: Option<&str>) -> Self {
        self.default_role = role_name.map(str::to_string);
        self
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

impl QueryBuilder for CreateUser {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "CREATE USER")?;

        let mut tokens: Vec<String> = ["CREATE", "USER", "IF", "NOT", "EXISTS"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        tokens.push(backtick(&self.resource_name));
        push_cluster(&mut tokens, self.cluster_name.as_deref());

        if let Some(identified) = &self.identified {
            tokens.push(identified.sql());
        }
        if let Some(profile) = &self.settings_profile {
            tokens.push(format!("SETTINGS PROFILE {}", quote(profile)));
        }
        if let Some(role) = &self.default_role {
            tokens.push(format!("DEFAULT ROLE {}", quote(role)));
        }

        Ok(finish(tokens))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingsChange {
    Profile(String),
    None,
}

/// `ALTER USER ...`
///
/// Only clauses that actually change something are rendered; a builder with
/// nothing to do fails with [`QueryBuilderError::NoChange`].
#[derive(Debug, Clone, Default)]
pub struct AlterUser {
    resource_name: String,
    new_name: Option<String>,
    cluster_name: Option<String>,
    if_exists: bool,
    default_roles: Option<Vec<String>>,
    settings: Option<SettingsChange>,
}

impl AlterUser {
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

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    /// Replaces the default roles. An empty list renders `DEFAULT ROLE NONE`.
    pub fn default_roles(mut self, roles: Vec<String>) -> Self {
        self.default_roles = Some(roles);
        self
    }

    /// Legacy `SETTINGS PROFILE '<name>'` clause.
    pub fn set_settings_profile(mut self, profile_name: Option<&str>) -> Self {
        self.settings = profile_name.map(|p| SettingsChange::Profile(p.to_string()));
        self
    }

    /// Renders `SETTINGS NONE`, removing every settings element from the user.
    pub fn clear_settings(mut self) -> Self {
        self.settings = Some(SettingsChange::None);
        self
    }
}

impl QueryBuilder for AlterUser {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "ALTER USER")?;

        let mut any_changes = false;
        let mut tokens = vec!["ALTER".to_string(), "USER".to_string()];
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

        if let Some(roles) = &self.default_roles {
            any_changes = true;
            if roles.is_empty() {
                tokens.push("DEFAULT ROLE NONE".to_string());
            } else {
                let roles = roles
                    .iter()
                    .map(|r| backtick(r))
                    .collect::<Vec<_>>()
                    .join(", ");
                tokens.push(format!("DEFAULT ROLE {roles}"));
            }
        }

        match &self.settings {
            Some(SettingsChange::Profile(profile)) => {
                any_changes = true;
                tokens.push(format!("SETTINGS PROFILE {}", quote(profile)));
            }
            Some(SettingsChange::None) => {
                any_changes = true;
                tokens.push("SETTINGS NONE".to_string());
            }
            None => {}
        }

        if !any_changes {
            return Err(QueryBuilderError::NoChange);
        }

        Ok(finish(tokens))
    }
}

/// `DROP USER IF EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct DropUser {
    resource_name: String,
    cluster_name: Option<String>,
}

impl DropUser {
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

impl QueryBuilder for DropUser {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "DROP USER")?;
        let mut tokens = vec![
            "DROP".to_string(),
            "USER".to_string(),
            "IF".to_string(),
            "EXISTS".to_string(),
            backtick(&self.resource_name),
        ];
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        Ok(finish(tokens))
    }
}
