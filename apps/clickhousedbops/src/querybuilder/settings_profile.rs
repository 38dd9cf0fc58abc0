use itertools::Itertools;

use super::{backtick, ensure_name, finish, push_cluster, quote, QueryBuilder, QueryBuilderError};

/// `CREATE SETTINGS PROFILE IF NOT EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct CreateSettingsProfile {
    resource_name: String,
    cluster_name: Option<String>,
    inherit_from: Vec<String>,
}

impl CreateSettingsProfile {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn inherit_from(mut self, profiles: &[String]) -> Self {
        self.inherit_from = profiles.to_vec();
        self
    }
}

impl QueryBuilder for CreateSettingsProfile {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "CREATE SETTINGS PROFILE")?;

        let mut tokens: Vec<String> = ["CREATE", "SETTINGS", "PROFILE", "IF", "NOT", "EXISTS"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        tokens.push(backtick(&self.resource_name));
        push_cluster(&mut tokens, self.cluster_name.as_deref());

        if !self.inherit_from.is_empty() {
            let inherits = self
                .inherit_from
                .iter()
                .map(|p| format!("INHERIT {}", quote(p)))
                .join(", ");
            tokens.push(format!("SETTINGS {inherits}"));
        }

        Ok(finish(tokens))
    }
}

/// `ALTER SETTINGS PROFILE ...`
///
/// Inheritance is expressed as the difference between the current and the
/// desired parent list, so setting elements managed elsewhere are untouched.
#[derive(Debug, Clone, Default)]
pub struct AlterSettingsProfile {
    resource_name: String,
    new_name: Option<String>,
    cluster_name: Option<String>,
    if_exists: bool,
    current_inherit_from: Vec<String>,
    desired_inherit_from: Option<Vec<String>>,
}

impl AlterSettingsProfile {
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

    pub fn inherit_from(mut self, current: &[String], desired: &[String]) -> Self {
        self.current_inherit_from = current.to_vec();
        self.desired_inherit_from = Some(desired.to_vec());
        self
    }
}

impl QueryBuilder for AlterSettingsProfile {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "ALTER SETTINGS PROFILE")?;

        let mut any_changes = false;
        let mut tokens = vec![
            "ALTER".to_string(),
            "SETTINGS".to_string(),
            "PROFILE".to_string(),
        ];
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

        if let Some(desired) = &self.desired_inherit_from {
            // ADD PROFILES appends, so everything past the shared prefix is
            // dropped and re-added in the desired order.
            let kept = self
                .current_inherit_from
                .iter()
                .zip(desired)
                .take_while(|(current, wanted)| current == wanted)
                .count();
            let removed = &self.current_inherit_from[kept..];
            let added = &desired[kept..];

            if !removed.is_empty() {
                any_changes = true;
                tokens.push(format!(
                    "DROP PROFILES {}",
                    removed.iter().map(|p| quote(p)).join(", ")
                ));
            }
            if !added.is_empty() {
                any_changes = true;
                tokens.push(format!(
                    "ADD PROFILES {}",
                    added.iter().map(|p| quote(p)).join(", ")
                ));
            }
        }

        if !any_changes {
            return Err(QueryBuilderError::NoChange);
        }

        Ok(finish(tokens))
    }
}

/// `DROP SETTINGS PROFILE IF EXISTS ...`
#[derive(Debug, Clone, Default)]
pub struct DropSettingsProfile {
    resource_name: String,
    cluster_name: Option<String>,
}

impl DropSettingsProfile {
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

impl QueryBuilder for DropSettingsProfile {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.resource_name, "DROP SETTINGS PROFILE")?;
        let mut tokens: Vec<String> = ["DROP", "SETTINGS", "PROFILE", "IF", "EXISTS"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        tokens.push(backtick(&self.resource_name));
        push_cluster(&mut tokens, self.cluster_name.as_deref());
        Ok(finish(tokens))
    }
}
