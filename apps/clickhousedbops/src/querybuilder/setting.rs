use serde::{Deserialize, Serialize};

use super::{backtick, ensure_name, finish, push_cluster, quote, QueryBuilder, QueryBuilderError};

/// Constraint on who may change a setting inside a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Writability {
    Const,
    Writable,
    ChangeableInReadonly,
}

impl Writability {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Writability::Const => "CONST",
            Writability::Writable => "WRITABLE",
            Writability::ChangeableInReadonly => "CHANGEABLE_IN_READONLY",
        }
    }

    /// Maps the `writability` column of `system.settings_profile_elements`.
    pub fn from_sql(value: &str) -> Option<Self> {
        match value {
            "CONST" => Some(Writability::Const),
            "WRITABLE" => Some(Writability::Writable),
            "CHANGEABLE_IN_READONLY" => Some(Writability::ChangeableInReadonly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingAction {
    Add,
    Modify,
    Drop,
}

/// `ALTER SETTINGS PROFILE <p> {ADD|MODIFY|DROP} SETTINGS ...`
#[derive(Debug, Clone)]
pub struct AlterSetting {
    profile_name: String,
    setting_name: String,
    action: SettingAction,
    cluster_name: Option<String>,
    value: Option<String>,
    min: Option<String>,
    max: Option<String>,
    writability: Option<Writability>,
}

impl AlterSetting {
    pub fn new(
        profile_name: impl Into<String>,
        setting_name: impl Into<String>,
        action: SettingAction,
    ) -> Self {
        Self {
            profile_name: profile_name.into(),
            setting_name: setting_name.into(),
            action,
            cluster_name: None,
            value: None,
            min: None,
            max: None,
            writability: None,
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn value(mut self, value: Option<&str>) -> Self {
        self.value = value.map(str::to_string);
        self
    }

    pub fn min(mut self, min: Option<&str>) -> Self {
        self.min = min.map(str::to_string);
        self
    }

    pub fn max(mut self, max: Option<&str>) -> Self {
        self.max = max.map(str::to_string);
        self
    }

    pub fn writability(mut self, writability: Option<Writability>) -> Self {
        self.writability = writability;
        self
    }
}

impl QueryBuilder for AlterSetting {
    fn build(&self) -> Result<String, QueryBuilderError> {
        ensure_name(&self.profile_name, "ALTER SETTINGS PROFILE")?;
        ensure_name(&self.setting_name, "SETTING")?;

        let mut tokens = vec![
            "ALTER".to_string(),
            "SETTINGS".to_string(),
            "PROFILE".to_string(),
            backtick(&self.profile_name),
        ];
        push_cluster(&mut tokens, self.cluster_name.as_deref());

        let verb = match self.action {
            SettingAction::Add => "ADD",
            SettingAction::Modify => "MODIFY",
            SettingAction::Drop => {
                tokens.push(format!("DROP SETTINGS {}", backtick(&self.setting_name)));
                return Ok(finish(tokens));
            }
        };

        tokens.push(format!("{verb} SETTINGS {}", backtick(&self.setting_name)));

        if self.value.is_none()
            && self.min.is_none()
            && self.max.is_none()
            && self.writability.is_none()
        {
            return Err(QueryBuilderError::MissingClause {
                statement: "ALTER SETTINGS PROFILE ... SETTINGS",
                what: "value, constraint or writability",
            });
        }

        if let Some(value) = &self.value {
            tokens.push(format!("= {}", quote(value)));
        }
        if let Some(min) = &self.min {
            tokens.push(format!("MIN {}", quote(min)));
        }
        if let Some(max) = &self.max {
            tokens.push(format!("MAX {}", quote(max)));
        }
        if let Some(writability) = &self.writability {
            tokens.push(writability.as_sql().to_string());
        }

        Ok(finish(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_setting_with_value() {
        let sql = AlterSetting::new("limited", "max_memory_usage", SettingAction::Add)
            .value(Some("1000"))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER SETTINGS PROFILE `limited` ADD SETTINGS `max_memory_usage` = '1000';"
        );
    }

    #[test]
    fn test_add_setting_with_constraints_on_cluster() {
        let sql = AlterSetting::new("limited", "max_threads", SettingAction::Add)
            .with_cluster(Some("c1"))
            .value(Some("4"))
            .min(Some("1"))
            .max(Some("8"))
            .writability(Some(Writability::ChangeableInReadonly))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER SETTINGS PROFILE `limited` ON CLUSTER 'c1' ADD SETTINGS `max_threads` = '4' MIN '1' MAX '8' CHANGEABLE_IN_READONLY;"
        );
    }

    #[test]
    fn test_modify_setting_constraint_only() {
        let sql = AlterSetting::new("p", "readonly", SettingAction::Modify)
            .writability(Some(Writability::Const))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER SETTINGS PROFILE `p` MODIFY SETTINGS `readonly` CONST;"
        );
    }

    #[test]
    fn test_add_setting_without_anything_fails() {
        let err = AlterSetting::new("p", "readonly", SettingAction::Add)
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryBuilderError::MissingClause { .. }));
    }

    #[test]
    fn test_drop_setting_ignores_value() {
        let sql = AlterSetting::new("p", "max_threads", SettingAction::Drop)
            .value(Some("4"))
            .with_cluster(Some("c"))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER SETTINGS PROFILE `p` ON CLUSTER 'c' DROP SETTINGS `max_threads`;"
        );
    }

    #[test]
    fn test_writability_round_trips_through_system_table_names() {
        for w in [
            Writability::Const,
            Writability::Writable,
            Writability::ChangeableInReadonly,
        ] {
            assert_eq!(Writability::from_sql(w.as_sql()), Some(w));
        }
        assert_eq!(Writability::from_sql(""), None);
    }
}
