//! # Query Builder
//!
//! Fluent builders that render already-interpolated ClickHouse access-control
//! statements (`CREATE USER`, `ALTER ROLE`, `GRANT`, ...) and the `SELECT`s used
//! to read back `system.*` tables.
//!
//! Builders only assemble tokens. They never talk to ClickHouse, which keeps
//! them trivially testable: every builder is checked against the exact string
//! it must produce.
//!
//! ## Quoting
//! - identifiers (user, role, profile, database, table and column names) are
//!   wrapped in backticks by [`backtick`]
//! - literals (cluster names, profile references, passwords hashes, comments)
//!   are wrapped in single quotes by [`quote`]

pub mod database;
pub mod grant;
pub mod role;
pub mod select;
pub mod setting;
pub mod settings_profile;
pub mod user;
pub mod where_clause;

pub use database::{CreateDatabase, DropDatabase};
pub use grant::{GrantPrivilege, GrantRole, RevokePrivilege, RevokeRole};
pub use role::{AlterRole, CreateRole, DropRole};
pub use select::{Field, Order, Select};
pub use setting::{AlterSetting, SettingAction, Writability};
pub use settings_profile::{AlterSettingsProfile, CreateSettingsProfile, DropSettingsProfile};
pub use user::{AlterUser, CreateUser, DropUser, Identification};
pub use where_clause::{SqlValue, Where};

/// Errors raised while assembling a statement.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryBuilderError {
    #[error("resource name cannot be empty for {statement} queries")]
    EmptyResourceName { statement: &'static str },

    #[error("no change to be made")]
    NoChange,

    #[error("{statement} requires at least one {what}")]
    MissingClause {
        statement: &'static str,
        what: &'static str,
    },

    #[error("invalid privilege '{0}'")]
    InvalidPrivilege(String),
}

/// Implemented by every statement builder.
pub trait QueryBuilder {
    fn build(&self) -> Result<String, QueryBuilderError>;
}

/// Wraps an identifier in backticks, escaping backslashes and backticks.
pub fn backtick(s: &str) -> String {
    format!("`{}`", s.replace('\\', "\\\\").replace('`', "\\`"))
}

/// Wraps a literal in single quotes, escaping backslashes and single quotes.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Joins tokens with single spaces and terminates the statement.
pub(crate) fn finish(tokens: Vec<String>) -> String {
    format!("{};", tokens.join(" "))
}

/// Appends `ON CLUSTER '<name>'` when a cluster is configured.
pub(crate) fn push_cluster(tokens: &mut Vec<String>, cluster_name: Option<&str>) {
    if let Some(cluster) = cluster_name {
        tokens.push("ON".to_string());
        tokens.push("CLUSTER".to_string());
        tokens.push(quote(cluster));
    }
}

pub(crate) fn ensure_name(name: &str, statement: &'static str) -> Result<(), QueryBuilderError> {
    if name.is_empty() {
        return Err(QueryBuilderError::EmptyResourceName { statement });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_plain() {
        assert_eq!(backtick("john"), "`john`");
    }

    #[test]
    fn test_backtick_escapes_backtick() {
        assert_eq!(backtick("te`st"), "`te\\`st`");
    }

    #[test]
    fn test_backtick_escapes_backslash() {
        assert_eq!(backtick("a\\b"), "`a\\\\b`");
    }

    #[test]
    fn test_quote_escapes_single_quote() {
        assert_eq!(quote("it's"), "'it\\'s'");
    }

    #[test]
    fn test_quote_injection_attempt_stays_literal() {
        let quoted = quote("x'; DROP USER admin; --");
        assert_eq!(quoted, "'x\\'; DROP USER admin; --'");
    }

    #[test]
    fn test_push_cluster() {
        let mut tokens = vec!["DROP".to_string()];
        push_cluster(&mut tokens, Some("dev"));
        assert_eq!(tokens.join(" "), "DROP ON CLUSTER 'dev'");

        let mut tokens = vec!["DROP".to_string()];
        push_cluster(&mut tokens, None);
        assert_eq!(tokens.join(" "), "DROP");
    }
}
