//! Read-only lookups of existing ClickHouse objects.

pub mod settings_profile;

pub use settings_profile::SettingsProfileDataSource;
