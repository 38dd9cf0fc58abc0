//! # Provider
//!
//! Entry point for a host: validates the connection settings, builds the
//! ClickHouse client and exposes every resource and data source keyed by its
//! full type name (`clickhousedbops_<kind>`).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::datasources::SettingsProfileDataSource;
use crate::dbops::{Client, DbOpsClient};
use crate::framework::{DynDataSource, DynResource};
use crate::infrastructure::clickhouse::{
    ClickhouseClient, ClickhouseError, ConfigError, HttpClickhouseClient, ProviderConfig,
};
use crate::resources::{
    DatabaseResource, GrantPrivilegeResource, GrantRoleResource, RoleResource, SettingResource,
    SettingsProfileAssociationResource, SettingsProfileResource, UserResource,
};

pub const TYPE_NAME_PREFIX: &str = "clickhousedbops_";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("Invalid provider configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to create ClickHouse client: {0}")]
    Client(#[from] ClickhouseError),
}

/// Builds the transport used by every operation. Hosts that speak the native
/// protocol plug their own in through [`Provider::configure_with`].
pub type ClientFactory =
    dyn Fn(&ProviderConfig) -> Result<Arc<dyn ClickhouseClient>, ClickhouseError> + Send + Sync;

pub fn http_client_factory(
    config: &ProviderConfig,
) -> Result<Arc<dyn ClickhouseClient>, ClickhouseError> {
    Ok(Arc::new(HttpClickhouseClient::new(config)?))
}

pub struct Provider {
    client: Arc<dyn Client>,
    resources: BTreeMap<String, Arc<dyn DynResource>>,
    data_sources: BTreeMap<String, Arc<dyn DynDataSource>>,
}

impl Provider {
    pub fn configure(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::configure_with(config, &http_client_factory)
    }

    pub fn configure_with(
        config: &ProviderConfig,
        factory: &ClientFactory,
    ) -> Result<Self, ProviderError> {
        config.validate()?;
        let clickhouse = factory(config)?;
        info!("Configured ClickHouse provider for {}", config.display_url());

        Ok(Self::with_client(Arc::new(DbOpsClient::new(clickhouse))))
    }

    pub fn with_client(client: Arc<dyn Client>) -> Self {
        let resources: Vec<Arc<dyn DynResource>> = vec![
            Arc::new(DatabaseResource::new(client.clone())),
            Arc::new(GrantPrivilegeResource::new(client.clone())),
            Arc::new(GrantRoleResource::new(client.clone())),
            Arc::new(RoleResource::new(client.clone())),
            Arc::new(SettingResource::new(client.clone())),
            Arc::new(SettingsProfileResource::new(client.clone())),
            Arc::new(SettingsProfileAssociationResource::new(client.clone())),
            Arc::new(UserResource::new(client.clone())),
        ];
        let data_sources: Vec<Arc<dyn DynDataSource>> =
            vec![Arc::new(SettingsProfileDataSource::new(client.clone()))];

        Self {
            resources: resources
                .into_iter()
                .map(|r| (format!("{TYPE_NAME_PREFIX}{}", r.type_name()), r))
                .collect(),
            data_sources: data_sources
                .into_iter()
                .map(|d| (format!("{TYPE_NAME_PREFIX}{}", d.type_name()), d))
                .collect(),
            client,
        }
    }

    pub fn client(&self) -> Arc<dyn Client> {
        self.client.clone()
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &Arc<dyn DynResource>)> {
        self.resources.iter().map(|(name, r)| (name.as_str(), r))
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn DynResource>> {
        self.resources.get(type_name).cloned()
    }

    pub fn data_sources(&self) -> impl Iterator<Item = (&str, &Arc<dyn DynDataSource>)> {
        self.data_sources.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DynDataSource>> {
        self.data_sources.get(type_name).cloned()
    }
}
