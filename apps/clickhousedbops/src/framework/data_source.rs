use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::diagnostics::{Diagnostic, Diagnostics};
use super::resource::ResourceError;

/// Read-only lookup of an existing object.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    fn type_name(&self) -> &'static str;

    async fn read(&self, config: Self::Model) -> Result<Self::Model, ResourceError>;
}

#[async_trait]
pub trait DynDataSource: Send + Sync {
    fn type_name(&self) -> &'static str;
    async fn read(&self, config: Value) -> Result<Value, Diagnostics>;
}

#[async_trait]
impl<D: DataSource> DynDataSource for D {
    fn type_name(&self) -> &'static str {
        DataSource::type_name(self)
    }

    async fn read(&self, config: Value) -> Result<Value, Diagnostics> {
        let config = serde_json::from_value(config)
            .map_err(|e| Diagnostics::from(Diagnostic::error("Invalid input", e.to_string())))?;
        let model = DataSource::read(self, config).await?;
        serde_json::to_value(model)
            .map_err(|e| Diagnostic::error("Invalid data source data", e.to_string()).into())
    }
}
