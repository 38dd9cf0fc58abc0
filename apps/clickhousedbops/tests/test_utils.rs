//! Shared test utilities for the clickhousedbops integration tests.
//!
//! [`ScriptedClickhouse`] stands in for a server: it records every statement
//! and answers queries from canned result sets.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clickhousedbops::infrastructure::clickhouse::{
    ClickhouseClient, ClickhouseError, ProviderConfig, Row,
};
use clickhousedbops::provider::Provider;
use serde_json::Value;

#[derive(Default)]
pub struct ScriptedClickhouse {
    executed: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, Vec<Row>)>>,
}

impl ScriptedClickhouse {
    /// The first query containing `pattern` gets `rows`; the script is then
    /// spent. Unscripted queries return no rows.
    pub fn respond(&self, pattern: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(columns) => Row::new(columns),
                other => panic!("rows must be JSON objects, got {other}"),
            })
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), rows));
    }

    /// Statements executed since the last call.
    pub fn take_executed(&self) -> Vec<String> {
        std::mem::take(&mut *self.executed.lock().unwrap())
    }
}

#[async_trait]
impl ClickhouseClient for ScriptedClickhouse {
    async fn exec(&self, sql: &str) -> Result<(), ClickhouseError> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn select(&self, sql: &str) -> Result<Vec<Row>, ClickhouseError> {
        let mut responses = self.responses.lock().unwrap();
        match responses
            .iter()
            .position(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            Some(index) => Ok(responses.remove(index).1),
            None => Ok(Vec::new()),
        }
    }
}

pub fn provider(clickhouse: &Arc<ScriptedClickhouse>) -> Provider {
    let clickhouse = clickhouse.clone();
    let factory = move |_: &ProviderConfig| -> Result<Arc<dyn ClickhouseClient>, ClickhouseError> {
        Ok(clickhouse.clone())
    };
    Provider::configure_with(&ProviderConfig::default(), &factory).unwrap()
}
