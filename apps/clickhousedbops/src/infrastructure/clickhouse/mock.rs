use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ClickhouseClient, ClickhouseError, Row};

/// Records every statement and serves scripted result sets.
///
/// A scripted response is consumed by the first `SELECT` containing its
/// pattern. Unmatched selects return no rows.
#[derive(Default)]
pub(crate) struct MockClickhouseClient {
    executed: Mutex<Vec<String>>,
    selected: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, Vec<Row>)>>,
    failures: Mutex<Vec<String>>,
}

impl MockClickhouseClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, pattern: &str, rows: Vec<Value>) -> &Self {
        let rows = rows
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => Row::new(map),
                other => panic!("mock rows must be JSON objects, got {other}"),
            })
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), rows));
        self
    }

    pub(crate) fn fail_on(&self, pattern: &str) -> &Self {
        self.failures.lock().unwrap().push(pattern.to_string());
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub(crate) fn selected(&self) -> Vec<String> {
        self.selected.lock().unwrap().clone()
    }

    fn check_failure(&self, sql: &str) -> Result<(), ClickhouseError> {
        let failures = self.failures.lock().unwrap();
        if failures.iter().any(|pattern| sql.contains(pattern.as_str())) {
            return Err(ClickhouseError::Server {
                status: 500,
                message: format!("mock failure for: {sql}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClickhouseClient for MockClickhouseClient {
    async fn exec(&self, sql: &str) -> Result<(), ClickhouseError> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.check_failure(sql)
    }

    async fn select(&self, sql: &str) -> Result<Vec<Row>, ClickhouseError> {
        self.selected.lock().unwrap().push(sql.to_string());
        self.check_failure(sql)?;

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
