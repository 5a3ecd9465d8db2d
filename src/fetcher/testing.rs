//! Scripted [`VideoSource`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::endpoints::{Endpoint, ResponseSchema};
use crate::error::FetchError;

use super::VideoSource;

/// Replays a fixed script of responses per endpoint URL; the last entry
/// repeats once the script runs out.
pub struct ScriptedSource {
    script: HashMap<String, Vec<std::result::Result<Value, FetchError>>>,
    calls: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with(
        mut self,
        endpoint: &Endpoint,
        responses: Vec<std::result::Result<Value, FetchError>>,
    ) -> Self {
        self.script.insert(endpoint.url.clone(), responses);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, endpoint: &Endpoint) -> usize {
        self.calls().iter().filter(|u| **u == endpoint.url).count()
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    async fn get_json(&self, endpoint: &Endpoint) -> std::result::Result<Value, FetchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FetchError::SessionClosed);
        }
        let index = {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.iter().filter(|u| **u == endpoint.url).count();
            calls.push(endpoint.url.clone());
            index
        };
        let responses = self
            .script
            .get(&endpoint.url)
            .expect("unscripted endpoint");
        responses[index.min(responses.len() - 1)].clone()
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }
}

pub fn schema_a() -> Endpoint {
    Endpoint::new("https://a.example/api", ResponseSchema::VideoField)
}

pub fn schema_b() -> Endpoint {
    Endpoint::new("https://b.example/api", ResponseSchema::DataObject)
}

pub fn schema_c() -> Endpoint {
    Endpoint::new("https://c.example/api", ResponseSchema::UrlField)
}
