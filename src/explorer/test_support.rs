//! Scripted generative client and recording runtime shared by the explorer tests.

#![cfg(test)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::generative::GenerativeClient;
use crate::error::{AlmanacError, Result};
use crate::runtime::{ExplorerRuntime, RuntimeError, RuntimeEvent};

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Answers prompts with a closure and records every call.
///
/// A gated client holds each call until the test adds a permit to the gate.
pub(crate) struct ScriptedClient {
    respond: Responder,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn new(respond: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn gated(
        respond: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut client = Self::new(respond);
        client.gate = Some(gate.clone());
        (client, gate)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| AlmanacError::Internal(e.to_string()))?
                .forget();
        }

        (self.respond)(prompt)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Runtime that keeps every emitted event for later inspection.
#[derive(Default)]
pub(crate) struct RecordingRuntime {
    events: Mutex<Vec<RuntimeEvent>>,
}

impl RecordingRuntime {
    pub(crate) fn events(&self) -> Vec<RuntimeEvent> {
        self.events.lock().clone()
    }

    /// Serialized `type` tags of the recorded events, in order.
    pub(crate) fn kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .filter_map(|v| v["type"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ExplorerRuntime for RecordingRuntime {
    fn emit(&self, event: RuntimeEvent) -> std::result::Result<(), RuntimeError> {
        self.events.lock().push(event);
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        false
    }

    async fn shutdown(&self) -> std::result::Result<(), RuntimeError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
