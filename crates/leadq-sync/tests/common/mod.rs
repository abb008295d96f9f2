//! Shared fakes for engine and scheduler tests
//!
//! - [`MemoryQueueStore`] keeps the queue in a `Vec` and can be told to fail
//! - [`ScriptedEndpoint`] answers deliveries from a script with an optional
//!   delay, recording every payload it receives
//! - [`FixedProbe`] reports a reachability value set by the test

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use leadq_core::domain::{Payload, Record, Submission};
use leadq_core::ports::{
    DeliveryError, IConnectivityProbe, IDeliveryEndpoint, IQueueStore, SyncEvent,
};
use leadq_sync::engine::{SyncEngine, SyncEngineConfig};
use leadq_sync::notifier::ChannelNotificationService;

// ============================================================================
// MemoryQueueStore
// ============================================================================

#[derive(Default)]
pub struct MemoryQueueStore {
    records: Mutex<Vec<Record>>,
    saves: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryQueueStore {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IQueueStore for MemoryQueueStore {
    async fn load_all(&self) -> anyhow::Result<Vec<Record>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("corrupt data under key 'pendingLeads'");
        }
        Ok(self.snapshot())
    }

    async fn save_all(&self, records: &[Record]) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.records.lock().unwrap() = records.to_vec();
        Ok(())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.load_all().await?.len())
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

// ============================================================================
// ScriptedEndpoint
// ============================================================================

pub fn rejection() -> DeliveryError {
    DeliveryError::Rejected {
        status: 500,
        body: "boom".to_string(),
    }
}

pub struct ScriptedEndpoint {
    script: Mutex<VecDeque<Result<(), DeliveryError>>>,
    fallback: Result<(), DeliveryError>,
    delay: Duration,
    calls: Mutex<Vec<Payload>>,
}

impl ScriptedEndpoint {
    pub fn always_ok() -> Self {
        Self::scripted(Vec::new(), Ok(()))
    }

    pub fn always_failing() -> Self {
        Self::scripted(Vec::new(), Err(rejection()))
    }

    /// Answers from `script` in order, then with `fallback`
    pub fn scripted(
        script: Vec<Result<(), DeliveryError>>,
        fallback: Result<(), DeliveryError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Payload> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl IDeliveryEndpoint for ScriptedEndpoint {
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(payload.clone());
        let result = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}

// ============================================================================
// FixedProbe
// ============================================================================

pub struct FixedProbe {
    reachable: AtomicBool,
    calls: AtomicUsize,
    delay: Duration,
}

impl FixedProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Answers only after `delay`, like a probe against a slow network
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IConnectivityProbe for FixedProbe {
    async fn is_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reachable.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub store: Arc<MemoryQueueStore>,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub events: UnboundedReceiver<SyncEvent>,
}

impl Harness {
    pub fn new(store: MemoryQueueStore, endpoint: ScriptedEndpoint) -> Self {
        Self::with_config(store, endpoint, test_config())
    }

    pub fn with_config(
        store: MemoryQueueStore,
        endpoint: ScriptedEndpoint,
        config: SyncEngineConfig,
    ) -> Self {
        let store = Arc::new(store);
        let endpoint = Arc::new(endpoint);
        let (notifier, events) = ChannelNotificationService::new();
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            endpoint.clone(),
            Arc::new(notifier),
            config,
        ));
        Self {
            engine,
            store,
            endpoint,
            events,
        }
    }

    /// Events received so far, oldest first
    pub fn take_events(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Default engine settings: budget 3, 1 s between attempts, 15 s timeout
pub fn test_config() -> SyncEngineConfig {
    SyncEngineConfig {
        retry_budget: 3,
        drain_delay: Duration::from_millis(1000),
        delivery_timeout: Duration::from_secs(15),
    }
}

pub fn submission(name: &str, email: &str) -> Submission {
    let payload = Payload::new().with("fullName", name).with("email", email);
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
    Submission::captured_at(payload, at)
}

pub fn pending(name: &str) -> Record {
    Record::queued(submission(name, &format!("{}@x.com", name.to_lowercase())))
}

pub fn failed(name: &str) -> Record {
    let mut record = pending(name);
    record.record_failed_attempt(1).unwrap();
    record
}
