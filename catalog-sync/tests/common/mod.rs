//! In-memory doubles for the catalog sync trait seams.
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use catalog_sync::consumer::{ConsumedMessage, Consumer};
use catalog_sync::dead_letter::{DeadLetterReason, DeadLetterSink};
use catalog_sync::errors::{IngestError, PublishError};
use catalog_sync::orchestrator::{Orchestrator, OrchestratorConfig};
use catalog_sync::processor::EventProcessor;
use catalog_sync::publisher::ChangePublisher;
use catalog_sync::updater::IndexUpdater;
use catalog_sync_repository::{ProductRepository, SearchIndexError, SearchIndexProvider, StoreError};
use catalog_sync_shared::{ChangeEvent, NewProduct, Operation, Product, ProductChanges, ProductDocument};

pub const TOPIC: &str = "product_events";

// ---------------------------------------------------------------------------
// Change topic
// ---------------------------------------------------------------------------

struct TopicState {
    logs: Vec<Vec<ConsumedMessage>>,
    positions: Vec<i64>,
    committed: Vec<Option<i64>>,
    deliveries: Vec<(i32, i64)>,
    cursor: usize,
}

/// A partitioned log with consumer-group positions, standing in for Kafka.
pub struct InMemoryTopic {
    state: Mutex<TopicState>,
}

impl InMemoryTopic {
    pub fn new(partitions: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TopicState {
                logs: vec![Vec::new(); partitions],
                positions: vec![0; partitions],
                committed: vec![None; partitions],
                deliveries: Vec::new(),
                cursor: 0,
            }),
        })
    }

    pub fn partition_for(&self, key: &str) -> i32 {
        let partitions = self.state.lock().unwrap().logs.len() as u64;
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % partitions) as i32
    }

    /// Append a keyed message, routed by key like the Kafka partitioner.
    pub fn publish(&self, key: &str, payload: Vec<u8>) -> (i32, i64) {
        let partition = self.partition_for(key);
        self.append(partition, Some(key.as_bytes().to_vec()), Some(payload))
    }

    /// Append a change event under its product id.
    pub fn publish_event(&self, event: &ChangeEvent) -> (i32, i64) {
        self.publish(&event.partition_key(), event.encode().unwrap())
    }

    pub fn append(&self, partition: i32, key: Option<Vec<u8>>, payload: Option<Vec<u8>>) -> (i32, i64) {
        let mut state = self.state.lock().unwrap();
        let log = &mut state.logs[partition as usize];
        let offset = log.len() as i64;
        log.push(ConsumedMessage::new(TOPIC, partition, offset, key, payload));
        (partition, offset)
    }

    pub fn messages(&self) -> Vec<ConsumedMessage> {
        let state = self.state.lock().unwrap();
        state.logs.iter().flatten().cloned().collect()
    }

    pub fn committed(&self, partition: i32) -> Option<i64> {
        self.state.lock().unwrap().committed[partition as usize]
    }

    /// Whether every published message has been committed past.
    pub fn fully_committed(&self) -> bool {
        let state = self.state.lock().unwrap();
        state
            .logs
            .iter()
            .zip(state.committed.iter())
            .all(|(log, committed)| log.is_empty() || *committed == Some(log.len() as i64))
    }

    /// How many times the message at this position was handed out.
    pub fn delivery_count(&self, partition: i32, offset: i64) -> usize {
        self.state
            .lock()
            .unwrap()
            .deliveries
            .iter()
            .filter(|delivery| **delivery == (partition, offset))
            .count()
    }

    fn next(&self) -> Option<ConsumedMessage> {
        let mut state = self.state.lock().unwrap();
        let partitions = state.logs.len();

        for step in 0..partitions {
            let partition = (state.cursor + step) % partitions;
            let position = state.positions[partition];
            if let Some(message) = state.logs[partition].get(position as usize).cloned() {
                state.positions[partition] = position + 1;
                state.cursor = partition + 1;
                state.deliveries.push((message.partition, message.offset));
                return Some(message);
            }
        }
        None
    }

    fn commit(&self, message: &ConsumedMessage) {
        let mut state = self.state.lock().unwrap();
        state.committed[message.partition as usize] = Some(message.offset + 1);
    }

    fn seek(&self, message: &ConsumedMessage) {
        let mut state = self.state.lock().unwrap();
        state.positions[message.partition as usize] = message.offset;
    }
}

/// Consumer reading from an [`InMemoryTopic`].
pub struct MockConsumer {
    topic: Arc<InMemoryTopic>,
    fail_subscribe: bool,
    failing_polls: AtomicUsize,
    pub polls: AtomicUsize,
}

impl MockConsumer {
    pub fn new(topic: Arc<InMemoryTopic>) -> Self {
        Self {
            topic,
            fail_subscribe: false,
            failing_polls: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn with_subscribe_error(topic: Arc<InMemoryTopic>) -> Self {
        Self {
            fail_subscribe: true,
            ..Self::new(topic)
        }
    }

    /// Make the next `count` polls return a transport error.
    pub fn with_failing_polls(self, count: usize) -> Self {
        self.failing_polls.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl Consumer for MockConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        if self.fail_subscribe {
            Err(IngestError::kafka("Mock subscribe error"))
        } else {
            Ok(())
        }
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, IngestError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.failing_polls) {
            return Err(IngestError::kafka("Mock broker transport failure"));
        }

        match self.topic.next() {
            Some(message) => Ok(Some(message)),
            None => {
                sleep(timeout.min(Duration::from_millis(5))).await;
                Ok(None)
            }
        }
    }

    fn commit(&self, message: &ConsumedMessage) -> Result<(), IngestError> {
        self.topic.commit(message);
        Ok(())
    }

    fn rewind(&self, message: &ConsumedMessage) -> Result<(), IngestError> {
        self.topic.seek(message);
        Ok(())
    }
}

/// Decrement `counter` if it is positive. Returns whether it was.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// ---------------------------------------------------------------------------
// Search index
// ---------------------------------------------------------------------------

/// Search index held in a map, with failure injection.
pub struct InMemorySearchProvider {
    documents: Mutex<HashMap<Uuid, ProductDocument>>,
    pub upsert_history: Mutex<Vec<ProductDocument>>,
    upsert_calls: AtomicUsize,
    fail_next_upserts: AtomicUsize,
    fail_upserts_from: AtomicUsize,
    fail_next_deletes: AtomicUsize,
}

impl Default for InMemorySearchProvider {
    fn default() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            upsert_history: Mutex::new(Vec::new()),
            upsert_calls: AtomicUsize::new(0),
            fail_next_upserts: AtomicUsize::new(0),
            fail_upserts_from: AtomicUsize::new(usize::MAX),
            fail_next_deletes: AtomicUsize::new(0),
        }
    }
}

impl InMemorySearchProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `count` upserts.
    pub fn fail_next_upserts(&self, count: usize) {
        self.fail_next_upserts.store(count, Ordering::SeqCst);
    }

    /// Fail every upsert once `count` upserts have been attempted.
    pub fn fail_upserts_after(&self, count: usize) {
        self.fail_upserts_from.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_deletes(&self, count: usize) {
        self.fail_next_deletes.store(count, Ordering::SeqCst);
    }

    pub fn document(&self, id: &Uuid) -> Option<ProductDocument> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn insert(&self, document: ProductDocument) {
        self.documents.lock().unwrap().insert(document.id, document);
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn upsert_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_upserts_from.load(Ordering::SeqCst) || take_one(&self.fail_next_upserts) {
            return Err(SearchIndexError::index("Mock index unavailable"));
        }

        self.upsert_history.lock().unwrap().push(document.clone());
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn delete_document(&self, id: &Uuid) -> Result<(), SearchIndexError> {
        if take_one(&self.fail_next_deletes) {
            return Err(SearchIndexError::delete("Mock index unavailable"));
        }

        self.documents.lock().unwrap().remove(id);
        Ok(())
    }

    async fn get_document(&self, id: &Uuid) -> Result<Option<ProductDocument>, SearchIndexError> {
        Ok(self.document(id))
    }

    async fn search_all(&self, size: usize) -> Result<Vec<ProductDocument>, SearchIndexError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .values()
            .take(size)
            .cloned()
            .collect())
    }
}

/// Search index whose upserts take `delay` to complete.
pub struct SlowSearchProvider {
    pub inner: Arc<InMemorySearchProvider>,
    delay: Duration,
}

impl SlowSearchProvider {
    pub fn new(inner: Arc<InMemorySearchProvider>, delay: Duration) -> Arc<Self> {
        Arc::new(Self { inner, delay })
    }
}

#[async_trait]
impl SearchIndexProvider for SlowSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        self.inner.ensure_index_exists().await
    }

    async fn upsert_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        sleep(self.delay).await;
        self.inner.upsert_document(document).await
    }

    async fn delete_document(&self, id: &Uuid) -> Result<(), SearchIndexError> {
        self.inner.delete_document(id).await
    }

    async fn get_document(&self, id: &Uuid) -> Result<Option<ProductDocument>, SearchIndexError> {
        self.inner.get_document(id).await
    }

    async fn search_all(&self, size: usize) -> Result<Vec<ProductDocument>, SearchIndexError> {
        self.inner.search_all(size).await
    }
}

// ---------------------------------------------------------------------------
// Authoritative store
// ---------------------------------------------------------------------------

/// Product store ordered by id, with failure injection.
pub struct InMemoryRepository {
    products: Mutex<BTreeMap<Uuid, Product>>,
    page_calls: AtomicUsize,
    fail_pages_from: AtomicUsize,
    fail_writes: AtomicBool,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self {
            products: Mutex::new(BTreeMap::new()),
            page_calls: AtomicUsize::new(0),
            fail_pages_from: AtomicUsize::new(usize::MAX),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed `count` products directly, bypassing the write path.
    pub fn seeded(count: usize) -> Arc<Self> {
        let repository = Self::new();
        for i in 0..count {
            repository.insert(Product::new(
                Uuid::new_v4(),
                format!("Product {}", i),
                "seeded",
                (i as i64 + 1) * 100,
            ));
        }
        repository
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    pub fn get(&self, id: &Uuid) -> Option<Product> {
        self.products.lock().unwrap().get(id).cloned()
    }

    pub fn all(&self) -> Vec<Product> {
        self.products.lock().unwrap().values().cloned().collect()
    }

    /// Fail `find_page` from the `call`-th invocation on (zero-based).
    pub fn fail_pages_from(&self, call: usize) {
        self.fail_pages_from.store(call, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::DatabaseError(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn create(&self, product: &NewProduct) -> Result<Product, StoreError> {
        self.check_write()?;
        let stored = product.clone().with_id(Uuid::new_v4());
        self.insert(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.get(&id))
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.all())
    }

    async fn find_page(&self, after: Option<Uuid>, limit: i64) -> Result<Vec<Product>, StoreError> {
        let call = self.page_calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_pages_from.load(Ordering::SeqCst) {
            return Err(StoreError::DatabaseError(sqlx::Error::PoolClosed));
        }

        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        Ok(self
            .products
            .lock()
            .unwrap()
            .range((lower, Bound::Unbounded))
            .take(limit as usize)
            .map(|(_, product)| product.clone())
            .collect())
    }

    async fn update(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>, StoreError> {
        self.check_write()?;
        let mut products = self.products.lock().unwrap();
        Ok(products.get_mut(&id).map(|product| {
            product.name = changes.name.clone();
            product.description = changes.description.clone();
            product.price = changes.price;
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.check_write()?;
        Ok(self.products.lock().unwrap().remove(&id))
    }
}

// ---------------------------------------------------------------------------
// Publisher and dead-letter sink
// ---------------------------------------------------------------------------

/// Publishes change events straight into an [`InMemoryTopic`].
pub struct TopicPublisher {
    topic: Arc<InMemoryTopic>,
    failing: AtomicBool,
}

impl TopicPublisher {
    pub fn new(topic: Arc<InMemoryTopic>) -> Arc<Self> {
        Arc::new(Self {
            topic,
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChangePublisher for TopicPublisher {
    async fn publish(&self, operation: Operation, entity: &Product) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::transport("Mock broker rejected the event"));
        }
        self.topic
            .publish_event(&ChangeEvent::new(operation, entity.clone()));
        Ok(())
    }
}

/// Dead-letter sink that records what it receives.
#[derive(Default)]
pub struct RecordingDeadLetterSink {
    pub received: Mutex<Vec<(ConsumedMessage, DeadLetterReason)>>,
    failing: AtomicBool,
}

impl RecordingDeadLetterSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn reason_codes(&self) -> Vec<&'static str> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, reason)| reason.code())
            .collect()
    }
}

#[async_trait]
impl DeadLetterSink for RecordingDeadLetterSink {
    async fn send(
        &self,
        message: &ConsumedMessage,
        reason: &DeadLetterReason,
    ) -> Result<(), IngestError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IngestError::dead_letter("Mock dead-letter topic unavailable"));
        }
        self.received
            .lock()
            .unwrap()
            .push((message.clone(), reason.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Short timings so tests settle quickly.
pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        poll_timeout: Duration::from_millis(10),
        retry_backoff: Duration::from_millis(5),
        max_apply_attempts: None,
        progress_interval: Duration::from_millis(50),
    }
}

pub fn orchestrator(
    topic: &Arc<InMemoryTopic>,
    provider: &Arc<InMemorySearchProvider>,
    config: OrchestratorConfig,
) -> Orchestrator {
    Orchestrator::with_config(
        Arc::new(MockConsumer::new(topic.clone())),
        EventProcessor::new(),
        IndexUpdater::new(provider.clone()),
        config,
    )
}

/// Run `orchestrator` until `condition` holds, then shut it down.
///
/// Panics if the condition is not reached or the loop does not stop in time.
pub async fn run_until<F>(orchestrator: Orchestrator, condition: F)
where
    F: Fn() -> bool,
{
    let shutdown = orchestrator.shutdown_handle();
    let task = tokio::spawn(async move {
        let mut orchestrator = orchestrator;
        orchestrator.run().await
    });

    let reached = timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok();

    shutdown.shutdown();

    let result = timeout(Duration::from_secs(5), task)
        .await
        .expect("orchestrator did not stop after shutdown")
        .expect("orchestrator task panicked");

    assert!(result.is_ok(), "orchestrator returned error: {:?}", result.err());
    assert!(reached, "condition not reached before timeout");
}

pub fn widget() -> Product {
    Product::new(Uuid::new_v4(), "Widget", "A widget", 10)
}
