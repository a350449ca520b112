//! End-to-end behavior of the memoizing wrapper against the in-memory store:
//! stampede collapse under the keyed lock, lock timeouts, tag-scoped
//! invalidation and cache-vs-live visibility of data changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use remember::{
    resource_tag, Binding, CacheStore, Invocation, MemoryStore, QueryHandle, QueryResult,
    RememberConfig, RememberedQuery, RememberError, Row, Value,
};

/// Engine double serving rows from a shared, mutable "table". Each terminal
/// invocation counts as one execution and takes `latency` to complete.
struct SlowTable {
    name: String,
    rows: Arc<parking_lot::Mutex<Vec<Row>>>,
    executions: Arc<AtomicU64>,
    latency: Duration,
}

impl SlowTable {
    fn new(name: &str, rows: Vec<Row>, latency: Duration) -> Self {
        Self {
            name: name.to_string(),
            rows: Arc::new(parking_lot::Mutex::new(rows)),
            executions: Arc::new(AtomicU64::new(0)),
            latency,
        }
    }
}

#[async_trait]
impl QueryHandle for SlowTable {
    fn sql(&self) -> String {
        format!("SELECT * FROM {}", self.name)
    }

    fn bindings(&self) -> Vec<Binding> {
        Vec::new()
    }

    fn table(&self) -> Option<String> {
        Some(self.name.clone())
    }

    async fn invoke(&self, operation: &str, _args: &[Value]) -> remember::Result<Invocation> {
        match operation {
            "get" => {
                tokio::time::sleep(self.latency).await;
                self.executions.fetch_add(1, Ordering::SeqCst);
                let rows = self.rows.lock().clone();
                Ok(Invocation::Terminal(if rows.is_empty() {
                    QueryResult::Empty
                } else {
                    QueryResult::Rows(rows)
                }))
            }
            "first" => {
                tokio::time::sleep(self.latency).await;
                self.executions.fetch_add(1, Ordering::SeqCst);
                Ok(Invocation::Terminal(match self.rows.lock().first() {
                    Some(row) => QueryResult::Row(row.clone()),
                    None => QueryResult::Empty,
                }))
            }
            _ => Ok(Invocation::Builder(Box::new(Self {
                name: self.name.clone(),
                rows: Arc::clone(&self.rows),
                executions: Arc::clone(&self.executions),
                latency: self.latency,
            }))),
        }
    }
}

fn users_rows() -> Vec<Row> {
    vec![
        Row::new().with("id", 1i64).with("name", "Alice"),
        Row::new().with("id", 2i64).with("name", "Bob"),
        Row::new().with("id", 3i64).with("name", "Carol"),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stampede_collapses_to_one_execution() {
    let table = SlowTable::new("users", users_rows(), Duration::from_millis(100));
    let executions = Arc::clone(&table.executions);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(Arc::new(table), store, RememberConfig::default())
        .wait(Duration::from_secs(2));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let wrapped = wrapped.clone();
        handles.push(tokio::spawn(async move { wrapped.get().await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    // Exactly one underlying execution; every caller saw the same result.
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    let first = &results[0];
    assert!(results.iter().all(|r| r == first));
    assert!(matches!(first, QueryResult::Rows(rows) if rows.len() == 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn direct_path_may_race_but_all_callers_get_data() {
    let table = SlowTable::new("users", users_rows(), Duration::from_millis(50));
    let executions = Arc::clone(&table.executions);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(Arc::new(table), store, RememberConfig::default());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let wrapped = wrapped.clone();
        handles.push(tokio::spawn(async move { wrapped.get().await }));
    }
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(matches!(result, QueryResult::Rows(_)));
    }

    // No exclusivity promised without a wait budget; duplicates allowed,
    // but a subsequent call hits the cache.
    assert!(executions.load(Ordering::SeqCst) >= 1);
    let before = executions.load(Ordering::SeqCst);
    wrapped.get().await.unwrap();
    assert_eq!(executions.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn lock_timeout_surfaces_without_executing() {
    let table = SlowTable::new("users", users_rows(), Duration::ZERO);
    let executions = Arc::clone(&table.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(
        Arc::new(table),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        RememberConfig::default(),
    )
    .wait(Duration::from_millis(40));

    // Somebody else holds this key's lock for longer than our wait budget.
    let key = wrapped.cache_key();
    let _held = store.lock(&key, Duration::from_millis(10)).await.unwrap();

    let err = wrapped.get().await.unwrap_err();
    match err {
        RememberError::LockTimeout { key: timed_out, wait } => {
            assert_eq!(timed_out, key);
            assert_eq!(wait, Duration::from_millis(40));
        }
        other => panic!("expected LockTimeout, got {other:?}"),
    }
    assert_eq!(executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn waiter_finds_entry_after_lock_releases() {
    let table = SlowTable::new("users", users_rows(), Duration::ZERO);
    let executions = Arc::clone(&table.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(
        Arc::new(table),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        RememberConfig::default(),
    )
    .wait(Duration::from_millis(500));

    let key = wrapped.cache_key();
    let held = store.lock(&key, Duration::from_millis(10)).await.unwrap();

    let waiter = {
        let wrapped = wrapped.clone();
        tokio::spawn(async move { wrapped.get().await })
    };

    // Populate the entry, then release the lock the waiter is blocked on.
    tokio::time::sleep(Duration::from_millis(50)).await;
    wrapped
        .clone()
        .wait(Duration::ZERO)
        .get()
        .await
        .unwrap();
    let populated = executions.load(Ordering::SeqCst);
    drop(held);

    let result = waiter.await.unwrap().unwrap();
    assert!(matches!(result, QueryResult::Rows(_)));
    // The waiter re-checked the cache instead of executing again.
    assert_eq!(executions.load(Ordering::SeqCst), populated);
}

#[tokio::test]
async fn cached_result_survives_data_change_until_forgotten() {
    let table = SlowTable::new("users", users_rows(), Duration::ZERO);
    let rows = Arc::clone(&table.rows);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(Arc::new(table), store, RememberConfig::default())
        .ttl(Duration::from_secs(60));

    let first = wrapped.first().await.unwrap();

    // A row disappears underneath the cache; the cached row still comes back.
    rows.lock().remove(0);
    let second = wrapped.first().await.unwrap();
    assert_eq!(first, second);

    // After deleting the computed key, the next call reflects current data.
    assert!(wrapped.forget().await.unwrap());
    let third = wrapped.first().await.unwrap();
    assert_ne!(third, first);
    assert_eq!(third, QueryResult::Row(Row::new().with("id", 2i64).with("name", "Bob")));
}

#[tokio::test]
async fn resource_tag_invalidation_leaves_other_resources_cached() {
    let users = SlowTable::new("users", users_rows(), Duration::ZERO);
    let orders = SlowTable::new(
        "orders",
        vec![Row::new().with("id", 10i64)],
        Duration::ZERO,
    );
    let user_executions = Arc::clone(&users.executions);
    let order_executions = Arc::clone(&orders.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let config = RememberConfig::default();
    let wrapped_users = RememberedQuery::new(
        Arc::new(users),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        config.clone(),
    );
    let wrapped_orders = RememberedQuery::new(
        Arc::new(orders),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        config,
    );

    wrapped_users.get().await.unwrap();
    wrapped_orders.get().await.unwrap();

    store
        .invalidate_tag(&resource_tag("database", "users"))
        .await
        .unwrap();

    wrapped_users.get().await.unwrap();
    wrapped_orders.get().await.unwrap();

    assert_eq!(user_executions.load(Ordering::SeqCst), 2);
    assert_eq!(order_executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn global_tag_invalidation_clears_everything() {
    let users = SlowTable::new("users", users_rows(), Duration::ZERO);
    let orders = SlowTable::new(
        "orders",
        vec![Row::new().with("id", 10i64)],
        Duration::ZERO,
    );
    let user_executions = Arc::clone(&users.executions);
    let order_executions = Arc::clone(&orders.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let config = RememberConfig::default();
    let wrapped_users = RememberedQuery::new(
        Arc::new(users),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        config.clone(),
    );
    let wrapped_orders = RememberedQuery::new(
        Arc::new(orders),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        config,
    );

    wrapped_users.get().await.unwrap();
    wrapped_orders.get().await.unwrap();

    store.invalidate_tag("database").await.unwrap();

    wrapped_users.get().await.unwrap();
    wrapped_orders.get().await.unwrap();

    assert_eq!(user_executions.load(Ordering::SeqCst), 2);
    assert_eq!(order_executions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cached_absence_does_not_requery() {
    let table = SlowTable::new("users", Vec::new(), Duration::ZERO);
    let executions = Arc::clone(&table.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(
        Arc::new(table),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        RememberConfig::default(),
    );

    assert_eq!(wrapped.get().await.unwrap(), QueryResult::Empty);
    assert_eq!(wrapped.get().await.unwrap(), QueryResult::Empty);
    assert_eq!(executions.load(Ordering::SeqCst), 1);

    // The stored sentinel is distinguishable from an absent key.
    assert_eq!(
        store.get(&wrapped.cache_key()).await.unwrap(),
        Some(QueryResult::Empty)
    );
    assert_eq!(store.get("never-written").await.unwrap(), None);
}
