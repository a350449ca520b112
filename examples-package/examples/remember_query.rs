//! Query Memoization Example
//!
//! Demonstrates attaching the remember wrapper to a query, tag-scoped
//! invalidation, and stampede collapse under a lock wait budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use remember::{
    resource_tag, Binding, CacheStore, Invocation, MemoryStore, QueryHandle, QueryResult,
    RememberConfig, RememberedQuery, Row, Value,
};

/// A toy engine: one table of rows, every execution counted.
struct UsersTable {
    rows: Arc<parking_lot::Mutex<Vec<Row>>>,
    executions: Arc<AtomicU64>,
}

impl UsersTable {
    fn new() -> Self {
        let rows = vec![
            Row::new().with("id", 1i64).with("name", "Alice"),
            Row::new().with("id", 2i64).with("name", "Bob"),
            Row::new().with("id", 3i64).with("name", "Carol"),
        ];
        Self {
            rows: Arc::new(parking_lot::Mutex::new(rows)),
            executions: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl QueryHandle for UsersTable {
    fn sql(&self) -> String {
        "SELECT * FROM users".to_string()
    }

    fn bindings(&self) -> Vec<Binding> {
        Vec::new()
    }

    fn table(&self) -> Option<String> {
        Some("users".to_string())
    }

    async fn invoke(&self, operation: &str, _args: &[Value]) -> remember::Result<Invocation> {
        match operation {
            "get" => {
                // Pretend this is expensive.
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.executions.fetch_add(1, Ordering::SeqCst);
                Ok(Invocation::Terminal(QueryResult::Rows(
                    self.rows.lock().clone(),
                )))
            }
            "count" => {
                self.executions.fetch_add(1, Ordering::SeqCst);
                Ok(Invocation::Terminal(QueryResult::Count(
                    self.rows.lock().len() as u64,
                )))
            }
            _ => Ok(Invocation::Builder(Box::new(Self {
                rows: Arc::clone(&self.rows),
                executions: Arc::clone(&self.executions),
            }))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Query Memoization Example ===\n");

    basic_memoization().await?;
    tag_invalidation().await?;
    stampede_protection().await?;

    println!("\n=== All examples completed! ===");
    Ok(())
}

/// Example 1: cache hit on the second identical call
async fn basic_memoization() -> Result<()> {
    println!("--- Example 1: Basic Memoization ---\n");

    let table = UsersTable::new();
    let executions = Arc::clone(&table.executions);
    let rows = Arc::clone(&table.rows);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(Arc::new(table), store, RememberConfig::default())
        .ttl(Duration::from_secs(60));

    println!("First call (miss, executes the query)...");
    wrapped.get().await?;
    println!("  Executions so far: {}", executions.load(Ordering::SeqCst));

    // The underlying data changes, but the cached result does not.
    rows.lock().pop();
    println!("Second call (hit, data change not visible)...");
    let cached = wrapped.get().await?;
    if let QueryResult::Rows(rows) = &cached {
        println!("  Cached rows: {}", rows.len());
    }
    println!("  Executions so far: {}", executions.load(Ordering::SeqCst));

    println!("Forgetting the key and calling again (fresh execution)...");
    wrapped.forget().await?;
    let fresh = wrapped.get().await?;
    if let QueryResult::Rows(rows) = &fresh {
        println!("  Fresh rows: {}", rows.len());
    }
    println!("  Executions so far: {}\n", executions.load(Ordering::SeqCst));

    Ok(())
}

/// Example 2: resource-level vs global invalidation
async fn tag_invalidation() -> Result<()> {
    println!("--- Example 2: Tag Invalidation ---\n");

    let table = UsersTable::new();
    let executions = Arc::clone(&table.executions);

    let store = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(
        Arc::new(table),
        Arc::clone(&store) as Arc<dyn CacheStore>,
        RememberConfig::default(),
    );

    wrapped.get().await?;
    println!("Cached under tags: database, database|users");

    let removed = store
        .invalidate_tag(&resource_tag("database", "users"))
        .await?;
    println!("Invalidated `database|users`: {removed} entry removed");

    wrapped.get().await?;
    println!(
        "Re-executed after invalidation (executions: {})\n",
        executions.load(Ordering::SeqCst)
    );

    Ok(())
}

/// Example 3: concurrent cache misses collapse into one execution
async fn stampede_protection() -> Result<()> {
    println!("--- Example 3: Stampede Protection ---\n");

    let table = UsersTable::new();
    let executions = Arc::clone(&table.executions);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_defaults());
    let wrapped = RememberedQuery::new(Arc::new(table), store, RememberConfig::default())
        .wait(Duration::from_secs(2));

    println!("Spawning 8 concurrent callers for the same uncached key...");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let wrapped = wrapped.clone();
        handles.push(tokio::spawn(async move { wrapped.get().await }));
    }
    for handle in handles {
        handle.await??;
    }

    println!(
        "All callers served; underlying executions: {}",
        executions.load(Ordering::SeqCst)
    );

    Ok(())
}
