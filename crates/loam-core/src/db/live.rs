//! Live queries: auto-updating result sets over the local store.
//!
//! A live query is an ordinary store query plus the set of tables it
//! depends on. The store publishes a [`ChangeEvent`](super::ChangeEvent)
//! after every committed write; a background task re-evaluates the query on
//! any matching event and pushes the fresh rows through a watch channel, so
//! callers re-render without polling and without ever blocking on I/O they
//! did not ask for.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use super::store::Store;
use crate::error::Result;
use crate::models::Table;

/// Register a live query and return its auto-updating receiver.
///
/// The query runs once synchronously to seed the channel, then re-runs
/// whenever any of `tables` changes. The background task exits when every
/// receiver is dropped.
pub fn observe<T, F>(
    store: &Arc<Store>,
    tables: &[Table],
    query: F,
) -> Result<watch::Receiver<Vec<T>>>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&Store) -> Result<Vec<T>> + Send + 'static,
{
    // Subscribe before the initial evaluation so no committed change can
    // slip between the seed read and the event loop.
    let mut events = store.subscribe();
    let initial = query(store)?;
    let (tx, rx) = watch::channel(initial);

    let store = Arc::clone(store);
    let tables = tables.to_vec();
    tokio::spawn(async move {
        loop {
            let relevant = match events.recv().await {
                Ok(event) => tables.contains(&event.table),
                // Lagged receivers just re-evaluate; the query reads
                // current state, not the missed events.
                Err(RecvError::Lagged(_)) => true,
                Err(RecvError::Closed) => break,
            };
            if !relevant {
                continue;
            }
            match query(&store) {
                Ok(rows) => {
                    if tx.send(rows).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("live query re-evaluation failed: {e}"),
            }
        }
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Flock;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_live_query_sees_new_records() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let mut flocks = observe(&store, &[Table::Flocks], |store| {
            store.list::<Flock>(10, 0)
        })
        .unwrap();
        assert!(flocks.borrow().is_empty());

        store.add(&Flock::new("Barn layers", "chicken")).unwrap();

        tokio::time::timeout(Duration::from_secs(5), flocks.changed())
            .await
            .expect("live query did not refresh")
            .unwrap();
        assert_eq!(flocks.borrow().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_live_query_ignores_unrelated_tables() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let mut batches = observe(&store, &[Table::SeedBatches], |store| {
            store.list::<crate::models::SeedBatch>(10, 0)
        })
        .unwrap();

        store.add(&Flock::new("Barn layers", "chicken")).unwrap();

        let refreshed =
            tokio::time::timeout(Duration::from_millis(200), batches.changed()).await;
        assert!(refreshed.is_err(), "unrelated table should not refresh");
    }
}
