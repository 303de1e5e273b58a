use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

type Slot<V, E> = Option<Result<V, E>>;

/// At most one in-flight computation per key.
///
/// The first caller for a key becomes the leader and runs `compute`;
/// callers arriving while it runs wait for the leader's result and receive a
/// clone of it, error included. Once the leader finishes the key is free
/// again, so a later call recomputes. If a leader is dropped before it
/// finishes, one of its waiters takes over.
pub struct SingleFlight<K, V, E> {
    in_flight: Mutex<HashMap<K, watch::Receiver<Slot<V, E>>>>,
}

impl<K, V, E> Default for SingleFlight<K, V, E> {
    fn default() -> Self {
        Self { in_flight: Mutex::new(HashMap::new()) }
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let sender = loop {
            let waiting = {
                let mut in_flight = self.lock();
                match in_flight.get(&key) {
                    Some(receiver) => receiver.clone(),
                    None => {
                        let (sender, receiver) = watch::channel(None);
                        in_flight.insert(key.clone(), receiver);
                        break sender;
                    }
                }
            };

            if let Some(result) = Self::follow(waiting).await {
                return result;
            }
            // leader vanished without a result; retry and possibly lead
        };

        let guard = LeaderGuard { flight: self, key: Some(key) };
        let result = compute().await;
        guard.release();
        // receivers cloned before release still observe this value
        let _ = sender.send(Some(result.clone()));
        result
    }

    /// Number of keys with a computation in progress.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    async fn follow(mut waiting: watch::Receiver<Slot<V, E>>) -> Option<Result<V, E>> {
        let outcome = waiting.wait_for(Option::is_some).await;
        match outcome {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, watch::Receiver<Slot<V, E>>>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct LeaderGuard<'a, K: Eq + Hash, V, E> {
    flight: &'a SingleFlight<K, V, E>,
    key: Option<K>,
}

impl<K: Eq + Hash, V, E> LeaderGuard<'_, K, V, E> {
    fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(key) = self.key.take() {
            let mut in_flight =
                self.flight.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            in_flight.remove(&key);
        }
    }
}

impl<K: Eq + Hash, V, E> Drop for LeaderGuard<'_, K, V, E> {
    fn drop(&mut self) {
        self.remove();
    }
}
