pub mod backoff;
pub mod batcher;
pub mod connection;
pub mod deserializers;
pub mod heartbeat;
pub mod http;
pub mod pool;
pub mod shards;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if another holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
