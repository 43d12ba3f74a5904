use common::{
    enums::exchange_id::ExchangeId,
    structs::{PoolKey, TickerBatch, TickerSlot},
};
use log::debug;
use std::{collections::HashMap, sync::Arc};

const MIN_POOL_SIZE: usize = 16;

/// Reusable slot array for one pool key.
///
/// The array is handed to the host as an `Arc`. While the host still holds a
/// previous batch the array is shared, so the next acquire allocates a fresh
/// generation instead of overwriting slots the host may be reading.
#[derive(Debug, Default)]
pub struct PooledArray {
    slots: Arc<Vec<TickerSlot>>,
    generation: u64,
}

impl PooledArray {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slots_mut(&mut self) -> &mut [TickerSlot] {
        debug_assert_eq!(
            Arc::strong_count(&self.slots),
            1,
            "pooled array written while shared"
        );
        Arc::make_mut(&mut self.slots).as_mut_slice()
    }

    /// Hands the first `len` slots out as a batch.
    pub fn share(&self, key: PoolKey, len: usize) -> TickerBatch {
        TickerBatch {
            key,
            generation: self.generation,
            slots: self.slots.clone(),
            len: len.min(self.slots.len()),
        }
    }

    pub fn same_array(&self, batch: &TickerBatch) -> bool {
        Arc::ptr_eq(&self.slots, &batch.slots)
    }
}

#[derive(Debug, Default)]
pub struct TickerPool {
    arrays: HashMap<PoolKey, PooledArray>,
}

impl TickerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an exclusively owned array holding at least `size` slots.
    /// Capacity only grows; for non-increasing sizes the same array comes
    /// back as long as no batch of it is still held.
    pub fn acquire(&mut self, key: &PoolKey, size: usize) -> &mut PooledArray {
        let array = self.arrays.entry(key.clone()).or_default();
        let capacity = array.slots.len();
        let shared = Arc::strong_count(&array.slots) > 1;

        if capacity < size || shared {
            let mut new_capacity = capacity.max(MIN_POOL_SIZE);
            while new_capacity < size {
                new_capacity = new_capacity.saturating_mul(2);
            }
            array.slots = Arc::new(vec![TickerSlot::default(); new_capacity]);
            array.generation += 1;
            debug!(
                "{} ticker pool generation {} with {} slots (shared previous: {})",
                key, array.generation, new_capacity, shared
            );
        }

        array
    }

    pub fn capacity(&self, key: &PoolKey) -> usize {
        self.arrays.get(key).map(PooledArray::capacity).unwrap_or(0)
    }

    pub fn clear_exchange(&mut self, exchange_id: ExchangeId) {
        self.arrays.retain(|key, _| key.exchange_id != exchange_id);
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PoolKey {
        PoolKey::new(ExchangeId::Bybit, None)
    }

    #[test]
    fn test_non_increasing_sizes_reuse_array() {
        let mut pool = TickerPool::new();
        let first = pool.acquire(&key(), 10).share(key(), 10);
        let generation = first.generation;
        drop(first);

        let array = pool.acquire(&key(), 10);
        assert!(array.capacity() >= 10);
        assert_eq!(array.generation(), generation);
        let batch = array.share(key(), 3);
        drop(batch);
        assert_eq!(pool.acquire(&key(), 3).generation(), generation);
    }

    #[test]
    fn test_growth_is_geometric_and_never_shrinks() {
        let mut pool = TickerPool::new();
        assert_eq!(pool.acquire(&key(), 10).capacity(), 16);
        assert_eq!(pool.acquire(&key(), 40).capacity(), 64);
        assert_eq!(pool.acquire(&key(), 2).capacity(), 64);
        assert_eq!(pool.capacity(&key()), 64);
    }

    #[test]
    fn test_held_batch_forces_new_generation() {
        let mut pool = TickerPool::new();
        let array = pool.acquire(&key(), 4);
        array.slots_mut()[0].last_price = 10.0;
        let held = array.share(key(), 1);

        let array = pool.acquire(&key(), 4);
        assert!(!array.same_array(&held));
        assert_eq!(array.generation(), held.generation + 1);
        array.slots_mut()[0].last_price = 20.0;
        assert_eq!(held.slots()[0].last_price, 10.0);
    }

    #[test]
    fn test_clear_exchange_keeps_other_pools() {
        let mut pool = TickerPool::new();
        pool.acquire(&key(), 1);
        pool.acquire(&PoolKey::new(ExchangeId::Okx, None), 1);
        pool.acquire(&PoolKey::new(ExchangeId::Bybit, Some(Arc::from("alt"))), 1);
        pool.clear_exchange(ExchangeId::Bybit);
        assert_eq!(pool.len(), 1);
    }
}
