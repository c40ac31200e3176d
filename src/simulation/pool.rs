//! Object pool for high-churn entities
//!
//! Released objects go on a FIFO free list and are reset in place on the
//! next acquire. Handles carry a generation so a handle kept past release
//! can never reach the object's next owner.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Objects that can be recycled by an [`ObjectPool`]
pub trait Poolable: Default {
    /// Construction arguments applied on every acquire
    type Spawn;

    /// Overwrite every observable field from `spawn`
    fn reset(&mut self, spawn: Self::Spawn);
}

/// Generational reference to a pooled object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    active: bool,
}

/// Counters for telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub active: usize,
    pub available: usize,
    /// Objects constructed over the pool's lifetime (prefill included)
    pub created: usize,
    /// Acquires served from the free list
    pub reused: usize,
}

#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    slots: Vec<Slot<T>>,
    free: VecDeque<u32>,
    active_count: usize,
    reused: usize,
}

impl<T: Poolable> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            active_count: 0,
            reused: 0,
        }
    }

    /// Pool with `count` inactive objects already constructed
    pub fn with_prefill(count: usize) -> Self {
        let mut pool = Self::new();
        for index in 0..count {
            pool.slots.push(Slot {
                value: T::default(),
                generation: 0,
                active: false,
            });
            pool.free.push_back(index as u32);
        }
        pool
    }

    /// Take an object from the free list, or construct one if none is free
    pub fn acquire(&mut self, spawn: T::Spawn) -> PoolHandle {
        let index = match self.free.pop_front() {
            Some(index) => {
                self.reused += 1;
                index
            }
            None => {
                self.slots.push(Slot {
                    value: T::default(),
                    generation: 0,
                    active: false,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value.reset(spawn);
        slot.active = true;
        self.active_count += 1;

        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Return an object to the free list
    ///
    /// Releasing an inactive or stale handle does nothing and returns false.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.active || slot.generation != handle.generation {
            return false;
        }

        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.active_count -= 1;
        self.free.push_back(handle.index);
        true
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .map(|slot| &mut slot.value)
    }

    /// Active objects in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.slots.iter().enumerate().filter(|(_, slot)| slot.active).map(|(index, slot)| {
            (
                PoolHandle {
                    index: index as u32,
                    generation: slot.generation,
                },
                &slot.value,
            )
        })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &mut slot.value,
                )
            })
    }

    /// Snapshot of the active handles, safe to iterate while releasing
    pub fn handles(&self) -> Vec<PoolHandle> {
        self.iter_active().map(|(handle, _)| handle).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn available_count(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active_count,
            available: self.free.len(),
            created: self.slots.len(),
            reused: self.reused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Pellet {
        value: i32,
        scratch: Vec<i32>,
    }

    impl Poolable for Pellet {
        type Spawn = i32;

        fn reset(&mut self, spawn: i32) {
            self.value = spawn;
            self.scratch.clear();
        }
    }

    #[test]
    fn test_acquire_constructs_when_empty() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::new();
        let handle = pool.acquire(4);
        assert_eq!(pool.get(handle).map(|p| p.value), Some(4));
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().reused, 0);
    }

    #[test]
    fn test_prefill_is_reused() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::with_prefill(3);
        assert_eq!(pool.available_count(), 3);
        pool.acquire(1);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.stats().created, 3);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::new();
        let handle = pool.acquire(1);
        assert!(pool.release(handle));
        assert!(!pool.release(handle));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_stale_handle_cannot_reach_new_owner() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::new();
        let first = pool.acquire(1);
        pool.release(first);
        let second = pool.acquire(2);

        assert_eq!(first.index, second.index);
        assert!(pool.get(first).is_none());
        assert!(!pool.release(first));
        assert!(pool.is_active(second));
    }

    #[test]
    fn test_round_trip_resets_state() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::new();
        let handle = pool.acquire(1);
        if let Some(pellet) = pool.get_mut(handle) {
            pellet.value = 99;
            pellet.scratch.push(5);
        }
        pool.release(handle);

        let again = pool.acquire(7);
        let mut fresh = Pellet::default();
        fresh.reset(7);
        assert_eq!(pool.get(again), Some(&fresh));
    }

    #[test]
    fn test_handles_snapshot_allows_release_during_iteration() {
        let mut pool: ObjectPool<Pellet> = ObjectPool::new();
        for i in 0..5 {
            pool.acquire(i);
        }
        for handle in pool.handles() {
            if pool.get(handle).map(|p| p.value % 2 == 0).unwrap_or(false) {
                pool.release(handle);
            }
        }
        let remaining: Vec<i32> = pool.iter_active().map(|(_, p)| p.value).collect();
        assert_eq!(remaining, vec![1, 3]);
    }
}
