use std::sync::{Arc, Mutex};

use crate::pulse::Pulse;

/// Reusable-buffer allocator for pulse storage.
///
/// `acquire` hands out an owned, zero-initialized pulse whose IQ allocation
/// is recycled when a free buffer is available, growing the pool otherwise.
/// `release` reclaims the buffer only when the caller holds the last
/// reference, so no buffer can ever reach two live consumers. The pool is
/// the one shared-mutable boundary between the consumer thread and a
/// producer/recycler thread, hence the mutex.
pub struct PulsePool {
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    free: Vec<Pulse>,
    in_use: usize,
}

impl PulsePool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                free: Vec::new(),
                in_use: 0,
            }),
        }
    }

    /// Take a zeroed pulse buffer, reusing freed storage when possible.
    pub fn acquire(&self) -> Pulse {
        if let Ok(mut inner) = self.inner.lock() {
            inner.in_use += 1;
            if let Some(mut pulse) = inner.free.pop() {
                pulse.reset();
                return pulse;
            }
        }
        Pulse::default()
    }

    /// Return a shared pulse. The buffer goes back on the free list only if
    /// this was the last live reference; otherwise the remaining holder is
    /// expected to release it later.
    pub fn release(&self, pulse: Arc<Pulse>) {
        if let Ok(pulse) = Arc::try_unwrap(pulse) {
            self.restore(pulse);
        }
    }

    /// Return a pulse that was never shared, e.g. on a failed source read.
    pub fn restore(&self, pulse: Pulse) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.in_use = inner.in_use.saturating_sub(1);
            inner.free.push(pulse);
        }
    }

    /// Shrink the retained free list so the total pool size stays within
    /// 1.5x the number of buffers currently in use.
    pub fn trim(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let target_total = (inner.in_use as f64 * 1.5) as usize;
            let keep_free = target_total.saturating_sub(inner.in_use);
            if inner.free.len() > keep_free {
                inner.free.truncate(keep_free);
            }
        }
    }

    pub fn free_count(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.free.len(),
            Err(_) => 0,
        }
    }

    pub fn in_use_count(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.in_use,
            Err(_) => 0,
        }
    }
}

impl Default for PulsePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn acquire_release_round_trip_restores_free_count() {
        let pool = PulsePool::new();

        // prime the pool with recycled buffers
        let primed: Vec<Arc<Pulse>> = (0..8).map(|_| Arc::new(pool.acquire())).collect();
        for pulse in primed {
            pool.release(pulse);
        }
        let baseline = pool.free_count();
        assert_eq!(baseline, 8);

        let held: Vec<Arc<Pulse>> = (0..8).map(|_| Arc::new(pool.acquire())).collect();
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.in_use_count(), 8);
        for pulse in held {
            pool.release(pulse);
        }
        assert_eq!(pool.free_count(), baseline);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn release_with_outstanding_reference_does_not_recycle() {
        let pool = PulsePool::new();
        let pulse = Arc::new(pool.acquire());
        let extra = pulse.clone();
        pool.release(pulse);
        assert_eq!(pool.free_count(), 0);
        pool.release(extra);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn trim_bounds_pool_to_in_use_fraction() {
        let pool = PulsePool::new();
        let held: Vec<Arc<Pulse>> = (0..4).map(|_| Arc::new(pool.acquire())).collect();
        let extra: Vec<Arc<Pulse>> = (0..20).map(|_| Arc::new(pool.acquire())).collect();
        for pulse in extra {
            pool.release(pulse);
        }
        assert_eq!(pool.free_count(), 20);
        pool.trim();
        // 1.5 * 4 in use = 6 total, so at most 2 free retained
        assert_eq!(pool.free_count(), 2);
        drop(held);
    }

    #[test]
    fn concurrent_acquire_release_never_aliases_buffers() {
        let pool = Arc::new(PulsePool::new());
        let mut joins = Vec::new();
        for _ in 0..2 {
            let pool = pool.clone();
            joins.push(thread::spawn(move || {
                let mut live: Vec<Arc<Pulse>> = Vec::new();
                for round in 0..100 {
                    live.push(Arc::new(pool.acquire()));
                    // churn the free list while holding the rest
                    if round % 3 == 0 {
                        if let Some(pulse) = live.pop() {
                            pool.release(pulse);
                        }
                        live.push(Arc::new(pool.acquire()));
                    }
                }
                live
            }));
        }
        // keep every handle alive across both threads, then compare
        let all_live: Vec<Arc<Pulse>> = joins
            .into_iter()
            .flat_map(|j| j.join().unwrap())
            .collect();
        let mut addrs: Vec<usize> = all_live.iter().map(|p| Arc::as_ptr(p) as usize).collect();
        let count = addrs.len();
        addrs.sort_unstable();
        addrs.dedup();
        assert_eq!(addrs.len(), count);
        for pulse in all_live {
            pool.release(pulse);
        }
        assert_eq!(pool.in_use_count(), 0);
    }
}
