use std::sync::Mutex;

use crate::beam::Beam;
use crate::pulse::PulsePool;

/// Recycle pool for beam shells, shared between the engine's consumer
/// thread and the downstream stage that hands finished beams back.
pub struct BeamPool {
    inner: Mutex<Vec<Beam>>,
}

impl BeamPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Take a beam shell from the pool, or allocate a fresh one.
    pub fn acquire(&self) -> Beam {
        match self.inner.lock() {
            Ok(mut shells) => shells.pop().unwrap_or_default(),
            Err(_) => Beam::default(),
        }
    }

    /// Hand a consumed beam back: its pulses return to the pulse pool and
    /// the shell is retained for reuse.
    pub fn release(&self, mut beam: Beam, pulse_pool: &PulsePool) {
        for pulse in beam.take_pulses() {
            pulse_pool.release(pulse);
        }
        if let Ok(mut shells) = self.inner.lock() {
            shells.push(beam);
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(shells) => shells.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BeamPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beam::BeamMeta;
    use std::sync::Arc;

    #[test]
    fn release_recycles_shell_and_pulses() {
        let beam_pool = BeamPool::new();
        let pulse_pool = PulsePool::new();

        let mut beam = beam_pool.acquire();
        let pulses = vec![Arc::new(pulse_pool.acquire())];
        beam.configure(BeamMeta::default(), pulses);

        beam_pool.release(beam, &pulse_pool);
        assert_eq!(beam_pool.len(), 1);
        assert_eq!(pulse_pool.free_count(), 1);
        assert_eq!(pulse_pool.in_use_count(), 0);
    }
}
