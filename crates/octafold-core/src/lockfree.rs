//! Lock-free primitives for real-time audio.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Clone for AtomicFlag {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Admission gate for device callbacks.
///
/// Callbacks `enter()` before touching the queues and leave when the guard drops.
/// The control thread closes the gate and waits for in-flight callbacks to leave
/// before it resets shared state. `enter()` never blocks.
#[derive(Debug, Default)]
#[repr(align(64))]
pub(crate) struct CallbackGate {
    open: AtomicBool,
    in_flight: AtomicUsize,
}

impl CallbackGate {
    #[inline]
    pub(crate) fn enter(&self) -> Option<GateGuard<'_>> {
        // SeqCst on both sides: a closer that observes zero in flight is
        // guaranteed that later entrants observe the closed flag.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if !self.open.load(Ordering::SeqCst) {
            self.in_flight.fetch_sub(1, Ordering::Release);
            return None;
        }
        Some(GateGuard { gate: self })
    }

    pub(crate) fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Close the gate and spin until every admitted callback has left.
    pub(crate) fn close_and_wait(&self) {
        self.open.store(false, Ordering::SeqCst);
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            std::thread::yield_now();
        }
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

pub(crate) struct GateGuard<'a> {
    gate: &'a CallbackGate,
}

impl Drop for GateGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::Release);
    }
}
