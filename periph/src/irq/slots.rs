use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use common::SpinLock;
use log::{debug, warn};

use super::{Handler, Registry, RegistryError, noop};

/// One overridable handler slot per channel of a source, all starting out
/// as no-ops.
///
/// Suits sources whose status bits are one-per-channel, such as ADC
/// end-of-conversion flags. A registration must name exactly one channel.
pub struct SlotTable<const N: usize> {
    handlers: [UnsafeCell<Handler>; N],
    order: [AtomicU8; N],
    armed: AtomicU8,
    writer: SpinLock<u32>,
}

// SAFETY: a slot's handler is written once under `writer`, before the slot
// index is published through `armed`.
unsafe impl<const N: usize> Sync for SlotTable<N> {}

impl<const N: usize> SlotTable<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0 && N <= 32, "slot table covers at most 32 status bits") };

        Self {
            handlers: [const { UnsafeCell::new(noop as Handler) }; N],
            order: [const { AtomicU8::new(0) }; N],
            armed: AtomicU8::new(0),
            writer: SpinLock::new(0),
        }
    }

    /// Override the handler of `channel`.
    pub fn set(&self, channel: usize, handler: Handler) -> Result<(), RegistryError> {
        if channel >= N {
            warn!("interrupt slot {} out of range (table has {})", channel, N);
            return Err(RegistryError::InvalidSlot);
        }
        self.register(1 << channel, handler)
    }

    /// Whether `channel` has been overridden.
    pub fn is_set(&self, channel: usize) -> bool {
        channel < N && *self.writer.lock() & (1 << channel) != 0
    }

    pub fn len(&self) -> usize {
        self.armed.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for SlotTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry for SlotTable<N> {
    fn register(&self, mask: u32, handler: Handler) -> Result<(), RegistryError> {
        if mask == 0 {
            warn!("refusing interrupt handler with empty mask");
            return Err(RegistryError::EmptyMask);
        }
        let channel = mask.trailing_zeros() as usize;
        if !mask.is_power_of_two() || channel >= N {
            warn!("mask {:#010x} does not select one of {} slots", mask, N);
            return Err(RegistryError::InvalidSlot);
        }

        let mut taken = self.writer.lock();
        if *taken & mask != 0 {
            warn!("interrupt slot {} already has a handler", channel);
            return Err(RegistryError::SlotTaken);
        }

        // SAFETY: the slot is not yet in `order[..armed]`, so no dispatch
        // reads it, and the writer lock excludes other registrations.
        unsafe { *self.handlers[channel].get() = handler };

        let position = self.armed.load(Ordering::Relaxed);
        self.order[position as usize].store(channel as u8, Ordering::Relaxed);
        self.armed.store(position + 1, Ordering::Release);
        *taken |= mask;

        debug!("interrupt slot {} armed", channel);
        Ok(())
    }

    fn invoke_matching(&self, status: u32) -> u32 {
        let mut matched = 0;
        let armed = self.armed.load(Ordering::Acquire) as usize;

        for entry in &self.order[..armed] {
            let channel = entry.load(Ordering::Relaxed) as usize;
            let bit = 1 << channel;
            if status & bit != 0 {
                // SAFETY: published by the acquire load of `armed`.
                let handler = unsafe { *self.handlers[channel].get() };
                handler(bit);
                matched |= bit;
            }
        }

        matched
    }
}
