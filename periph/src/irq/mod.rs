//! Interrupt routing.
//!
//! Each hardware source (a GPIO port, an ADC unit, a UART, the DMA
//! controller) has exactly one vector. Drivers that care about some of the
//! source's events register a handler against a bit mask during start-up;
//! the vector then calls [`Registry::dispatch`], which fans the event out.
//!
//! Two storage strategies share the same observable behaviour:
//!
//! - [`InterruptChain`]: an append-only list of (mask, handler) entries
//! - [`SlotTable`]: one slot per channel, each defaulting to a no-op
//!
//! Registration is expected to finish before the source is unmasked. It is
//! still safe to register while a dispatch runs; the dispatch sees either
//! the list before or after the append.

mod chain;
mod slots;

pub use chain::InterruptChain;
pub use slots::SlotTable;

use core::fmt;
use log::warn;

use crate::hal::interrupt::InterruptSource;

/// Interrupt handler. Receives the status bits it matched.
///
/// Handlers run in interrupt context: they must not block and must not
/// register further handlers.
pub type Handler = fn(u32);

pub(crate) fn noop(_: u32) {}

/// Reasons a registration is refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every entry of the build-time arena is in use.
    Full,
    /// A zero mask can never match.
    EmptyMask,
    /// The mask does not name exactly one existing slot.
    InvalidSlot,
    /// The slot already has a handler.
    SlotTaken,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Full => f.write_str("interrupt registry is full"),
            RegistryError::EmptyMask => f.write_str("handler mask is empty"),
            RegistryError::InvalidSlot => f.write_str("mask does not select a single slot"),
            RegistryError::SlotTaken => f.write_str("slot already has a handler"),
        }
    }
}

/// Handlers for one shared interrupt source.
pub trait Registry {
    /// Attach `handler` to the events in `mask`.
    fn register(&self, mask: u32, handler: Handler) -> Result<(), RegistryError>;

    /// Call, in registration order, every handler whose mask intersects
    /// `status`. Returns the union of the bits that matched.
    fn invoke_matching(&self, status: u32) -> u32;

    /// Service one interrupt from `source`.
    ///
    /// Reads the status once, runs the matching handlers, clears exactly
    /// the matched bits and acknowledges the line. Unmatched bits stay
    /// pending in the peripheral.
    fn dispatch<S: InterruptSource>(&self, source: &mut S) -> u32 {
        let status = source.status();
        let matched = self.invoke_matching(status);
        if matched != 0 {
            source.clear(matched);
        }
        source.acknowledge();
        matched
    }
}

/// Body for a vector nobody routes: acknowledge and return.
pub fn unhandled_interrupt<S: InterruptSource>(source: &mut S) {
    warn!("unhandled interrupt from {}", source.source());
    source.acknowledge();
}

#[cfg(test)]
pub(crate) mod testing {
    use core::cell::RefCell;

    use crate::hal::interrupt::{InterruptSource, SourceId};

    thread_local! {
        pub static CALLS: RefCell<Vec<(&'static str, u32)>> = const { RefCell::new(Vec::new()) };
    }

    pub fn record(name: &'static str, bits: u32) {
        CALLS.with(|calls| calls.borrow_mut().push((name, bits)));
    }

    pub fn take_calls() -> Vec<(&'static str, u32)> {
        CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
    }

    pub fn first(bits: u32) {
        record("first", bits);
    }

    pub fn second(bits: u32) {
        record("second", bits);
    }

    pub fn third(bits: u32) {
        record("third", bits);
    }

    /// Status register that only clears what it is told to.
    pub struct FakeSource {
        pub pending: u32,
        pub reads: usize,
        pub acknowledged: usize,
    }

    impl FakeSource {
        pub fn new(pending: u32) -> Self {
            Self {
                pending,
                reads: 0,
                acknowledged: 0,
            }
        }
    }

    impl InterruptSource for FakeSource {
        fn source(&self) -> SourceId {
            SourceId::Port('A')
        }

        fn status(&mut self) -> u32 {
            self.reads += 1;
            self.pending
        }

        fn clear(&mut self, bits: u32) {
            self.pending &= !bits;
        }

        fn acknowledge(&mut self) {
            self.acknowledged += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeSource;
    use super::*;

    #[test]
    fn unhandled_interrupt_only_acknowledges() {
        let mut source = FakeSource::new(0b101);
        unhandled_interrupt(&mut source);

        assert_eq!(source.pending, 0b101);
        assert_eq!(source.acknowledged, 1);
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn errors_display() {
        assert_eq!(RegistryError::Full.to_string(), "interrupt registry is full");
        assert_eq!(RegistryError::EmptyMask.to_string(), "handler mask is empty");
    }
}
