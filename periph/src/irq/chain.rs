use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use common::SpinLock;
use log::{debug, warn};

use super::{Handler, Registry, RegistryError, noop};

const END: u8 = u8::MAX;

struct Link {
    mask: UnsafeCell<u32>,
    handler: UnsafeCell<Handler>,
    next: AtomicU8,
}

impl Link {
    const fn new() -> Self {
        Self {
            mask: UnsafeCell::new(0),
            handler: UnsafeCell::new(noop),
            next: AtomicU8::new(END),
        }
    }
}

/// Writer-side bookkeeping, only touched under the lock.
struct Tail {
    len: u8,
    last: u8,
}

/// Append-only handler list for one interrupt source, backed by a fixed
/// arena of `N` entries.
///
/// Entries are filled while unreachable and then linked in with a release
/// store, so a dispatch running concurrently with `register` walks a
/// consistent list without taking the lock.
///
/// # Example
///
/// ```
/// use periph::irq::{InterruptChain, Registry};
///
/// static PORT_A: InterruptChain<4> = InterruptChain::new();
///
/// fn on_button(_pins: u32) {}
///
/// PORT_A.register(1 << 7, on_button).unwrap();
/// assert_eq!(PORT_A.len(), 1);
/// ```
pub struct InterruptChain<const N: usize> {
    first: AtomicU8,
    links: [Link; N],
    writer: SpinLock<Tail>,
}

// SAFETY: link payloads are written once, before they are published, by
// the holder of `writer`; after publication they are only read.
unsafe impl<const N: usize> Sync for InterruptChain<N> {}

impl<const N: usize> InterruptChain<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0 && N < END as usize, "chain arena must hold 1..=254 entries") };

        Self {
            first: AtomicU8::new(END),
            links: [const { Link::new() }; N],
            writer: SpinLock::new(Tail { len: 0, last: END }),
        }
    }

    /// Number of published handlers. Lock-free, so a handler may call it.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut index = self.first.load(Ordering::Acquire);
        while let Some(link) = self.links.get(index as usize) {
            count += 1;
            index = link.next.load(Ordering::Acquire);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.first.load(Ordering::Acquire) == END
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for InterruptChain<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry for InterruptChain<N> {
    fn register(&self, mask: u32, handler: Handler) -> Result<(), RegistryError> {
        if mask == 0 {
            warn!("refusing interrupt handler with empty mask");
            return Err(RegistryError::EmptyMask);
        }

        let mut tail = self.writer.lock();
        let index = tail.len;
        let Some(link) = self.links.get(index as usize) else {
            warn!("interrupt chain full ({} entries), mask {:#010x} dropped", N, mask);
            return Err(RegistryError::Full);
        };

        // SAFETY: `index` is past every published link, so no dispatch can
        // be reading it, and the writer lock excludes other registrations.
        unsafe {
            *link.mask.get() = mask;
            *link.handler.get() = handler;
        }
        link.next.store(END, Ordering::Relaxed);

        match self.links.get(tail.last as usize) {
            Some(previous) => previous.next.store(index, Ordering::Release),
            None => self.first.store(index, Ordering::Release),
        }
        tail.last = index;
        tail.len += 1;

        debug!("interrupt handler #{} registered for mask {:#010x}", index, mask);
        Ok(())
    }

    fn invoke_matching(&self, status: u32) -> u32 {
        let mut matched = 0;
        let mut index = self.first.load(Ordering::Acquire);

        while let Some(link) = self.links.get(index as usize) {
            // SAFETY: the acquire load that led here orders these reads
            // after the writes made before publication.
            let (mask, handler) = unsafe { (*link.mask.get(), *link.handler.get()) };
            let hits = status & mask;
            if hits != 0 {
                handler(hits);
                matched |= hits;
            }
            index = link.next.load(Ordering::Acquire);
        }

        matched
    }
}
