//! Lock-free single-producer/single-consumer ring buffer.
//!
//! Slots are pre-allocated. The producer "adds" an item by filling the slot
//! at the head and bumping the head; the consumer "removes" one by reading
//! the slot at the tail and bumping the tail. `head` is only ever stored by
//! the producer and `tail` only by the consumer, which is what makes the
//! structure safe to share between an interrupt handler and the main loop
//! without a lock.
//!
//! One slot is always kept free to tell "full" from "empty", so a buffer of
//! `N` slots holds at most `N - 1` items.
//!
//! # Capacity
//!
//! `N` must be a power of two below 128. Anything else fails the build:
//!
//! ```compile_fail
//! let buffer = common::buffer::CircularBuffer::<u8, 6>::new(0);
//! ```

mod split;

pub use split::{Consumer, Producer};

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

/// Ring of `N` slots of `T`.
pub struct CircularBuffer<T, const N: usize> {
    head: AtomicU8,
    tail: AtomicU8,
    data: UnsafeCell<[T; N]>,
}

/// Byte ring used between UART receive interrupts and the main loop.
pub type ByteBuffer<const N: usize> = CircularBuffer<u8, N>;

// SAFETY: each slot is owned either by the producer (outside [tail, head))
// or by the consumer (inside it); ownership only moves through the
// release/acquire index stores.
unsafe impl<T: Send, const N: usize> Sync for CircularBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Send for CircularBuffer<T, N> {}

impl<T, const N: usize> CircularBuffer<T, N> {
    const MASK: u8 = (N - 1) as u8;

    /// Build a buffer over pre-initialised slots.
    pub const fn from_array(data: [T; N]) -> Self {
        const {
            assert!(
                N.is_power_of_two() && N >= 2 && N < 128,
                "CircularBuffer capacity must be a power of two between 2 and 64"
            )
        };

        Self {
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            data: UnsafeCell::new(data),
        }
    }

    /// Number of items the buffer can hold at once.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    #[inline]
    pub const fn next_index(from: u8) -> u8 {
        from.wrapping_add(1) & Self::MASK
    }

    #[inline]
    pub const fn previous_index(from: u8) -> u8 {
        from.wrapping_add(N as u8).wrapping_sub(1) & Self::MASK
    }

    #[inline]
    pub fn head_index(&self) -> u8 {
        self.head.load(Ordering::Acquire)
    }

    #[inline]
    pub fn tail_index(&self) -> u8 {
        self.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head_index() == self.tail_index()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        Self::next_index(self.head_index()) == self.tail_index()
    }

    /// Items currently queued, `(head - tail) mod N`.
    #[inline]
    pub fn used_count(&self) -> usize {
        (self.head_index().wrapping_sub(self.tail_index()) & Self::MASK) as usize
    }

    /// Drop everything queued and rewind both indices.
    pub fn clear(&mut self) {
        *self.head.get_mut() = 0;
        *self.tail.get_mut() = 0;
    }

    /// Slot at `index`, wrapped into range the same way the indices are.
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.data.get_mut()[index & Self::MASK as usize]
    }

    /// Split into the two halves. The borrow guarantees exactly one of each.
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        (Producer::new(self), Consumer::new(self))
    }

    /// Producer half of a shared buffer, typically a `static`.
    ///
    /// # Safety
    ///
    /// At most one `Producer` for this buffer may exist at any time, and
    /// all of them must run in the same execution context (one interrupt
    /// handler, or the main loop).
    pub unsafe fn producer(&self) -> Producer<'_, T, N> {
        Producer::new(self)
    }

    /// Consumer half of a shared buffer, typically a `static`.
    ///
    /// # Safety
    ///
    /// At most one `Consumer` for this buffer may exist at any time, and
    /// all of them must run in the same execution context.
    pub unsafe fn consumer(&self) -> Consumer<'_, T, N> {
        Consumer::new(self)
    }

    #[inline]
    fn slot(&self, index: u8) -> *mut T {
        // SAFETY: index is masked into 0..N.
        unsafe { (self.data.get() as *mut T).add((index & Self::MASK) as usize) }
    }
}

impl<T: Copy, const N: usize> CircularBuffer<T, N> {
    /// Buffer with every slot set to `fill`. Usable in a `static`.
    pub const fn new(fill: T) -> Self {
        Self::from_array([fill; N])
    }
}

impl<T: Default, const N: usize> Default for CircularBuffer<T, N> {
    fn default() -> Self {
        Self::from_array(core::array::from_fn(|_| T::default()))
    }
}

impl<T, const N: usize> core::fmt::Debug for CircularBuffer<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("head", &self.head_index())
            .field("tail", &self.tail_index())
            .finish()
    }
}
