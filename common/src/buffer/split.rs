//! Producer and consumer halves of a [`CircularBuffer`].
//!
//! The bare `bump_*`/`push`/`pop` operations never check for room or data.
//! Callers are expected to consult `is_full`/`is_empty` first, the way an
//! interrupt handler checks the status register before touching the FIFO.
//! The `try_*` forms do the check for you.

use core::marker::PhantomData;
use core::sync::atomic::Ordering;

use super::CircularBuffer;

/// Writing half: owns the `head` index.
pub struct Producer<'a, T, const N: usize> {
    ring: &'a CircularBuffer<T, N>,
    _not_sync: PhantomData<*const ()>,
}

/// Reading half: owns the `tail` index.
pub struct Consumer<'a, T, const N: usize> {
    ring: &'a CircularBuffer<T, N>,
    _not_sync: PhantomData<*const ()>,
}

// SAFETY: a half may move to another context as long as it stays unique.
unsafe impl<T: Send, const N: usize> Send for Producer<'_, T, N> {}
unsafe impl<T: Send, const N: usize> Send for Consumer<'_, T, N> {}

impl<'a, T, const N: usize> Producer<'a, T, N> {
    pub(super) fn new(ring: &'a CircularBuffer<T, N>) -> Self {
        Self {
            ring,
            _not_sync: PhantomData,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Slot that the next `bump_head` will publish.
    ///
    /// This slot is never visible to the consumer, so it may be filled
    /// incrementally before bumping.
    pub fn head(&mut self) -> &mut T {
        let head = self.ring.head.load(Ordering::Relaxed);
        // SAFETY: the head slot lies outside [tail, head) and belongs to us.
        unsafe { &mut *self.ring.slot(head) }
    }

    /// Publish the head slot.
    ///
    /// # Safety
    ///
    /// The buffer must not be full, otherwise the queue silently becomes
    /// empty and every unread item is lost.
    #[inline]
    pub unsafe fn bump_head(&mut self) {
        let head = self.ring.head.load(Ordering::Relaxed);
        self.ring
            .head
            .store(CircularBuffer::<T, N>::next_index(head), Ordering::Release);
    }

    /// Write `value` at the head and publish it.
    ///
    /// # Safety
    ///
    /// Same as [`bump_head`](Self::bump_head).
    pub unsafe fn push(&mut self, value: T) {
        *self.head() = value;
        unsafe { self.bump_head() };
    }

    /// Checked [`push`](Self::push). Hands the value back when full.
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        // SAFETY: checked above; only we can make it full.
        unsafe { self.push(value) };
        Ok(())
    }
}

impl<'a, T, const N: usize> Consumer<'a, T, N> {
    pub(super) fn new(ring: &'a CircularBuffer<T, N>) -> Self {
        Self {
            ring,
            _not_sync: PhantomData,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn used_count(&self) -> usize {
        self.ring.used_count()
    }

    /// Oldest item, if any.
    pub fn tail(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let tail = self.ring.tail.load(Ordering::Relaxed);
        // SAFETY: tail is inside [tail, head) and belongs to us.
        Some(unsafe { &*self.ring.slot(tail) })
    }

    pub fn tail_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        let tail = self.ring.tail.load(Ordering::Relaxed);
        // SAFETY: as in `tail`.
        Some(unsafe { &mut *self.ring.slot(tail) })
    }

    /// Release the tail slot back to the producer.
    ///
    /// # Safety
    ///
    /// The buffer must not be empty, otherwise the tail runs past the head
    /// and stale slots are read back as fresh data.
    #[inline]
    pub unsafe fn bump_tail(&mut self) {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        self.ring
            .tail
            .store(CircularBuffer::<T, N>::next_index(tail), Ordering::Release);
    }

    /// Drop everything currently queued.
    pub fn clear(&mut self) {
        let head = self.ring.head.load(Ordering::Acquire);
        self.ring.tail.store(head, Ordering::Release);
    }
}

impl<'a, T: Copy, const N: usize> Consumer<'a, T, N> {
    /// Copy out the tail item and release its slot.
    ///
    /// # Safety
    ///
    /// Same as [`bump_tail`](Self::bump_tail).
    pub unsafe fn pop(&mut self) -> T {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        // SAFETY: caller guarantees the slot holds published data.
        let value = unsafe { *self.ring.slot(tail) };
        unsafe { self.bump_tail() };
        value
    }

    /// Checked [`pop`](Self::pop).
    pub fn try_pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: checked above; only we can make it empty.
        Some(unsafe { self.pop() })
    }

    /// Tail item without consuming it.
    pub fn peek(&self) -> Option<T> {
        self.tail().copied()
    }
}
