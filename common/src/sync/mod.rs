//! Synchronisation primitives for bare-metal code.

pub mod spinlock;

pub use spinlock::{SpinLock, SpinLockGuard};
