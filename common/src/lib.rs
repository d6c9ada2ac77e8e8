//! Target-independent building blocks shared by the peripheral layer.
//!
//! # Module Organization
//!
//! - [`buffer`]: fixed-capacity single-producer/single-consumer ring
//! - [`sync`]: spin-based mutual exclusion for initialisation-time writers
//!
//! Nothing in here touches hardware, so every module is exercised by the
//! host test suite.

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod sync;

pub use buffer::{ByteBuffer, CircularBuffer, Consumer, Producer};
pub use sync::SpinLock;
