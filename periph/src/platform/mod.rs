//! Platform Abstraction Layer
//!
//! Each supported microcontroller family implements the [`Platform`] trait
//! and the HAL traits for its peripherals. Exactly one family is compiled
//! in, chosen by Cargo feature.
//!
//! # Usage
//!
//! ```no_run
//! use periph::platform::{CurrentPlatform, Platform};
//!
//! unsafe { CurrentPlatform::early_init() };
//! CurrentPlatform::enable_irq(10);
//! ```

use crate::hal::interrupt::{IrqNumber, Priority};

/// Platform trait - implemented by each supported platform
pub trait Platform {
    /// Platform name for debugging
    fn name() -> &'static str;

    /// Early platform initialization
    ///
    /// Enables the clocks of the peripherals whose interrupts this crate
    /// routes. Handlers should be registered after this and before any
    /// source is unmasked.
    ///
    /// # Safety
    /// Must only be called once, very early in boot.
    unsafe fn early_init();

    /// Enable (unmask) an IRQ line
    fn enable_irq(irq: IrqNumber);

    /// Disable (mask) an IRQ line
    fn disable_irq(irq: IrqNumber);

    /// Set the priority of an IRQ line. Lower is more urgent.
    fn set_irq_priority(irq: IrqNumber, priority: Priority);
}

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(feature = "sams70")] {
        pub mod sams70;
        pub use sams70::Sams70Platform as CurrentPlatform;
    } else {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features sams70"
        );
    }
}
