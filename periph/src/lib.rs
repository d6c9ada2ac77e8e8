//! Peripheral Composition Layer
//!
//! Build-time composition of peripherals and run-time routing of their
//! interrupts for bare-metal Cortex-M firmware.
//!
//! # Module Organization
//!
//! - [`hal`]: platform-independent trait definitions
//! - [`irq`]: per-source interrupt registries
//! - [`dma`]: transmit/receive channel pairs on a DMA controller
//! - [`usb`]: USB device assembled from up to three interface modules
//! - [`platform`]: SoC-specific implementations, selected by Cargo feature
//!
//! # Design Principles
//!
//! 1. **Build-time layout**: endpoint numbers, channel assignments and
//!    registry sizes are constants; invalid combinations fail to build
//! 2. **No allocation**: every table is a fixed-size array
//! 3. **Lock-free interrupt path**: dispatch never takes a lock
//!
//! # Usage Example
//!
//! ```no_run
//! use periph::dma::DmaEngine;
//! use periph::irq::Registry;
//! use periph::platform::sams70::xdmac::{Spi, Xdmac};
//! use periph::platform::sams70::XDMAC_INTERRUPTS;
//!
//! static XDMAC: Xdmac = unsafe { Xdmac::new() };
//! static SPI0_DMA: DmaEngine<'static, Xdmac, Spi<0>> = DmaEngine::new(&XDMAC);
//!
//! fn spi0_done(channels: u32) {
//!     let _events = SPI0_DMA.completion_events(channels);
//! }
//!
//! SPI0_DMA.reset();
//! SPI0_DMA.register_completion(&XDMAC_INTERRUPTS, spi0_done).ok();
//! ```

#![cfg_attr(not(test), no_std)]

pub mod dma;
pub mod hal;
pub mod irq;
pub mod platform;
pub mod usb;

// Re-export commonly used types
pub use dma::DmaEngine;
pub use hal::interrupt::{InterruptController, InterruptFlags, InterruptSource};
pub use irq::{InterruptChain, Registry, RegistryError, SlotTable};
pub use usb::UsbDevice;
