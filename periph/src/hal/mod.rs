//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! These traits are what the registries, the DMA engine and the USB
//! composer are written against. The platform layer implements them on
//! real registers; the test suite implements them on plain memory.
//!
//! # Available Interfaces
//!
//! - [`interrupt`]: interrupt controller, interrupt sources and option flags
//! - [`gpio`]: pin-change interrupt configuration
//! - [`dma`]: DMA controller registers and channel bindings
//! - [`usb`]: bus speed and the control-endpoint write path of a USB device controller

pub mod dma;
pub mod gpio;
pub mod interrupt;
pub mod usb;
