//! Extensible DMA controller (XDMAC).
//!
//! Channel assignment is fixed: every DMA-capable peripheral owns one
//! transmit and one receive channel, listed in the binding table at the
//! bottom of this file. Peripherals missing from the table have no
//! [`DmaPeripheral`] impl and cannot be handed to a
//! [`DmaEngine`](crate::dma::DmaEngine).

use core::ptr::{read_volatile, write_volatile};

use spin::Once;

use super::{enable_peripheral_clock, irq, nvic};
use crate::hal::dma::{ChannelBinding, Direction, DmaController, DmaPeripheral};
use crate::hal::interrupt::{InterruptFlags, InterruptSource, Priority, SourceId};

const XDMAC_BASE: usize = 0x4007_8000;
const XDMAC_PERIPHERAL_ID: u32 = 58;

// ============================================================================
// Register Definitions
// ============================================================================

// Global registers
const XDMAC_GIE: usize = 0x0C;
const XDMAC_GID: usize = 0x10;
const XDMAC_GIM: usize = 0x14;
const XDMAC_GIS: usize = 0x18;
const XDMAC_GE: usize = 0x1C;
const XDMAC_GD: usize = 0x20;
const XDMAC_GS: usize = 0x24;
const XDMAC_GSWF: usize = 0x40;

// Channel registers, relative to the channel block
const CHANNEL_BLOCK: usize = 0x50;
const CHANNEL_STRIDE: usize = 0x40;

const XDMAC_CIE: usize = 0x00;
const XDMAC_CID: usize = 0x04;
const XDMAC_CIS: usize = 0x0C;
const XDMAC_CSA: usize = 0x10;
const XDMAC_CDA: usize = 0x14;
const XDMAC_CNDA: usize = 0x18;
const XDMAC_CNDC: usize = 0x1C;
const XDMAC_CUBC: usize = 0x20;
const XDMAC_CBC: usize = 0x24;
const XDMAC_CC: usize = 0x28;
const XDMAC_CDS_MSP: usize = 0x2C;
const XDMAC_CSUS: usize = 0x30;
const XDMAC_CDUS: usize = 0x34;

// CC: single burst, one-unit chunk and byte width are all zero.
const CC_TYPE_PER_TRAN: u32 = 1 << 0;
const CC_DSYNC_MEM2PER: u32 = 1 << 4;
const CC_SIF_AHB_IF1: u32 = 1 << 13;
const CC_DIF_AHB_IF1: u32 = 1 << 14;
const CC_SAM_INCREMENTED: u32 = 1 << 16;
const CC_DAM_INCREMENTED: u32 = 1 << 18;
const CC_PERID_SHIFT: u32 = 24;

// CIE / CIS
const CI_BLOCK: u32 = 1 << 0;
const CI_READ_BUS_ERROR: u32 = 1 << 4;
const CI_WRITE_BUS_ERROR: u32 = 1 << 5;
const CI_ALL: u32 = 0x7F;

/// Physical channels on the S70.
pub const CHANNEL_COUNT: u8 = 24;

static CLOCK: Once<()> = Once::new();

#[inline]
fn read_reg(offset: usize) -> u32 {
    unsafe { read_volatile((XDMAC_BASE + offset) as *const u32) }
}

#[inline]
fn write_reg(offset: usize, value: u32) {
    unsafe { write_volatile((XDMAC_BASE + offset) as *mut u32, value) }
}

#[inline]
const fn channel_reg(channel: u8, offset: usize) -> usize {
    CHANNEL_BLOCK + channel as usize * CHANNEL_STRIDE + offset
}

/// Channel configuration word for one binding.
pub const fn channel_config(binding: &ChannelBinding) -> u32 {
    let perid = (binding.request_line as u32) << CC_PERID_SHIFT;
    match binding.direction {
        // memory (IF0, incrementing) -> peripheral (IF1, fixed)
        Direction::Tx => {
            CC_TYPE_PER_TRAN | CC_DSYNC_MEM2PER | CC_DIF_AHB_IF1 | CC_SAM_INCREMENTED | perid
        }
        // peripheral (IF1, fixed) -> memory (IF0, incrementing)
        Direction::Rx => CC_TYPE_PER_TRAN | CC_SIF_AHB_IF1 | CC_DAM_INCREMENTED | perid,
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug)]
pub struct Xdmac;

impl Xdmac {
    /// # Safety
    ///
    /// Each channel must be driven by at most one engine.
    pub const unsafe fn new() -> Self {
        Self
    }

    fn ensure_clock(&self) {
        CLOCK.call_once(|| enable_peripheral_clock(XDMAC_PERIPHERAL_ID));
    }

    /// Register holding the memory-side address for this direction.
    const fn memory_side(binding: &ChannelBinding) -> usize {
        match binding.direction {
            Direction::Tx => XDMAC_CSA,
            Direction::Rx => XDMAC_CDA,
        }
    }

    const fn peripheral_side(binding: &ChannelBinding) -> usize {
        match binding.direction {
            Direction::Tx => XDMAC_CDA,
            Direction::Rx => XDMAC_CSA,
        }
    }
}

impl DmaController for Xdmac {
    const CHANNEL_COUNT: u8 = CHANNEL_COUNT;

    fn enable_channels(&self, mask: u32) {
        write_reg(XDMAC_GE, mask);
    }

    fn disable_channels(&self, mask: u32) {
        write_reg(XDMAC_GD, mask);
    }

    fn enabled_channels(&self) -> u32 {
        read_reg(XDMAC_GS)
    }

    fn unmask_channels(&self, mask: u32) {
        write_reg(XDMAC_GIE, mask);
    }

    fn mask_channels(&self, mask: u32) {
        write_reg(XDMAC_GID, mask);
    }

    fn pending_channels(&self) -> u32 {
        read_reg(XDMAC_GIS)
    }

    fn configure(&self, binding: &ChannelBinding) {
        self.ensure_clock();
        let ch = binding.channel;
        write_reg(channel_reg(ch, XDMAC_CC), channel_config(binding));
        write_reg(channel_reg(ch, Self::peripheral_side(binding)), binding.register as u32);
        write_reg(channel_reg(ch, Self::memory_side(binding)), 0);
        write_reg(channel_reg(ch, XDMAC_CUBC), 0);
        write_reg(channel_reg(ch, XDMAC_CNDA), 0);
        write_reg(channel_reg(ch, XDMAC_CNDC), 0);
        write_reg(channel_reg(ch, XDMAC_CBC), 0);
        write_reg(channel_reg(ch, XDMAC_CDS_MSP), 0);
        write_reg(channel_reg(ch, XDMAC_CSUS), 0);
        write_reg(channel_reg(ch, XDMAC_CDUS), 0);
    }

    fn set_transfer(&self, binding: &ChannelBinding, address: usize, length: u32) {
        let ch = binding.channel;
        write_reg(channel_reg(ch, Self::memory_side(binding)), address as u32);
        write_reg(channel_reg(ch, XDMAC_CUBC), length);
    }

    fn position(&self, binding: &ChannelBinding) -> usize {
        read_reg(channel_reg(binding.channel, Self::memory_side(binding))) as usize
    }

    fn remaining(&self, binding: &ChannelBinding) -> u32 {
        read_reg(channel_reg(binding.channel, XDMAC_CUBC)) & 0x00FF_FFFF
    }

    fn set_remaining(&self, binding: &ChannelBinding, length: u32) {
        write_reg(channel_reg(binding.channel, XDMAC_CUBC), length);
    }

    fn enable_done_interrupt(&self, binding: &ChannelBinding) {
        let bits = match binding.direction {
            Direction::Tx => CI_BLOCK | CI_WRITE_BUS_ERROR,
            Direction::Rx => CI_BLOCK,
        };
        write_reg(channel_reg(binding.channel, XDMAC_CIE), bits);
    }

    fn disable_done_interrupt(&self, binding: &ChannelBinding) {
        write_reg(channel_reg(binding.channel, XDMAC_CID), CI_ALL);
    }

    fn take_events(&self, binding: &ChannelBinding) -> InterruptFlags {
        // CIS clears on read.
        let cis = read_reg(channel_reg(binding.channel, XDMAC_CIS));
        let (done, error) = match binding.direction {
            Direction::Tx => (InterruptFlags::TX_TRANSFER_DONE, InterruptFlags::TX_ERROR),
            Direction::Rx => (InterruptFlags::RX_TRANSFER_DONE, InterruptFlags::RX_ERROR),
        };

        let mut events = InterruptFlags::empty();
        if cis & CI_BLOCK != 0 {
            events |= done;
        }
        if cis & (CI_READ_BUS_ERROR | CI_WRITE_BUS_ERROR) != 0 {
            events |= error;
        }
        events
    }

    fn request_flush(&self, mask: u32) {
        write_reg(XDMAC_GSWF, mask);
    }

    fn enable_irq(&self, priority: Option<Priority>) {
        if let Some(priority) = priority {
            nvic::set_priority(irq::XDMAC, priority);
        }
        nvic::enable_irq(irq::XDMAC);
    }
}

/// The controller's shared interrupt line, as seen by the registry.
///
/// Status bits are channel numbers.
pub struct XdmacSource;

impl InterruptSource for XdmacSource {
    fn source(&self) -> SourceId {
        SourceId::Dma
    }

    fn status(&mut self) -> u32 {
        read_reg(XDMAC_GIS) & read_reg(XDMAC_GIM)
    }

    /// A channel's GIS bit drops once its CIS has been read. Handlers
    /// usually did that already through `take_events`.
    fn clear(&mut self, bits: u32) {
        let mut pending = bits;
        while pending != 0 {
            let channel = pending.trailing_zeros() as u8;
            let _ = read_reg(channel_reg(channel, XDMAC_CIS));
            pending &= pending - 1;
        }
    }

    fn acknowledge(&mut self) {
        nvic::clear_pending(irq::XDMAC);
    }
}

// ============================================================================
// Channel Bindings
// ============================================================================
//
// The S70 has 24 channels and every one is claimed below:
//
//   0..=5    USART0..2      (tx, rx)
//   6..=15   UART0..4       (tx, rx)
//   16, 17   PWM0 timers 0, 1 (tx only)
//   18..=21  SPI0, SPI1     (tx, rx)
//   22, 23   TWIHS0         (tx, rx)
//
// TWIHS1 and TWIHS2 are left without a binding: there is no free channel
// pair for them, so engines for them fail to build.

/// SPI controller `N`.
pub struct Spi<const N: u8>;
/// UART `N`.
pub struct Uart<const N: u8>;
/// USART `N`.
pub struct Usart<const N: u8>;
/// Two-wire (I2C) controller `N`.
pub struct Twihs<const N: u8>;
/// PWM0 timer `N`, fed through the PWM DMA register.
pub struct Pwm<const N: u8>;

// Data registers
const SPI_TDR: usize = 0x0C;
const SPI_RDR: usize = 0x08;
const UART_THR: usize = 0x1C;
const UART_RHR: usize = 0x18;
const TWIHS_THR: usize = 0x34;
const TWIHS_RHR: usize = 0x30;
const PWM_DMAR: usize = 0x24;

macro_rules! dma_bindings {
    (@rx $base:expr) => { None };
    (@rx $base:expr, $ch:literal, $line:literal, $reg:expr) => {
        Some(ChannelBinding::rx($ch, $line, $base + $reg))
    };
    ($(
        $ty:ty, $name:literal, $base:expr =>
            tx($tx_ch:literal, $tx_line:literal, $tx_reg:expr)
            $(, rx($rx_ch:literal, $rx_line:literal, $rx_reg:expr))?;
    )*) => {$(
        impl DmaPeripheral for $ty {
            const NAME: &'static str = $name;
            const TX: ChannelBinding = ChannelBinding::tx($tx_ch, $tx_line, $base + $tx_reg);
            const RX: Option<ChannelBinding> =
                dma_bindings!(@rx $base $(, $rx_ch, $rx_line, $rx_reg)?);
        }
    )*};
}

dma_bindings! {
    Usart<0>, "USART0", 0x4002_4000 => tx(0, 7, UART_THR), rx(1, 8, UART_RHR);
    Usart<1>, "USART1", 0x4002_8000 => tx(2, 9, UART_THR), rx(3, 10, UART_RHR);
    Usart<2>, "USART2", 0x4002_C000 => tx(4, 11, UART_THR), rx(5, 12, UART_RHR);

    Uart<0>, "UART0", 0x400E_0800 => tx(6, 20, UART_THR), rx(7, 21, UART_RHR);
    Uart<1>, "UART1", 0x400E_0A00 => tx(8, 22, UART_THR), rx(9, 23, UART_RHR);
    Uart<2>, "UART2", 0x400E_1A00 => tx(10, 24, UART_THR), rx(11, 25, UART_RHR);
    Uart<3>, "UART3", 0x400E_1C00 => tx(12, 26, UART_THR), rx(13, 27, UART_RHR);
    Uart<4>, "UART4", 0x400E_1E00 => tx(14, 28, UART_THR), rx(15, 29, UART_RHR);

    Pwm<0>, "PWM0.0", 0x4002_0000 => tx(16, 13, PWM_DMAR);
    Pwm<1>, "PWM0.1", 0x4002_0000 => tx(17, 13, PWM_DMAR);

    Spi<0>, "SPI0", 0x4000_8000 => tx(18, 1, SPI_TDR), rx(19, 2, SPI_RDR);
    Spi<1>, "SPI1", 0x4005_8000 => tx(20, 3, SPI_TDR), rx(21, 4, SPI_RDR);

    Twihs<0>, "TWIHS0", 0x4001_8000 => tx(22, 14, TWIHS_THR), rx(23, 15, TWIHS_RHR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spi_bindings_follow_the_fixed_table() {
        assert_eq!(<Spi<0>>::TX.channel, 18);
        assert_eq!(<Spi<0>>::TX.request_line, 1);
        assert_eq!(<Spi<1>>::TX.channel, 20);
        assert_eq!(<Spi<1>>::TX.request_line, 3);
        assert_eq!(<Spi<1>>::RX.map(|rx| rx.register), Some(0x4005_8008));
    }

    #[test]
    fn twihs_and_pwm_bindings() {
        let tx = <Twihs<0>>::TX;
        assert_eq!((tx.channel, tx.request_line, tx.register), (22, 14, 0x4001_8034));
        let rx = <Twihs<0>>::RX.unwrap();
        assert_eq!((rx.channel, rx.request_line, rx.register), (23, 15, 0x4001_8030));
        assert_eq!(rx.direction, Direction::Rx);

        for (pwm, channel) in [(<Pwm<0>>::TX, 16), (<Pwm<1>>::TX, 17)] {
            assert_eq!(pwm.channel, channel);
            assert_eq!(pwm.request_line, 13);
            assert_eq!(pwm.register, 0x4002_0024);
        }
        assert!(<Pwm<0>>::RX.is_none());
        assert!(<Pwm<1>>::RX.is_none());
    }

    #[test]
    fn every_channel_is_owned_once() {
        let bindings = [
            <Usart<0>>::TX, <Usart<1>>::TX, <Usart<2>>::TX,
            <Uart<0>>::TX, <Uart<1>>::TX, <Uart<2>>::TX, <Uart<3>>::TX, <Uart<4>>::TX,
            <Pwm<0>>::TX, <Pwm<1>>::TX,
            <Spi<0>>::TX, <Spi<1>>::TX,
            <Twihs<0>>::TX,
        ];
        let receivers = [
            <Usart<0>>::RX, <Usart<1>>::RX, <Usart<2>>::RX,
            <Uart<0>>::RX, <Uart<1>>::RX, <Uart<2>>::RX, <Uart<3>>::RX, <Uart<4>>::RX,
            <Pwm<0>>::RX, <Pwm<1>>::RX,
            <Spi<0>>::RX, <Spi<1>>::RX,
            <Twihs<0>>::RX,
        ];

        let mut seen = 0u32;
        for binding in bindings.into_iter().chain(receivers.into_iter().flatten()) {
            assert!(binding.channel < CHANNEL_COUNT);
            assert_eq!(seen & binding.bit(), 0, "channel {} reused", binding.channel);
            seen |= binding.bit();
        }
        assert_eq!(seen, (1 << CHANNEL_COUNT) - 1);
    }

    #[test]
    fn configuration_words() {
        let tx = channel_config(&<Spi<0>>::TX);
        assert_eq!(tx >> CC_PERID_SHIFT, 1);
        assert_ne!(tx & CC_DSYNC_MEM2PER, 0);
        assert_ne!(tx & CC_SAM_INCREMENTED, 0);
        assert_eq!(tx & CC_DAM_INCREMENTED, 0);

        let rx = channel_config(&<Uart<3>>::RX.unwrap());
        assert_eq!(rx >> CC_PERID_SHIFT, 27);
        assert_eq!(rx & CC_DSYNC_MEM2PER, 0);
        assert_ne!(rx & CC_DAM_INCREMENTED, 0);
        assert_ne!(rx & CC_SIF_AHB_IF1, 0);
    }
}
