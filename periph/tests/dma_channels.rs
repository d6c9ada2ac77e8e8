mod support;

use periph::dma::DmaEngine;
use periph::hal::dma::{Direction, DmaPeripheral};
use periph::hal::interrupt::InterruptFlags;
use periph::irq::{InterruptChain, Registry};
use periph::platform::sams70::xdmac::{Pwm, Spi, Twihs, Uart, Usart};

use support::{DmaLine, MockDma, record, take_calls};

#[test]
fn disabling_spi0_leaves_spi1_transmitting() {
    let dma = MockDma::new();
    let spi0 = DmaEngine::<_, Spi<0>>::new(&dma);
    let spi1 = DmaEngine::<_, Spi<1>>::new(&dma);

    spi0.enable_tx();
    spi1.enable_tx();
    spi0.disable_tx();

    assert!(!dma.is_enabled(&<Spi<0>>::TX));
    assert!(dma.is_enabled(&<Spi<1>>::TX));
    assert_eq!(dma.enabled.get(), 1 << 20);
}

#[test]
fn bindings_are_a_fixed_function_of_the_peripheral() {
    let dma = MockDma::new();
    let spi0 = DmaEngine::<_, Spi<0>>::new(&dma);
    let spi1 = DmaEngine::<_, Spi<1>>::new(&dma);
    let uart2 = DmaEngine::<_, Uart<2>>::new(&dma);

    assert_eq!((spi0.tx_binding().channel, spi0.tx_binding().request_line), (18, 1));
    assert_eq!((spi1.tx_binding().channel, spi1.tx_binding().request_line), (20, 3));
    assert_eq!(uart2.rx_binding().map(|rx| rx.direction), Some(Direction::Rx));
    assert_eq!(uart2.channel_mask(), (1 << 10) | (1 << 11));
}

#[test]
fn engines_sharing_a_controller_do_not_overlap() {
    let dma = MockDma::new();
    let usart0 = DmaEngine::<_, Usart<0>>::new(&dma);
    let uart0 = DmaEngine::<_, Uart<0>>::new(&dma);

    usart0.reset();
    uart0.reset();
    usart0.enable();
    uart0.enable();
    usart0.disable();

    assert_eq!(dma.enabled.get(), uart0.channel_mask());
    assert_eq!(usart0.channel_mask() & uart0.channel_mask(), 0);
}

static TX_DATA: [u8; 5] = *b"hello";

#[test]
fn transmit_completion_reaches_the_registered_handler() {
    let dma = MockDma::new();
    let spi1 = DmaEngine::<_, Spi<1>>::new(&dma);
    let completions = InterruptChain::<4>::new();

    fn on_spi1(channels: u32) {
        record("spi1", channels);
    }

    spi1.reset();
    spi1.set_interrupts(InterruptFlags::TX_TRANSFER_DONE | InterruptFlags::PRIORITY_MEDIUM);
    spi1.register_completion(&completions, on_spi1).unwrap();
    assert_eq!(dma.irq_priority.get(), Some(2));

    assert!(spi1.send(&TX_DATA));
    assert!(!spi1.done_writing());
    assert!(!spi1.send(&TX_DATA), "busy channel must refuse a new transfer");

    dma.finish(&<Spi<1>>::TX, InterruptFlags::TX_TRANSFER_DONE);
    assert!(spi1.done_writing());

    let matched = completions.dispatch(&mut DmaLine(&dma));
    assert_eq!(matched, 1 << 20);
    assert_eq!(take_calls(), vec![("spi1", 1 << 20)]);

    // Dispatch cleared the line; raise it again to decode it by hand.
    dma.events[20].set(InterruptFlags::TX_TRANSFER_DONE);
    assert_eq!(spi1.completion_events(1 << 20), InterruptFlags::TX_TRANSFER_DONE);
    assert!(spi1.completion_events(1 << 20).is_empty());
}

#[test]
fn receive_into_a_buffer_and_stop() {
    let dma = MockDma::new();
    let uart1 = DmaEngine::<_, Uart<1>>::new(&dma);
    let buffer: &'static mut [u8] = Box::leak(Box::new([0u8; 16]));
    let start = buffer.as_ptr() as usize;

    uart1.reset();
    uart1.set_interrupts(InterruptFlags::RX_TRANSFER_DONE);
    assert!(uart1.receive(buffer));
    assert_eq!(uart1.left_to_read(), 16);
    assert_eq!(uart1.rx_position(), start);
    let rx = <Uart<1>>::RX.unwrap();
    assert!(dma.is_enabled(&rx));

    uart1.stop_rx();
    assert!(!dma.is_enabled(&rx));
    assert!(!dma.done_irq[rx.channel as usize].get());
    assert!(uart1.done_reading());
    assert!(uart1.state(Direction::Rx).unwrap().done_interrupt);
}

#[test]
fn off_silences_both_directions() {
    let dma = MockDma::new();
    let spi0 = DmaEngine::<_, Spi<0>>::new(&dma);

    spi0.set_interrupts(InterruptFlags::TX_TRANSFER_DONE | InterruptFlags::RX_TRANSFER_DONE);
    assert!(dma.done_irq[18].get() && dma.done_irq[19].get());

    spi0.set_interrupts(InterruptFlags::OFF);
    assert!(!dma.done_irq[18].get());
    assert!(!dma.done_irq[19].get());
    assert_eq!(dma.irq_priority.get(), None);
}

#[test]
fn pwm_feed_and_twihs_share_the_controller() {
    static DUTY: [u8; 4] = [10, 20, 30, 40];

    let dma = MockDma::new();
    let pwm = DmaEngine::<_, Pwm<0>>::new(&dma);
    let twi = DmaEngine::<_, Twihs<0>>::new(&dma);

    pwm.reset();
    twi.reset();
    assert_eq!(pwm.channel_mask(), 1 << 16);
    assert_eq!(twi.channel_mask(), (1 << 22) | (1 << 23));

    assert!(pwm.send(&DUTY));
    twi.enable();
    pwm.disable();

    assert!(!dma.is_enabled(&<Pwm<0>>::TX));
    assert_eq!(dma.enabled.get(), twi.channel_mask());
}
