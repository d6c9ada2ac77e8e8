//! A receive interrupt feeding a byte ring that the main loop drains.

mod support;

use common::ByteBuffer;
use periph::hal::interrupt::SourceId;
use periph::irq::{InterruptChain, Registry};

use support::FakeSource;

const RXRDY: u32 = 1 << 0;
const OVRE: u32 = 1 << 5;

static RX_RING: ByteBuffer<16> = ByteBuffer::new(0);
static UART_LINE: InterruptChain<4> = InterruptChain::new();

thread_local! {
    static WIRE: std::cell::RefCell<Vec<u8>> = const { std::cell::RefCell::new(Vec::new()) };
    static OVERRUNS: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
}

fn on_rx_ready(_bits: u32) {
    // SAFETY: this handler is the only producer of RX_RING.
    let mut producer = unsafe { RX_RING.producer() };
    let byte = WIRE.with(|wire| wire.borrow_mut().remove(0));
    if producer.try_push(byte).is_err() {
        OVERRUNS.with(|count| count.set(count.get() + 1));
    }
}

fn on_overrun(_bits: u32) {
    OVERRUNS.with(|count| count.set(count.get() + 1));
}

#[test]
fn received_bytes_reach_the_main_loop_in_order() {
    UART_LINE.register(RXRDY, on_rx_ready).unwrap();
    UART_LINE.register(OVRE, on_overrun).unwrap();

    WIRE.with(|wire| wire.borrow_mut().extend_from_slice(b"G0 X10\nG1 Y2.5\nM2\n"));
    let incoming = WIRE.with(|wire| wire.borrow().len());

    // SAFETY: the test body is the only consumer.
    let mut consumer = unsafe { RX_RING.consumer() };
    let mut line = Vec::new();
    let mut lines = Vec::new();

    for _ in 0..incoming {
        let mut uart = FakeSource::new(SourceId::Uart(0), RXRDY);
        UART_LINE.dispatch(&mut uart);
        assert_eq!(uart.pending, 0);

        // The loop gets a turn after every few bytes.
        if consumer.used_count() >= 3 {
            while let Some(byte) = consumer.try_pop() {
                if byte == b'\n' {
                    lines.push(String::from_utf8(std::mem::take(&mut line)).unwrap());
                } else {
                    line.push(byte);
                }
            }
        }
    }
    while let Some(byte) = consumer.try_pop() {
        if byte == b'\n' {
            lines.push(String::from_utf8(std::mem::take(&mut line)).unwrap());
        } else {
            line.push(byte);
        }
    }

    assert_eq!(lines, ["G0 X10", "G1 Y2.5", "M2"]);
    assert_eq!(OVERRUNS.with(|count| count.get()), 0);

    let mut uart = FakeSource::new(SourceId::Uart(0), OVRE);
    UART_LINE.dispatch(&mut uart);
    assert_eq!(OVERRUNS.with(|count| count.get()), 1);
    assert!(RX_RING.is_empty());
}
