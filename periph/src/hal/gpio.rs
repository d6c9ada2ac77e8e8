//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! Only pin-change interrupt configuration lives here. Pins are addressed
//! as a bit mask within one port, matching how the port's interrupt status
//! register reports them.

use bitflags::bitflags;
use core::fmt;

use super::interrupt::{Priority, priority_from_ladder};

/// Event detection configuration for GPIO pins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeDetect {
    /// Detect rising edge (low-to-high transition).
    Rising,
    /// Detect falling edge (high-to-low transition).
    Falling,
    /// Detect both rising and falling edges.
    Both,
}

/// Level detection for GPIO interrupts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LevelDetect {
    /// Detect when pin is high.
    High,
    /// Detect when pin is low.
    Low,
}

/// Decoded trigger condition of a [`PinInterrupt`] word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Trigger {
    Edge(EdgeDetect),
    Level(LevelDetect),
}

bitflags! {
    /// Pin interrupt options.
    ///
    /// The low four bits hold a single trigger value, not independent
    /// flags; use [`PinInterrupt::trigger`] to decode them.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PinInterrupt: u32 {
        const ON_CHANGE = 1;
        const ON_RISING_EDGE = 1 << 1;
        const ON_FALLING_EDGE = 2 << 1;
        const ON_LOW_LEVEL = 3 << 1;
        const ON_HIGH_LEVEL = 4 << 1;

        const PRIORITY_HIGHEST = 1 << 5;
        const PRIORITY_HIGH = 1 << 6;
        const PRIORITY_MEDIUM = 1 << 7;
        const PRIORITY_LOW = 1 << 8;
        const PRIORITY_LOWEST = 1 << 9;
    }
}

impl PinInterrupt {
    pub const OFF: Self = Self::empty();

    const TRIGGER_MASK: u32 = 0b1111;

    pub fn trigger(self) -> Result<Trigger, GpioError> {
        match self.bits() & Self::TRIGGER_MASK {
            0 | 1 => Ok(Trigger::Edge(EdgeDetect::Both)),
            0b0010 => Ok(Trigger::Edge(EdgeDetect::Rising)),
            0b0100 => Ok(Trigger::Edge(EdgeDetect::Falling)),
            0b0110 => Ok(Trigger::Level(LevelDetect::Low)),
            0b1000 => Ok(Trigger::Level(LevelDetect::High)),
            other => Err(GpioError::InvalidTrigger(other)),
        }
    }

    pub fn priority(self) -> Option<Priority> {
        priority_from_ladder((self.bits() >> 5) & 0b1_1111)
    }
}

/// Errors from pin interrupt configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// No pins selected.
    EmptyMask,
    /// Trigger bits that name no known condition.
    InvalidTrigger(u32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::EmptyMask => f.write_str("empty pin mask"),
            GpioError::InvalidTrigger(bits) => write!(f, "invalid trigger bits {:#06b}", bits),
        }
    }
}

/// Pin-change interrupt control for one GPIO port.
pub trait GpioInterrupts {
    /// Error type for GPIO operations.
    type Error: fmt::Debug + From<GpioError>;

    /// Interrupt on edges of the pins in `mask` and unmask them.
    fn enable_edge_detect(&mut self, mask: u32, edge: EdgeDetect) -> Result<(), Self::Error>;

    /// Interrupt on levels of the pins in `mask` and unmask them.
    fn enable_level_detect(&mut self, mask: u32, level: LevelDetect)
    -> Result<(), Self::Error>;

    /// Mask the pins in `mask`.
    fn disable_interrupts(&mut self, mask: u32) -> Result<(), Self::Error>;

    /// Priority of the port's shared interrupt line.
    fn set_line_priority(&mut self, priority: Priority) -> Result<(), Self::Error>;

    /// Apply an option word to the pins in `mask`.
    ///
    /// [`PinInterrupt::OFF`] masks the pins. Any priority bit is applied
    /// to the whole port line before the pins are unmasked.
    fn set_interrupts(&mut self, mask: u32, options: PinInterrupt) -> Result<(), Self::Error> {
        if mask == 0 {
            return Err(GpioError::EmptyMask.into());
        }
        if options.is_empty() {
            return self.disable_interrupts(mask);
        }

        let trigger = options.trigger()?;
        if let Some(priority) = options.priority() {
            self.set_line_priority(priority)?;
        }

        match trigger {
            Trigger::Edge(edge) => self.enable_edge_detect(mask, edge),
            Trigger::Level(level) => self.enable_level_detect(mask, level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Edge(u32, EdgeDetect),
        Level(u32, LevelDetect),
        Disable(u32),
        Priority(Priority),
    }

    #[derive(Default)]
    struct MockPort {
        calls: Vec<Call>,
    }

    impl GpioInterrupts for MockPort {
        type Error = GpioError;

        fn enable_edge_detect(&mut self, mask: u32, edge: EdgeDetect) -> Result<(), GpioError> {
            self.calls.push(Call::Edge(mask, edge));
            Ok(())
        }

        fn enable_level_detect(
            &mut self,
            mask: u32,
            level: LevelDetect,
        ) -> Result<(), GpioError> {
            self.calls.push(Call::Level(mask, level));
            Ok(())
        }

        fn disable_interrupts(&mut self, mask: u32) -> Result<(), GpioError> {
            self.calls.push(Call::Disable(mask));
            Ok(())
        }

        fn set_line_priority(&mut self, priority: Priority) -> Result<(), GpioError> {
            self.calls.push(Call::Priority(priority));
            Ok(())
        }
    }

    #[test]
    fn trigger_decoding() {
        assert_eq!(
            PinInterrupt::ON_CHANGE.trigger(),
            Ok(Trigger::Edge(EdgeDetect::Both))
        );
        assert_eq!(
            PinInterrupt::ON_FALLING_EDGE.trigger(),
            Ok(Trigger::Edge(EdgeDetect::Falling))
        );
        assert_eq!(
            (PinInterrupt::ON_HIGH_LEVEL | PinInterrupt::PRIORITY_LOW).trigger(),
            Ok(Trigger::Level(LevelDetect::High))
        );
        assert_eq!(
            PinInterrupt::from_bits_retain(0b1010).trigger(),
            Err(GpioError::InvalidTrigger(0b1010))
        );
    }

    #[test]
    fn priority_applies_before_unmask() {
        let mut port = MockPort::default();
        port.set_interrupts(
            1 << 3,
            PinInterrupt::ON_RISING_EDGE | PinInterrupt::PRIORITY_MEDIUM,
        )
        .unwrap();

        assert_eq!(
            port.calls,
            vec![Call::Priority(2), Call::Edge(1 << 3, EdgeDetect::Rising)]
        );
    }

    #[test]
    fn off_masks_pins() {
        let mut port = MockPort::default();
        port.set_interrupts(0b11, PinInterrupt::OFF).unwrap();
        assert_eq!(port.calls, vec![Call::Disable(0b11)]);
    }

    #[test]
    fn empty_mask_is_rejected() {
        let mut port = MockPort::default();
        assert_eq!(
            port.set_interrupts(0, PinInterrupt::ON_LOW_LEVEL),
            Err(GpioError::EmptyMask)
        );
        assert!(port.calls.is_empty());
    }
}
