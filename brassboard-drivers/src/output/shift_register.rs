//! 74HC595 serial-in, parallel-out shift register
//!
//! Output states are shifted out MSB first over SPI and copied to the
//! output pins on the rising edge of the latch (RCLK). `N` registers may
//! be daisy-chained; output `i` is bit `i % 8` of register `i / 8`,
//! counting from the register wired to the controller.

use brassboard_core::bus::CommunicationBus;
use brassboard_core::error::{ArgumentError, Error};
use brassboard_core::port::DigitalOutputPort;
use brassboard_hal::gpio::OutputPin;

/// Errors from the shift register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftRegisterError<BE, PE> {
    /// Shifting the data out failed
    Bus(Error<BE>),
    /// Driving the latch failed
    Latch(Error<PE>),
    /// Output index out of range
    Argument(ArgumentError),
}

impl<BE, PE> From<ArgumentError> for ShiftRegisterError<BE, PE> {
    fn from(e: ArgumentError) -> Self {
        ShiftRegisterError::Argument(e)
    }
}

/// Chain of `N` 74HC595 registers
pub struct ShiftRegister74595<B, L, const N: usize = 1> {
    bus: B,
    latch: DigitalOutputPort<L>,
    state: [u8; N],
}

impl<B, L, const N: usize> ShiftRegister74595<B, L, N>
where
    B: CommunicationBus,
    L: OutputPin,
{
    /// Number of outputs in the chain
    pub const OUTPUTS: usize = N * 8;

    /// Take the bus and latch pin, and drive every output low
    pub fn new(bus: B, latch: L) -> Result<Self, ShiftRegisterError<B::Error, L::Error>> {
        let latch = DigitalOutputPort::new(latch, false).map_err(ShiftRegisterError::Latch)?;
        let mut register = Self {
            bus,
            latch,
            state: [0; N],
        };
        register.flush([0; N])?;
        Ok(register)
    }

    /// Set one output
    pub fn set(
        &mut self,
        index: usize,
        on: bool,
    ) -> Result<(), ShiftRegisterError<B::Error, L::Error>> {
        let (byte, mask) = Self::locate(index)?;
        let mut next = self.state;
        if on {
            next[byte] |= mask;
        } else {
            next[byte] &= !mask;
        }
        self.flush(next)
    }

    /// Cached state of one output
    pub fn get(&self, index: usize) -> Result<bool, ArgumentError> {
        let (byte, mask) = Self::locate(index)?;
        Ok(self.state[byte] & mask != 0)
    }

    /// Replace every output at once, register 0 first
    pub fn set_all(&mut self, state: [u8; N]) -> Result<(), ShiftRegisterError<B::Error, L::Error>> {
        self.flush(state)
    }

    /// Cached output bytes, register 0 first
    pub fn outputs(&self) -> [u8; N] {
        self.state
    }

    /// Give back the bus and latch pin
    pub fn release(self) -> (B, L) {
        (self.bus, self.latch.release())
    }

    fn locate(index: usize) -> Result<(usize, u8), ArgumentError> {
        if index >= Self::OUTPUTS {
            return Err(ArgumentError::ChannelOutOfRange {
                index,
                count: Self::OUTPUTS,
            });
        }
        Ok((index / 8, 1 << (index % 8)))
    }

    /// Shift out `state` and latch it; the cache changes only on success
    fn flush(&mut self, state: [u8; N]) -> Result<(), ShiftRegisterError<B::Error, L::Error>> {
        // The last register in the chain must be shifted out first
        let mut frame = state;
        frame.reverse();

        self.latch
            .set_state(false)
            .map_err(ShiftRegisterError::Latch)?;
        self.bus.write_bytes(&frame).map_err(ShiftRegisterError::Bus)?;
        self.latch
            .set_state(true)
            .map_err(ShiftRegisterError::Latch)?;

        self.state = state;
        trace!("shift register latched {} bytes", N);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brassboard_core::bus::{SharedBus, SpiDevice};
    use brassboard_hal::mock::{MockOutputPin, MockSpi};
    use brassboard_hal::spi::SpiConfig;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn spi(mock: &mut MockSpi) -> SpiDevice<&mut MockSpi> {
        SpiDevice::new(mock, SpiConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_cleared_and_latched() {
        let mut mock = MockSpi::default();
        let register: ShiftRegister74595<_, _, 2> =
            ShiftRegister74595::new(spi(&mut mock), MockOutputPin::new()).unwrap();
        assert_eq!(register.outputs(), [0, 0]);

        let (_, latch) = register.release();
        assert!(latch.high);
        assert_eq!(mock.writes()[0].as_slice(), &[0, 0]);
    }

    #[test]
    fn test_chain_order() {
        let mut mock = MockSpi::default();
        let mut register: ShiftRegister74595<_, _, 2> =
            ShiftRegister74595::new(spi(&mut mock), MockOutputPin::new()).unwrap();

        register.set(0, true).unwrap();
        register.set(9, true).unwrap();
        assert!(register.get(9).unwrap());
        assert_eq!(register.outputs(), [0x01, 0x02]);
        drop(register);

        assert_eq!(mock.writes()[2].as_slice(), &[0x02, 0x01]);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut mock = MockSpi::default();
        let mut register: ShiftRegister74595<_, _> =
            ShiftRegister74595::new(spi(&mut mock), MockOutputPin::new()).unwrap();

        assert_eq!(
            register.set(8, true),
            Err(ShiftRegisterError::Argument(ArgumentError::ChannelOutOfRange {
                index: 8,
                count: 8
            }))
        );
        assert!(register.get(8).is_err());
    }

    #[test]
    fn test_failed_shift_keeps_state() {
        let shared: SharedBus<NoopRawMutex, _> = SharedBus::new(MockSpi::default());
        let bus = SpiDevice::new(shared.handle(), SpiConfig::default()).unwrap();
        let mut register: ShiftRegister74595<_, _> =
            ShiftRegister74595::new(bus, MockOutputPin::new()).unwrap();
        register.set_all([0xF0]).unwrap();

        shared.with(|mock| mock.fail_next(3));
        let result = register.set(0, true);

        assert!(matches!(result, Err(ShiftRegisterError::Bus(e)) if e.is_transfer()));
        assert_eq!(register.outputs(), [0xF0]);
    }
}
