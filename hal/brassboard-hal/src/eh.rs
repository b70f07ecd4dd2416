//! Adapters from the `embedded-hal` 1.0 traits
//!
//! Any chip HAL that implements `embedded_hal::i2c::I2c`,
//! `embedded_hal::spi::SpiDevice` or the digital traits can be wrapped in
//! these newtypes. `embedded-hal` transfers are all-or-nothing, so a
//! successful call reports the full requested length.

use embedded_hal::digital;
use embedded_hal::i2c::{self, Operation as I2cOperation};
use embedded_hal::spi::{self, Operation as SpiOperation};

use crate::gpio::{Edge, EdgeWait, InputPin, OutputPin};
use crate::i2c::I2cBus;
use crate::spi::SpiBus;

/// `embedded-hal` I2C controller as an [`I2cBus`]
#[derive(Debug)]
pub struct HalI2c<T>(pub T);

impl<T: i2c::I2c> I2cBus for HalI2c<T> {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(address, data)?;
        Ok(data.len())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(address, buf)?;
        Ok(buf.len())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let total = write_data.len() + read_buf.len();
        if write_data.is_empty() {
            // Some controllers reject an empty write phase
            self.0.read(address, read_buf)?;
        } else {
            self.0.transaction(
                address,
                &mut [I2cOperation::Write(write_data), I2cOperation::Read(read_buf)],
            )?;
        }
        Ok(total)
    }
}

/// `embedded-hal` SPI device (bus + chip select) as an [`SpiBus`]
#[derive(Debug)]
pub struct HalSpi<T>(pub T);

impl<T: spi::SpiDevice> SpiBus for HalSpi<T> {
    type Error = T::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, Self::Error> {
        let len = read.len().max(write.len());
        self.0.transfer(read, write)?;
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(data)?;
        Ok(data.len())
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<usize, Self::Error> {
        let total = write.len() + read.len();
        self.0
            .transaction(&mut [SpiOperation::Write(write), SpiOperation::Read(read)])?;
        Ok(total)
    }
}

/// `embedded-hal` digital pin as an [`OutputPin`] / [`InputPin`]
#[derive(Debug)]
pub struct HalPin<T>(pub T);

impl<T: digital::OutputPin> OutputPin for HalPin<T> {
    type Error = T::Error;

    fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
        self.0.set_state(high.into())
    }
}

impl<T: digital::InputPin> InputPin for HalPin<T> {
    type Error = T::Error;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

impl<T> EdgeWait for HalPin<T>
where
    T: digital::InputPin + embedded_hal_async::digital::Wait,
{
    async fn wait_for_edge(&mut self, edge: Edge) -> Result<(), Self::Error> {
        use embedded_hal_async::digital::Wait;

        match edge {
            Edge::Rising => Wait::wait_for_rising_edge(&mut self.0).await,
            Edge::Falling => Wait::wait_for_falling_edge(&mut self.0).await,
            Edge::Any => Wait::wait_for_any_edge(&mut self.0).await,
        }
    }
}
