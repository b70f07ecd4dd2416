//! In-memory transports and pins for host tests
//!
//! [`MockI2c`] and [`MockSpi`] emulate register-file devices with an
//! auto-incrementing register pointer. Both can be told to fail or to
//! come up short on the next N calls so retry behaviour can be exercised.

use core::cell::Cell;

use heapless::Vec;

use crate::gpio::{ConfigurePull, Edge, EdgeWait, InputPin, OutputPin, Pull};
use crate::i2c::I2cBus;
use crate::spi::SpiBus;

/// Bytes kept per logged write
pub const LOG_DATA_LEN: usize = 32;

/// Operations kept in the log
pub const LOG_LEN: usize = 64;

/// Devices a [`MockI2c`] can emulate at once
pub const MAX_DEVICES: usize = 4;

/// Errors produced by the mocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// No device acknowledged the address
    Nack,
    /// Injected transport failure
    Bus,
}

/// One recorded bus operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Plain write
    Write {
        address: u8,
        data: Vec<u8, LOG_DATA_LEN>,
    },
    /// Plain read
    Read { address: u8, len: usize },
    /// Write followed by read in one transaction
    WriteRead {
        address: u8,
        data: Vec<u8, LOG_DATA_LEN>,
        len: usize,
    },
}

fn log_bytes(data: &[u8]) -> Vec<u8, LOG_DATA_LEN> {
    let end = data.len().min(LOG_DATA_LEN);
    Vec::from_slice(&data[..end]).unwrap_or_default()
}

/// Failure injection shared by the mocks
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    fail_next: usize,
    short_next: usize,
}

impl Faults {
    /// Decide the outcome of one call that should move `total` bytes
    fn apply(&mut self, total: usize) -> Result<usize, MockError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(MockError::Bus);
        }
        if self.short_next > 0 {
            self.short_next -= 1;
            return Ok(total.saturating_sub(1));
        }
        Ok(total)
    }
}

/// Register file of one emulated device
#[derive(Debug, Clone)]
struct RegisterFile {
    registers: [u8; 256],
    pointer: u8,
}

impl RegisterFile {
    const fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
        }
    }

    fn write(&mut self, data: &[u8]) {
        let Some((&reg, payload)) = data.split_first() else {
            return;
        };
        self.pointer = reg;
        for &byte in payload {
            self.registers[self.pointer as usize] = byte;
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn read(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.registers[self.pointer as usize];
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

/// Emulated I2C bus with up to [`MAX_DEVICES`] register-file devices
///
/// A write sets the register pointer from its first byte and stores the
/// rest; a read continues from the pointer.
#[derive(Debug)]
pub struct MockI2c {
    devices: Vec<(u8, RegisterFile), MAX_DEVICES>,
    faults: Faults,
    calls: usize,
    log: Vec<Op, LOG_LEN>,
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2c {
    /// Bus with no devices attached
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            faults: Faults::default(),
            calls: 0,
            log: Vec::new(),
        }
    }

    /// Bus with one device at `address`
    pub fn with_device(address: u8) -> Self {
        let mut bus = Self::new();
        bus.attach(address);
        bus
    }

    /// Attach another device; ignored once [`MAX_DEVICES`] are present
    pub fn attach(&mut self, address: u8) {
        if self.device(address).is_none() {
            let _ = self.devices.push((address, RegisterFile::new()));
        }
    }

    fn device(&mut self, address: u8) -> Option<&mut RegisterFile> {
        self.devices
            .iter_mut()
            .find(|(a, _)| *a == address)
            .map(|(_, file)| file)
    }

    /// Preload registers starting at `reg`
    pub fn set_registers(&mut self, address: u8, reg: u8, values: &[u8]) {
        if let Some(file) = self.device(address) {
            for (i, &value) in values.iter().enumerate() {
                file.registers[reg.wrapping_add(i as u8) as usize] = value;
            }
        }
    }

    /// Preload one register
    pub fn set_register(&mut self, address: u8, reg: u8, value: u8) {
        self.set_registers(address, reg, &[value]);
    }

    /// Current value of a register
    pub fn register(&mut self, address: u8, reg: u8) -> Option<u8> {
        self.device(address).map(|file| file.registers[reg as usize])
    }

    /// Fail the next `count` calls with [`MockError::Bus`]
    pub fn fail_next(&mut self, count: usize) {
        self.faults.fail_next = count;
    }

    /// Report one byte short on the next `count` calls
    pub fn short_next(&mut self, count: usize) {
        self.faults.short_next = count;
    }

    /// Total calls made, including failed ones
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Recorded operations (oldest first, capped at [`LOG_LEN`])
    pub fn log(&self) -> &[Op] {
        &self.log
    }

    /// Forget recorded operations
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.calls = 0;
    }

    fn record(&mut self, op: Op) {
        self.calls += 1;
        let _ = self.log.push(op);
    }
}

impl I2cBus for MockI2c {
    type Error = MockError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, Self::Error> {
        self.record(Op::Write {
            address,
            data: log_bytes(data),
        });
        let moved = self.faults.apply(data.len())?;
        let file = self.device(address).ok_or(MockError::Nack)?;
        if moved == data.len() {
            file.write(data);
        }
        Ok(moved)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.record(Op::Read {
            address,
            len: buf.len(),
        });
        let moved = self.faults.apply(buf.len())?;
        let file = self.device(address).ok_or(MockError::Nack)?;
        file.read(buf);
        Ok(moved)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.record(Op::WriteRead {
            address,
            data: log_bytes(write_data),
            len: read_buf.len(),
        });
        let moved = self.faults.apply(write_data.len() + read_buf.len())?;
        let file = self.device(address).ok_or(MockError::Nack)?;
        file.write(write_data);
        file.read(read_buf);
        Ok(moved)
    }
}

/// Emulated SPI device with a register file
///
/// The first byte of each frame is the register address; bits outside
/// `address_mask` (read/write/multi-byte flags) are stripped before the
/// lookup. Raw frames are logged unmodified.
#[derive(Debug)]
pub struct MockSpi {
    file: RegisterFile,
    address_mask: u8,
    faults: Faults,
    calls: usize,
    writes: Vec<Vec<u8, LOG_DATA_LEN>, LOG_LEN>,
}

impl Default for MockSpi {
    fn default() -> Self {
        Self::new(0xFF)
    }
}

impl MockSpi {
    /// Device whose register addresses occupy `address_mask`
    pub fn new(address_mask: u8) -> Self {
        Self {
            file: RegisterFile::new(),
            address_mask,
            faults: Faults::default(),
            calls: 0,
            writes: Vec::new(),
        }
    }

    /// Preload registers starting at `reg`
    pub fn set_registers(&mut self, reg: u8, values: &[u8]) {
        for (i, &value) in values.iter().enumerate() {
            self.file.registers[reg.wrapping_add(i as u8) as usize] = value;
        }
    }

    /// Current value of a register
    pub fn register(&self, reg: u8) -> u8 {
        self.file.registers[reg as usize]
    }

    /// Fail the next `count` calls with [`MockError::Bus`]
    pub fn fail_next(&mut self, count: usize) {
        self.faults.fail_next = count;
    }

    /// Report one byte short on the next `count` calls
    pub fn short_next(&mut self, count: usize) {
        self.faults.short_next = count;
    }

    /// Total calls made, including failed ones
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Raw bytes of each write phase, oldest first
    pub fn writes(&self) -> &[Vec<u8, LOG_DATA_LEN>] {
        &self.writes
    }

    fn record(&mut self, data: &[u8]) {
        self.calls += 1;
        let _ = self.writes.push(log_bytes(data));
    }

    fn frame_write(&mut self, data: &[u8]) {
        let Some((&reg, payload)) = data.split_first() else {
            return;
        };
        self.file.pointer = reg & self.address_mask;
        for &byte in payload {
            self.file.registers[self.file.pointer as usize] = byte;
            self.file.pointer = self.file.pointer.wrapping_add(1);
        }
    }
}

impl SpiBus for MockSpi {
    type Error = MockError;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, Self::Error> {
        self.record(write);
        let moved = self.faults.apply(read.len().max(write.len()))?;
        // Shift-register style: what comes back is what was last latched
        for (i, byte) in read.iter_mut().enumerate() {
            *byte = self.file.registers[i];
        }
        for (i, &byte) in write.iter().enumerate() {
            self.file.registers[i] = byte;
        }
        Ok(moved)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.record(data);
        let moved = self.faults.apply(data.len())?;
        if moved == data.len() {
            self.frame_write(data);
        }
        Ok(moved)
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<usize, Self::Error> {
        self.record(write);
        let moved = self.faults.apply(write.len() + read.len())?;
        self.frame_write(write);
        self.file.read(read);
        Ok(moved)
    }
}

/// Output pin that remembers its level and counts writes
#[derive(Debug, Default)]
pub struct MockOutputPin {
    /// Current driven level
    pub high: bool,
    /// Number of `set_level` calls
    pub writes: usize,
    /// Fail every write when set
    pub broken: bool,
}

impl MockOutputPin {
    /// Pin starting low
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputPin for MockOutputPin {
    type Error = MockError;

    fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
        if self.broken {
            return Err(MockError::Bus);
        }
        self.high = high;
        self.writes += 1;
        Ok(())
    }
}

/// Input pin whose level is driven by the test through a shared cell
///
/// `wait_for_edge` resolves immediately, as if the interrupt had already
/// been latched; the test changes the level before awaiting.
#[derive(Debug, Clone, Copy)]
pub struct MockInputPin<'a> {
    level: &'a Cell<bool>,
    reads: &'a Cell<usize>,
    pull: Pull,
}

impl<'a> MockInputPin<'a> {
    /// Pin reading `level`, counting samples in `reads`
    pub fn new(level: &'a Cell<bool>, reads: &'a Cell<usize>) -> Self {
        Self {
            level,
            reads,
            pull: Pull::None,
        }
    }

    /// Pull resistor last selected
    pub fn pull(&self) -> Pull {
        self.pull
    }
}

impl InputPin for MockInputPin<'_> {
    type Error = MockError;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.level.get())
    }
}

impl ConfigurePull for MockInputPin<'_> {
    fn set_pull(&mut self, pull: Pull) -> Result<(), Self::Error> {
        self.pull = pull;
        Ok(())
    }
}

impl EdgeWait for MockInputPin<'_> {
    async fn wait_for_edge(&mut self, _edge: Edge) -> Result<(), Self::Error> {
        Ok(())
    }
}
