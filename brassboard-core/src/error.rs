//! Error taxonomy
//!
//! - [`TransferError`]: the transport did not complete a transaction
//!   within the retry bound. Only the bus layer produces it.
//! - [`DeviceError`]: the device answered, but with data that failed an
//!   identity or status check. Only drivers produce it.
//! - [`ArgumentError`]: invalid configuration, rejected at the call.

use core::fmt;

/// Why a single transport attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferFault<E> {
    /// The transport reported an error
    Bus(E),
    /// The transport moved a different number of bytes than requested
    Short {
        /// Bytes the transaction should have moved
        expected: usize,
        /// Bytes actually moved
        actual: usize,
    },
}

/// Retry bound exceeded on a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferError<E> {
    /// Attempts made before giving up
    pub attempts: u8,
    /// Fault seen on the final attempt
    pub last: TransferFault<E>,
}

/// Device answered with unexpected data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// Identity register did not hold the expected value
    UnexpectedId {
        /// Register that was read
        register: u8,
        /// Value the driver expects
        expected: u8,
        /// Value the device returned
        found: u8,
    },
    /// A status field reported a fault or stale data
    Status(u8),
    /// Decoded value is not a usable number
    InvalidData,
}

/// Invalid configuration or call argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArgumentError {
    /// I2C address does not fit in 7 bits
    AddressOutOfRange(u8),
    /// Bit index outside the register width
    BitOutOfRange {
        /// Requested bit
        bit: u8,
        /// Register width in bits
        width: u8,
    },
    /// Zero-length buffer where data is required
    EmptyBuffer,
    /// Full-duplex buffers of different lengths
    LengthMismatch {
        /// Read buffer length
        read: usize,
        /// Write buffer length
        write: usize,
    },
    /// Payload longer than a single register write supports
    PayloadTooLong {
        /// Requested payload length
        len: usize,
        /// Maximum supported
        max: usize,
    },
    /// Change threshold below zero or NaN
    InvalidThreshold,
    /// Retry bound of zero attempts
    ZeroRetries,
    /// Clock frequency of zero
    ZeroFrequency,
    /// Poll period of zero
    ZeroPeriod,
    /// Pin number beyond what the board provides
    PinOutOfRange(u8),
    /// Pin already owned by another port
    PinInUse(u8),
    /// Output index beyond the device's channel count
    ChannelOutOfRange {
        /// Requested index
        index: usize,
        /// Channel count
        count: usize,
    },
    /// Value outside the range the device can represent
    ValueOutOfRange,
}

/// Errors surfaced by buses, ports and drivers
///
/// `E` is the transport (or pin) error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Transfer failed after exhausting retries
    Transfer(TransferError<E>),
    /// Device identity or status check failed
    Device(DeviceError),
    /// Invalid argument or configuration
    Argument(ArgumentError),
    /// Pin read or write failed
    Pin(E),
}

impl<E> Error<E> {
    /// True for transport-level failures
    pub fn is_transfer(&self) -> bool {
        matches!(self, Error::Transfer(_))
    }

    /// True for device-level failures
    pub fn is_device(&self) -> bool {
        matches!(self, Error::Device(_))
    }

    /// True for argument/configuration failures
    pub fn is_argument(&self) -> bool {
        matches!(self, Error::Argument(_))
    }
}

impl<E> From<TransferError<E>> for Error<E> {
    fn from(e: TransferError<E>) -> Self {
        Error::Transfer(e)
    }
}

impl<E> From<DeviceError> for Error<E> {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

impl<E> From<ArgumentError> for Error<E> {
    fn from(e: ArgumentError) -> Self {
        Error::Argument(e)
    }
}

impl<E: fmt::Debug> fmt::Display for TransferFault<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferFault::Bus(e) => write!(f, "bus error: {:?}", e),
            TransferFault::Short { expected, actual } => {
                write!(f, "short transfer: {} of {} bytes", actual, expected)
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Display for TransferError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer failed after {} attempts ({})", self.attempts, self.last)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::UnexpectedId {
                register,
                expected,
                found,
            } => write!(
                f,
                "register {:#04x} reads {:#04x}, expected {:#04x}",
                register, found, expected
            ),
            DeviceError::Status(status) => write!(f, "device status {:#04x}", status),
            DeviceError::InvalidData => f.write_str("device returned unusable data"),
        }
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::AddressOutOfRange(a) => write!(f, "address {:#04x} is not 7-bit", a),
            ArgumentError::BitOutOfRange { bit, width } => {
                write!(f, "bit {} outside {}-bit register", bit, width)
            }
            ArgumentError::EmptyBuffer => f.write_str("buffer is empty"),
            ArgumentError::LengthMismatch { read, write } => {
                write!(f, "read buffer of {} bytes for {} written", read, write)
            }
            ArgumentError::PayloadTooLong { len, max } => {
                write!(f, "payload of {} bytes exceeds {}", len, max)
            }
            ArgumentError::InvalidThreshold => f.write_str("threshold must be >= 0"),
            ArgumentError::ZeroRetries => f.write_str("retry bound must be at least 1"),
            ArgumentError::ZeroFrequency => f.write_str("frequency must be non-zero"),
            ArgumentError::ZeroPeriod => f.write_str("poll period must be non-zero"),
            ArgumentError::PinOutOfRange(p) => write!(f, "pin {} does not exist", p),
            ArgumentError::PinInUse(p) => write!(f, "pin {} already claimed", p),
            ArgumentError::ChannelOutOfRange { index, count } => {
                write!(f, "channel {} outside 0..{}", index, count)
            }
            ArgumentError::ValueOutOfRange => f.write_str("value out of range"),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transfer(e) => e.fmt(f),
            Error::Device(e) => e.fmt(f),
            Error::Argument(e) => e.fmt(f),
            Error::Pin(e) => write!(f, "pin error: {:?}", e),
        }
    }
}
