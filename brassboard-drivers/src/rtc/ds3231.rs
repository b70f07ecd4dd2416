//! Maxim DS3231 real-time clock
//!
//! Time is kept in seven BCD registers starting at 0x00. The on-die
//! temperature sensor used for crystal compensation is exposed as a
//! polled [`Sensor`] with 0.25 °C resolution.

use brassboard_core::bus::CommunicationBus;
use brassboard_core::error::{ArgumentError, DeviceError, Error};
use brassboard_core::reading::{ChangeThreshold, Changes, Quantity, Reading};
use brassboard_core::traits::Sensor;

/// Fixed I2C address
pub const ADDRESS: u8 = 0x68;

const REG_SECONDS: u8 = 0x00;
const REG_STATUS: u8 = 0x0F;
const REG_TEMP_MSB: u8 = 0x11;

const HOUR_12H: u8 = 1 << 6;
const HOUR_PM: u8 = 1 << 5;
const MONTH_CENTURY: u8 = 1 << 7;
const STATUS_OSF: u8 = 1 << 7;

/// Calendar date and time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// 2000..=2199
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// 1..=31, bounded by the month
    pub day: u8,
    /// 1..=7, meaning is up to the application
    pub weekday: u8,
    /// 0..=23
    pub hour: u8,
    /// 0..=59
    pub minute: u8,
    /// 0..=59
    pub second: u8,
}

impl DateTime {
    /// Check every field against the calendar the clock can hold
    pub fn is_valid(&self) -> bool {
        (2000..=2199).contains(&self.year)
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && (1..=7).contains(&self.weekday)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Decode a packed BCD byte
pub fn from_bcd(value: u8) -> Result<u8, DeviceError> {
    let (tens, units) = (value >> 4, value & 0x0F);
    if tens > 9 || units > 9 {
        return Err(DeviceError::InvalidData);
    }
    Ok(tens * 10 + units)
}

/// Encode 0..=99 as packed BCD
pub fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

fn decode_hour(raw: u8) -> Result<u8, DeviceError> {
    if raw & HOUR_12H == 0 {
        return from_bcd(raw & 0x3F);
    }
    let hour = from_bcd(raw & 0x1F)?;
    if !(1..=12).contains(&hour) {
        return Err(DeviceError::InvalidData);
    }
    let pm = raw & HOUR_PM != 0;
    Ok(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    })
}

/// Date/time from the seven timekeeping registers
pub fn decode_datetime(regs: [u8; 7]) -> Result<DateTime, DeviceError> {
    let century = if regs[5] & MONTH_CENTURY != 0 { 100 } else { 0 };
    let datetime = DateTime {
        second: from_bcd(regs[0] & 0x7F)?,
        minute: from_bcd(regs[1] & 0x7F)?,
        hour: decode_hour(regs[2])?,
        weekday: regs[3] & 0x07,
        day: from_bcd(regs[4] & 0x3F)?,
        month: from_bcd(regs[5] & 0x1F)?,
        year: 2000 + century + from_bcd(regs[6])? as u16,
    };
    if !datetime.is_valid() {
        return Err(DeviceError::InvalidData);
    }
    Ok(datetime)
}

/// Timekeeping registers for `datetime`, always in 24-hour mode
pub fn encode_datetime(datetime: &DateTime) -> Result<[u8; 7], ArgumentError> {
    if !datetime.is_valid() {
        return Err(ArgumentError::ValueOutOfRange);
    }
    let years = datetime.year - 2000;
    let century = if years >= 100 { MONTH_CENTURY } else { 0 };
    Ok([
        to_bcd(datetime.second),
        to_bcd(datetime.minute),
        to_bcd(datetime.hour),
        datetime.weekday,
        to_bcd(datetime.day),
        to_bcd(datetime.month) | century,
        to_bcd((years % 100) as u8),
    ])
}

/// Temperature in °C from the two temperature registers
pub fn decode_temperature(msb: u8, lsb: u8) -> f32 {
    msb as i8 as f32 + (lsb >> 6) as f32 * 0.25
}

/// DS3231 driver
pub struct Ds3231<B> {
    bus: B,
    temperature: Reading,
}

impl<B: CommunicationBus> Ds3231<B> {
    /// Create a driver; the device has no identity register to check
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            temperature: Reading::new(Quantity::Temperature, ChangeThreshold::ZERO),
        }
    }

    /// Change threshold in °C
    pub fn with_threshold(mut self, threshold: ChangeThreshold) -> Self {
        self.temperature.set_threshold(threshold);
        self
    }

    /// Read the current date and time
    pub fn datetime(&mut self) -> Result<DateTime, Error<B::Error>> {
        let regs = self.bus.read_array::<7>(REG_SECONDS)?;
        Ok(decode_datetime(regs)?)
    }

    /// Set the clock
    ///
    /// Rejects dates outside 2000..=2199 and impossible calendar days.
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Error<B::Error>> {
        let regs = encode_datetime(datetime)?;
        self.bus.write_registers(REG_SECONDS, &regs)
    }

    /// Whether the oscillator stopped since the flag was last cleared
    pub fn lost_power(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(self.bus.read_register(REG_STATUS)? & STATUS_OSF != 0)
    }

    /// Clear the oscillator-stop flag
    pub fn clear_lost_power(&mut self) -> Result<(), Error<B::Error>> {
        self.bus.update_register(REG_STATUS, STATUS_OSF, 0)
    }

    /// Last committed temperature (°C)
    pub fn temperature(&self) -> Option<f32> {
        self.temperature.value()
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: CommunicationBus> Sensor for Ds3231<B> {
    type Error = Error<B::Error>;

    fn update(&mut self) -> Result<Changes, Self::Error> {
        let [msb, lsb] = self.bus.read_array::<2>(REG_TEMP_MSB)?;
        let temperature = decode_temperature(msb, lsb);

        let mut changes = Changes::new();
        self.temperature.commit_into(temperature, &mut changes);
        Ok(changes)
    }
}
