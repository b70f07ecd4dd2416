//! End-to-end bus scenarios against the mock transports

use brassboard_core::bus::{check_identity, CommunicationBus, I2cDevice, SharedBus, MAX_REGISTER_WRITE};
use brassboard_core::error::{DeviceError, Error, TransferError, TransferFault};
use brassboard_core::reading::{ChangeThreshold, Quantity, Reading};
use brassboard_core::retry::RetryPolicy;
use brassboard_hal::i2c::I2cConfig;
use brassboard_hal::mock::{MockError, MockI2c, Op};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use proptest::prelude::*;

const ADDRESS: u8 = 0x40;

fn device(mock: &mut MockI2c) -> I2cDevice<&mut MockI2c> {
    I2cDevice::new(mock, ADDRESS, I2cConfig::from_khz(100)).unwrap()
}

#[test]
fn test_humidity_measurement_sequence() {
    let mut mock = MockI2c::with_device(ADDRESS);
    mock.set_registers(ADDRESS, 0x01, &[0x19, 0x00]);

    let mut dev = device(&mut mock);
    dev.write_byte(0x00).unwrap();
    let raw = dev.read_u16_be(0x01).unwrap() & 0x3FFF;
    let humidity = 100.0 * raw as f32 / 16383.0;

    assert_eq!(raw, 0x1900);
    assert!((humidity - 39.06).abs() < 0.01, "humidity = {}", humidity);

    let mut reading = Reading::new(Quantity::Humidity, ChangeThreshold::new(1.0).unwrap());
    assert!(reading.commit(humidity).is_some());
    assert!(reading.commit(humidity).is_none());
}

#[test]
fn test_identity_mismatch() {
    let mut mock = MockI2c::with_device(ADDRESS);
    mock.set_register(ADDRESS, 0x00, 0x41);

    let result = check_identity(&mut device(&mut mock), 0x00, 0x40);
    assert_eq!(
        result,
        Err(Error::Device(DeviceError::UnexpectedId {
            register: 0x00,
            expected: 0x40,
            found: 0x41,
        }))
    );
}

#[test]
fn test_retry_through_shared_bus() {
    let mut mock = MockI2c::with_device(ADDRESS);
    mock.set_register(ADDRESS, 0x10, 0x7E);
    mock.fail_next(2);
    let shared: SharedBus<NoopRawMutex, _> = SharedBus::new(mock);

    let mut dev = I2cDevice::new(shared.handle(), ADDRESS, I2cConfig::STANDARD).unwrap();
    assert_eq!(dev.read_register(0x10).unwrap(), 0x7E);

    let mut strict = I2cDevice::new(shared.handle(), ADDRESS, I2cConfig::STANDARD)
        .unwrap()
        .with_retry(RetryPolicy::NONE)
        .unwrap();
    shared.with(|bus| bus.fail_next(1));
    assert_eq!(
        strict.read_register(0x10),
        Err(Error::Transfer(TransferError {
            attempts: 1,
            last: TransferFault::Bus(MockError::Bus),
        }))
    );

    assert_eq!(shared.into_inner().calls(), 4);
}

proptest! {
    #[test]
    fn prop_register_write_is_unmodified(
        register in any::<u8>(),
        payload in proptest::collection::vec(any::<u8>(), 1..=MAX_REGISTER_WRITE),
    ) {
        let mut mock = MockI2c::with_device(ADDRESS);
        device(&mut mock).write_registers(register, &payload).unwrap();

        if let Op::Write { data, .. } = &mock.log()[0] {
            prop_assert_eq!(data[0], register);
            prop_assert_eq!(&data[1..], &payload[..data.len() - 1]);
        } else {
            prop_assert!(false, "expected a write");
        }
        for (i, value) in payload.iter().enumerate() {
            let stored = mock.register(ADDRESS, register.wrapping_add(i as u8));
            prop_assert_eq!(stored, Some(*value));
        }
    }

    #[test]
    fn prop_read_registers_matches_write_read(
        register in any::<u8>(),
        contents in proptest::collection::vec(any::<u8>(), 1..=64),
    ) {
        let mut mock = MockI2c::with_device(ADDRESS);
        mock.set_registers(ADDRESS, register, &contents);
        let mut dev = device(&mut mock);

        let mut by_register = vec![0u8; contents.len()];
        dev.read_registers(register, &mut by_register).unwrap();

        let mut by_write_read = vec![0u8; contents.len()];
        dev.write_read(&[register], &mut by_write_read).unwrap();

        prop_assert_eq!(&by_register, &contents);
        prop_assert_eq!(by_register, by_write_read);
    }

    #[test]
    fn prop_failures_below_bound_recover(failures in 0usize..6, attempts in 1u8..6) {
        let mut mock = MockI2c::with_device(ADDRESS);
        mock.set_register(ADDRESS, 0x00, 0xA5);
        mock.fail_next(failures);

        let mut dev = device(&mut mock)
            .with_retry(RetryPolicy::attempts(attempts))
            .unwrap();
        let mut buf = [0xFFu8; 1];
        let result = dev.read_registers(0x00, &mut buf);

        if failures < attempts as usize {
            prop_assert!(result.is_ok());
            prop_assert_eq!(buf, [0xA5]);
        } else {
            prop_assert!(result.unwrap_err().is_transfer());
            prop_assert_eq!(buf, [0x00]);
        }
    }
}
