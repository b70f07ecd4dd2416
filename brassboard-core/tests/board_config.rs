//! Board configuration loaded from TOML

use brassboard_core::bus::RegisterFlags;
use brassboard_core::config::BoardConfig;
use brassboard_core::poll::FailurePolicy;
use brassboard_core::retry::RetryPolicy;
use brassboard_hal::gpio::Pull;
use brassboard_hal::i2c::I2cConfig;

const BOARD: &str = r#"
    [[i2c]]
    name = "humidity"
    threshold = 0.5
    device = { address = 0x27, bus = { frequency = 400000 }, retry = { max_attempts = 4 } }
    poll = { period_ms = 250 }

    [[i2c]]
    name = "temperature"
    device = { address = 0x48 }

    [[spi]]
    name = "accel"
    chip_select = { pin = 9, inverted = true }
    device = { bus = { frequency = 5000000, mode = "Mode3" }, registers = { read = 0x80, multi = 0x40 } }

    [[pins]]
    name = "button"
    pin = { pin = 2, pull = "Up" }
"#;

#[test]
fn test_board_from_toml() {
    let board: BoardConfig = toml::from_str(BOARD).unwrap();
    assert!(board.validate().is_ok());

    let humidity = board.find_i2c("humidity").unwrap();
    assert_eq!(humidity.device.address, 0x27);
    assert_eq!(humidity.device.bus, I2cConfig::FAST);
    assert_eq!(humidity.device.retry.max_attempts, 4);
    assert_eq!(humidity.threshold, 0.5);

    let poll = humidity.poll.unwrap();
    assert_eq!(poll.period_ms, 250);
    assert_eq!(poll.on_failure, FailurePolicy::default());

    let temperature = board.find_i2c("temperature").unwrap();
    assert_eq!(temperature.device.retry, RetryPolicy::default());
    assert!(temperature.poll.is_none());

    let accel = board.find_spi("accel").unwrap();
    assert_eq!(accel.device.registers, RegisterFlags::READ_HIGH_MULTI);
    assert!(accel.chip_select.inverted);

    let button = board.find_pin("button").unwrap();
    assert_eq!(button.pin.pull, Pull::Up);
    assert!(!button.pin.inverted);
}

#[test]
fn test_duplicate_pin_rejected_after_load() {
    let text = r#"
        [[pins]]
        name = "led"
        pin = { pin = 4 }

        [[pins]]
        name = "button"
        pin = { pin = 4, pull = "Up" }
    "#;

    let board: BoardConfig = toml::from_str(text).unwrap();
    assert!(board.validate().is_err());
}
