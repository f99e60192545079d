// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! InvenSense MPU-6000 6-axis IMU over SPI.
//!
//! Configured for ±2 g and ±250 °/s with the 44 Hz digital low-pass filter. A read is one 14-byte
//! burst from `ACCEL_XOUT_H` (accel XYZ, temperature, gyro XYZ, all big-endian `i16`), converted to
//! m/s² and rad/s.

use crate::sensor::SensorSample;

// Register addresses
pub mod reg {
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const SIGNAL_PATH_RESET: u8 = 0x68;
    pub const USER_CTRL: u8 = 0x6A;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

/// Expected `WHO_AM_I` value.
pub const DEVICE_ID: u8 = 0x68;

pub const BURST_LEN: usize = 14;

const STANDARD_GRAVITY: f32 = 9.806_65;
/// LSB per g at ±2 g.
const ACCEL_LSB_PER_G: f32 = 16_384.0;
/// LSB per °/s at ±250 °/s.
const GYRO_LSB_PER_DPS: f32 = 131.0;
const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/// Convert a raw burst starting at `ACCEL_XOUT_H`.
pub fn decode_burst(raw: &[u8; BURST_LEN]) -> SensorSample {
    let word = |i: usize| i16::from_be_bytes([raw[2 * i], raw[2 * i + 1]]) as f32;
    let accel = |i: usize| word(i) / ACCEL_LSB_PER_G * STANDARD_GRAVITY;
    let gyro = |i: usize| word(i) / GYRO_LSB_PER_DPS * DEG_TO_RAD;

    // Word 3 is temperature.
    SensorSample::new([accel(0), accel(1), accel(2)], [gyro(4), gyro(5), gyro(6)])
}

#[cfg(target_os = "none")]
pub use device::Mpu6000;

#[cfg(target_os = "none")]
mod device {
    use super::*;

    use stm32f7xx_hal::spi;

    use crate::hw::SpiDevice;
    use crate::sensor::{Imu, SensorError};

    impl From<spi::Error> for SensorError {
        fn from(_: spi::Error) -> Self {
            SensorError::Bus
        }
    }

    pub struct Mpu6000<I, P, const CS_P: char, const CS_N: u8> {
        dev: SpiDevice<I, P, CS_P, CS_N>,
    }

    impl<I, P, const CS_P: char, const CS_N: u8> Mpu6000<I, P, CS_P, CS_N>
    where
        I: spi::Instance,
        P: spi::Pins<I>,
    {
        pub fn new(dev: SpiDevice<I, P, CS_P, CS_N>) -> Self {
            Self { dev }
        }

        fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), SensorError> {
            Ok(self.dev.write_reg(addr, value)?)
        }

        fn read_regs(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), SensorError> {
            Ok(self.dev.read_regs(addr, buf)?)
        }

        pub fn who_am_i(&mut self) -> Result<u8, SensorError> {
            let mut id = [0u8];
            self.read_regs(reg::WHO_AM_I, &mut id)?;
            Ok(id[0])
        }

        /// Reset and configure. `delay_ms` is called for the datasheet reset waits.
        pub fn init(&mut self, mut delay_ms: impl FnMut(u32)) -> Result<(), SensorError> {
            self.write_reg(reg::PWR_MGMT_1, 0x80)?;
            delay_ms(100);
            self.write_reg(reg::SIGNAL_PATH_RESET, 0x07)?;
            delay_ms(100);

            // Clock from gyro X PLL, SPI only.
            self.write_reg(reg::PWR_MGMT_1, 0x01)?;
            self.write_reg(reg::USER_CTRL, 0x10)?;

            if self.who_am_i()? != DEVICE_ID {
                return Err(SensorError::IdentityMismatch);
            }

            self.write_reg(reg::CONFIG, 0x03)?;
            self.write_reg(reg::GYRO_CONFIG, 0x00)?;
            self.write_reg(reg::ACCEL_CONFIG, 0x00)?;
            Ok(())
        }

        pub fn free(self) -> SpiDevice<I, P, CS_P, CS_N> {
            self.dev
        }
    }

    impl<I, P, const CS_P: char, const CS_N: u8> Imu for Mpu6000<I, P, CS_P, CS_N>
    where
        I: spi::Instance,
        P: spi::Pins<I>,
    {
        fn read(&mut self) -> Result<SensorSample, SensorError> {
            let mut raw = [0u8; BURST_LEN];
            self.read_regs(reg::ACCEL_XOUT_H, &mut raw)?;
            let sample = decode_burst(&raw);
            if sample.has_nan() {
                return Err(SensorError::NotANumber);
            }
            Ok(sample)
        }
    }
}
