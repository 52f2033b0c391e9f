//! Bosch BME280 combined temperature/humidity/pressure sensor.
//!
//! Compensation follows the floating point formulas of the datasheet
//! (section 8.1). Only the I2C transport depends on the `hardware` feature.

#![cfg_attr(not(feature = "hardware"), allow(dead_code))]

use crate::errors::SensorError;
use crate::models::Measurement;

const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_H1: u8 = 0xA1;
const REG_CALIB_26: u8 = 0xE1;
const REG_CHIP_ID: u8 = 0xD0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
/// Humidity oversampling x1
const CTRL_HUM_X1: u8 = 0x01;
/// Temperature x1, pressure x1, forced mode
const CTRL_MEAS_FORCED: u8 = (0b001 << 5) | (0b001 << 2) | 0b01;
const STATUS_MEASURING: u8 = 0x08;

/// Factory trimming parameters read once at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Decodes the 0x88..0x9F block, register 0xA1 and the 0xE1..0xE7 block.
    pub fn from_registers(block_a: &[u8; 24], h1: u8, block_b: &[u8; 7]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([block_a[i], block_a[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([block_a[i], block_a[i + 1]]);

        Self {
            t1: u16_at(0),
            t2: i16_at(2),
            t3: i16_at(4),
            p1: u16_at(6),
            p2: i16_at(8),
            p3: i16_at(10),
            p4: i16_at(12),
            p5: i16_at(14),
            p6: i16_at(16),
            p7: i16_at(18),
            p8: i16_at(20),
            p9: i16_at(22),
            h1,
            h2: i16::from_le_bytes([block_b[0], block_b[1]]),
            h3: block_b[2],
            // H4 and H5 are 12-bit values sharing register 0xE5
            h4: (i16::from(block_b[3] as i8) << 4) | i16::from(block_b[4] & 0x0F),
            h5: (i16::from(block_b[5] as i8) << 4) | i16::from(block_b[4] >> 4),
            h6: block_b[6] as i8,
        }
    }

    /// Returns the temperature in Celsius and the `t_fine` carry value.
    pub fn compensate_temperature(&self, adc_t: i32) -> (f64, f64) {
        let adc_t = f64::from(adc_t);
        let t1 = f64::from(self.t1);

        let var1 = (adc_t / 16384.0 - t1 / 1024.0) * f64::from(self.t2);
        let var2 = (adc_t / 131072.0 - t1 / 8192.0).powi(2) * f64::from(self.t3);
        let t_fine = var1 + var2;

        (t_fine / 5120.0, t_fine)
    }

    /// Returns the pressure in hPa, or `None` when the trimming makes it undefined.
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: f64) -> Option<f64> {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f64::from(self.p6) / 32768.0;
        var2 += var1 * f64::from(self.p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(self.p4) * 65536.0;
        var1 = (f64::from(self.p3) * var1 * var1 / 524288.0 + f64::from(self.p2) * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(self.p1);

        if var1 == 0.0 {
            return None;
        }

        let mut pressure = 1048576.0 - f64::from(adc_p);
        pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;
        var1 = f64::from(self.p9) * pressure * pressure / 2147483648.0;
        var2 = pressure * f64::from(self.p8) / 32768.0;
        pressure += (var1 + var2 + f64::from(self.p7)) / 16.0;

        Some(pressure / 100.0)
    }

    /// Returns the relative humidity in percent, clamped to 0..=100.
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: f64) -> f64 {
        let mut humidity = t_fine - 76800.0;
        humidity = (f64::from(adc_h)
            - (f64::from(self.h4) * 64.0 + f64::from(self.h5) / 16384.0 * humidity))
            * (f64::from(self.h2) / 65536.0
                * (1.0
                    + f64::from(self.h6) / 67108864.0
                        * humidity
                        * (1.0 + f64::from(self.h3) / 67108864.0 * humidity)));
        humidity *= 1.0 - f64::from(self.h1) * humidity / 524288.0;

        humidity.clamp(0.0, 100.0)
    }

    /// Converts the raw 0xF7..0xFE burst into a measurement.
    pub fn measurement(&self, data: &[u8; 8]) -> Result<Measurement, SensorError> {
        let adc_p = (i32::from(data[0]) << 12) | (i32::from(data[1]) << 4) | (i32::from(data[2]) >> 4);
        let adc_t = (i32::from(data[3]) << 12) | (i32::from(data[4]) << 4) | (i32::from(data[5]) >> 4);
        let adc_h = (i32::from(data[6]) << 8) | i32::from(data[7]);

        // 0x80000 is what the chip reports for a skipped measurement
        if adc_t == 0x80000 || adc_p == 0x80000 {
            return Err(SensorError::InvalidData("measurement skipped".into()));
        }

        let (temperature, t_fine) = self.compensate_temperature(adc_t);
        let pressure = self
            .compensate_pressure(adc_p, t_fine)
            .ok_or_else(|| SensorError::InvalidData("pressure trimming is zero".into()))?;
        let humidity = self.compensate_humidity(adc_h, t_fine);

        if !temperature.is_finite() || !pressure.is_finite() {
            return Err(SensorError::InvalidData("non-finite compensation".into()));
        }

        Ok(Measurement {
            temperature,
            humidity,
            pressure,
        })
    }
}

#[cfg(feature = "hardware")]
pub use device::Bme280Sensor;

#[cfg(feature = "hardware")]
mod device {
    use std::time::Duration;

    use async_trait::async_trait;
    use rppal::i2c::I2c;

    use super::*;
    use crate::services::sensor::Sensor;

    pub struct Bme280Sensor {
        i2c: I2c,
        calibration: Calibration,
    }

    fn bus_error(error: rppal::i2c::Error) -> SensorError {
        SensorError::Communication(error.to_string())
    }

    impl Bme280Sensor {
        /// Opens the bus, checks the chip id and loads the trimming parameters.
        pub fn open(bus: u8, address: u16) -> Result<Self, SensorError> {
            let mut i2c = I2c::with_bus(bus).map_err(bus_error)?;
            i2c.set_slave_address(address).map_err(bus_error)?;

            let mut chip_id = [0u8; 1];
            i2c.write_read(&[REG_CHIP_ID], &mut chip_id).map_err(bus_error)?;
            if chip_id[0] != CHIP_ID {
                return Err(SensorError::InvalidData(format!(
                    "unexpected chip id 0x{:02x}",
                    chip_id[0]
                )));
            }

            let mut block_a = [0u8; 24];
            let mut h1 = [0u8; 1];
            let mut block_b = [0u8; 7];
            i2c.write_read(&[REG_CALIB_00], &mut block_a).map_err(bus_error)?;
            i2c.write_read(&[REG_CALIB_H1], &mut h1).map_err(bus_error)?;
            i2c.write_read(&[REG_CALIB_26], &mut block_b).map_err(bus_error)?;

            let calibration = Calibration::from_registers(&block_a, h1[0], &block_b);
            tracing::info!("BME280 ready on i2c-{} at 0x{:02x}", bus, address);

            Ok(Self { i2c, calibration })
        }

        fn is_measuring(&mut self) -> Result<bool, SensorError> {
            let mut status = [0u8; 1];
            self.i2c
                .write_read(&[REG_STATUS], &mut status)
                .map_err(bus_error)?;

            Ok(status[0] & STATUS_MEASURING != 0)
        }
    }

    #[async_trait]
    impl Sensor for Bme280Sensor {
        fn name(&self) -> &'static str {
            "bme280"
        }

        async fn read(&mut self) -> Result<Measurement, SensorError> {
            // ctrl_hum only takes effect after a write to ctrl_meas
            self.i2c
                .write(&[REG_CTRL_HUM, CTRL_HUM_X1])
                .map_err(bus_error)?;
            self.i2c
                .write(&[REG_CTRL_MEAS, CTRL_MEAS_FORCED])
                .map_err(bus_error)?;

            let mut polls = 0;
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if !self.is_measuring()? {
                    break;
                }
                polls += 1;
                if polls > 20 {
                    return Err(SensorError::Timeout);
                }
            }

            let mut data = [0u8; 8];
            self.i2c
                .write_read(&[REG_DATA], &mut data)
                .map_err(bus_error)?;

            self.calibration.measurement(&data)
        }
    }
}
