//! [`RegisterBus`] over any blocking `embedded-hal` I2C controller.
//!
//! On target the controller is `esp_idf_hal::i2c::I2cDriver`; on the host
//! the integration tests plug in a mock.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::app::ports::RegisterBus;
use crate::error::BusFault;

/// Longest register write the gauge accepts (base rainfall, 2 bytes),
/// plus the register address byte and headroom.
const MAX_WRITE_LEN: usize = 8;

pub struct I2cRegisterBus<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> I2cRegisterBus<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterBus for I2cRegisterBus<I> {
    fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        self.i2c
            .write_read(self.address, &[register], buf)
            .map_err(|e| BusFault::read(register, e.kind()))
    }

    fn write_bytes(&mut self, register: u8, data: &[u8]) -> Result<(), BusFault> {
        let mut frame: heapless::Vec<u8, MAX_WRITE_LEN> = heapless::Vec::new();
        if frame.push(register).is_err() || frame.extend_from_slice(data).is_err() {
            return Err(BusFault::write(register, ErrorKind::Overrun));
        }
        self.i2c
            .write(self.address, &frame)
            .map_err(|e| BusFault::write(register, e.kind()))
    }
}
