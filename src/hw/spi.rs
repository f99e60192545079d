// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps a configured HAL SPI instance with 8-bit words.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//! - `SpiDevice` pairs the two for register-mapped parts that take an address byte followed by
//!   data, with bit 7 of the address selecting a read.

use stm32f7xx_hal::{
    gpio::{self, Output, PinState, PushPull},
    prelude::*,
    spi::{self, Enabled, Spi},
};

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct SpiBus<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
}

impl<I, P> SpiBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self { spi }
    }

    /// Perform a blocking, full-duplex transfer of one byte.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, spi::Error> {
        let mut tmp = [byte];
        self.spi.transfer(&mut tmp)?;
        Ok(tmp[0])
    }

    /// Clock out `buf`, replacing each byte with what was clocked in.
    pub fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), spi::Error> {
        for b in buf.iter_mut() {
            *b = self.transfer_byte(*b)?;
        }
        Ok(())
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> ChipSelect<P, N> {
    /// Create an active-low chip select, initially deasserted.
    pub fn active_low<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(PinState::High);
        Self { pin }
    }

    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low();
    }

    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high();
    }
}

/// Address bit that marks a register read.
pub const READ_BIT: u8 = 0x80;

/// One register-mapped device on a bus.
pub struct SpiDevice<I, P, const CS_P: char, const CS_N: u8> {
    bus: SpiBus<I, P>,
    cs: ChipSelect<CS_P, CS_N>,
}

impl<I, P, const CS_P: char, const CS_N: u8> SpiDevice<I, P, CS_P, CS_N>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(bus: SpiBus<I, P>, cs: ChipSelect<CS_P, CS_N>) -> Self {
        Self { bus, cs }
    }

    /// Write one register. CS is released even if the transfer fails.
    pub fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), spi::Error> {
        let mut frame = [addr & !READ_BIT, value];
        self.cs.select();
        let result = self.bus.transfer_in_place(&mut frame);
        self.cs.deselect();
        result
    }

    /// Burst-read consecutive registers starting at `addr`.
    pub fn read_regs(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), spi::Error> {
        buf.iter_mut().for_each(|b| *b = 0);
        self.cs.select();
        let result = self
            .bus
            .transfer_byte(addr | READ_BIT)
            .and_then(|_| self.bus.transfer_in_place(buf));
        self.cs.deselect();
        result
    }

    pub fn free(self) -> (SpiBus<I, P>, ChipSelect<CS_P, CS_N>) {
        (self.bus, self.cs)
    }
}
