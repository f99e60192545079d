// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! `log` backend on the debug USART.
//!
//! Records are written as `LEVEL [ms] target - message` with CRLF endings. Output blocks inside a
//! critical section, so keep `trace!` out of interrupt handlers.

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::interrupt::{self, Mutex};
use log::{LevelFilter, Log, Metadata, Record};
use stm32f7xx_hal::pac::USART1;

use super::{clock, Usart};

static PORT: Mutex<RefCell<Option<Usart<USART1>>>> = Mutex::new(RefCell::new(None));

struct UsartLogger;

static LOGGER: UsartLogger = UsartLogger;

impl Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            if let Some(port) = PORT.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(
                    port,
                    "{:<5} [{}] {} - {}\r\n",
                    record.level(),
                    clock::now_ms(),
                    record.target(),
                    record.args()
                );
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(port) = PORT.borrow(cs).borrow_mut().as_mut() {
                port.flush();
            }
        });
    }
}

/// Install the logger. Calling this twice keeps the first port.
pub fn init(port: Usart<USART1>, level: LevelFilter) {
    interrupt::free(|cs| {
        let mut slot = PORT.borrow(cs).borrow_mut();
        if slot.is_none() {
            *slot = Some(port);
        }
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
