// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 balancing robot board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpioc, gpiod, gpioe, Alternate, Input, Output, PullDown, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
    pub usart3: Usart3Pins,
    pub spi4: Spi4Pins,
    pub left: StepperPins<'D', 12, 13>,
    pub right: StepperPins<'D', 14, 15>,
    pub stepper_enable: gpioa::PA3<Output<PushPull>>,
    pub buzzer: gpioc::PC6<Output<PushPull>>,
    pub ultrasonic: UltrasonicPins,
}

pub struct LedPins {
    pub red: gpiod::PD8<Output<PushPull>>,
    pub yellow: gpiod::PD9<Output<PushPull>>,
    pub green: gpiod::PD10<Output<PushPull>>,
}

/// Debug terminal and log output.
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// Remote command link.
pub struct Usart3Pins {
    pub tx: gpiob::PB10<Alternate<7>>,
    pub rx: gpiob::PB11<Alternate<7>>,
}

/// SPI4 SCK/MISO/MOSI and IMU chip select
pub struct Spi4Pins {
    pub sck: gpioe::PE12<Alternate<5>>,
    pub miso: gpioe::PE13<Alternate<5>>,
    pub mosi: gpioe::PE14<Alternate<5>>,
    pub imu_cs: gpioe::PE4<Output<PushPull>>,
}

/// STEP and DIR lines of one stepper driver, both on the same port.
pub struct StepperPins<const P: char, const STEP: u8, const DIR: u8> {
    pub step: stm32f7xx_hal::gpio::Pin<P, STEP, Output<PushPull>>,
    pub dir: stm32f7xx_hal::gpio::Pin<P, DIR, Output<PushPull>>,
}

pub struct UltrasonicPins {
    pub trig: gpiob::PB0<Output<PushPull>>,
    pub echo: gpiob::PB1<Input<PullDown>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(
        gpioa: pac::GPIOA,
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
    ) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();

        Self {
            leds: LedPins {
                red: gpiod.pd8.into_push_pull_output(),
                yellow: gpiod.pd9.into_push_pull_output(),
                green: gpiod.pd10.into_push_pull_output(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            usart3: Usart3Pins {
                tx: gpiob.pb10.into_alternate::<7>(),
                rx: gpiob.pb11.into_alternate::<7>(),
            },

            spi4: Spi4Pins {
                sck: gpioe.pe12.into_alternate::<5>(),
                miso: gpioe.pe13.into_alternate::<5>(),
                mosi: gpioe.pe14.into_alternate::<5>(),
                imu_cs: gpioe.pe4.into_push_pull_output(),
            },

            left: StepperPins {
                step: gpiod.pd12.into_push_pull_output(),
                dir: gpiod.pd13.into_push_pull_output(),
            },

            right: StepperPins {
                step: gpiod.pd14.into_push_pull_output(),
                dir: gpiod.pd15.into_push_pull_output(),
            },

            stepper_enable: gpioa.pa3.into_push_pull_output(),

            buzzer: gpioc.pc6.into_push_pull_output(),

            ultrasonic: UltrasonicPins {
                trig: gpiob.pb0.into_push_pull_output(),
                echo: gpiob.pb1.into_pull_down_input(),
            },
        }
    }
}
