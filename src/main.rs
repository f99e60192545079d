// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Firmware entry point.
//!
//! Two contexts share the board:
//!
//! - The TIM2 update interrupt at 50 kHz steps both wheels, clocks the buzzer and polls the
//!   ultrasonic ranger. It reads wheel commands from [`SHARED_COMMANDS`] and never blocks.
//! - The main loop runs [`Balancer::poll`] against the SysTick millisecond clock and feeds bytes
//!   from the command link into the parser.

#![cfg_attr(target_os = "none", no_std, no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::cell::RefCell;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m::interrupt::{free, Mutex};
    use cortex_m::peripheral::NVIC;
    use cortex_m_rt::{entry, exception};
    use log::{error, info, warn, LevelFilter};
    use panic_halt as _;

    use hal::{
        gpio::{gpiob, gpioc, gpiod, gpioe, Alternate, Input, Output, PullDown, PushPull},
        pac::{self, interrupt},
        prelude::*,
        serial::{Config, Serial},
        spi::{Mode, Phase, Polarity, Spi},
    };
    use stm32f7xx_hal as hal;

    use balancebot::balancer::{Balancer, Hardware};
    use balancebot::buzzer::ToneSink;
    use balancebot::config::PULSE_INTERVAL_US;
    use balancebot::control::wheel::{LEFT, RIGHT};
    use balancebot::control::{SharedWheelCommands, SharedWheelSpeeds, WheelCommand};
    use balancebot::drivers::{EchoRanger, Mpu6000, PulseDriver, Stepper, ToneGenerator};
    use balancebot::hw::{
        clock, logger, BoardPins, ChipSelect, Led, SpiBus, SpiDevice, StatusLeds, Usart,
    };
    use balancebot::protocol::Response;
    use balancebot::sensor::{Imu, SensorError, SensorSample};

    type Out<const P: char, const N: u8> = hal::gpio::Pin<P, N, Output<PushPull>>;

    type LeftWheel = Stepper<gpiod::PD12<Output<PushPull>>, gpiod::PD13<Output<PushPull>>>;
    type RightWheel = Stepper<gpiod::PD14<Output<PushPull>>, gpiod::PD15<Output<PushPull>>>;
    type Ranger = EchoRanger<gpiob::PB0<Output<PushPull>>, gpiob::PB1<Input<PullDown>>>;
    type Spi4Pins = (
        gpioe::PE12<Alternate<5>>,
        gpioe::PE13<Alternate<5>>,
        gpioe::PE14<Alternate<5>>,
    );
    type Imu6000 = Mpu6000<pac::SPI4, Spi4Pins, 'E', 4>;

    /// Everything the pulse interrupt owns.
    struct PulseTask {
        tim: pac::TIM2,
        left: LeftWheel,
        right: RightWheel,
        tone: ToneGenerator<gpioc::PC6<Output<PushPull>>>,
        ranger: Ranger,
    }

    static PULSE: Mutex<RefCell<Option<PulseTask>>> = Mutex::new(RefCell::new(None));
    static SHARED_COMMANDS: SharedWheelCommands = SharedWheelCommands::new();
    static SHARED_SPEEDS: SharedWheelSpeeds = SharedWheelSpeeds::new();
    /// Latest echo width in µs, 0 when none is pending.
    static ECHO_US: AtomicU32 = AtomicU32::new(0);

    const PULSE_RATE_HZ: u32 = 1_000_000 / PULSE_INTERVAL_US;

    struct Board {
        imu: Imu6000,
        link: Usart<pac::USART3>,
        leds: StatusLeds<Out<'D', 10>, Out<'D', 8>>,
    }

    impl Imu for Board {
        fn read(&mut self) -> Result<SensorSample, SensorError> {
            self.imu.read()
        }
    }

    impl ToneSink for Board {
        fn tone(&mut self, freq_hz: u16, duration_ms: u32) {
            free(|cs| {
                if let Some(task) = PULSE.borrow(cs).borrow_mut().as_mut() {
                    task.tone.start(freq_hz, duration_ms);
                }
            });
        }
    }

    impl Hardware for Board {
        fn wheel_speeds(&mut self) -> [f32; 2] {
            SHARED_SPEEDS.load()
        }

        fn write_wheels(&mut self, commands: &[WheelCommand; 2]) {
            SHARED_COMMANDS.publish(commands);
        }

        fn range_echo_us(&mut self) -> Option<u32> {
            match ECHO_US.swap(0, Ordering::Relaxed) {
                0 => None,
                us => Some(us),
            }
        }

        fn respond(&mut self, response: &Response) {
            match response.encode() {
                Ok(bytes) => self.link.write_bytes(&bytes),
                Err(_) => warn!("response too large for the link buffer"),
            }
        }

        fn fault_indicator(&mut self, on: bool) {
            self.leds.update(clock::now_ms(), on);
        }
    }

    /// Configure TIM2 for an update interrupt every pulse period.
    fn start_pulse_timer(tim: &pac::TIM2, timer_clk_hz: u32) {
        // SAFETY: single read-modify-write of the TIM2 enable bit before the interrupt is unmasked.
        unsafe {
            (*pac::RCC::ptr())
                .apb1enr
                .modify(|_, w| w.tim2en().set_bit());
        }

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| w.psc().bits(0));
        tim.arr.write(|w| w.bits(timer_clk_hz / PULSE_RATE_HZ - 1));
        tim.cnt.write(|w| w.bits(0));
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());
        tim.dier.modify(|_, w| w.uie().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn halt() -> ! {
        loop {
            cortex_m::asm::nop();
        }
    }

    #[entry]
    fn main() -> ! {
        let (Some(dp), Some(cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take())
        else {
            halt();
        };

        // Clocks
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
        let mut apb2 = rcc.apb2;

        clock::start(cp.SYST, clocks.sysclk().raw());

        let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);

        // USART1 (DBG) carries the log
        let usart_cfg = || Config {
            baud_rate: 115_200.bps(),
            ..Default::default()
        };
        let debug = Serial::new(
            dp.USART1,
            (pins.usart1.tx, pins.usart1.rx),
            &clocks,
            usart_cfg(),
        );
        logger::init(Usart::new(debug), LevelFilter::Info);
        info!("balancebot starting, sysclk {} Hz", clocks.sysclk().raw());

        // USART3 is the command link
        let link = Serial::new(dp.USART3, (pins.usart3.tx, pins.usart3.rx), &clocks, usart_cfg());
        let link = Usart::new(link);

        // SPI4 to the IMU, mode 3
        let spi_mode = Mode {
            polarity: Polarity::IdleHigh,
            phase: Phase::CaptureOnSecondTransition,
        };
        let spi4 = Spi::new(dp.SPI4, (pins.spi4.sck, pins.spi4.miso, pins.spi4.mosi))
            .enable::<u8>(spi_mode, 1.MHz(), &clocks, &mut apb2);
        let imu_dev = SpiDevice::new(SpiBus::new(spi4), ChipSelect::active_low(pins.spi4.imu_cs));
        let mut imu = Mpu6000::new(imu_dev);
        match imu.init(clock::delay_ms) {
            Ok(()) => info!("imu ready"),
            Err(e) => error!("imu init failed: {:?}", e),
        }

        // Steppers, enable is active-low
        let mut enable = pins.stepper_enable;
        enable.set_low();

        let task = PulseTask {
            tim: dp.TIM2,
            left: Stepper::new(pins.left.step, pins.left.dir),
            right: Stepper::new(pins.right.step, pins.right.dir),
            tone: ToneGenerator::new(pins.buzzer),
            ranger: EchoRanger::new(pins.ultrasonic.trig, pins.ultrasonic.echo),
        };
        start_pulse_timer(&task.tim, clocks.timclk1().raw());
        free(|cs| PULSE.borrow(cs).replace(Some(task)));
        // SAFETY: PULSE is populated before the interrupt can fire.
        unsafe { NVIC::unmask(pac::Interrupt::TIM2) };

        let now = clock::now_ms();
        let leds = StatusLeds::new(
            Led::active_low(pins.leds.green),
            Led::active_low(pins.leds.red),
            now,
        );
        let mut yellow = Led::active_low(pins.leds.yellow);
        yellow.set(true);

        let mut board = Board { imu, link, leds };
        let mut balancer = Balancer::new(now);
        info!("control loop running");

        loop {
            while let Some(byte) = board.link.read_byte() {
                balancer.receive(byte, &mut board);
            }
            balancer.poll(clock::now_ms(), &mut board);
        }
    }

    #[exception]
    fn SysTick() {
        clock::tick();
    }

    #[interrupt]
    fn TIM2() {
        let commands = SHARED_COMMANDS.latest();
        free(|cs| {
            let mut slot = PULSE.borrow(cs).borrow_mut();
            let Some(task) = slot.as_mut() else {
                return;
            };
            task.tim.sr.modify(|_, w| w.uif().clear_bit());

            let [left, right] = commands;
            task.left.set_acceleration(left.acceleration);
            task.left.set_target_speed(left.target_speed);
            task.right.set_acceleration(right.acceleration);
            task.right.set_target_speed(right.target_speed);
            task.left.step();
            task.right.step();
            SHARED_SPEEDS.store(LEFT, task.left.speed());
            SHARED_SPEEDS.store(RIGHT, task.right.speed());

            task.tone.tick();
            task.ranger.tick();
            if let Some(us) = task.ranger.take_echo() {
                ECHO_US.store(us.max(1), Ordering::Relaxed);
            }
        });
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
