//! Zigbee dimmer switch - nRF52840 firmware.
//!
//! Joins the network through the Zigbee co-processor, finds a dimmable
//! light bulb and drives it from the board buttons:
//!
//! - short press of button 0 / 1 switches the bulb on / off
//! - holding button 0 / 1 dims it up / down until released
//! - holding button 2 at reset makes this a sleepy end device
//!
//! All application logic runs in one poll loop; the button and link tasks
//! only feed it events.

#![no_std]
#![no_main]

mod board;
mod ncp;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::uarte;
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use light_switch::config::{StackConfig, STARTUP_BLINK_COUNT, STARTUP_BLINK_MS, SLEEPY_ON_BUTTON};
use light_switch::link::{Indication, Request};
use light_switch::time::Instant;
use light_switch::traits::Indicators;
use light_switch::ui::{ButtonRole, Led};
use light_switch::{Error, LightSwitch};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

/// Inputs to the application poll loop.
pub enum AppEvent {
    /// Debounced press of a board key.
    Button(u8),
    /// Frame from the Zigbee co-processor.
    Link(Indication),
}

const EVENT_QUEUE: usize = 8;

pub type EventSender = Sender<'static, CriticalSectionRawMutex, AppEvent, EVENT_QUEUE>;

static EVENTS: StaticCell<Channel<CriticalSectionRawMutex, AppEvent, EVENT_QUEUE>> =
    StaticCell::new();

/// Ring buffers of the co-processor link.
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

fn now() -> Instant {
    // The application clock is a wrapping 32-bit millisecond counter.
    Instant::from_millis(embassy_time::Instant::now().as_millis() as u32)
}

fn fatal(e: Error) -> ! {
    defmt::panic!("Scheduler fault: {}", e)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("light-switch starting");
    let p = embassy_nrf::init(Default::default());

    let mut leds = board::BoardLeds::new([
        Output::new(p.P0_13, Level::High, OutputDrive::Standard),
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_15, Level::High, OutputDrive::Standard),
        Output::new(p.P0_16, Level::High, OutputDrive::Standard),
    ]);

    // Blink the status LED to indicate startup.
    for i in 0..STARTUP_BLINK_COUNT {
        leds.set(Led::Status, i % 2 == 0);
        Timer::after(Duration::from_millis(STARTUP_BLINK_MS)).await;
    }

    let btn_on = Input::new(p.P0_11, Pull::Up);
    let btn_off = Input::new(p.P0_12, Pull::Up);
    let btn_sleepy = Input::new(p.P0_24, Pull::Up);

    // Sampled once: held at boot selects the sleepy end-device behaviour.
    let sleepy = btn_sleepy.is_low();
    info!("Sleepy end device: {}", sleepy);

    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        Irqs,
        p.P0_08,
        p.P0_06,
        uart_config,
        rx_buf,
        tx_buf,
    );
    let (rx, tx) = uart.split();

    let events: &'static Channel<_, _, EVENT_QUEUE> = EVENTS.init(Channel::new());

    unwrap!(spawner.spawn(ncp::link_tx_task(tx)));
    unwrap!(spawner.spawn(ncp::link_rx_task(rx, events.sender())));
    unwrap!(spawner.spawn(board::button_task(btn_on, ButtonRole::On.key(), events.sender())));
    unwrap!(spawner.spawn(board::button_task(btn_off, ButtonRole::Off.key(), events.sender())));
    unwrap!(spawner.spawn(board::button_task(btn_sleepy, SLEEPY_ON_BUTTON, events.sender())));

    ncp::submit(Request::Start(StackConfig::end_device(sleepy)));

    let mut app = LightSwitch::new(ncp::LinkNetwork, board::ButtonLevels, leds);
    let receiver = events.receiver();

    loop {
        if let Err(e) = app.run_pending(now()) {
            fatal(e);
        }

        let event = match app.next_deadline(now()) {
            Some(wait) => {
                let timer = Timer::after(Duration::from_millis(wait.as_millis() as u64));
                match select(receiver.receive(), timer).await {
                    Either::First(event) => Some(event),
                    Either::Second(()) => None,
                }
            }
            None => Some(receiver.receive().await),
        };

        let result = match event {
            Some(AppEvent::Button(key)) => app.on_button_event(key, now()),
            Some(AppEvent::Link(ind)) => app.on_indication(&ind, now()),
            None => Ok(()),
        };
        if let Err(e) = result {
            fatal(e);
        }
    }
}
