//! Board layer - GPIO buttons and LEDs.
//!
//! Buttons are active-low with internal pull-ups. Each one is watched by
//! its own task that waits for a GPIO edge, debounces it, publishes the
//! press to the application and tracks the held level for polling.
//! LEDs are active-low as well.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_nrf::gpio::Input;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use light_switch::config::{BUTTON_COUNT, BUTTON_DEBOUNCE_MS, LED_COUNT};
use light_switch::traits::{ButtonInput, Indicators};
use light_switch::ui::{ButtonRole, Led};

use crate::{AppEvent, EventSender};

#[allow(clippy::declare_interior_mutable_const)]
const RELEASED: AtomicBool = AtomicBool::new(false);

/// Debounced level of every button, written by the button tasks.
static PRESSED: [AtomicBool; BUTTON_COUNT] = [RELEASED; BUTTON_COUNT];

#[embassy_executor::task(pool_size = 3)]
pub async fn button_task(pin: Input<'static>, key: u8, events: EventSender) -> ! {
    watch_button(pin, key, events).await
}

/// Wait for a press, debounce, publish it, then track the release.
async fn watch_button<P>(mut pin: P, key: u8, events: EventSender) -> !
where
    P: Wait + InputPin,
{
    let level = &PRESSED[key as usize];
    loop {
        // Wait for falling edge (button press, active-low).
        let _ = pin.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if pin.is_low().unwrap_or(false) {
            level.store(true, Ordering::Relaxed);
            info!("Button {} pressed", key);
            events.send(AppEvent::Button(key)).await;

            let _ = pin.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
            level.store(false, Ordering::Relaxed);
        }
    }
}

/// Button levels as last seen by the button tasks.
pub struct ButtonLevels;

impl ButtonInput for ButtonLevels {
    fn is_pressed(&self, role: ButtonRole) -> bool {
        PRESSED[role.index()].load(Ordering::Relaxed)
    }
}

pub struct BoardLeds<P> {
    leds: [P; LED_COUNT],
}

impl<P: OutputPin> BoardLeds<P> {
    /// Take the LED pins and switch them all off.
    pub fn new(leds: [P; LED_COUNT]) -> Self {
        let mut board = Self { leds };
        for pin in board.leds.iter_mut() {
            let _ = pin.set_high();
        }
        board
    }
}

impl<P: OutputPin> Indicators for BoardLeds<P> {
    fn set(&mut self, led: Led, on: bool) {
        let pin = &mut self.leds[led.index()];
        let _ = if on { pin.set_low() } else { pin.set_high() };
    }
}
