//! UART link to the Zigbee network co-processor.
//!
//! Requests from the application are queued without blocking and written
//! out by `link_tx_task`; `link_rx_task` decodes inbound frames and turns
//! them into application events.
//!
//! Both halves run on the buffered UARTE, so bytes keep landing in the
//! ring buffer while a task is waiting on its channel.

use defmt::{error, trace, warn, Debug2Format};
use embassy_nrf::buffered_uarte::{BufferedUarteRx, BufferedUarteTx};
use embassy_nrf::peripherals::{TIMER0, UARTE0};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_io_async::{Read, Write};

use light_switch::link::{FrameParser, Request, MAX_FRAME_SIZE};
use light_switch::peer::Peer;
use light_switch::signal::Signal;
use light_switch::traits::Network;
use light_switch::zcl::{MatchDescReq, OnOff, StepCommand};

use crate::{AppEvent, EventSender};

/// Chunk size for draining the receive ring buffer.
const RX_CHUNK_SIZE: usize = 32;

/// Outbound requests waiting for the UART.
static REQUESTS: Channel<CriticalSectionRawMutex, Request, 8> = Channel::new();

/// Queue a request for the co-processor. Dropped (with a warning) if the queue is full.
pub fn submit(req: Request) {
    if REQUESTS.try_send(req).is_err() {
        warn!("Stack link queue full - request dropped");
    }
}

/// [`Network`] backed by the co-processor link.
pub struct LinkNetwork;

impl Network for LinkNetwork {
    fn match_desc_req(&mut self, req: &MatchDescReq) {
        submit(Request::MatchDesc(req.clone()));
    }

    fn send_on_off(&mut self, peer: Peer, cmd: OnOff) {
        submit(Request::OnOff { peer, cmd });
    }

    fn send_step(&mut self, peer: Peer, step: StepCommand) {
        submit(Request::Step { peer, step });
    }

    fn user_input_indicate(&mut self) {
        submit(Request::UserInput);
    }

    fn default_signal_handler(&mut self, signal: Signal) {
        submit(Request::DefaultSignal(signal));
    }
}

#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUarteTx<'static, UARTE0>) -> ! {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    loop {
        let req = REQUESTS.receive().await;
        match req.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("Link write failed: {:?}", Debug2Format(&e));
                }
            }
            Err(e) => error!("Link encode failed: {}", e),
        }
    }
}

#[embassy_executor::task]
pub async fn link_rx_task(
    mut rx: BufferedUarteRx<'static, UARTE0, TIMER0>,
    events: EventSender,
) -> ! {
    let mut parser = FrameParser::new();
    let mut chunk = [0u8; RX_CHUNK_SIZE];
    loop {
        let n = match rx.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Link read failed: {:?}", Debug2Format(&e));
                parser.reset();
                continue;
            }
        };
        trace!("Link RX: {} bytes", n);

        for &byte in &chunk[..n] {
            match parser.push(byte) {
                Some(Ok(ind)) => events.send(AppEvent::Link(ind)).await,
                Some(Err(e)) => warn!("Link frame dropped: {}", e),
                None => {}
            }
        }
    }
}
