//! Integration tests for the light switch application logic.
//!
//! The whole `LightSwitch` is driven through its public entry points with
//! a millisecond clock; fakes record what reaches the stack and the LEDs.

use light_switch::link::{FrameParser, Indication};
use light_switch::peer::Peer;
use light_switch::signal::{Signal, SignalKind, Status};
use light_switch::time::Instant;
use light_switch::traits::{ButtonInput, Indicators, Network};
use light_switch::ui::{ButtonRole, Led};
use light_switch::zcl::{MatchDescReq, MatchDescResp, OnOff, StepCommand, StepMode};
use light_switch::LightSwitch;

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Query,
    OnOff(Peer, OnOff),
    Step(Peer, StepCommand),
    UserInput,
    DefaultSignal(Signal),
}

#[derive(Default)]
struct FakeNet {
    now: u32,
    sent: Vec<(u32, Sent)>,
}

impl Network for FakeNet {
    fn match_desc_req(&mut self, _req: &MatchDescReq) {
        self.sent.push((self.now, Sent::Query));
    }

    fn send_on_off(&mut self, peer: Peer, cmd: OnOff) {
        self.sent.push((self.now, Sent::OnOff(peer, cmd)));
    }

    fn send_step(&mut self, peer: Peer, step: StepCommand) {
        self.sent.push((self.now, Sent::Step(peer, step)));
    }

    fn user_input_indicate(&mut self) {
        self.sent.push((self.now, Sent::UserInput));
    }

    fn default_signal_handler(&mut self, signal: Signal) {
        self.sent.push((self.now, Sent::DefaultSignal(signal)));
    }
}

#[derive(Default)]
struct FakeButtons {
    pressed: [bool; ButtonRole::COUNT],
}

impl ButtonInput for FakeButtons {
    fn is_pressed(&self, role: ButtonRole) -> bool {
        self.pressed[role.index()]
    }
}

#[derive(Default)]
struct FakeLeds {
    on: [bool; 4],
}

impl Indicators for FakeLeds {
    fn set(&mut self, led: Led, on: bool) {
        self.on[led.index()] = on;
    }
}

const BULB: Peer = Peer {
    short_addr: 0x1234,
    endpoint: 10,
};

struct Bench {
    app: LightSwitch<FakeNet, FakeButtons, FakeLeds>,
    now: u32,
}

impl Bench {
    fn new() -> Self {
        Self {
            app: LightSwitch::new(FakeNet::default(), FakeButtons::default(), FakeLeds::default()),
            now: 0,
        }
    }

    fn at(&mut self, ms: u32) -> Instant {
        self.now = ms;
        self.app.network_mut().now = ms;
        Instant::from_millis(ms)
    }

    /// Run the poll loop once per millisecond up to and including `target`.
    fn run_until(&mut self, target: u32) {
        for ms in self.now..=target {
            let now = self.at(ms);
            self.app.run_pending(now).unwrap();
        }
    }

    fn signal(&mut self, kind: SignalKind, status: Status) {
        let now = self.at(self.now);
        self.app.on_signal(Signal::new(kind, status), now).unwrap();
    }

    fn respond(&mut self, src_addr: u16, endpoints: &[u8]) -> bool {
        let resp = MatchDescResp {
            status: 0,
            src_addr,
            endpoints: heapless::Vec::from_slice(endpoints).unwrap(),
        };
        self.app.on_match_desc_resp(&resp)
    }

    fn press(&mut self, role: ButtonRole) {
        self.app.input_mut().pressed[role.index()] = true;
        let now = self.at(self.now);
        self.app.on_button_event(role.key(), now).unwrap();
    }

    fn release(&mut self, role: ButtonRole) {
        self.app.input_mut().pressed[role.index()] = false;
    }

    /// Join, let the first query go out and answer it.
    fn joined_with_peer() -> Self {
        let mut bench = Self::new();
        bench.signal(SignalKind::Steering, Status::OK);
        bench.run_until(2000);
        assert!(bench.respond(BULB.short_addr, &[BULB.endpoint]));
        bench.app.network_mut().sent.clear();
        bench
    }

    fn sent(&self) -> &[(u32, Sent)] {
        &self.app.network().sent
    }

    fn query_times(&self) -> Vec<u32> {
        self.sent()
            .iter()
            .filter(|(_, s)| *s == Sent::Query)
            .map(|(t, _)| *t)
            .collect()
    }
}

#[test]
fn nothing_is_queried_before_joining() {
    let mut bench = Bench::new();
    bench.run_until(20_000);
    assert!(bench.sent().is_empty());
    assert_eq!(bench.app.scheduler().pending_alarms(), 0);
}

#[test]
fn query_repeats_until_a_bulb_answers() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::Steering, Status::OK);
    bench.run_until(12_500);

    assert_eq!(bench.query_times(), vec![2000, 7000, 12_000]);
    assert_eq!(bench.app.discovery().queries_sent(), 3);
    assert!(bench.app.peer().is_none());
    // Every query and timeout gave its buffer back.
    assert_eq!(
        bench.app.scheduler().free_buffers(),
        light_switch::config::BUFFER_POOL_SIZE
    );
}

#[test]
fn first_response_resolves_and_stops_the_cycle() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::DeviceReboot, Status::OK);
    bench.run_until(2100);

    assert!(bench.respond(BULB.short_addr, &[BULB.endpoint, 11]));
    assert!(!bench.respond(0x5678, &[3]));
    assert_eq!(bench.app.peer(), Some(BULB));
    assert!(bench.app.indicators().on[Led::PeerFound.index()]);

    bench.run_until(30_000);
    assert_eq!(bench.query_times(), vec![2000]);
    assert_eq!(bench.app.scheduler().pending_alarms(), 0);
}

#[test]
fn failed_join_does_not_start_discovery() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::Steering, Status(-1));
    bench.run_until(10_000);
    assert!(bench.query_times().is_empty());
    assert!(!bench.app.indicators().on[Led::Network.index()]);
}

#[test]
fn repeated_join_signals_arm_discovery_once() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::Steering, Status::OK);
    bench.signal(SignalKind::DeviceReboot, Status::OK);
    bench.run_until(2500);
    assert_eq!(bench.query_times(), vec![2000]);
}

#[test]
fn signals_reach_the_default_handler_and_network_led() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::Steering, Status::OK);
    assert!(bench.app.indicators().on[Led::Network.index()]);
    assert!(bench
        .sent()
        .contains(&(0, Sent::DefaultSignal(Signal::new(SignalKind::Steering, Status::OK)))));

    bench.signal(SignalKind::Leave, Status::OK);
    assert!(!bench.app.indicators().on[Led::Network.index()]);
}

#[test]
fn response_frame_from_the_link_resolves_the_peer() {
    let mut bench = Bench::new();
    bench.signal(SignalKind::Steering, Status::OK);
    bench.run_until(2000);

    let mut frame = [0u8; light_switch::link::MAX_FRAME_SIZE];
    let ind = Indication::MatchDescResp(MatchDescResp {
        status: 0,
        src_addr: BULB.short_addr,
        endpoints: heapless::Vec::from_slice(&[BULB.endpoint]).unwrap(),
    });
    let len = ind.encode(&mut frame).unwrap();

    let mut parser = FrameParser::new();
    let mut decoded = None;
    for &byte in &frame[..len] {
        if let Some(result) = parser.push(byte) {
            decoded = Some(result.unwrap());
        }
    }
    let now = bench.at(2010);
    bench.app.on_indication(&decoded.unwrap(), now).unwrap();
    assert_eq!(bench.app.peer(), Some(BULB));
}

#[test]
fn buttons_are_ignored_until_the_peer_is_known() {
    let mut bench = Bench::new();
    bench.press(ButtonRole::On);
    bench.run_until(3000);

    // The stack still hears about the user input.
    assert_eq!(bench.sent(), &[(0, Sent::UserInput)]);
    assert!(!bench.app.buttons().session(ButtonRole::On).active);
}

#[test]
fn short_press_toggles_once() {
    let mut bench = Bench::joined_with_peer();
    let start = bench.now;
    bench.press(ButtonRole::On);
    bench.run_until(start + 380);
    bench.release(ButtonRole::On);
    bench.run_until(start + 3000);

    let commands: Vec<_> = bench
        .sent()
        .iter()
        .filter(|(_, s)| *s != Sent::UserInput)
        .cloned()
        .collect();
    assert_eq!(commands, vec![(start + 400, Sent::OnOff(BULB, OnOff::On))]);
    assert!(!bench.app.buttons().session(ButtonRole::On).active);
}

#[test]
fn long_press_dims_until_release() {
    let mut bench = Bench::joined_with_peer();
    let start = bench.now;
    bench.press(ButtonRole::Off);
    bench.run_until(start + 2500);
    bench.release(ButtonRole::Off);
    bench.run_until(start + 5000);

    let steps: Vec<u32> = bench
        .sent()
        .iter()
        .filter_map(|(t, s)| match s {
            Sent::Step(peer, step) => {
                assert_eq!(*peer, BULB);
                assert_eq!(*step, StepCommand::dimm(StepMode::Down));
                Some(*t - start)
            }
            _ => None,
        })
        .collect();
    assert_eq!(steps, vec![1050, 1350, 1650, 1950, 2250]);
    assert!(!bench
        .sent()
        .iter()
        .any(|(_, s)| matches!(s, Sent::OnOff(..))));
    assert!(!bench.app.buttons().session(ButtonRole::Off).active);
    assert_eq!(bench.app.scheduler().pending_alarms(), 0);
}

#[test]
fn bouncing_edge_does_not_double_the_polls() {
    let mut bench = Bench::joined_with_peer();
    let start = bench.now;
    bench.press(ButtonRole::On);
    bench.run_until(start + 5);
    bench.press(ButtonRole::On);
    assert_eq!(bench.app.scheduler().pending_alarms(), 1);

    bench.run_until(start + 120);
    bench.release(ButtonRole::On);
    bench.run_until(start + 2000);
    let toggles = bench
        .sent()
        .iter()
        .filter(|(_, s)| matches!(s, Sent::OnOff(..)))
        .count();
    assert_eq!(toggles, 1);
}

#[test]
fn unknown_key_only_signals_user_input() {
    let mut bench = Bench::joined_with_peer();
    let now = bench.at(bench.now);
    bench.app.on_button_event(7, now).unwrap();
    bench.run_until(bench.now + 2000);
    assert_eq!(bench.sent(), &[(now.as_millis(), Sent::UserInput)]);
}

#[test]
fn both_buttons_run_independent_sessions() {
    let mut bench = Bench::joined_with_peer();
    let start = bench.now;
    bench.press(ButtonRole::On);
    bench.press(ButtonRole::Off);
    bench.run_until(start + 180);
    bench.release(ButtonRole::On);
    bench.run_until(start + 1100);
    bench.release(ButtonRole::Off);
    bench.run_until(start + 2000);

    let commands: Vec<_> = bench
        .sent()
        .iter()
        .filter(|(_, s)| *s != Sent::UserInput)
        .map(|(t, s)| (*t - start, s.clone()))
        .collect();
    assert_eq!(
        commands,
        vec![
            (200, Sent::OnOff(BULB, OnOff::On)),
            (1050, Sent::Step(BULB, StepCommand::dimm(StepMode::Down))),
        ]
    );
}
