//! Live state of the whole board, shared by all execution contexts.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use yboard_audio::notation;
use yboard_audio::player::{AudioSource, Player};
use yboard_audio::transport::Transport;
use yboard_audio::wake::WakeSignal;
use yboard_audio::{Instant, QUEUE_CAPACITY};

use crate::config::{CoalescedEdges, Config};
use crate::input::pin_map::PinMap;
use crate::input::{ChannelKind, EdgeSignal, ExpanderBus, InputCache};
use crate::knob::{Knob, QuadratureCounter};
use crate::log;

/// Period in which blocking calls check whether playback finished.
pub const POLL_INTERVAL_MS: u32 = 10;

/// Context object holding inputs, knob, and the audio player.
///
/// Construct it once at start-up, keep it in a static or hand out
/// references, and call into it from the interrupt handler
/// (`on_expander_interrupt`), the input worker (`service_inputs`), the audio
/// task (`service_audio`), and the application (everything else).
///
/// The audio task calls `service_audio` again at the instant it returned.
/// When it returned `None`, the task parks until `audio_pending` turns true,
/// which happens whenever notes or a file start playing.
///
/// The expander bus is not owned by the board. Only the input worker talks
/// to it, so it is passed in by that worker.
pub struct Board<T, Q, const N: usize = QUEUE_CAPACITY> {
    config: Config,
    inputs: InputCache,
    edges: EdgeSignal,
    knob: Knob<Q>,
    player: Mutex<RefCell<Player<T, N>>>,
    audio_wake: WakeSignal,
}

impl<T, Q, const N: usize> Board<T, Q, N>
where
    T: Transport,
    Q: QuadratureCounter,
{
    pub const fn new(config: Config, transport: T, counter: Q) -> Self {
        Self {
            config,
            inputs: InputCache::new(),
            edges: EdgeSignal::new(),
            knob: Knob::new(counter),
            player: Mutex::new(RefCell::new(Player::new(transport))),
            audio_wake: WakeSignal::new(),
        }
    }

    /// Drop any stale interrupt and load the initial state of all inputs.
    ///
    /// # Errors
    ///
    /// Fails if the expander did not respond. Inputs that could not be read
    /// stay released.
    pub fn init<B: ExpanderBus>(&self, bus: &mut B) -> Result<(), B::Error> {
        log::info!("Initializing inputs");
        self.edges.take();
        let cleared = bus.clear_interrupt_latch();
        self.inputs.recache_all(&self.config.pin_map, bus)?;
        cleared
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn pin_map(&self) -> &PinMap {
        &self.config.pin_map
    }

    #[must_use]
    pub fn inputs(&self) -> &InputCache {
        &self.inputs
    }

    // Inputs

    /// To be called from the expander's interrupt handler, and nothing else.
    pub fn on_expander_interrupt(&self) {
        self.edges.notify();
    }

    /// Whether the input worker has edges waiting for it.
    #[must_use]
    pub fn inputs_pending(&self) -> bool {
        self.edges.is_pending()
    }

    /// Bring the cache up to date with edges reported since the last call.
    ///
    /// Run this from the single input worker after it was woken up.
    ///
    /// # Errors
    ///
    /// Fails if the expander did not respond. Affected inputs keep their
    /// previous state.
    pub fn service_inputs<B: ExpanderBus>(&self, bus: &mut B) -> Result<(), B::Error> {
        let edges = self.edges.take();
        let result = match (edges, self.config.coalesced_edges) {
            (0, _) => Ok(()),
            (1, _) | (_, CoalescedEdges::LastPinOnly) => self
                .inputs
                .recache_on_signal(&self.config.pin_map, bus)
                .map(|_| ()),
            (_, CoalescedEdges::Resync) => {
                log::info!("Resynchronizing inputs after {} edges", edges);
                let cleared = bus.clear_interrupt_latch();
                self.inputs
                    .recache_all(&self.config.pin_map, bus)
                    .and(cleared)
            }
        };
        if result.is_err() {
            log::warning!("Failed to read the expander");
        }
        result
    }

    /// Force a full re-read of all inputs.
    ///
    /// # Errors
    ///
    /// Fails if the expander did not respond. Affected inputs keep their
    /// previous state.
    pub fn recache_all<B: ExpanderBus>(&self, bus: &mut B) -> Result<(), B::Error> {
        self.inputs.recache_all(&self.config.pin_map, bus)
    }

    /// Button 1 to 5, arranged as follows:
    ///
    /// ```text
    ///     3
    /// 1   4   2
    ///     5
    /// ```
    #[must_use]
    pub fn button(&self, index: u8) -> bool {
        self.inputs.get(ChannelKind::Button, index)
    }

    #[must_use]
    pub fn buttons(&self) -> u8 {
        self.inputs.get_all(ChannelKind::Button)
    }

    /// Switch 1 to 4, numbered from left to right.
    #[must_use]
    pub fn switch(&self, index: u8) -> bool {
        self.inputs.get(ChannelKind::Switch, index)
    }

    #[must_use]
    pub fn switches(&self) -> u8 {
        self.inputs.get_all(ChannelKind::Switch)
    }

    /// DIP switch 1 to 6.
    #[must_use]
    pub fn dip_switch(&self, index: u8) -> bool {
        self.inputs.get(ChannelKind::DipSwitch, index)
    }

    #[must_use]
    pub fn dip_switches(&self) -> u8 {
        self.inputs.get_all(ChannelKind::DipSwitch)
    }

    #[must_use]
    pub fn knob_button(&self) -> bool {
        self.inputs.get(ChannelKind::KnobButton, 1)
    }

    // Knob

    #[must_use]
    pub fn knob(&self) -> i64 {
        self.knob.get()
    }

    pub fn set_knob(&self, value: i64) {
        self.knob.set(value);
    }

    pub fn reset_knob(&self) {
        self.knob.reset();
    }

    // Audio

    /// Compile notes and queue them behind those already playing.
    ///
    /// Returns `false` if the notation is malformed or does not fit in the
    /// queue. Nothing is queued then. On success any playing sound file is
    /// stopped.
    pub fn enqueue_notes(&self, notes: &str) -> bool {
        let events = match notation::compile::<N>(notes) {
            Ok(events) => events,
            Err(_error) => {
                log::warning!("Invalid notes: {}", _error);
                return false;
            }
        };

        let enqueued = self.with_player(|player| {
            let enqueued = player.enqueue(&events);
            if enqueued.is_ok() && !events.is_empty() {
                self.audio_wake.notify();
            }
            enqueued
        });
        if enqueued.is_err() {
            log::warning!("Notes do not fit into the queue");
        }
        enqueued.is_ok()
    }

    /// Like `enqueue_notes`, but return only after playback finished.
    ///
    /// The audio task must keep calling `service_audio` meanwhile.
    pub fn play_notes<D: DelayNs>(&self, notes: &str, delay: &mut D) -> bool {
        if !self.enqueue_notes(notes) {
            return false;
        }
        self.wait_until_silent(delay);
        true
    }

    /// Start playing a sound file in the background.
    ///
    /// Queued notes are dropped once the file is found to be available.
    /// Otherwise `false` is returned and whatever played continues. The path
    /// may omit the leading `/`.
    pub fn play_file_background(&self, path: &str) -> bool {
        self.with_player(|player| {
            let started = player.play_file(path);
            if started {
                self.audio_wake.notify();
            }
            started
        })
    }

    /// Like `play_file_background`, but return only after playback finished.
    pub fn play_file<D: DelayNs>(&self, path: &str, delay: &mut D) -> bool {
        if !self.play_file_background(path) {
            return false;
        }
        self.wait_until_silent(delay);
        true
    }

    /// Volume of sound files, 0 to 10. Notes set their own volume.
    pub fn set_file_volume(&self, volume: u8) {
        self.with_player(|player| player.set_file_volume(volume));
    }

    pub fn stop_audio(&self) {
        self.with_player(Player::stop);
    }

    #[must_use]
    pub fn is_audio_playing(&self) -> bool {
        self.with_player(|player| player.is_playing())
    }

    #[must_use]
    pub fn audio_source(&self) -> AudioSource {
        self.with_player(|player| player.source())
    }

    /// Number of note events waiting to be played.
    #[must_use]
    pub fn queued_notes(&self) -> usize {
        self.with_player(|player| player.queue().len())
    }

    /// Whether a parked audio task has to call `service_audio`.
    #[must_use]
    pub fn audio_pending(&self) -> bool {
        self.audio_wake.is_pending()
    }

    /// Advance audio playback, to be called from the audio task.
    ///
    /// Returns when it should be called again, `None` when idle.
    pub fn service_audio(&self, now: Instant) -> Option<Instant> {
        self.with_player(|player| {
            self.audio_wake.take();
            player.service(now)
        })
    }

    fn wait_until_silent<D: DelayNs>(&self, delay: &mut D) {
        while self.is_audio_playing() {
            delay.delay_ms(POLL_INTERVAL_MS);
        }
    }

    fn with_player<R>(&self, f: impl FnOnce(&mut Player<T, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.player.borrow_ref_mut(cs)))
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::testlib::{FakeBus, FakeCounter, FakeTransport};

    type TestBoard = Board<FakeTransport, FakeCounter, 32>;

    static STATIC_BOARD: TestBoard = Board::new(
        Config::new(PinMap::V4),
        FakeTransport::new(),
        FakeCounter { value: 0 },
    );

    fn board() -> TestBoard {
        Board::new(
            Config::default(),
            FakeTransport::default(),
            FakeCounter::default(),
        )
    }

    fn released_bus(board: &TestBoard) -> FakeBus {
        let mut bus = FakeBus::default();
        bus.set_all_released(board.pin_map());
        bus
    }

    /// Audio task that sleeps until its deadline, or until woken up when it
    /// has none.
    struct AudioTask<'a> {
        board: &'a TestBoard,
        deadline: Option<Instant>,
        runs: u32,
    }

    impl<'a> AudioTask<'a> {
        fn start(board: &'a TestBoard, now: Instant) -> Self {
            Self {
                board,
                deadline: board.service_audio(now),
                runs: 1,
            }
        }

        fn tick(&mut self, now: Instant) {
            let due = self.deadline.map_or(false, |deadline| deadline <= now);
            if due || self.board.audio_pending() {
                self.deadline = self.board.service_audio(now);
                self.runs += 1;
            }
        }
    }

    /// Delay that drives the audio task itself, standing in for time passing.
    struct DrivingDelay<'a> {
        task: AudioTask<'a>,
        now: u64,
        waited: u32,
    }

    impl<'a> DrivingDelay<'a> {
        fn new(board: &'a TestBoard) -> Self {
            Self {
                task: AudioTask::start(board, Instant::from_ticks(0)),
                now: 0,
                waited: 0,
            }
        }
    }

    impl DelayNs for DrivingDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.delay_ms(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.now += u64::from(ms);
            self.waited += 1;
            self.task.tick(Instant::from_ticks(self.now));
        }
    }

    struct ThreadDelay;

    impl DelayNs for ThreadDelay {
        fn delay_ns(&mut self, ns: u32) {
            std::thread::sleep(std::time::Duration::from_nanos(ns.into()));
        }
    }

    #[test]
    fn board_can_be_built_in_a_static() {
        assert!(!STATIC_BOARD.is_audio_playing());
        assert_eq!(STATIC_BOARD.pin_map(), &PinMap::default());
    }

    #[test]
    fn when_initialized_it_reads_all_inputs() {
        let board = board();
        let mut bus = released_bus(&board);
        bus.levels[board.pin_map().buttons[4] as usize] = false;
        bus.levels[board.pin_map().switches[0] as usize] = true;
        bus.levels[board.pin_map().knob_button as usize] = false;
        board.on_expander_interrupt();

        board.init(&mut bus).unwrap();

        assert!(board.button(5));
        assert_eq!(board.buttons(), 0b1_0000);
        assert!(board.switch(1));
        assert_eq!(board.switches(), 0b1);
        assert_eq!(board.dip_switches(), 0);
        assert!(board.knob_button());
        assert!(!board.inputs_pending());
        assert_eq!(bus.latch_cleared, 1);
    }

    #[test]
    fn when_index_is_out_of_range_accessors_read_false() {
        let board = board();
        let mut bus = FakeBus::default();
        bus.levels = [false; 16];
        board.init(&mut bus).unwrap();
        assert!(board.button(1) && board.button(5));
        assert!(!board.button(0) && !board.button(6));
        assert!(!board.switch(0) && !board.switch(5));
        assert!(board.dip_switch(6));
        assert!(!board.dip_switch(0) && !board.dip_switch(7));
    }

    #[test]
    fn when_single_edge_arrives_only_its_pin_is_updated() {
        let board = board();
        let mut bus = released_bus(&board);
        board.init(&mut bus).unwrap();

        let pin = board.pin_map().dip_switches[2];
        bus.levels[pin as usize] = false;
        bus.levels[board.pin_map().buttons[0] as usize] = false;
        bus.last_pin = pin;
        board.on_expander_interrupt();

        board.service_inputs(&mut bus).unwrap();

        assert!(board.dip_switch(3));
        assert!(!board.button(1));
        assert_eq!(bus.latch_cleared, 2);
    }

    #[test]
    fn when_several_edges_coalesce_all_inputs_are_resynced() {
        let board = board();
        let mut bus = released_bus(&board);
        board.init(&mut bus).unwrap();

        bus.levels[board.pin_map().buttons[0] as usize] = false;
        bus.levels[board.pin_map().buttons[1] as usize] = false;
        bus.last_pin = board.pin_map().buttons[1];
        board.on_expander_interrupt();
        board.on_expander_interrupt();

        board.service_inputs(&mut bus).unwrap();

        assert_eq!(board.buttons(), 0b11);
        assert!(!board.inputs_pending());
    }

    #[test]
    fn when_configured_for_last_pin_only_coalesced_edges_update_one_bit() {
        let board: TestBoard = Board::new(
            Config {
                coalesced_edges: CoalescedEdges::LastPinOnly,
                ..Config::default()
            },
            FakeTransport::default(),
            FakeCounter::default(),
        );
        let mut bus = released_bus(&board);
        board.init(&mut bus).unwrap();

        bus.levels[board.pin_map().buttons[0] as usize] = false;
        bus.levels[board.pin_map().buttons[1] as usize] = false;
        bus.last_pin = board.pin_map().buttons[1];
        board.on_expander_interrupt();
        board.on_expander_interrupt();

        board.service_inputs(&mut bus).unwrap();

        assert_eq!(board.buttons(), 0b10);
    }

    #[test]
    fn when_no_edge_is_pending_servicing_inputs_does_nothing() {
        let board = board();
        let mut bus = released_bus(&board);
        board.service_inputs(&mut bus).unwrap();
        assert_eq!(bus.latch_cleared, 0);
        assert_eq!(bus.reads, 0);
    }

    #[test]
    fn when_expander_fails_inputs_keep_their_state() {
        let board = board();
        let mut bus = released_bus(&board);
        bus.levels[board.pin_map().switches[2] as usize] = true;
        board.init(&mut bus).unwrap();

        bus.levels[board.pin_map().switches[2] as usize] = false;
        bus.last_pin = board.pin_map().switches[2];
        bus.failing_pins = u32::MAX;
        board.on_expander_interrupt();

        assert!(board.service_inputs(&mut bus).is_err());
        assert!(board.switch(3));
    }

    #[test]
    fn knob_is_independent_of_inputs() {
        let board = board();
        board.set_knob(-3);
        assert_eq!(board.knob(), -3);
        board.reset_knob();
        assert_eq!(board.knob(), 0);
        assert_eq!(board.buttons(), 0);
    }

    #[test]
    fn when_notes_are_valid_they_start_playing() {
        let board = board();
        assert!(board.enqueue_notes("C D E"));
        assert_eq!(board.audio_source(), AudioSource::PlayingNotes);
        assert!(board.is_audio_playing());
        assert_eq!(board.queued_notes(), 3);
    }

    #[test]
    fn when_notes_are_malformed_nothing_is_queued() {
        let board = board();
        assert!(board.enqueue_notes("C D"));
        assert!(!board.enqueue_notes("E F T999 G"));
        assert_eq!(board.queued_notes(), 2);
    }

    #[test]
    fn when_notes_do_not_fit_nothing_is_queued() {
        let board = board();
        assert!(board.enqueue_notes("C C C C C C C C C C C C C C C C C C C C C C C C C C C C C C"));
        assert!(!board.enqueue_notes("D D D"));
        assert_eq!(board.queued_notes(), 30);
    }

    #[test]
    fn when_notes_are_enqueued_twice_batches_play_in_order() {
        let board = board();
        assert!(board.enqueue_notes("C D"));
        board.service_audio(Instant::from_ticks(0));
        assert!(board.enqueue_notes("E F"));

        let mut now = 0;
        while board.service_audio(Instant::from_ticks(now)).is_some() {
            now += 500;
        }

        let pitches: heapless::Vec<i16, 8> = critical_section::with(|cs| {
            board
                .player
                .borrow_ref(cs)
                .transport()
                .tones()
                .collect()
        });
        assert_eq!(&pitches[..], &[60, 62, 64, 65]);
    }

    #[test]
    fn when_file_is_played_during_notes_it_takes_over() {
        let board = board();
        assert!(board.enqueue_notes("C D E F"));
        board.service_audio(Instant::from_ticks(0));

        assert!(board.play_file_background("song.wav"));

        assert_eq!(board.audio_source(), AudioSource::PlayingFile);
        assert_eq!(board.queued_notes(), 0);
        assert!(board.is_audio_playing());
    }

    #[test]
    fn when_stopped_during_notes_it_is_silent() {
        let board = board();
        assert!(board.enqueue_notes("C D E F"));
        board.service_audio(Instant::from_ticks(0));

        board.stop_audio();

        assert_eq!(board.audio_source(), AudioSource::Idle);
        assert!(!board.is_audio_playing());
        assert_eq!(board.queued_notes(), 0);
    }

    #[test]
    fn when_playing_notes_it_returns_after_they_finish() {
        let board = board();
        let mut delay = DrivingDelay::new(&board);

        assert!(board.play_notes("C8 D8", &mut delay));

        assert!(!board.is_audio_playing());
        // Two eighths at 120 BPM take 500 ms, the first one starting on the
        // first poll.
        assert_eq!(delay.waited, 51);
    }

    #[test]
    fn when_playing_malformed_notes_it_returns_immediately() {
        let board = board();
        let mut delay = DrivingDelay::new(&board);
        assert!(!board.play_notes("C8 X", &mut delay));
        assert_eq!(delay.waited, 0);
    }

    #[test]
    fn when_playing_file_it_returns_after_it_finishes() {
        let board = board();
        critical_section::with(|cs| {
            board
                .player
                .borrow_ref_mut(cs)
                .transport_mut()
                .file_busy_polls = 10;
        });
        let mut delay = DrivingDelay::new(&board);

        assert!(board.play_file("/song.wav", &mut delay));

        assert!(!board.is_audio_playing());
        assert!(delay.waited >= 10);
    }

    #[test]
    fn when_audio_task_runs_in_another_thread_playing_notes_completes() {
        let board = board();
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                let start = std::time::Instant::now();
                let elapsed = || Instant::from_ticks(start.elapsed().as_millis() as u64);
                let mut task = AudioTask::start(&board, elapsed());
                while !done.load(Ordering::Acquire) {
                    task.tick(elapsed());
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
            });

            assert!(board.play_notes("T240 C32 D32", &mut ThreadDelay));
            done.store(true, Ordering::Release);
        });

        assert!(!board.is_audio_playing());
    }

    #[test]
    fn when_audio_task_is_parked_starting_a_source_wakes_it() {
        let board = board();
        let mut task = AudioTask::start(&board, Instant::from_ticks(0));
        assert_eq!(task.deadline, None);

        task.tick(Instant::from_ticks(100));
        assert_eq!(task.runs, 1);

        assert!(board.enqueue_notes("C"));
        assert!(board.audio_pending());
        task.tick(Instant::from_ticks(110));
        assert_eq!(task.runs, 2);
        assert_eq!(task.deadline, Some(Instant::from_ticks(610)));
        assert!(!board.audio_pending());

        board.stop_audio();
        task.tick(Instant::from_ticks(610));
        assert_eq!(task.deadline, None);

        assert!(board.play_file_background("song.wav"));
        assert!(board.audio_pending());
        task.tick(Instant::from_ticks(700));
        assert!(!board.audio_pending());
    }

    #[test]
    fn when_audio_request_fails_parked_task_is_not_woken() {
        let board = board();
        assert!(!board.enqueue_notes("C X"));
        assert!(board.enqueue_notes(""));
        assert!(!board.play_file_background(""));
        assert!(!board.audio_pending());
    }

    #[test]
    fn file_volume_is_clamped() {
        let board = board();
        board.set_file_volume(20);
        let volume =
            critical_section::with(|cs| board.player.borrow_ref(cs).transport().file_volume);
        assert_eq!(volume, 10);
    }
}
