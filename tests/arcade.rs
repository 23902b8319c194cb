use std::cell::RefCell;
use std::rc::Rc;

use games2d::arcade::Arcade;
use games2d::audio::Sound;
use games2d::highscores::ScoreBoard;
use games2d::input::{InputEvent, Key};
use games2d::menu::Menu;
use games2d::persistence::{MemoryStorage, Store};
use games2d::platform::RecordingHost;
use games2d::settings::Settings;
use games2d::sim::{Game, TickContext};

const STEP: f64 = 25.0;
const PING_MS: f64 = 5000.0;

/// Runs four ticks, then loses. Schedules one ping when it starts.
#[derive(Debug)]
struct Sprint {
    ticks: u32,
    over: bool,
    pings: u32,
    scores: ScoreBoard,
}

#[derive(Debug, Clone)]
enum SprintTimer {
    Ping,
}

impl Game for Sprint {
    type Timer = SprintTimer;

    const NAME: &'static str = "sprint";

    fn new(_seed: u64, store: &Store) -> Self {
        Self {
            ticks: 0,
            over: false,
            pings: 0,
            scores: ScoreBoard::load(store, Self::NAME, 0, 0),
        }
    }

    fn begin(&mut self, ctx: &mut TickContext<'_, SprintTimer>) {
        ctx.after(PING_MS, SprintTimer::Ping);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_, SprintTimer>) {
        if self.over {
            return;
        }
        self.ticks += 1;
        if self.ticks == 4 {
            self.over = true;
            ctx.game_over(Sound::Lose);
        }
    }

    fn timer(&mut self, timer: SprintTimer, _ctx: &mut TickContext<'_, SprintTimer>) {
        match timer {
            SprintTimer::Ping => self.pings += 1,
        }
    }

    fn is_active(&self) -> bool {
        !self.over
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn scores(&self) -> &ScoreBoard {
        &self.scores
    }
}

fn arcade_with(mem: &Rc<RefCell<MemoryStorage>>) -> Arcade<Sprint, RecordingHost> {
    Arcade::new(Store::from_shared(mem.clone()), RecordingHost::new(), 9, 0.0)
}

/// Frames up to and including `to`, starting after `from`
fn frames(arcade: &mut Arcade<Sprint, RecordingHost>, from: f64, to: f64) -> bool {
    let mut now = from;
    let mut restarted = false;
    while now < to {
        now += STEP;
        restarted |= arcade.frame(now, STEP, |_, _| {}).restarted;
    }
    restarted
}

#[test]
fn restart_fires_after_delay_even_while_paused() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    let delay = arcade.settings().game_over_delay_ms;

    frames(&mut arcade, 0.0, 100.0);
    assert!(arcade.game().is_over());
    assert_eq!(arcade.host().plays(Sound::Lose), 1);

    arcade.input(InputEvent::KeyDown(Key::Char('p')), 100.0);
    assert!(arcade.menu().is_paused());

    assert!(!frames(&mut arcade, 100.0, 100.0 + delay - STEP));
    assert_eq!(arcade.session().id(), 1);

    assert!(frames(&mut arcade, 100.0 + delay - STEP, 100.0 + delay));
    assert_eq!(arcade.session().id(), 2);
    assert!(!arcade.game().is_over());
    assert!(!arcade.menu().is_paused());
}

#[test]
fn pause_freezes_active_game() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    frames(&mut arcade, 0.0, 50.0);
    arcade.input(InputEvent::KeyDown(Key::Char('p')), 50.0);

    let mut now = 50.0;
    for _ in 0..10 {
        now += STEP;
        let report = arcade.frame(now, STEP, |_, _| {});
        assert_eq!(report.ticks, 1);
    }
    assert_eq!(arcade.game().ticks, 2);
}

#[test]
fn old_session_timers_never_fire() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    frames(&mut arcade, 0.0, 100.0);
    let restart_at = 100.0 + arcade.settings().game_over_delay_ms;

    assert!(arcade.poll_timers(restart_at));
    assert_eq!(arcade.session().pending_timers(), 1);

    assert!(!arcade.poll_timers(PING_MS));
    assert_eq!(arcade.game().pings, 0);

    assert!(!arcade.poll_timers(restart_at + PING_MS));
    assert_eq!(arcade.game().pings, 1);
}

#[test]
fn render_runs_once_per_frame_after_ticks() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    let mut seen = Vec::new();
    arcade.frame(75.0, 75.0, |game, _| seen.push(game.ticks));
    assert_eq!(seen, vec![3]);
}

#[test]
fn corrupt_saves_fall_back_to_defaults() {
    let mem = Rc::new(RefCell::new(
        MemoryStorage::new()
            .with_item(Menu::STORAGE_KEY, "{not json")
            .with_item(Settings::STORAGE_KEY, "[1, 2")
            .with_item(Sprint::NAME, "\"oops\""),
    ));
    let arcade = arcade_with(&mem);
    assert!(!arcade.menu().is_muted());
    assert!(!arcade.menu().is_paused());
    assert_eq!(arcade.settings().tick_rate_hz, Settings::default().tick_rate_hz);
    assert_eq!(arcade.game().scores.highest, 0);
    assert_eq!(mem.borrow().total_writes(), 0);
}

#[test]
fn pause_twice_writes_twice() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    arcade.input(InputEvent::KeyDown(Key::Char('p')), 0.0);
    arcade.input(InputEvent::KeyUp(Key::Char('p')), 0.0);
    arcade.input(InputEvent::KeyDown(Key::Char('p')), 0.0);
    assert!(!arcade.menu().is_paused());
    assert_eq!(mem.borrow().writes(Menu::STORAGE_KEY), 2);
}

#[test]
fn restart_key_starts_new_session() {
    let mem = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut arcade = arcade_with(&mem);
    frames(&mut arcade, 0.0, 50.0);
    arcade.input(InputEvent::KeyDown(Key::Char('r')), 50.0);
    assert_eq!(arcade.session().id(), 2);
    assert_eq!(arcade.game().ticks, 0);
}
