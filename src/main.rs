//! games2d entry point
//!
//! On the web the page picks the game with its `game_name` query parameter
//! and draws each frame from a JSON snapshot. Natively the first argument
//! picks the game and a short scripted session runs headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use games2d::input::{InputEvent, Key};
    use games2d::offline;
    use games2d::persistence::Store;
    use games2d::persistence::local::LocalStorage;
    use games2d::platform::web::WebHost;
    use games2d::{Driver, GameKind, launch};

    /// Wall-clock timer poll while frames are suspended (hidden tab)
    const TIMER_POLL_MS: i32 = 100;

    #[wasm_bindgen(inline_js = "
        export function render(snapshot) {
            if (window.games2dRender) window.games2dRender(snapshot);
        }
    ")]
    extern "C" {
        fn render(snapshot: &str);
    }

    struct App {
        driver: Box<dyn Driver>,
        canvas: HtmlCanvasElement,
        screen: (f32, f32),
        last_time: Option<f64>,
    }

    impl App {
        /// Canvas client coordinates to game coordinates
        fn to_game(&self, event: &PointerEvent) -> Vec2 {
            let rect = self.canvas.get_bounding_client_rect();
            let w = rect.width().max(1.0);
            let h = rect.height().max(1.0);
            Vec2::new(
                ((event.client_x() as f64 - rect.left()) / w) as f32 * self.screen.0,
                ((event.client_y() as f64 - rect.top()) / h) as f32 * self.screen.1,
            )
        }

        fn frame(&mut self, time: f64) {
            let elapsed = self.last_time.map_or(0.0, |last| time - last);
            self.last_time = Some(time);
            let now = js_sys::Date::now();
            self.driver.frame(now, elapsed);
            render(&self.driver.snapshot_json());
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            app.borrow_mut().frame(time);
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn listen_pointer(
        canvas: &HtmlCanvasElement,
        app: &Rc<RefCell<App>>,
        name: &str,
        make: fn(Vec2) -> InputEvent,
    ) {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            let mut app = app.borrow_mut();
            let p = app.to_game(&event);
            app.driver.input(make(p), js_sys::Date::now());
        });
        let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn listen_keys(window: &web_sys::Window, app: &Rc<RefCell<App>>, name: &str, down: bool) {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let Some(key) = Key::from_dom(&event.key()) else {
                return;
            };
            if event.repeat() {
                return;
            }
            let event = if down { InputEvent::KeyDown(key) } else { InputEvent::KeyUp(key) };
            app.borrow_mut().driver.input(event, js_sys::Date::now());
        });
        let _ = window.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };
        let search = window.location().search().unwrap_or_default();
        let kind = offline::game_name(&search)
            .and_then(|name| GameKind::from_name(&name))
            .unwrap_or(GameKind::Snakes);
        log::info!("games2d starting {}", kind.name());

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element");
            return;
        };

        let now = js_sys::Date::now();
        let host = WebHost::new();
        let mut driver = launch(kind, Store::new(LocalStorage), host, now as u64, now);
        // The page has no physics engine of its own
        driver.set_contact_detection(true);
        let app = Rc::new(RefCell::new(App {
            driver,
            canvas: canvas.clone(),
            screen: kind.screen_size(),
            last_time: None,
        }));

        listen_pointer(&canvas, &app, "pointerdown", InputEvent::PointerDown);
        listen_pointer(&canvas, &app, "pointermove", InputEvent::PointerMove);
        listen_pointer(&canvas, &app, "pointerup", InputEvent::PointerUp);
        listen_keys(&window, &app, "keydown", true);
        listen_keys(&window, &app, "keyup", false);

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                app.borrow_mut().driver.poll_timers(js_sys::Date::now());
            });
            let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                TIMER_POLL_MS,
            );
            closure.forget();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_app::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use games2d::GameKind;

    env_logger::init();

    let name = std::env::args().nth(1).unwrap_or_else(|| "4snakes".to_string());
    let Some(kind) = GameKind::from_name(&name) else {
        let names: Vec<&str> = GameKind::ALL.iter().map(GameKind::name).collect();
        eprintln!("Unknown game '{}', expected one of: {}", name, names.join(", "));
        std::process::exit(2);
    };

    log::info!("games2d (native) running {} headless", kind.name());
    demo::run(kind);
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;

    use games2d::input::{InputEvent, Key};
    use games2d::platform::RecordingHost;
    use games2d::{GameKind, Store, launch};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const SECONDS: u32 = 20;

    /// Scripted input for frame `n`
    fn script(kind: GameKind, n: u32) -> Vec<InputEvent> {
        let (w, h) = kind.screen_size();
        match (kind, n % 90) {
            (GameKind::Snakes, 0) => vec![InputEvent::KeyDown(Key::Left)],
            (GameKind::Snakes, 20) => vec![InputEvent::KeyUp(Key::Left)],
            (GameKind::Simon, 0) => {
                let p = Vec2::new(w / 2.0, h / 2.0);
                vec![InputEvent::PointerDown(p), InputEvent::PointerUp(p)]
            }
            (GameKind::StrayLines, 45) => {
                let from = Vec2::new(w * 0.3, h * 0.3);
                let to = Vec2::new(w * 0.3, h * 0.3 + 100.0);
                vec![
                    InputEvent::PointerDown(from),
                    InputEvent::PointerMove(to),
                    InputEvent::PointerUp(to),
                ]
            }
            (GameKind::TwinSquares, 30) => vec![InputEvent::KeyDown(Key::Char('a'))],
            (GameKind::TwinSquares, 33) => vec![InputEvent::KeyUp(Key::Char('a'))],
            (GameKind::TwinSquares, 60) => vec![InputEvent::KeyDown(Key::Char('d'))],
            (GameKind::TwinSquares, 63) => vec![InputEvent::KeyUp(Key::Char('d'))],
            _ => Vec::new(),
        }
    }

    pub fn run(kind: GameKind) {
        let mut driver = launch(kind, Store::memory(), RecordingHost::new(), 2024, 0.0);
        driver.set_contact_detection(true);
        let mut now = 0.0;
        let mut sessions = 1;

        for n in 0..SECONDS * 60 {
            for event in script(kind, n) {
                driver.input(event, now);
            }
            now += FRAME_MS;
            let report = driver.frame(now, FRAME_MS);
            if report.restarted {
                sessions += 1;
            }
        }

        let (score, best) = driver.score();
        log::info!(
            "{}: {} sessions, score {}, best {}, over: {}",
            kind.name(),
            sessions,
            score,
            best,
            driver.is_over()
        );
        println!("{}", driver.snapshot_json());
    }
}
