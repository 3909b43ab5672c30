//=========================================================================
// Frame Loop Demo
//
// Title screen → gameplay → pause overlay → gameplay → exit, driven by
// messages and queued state transitions.
//
// Run with:
//   RUST_LOG=debug cargo run --example frame_loop
//
//=========================================================================

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use env_logger::{Builder, Env};
use log::info;

use frame_driver::prelude::*;

//=== Message Types =======================================================

const START_GAME: MessageType = MessageType(1);
const SCORE: MessageType = MessageType(2);

//=== Systems =============================================================

#[derive(Default)]
struct Physics {
    flags: SystemFlags,
    simulated: f64,
}

impl EngineSystem for Physics {
    fn flags(&self) -> &SystemFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut SystemFlags {
        &mut self.flags
    }

    fn on_update(&mut self, delta_time: f64) {
        self.simulated += delta_time;
    }

    fn on_render(&mut self) {}
}

#[derive(Default)]
struct Renderer {
    flags: SystemFlags,
    frames: u64,
}

impl EngineSystem for Renderer {
    fn flags(&self) -> &SystemFlags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut SystemFlags {
        &mut self.flags
    }

    fn on_update(&mut self, _delta_time: f64) {}

    fn on_render(&mut self) {
        if self.is_visible() {
            self.frames += 1;
        }
    }
}

//=== Listeners ===========================================================

/// Counts SCORE messages and their payloads.
#[derive(Default)]
struct Scoreboard {
    total: u32,
}

impl Listener for Scoreboard {
    fn on_message(&mut self, msg: &Message, _bus: &mut MessageBus) -> bool {
        if let Some(points) = msg.payload::<u32>() {
            self.total += points;
        }
        true
    }
}

/// Logs every message it sees without consuming any.
struct Tracer;

impl Listener for Tracer {
    fn on_message(&mut self, msg: &Message, _bus: &mut MessageBus) -> bool {
        log::trace!("message {} at {:.3}s", msg.kind(), msg.timestamp());
        false
    }
}

//=== States ==============================================================

struct Title {
    systems: SystemLists,
    launcher: Rc<RefCell<LaunchRequest>>,
}

/// Records START_GAME; the title state turns it into a transition.
struct LaunchRequest {
    gameplay: StateRef,
    launched: bool,
}

impl Listener for LaunchRequest {
    fn on_message(&mut self, _msg: &Message, _bus: &mut MessageBus) -> bool {
        self.launched = true;
        true
    }
}

impl State for Title {
    fn enter(&mut self, context: &mut GlobalContext) {
        info!("Title screen");
        context
            .message_bus
            .add_listener(self.launcher.clone(), START_GAME);
    }

    fn exit(&mut self, context: &mut GlobalContext) {
        context
            .message_bus
            .delete_listener(&self.launcher, START_GAME);
    }

    fn systems(&self) -> &SystemLists {
        &self.systems
    }

    fn on_update(&mut self, delta_time: f64, context: &mut GlobalContext) {
        self.systems.update(delta_time);

        let mut request = self.launcher.borrow_mut();
        if request.launched {
            request.launched = false;
            context.queue_state_change(request.gameplay.clone());
        }
    }
}

struct Gameplay {
    systems: SystemLists,
    pause_overlay: StateRef,
}

impl State for Gameplay {
    fn enter(&mut self, _context: &mut GlobalContext) {
        info!("Gameplay started");
    }

    fn exit(&mut self, _context: &mut GlobalContext) {
        info!("Gameplay suspended");
    }

    fn systems(&self) -> &SystemLists {
        &self.systems
    }

    fn on_update(&mut self, delta_time: f64, context: &mut GlobalContext) {
        self.systems.update(delta_time);

        let frame = context.time().frame;
        if frame % 20 == 0 {
            let score = Message::with_payload(SCORE, context.timestamp(), 10u32);
            let _ = context.message_bus.queue_message(score);
        }
        if frame == 60 {
            context.queue_state_change(self.pause_overlay.clone());
        }
    }
}

struct PauseOverlay {
    systems: SystemLists,
    opened_at: u64,
}

impl State for PauseOverlay {
    fn enter(&mut self, context: &mut GlobalContext) {
        info!("Paused");
        self.opened_at = context.time().frame;
    }

    fn exit(&mut self, _context: &mut GlobalContext) {
        info!("Resumed");
    }

    fn systems(&self) -> &SystemLists {
        &self.systems
    }

    fn on_update(&mut self, _delta_time: f64, context: &mut GlobalContext) {
        if context.time().frame >= self.opened_at + 15 {
            context.queue_state_pop();
        }
    }
}

//=== Main ================================================================

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let physics = Rc::new(RefCell::new(Physics::default()));
    let renderer = Rc::new(RefCell::new(Renderer::default()));

    let mut gameplay_systems = SystemLists::new();
    gameplay_systems.push_back_update(physics.clone());
    gameplay_systems.push_back_render(renderer.clone());

    let mut overlay_systems = SystemLists::new();
    overlay_systems.push_back_render(renderer.clone());

    let pause_overlay: StateRef = Rc::new(RefCell::new(PauseOverlay {
        systems: overlay_systems,
        opened_at: 0,
    }));
    let gameplay: StateRef = Rc::new(RefCell::new(Gameplay {
        systems: gameplay_systems,
        pause_overlay,
    }));
    let title = Rc::new(RefCell::new(Title {
        systems: SystemLists::new(),
        launcher: Rc::new(RefCell::new(LaunchRequest {
            gameplay,
            launched: false,
        })),
    }));

    let mut engine = EngineBuilder::new()
        .with_tps(120.0)
        .with_max_dispatch_attempts(8)
        .build();

    let scoreboard = Rc::new(RefCell::new(Scoreboard::default()));
    engine.add_listener(scoreboard.clone(), SCORE);
    engine.add_wildcard_listener(Rc::new(RefCell::new(Tracer)));
    engine.push_state(title);

    // Input arrives from another thread.
    let poster = engine.poster();
    let input = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        if let Err(e) = poster.post(Message::new(START_GAME, 0.0)) {
            log::error!("Failed to post start: {}", e);
        }
    });

    engine.run(|engine| {
        if engine.frame_count() >= 240 {
            TickControl::Exit
        } else {
            TickControl::Continue
        }
    });

    if input.join().is_err() {
        log::error!("Input thread panicked");
    }

    info!(
        "Simulated {:.2}s over {} rendered frames, score {}",
        physics.borrow().simulated,
        renderer.borrow().frames,
        scoreboard.borrow().total
    );
    engine.shutdown();
}
