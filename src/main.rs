//! Doomscroll entry point
//!
//! Headless session driver: plays a scripted session against the feed core
//! at a fixed timestep and prints what happened.
//!
//! Usage: `doomscroll [config.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod session {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use doomscroll::consts::*;
    use doomscroll::gestures::{HoldCharge, HoldEvent, LikeHandler, TapTuning, tap};
    use doomscroll::post::{self, Post, PostKind, PostSpecial};
    use doomscroll::sim::{DragInput, FeedEngine, FeedEvent, StepInput};
    use doomscroll::stats::ScrollStats;
    use doomscroll::{FeedConfig, FeedResult};

    /// Number of posts generated per session
    const FEED_LENGTH: usize = 200;

    /// Scripted player input
    #[derive(Debug, Clone, Copy)]
    pub enum Action {
        Tap,
        HoldBegin,
        HoldRelease,
        Like,
        Drag(DragInput),
        Wheel(f32),
        /// Set a fraction of the visible Negative posts on fire
        Ignite(f32),
    }

    /// Session instance holding all state
    pub struct Session {
        engine: FeedEngine<Post>,
        tap_tuning: TapTuning,
        hold: HoldCharge,
        likes: LikeHandler,
        stats: ScrollStats,
        rng: Pcg32,
        accumulator: f32,
        input: StepInput,
        time: f32,
    }

    impl Session {
        pub fn new(config: FeedConfig, seed: u64) -> FeedResult<Self> {
            let mut engine = FeedEngine::new(config);
            engine.reinitialize(post::feed(seed, FEED_LENGTH), true, 0)?;
            Ok(Self {
                engine,
                tap_tuning: TapTuning::default(),
                hold: HoldCharge::default(),
                likes: LikeHandler::default(),
                stats: ScrollStats::new(),
                rng: Pcg32::seed_from_u64(seed),
                accumulator: 0.0,
                input: StepInput::default(),
                time: 0.0,
            })
        }

        pub fn stats(&self) -> &ScrollStats {
            &self.stats
        }

        pub fn apply(&mut self, action: Action) {
            match action {
                Action::Tap => {
                    tap(&mut self.engine, &self.tap_tuning);
                }
                Action::HoldBegin => self.hold.begin(&mut self.engine),
                Action::HoldRelease => {
                    if let Some(HoldEvent::Cancelled) = self.hold.release() {
                        log::info!("Hold cancelled");
                    }
                }
                Action::Like => {
                    if let Some(post) = self.likes.like(&mut self.engine) {
                        self.stats.track_like(post.kind);
                    }
                }
                Action::Drag(event) => self.input.drag.push(event),
                Action::Wheel(delta) => self.input.wheel += delta,
                Action::Ignite(fraction) => {
                    let converted = self.engine.convert_at_random(
                        &mut self.rng,
                        |p: &Post| p.kind == PostKind::Negative && !p.is_special(),
                        |p: &mut Post| p.set_special(PostSpecial::Fire),
                        fraction,
                    );
                    match converted {
                        Ok(n) => log::info!("Ignited {n} posts"),
                        Err(e) => log::warn!("Ignite failed: {e}"),
                    }
                }
            }
        }

        /// Run simulation steps for one rendered frame
        pub fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = std::mem::take(&mut self.input);
                if let Some(event) = self.hold.update(&mut self.engine, SIM_DT) {
                    log::debug!("Hold: {event:?}");
                }
                let events = self.engine.step_with(&input, SIM_DT);
                self.likes.observe(self.engine.focus_content(), SIM_DT);
                self.report(&events);
                self.stats.observe_all(&events);

                self.accumulator -= SIM_DT;
                self.time += SIM_DT;
                substeps += 1;
            }
        }

        fn report(&self, events: &[FeedEvent<Post>]) {
            for event in events {
                if let FeedEvent::FocusChanged { to, .. } = event {
                    log::debug!("[{:6.2}s] centred {to}", self.time);
                }
            }
        }

        pub fn focus_label(&self) -> String {
            self.engine
                .focus_content()
                .map(Post::label)
                .unwrap_or_else(|| "-".to_string())
        }
    }

    /// Default script: (seconds, action)
    pub fn script() -> Vec<(f32, Action)> {
        vec![
            (0.2, Action::Tap),
            (0.4, Action::Tap),
            (0.6, Action::Tap),
            (1.5, Action::HoldBegin),
            (2.7, Action::HoldRelease),
            (3.5, Action::Like),
            (3.6, Action::Like),
            (4.0, Action::Ignite(0.5)),
            (4.5, Action::Tap),
            (5.0, Action::Drag(DragInput::Begin(0.0))),
            (5.1, Action::Drag(DragInput::Move(-80.0))),
            (5.2, Action::Drag(DragInput::Move(-240.0))),
            (5.3, Action::Drag(DragInput::End)),
            (6.5, Action::Wheel(120.0)),
            (6.6, Action::Wheel(120.0)),
            (7.5, Action::HoldBegin),
            (7.55, Action::HoldRelease),
            (8.0, Action::Like),
        ]
    }

    pub fn run(config: FeedConfig, seed: u64, duration: f32) -> FeedResult<ScrollStats> {
        let mut session = Session::new(config, seed)?;
        let mut script = script().into_iter().peekable();

        // Uneven frame pacing to exercise the accumulator
        let frames = [1.0 / 60.0, 1.0 / 144.0, 1.0 / 30.0, 1.0 / 75.0];
        let mut clock = 0.0;
        let mut frame = 0;
        while clock < duration {
            while let Some((_, action)) = script.next_if(|(at, _)| *at <= clock) {
                log::info!("[{clock:6.2}s] {action:?} on {}", session.focus_label());
                session.apply(action);
            }
            let dt = frames[frame % frames.len()];
            session.update(dt);
            clock += dt;
            frame += 1;
        }

        log::info!("Session over, centred on {}", session.focus_label());
        Ok(session.stats().clone())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use doomscroll::FeedConfig;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Doomscroll (native) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => FeedConfig::load(&path).unwrap_or_else(|e| {
            log::error!("{e}; using default tuning");
            FeedConfig::default()
        }),
        None => FeedConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    match session::run(config, seed, 10.0) {
        Ok(stats) => {
            println!("{}", stats.summary());
            match serde_json::to_string_pretty(&stats) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Could not encode stats: {e}"),
            }
        }
        Err(e) => {
            log::error!("Session failed: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The feed core is a library on the web; there is no headless driver
}
