//! Dash Runner entry point
//!
//! Headless runner: plays a seeded run with a simple autopilot and logs what
//! the spawners produced.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;

    use dash_runner::Tuning;
    use dash_runner::consts::*;
    use dash_runner::sim::{HeightMode, ObstacleKind, Run, RunSink, TickInput, tick};

    /// Simulate an endless-runner session without a window.
    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    struct CliArgs {
        /// Run seed
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        /// Simulated seconds
        #[arg(long, value_name = "SECONDS", default_value_t = 60.0)]
        seconds: f32,
        /// Frame rate the fixed-step loop is driven at
        #[arg(long, value_name = "FPS", default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
        fps: u32,
        /// Tuning JSON; defaults are used if missing or invalid
        #[arg(long, value_name = "PATH")]
        tuning: Option<PathBuf>,
        /// Revive after each hit instead of counting it only
        #[arg(long)]
        revive: bool,
    }

    /// Running totals fed by the simulation
    #[derive(Debug, Default)]
    struct RunTally {
        coins: u64,
        hits: u32,
        pending_revive: bool,
    }

    impl RunSink for RunTally {
        fn on_coin_collected(&mut self, value: u32) {
            self.coins += u64::from(value);
        }

        fn on_player_hit(&mut self) {
            self.hits += 1;
            self.pending_revive = true;
        }
    }

    /// Jumps over what is coming, runs under high bars
    #[derive(Debug, Default)]
    struct Autopilot {
        /// Pending second press for a double-jump bar
        want_double: bool,
    }

    impl Autopilot {
        fn input(&mut self, run: &Run) -> TickInput {
            let body = run.player.bounds();
            let motion = &run.player.motion;
            let lookahead = run.speed.current_scroll_speed() * 0.25;

            let next = run
                .obstacles
                .iter()
                .filter(|o| o.bounds().min.x > body.max.x - 0.1)
                .min_by(|a, b| a.bounds().min.x.total_cmp(&b.bounds().min.x));

            let mut input = TickInput {
                jump_held: motion.vertical_velocity > 0.0,
                ..Default::default()
            };
            if let Some(obstacle) = next {
                let close = obstacle.bounds().min.x - body.max.x < lookahead;
                match obstacle.kind {
                    ObstacleKind::Overhead(HeightMode::RunUnder) => {}
                    ObstacleKind::Overhead(HeightMode::DoubleJump) if close && motion.grounded => {
                        input.jump_pressed = true;
                        self.want_double = true;
                    }
                    _ if close && motion.grounded => input.jump_pressed = true,
                    _ => {}
                }
            }
            if self.want_double && !motion.grounded && motion.vertical_velocity < 1.0 {
                input.jump_pressed = true;
                self.want_double = false;
            }
            input.jump_held |= input.jump_pressed;
            input
        }
    }

    pub fn run() {
        env_logger::init();
        let args = CliArgs::parse();
        log::info!("Dash Runner (headless) starting...");

        let tuning = match &args.tuning {
            Some(path) => Tuning::load_or_default(path),
            None => Tuning::default(),
        };
        let mut run = Run::new(args.seed, tuning);
        let mut tally = RunTally::default();
        let mut pilot = Autopilot::default();

        let frame_dt = 1.0 / args.fps as f32;
        let frames = (args.seconds.max(0.0) * args.fps as f32) as u64;
        let mut accumulator = 0.0;
        let (mut obstacles, mut coins, mut dropped) = (0u32, 0u32, 0u32);

        for _ in 0..frames {
            accumulator += frame_dt.min(0.1);

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = pilot.input(&run);
                let report = tick(&mut run, &input, SIM_DT, &mut tally);
                obstacles += report.obstacles_spawned;
                coins += report.coins_spawned;
                dropped += report.coins_dropped;
                accumulator -= SIM_DT;
                substeps += 1;

                if args.revive && tally.pending_revive {
                    tally.pending_revive = false;
                    run.revive();
                }
            }
        }

        log::info!(
            "{:.1}s simulated: {} obstacles, {} coins spawned ({} dropped after spawn)",
            run.time,
            obstacles,
            coins,
            dropped
        );
        log::info!(
            "Type balance {:?}, height balance {:?}, lane balance {:?}",
            run.obstacle_spawner.type_counters.counts(),
            run.obstacle_spawner.height_counters.counts(),
            run.coin_spawner.lane_counters.counts()
        );
        println!(
            "seed {}: {} coins collected, {} hits in {:.1}s",
            run.seed, tally.coins, tally.hits, run.time
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner in the browser; the library is the product there
}
