//! Fixed timestep simulation tick
//!
//! Advances a [`Run`] deterministically. Order within a tick: timers, player,
//! spawners, coin verification and movement, obstacle movement, contacts.
//! Spawns land in the collision world before any coin re-checks itself.

use super::state::{Run, RunSink};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Jump went down this tick
    pub jump_pressed: bool,
    /// Jump is held
    pub jump_held: bool,
    /// Freeze the run; the tick becomes a no-op
    pub paused: bool,
}

/// What a tick did, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub obstacles_spawned: u32,
    pub coins_spawned: u32,
    /// Coins that lost their clearance after spawning
    pub coins_dropped: u32,
    pub coins_collected: u32,
    pub hits: u32,
    pub despawned: u32,
    pub jumped: bool,
}

/// Advance the run by one fixed timestep
pub fn tick<S: RunSink + ?Sized>(run: &mut Run, input: &TickInput, dt: f32, sink: &mut S) -> TickReport {
    let mut report = TickReport::default();
    if input.paused {
        return report;
    }

    run.time += f64::from(dt);
    run.time_ticks += 1;
    run.invulnerable_timer = (run.invulnerable_timer - dt).max(0.0);
    run.speed.advance(dt);

    let outcome = run
        .player
        .step(&run.world, input.jump_pressed, input.jump_held, dt, &run.tuning);
    report.jumped = outcome.jumped;

    spawn(run, &mut report);
    update_coins(run, dt, &mut report);
    update_obstacles(run, dt, &mut report);
    resolve_contacts(run, sink, &mut report);

    report
}

fn spawn(run: &mut Run, report: &mut TickReport) {
    let ctx = run.spawn_context();

    if let Some(obstacle) = run.obstacle_spawner.update(
        &mut run.world,
        &ctx,
        &run.obstacle_prefabs,
        &run.tuning.obstacles,
        &mut run.rng,
    ) {
        run.obstacles.push(obstacle);
        report.obstacles_spawned += 1;
    }

    if let Some(burst) = run.coin_spawner.update(
        &mut run.world,
        &ctx,
        run.coin_prefab.as_ref(),
        &run.tuning.coins,
        &run.tuning.settle,
        &mut run.rng,
    ) {
        report.coins_spawned += burst.coins.len() as u32;
        run.coins.extend(burst.coins);
    }
}

fn update_coins(run: &mut Run, dt: f32, report: &mut TickReport) {
    let distance = run.speed.current_scroll_speed() * dt;
    let world = &mut run.world;
    let settle = &run.tuning.settle;

    run.coins.retain_mut(|coin| {
        if !coin.verify(world, settle) {
            world.remove(coin.id);
            report.coins_dropped += 1;
            return false;
        }
        coin.scroll(world, distance);
        if coin.is_past(settle.kill_x) {
            world.remove(coin.id);
            report.despawned += 1;
            return false;
        }
        true
    });
}

fn update_obstacles(run: &mut Run, dt: f32, report: &mut TickReport) {
    let distance = run.speed.current_scroll_speed() * dt;
    let world = &mut run.world;
    let kill_x = run.tuning.obstacles.kill_x;

    run.obstacles.retain_mut(|obstacle| {
        obstacle.scroll(world, distance);
        if obstacle.is_past(kill_x) {
            world.remove(obstacle.id);
            report.despawned += 1;
            return false;
        }
        true
    });
}

fn resolve_contacts<S: RunSink + ?Sized>(run: &mut Run, sink: &mut S, report: &mut TickReport) {
    let body = run.player.bounds();
    let world = &mut run.world;

    run.coins.retain(|coin| {
        if !body.overlaps_circle(&coin.circle()) {
            return true;
        }
        world.remove(coin.id);
        sink.on_coin_collected(coin.value);
        report.coins_collected += 1;
        false
    });

    let invulnerable = run.invulnerable_timer > 0.0;
    let one_hit = run.tuning.obstacles.one_hit;
    for obstacle in &mut run.obstacles {
        let touching = body.overlaps(&obstacle.bounds());
        if obstacle.touch(touching, one_hit, invulnerable) {
            log::debug!("Player hit obstacle {:?}", obstacle.id);
            sink.on_player_hit();
            report.hits += 1;
        }
    }
}
