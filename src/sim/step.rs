/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Exit check
///   2. Commands (pause, overlay, scene select, fullscreen, quit)
///   3. Position snapshot + player movement
///   4. Animation clock
///   5. (paused: stop here)
///   6. NPC movement, crop growth, shrine glow, edge wrap
///   7. Contact rules (see `interact`)
///   8. Greedy reset
///
/// The animation clock keeps running while paused so overlays can blink.

use std::time::Instant;

use crate::domain::entity::FrameInput;
use super::event::GameEvent;
use super::world::WorldState;
use super::{interact, movement, progression};

pub fn step(world: &mut WorldState, input: FrameInput, now: Instant) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if world.exit_requested {
        return events;
    }

    movement::apply_commands(world, &input.commands, &mut events);
    if world.exit_requested {
        return events;
    }

    world.player.sprite.snapshot();
    if !world.paused {
        movement::resolve_player(world, input.dirs);
    }

    world.clock.update(now);
    world.anim = world.clock.phase(now);
    if world.paused {
        return events;
    }

    world.frame += 1;
    world.smoke = false;

    movement::move_chickens(world);
    movement::grow_crops(world);
    movement::steer_workers(world);
    movement::move_workers(world);
    world.shrine_glow = world.shrine_glow.saturating_sub(1);
    if let Some(ev) = movement::wrap_edges(world) {
        events.push(ev);
    }

    interact::resolve(world, &mut events);
    progression::greedy_reset(world, &mut events);

    for ev in &events {
        tracing::trace!(frame = world.frame, event = ?ev);
    }
    events
}
