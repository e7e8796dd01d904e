/// Movement: player input, NPC walking, and screen-edge wrap.
///
/// Nothing here collides; solid structures are handled afterwards by
/// `interact`, which reverts the player to the snapshot taken at the start
/// of the frame.

use crate::domain::anim::{chicken_frame, grow_crop, player_frame, worker_frame};
use crate::domain::entity::{Command, DirSet, Facing, Lifecycle, Pose, SPRITE};
use crate::domain::geometry::{near, Point};
use super::event::GameEvent;
use super::world::{MAX_SCENE, PlotId, WorkerId, WorldState};

/// Pixels past the edge before the player wraps.
const EDGE_SLACK: f64 = SPRITE / 2.0;

// ── Commands ──

pub fn apply_commands(world: &mut WorldState, commands: &[Command], events: &mut Vec<GameEvent>) {
    for cmd in commands {
        match *cmd {
            Command::Quit => world.exit_requested = true,
            Command::Pause => world.paused = !world.paused,
            Command::ToggleFullscreen => world.fullscreen = !world.fullscreen,
            Command::Action => world.info_overlay = !world.info_overlay,
            Command::SelectScene(n) => {
                let before = world.scene;
                world.set_scene(n);
                if world.scene != before {
                    events.push(GameEvent::SceneChanged { scene: world.scene });
                }
            }
        }
    }
}

// ── Player ──

/// Apply held directions. Moving on two axes at once scales the second
/// axis by the diagonal factor; opposite keys cancel.
pub fn resolve_player(world: &mut WorldState, dirs: DirSet) {
    let base = world.player.speed;
    let diag = world.motion.diagonal_factor;
    let vertical = if dirs.one_horizontal() { base * diag } else { base };
    let horizontal = if dirs.one_vertical() { base * diag } else { base };

    let p = &mut world.player;
    p.direction = dirs;
    let mut facing = None;
    if dirs.down {
        p.sprite.position.y += vertical;
        facing = Some(Facing::Down);
    }
    if dirs.up {
        p.sprite.position.y -= vertical;
        facing = Some(Facing::Up);
    }
    if dirs.left {
        p.sprite.position.x -= horizontal;
        facing = Some(Facing::Left);
    }
    if dirs.right {
        p.sprite.position.x += horizontal;
        facing = Some(Facing::Right);
    }
    p.facing = facing;
    p.sprite.frame_rect = player_frame(facing, world.anim);

    if dirs.any() {
        world.info_overlay = false;
    }
}

/// Wrap the player at screen edges. Crossing left or right also changes
/// scene; the first matching edge wins.
pub fn wrap_edges(world: &mut WorldState) -> Option<GameEvent> {
    let (w, h) = (world.width, world.height);
    let pos = &mut world.player.sprite.position;
    if pos.x < -EDGE_SLACK {
        pos.x = w - EDGE_SLACK;
        if world.scene > 0 {
            world.scene -= 1;
            return Some(GameEvent::SceneChanged { scene: world.scene });
        }
    } else if pos.x > w - EDGE_SLACK {
        pos.x = -EDGE_SLACK;
        if world.scene < MAX_SCENE {
            world.scene += 1;
            return Some(GameEvent::SceneChanged { scene: world.scene });
        }
    } else if pos.y < -EDGE_SLACK {
        pos.y = h - EDGE_SLACK;
    } else if pos.y > h {
        pos.y = -EDGE_SLACK;
    }
    None
}

// ── NPCs ──

/// Step each axis toward `dest` by at most `step`.
pub fn step_toward(pos: Point, dest: Point, step: f64) -> Point {
    let axis = |from: f64, to: f64| {
        if from < to {
            (from + step).min(to)
        } else if from > to {
            (from - step).max(to)
        } else {
            from
        }
    };
    Point::new(axis(pos.x, dest.x), axis(pos.y, dest.y))
}

/// Point each worker at its plot while it carries a coin, or home once
/// its plot has been harvested.
pub fn steer_workers(world: &mut WorldState) {
    for i in 0..world.workers.len() {
        let Some(PlotId(plot)) = world.pairings.plot_of(WorkerId(i)) else {
            continue;
        };
        let Some(crop) = world.crops.get(plot) else {
            continue;
        };
        let w = &mut world.workers[i];
        if w.coin > 0 {
            w.destination = crop.origin;
        } else if crop.state == Lifecycle::Deposited {
            w.destination = w.home;
        }
    }
}

/// A worker standing on its destination is working; anywhere else it is
/// walking.
pub fn move_workers(world: &mut WorldState) {
    let frame = worker_frame(world.anim);
    for w in world.workers.iter_mut() {
        w.sprite.frame_rect = frame;
        if !w.sprite.active {
            continue;
        }
        w.sprite.position = step_toward(w.sprite.position, w.destination, w.speed);
        w.pose = if w.sprite.position == w.destination { Pose::Working } else { Pose::Walking };
    }
}

/// Free chickens roam the whole screen; caught and penned ones stay in
/// the coop pen.
pub fn move_chickens(world: &mut WorldState) {
    let step = world.motion.chicken_step;
    let phase = world.anim;
    for i in 0..world.chickens.len() {
        let c = &mut world.chickens[i];
        let penned = matches!(c.state, Lifecycle::Held | Lifecycle::Deposited);
        if !(penned || c.state == Lifecycle::Ready) {
            c.sprite.frame_rect = chicken_frame(phase, true);
            continue;
        }
        c.sprite.position = step_toward(c.sprite.position, c.destination, step);
        c.sprite.frame_rect = chicken_frame(phase, c.sprite.position == c.destination);
        if near(c.sprite.position, c.destination, SPRITE) {
            let next = if penned { world.coop_pen_point() } else { world.roam_point() };
            world.chickens[i].destination = next;
        }
    }
}

pub fn grow_crops(world: &mut WorldState) {
    let ticks = world.timing.crop_stage_ticks;
    for crop in world.crops.iter_mut() {
        grow_crop(crop, ticks);
    }
}
