/// Animation timing: the tick flip-flop and the frame selectors built on it.
///
/// `AnimClock` toggles a boolean every `interval`. Combined with whether the
/// current moment is in the first or second half of the interval, that
/// gives a 4-phase cycle (`AnimPhase::quarter`) shared by every looping
/// animation. The phase is computed once per frame and stored on the world,
/// so the renderer reads the same phase the simulation used.
///
/// Crop growth is separate: a per-crop counter advanced every frame.

use std::time::{Duration, Instant};

use super::entity::{Facing, Lifecycle, Pickup, SPRITE};
use super::geometry::Rect;

/// Number of growth stages; the last one is harvestable.
pub const CROP_STAGES: u32 = 5;

#[derive(Clone, Debug)]
pub struct AnimClock {
    interval: Duration,
    last_flip: Instant,
    tick: bool,
}

impl AnimClock {
    pub fn new(interval: Duration, now: Instant) -> Self {
        AnimClock { interval, last_flip: now, tick: false }
    }

    /// Toggle once if at least `interval` has passed since the last flip.
    /// Returns whether a flip happened.
    pub fn update(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_flip) < self.interval {
            return false;
        }
        self.tick = !self.tick;
        self.last_flip = now;
        true
    }

    pub fn tick(&self) -> bool {
        self.tick
    }

    pub fn last_flip(&self) -> Instant {
        self.last_flip
    }

    pub fn phase(&self, now: Instant) -> AnimPhase {
        AnimPhase {
            tick: self.tick,
            early: now.saturating_duration_since(self.last_flip) < self.interval / 2,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AnimPhase {
    pub tick: bool,
    /// Within the first half of the current interval.
    pub early: bool,
}

impl AnimPhase {
    /// 4-phase index in 0..4.
    pub fn quarter(self) -> u32 {
        match (self.tick, self.early) {
            (true, false) => 0,
            (true, true) => 1,
            (false, false) => 2,
            (false, true) => 3,
        }
    }
}

// ── Looping selectors (x offsets into a horizontal strip) ──

pub fn coin_glint(phase: AnimPhase) -> u32 {
    phase.quarter() * 10
}

pub fn chicken_walk(phase: AnimPhase) -> u32 {
    phase.quarter() * 16
}

/// 16px tile of the chicken strip. A chicken at rest shows the first tile.
pub fn chicken_frame(phase: AnimPhase, resting: bool) -> Rect {
    let x = if resting { 0 } else { chicken_walk(phase) as i32 };
    Rect::new(x, 0, x + 16, 16)
}

pub fn smoke_puff(phase: AnimPhase) -> u32 {
    (phase.quarter() + 1) * 32
}

/// Chest sheet is 16px tiles; the open lid sits three tiles to the right.
pub fn chest_lid(phase: AnimPhase) -> Rect {
    let t = 16;
    if phase.tick {
        Rect::new(t * 4, t, t * 5, t * 2)
    } else {
        Rect::new(t, t, t * 2, t * 2)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShrineLook {
    Weathered,
    Gray,
    GrayPearl,
    Orange,
    OrangePearl,
}

/// Shrine appearance: glowing cycle after a visit, otherwise by scene.
pub fn shrine_look(scene: u8, glowing: bool, phase: AnimPhase) -> ShrineLook {
    if glowing {
        return match phase.quarter() {
            0 => ShrineLook::Gray,
            1 => ShrineLook::OrangePearl,
            2 => ShrineLook::Orange,
            _ => ShrineLook::GrayPearl,
        };
    }
    if scene == 0 { ShrineLook::Weathered } else { ShrineLook::OrangePearl }
}

// ── Character frames (48px cells of the character sheet) ──

fn cell(col: i32, row: i32) -> Rect {
    let s = SPRITE as i32;
    Rect::new(col * s, row * s, (col + 1) * s, (row + 1) * s)
}

/// Front-facing idle frame, alternating on the tick.
pub fn idle_frame(phase: AnimPhase) -> Rect {
    if phase.tick { cell(0, 0) } else { cell(1, 0) }
}

pub fn player_frame(facing: Option<Facing>, phase: AnimPhase) -> Rect {
    let t = phase.tick;
    match facing {
        None => idle_frame(phase),
        Some(Facing::Down) => if t { cell(2, 0) } else { cell(3, 0) },
        Some(Facing::Up) => if t { cell(2, 1) } else { cell(3, 1) },
        Some(Facing::Left) => if t { cell(2, 2) } else { cell(3, 2) },
        Some(Facing::Right) => if t { cell(0, 3) } else { cell(2, 3) },
    }
}

pub fn worker_frame(phase: AnimPhase) -> Rect {
    idle_frame(phase)
}

// ── Crop growth ──

/// Advance an active growing crop by one frame. Stage `CROP_STAGES` makes
/// it harvestable.
pub fn grow_crop(crop: &mut Pickup, stage_ticks: u32) {
    if !crop.sprite.active || !matches!(crop.state, Lifecycle::Growing(_)) {
        return;
    }
    let stage_ticks = stage_ticks.max(1);
    if crop.sprite.frame_counter < stage_ticks.saturating_mul(CROP_STAGES) {
        crop.sprite.frame_counter += 1;
    }
    let stage = (crop.sprite.frame_counter / stage_ticks).saturating_add(1).min(CROP_STAGES);
    crop.sprite.frame = stage;
    crop.state = if stage >= CROP_STAGES {
        Lifecycle::Ready
    } else {
        Lifecycle::Growing(stage as u8)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Category;
    use crate::domain::geometry::Point;

    const T: Duration = Duration::from_millis(250);

    #[test]
    fn clock_holds_below_interval() {
        let t0 = Instant::now();
        let mut c = AnimClock::new(T, t0);
        for ms in [0, 1, 100, 249] {
            assert!(!c.update(t0 + Duration::from_millis(ms)));
            assert!(!c.tick());
        }
        assert_eq!(c.last_flip(), t0);
    }

    #[test]
    fn clock_flips_once_and_resets() {
        let t0 = Instant::now();
        let mut c = AnimClock::new(T, t0);
        let t1 = t0 + Duration::from_millis(400);
        assert!(c.update(t1));
        assert!(c.tick());
        assert_eq!(c.last_flip(), t1);
        // Same instant again: no second flip.
        assert!(!c.update(t1));
        assert!(c.tick());
        assert!(c.update(t1 + T));
        assert!(!c.tick());
    }

    #[test]
    fn phase_splits_interval_in_half() {
        let t0 = Instant::now();
        let c = AnimClock::new(T, t0);
        assert!(c.phase(t0 + Duration::from_millis(10)).early);
        assert!(!c.phase(t0 + Duration::from_millis(125)).early);
    }

    #[test]
    fn quarter_cycles_through_all_four() {
        let all = [
            AnimPhase { tick: true, early: false },
            AnimPhase { tick: true, early: true },
            AnimPhase { tick: false, early: false },
            AnimPhase { tick: false, early: true },
        ];
        let q: Vec<u32> = all.iter().map(|p| p.quarter()).collect();
        assert_eq!(q, vec![0, 1, 2, 3]);
        assert_eq!(coin_glint(all[3]), 30);
        assert_eq!(chicken_walk(all[2]), 32);
        assert_eq!(chicken_frame(all[2], false), Rect::new(32, 0, 48, 16));
        assert_eq!(chicken_frame(all[2], true), Rect::new(0, 0, 16, 16));
        assert_eq!(smoke_puff(all[0]), 32);
        assert_eq!(smoke_puff(all[3]), 128);
    }

    #[test]
    fn player_frames_follow_facing() {
        let on = AnimPhase { tick: true, early: false };
        let off = AnimPhase { tick: false, early: false };
        assert_eq!(player_frame(None, on), Rect::new(0, 0, 48, 48));
        assert_eq!(player_frame(None, off), Rect::new(48, 0, 96, 48));
        assert_eq!(player_frame(Some(Facing::Up), on), Rect::new(96, 48, 144, 96));
        assert_eq!(player_frame(Some(Facing::Right), off), Rect::new(96, 144, 144, 192));
    }

    #[test]
    fn shrine_look_depends_on_scene_when_idle() {
        let p = AnimPhase::default();
        assert_eq!(shrine_look(0, false, p), ShrineLook::Weathered);
        assert_eq!(shrine_look(1, false, p), ShrineLook::OrangePearl);
        assert_eq!(shrine_look(0, true, AnimPhase { tick: true, early: false }), ShrineLook::Gray);
    }

    fn sown_crop() -> Pickup {
        let mut c = Pickup::new(Category::Wheat, Point::default(), Lifecycle::Growing(1), true);
        c.sprite.frame = 1;
        c
    }

    #[test]
    fn crop_steps_through_stages() {
        let mut c = sown_crop();
        grow_crop(&mut c, 120);
        assert_eq!(c.sprite.frame, 1);
        for _ in 1..120 { grow_crop(&mut c, 120); }
        assert_eq!(c.sprite.frame_counter, 120);
        assert_eq!(c.state, Lifecycle::Growing(2));
        for _ in 0..(120 * 3) { grow_crop(&mut c, 120); }
        assert_eq!(c.sprite.frame, 5);
        assert!(c.pickable());
    }

    #[test]
    fn ready_crop_stops_counting() {
        let mut c = sown_crop();
        for _ in 0..1000 { grow_crop(&mut c, 10); }
        assert_eq!(c.sprite.frame_counter, 40);
        assert_eq!(c.state, Lifecycle::Ready);
    }

    #[test]
    fn huge_stage_length_keeps_growing() {
        let mut c = sown_crop();
        grow_crop(&mut c, 1_000_000_000);
        assert_eq!(c.sprite.frame_counter, 1);
        assert_eq!(c.state, Lifecycle::Growing(1));
        c.sprite.frame_counter = u32::MAX;
        grow_crop(&mut c, 1);
        assert_eq!(c.sprite.frame_counter, u32::MAX);
        assert_eq!(c.state, Lifecycle::Ready);
    }

    #[test]
    fn inactive_crop_does_not_grow() {
        let mut c = sown_crop();
        c.sprite.active = false;
        grow_crop(&mut c, 1);
        assert_eq!(c.sprite.frame_counter, 0);
        assert_eq!(c.state, Lifecycle::Growing(1));
    }
}
