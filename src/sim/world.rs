/// WorldState: the complete state of a running village.
///
/// One flat aggregate owns every entity collection; nothing is shared
/// between collections and nothing is created or destroyed after startup.
/// Entities leave play by clearing `sprite.active` or changing `Lifecycle`.
///
/// Workers are tied to crop plots through `Pairings`, a lookup table in
/// both directions, so no pass relies on two vectors sharing an index.

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, MotionConfig, RulesConfig, TimingConfig};
use crate::domain::anim::{AnimClock, AnimPhase};
use crate::domain::entity::{Character, Pickup};
use crate::domain::geometry::{Point, random_point};
use super::village;

/// Highest scene index; scenes are `0..=MAX_SCENE`.
pub const MAX_SCENE: u8 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WorkerId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlotId(pub usize);

/// Worker ↔ crop plot assignment.
#[derive(Clone, Debug, Default)]
pub struct Pairings {
    plot_by_worker: HashMap<WorkerId, PlotId>,
    worker_by_plot: HashMap<PlotId, WorkerId>,
}

impl Pairings {
    pub fn new() -> Self {
        Pairings::default()
    }

    /// Assign `plot` to `worker`, dropping any previous assignment of either.
    pub fn assign(&mut self, worker: WorkerId, plot: PlotId) {
        if let Some(old_plot) = self.plot_by_worker.remove(&worker) {
            self.worker_by_plot.remove(&old_plot);
        }
        if let Some(old_worker) = self.worker_by_plot.remove(&plot) {
            self.plot_by_worker.remove(&old_worker);
        }
        self.plot_by_worker.insert(worker, plot);
        self.worker_by_plot.insert(plot, worker);
    }

    pub fn plot_of(&self, worker: WorkerId) -> Option<PlotId> {
        self.plot_by_worker.get(&worker).copied()
    }

    pub fn worker_of(&self, plot: PlotId) -> Option<WorkerId> {
        self.worker_by_plot.get(&plot).copied()
    }

    pub fn len(&self) -> usize {
        self.plot_by_worker.len()
    }
}

pub struct WorldState {
    // ── Screen ──
    pub width: f64,
    pub height: f64,

    // ── Entities ──
    pub player: Character,
    pub workers: Vec<Character>,
    pub coins: Vec<Pickup>,
    pub chickens: Vec<Pickup>,
    pub eggs: Vec<Pickup>,
    pub crops: Vec<Pickup>,
    pub structures: Vec<Pickup>,
    /// Rewards spawned by the shrine (the chest).
    pub shrine_items: Vec<Pickup>,
    pub pairings: Pairings,

    // ── Progression ──
    pub scene: u8,
    pub shrine_trade_counter: u32,
    pub rebuilt: bool,

    // ── Presentation flags ──
    pub shrine_glow: u32,
    pub smoke: bool,
    pub info_overlay: bool,
    pub paused: bool,
    pub fullscreen: bool,
    pub exit_requested: bool,

    // ── Timing ──
    pub clock: AnimClock,
    /// Animation phase of the current frame, shared with the renderer.
    pub anim: AnimPhase,
    pub frame: u64,

    // ── Tuning ──
    pub timing: TimingConfig,
    pub motion: MotionConfig,
    pub rules: RulesConfig,

    pub rng: StdRng,
}

impl WorldState {
    pub fn new(config: &GameConfig, now: Instant) -> Self {
        WorldState::with_rng(config, now, StdRng::from_entropy())
    }

    pub fn with_rng(config: &GameConfig, now: Instant, mut rng: StdRng) -> Self {
        let width = config.world.width as f64;
        let height = config.world.height as f64;

        let player = village::player(config);
        let workers = village::workers(config);
        let crops = village::crops(config);
        let mut pairings = Pairings::new();
        for i in 0..workers.len().min(crops.len()) {
            pairings.assign(WorkerId(i), PlotId(i));
        }

        WorldState {
            width,
            height,
            player,
            workers,
            coins: village::coins(config),
            chickens: village::chickens(config, &mut rng),
            eggs: village::eggs(config),
            crops,
            structures: village::structures(config),
            shrine_items: village::shrine_items(config),
            pairings,
            scene: 0,
            shrine_trade_counter: 0,
            rebuilt: false,
            shrine_glow: 0,
            smoke: false,
            info_overlay: true,
            paused: false,
            fullscreen: false,
            exit_requested: false,
            clock: AnimClock::new(config.timing.anim_interval(), now),
            anim: AnimPhase::default(),
            frame: 0,
            timing: config.timing.clone(),
            motion: config.motion.clone(),
            rules: config.rules.clone(),
            rng,
        }
    }

    pub fn set_scene(&mut self, scene: u8) {
        self.scene = scene.min(MAX_SCENE);
    }

    // ── Fixed points of the village ──

    /// Where the shrine drops the player after a visit.
    pub fn shrine_landing(&self) -> Point {
        Point::new(self.width / 2.0 + 20.0, self.height / 2.0 + 60.0)
    }

    /// Where a caught chicken is put, and where it first walks to.
    pub fn coop_staging(&self) -> (Point, Point) {
        (Point::new(550.0, 150.0), Point::new(570.0, 250.0))
    }

    /// Random point inside the fenced area next to the chicken house.
    pub fn coop_pen_point(&mut self) -> Point {
        let (w, h) = (self.width, self.height);
        let p = random_point(&mut self.rng, w as u32, h as u32);
        Point::new(
            p.x.clamp(500.0_f64.min(w - 20.0), w - 20.0),
            p.y.clamp(h / 2.0 - 50.0, (h - 100.0).max(h / 2.0 - 50.0)),
        )
    }

    pub fn roam_point(&mut self) -> Point {
        let (w, h) = (self.width as u32, self.height as u32);
        random_point(&mut self.rng, w, h)
    }

    /// Off-screen parking spot for collected coins.
    pub fn offscreen(&self) -> Point {
        Point::new(-100.0, -100.0)
    }

    // ── HUD ──

    pub fn inventory(&self) -> Inventory {
        let p = &self.player;
        Inventory {
            coin: p.coin,
            wallet: p.wallet_capacity,
            tomato: p.tomato_count,
            wheat: p.wheat_count,
            basket: p.basket_capacity,
            chicken: p.chicken_held,
            penned: p.chicken_deposited_count,
            egg: p.egg_held,
            trades: self.shrine_trade_counter,
            workers: self.workers.iter().filter(|w| w.sprite.active).count(),
            scene: self.scene,
        }
    }
}

/// Player counters as shown on the HUD.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Inventory {
    pub coin: u32,
    pub wallet: u32,
    pub tomato: u32,
    pub wheat: u32,
    pub basket: u32,
    pub chicken: u32,
    pub penned: u32,
    pub egg: u32,
    pub trades: u32,
    pub workers: usize,
    pub scene: u8,
}

impl std::fmt::Display for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Coins {}/{}  Tomato {}  Wheat {}  Basket {}/{}  Hen {}  Pen {}  Egg {}  Offerings {}  Workers {}  Scene {}",
            self.coin, self.wallet,
            self.tomato, self.wheat,
            self.tomato + self.wheat, self.basket,
            self.chicken, self.penned, self.egg,
            self.trades, self.workers, self.scene,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_world as world;

    #[test]
    fn pairings_are_symmetric() {
        let w = world();
        assert_eq!(w.pairings.len(), 10);
        for i in 0..10 {
            let plot = w.pairings.plot_of(WorkerId(i)).unwrap();
            assert_eq!(w.pairings.worker_of(plot), Some(WorkerId(i)));
        }
    }

    #[test]
    fn reassigning_drops_stale_links() {
        let mut p = Pairings::new();
        p.assign(WorkerId(0), PlotId(3));
        p.assign(WorkerId(1), PlotId(3));
        assert_eq!(p.plot_of(WorkerId(0)), None);
        assert_eq!(p.worker_of(PlotId(3)), Some(WorkerId(1)));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn scene_is_clamped() {
        let mut w = world();
        w.set_scene(9);
        assert_eq!(w.scene, MAX_SCENE);
    }

    #[test]
    fn pen_points_stay_in_pen() {
        let mut w = world();
        for _ in 0..200 {
            let p = w.coop_pen_point();
            assert!(p.x >= 500.0 && p.x <= 620.0);
            assert!(p.y >= 130.0 && p.y <= 260.0);
        }
    }

    #[test]
    fn inventory_formats_counters() {
        let mut w = world();
        w.player.coin = 1;
        w.player.tomato_count = 1;
        let text = w.inventory().to_string();
        assert!(text.starts_with("Coins 1/2  Tomato 1  Wheat 0  Basket 1/2"));
    }
}
