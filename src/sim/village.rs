/// Starting layout of the village.
///
/// Every entity the game will ever use is created here; later play only
/// toggles visibility and lifecycle. Positions are in screen pixels, most
/// of them anchored on the screen centre so a different `[world]` size
/// keeps the same arrangement.

use rand::Rng;

use crate::config::GameConfig;
use crate::domain::entity::{Category, Character, Lifecycle, Pickup, HOUSE_TILE, SPRITE};
use crate::domain::geometry::{Point, random_point};

pub const COIN_SLOTS: usize = 10;
/// Coins lying on the ground at startup; the rest are shrine reserve.
pub const LIVE_COINS: usize = 2;
pub const FLOCK: usize = 10;
pub const EGG_SLOTS: usize = 10;

fn centre(config: &GameConfig) -> Point {
    Point::new(config.world.width as f64 / 2.0, config.world.height as f64 / 2.0)
}

pub fn player(config: &GameConfig) -> Character {
    Character::player(
        Point::new(305.0, 305.0),
        config.motion.player_speed,
        config.rules.base_capacity,
    )
}

/// Workers queue up along the left edge; homes line the top road.
pub fn workers(config: &GameConfig) -> Vec<Character> {
    (0..config.world.workers)
        .map(|i| {
            let i = i as f64;
            Character::worker(
                Point::new(40.0, 20.0 * i + 60.0),
                Point::new(200.0 + 30.0 * i, 90.0),
                config.motion.worker_step,
            )
        })
        .collect()
}

/// One plot per worker, wheat along the bottom field and tomatoes along
/// the top field, interleaved so plot `i` belongs to worker `i`.
pub fn crops(config: &GameConfig) -> Vec<Pickup> {
    (0..config.world.workers)
        .map(|i| {
            let col = (i / 2) as f64;
            let (category, pos) = if i % 2 == 0 {
                (Category::Wheat, Point::new(178.0 + 40.0 * col, 300.0))
            } else {
                (Category::Tomato, Point::new(60.0 + 40.0 * col, 40.0))
            };
            let mut crop = Pickup::new(category, pos, Lifecycle::Dormant, false);
            crop.sprite.frame = 1;
            crop
        })
        .collect()
}

pub fn coins(config: &GameConfig) -> Vec<Pickup> {
    let c = centre(config);
    (1..=COIN_SLOTS)
        .map(|i| {
            let pos = Point::new(c.x + 30.0 + 10.0 * i as f64, c.y + 34.0);
            if i <= LIVE_COINS {
                Pickup::new(Category::Coin, pos, Lifecycle::Ready, true)
            } else {
                Pickup::new(Category::Coin, pos, Lifecycle::Dormant, false)
            }
        })
        .collect()
}

pub fn chickens<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Vec<Pickup> {
    let (w, h) = (config.world.width, config.world.height);
    (0..FLOCK)
        .map(|_| {
            let mut c = Pickup::new(Category::Chicken, random_point(rng, w, h), Lifecycle::Ready, true);
            c.destination = random_point(rng, w, h);
            c
        })
        .collect()
}

/// Egg slots stacked beside the chicken house, hidden until a flock is
/// penned.
pub fn eggs(config: &GameConfig) -> Vec<Pickup> {
    let c = centre(config);
    (1..=EGG_SLOTS)
        .map(|i| {
            Pickup::new(
                Category::Egg,
                Point::new(560.0, c.y + 10.0 * i as f64),
                Lifecycle::Dormant,
                false,
            )
        })
        .collect()
}

pub fn structures(config: &GameConfig) -> Vec<Pickup> {
    let c = centre(config);
    let building = |category, x: f64, y: f64, active| {
        Pickup::new(category, Point::new(x, y), Lifecycle::Dormant, active)
    };
    vec![
        building(Category::House, 250.0, HOUSE_TILE, true),
        building(Category::House, 100.0, 100.0, true),
        building(Category::SmallHouse, 400.0, SPRITE, true),
        building(Category::SmallHouse, 500.0, SPRITE, true),
        building(Category::Shrine, c.x + HOUSE_TILE, c.y + HOUSE_TILE, true),
        building(Category::NewHouse, 250.0, HOUSE_TILE, false),
        building(Category::NewHouse, 100.0, 100.0, false),
        building(Category::NewHouseSmall, 400.0, SPRITE, false),
        building(Category::NewHouseSmall, 500.0, SPRITE, false),
        building(Category::ChickenHouse, 550.0, c.y - HOUSE_TILE, true),
    ]
}

pub fn shrine_items(config: &GameConfig) -> Vec<Pickup> {
    vec![Pickup::new(Category::Chest, centre(config), Lifecycle::Dormant, false)]
}
