/// Shrine trades, worker unlocks, the village rebuild, the chicken pen,
/// and the greedy reset.
///
/// Unlocks only ever switch things on. Every threshold check is guarded by
/// the state it would change, so running it again is a no-op.

use crate::domain::entity::{Category, Lifecycle};
use super::event::GameEvent;
use super::world::WorldState;

/// Workers switched on by the first shrine visit.
pub const STARTER_WORKERS: usize = 2;

/// Coins paid by the shrine for one crop of each kind.
fn trade_value(category: Category) -> u32 {
    match category {
        Category::Tomato => 2,
        _ => 1,
    }
}

pub fn visit_shrine(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.player.sprite.position = world.shrine_landing();
    world.shrine_glow = world.timing.shrine_glow_frames;
    events.push(GameEvent::ShrineVisited);

    trade(world, Category::Tomato, events);
    trade(world, Category::Wheat, events);
    offer_egg(world, events);

    for i in 0..STARTER_WORKERS.min(world.workers.len()) {
        activate_worker(world, i, events);
    }
    apply_unlocks(world, events);
}

/// Swap one crop for coins, if the wallet has room. Coins never exceed the
/// wallet.
fn trade(world: &mut WorldState, category: Category, events: &mut Vec<GameEvent>) {
    let p = &mut world.player;
    let stock = match category {
        Category::Tomato => &mut p.tomato_count,
        _ => &mut p.wheat_count,
    };
    if *stock == 0 || p.coin >= p.wallet_capacity {
        return;
    }
    *stock -= 1;
    let coins = trade_value(category);
    p.coin = (p.coin + coins).min(p.wallet_capacity);
    world.shrine_trade_counter += 1;
    events.push(GameEvent::CropTraded { category, coins });
}

/// A carried egg brings out the chest and puts one coin back on the ground.
fn offer_egg(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.egg_held == 0 {
        return;
    }
    world.player.egg_held -= 1;
    if let Some(egg) = world.eggs.iter_mut().find(|e| e.state == Lifecycle::Held) {
        egg.state = Lifecycle::Deposited;
    }
    for chest in world.shrine_items.iter_mut() {
        chest.state = Lifecycle::Ready;
        chest.sprite.active = true;
    }
    // Prefer a coin already spent; otherwise draw from the reserve.
    let respawn = world.coins.iter()
        .position(|c| c.state == Lifecycle::Held)
        .or_else(|| world.coins.iter().position(|c| c.state == Lifecycle::Dormant));
    if let Some(i) = respawn {
        let c = &mut world.coins[i];
        c.state = Lifecycle::Ready;
        c.sprite.active = true;
        c.sprite.position = c.origin;
    }
    tracing::info!("egg offered at the shrine");
    events.push(GameEvent::EggOffered);
}

fn activate_worker(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let Some(w) = world.workers.get_mut(i) else {
        return;
    };
    if w.sprite.active {
        return;
    }
    w.sprite.active = true;
    tracing::info!(worker = i, "worker joined");
    events.push(GameEvent::WorkerJoined { worker: i });
}

/// Worker `k` joins once the trade counter passes `k + 1`. The last worker
/// joins once it passes the roster size, which also rebuilds the village.
pub fn apply_unlocks(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let n = world.workers.len();
    let count = world.shrine_trade_counter as usize;
    for k in STARTER_WORKERS..n.saturating_sub(1) {
        if count > k + 1 {
            activate_worker(world, k, events);
        }
    }
    if n == 0 || count <= n || world.rebuilt {
        return;
    }
    activate_worker(world, n - 1, events);
    world.rebuilt = true;
    world.scene = 1;
    for s in world.structures.iter_mut() {
        if s.category.is_old_building() {
            s.sprite.active = false;
        } else if s.category.is_new_building() {
            s.sprite.active = true;
        }
    }
    tracing::info!(trades = world.shrine_trade_counter, "village rebuilt");
    events.push(GameEvent::VillageRebuilt);
}

/// Drop a carried chicken into the pen. A full pen releases the flock and
/// lays an egg.
pub fn pen_chicken(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.chicken_held == 0 {
        return;
    }
    world.player.chicken_held -= 1;
    world.player.chicken_deposited_count += 1;
    if let Some(c) = world.chickens.iter_mut().find(|c| c.state == Lifecycle::Held) {
        c.state = Lifecycle::Deposited;
    }
    let count = world.player.chicken_deposited_count;
    events.push(GameEvent::ChickenPenned { count });

    if count < world.rules.deposit_threshold {
        return;
    }
    world.player.chicken_deposited_count = 0;
    for i in 0..world.chickens.len() {
        let dest = world.roam_point();
        let c = &mut world.chickens[i];
        c.state = Lifecycle::Ready;
        c.sprite.active = true;
        c.destination = dest;
    }
    if let Some(egg) = world.eggs.iter_mut().find(|e| e.state == Lifecycle::Dormant) {
        egg.state = Lifecycle::Ready;
        egg.sprite.active = true;
    }
    tracing::info!("flock released");
    events.push(GameEvent::FlockReleased);
}

/// Hitting the greedy limit exactly on any counter empties all three.
pub fn greedy_reset(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let limit = world.rules.greedy_limit;
    if limit == 0 {
        return;
    }
    let p = &mut world.player;
    if p.tomato_count == limit || p.wheat_count == limit || p.coin == limit {
        p.tomato_count = 0;
        p.wheat_count = 0;
        p.coin = 0;
        tracing::info!("greedy reset");
        events.push(GameEvent::GreedyReset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_world;

    #[test]
    fn tomato_trade_pays_two_within_wallet() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.tomato_count = 1;
        w.player.wallet_capacity = 3;
        w.player.coin = 2;
        visit_shrine(&mut w, &mut ev);
        assert_eq!(w.player.coin, 3);
        assert_eq!(w.player.tomato_count, 0);
        assert_eq!(w.shrine_trade_counter, 1);
        assert_eq!(w.player.position(), w.shrine_landing());
        assert_eq!(w.shrine_glow, 60);
    }

    #[test]
    fn full_wallet_refuses_trade() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.wheat_count = 1;
        w.player.coin = 2;
        visit_shrine(&mut w, &mut ev);
        assert_eq!(w.player.wheat_count, 1);
        assert_eq!(w.shrine_trade_counter, 0);
    }

    #[test]
    fn both_crops_trade_in_one_visit() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.tomato_count = 1;
        w.player.wheat_count = 1;
        w.player.wallet_capacity = 5;
        visit_shrine(&mut w, &mut ev);
        assert_eq!(w.player.coin, 3);
        assert_eq!(w.shrine_trade_counter, 2);
    }

    #[test]
    fn first_visit_wakes_starter_workers() {
        let mut w = test_world();
        let mut ev = Vec::new();
        visit_shrine(&mut w, &mut ev);
        let active: Vec<bool> = w.workers.iter().map(|w| w.sprite.active).collect();
        assert_eq!(&active[..3], &[true, true, false]);
        assert!(ev.contains(&GameEvent::WorkerJoined { worker: 1 }));
    }

    #[test]
    fn counter_unlocks_workers_one_by_one() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.shrine_trade_counter = 5;
        apply_unlocks(&mut w, &mut ev);
        assert!(w.workers[2].sprite.active);
        assert!(w.workers[3].sprite.active);
        assert!(!w.workers[4].sprite.active);
        assert!(!w.rebuilt);
    }

    #[test]
    fn passing_roster_size_rebuilds_once() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.shrine_trade_counter = 11;
        apply_unlocks(&mut w, &mut ev);
        assert!(w.workers[2..].iter().all(|w| w.sprite.active));
        assert!(w.rebuilt);
        assert_eq!(w.scene, 1);
        for s in &w.structures {
            if s.category.is_old_building() {
                assert!(!s.sprite.active);
            }
            if s.category.is_new_building() {
                assert!(s.sprite.active);
            }
        }
        let first = ev.len();
        w.scene = 3;
        apply_unlocks(&mut w, &mut ev);
        assert_eq!(ev.len(), first, "second check changes nothing");
        assert_eq!(w.scene, 3);
    }

    #[test]
    fn offering_an_egg_brings_chest_and_coin() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.egg_held = 1;
        w.eggs[0].state = Lifecycle::Held;
        w.coins[0].state = Lifecycle::Held;
        w.coins[0].sprite.active = false;
        w.coins[0].sprite.position = w.offscreen();
        visit_shrine(&mut w, &mut ev);
        assert_eq!(w.player.egg_held, 0);
        assert_eq!(w.eggs[0].state, Lifecycle::Deposited);
        assert!(w.shrine_items[0].pickable() && w.shrine_items[0].sprite.active);
        assert!(w.coins[0].pickable());
        assert_eq!(w.coins[0].position(), w.coins[0].origin);
        assert!(ev.contains(&GameEvent::EggOffered));
    }

    #[test]
    fn egg_offer_draws_from_reserve_when_no_coin_spent() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.egg_held = 1;
        visit_shrine(&mut w, &mut ev);
        assert!(w.coins[2].pickable() && w.coins[2].sprite.active);
        assert_eq!(w.coins[3].state, Lifecycle::Dormant);
    }

    #[test]
    fn pen_fills_then_releases_flock() {
        let mut w = test_world();
        let mut ev = Vec::new();
        for i in 0..10 {
            w.player.chicken_held = 1;
            w.chickens[i].state = Lifecycle::Held;
            pen_chicken(&mut w, &mut ev);
        }
        assert_eq!(w.player.chicken_deposited_count, 0);
        assert!(w.chickens.iter().all(|c| c.pickable()));
        let live_eggs: Vec<usize> = (0..w.eggs.len())
            .filter(|&i| w.eggs[i].sprite.active)
            .collect();
        assert_eq!(live_eggs, vec![0]);
        assert!(w.eggs[0].pickable());
        assert_eq!(ev.last(), Some(&GameEvent::FlockReleased));
    }

    #[test]
    fn empty_hands_pen_nothing() {
        let mut w = test_world();
        let mut ev = Vec::new();
        pen_chicken(&mut w, &mut ev);
        assert_eq!(w.player.chicken_deposited_count, 0);
        assert!(ev.is_empty());
    }

    #[test]
    fn greedy_reset_zeroes_everything_on_exact_limit() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.coin = 3;
        w.player.tomato_count = 5;
        w.player.wheat_count = 1;
        greedy_reset(&mut w, &mut ev);
        assert_eq!((w.player.coin, w.player.tomato_count, w.player.wheat_count), (0, 0, 0));
        assert_eq!(ev, vec![GameEvent::GreedyReset]);

        w.player.coin = 4;
        greedy_reset(&mut w, &mut ev);
        assert_eq!(w.player.coin, 4);
    }
}
