/// Contact rules, resolved in a fixed order once per frame.
///
/// Order:
///   1. player ↔ worker     (pay a coin)
///   2. player ↔ structure  (solid; shrine and chicken house react)
///   3. player ↔ crop       (harvest)
///   4. player ↔ coin
///   5. player ↔ chicken
///   6. player ↔ egg
///   7. player ↔ chest
///   8. worker ↔ crop       (sow)
///
/// Each pass reads the player hitbox fresh, so a structure bump earlier in
/// the frame is visible to the passes after it.

use crate::domain::entity::{Category, Lifecycle};
use crate::domain::geometry::overlaps;
use super::event::GameEvent;
use super::progression;
use super::world::{PlotId, WorkerId, WorldState};

pub fn resolve(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    pay_workers(world, events);
    bump_structures(world, events);
    harvest_crops(world, events);
    collect_coins(world, events);
    catch_chickens(world, events);
    collect_eggs(world, events);
    open_chest(world, events);
    sow_crops(world, events);
}

/// An active, empty-handed worker takes one coin and heads for its plot.
pub fn pay_workers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.workers.len() {
        let hb = world.player.player_hitbox();
        let w = &world.workers[i];
        if !overlaps(&w.worker_hitbox(), &hb) {
            continue;
        }
        if world.player.coin == 0 || !w.sprite.active || w.coin >= 1 {
            continue;
        }
        world.player.coin -= 1;
        world.smoke = true;
        let plot = world.pairings.plot_of(WorkerId(i))
            .and_then(|PlotId(p)| world.crops.get(p))
            .map(|c| c.origin);
        let w = &mut world.workers[i];
        w.coin += 1;
        if let Some(dest) = plot {
            w.destination = dest;
        }
        tracing::debug!(worker = i, "coin paid");
        events.push(GameEvent::CoinPaid { worker: i });
    }
}

/// Active structures are solid. The shrine and chicken house also act on
/// the visit.
pub fn bump_structures(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.structures.len() {
        let s = &world.structures[i];
        if !s.sprite.active || !overlaps(&s.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        let category = s.category;
        world.player.sprite.revert();
        world.smoke = true;
        match category {
            Category::Shrine => progression::visit_shrine(world, events),
            Category::ChickenHouse => progression::pen_chicken(world, events),
            _ => {}
        }
    }
}

pub fn harvest_crops(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.crops.len() {
        let c = &world.crops[i];
        if !c.pickable() || !overlaps(&c.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        if world.player.basket_count() >= world.player.basket_capacity {
            continue;
        }
        let category = c.category;
        let c = &mut world.crops[i];
        c.state = Lifecycle::Deposited;
        c.sprite.active = false;
        c.sprite.frame = 1;
        c.sprite.frame_counter = 0;
        match category {
            Category::Tomato => world.player.tomato_count += 1,
            _ => world.player.wheat_count += 1,
        }
        if let Some(WorkerId(w)) = world.pairings.worker_of(PlotId(i)) {
            if let Some(worker) = world.workers.get_mut(w) {
                worker.coin = 0;
            }
        }
        world.smoke = true;
        events.push(GameEvent::CropHarvested { plot: i, category });
    }
}

pub fn collect_coins(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let parked = world.offscreen();
    for i in 0..world.coins.len() {
        let c = &world.coins[i];
        if !c.pickable() || !overlaps(&c.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        if world.player.coin >= world.player.wallet_capacity {
            continue;
        }
        world.player.coin += 1;
        let c = &mut world.coins[i];
        c.state = Lifecycle::Held;
        c.sprite.active = false;
        c.sprite.position = parked;
        events.push(GameEvent::CoinCollected { index: i });
    }
}

/// The player carries at most one chicken; it is sent ahead to the pen.
pub fn catch_chickens(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (staging, walk_to) = world.coop_staging();
    for i in 0..world.chickens.len() {
        let c = &world.chickens[i];
        if !c.pickable() || !overlaps(&c.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        world.smoke = true;
        if world.player.chicken_held >= 1 {
            continue;
        }
        world.player.chicken_held += 1;
        let c = &mut world.chickens[i];
        c.state = Lifecycle::Held;
        c.sprite.position = staging;
        c.destination = walk_to;
        events.push(GameEvent::ChickenCaught { index: i });
    }
}

pub fn collect_eggs(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.eggs.len() {
        let e = &world.eggs[i];
        if !e.sprite.active || !e.pickable() || !overlaps(&e.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        world.smoke = true;
        if world.player.egg_held >= 1 {
            continue;
        }
        world.player.egg_held += 1;
        let e = &mut world.eggs[i];
        e.state = Lifecycle::Held;
        e.sprite.active = false;
        events.push(GameEvent::EggFound { index: i });
    }
}

/// Opening the chest grows wallet and basket by one, up to the cap.
pub fn open_chest(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let cap = world.rules.capacity_cap;
    for i in 0..world.shrine_items.len() {
        let c = &world.shrine_items[i];
        if !c.sprite.active || !c.pickable() || !overlaps(&c.hitbox(), &world.player.player_hitbox()) {
            continue;
        }
        let c = &mut world.shrine_items[i];
        c.state = Lifecycle::Deposited;
        c.sprite.active = false;
        let p = &mut world.player;
        p.wallet_capacity = (p.wallet_capacity + 1).min(cap);
        p.basket_capacity = (p.basket_capacity + 1).min(cap);
        world.smoke = true;
        tracing::info!(wallet = p.wallet_capacity, basket = p.basket_capacity, "chest opened");
        events.push(GameEvent::ChestOpened { wallet: p.wallet_capacity, basket: p.basket_capacity });
    }
}

/// A paid worker standing on its empty plot plants it.
pub fn sow_crops(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.workers.len() {
        let w = &world.workers[i];
        if !w.sprite.active || w.coin == 0 {
            continue;
        }
        let Some(PlotId(p)) = world.pairings.plot_of(WorkerId(i)) else {
            continue;
        };
        let hb = w.worker_hitbox();
        let Some(crop) = world.crops.get_mut(p) else {
            continue;
        };
        if !matches!(crop.state, Lifecycle::Dormant | Lifecycle::Deposited) {
            continue;
        }
        if !overlaps(&hb, &crop.hitbox()) {
            continue;
        }
        crop.state = Lifecycle::Growing(1);
        crop.sprite.active = true;
        crop.sprite.frame = 1;
        crop.sprite.frame_counter = 0;
        world.smoke = true;
        events.push(GameEvent::CropSown { plot: p });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Pickup;
    use crate::domain::geometry::Point;
    use crate::sim::test_world;

    /// Put the player so that its hitbox sits on `target`.
    fn stand_on(world: &mut WorldState, target: Point) {
        world.player.sprite.position = Point::new(target.x - 12.0, target.y - 12.0);
        world.player.sprite.snapshot();
    }

    fn ready_crop(world: &mut WorldState, plot: usize) -> Point {
        let c: &mut Pickup = &mut world.crops[plot];
        c.state = Lifecycle::Ready;
        c.sprite.active = true;
        c.sprite.frame = 5;
        c.position()
    }

    #[test]
    fn paying_needs_an_active_empty_worker() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.coin = 1;
        let at = w.workers[0].position();
        stand_on(&mut w, at);
        pay_workers(&mut w, &mut ev);
        assert_eq!(w.player.coin, 1, "inactive worker refused");

        w.workers[0].sprite.active = true;
        pay_workers(&mut w, &mut ev);
        assert_eq!(w.player.coin, 0);
        assert_eq!(w.workers[0].coin, 1);
        assert_eq!(w.workers[0].destination, w.crops[0].origin);
        assert_eq!(ev, vec![GameEvent::CoinPaid { worker: 0 }]);

        w.player.coin = 1;
        pay_workers(&mut w, &mut ev);
        assert_eq!(w.player.coin, 1, "worker already holds a coin");
    }

    #[test]
    fn structures_push_back() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.sprite.position = Point::new(230.0, 40.0);
        w.player.sprite.snapshot();
        w.player.sprite.position = Point::new(240.0, 60.0);
        bump_structures(&mut w, &mut ev);
        assert_eq!(w.player.position(), Point::new(230.0, 40.0));
        assert!(w.smoke);
        assert!(ev.is_empty());
    }

    #[test]
    fn chicken_house_pushes_back_and_pens() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.chicken_held = 1;
        w.chickens[0].state = Lifecycle::Held;
        w.player.sprite.position = Point::new(500.0, 110.0);
        w.player.sprite.snapshot();
        w.player.sprite.position = Point::new(545.0, 110.0);
        bump_structures(&mut w, &mut ev);
        assert_eq!(w.player.position(), Point::new(500.0, 110.0));
        assert!(w.smoke);
        assert_eq!(w.player.chicken_held, 0);
        assert_eq!(w.player.chicken_deposited_count, 1);
        assert_eq!(w.chickens[0].state, Lifecycle::Deposited);
        assert_eq!(ev, vec![GameEvent::ChickenPenned { count: 1 }]);
    }

    #[test]
    fn hidden_buildings_are_not_solid() {
        let mut w = test_world();
        let mut ev = Vec::new();
        for s in w.structures.iter_mut() {
            s.sprite.active = s.category == Category::Shrine;
        }
        w.player.sprite.snapshot();
        w.player.sprite.position = Point::new(240.0, 60.0);
        bump_structures(&mut w, &mut ev);
        assert_eq!(w.player.position(), Point::new(240.0, 60.0));
    }

    #[test]
    fn harvest_respects_basket_and_frees_worker() {
        let mut w = test_world();
        let mut ev = Vec::new();
        let at = ready_crop(&mut w, 1);
        w.workers[1].coin = 1;
        stand_on(&mut w, at);
        harvest_crops(&mut w, &mut ev);
        assert_eq!(w.player.tomato_count, 1);
        assert_eq!(w.workers[1].coin, 0);
        let c = &w.crops[1];
        assert_eq!(c.state, Lifecycle::Deposited);
        assert!(!c.sprite.active);
        assert_eq!((c.sprite.frame, c.sprite.frame_counter), (1, 0));
        assert_eq!(ev, vec![GameEvent::CropHarvested { plot: 1, category: Category::Tomato }]);
    }

    #[test]
    fn full_basket_blocks_harvest() {
        let mut w = test_world();
        let mut ev = Vec::new();
        let at = ready_crop(&mut w, 0);
        w.player.wheat_count = 1;
        w.player.tomato_count = 1;
        stand_on(&mut w, at);
        harvest_crops(&mut w, &mut ev);
        assert_eq!(w.player.wheat_count, 1);
        assert!(w.crops[0].pickable());
        assert!(ev.is_empty());
    }

    #[test]
    fn coins_fill_wallet_only() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.coin = 2;
        let at = w.coins[0].position();
        stand_on(&mut w, at);
        collect_coins(&mut w, &mut ev);
        assert_eq!(w.player.coin, 2);
        assert!(w.coins[0].pickable());

        w.player.coin = 1;
        collect_coins(&mut w, &mut ev);
        assert_eq!(w.player.coin, 2);
        assert_eq!(w.coins[0].state, Lifecycle::Held);
        assert_eq!(w.coins[0].position(), Point::new(-100.0, -100.0));
    }

    #[test]
    fn one_chicken_at_a_time() {
        let mut w = test_world();
        let mut ev = Vec::new();
        let at = Point::new(300.0, 200.0);
        w.chickens[0].sprite.position = at;
        w.chickens[1].sprite.position = at;
        stand_on(&mut w, at);
        catch_chickens(&mut w, &mut ev);
        assert_eq!(w.player.chicken_held, 1);
        assert_eq!(w.chickens[0].state, Lifecycle::Held);
        assert_eq!(w.chickens[0].position(), Point::new(550.0, 150.0));
        assert_eq!(w.chickens[1].state, Lifecycle::Ready);
        assert_eq!(ev, vec![GameEvent::ChickenCaught { index: 0 }]);
    }

    #[test]
    fn hidden_eggs_cannot_be_taken() {
        let mut w = test_world();
        let mut ev = Vec::new();
        let at = w.eggs[0].position();
        w.eggs[0].state = Lifecycle::Ready;
        stand_on(&mut w, at);
        collect_eggs(&mut w, &mut ev);
        assert_eq!(w.player.egg_held, 0);
        w.eggs[0].sprite.active = true;
        collect_eggs(&mut w, &mut ev);
        assert_eq!(w.player.egg_held, 1);
        assert!(!w.eggs[0].sprite.active);
    }

    #[test]
    fn chest_capacity_is_capped() {
        let mut w = test_world();
        let mut ev = Vec::new();
        w.player.wallet_capacity = 5;
        w.player.basket_capacity = 4;
        let chest = &mut w.shrine_items[0];
        chest.state = Lifecycle::Ready;
        chest.sprite.active = true;
        let at = chest.position();
        stand_on(&mut w, at);
        open_chest(&mut w, &mut ev);
        assert_eq!(w.player.wallet_capacity, 5);
        assert_eq!(w.player.basket_capacity, 5);
        assert_eq!(w.shrine_items[0].state, Lifecycle::Deposited);
        open_chest(&mut w, &mut ev);
        assert_eq!(ev.len(), 1);
    }

    #[test]
    fn paid_worker_on_plot_sows_it() {
        let mut w = test_world();
        let mut ev = Vec::new();
        let plot = w.crops[2].origin;
        let worker = &mut w.workers[2];
        worker.sprite.active = true;
        worker.sprite.position = plot;
        sow_crops(&mut w, &mut ev);
        assert_eq!(w.crops[2].state, Lifecycle::Dormant, "no coin, no sowing");

        w.workers[2].coin = 1;
        sow_crops(&mut w, &mut ev);
        assert_eq!(w.crops[2].state, Lifecycle::Growing(1));
        assert!(w.crops[2].sprite.active);
        sow_crops(&mut w, &mut ev);
        assert_eq!(ev, vec![GameEvent::CropSown { plot: 2 }]);
    }
}
