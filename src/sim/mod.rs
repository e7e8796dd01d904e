pub mod event;
pub mod interact;
pub mod movement;
pub mod progression;
pub mod step;
pub mod village;
pub mod world;

#[cfg(test)]
pub(crate) fn test_world() -> world::WorldState {
    use rand::SeedableRng;

    world::WorldState::with_rng(
        &crate::config::GameConfig::default(),
        std::time::Instant::now(),
        rand::rngs::StdRng::seed_from_u64(1),
    )
}
