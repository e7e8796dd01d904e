/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::entity::Category;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CoinPaid { worker: usize },
    CoinCollected { index: usize },
    CropSown { plot: usize },
    CropHarvested { plot: usize, category: Category },
    ChickenCaught { index: usize },
    ChickenPenned { count: u32 },
    FlockReleased,
    EggFound { index: usize },
    EggOffered,
    ChestOpened { wallet: u32, basket: u32 },
    ShrineVisited,
    CropTraded { category: Category, coins: u32 },
    WorkerJoined { worker: usize },
    VillageRebuilt,
    GreedyReset,
    SceneChanged { scene: u8 },
}

/// Sound effects the shell knows how to play.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Clip {
    Ambient,
    Coin,
    Fx,
    Chest,
    Secret,
}

impl GameEvent {
    /// Sound cue for this event, if any.
    pub fn clip(&self) -> Option<Clip> {
        match self {
            GameEvent::CoinPaid { .. }
            | GameEvent::CoinCollected { .. }
            | GameEvent::CropTraded { .. } => Some(Clip::Coin),
            GameEvent::CropHarvested { .. }
            | GameEvent::ChickenPenned { .. }
            | GameEvent::ShrineVisited => Some(Clip::Fx),
            GameEvent::FlockReleased | GameEvent::EggFound { .. } => Some(Clip::Secret),
            GameEvent::ChestOpened { .. } => Some(Clip::Chest),
            _ => None,
        }
    }
}
