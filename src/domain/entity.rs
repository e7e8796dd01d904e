/// Entities: characters (player, workers) and pickups (coins, livestock,
/// crops, buildings, chest).
///
/// Visual/animation state lives in `Sprite`, embedded by value in every
/// entity kind. Behaviour is chosen by `Category`, never by dynamic dispatch.
/// A pickup's collectable status is a single `Lifecycle` value instead of a
/// pair of `picked`/`pickable` flags.

use super::geometry::{Point, Rect};

/// Side length of a character sprite, in pixels.
pub const SPRITE: f64 = 48.0;
/// Width of a large house tile, in pixels.
pub const HOUSE_TILE: f64 = 64.0;

/// Held directional keys for one frame. Opposite keys may both be set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirSet {
    pub down: bool,
    pub up: bool,
    pub right: bool,
    pub left: bool,
}

impl DirSet {
    pub fn any(&self) -> bool {
        self.down || self.up || self.right || self.left
    }

    /// Exactly one of left/right held.
    pub fn one_horizontal(&self) -> bool {
        self.left != self.right
    }

    /// Exactly one of up/down held.
    pub fn one_vertical(&self) -> bool {
        self.up != self.down
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Down,
    Up,
    Left,
    Right,
}

/// Edge-triggered commands polled by the shell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    ToggleFullscreen,
    Quit,
    Pause,
    Action,
    SelectScene(u8),
}

/// Frame input: held directions plus one-shot commands.
#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub dirs: DirSet,
    pub commands: Vec<Command>,
}

#[derive(Clone, Debug, Default)]
pub struct Sprite {
    pub position: Point,
    /// Snapshot taken once per frame before movement; used to undo moves
    /// into solid structures.
    pub previous_position: Point,
    /// Sub-rectangle of the sprite sheet for the current frame.
    pub frame_rect: Rect,
    pub active: bool,
    pub frame_counter: u32,
    pub frame: u32,
}

impl Sprite {
    pub fn at(position: Point) -> Self {
        Sprite {
            position,
            previous_position: position,
            ..Sprite::default()
        }
    }

    pub fn snapshot(&mut self) {
        self.previous_position = self.position;
    }

    pub fn revert(&mut self) {
        self.position = self.previous_position;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pose {
    Walking,
    Working,
}

#[derive(Clone, Debug)]
pub struct Character {
    pub sprite: Sprite,
    pub direction: DirSet,
    pub facing: Option<Facing>,
    pub speed: f64,
    pub destination: Point,
    pub home: Point,
    pub pose: Pose,
    pub coin: u32,
    pub wallet_capacity: u32,
    pub basket_capacity: u32,
    pub tomato_count: u32,
    pub wheat_count: u32,
    pub chicken_held: u32,
    pub chicken_deposited_count: u32,
    pub egg_held: u32,
}

impl Character {
    fn base(position: Point, speed: f64) -> Self {
        Character {
            sprite: Sprite::at(position),
            direction: DirSet::default(),
            facing: None,
            speed,
            destination: position,
            home: position,
            pose: Pose::Walking,
            coin: 0,
            wallet_capacity: 0,
            basket_capacity: 0,
            tomato_count: 0,
            wheat_count: 0,
            chicken_held: 0,
            chicken_deposited_count: 0,
            egg_held: 0,
        }
    }

    pub fn player(position: Point, speed: f64, capacity: u32) -> Self {
        let mut p = Character::base(position, speed);
        p.sprite.active = true;
        p.wallet_capacity = capacity;
        p.basket_capacity = capacity;
        p
    }

    /// Workers start inactive and walk to `home` until given a coin.
    pub fn worker(position: Point, home: Point, speed: f64) -> Self {
        let mut w = Character::base(position, speed);
        w.destination = home;
        w.home = home;
        w.sprite.frame_rect = Rect::new(0, 0, SPRITE as i32, SPRITE as i32);
        w
    }

    pub fn position(&self) -> Point {
        self.sprite.position
    }

    pub fn basket_count(&self) -> u32 {
        self.tomato_count + self.wheat_count
    }

    /// The player's shrunk hitbox: the centre quarter of the sprite.
    pub fn player_hitbox(&self) -> Rect {
        let p = self.sprite.position;
        Rect::from_f64(
            p.x + SPRITE / 4.0,
            p.y + SPRITE / 4.0,
            p.x + SPRITE / 2.0,
            p.y + SPRITE / 2.0,
        )
    }

    /// A worker's hitbox: the upper-left quarter of the sprite.
    pub fn worker_hitbox(&self) -> Rect {
        let p = self.sprite.position;
        Rect::from_f64(p.x, p.y, p.x + SPRITE / 2.0, p.y + SPRITE / 2.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Coin,
    Chicken,
    Egg,
    Wheat,
    Tomato,
    House,
    SmallHouse,
    NewHouse,
    NewHouseSmall,
    ChickenHouse,
    Shrine,
    Chest,
}

impl Category {
    pub fn is_crop(self) -> bool {
        matches!(self, Category::Wheat | Category::Tomato)
    }

    /// Buildings of the first village, replaced on rebuild.
    pub fn is_old_building(self) -> bool {
        matches!(self, Category::House | Category::SmallHouse)
    }

    pub fn is_new_building(self) -> bool {
        matches!(self, Category::NewHouse | Category::NewHouseSmall)
    }

    /// Collision footprint for an entity of this category at `pos`.
    pub fn footprint(self, pos: Point) -> Rect {
        let (x, y) = (pos.x, pos.y);
        match self {
            Category::Coin | Category::Wheat | Category::Tomato => Rect::from_f64(
                x - SPRITE / 4.0 + 10.0,
                y - SPRITE / 4.0 + 10.0,
                x + SPRITE / 4.0,
                y + SPRITE / 4.0,
            ),
            Category::House => Rect::from_f64(x, y, x + HOUSE_TILE - 10.0, y + SPRITE - 10.0),
            Category::SmallHouse => Rect::from_f64(x, y, x + SPRITE - 10.0, y + SPRITE - 10.0),
            _ => Rect::from_f64(x, y, x + SPRITE / 2.0, y + SPRITE / 2.0),
        }
    }
}

/// Collectable lifecycle of a pickup.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lifecycle {
    /// Not in play.
    Dormant,
    /// Crop growth stage 1..=4.
    Growing(u8),
    /// Can be collected on contact.
    Ready,
    /// Collected and carried by the player.
    Held,
    /// Collected and put away (harvested, opened, penned, offered).
    Deposited,
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub sprite: Sprite,
    pub category: Category,
    pub destination: Point,
    /// Spawn point, used when a pickup is put back into play.
    pub origin: Point,
    pub state: Lifecycle,
}

impl Pickup {
    pub fn new(category: Category, position: Point, state: Lifecycle, active: bool) -> Self {
        let mut sprite = Sprite::at(position);
        sprite.active = active;
        Pickup {
            sprite,
            category,
            destination: position,
            origin: position,
            state,
        }
    }

    pub fn position(&self) -> Point {
        self.sprite.position
    }

    pub fn pickable(&self) -> bool {
        self.state == Lifecycle::Ready
    }

    pub fn picked(&self) -> bool {
        matches!(self.state, Lifecycle::Held | Lifecycle::Deposited)
    }

    pub fn hitbox(&self) -> Rect {
        self.category.footprint(self.sprite.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_hitbox_is_centre_quarter() {
        let p = Character::player(Point::new(100.0, 50.0), 3.0, 2);
        assert_eq!(p.player_hitbox(), Rect::new(112, 62, 124, 74));
    }

    #[test]
    fn crop_and_coin_footprints_are_shrunk() {
        let r = Category::Coin.footprint(Point::new(100.0, 100.0));
        assert_eq!(r, Rect::new(98, 98, 112, 112));
        assert_eq!(Category::Tomato.footprint(Point::new(100.0, 100.0)), r);
    }

    #[test]
    fn house_footprints_differ_by_size() {
        let at = Point::new(0.0, 0.0);
        assert_eq!(Category::House.footprint(at), Rect::new(0, 0, 54, 38));
        assert_eq!(Category::SmallHouse.footprint(at), Rect::new(0, 0, 38, 38));
        assert_eq!(Category::Shrine.footprint(at), Rect::new(0, 0, 24, 24));
        assert_eq!(Category::ChickenHouse.footprint(at), Rect::new(0, 0, 24, 24));
    }

    #[test]
    fn lifecycle_drives_pickable_and_picked() {
        let mut c = Pickup::new(Category::Chicken, Point::default(), Lifecycle::Ready, true);
        assert!(c.pickable());
        assert!(!c.picked());
        c.state = Lifecycle::Held;
        assert!(!c.pickable());
        assert!(c.picked());
        c.state = Lifecycle::Growing(3);
        assert!(!c.pickable());
        assert!(!c.picked());
    }

    #[test]
    fn one_axis_helpers() {
        let d = DirSet { up: true, left: true, ..DirSet::default() };
        assert!(d.one_horizontal());
        assert!(d.one_vertical());
        let both = DirSet { left: true, right: true, ..DirSet::default() };
        assert!(!both.one_horizontal());
        assert!(both.any());
    }

    #[test]
    fn sprite_revert_restores_snapshot() {
        let mut s = Sprite::at(Point::new(1.0, 2.0));
        s.snapshot();
        s.position = Point::new(9.0, 9.0);
        s.revert();
        assert_eq!(s.position, Point::new(1.0, 2.0));
    }
}
