pub mod anim;
pub mod entity;
pub mod geometry;
