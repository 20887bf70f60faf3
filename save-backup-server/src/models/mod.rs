pub mod game;
pub mod registry;
