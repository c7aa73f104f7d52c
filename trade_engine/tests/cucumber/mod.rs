mod steps;
mod world;

pub use world::{DeskSystem, TradeDeskWorld};
