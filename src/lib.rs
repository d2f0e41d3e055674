//! Aggregate transfer lists into directed value-flow graphs and bound them
//! around a focus address for rendering.

pub mod config;
pub mod core;
pub mod db;
pub mod export;
pub mod graph;
pub mod render;
pub mod source;
