pub mod costs;
pub mod grid_world;
pub mod world_map;
