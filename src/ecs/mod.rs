pub mod snapshot;
pub mod world;
