//! Snake Arena - real-time multi-agent snake simulation core

pub mod core;
pub mod ecs;
pub mod entity;
pub mod simulation;
pub mod spatial;
