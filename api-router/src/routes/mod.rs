pub mod liveness;
pub mod stage_types;
pub mod tasks;
