pub mod rapier;
pub mod scripted;
