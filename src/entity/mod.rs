pub mod creature;
pub mod food;
pub mod modifiers;
pub mod snake;
