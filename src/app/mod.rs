pub mod roster;
pub mod updater;
