pub mod events;
pub mod providers;
pub mod runs;
pub mod settings;
