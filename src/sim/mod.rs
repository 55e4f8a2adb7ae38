pub mod event;
pub mod game;
pub mod logbook;
pub mod schedule;
pub mod session;
