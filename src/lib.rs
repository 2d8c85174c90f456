#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod api;
pub mod composite;
pub mod config;
pub mod debounce;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod resolver;
pub mod session;
pub mod view;

pub use app::ShowroomApp;
