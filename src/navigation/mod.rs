mod cursor;
mod state;

pub use state::{Action, Effect, NavEvent, Navigator, View};
