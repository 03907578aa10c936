// Domain layer: client-side game state and input rules.

pub mod state;
pub mod throttle;

pub use state::{ClientState, Key, Player, Position};
pub use throttle::InputThrottle;
