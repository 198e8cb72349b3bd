pub mod frame;
pub mod health;
pub mod reconnect;
pub mod types;

pub use frame::*;
pub use health::*;
pub use reconnect::*;
pub use types::*;
