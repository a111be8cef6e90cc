pub mod config;
pub mod nag;
pub mod pause;
pub mod session;

pub use config::{Config, ConfigError, FeedKind, GrowlConfig};
pub use nag::Priority;
pub use pause::{PauseChange, PauseControl, PauseKind};
pub use session::{NagState, Session};
