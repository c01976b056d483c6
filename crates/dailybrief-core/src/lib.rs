pub mod clock;
pub mod config;
pub mod digest;
pub mod error;
pub mod feed;
pub mod publish;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{Error, Result};
