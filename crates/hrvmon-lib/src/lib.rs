pub mod buffer;
pub mod config;
pub mod io;
pub mod metrics;
pub mod monitor;
pub mod pacer;
pub mod plot;
pub mod signal;
pub mod simulate;

pub use buffer::*;
pub use config::*;
pub use metrics::*;
pub use monitor::*;
pub use signal::*;
