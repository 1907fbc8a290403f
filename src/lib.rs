pub mod audio;
pub mod baudot;
pub mod config;
pub mod demod;
pub mod dsp;
pub mod error;
pub mod modem;
pub mod modulator;
pub mod pipeline;
pub mod turnaround;

pub use config::ModemConfig;
pub use error::{ModemError, Result};
pub use modem::{Modem, ModemEvent, ModemHandle};
