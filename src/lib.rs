#![doc = include_str!("../README.md")]

mod error;

pub mod epoch;
pub mod leapsecs;
pub mod time64;
pub mod timescale;

pub use epoch::CertificateVersion;
pub use error::{Error, LeapsecError, Result};
pub use leapsecs::LeapsecTable;
pub use time64::Time64;
pub use timescale::{TaiInstant, TimeScale, UtcTai};

#[cfg(feature = "hifitime")]
pub use timescale::HifiTimeScale;
