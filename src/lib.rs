//! sonotag: normalized musical descriptors from audio.
//!
//! The core is a pure feature pipeline ([`features::extract`]): STFT-derived
//! statistics combined through fixed heuristic formulas into a twelve-key
//! record (tempo, danceability, valence, energy, ...). Acquisition, batch
//! orchestration and the HTTP service are thin collaborators around it.

pub mod audio;
pub mod batch;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod features;
pub mod rhythm;
pub mod server;
