mod admission;
mod config;
mod error;
mod filter;
mod generator;
mod io;
mod orchestrator;
mod sequence;
mod types;

pub use admission::*;
pub use config::*;
pub use error::*;
pub use filter::*;
pub use generator::*;
pub use io::*;
pub use orchestrator::*;
pub use sequence::*;
pub use types::*;
