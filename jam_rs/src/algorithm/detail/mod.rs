mod lineup;
mod shuffle;

pub use lineup::Lineup;
pub use shuffle::{priority_shuffle, shuffle};
