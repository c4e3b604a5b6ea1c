mod band_name;
mod detail;
mod fairness;
mod generator;
mod random;
mod roulette;
mod rotation;
mod stats;

pub use band_name::{get_unique_band_name, BandNamePool, BAND_NAMES};
pub use detail::{priority_shuffle, shuffle};
pub use fairness::{
    compute_pair_history, compute_play_counts, last_played_role, PairHistory, PairKey, PlayCounts,
};
pub use generator::{generate_next_band, BandGenerator};
pub use random::IRandom;
pub use roulette::shuffle_roles;
pub use rotation::next_role;
pub use stats::{SessionStats, UserStats};
