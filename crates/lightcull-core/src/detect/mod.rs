pub mod starfind;

pub use starfind::{find_stars, StarCandidate, StarFinderConfig};
