pub mod errors;
pub mod pow;
pub mod scheme;
pub mod solver;

pub use errors::ChallengeError;
pub use scheme::{AnubisScheme, Challenge, ChallengeScheme};
pub use solver::{ChallengeSolver, SolverConfig};
