//! Name normalization and similarity scoring shared by the resolvers.

pub mod normalize;
pub mod similarity;

pub use normalize::normalize;
pub use similarity::{calculate_similarity, levenshtein_distance, partial_match};
