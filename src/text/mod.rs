// Text preprocessing — normalization and compound-word decomposition.

pub mod compound;
pub mod normalize;
