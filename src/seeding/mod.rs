//! Seeding collaborators for the EM initializer: distance measures and a
//! deterministic k-means hard partitioner. Consumed only by the
//! seeded-by-clustering initialization strategy; the E/M core never touches
//! these.

pub mod distance;
pub mod kmeans;
