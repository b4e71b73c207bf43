pub mod evaluate;
pub mod features;
pub mod knn;
pub mod linear;
pub mod missing;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod split;
pub mod stats;
