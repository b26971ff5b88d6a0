pub mod api;
pub mod charts;
pub mod core;
pub mod dataset;
pub mod ml;
pub mod monitoring;
pub mod predictor;
