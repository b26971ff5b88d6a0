// Life expectancy predictor form

pub mod form;
pub mod service;

pub use form::{NumberInput, PredictionRequest, PredictionResult, PredictorForm};
pub use service::Predictor;
