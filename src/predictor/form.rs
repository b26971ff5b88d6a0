use serde::{Deserialize, Serialize};

/// Numeric input widget: values are clamped into `[min, max]`, never rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberInput {
    pub min: i64,
    /// `None` leaves the input unbounded above
    pub max: Option<i64>,
    pub step: i64,
    pub default: i64,
}

impl NumberInput {
    pub fn clamp(&self, value: i64) -> i64 {
        let value = value.max(self.min);
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Widget bounds for the three predictor inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorForm {
    pub year: NumberInput,
    pub pop: NumberInput,
    #[serde(rename = "gdpPercap")]
    pub gdp_percap: NumberInput,
}

impl Default for PredictorForm {
    fn default() -> Self {
        Self {
            year: NumberInput {
                min: 1952,
                max: Some(2027),
                step: 1,
                default: 2000,
            },
            pop: NumberInput {
                min: 10_000,
                max: Some(1_000_000_000),
                step: 100_000,
                default: 1_000_000,
            },
            gdp_percap: NumberInput {
                min: 1,
                max: None,
                step: 1,
                default: 5000,
            },
        }
    }
}

impl PredictorForm {
    pub fn defaults(&self) -> PredictionRequest {
        PredictionRequest {
            year: self.year.default,
            pop: self.pop.default,
            gdp_percap: self.gdp_percap.default,
        }
    }

    pub fn clamp(&self, request: &PredictionRequest) -> PredictionRequest {
        PredictionRequest {
            year: self.year.clamp(request.year),
            pop: self.pop.clamp(request.pop),
            gdp_percap: self.gdp_percap.clamp(request.gdp_percap),
        }
    }
}

/// One form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub year: i64,
    pub pop: i64,
    #[serde(rename = "gdpPercap")]
    pub gdp_percap: i64,
}

impl PredictionRequest {
    /// Model features in training order
    pub fn features(&self) -> [f64; 3] {
        [self.year as f64, self.pop as f64, self.gdp_percap as f64]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "lifeExp")]
    pub life_expectancy: f64,
    /// The request after clamping, i.e. what the model actually saw
    pub input: PredictionRequest,
}
