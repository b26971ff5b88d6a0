// Chart renderers: pure functions from the dataset and filter values to a
// Plotly figure description.

pub mod bubble;
pub mod choropleth;
pub mod figure;
pub mod line;

use serde::Serialize;

pub use bubble::wealth_health_bubbles;
pub use choropleth::{life_expectancy_map, YearSlider};
pub use figure::{Figure, Trace};
pub use line::{default_selection, life_expectancy_lines};

use crate::core::config::ChartSettings;
use crate::core::DashboardResult;
use crate::dataset::Dataset;

/// Filter widget options for the charts tab
#[derive(Debug, Clone, Serialize)]
pub struct ChartOptions {
    pub countries: Vec<String>,
    pub default_countries: Vec<String>,
    pub year_slider: YearSlider,
}

impl ChartOptions {
    pub fn build(dataset: &Dataset, settings: &ChartSettings) -> DashboardResult<Self> {
        Ok(Self {
            countries: dataset.countries().to_vec(),
            default_countries: default_selection(dataset, &settings.default_countries),
            year_slider: YearSlider::for_dataset(dataset, settings.year_step)?,
        })
    }
}
