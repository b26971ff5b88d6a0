use serde::Serialize;

use crate::charts::figure::{color_stops, ChoroplethTrace, ColorBar, Figure, Geo, Layout, Projection, Title, Trace, PLASMA};
use crate::core::{DashboardError, DashboardResult};
use crate::dataset::Dataset;

/// Stepped year selector spanning the dataset's years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearSlider {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl YearSlider {
    pub fn for_dataset(dataset: &Dataset, step: i64) -> DashboardResult<Self> {
        if step <= 0 {
            return Err(DashboardError::InvalidInput(format!(
                "year step must be positive, got {}",
                step
            )));
        }
        let (min, max) = dataset.year_range();
        let step = i32::try_from(step)
            .map_err(|_| DashboardError::InvalidInput(format!("year step {} out of range", step)))?;
        Ok(Self { min, max, step })
    }

    /// Clamp into range and round to the nearest selectable step
    pub fn snap(&self, year: i32) -> i32 {
        let clamped = year.clamp(self.min, self.max);
        let offset = clamped - self.min;
        let mut snapped = self.min + ((offset + self.step / 2) / self.step) * self.step;
        if snapped > self.max {
            snapped -= self.step;
        }
        snapped
    }
}

/// Life expectancy per country on a world map for a single year.
///
/// The color range is the dataset-wide life expectancy range so colors stay
/// comparable between years.
pub fn life_expectancy_map(dataset: &Dataset, slider: &YearSlider, year: Option<i32>) -> Figure {
    let year = slider.snap(year.unwrap_or(slider.min));
    let (zmin, zmax) = dataset.life_exp_range();

    let rows: Vec<_> = dataset.for_year(year).collect();
    let trace = ChoroplethTrace {
        locations: rows.iter().map(|obs| obs.iso_alpha.clone()).collect(),
        locationmode: "ISO-3",
        z: rows.iter().map(|obs| obs.life_exp).collect(),
        hovertext: rows.iter().map(|obs| obs.country.clone()).collect(),
        zmin,
        zmax,
        colorscale: color_stops(&PLASMA),
        colorbar: ColorBar {
            title: Title::new("lifeExp"),
        },
    };

    Figure {
        data: vec![Trace::Choropleth(trace)],
        layout: Layout {
            title: Some(Title::new(year.to_string())),
            geo: Some(Geo {
                showframe: false,
                showcoastlines: true,
                projection: Projection {
                    projection_type: "natural earth",
                },
            }),
            ..Default::default()
        },
        frames: Vec::new(),
    }
}
