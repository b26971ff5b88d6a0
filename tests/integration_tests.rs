use anyhow::Result;
use lifeexp_dashboard::{
    charts::{
        life_expectancy_lines, life_expectancy_map, wealth_health_bubbles, ChartOptions, Trace,
        YearSlider,
    },
    core::config::{ChartSettings, ModelSettings},
    dataset::{BundledSource, Dataset, DatasetSource, DatasetStore},
    ml::{ModelArtifact, Trainer},
    predictor::{PredictionRequest, Predictor, PredictorForm},
};
use std::sync::Arc;

async fn bundled() -> Result<Dataset> {
    Ok(BundledSource.fetch().await?)
}

/// Chart rendering against the bundled table
mod chart_tests {
    use super::*;

    #[tokio::test]
    async fn test_line_chart_spans_full_year_range() -> Result<()> {
        let dataset = bundled().await?;
        let countries = vec!["Afghanistan".to_string(), "Albania".to_string()];
        let figure = life_expectancy_lines(&dataset, &countries)?;

        assert_eq!(figure.data.len(), 2);
        for (trace, country) in figure.data.iter().zip(&countries) {
            let Trace::Scatter(trace) = trace else {
                panic!("line chart produced a non-scatter trace");
            };
            assert_eq!(&trace.name, country);
            let expected: Vec<f64> = dataset
                .for_country(country)
                .map(|obs| obs.year as f64)
                .collect();
            assert_eq!(trace.x, expected);
            assert_eq!(trace.x.first(), Some(&1952.0));
            assert_eq!(trace.x.last(), Some(&2007.0));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_default_trio_yields_three_full_series() -> Result<()> {
        let dataset = bundled().await?;
        let countries: Vec<String> = ["Turkey", "Syria", "Greece"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let figure = life_expectancy_lines(&dataset, &countries)?;

        assert_eq!(figure.data.len(), 3);
        let all_years: Vec<f64> = (1952..=2007).step_by(5).map(f64::from).collect();
        for (trace, country) in figure.data.iter().zip(&countries) {
            let Trace::Scatter(trace) = trace else {
                panic!("line chart produced a non-scatter trace");
            };
            assert_eq!(&trace.name, country);
            assert_eq!(trace.x, all_years);
            assert_eq!(trace.y.len(), 12);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_map_shows_every_country_each_year() -> Result<()> {
        let dataset = bundled().await?;
        let slider = YearSlider::for_dataset(&dataset, 5)?;
        let figure = life_expectancy_map(&dataset, &slider, Some(2007));
        let Trace::Choropleth(trace) = &figure.data[0] else {
            panic!("map produced a non-choropleth trace");
        };
        assert_eq!(trace.locations.len(), 142);
        assert_eq!(
            (trace.zmin, trace.zmax),
            (23.599, 82.603),
            "color bounds span Rwanda 1992 to Japan 2007"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_map_color_bounds_fixed_for_every_year() -> Result<()> {
        let dataset = bundled().await?;
        let slider = YearSlider::for_dataset(&dataset, 5)?;
        let (lo, hi) = dataset.life_exp_range();

        for &year in dataset.years() {
            let figure = life_expectancy_map(&dataset, &slider, Some(year));
            let Trace::Choropleth(trace) = &figure.data[0] else {
                panic!("map produced a non-choropleth trace");
            };
            assert_eq!((trace.zmin, trace.zmax), (lo, hi));
            assert_eq!(trace.locations.len(), dataset.for_year(year).count());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_bubble_frames_cover_every_year() -> Result<()> {
        let dataset = bundled().await?;
        let figure = wealth_health_bubbles(&dataset);
        assert_eq!(figure.frames.len(), dataset.years().len());
        assert_eq!(figure.layout.shapes.len(), 1);
        Ok(())
    }
}

/// Training, export and prediction end to end
mod model_tests {
    use super::*;

    fn settings(n_estimators: usize) -> ModelSettings {
        ModelSettings {
            n_estimators,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_training_mse_is_reproducible() -> Result<()> {
        let dataset = bundled().await?;
        let (_, first) = Trainer::from_settings(&settings(100)).train(&dataset, |_| {})?;
        let (_, second) = Trainer::from_settings(&settings(100)).train(&dataset, |_| {})?;

        assert_eq!(first.n_trees, 100);
        assert_eq!(first.forest_mse.to_bits(), second.forest_mse.to_bits());
        Ok(())
    }

    #[tokio::test]
    async fn test_train_export_load_predict() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gapminder_model.bin");
        let dataset = bundled().await?;

        let (artifact, _) = Trainer::from_settings(&settings(20)).train(&dataset, |_| {})?;
        artifact.save(&path)?;

        let predictor = Predictor::load(&path, PredictorForm::default())?;
        let request = PredictionRequest {
            year: 2000,
            pop: 1_000_000,
            gdp_percap: 5000,
        };
        let first = predictor.predict(&request)?;
        let second = predictor.predict(&request)?;

        assert!(first.life_expectancy.is_finite());
        assert_eq!(first.life_expectancy.to_bits(), second.life_expectancy.to_bits());
        assert_eq!(
            first.life_expectancy,
            artifact.predict(request.features())?,
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_retraining_overwrites_artifact() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.bin");
        let dataset = bundled().await?;

        let (small, _) = Trainer::from_settings(&settings(2)).train(&dataset, |_| {})?;
        small.save(&path)?;
        let (large, _) = Trainer::from_settings(&settings(6)).train(&dataset, |_| {})?;
        large.save(&path)?;

        assert_eq!(ModelArtifact::load(&path)?.forest.n_trees(), 6);
        Ok(())
    }
}

/// Shared state behaviour
mod state_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_shares_one_table() -> Result<()> {
        let store = DatasetStore::new(Box::new(BundledSource));
        let a = store.get().await?;
        let b = store.get().await?;
        assert!(Arc::ptr_eq(&a, &b));
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_defaults_all_present() -> Result<()> {
        let dataset = bundled().await?;
        let options = ChartOptions::build(&dataset, &ChartSettings::default())?;
        assert_eq!(options.default_countries, vec!["Turkey", "Syria", "Greece"]);
        assert_eq!(options.countries.len(), 142);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_countries_filtered_against_dataset() -> Result<()> {
        let dataset = bundled().await?;
        let options = ChartOptions::build(
            &dataset,
            &ChartSettings {
                default_countries: vec!["Narnia".to_string(), "Turkey".to_string()],
                year_step: 5,
            },
        )?;
        assert_eq!(options.default_countries, vec!["Turkey".to_string()]);
        assert_eq!(options.year_slider, YearSlider { min: 1952, max: 2007, step: 5 });
        Ok(())
    }
}
