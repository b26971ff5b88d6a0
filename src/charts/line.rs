use crate::charts::figure::{palette_color, Axis, Figure, Layout, Legend, LineStyle, ScatterTrace, Title, Trace};
use crate::core::{DashboardError, DashboardResult};
use crate::dataset::Dataset;

/// Life expectancy over time, one line per selected country.
///
/// Repeated selections collapse to one series, keeping the first position.
/// Countries missing from the dataset are rejected.
pub fn life_expectancy_lines(dataset: &Dataset, countries: &[String]) -> DashboardResult<Figure> {
    let mut selected: Vec<&str> = Vec::with_capacity(countries.len());
    for country in countries {
        if !dataset.contains_country(country) {
            return Err(DashboardError::UnknownCountry(country.clone()));
        }
        if !selected.contains(&country.as_str()) {
            selected.push(country.as_str());
        }
    }

    let data = selected
        .iter()
        .enumerate()
        .map(|(i, country)| {
            let mut points: Vec<(i32, f64)> = dataset
                .for_country(country)
                .map(|obs| (obs.year, obs.life_exp))
                .collect();
            points.sort_by_key(|(year, _)| *year);

            Trace::Scatter(ScatterTrace {
                name: country.to_string(),
                mode: "lines",
                x: points.iter().map(|(year, _)| *year as f64).collect(),
                y: points.iter().map(|(_, life)| *life).collect(),
                ids: None,
                hovertext: None,
                legendgroup: Some(country.to_string()),
                line: Some(LineStyle {
                    color: palette_color(i).to_string(),
                    dash: None,
                    width: None,
                }),
                marker: None,
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis::titled("year")),
            yaxis: Some(Axis::titled("lifeExp")),
            legend: Some(Legend {
                title: Title::new("country"),
            }),
            ..Default::default()
        },
        frames: Vec::new(),
    })
}

/// The configured default selection, minus countries the dataset lacks
pub fn default_selection(dataset: &Dataset, defaults: &[String]) -> Vec<String> {
    defaults
        .iter()
        .filter(|country| dataset.contains_country(country))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
country,continent,year,lifeExp,pop,gdpPercap,iso_alpha,iso_num
Turkey,Europe,1957,48.079,25670939,2218.754257,TUR,792
Turkey,Europe,1952,43.585,22235677,1969.10098,TUR,792
Greece,Europe,1952,65.86,7733250,3530.690067,GRC,300
Greece,Europe,1957,67.86,8096218,4916.299889,GRC,300
Syria,Asia,1952,45.883,3661549,1643.485354,SYR,760
Syria,Asia,1962,51.32,4834621,2193.037133,SYR,760
Chad,Africa,1952,38.092,2682462,1178.665927,TCD,148
";

    fn dataset() -> Dataset {
        Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap()
    }

    fn names(figure: &Figure) -> Vec<&str> {
        figure.data.iter().filter_map(|trace| trace.name()).collect()
    }

    #[test]
    fn test_one_series_per_country() {
        let selection = vec!["Turkey".to_string(), "Syria".to_string(), "Greece".to_string()];
        let figure = life_expectancy_lines(&dataset(), &selection).unwrap();
        assert_eq!(names(&figure), vec!["Turkey", "Syria", "Greece"]);
    }

    #[test]
    fn test_series_only_contain_present_years() {
        let figure = life_expectancy_lines(&dataset(), &["Syria".to_string()]).unwrap();
        match &figure.data[0] {
            Trace::Scatter(trace) => {
                assert_eq!(trace.x, vec![1952.0, 1962.0]);
                assert_eq!(trace.y, vec![45.883, 51.32]);
            }
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_points_are_sorted_by_year() {
        let figure = life_expectancy_lines(&dataset(), &["Turkey".to_string()]).unwrap();
        match &figure.data[0] {
            Trace::Scatter(trace) => assert_eq!(trace.x, vec![1952.0, 1957.0]),
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_duplicates_collapse() {
        let selection = vec!["Chad".to_string(), "Chad".to_string()];
        let figure = life_expectancy_lines(&dataset(), &selection).unwrap();
        assert_eq!(names(&figure), vec!["Chad"]);
    }

    #[test]
    fn test_empty_selection() {
        let figure = life_expectancy_lines(&dataset(), &[]).unwrap();
        assert!(figure.data.is_empty());
    }

    #[test]
    fn test_unknown_country_rejected() {
        let result = life_expectancy_lines(&dataset(), &["Atlantis".to_string()]);
        assert!(matches!(result, Err(DashboardError::UnknownCountry(c)) if c == "Atlantis"));
    }

    #[test]
    fn test_default_selection_drops_missing() {
        let defaults = vec!["Turkey".to_string(), "Narnia".to_string(), "Greece".to_string()];
        assert_eq!(default_selection(&dataset(), &defaults), vec!["Turkey", "Greece"]);
    }
}
