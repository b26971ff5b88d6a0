use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

use crate::core::{DashboardError, DashboardResult};

/// One row of the Gapminder table: a country in a given year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub continent: String,
    pub year: i32,
    #[serde(rename = "lifeExp")]
    pub life_exp: f64,
    pub pop: u64,
    #[serde(rename = "gdpPercap")]
    pub gdp_percap: f64,
    pub iso_alpha: String,
    pub iso_num: u32,
}

impl Observation {
    /// Model features in training order: year, pop, gdpPercap
    pub fn features(&self) -> [f64; 3] {
        [self.year as f64, self.pop as f64, self.gdp_percap]
    }
}

/// Immutable, non-empty table of observations with precomputed summaries
#[derive(Debug, Clone)]
pub struct Dataset {
    observations: Vec<Observation>,
    countries: Vec<String>,
    country_index: HashSet<String>,
    years: Vec<i32>,
    life_exp_range: (f64, f64),
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> DashboardResult<Self> {
        if observations.is_empty() {
            return Err(DashboardError::DatasetError("dataset has no rows".to_string()));
        }

        let mut countries = Vec::new();
        let mut country_index = HashSet::new();
        let mut years = Vec::new();
        let mut min_life = f64::INFINITY;
        let mut max_life = f64::NEG_INFINITY;

        for obs in &observations {
            if !obs.life_exp.is_finite() {
                return Err(DashboardError::DatasetError(format!(
                    "non-finite life expectancy for {} in {}",
                    obs.country, obs.year
                )));
            }
            if country_index.insert(obs.country.clone()) {
                countries.push(obs.country.clone());
            }
            years.push(obs.year);
            min_life = min_life.min(obs.life_exp);
            max_life = max_life.max(obs.life_exp);
        }

        years.sort_unstable();
        years.dedup();

        Ok(Self {
            observations,
            countries,
            country_index,
            years,
            life_exp_range: (min_life, max_life),
        })
    }

    /// Parse a CSV table with the Gapminder header
    pub fn from_csv_reader<R: Read>(reader: R) -> DashboardResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let observations = csv_reader
            .deserialize::<Observation>()
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct countries in first-appearance order
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.country_index.contains(country)
    }

    /// Distinct years, ascending
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn year_range(&self) -> (i32, i32) {
        // non-empty by construction
        (self.years[0], self.years[self.years.len() - 1])
    }

    /// Global (min, max) life expectancy over every row
    pub fn life_exp_range(&self) -> (f64, f64) {
        self.life_exp_range
    }

    pub fn for_country<'a>(&'a self, country: &'a str) -> impl Iterator<Item = &'a Observation> + 'a {
        self.observations.iter().filter(move |obs| obs.country == country)
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &Observation> + '_ {
        self.observations.iter().filter(move |obs| obs.year == year)
    }

    /// Feature rows and life-expectancy targets, in table order
    pub fn features_and_targets(&self) -> (Vec<[f64; 3]>, Vec<f64>) {
        self.observations
            .iter()
            .map(|obs| (obs.features(), obs.life_exp))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
country,continent,year,lifeExp,pop,gdpPercap,iso_alpha,iso_num
Sweden,Europe,1952,71.86,7124673,8527.844662,SWE,752
Sweden,Europe,1957,72.49,7363802,9911.878226,SWE,752
Chad,Africa,1952,38.092,2682462,1178.665927,TCD,148
Chad,Africa,1957,39.881,2894855,1308.495577,TCD,148
";

    #[test]
    fn test_parse_csv() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.countries(), &["Sweden".to_string(), "Chad".to_string()]);
        assert_eq!(dataset.years(), &[1952, 1957]);
        assert_eq!(dataset.year_range(), (1952, 1957));
        assert_eq!(dataset.life_exp_range(), (38.092, 72.49));

        let first = &dataset.observations()[0];
        assert_eq!(first.iso_alpha, "SWE");
        assert_eq!(first.pop, 7124673);
        assert_eq!(first.features(), [1952.0, 7124673.0, 8527.844662]);
    }

    #[test]
    fn test_filters() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert!(dataset.contains_country("Chad"));
        assert!(!dataset.contains_country("Atlantis"));
        assert_eq!(dataset.for_country("Chad").count(), 2);
        assert_eq!(dataset.for_year(1957).count(), 2);
        assert_eq!(dataset.for_year(2000).count(), 0);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let header_only = "country,continent,year,lifeExp,pop,gdpPercap,iso_alpha,iso_num\n";
        let result = Dataset::from_csv_reader(header_only.as_bytes());
        assert!(matches!(result, Err(DashboardError::DatasetError(_))));
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let broken = "country,continent,year,lifeExp,pop,gdpPercap,iso_alpha,iso_num\nX,Y,notayear,1,2,3,XXX,1\n";
        let result = Dataset::from_csv_reader(broken.as_bytes());
        assert!(matches!(result, Err(DashboardError::CsvError(_))));
    }
}
