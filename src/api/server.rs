use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::api::AppState;
use crate::charts::{life_expectancy_lines, life_expectancy_map, wealth_health_bubbles};
use crate::core::config::ServerSettings;
use crate::core::DashboardError;
use crate::predictor::{PredictionRequest, PredictorForm};

/// The single page with the home, charts and predictor tabs
pub const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Largest accepted JSON body for the predictor
const MAX_BODY_BYTES: u64 = 4 * 1024;

/// Dashboard HTTP server
pub struct DashboardServer {
    config: ServerSettings,
    state: Arc<AppState>,
}

#[derive(Debug, Deserialize)]
struct MapQuery {
    year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct PredictorFormResponse {
    form: PredictorForm,
    defaults: PredictionRequest,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    code: String,
}

/// Wraps library errors so they travel through warp's rejection chain
#[derive(Debug)]
struct ApiRejection(DashboardError);
impl warp::reject::Reject for ApiRejection {}

fn reject(err: DashboardError) -> Rejection {
    warp::reject::custom(ApiRejection(err))
}

impl DashboardServer {
    pub fn new(config: ServerSettings, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid server address")?;

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        };

        let (bound, server) = warp::serve(routes(self.state))
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .context("Failed to bind dashboard server")?;

        info!("Dashboard listening on http://{}", bound);
        server.await;
        info!("Dashboard stopped");

        Ok(())
    }
}

/// Build every route, with JSON error rendering and request logging
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    index
        .or(dataset_routes(state.clone()))
        .or(chart_routes(state.clone()))
        .or(predictor_routes(state))
        .recover(handle_rejection)
        .with(warp::log("lifeexp::api"))
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// Raw query string, empty when the request has none
fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

fn dataset_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    // GET /api/dataset
    warp::path!("api" / "dataset")
        .and(warp::get())
        .and(with_state(state))
        .and_then(|state: Arc<AppState>| async move {
            let dataset = state.dataset().await.map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&dataset.observations()))
        })
}

fn chart_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    // GET /api/charts/options
    let options = warp::path!("api" / "charts" / "options")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|state: Arc<AppState>| async move {
            let options = state.chart_options().await.map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&options))
        });

    // GET /api/charts/life-expectancy?country=A&country=B
    let lines = warp::path!("api" / "charts" / "life-expectancy")
        .and(warp::get())
        .and(raw_query())
        .and(with_state(state.clone()))
        .and_then(|query: String, state: Arc<AppState>| async move {
            crate::track_performance!("line_chart");
            let options = state.chart_options().await.map_err(reject)?;
            let countries = selected_countries(&query).unwrap_or(options.default_countries);
            let dataset = state.dataset().await.map_err(reject)?;
            let figure = life_expectancy_lines(&dataset, &countries).map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&figure))
        });

    // GET /api/charts/map?year=1977
    let map = warp::path!("api" / "charts" / "map")
        .and(warp::get())
        .and(warp::query::<MapQuery>())
        .and(with_state(state.clone()))
        .and_then(|query: MapQuery, state: Arc<AppState>| async move {
            crate::track_performance!("choropleth_chart");
            let options = state.chart_options().await.map_err(reject)?;
            let dataset = state.dataset().await.map_err(reject)?;
            let figure = life_expectancy_map(&dataset, &options.year_slider, query.year);
            Ok::<_, Rejection>(warp::reply::json(&figure))
        });

    // GET /api/charts/bubbles
    let bubbles = warp::path!("api" / "charts" / "bubbles")
        .and(warp::get())
        .and(with_state(state))
        .and_then(|state: Arc<AppState>| async move {
            crate::track_performance!("bubble_chart");
            let dataset = state.dataset().await.map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&wealth_health_bubbles(&dataset)))
        });

    options.or(lines).or(map).or(bubbles)
}

fn predictor_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    // GET /api/predictor/form
    let form = warp::path!("api" / "predictor" / "form")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| {
            let form = *state.predictor().form();
            warp::reply::json(&PredictorFormResponse {
                form,
                defaults: form.defaults(),
            })
        });

    // POST /api/predict
    let predict = warp::path!("api" / "predict")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|request: PredictionRequest, state: Arc<AppState>| async move {
            let result = state.predictor().predict(&request).map_err(reject)?;
            info!(
                year = result.input.year,
                pop = result.input.pop,
                gdp_percap = result.input.gdp_percap,
                life_exp = result.life_expectancy,
                "Prediction"
            );
            Ok::<_, Rejection>(warp::reply::json(&result))
        });

    form.or(predict)
}

/// Countries named by repeated `country=` parameters.
///
/// `None` when the parameter is absent, so the caller can fall back to the
/// default selection; empty values are ignored, so `?country=` selects none.
fn selected_countries(query: &str) -> Option<Vec<String>> {
    let mut present = false;
    let countries: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "country")
        .inspect(|_| present = true)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    present.then_some(countries)
}

/// Global Error Handler
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not Found".to_string())
    } else if let Some(ApiRejection(e)) = err.find::<ApiRejection>() {
        if e.is_client_error() {
            warn!(error = %e, "Rejected request");
            (StatusCode::BAD_REQUEST, e.code(), e.to_string())
        } else {
            error!(error = %e, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string())
        }
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "invalid_body", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, "invalid_query", e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "Payload Too Large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type", "Expected JSON".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method Not Allowed".to_string())
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal Server Error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiError {
            error: message,
            code: code.to_string(),
        }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChartSettings;
    use crate::dataset::{BundledSource, DatasetStore};
    use crate::ml::{ForestParams, ModelArtifact, RandomForestRegressor};
    use crate::predictor::Predictor;
    use ndarray::{Array1, Array2};
    use serde_json::Value;
    use warp::test::request;

    fn state() -> Arc<AppState> {
        let x = Array2::from_shape_fn((20, 3), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(20, |i| 40.0 + i as f64);
        let forest = RandomForestRegressor::fit(
            ForestParams {
                n_estimators: 4,
                ..Default::default()
            },
            x.view(),
            y.view(),
        )
        .unwrap();
        let predictor = Predictor::new(ModelArtifact::new(forest, 0.0), PredictorForm::default());
        let mut charts = ChartSettings::default();
        charts.default_countries.push("Narnia".to_string());
        Arc::new(AppState::new(DatasetStore::new(Box::new(BundledSource)), charts, predictor))
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn test_selected_countries_parsing() {
        assert_eq!(selected_countries(""), None);
        assert_eq!(selected_countries("country="), Some(vec![]));
        assert_eq!(
            selected_countries("country=Korea%2C+Rep.&country=Chad&other=1"),
            Some(vec!["Korea, Rep.".to_string(), "Chad".to_string()])
        );
    }

    #[tokio::test]
    async fn test_index_page() {
        let resp = request().method("GET").path("/").reply(&routes(state())).await;
        assert_eq!(resp.status(), 200);
        assert!(String::from_utf8_lossy(resp.body()).contains("<html"));
    }

    #[tokio::test]
    async fn test_line_chart_defaults() {
        let resp = request()
            .method("GET")
            .path("/api/charts/life-expectancy")
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 200);
        let body = json(resp.body());
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|trace| trace["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Turkey", "Syria", "Greece"]);
    }

    #[tokio::test]
    async fn test_line_chart_unknown_country() {
        let resp = request()
            .method("GET")
            .path("/api/charts/life-expectancy?country=Narnia")
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(json(resp.body())["code"], "unknown_country");
    }

    #[tokio::test]
    async fn test_map_snaps_year() {
        let resp = request()
            .method("GET")
            .path("/api/charts/map?year=1959")
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 200);
        assert_eq!(json(resp.body())["layout"]["title"]["text"], "1957");
    }

    #[tokio::test]
    async fn test_map_rejects_bad_year() {
        let resp = request()
            .method("GET")
            .path("/api/charts/map?year=soon")
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_predict() {
        let resp = request()
            .method("POST")
            .path("/api/predict")
            .json(&serde_json::json!({"year": 2000, "pop": 1_000_000, "gdpPercap": 5000}))
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 200);
        let body = json(resp.body());
        assert!(body["lifeExp"].as_f64().unwrap().is_finite());
        assert_eq!(body["input"]["gdpPercap"], 5000);
    }

    #[tokio::test]
    async fn test_predict_rejects_malformed_body() {
        let resp = request()
            .method("POST")
            .path("/api/predict")
            .header("content-type", "application/json")
            .body(r#"{"year": "two thousand"}"#)
            .reply(&routes(state()))
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(json(resp.body())["code"], "invalid_body");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let resp = request().method("GET").path("/nope").reply(&routes(state())).await;
        assert_eq!(resp.status(), 404);
    }
}
