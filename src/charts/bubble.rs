use serde_json::json;

use crate::charts::figure::{palette_color, Axis, Figure, Frame, Layout, Legend, Marker, ScatterTrace, Shape, Title, Trace};
use crate::dataset::Dataset;

/// Largest bubble diameter in pixels
pub const SIZE_MAX: f64 = 60.0;
/// Visible gdpPercap window (log axis)
pub const GDP_RANGE: [f64; 2] = [100.0, 100_000.0];
/// Visible lifeExp window
pub const LIFE_EXP_RANGE: [f64; 2] = [25.0, 90.0];
/// Horizontal reference line
pub const REFERENCE_LIFE_EXP: f64 = 50.0;

/// GDP per capita against life expectancy, bubbles sized by population and
/// colored by continent, one animation frame per year.
pub fn wealth_health_bubbles(dataset: &Dataset) -> Figure {
    let mut continents: Vec<&str> = Vec::new();
    for obs in dataset.observations() {
        if !continents.contains(&obs.continent.as_str()) {
            continents.push(&obs.continent);
        }
    }

    let max_pop = dataset
        .observations()
        .iter()
        .map(|obs| obs.pop)
        .max()
        .unwrap_or(1)
        .max(1) as f64;
    let sizeref = 2.0 * max_pop / (SIZE_MAX * SIZE_MAX);

    // every frame carries one trace per continent so traces line up by index
    let frames: Vec<Frame> = dataset
        .years()
        .iter()
        .map(|&year| Frame {
            name: year.to_string(),
            data: continents
                .iter()
                .enumerate()
                .map(|(i, continent)| {
                    let rows: Vec<_> = dataset
                        .for_year(year)
                        .filter(|obs| obs.continent == *continent)
                        .collect();
                    Trace::Scatter(ScatterTrace {
                        name: continent.to_string(),
                        mode: "markers",
                        x: rows.iter().map(|obs| obs.gdp_percap).collect(),
                        y: rows.iter().map(|obs| obs.life_exp).collect(),
                        ids: Some(rows.iter().map(|obs| obs.country.clone()).collect()),
                        hovertext: Some(rows.iter().map(|obs| obs.country.clone()).collect()),
                        legendgroup: Some(continent.to_string()),
                        line: None,
                        marker: Some(Marker {
                            color: palette_color(i).to_string(),
                            size: Some(rows.iter().map(|obs| obs.pop as f64).collect()),
                            sizemode: Some("area"),
                            sizeref: Some(sizeref),
                        }),
                    })
                })
                .collect(),
        })
        .collect();

    let data = frames.first().map(|frame| frame.data.clone()).unwrap_or_default();

    Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis {
                title: Some(Title::new("gdpPercap")),
                axis_type: Some("log"),
                range: Some([GDP_RANGE[0].log10(), GDP_RANGE[1].log10()]),
            }),
            yaxis: Some(Axis {
                title: Some(Title::new("lifeExp")),
                axis_type: None,
                range: Some(LIFE_EXP_RANGE),
            }),
            legend: Some(Legend {
                title: Title::new("continent"),
            }),
            shapes: vec![Shape::hline(REFERENCE_LIFE_EXP, "black", "dash")],
            sliders: vec![year_slider(dataset.years())],
            updatemenus: vec![play_controls()],
            ..Default::default()
        },
        frames,
    }
}

fn frame_args(names: serde_json::Value, duration: u64) -> serde_json::Value {
    json!([
        names,
        {
            "mode": "immediate",
            "fromcurrent": true,
            "frame": {"duration": duration, "redraw": false},
            "transition": {"duration": duration / 2, "easing": "linear"}
        }
    ])
}

fn year_slider(years: &[i32]) -> serde_json::Value {
    let steps: Vec<_> = years
        .iter()
        .map(|year| {
            json!({
                "label": year.to_string(),
                "method": "animate",
                "args": frame_args(json!([year.to_string()]), 0),
            })
        })
        .collect();

    json!({
        "active": 0,
        "currentvalue": {"prefix": "year="},
        "pad": {"b": 10, "t": 60},
        "len": 0.9,
        "x": 0.1,
        "y": 0,
        "steps": steps,
    })
}

fn play_controls() -> serde_json::Value {
    json!({
        "type": "buttons",
        "direction": "left",
        "showactive": false,
        "pad": {"r": 10, "t": 70},
        "x": 0.1,
        "xanchor": "right",
        "y": 0,
        "yanchor": "top",
        "buttons": [
            {"label": "&#9654;", "method": "animate", "args": frame_args(serde_json::Value::Null, 500)},
            {"label": "&#9724;", "method": "animate", "args": frame_args(json!([null]), 0)},
        ],
    })
}
