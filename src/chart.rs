//! Chart rendering
//!
//! Turns the series store into a Plotly-compatible figure description: the
//! raw luminosity line and a dashed line at the mean of every stored value.
//! An empty store renders as an empty figure (`{}`).
//!
//! x values are wall-clock strings in the store's timezone, since Plotly's
//! date axis drops UTC offsets. Wall-clock time repeats during a DST
//! fall-back hour, so the raw trace can double back for that hour. Each raw
//! point also carries its RFC 3339 timestamp with offset as hover text,
//! which stays unambiguous.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::series::SeriesStore;

/// Wall-clock format for x values, in the store's timezone
const X_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const RAW_COLOR: &str = "orange";
const MEAN_COLOR: &str = "blue";

/// A figure: traces plus layout
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Figure {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One scatter trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    /// Hover text per point; omitted when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    pub mode: &'static str,
    pub name: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub hovermode: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Self {
            title: Title {
                text: text.to_string(),
            },
        }
    }
}

/// Render the store. Returns an empty figure until data has been stored.
pub fn render(store: &SeriesStore) -> Figure {
    let (Some(mean), Some(first), Some(last)) =
        (store.mean(), store.first_timestamp(), store.last_timestamp())
    else {
        return Figure::default();
    };

    let x: Vec<String> = store
        .timestamps()
        .iter()
        .map(|ts| ts.format(X_FORMAT).to_string())
        .collect();

    let text: Vec<String> = store
        .timestamps()
        .iter()
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, false))
        .collect();

    let raw = Trace {
        kind: "scatter",
        x,
        y: store.values().to_vec(),
        text,
        mode: "lines+markers",
        name: "Luminosity".to_string(),
        line: Line {
            color: RAW_COLOR,
            dash: None,
        },
    };

    let mean_line = Trace {
        kind: "scatter",
        x: vec![
            first.format(X_FORMAT).to_string(),
            last.format(X_FORMAT).to_string(),
        ],
        y: vec![mean, mean],
        text: Vec::new(),
        mode: "lines",
        name: "Mean Luminosity".to_string(),
        line: Line {
            color: MEAN_COLOR,
            dash: Some("dash"),
        },
    };

    Figure {
        data: vec![raw, mean_line],
        layout: Some(Layout {
            title: Title {
                text: "Luminosity Over Time".to_string(),
            },
            xaxis: Axis::titled("Timestamp"),
            yaxis: Axis::titled("Luminosity"),
            hovermode: "closest",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{OverlapPolicy, Sample, TimeNormalizer};
    use chrono_tz::Europe::Lisbon;

    fn store_with(points: &[(&str, f64)]) -> SeriesStore {
        let normalizer = TimeNormalizer::new(Lisbon);
        let mut store = SeriesStore::new(OverlapPolicy::Append, None);
        store.append(
            points
                .iter()
                .map(|(ts, v)| Sample::new(normalizer.normalize(ts).unwrap(), *v)),
        );
        store
    }

    #[test]
    fn test_empty_store_renders_empty_figure() {
        let figure = render(&SeriesStore::default());
        assert!(figure.is_empty());
        assert_eq!(serde_json::to_string(&figure).unwrap(), "{}");
    }

    #[test]
    fn test_two_traces() {
        let store = store_with(&[
            ("2024-07-01T10:00:00.000Z", 10.0),
            ("2024-07-01T10:00:10.000Z", 20.0),
            ("2024-07-01T10:00:20Z", 60.0),
        ]);
        let figure = render(&store);

        assert_eq!(figure.data.len(), 2);
        let raw = &figure.data[0];
        assert_eq!(raw.mode, "lines+markers");
        assert_eq!(raw.y, vec![10.0, 20.0, 60.0]);
        // Lisbon summer time
        assert_eq!(raw.x[0], "2024-07-01 11:00:00.000");
        assert_eq!(raw.x[2], "2024-07-01 11:00:20.000");

        let mean = &figure.data[1];
        assert_eq!(mean.name, "Mean Luminosity");
        assert_eq!(mean.x, vec![raw.x[0].clone(), raw.x[2].clone()]);
        assert_eq!(mean.y, vec![30.0, 30.0]);
        assert_eq!(mean.line.dash, Some("dash"));
    }

    #[test]
    fn test_mean_tracks_all_accumulated_values() {
        let mut store = store_with(&[("2024-01-01T10:00:00Z", 1.0)]);
        assert_eq!(render(&store).data[1].y, vec![1.0, 1.0]);

        let normalizer = TimeNormalizer::new(Lisbon);
        store.append(vec![
            Sample::new(normalizer.normalize("2024-01-01T10:00:10Z").unwrap(), 2.0),
            Sample::new(normalizer.normalize("2024-01-01T10:00:20Z").unwrap(), 6.0),
        ]);
        assert_eq!(render(&store).data[1].y, vec![3.0, 3.0]);
    }

    #[test]
    fn test_single_point_mean_line() {
        let store = store_with(&[("2024-01-01T10:00:00.000Z", 12.5)]);
        let figure = render(&store);
        let mean = &figure.data[1];
        assert_eq!(mean.x[0], mean.x[1]);
        assert_eq!(mean.x[0], "2024-01-01 10:00:00.000");
        assert_eq!(mean.y, vec![12.5, 12.5]);
    }

    #[test]
    fn test_fall_back_hour_keeps_offsets_in_hover_text() {
        // 2024-10-27: Lisbon leaves WEST at 01:00Z, so 01:30 local happens twice
        let store = store_with(&[
            ("2024-10-27T00:30:00Z", 4.0),
            ("2024-10-27T01:30:00Z", 8.0),
        ]);
        let raw = &render(&store).data[0];

        assert_eq!(raw.x[0], "2024-10-27 01:30:00.000");
        assert_eq!(raw.x[1], "2024-10-27 01:30:00.000");
        assert_eq!(
            raw.text,
            vec![
                "2024-10-27T01:30:00.000+01:00".to_string(),
                "2024-10-27T01:30:00.000+00:00".to_string(),
            ]
        );
    }

    #[test]
    fn test_layout_serialization() {
        let store = store_with(&[("2024-01-01T10:00:00Z", 5.0)]);
        let json = serde_json::to_value(render(&store)).unwrap();

        assert_eq!(json["layout"]["title"]["text"], "Luminosity Over Time");
        assert_eq!(json["layout"]["xaxis"]["title"]["text"], "Timestamp");
        assert_eq!(json["layout"]["yaxis"]["title"]["text"], "Luminosity");
        assert_eq!(json["layout"]["hovermode"], "closest");
        assert_eq!(json["data"][0]["type"], "scatter");
        assert_eq!(json["data"][0]["line"]["color"], "orange");
        assert!(json["data"][0]["line"].get("dash").is_none());
        assert_eq!(json["data"][0]["text"][0], "2024-01-01T10:00:00.000+00:00");
        assert!(json["data"][1].get("text").is_none());
        assert_eq!(json["data"][1]["line"]["color"], "blue");
    }
}
