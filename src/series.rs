/// Series fetching: one GET, one JSON payload, one `(x, y)` point sequence.
///
/// The backend answers every panel endpoint with
///
/// ```json
/// { "data": [ { "<x_field>": ..., "<y_field>": ..., ... }, ... ] }
/// ```
///
/// [`project_series`] turns such a payload into a [`Series`]. Values are
/// carried through exactly as received; a missing key becomes JSON `null`.
/// Nothing is cached: every call to [`SeriesSource::fetch_series`] goes to
/// the network.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::client::ApiClient;
use crate::error::{FetchError, FetchResult};

/// Name of the payload field that holds the row array.
pub const DATA_FIELD: &str = "data";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One chart point: `x` is the label value, `y` the plotted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Value,
    pub y: Value,
}

impl Point {
    /// The x value as axis label text (`"1990"` rather than `"\"1990\""`).
    pub fn label(&self) -> String {
        value_label(&self.x)
    }

    /// The y value as a number, if it is one.
    ///
    /// Numeric strings are accepted as well since some backends serialize
    /// decimals as text.
    pub fn value(&self) -> Option<f64> {
        match &self.y {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|v: &f64| v.is_finite())
    }
}

/// Ordered points underlying one chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<Point>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with a numeric y, paired with their original index.
    pub fn plottable(&self) -> impl Iterator<Item = (usize, &Point, f64)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.value().map(|v| (i, p, v)))
    }

    /// `(min, max)` over the numeric y values, or `None` when nothing is
    /// plottable.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.plottable().fold(None, |acc, (_, _, v)| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Render a JSON scalar as plain label text.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project a decoded payload into a [`Series`].
///
/// - `data` absent (or the payload not an object) → empty series.
/// - `data` present but not an array → [`FetchError::Parse`].
/// - Each row contributes `row[x_field]` and `row[y_field]`, in order. Rows
///   that are not objects, or lack a key, yield `null` for that coordinate.
pub fn project_series(
    url: &str,
    payload: &Value,
    x_field: &str,
    y_field: &str,
) -> FetchResult<Series> {
    let rows = match payload.get(DATA_FIELD) {
        None | Some(Value::Null) => return Ok(Series::default()),
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(FetchError::Parse {
                url: url.to_string(),
                message: format!("`{DATA_FIELD}` is {}, expected an array", type_name(other)),
            });
        }
    };

    let points = rows
        .iter()
        .map(|row| Point {
            x: row.get(x_field).cloned().unwrap_or(Value::Null),
            y: row.get(y_field).cloned().unwrap_or(Value::Null),
        })
        .collect();

    Ok(Series { points })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Anything that can produce a series for a panel.
///
/// Implementations are called from worker threads, hence `Send + Sync`.
pub trait SeriesSource: Send + Sync {
    fn fetch_series(
        &self,
        endpoint: &str,
        x_field: &str,
        y_field: &str,
        cancel: &CancelToken,
    ) -> FetchResult<Series>;
}

/// [`SeriesSource`] backed by the dashboard's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSeriesFetcher {
    client: ApiClient,
}

impl HttpSeriesFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl SeriesSource for HttpSeriesFetcher {
    /// Issue one `GET` for `endpoint` (a path under the base URL or an
    /// absolute URL) and project the payload.
    fn fetch_series(
        &self,
        endpoint: &str,
        x_field: &str,
        y_field: &str,
        cancel: &CancelToken,
    ) -> FetchResult<Series> {
        let url = self.client.endpoint_url(endpoint);
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { url });
        }

        let payload = self.client.get_json(&url)?;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { url });
        }

        project_series(&url, &payload, x_field, y_field)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
