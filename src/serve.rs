//! HTTP server for interactive dashboard mode
//!
//! `stoppalot serve downtime.csv` → starts server, opens browser, renders
//! the timeline/Pareto/waterfall dashboard with live filter controls.
//!
//! The loaded table is cached per server session, keyed by the file's
//! content hash; editing and re-exporting the spreadsheet is picked up on
//! the next render without a restart.

use crate::event::{DurationUnit, Field};
use crate::filter::{FilterParams, Window};
use crate::loader::{LoadError, TableCache};
use crate::pipeline::Pipeline;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(error: impl ToString) -> Self {
        Self { ok: false, data: None, error: Some(error.to_string()) }
    }
}

/// Filter controls as they arrive from the browser: flat strings, multi-
/// selects comma-joined. Parsed into [`FilterParams`] before rendering.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub pivot: Option<String>,
    /// Comma-separated category names; absent means all.
    #[serde(default)]
    pub categories: Option<String>,
    /// Comma-separated equipment names; absent means all.
    #[serde(default)]
    pub equipment: Option<String>,
    /// Window start, `YYYY-MM-DDTHH:MM` (datetime-local input format).
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// Daily time-of-day band, `HH:MM`. When both are present the window
    /// switches to recurring-hours mode over the `from`/`to` dates.
    #[serde(default)]
    pub day_start: Option<String>,
    #[serde(default)]
    pub day_end: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChartQuery {
    /// Validate and convert into pipeline configuration.
    pub fn to_pipeline(&self) -> Result<Pipeline, String> {
        let pivot = match self.pivot.as_deref() {
            None | Some("") | Some("original") => Field::Original,
            Some("reclassified") => Field::Reclassified,
            Some(other) => return Err(format!("unknown pivot '{}'", other)),
        };

        let unit = match self.unit.as_deref() {
            None | Some("") | Some("seconds") => DurationUnit::Seconds,
            Some("hours") => DurationUnit::Hours,
            Some("days") => DurationUnit::Days,
            Some(other) => return Err(format!("unknown unit '{}'", other)),
        };

        let window = self.window()?;
        let params = FilterParams {
            category_field: pivot,
            categories: split_multi(&self.categories),
            equipment: split_multi(&self.equipment),
            window,
        };

        Ok(Pipeline::new().with_params(params).with_unit(unit))
    }

    fn window(&self) -> Result<Window, String> {
        let from = self.from.as_deref().filter(|s| !s.is_empty());
        let to = self.to.as_deref().filter(|s| !s.is_empty());
        let day_start = self.day_start.as_deref().filter(|s| !s.is_empty());
        let day_end = self.day_end.as_deref().filter(|s| !s.is_empty());

        match (from, to, day_start, day_end) {
            (Some(f), Some(t), Some(ds), Some(de)) => Ok(Window::RecurringHours {
                first_day: parse_datetime(f)?.date(),
                last_day: parse_datetime(t)?.date(),
                day_start: parse_time(ds)?,
                day_end: parse_time(de)?,
            }),
            (Some(f), Some(t), None, None) => Ok(Window::Absolute {
                start: parse_datetime(f)?,
                end: parse_datetime(t)?,
            }),
            (None, None, None, None) => Ok(Window::All),
            _ => Err("window requires both 'from' and 'to' (and both day bounds for recurring hours)".to_string()),
        }
    }
}

fn split_multi(value: &Option<String>) -> Option<HashSet<String>> {
    let value = value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.split(',').map(|s| s.trim().to_string()).collect())
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    // A bare date means midnight.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(format!("cannot parse '{}' as a timestamp", s))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    Err(format!("cannot parse '{}' as a time of day", s))
}

/// Metadata for populating the filter controls.
#[derive(Serialize)]
struct TableMeta {
    file: String,
    event_count: usize,
    dropped_rows: usize,
    equipment: Vec<String>,
    categories: Vec<String>,
    first: Option<String>,
    last: Option<String>,
}

/// Start server, open browser, serve the dashboard.
pub fn start(port: u16, path: PathBuf) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let url = format!("http://localhost:{}", port);
    let path_str = path.canonicalize().unwrap_or(path.clone()).display().to_string();

    eprintln!("\n\x1b[1;32m⏱ Stoppalot\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Reporting on: {}\n", path_str);

    // Open browser
    let _ = open::that(&url);

    let mut cache = TableCache::new();

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &path, &path_str, &mut cache) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(
    mut request: Request,
    file: &PathBuf,
    file_label: &str,
    cache: &mut TableCache,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();

    match (&method, path) {
        // Serve embedded UI
        (&Method::Get, "/") => {
            let html = UI_HTML.replace("{{FILE}}", file_label);
            respond(request, html, "text/html")
        }

        // API: filter-control metadata
        (&Method::Get, "/api/meta") => {
            let json = match cache.get_or_load(file) {
                Ok(table) => {
                    let (first, last) = match table.time_span() {
                        Some((f, l)) => (Some(f.to_string()), Some(l.to_string())),
                        None => (None, None),
                    };
                    let meta = TableMeta {
                        file: file_label.to_string(),
                        event_count: table.events.len(),
                        dropped_rows: table.dropped_rows,
                        equipment: table.equipment_names(),
                        categories: table.category_names(),
                        first,
                        last,
                    };
                    serde_json::to_string(&ApiResponse::success(meta))?
                }
                Err(e) => error_json(&e)?,
            };
            respond(request, json, "application/json")
        }

        // API: render the chart bundle
        (&Method::Get, "/api/charts") | (&Method::Post, "/api/charts") => {
            let query = parse_query(&mut request)?;
            let json = match cache.get_or_load(file) {
                Ok(table) => match query.to_pipeline() {
                    Ok(pipeline) => {
                        let bundle = pipeline.run(&table.events);
                        eprintln!("→ {} events", bundle.event_count);
                        serde_json::to_string(&ApiResponse::success(bundle))?
                    }
                    Err(msg) => {
                        serde_json::to_string(&ApiResponse::<()>::failure(msg))?
                    }
                },
                Err(e) => error_json(&e)?,
            };
            respond(request, json, "application/json")
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn error_json(e: &LoadError) -> std::io::Result<String> {
    Ok(serde_json::to_string(&ApiResponse::<()>::failure(e))?)
}

fn respond(request: Request, body: String, content_type: &str) -> std::io::Result<()> {
    let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .expect("static content type");
    request.respond(Response::from_string(body).with_header(header))
}

fn parse_query(request: &mut Request) -> std::io::Result<ChartQuery> {
    let url = request.url().to_string();

    // Try query string
    if let Some(query) = url.split('?').nth(1) {
        if let Ok(params) = serde_urlencoded::from_str::<ChartQuery>(query) {
            return Ok(params);
        }
    }

    // Try JSON body
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    if !body.is_empty() {
        if let Ok(params) = serde_json::from_str::<ChartQuery>(&body) {
            return Ok(params);
        }
    }

    Ok(ChartQuery::default())
}
