use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const API_KEY_HEADER: &str = "x-miteapikey";
pub const DEFAULT_API_KEY: &str = "secret";

/// A REST collection the mock serves.
#[derive(Debug, Clone, Copy)]
pub struct Collection {
    pub path: &'static str,
    pub envelope: &'static str,
    pub archivable: bool,
    pub writable: bool,
}

pub const COLLECTIONS: &[Collection] = &[
    Collection { path: "customers", envelope: "customer", archivable: true, writable: true },
    Collection { path: "projects", envelope: "project", archivable: true, writable: true },
    Collection { path: "services", envelope: "service", archivable: true, writable: true },
    Collection { path: "users", envelope: "user", archivable: true, writable: false },
    Collection { path: "time_entries", envelope: "time_entry", archivable: false, writable: true },
];

fn collection(path: &str) -> Result<Collection, StatusCode> {
    COLLECTIONS
        .iter()
        .find(|c| c.path == path)
        .copied()
        .ok_or(StatusCode::NOT_FOUND)
}

type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
struct Tracking {
    id: u64,
    minutes: u64,
}

impl Tracking {
    fn to_json(self) -> Value {
        json!({"id": self.id, "minutes": self.minutes})
    }
}

/// In-memory state of one mock account.
#[derive(Debug)]
pub struct Store {
    next_id: u64,
    account: Value,
    myself: u64,
    records: HashMap<&'static str, BTreeMap<u64, Record>>,
    tracking: Option<Tracking>,
}

impl Default for Store {
    fn default() -> Self {
        let mut records: HashMap<&'static str, BTreeMap<u64, Record>> =
            COLLECTIONS.iter().map(|c| (c.path, BTreeMap::new())).collect();
        let users = records.entry("users").or_default();
        for user in [
            json!({"id": 1, "name": "Demo User", "email": "demo@example.com", "note": "", "archived": false, "role": "owner", "language": "en"}),
            json!({"id": 2, "name": "Former Colleague", "email": "former@example.com", "note": "", "archived": true, "role": "time_tracker", "language": "de"}),
        ] {
            if let Value::Object(map) = user {
                let id = map["id"].as_u64().unwrap_or_default();
                users.insert(id, map);
            }
        }
        Self {
            next_id: 1,
            account: json!({"id": 1, "name": "demo", "title": "Demo GmbH", "currency": "EUR"}),
            myself: 1,
            records,
            tracking: None,
        }
    }
}

impl Store {
    fn table(&self, path: &str) -> &BTreeMap<u64, Record> {
        static EMPTY: BTreeMap<u64, Record> = BTreeMap::new();
        self.records.get(path).unwrap_or(&EMPTY)
    }

    fn table_mut(&mut self, path: &'static str) -> &mut BTreeMap<u64, Record> {
        self.records.entry(path).or_default()
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    api_key: Arc<str>,
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        api_key: Arc::from(api_key),
    };
    Router::new()
        .route("/account.json", get(show_account))
        .route("/myself.json", get(show_myself))
        .route("/tracker.json", get(show_tracker))
        .route("/tracker/{file}", put(start_tracker).delete(stop_tracker))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{file}",
            get(show_record).put(update_record).delete(destroy_record),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .is_some_and(|v| v.as_bytes() == state.api_key.as_bytes());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    next.run(request).await
}

fn strip_json(segment: &str) -> Result<&str, StatusCode> {
    segment.strip_suffix(".json").ok_or(StatusCode::NOT_FOUND)
}

fn parse_id(segment: &str) -> Result<u64, StatusCode> {
    strip_json(segment)?.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

fn enveloped(envelope: &str, record: &Record) -> Value {
    json!({ envelope: record })
}

// --- account ---

async fn show_account(State(state): State<AppState>) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({"account": store.account}))
}

async fn show_myself(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let store = state.db.read().await;
    let me = store.table("users").get(&store.myself).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(enveloped("user", me)))
}

// --- collections ---

async fn list_records(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(filter): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    let coll = collection(strip_json(&resource)?)?;
    let store = state.db.read().await;
    Ok(Json(select(&store, coll, false, &filter)))
}

fn select(store: &Store, coll: Collection, archived: bool, filter: &HashMap<String, String>) -> Vec<Value> {
    let limit = filter
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    store
        .table(coll.path)
        .values()
        .filter(|r| !coll.archivable || r.get("archived").and_then(Value::as_bool).unwrap_or(false) == archived)
        .filter(|r| matches_filter(r, filter))
        .take(limit)
        .map(|r| enveloped(coll.envelope, r))
        .collect()
}

fn matches_filter(record: &Record, filter: &HashMap<String, String>) -> bool {
    filter.iter().all(|(key, wanted)| match key.as_str() {
        "limit" | "page" => true,
        "name" => record
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.to_lowercase().contains(&wanted.to_lowercase())),
        field => match record.get(field) {
            Some(Value::String(s)) => s == wanted,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *wanted,
        },
    })
}

async fn show_record(
    State(state): State<AppState>,
    Path((resource, file)): Path<(String, String)>,
    Query(filter): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let coll = collection(&resource)?;
    let store = state.db.read().await;
    if file == "archived.json" {
        if !coll.archivable {
            return Err(StatusCode::NOT_FOUND);
        }
        return Ok(Json(select(&store, coll, true, &filter)).into_response());
    }
    let id = parse_id(&file)?;
    let record = store.table(coll.path).get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(enveloped(coll.envelope, record)).into_response())
}

async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    let coll = strip_json(&resource)
        .and_then(collection)
        .map_err(|status| (status, String::new()))?;
    if !coll.writable {
        return Err((StatusCode::METHOD_NOT_ALLOWED, format!("{} are read-only", coll.path)));
    }
    let Some(Value::Object(attrs)) = body.get(coll.envelope) else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("expected a `{}` object", coll.envelope),
        ));
    };
    let mut record = attrs.clone();
    if coll.path != "time_entries" && !record.get("name").and_then(Value::as_str).is_some_and(|n| !n.is_empty()) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "name can't be blank".to_string()));
    }

    let mut store = state.db.write().await;
    let id = store.next_id;
    store.next_id += 1;
    record.insert("id".to_string(), json!(id));
    record.entry("note").or_insert_with(|| json!(""));
    if coll.archivable {
        record.entry("archived").or_insert(json!(false));
    }
    if coll.path == "time_entries" {
        record.entry("minutes").or_insert(json!(0));
        record.entry("locked").or_insert(json!(false));
    }
    store.table_mut(coll.path).insert(id, record.clone());
    info!(resource = coll.path, id, "created record");
    Ok((StatusCode::CREATED, Json(enveloped(coll.envelope, &record))))
}

async fn update_record(
    State(state): State<AppState>,
    Path((resource, file)): Path<(String, String)>,
    body: String,
) -> Result<StatusCode, StatusCode> {
    let coll = collection(&resource)?;
    if !coll.writable {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }
    let id = parse_id(&file)?;
    let mut store = state.db.write().await;
    let record = store.table_mut(coll.path).get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let prefix = format!("{}[", coll.envelope);
    for (key, raw) in url::form_urlencoded::parse(body.as_bytes()) {
        let Some(field) = key.strip_prefix(prefix.as_str()).and_then(|k| k.strip_suffix(']')) else {
            continue;
        };
        if field == "id" {
            continue;
        }
        let value = coerce(record.get(field), &raw);
        record.insert(field.to_string(), value);
    }
    info!(resource = coll.path, id, "updated record");
    Ok(StatusCode::OK)
}

/// Form values arrive as text; keep the type the field already has.
fn coerce(existing: Option<&Value>, raw: &str) -> Value {
    match existing {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Bool(_)) => raw.parse().map(Value::Bool).unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(Value::Number(_)) => raw.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => raw.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::String(raw.to_string())),
        },
    }
}

async fn destroy_record(
    State(state): State<AppState>,
    Path((resource, file)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let coll = collection(&resource)?;
    if !coll.writable {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }
    let id = parse_id(&file)?;
    let mut store = state.db.write().await;
    store.table_mut(coll.path).remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    if coll.path == "time_entries" && store.tracking.is_some_and(|t| t.id == id) {
        store.tracking = None;
    }
    info!(resource = coll.path, id, "deleted record");
    Ok(StatusCode::OK)
}

// --- tracker ---

async fn show_tracker(State(state): State<AppState>) -> Json<Value> {
    let store = state.db.read().await;
    let tracker = match store.tracking {
        Some(t) => json!({"tracking_time_entry": t.to_json()}),
        None => json!({}),
    };
    Json(json!({"tracker": tracker}))
}

async fn start_tracker(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let id = parse_id(&file)?;
    let mut store = state.db.write().await;
    let entry = store.table("time_entries").get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let started = Tracking {
        id,
        minutes: entry.get("minutes").and_then(Value::as_u64).unwrap_or(0),
    };
    let mut tracker = Map::new();
    tracker.insert("tracking_time_entry".to_string(), started.to_json());
    if let Some(previous) = store.tracking.replace(started) {
        if previous.id != id {
            tracker.insert("stopped_time_entry".to_string(), previous.to_json());
        }
    }
    info!(id, "tracker started");
    Ok(Json(json!({"tracker": tracker})))
}

async fn stop_tracker(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let id = parse_id(&file)?;
    let mut store = state.db.write().await;
    let current = store.tracking;
    match current {
        Some(t) if t.id == id => {
            store.tracking = None;
            info!(id, "tracker stopped");
            Ok(Json(json!({"tracker": {"stopped_time_entry": t.to_json()}})))
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_seeds_users() {
        let store = Store::default();
        assert_eq!(store.table("users").len(), 2);
        assert!(store.table("customers").is_empty());
    }

    #[test]
    fn strip_json_requires_suffix() {
        assert_eq!(strip_json("customers.json"), Ok("customers"));
        assert_eq!(strip_json("customers"), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn parse_id_rejects_non_numeric() {
        assert_eq!(parse_id("12.json"), Ok(12));
        assert_eq!(parse_id("abc.json"), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn coerce_keeps_existing_type() {
        assert_eq!(coerce(Some(&json!(false)), "true"), json!(true));
        assert_eq!(coerce(Some(&json!(10)), "45"), json!(45));
        assert_eq!(coerce(Some(&json!("old")), "123"), json!("123"));
        assert_eq!(coerce(None, "false"), json!(false));
        assert_eq!(coerce(None, "Acme"), json!("Acme"));
    }

    #[test]
    fn filter_matches_name_substring_case_insensitively() {
        let record: Record = json!({"id": 1, "name": "Acme Corp", "customer_id": 7})
            .as_object()
            .cloned()
            .unwrap();
        let filter = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        assert!(matches_filter(&record, &filter(&[("name", "acme")])));
        assert!(matches_filter(&record, &filter(&[("customer_id", "7"), ("limit", "1")])));
        assert!(!matches_filter(&record, &filter(&[("customer_id", "8")])));
        assert!(!matches_filter(&record, &filter(&[("project_id", "1")])));
    }

    #[test]
    fn envelope_wraps_record() {
        let record: Record = json!({"id": 3}).as_object().cloned().unwrap();
        assert_eq!(enveloped("service", &record), json!({"service": {"id": 3}}));
    }
}
