//! Live counts and samples of a field's values in a triple store.

use crate::{
    airtable::Session,
    cache::BoundedCache,
    config::Settings,
    registry::Database,
    task::FieldTask,
    Error, Result,
};
use log::{debug, info, warn};
use serde_json::{json, Value};
use ureq::Agent;

pub const SPARQL_RESULTS: &str = "application/sparql-results+json";

/// A status code and JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

impl JsonResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Runs SELECT queries against a SPARQL endpoint.
pub trait SparqlEndpoint: Send + Sync {
    /// The JSON result document of `query`.
    fn select(&self, endpoint: &str, query: &str) -> Result<Value>;
}

/// Posts queries as `application/x-www-form-urlencoded`.
pub struct HttpEndpoint {
    agent: Agent,
}

impl Default for HttpEndpoint {
    fn default() -> Self {
        Self {
            agent: Agent::new_with_defaults(),
        }
    }
}

impl SparqlEndpoint for HttpEndpoint {
    fn select(&self, endpoint: &str, query: &str) -> Result<Value> {
        debug!("POST {}", endpoint);
        let mut response = self
            .agent
            .post(endpoint)
            .header("Accept", SPARQL_RESULTS)
            .send_form([("query", query)])?;
        Ok(response.body_mut().read_json::<Value>()?)
    }
}

fn bindings(results: &Value) -> Result<&Vec<Value>> {
    results
        .get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Upstream(String::from("no bindings in the query results")))
}

/// Text of `variable` in one binding row.
fn binding_value<'a>(row: &'a Value, variable: &str) -> Option<&'a str> {
    row.get(variable)?.get("value")?.as_str()
}

fn parse_count(results: &Value) -> Result<u64> {
    let count = bindings(results)?
        .first()
        .and_then(|row| binding_value(row, "count"))
        .ok_or_else(|| Error::Upstream(String::from("no count in the query results")))?;
    count
        .parse()
        .map_err(|_| Error::Upstream(format!("count `{}` is not a number", count)))
}

fn parse_sample(results: &Value) -> Result<Vec<String>> {
    Ok(bindings(results)?
        .iter()
        .filter_map(|row| binding_value(row, "value"))
        .map(String::from)
        .collect())
}

type Key = (String, String);
type Opener = Box<dyn Fn(&Database) -> Result<Session> + Send + Sync>;

/// Count and sample queries with process-wide memoization keyed by
/// database and field.
pub struct QaService {
    open: Opener,
    endpoint: Box<dyn SparqlEndpoint>,
    sample_size: usize,
    counts: BoundedCache<Key, u64>,
    samples: BoundedCache<Key, Vec<String>>,
}

impl QaService {
    pub fn new<F>(settings: &Settings, open: F, endpoint: Box<dyn SparqlEndpoint>) -> Self
    where
        F: Fn(&Database) -> Result<Session> + Send + Sync + 'static,
    {
        Self {
            open: Box::new(open),
            endpoint,
            sample_size: settings.sample_size,
            counts: BoundedCache::with_ttl(settings.count_cache, settings.cache_ttl()),
            samples: BoundedCache::with_ttl(settings.sample_cache, settings.cache_ttl()),
        }
    }

    fn run<T, F>(&self, db: &Database, field: &str, query: F) -> Result<Value>
    where
        F: FnOnce(&FieldTask) -> Result<T>,
        T: ToString,
    {
        let endpoint = db
            .sparql_endpoint()
            .ok_or_else(|| Error::Config(format!("{} has no SPARQL endpoint", db.name)))?;
        let session = (self.open)(db)?;
        let task = FieldTask::new(&session, field)?;
        let query = query(&task)?.to_string();
        self.endpoint.select(endpoint, &query)
    }

    /// `{"count": N}` for the values of `field` in the database's store.
    pub fn count(&self, db: Option<&Database>, field: &str) -> JsonResponse {
        let db = match db.filter(|db| db.sparql_endpoint().is_some()) {
            Some(db) => db,
            None => return failure(400, json!({ "count": 0 })),
        };
        let key = (db.api_key.clone(), String::from(field));
        let counted = self.counts.get_or_try_insert(key, || {
            let results = self.run(db, field, |task| task.query(true, None, 1))?;
            parse_count(&results)
        });
        match counted {
            Ok(count) => {
                info!("{}/{}: {} values", db.name, field, count);
                JsonResponse::ok(json!({ "count": count }))
            }
            Err(e) => {
                warn!("count of {}/{} failed: {}", db.name, field, e);
                failure(status_of(&e), json!({ "count": 0 }))
            }
        }
    }

    /// `{"sample": [...]}` with up to the configured number of values.
    pub fn sample(&self, db: Option<&Database>, field: &str) -> JsonResponse {
        let db = match db.filter(|db| db.sparql_endpoint().is_some()) {
            Some(db) => db,
            None => return failure(400, json!({ "sample": [] })),
        };
        let key = (db.api_key.clone(), String::from(field));
        let size = self.sample_size;
        let sampled = self.samples.get_or_try_insert(key, || {
            let results = self.run(db, field, |task| task.sample_query(size))?;
            parse_sample(&results)
        });
        match sampled {
            Ok(values) => JsonResponse::ok(json!({ "sample": values })),
            Err(e) => {
                warn!("sample of {}/{} failed: {}", db.name, field, e);
                failure(status_of(&e), json!({ "sample": [] }))
            }
        }
    }

    pub fn cached(&self) -> (usize, usize) {
        (self.counts.len(), self.samples.len())
    }
}

fn failure(status: u16, body: Value) -> JsonResponse {
    JsonResponse { status, body }
}

fn status_of(e: &Error) -> u16 {
    match e {
        Error::NotFound { .. } => 404,
        _ => 500,
    }
}
