use super::{Connector, Query, TableSchema, Tabular};
use crate::{
    types::{Fields, Record},
    Error, Result,
};
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use ureq::Agent;

pub const DEFAULT_API_ROOT: &str = "https://api.airtable.com/v0";

#[derive(Deserialize)]
struct Page {
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Deserialize)]
struct Tables {
    tables: Vec<TableSchema>,
}

/// Airtable REST client bound to one base.
pub struct AirtableClient {
    agent: Agent,
    api_root: String,
    token: String,
    base_id: String,
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

impl AirtableClient {
    pub fn new(api_root: &str, token: &str, base_id: &str) -> Self {
        Self {
            agent: Agent::new_with_defaults(),
            api_root: String::from(api_root.trim_end_matches('/')),
            token: String::from(token),
            base_id: String::from(base_id),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.api_root, self.base_id, encode(table))
    }

    fn page(&self, table: &str, query: &Query, offset: Option<&str>) -> Result<Page> {
        let mut request = self
            .agent
            .get(&self.table_url(table))
            .header("Authorization", &self.bearer());
        if let Some(formula) = &query.formula {
            request = request.query("filterByFormula", &formula.to_string());
        }
        for field in &query.fields {
            request = request.query("fields[]", field);
        }
        if let Some(max) = query.max_records {
            request = request.query("maxRecords", &max.to_string());
        }
        if let Some(offset) = offset {
            request = request.query("offset", offset);
        }
        let mut response = request.call()?;
        Ok(response.body_mut().read_json::<Page>()?)
    }
}

impl Tabular for AirtableClient {
    fn base_id(&self) -> &str {
        &self.base_id
    }

    fn record(&self, table: &str, id: &str) -> Result<Option<Record>> {
        let url = format!("{}/{}", self.table_url(table), encode(id));
        match self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .call()
        {
            Ok(mut response) => Ok(Some(response.body_mut().read_json::<Record>()?)),
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
        let mut records = vec![];
        let mut offset: Option<String> = None;
        loop {
            let page = self.page(table, query, offset.as_deref())?;
            records.extend(page.records);
            if query.max_records.map_or(false, |max| records.len() >= max) {
                break;
            }
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        debug!("{}/{}: {} records", self.base_id, table, records.len());
        Ok(records)
    }

    fn schema(&self, table: &str) -> Result<TableSchema> {
        let url = format!("{}/meta/bases/{}/tables", self.api_root, self.base_id);
        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .call()?;
        let tables = response.body_mut().read_json::<Tables>()?;
        tables
            .tables
            .into_iter()
            .find(|t| t.name == table || t.id == table)
            .ok_or_else(|| Error::not_found("tables", table))
    }

    fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record> {
        info!("updating {}/{}/{}", self.base_id, table, id);
        let url = format!("{}/{}", self.table_url(table), encode(id));
        let mut response = self
            .agent
            .patch(&url)
            .header("Authorization", &self.bearer())
            .send_json(&json!({ "fields": fields }))?;
        Ok(response.body_mut().read_json::<Record>()?)
    }
}

/// Opens bases over HTTPS with one access token.
pub struct HttpConnector {
    api_root: String,
    token: String,
}

impl HttpConnector {
    pub fn new(api_root: &str, token: &str) -> Self {
        Self {
            api_root: String::from(api_root),
            token: String::from(token),
        }
    }
}

impl Connector for HttpConnector {
    fn open(&self, base_id: &str) -> Result<Arc<dyn Tabular>> {
        Ok(Arc::new(AirtableClient::new(
            &self.api_root,
            &self.token,
            base_id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let client = AirtableClient::new("https://api.airtable.com/v0/", "key", "appX");
        assert_eq!(
            client.table_url("CRM Class"),
            "https://api.airtable.com/v0/appX/CRM%20Class"
        );
        assert_eq!(client.base_id(), "appX");
    }
}
