//! Destinations for generated files.

use crate::{registry::Database, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use ureq::Agent;

pub const GITHUB_API: &str = "https://api.github.com";

/// Characters escaped in a repository path; `/` separates segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'#').add(b'?').add(b'%');

/// Stores a file at a relative path, replacing any previous version.
pub trait Publisher {
    fn publish(&self, path: &str, content: &[u8]) -> Result<()>;
}

/// Writes under a local directory.
pub struct DirectoryPublisher {
    root: PathBuf,
}

impl DirectoryPublisher {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Publisher for DirectoryPublisher {
    fn publish(&self, path: &str, content: &[u8]) -> Result<()> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        debug!("wrote {}", target.display());
        Ok(())
    }
}

/// Keeps published files in memory.
#[derive(Default)]
pub struct MemoryPublisher {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&self, path: &str, content: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(String::from(path), content.to_vec());
        Ok(())
    }
}

#[derive(Deserialize)]
struct Contents {
    sha: String,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

/// Commits files to a GitHub repository through the contents API.
pub struct GitHubPublisher {
    agent: Agent,
    api_root: String,
    token: String,
    repo: String,
    /// Owner of the repository; the token's user when unset.
    organization: Option<String>,
}

impl GitHubPublisher {
    pub fn new(token: &str, repo: &str, organization: Option<&str>) -> Self {
        Self {
            agent: Agent::new_with_defaults(),
            api_root: String::from(GITHUB_API),
            token: String::from(token),
            repo: String::from(repo),
            organization: organization.filter(|o| !o.is_empty()).map(String::from),
        }
    }

    /// The publisher configured for a database, if it has a token and a
    /// repository.
    pub fn for_database(db: &Database) -> Option<Self> {
        let token = db.github_token.as_deref().filter(|t| !t.is_empty())?;
        let repo = db.github_repo.as_deref().filter(|r| !r.is_empty())?;
        Some(Self::new(token, repo, db.github_organization.as_deref()))
    }

    pub fn with_api_root(mut self, api_root: &str) -> Self {
        self.api_root = String::from(api_root.trim_end_matches('/'));
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn owner(&self) -> Result<String> {
        if let Some(organization) = &self.organization {
            return Ok(organization.clone());
        }
        let mut response = self
            .agent
            .get(&format!("{}/user", self.api_root))
            .header("Authorization", &self.bearer())
            .call()?;
        Ok(response.body_mut().read_json::<User>()?.login)
    }

    fn contents_url(&self, owner: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_root,
            owner,
            self.repo,
            utf8_percent_encode(path.trim_start_matches('/'), PATH_SEGMENT)
        )
    }

    /// The blob sha of an existing file.
    fn existing_sha(&self, url: &str) -> Result<Option<String>> {
        match self
            .agent
            .get(url)
            .header("Authorization", &self.bearer())
            .call()
        {
            Ok(mut response) => {
                let body = response.body_mut().read_json::<Value>()?;
                // a directory listing has no single sha
                let contents = match body {
                    Value::Array(mut entries) if !entries.is_empty() => entries.remove(0),
                    other => other,
                };
                Ok(Some(serde_json::from_value::<Contents>(contents)?.sha))
            }
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Request body creating or updating a file.
fn put_body(content: &[u8], sha: Option<&str>) -> Value {
    let message = if sha.is_some() { "Update file" } else { "Create file" };
    let mut body = json!({
        "message": message,
        "content": STANDARD.encode(content),
    });
    if let Some(sha) = sha {
        body["sha"] = Value::String(String::from(sha));
    }
    body
}

impl Publisher for GitHubPublisher {
    fn publish(&self, path: &str, content: &[u8]) -> Result<()> {
        if path.is_empty() {
            return Err(Error::InvalidArgument(String::from("empty repository path")));
        }
        let url = self.contents_url(&self.owner()?, path);
        let sha = self.existing_sha(&url)?;
        self.agent
            .put(&url)
            .header("Authorization", &self.bearer())
            .header("Accept", "application/vnd.github+json")
            .send_json(&put_body(content, sha.as_deref()))?;
        info!(
            "{} {} in {}",
            if sha.is_some() { "updated" } else { "created" },
            path,
            self.repo
        );
        Ok(())
    }
}
