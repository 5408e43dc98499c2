use std::collections::BTreeMap;

use cdnpack_core::{CdnError, CdnResult, InstalledEntry, SearchHit, UpdateCandidate};
use cdnpack_installer::{FileQuery, SelectedFile, Selector};
use cdnpack_registry::{AssetSource, RegistryClient};
use serde::Serialize;
use tracing::debug;

use crate::Engine;

/// Search query that callers send to ask for the unfiltered listing.
const LISTING_SENTINEL: &str = "0";

/// A decoded action/parameter pair, as sent by a dispatching front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Search { query: String },
    Versions { name: String },
    Install { name: String, version: String },
    Reinstall { name: String, version: String },
    Uninstall { name: String },
    Installed,
    Updates,
    Files(FileQuery),
}

impl Request {
    pub fn from_action(action: &str, params: &BTreeMap<String, String>) -> CdnResult<Self> {
        let request = match action {
            "search" => {
                let query = param(params, action, "query")?;
                let query = if query == LISTING_SENTINEL { "" } else { query };
                Self::Search {
                    query: query.to_string(),
                }
            }
            "versions" => Self::Versions {
                name: required(params, action, "name")?,
            },
            "install" => Self::Install {
                name: required(params, action, "name")?,
                version: required(params, action, "version")?,
            },
            "reinstall" => Self::Reinstall {
                name: required(params, action, "name")?,
                version: required(params, action, "version")?,
            },
            "uninstall" => Self::Uninstall {
                name: required(params, action, "name")?,
            },
            "installed" => Self::Installed,
            "update" => Self::Updates,
            "files" => Self::Files(FileQuery {
                packages: selector(params, "packages"),
                types: selector(params, "types"),
                skip_packages: selector(params, "skip_packages"),
                skip_files: selector(params, "skip_files"),
            }),
            other => {
                return Err(CdnError::invalid_request(format!(
                    "invalid action '{other}'"
                )))
            }
        };
        Ok(request)
    }
}

fn param<'a>(
    params: &'a BTreeMap<String, String>,
    action: &str,
    key: &str,
) -> CdnResult<&'a str> {
    params.get(key).map(String::as_str).ok_or_else(|| {
        CdnError::invalid_request(format!("action '{action}' requires parameter '{key}'"))
    })
}

fn required(params: &BTreeMap<String, String>, action: &str, key: &str) -> CdnResult<String> {
    let value = param(params, action, key)?.trim();
    if value.is_empty() {
        return Err(CdnError::invalid_request(format!(
            "action '{action}' requires a non-empty '{key}'"
        )));
    }
    Ok(value.to_string())
}

fn selector(params: &BTreeMap<String, String>, key: &str) -> Selector {
    params
        .get(key)
        .map(|raw| Selector::parse(raw))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

impl From<&CdnError> for ErrorPayload {
    fn from(err: &CdnError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Serialises as a single-key JSON object, e.g. `{"results": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Results(Vec<SearchHit>),
    Versions(Vec<String>),
    Message(String),
    Installed(Vec<InstalledEntry>),
    Updates(Vec<UpdateCandidate>),
    Files(Vec<SelectedFile>),
    Error(ErrorPayload),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<CdnError> for Response {
    fn from(err: CdnError) -> Self {
        Self::Error(ErrorPayload::from(&err))
    }
}

impl<R, A> Engine<R, A>
where
    R: RegistryClient,
    A: AssetSource,
{
    /// Runs one request; failures are folded into [`Response::Error`].
    pub fn handle(&self, request: Request) -> Response {
        debug!(?request, "handling request");
        let outcome = match request {
            Request::Search { query } => self.search(&query).map(Response::Results),
            Request::Versions { name } => self.list_versions(&name).map(Response::Versions),
            Request::Install { name, version } => self
                .install(&name, &version, false)
                .map(|outcome| Response::Message(outcome.message())),
            Request::Reinstall { name, version } => self
                .install(&name, &version, true)
                .map(|outcome| Response::Message(outcome.message())),
            Request::Uninstall { name } => self
                .uninstall(&name)
                .map(|outcome| Response::Message(outcome.message())),
            Request::Installed => self
                .list_installed()
                .map(|installed| Response::Installed(installed.into_iter().collect())),
            Request::Updates => self.list_updates().map(Response::Updates),
            Request::Files(query) => self.select_files(&query).map(Response::Files),
        };
        outcome.unwrap_or_else(Response::from)
    }
}
