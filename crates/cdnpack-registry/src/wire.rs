use cdnpack_core::{AssetManifest, AssetManifestEntry, CdnError, CdnResult, RegistryPackage};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchRecord {
    name: String,
    #[serde(default)]
    author: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    repository: Option<Value>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LibraryRecord {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    versions: Option<Vec<String>>,
    #[serde(default)]
    assets: Option<Vec<AssetRecord>>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    version: String,
    #[serde(default)]
    files: Vec<String>,
}

pub fn parse_search_results(body: &str) -> CdnResult<Vec<RegistryPackage>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|err| CdnError::registry_unavailable(format!("malformed search response: {err}")))?;

    Ok(response
        .results
        .into_iter()
        .map(|record| RegistryPackage {
            name: record.name,
            author: record.author.as_ref().and_then(|value| flatten_field(value, "name")),
            description: record.description.filter(|value| !value.trim().is_empty()),
            repository: record
                .repository
                .as_ref()
                .and_then(|value| flatten_field(value, "url")),
            latest_version: record.version.filter(|value| !value.is_empty()),
        })
        .collect())
}

pub fn parse_versions(name: &str, body: &str) -> CdnResult<Vec<String>> {
    let record = parse_library(name, body)?;
    match record.versions {
        Some(versions) if !versions.is_empty() => Ok(versions),
        _ => Err(CdnError::not_found(name)),
    }
}

pub fn parse_manifest(name: &str, body: &str) -> CdnResult<AssetManifest> {
    let record = parse_library(name, body)?;
    let Some(assets) = record.assets else {
        return Err(CdnError::not_found(name));
    };

    Ok(AssetManifest::new(
        assets
            .into_iter()
            .map(|asset| AssetManifestEntry {
                version: asset.version,
                files: asset.files,
            })
            .collect(),
    ))
}

pub fn parse_latest_version(name: &str, body: &str) -> CdnResult<String> {
    let record = parse_library(name, body)?;
    record
        .version
        .filter(|version| !version.is_empty())
        .ok_or_else(|| CdnError::not_found(name))
}

fn parse_library(name: &str, body: &str) -> CdnResult<LibraryRecord> {
    // unknown libraries come back as `{}` or `{"error": true, ...}`
    let record: LibraryRecord = serde_json::from_str(body).map_err(|err| {
        CdnError::registry_unavailable(format!("malformed metadata for '{name}': {err}"))
    })?;
    if matches!(record.error, Some(Value::Bool(true))) {
        return Err(CdnError::not_found(name));
    }
    Ok(record)
}

/// Registry fields arrive either as plain strings or as objects such as
/// `{"type": "git", "url": "..."}`.
fn flatten_field(value: &Value, key: &str) -> Option<String> {
    let flattened = match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    flattened.filter(|text| !text.trim().is_empty())
}
