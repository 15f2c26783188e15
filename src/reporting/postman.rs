// Postman collection (v2.1) export
// One folder per resource group, one request per endpoint method

use super::{write_file, Exporter};
use crate::analyzer::EndpointGroup;
use crate::errors::ExportError;
use crate::models::{Endpoint, Method, ScanResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

pub struct PostmanExporter;

#[derive(Debug, Serialize)]
pub struct Collection {
    pub info: Info,
    pub item: Vec<Folder>,
    pub variable: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub name: String,
    pub schema: String,
}

#[derive(Debug, Serialize)]
pub struct Folder {
    pub name: String,
    pub item: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct Item {
    pub name: String,
    pub request: Request,
}

#[derive(Debug, Serialize)]
pub struct Request {
    pub method: String,
    pub url: RequestUrl,
    pub header: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
pub struct RequestUrl {
    pub raw: String,
    pub host: Vec<String>,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn request_item(ep: &Endpoint, method: Method) -> Item {
    let path = if ep.normalized_path.is_empty() {
        ep.path.as_str()
    } else {
        ep.normalized_path.as_str()
    };
    let query: Vec<KeyValue> = ep
        .query_params
        .iter()
        .map(|q| KeyValue::new(q.name.as_str(), q.example.clone().unwrap_or_default()))
        .collect();
    let raw_query = query
        .iter()
        .map(|q| format!("{}={}", q.key, q.value))
        .collect::<Vec<_>>()
        .join("&");
    let raw = if raw_query.is_empty() {
        format!("{{{{baseUrl}}}}{}", path)
    } else {
        format!("{{{{baseUrl}}}}{}?{}", path, raw_query)
    };

    Item {
        name: format!("{} {}", method, path),
        request: Request {
            method: method.to_string(),
            url: RequestUrl {
                raw,
                host: vec!["{{baseUrl}}".to_string()],
                path: path
                    .trim_matches('/')
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                query,
            },
            header: vec![KeyValue::new("Authorization", "{{auth}}")],
        },
    }
}

pub fn build_collection(result: &ScanResult, groups: &[EndpointGroup]) -> Collection {
    let item = groups
        .iter()
        .map(|group| Folder {
            name: group.name.clone(),
            item: group
                .endpoints
                .iter()
                .flat_map(|ep| ep.methods.iter().map(move |m| request_item(ep, *m)))
                .collect(),
        })
        .filter(|folder| !folder.item.is_empty())
        .collect();

    Collection {
        info: Info {
            name: format!("{} API", result.target),
            schema: SCHEMA.to_string(),
        },
        item,
        variable: vec![
            KeyValue::new("baseUrl", result.target.trim_end_matches('/')),
            KeyValue::new("auth", ""),
        ],
    }
}

impl Exporter for PostmanExporter {
    fn name(&self) -> &'static str {
        "postman"
    }

    fn export(
        &self,
        result: &ScanResult,
        groups: &[EndpointGroup],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let json = serde_json::to_vec_pretty(&build_collection(result, groups))?;
        Ok(vec![write_file(dir, "postman_collection.json", &json)?])
    }
}
