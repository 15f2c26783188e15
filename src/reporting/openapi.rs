// OpenAPI 3.0 export
//
// One path item per normalized path and one operation per inferred method. Operations
// are tagged with their resource group; risk and risk tags ride along as x- extensions.

use super::{write_file, Exporter};
use crate::analyzer::EndpointGroup;
use crate::errors::ExportError;
use crate::models::{Endpoint, Method, Parameter, ScanResult};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

pub struct OpenApiExporter;

fn parameter_object(p: &Parameter) -> Value {
    let mut obj = json!({
        "name": p.name,
        "in": p.location.to_string(),
        "required": p.required,
        "schema": { "type": p.param_type.to_string() },
    });
    if let Some(example) = &p.example {
        obj["example"] = Value::String(example.clone());
    }
    obj
}

fn operation_id(method: Method, path: &str) -> String {
    let mut id = method.to_string().to_lowercase();
    for part in path.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.extend(chars);
        }
    }
    id
}

fn operation(ep: &Endpoint, method: Method, group: &str) -> Value {
    let parameters: Vec<Value> = ep.all_parameters().map(parameter_object).collect();
    json!({
        "summary": format!("{} {}", method, ep.normalized_path),
        "operationId": operation_id(method, &ep.normalized_path),
        "tags": [group],
        "parameters": parameters,
        "responses": { "default": { "description": "Undocumented response" } },
        "x-risk": ep.risk.to_string(),
        "x-risk-tags": ep.tags,
        "x-source": ep.source,
        "x-example-url": ep.url,
    })
}

pub fn build_document(result: &ScanResult, groups: &[EndpointGroup]) -> Value {
    let mut paths = Map::new();
    for group in groups {
        for ep in &group.endpoints {
            let item = paths
                .entry(ep.normalized_path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(item) = item else { continue };
            for method in &ep.methods {
                let key = method.to_string().to_lowercase();
                // First endpoint for a path and method wins
                if !item.contains_key(&key) {
                    item.insert(key, operation(ep, *method, &group.name));
                }
            }
        }
    }

    let tags: Vec<Value> = groups.iter().map(|g| json!({ "name": g.name })).collect();
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": format!("{} API", result.target),
            "description": "Endpoints discovered by apihunter",
            "version": "1.0.0",
        },
        "servers": [{ "url": result.target.trim_end_matches('/') }],
        "tags": tags,
        "paths": paths,
    })
}

impl Exporter for OpenApiExporter {
    fn name(&self) -> &'static str {
        "openapi"
    }

    fn export(
        &self,
        result: &ScanResult,
        groups: &[EndpointGroup],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let json = serde_json::to_vec_pretty(&build_document(result, groups))?;
        Ok(vec![write_file(dir, "openapi.json", &json)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParamType, RiskLevel};

    #[test]
    fn document_has_operation_per_method() {
        let mut ep = Endpoint::new("https://x.com/api/users/42", "wayback");
        ep.normalized_path = "/api/users/{userId}".into();
        ep.methods = vec![Method::GET, Method::PUT];
        ep.parameters = vec![Parameter::path("userId", ParamType::Integer)];
        ep.risk = RiskLevel::High;
        ep.tags = vec!["pii".into()];
        let groups = vec![EndpointGroup {
            name: "Users".into(),
            endpoints: vec![ep],
        }];
        let doc = build_document(&ScanResult::new("https://x.com"), &groups);

        let item = &doc["paths"]["/api/users/{userId}"];
        assert_eq!(item["get"]["operationId"], "getApiUsersUserId");
        assert_eq!(item["put"]["x-risk"], "high");
        assert_eq!(item["get"]["tags"][0], "Users");
        let param = &item["get"]["parameters"][0];
        assert_eq!(param["in"], "path");
        assert_eq!(param["required"], true);
        assert_eq!(param["schema"]["type"], "integer");
        assert!(item.get("delete").is_none());
    }
}
