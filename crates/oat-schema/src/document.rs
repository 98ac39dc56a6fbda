//! # OpenAPI Documents
//!
//! Loads a Swagger 2 or OpenAPI 3 document, locates the schema that applies
//! to one request or response and hands it to the tester fully dereferenced.
//!
//! ## Dereferencing
//!
//! Local `$ref`s (`#/...`) are replaced by their targets recursively. A
//! target may appear at most [`MAX_REF_DEPTH`] times along one chain of
//! expansion; the next occurrence is replaced by the truncation sentinel,
//! which the tester accepts for any data. Recursive models therefore unroll
//! a few levels instead of looping. References to other files are rejected.
//!
//! ## Lookup
//!
//! - Routes match documented paths after dropping the query string, a
//!   trailing slash and the base path (`basePath` in Swagger 2, the path of
//!   the first server URL in OpenAPI 3). Literal paths win over templates;
//!   among templates, the one with fewest parameters wins.
//! - Status codes fall back to the range key (`2XX`) and then `default`.
//! - Content types match exactly, then ignoring parameters such as
//!   `charset`, then via wildcard media ranges.

use std::path::Path;
use std::str::FromStr;

use oat_core::TesterConfig;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ConformanceError, LoadError};
use crate::kind::truncated_placeholder;
use crate::tester::{SchemaTester, ValidationTarget};

/// Occurrences of the same `$ref` target allowed in one expansion chain.
pub const MAX_REF_DEPTH: usize = 3;

const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// The OpenAPI major version of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `swagger: "2.0"`. Nullability is `x-nullable`; response schemas live
    /// at `responses.<code>.schema`.
    Swagger2,
    /// `openapi: 3.x`. Nullability is `nullable`; schemas live under
    /// `content.<media type>.schema`.
    OpenApi3,
}

impl Dialect {
    fn detect(raw: &Value) -> Result<Self, LoadError> {
        let version = |key: &str| match raw.get(key) {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Number(v)) => Some(v.to_string()),
            _ => None,
        };
        if version("swagger").is_some_and(|v| v.starts_with('2')) {
            return Ok(Dialect::Swagger2);
        }
        if version("openapi").is_some_and(|v| v.starts_with("3.")) {
            return Ok(Dialect::OpenApi3);
        }
        Err(LoadError::UnknownDialect)
    }
}

/// A parsed OpenAPI document.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    raw: Value,
    dialect: Dialect,
}

impl FromStr for OpenApiDocument {
    type Err = LoadError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::parse(content, "<inline>")
    }
}

impl OpenApiDocument {
    /// Read a YAML or JSON document from disk.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse YAML or JSON text. `source_name` appears in parse errors.
    pub fn parse(content: &str, source_name: &str) -> Result<Self, LoadError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| LoadError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(yaml_to_json(yaml))
    }

    /// Wrap an already-parsed document.
    pub fn from_value(raw: Value) -> Result<Self, LoadError> {
        let dialect = Dialect::detect(&raw)?;
        Ok(Self { raw, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The node a local reference such as `#/components/schemas/Pet` points to.
    pub fn resolve(&self, target: &str) -> Result<&Value, LoadError> {
        Resolver { root: &self.raw }.resolve(target)
    }

    /// Copy of `node` with every local `$ref` expanded.
    pub fn dereference(&self, node: &Value) -> Result<Value, LoadError> {
        Resolver { root: &self.raw }.expand(node, &mut Vec::new())
    }

    /// Follow `$ref`s on a non-schema object (response, request body, parameter).
    fn follow<'a>(&'a self, mut node: &'a Value) -> Result<&'a Value, LoadError> {
        for _ in 0..=MAX_REF_DEPTH {
            match node.get("$ref").and_then(Value::as_str) {
                Some(target) => node = self.resolve(target)?,
                None => return Ok(node),
            }
        }
        Err(LoadError::UnresolvedReference {
            target: node
                .get("$ref")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// The path prefix every documented path is relative to.
    fn base_path(&self) -> String {
        let base = match self.dialect {
            Dialect::Swagger2 => self.raw.get("basePath").and_then(Value::as_str).map(str::to_string),
            Dialect::OpenApi3 => self
                .raw
                .pointer("/servers/0/url")
                .and_then(Value::as_str)
                .and_then(|server| match Url::parse(server) {
                    Ok(url) => Some(url.path().to_string()),
                    Err(_) => server.starts_with('/').then(|| server.to_string()),
                }),
        };
        base.map(|b| b.trim_end_matches('/').to_string()).unwrap_or_default()
    }

    fn normalize_route(&self, route: &str) -> String {
        let path = route.split(&['?', '#'][..]).next().unwrap_or_default();
        let base = self.base_path();
        let path = if base.is_empty() {
            path
        } else {
            path.strip_prefix(base.as_str())
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
                .unwrap_or(path)
        };
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    /// The documented path item that serves `route`.
    fn path_item(&self, route: &str) -> Result<(&str, &Value), LoadError> {
        let undocumented = || LoadError::UndocumentedRoute {
            route: route.to_string(),
        };
        let paths = self.raw.get("paths").and_then(Value::as_object).ok_or_else(undocumented)?;
        let wanted = self.normalize_route(route);
        let wanted_segments: Vec<&str> = wanted.split('/').collect();

        let mut best: Option<(usize, &str, &Value)> = None;
        for (template, item) in paths {
            let template_path = match template.trim_end_matches('/') {
                "" => "/",
                t => t,
            };
            if template_path == wanted {
                debug!(route, template = template.as_str(), "matched literal path");
                return Ok((template.as_str(), self.follow(item)?));
            }
            let segments: Vec<&str> = template_path.split('/').collect();
            if segments.len() != wanted_segments.len() {
                continue;
            }
            let mut parameters = 0;
            let fits = segments.iter().zip(&wanted_segments).all(|(pattern, actual)| {
                if is_parameter(pattern) {
                    parameters += 1;
                    !actual.is_empty()
                } else {
                    pattern == actual
                }
            });
            if fits && best.map_or(true, |(fewest, ..)| parameters < fewest) {
                best = Some((parameters, template.as_str(), item));
            }
        }

        let (_, template, item) = best.ok_or_else(undocumented)?;
        debug!(route, template, "matched path template");
        Ok((template, self.follow(item)?))
    }

    fn operation(&self, route: &str, method: &str) -> Result<(&Value, &Value), LoadError> {
        let (_, item) = self.path_item(route)?;
        let method = method.to_ascii_lowercase();
        let operation = item
            .get(&method)
            .filter(|_| HTTP_METHODS.contains(&method.as_str()))
            .ok_or_else(|| LoadError::UndocumentedMethod {
                route: route.to_string(),
                method: method.clone(),
            })?;
        Ok((item, operation))
    }

    /// The dereferenced schema of the response body, or `None` when the
    /// response is documented without one.
    pub fn response_schema(
        &self,
        route: &str,
        method: &str,
        status: u16,
        content_type: &str,
    ) -> Result<Option<Value>, LoadError> {
        let (_, operation) = self.operation(route, method)?;
        let method = method.to_ascii_lowercase();
        let undocumented = || LoadError::UndocumentedStatus {
            route: route.to_string(),
            method: method.clone(),
            status,
        };
        let responses = operation.get("responses").and_then(Value::as_object).ok_or_else(undocumented)?;
        let keys = [status.to_string(), format!("{}XX", status / 100), format!("{}xx", status / 100), "default".to_string()];
        let (key, response) = keys
            .iter()
            .find_map(|key| responses.get(key).map(|r| (key, r)))
            .ok_or_else(undocumented)?;
        debug!(route, method = method.as_str(), status, key = key.as_str(), "matched response");
        let response = self.follow(response)?;

        let schema = match self.dialect {
            Dialect::Swagger2 => {
                self.check_media_list(operation, "produces", route, &method, content_type)?;
                response.get("schema")
            }
            Dialect::OpenApi3 => match response.get("content").and_then(Value::as_object) {
                Some(content) => self.media_schema(content, route, &method, content_type)?,
                None => None,
            },
        };
        schema.map(|s| self.dereference(s)).transpose()
    }

    /// The dereferenced schema of the request body, or `None` when the
    /// operation documents no body.
    pub fn request_schema(&self, route: &str, method: &str, content_type: &str) -> Result<Option<Value>, LoadError> {
        let (item, operation) = self.operation(route, method)?;
        let method = method.to_ascii_lowercase();

        let schema = match self.dialect {
            Dialect::Swagger2 => {
                let mut body = None;
                for parameters in [operation.get("parameters"), item.get("parameters")].into_iter().flatten() {
                    for parameter in parameters.as_array().into_iter().flatten() {
                        let parameter = self.follow(parameter)?;
                        if parameter.get("in").and_then(Value::as_str) == Some("body") {
                            body = body.or(parameter.get("schema"));
                        }
                    }
                }
                if body.is_some() {
                    self.check_media_list(operation, "consumes", route, &method, content_type)?;
                }
                body
            }
            Dialect::OpenApi3 => match operation.get("requestBody") {
                Some(body) => match self.follow(body)?.get("content").and_then(Value::as_object) {
                    Some(content) => self.media_schema(content, route, &method, content_type)?,
                    None => None,
                },
                None => None,
            },
        };
        schema.map(|s| self.dereference(s)).transpose()
    }

    /// Swagger 2 `produces`/`consumes`, on the operation or the document.
    fn check_media_list(
        &self,
        operation: &Value,
        keyword: &str,
        route: &str,
        method: &str,
        content_type: &str,
    ) -> Result<(), LoadError> {
        let Some(listed) = operation
            .get(keyword)
            .or_else(|| self.raw.get(keyword))
            .and_then(Value::as_array)
        else {
            return Ok(());
        };
        let available: Vec<String> = listed.iter().filter_map(Value::as_str).map(str::to_string).collect();
        if available.iter().any(|media| media_matches(media, content_type)) {
            return Ok(());
        }
        Err(LoadError::UndocumentedContentType {
            route: route.to_string(),
            method: method.to_string(),
            content_type: content_type.to_string(),
            available,
        })
    }

    /// OpenAPI 3 `content` lookup.
    fn media_schema<'a>(
        &self,
        content: &'a Map<String, Value>,
        route: &str,
        method: &str,
        content_type: &str,
    ) -> Result<Option<&'a Value>, LoadError> {
        let media = content.get(content_type).or_else(|| {
            content
                .iter()
                .find(|(media, _)| media_matches(media, content_type))
                .map(|(_, entry)| entry)
        });
        match media {
            Some(entry) => Ok(entry.get("schema")),
            None => Err(LoadError::UndocumentedContentType {
                route: route.to_string(),
                method: method.to_string(),
                content_type: content_type.to_string(),
                available: content.keys().cloned().collect(),
            }),
        }
    }

    /// Check a response body against the document.
    ///
    /// `body` is `None` for an empty response. A body where the document
    /// describes none is an error; a missing body where one is documented is
    /// checked as `null`.
    pub fn validate_response(
        &self,
        config: &TesterConfig,
        route: &str,
        method: &str,
        status: u16,
        content_type: &str,
        body: Option<&Value>,
    ) -> Result<(), ConformanceError> {
        let schema = self.response_schema(route, method, status, content_type)?;
        check_body(config, ValidationTarget::Response, schema, body, route, method)
    }

    /// Check a request body against the document.
    pub fn validate_request(
        &self,
        config: &TesterConfig,
        route: &str,
        method: &str,
        content_type: &str,
        body: Option<&Value>,
    ) -> Result<(), ConformanceError> {
        let schema = self.request_schema(route, method, content_type)?;
        check_body(config, ValidationTarget::Request, schema, body, route, method)
    }
}

/// Expand every local `$ref` in a standalone schema file, resolving pointers
/// against the file itself.
pub fn dereference_schema(root: &Value) -> Result<Value, LoadError> {
    Resolver { root }.expand(root, &mut Vec::new())
}

/// Resolves local references against one root value.
struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    fn resolve(&self, target: &str) -> Result<&'a Value, LoadError> {
        let Some(pointer) = target.strip_prefix('#') else {
            return Err(LoadError::ExternalReference {
                target: target.to_string(),
            });
        };
        self.root.pointer(pointer).ok_or_else(|| LoadError::UnresolvedReference {
            target: target.to_string(),
        })
    }

    fn expand(&self, node: &Value, chain: &mut Vec<String>) -> Result<Value, LoadError> {
        match node {
            Value::Object(map) => {
                if let Some(target) = map.get("$ref").and_then(Value::as_str) {
                    return self.expand_reference(target, map, chain);
                }
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.expand(value, chain)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.expand(item, chain))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn expand_reference(
        &self,
        target: &str,
        node: &Map<String, Value>,
        chain: &mut Vec<String>,
    ) -> Result<Value, LoadError> {
        let mut expanded = if chain.iter().filter(|seen| *seen == target).count() >= MAX_REF_DEPTH {
            warn!(reference = target, depth = MAX_REF_DEPTH, "truncating recursive $ref");
            truncated_placeholder()
        } else {
            let resolved = self.resolve(target)?;
            chain.push(target.to_string());
            let expanded = self.expand(resolved, chain);
            chain.pop();
            expanded?
        };

        // Keywords next to `$ref`, such as `nullable`, refine the target.
        if let Value::Object(out) = &mut expanded {
            for (key, value) in node.iter().filter(|(k, _)| k.as_str() != "$ref") {
                out.insert(key.clone(), self.expand(value, chain)?);
            }
        }
        Ok(expanded)
    }
}

fn check_body(
    config: &TesterConfig,
    target: ValidationTarget,
    schema: Option<Value>,
    body: Option<&Value>,
    route: &str,
    method: &str,
) -> Result<(), ConformanceError> {
    match (schema, body) {
        (Some(schema), body) => {
            let tester = SchemaTester::new(config.clone()).with_target(target);
            tester.validate(&schema, body.unwrap_or(&Value::Null))?;
            Ok(())
        }
        (None, Some(body)) if !body.is_null() => Err(ConformanceError::UnexpectedBody {
            route: route.to_string(),
            method: method.to_ascii_lowercase(),
        }),
        (None, _) => Ok(()),
    }
}

fn is_parameter(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// Whether a documented media range covers `content_type`. Parameters such
/// as `; charset=utf-8` are ignored on both sides.
fn media_matches(documented: &str, content_type: &str) -> bool {
    let essence = |media: &str| media.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    let (documented, wanted) = (essence(documented), essence(content_type));
    if documented == wanted || documented == "*/*" {
        return true;
    }
    match (documented.split_once('/'), wanted.split_once('/')) {
        (Some((kind, "*")), Some((wanted_kind, _))) => kind == wanted_kind,
        _ => false,
    }
}

/// Convert parsed YAML into a JSON tree. Mapping keys that are numbers or
/// booleans (YAML reads `200:` as an integer) become their text form.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::from(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::from(u))
            } else {
                n.as_f64().and_then(Number::from_f64).map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => yaml_to_json(other).to_string(),
    }
}
