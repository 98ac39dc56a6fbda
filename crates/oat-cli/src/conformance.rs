//! # Response and Request Subcommands
//!
//! `oat response` and `oat request` load an OpenAPI document, locate the
//! schema for the given route and check a recorded body against it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use oat_schema::OpenApiDocument;

use crate::input::read_value;
use crate::{load_config, report_outcome, GlobalOptions};

/// Arguments for `oat response`.
#[derive(Args, Debug)]
pub struct ResponseArgs {
    /// OpenAPI document (YAML or JSON).
    #[arg(long)]
    pub spec: PathBuf,

    /// Concrete request path, e.g. `/api/pets/7?limit=2`.
    #[arg(long)]
    pub route: String,

    /// HTTP method.
    #[arg(long, default_value = "get")]
    pub method: String,

    /// Response status code.
    #[arg(long, default_value_t = 200)]
    pub status: u16,

    /// Recorded response body. `-` reads stdin; omit for an empty body.
    #[arg(long)]
    pub body: Option<PathBuf>,
}

/// Arguments for `oat request`.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// OpenAPI document (YAML or JSON).
    #[arg(long)]
    pub spec: PathBuf,

    /// Concrete request path.
    #[arg(long)]
    pub route: String,

    /// HTTP method.
    #[arg(long, default_value = "post")]
    pub method: String,

    /// Recorded request body. `-` reads stdin; omit for an empty body.
    #[arg(long)]
    pub body: Option<PathBuf>,
}

fn load_document(path: &Path) -> Result<OpenApiDocument> {
    OpenApiDocument::from_path(path).with_context(|| format!("cannot load OpenAPI document {}", path.display()))
}

/// Execute `oat response`.
pub fn run_response(args: &ResponseArgs, global: &GlobalOptions) -> Result<u8> {
    let config = load_config(global)?;
    let document = load_document(&args.spec)?;
    let body = args.body.as_deref().map(read_value).transpose()?;
    tracing::info!(route = %args.route, method = %args.method, status = args.status, "checking response");

    let outcome = document.validate_response(
        &config,
        &args.route,
        &args.method,
        args.status,
        &global.content_type,
        body.as_ref(),
    );
    let subject = format!("{} {} -> {}", args.method.to_uppercase(), args.route, args.status);
    Ok(report_outcome(outcome, &subject))
}

/// Execute `oat request`.
pub fn run_request(args: &RequestArgs, global: &GlobalOptions) -> Result<u8> {
    let config = load_config(global)?;
    let document = load_document(&args.spec)?;
    let body = args.body.as_deref().map(read_value).transpose()?;
    tracing::info!(route = %args.route, method = %args.method, "checking request");

    let outcome = document.validate_request(&config, &args.route, &args.method, &global.content_type, body.as_ref());
    let subject = format!("{} {} request body", args.method.to_uppercase(), args.route);
    Ok(report_outcome(outcome, &subject))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petstore() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../oat-schema/tests/fixtures/petstore-openapi3.yaml")
    }

    fn write_body(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("body.json");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn conforming_response_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let args = ResponseArgs {
            spec: petstore(),
            route: "/api/v3/pets/1".to_string(),
            method: "get".to_string(),
            status: 200,
            body: Some(write_body(
                dir.path(),
                r#"{"id": 1, "createdAt": "2024-01-01T00:00:00Z", "name": "Rex", "kind": "dog"}"#,
            )),
        };
        assert_eq!(run_response(&args, &GlobalOptions::default()).unwrap(), 0);
    }

    #[test]
    fn mismatched_response_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = ResponseArgs {
            spec: petstore(),
            route: "/api/v3/pets/1".to_string(),
            method: "get".to_string(),
            status: 200,
            body: Some(write_body(dir.path(), r#"{"id": "one", "name": "Rex", "kind": "dog"}"#)),
        };
        assert_eq!(run_response(&args, &GlobalOptions::default()).unwrap(), 1);
    }

    #[test]
    fn undocumented_route_exits_one() {
        let args = ResponseArgs {
            spec: petstore(),
            route: "/api/v3/owners".to_string(),
            method: "get".to_string(),
            status: 200,
            body: None,
        };
        assert_eq!(run_response(&args, &GlobalOptions::default()).unwrap(), 1);
    }

    #[test]
    fn case_convention_applies_to_requests() {
        let dir = tempfile::tempdir().unwrap();
        let args = RequestArgs {
            spec: petstore(),
            route: "/api/v3/pets".to_string(),
            method: "post".to_string(),
            body: Some(write_body(dir.path(), r#"{"name": "Rex", "kind": "dog", "birthDate": "2020-01-01"}"#)),
        };
        let camel = GlobalOptions {
            case: Some(oat_core::CaseConvention::Camel),
            ..GlobalOptions::default()
        };
        assert_eq!(run_request(&args, &camel).unwrap(), 0);
        let snake = GlobalOptions {
            case: Some(oat_core::CaseConvention::Snake),
            ..GlobalOptions::default()
        };
        assert_eq!(run_request(&args, &snake).unwrap(), 1);
    }

    #[test]
    fn missing_spec_is_an_error() {
        let args = RequestArgs {
            spec: PathBuf::from("/nonexistent/openapi.yaml"),
            route: "/pets".to_string(),
            method: "post".to_string(),
            body: None,
        };
        assert!(run_request(&args, &GlobalOptions::default()).is_err());
    }
}
