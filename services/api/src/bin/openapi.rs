//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the learning-path API to disk so the frontend
//! can generate its client. Usage: `openapi [output-path]` (default `openapi.json`).

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    let api_doc = ApiDoc::openapi();
    std::fs::write(&path, api_doc.to_pretty_json()?)?;
    println!(
        "OpenAPI document with {} paths written to {}",
        api_doc.paths.paths.len(),
        path
    );
    Ok(())
}
