//! Project handlers.
//!
//! Each endpoint has its own fetch options; the response `Cache-Control`
//! lifetime follows the fetch TTL.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::cms::queries;
use atelier_core::models::{NavigationContext, Project, SlugEntry, SlugRecord};
use atelier_core::{FetchOptions, FetchOutcome, QueryParams};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{cached_json, json_status};
use crate::state::AppState;

pub fn projects_options() -> FetchOptions {
    FetchOptions {
        retries: 3,
        timeout: Duration::from_secs(8),
        cache: true,
        cache_ttl: Duration::from_secs(300),
    }
}

pub fn project_options() -> FetchOptions {
    FetchOptions {
        retries: 3,
        timeout: Duration::from_secs(15),
        cache: true,
        cache_ttl: Duration::from_secs(600),
    }
}

pub fn navigation_options() -> FetchOptions {
    FetchOptions {
        retries: 2,
        timeout: Duration::from_secs(10),
        cache: true,
        cache_ttl: Duration::from_secs(300),
    }
}

pub fn slugs_options() -> FetchOptions {
    FetchOptions {
        retries: 2,
        timeout: Duration::from_secs(20),
        cache: true,
        cache_ttl: Duration::from_secs(300),
    }
}

fn slug_params(slug: &str) -> QueryParams {
    QueryParams::from([("slug".to_string(), Value::String(slug.to_string()))])
}

/// List designs for the home gallery.
pub async fn list_projects(State(state): State<Arc<AppState>>) -> Response {
    let options = projects_options();
    let outcome: FetchOutcome<Vec<Project>> = state
        .fetcher
        .fetch(queries::DESIGNS_FOR_HOME, &QueryParams::new(), &options)
        .await;

    match outcome {
        FetchOutcome::Found(designs) if !designs.is_empty() => {
            info!(count = designs.len(), "Fetched projects");
            cached_json(options.cache_ttl, json!({ "designs": designs }))
        }
        FetchOutcome::Found(_) | FetchOutcome::NotFound => {
            warn!("No designs found");
            json_status(StatusCode::OK, json!({ "designs": [] }))
        }
        FetchOutcome::Unavailable => {
            error!("Failed to fetch projects");
            json_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch projects", "designs": [] }),
            )
        }
    }
}

/// Get one design with links to its neighbours.
pub async fn get_project(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    if !queries::is_valid_slug(&slug) {
        return json_status(StatusCode::BAD_REQUEST, json!({ "error": "Invalid slug" }));
    }

    let params = slug_params(&slug);
    let project_options = project_options();
    let navigation_options = navigation_options();

    let (project, navigation): (FetchOutcome<Project>, FetchOutcome<NavigationContext>) = tokio::join!(
        state.fetcher.fetch(queries::PROJECT_BY_SLUG, &params, &project_options),
        state.fetcher.fetch(queries::PROJECT_NAVIGATION, &params, &navigation_options),
    );

    let project = match project {
        FetchOutcome::Found(project) => project,
        FetchOutcome::NotFound => {
            warn!(slug = %slug, "Project not found");
            return json_status(StatusCode::NOT_FOUND, json!({ "error": "Project not found" }));
        }
        FetchOutcome::Unavailable => {
            error!(slug = %slug, "Failed to fetch project");
            return json_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch project", "project": null }),
            );
        }
    };

    // Missing navigation only costs the neighbour links
    let navigation = navigation.found().unwrap_or_default();
    let next_project = navigation.next_link();
    let previous_project = navigation.previous_link();

    info!(
        slug = %slug,
        previous = previous_project.as_ref().map(|p| p.title.as_str()),
        next = next_project.as_ref().map(|p| p.title.as_str()),
        "Fetched project with navigation"
    );

    cached_json(
        project_options.cache_ttl,
        json!({
            "project": project,
            "nextProject": next_project,
            "previousProject": previous_project,
        }),
    )
}

/// List every slug, for static generation.
pub async fn list_slugs(State(state): State<Arc<AppState>>) -> Response {
    let options = slugs_options();
    let outcome: FetchOutcome<Vec<SlugRecord>> = state
        .fetcher
        .fetch(queries::ALL_SLUGS, &QueryParams::new(), &options)
        .await;

    match outcome {
        FetchOutcome::Found(records) if !records.is_empty() => {
            let slugs = SlugEntry::from_records(records);
            info!(count = slugs.len(), "Fetched slugs");
            cached_json(options.cache_ttl, json!({ "slugs": slugs }))
        }
        FetchOutcome::Found(_) | FetchOutcome::NotFound => {
            warn!("No designs found for static generation");
            json_status(StatusCode::OK, json!({ "slugs": [] }))
        }
        FetchOutcome::Unavailable => {
            error!("Failed to fetch slugs");
            json_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch slugs", "slugs": [] }),
            )
        }
    }
}
