use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct TermItem {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

/// Terms of one registered taxonomy, for populating filter controls.
/// Unregistered taxonomy names are a 404, not an empty list.
pub(super) async fn list_taxonomy_terms(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(taxonomy): Path<String>,
) -> Result<Json<ApiResponse<Vec<TermItem>>>, ApiError> {
    if !state.taxonomies.iter().any(|t| t.slug == taxonomy) {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("taxonomy '{taxonomy}' is not registered"),
        ));
    }

    let rows = mailoc_db::list_terms(&state.pool, &taxonomy)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?;

    let data = rows
        .into_iter()
        .map(|row| TermItem {
            id: row.id,
            slug: row.slug,
            name: row.name,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
