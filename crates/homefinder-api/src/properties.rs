use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use homefinder_db::models::{PropertyFilter, PropertyPatch};
use homefinder_types::api::{
    Claims, CreatePropertyRequest, PropertyListResponse, PropertyMutationResponse,
    PropertyResponse, SearchPropertiesQuery, UpdatePropertyRequest,
};

use crate::auth::AppState;
use crate::convert::property_from_row;
use crate::error::{ApiError, ApiResult, FieldError, blocking};
use crate::extract::Json;

/// GET /properties — public filtered search. Absent filters impose no
/// constraint; no filters returns everything newest-first.
pub async fn search_properties(
    State(state): State<AppState>,
    Query(query): Query<SearchPropertiesQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = PropertyFilter {
        location: query.location,
        property_type: query.property_type,
        min_price: query.min_price,
        max_price: query.max_price,
    };

    let rows = blocking(move || state.db.search_properties(&filter)).await?;

    Ok(Json(PropertyListResponse {
        properties: rows.iter().map(property_from_row).collect(),
    }))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let row = blocking(move || state.db.get_property(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Property not found".into()))?;

    Ok(Json(PropertyResponse {
        property: property_from_row(&row),
    }))
}

/// GET /my-properties — owner-only listing of the caller's properties.
pub async fn my_properties(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = claims.sub;
    let rows = blocking(move || state.db.get_properties_by_owner(owner_id)).await?;

    Ok(Json(PropertyListResponse {
        properties: rows.iter().map(property_from_row).collect(),
    }))
}

pub async fn create_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePropertyRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = Vec::new();
    if req.name.trim().len() < 3 {
        errors.push(FieldError::new("name", "Name must be at least 3 characters"));
    }
    if req.description.trim().len() < 10 {
        errors.push(FieldError::new("description", "Description must be at least 10 characters"));
    }
    if req.price < 1 {
        errors.push(FieldError::new("price", "Price must be greater than 0"));
    }
    if req.location.trim().len() < 3 {
        errors.push(FieldError::new("location", "Location must be at least 3 characters"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let owner_id = claims.sub;
    let row = blocking(move || {
        state.db.create_property(
            owner_id,
            req.name.trim(),
            req.description.trim(),
            req.price,
            req.location.trim(),
            req.property_type.as_str(),
            req.image_url.as_deref(),
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PropertyMutationResponse {
            message: "Property created successfully".into(),
            property: property_from_row(&row),
        }),
    ))
}

/// PUT /properties/:id — partial update, ownership re-checked. A property
/// that is missing or owned by someone else reads the same from outside:
/// 404 with the original's combined message.
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePropertyRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = Vec::new();
    if let Some(name) = req.name.as_deref()
        && name.trim().len() < 3
    {
        errors.push(FieldError::new("name", "Name must be at least 3 characters"));
    }
    if let Some(description) = req.description.as_deref()
        && description.trim().len() < 10
    {
        errors.push(FieldError::new("description", "Description must be at least 10 characters"));
    }
    if let Some(price) = req.price
        && price < 1
    {
        errors.push(FieldError::new("price", "Price must be greater than 0"));
    }
    if let Some(location) = req.location.as_deref()
        && location.trim().len() < 3
    {
        errors.push(FieldError::new("location", "Location must be at least 3 characters"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let patch = PropertyPatch {
        name: req.name,
        description: req.description,
        price: req.price,
        location: req.location,
        property_type: req.property_type.map(|t| t.as_str().to_string()),
        image_url: req.image_url,
    };

    let owner_id = claims.sub;
    let row = blocking(move || state.db.update_property(id, owner_id, &patch))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(
                "Property not found or you do not have permission to update it".into(),
            )
        })?;

    Ok(Json(PropertyMutationResponse {
        message: "Property updated successfully".into(),
        property: property_from_row(&row),
    }))
}

/// DELETE /properties/:id — ownership re-checked; cascades to the
/// property's messages at the application layer.
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = claims.sub;
    let deleted = blocking(move || state.db.delete_property(id, owner_id)).await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "Property not found or you do not have permission to delete it".into(),
        ));
    }

    Ok(Json(json!({ "message": "Property deleted successfully" })))
}
