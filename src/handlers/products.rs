use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{CostBreakdown, CostQuery, CreateProduct, DeleteResponse, Product, UpdateProduct},
    state::AppState,
};

pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.catalog.list_products(user.id).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.catalog.create_product(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    let product = state.catalog.get_product(product_id, user.id).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<Product>, AppError> {
    let product = state.catalog.update_product(product_id, payload, user.id).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<i32>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.catalog.delete_product(product_id, user.id).await?;
    Ok(Json(DeleteResponse {
        message: format!("Product {} deleted", product_id),
    }))
}

pub async fn calculate_cost(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<i32>,
    Query(query): Query<CostQuery>,
) -> Result<Json<CostBreakdown>, AppError> {
    let breakdown = state
        .catalog
        .calculate_cost(product_id, query.quantity, user.id)
        .await?;
    Ok(Json(breakdown))
}
