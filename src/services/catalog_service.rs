use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    entity::services::{ActiveModel, Column, Entity as Services, Model as ServiceModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Service,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

const NAME_TAKEN: &str = "A service with this name already exists";

/// Public catalog: active services only, by name.
pub async fn list_active_services(state: &AppState) -> AppResult<ApiResponse<ServiceList>> {
    let items: Vec<Service> = Services::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(service_from_entity)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Services", ServiceList { items }, Some(meta)))
}

pub async fn list_all_services(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ServiceList>> {
    ensure_admin(user)?;
    let items: Vec<Service> = Services::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(service_from_entity)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Services", ServiceList { items }, Some(meta)))
}

pub async fn get_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Service>> {
    ensure_admin(user)?;
    let service = find_service(state, id).await?;
    Ok(ApiResponse::success(
        "Service",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

pub async fn create_service(
    state: &AppState,
    user: &AuthUser,
    payload: CreateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
    ensure_admin(user)?;
    payload.validate()?;
    let name = payload.name.trim().to_string();

    if name_taken(state, &name).await? {
        return Err(AppError::Conflict(NAME_TAKEN.into()));
    }

    let service = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, NAME_TAKEN))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "service_create",
        "services",
        serde_json::json!({ "service_id": service.id, "price": service.price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Service created",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

pub async fn update_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_service(state, id).await?;

    let name = payload.name.map(|n| n.trim().to_string());
    if let Some(name) = name.as_ref().filter(|n| **n != existing.name) {
        if name_taken(state, name).await? {
            return Err(AppError::Conflict(NAME_TAKEN.into()));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let service = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, NAME_TAKEN))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "service_update",
        "services",
        serde_json::json!({ "service_id": service.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Service updated",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

/// Flips the soft-delete flag. Tickets keep their line items either way.
pub async fn set_service_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    is_active: bool,
) -> AppResult<ApiResponse<Service>> {
    ensure_admin(user)?;
    let existing = find_service(state, id).await?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now().into());
    let service = active.update(&state.orm).await?;

    let action = if is_active {
        "service_activate"
    } else {
        "service_deactivate"
    };
    audit::record(
        &state.pool,
        Some(user.user_id),
        action,
        "services",
        serde_json::json!({ "service_id": service.id }),
    )
    .await;

    let message = if is_active {
        "Service activated"
    } else {
        "Service deactivated"
    };
    Ok(ApiResponse::success(
        message,
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

async fn find_service(state: &AppState, id: Uuid) -> AppResult<ServiceModel> {
    Services::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))
}

async fn name_taken(state: &AppState, name: &str) -> AppResult<bool> {
    let existing = Services::find()
        .filter(Column::Name.eq(name))
        .one(&state.orm)
        .await?;
    Ok(existing.is_some())
}

fn service_from_entity(model: ServiceModel) -> Service {
    Service {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
