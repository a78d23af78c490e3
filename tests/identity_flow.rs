mod common;

use helpdesk_api::{
    dto::{
        auth::{ChangePasswordRequest, LoginRequest},
        clients::{RegisterClientRequest, UpdateClientRequest},
        technicians::{UpdateTechnicianProfileRequest, UpdateTechnicianRequest},
        tickets::CreateTicketRequest,
    },
    entity::{AuditLogs, audit_logs, users::Role},
    error::AppError,
    middleware::auth::decode_token,
    services::{auth_service, client_service, technician_service, ticket_service},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{
    create_admin, create_client, create_service, create_technician, setup_state, unique_email,
};

#[tokio::test]
async fn registered_client_can_log_in_and_email_is_unique() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let client = create_client(&state).await?;

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: client.email.clone(),
            password: "client123".into(),
        },
    )
    .await?
    .data
    .expect("login");
    assert_eq!(login.user.role, Role::Client);
    assert!(!login.user.is_first_access);
    let decoded = decode_token(&login.token, &state.config.jwt_secret)?;
    assert_eq!(decoded.user_id, client.auth.user_id);

    let err = client_service::register_client(
        &state,
        RegisterClientRequest {
            name: "Someone Else".into(),
            email: client.email.clone(),
            password: "secret99".into(),
        },
    )
    .await
    .expect_err("duplicate e-mail");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: client.email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .expect_err("bad password");
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn technician_starts_with_temporary_password_until_changed() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    assert_eq!(tech.temporary_password.len(), 8);

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: tech.email.clone(),
            password: tech.temporary_password.clone(),
        },
    )
    .await?
    .data
    .expect("login");
    assert!(login.user.is_first_access);

    let err = auth_service::change_password(
        &state,
        &tech.auth,
        ChangePasswordRequest {
            current_password: "not-the-password".into(),
            new_password: "brand-new-1".into(),
            confirm_password: "brand-new-1".into(),
        },
    )
    .await
    .expect_err("wrong current password");
    assert!(matches!(err, AppError::Unauthorized(_)));

    auth_service::change_password(
        &state,
        &tech.auth,
        ChangePasswordRequest {
            current_password: tech.temporary_password.clone(),
            new_password: "brand-new-1".into(),
            confirm_password: "brand-new-1".into(),
        },
    )
    .await?;

    let profile = auth_service::get_profile(&state, &tech.auth)
        .await?
        .data
        .expect("profile");
    assert!(!profile.is_first_access);
    let hours = profile.technician.expect("technician ref").available_hours;
    assert_eq!(hours, technician_service::default_available_hours());
    assert!(profile.client.is_none());

    auth_service::login_user(
        &state,
        LoginRequest {
            email: tech.email.clone(),
            password: "brand-new-1".into(),
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn profile_updates_respect_roles_and_unique_email() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let first = create_client(&state).await?;
    let second = create_client(&state).await?;

    let err = client_service::update_own_profile(
        &state,
        &first.auth,
        UpdateClientRequest {
            email: Some(second.email.clone()),
            ..Default::default()
        },
    )
    .await
    .expect_err("taken e-mail");
    assert!(matches!(err, AppError::Conflict(_)));

    let new_email = unique_email("renamed");
    let info = client_service::update_own_profile(
        &state,
        &first.auth,
        UpdateClientRequest {
            name: Some("Renamed Client".into()),
            email: Some(new_email.clone()),
        },
    )
    .await?
    .data
    .expect("account");
    assert_eq!(info.email, new_email);
    assert_eq!(info.name, "Renamed Client");

    let err = client_service::update_own_profile(&state, &tech.auth, UpdateClientRequest::default())
        .await
        .expect_err("technician is not a client");
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = technician_service::update_own_profile(
        &state,
        &tech.auth,
        UpdateTechnicianProfileRequest {
            name: None,
            available_hours: Some(vec!["09:00".into(), "13:00".into()]),
        },
    )
    .await?
    .data
    .expect("technician");
    assert_eq!(updated.available_hours, vec!["09:00", "13:00"]);

    let err = technician_service::update_own_profile(
        &state,
        &tech.auth,
        UpdateTechnicianProfileRequest {
            name: None,
            available_hours: Some(vec!["9am".into()]),
        },
    )
    .await
    .expect_err("bad hour");
    assert!(matches!(err, AppError::Validation(_)));

    let err = technician_service::update_technician(
        &state,
        &admin,
        tech.technician_id,
        UpdateTechnicianRequest {
            email: Some(second.email.clone()),
            ..Default::default()
        },
    )
    .await
    .expect_err("taken e-mail");
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn admin_sees_client_ticket_counts_and_deletion_cascades() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 55).await?;

    let ticket = ticket_service::create_ticket(
        &state,
        &client.auth,
        CreateTicketRequest {
            technician_id: tech.technician_id,
            description: None,
            service_ids: vec![service],
        },
    )
    .await?
    .data
    .expect("ticket");

    let clients = client_service::list_clients(&state, &admin)
        .await?
        .data
        .expect("clients");
    let listed = clients
        .items
        .iter()
        .find(|c| c.id == client.client_id)
        .expect("client listed");
    assert_eq!(listed.tickets_count, Some(1));

    let detail = client_service::get_client(&state, &admin, client.client_id)
        .await?
        .data
        .expect("client");
    assert_eq!(detail.tickets.len(), 1);
    assert_eq!(detail.tickets[0].id, ticket.id);

    let err = client_service::list_clients(&state, &tech.auth)
        .await
        .expect_err("admin only");
    assert!(matches!(err, AppError::Forbidden(_)));

    client_service::delete_client(&state, &admin, client.client_id).await?;

    let err = ticket_service::get_ticket(&state, &admin, ticket.id)
        .await
        .expect_err("ticket removed with its client");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: client.email.clone(),
            password: "client123".into(),
        },
    )
    .await
    .expect_err("account gone");
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn client_can_delete_own_account() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let client = create_client(&state).await?;

    client_service::delete_own_account(&state, &client.auth).await?;

    let err = auth_service::get_profile(&state, &client.auth)
        .await
        .expect_err("deleted");
    assert!(matches!(err, AppError::NotFound(_)));

    let entries = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("client_self_delete"))
        .filter(audit_logs::Column::UserId.is_null())
        .all(&state.orm)
        .await?;
    let client_id = client.client_id.to_string();
    assert!(
        entries.iter().any(|e| e
            .metadata
            .as_ref()
            .is_some_and(|m| m["client_id"] == client_id.as_str())),
        "self delete is audited"
    );
    Ok(())
}
