mod common;

use helpdesk_api::{
    dto::{
        services::UpdateServiceRequest,
        tickets::{AddTicketServiceRequest, CreateTicketRequest, UpdateTicketStatusRequest},
    },
    entity::{
        AuditLogs, audit_logs,
        tickets::TicketStatus,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::TicketView,
    routes::params::{SortOrder, TicketListQuery},
    services::{catalog_service, ticket_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use common::{create_admin, create_client, create_service, create_technician, setup_state};

async fn open_ticket(
    state: &AppState,
    client: &AuthUser,
    technician_id: Uuid,
    service_ids: Vec<Uuid>,
) -> Result<TicketView, AppError> {
    let resp = ticket_service::create_ticket(
        state,
        client,
        CreateTicketRequest {
            technician_id,
            description: Some("Notebook does not boot".into()),
            service_ids,
        },
    )
    .await?;
    Ok(resp.data.expect("ticket"))
}

async fn set_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: TicketStatus,
) -> Result<TicketView, AppError> {
    let resp =
        ticket_service::update_status(state, user, id, UpdateTicketStatusRequest { status }).await?;
    Ok(resp.data.expect("ticket"))
}

#[tokio::test]
async fn ticket_total_keeps_prices_from_when_lines_were_attached() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let diagnostics = create_service(&state, &admin, 100).await?;
    let cleanup = create_service(&state, &admin, 50).await?;

    let ticket = open_ticket(
        &state,
        &client.auth,
        tech.technician_id,
        vec![diagnostics, cleanup],
    )
    .await?;
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.services.len(), 2);
    assert!(ticket.services.iter().all(|line| !line.added_by_technician));
    assert_eq!(ticket.total_price, Decimal::new(150, 0));

    let audit = AuditLogs::find()
        .filter(audit_logs::Column::UserId.eq(client.auth.user_id))
        .filter(audit_logs::Column::Action.eq("ticket_create"))
        .one(&state.orm)
        .await?
        .expect("audit row for ticket creation");
    assert_eq!(audit.resource.as_deref(), Some("tickets"));

    catalog_service::update_service(
        &state,
        &admin,
        diagnostics,
        UpdateServiceRequest {
            price: Some(Decimal::new(200, 0)),
            ..Default::default()
        },
    )
    .await?;

    let reloaded = ticket_service::get_ticket(&state, &client.auth, ticket.id)
        .await?
        .data
        .expect("ticket");
    assert_eq!(reloaded.total_price, Decimal::new(150, 0));

    let extra = create_service(&state, &admin, 30).await?;
    let extended = ticket_service::add_service(
        &state,
        &tech.auth,
        ticket.id,
        AddTicketServiceRequest { service_id: extra },
    )
    .await?
    .data
    .expect("ticket");
    assert_eq!(extended.total_price, Decimal::new(180, 0));
    let added = extended
        .services
        .iter()
        .find(|line| line.id == extra)
        .expect("added line");
    assert!(added.added_by_technician);
    Ok(())
}

#[tokio::test]
async fn ticket_with_inactive_or_unknown_service_is_rejected_whole() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let active = create_service(&state, &admin, 80).await?;
    let retired = create_service(&state, &admin, 90).await?;
    catalog_service::set_service_active(&state, &admin, retired, false).await?;

    let err = open_ticket(&state, &client.auth, tech.technician_id, vec![active, retired])
        .await
        .expect_err("inactive service");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = open_ticket(&state, &client.auth, tech.technician_id, vec![active, Uuid::new_v4()])
        .await
        .expect_err("unknown service");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = open_ticket(&state, &client.auth, Uuid::new_v4(), vec![active])
        .await
        .expect_err("unknown technician");
    assert!(matches!(err, AppError::NotFound(_)));

    let mine = ticket_service::list_my_tickets(&state, &client.auth)
        .await?
        .data
        .expect("tickets");
    assert!(mine.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_service_ids_collapse_to_one_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 40).await?;

    let ticket =
        open_ticket(&state, &client.auth, tech.technician_id, vec![service, service]).await?;
    assert_eq!(ticket.services.len(), 1);
    assert_eq!(ticket.total_price, Decimal::new(40, 0));
    Ok(())
}

#[tokio::test]
async fn only_the_assigned_technician_works_the_ticket() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let assigned = create_technician(&state, &admin).await?;
    let other = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 70).await?;
    let extra = create_service(&state, &admin, 25).await?;

    let ticket = open_ticket(&state, &client.auth, assigned.technician_id, vec![service]).await?;

    let err = ticket_service::add_service(
        &state,
        &other.auth,
        ticket.id,
        AddTicketServiceRequest { service_id: extra },
    )
    .await
    .expect_err("not assigned");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = set_status(&state, &other.auth, ticket.id, TicketStatus::InProgress)
        .await
        .expect_err("not assigned");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = ticket_service::get_ticket(&state, &other.auth, ticket.id)
        .await
        .expect_err("not assigned");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = ticket_service::add_service(
        &state,
        &admin,
        ticket.id,
        AddTicketServiceRequest { service_id: extra },
    )
    .await
    .expect_err("admin cannot append lines");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = set_status(&state, &client.auth, ticket.id, TicketStatus::Closed)
        .await
        .expect_err("client cannot change status");
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = set_status(&state, &assigned.auth, ticket.id, TicketStatus::InProgress).await?;
    assert_eq!(updated.status, TicketStatus::InProgress);

    let assigned_list = ticket_service::list_assigned_tickets(&state, &assigned.auth)
        .await?
        .data
        .expect("tickets");
    assert!(assigned_list.items.iter().any(|t| t.id == ticket.id));
    let other_list = ticket_service::list_assigned_tickets(&state, &other.auth)
        .await?
        .data
        .expect("tickets");
    assert!(other_list.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_lines_conflict_and_closed_tickets_are_frozen() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 60).await?;
    let extra = create_service(&state, &admin, 15).await?;

    let ticket = open_ticket(&state, &client.auth, tech.technician_id, vec![service]).await?;

    let err = ticket_service::add_service(
        &state,
        &tech.auth,
        ticket.id,
        AddTicketServiceRequest { service_id: service },
    )
    .await
    .expect_err("already attached");
    assert!(matches!(err, AppError::Conflict(_)));

    set_status(&state, &tech.auth, ticket.id, TicketStatus::Closed).await?;

    let err = ticket_service::add_service(
        &state,
        &tech.auth,
        ticket.id,
        AddTicketServiceRequest { service_id: extra },
    )
    .await
    .expect_err("closed");
    assert!(matches!(err, AppError::Forbidden(_)));

    let reloaded = ticket_service::get_ticket(&state, &tech.auth, ticket.id)
        .await?
        .data
        .expect("ticket");
    assert_eq!(reloaded.services.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deactivated_service_leaves_catalog_but_stays_on_tickets() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 120).await?;

    let ticket = open_ticket(&state, &client.auth, tech.technician_id, vec![service]).await?;
    catalog_service::set_service_active(&state, &admin, service, false).await?;

    let catalog = catalog_service::list_active_services(&state)
        .await?
        .data
        .expect("services");
    assert!(catalog.items.iter().all(|s| s.id != service));

    let everything = catalog_service::list_all_services(&state, &admin)
        .await?
        .data
        .expect("services");
    let retired = everything
        .items
        .iter()
        .find(|s| s.id == service)
        .expect("retired service still listed for admin");
    assert!(!retired.is_active);

    let reloaded = ticket_service::get_ticket(&state, &client.auth, ticket.id)
        .await?
        .data
        .expect("ticket");
    assert_eq!(reloaded.services.len(), 1);
    assert_eq!(reloaded.services[0].id, service);
    assert_eq!(reloaded.total_price, Decimal::new(120, 0));

    let spare = create_service(&state, &admin, 30).await?;
    catalog_service::set_service_active(&state, &admin, spare, false).await?;
    let err = ticket_service::add_service(
        &state,
        &tech.auth,
        ticket.id,
        AddTicketServiceRequest { service_id: spare },
    )
    .await
    .expect_err("inactive");
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn missing_ticket_or_service_is_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 60).await?;

    let err = ticket_service::add_service(
        &state,
        &tech.auth,
        Uuid::new_v4(),
        AddTicketServiceRequest { service_id: service },
    )
    .await
    .expect_err("unknown ticket");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = set_status(&state, &admin, Uuid::new_v4(), TicketStatus::Closed)
        .await
        .expect_err("unknown ticket");
    assert!(matches!(err, AppError::NotFound(_)));

    let ticket = open_ticket(&state, &client.auth, tech.technician_id, vec![service]).await?;
    let err = ticket_service::add_service(
        &state,
        &tech.auth,
        ticket.id,
        AddTicketServiceRequest {
            service_id: Uuid::new_v4(),
        },
    )
    .await
    .expect_err("unknown service");
    assert!(matches!(err, AppError::NotFound(_)));

    let reloaded = ticket_service::get_ticket(&state, &client.auth, ticket.id)
        .await?
        .data
        .expect("ticket");
    assert_eq!(reloaded.services.len(), 1);
    Ok(())
}

#[tokio::test]
async fn admin_may_reopen_a_closed_ticket() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let client = create_client(&state).await?;
    let service = create_service(&state, &admin, 45).await?;

    let ticket = open_ticket(&state, &client.auth, tech.technician_id, vec![service]).await?;

    let closed = set_status(&state, &admin, ticket.id, TicketStatus::Closed).await?;
    assert_eq!(closed.status, TicketStatus::Closed);
    let reopened = set_status(&state, &admin, ticket.id, TicketStatus::Open).await?;
    assert_eq!(reopened.status, TicketStatus::Open);

    let listed = ticket_service::list_all_tickets(
        &state,
        &admin,
        TicketListQuery {
            page: Some(1),
            per_page: Some(100),
            status: Some(TicketStatus::Open),
            sort_order: Some(SortOrder::Desc),
        },
    )
    .await?;
    let meta = listed.meta.clone().expect("meta");
    assert_eq!(meta.page, Some(1));
    assert!(listed.data.expect("tickets").items.iter().all(|t| t.status == TicketStatus::Open));
    Ok(())
}

#[tokio::test]
async fn clients_only_see_their_own_tickets() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;
    let tech = create_technician(&state, &admin).await?;
    let owner = create_client(&state).await?;
    let stranger = create_client(&state).await?;
    let service = create_service(&state, &admin, 35).await?;

    let ticket = open_ticket(&state, &owner.auth, tech.technician_id, vec![service]).await?;

    let err = ticket_service::get_ticket(&state, &stranger.auth, ticket.id)
        .await
        .expect_err("foreign ticket");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = ticket_service::get_ticket(&state, &owner.auth, Uuid::new_v4())
        .await
        .expect_err("missing ticket");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ticket_service::list_all_tickets(&state, &owner.auth, TicketListQuery::default())
        .await
        .expect_err("admin only");
    assert!(matches!(err, AppError::Forbidden(_)));

    let view = ticket_service::get_ticket(&state, &owner.auth, ticket.id)
        .await?
        .data
        .expect("ticket");
    let client = view.client.expect("client summary");
    assert_eq!(client.id, owner.client_id);
    assert_eq!(client.email, owner.email);
    Ok(())
}
