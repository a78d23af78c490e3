#![allow(dead_code)]

use helpdesk_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        clients::RegisterClientRequest, services::CreateServiceRequest,
        technicians::CreateTechnicianRequest,
    },
    entity::users::{ActiveModel as UserActive, Role},
    middleware::auth::AuthUser,
    services::{auth_service::hash_password, catalog_service, client_service, technician_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connects to the test database, or returns `None` so the caller can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
            );
            return Ok(None);
        }
    };

    MIGRATED
        .get_or_try_init(|| async {
            let orm = create_orm_conn(&database_url).await?;
            run_migrations(&orm).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    let upload_folder = std::env::temp_dir().join(format!("helpdesk-test-{}", unique()));
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some("integration-secret".to_string()),
        "UPLOAD_FOLDER" => Some(upload_folder.display().to_string()),
        _ => None,
    })?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    Ok(Some(AppState::new(pool, orm, config)))
}

pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@helpdesk.test", unique())
}

pub async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Admin".into()),
        email: Set(unique_email("admin")),
        password_hash: Set(hash_password("admin123")?),
        role: Set(Role::Admin),
        avatar_url: Set(None),
        is_first_access: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: Role::Admin,
    })
}

pub struct TestTechnician {
    pub auth: AuthUser,
    pub technician_id: Uuid,
    pub email: String,
    pub temporary_password: String,
}

pub async fn create_technician(
    state: &AppState,
    admin: &AuthUser,
) -> anyhow::Result<TestTechnician> {
    let email = unique_email("tech");
    let resp = technician_service::create_technician(
        state,
        admin,
        CreateTechnicianRequest {
            name: "Test Technician".into(),
            email: email.clone(),
            available_hours: None,
        },
    )
    .await?;
    let created = resp.data.expect("created technician");

    Ok(TestTechnician {
        auth: AuthUser {
            user_id: created.technician.user_id,
            role: Role::Technician,
        },
        technician_id: created.technician.id,
        email,
        temporary_password: created.temporary_password,
    })
}

pub struct TestClient {
    pub auth: AuthUser,
    pub client_id: Uuid,
    pub email: String,
}

pub async fn create_client(state: &AppState) -> anyhow::Result<TestClient> {
    let email = unique_email("client");
    let resp = client_service::register_client(
        state,
        RegisterClientRequest {
            name: "Test Client".into(),
            email: email.clone(),
            password: "client123".into(),
        },
    )
    .await?;
    let client = resp.data.expect("registered client");

    Ok(TestClient {
        auth: AuthUser {
            user_id: client.user_id,
            role: Role::Client,
        },
        client_id: client.id,
        email,
    })
}

/// Creates an active catalog entry priced in whole units.
pub async fn create_service(
    state: &AppState,
    admin: &AuthUser,
    price: i64,
) -> anyhow::Result<Uuid> {
    let resp = catalog_service::create_service(
        state,
        admin,
        CreateServiceRequest {
            name: format!("Service {}", unique()),
            description: Some("Integration test service".into()),
            price: Decimal::new(price, 0),
        },
    )
    .await?;
    Ok(resp.data.expect("created service").id)
}
