use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use helpdesk_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::technician_service::default_available_hours,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@helpdesk.com", "admin123", "ADMIN").await?;

    let tech_user = ensure_user(
        &pool,
        "Carlos Technician",
        "tecnico@helpdesk.com",
        "tech123",
        "TECHNICIAN",
    )
    .await?;
    sqlx::query(
        r#"
        INSERT INTO technicians (id, user_id, available_hours)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tech_user)
    .bind(default_available_hours())
    .execute(&pool)
    .await?;

    let client_user = ensure_user(
        &pool,
        "Maria Client",
        "cliente@helpdesk.com",
        "client123",
        "CLIENT",
    )
    .await?;
    sqlx::query(
        r#"
        INSERT INTO clients (id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_user)
    .execute(&pool)
    .await?;

    seed_services(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // Existing accounts keep their password; only the role is enforced.
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, is_first_access)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_services(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let services = [
        ("Hardware Diagnostics", "Full diagnosis of desktop or notebook hardware", 8000),
        ("Operating System Installation", "Clean install with drivers and updates", 15000),
        ("Virus Removal", "Malware scan, cleanup and hardening", 12000),
        ("Data Backup", "Backup of personal files to external media or cloud", 10000),
        ("Network Setup", "Router, Wi-Fi and small office network configuration", 18000),
        ("Printer Configuration", "Driver install and network sharing for printers", 7000),
        ("Memory Upgrade", "RAM installation and stability testing", 9000),
        ("Software Support", "Installation and troubleshooting of applications", 6000),
    ];

    for (name, description, cents) in services {
        let price = Decimal::new(cents, 2);
        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded services");
    Ok(())
}
