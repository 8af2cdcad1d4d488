use chrono::{Datelike, Duration, Utc, Weekday};
use optical_storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    services::appointment_service::day_slots,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    // Profile ids must match the auth provider's user ids to be usable with real tokens.
    let admin_id = ensure_profile(&pool, "admin@example.com", "Admin", "admin").await?;
    let client_id = ensure_profile(&pool, "client@example.com", "Claire", "client").await?;
    seed_catalogue(&pool).await?;
    seed_lens_options(&pool).await?;
    seed_promotion(&pool).await?;
    seed_blog(&pool, admin_id).await?;
    seed_slots(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Client ID: {client_id}");
    Ok(())
}

async fn ensure_profile(
    pool: &DbPool,
    email: &str,
    first_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        sqlx::query("UPDATE profiles SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(pool)
            .await?;
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO profiles (id, email, first_name, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(email)
        .bind(first_name)
        .bind(role)
        .execute(pool)
        .await?;

    println!("Ensured profile {email} (role={role})");
    Ok(id)
}

async fn ensure_brand(pool: &DbPool, name: &str, slug: &str, sort_order: i32) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO brands (id, name, slug, sort_order)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(sort_order)
    .execute(pool)
    .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM brands WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_catalogue(pool: &DbPool) -> anyhow::Result<()> {
    let ray_ban = ensure_brand(pool, "Ray-Ban", "ray-ban", 1).await?;
    let lafont = ensure_brand(pool, "Lafont", "lafont", 2).await?;
    let oakley = ensure_brand(pool, "Oakley", "oakley", 3).await?;

    // (name, slug, category, gender, brand, price, prescription, variants as (color, hex, stock))
    let products: Vec<(&str, &str, &str, &str, Uuid, i64, bool, Vec<(&str, &str, i32)>)> = vec![
        (
            "Wayfarer Classic",
            "wayfarer-classic",
            "solaire",
            "mixte",
            ray_ban,
            16_000,
            false,
            vec![("Noir", "#000000", 8), ("Écaille", "#8b5a2b", 4)],
        ),
        (
            "Lafont Issy",
            "lafont-issy",
            "optique",
            "femme",
            lafont,
            24_500,
            true,
            vec![("Rouge", "#b22222", 3), ("Bleu nuit", "#191970", 5)],
        ),
        (
            "Holbrook",
            "oakley-holbrook",
            "sport",
            "homme",
            oakley,
            8_000,
            false,
            vec![("Gris mat", "#555555", 12)],
        ),
    ];

    for (name, slug, category, gender, brand_id, price, prescription, variants) in products {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, slug, category, gender, brand_id, base_price, requires_prescription, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(category)
        .bind(gender)
        .bind(brand_id)
        .bind(price)
        .bind(prescription)
        .fetch_optional(pool)
        .await?;

        // Variants are only created alongside a fresh product.
        let Some((product_id,)) = inserted else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO product_images (id, product_id, url, alt_text, is_primary)
            VALUES ($1, $2, $3, $4, TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(format!("/images/products/{slug}.jpg"))
        .bind(name)
        .execute(pool)
        .await?;
        for (color, hex, stock) in variants {
            sqlx::query(
                r#"
                INSERT INTO product_variants (id, product_id, color_name, color_hex, stock_quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(color)
            .bind(hex)
            .bind(stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalogue");
    Ok(())
}

async fn seed_lens_options(pool: &DbPool) -> anyhow::Result<()> {
    let options = vec![
        ("Simple vision", "simple-vision", "type", 0_i64, 1),
        ("Progressifs", "progressifs", "type", 15_000, 2),
        ("Anti-reflet", "anti-reflet", "traitement", 4_000, 3),
        ("Filtre lumière bleue", "filtre-lumiere-bleue", "traitement", 3_000, 4),
        ("Amincis 1.67", "amincis-167", "epaisseur", 6_000, 5),
    ];

    for (name, slug, category, price, sort_order) in options {
        sqlx::query(
            r#"
            INSERT INTO lens_options (id, name, slug, category, price, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(category)
        .bind(price)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    println!("Seeded lens options");
    Ok(())
}

async fn seed_promotion(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO promotions (id, name, code, discount_type, discount_value, min_order_amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Bienvenue")
    .bind("BIENVENUE10")
    .bind("percentage")
    .bind(10_i64)
    .bind(5_000_i64)
    .execute(pool)
    .await?;

    println!("Seeded promotion BIENVENUE10");
    Ok(())
}

async fn seed_blog(pool: &DbPool, author_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO blog_posts (id, title, slug, excerpt, content, is_published, published_at, author_id)
        VALUES ($1, $2, $3, $4, $5, TRUE, now(), $6)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Bien choisir sa monture")
    .bind("bien-choisir-sa-monture")
    .bind("Forme du visage, matière et couleur : nos conseils.")
    .bind("Un visage rond s'accorde avec des montures rectangulaires, un visage carré avec des formes arrondies.")
    .bind(author_id)
    .execute(pool)
    .await?;

    println!("Seeded blog");
    Ok(())
}

/// Standard slots for the next two weeks, Sundays and Mondays excluded.
async fn seed_slots(pool: &DbPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let mut created = 0;
    for offset in 1..=14 {
        let date = today + Duration::days(offset);
        if matches!(date.weekday(), Weekday::Sun | Weekday::Mon) {
            continue;
        }
        for (start, end) in day_slots() {
            let result = sqlx::query(
                r#"
                INSERT INTO appointment_slots (id, date, start_time, end_time)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (date, start_time) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(date)
            .bind(start)
            .bind(end)
            .execute(pool)
            .await?;
            created += result.rows_affected();
        }
    }

    println!("Seeded {created} appointment slots");
    Ok(())
}
