//! Database seeder for Revguard development and testing.
//!
//! Seeds a demo user and a pair of alert rules, and prints a development
//! JWT for exercising the API locally.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use revguard_db::entities::{alert_rules, users};
use revguard_shared::{JwtConfig, JwtService};

/// Demo user ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo "impact" alert rule ID
const DEMO_IMPACT_RULE_ID: &str = "00000000-0000-0000-0000-000000000101";
/// Demo "duplicates" alert rule ID
const DEMO_DUPLICATE_RULE_ID: &str = "00000000-0000-0000-0000-000000000102";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = revguard_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo user...");
    seed_demo_user(&db).await;

    println!("Seeding demo alert rules...");
    seed_demo_alert_rules(&db).await;

    print_dev_token();

    println!("Seeding complete!");
}

fn demo_user_id() -> Uuid {
    Uuid::parse_str(DEMO_USER_ID).unwrap()
}

/// Seeds a demo user for development.
async fn seed_demo_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(demo_user_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo user already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let user = users::ActiveModel {
        id: Set(demo_user_id()),
        email: Set("demo@revguard.dev".to_string()),
        full_name: Set("Demo User".to_string()),
        company_name: Set(Some("Demo Retail Co".to_string())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert demo user: {e}");
    } else {
        println!("  Created demo user: demo@revguard.dev");
    }
}

/// Seeds two demo alert rules: one watching total impact, one watching
/// duplicate counts.
async fn seed_demo_alert_rules(db: &DatabaseConnection) {
    let rules = [
        (
            DEMO_IMPACT_RULE_ID,
            "Large leakage impact",
            "total_impact",
            Decimal::new(5_000, 0),
            "high",
        ),
        (
            DEMO_DUPLICATE_RULE_ID,
            "Duplicate transactions present",
            "duplicate_count",
            Decimal::ZERO,
            "medium",
        ),
    ];

    for (id, name, metric, threshold, severity) in rules {
        let rule_id = Uuid::parse_str(id).unwrap();
        if alert_rules::Entity::find_by_id(rule_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  Alert rule '{name}' already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let rule = alert_rules::ActiveModel {
            id: Set(rule_id),
            user_id: Set(demo_user_id()),
            name: Set(name.to_string()),
            description: Set(None),
            metric: Set(metric.to_string()),
            comparator: Set("greater_than".to_string()),
            threshold: Set(threshold),
            severity: Set(severity.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = rule.insert(db).await {
            eprintln!("Failed to insert alert rule '{name}': {e}");
        } else {
            println!("  Created alert rule: {name}");
        }
    }
}

/// Prints a development JWT for the demo user so the API can be exercised
/// with curl right away.
fn print_dev_token() {
    let Ok(secret) = std::env::var("REVGUARD__JWT__SECRET") else {
        println!("  REVGUARD__JWT__SECRET not set, skipping dev token");
        return;
    };

    let jwt = JwtService::new(JwtConfig {
        secret,
        access_token_expiry_secs: 86400,
    });

    match jwt.generate_access_token(demo_user_id()) {
        Ok(token) => println!("Dev token (24h):\n  Bearer {token}"),
        Err(e) => eprintln!("Failed to generate dev token: {e}"),
    }
}
