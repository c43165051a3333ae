//! Demo data for local development. Two accounts (one shopper, one admin)
//! and a small handmade-crochet catalog.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;
use uuid::Uuid;

use crate::infra::storage::entity::{product, user};
use crate::security::password::hash_password;

struct SeedProduct {
    name: &'static str,
    price: i64,
    description: &'static str,
    category: &'static str,
    stock: i32,
    image_url: &'static str,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Crocheted Bear Amigurumi",
        price: 2800,
        description: "A soft hand-crocheted teddy bear with a gentle expression. Makes a lovely gift.",
        category: "amigurumi",
        stock: 8,
        image_url: "https://images.unsplash.com/photo-1551963831-b3b1ca40c98e?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Rabbit Amigurumi",
        price: 2600,
        description: "A rabbit crocheted in pink and white yarn with floppy ears. Doubles as a bag charm.",
        category: "amigurumi",
        stock: 6,
        image_url: "https://images.unsplash.com/photo-1583337130417-3346a1be7dee?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Granny Square Coaster Set",
        price: 1200,
        description: "A set of four coasters in classic granny squares. Muted colors that suit any table.",
        category: "accessories",
        stock: 15,
        image_url: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Mini Pouch",
        price: 3200,
        description: "A hand-crocheted zip pouch for coins and small items. Simple design for everyday use.",
        category: "bags",
        stock: 10,
        image_url: "https://images.unsplash.com/photo-1564422170191-4bd349a62c8a?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Striped Scarf",
        price: 4500,
        description: "A soft striped scarf in warm yarn. A perennial gift favorite.",
        category: "fashion",
        stock: 5,
        image_url: "https://images.unsplash.com/photo-1589338569063-86c70e5e24c3?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Tote Bag",
        price: 5800,
        description: "A roomy crocheted tote for shopping or commuting, in a colorful palette.",
        category: "bags",
        stock: 4,
        image_url: "https://images.unsplash.com/photo-1590874103328-eac38a683ce7?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Star Mascot",
        price: 800,
        description: "A little star-shaped mascot, available in several colors. Clip it to a bag or keyring.",
        category: "mascots",
        stock: 20,
        image_url: "https://images.unsplash.com/photo-1513475382585-d06e58bcb0e0?w=400&h=400&fit=crop",
    },
    SeedProduct {
        name: "Crocheted Storage Basket",
        price: 3500,
        description: "A practical basket for organizing small items, in natural tones that blend into any room.",
        category: "accessories",
        stock: 7,
        image_url: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=400&fit=crop",
    },
];

/// Populate an empty database with demo accounts and products.
///
/// A no-op when any user already exists, so it is safe to run on every start
/// of a development server.
pub async fn seed_demo_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    let existing = user::Entity::find().count(db).await?;
    if existing > 0 {
        info!("Database already has {existing} users, skipping seed");
        return Ok(());
    }

    let now = Utc::now();

    for (email, password, display_name, is_admin) in [
        ("user@example.com", "password123", "Demo Shopper", false),
        ("admin@admin.com", "admin123", "Administrator", true),
    ] {
        let m = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(password)?),
            display_name: Set(display_name.to_string()),
            is_admin: Set(is_admin),
            created_at: Set(now),
        };
        let _ = m.insert(db).await?;
        info!("Seeded account {email}");
    }

    for seed in SEED_PRODUCTS {
        let m = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            price: Set(Decimal::from(seed.price)),
            description: Set(seed.description.to_string()),
            image_url: Set(seed.image_url.to_string()),
            stock: Set(seed.stock),
            category: Set(seed.category.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let _ = m.insert(db).await?;
    }
    info!("Seeded {} products", SEED_PRODUCTS.len());

    Ok(())
}
