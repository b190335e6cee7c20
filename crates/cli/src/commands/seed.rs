//! Seed the database with a small demo catalog.
//!
//! Creates a vendor account with one categorized shop, a handful of products
//! (with and without promotions, one super deal) and a 15 % coupon. Running it twice is
//! harmless: the second run stops when the demo vendor already exists.

use chrono::{Duration, Utc};
use tracing::info;

use dealshop_core::{DiscountRatio, NewProduct, NewProductCategory, NewShopCategory, Price};
use dealshop_storefront::db::{self, CouponRepository, NewCoupon, PgStore};
use dealshop_storefront::models::NewShop;
use dealshop_storefront::services::{AuthError, AuthService, CatalogService, Registration};

use super::{CommandError, database_url};

const DEMO_USERNAME: &str = "vendeur";
const DEMO_COUPON: &str = "BIENVENUE15";

/// Insert the demo data set.
///
/// # Errors
///
/// Returns an error if the database URL is missing or any insert fails.
pub async fn demo(password: &str) -> Result<(), CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    let vendor = match AuthService::new(&store)
        .register(&Registration {
            username: DEMO_USERNAME.to_owned(),
            email: "vendeur@dealshop.example".to_owned(),
            password: password.to_owned(),
            first_name: "Awa".to_owned(),
            last_name: "Koné".to_owned(),
        })
        .await
    {
        Ok(user) => user,
        Err(AuthError::UserAlreadyExists) => {
            info!("Demo data already present, nothing to do");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %vendor.id, "Created demo vendor '{DEMO_USERNAME}'");

    let catalog = CatalogService::new(&store);
    let general = catalog
        .create_shop_category(&NewShopCategory {
            name: "Commerce général".to_owned(),
            description: "Boutiques de produits du quotidien".to_owned(),
        })
        .await?;
    let mut product_categories = Vec::new();
    for name in ["Textile", "Alimentation", "Électroménager"] {
        let category = catalog
            .create_product_category(&NewProductCategory {
                shop_category_id: general.id,
                name: name.to_owned(),
                description: String::new(),
            })
            .await?;
        product_categories.push(category.id);
    }
    let &[textile, food, appliances] = product_categories.as_slice() else {
        return Err(CommandError::InvalidData("demo categories".to_owned()));
    };
    info!(shop_category_id = %general.id, "Created demo categories");

    let shop = catalog
        .create_shop(&NewShop {
            owner_id: vendor.id,
            category_id: Some(general.id),
            name: "Boutique d'Abidjan".to_owned(),
            slug: None,
            description: "Produits du quotidien à prix cassés.".to_owned(),
            city: "Abidjan".to_owned(),
            email: Some(vendor.email.clone()),
        })
        .await?;
    info!(shop_id = %shop.id, slug = %shop.slug, "Created demo shop");

    let today = Utc::now().date_naive();
    let products = [
        NewProduct {
            description: "Pagne wax 6 yards, coton.".to_owned(),
            stock: 40,
            ..NewProduct::new(shop.id, "Pagne wax", Price::new(5000)).with_category(textile)
        },
        NewProduct {
            description: "Sac de riz parfumé de 5 kg.".to_owned(),
            stock: 120,
            ..NewProduct::new(shop.id, "Riz parfumé 5 kg", Price::new(6000))
                .with_category(food)
                .with_promotion(
                    Price::new(4500),
                    today - Duration::days(1),
                    today + Duration::days(30),
                )
        },
        NewProduct {
            description: "Ventilateur sur pied, 3 vitesses.".to_owned(),
            stock: 15,
            super_deal: true,
            ..NewProduct::new(shop.id, "Ventilateur sur pied", Price::new(15_000))
                .with_category(appliances)
                .with_promotion(
                    Price::new(10_000),
                    today - Duration::days(2),
                    today + Duration::days(14),
                )
        },
    ];

    let mut product_ids = Vec::with_capacity(products.len());
    for new in &products {
        let product = catalog.create_product(new).await?;
        info!(product_id = %product.id, slug = %product.slug, "Created product");
        product_ids.push(product.id);
    }

    let discount_ratio = DiscountRatio::from_percent(15)
        .map_err(|e| CommandError::InvalidData(e.to_string()))?;
    let coupon = store
        .create_coupon(&NewCoupon {
            code: DEMO_COUPON.to_owned(),
            label: "Bienvenue".to_owned(),
            discount_ratio,
            expiry_date: today + Duration::days(30),
            is_active: true,
            max_uses: 100,
            eligible_products: product_ids,
        })
        .await?;
    info!(code = %coupon.code, "Created coupon");

    info!("Seeding complete!");
    Ok(())
}
