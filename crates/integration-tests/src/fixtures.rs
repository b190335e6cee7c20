//! Reusable test data.
//!
//! Names and values follow the shop's reference data set: a vendor
//! restaurant in Abidjan, four dishes with different promotion states and a
//! `NOEL2024` coupon worth 15 %.

use chrono::{Duration, NaiveDate, Utc};

use dealshop_core::{
    Cart, Coupon, CurrencyCode, DiscountRatio, Email, Favorite, NewProduct,
    NewProductCategory, NewShopCategory, Order, PasswordResetToken, Price, Product,
    ProductCategory, ShopCategory, ShopCategoryId,
};
use dealshop_storefront::db::{
    CartRepository, CouponRepository, CustomerRepository, FavoriteRepository, MemoryStore,
    NewCoupon, NewOrder, OrderRepository,
};
use dealshop_storefront::models::{Customer, NewCustomer, NewShop, Shop, User};
use dealshop_storefront::services::{AuthService, CatalogService, Registration};

pub const USER_PASSWORD: &str = "Test@123456";
pub const ANOTHER_USER_PASSWORD: &str = "Test@654321";
pub const COUPON_CODE: &str = "NOEL2024";
pub const ORDER_TRANSACTION_ID: &str = "TRX_20240202_001";

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `testuser` / `test@example.com`, Jean Dupont.
pub async fn user(store: &MemoryStore) -> User {
    AuthService::new(store)
        .register(&Registration {
            username: "testuser".to_owned(),
            email: "test@example.com".to_owned(),
            password: USER_PASSWORD.to_owned(),
            first_name: "Jean".to_owned(),
            last_name: "Dupont".to_owned(),
        })
        .await
        .expect("Failed to create user fixture")
}

/// `anotheruser` / `another@example.com`, no names.
pub async fn another_user(store: &MemoryStore) -> User {
    AuthService::new(store)
        .register(&Registration {
            username: "anotheruser".to_owned(),
            email: "another@example.com".to_owned(),
            password: ANOTHER_USER_PASSWORD.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .expect("Failed to create another_user fixture")
}

/// "Restaurants".
pub async fn shop_category(store: &MemoryStore) -> ShopCategory {
    CatalogService::new(store)
        .create_shop_category(&NewShopCategory {
            name: "Restaurants".to_owned(),
            description: "Catégorie des restaurants".to_owned(),
        })
        .await
        .expect("Failed to create shop_category fixture")
}

/// "Plats Principaux", under `parent`.
pub async fn product_category(store: &MemoryStore, parent: &ShopCategory) -> ProductCategory {
    CatalogService::new(store)
        .create_product_category(&NewProductCategory {
            shop_category_id: parent.id,
            name: "Plats Principaux".to_owned(),
            description: "Plats principaux du menu".to_owned(),
        })
        .await
        .expect("Failed to create product_category fixture")
}

/// "Restaurant le Delice", owned by `owner`, uncategorized.
pub async fn shop(store: &MemoryStore, owner: &User) -> Shop {
    create_shop(store, owner, None).await
}

/// "Restaurant le Delice", filed under `category`.
pub async fn shop_in_category(store: &MemoryStore, owner: &User, category: &ShopCategory) -> Shop {
    create_shop(store, owner, Some(category.id)).await
}

async fn create_shop(
    store: &MemoryStore,
    owner: &User,
    category_id: Option<ShopCategoryId>,
) -> Shop {
    CatalogService::new(store)
        .create_shop(&NewShop {
            owner_id: owner.id,
            category_id,
            name: "Restaurant le Delice".to_owned(),
            slug: None,
            description: "Le meilleur restaurant de la ville".to_owned(),
            city: "Abidjan".to_owned(),
            email: Some(Email::parse("restaurant@example.com").expect("valid email")),
        })
        .await
        .expect("Failed to create shop fixture")
}

async fn product(store: &MemoryStore, new: NewProduct) -> Product {
    CatalogService::new(store)
        .create_product(&new)
        .await
        .expect("Failed to create product fixture")
}

/// 5000 FCFA, no promotion.
pub async fn product_without_promotion(store: &MemoryStore, shop: &Shop) -> Product {
    product(
        store,
        NewProduct {
            description: "Attiéké avec poisson frais".to_owned(),
            stock: 100,
            ..NewProduct::new(shop.id, "Attiéké Poisson", Price::new(5000))
        },
    )
    .await
}

/// 6000 FCFA, 4500 from yesterday to 30 days from now.
pub async fn product_with_active_promotion(store: &MemoryStore, shop: &Shop) -> Product {
    product(
        store,
        NewProduct {
            description: "Placali avec sauce graine".to_owned(),
            stock: 50,
            ..NewProduct::new(shop.id, "Placali Sauce", Price::new(6000)).with_promotion(
                Price::new(4500),
                today() - Duration::days(1),
                today() + Duration::days(30),
            )
        },
    )
    .await
}

/// 4000 FCFA; the 3000 promotion ended yesterday.
pub async fn product_with_expired_promotion(store: &MemoryStore, shop: &Shop) -> Product {
    product(
        store,
        NewProduct {
            description: "Riz avec sauce".to_owned(),
            stock: 100,
            ..NewProduct::new(shop.id, "Riz Sauce", Price::new(4000)).with_promotion(
                Price::new(3000),
                today() - Duration::days(60),
                today() - Duration::days(1),
            )
        },
    )
    .await
}

/// Featured product: 15000 FCFA, 10000 for the coming week.
pub async fn super_deal(store: &MemoryStore, shop: &Shop) -> Product {
    product(
        store,
        NewProduct {
            description: "Menu complet incluant entrée, plat et dessert".to_owned(),
            stock: 30,
            super_deal: true,
            ..NewProduct::new(shop.id, "Menu Spécial VIP", Price::new(15_000)).with_promotion(
                Price::new(10_000),
                today() - Duration::days(1),
                today() + Duration::days(7),
            )
        },
    )
    .await
}

/// Delivery profile for `user`.
pub async fn customer(store: &MemoryStore, user: &User) -> Customer {
    store
        .create_customer(
            user.id,
            &NewCustomer {
                address: "456 Avenue de la Paix".to_owned(),
                phone_primary: "+225 09 87 65 43".to_owned(),
                phone_secondary: Some("+225 07 12 34 56".to_owned()),
                city: "Abidjan".to_owned(),
                country: "Côte d'Ivoire".to_owned(),
            },
        )
        .await
        .expect("Failed to create customer fixture")
}

/// `NOEL2024`: 15 % off, valid for 30 more days, listing `product` as eligible.
pub async fn coupon(store: &MemoryStore, product: &Product) -> Coupon {
    store
        .create_coupon(&NewCoupon {
            code: COUPON_CODE.to_owned(),
            label: COUPON_CODE.to_owned(),
            discount_ratio: DiscountRatio::from_percent(15).expect("valid ratio"),
            expiry_date: today() + Duration::days(30),
            is_active: true,
            max_uses: 100,
            eligible_products: vec![product.id],
        })
        .await
        .expect("Failed to create coupon fixture")
}

/// Empty active cart for `customer`.
pub async fn cart(store: &MemoryStore, customer: &Customer) -> Cart {
    store
        .create_cart(customer.id)
        .await
        .expect("Failed to create cart fixture")
}

/// `cart` with two units of `product` added. Returns the reloaded cart.
pub async fn cart_line(store: &MemoryStore, cart: &Cart, product: &Product) -> Cart {
    store
        .add_line(cart.id, product.id, 2)
        .await
        .expect("Failed to add cart line fixture");
    store
        .get_cart(cart.id)
        .await
        .expect("Failed to reload cart")
        .expect("cart exists")
}

/// Pending 10000 FCFA order for `cart`, before the gateway issued a token.
pub async fn order(store: &MemoryStore, customer: &Customer, cart: &Cart) -> Order {
    store
        .create_order(&NewOrder {
            customer_id: customer.id,
            cart_id: cart.id,
            total: Price::new(10_000),
            currency: CurrencyCode::XOF,
            transaction_id: ORDER_TRANSACTION_ID.to_owned(),
            payment_token: None,
        })
        .await
        .expect("Failed to create order fixture")
}

/// Fresh reset token for `user`, issued through the reset flow.
pub async fn password_reset_token(store: &MemoryStore, user: &User) -> PasswordResetToken {
    let (_, token) = AuthService::new(store)
        .request_password_reset(user.email.as_str())
        .await
        .expect("Failed to request password reset")
        .expect("user has an account");
    token
}

/// `user` bookmarks `product`.
pub async fn favorite(store: &MemoryStore, user: &User, product: &Product) -> Favorite {
    let (favorite, _) = store
        .find_or_insert_favorite(user.id, product.id)
        .await
        .expect("Failed to create favorite fixture");
    favorite
}
