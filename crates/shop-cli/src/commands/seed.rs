//! 샘플 상품 카탈로그 시드.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use tracing::{info, warn};

use shop_api::repository::{NewProduct, ProductRepository};

/// 시드 상품 정의.
#[derive(Debug, Clone, Copy)]
pub struct SampleProduct {
    pub title: &'static str,
    pub price: Decimal,
    pub description: &'static str,
    pub category: &'static str,
}

const fn sample(
    title: &'static str,
    price: Decimal,
    description: &'static str,
    category: &'static str,
) -> SampleProduct {
    SampleProduct {
        title,
        price,
        description,
        category,
    }
}

/// 기본 카탈로그.
pub const SAMPLE_PRODUCTS: &[SampleProduct] = &[
    sample("iPhone 15 Pro", dec!(999), "Latest iPhone with A17 Pro chip and titanium design", "Smartphones"),
    sample("Samsung Galaxy S24", dec!(899), "Premium Android smartphone with AI features", "Smartphones"),
    sample("Google Pixel 8 Pro", dec!(999), "Google's flagship with Tensor G3 chip and advanced camera", "Smartphones"),
    sample("OnePlus 12", dec!(799), "Flagship killer with Snapdragon 8 Gen 3", "Smartphones"),
    sample("Xiaomi 14 Pro", dec!(899), "Leica co-engineered camera system", "Smartphones"),
    sample("MacBook Pro 16\" M3 Max", dec!(3499), "Professional laptop for extreme performance", "Laptops"),
    sample("Dell XPS 15", dec!(1899), "Premium Windows laptop with OLED display", "Laptops"),
    sample("Lenovo ThinkPad X1 Carbon", dec!(1699), "Business laptop with legendary keyboard", "Laptops"),
    sample("ASUS ROG Zephyrus G14", dec!(1599), "Gaming laptop with RTX 4060", "Laptops"),
    sample("Microsoft Surface Laptop 5", dec!(1299), "Sleek Windows laptop with touchscreen", "Laptops"),
    sample("Sony WH-1000XM5", dec!(399), "Industry-leading noise cancellation", "Headphones"),
    sample("Apple AirPods Max", dec!(549), "Premium over-ear headphones with spatial audio", "Headphones"),
    sample("Bose QuietComfort Ultra", dec!(429), "Immersive audio with noise cancelling", "Headphones"),
    sample("Sennheiser Momentum 4", dec!(349), "Hi-Fi sound with 60-hour battery", "Headphones"),
    sample("Jabra Elite 85h", dec!(229), "Smart sound personalization", "Headphones"),
    sample("iPad Pro 12.9\" M2", dec!(1099), "Professional tablet with Liquid Retina XDR", "Tablets"),
    sample("Samsung Galaxy Tab S9 Ultra", dec!(1199), "Android tablet with S Pen included", "Tablets"),
    sample("Microsoft Surface Pro 9", dec!(1299), "2-in-1 laptop and tablet", "Tablets"),
    sample("Lenovo Tab P12 Pro", dec!(899), "OLED display with Dolby Vision", "Tablets"),
    sample("Apple Watch Series 9", dec!(399), "Smartwatch with advanced health features", "Wearables"),
    sample("Samsung Galaxy Watch 6 Classic", dec!(369), "Rotating bezel smartwatch", "Wearables"),
    sample("Google Pixel Watch 2", dec!(349), "Fitbit integration and health tracking", "Wearables"),
    sample("Garmin Fenix 7", dec!(699), "Premium multisport GPS watch", "Wearables"),
];

/// 카탈로그에서 사용하는 이미지 경로.
pub const IMAGE_OPTIONS: &[&str] = &[
    "uploads/iphone.jpg",
    "uploads/macbook.jpg",
    "uploads/headphones.jpg",
];

/// 상품 이미지 선택.
///
/// 카테고리에 맞는 이미지가 없으면 순번으로 돌려 씁니다.
pub fn image_for(index: usize, category: &str) -> &'static str {
    match category {
        "Smartphones" => IMAGE_OPTIONS[0],
        "Laptops" => IMAGE_OPTIONS[1],
        "Headphones" => IMAGE_OPTIONS[2],
        _ => IMAGE_OPTIONS[index % IMAGE_OPTIONS.len()],
    }
}

/// 시드 결과.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub removed: u64,
    pub created: usize,
    pub failed: usize,
}

/// 카탈로그 시드.
///
/// `keep`이 false면 기존 상품을 먼저 모두 지웁니다. 개별 상품 실패는
/// 경고만 남기고 계속 진행합니다.
pub async fn seed(pool: &PgPool, keep: bool) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    info!(
        products = SAMPLE_PRODUCTS.len(),
        images = IMAGE_OPTIONS.len(),
        "Starting database seeder"
    );

    if !keep {
        report.removed = ProductRepository::delete_all(pool)
            .await
            .context("Failed to clean existing products")?;
        info!(removed = report.removed, "Existing products removed");
    }

    for (i, product) in SAMPLE_PRODUCTS.iter().enumerate() {
        let image = image_for(i, product.category);
        let input = NewProduct {
            title: product.title.to_string(),
            price: product.price,
            description: product.description.to_string(),
            category: product.category.to_string(),
            image: Some(image.to_string()),
        };

        match ProductRepository::create(pool, input).await {
            Ok(created) => {
                report.created += 1;
                info!(
                    id = created.id,
                    title = %created.title,
                    price = %created.price,
                    image,
                    "Created product {}/{}",
                    i + 1,
                    SAMPLE_PRODUCTS.len()
                );
            }
            Err(e) => {
                report.failed += 1;
                warn!(title = product.title, error = %e, "Failed to create product");
            }
        }
    }

    Ok(report)
}
