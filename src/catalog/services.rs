use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo::{self, Product, ProductType};
use crate::error::AppError;

/// How many products a type summary shows as a preview.
const PREVIEW_LEN: usize = 3;

/// One product type with its total product count and a short preview.
#[derive(Debug, Clone, Serialize)]
pub struct ProductTypeSummary {
    pub type_id: Uuid,
    pub type_label: String,
    pub count: usize,
    pub preview_products: Vec<Product>,
}

/// Group products by their product type.
///
/// `count` is the full number of products in the type even when the
/// preview is truncated. Types with no products are reported with a
/// zero count. Output follows the order of `types`; previews follow
/// the order of `products`, so determinism is the caller's ordering.
pub fn summarize_types(types: &[ProductType], products: &[Product]) -> Vec<ProductTypeSummary> {
    types
        .iter()
        .map(|t| {
            let mut count = 0;
            let mut preview_products = Vec::new();
            for product in products.iter().filter(|p| p.product_type_id == t.id) {
                count += 1;
                if preview_products.len() < PREVIEW_LEN {
                    preview_products.push(product.clone());
                }
            }
            ProductTypeSummary {
                type_id: t.id,
                type_label: t.label.clone(),
                count,
                preview_products,
            }
        })
        .collect()
}

/// Load the catalog and produce the grouped type summary, types sorted
/// by label and previews by ascending product id.
pub async fn get_product_type_summary(db: &PgPool) -> Result<Vec<ProductTypeSummary>, AppError> {
    let types = repo::list_types(db).await?;
    let products = repo::list_products(db).await?;
    Ok(summarize_types(&types, &products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    fn product_type(label: &str) -> ProductType {
        ProductType {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    fn product(title: &str, type_id: Uuid) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "test product".into(),
            price: Decimal::new(999, 2),
            quantity: 10,
            user_id: Uuid::new_v4(),
            product_type_id: type_id,
            city: None,
            image_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn counts_every_product_per_type() {
        let sports = product_type("Sporting Goods");
        let electronics = product_type("Electronics");
        let products = vec![
            product("Kite", sports.id),
            product("TV", electronics.id),
            product("Bowling Ball", sports.id),
        ];

        let summary = summarize_types(&[sports.clone(), electronics.clone()], &products);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].type_id, sports.id);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[1].type_id, electronics.id);
        assert_eq!(summary[1].count, 1);
    }

    #[test]
    fn preview_truncates_to_three_but_count_does_not() {
        let sports = product_type("Sporting Goods");
        let products: Vec<Product> = (0..5)
            .map(|i| product(&format!("Product {i}"), sports.id))
            .collect();

        let summary = summarize_types(std::slice::from_ref(&sports), &products);

        assert_eq!(summary[0].count, 5);
        assert_eq!(summary[0].preview_products.len(), 3);
        // Preview keeps the order products were given in.
        assert_eq!(summary[0].preview_products[0].title, "Product 0");
        assert_eq!(summary[0].preview_products[2].title, "Product 2");
    }

    #[test]
    fn empty_type_reports_zero_count() {
        let appliances = product_type("Appliances");
        let summary = summarize_types(std::slice::from_ref(&appliances), &[]);

        assert_eq!(summary[0].count, 0);
        assert!(summary[0].preview_products.is_empty());
        assert_eq!(summary[0].type_label, "Appliances");
    }

    #[test]
    fn output_follows_type_order() {
        let a = product_type("Appliances");
        let b = product_type("Electronics");
        let c = product_type("Sporting Goods");

        let summary = summarize_types(&[a.clone(), b.clone(), c.clone()], &[]);

        let labels: Vec<&str> = summary.iter().map(|s| s.type_label.as_str()).collect();
        assert_eq!(labels, ["Appliances", "Electronics", "Sporting Goods"]);
    }
}
