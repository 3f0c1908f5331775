use std::collections::{hash_map::Entry, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use super::dto::OrderDetails;
use super::repo::{self, CartRow, Order, OrderProduct};
use crate::catalog::repo as catalog_repo;
use crate::error::AppError;
use crate::payments::repo as payments_repo;

/// Aggregated view of one product within an order: how many units the
/// order holds and what they cost together.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub product: catalog_repo::Product,
    pub units: u32,
    pub cost: Decimal,
}

/// Result of resolving a user's cart. Having no open order is a valid
/// state, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Cart {
    Empty,
    Open {
        order: Order,
        line_items: Vec<LineItem>,
    },
}

/// Group association rows by product and compute per-line units and
/// cost.
///
/// Rows are grouped by product id; `units` is the row count of the
/// group and `cost` is `price * units` in exact decimal arithmetic.
/// Line items come out in order of each product's first appearance in
/// the input.
pub fn aggregate_line_items(rows: Vec<CartRow>) -> Vec<LineItem> {
    let mut by_product: HashMap<Uuid, usize> = HashMap::new();
    let mut items: Vec<LineItem> = Vec::new();

    for row in rows {
        match by_product.entry(row.product.id) {
            Entry::Occupied(slot) => items[*slot.get()].units += 1,
            Entry::Vacant(slot) => {
                slot.insert(items.len());
                items.push(LineItem {
                    product: row.product,
                    units: 1,
                    cost: Decimal::ZERO,
                });
            }
        }
    }

    for item in &mut items {
        item.cost = item.product.price * Decimal::from(item.units);
    }
    items
}

/// Pick the user's single open order out of their open-order rows.
///
/// The schema guarantees at most one; finding several means the data
/// is corrupt, and that is reported loudly rather than resolved by
/// silently picking one.
fn single_open(mut open: Vec<Order>) -> Result<Option<Order>, AppError> {
    if open.len() > 1 {
        return Err(AppError::Invariant("more than one open order for user"));
    }
    Ok(open.pop())
}

/// The user's single open order, if any.
pub async fn find_open_order(db: &PgPool, user_id: Uuid) -> Result<Option<Order>, AppError> {
    let open = repo::open_orders_for_user(db, user_id).await?;
    let count = open.len();
    single_open(open).map_err(|e| {
        error!(%user_id, count, "multiple open orders for user");
        e
    })
}

/// Fail unless the joined rows account for every association row.
fn check_aggregation_complete(rows: &[CartRow], expected: i64) -> Result<(), AppError> {
    if rows.len() as i64 != expected {
        return Err(AppError::Invariant("order references a missing product"));
    }
    Ok(())
}

/// Load and aggregate every line item of an order.
///
/// The aggregation is all-or-nothing: if any association row fails to
/// resolve its product, the whole load fails instead of silently
/// dropping the line. Both reads run in one snapshot so a concurrent
/// add or remove cannot trip the completeness check on a valid cart.
async fn load_line_items(db: &PgPool, order_id: Uuid) -> Result<Vec<LineItem>, AppError> {
    let mut tx = repo::begin_cart_read(db).await?;
    let rows = repo::list_cart_rows(&mut *tx, order_id).await?;
    let expected = repo::count_items(&mut *tx, order_id).await?;
    tx.commit().await?;

    if let Err(e) = check_aggregation_complete(&rows, expected) {
        error!(%order_id, joined = rows.len(), expected, "order item lost its product");
        return Err(e);
    }
    Ok(aggregate_line_items(rows))
}

/// Resolve the user's cart: their open order with aggregated line
/// items, or `Cart::Empty` when no open order exists.
pub async fn get_cart(db: &PgPool, user_id: Uuid) -> Result<Cart, AppError> {
    let Some(order) = find_open_order(db, user_id).await? else {
        return Ok(Cart::Empty);
    };
    debug_assert!(order.is_open());
    let line_items = load_line_items(db, order.id).await?;
    Ok(Cart::Open { order, line_items })
}

/// An order by id with its aggregated line items, owner-scoped.
pub async fn get_order_details(
    db: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<OrderDetails, AppError> {
    let order = repo::find_by_id(db, order_id, user_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let line_items = load_line_items(db, order.id).await?;
    Ok(OrderDetails { order, line_items })
}

/// The user's open order, created on first use.
pub async fn find_or_create_open_order(db: &PgPool, user_id: Uuid) -> Result<Order, AppError> {
    if let Some(order) = find_open_order(db, user_id).await? {
        return Ok(order);
    }
    let order = repo::insert_order(db, user_id).await?;
    info!(order_id = %order.id, %user_id, "open order created");
    Ok(order)
}

/// Add one unit of a product to the user's cart.
pub async fn add_item(
    db: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<OrderProduct, AppError> {
    catalog_repo::find_product(db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let order = find_or_create_open_order(db, user_id).await?;
    let item = repo::insert_item(db, order.id, product_id).await?;
    info!(order_id = %order.id, %product_id, "cart item added");
    Ok(item)
}

/// Remove one unit of a product from the user's cart.
pub async fn remove_item(db: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
    let order = find_open_order(db, user_id)
        .await?
        .ok_or(AppError::NotFound("cart item"))?;
    let removed = repo::delete_one_item(db, order.id, product_id).await?;
    if !removed {
        return Err(AppError::NotFound("cart item"));
    }
    info!(order_id = %order.id, %product_id, "cart item removed");
    Ok(())
}

/// Attach or detach a payment type. Attaching one marks the order
/// completed (placed); detaching reopens it.
pub async fn update_order(
    db: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
    payment_type_id: Option<Uuid>,
) -> Result<Order, AppError> {
    let completed_at = match payment_type_id {
        Some(pt_id) => {
            payments_repo::find_payment_type(db, pt_id, user_id)
                .await?
                .ok_or(AppError::NotFound("payment type"))?;
            Some(OffsetDateTime::now_utc())
        }
        None => None,
    };

    let order = repo::update_order(db, order_id, user_id, payment_type_id, completed_at)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    info!(%order_id, placed = order.payment_type_id.is_some(), "order updated");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repo::Product;
    use std::str::FromStr;

    fn product(title: &str, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "test product".into(),
            price: Decimal::from_str(price).unwrap(),
            quantity: 10,
            user_id: Uuid::new_v4(),
            product_type_id: Uuid::new_v4(),
            city: None,
            image_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn row(order_id: Uuid, product: &Product) -> CartRow {
        CartRow {
            order_product_id: Uuid::new_v4(),
            order_id,
            product: product.clone(),
        }
    }

    #[test]
    fn empty_order_yields_no_line_items() {
        assert!(aggregate_line_items(Vec::new()).is_empty());
    }

    #[test]
    fn repeated_product_counts_units_and_multiplies_cost_exactly() {
        let order_id = Uuid::new_v4();
        let kite = product("Kite", "2.99");
        let rows = vec![row(order_id, &kite), row(order_id, &kite), row(order_id, &kite)];

        let items = aggregate_line_items(rows);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].units, 3);
        // Decimal arithmetic, no float drift: 2.99 * 3 is exactly 8.97.
        assert_eq!(items[0].cost, Decimal::from_str("8.97").unwrap());
        assert_eq!(items[0].cost.to_string(), "8.97");
    }

    #[test]
    fn distinct_products_get_one_line_each_in_first_appearance_order() {
        let order_id = Uuid::new_v4();
        let kite = product("Kite", "2.99");
        let cleats = product("Soccer cleats", "9.99");
        let rows = vec![
            row(order_id, &kite),
            row(order_id, &kite),
            row(order_id, &cleats),
        ];

        let items = aggregate_line_items(rows);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product.id, kite.id);
        assert_eq!(items[0].units, 2);
        assert_eq!(items[0].cost, Decimal::from_str("5.98").unwrap());
        assert_eq!(items[1].product.id, cleats.id);
        assert_eq!(items[1].units, 1);
        assert_eq!(items[1].cost, Decimal::from_str("9.99").unwrap());
    }

    #[test]
    fn total_units_equal_total_row_count() {
        let order_id = Uuid::new_v4();
        let a = product("A", "1.00");
        let b = product("B", "2.00");
        let c = product("C", "3.00");
        let rows = vec![
            row(order_id, &a),
            row(order_id, &b),
            row(order_id, &a),
            row(order_id, &c),
            row(order_id, &b),
            row(order_id, &a),
        ];
        let total_rows = rows.len() as u32;

        let items = aggregate_line_items(rows);

        assert_eq!(items.len(), 3);
        assert_eq!(items.iter().map(|i| i.units).sum::<u32>(), total_rows);
    }

    #[test]
    fn interleaved_rows_still_group_by_product() {
        let order_id = Uuid::new_v4();
        let a = product("A", "10.50");
        let b = product("B", "0.10");
        let rows = vec![
            row(order_id, &a),
            row(order_id, &b),
            row(order_id, &a),
            row(order_id, &b),
            row(order_id, &b),
        ];

        let items = aggregate_line_items(rows);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].units, 2);
        assert_eq!(items[0].cost, Decimal::from_str("21.00").unwrap());
        assert_eq!(items[1].units, 3);
        assert_eq!(items[1].cost, Decimal::from_str("0.30").unwrap());
    }

    fn open_order(user_id: Uuid) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id,
            created_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: None,
            payment_type_id: None,
        }
    }

    #[test]
    fn no_open_order_is_a_valid_state() {
        assert!(matches!(single_open(Vec::new()), Ok(None)));
    }

    #[test]
    fn one_open_order_is_returned() {
        let user_id = Uuid::new_v4();
        let order = open_order(user_id);
        let picked = single_open(vec![order.clone()]).unwrap().unwrap();
        assert_eq!(picked.id, order.id);
    }

    #[test]
    fn two_open_orders_are_reported_as_corruption() {
        // The schema allows at most one open order per user; a second
        // one must surface as an error, never be silently skipped.
        let user_id = Uuid::new_v4();
        let result = single_open(vec![open_order(user_id), open_order(user_id)]);
        assert!(matches!(result, Err(AppError::Invariant(_))));
    }

    #[test]
    fn aggregation_refuses_rows_with_missing_products() {
        let order_id = Uuid::new_v4();
        let kite = product("Kite", "2.99");
        let rows = vec![row(order_id, &kite)];

        assert!(check_aggregation_complete(&rows, 1).is_ok());
        assert!(matches!(
            check_aggregation_complete(&rows, 2),
            Err(AppError::Invariant(_))
        ));
    }

    #[test]
    fn cart_serializes_with_distinguished_status() {
        let empty = serde_json::to_value(Cart::Empty).unwrap();
        assert_eq!(empty["status"], "empty");

        let order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: None,
            payment_type_id: None,
        };
        let open = serde_json::to_value(Cart::Open {
            order,
            line_items: Vec::new(),
        })
        .unwrap();
        assert_eq!(open["status"], "open");
        assert!(open["line_items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn order_is_open_only_without_payment_and_completion() {
        let mut order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: None,
            payment_type_id: None,
        };
        assert!(order.is_open());

        order.payment_type_id = Some(Uuid::new_v4());
        order.completed_at = Some(OffsetDateTime::UNIX_EPOCH);
        assert!(!order.is_open());
    }
}
