use crate::config::PaymentConfig;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use sqlx::{QueryBuilder, Sqlite};

#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
    payment: PaymentConfig,
}

impl OrderService {
    pub fn new(pool: DbPool, payment: PaymentConfig) -> Self {
        Self { pool, payment }
    }

    /// Turn the caller's cart into an order. Titles and prices are copied
    /// into the line items so later catalog edits cannot change what was
    /// bought, the total is computed from those snapshots, and the cart is
    /// cleared in the same transaction.
    ///
    /// A customer has at most one open checkout: while a pending order
    /// without a payment method exists, its id is returned again instead of
    /// creating a duplicate (double-click protection).
    pub async fn create_from_cart(&self, user_id: i64) -> AppResult<CreateOrderResponse> {
        let open: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM orders WHERE user_id = ? AND status = 'pending' AND payment_method IS NULL ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some((order_id,)) = open {
            log::info!("Reusing open order {order_id} for user {user_id}");
            return Ok(CreateOrderResponse { order_id });
        }

        let mut tx = self.pool.begin().await?;

        let cart: Vec<CartItemDetail> = sqlx::query_as(
            r#"
            SELECT c.id, c.game_id, g.title, g.price, g.image_url, c.quantity,
                   g.price * c.quantity AS subtotal
            FROM cart_items c
            JOIN games g ON g.id = c.game_id
            WHERE c.user_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if cart.is_empty() {
            return Err(AppError::ValidationError("Cart is empty".to_string()));
        }

        let order_id = sqlx::query(
            "INSERT INTO orders (user_id, status, total_price) VALUES (?, 'pending', 0)",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let mut total: i64 = 0;
        for item in &cart {
            sqlx::query(
                "INSERT INTO order_items (order_id, game_id, title, price, quantity) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(item.game_id)
            .bind(&item.title)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            total += item.price * item.quantity;
        }

        sqlx::query("UPDATE orders SET total_price = ? WHERE id = ?")
            .bind(total)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Order {order_id} created for user {user_id}, total {total}");
        Ok(CreateOrderResponse { order_id })
    }

    /// Record the chosen payment method on the caller's pending order. No
    /// gateway is involved; the summary page shows static instructions.
    pub async fn set_payment_method(
        &self,
        user_id: i64,
        order_id: i64,
        method: PaymentMethod,
    ) -> AppResult<Order> {
        let order = self.get_owned_order(user_id, order_id).await?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Order {order_id} is already {}",
                order.status
            )));
        }

        sqlx::query("UPDATE orders SET payment_method = ? WHERE id = ?")
            .bind(&method)
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        self.get_owned_order(user_id, order_id).await
    }

    /// Order summary for the customer (or an admin), with the snapshot items
    /// and the static instructions for the chosen payment method.
    pub async fn get_order(
        &self,
        order_id: i64,
        requester_id: i64,
        requester_is_admin: bool,
    ) -> AppResult<OrderDetailResponse> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        // Existence is not leaked to other customers
        if !requester_is_admin && order.user_id != requester_id {
            return Err(AppError::NotFound("Order not found".to_string()));
        }

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let payment_instructions = order
            .payment_method
            .clone()
            .map(|m| self.payment_instructions(m));

        Ok(OrderDetailResponse {
            order,
            items,
            payment_instructions,
        })
    }

    pub async fn admin_list_orders(
        &self,
        query: &AdminOrderQuery,
    ) -> AppResult<PaginatedResponse<AdminOrderRow>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders o WHERE 1 = 1");
        let mut list: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT o.id, o.user_id, u.email, o.order_date, o.status, o.payment_method, o.total_price \
             FROM orders o JOIN users u ON u.id = o.user_id WHERE 1 = 1",
        );

        for builder in [&mut count, &mut list] {
            if let Some(status) = &query.status {
                builder.push(" AND o.status = ").push_bind(status.clone());
            }
        }

        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        list.push(" ORDER BY o.id DESC LIMIT ")
            .push_bind(params.get_limit())
            .push(" OFFSET ")
            .push_bind(params.get_offset());

        let rows: Vec<AdminOrderRow> = list.build_query_as().fetch_all(&self.pool).await?;

        Ok(PaginatedResponse::new(
            rows,
            params.get_offset() / params.get_limit() + 1,
            params.get_limit(),
            total,
        ))
    }

    /// Dashboard counters: completed purchases, registered customers (the
    /// visitors proxy), and the length of the pending moderation queue.
    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        let (total_purchase,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'approved'")
                .fetch_one(&self.pool)
                .await?;
        let (need_confirm,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        let (total_visitors,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'customer'")
                .fetch_one(&self.pool)
                .await?;

        Ok(AdminStats {
            total_purchase,
            total_visitors,
            need_confirm,
        })
    }

    /// Approve or reject a pending order. Both transitions are terminal.
    ///
    /// Approval claims `quantity` available keys per line item and flips the
    /// order in one transaction. A shortage on any line unwinds everything:
    /// no key stays sold, the order stays pending, and the caller gets the
    /// distinguishable stock error (HTTP 409). Rejection never touches
    /// inventory.
    pub async fn moderate(&self, order_id: i64, new_status: OrderStatus) -> AppResult<Order> {
        if new_status == OrderStatus::Pending {
            return Err(AppError::ValidationError(
                "Target status must be approved or rejected".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Order {order_id} is already {}",
                order.status
            )));
        }

        if new_status == OrderStatus::Approved {
            let items = sqlx::query_as::<_, OrderItem>(
                "SELECT * FROM order_items WHERE order_id = ? ORDER BY id",
            )
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

            for item in &items {
                // Claim-by-update keeps concurrent approvals from assigning
                // the same key twice; the row count tells us whether the
                // pool had enough.
                let claimed = sqlx::query(
                    r#"
                    UPDATE steam_keys
                    SET status = 'sold', order_id = ?
                    WHERE id IN (
                        SELECT id FROM steam_keys
                        WHERE game_id = ? AND status = 'available'
                        ORDER BY id
                        LIMIT ?
                    )
                    "#,
                )
                .bind(order_id)
                .bind(item.game_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;

                if claimed.rows_affected() < item.quantity as u64 {
                    // Dropping the transaction rolls back earlier claims
                    return Err(AppError::InsufficientStock(format!(
                        "Not enough available keys for {}",
                        item.title
                    )));
                }
            }
        }

        sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(&new_status)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Order {order_id} moderated: {new_status}");

        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn get_owned_order(&self, user_id: i64, order_id: i64) -> AppResult<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ? AND user_id = ?")
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    fn payment_instructions(&self, method: PaymentMethod) -> PaymentInstructions {
        match method {
            PaymentMethod::Qris => PaymentInstructions {
                method,
                qris_image_url: Some(self.payment.qris_image_url.clone()),
                account_number: None,
                account_name: None,
            },
            PaymentMethod::Bca => PaymentInstructions {
                method,
                qris_image_url: None,
                account_number: Some(self.payment.bca_account_number.clone()),
                account_name: Some(self.payment.bca_account_name.clone()),
            },
            PaymentMethod::Seabank => PaymentInstructions {
                method,
                qris_image_url: None,
                account_number: Some(self.payment.seabank_account_number.clone()),
                account_name: Some(self.payment.seabank_account_name.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::services::{CartService, CatalogService, KeyService};

    struct Fixture {
        pool: DbPool,
        orders: OrderService,
        cart: CartService,
        catalog: CatalogService,
        keys: KeyService,
        user_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let user_id = sqlx::query(
            "INSERT INTO users (email, username, password_hash) VALUES ('buyer@example.com', 'buyer', 'x')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        Fixture {
            orders: OrderService::new(pool.clone(), PaymentConfig::default()),
            cart: CartService::new(pool.clone()),
            catalog: CatalogService::new(pool.clone()),
            keys: KeyService::new(pool.clone()),
            pool,
            user_id,
        }
    }

    impl Fixture {
        async fn game(&self, title: &str, price: i64) -> i64 {
            self.catalog
                .create_game(CreateGameRequest {
                    title: title.to_string(),
                    description: String::new(),
                    price,
                    image_url: None,
                })
                .await
                .unwrap()
                .id
        }

        async fn stock(&self, game_id: i64, codes: &[&str]) {
            self.keys
                .add_keys(AddKeysRequest {
                    game_id,
                    key_code: None,
                    key_codes: codes.iter().map(|c| c.to_string()).collect(),
                })
                .await
                .unwrap();
        }

        async fn cart_add(&self, game_id: i64, quantity: i64) {
            self.cart
                .add(self.user_id, AddCartItemRequest { game_id, quantity })
                .await
                .unwrap();
        }

        async fn available_count(&self) -> i64 {
            let (n,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM steam_keys WHERE status = 'available'")
                    .fetch_one(&self.pool)
                    .await
                    .unwrap();
            n
        }
    }

    #[tokio::test]
    async fn test_empty_cart_creates_no_order() {
        let fx = fixture().await;

        let result = fx.orders.create_from_cart(fx.user_id).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&fx.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_price_edits() {
        let fx = fixture().await;
        let game = fx.game("Elden Ring", 500000).await;
        fx.cart_add(game, 2).await;

        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        // Cart is consumed
        assert!(fx.cart.list(fx.user_id).await.unwrap().items.is_empty());

        fx.catalog
            .update_game(
                game,
                UpdateGameRequest {
                    title: None,
                    description: None,
                    price: Some(750000),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let detail = fx.orders.get_order(order_id, fx.user_id, false).await.unwrap();
        assert_eq!(detail.order.total_price, 1000000);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].price, 500000);
        assert_eq!(detail.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_open_checkout_is_reused() {
        let fx = fixture().await;
        let game = fx.game("Hades", 120000).await;
        fx.cart_add(game, 1).await;

        let first = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;
        // Double click: no cart left, but the open order is returned again
        let second = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;
        assert_eq!(first, second);

        // Once a payment method is chosen the next checkout is a new order
        fx.orders
            .set_payment_method(fx.user_id, first, PaymentMethod::Qris)
            .await
            .unwrap();
        fx.cart_add(game, 1).await;
        let third = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn test_approval_assigns_distinct_keys() {
        let fx = fixture().await;
        let elden = fx.game("Elden Ring", 500000).await;
        let hades = fx.game("Hades", 120000).await;
        fx.stock(elden, &["ER-1", "ER-2", "ER-3"]).await;
        fx.stock(hades, &["HA-1"]).await;

        fx.cart_add(elden, 2).await;
        fx.cart_add(hades, 1).await;
        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        let order = fx
            .orders
            .moderate(order_id, OrderStatus::Approved)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Approved);

        // One distinct key per purchased unit
        let assigned = fx.keys.keys_for_order(order_id).await.unwrap();
        assert_eq!(assigned.len(), 3);
        assert_eq!(fx.available_count().await, 1);

        let (sold,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT id) FROM steam_keys WHERE order_id = ? AND status = 'sold'",
        )
        .bind(order_id)
        .fetch_one(&fx.pool)
        .await
        .unwrap();
        assert_eq!(sold, 3);
    }

    #[tokio::test]
    async fn test_shortage_aborts_whole_approval() {
        let fx = fixture().await;
        let elden = fx.game("Elden Ring", 500000).await;
        let hades = fx.game("Hades", 120000).await;
        fx.stock(elden, &["ER-1", "ER-2"]).await;
        // Hades line has stock, Elden Ring does not; nothing may be claimed
        fx.stock(hades, &["HA-1"]).await;

        fx.cart_add(hades, 1).await;
        fx.cart_add(elden, 3).await;
        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        let result = fx.orders.moderate(order_id, OrderStatus::Approved).await;
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));

        // All-or-nothing: every key still available, order still pending
        assert_eq!(fx.available_count().await, 3);
        let detail = fx.orders.get_order(order_id, fx.user_id, false).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);

        // After restocking, the same order can still be approved
        fx.stock(elden, &["ER-3"]).await;
        let order = fx
            .orders
            .moderate(order_id, OrderStatus::Approved)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(fx.available_count().await, 0);
    }

    #[tokio::test]
    async fn test_reject_touches_no_keys_and_is_terminal() {
        let fx = fixture().await;
        let game = fx.game("Celeste", 90000).await;
        fx.stock(game, &["CE-1", "CE-2"]).await;
        fx.cart_add(game, 1).await;
        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        let order = fx
            .orders
            .moderate(order_id, OrderStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(fx.available_count().await, 2);
        assert!(fx.keys.keys_for_order(order_id).await.unwrap().is_empty());

        // Terminal: no re-moderation
        let again = fx.orders.moderate(order_id, OrderStatus::Approved).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_elden_ring_shortage_scenario() {
        // Cart = [{Elden Ring, qty 2, price 500000}], one key in stock:
        // total is 1000000, approval reports shortage, order stays pending.
        let fx = fixture().await;
        let elden = fx.game("Elden Ring", 500000).await;
        fx.stock(elden, &["ER-ONLY-1"]).await;
        fx.cart_add(elden, 2).await;

        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;
        let detail = fx.orders.get_order(order_id, fx.user_id, false).await.unwrap();
        assert_eq!(detail.order.total_price, 1000000);
        assert_eq!(detail.items.len(), 1);

        let result = fx.orders.moderate(order_id, OrderStatus::Approved).await;
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));

        let detail = fx.orders.get_order(order_id, fx.user_id, false).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_order_access_is_owner_or_admin() {
        let fx = fixture().await;
        let game = fx.game("Hades", 120000).await;
        fx.cart_add(game, 1).await;
        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        let other = sqlx::query(
            "INSERT INTO users (email, username, password_hash) VALUES ('other@example.com', 'other', 'x')",
        )
        .execute(&fx.pool)
        .await
        .unwrap()
        .last_insert_rowid();

        assert!(matches!(
            fx.orders.get_order(order_id, other, false).await,
            Err(AppError::NotFound(_))
        ));
        assert!(fx.orders.get_order(order_id, other, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dashboard_stats_count_orders_and_customers() {
        let fx = fixture().await;
        let game = fx.game("Hades", 120000).await;
        fx.stock(game, &["HA-1", "HA-2"]).await;

        // One approved purchase
        fx.cart_add(game, 1).await;
        let first = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;
        fx.orders
            .set_payment_method(fx.user_id, first, PaymentMethod::Qris)
            .await
            .unwrap();
        fx.orders
            .moderate(first, OrderStatus::Approved)
            .await
            .unwrap();

        // One order still waiting for moderation
        fx.cart_add(game, 1).await;
        fx.orders.create_from_cart(fx.user_id).await.unwrap();

        // Admin accounts do not count as visitors
        sqlx::query(
            "INSERT INTO users (email, username, password_hash, role) VALUES ('admin@x.com', 'admin', 'x', 'admin')",
        )
        .execute(&fx.pool)
        .await
        .unwrap();

        let stats = fx.orders.admin_stats().await.unwrap();
        assert_eq!(stats.total_purchase, 1);
        assert_eq!(stats.need_confirm, 1);
        assert_eq!(stats.total_visitors, 1);
    }

    #[tokio::test]
    async fn test_payment_method_on_pending_only() {
        let fx = fixture().await;
        let game = fx.game("Hades", 120000).await;
        fx.stock(game, &["HA-1"]).await;
        fx.cart_add(game, 1).await;
        let order_id = fx.orders.create_from_cart(fx.user_id).await.unwrap().order_id;

        let order = fx
            .orders
            .set_payment_method(fx.user_id, order_id, PaymentMethod::Bca)
            .await
            .unwrap();
        assert_eq!(order.payment_method, Some(PaymentMethod::Bca));

        fx.orders
            .moderate(order_id, OrderStatus::Approved)
            .await
            .unwrap();
        let late = fx
            .orders
            .set_payment_method(fx.user_id, order_id, PaymentMethod::Qris)
            .await;
        assert!(matches!(late, Err(AppError::Conflict(_))));
    }
}
