use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;

#[derive(Clone)]
pub struct CartService {
    pool: DbPool,
}

impl CartService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: i64) -> AppResult<CartResponse> {
        let items = sqlx::query_as::<_, CartItemDetail>(
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
        .fetch_all(&self.pool)
        .await?;

        let total = items.iter().map(|i| i.subtotal).sum();
        Ok(CartResponse { items, total })
    }

    /// Add a game to the cart. Adding a game that is already in the cart
    /// merges into the existing row instead of duplicating it.
    pub async fn add(&self, user_id: i64, request: AddCartItemRequest) -> AppResult<CartItemDetail> {
        if request.quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let active = sqlx::query("SELECT id FROM games WHERE id = ? AND is_deleted = 0")
            .bind(request.game_id)
            .fetch_optional(&self.pool)
            .await?;
        if active.is_none() {
            return Err(AppError::NotFound("Game not found".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, game_id, quantity)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, game_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(user_id)
        .bind(request.game_id)
        .bind(request.quantity)
        .execute(&self.pool)
        .await?;

        self.get_detail_by_game(user_id, request.game_id).await
    }

    /// Set a row's quantity. Anything below 1 removes the row instead of
    /// persisting a zero or negative quantity; `None` signals removal.
    pub async fn update_quantity(
        &self,
        user_id: i64,
        cart_item_id: i64,
        quantity: i64,
    ) -> AppResult<Option<CartItemDetail>> {
        let owned = sqlx::query("SELECT id FROM cart_items WHERE id = ? AND user_id = ?")
            .bind(cart_item_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if owned.is_none() {
            return Err(AppError::NotFound("Cart item not found".to_string()));
        }

        if quantity < 1 {
            self.remove(user_id, cart_item_id).await?;
            return Ok(None);
        }

        sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ? AND user_id = ?")
            .bind(quantity)
            .bind(cart_item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(Some(self.get_detail(user_id, cart_item_id).await?))
    }

    pub async fn remove(&self, user_id: i64, cart_item_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND user_id = ?")
            .bind(cart_item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cart item not found".to_string()));
        }
        Ok(())
    }

    async fn get_detail(&self, user_id: i64, cart_item_id: i64) -> AppResult<CartItemDetail> {
        sqlx::query_as::<_, CartItemDetail>(
            r#"
            SELECT c.id, c.game_id, g.title, g.price, g.image_url, c.quantity,
                   g.price * c.quantity AS subtotal
            FROM cart_items c
            JOIN games g ON g.id = c.game_id
            WHERE c.id = ? AND c.user_id = ?
            "#,
        )
        .bind(cart_item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
    }

    async fn get_detail_by_game(&self, user_id: i64, game_id: i64) -> AppResult<CartItemDetail> {
        sqlx::query_as::<_, CartItemDetail>(
            r#"
            SELECT c.id, c.game_id, g.title, g.price, g.image_url, c.quantity,
                   g.price * c.quantity AS subtotal
            FROM cart_items c
            JOIN games g ON g.id = c.game_id
            WHERE c.user_id = ? AND c.game_id = ?
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::services::CatalogService;

    async fn seed_user(pool: &DbPool, email: &str) -> i64 {
        sqlx::query("INSERT INTO users (email, username, password_hash) VALUES (?, ?, 'x')")
            .bind(email)
            .bind("tester")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn seed_game(pool: &DbPool, title: &str, price: i64) -> i64 {
        CatalogService::new(pool.clone())
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

    #[tokio::test]
    async fn test_adding_same_game_twice_merges_quantity() {
        let pool = test_pool().await;
        let svc = CartService::new(pool.clone());
        let user = seed_user(&pool, "a@example.com").await;
        let game = seed_game(&pool, "Elden Ring", 500000).await;

        svc.add(user, AddCartItemRequest { game_id: game, quantity: 1 })
            .await
            .unwrap();
        let merged = svc
            .add(user, AddCartItemRequest { game_id: game, quantity: 2 })
            .await
            .unwrap();

        assert_eq!(merged.quantity, 3);
        let cart = svc.list(user).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, 1500000);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_item() {
        let pool = test_pool().await;
        let svc = CartService::new(pool.clone());
        let user = seed_user(&pool, "a@example.com").await;
        let game = seed_game(&pool, "Celeste", 90000).await;

        let item = svc
            .add(user, AddCartItemRequest { game_id: game, quantity: 1 })
            .await
            .unwrap();

        let updated = svc.update_quantity(user, item.id, 0).await.unwrap();
        assert!(updated.is_none());
        assert!(svc.list(user).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_cart_rows_are_owner_scoped() {
        let pool = test_pool().await;
        let svc = CartService::new(pool.clone());
        let alice = seed_user(&pool, "alice@example.com").await;
        let mallory = seed_user(&pool, "mallory@example.com").await;
        let game = seed_game(&pool, "Hades", 120000).await;

        let item = svc
            .add(alice, AddCartItemRequest { game_id: game, quantity: 1 })
            .await
            .unwrap();

        assert!(matches!(
            svc.remove(mallory, item.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_quantity(mallory, item.id, 5).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(svc.list(alice).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_archived_game_cannot_be_added() {
        let pool = test_pool().await;
        let svc = CartService::new(pool.clone());
        let catalog = CatalogService::new(pool.clone());
        let user = seed_user(&pool, "a@example.com").await;
        let game = seed_game(&pool, "Old Game", 50000).await;

        sqlx::query("INSERT INTO steam_keys (game_id, key_code) VALUES (?, 'OLD-KEY-1')")
            .bind(game)
            .execute(&pool)
            .await
            .unwrap();
        catalog.delete_game(game).await.unwrap();

        let result = svc
            .add(user, AddCartItemRequest { game_id: game, quantity: 1 })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
