use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;

#[derive(Clone)]
pub struct CatalogService {
    pool: DbPool,
}

impl CatalogService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Customer catalog: active games with their unsold key counts.
    pub async fn list_catalog(&self) -> AppResult<Vec<CatalogGame>> {
        let games = sqlx::query_as::<_, CatalogGame>(
            r#"
            SELECT
                g.id, g.title, g.description, g.price, g.image_url,
                COUNT(k.id) AS available_keys
            FROM games g
            LEFT JOIN steam_keys k ON k.game_id = g.id AND k.status = 'available'
            WHERE g.is_deleted = 0
            GROUP BY g.id
            ORDER BY g.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    /// One catalog entry; archived games are not resolvable here.
    pub async fn get_catalog_game(&self, game_id: i64) -> AppResult<CatalogGame> {
        sqlx::query_as::<_, CatalogGame>(
            r#"
            SELECT
                g.id, g.title, g.description, g.price, g.image_url,
                COUNT(k.id) AS available_keys
            FROM games g
            LEFT JOIN steam_keys k ON k.game_id = g.id AND k.status = 'available'
            WHERE g.id = ? AND g.is_deleted = 0
            GROUP BY g.id
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    /// Admin listing. `active_only` mirrors the `?active=1` picker filter.
    pub async fn admin_list_games(&self, active_only: bool) -> AppResult<Vec<Game>> {
        let sql = if active_only {
            "SELECT * FROM games WHERE is_deleted = 0 ORDER BY title"
        } else {
            "SELECT * FROM games ORDER BY title"
        };

        Ok(sqlx::query_as::<_, Game>(sql).fetch_all(&self.pool).await?)
    }

    /// Lookup without the archive filter. Historical orders keep referencing
    /// archived games, so admin views resolve them by id.
    pub async fn get_game_any(&self, game_id: i64) -> AppResult<Game> {
        sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ?")
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    pub async fn create_game(&self, request: CreateGameRequest) -> AppResult<Game> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".to_string()));
        }
        if request.price < 0 {
            return Err(AppError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }

        let result = sqlx::query(
            "INSERT INTO games (title, description, price, image_url) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_url)
        .execute(&self.pool)
        .await?;

        let game = self.get_game_any(result.last_insert_rowid()).await?;
        log::info!("Game created: {} ({})", game.title, game.id);
        Ok(game)
    }

    pub async fn update_game(&self, game_id: i64, request: UpdateGameRequest) -> AppResult<Game> {
        let mut game = self.get_game_any(game_id).await?;

        if let Some(title) = request.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::ValidationError("Title is required".to_string()));
            }
            game.title = title;
        }
        if let Some(description) = request.description {
            game.description = description;
        }
        if let Some(price) = request.price {
            if price < 0 {
                return Err(AppError::ValidationError(
                    "Price must not be negative".to_string(),
                ));
            }
            game.price = price;
        }
        if let Some(image_url) = request.image_url {
            game.image_url = Some(image_url);
        }

        sqlx::query(
            r#"
            UPDATE games
            SET title = ?, description = ?, price = ?, image_url = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&game.title)
        .bind(&game.description)
        .bind(game.price)
        .bind(&game.image_url)
        .bind(game_id)
        .execute(&self.pool)
        .await?;

        self.get_game_any(game_id).await
    }

    /// Hard delete when nothing references the game; otherwise archive it so
    /// historical orders and keys keep a valid reference. Archiving drops the
    /// image and removes the game from open carts, either way it stops being
    /// purchasable.
    pub async fn delete_game(&self, game_id: i64) -> AppResult<DeleteGameOutcome> {
        self.get_game_any(game_id).await?;

        let mut tx = self.pool.begin().await?;

        let (key_refs,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM steam_keys WHERE game_id = ?")
                .bind(game_id)
                .fetch_one(&mut *tx)
                .await?;
        let (item_refs,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE game_id = ?")
                .bind(game_id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM cart_items WHERE game_id = ?")
            .bind(game_id)
            .execute(&mut *tx)
            .await?;

        let outcome = if key_refs == 0 && item_refs == 0 {
            sqlx::query("DELETE FROM games WHERE id = ?")
                .bind(game_id)
                .execute(&mut *tx)
                .await?;
            DeleteGameOutcome::Deleted
        } else {
            sqlx::query(
                "UPDATE games SET is_deleted = 1, image_url = NULL, updated_at = datetime('now') WHERE id = ?",
            )
            .bind(game_id)
            .execute(&mut *tx)
            .await?;
            DeleteGameOutcome::Archived
        };

        tx.commit().await?;
        log::info!("Game {game_id} delete outcome: {outcome:?}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;

    async fn add_game(svc: &CatalogService, title: &str, price: i64) -> Game {
        svc.create_game(CreateGameRequest {
            title: title.to_string(),
            description: String::new(),
            price,
            image_url: Some("/img/test.jpg".to_string()),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_unreferenced_game_is_hard_deleted() {
        let pool = test_pool().await;
        let svc = CatalogService::new(pool);

        let game = add_game(&svc, "Hades", 120000).await;
        let outcome = svc.delete_game(game.id).await.unwrap();
        assert_eq!(outcome, DeleteGameOutcome::Deleted);
        assert!(matches!(
            svc.get_game_any(game.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_referenced_game_is_archived_and_hidden() {
        let pool = test_pool().await;
        let svc = CatalogService::new(pool.clone());

        let game = add_game(&svc, "Elden Ring", 500000).await;
        sqlx::query("INSERT INTO steam_keys (game_id, key_code) VALUES (?, 'AAAAA-BBBBB-CCCCC')")
            .bind(game.id)
            .execute(&pool)
            .await
            .unwrap();

        let outcome = svc.delete_game(game.id).await.unwrap();
        assert_eq!(outcome, DeleteGameOutcome::Archived);

        // Gone from the customer catalog and the active admin picker
        assert!(svc.list_catalog().await.unwrap().is_empty());
        assert!(svc.admin_list_games(true).await.unwrap().is_empty());
        assert!(matches!(
            svc.get_catalog_game(game.id).await,
            Err(AppError::NotFound(_))
        ));

        // Still resolvable by id for history, with the image removed
        let archived = svc.get_game_any(game.id).await.unwrap();
        assert!(archived.is_deleted);
        assert!(archived.image_url.is_none());
    }

    #[tokio::test]
    async fn test_catalog_counts_available_keys() {
        let pool = test_pool().await;
        let svc = CatalogService::new(pool.clone());

        let game = add_game(&svc, "Celeste", 90000).await;
        for (code, status) in [("K1", "available"), ("K2", "available"), ("K3", "sold")] {
            sqlx::query("INSERT INTO steam_keys (game_id, key_code, status) VALUES (?, ?, ?)")
                .bind(game.id)
                .bind(code)
                .bind(status)
                .execute(&pool)
                .await
                .unwrap();
        }

        let catalog = svc.list_catalog().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].available_keys, 2);
    }
}
