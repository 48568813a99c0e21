use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::mask_key_code;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashSet;

#[derive(Clone)]
pub struct KeyService {
    pool: DbPool,
}

/// Listing row before masking.
#[derive(Debug, sqlx::FromRow)]
struct KeyRow {
    id: i64,
    game_id: i64,
    title: String,
    status: KeyStatus,
    key_code: String,
}

impl KeyService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add one or more keys for a game, all `available`. The whole batch is
    /// inserted in one transaction; a blank code, a code repeated within the
    /// batch, or a code that already exists rejects the batch. There is no
    /// edit or delete once a key is in.
    pub async fn add_keys(&self, request: AddKeysRequest) -> AppResult<AddKeysResponse> {
        let codes: Vec<String> = request
            .key_code
            .into_iter()
            .chain(request.key_codes)
            .map(|c| c.trim().to_string())
            .collect();

        if codes.is_empty() {
            return Err(AppError::ValidationError(
                "At least one key code is required".to_string(),
            ));
        }
        if codes.iter().any(|c| c.is_empty()) {
            return Err(AppError::ValidationError(
                "Key code must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for code in &codes {
            if !seen.insert(code.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate key code in batch: {code}"
                )));
            }
        }

        let game = sqlx::query("SELECT id FROM games WHERE id = ? AND is_deleted = 0")
            .bind(request.game_id)
            .fetch_optional(&self.pool)
            .await?;
        if game.is_none() {
            return Err(AppError::NotFound("Game not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        for code in &codes {
            let result = sqlx::query(
                "INSERT INTO steam_keys (game_id, key_code, status) VALUES (?, ?, 'available')",
            )
            .bind(request.game_id)
            .bind(code)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    return Err(AppError::ValidationError(
                        "Key code already exists".to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
        tx.commit().await?;

        let added = codes.len() as i64;
        log::info!("Added {added} key(s) for game {}", request.game_id);
        Ok(AddKeysResponse { added })
    }

    /// Inventory listing, masked. The day-to-day view only shows `available`
    /// keys, which is the default filter.
    pub async fn list_keys(
        &self,
        query: &KeyListQuery,
    ) -> AppResult<PaginatedResponse<SteamKeyMasked>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let status_filter = match query.status.as_deref() {
            None => Some(KeyStatus::Available),
            Some("all") => None,
            Some("available") => Some(KeyStatus::Available),
            Some("sold") => Some(KeyStatus::Sold),
            Some("used") => Some(KeyStatus::Used),
            Some(other) => {
                return Err(AppError::ValidationError(format!(
                    "Unknown key status filter: {other}"
                )));
            }
        };

        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM steam_keys k WHERE 1 = 1");
        let mut list: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT k.id, k.game_id, g.title, k.status, k.key_code \
             FROM steam_keys k JOIN games g ON g.id = k.game_id WHERE 1 = 1",
        );

        for builder in [&mut count, &mut list] {
            if let Some(game_id) = query.game_id {
                builder.push(" AND k.game_id = ").push_bind(game_id);
            }
            if let Some(status) = &status_filter {
                builder.push(" AND k.status = ").push_bind(status.clone());
            }
        }

        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        list.push(" ORDER BY g.title, k.id LIMIT ")
            .push_bind(params.get_limit())
            .push(" OFFSET ")
            .push_bind(params.get_offset());

        let rows: Vec<KeyRow> = list.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(|r| SteamKeyMasked {
                id: r.id,
                game_id: r.game_id,
                title: r.title,
                status: r.status,
                key_code_masked: mask_key_code(&r.key_code),
            })
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_offset() / params.get_limit() + 1,
            params.get_limit(),
            total,
        ))
    }

    /// Keys assigned to an order, masked for the moderation panel.
    pub async fn keys_for_order(&self, order_id: i64) -> AppResult<Vec<AssignedKey>> {
        let rows = sqlx::query_as::<_, KeyRow>(
            r#"
            SELECT k.id, k.game_id, g.title, k.status, k.key_code
            FROM steam_keys k
            JOIN games g ON g.id = k.game_id
            WHERE k.order_id = ?
            ORDER BY k.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AssignedKey {
                id: r.id,
                game_id: r.game_id,
                title: r.title,
                key_code_masked: mask_key_code(&r.key_code),
            })
            .collect())
    }

    /// Return the plaintext code. Every reveal is written to the audit log
    /// with the admin who asked for it.
    pub async fn reveal(&self, key_id: i64, admin_id: i64) -> AppResult<RevealKeyResponse> {
        let (key_code,): (String,) =
            sqlx::query_as("SELECT key_code FROM steam_keys WHERE id = ?")
                .bind(key_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Key not found".to_string()))?;

        sqlx::query("INSERT INTO key_reveal_log (steam_key_id, admin_id) VALUES (?, ?)")
            .bind(key_id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;

        log::info!("Key {key_id} revealed by admin {admin_id}");
        Ok(RevealKeyResponse { key_code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::services::CatalogService;

    async fn seed_game(pool: &DbPool, title: &str) -> i64 {
        CatalogService::new(pool.clone())
            .create_game(CreateGameRequest {
                title: title.to_string(),
                description: String::new(),
                price: 100000,
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_bulk_add_and_duplicate_rejection() {
        let pool = test_pool().await;
        let svc = KeyService::new(pool.clone());
        let game = seed_game(&pool, "Elden Ring").await;

        let added = svc
            .add_keys(AddKeysRequest {
                game_id: game,
                key_code: None,
                key_codes: vec!["AAAAA-BBBBB-11111".to_string(), "AAAAA-BBBBB-22222".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(added.added, 2);

        // Duplicate against an existing key rejects the whole batch
        let result = svc
            .add_keys(AddKeysRequest {
                game_id: game,
                key_code: Some("AAAAA-BBBBB-33333".to_string()),
                key_codes: vec!["AAAAA-BBBBB-11111".to_string()],
            })
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        // A code repeated within one batch is rejected too, not collapsed
        let in_batch = svc
            .add_keys(AddKeysRequest {
                game_id: game,
                key_code: None,
                key_codes: vec![
                    "AAAAA-BBBBB-44444".to_string(),
                    "AAAAA-BBBBB-44444".to_string(),
                ],
            })
            .await;
        assert!(matches!(in_batch, Err(AppError::ValidationError(_))));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM steam_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_listing_is_masked_and_defaults_to_available() {
        let pool = test_pool().await;
        let svc = KeyService::new(pool.clone());
        let game = seed_game(&pool, "Hades").await;

        svc.add_keys(AddKeysRequest {
            game_id: game,
            key_code: Some("AAAAA-BBBBB-CCCCC".to_string()),
            key_codes: vec![],
        })
        .await
        .unwrap();
        sqlx::query("INSERT INTO steam_keys (game_id, key_code, status) VALUES (?, 'SOLD-KEY-1', 'sold')")
            .bind(game)
            .execute(&pool)
            .await
            .unwrap();

        let page = svc
            .list_keys(&KeyListQuery {
                game_id: None,
                status: None,
                page: None,
                per_page: None,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].status, KeyStatus::Available);
        assert!(!page.data[0].key_code_masked.contains("AAAAA"));

        let all = svc
            .list_keys(&KeyListQuery {
                game_id: None,
                status: Some("all".to_string()),
                page: None,
                per_page: None,
            })
            .await
            .unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_reveal_returns_plaintext_and_logs() {
        let pool = test_pool().await;
        let svc = KeyService::new(pool.clone());
        let game = seed_game(&pool, "Celeste").await;

        let admin_id = sqlx::query(
            "INSERT INTO users (email, username, password_hash, role) VALUES ('admin@x.com', 'admin', 'x', 'admin')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        svc.add_keys(AddKeysRequest {
            game_id: game,
            key_code: Some("AAAAA-BBBBB-CCCCC".to_string()),
            key_codes: vec![],
        })
        .await
        .unwrap();

        let (key_id,): (i64,) = sqlx::query_as("SELECT id FROM steam_keys LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();

        let revealed = svc.reveal(key_id, admin_id).await.unwrap();
        assert_eq!(revealed.key_code, "AAAAA-BBBBB-CCCCC");

        let (logged,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM key_reveal_log WHERE steam_key_id = ? AND admin_id = ?",
        )
        .bind(key_id)
        .bind(admin_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(logged, 1);
    }
}
