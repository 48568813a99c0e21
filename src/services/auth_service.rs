use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{JwtService, hash_password, validate_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// Make sure the bootstrap admin from config exists. Runs at startup;
    /// an existing account is left untouched.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<()> {
        let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password)?;
        sqlx::query("INSERT INTO users (email, username, password_hash, role) VALUES (?, ?, ?, 'admin')")
            .bind(email)
            .bind("admin")
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        log::info!("Bootstrap admin account created: {email}");
        Ok(())
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        if !email.contains('@') || email.len() < 5 {
            return Err(AppError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        let username_len = request.username.chars().count();
        if username_len < 2 || username_len > 20 {
            return Err(AppError::ValidationError(
                "Username length must be between 2 and 20 characters".to_string(),
            ));
        }
        validate_password(&request.password)?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let result = sqlx::query(
            "INSERT INTO users (email, username, password_hash, role) VALUES (?, ?, ?, 'customer')",
        )
        .bind(&email)
        .bind(&request.username)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        let user = self.get_user(result.last_insert_rowid()).await?;
        log::info!("New user registered: {} ({})", user.email, user.id);
        self.auth_response(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid email or password".to_string(),
            ));
        }

        self.auth_response(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        // Role is re-read from the database, not trusted from the old token
        let user = self.get_user(user_id).await?;
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.role.to_string())?;

        Ok(RefreshResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn profile(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(UserResponse::from(self.get_user(user_id).await?))
    }

    fn auth_response(&self, user: User) -> AppResult<AuthResponse> {
        let role = user.role.to_string();
        let access_token = self.jwt_service.generate_access_token(user.id, &role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &role)?;
        let expires_in = self.jwt_service.get_access_token_expires_in();

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;

    fn service(pool: DbPool) -> AuthService {
        AuthService::new(pool, JwtService::new("test-secret", 3600, 7200))
    }

    #[tokio::test]
    async fn test_register_login_roundtrip() {
        let svc = service(test_pool().await);

        let auth = svc
            .register(RegisterRequest {
                email: "Gamer@Example.com".to_string(),
                username: "gamer".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(auth.user.email, "gamer@example.com");
        assert_eq!(auth.user.role, Role::Customer);

        let again = svc
            .register(RegisterRequest {
                email: "gamer@example.com".to_string(),
                username: "other".to_string(),
                password: "Password123".to_string(),
            })
            .await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));

        let login = svc
            .login(LoginRequest {
                email: "gamer@example.com".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, auth.user.id);

        let bad = svc
            .login(LoginRequest {
                email: "gamer@example.com".to_string(),
                password: "WrongPassword1".to_string(),
            })
            .await;
        assert!(matches!(bad, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_username_length_counts_characters_not_bytes() {
        let svc = service(test_pool().await);

        // Two CJK characters are six bytes but still a valid two-char name
        let ok = svc
            .register(RegisterRequest {
                email: "cjk@example.com".to_string(),
                username: "游戏".to_string(),
                password: "Password123".to_string(),
            })
            .await;
        assert!(ok.is_ok());

        let too_short = svc
            .register(RegisterRequest {
                email: "short@example.com".to_string(),
                username: "游".to_string(),
                password: "Password123".to_string(),
            })
            .await;
        assert!(matches!(too_short, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let svc = service(test_pool().await);

        svc.ensure_admin("admin@keyshop.local", "Admin12345")
            .await
            .unwrap();
        svc.ensure_admin("admin@keyshop.local", "OtherPass123")
            .await
            .unwrap();

        let login = svc
            .login(LoginRequest {
                email: "admin@keyshop.local".to_string(),
                password: "Admin12345".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.role, Role::Admin);
    }
}
