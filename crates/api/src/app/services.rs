//! Startup composition: every store and auth collaborator is built once here
//! and shared by the handlers through `Extension(Arc<AppServices>)`.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use inkpost_auth::{
    AccessGate, BcryptPasswordHasher, Hs256JwtIssuer, Hs256JwtValidator, JwtIssuer, PasswordHasher,
};
use inkpost_infra::StoreLookup;
use inkpost_infra::store::{
    CommentStore, InMemoryCommentStore, InMemoryPostStore, InMemoryUserStore, PgCommentStore,
    PgPostStore, PgUserStore, PostStore, UserStore, postgres,
};

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub issuer: Arc<dyn JwtIssuer>,
    pub gate: AccessGate,
}

impl AppServices {
    /// Postgres stores when `DATABASE_URL` is configured, in-memory otherwise.
    pub async fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        match &config.database_url {
            Some(url) => Self::postgres(config, url).await,
            None => {
                tracing::info!("DATABASE_URL not set; using in-memory stores");
                Self::in_memory(config)
            }
        }
    }

    pub fn in_memory(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::assemble(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryPostStore::new()),
            Arc::new(InMemoryCommentStore::new()),
        )
    }

    pub async fn postgres(config: &ApiConfig, database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        postgres::migrate(&pool)
            .await
            .context("failed to apply schema migration")?;
        tracing::info!("connected to Postgres; schema up to date");

        Self::assemble(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgPostStore::new(pool.clone())),
            Arc::new(PgCommentStore::new(pool)),
        )
    }

    fn assemble(
        config: &ApiConfig,
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
    ) -> anyhow::Result<Self> {
        let lookup = Arc::new(StoreLookup::new(
            users.clone(),
            posts.clone(),
            comments.clone(),
        ));
        let secret = config.jwt_secret.as_bytes();
        let gate = AccessGate::new(
            Arc::new(Hs256JwtValidator::new(secret)),
            lookup.clone(),
            lookup,
        );
        Ok(Self {
            users,
            posts,
            comments,
            hasher: Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
            issuer: Arc::new(Hs256JwtIssuer::new(secret, config.token_ttl)),
            gate,
        })
    }
}
