//! Store and service wiring.
//!
//! With `DATABASE_URL` set, products, orders and users live in Postgres;
//! otherwise everything is kept in memory. Login codes are always in memory.

use std::sync::Arc;

use tracing::info;

use storefront_auth::Hs256Jwt;
use storefront_infra::accounts::AccountService;
use storefront_infra::catalog::CatalogService;
use storefront_infra::mailer::{LogMailer, OtpMailer};
use storefront_infra::order_workflow::OrderWorkflow;
use storefront_infra::store::{
    InMemoryOrderStore, InMemoryOtpStore, InMemoryProductStore, InMemoryUserStore, OrderStore,
    PostgresStore, ProductStore, UserStore,
};
use storefront_infra::AppConfig;

pub struct AppServices {
    pub catalog: CatalogService,
    pub orders: OrderWorkflow,
    pub accounts: AccountService,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    /// Build services for `config`, connecting to Postgres when configured.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let mailer: Arc<dyn OtpMailer> = Arc::new(LogMailer);

        match &config.database_url {
            Some(url) => {
                let pg = Arc::new(PostgresStore::connect(url).await?);
                info!(stock_mode = %config.stock_mode, "using postgres stores");
                Ok(Self::assemble(config, pg.clone(), pg.clone(), pg, mailer))
            }
            None => Ok(Self::in_memory(config, mailer)),
        }
    }

    /// Fully in-memory wiring with a caller-chosen mailer.
    pub fn in_memory(config: &AppConfig, mailer: Arc<dyn OtpMailer>) -> Self {
        info!(stock_mode = %config.stock_mode, "using in-memory stores");
        Self::assemble(
            config,
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryUserStore::new()),
            mailer,
        )
    }

    fn assemble(
        config: &AppConfig,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn OtpMailer>,
    ) -> Self {
        let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl));

        let accounts = AccountService::new(
            users.clone(),
            Arc::new(InMemoryOtpStore::new()),
            mailer,
            jwt.clone(),
        )
        .with_otp_policy(config.otp_ttl, config.otp_max_attempts)
        .with_admin_emails(config.admin_emails.clone());

        Self {
            catalog: CatalogService::new(products.clone()),
            orders: OrderWorkflow::new(products, orders, users, config.stock_mode),
            accounts,
            jwt,
        }
    }
}
