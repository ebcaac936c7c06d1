use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use std::io;
use std::sync::Arc;

use todoforge::auth::{PasswordHasher, RedisRevocationStore, RevocationPolicy, TokenService};
use todoforge::config::Config;
use todoforge::routes;
use todoforge::state::AppState;
use todoforge::store::PgStore;

fn startup_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

fn cors(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let store = PgStore::connect(&config.database_url, config.store_timeout)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    store
        .migrate()
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    info!("Database migrations applied");
    let store = Arc::new(store);

    let revocations = RedisRevocationStore::new(&config.redis_url, config.store_timeout)
        .map_err(|e| startup_error("Invalid revocation store configuration", e))?;
    let hasher = PasswordHasher::new(config.bcrypt_cost)
        .map_err(|e| startup_error("Failed to initialise password hasher", e))?;
    let tokens = TokenService::new(
        config.jwt_secret.as_bytes(),
        config.token_lifetime,
        config.token_leeway,
    );
    let policy = RevocationPolicy {
        ttl: config.revocation_ttl,
        cover_token_lifetime: config.revocation_covers_token_lifetime,
    };
    if !policy.cover_token_lifetime && policy.ttl < config.token_lifetime {
        warn!(
            "Revocation TTL ({}s) is shorter than the token lifetime ({}s); revoked tokens can become valid again",
            policy.ttl.as_secs(),
            config.token_lifetime.as_secs()
        );
    }

    let state = web::Data::new(AppState::new(
        store.clone(),
        store,
        Arc::new(revocations),
        hasher,
        tokens,
        policy,
    ));
    let allowed_origin = config.allowed_origin.clone();

    info!("Starting todoforge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(allowed_origin.as_deref()))
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
