pub mod app_config;
pub mod database;
pub mod pg_store;
pub mod redis_repo;
pub mod mailer;

pub use app_config::Config;
pub use database::DbClient;
pub use mailer::{LogNotifier, SmtpNotifier};
pub use pg_store::PgStore;
pub use redis_repo::RedisClient;
