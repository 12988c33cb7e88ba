//! `db` subcommands. Only meaningful with `DROPWATCH_STORE_BACKEND=postgres`
//! or an explicit `DATABASE_URL`.

pub(crate) async fn run_migrate(config: &dropwatch_core::AppConfig) -> anyhow::Result<()> {
    let pool = dropwatch_db::connect_pool_from_config(config).await?;
    let applied = dropwatch_db::run_migrations(&pool).await?;
    println!("migrations applied: {applied}");
    pool.close().await;
    Ok(())
}

pub(crate) async fn run_ping(config: &dropwatch_core::AppConfig) -> anyhow::Result<()> {
    let pool = dropwatch_db::connect_pool_from_config(config).await?;
    dropwatch_db::ping(&pool).await?;
    println!("database: ok");
    pool.close().await;
    Ok(())
}
