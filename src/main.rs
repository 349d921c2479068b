//! Entry point for the Payroll Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the payroll
//! engine.  The finance settings file is named by
//! `PAYROLL_SETTINGS_PATH` (default `config/finance_settings.json`), the
//! optional holidays file by `PAYROLL_HOLIDAYS_PATH`, and the listen
//! address by `PAYROLL_BIND_ADDR`.  Variables may also be set in a
//! `.env` file.

use payroll_engine::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payroll_engine=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(settings = %config.settings_path.display(), "starting payroll engine");

    payroll_engine::api::serve(config).await.map_err(|err| {
        tracing::error!("error running server: {err:#}");
        err
    })
}
