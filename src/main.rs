#![forbid(unsafe_code)]

use std::process;

use anyhow::Context;
use clap::Parser;
use impulstrip_admin::config::{self, Cli, Command, DoctorCommand, ServerConfig};
use impulstrip_admin::doctor::{Doctor, Report};
use impulstrip_admin::request::ReqwestHttpClient;
use impulstrip_admin::server;
use impulstrip_admin::{TRACING_TARGET_DOCTOR, TRACING_TARGET_SERVER_STARTUP};
use impulstrip_admin_shared::AppConfig;
use impulstrip_admin_shared::routing::RoutingTable;

#[tokio::main]
async fn main() {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();
    config::init_tracing();

    let code = match run().await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_STARTUP,
                error = format!("{error:#}"),
                "Command failed"
            );
            1
        }
    };
    process::exit(code);
}

/// 返回 `false` 表示诊断发现了错误
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let app = config::load_app_config().context("Invalid backend configuration")?;

    match cli.command {
        Command::Serve(server_config) => {
            serve(server_config, &app).await?;
            Ok(true)
        }
        Command::Doctor { timeout, check } => {
            doctor(check, std::time::Duration::from_secs(timeout), &app).await
        }
    }
}

async fn serve(server_config: ServerConfig, app: &AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Starting ImpulsTrip admin server"
    );

    let router = server::router(&server_config, app)?;
    server::serve_http(router, server_config).await?;
    Ok(())
}

async fn doctor(
    check: DoctorCommand,
    timeout: std::time::Duration,
    app: &AppConfig,
) -> anyhow::Result<bool> {
    let http = ReqwestHttpClient::new(timeout)?;
    let doctor = Doctor::new(http, RoutingTable::from_config(&app.api));

    tracing::info!(
        target: TRACING_TARGET_DOCTOR,
        primary_url = %app.api.primary_url,
        secondary_url = %app.api.secondary_url,
        "Running diagnostics"
    );

    let healthy = match check {
        DoctorCommand::Ping => {
            let reports = doctor.ping().await;
            reports.log();
            !reports.has_errors()
        }
        DoctorCommand::Cors { url, origin } => {
            let url = url.unwrap_or_else(|| doctor.default_cors_url());
            let report = doctor
                .cors(&url, &origin)
                .await
                .context("CORS check could not reach the server")?;
            report.log();
            !report.has_errors()
        }
        DoctorCommand::Endpoints { token } => {
            let probes = doctor.endpoints(token.as_deref()).await;
            probes.log();
            !probes.has_errors()
        }
        DoctorCommand::Login { username, password } => {
            let report = doctor.login(&username, &password).await?;
            report.log();
            !report.has_errors()
        }
    };

    Ok(healthy)
}
