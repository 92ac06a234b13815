use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};

use sonata_admin::{
    admin_tui::{run_tui, AppContext},
    api::{ApiClient, ApiResponse, ResourceApi},
    catalog,
    cli::{self, Cli, Commands},
    config::Config,
    dashboard::{load_summary, SUMMARY_RESOURCES},
    models::ListQuery,
    notify::NotificationQueue,
    prefs::Preferences,
    table::apply_filters,
};

/// Console and file logging; the TUI logs to the file only so the screen
/// stays intact
fn init_logging(tui: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "sonata-admin.log");
    let console = (!tui).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    tracing_subscriber::registry()
        .with(console)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "sonata_admin=info");
    }

    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Tui));

    let config = Config::from_env()?;
    config.validate()?;
    let mut prefs = Preferences::load(&config.prefs_path)?;

    let notifications = NotificationQueue::new();
    let api = ApiClient::new(&config, notifications.clone())?.with_token(prefs.session_token.clone());

    match cli.command {
        Commands::List {
            resource,
            page,
            per_page,
            filters,
            csv,
        } => {
            let resource = Commands::parse_resource(&resource)?;
            let spec = catalog::spec(resource);
            let filters = cli::parse_filters(&spec, &filters)?;
            let query = ListQuery::new(page, per_page.unwrap_or(config.results_per_page));

            info!("Listing {} page {}", resource.as_str(), query.page);
            let response = api.silent().list(resource, &query).await;
            let pagination = response.pagination().cloned();
            let rows = match response {
                ApiResponse::Failed(failed) => {
                    error!("Listing {} failed: {}", resource.as_str(), failed.message);
                    bail!("Listing {} failed: {}", resource.as_str(), failed.message);
                }
                response => response.into_rows().unwrap_or_default(),
            };
            let visible = apply_filters(&rows, &filters);

            if csv {
                cli::write_csv(io::stdout(), &spec.columns, &rows, &visible)?;
            } else {
                print!("{}", cli::format_table(&spec.columns, &rows, &visible));
                println!();
                match pagination {
                    Some(p) => println!(
                        "Showing {} of {} rows, page {}/{} ({} total)",
                        visible.len(),
                        rows.len(),
                        p.current_page,
                        p.total_pages,
                        p.total_results
                    ),
                    None => println!("Showing {} of {} rows", visible.len(), rows.len()),
                }
            }
        }

        Commands::Delete { resource, ids } => {
            let resource = Commands::parse_resource(&resource)?;
            info!("Deleting {} {:?}", resource.as_str(), ids);

            match api.silent().delete(resource, ids.clone()).await {
                ApiResponse::Failed(failed) => {
                    error!("Delete failed: {}", failed.message);
                    bail!("Delete failed: {}", failed.message);
                }
                _ => println!("Deleted {} record(s) from {}", ids.len(), resource.as_str()),
            }
        }

        Commands::Login { email, password } => match api.silent().login(&email, &password).await {
            ApiResponse::Failed(failed) => {
                error!("Login failed: {}", failed.message);
                bail!("Login failed: {}", failed.message);
            }
            response => {
                let Some(session) = response.into_rows().and_then(|rows| rows.into_iter().next()) else {
                    bail!("Login response carried no session");
                };
                prefs.session_token = Some(session.token);
                prefs.save(&config.prefs_path)?;
                println!("Signed in as {}", email);
            }
        },

        Commands::Logout => {
            if prefs.session_token.take().is_some() {
                prefs.save(&config.prefs_path)?;
                println!("Signed out");
            } else {
                println!("No stored session");
            }
        }

        Commands::Summary => {
            let silent = api.silent();
            for tile in load_summary(&silent, &SUMMARY_RESOURCES).await {
                println!("{:<28} {}", tile.resource.as_str(), tile.display());
            }
        }

        Commands::Theme { dark, light } => {
            if dark || light {
                prefs.dark = dark;
                prefs.save(&config.prefs_path)?;
            }
            println!("Theme: {}", if prefs.dark { "dark" } else { "light" });
        }

        Commands::Tui => {
            info!("Launching TUI interface");
            let ctx = AppContext {
                config,
                api,
                notifications,
                prefs,
            };
            if let Err(e) = run_tui(ctx).await {
                error!("TUI failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
