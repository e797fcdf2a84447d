mod session_file;
mod view;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telemed_client::{ApiClient, ExportRequest, Fetched, DEFAULT_API_URL};
use telemed_core::config::export_prefix_from_env_value;
use telemed_core::{
    CoreConfig, DateRange, DatasetKind, Directory, ExportFormat, ExportOptions, Exporter, ReportType,
    Selection, UserRole,
};

use view::{ListKind, ViewQuery};

#[derive(Parser)]
#[command(name = "telemed")]
#[command(about = "Telemed administration CLI")]
struct Cli {
    /// API base URL
    #[arg(long, env = "TELEMED_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Obtain a token and store the session
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List a resource with search, filters and paging
    List {
        #[arg(value_enum)]
        kind: ListKind,
        /// Case-insensitive text search
        #[arg(long, short, default_value = "")]
        search: String,
        /// Appointment status, or "all"
        #[arg(long, default_value = "all")]
        status: String,
        /// Feedback rating, or "all"
        #[arg(long, default_value = "all")]
        rating: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Dashboard headline figures
    Stats,
    /// Print a report as JSON
    Report {
        kind: DatasetKind,
        #[arg(long = "type", default_value = "all")]
        report_type: String,
        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from: Option<String>,
        /// End date, inclusive
        #[arg(long)]
        to: Option<String>,
    },
    /// Export a report to a file
    Export {
        kind: DatasetKind,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long = "type", default_value = "all")]
        report_type: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Omit the CSV header line
        #[arg(long)]
        no_headers: bool,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Let the server build the file instead of building it locally
        #[arg(long)]
        remote: bool,
    },
}

/// Entry point for the Telemed CLI.
///
/// # Environment Variables
/// - `TELEMED_API_URL`: API base URL (default: "http://127.0.0.1:3000/api")
/// - `TELEMED_SESSION_FILE`: where the login session is kept (default: ".telemed-session.json")
/// - `TELEMED_EXPORT_PREFIX`: prefix for locally built export files (default: "telemed")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telemed=warn".parse()?)
                .add_directive("telemed_client=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session_path =
        session_file::session_path_from_env_value(std::env::var("TELEMED_SESSION_FILE").ok());

    let mut client = ApiClient::new(&cli.api_url)?;
    if let Some(session) = session_file::load(&session_path)? {
        client = client.with_session(session);
    }

    match cli.command {
        Some(Commands::Login { username, password }) => {
            let session = client.login(&username, &password).await?;
            session_file::save(&session_path, &session)?;
            println!("Logged in as {}", session.username);
        }
        Some(Commands::Logout) => {
            client.logout();
            session_file::clear(&session_path)?;
            println!("Logged out");
        }
        Some(Commands::List {
            kind,
            search,
            status,
            rating,
            page,
            page_size,
        }) => {
            let query = ViewQuery {
                search,
                status: status.parse().unwrap_or_default(),
                rating: rating
                    .parse::<Selection<i32>>()
                    .with_context(|| format!("invalid rating {rating:?}"))?,
                page,
                page_size: page_size.unwrap_or_else(|| kind.default_page_size()),
            };
            let page = list_page(&client, kind, &query).await?;
            println!("{}", view::render_page(&page));
        }
        Some(Commands::Stats) => {
            let stats = client.stats().await?;
            println!("{}", view::render_stats(&stats));
        }
        Some(Commands::Report {
            kind,
            report_type,
            from,
            to,
        }) => {
            let report_type = ReportType::parse_for(kind, &report_type)?;
            let range = DateRange::parse(from.as_deref(), to.as_deref())?;
            let dataset = fresh(client.fetch_dataset(kind).await?)?;
            let results = dataset.report(report_type, &range, chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Some(Commands::Export {
            kind,
            format,
            report_type,
            from,
            to,
            no_headers,
            out_dir,
            remote,
        }) => {
            let path = if remote {
                let request = ExportRequest {
                    format,
                    report_type: Some(report_type),
                    from,
                    to,
                    include_headers: !no_headers,
                };
                let file = client.download_export(kind, &request).await?;
                let path = out_dir.join(&file.file_name);
                std::fs::write(&path, file.content)
                    .with_context(|| format!("writing {}", path.display()))?;
                path
            } else {
                let exporter = local_exporter(std::env::var("TELEMED_EXPORT_PREFIX").ok())?;
                let report_type = ReportType::parse_for(kind, &report_type)?;
                let range = DateRange::parse(from.as_deref(), to.as_deref())?;
                let dataset = fresh(client.fetch_dataset(kind).await?)?
                    .report(report_type, &range, chrono::Utc::now())?;
                let options = ExportOptions {
                    include_headers: !no_headers,
                };
                dataset.export(&exporter, format, options)?.write_to(&out_dir)?
            };
            println!("Exported {} to {}", kind.label(), path.display());
        }
        None => {
            println!("Use 'telemed --help' for commands");
        }
    }

    Ok(())
}

/// Exporter for locally built files, with the prefix checked the same way the server checks it.
fn local_exporter(prefix: Option<String>) -> anyhow::Result<Exporter> {
    let cfg = CoreConfig::new(export_prefix_from_env_value(prefix), false)
        .context("invalid TELEMED_EXPORT_PREFIX")?;
    Ok(cfg.exporter())
}

fn fresh<T>(fetched: Fetched<T>) -> anyhow::Result<T> {
    match fetched {
        Fetched::Fresh(value) => Ok(value),
        Fetched::Stale => bail!("response was overtaken by a newer request"),
    }
}

/// Fetches the list behind `kind` and the user directory its names resolve against.
async fn list_page(
    client: &ApiClient,
    kind: ListKind,
    query: &ViewQuery,
) -> anyhow::Result<telemed_core::Page<String>> {
    let users = fresh(client.list_users(None).await?)?;
    let directory = Directory::from_users(&users);

    Ok(match kind {
        ListKind::Appointments => {
            let items = fresh(client.list_appointments().await?)?;
            view::appointments_page(&items, query, &directory)
        }
        ListKind::Records => {
            let items = fresh(client.list_records().await?)?;
            view::records_page(&items, query, &directory)
        }
        ListKind::Reminders => {
            let items = fresh(client.list_reminders().await?)?;
            view::reminders_page(&items, query, &directory)
        }
        ListKind::Feedback => {
            let items = fresh(client.list_feedback().await?)?;
            view::feedback_page(&items, query, &directory)
        }
        ListKind::Patients => {
            let items = fresh(client.list_users(Some(UserRole::Patient)).await?)?;
            view::users_page(&items, query)
        }
        ListKind::Doctors => {
            let items = fresh(client.list_users(Some(UserRole::Doctor)).await?)?;
            view::users_page(&items, query)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_exporter_defaults_prefix() {
        assert_eq!(local_exporter(None).unwrap().prefix(), "telemed");
        assert_eq!(local_exporter(Some("  ".into())).unwrap().prefix(), "telemed");
        assert_eq!(local_exporter(Some("clinic_2".into())).unwrap().prefix(), "clinic_2");
    }

    #[test]
    fn test_local_exporter_rejects_path_like_prefix() {
        for bad in ["../x", "a/b", "dr smith"] {
            let err = local_exporter(Some(bad.into())).unwrap_err();
            assert!(err.to_string().contains("TELEMED_EXPORT_PREFIX"), "{bad}");
        }
    }
}
