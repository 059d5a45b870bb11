use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use hierarchy_explorer::config::{ExplorerSettings, LOG_FILE_NAME};
use hierarchy_explorer::expansion::{ExpansionState, NodeKey};
use hierarchy_explorer::explorer::Explorer;
use hierarchy_explorer::hierarchy::full_expansion;
use hierarchy_explorer::model::ViewMode;
use hierarchy_explorer::render;
use hierarchy_explorer::server::run_http_server;

#[derive(Debug, Parser)]
#[command(
    name = "hierarchy_explorer",
    about = "Explore how users, user groups, and roles connect"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the hierarchy below one root.
    Tree {
        #[arg(long, default_value = "user")]
        view: ViewMode,
        #[arg(long)]
        root: String,
        /// Node key to expand, e.g. `UserGroup:ug-1`. Repeatable.
        #[arg(long = "expand")]
        expand: Vec<NodeKey>,
        #[arg(long)]
        expand_all: bool,
        #[arg(long)]
        json: bool,
    },
    /// List root candidates whose name contains the query.
    Search {
        #[arg(long, default_value = "user")]
        view: ViewMode,
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Count entities and links.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Verify every reference is symmetric and resolves.
    Check,
    /// Role → user group → users drill-down.
    Drilldown {
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Serve the explorer over HTTP.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = ExplorerSettings::from_env().context("failed to load configuration")?;
    let _file_log_guard = init_tracing(&settings)?;

    let mut explorer = Explorer::new(settings.load_store()?);

    match cli.command {
        Commands::Tree {
            view,
            root,
            expand,
            expand_all,
            json,
        } => {
            let kind = view.root_kind();
            let expansion = if expand_all {
                full_expansion(explorer.store(), kind, &root)?
            } else {
                expand.into_iter().collect::<ExpansionState>()
            };
            let tree = explorer.build_hierarchy(kind, &root, &expansion)?;
            emit(json, &tree, render::render_tree)?;
        }
        Commands::Search { view, query, json } => {
            let matches = explorer.filter_by_name(view.root_kind(), &query);
            emit(json, &matches, |matches| render::render_entities(matches))?;
        }
        Commands::Stats { json } => emit(json, &explorer.stats(), render::render_stats)?,
        Commands::Check => {
            let violations = explorer.integrity_violations();
            print!("{}", render::render_violations(&violations));
            if !violations.is_empty() {
                bail!("store has {} integrity violation(s)", violations.len());
            }
        }
        Commands::Drilldown {
            role,
            group,
            query,
            json,
        } => {
            if let Some(role) = role.as_deref() {
                explorer.select_drilldown_role(role)?;
            }
            if let Some(group) = group.as_deref() {
                explorer.select_drilldown_group(group)?;
            }
            let view = explorer.drilldown_view(&query)?;
            emit(json, &view, render::render_drilldown)?;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind_addr.clone());
            run_http_server(explorer, &bind).await?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, render_text: impl Fn(&T) -> String) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(value).context("failed to serialize JSON output")?;
        println!("{rendered}");
    } else {
        print!("{}", render_text(value));
    }
    Ok(())
}

fn init_tracing(settings: &ExplorerSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hierarchy_explorer=debug"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    let (file_layer, guard) = match &settings.log_dir {
        Some(log_dir) => {
            let file_filter = EnvFilter::try_new(&settings.file_log_filter).with_context(|| {
                format!(
                    "failed to parse HIERARCHY_FILE_LOG `{}`",
                    settings.file_log_filter
                )
            })?;
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(guard)
}
