use clap::Parser;
use log::{LevelFilter, info, warn};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use sidebar_common::{
    config::Config,
    controller::SidebarController,
    model::{Division, Permissions, View},
    portal::PortalClient,
    storage::FileStorage,
};
use std::{path::PathBuf, time::Instant};

mod menu;
mod render;

const APP_NAME: &str = "team-sidebar";
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long)]
    /// Dashboard base URL, overrides the config file
    url: Option<String>,

    #[clap(long)]
    /// API token sent as a bearer token, overrides the config file
    token: Option<String>,

    #[clap(long)]
    /// Don't require HTTPS to connect to the dashboard
    allow_http: bool,

    #[clap(long)]
    /// Enable the admin-only division and past season filters
    admin: bool,

    #[clap(long)]
    /// View to show, e.g. `all`, `manage`, `play`, `division`, `past_seasons`
    view: Option<String>,

    #[clap(long)]
    /// Division to filter the `division` view by
    division: Option<String>,

    #[clap(long)]
    /// Past season ID to show in the `past_seasons` view
    season: Option<u64>,

    #[clap(long, short)]
    /// Keep running with a menu after printing the sidebar
    interactive: bool,

    #[clap(long)]
    /// File that keeps the view and filter choices between runs
    session_file: Option<PathBuf>,
}

fn default_session_path() -> Option<PathBuf> {
    let mut path = directories::BaseDirs::new()?.data_local_dir().to_path_buf();
    path.push(APP_NAME);
    path.push(SESSION_FILE_NAME);
    Some(path)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    #[cfg(not(target_os = "windows"))]
    let console_target = Target::Stderr;
    #[cfg(target_os = "windows")]
    let console_target = Target::Stdout; // Windows apps don't get a stderr handle
    let console = ConsoleAppender::builder()
        .target(console_target)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    // Setup the logging from all locations to use `LevelFilter::Error`
    let root = Root::builder().appender("console");
    let root = root.build(LevelFilter::Error);

    // Setup the top level logging config
    let log_config =
        LogConfig::builder().appender(Appender::builder().build("console", Box::new(console)));

    let log_config = log_config
        .logger(Logger::builder().build("team_sidebar", log_level)) // Setup the logging from this app to use `log_level`
        .logger(Logger::builder().build("sidebar_common", log_level))
        .build(root)?;

    log4rs::init_config(log_config)?;
    if args.verbose > 0 {
        log_panics::init();
    }

    match confy::get_configuration_file_path(APP_NAME, None) {
        Ok(path) => info!("Reading config file from {path:?}"),
        Err(e) => warn!("Could not determine the config file path: {e}"),
    }

    let mut config: Config = match confy::load(APP_NAME, None) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file, overwriting with default. Error: {e}");
            let config = Config::default();
            if let Err(e) = confy::store(APP_NAME, None, &config) {
                warn!("Failed to write the default config file: {e}");
            }
            config
        }
    };

    if let Some(url) = args.url {
        config.portal.url = url;
    }
    if let Some(token) = args.token {
        config.portal.token = token;
    }
    if args.allow_http {
        config.portal.require_https = false;
    }
    if args.admin {
        config.sidebar.is_admin = true;
    }

    let session_path = args
        .session_file
        .or(config.sidebar.session_file.clone())
        .or_else(default_session_path)
        .ok_or("Could not find a directory to store the session file")?;
    info!("Using session file {}", session_path.display());

    info!("Using URL: {}", config.portal.url);
    let client = PortalClient::new(
        &config.portal.url,
        config.portal.token(),
        config.portal.require_https,
        config.portal.timeout(),
    )?;

    let permissions = Permissions {
        is_admin: config.sidebar.is_admin,
    };
    let mut controller =
        SidebarController::new(client, FileStorage::open(&session_path), permissions)
            .with_cache_ttl(config.sidebar.cache_ttl());

    controller.initialize().await;

    if let Some(view) = args.view {
        controller
            .select_view(View::from_value(&view), Instant::now())
            .await;
    } else {
        controller.load(Instant::now()).await;
    }

    if let Some(name) = args.division {
        match Division::from_name(&name) {
            Some(division) => {
                controller
                    .select_division(Some(division), Instant::now())
                    .await
            }
            None => warn!("Unknown division '{name}', showing all divisions"),
        }
    }

    if let Some(season_id) = args.season {
        controller
            .select_past_season(Some(season_id), Instant::now())
            .await;
    }

    render::print_sidebar(controller.panel());

    if args.interactive {
        menu::run(&mut controller).await;
    }

    Ok(())
}
