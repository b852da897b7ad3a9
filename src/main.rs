use std::{ffi::OsStr, path::PathBuf};

use clap::{Parser, Subcommand};
use pisskaland_launcher::{
    auth::LaunchOptions,
    file::Hierarchy,
    install::Installer,
    process::{launch_command, run},
    progress::{BarReporter, ConsoleReporter},
    resources::Endpoints,
    settings::LauncherSettings,
    update::{check_update, UpdateStatus},
    versions::{installed_versions, load_version, select_version},
    Error,
};
use reqwest::Client;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Settings file, created with defaults when missing
    #[clap(long, default_value = "config.json")]
    config: PathBuf,
    /// Game directory, overrides the settings
    #[clap(long)]
    dir: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install Minecraft with the Fabric loader
    Install {
        #[clap(long)]
        minecraft_version: Option<String>,
        #[clap(long)]
        loader_version: Option<String>,
        #[clap(long)]
        concurrency: Option<usize>,
        /// Draw a progress bar instead of printing counts
        #[clap(long)]
        progress_bar: bool,
    },
    /// Launch the newest installed version matching the settings
    Launch {
        username: Option<String>,
        #[clap(long)]
        minecraft_version: Option<String>,
        #[clap(long)]
        loader: Option<String>,
        #[clap(long)]
        java: Option<String>,
    },
    /// List installed versions
    Versions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = LauncherSettings::load_or_create(&args.config).await?;
    let hierarchy = Hierarchy::new(
        args.dir
            .unwrap_or_else(|| PathBuf::from(&settings.game_dir)),
    );

    if let Some(update_url) = settings.update_url.clone() {
        match check_update(&Client::new(), update_url, &settings.version).await {
            Ok(UpdateStatus::Available { latest }) => {
                eprintln!("Launcher {latest} is available, this is {}", settings.version)
            }
            Ok(UpdateStatus::UpToDate) => {}
            Err(err) => warn!(%err, "Update check failed"),
        }
    }

    match args.command {
        Commands::Install {
            minecraft_version,
            loader_version,
            concurrency,
            progress_bar,
        } => {
            let minecraft_version = minecraft_version.unwrap_or(settings.minecraft_version);
            let loader_version = loader_version.or(settings.loader_version);
            let installer = Installer::new(Client::new(), hierarchy, Endpoints::official()?)
                .with_concurrency(concurrency.unwrap_or(settings.concurrency));

            let loader_version = loader_version.as_deref();
            let id = if progress_bar {
                let mut reporter = BarReporter::new();
                let id = installer
                    .install_fabric(&minecraft_version, loader_version, &mut reporter)
                    .await?;
                reporter.finish();
                id
            } else {
                let mut reporter = ConsoleReporter::stdout();
                installer
                    .install_fabric(&minecraft_version, loader_version, &mut reporter)
                    .await?
            };
            println!("Installed {id}");
        }
        Commands::Launch {
            username,
            minecraft_version,
            loader,
            java,
        } => {
            if let Some(minecraft_version) = minecraft_version {
                settings.minecraft_version = minecraft_version;
            }
            if let Some(loader) = loader {
                settings.loader = loader;
            }
            let username = username
                .or_else(|| Some(settings.nick_name.clone()).filter(|name| !name.is_empty()))
                .ok_or(Error::MissingUsername)?;
            let java = java.unwrap_or_else(|| settings.java.clone());

            let versions = installed_versions(&hierarchy).await?;
            let filter = settings.version_filter();
            let selected = select_version(&versions, &filter).ok_or_else(|| {
                Error::NoMatchingVersion(filter.iter().map(|term| term.to_string()).collect())
            })?;
            let version = load_version(&hierarchy, &selected.id).await?;

            let options = LaunchOptions::offline(&username);
            let command = launch_command(&hierarchy, &version, &options, OsStr::new(&java))?;
            run(command).await?;
        }
        Commands::Versions => {
            for version in installed_versions(&hierarchy).await? {
                match &version.inherits_from {
                    Some(parent) => println!("{} (inherits {})", version.id, parent),
                    None => println!("{}", version.id),
                }
            }
        }
    }
    Ok(())
}
