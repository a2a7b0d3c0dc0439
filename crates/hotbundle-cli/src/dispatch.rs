use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use hotbundle_core::{NoopStatsReporter, StatsReporter, VersionId};
use hotbundle_session::{HttpFetcher, HttpStatsReporter, UpdateSession};
use hotbundle_store::{
    BundleInstaller, CommandUnpacker, FilePointerStore, StoreLayout, VersionStore,
};
use tracing::debug;

use crate::config::CliConfig;
use crate::render::{current_output_style, format_pointer_lines, print_status, OutputStyle};
use crate::{Cli, Commands};

/// How long the process waits at exit for stats posts still in flight.
const STATS_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) struct Runtime {
    pub(crate) config: CliConfig,
    pub(crate) store: VersionStore,
    pub(crate) session: UpdateSession,
    pub(crate) stats: Arc<dyn StatsReporter>,
}

impl Runtime {
    pub(crate) fn from_config(config: CliConfig) -> Result<Self> {
        let layout = config.store_layout()?;
        let fetcher = Arc::new(HttpFetcher::new(config.http_timeout())?);
        let identity = config.device_identity(&layout)?;
        let reporter =
            HttpStatsReporter::new(fetcher.clone(), config.stats_url.clone(), identity);
        debug!(enabled = reporter.is_enabled(), "stats reporter configured");
        let stats: Arc<dyn StatsReporter> = if reporter.is_enabled() {
            Arc::new(reporter)
        } else {
            Arc::new(NoopStatsReporter)
        };

        let pointer = FilePointerStore::new(config.pointer_path(&layout));
        let installer = BundleInstaller::new(
            layout.clone(),
            Arc::new(CommandUnpacker::new(config.unpack_timeout())),
        );
        Ok(Self {
            store: VersionStore::new(layout, Arc::new(pointer), stats.clone()),
            session: UpdateSession::new(fetcher, installer),
            stats,
            config,
        })
    }

    /// Gives stats posts started by the command a bounded chance to finish.
    pub(crate) fn flush_stats(&self) -> bool {
        let flushed = self.stats.flush(STATS_FLUSH_TIMEOUT);
        if !flushed {
            debug!("stats posts still pending at exit");
        }
        flushed
    }

    fn layout(&self) -> &StoreLayout {
        self.store.layout()
    }

    fn metadata_url(&self, override_url: Option<String>) -> Result<String> {
        override_url
            .or_else(|| self.config.metadata_url.clone())
            .ok_or_else(|| anyhow!("no metadata url: pass --url or set metadata_url in config"))
    }
}

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let runtime = Runtime::from_config(config)?;
    let result = run_command(&runtime, cli.command, current_output_style());
    runtime.flush_stats();
    result
}

pub(crate) fn run_command(runtime: &Runtime, command: Commands, style: OutputStyle) -> Result<()> {
    match command {
        Commands::Check { url } => {
            let url = runtime.metadata_url(url)?;
            match runtime.session.fetch_latest(&url) {
                Some(latest) => {
                    print_status(style, "info", &format!("latest: {}", latest.version));
                    println!("url: {}", latest.url);
                }
                None => print_status(style, "info", "no update available"),
            }
        }
        Commands::Download { url } => {
            let id = runtime
                .session
                .download(&url)
                .ok_or_else(|| anyhow!("download failed: {url}"))?;
            report_downloaded(runtime, &id, style);
        }
        Commands::Update { url, activate } => {
            let url = runtime.metadata_url(url)?;
            let Some((latest, id)) = runtime.session.check_and_download(&url) else {
                print_status(style, "info", "no update installed");
                return Ok(());
            };
            report_downloaded(runtime, &id, style);
            if activate {
                activate_version(runtime, &id, &latest.version, style)?;
            }
        }
        Commands::List => {
            let current = runtime.store.current();
            for id in runtime.store.list() {
                let marker = if current.hot_path
                    == runtime.layout().hot_version_dir(&id).display().to_string()
                {
                    "*"
                } else {
                    " "
                };
                let state = if runtime.store.is_complete(&id) {
                    "complete"
                } else {
                    "incomplete"
                };
                println!("{marker} {id} {state}");
            }
        }
        Commands::Activate { id, name } => {
            let id = parse_version_id(&id)?;
            activate_version(runtime, &id, &name, style)?;
        }
        Commands::Delete { id, name } => {
            let id = parse_version_id(&id)?;
            if !runtime.store.delete(&id, &name) {
                return Err(anyhow!("version {id} was not fully deleted"));
            }
            print_status(style, "ok", &format!("deleted {id}"));
        }
        Commands::Reset => {
            runtime.store.reset();
            print_status(style, "ok", "reset to builtin content");
        }
        Commands::Current => {
            let current = runtime.store.current();
            for line in format_pointer_lines(&current) {
                println!("{line}");
            }
        }
        Commands::Paths => {
            let layout = runtime.layout();
            println!("hot: {}", layout.hot_versions_dir().display());
            println!("persist: {}", layout.persist_versions_dir().display());
            println!(
                "pointer: {}",
                runtime.config.pointer_path(layout).display()
            );
            println!("entry point: {}", layout.entry_point());
        }
    }

    Ok(())
}

fn parse_version_id(value: &str) -> Result<VersionId> {
    VersionId::parse(value).with_context(|| format!("invalid version id '{value}'"))
}

fn report_downloaded(runtime: &Runtime, id: &VersionId, style: OutputStyle) {
    if runtime.store.is_complete(id) {
        print_status(style, "ok", &format!("downloaded {id}"));
    } else {
        print_status(style, "warn", &format!("downloaded {id} but it is incomplete"));
    }
}

fn activate_version(
    runtime: &Runtime,
    id: &VersionId,
    name: &str,
    style: OutputStyle,
) -> Result<()> {
    if !runtime.store.activate(id, name) {
        return Err(anyhow!("version {id} is incomplete and was not activated"));
    }
    print_status(style, "ok", &format!("activated {id} as {name}"));
    Ok(())
}
