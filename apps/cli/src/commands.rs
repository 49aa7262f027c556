//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use plugindoc_core::{
    DocsContext, Macro, ProgressReporter, expand_macros, generate_pages, generate_redirects,
    list_plugins, write_demos,
};
use plugindoc_redirects::RedirectSettings;
use plugindoc_shared::{AppConfig, config_dir, init_config, load_config};
use plugindoc_storage::Cache;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// plugindoc: plugin documentation fragments and docs redirects.
#[derive(Parser)]
#[command(
    name = "plugindoc",
    version,
    about = "Render jsPsych plugin documentation from TypeDoc output and write docs redirects.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./plugindoc.toml, then ~/.plugindoc/plugindoc.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the parameter table of a plugin.
    Params {
        /// Plugin short name (e.g. html-keyboard-response).
        plugin: String,
    },

    /// Print the summary paragraph of a plugin.
    Summary { plugin: String },

    /// Print the version/author badges of a plugin.
    Meta { plugin: String },

    /// Print the install section of a plugin.
    Install { plugin: String },

    /// Print the generated-data table of a plugin.
    Data { plugin: String },

    /// Render complete plugin pages.
    Page {
        /// Plugins to render.
        plugins: Vec<String>,

        /// Render every plugin package in the project.
        #[arg(long, conflicts_with = "plugins")]
        all: bool,

        /// Write `<name>.md` files into this directory instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write the demo pages of the examples sections into this directory.
        #[arg(short = 'd', long)]
        demos_output: Option<PathBuf>,
    },

    /// Expand plugin macros in a Markdown file.
    Expand {
        /// Markdown source file.
        file: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List plugin packages of the project.
    List,

    /// Write redirect stubs from the old docs tree to the new one.
    Redirects {
        /// Old docs tree (overrides config).
        #[arg(long)]
        old: Option<PathBuf>,

        /// New docs tree (overrides config).
        #[arg(long)]
        new: Option<PathBuf>,

        /// Output directory for stubs (overrides config).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Cache maintenance.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Remove every entry.
    Clear,
    /// Remove expired entries.
    Purge,
    /// Show entry counts.
    Stats,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults into the current directory.
    Init {
        /// Write to ~/.plugindoc instead.
        #[arg(long)]
        home: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "plugindoc=info",
        1 => "plugindoc=debug",
        _ => "plugindoc=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr; stdout carries the rendered Markdown.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Params { plugin } => cmd_fragment(config_path, Macro::Parameters, &plugin).await,
        Command::Summary { plugin } => cmd_fragment(config_path, Macro::Summary, &plugin).await,
        Command::Meta { plugin } => cmd_fragment(config_path, Macro::Meta, &plugin).await,
        Command::Install { plugin } => cmd_fragment(config_path, Macro::Install, &plugin).await,
        Command::Data { plugin } => cmd_fragment(config_path, Macro::Data, &plugin).await,
        Command::Page {
            plugins,
            all,
            out,
            demos_output,
        } => cmd_page(config_path, plugins, all, out.as_deref(), demos_output.as_deref()).await,
        Command::Expand { file, out } => cmd_expand(config_path, &file, out.as_deref()).await,
        Command::List => cmd_list(config_path),
        Command::Redirects { old, new, out } => cmd_redirects(config_path, old, new, out),
        Command::Cache { action } => cmd_cache(config_path, action).await,
        Command::Config { action } => match action {
            ConfigAction::Init { home } => cmd_config_init(home),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

async fn open_context(config_path: Option<&Path>) -> Result<DocsContext> {
    let config = load_config(config_path)?;
    Ok(DocsContext::open(config).await?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fragment(config_path: Option<&Path>, kind: Macro, plugin: &str) -> Result<()> {
    let ctx = open_context(config_path).await?;
    info!(plugin, fragment = kind.name(), "rendering fragment");
    print!("{}", kind.render(&ctx, plugin).await?);
    Ok(())
}

async fn cmd_page(
    config_path: Option<&Path>,
    plugins: Vec<String>,
    all: bool,
    out: Option<&Path>,
    demos_dir: Option<&Path>,
) -> Result<()> {
    let ctx = open_context(config_path).await?;
    let names = if all {
        list_plugins(ctx.config())?
    } else {
        plugins
    };
    if names.is_empty() {
        return Err(eyre!("no plugins given: pass plugin names or --all"));
    }

    match out {
        Some(dir) => {
            let reporter = CliProgress::new();
            let result = generate_pages(&ctx, &names, dir, demos_dir, &reporter).await?;

            println!();
            println!("  Pages:  {}", result.written.len());
            println!("  Demos:  {}", result.demos.len());
            println!("  Path:   {}", dir.display());
            println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
            println!();
        }
        None => {
            if let Some(dir) = demos_dir {
                std::fs::create_dir_all(dir)?;
            }
            for name in &names {
                let page = ctx.plugin_page(name).await?;
                println!("{}", page.markdown);
                if let Some(dir) = demos_dir {
                    for path in write_demos(dir, &page.demos)? {
                        info!(path = %path.display(), "demo written");
                    }
                }
            }
        }
    }
    Ok(())
}

async fn cmd_expand(config_path: Option<&Path>, file: &Path, out: Option<&Path>) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let ctx = open_context(config_path).await?;
    let expanded = expand_macros(&ctx, &source).await?;

    match out {
        Some(path) => {
            std::fs::write(path, expanded)
                .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;
            info!(path = %path.display(), "wrote expanded file");
        }
        None => print!("{expanded}"),
    }
    Ok(())
}

fn cmd_list(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    for name in list_plugins(&config)? {
        println!("{name}");
    }
    Ok(())
}

fn cmd_redirects(
    config_path: Option<&Path>,
    old: Option<PathBuf>,
    new: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(old) = old {
        config.redirects.old_dir = old;
    }
    if let Some(new) = new {
        config.redirects.new_dir = new;
    }
    if let Some(out) = out {
        config.redirects.output_dir = out;
    }

    let settings = RedirectSettings::from_config(&config.project.root, &config.redirects);
    let reporter = CliProgress::new();
    let report = generate_redirects(&settings, &reporter)?;

    println!();
    println!("  Written:  {}", report.written);
    println!("  Renamed:  {}", report.renamed);
    println!("  Fallback: {}", report.fallback);
    println!();
    Ok(())
}

async fn cmd_cache(config_path: Option<&Path>, action: CacheAction) -> Result<()> {
    let config = load_config(config_path)?;
    let path = config.resolve(&config.cache.path);
    if !path.exists() {
        println!("No cache at {}", path.display());
        return Ok(());
    }
    let cache = Cache::open(&path).await?;

    match action {
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            println!("Removed {removed} cache entries");
        }
        CacheAction::Purge => {
            let removed = cache.purge_expired().await?;
            println!("Removed {removed} expired cache entries");
        }
        CacheAction::Stats => {
            let stats = cache.stats().await?;
            println!("  Path:    {}", path.display());
            println!("  Entries: {}", stats.total);
            println!("  Expired: {}", stats.expired);
            for (operation, count) in &stats.by_operation {
                println!("  {operation}: {count}");
            }
        }
    }
    Ok(())
}

fn cmd_config_init(home: bool) -> Result<()> {
    let dir = if home {
        config_dir()?
    } else {
        std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))?
    };
    let path = init_config(&dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(name.to_string());
    }

    fn item_done(&self, item: &str, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
        self.bar.set_message(item.to_string());
    }

    fn done(&self, summary: &str) {
        self.bar.finish_and_clear();
        info!("{summary}");
    }
}
