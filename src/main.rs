//! CLI entry point for `mailscribe`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailscribe::assistant::Assistant;
use mailscribe::completion::SummaryStyle;
use mailscribe::config::{self, Config, ModelConfig};
use mailscribe::extract::{decode_text_bytes, extract_message_text, html_to_text};
use mailscribe::host::{is_html_path, ComposeSink, FileHost};

#[derive(Parser)]
#[command(
    name = "mailscribe",
    version,
    about = "Draft email replies and summaries with a language model"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft a reply and splice it into a compose body (.html/.htm or plain text)
    Reply {
        compose: PathBuf,
        /// Extra instruction for the model
        #[arg(short, long)]
        prompt: Option<String>,
        /// Overwrite the compose file
        #[arg(long, conflicts_with = "output")]
        in_place: bool,
        /// Write the new body to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Remember --prompt as the default instruction
        #[arg(long, requires = "prompt")]
        remember: bool,
    },
    /// Summarize a message (.eml), an HTML file or plain text
    Summarize {
        file: PathBuf,
        #[arg(short, long)]
        prompt: Option<String>,
        /// Summary language code, or "auto"
        #[arg(long)]
        lang: Option<String>,
        /// balanced, concise, detailed or outline
        #[arg(long)]
        style: Option<SummaryStyle>,
        /// Print sanitized HTML instead of markdown
        #[arg(long)]
        html: bool,
        /// Treat the .eml as the displayed message (needs summary.display_summaries)
        #[arg(long)]
        displayed: bool,
    },
    /// Render a markdown summary as sanitized HTML
    Render { file: PathBuf },
    /// Print the plain text that would be sent to the model
    Extract { file: PathBuf },
    /// Check the configured API key against the API
    TestKey,
    /// Inspect or update the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key masked)
    Show,
    /// Print the config file location
    Path,
    /// Reset sampling to the recommended values for a model
    SetDefaults {
        /// Model name; defaults to the configured one
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Reply {
            compose,
            prompt,
            in_place,
            output,
            remember,
        } => cmd_reply(config, &compose, prompt, in_place, output, remember).await,
        Commands::Summarize {
            file,
            prompt,
            lang,
            style,
            html,
            displayed,
        } => {
            cmd_summarize(
                config,
                &file,
                prompt.as_deref(),
                lang.as_deref(),
                style,
                html,
                displayed,
            )
            .await
        }
        Commands::Render { file } => cmd_render(&file),
        Commands::Extract { file } => cmd_extract(&file),
        Commands::TestKey => cmd_test_key(config).await,
        Commands::Config { action } => cmd_config(config, action),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailscribe.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Run `fut` with a spinner on stderr.
async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = fut.await;
    pb.finish_and_clear();
    result
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(decode_text_bytes(&bytes))
}

fn is_eml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}

/// Prompt text for any supported input file.
fn file_plain_text(path: &Path) -> anyhow::Result<String> {
    if is_eml_path(path) {
        let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        return Ok(extract_message_text(&raw)?);
    }
    let text = read_text(path)?;
    Ok(if is_html_path(path) {
        html_to_text(&text)
    } else {
        text
    })
}

async fn cmd_reply(
    mut config: Config,
    compose: &Path,
    prompt: Option<String>,
    in_place: bool,
    output: Option<PathBuf>,
    remember: bool,
) -> anyhow::Result<()> {
    if !compose.exists() {
        anyhow::bail!("File not found: {}", compose.display());
    }

    if remember {
        if let Some(ref p) = prompt {
            config.general.last_prompt = p.clone();
            if let Err(e) = config::update_config(|saved| saved.general.last_prompt = p.clone()) {
                tracing::warn!(error = %format!("{e:#}"), "Could not remember prompt");
            }
        }
    }

    let sink = match (in_place, output) {
        (true, _) => ComposeSink::InPlace,
        (false, Some(path)) => ComposeSink::File(path),
        (false, None) => ComposeSink::Discard,
    };
    let print_body = sink == ComposeSink::Discard;
    let host = FileHost::compose(compose, sink);

    let assistant = Assistant::new(config)?;
    let outcome = with_spinner(
        "Drafting reply",
        assistant.generate_reply(&host, None, prompt.as_deref()),
    )
    .await?;

    if let Some(warning) = outcome.warning {
        eprintln!("  warning: {warning}");
    }
    if print_body {
        println!("{}", outcome.body.content());
    } else {
        eprintln!("  Reply written ({} chars)", outcome.reply.chars().count());
    }
    Ok(())
}

async fn cmd_summarize(
    config: Config,
    file: &Path,
    prompt: Option<&str>,
    lang: Option<&str>,
    style: Option<SummaryStyle>,
    html: bool,
    displayed: bool,
) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let assistant = Assistant::new(config)?;
    let summary = if displayed {
        let host = FileHost::message(file);
        with_spinner(
            "Summarizing",
            assistant.summarize_displayed(&host, None, prompt),
        )
        .await?
    } else {
        let content = file_plain_text(file)?;
        with_spinner(
            "Summarizing",
            assistant.summarize(&content, prompt, lang, style),
        )
        .await?
    };

    if html {
        println!("{}", assistant.render_summary_for_display(&summary));
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn cmd_render(file: &Path) -> anyhow::Result<()> {
    let markdown = read_text(file)?;
    println!("{}", mailscribe::render::render(&markdown));
    Ok(())
}

fn cmd_extract(file: &Path) -> anyhow::Result<()> {
    println!("{}", file_plain_text(file)?);
    Ok(())
}

async fn cmd_test_key(config: Config) -> anyhow::Result<()> {
    let assistant = Assistant::new(config)?;
    with_spinner("Checking API key", assistant.client().check_credentials()).await?;
    println!("  API key OK ({})", assistant.client().base_url());
    Ok(())
}

fn cmd_config(mut config: Config, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = config.clone();
            if !shown.api.api_key.is_empty() {
                shown.api.api_key = "********".to_string();
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            if std::env::var(config::API_KEY_ENV).is_ok() {
                println!("# api key overridden by ${}", config::API_KEY_ENV);
            }
        }
        ConfigAction::Path => match config::config_file_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config file path"),
        },
        ConfigAction::SetDefaults { model } => {
            let name = model.unwrap_or_else(|| config.model.name.clone());
            let defaults = ModelConfig::recommended_for(&name)
                .with_context(|| format!("No recommended defaults for model '{name}'"))?;
            config.model = defaults.clone();
            config::update_config(|saved| saved.model = defaults)?;
            println!(
                "  {}: temperature {}, top_p {}",
                config.model.name, config.model.temperature, config.model.top_p
            );
        }
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailscribe", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
