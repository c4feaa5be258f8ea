use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, Command, ProductFields, UpdateArgs};
use crate::cli::validation::{LoginForm, SignupForm};
use crate::client::{ApiClient, ClientError, ClientOptions};
use crate::config::{self, ConfigFile, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::dashboard::{Dashboard, DashboardError};
use crate::model::{ProductDraft, ProductPatch};
use crate::output::{self, OutputFormat};
use crate::shell;
use crate::store::{self, RememberStore};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{}", .0.banner())]
    Dashboard(#[from] DashboardError),

    #[error("page {page} is out of range (1-{total_pages})")]
    PageOutOfRange { page: usize, total_pages: usize },

    #[error("failed to build runtime: {source}")]
    Runtime {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {source}")]
    Input {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct RunConfig {
    pub(crate) client: ClientOptions,
    pub(crate) store_path: PathBuf,
    pub(crate) format: OutputFormat,
    pub(crate) no_color: bool,
}

pub(crate) fn build_run_config(args: &CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    let base_url = args
        .base_url
        .clone()
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if reqwest::Url::parse(base_url.trim()).is_err() {
        return Err(format!("invalid base URL: {base_url}"));
    }

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let format_raw = args
        .format
        .clone()
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let format = OutputFormat::parse(&format_raw)
        .ok_or_else(|| format!("invalid --format '{format_raw}', expected text or json"))?;

    let store_path = args
        .store
        .clone()
        .or(cfg.store)
        .map(|p| config::expand_tilde(&p))
        .or_else(store::default_store_path)
        .unwrap_or_else(|| PathBuf::from(".stockboard-state.yml"));

    Ok(RunConfig {
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy: args.proxy.clone().or(cfg.proxy),
        },
        store_path,
        format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
    })
}

fn load_config_for(args: &CliArgs) -> Result<ConfigFile, String> {
    if let Some(path) = args.config.as_deref() {
        return config::load_config(&config::expand_tilde(path), false);
    }
    match config::default_config_path() {
        Some(path) => {
            if let Err(e) = config::ensure_default_config_file(&path) {
                warn!(error = %e, "could not write default config");
            }
            config::load_config(&path, true)
        }
        None => Ok(ConfigFile::default()),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stockboard={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Shows a spinner on stderr while `fut` is pending. The spinner is cleared however the
/// future resolves.
pub(crate) async fn with_spinner<F: Future>(message: &str, fut: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    pb.finish_and_clear();
    out
}

/// Passwords are read as a plain line, so the terminal echoes them.
pub(crate) const PASSWORD_PROMPT: &str = "Password (typed text is visible): ";

pub(crate) async fn prompt_line<R>(
    lines: &mut Lines<BufReader<R>>,
    prompt: &str,
) -> Result<Option<String>, AppError>
where
    R: AsyncRead + Unpin,
{
    use std::io::Write;
    eprint!("{prompt}");
    let _ = std::io::stderr().flush();
    lines
        .next_line()
        .await
        .map_err(|e| AppError::Input { source: e })
}

fn draft_from_fields(fields: ProductFields) -> ProductDraft {
    ProductDraft {
        name: fields.name,
        description: fields.description.filter(|d| !d.trim().is_empty()),
        unit_price: fields.price,
        quantity: fields.quantity,
        delivery_fee: fields.delivery_fee,
        target_margin: fields.margin,
    }
}

fn patch_from_args(args: &UpdateArgs) -> ProductPatch {
    ProductPatch {
        name: args.name.clone(),
        description: args.description.clone(),
        unit_price: args.price,
        quantity: args.quantity,
        delivery_fee: args.delivery_fee,
        target_margin: args.margin,
    }
}

fn build_dashboard(run: &RunConfig) -> Result<Dashboard, AppError> {
    let client = ApiClient::new(&run.client)?;
    let store = RememberStore::new(run.store_path.clone());
    Ok(Dashboard::new(client, store))
}

async fn run_command(run: RunConfig, command: Command) -> Result<(), AppError> {
    let mut dashboard = build_dashboard(&run)?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match command {
        Command::Login(args) => {
            let prefill = dashboard.restore_session();
            let username = args.username.or(prefill).unwrap_or_default();
            let password = match args.password {
                Some(p) => p,
                None => prompt_line(&mut stdin, PASSWORD_PROMPT)
                    .await?
                    .unwrap_or_default(),
            };
            let form = LoginForm {
                username,
                password,
                remember_me: args.remember,
            };
            let message = with_spinner("Signing in...", dashboard.login(form)).await?;
            println!("{}", output::success_line(&message));
        }
        Command::Signup(args) => {
            let password = match args.password {
                Some(p) => p,
                None => prompt_line(&mut stdin, PASSWORD_PROMPT)
                    .await?
                    .unwrap_or_default(),
            };
            let form = SignupForm {
                username: args.username,
                password,
            };
            let message = with_spinner("Creating account...", dashboard.signup(form)).await?;
            println!("{}", output::success_line(&message));
        }
        Command::Whoami => {
            dashboard.restore_session();
            let user = with_spinner("Checking session...", dashboard.whoami()).await?;
            println!("{}", output::info_line(&shell::describe_user(user.as_ref())));
        }
        Command::Logout => {
            dashboard.restore_session();
            with_spinner("Signing out...", dashboard.logout()).await?;
            println!("{}", output::success_line("Signed out"));
        }
        Command::Products(args) => {
            if args.demo {
                dashboard.load_demo();
            } else {
                dashboard.restore_session();
                with_spinner("Loading products...", dashboard.load_products()).await?;
            }
            let mut view = match args.search.as_deref() {
                Some(term) => dashboard.search(term),
                None => dashboard.page_view(),
            };
            if args.page != view.current_page {
                view = dashboard
                    .go_to_page(args.page)
                    .ok_or(AppError::PageOutOfRange {
                        page: args.page,
                        total_pages: view.total_pages,
                    })?;
            }
            print!("{}", output::render_page(&view, run.format));
        }
        Command::Add(fields) => {
            dashboard.restore_session();
            let draft = draft_from_fields(fields);
            let view = with_spinner("Saving product...", dashboard.create_product(draft)).await?;
            println!("{}", output::success_line("Product created"));
            print!("{}", output::render_page(&view, run.format));
        }
        Command::Update(args) => {
            dashboard.restore_session();
            let patch = patch_from_args(&args);
            let view = with_spinner(
                "Saving product...",
                dashboard.update_product(args.id, patch),
            )
            .await?;
            println!("{}", output::success_line("Product updated"));
            print!("{}", output::render_page(&view, run.format));
        }
        Command::Delete(args) => {
            dashboard.restore_session();
            let view =
                with_spinner("Deleting product...", dashboard.delete_product(args.id)).await?;
            println!("{}", output::success_line("Product deleted"));
            print!("{}", output::render_page(&view, run.format));
        }
        Command::Shell(args) => {
            shell::run_shell(&mut dashboard, &mut stdin, args.demo, run.format).await?;
        }
    }

    Ok(())
}

pub fn run_cli() -> Result<(), AppError> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(AppError::Config(e.to_string())),
        },
    };

    init_tracing(args.verbose);

    let cfg = load_config_for(&args).map_err(AppError::Config)?;
    let run = build_run_config(&args, cfg).map_err(AppError::Config)?;

    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Runtime { source: e })?;

    rt.block_on(run_command(run, args.command))
}
