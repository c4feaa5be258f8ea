use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stockboard",
    version,
    about = "terminal dashboard for a product inventory API",
    long_about = "stockboard signs in to a product inventory API and shows a searchable, paginated product table.\n\nExamples:\n  stockboard login -u alice --remember\n  stockboard products --search laptop --page 2\n  stockboard add --name Desk --price 120 --quantity 4\n  stockboard shell\n\nTip: Use --config to persist the API URL and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format for product tables: text or json."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.stockboard/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'b',
        long = "base-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Base URL of the inventory API."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy for API requests."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "store",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "File holding the remembered username and session (defaults to ~/.stockboard/state.yml)."
    )]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and keep the session for later commands.
    Login(LoginArgs),
    /// Create an account.
    Signup(SignupArgs),
    /// Show the signed-in user.
    Whoami,
    /// End the session and forget the remembered username.
    Logout,
    /// List products.
    Products(ProductsArgs),
    /// Create a product.
    Add(ProductFields),
    /// Update fields of an existing product.
    Update(UpdateArgs),
    /// Delete a product.
    Delete(DeleteArgs),
    /// Interactive dashboard.
    Shell(ShellArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(short = 'u', long = "username", help = "Defaults to the remembered username.")]
    pub username: Option<String>,

    #[arg(
        short = 'p',
        long = "password",
        help = "Read from stdin when omitted (typed text is visible)."
    )]
    pub password: Option<String>,

    #[arg(short = 'r', long = "remember", help = "Remember the username for next time.")]
    pub remember: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(short = 'u', long = "username")]
    pub username: String,

    #[arg(
        short = 'p',
        long = "password",
        help = "Read from stdin when omitted (typed text is visible)."
    )]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ProductsArgs {
    #[arg(short = 's', long = "search", value_name = "TERM")]
    pub search: Option<String>,

    #[arg(long = "page", value_name = "N", default_value_t = 1)]
    pub page: usize,

    #[arg(long = "demo", help = "Use the built-in demo catalogue instead of the API.")]
    pub demo: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProductFields {
    #[arg(long = "name")]
    pub name: String,

    #[arg(long = "description")]
    pub description: Option<String>,

    #[arg(long = "price", value_name = "AMOUNT", value_parser = parse_amount_arg)]
    pub price: f64,

    #[arg(long = "quantity", default_value_t = 0)]
    pub quantity: u32,

    #[arg(
        long = "delivery-fee",
        value_name = "AMOUNT",
        default_value_t = 0.0,
        value_parser = parse_amount_arg
    )]
    pub delivery_fee: f64,

    #[arg(
        long = "margin",
        value_name = "PERCENT",
        default_value_t = 0.0,
        value_parser = parse_percent_arg
    )]
    pub margin: f64,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long = "name")]
    pub name: Option<String>,

    #[arg(long = "description")]
    pub description: Option<String>,

    #[arg(long = "price", value_name = "AMOUNT", value_parser = parse_amount_arg)]
    pub price: Option<f64>,

    #[arg(long = "quantity")]
    pub quantity: Option<u32>,

    #[arg(long = "delivery-fee", value_name = "AMOUNT", value_parser = parse_amount_arg)]
    pub delivery_fee: Option<f64>,

    #[arg(long = "margin", value_name = "PERCENT", value_parser = parse_percent_arg)]
    pub margin: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct ShellArgs {
    #[arg(long = "demo", help = "Start with the built-in demo catalogue and no API session.")]
    pub demo: bool,
}

fn parse_amount_arg(value: &str) -> Result<f64, String> {
    crate::utils::parse_amount(value)
}

fn parse_percent_arg(value: &str) -> Result<f64, String> {
    crate::utils::parse_percent(value)
}
