//! Interactive dashboard: one command per line, the table is redrawn after every change.

use colored::Colorize;
use tokio::io::{AsyncRead, BufReader, Lines};
use tracing::debug;

use crate::app::{prompt_line, with_spinner, AppError, PASSWORD_PROMPT};
use crate::cli::validation::{LoginForm, SignupForm, ValidationError};
use crate::dashboard::{Dashboard, Startup, View};
use crate::model::{CurrentUser, ProductDraft, ProductPatch};
use crate::output::{self, OutputFormat};
use crate::utils::{parse_amount, parse_assignments, parse_percent, split_words};

const HELP: &str = "\
  login <username> [password] [--remember]   sign in (password is prompted, input is visible)
  signup <username> [password]               create an account
  logout                                     end the session
  whoami                                     show the signed-in user
  demo                                       load the demo catalogue
  list                                       redraw the current page
  reload                                     fetch products again
  search [term]                              filter by name or description (empty clears)
  next | prev                                move one page
  page <n>                                   jump to page n
  add name=<name> price=<amount> [description=..] [quantity=..] [delivery_fee=..] [margin=..]
  update <id> key=value ...                  change fields of a product
  delete <id>                                remove a product
  help                                       this text
  quit                                       leave the shell";

#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Empty,
    Login {
        username: Option<String>,
        password: Option<String>,
        remember: bool,
    },
    Signup {
        username: String,
        password: Option<String>,
    },
    Logout,
    Whoami,
    Demo,
    List,
    Reload,
    Search(String),
    Next,
    Prev,
    Page(usize),
    Add(ProductDraft),
    Update { id: i64, patch: ProductPatch },
    Delete(i64),
    Help,
    Quit,
}

fn parse_id(word: Option<&String>) -> Result<i64, ValidationError> {
    let word = word.ok_or_else(|| ValidationError::new("id", "Product id is required"))?;
    word.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new("id", format!("Invalid product id '{word}'")))
}

fn field_error(field: &'static str) -> impl Fn(String) -> ValidationError {
    move |message| ValidationError::new(field, message)
}

fn parse_quantity(value: &str) -> Result<u32, ValidationError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::new("quantity", format!("Invalid quantity '{value}'")))
}

fn parse_patch(words: &[String]) -> Result<ProductPatch, ValidationError> {
    let pairs = parse_assignments(words).map_err(field_error("product"))?;
    let mut patch = ProductPatch::default();
    for (key, value) in pairs {
        match key.as_str() {
            "name" => patch.name = Some(value),
            "description" | "desc" => patch.description = Some(value),
            "price" => {
                patch.unit_price = Some(parse_amount(&value).map_err(field_error("price"))?)
            }
            "quantity" | "qty" => patch.quantity = Some(parse_quantity(&value)?),
            "delivery_fee" | "delivery" | "fee" => {
                let fee = parse_amount(&value).map_err(field_error("delivery_fee"))?;
                patch.delivery_fee = Some(fee)
            }
            "margin" => {
                patch.target_margin = Some(parse_percent(&value).map_err(field_error("margin"))?)
            }
            other => {
                return Err(ValidationError::new(
                    "product",
                    format!("Unknown field '{other}'"),
                ))
            }
        }
    }
    Ok(patch)
}

fn draft_from_patch(patch: ProductPatch) -> Result<ProductDraft, ValidationError> {
    let name = patch
        .name
        .ok_or_else(|| ValidationError::new("name", "Product name is required"))?;
    let unit_price = patch
        .unit_price
        .ok_or_else(|| ValidationError::new("price", "Price is required"))?;
    Ok(ProductDraft {
        name,
        description: patch.description.filter(|d| !d.trim().is_empty()),
        unit_price,
        quantity: patch.quantity.unwrap_or(0),
        delivery_fee: patch.delivery_fee.unwrap_or(0.0),
        target_margin: patch.target_margin.unwrap_or(0.0),
    })
}

pub fn parse_command(line: &str) -> Result<ShellCommand, ValidationError> {
    let words = split_words(line);
    let Some((head, rest)) = words.split_first() else {
        return Ok(ShellCommand::Empty);
    };

    let command = match head.to_lowercase().as_str() {
        "login" => {
            let remember = rest.iter().any(|w| w == "--remember" || w == "-r");
            let mut positional = rest.iter().filter(|w| *w != "--remember" && *w != "-r");
            ShellCommand::Login {
                username: positional.next().cloned(),
                password: positional.next().cloned(),
                remember,
            }
        }
        "signup" => ShellCommand::Signup {
            username: rest
                .first()
                .cloned()
                .ok_or_else(|| ValidationError::new("username", "Username is required"))?,
            password: rest.get(1).cloned(),
        },
        "logout" => ShellCommand::Logout,
        "whoami" => ShellCommand::Whoami,
        "demo" => ShellCommand::Demo,
        "list" | "ls" => ShellCommand::List,
        "reload" | "refresh" => ShellCommand::Reload,
        "search" | "find" => ShellCommand::Search(rest.join(" ")),
        "next" | "n" => ShellCommand::Next,
        "prev" | "p" => ShellCommand::Prev,
        "page" => {
            let n = rest
                .first()
                .and_then(|w| w.parse::<usize>().ok())
                .ok_or_else(|| ValidationError::new("page", "Usage: page <n>"))?;
            ShellCommand::Page(n)
        }
        "add" => ShellCommand::Add(draft_from_patch(parse_patch(rest)?)?),
        "update" | "edit" => {
            let id = parse_id(rest.first())?;
            let patch = parse_patch(rest.get(1..).unwrap_or_default())?;
            ShellCommand::Update { id, patch }
        }
        "delete" | "rm" => ShellCommand::Delete(parse_id(rest.first())?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => {
            return Err(ValidationError::new(
                "command",
                format!("Unknown command '{other}', type help"),
            ))
        }
    };
    Ok(command)
}

pub fn describe_user(user: Option<&CurrentUser>) -> String {
    match user {
        Some(CurrentUser {
            username: Some(name),
            id: Some(id),
        }) => format!("Signed in as {name} (id {id})"),
        Some(CurrentUser {
            username: Some(name),
            id: None,
        }) => format!("Signed in as {name}"),
        _ => "Not signed in".to_string(),
    }
}

/// First line printed by the shell, chosen from the view `start` settled on.
fn startup_notice(startup: &Startup, user: Option<&CurrentUser>) -> String {
    match (startup.view, startup.load_error.as_deref()) {
        (View::Dashboard, Some(err)) => output::error_line(&format!(
            "{}, but products could not be loaded: {err} (type reload to retry)",
            describe_user(user)
        )),
        (View::Dashboard, None) => output::info_line(&describe_user(user)),
        _ => {
            let hint = match startup.prefill_username.as_deref() {
                Some(name) => format!("Please login (last user: {name}), or type demo"),
                None => "Please login, or type demo".to_string(),
            };
            output::info_line(&hint)
        }
    }
}

fn prompt_for(dashboard: &Dashboard) -> String {
    match dashboard.view() {
        View::Dashboard if dashboard.is_demo() => format!("{} ", "demo>".yellow().bold()),
        View::Dashboard => format!("{} ", "stockboard>".cyan().bold()),
        View::Login => format!("{} ", "login>".bold()),
        View::Signup => format!("{} ", "signup>".bold()),
    }
}

fn print_page(dashboard: &Dashboard, format: OutputFormat) {
    print!("{}", output::render_page(&dashboard.page_view(), format));
}

fn turn_page(dashboard: &mut Dashboard, delta: i64, format: OutputFormat) {
    match dashboard.change_page(delta) {
        Some(view) => print!("{}", output::render_page(&view, format)),
        None => println!("{}", output::info_line("No more pages in that direction")),
    }
}

enum Flow {
    Continue,
    Quit,
}

async fn execute<R>(
    dashboard: &mut Dashboard,
    command: ShellCommand,
    lines: &mut Lines<BufReader<R>>,
    format: OutputFormat,
) -> Result<Flow, AppError>
where
    R: AsyncRead + Unpin,
{
    match command {
        ShellCommand::Empty => {}
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => return Ok(Flow::Quit),
        ShellCommand::Login {
            username,
            password,
            remember,
        } => {
            dashboard.show_view(View::Login);
            let username = username
                .or_else(|| dashboard.remembered_username())
                .unwrap_or_default();
            let password = match password {
                Some(p) => p,
                None => prompt_line(lines, PASSWORD_PROMPT).await?.unwrap_or_default(),
            };
            let form = LoginForm {
                username,
                password,
                remember_me: remember,
            };
            match with_spinner("Signing in...", dashboard.login(form)).await {
                Ok(message) => {
                    println!("{}", output::success_line(&message));
                    print_page(dashboard, format);
                }
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
        ShellCommand::Signup { username, password } => {
            dashboard.show_view(View::Signup);
            let password = match password {
                Some(p) => p,
                None => prompt_line(lines, PASSWORD_PROMPT).await?.unwrap_or_default(),
            };
            let form = SignupForm { username, password };
            match with_spinner("Creating account...", dashboard.signup(form)).await {
                Ok(message) => println!("{}", output::success_line(&message)),
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
        ShellCommand::Logout => match with_spinner("Signing out...", dashboard.logout()).await {
            Ok(()) => println!("{}", output::success_line("Signed out")),
            Err(e) => println!("{}", output::error_line(&e.banner())),
        },
        ShellCommand::Whoami => {
            if dashboard.is_demo() {
                println!("{}", output::info_line("Demo mode, no API session"));
            } else {
                match with_spinner("Checking session...", dashboard.whoami()).await {
                    Ok(user) => println!("{}", output::info_line(&describe_user(user.as_ref()))),
                    Err(e) => println!("{}", output::error_line(&e.banner())),
                }
            }
        }
        ShellCommand::Demo => {
            let view = dashboard.load_demo();
            println!("{}", output::info_line("Loaded demo catalogue"));
            print!("{}", output::render_page(&view, format));
        }
        ShellCommand::List => print_page(dashboard, format),
        ShellCommand::Reload => {
            match with_spinner("Loading products...", dashboard.load_products()).await {
                Ok(view) => print!("{}", output::render_page(&view, format)),
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
        ShellCommand::Search(term) => {
            let view = dashboard.search(&term);
            print!("{}", output::render_page(&view, format));
        }
        ShellCommand::Next => turn_page(dashboard, 1, format),
        ShellCommand::Prev => turn_page(dashboard, -1, format),
        ShellCommand::Page(page) => match dashboard.go_to_page(page) {
            Some(view) => print!("{}", output::render_page(&view, format)),
            None => {
                let err = AppError::PageOutOfRange {
                    page,
                    total_pages: dashboard.products().total_pages(),
                };
                println!("{}", output::error_line(&err.to_string()));
            }
        },
        ShellCommand::Add(draft) => {
            match with_spinner("Saving product...", dashboard.create_product(draft)).await {
                Ok(view) => {
                    println!("{}", output::success_line("Product created"));
                    print!("{}", output::render_page(&view, format));
                }
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
        ShellCommand::Update { id, patch } => {
            match with_spinner("Saving product...", dashboard.update_product(id, patch)).await {
                Ok(view) => {
                    println!("{}", output::success_line("Product updated"));
                    print!("{}", output::render_page(&view, format));
                }
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
        ShellCommand::Delete(id) => {
            match with_spinner("Deleting product...", dashboard.delete_product(id)).await {
                Ok(view) => {
                    println!("{}", output::success_line("Product deleted"));
                    print!("{}", output::render_page(&view, format));
                }
                Err(e) => println!("{}", output::error_line(&e.banner())),
            }
        }
    }
    Ok(Flow::Continue)
}

/// Runs the prompt loop until `quit` or end of input.
pub async fn run_shell<R>(
    dashboard: &mut Dashboard,
    lines: &mut Lines<BufReader<R>>,
    demo: bool,
    format: OutputFormat,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    if demo {
        let view = dashboard.load_demo();
        println!("{}", output::info_line("Demo mode, changes stay local"));
        print!("{}", output::render_page(&view, format));
    } else {
        let startup = with_spinner("Checking session...", dashboard.start()).await;
        println!("{}", startup_notice(&startup, dashboard.user()));
        if let Some(view) = &startup.products {
            print!("{}", output::render_page(view, format));
        }
    }
    println!("{}", "Type help for commands.".dimmed());

    loop {
        let Some(line) = prompt_line(lines, &prompt_for(dashboard)).await? else {
            debug!("end of input, leaving shell");
            break;
        };
        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(e) => {
                println!("{}", output::error_line(&e.message));
                continue;
            }
        };
        if let Flow::Quit = execute(dashboard, command, lines, format).await? {
            break;
        }
    }
    Ok(())
}
