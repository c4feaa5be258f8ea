use std::process::exit;

use stockboard::{app, output};

fn main() {
    if let Err(e) = app::run_cli() {
        eprintln!("{}", output::error_line(&e.to_string()));
        exit(1);
    }
}
