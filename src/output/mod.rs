pub mod table;

use colored::Colorize;

use crate::controller::PageView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render_json(view: &PageView) -> String {
    serde_json::to_string_pretty(view).unwrap_or_else(|_| "{}".to_string())
}

pub fn render_page(view: &PageView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => table::render_table(view),
        OutputFormat::Json => {
            let mut out = render_json(view);
            out.push('\n');
            out
        }
    }
}

fn tagged(tag: colored::ColoredString, message: &str) -> String {
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message.bold().white()
    )
}

pub fn success_line(message: &str) -> String {
    tagged("OK".bold().green(), message)
}

pub fn error_line(message: &str) -> String {
    tagged("ERR".bold().red(), message)
}

pub fn info_line(message: &str) -> String {
    tagged("INF".bold().cyan(), message)
}
