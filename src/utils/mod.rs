pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn format_margin(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{}%", value)
    }
}

pub fn parse_amount(value: &str) -> Result<f64, String> {
    let trimmed = value.trim().trim_start_matches('$');
    let amount = trimmed
        .parse::<f64>()
        .map_err(|_| format!("expected a number, got '{value}'"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("expected a non-negative amount, got '{value}'"));
    }
    Ok(amount)
}

pub fn parse_percent(value: &str) -> Result<f64, String> {
    parse_amount(value.trim().trim_end_matches('%'))
}

/// Splits a shell line into words, keeping double-quoted segments together.
pub fn split_words(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    out.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        out.push(current);
    }
    out
}

/// Parses `key=value` words into pairs. Words without `=` are rejected.
pub fn parse_assignments(words: &[String]) -> Result<Vec<(String, String)>, String> {
    words
        .iter()
        .map(|w| match w.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => {
                Ok((k.trim().to_lowercase(), v.trim().to_string()))
            }
            _ => Err(format!("expected key=value, got '{w}'")),
        })
        .collect()
}
