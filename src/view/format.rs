use chrono::{Datelike, NaiveDate};

/// Avatar letter: the first character of `name`, upper-cased.
pub fn initials(name: &str) -> String {
    match name.chars().next() {
        Some(first) => first.to_uppercase().collect(),
        None => "?".into(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Dollar amount with thousands separators and at most two decimals,
/// trailing zeros dropped: `1234.5` renders as `$1,234.5`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    let whole = group_thousands(cents / 100);

    let fraction = match cents % 100 {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{f:02}"),
    };

    format!("${sign}{whole}{fraction}")
}

/// `M/D/YYYY`, no zero padding.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}
