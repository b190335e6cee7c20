//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a whole-franc amount the way prices are printed in the shop,
/// e.g. `13500` becomes `13 500 FCFA`.
///
/// Usage in templates: `{{ product.base_price|fcfa }}`
#[askama::filter_fn]
pub fn fcfa(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{} FCFA", group_thousands(&value.to_string())))
}

fn group_thousands(amount: &str) -> String {
    let (sign, digits) = amount
        .strip_prefix('-')
        .map_or(("", amount), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("950"), "950");
        assert_eq!(group_thousands("4500"), "4 500");
        assert_eq!(group_thousands("13500"), "13 500");
        assert_eq!(group_thousands("1250000"), "1 250 000");
        assert_eq!(group_thousands("-1500"), "-1 500");
    }
}
