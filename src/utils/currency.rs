/// USDT amount helpers.
///
/// Amounts are stored as DECIMAL(18,2) and carried as `BigDecimal` so that
/// balances and commissions never go through floating point arithmetic.
use std::{str::FromStr, sync::LazyLock};

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;
use regex::Regex;

pub const MIN_DEPOSIT_USDT: i64 = 50;
pub const MIN_WITHDRAWAL_USDT: i64 = 10;
pub const MAX_AMOUNT_USDT: i64 = 1_000_000;

// Plain decimal only: no sign, exponent or separators
static AMOUNT_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)(?:\.([0-9]+))?$").expect("valid amount regex"));

pub fn min_deposit() -> BigDecimal {
    BigDecimal::from(MIN_DEPOSIT_USDT)
}

pub fn min_withdrawal() -> BigDecimal {
    BigDecimal::from(MIN_WITHDRAWAL_USDT)
}

pub fn max_amount() -> BigDecimal {
    BigDecimal::from(MAX_AMOUNT_USDT)
}

/// Convert a JSON amount into USDT using the same rules as form input
pub fn usdt_from_f64(amount: f64) -> Result<BigDecimal, String> {
    if !amount.is_finite() {
        return Err("Invalid amount format".to_string());
    }
    parse_usdt(&amount.to_string())
}

/// Parse an amount such as "75.5" into USDT.
///
/// More than two decimal places is an error rather than being rounded, and
/// the digit count is checked before any `BigDecimal` is built.
pub fn parse_usdt(amount_str: &str) -> Result<BigDecimal, String> {
    let amount_str = amount_str.trim();
    if amount_str.starts_with('-') {
        return Err("Amount cannot be negative".to_string());
    }

    let captures = AMOUNT_FORMAT
        .captures(amount_str)
        .ok_or_else(|| "Invalid amount format".to_string())?;

    let whole = captures.get(1).map_or("", |m| m.as_str()).trim_start_matches('0');
    if whole.len() > MAX_AMOUNT_USDT.to_string().len() {
        return Err(format!("Maximum amount is {}", format_usdt(&max_amount())));
    }
    if captures.get(2).is_some_and(|fraction| fraction.as_str().len() > 2) {
        return Err("Amount can have at most 2 decimal places".to_string());
    }

    let amount = BigDecimal::from_str(amount_str)
        .map_err(|_| "Invalid amount format".to_string())?;
    if amount > max_amount() {
        return Err(format!("Maximum amount is {}", format_usdt(&max_amount())));
    }
    Ok(amount.with_scale(2))
}

pub fn usdt_to_f64(amount: &BigDecimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

pub fn format_usdt(amount: &BigDecimal) -> String {
    format!("{} USDT", amount.with_scale(2))
}

pub fn ensure_minimum(amount: &BigDecimal, minimum: &BigDecimal, what: &str) -> Result<(), String> {
    if amount < minimum {
        return Err(format!("Minimum {} amount is {}", what, format_usdt(minimum)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usdt_from_f64() {
        assert_eq!(usdt_from_f64(50.0).unwrap(), BigDecimal::from(50));
        assert_eq!(usdt_from_f64(12.5).unwrap().to_string(), "12.50");
        assert!(usdt_from_f64(-1.0).is_err());
        assert!(usdt_from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_usdt() {
        assert_eq!(parse_usdt(" 75.5 ").unwrap().to_string(), "75.50");
        assert_eq!(parse_usdt("-3"), Err("Amount cannot be negative".to_string()));
        assert_eq!(parse_usdt("abc"), Err("Invalid amount format".to_string()));
    }

    #[test]
    fn test_exponent_notation_is_rejected() {
        assert_eq!(parse_usdt("1e30"), Err("Invalid amount format".to_string()));
        assert_eq!(parse_usdt("1e2000000"), Err("Invalid amount format".to_string()));
        assert_eq!(parse_usdt("5E1"), Err("Invalid amount format".to_string()));
    }

    #[test]
    fn test_amounts_above_the_cap_are_rejected() {
        let too_big = Err("Maximum amount is 1000000.00 USDT".to_string());
        assert_eq!(parse_usdt("1000000.01"), too_big);
        assert_eq!(parse_usdt(&"9".repeat(40)), too_big);
        assert_eq!(usdt_from_f64(1e30), too_big);
        assert_eq!(parse_usdt("1000000").unwrap().to_string(), "1000000.00");
        assert_eq!(parse_usdt("0001000000.00").unwrap().to_string(), "1000000.00");
    }

    #[test]
    fn test_both_paths_share_one_precision_rule() {
        let too_precise = Err("Amount can have at most 2 decimal places".to_string());
        assert_eq!(parse_usdt("50.009"), too_precise);
        assert_eq!(usdt_from_f64(50.009), too_precise);
        assert_eq!(parse_usdt("50.01").unwrap(), usdt_from_f64(50.01).unwrap());
    }

    #[test]
    fn test_format_usdt() {
        assert_eq!(format_usdt(&BigDecimal::from(10)), "10.00 USDT");
    }

    #[test]
    fn test_minimums() {
        assert!(ensure_minimum(&BigDecimal::from(49), &min_deposit(), "deposit").is_err());
        assert!(ensure_minimum(&BigDecimal::from(50), &min_deposit(), "deposit").is_ok());
        assert_eq!(
            ensure_minimum(&parse_usdt("9.99").unwrap(), &min_withdrawal(), "withdrawal"),
            Err("Minimum withdrawal amount is 10.00 USDT".to_string())
        );
    }
}
