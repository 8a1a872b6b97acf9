use bigdecimal::BigDecimal;
use num_traits::Zero;
use rand::{distr::Alphanumeric, Rng};

pub const REFERRAL_CODE_LENGTH: usize = 8;

/// Commission paid to each ancestor, in percent of the approved amount.
pub const COMMISSION_PERCENT: i64 = 1;

pub fn generate_referral_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

pub fn generate_referral_link(base_url: &str, code: &str) -> String {
    format!("{}/signup?ref={}", base_url.trim_end_matches('/'), code)
}

/// Codes are case-insensitive on input and stored uppercase
pub fn normalize_referral_code(code: &str) -> Option<String> {
    let code = code.trim().to_uppercase();
    let well_formed = code.len() == REFERRAL_CODE_LENGTH
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    well_formed.then_some(code)
}

/// 1% of `amount`, truncated to cents
pub fn commission_for(amount: &BigDecimal) -> BigDecimal {
    (amount.clone() * BigDecimal::from(COMMISSION_PERCENT) / BigDecimal::from(100)).with_scale(2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommissionCredit {
    pub beneficiary_id: i64,
    pub level: i32,
    pub amount: BigDecimal,
}

/// Works out who gets paid when `source_user_id` has `amount` approved.
///
/// `level1` is the user's referrer and `level2` that referrer's referrer.
pub fn plan_commissions(
    source_user_id: i64,
    level1: Option<i64>,
    level2: Option<i64>,
    amount: &BigDecimal,
) -> Vec<CommissionCredit> {
    let commission = commission_for(amount);
    if commission <= BigDecimal::zero() {
        return Vec::new();
    }

    let mut credits: Vec<CommissionCredit> = Vec::with_capacity(2);
    for (level, ancestor) in [(1, level1), (2, level2)] {
        let Some(beneficiary_id) = ancestor else {
            continue;
        };
        if beneficiary_id == source_user_id
            || credits.iter().any(|c| c.beneficiary_id == beneficiary_id)
        {
            continue;
        }
        credits.push(CommissionCredit {
            beneficiary_id,
            level,
            amount: commission.clone(),
        });
    }
    credits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn usdt(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn referral_link() {
        assert_eq!(
            generate_referral_link("https://bdspro.io/", "AB12CD34"),
            "https://bdspro.io/signup?ref=AB12CD34"
        );
    }

    #[test]
    fn normalizes_codes() {
        assert_eq!(normalize_referral_code(" ab12cd34 "), Some("AB12CD34".to_string()));
        assert_eq!(normalize_referral_code("AB12"), None);
        assert_eq!(normalize_referral_code("AB12-D34"), None);
    }

    #[test]
    fn commission_is_one_percent_rounded_down() {
        assert_eq!(commission_for(&usdt("100")), usdt("1.00"));
        assert_eq!(commission_for(&usdt("50")), usdt("0.50"));
        assert_eq!(commission_for(&usdt("123.45")), usdt("1.23"));
        assert_eq!(commission_for(&usdt("0.99")), usdt("0.00"));
    }

    #[test]
    fn pays_two_levels() {
        let credits = plan_commissions(3, Some(2), Some(1), &usdt("200"));
        assert_eq!(
            credits,
            vec![
                CommissionCredit { beneficiary_id: 2, level: 1, amount: usdt("2.00") },
                CommissionCredit { beneficiary_id: 1, level: 2, amount: usdt("2.00") },
            ]
        );
    }

    #[test]
    fn skips_missing_ancestors() {
        assert!(plan_commissions(3, None, None, &usdt("200")).is_empty());

        let only_direct = plan_commissions(3, Some(2), None, &usdt("200"));
        assert_eq!(only_direct.len(), 1);
        assert_eq!(only_direct[0].level, 1);
    }

    #[test]
    fn never_pays_the_source_or_the_same_user_twice() {
        assert!(plan_commissions(3, Some(3), None, &usdt("100")).is_empty());

        let credits = plan_commissions(3, Some(2), Some(2), &usdt("100"));
        assert_eq!(credits.len(), 1);
    }

    #[test]
    fn tiny_amounts_pay_nothing() {
        assert!(plan_commissions(3, Some(2), Some(1), &usdt("0.50")).is_empty());
    }
}
