// service/ledger.rs
use bigdecimal::BigDecimal;
use num_traits::Zero;

use super::error::ServiceError;
use crate::models::withdrawalmodel::WithdrawalStatus;

/// What a withdrawal status change does to the owner's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Debit,
    Refund,
    Unchanged,
}

/// Funds leave the balance on approval and come back if an approved request is rejected.
pub fn withdrawal_balance_change(from: WithdrawalStatus, to: WithdrawalStatus) -> BalanceChange {
    match (from.holds_funds(), to.holds_funds()) {
        (false, true) => BalanceChange::Debit,
        (true, false) => BalanceChange::Refund,
        _ => BalanceChange::Unchanged,
    }
}

/// Balance not yet claimed by pending withdrawal requests, never below zero.
pub fn available_for_withdrawal(balance: &BigDecimal, pending: &BigDecimal) -> BigDecimal {
    let available = balance - pending;
    if available < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        available
    }
}

pub fn ensure_funds(required: &BigDecimal, available: BigDecimal) -> Result<(), ServiceError> {
    if *required > available {
        return Err(ServiceError::InsufficientBalance {
            required: required.clone(),
            available,
        });
    }
    Ok(())
}

/// Increments applied to a user row when money is credited.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceCredit {
    pub account_balance: BigDecimal,
    pub total_earning: BigDecimal,
    pub rewards: BigDecimal,
}

impl BalanceCredit {
    /// A verified deposit or approved payment only tops up the balance.
    pub fn funding(amount: &BigDecimal) -> Self {
        BalanceCredit {
            account_balance: amount.clone(),
            total_earning: BigDecimal::zero(),
            rewards: BigDecimal::zero(),
        }
    }

    /// Referral commissions count as balance, earnings and rewards.
    pub fn commission(amount: &BigDecimal) -> Self {
        BalanceCredit {
            account_balance: amount.clone(),
            total_earning: amount.clone(),
            rewards: amount.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use WithdrawalStatus::*;

    fn usdt(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn approval_debits_and_late_rejection_refunds() {
        assert_eq!(withdrawal_balance_change(Pending, Approved), BalanceChange::Debit);
        assert_eq!(withdrawal_balance_change(Approved, Rejected), BalanceChange::Refund);
        assert_eq!(withdrawal_balance_change(Approved, Completed), BalanceChange::Unchanged);
        assert_eq!(withdrawal_balance_change(Pending, Rejected), BalanceChange::Unchanged);
    }

    #[test]
    fn pending_requests_reduce_what_can_be_withdrawn() {
        assert_eq!(available_for_withdrawal(&usdt("100.00"), &usdt("30.00")), usdt("70.00"));
        assert_eq!(available_for_withdrawal(&usdt("100.00"), &usdt("0")), usdt("100.00"));
        // balance already debited below the pending total
        assert_eq!(available_for_withdrawal(&usdt("20.00"), &usdt("50.00")), BigDecimal::zero());
    }

    #[test]
    fn request_above_available_is_insufficient() {
        let available = available_for_withdrawal(&usdt("100.00"), &usdt("60.00"));
        assert!(ensure_funds(&usdt("40.00"), available.clone()).is_ok());

        match ensure_funds(&usdt("40.01"), available) {
            Err(ServiceError::InsufficientBalance { required, available }) => {
                assert_eq!(required, usdt("40.01"));
                assert_eq!(available, usdt("40.00"));
            }
            other => panic!("expected insufficient balance, got {:?}", other),
        }
    }

    #[test]
    fn approval_with_too_little_balance_is_refused() {
        assert!(ensure_funds(&usdt("50.00"), usdt("49.99")).is_err());
        assert!(ensure_funds(&usdt("50.00"), usdt("50.00")).is_ok());
    }

    #[test]
    fn funding_only_touches_the_balance() {
        let credit = BalanceCredit::funding(&usdt("75.00"));
        assert_eq!(credit.account_balance, usdt("75.00"));
        assert_eq!(credit.total_earning, BigDecimal::zero());
        assert_eq!(credit.rewards, BigDecimal::zero());
    }

    #[test]
    fn commission_counts_as_earning_and_reward() {
        let credit = BalanceCredit::commission(&usdt("0.75"));
        assert_eq!(credit.account_balance, usdt("0.75"));
        assert_eq!(credit.total_earning, usdt("0.75"));
        assert_eq!(credit.rewards, usdt("0.75"));
    }
}
