use std::sync::LazyLock;

use regex::Regex;

// Tron base58check addresses and EVM hex addresses
static TRC20_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T[1-9A-HJ-NP-Za-km-z]{33}$").expect("valid TRC20 regex"));
static BEP20_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid BEP20 regex"));
static TX_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0x)?[0-9a-fA-F]{64}$").expect("valid tx hash regex"));

pub fn is_trc20_address(address: &str) -> bool {
    TRC20_ADDRESS.is_match(address.trim())
}

pub fn is_bep20_address(address: &str) -> bool {
    BEP20_ADDRESS.is_match(address.trim())
}

pub fn is_transaction_hash(hash: &str) -> bool {
    TX_HASH.is_match(hash.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_trc20_addresses() {
        assert!(is_trc20_address("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t"));
        assert!(!is_trc20_address("0x55d398326f99059fF775485246999027B3197955"));
        assert!(!is_trc20_address("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6"));
    }

    #[test]
    fn recognises_bep20_addresses() {
        assert!(is_bep20_address("0x55d398326f99059fF775485246999027B3197955"));
        assert!(!is_bep20_address("0x55d398326f99059fF775485246999027B319795"));
    }

    #[test]
    fn recognises_transaction_hashes() {
        let tron = "a".repeat(64);
        let bsc = format!("0x{}", "b".repeat(64));
        assert!(is_transaction_hash(&tron));
        assert!(is_transaction_hash(&bsc));
        assert!(!is_transaction_hash("hello"));
    }
}
