//! Quantity helpers: hex/decimal conversion and exact ether/wei arithmetic.

use crate::error::{Result, SignerError};

/// Decimal places between ether and wei.
pub const ETHER_DECIMALS: usize = 18;

/// One ether in wei.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Drops a leading `0x` or `0X`.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Lowercase hex, left-padded to an even number of digits, no `0x`.
pub fn decimal_to_hex(value: u128) -> String {
    let digits = format!("{:x}", value);
    if digits.len() % 2 != 0 {
        format!("0{}", digits)
    } else {
        digits
    }
}

/// Parses a hex quantity; `0x`/`0X` is optional and the empty string is zero.
pub fn hex_to_decimal(hex_str: &str) -> Result<u128> {
    let trimmed = hex_str.trim();
    let digits = strip_hex_prefix(trimmed);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| {
        SignerError::InvalidField(format!("Invalid hex quantity {:?}: {}", hex_str, e))
    })
}

/// Converts a decimal ether amount such as `"1.25"` into wei without any
/// floating-point rounding.
pub fn ether_to_wei(ether: &str) -> Result<u128> {
    let ether = ether.trim();
    let invalid =
        |reason: &str| SignerError::InvalidField(format!("ether amount {:?}: {}", ether, reason));

    let (whole, fraction) = match ether.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (ether, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("only decimal digits and one '.' are allowed"));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(invalid("more than 18 fractional digits"));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .ok()
            .and_then(|w| w.checked_mul(WEI_PER_ETHER))
            .ok_or_else(|| invalid("out of range"))?
    };
    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = ETHER_DECIMALS);
        padded.parse::<u128>().map_err(|_| invalid("out of range"))?
    };
    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| invalid("out of range"))
}

/// Renders wei as a decimal ether amount with no trailing zeros.
pub fn wei_to_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction, width = ETHER_DECIMALS);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_to_hex_even_length() {
        assert_eq!(decimal_to_hex(0), "00");
        assert_eq!(decimal_to_hex(1), "01");
        assert_eq!(decimal_to_hex(27), "1b");
        assert_eq!(decimal_to_hex(0xabc), "0abc");
        assert_eq!(decimal_to_hex(21000), "5208");
    }

    #[test]
    fn test_strip_hex_prefix_either_case() {
        assert_eq!(strip_hex_prefix("0xab"), "ab");
        assert_eq!(strip_hex_prefix("0XAB"), "AB");
        assert_eq!(strip_hex_prefix("ab"), "ab");
        assert_eq!(strip_hex_prefix("0x0xab"), "0xab");
    }

    #[test]
    fn test_hex_to_decimal() {
        assert_eq!(hex_to_decimal("1b").unwrap(), 27);
        assert_eq!(hex_to_decimal("0x5208").unwrap(), 21000);
        assert_eq!(hex_to_decimal("0X5208").unwrap(), 21000);
        assert_eq!(hex_to_decimal("").unwrap(), 0);
        assert!(hex_to_decimal("xyz").is_err());
        assert!(hex_to_decimal(&"f".repeat(33)).is_err());
    }

    #[test]
    fn test_ether_to_wei() {
        assert_eq!(ether_to_wei("1").unwrap(), WEI_PER_ETHER);
        assert_eq!(ether_to_wei("1.5").unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(ether_to_wei("0.000000000000000001").unwrap(), 1);
        assert_eq!(ether_to_wei(".25").unwrap(), 250_000_000_000_000_000);
        assert_eq!(ether_to_wei("2.").unwrap(), 2 * WEI_PER_ETHER);
    }

    #[test]
    fn test_ether_to_wei_rejects_bad_input() {
        for bad in ["", ".", "-1", "1e18", "1.2.3", "abc", "0.0000000000000000001"] {
            assert!(ether_to_wei(bad).is_err(), "{:?} should be rejected", bad);
        }
        assert!(ether_to_wei(&"9".repeat(40)).is_err());
    }

    #[test]
    fn test_wei_to_ether() {
        assert_eq!(wei_to_ether(0), "0");
        assert_eq!(wei_to_ether(WEI_PER_ETHER), "1");
        assert_eq!(wei_to_ether(1_500_000_000_000_000_000), "1.5");
        assert_eq!(wei_to_ether(1), "0.000000000000000001");
    }

    #[test]
    fn test_ether_value_matches_eip155_example() {
        assert_eq!(decimal_to_hex(ether_to_wei("1").unwrap()), "0de0b6b3a7640000");
    }
}
