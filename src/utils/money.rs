//! Currency display helpers

use crate::types::Cents;

/// Format an amount the way the pt-BR locale shows reais: `R$ 1.234,56`
///
/// Negative amounts carry the sign in front of the symbol (`-R$ 20,00`).
pub fn format_brl(amount: Cents) -> String {
    let cents = amount.cents();
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{sign}R$ {},{:02}",
        group_thousands(abs / 100),
        abs % 100
    )
}

/// Format free-text input as currency while the user types.
///
/// Returns an empty string when no digit has been typed yet so the field
/// can show its placeholder.
pub fn format_input(raw: &str) -> String {
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return String::new();
    }
    format_brl(Cents::from_input(raw))
}

/// Plain decimal with a dot separator and two places (`1234.56`), used in exports
pub fn format_decimal(amount: Cents) -> String {
    amount.to_decimal().to_string()
}

fn group_thousands(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1000);
        value /= 1000;
    }
    let mut out = String::new();
    for (i, group) in groups.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&group.to_string());
        } else {
            out.push('.');
            out.push_str(&format!("{group:03}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(Cents::ZERO), "R$ 0,00");
        assert_eq!(format_brl(Cents::from_cents(5)), "R$ 0,05");
        assert_eq!(format_brl(Cents::from_cents(92000)), "R$ 920,00");
        assert_eq!(format_brl(Cents::from_cents(123456)), "R$ 1.234,56");
        assert_eq!(format_brl(Cents::from_cents(100000000)), "R$ 1.000.000,00");
        assert_eq!(format_brl(Cents::from_cents(-2000)), "-R$ 20,00");
    }

    #[test]
    fn test_format_input() {
        assert_eq!(format_input(""), "");
        assert_eq!(format_input("R$ "), "");
        assert_eq!(format_input("1"), "R$ 0,01");
        assert_eq!(format_input("R$ 0,012"), "R$ 0,12");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(Cents::from_cents(7200)), "72.00");
        assert_eq!(format_decimal(Cents::from_cents(-1000)), "-10.00");
    }
}
