use crate::movement::{Movement, RawAmount, RawMovement};

/// Coerce an oracle-provided amount into a finite number.
///
/// String amounts show up in both regional conventions: `1.234,56`
/// (dot-thousands, comma-decimal) and `1,234.56` (the reverse). When both
/// separators are present, whichever appears last is taken as the decimal
/// mark; lone commas are taken as thousands separators. Anything
/// unparseable collapses to 0.
pub fn amount(raw: Option<&RawAmount>) -> f64 {
    match raw {
        None => 0.0,
        Some(RawAmount::Number(n)) => {
            if n.is_finite() {
                *n
            } else {
                0.0
            }
        }
        Some(RawAmount::Text(s)) => amount_from_str(s),
    }
}

fn amount_from_str(s: &str) -> f64 {
    let mut t: String = s
        .chars()
        .filter(|c| *c != '$' && !c.is_whitespace())
        .collect();

    if t.contains(',') && t.contains('.') {
        if t.rfind(',') > t.rfind('.') {
            // "1.234,56": drop thousands dots, promote the comma.
            t.retain(|c| c != '.');
            t = t.replacen(',', ".", 1);
        } else {
            // "1,234.56": the commas are thousands separators.
            t.retain(|c| c != ',');
        }
    }
    t.retain(|c| c.is_ascii_digit() || c == '.' || c == '-');

    match t.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Normalize one raw oracle row: trim the text fields, coerce the amounts.
pub fn movement(raw: &RawMovement) -> Movement {
    Movement {
        date: raw.fecha.as_deref().unwrap_or("").trim().to_string(),
        description: raw.concepto.as_deref().unwrap_or("").trim().to_string(),
        withdrawal: amount(raw.retiros.as_ref()),
        deposit: amount(raw.depositos.as_ref()),
        balance: amount(raw.saldo.as_ref()),
    }
}

/// Normalize a whole reply worth of rows.
pub fn movements(raw: &[RawMovement]) -> Vec<Movement> {
    raw.iter().map(movement).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawAmount {
        RawAmount::Text(s.to_string())
    }

    #[test]
    fn european_thousands_and_decimal_comma() {
        assert_eq!(amount(Some(&text("1.234,56"))), 1234.56);
    }

    #[test]
    fn us_thousands_and_decimal_dot() {
        assert_eq!(amount(Some(&text("1,234.56"))), 1234.56);
    }

    #[test]
    fn grouped_millions_both_conventions() {
        assert_eq!(amount(Some(&text("1.234.567,89"))), 1_234_567.89);
        assert_eq!(amount(Some(&text("1,234,567.89"))), 1_234_567.89);
    }

    #[test]
    fn currency_symbol_and_spaces_stripped() {
        assert_eq!(amount(Some(&text("$ 45.00"))), 45.0);
    }

    #[test]
    fn missing_value_is_zero() {
        assert_eq!(amount(None), 0.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(amount(Some(&text("abc"))), 0.0);
        assert_eq!(amount(Some(&text("-"))), 0.0);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(amount(Some(&RawAmount::Number(-12.5))), -12.5);
    }

    #[test]
    fn non_finite_numbers_become_zero() {
        assert_eq!(amount(Some(&RawAmount::Number(f64::NAN))), 0.0);
        assert_eq!(amount(Some(&RawAmount::Number(f64::INFINITY))), 0.0);
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_eq!(amount(Some(&text("-1.234,56"))), -1234.56);
    }

    #[test]
    fn dot_without_comma_reads_as_decimal() {
        // Deliberate ambiguity: "1.234" alone could be thousands notation,
        // but without a comma the decimal reading wins.
        assert_eq!(amount(Some(&text("1.234"))), 1.234);
    }

    #[test]
    fn lone_comma_reads_as_thousands() {
        assert_eq!(amount(Some(&text("1,5"))), 15.0);
    }

    #[test]
    fn movement_trims_text_and_coerces_amounts() {
        let raw = RawMovement {
            fecha: Some("  2024-03-01 ".to_string()),
            concepto: Some(" COMPRA OXXO  ".to_string()),
            retiros: Some(text("$120.50")),
            depositos: None,
            saldo: Some(RawAmount::Number(1_879.5)),
        };
        let m = movement(&raw);
        assert_eq!(m.date, "2024-03-01");
        assert_eq!(m.description, "COMPRA OXXO");
        assert_eq!(m.withdrawal, 120.5);
        assert_eq!(m.deposit, 0.0);
        assert_eq!(m.balance, 1879.5);
    }

    #[test]
    fn movement_defaults_missing_fields() {
        let m = movement(&RawMovement::default());
        assert_eq!(m.date, "");
        assert_eq!(m.description, "");
        assert_eq!(m.withdrawal, 0.0);
        assert_eq!(m.deposit, 0.0);
        assert_eq!(m.balance, 0.0);
    }
}
