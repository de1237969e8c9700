use serde::{Deserialize, Serialize};

/// One statement row. Wire names are the oracle's Spanish column headers so
/// the same struct serves the HTTP response and the schema-constrained reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "concepto")]
    pub description: String,
    #[serde(rename = "retiros")]
    pub withdrawal: f64,
    #[serde(rename = "depositos")]
    pub deposit: f64,
    #[serde(rename = "saldo")]
    pub balance: f64,
}

/// An amount as the oracle may emit it. Schema-enforced replies carry plain
/// numbers; loose-parsed fallback replies sometimes carry formatted strings
/// like `"1.234,56"` or `"$ 45.00"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// A row before normalization. Every field is optional so a reply missing
/// columns still yields a row instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMovement {
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub concepto: Option<String>,
    #[serde(default)]
    pub retiros: Option<RawAmount>,
    #[serde(default)]
    pub depositos: Option<RawAmount>,
    #[serde(default)]
    pub saldo: Option<RawAmount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_serializes_with_wire_names() {
        let m = Movement {
            date: "2024-03-01".to_string(),
            description: "PAGO TARJETA".to_string(),
            withdrawal: 150.0,
            deposit: 0.0,
            balance: 1850.5,
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["fecha"], "2024-03-01");
        assert_eq!(v["concepto"], "PAGO TARJETA");
        assert_eq!(v["retiros"], 150.0);
        assert_eq!(v["depositos"], 0.0);
        assert_eq!(v["saldo"], 1850.5);
    }

    #[test]
    fn raw_movement_accepts_string_amounts() {
        let raw: RawMovement =
            serde_json::from_str(r#"{"fecha":"01/03/2024","retiros":"1.234,56","saldo":980}"#)
                .unwrap();
        assert_eq!(raw.fecha.as_deref(), Some("01/03/2024"));
        assert!(raw.concepto.is_none());
        assert_eq!(raw.retiros, Some(RawAmount::Text("1.234,56".to_string())));
        assert_eq!(raw.saldo, Some(RawAmount::Number(980.0)));
    }

    #[test]
    fn raw_movement_accepts_nulls() {
        let raw: RawMovement =
            serde_json::from_str(r#"{"fecha":null,"concepto":null,"depositos":null}"#).unwrap();
        assert!(raw.fecha.is_none());
        assert!(raw.depositos.is_none());
    }
}
