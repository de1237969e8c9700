use saldo_core::RawMovement;
use serde::Deserialize;
use serde_json::{json, Value};

/// A named JSON schema for the Responses API `text.format` block.
#[derive(Debug, Clone)]
pub struct SchemaSpec {
    pub name: &'static str,
    pub schema: Value,
}

/// Strict schema for the movements table. Every column is required so the
/// model cannot silently drop one; `additionalProperties: false` keeps it
/// from inventing columns.
pub fn movements_schema() -> SchemaSpec {
    SchemaSpec {
        name: "estado_cuenta",
        schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "movimientos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "fecha": { "type": "string" },
                            "concepto": { "type": "string" },
                            "retiros": { "type": "number" },
                            "depositos": { "type": "number" },
                            "saldo": { "type": "number" },
                        },
                        "required": ["fecha", "concepto", "retiros", "depositos", "saldo"],
                    },
                },
            },
            "required": ["movimientos"],
        }),
    }
}

/// Strict schema for the page-relevance scan.
pub fn pages_schema() -> SchemaSpec {
    SchemaSpec {
        name: "paginas_movimientos",
        schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "pages": { "type": "array", "items": { "type": "integer" } },
            },
            "required": ["pages"],
        }),
    }
}

/// Reply to a relevance scan. Defaults keep a reply with a missing `pages`
/// key from failing the whole chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PagesReply {
    #[serde(default)]
    pub pages: Vec<i64>,
}

/// Reply to an extraction call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovementsReply {
    #[serde(default)]
    pub movimientos: Vec<RawMovement>,
}
