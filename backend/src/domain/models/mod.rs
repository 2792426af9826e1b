//! Domain models: ledger entities, closed `tipo`/`status` enums and the
//! typed filter structs used by list/aggregate queries.

pub mod categoria;
pub mod contribuicao;
pub mod entrada;
pub mod saida;
pub mod token_acesso;
pub mod visitante;

use serde::{Deserialize, Serialize};

/// List ordering options shared by both ledger kinds. The default is
/// newest first (`data DESC, id DESC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordenacao {
    DataAsc,
    ValorDesc,
    ValorAsc,
}

/// Aggregate row: total and count grouped by `tipo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalPorTipo {
    pub tipo: String,
    pub total: f64,
    pub quantidade: i64,
}

/// Aggregate row for one month of a year. `por_mes` queries return all 12
/// months, zero-filled where there was no activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalMensal {
    pub mes: u32,
    pub total: f64,
    pub quantidade: i64,
}
