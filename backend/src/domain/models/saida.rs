//! Expense ledger record (saída).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::models::Ordenacao;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoSaida {
    Compra,
    Pagamento,
}

impl TipoSaida {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoSaida::Compra => "compra",
            TipoSaida::Pagamento => "pagamento",
        }
    }
}

impl fmt::Display for TipoSaida {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoSaida {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compra" => Ok(TipoSaida::Compra),
            "pagamento" => Ok(TipoSaida::Pagamento),
            other => Err(DomainError::Validation(format!(
                "Tipo de saída inválido: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saida {
    pub id: i64,
    /// Ledger date, `YYYY-MM-DD`
    pub data: String,
    pub tipo: TipoSaida,
    pub categoria_id: i64,
    /// Category name (joined on read)
    pub categoria: Option<String>,
    /// Category icon (joined on read)
    pub categoria_icone: Option<String>,
    pub item: String,
    pub valor: f64,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    /// Excluded from aggregate totals while remaining visible in listings
    pub nao_contabilizar: bool,
    pub criado_por: i64,
    pub criador_nome: Option<String>,
    pub criado_em: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovaSaida {
    pub data: String,
    pub tipo: TipoSaida,
    pub categoria_id: i64,
    pub item: String,
    pub valor: f64,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub nao_contabilizar: bool,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaidaUpdate {
    pub data: Option<String>,
    pub tipo: Option<TipoSaida>,
    pub categoria_id: Option<i64>,
    pub item: Option<String>,
    pub valor: Option<f64>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub nao_contabilizar: Option<bool>,
}

/// Typed filter for saída listings and counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaidaFiltro {
    pub tipo: Option<TipoSaida>,
    pub categoria_id: Option<i64>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    /// Substring match against item/fornecedor/observacoes
    pub busca: Option<String>,
    pub ordenar: Option<Ordenacao>,
    pub limite: Option<i64>,
    pub offset: Option<i64>,
    pub incluir_deletados: bool,
}

/// Aggregate row: total and count grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalPorCategoria {
    pub categoria: Option<String>,
    pub categoria_icone: Option<String>,
    pub total: f64,
    pub quantidade: i64,
}
