//! Income ledger record (entrada).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::models::Ordenacao;

/// Closed set of income types. Unknown wire values are rejected at the
/// boundary instead of being carried as free strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoEntrada {
    /// Donation handed directly to the family
    Doacao,
    /// Pension income
    Aposentadoria,
    /// Balance carried in from outside the ledger
    Saldo,
    /// Entry created by approving a pending PIX contribution
    Contribuicao,
}

impl TipoEntrada {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoEntrada::Doacao => "doacao",
            TipoEntrada::Aposentadoria => "aposentadoria",
            TipoEntrada::Saldo => "saldo",
            TipoEntrada::Contribuicao => "contribuicao",
        }
    }
}

impl fmt::Display for TipoEntrada {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoEntrada {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doacao" => Ok(TipoEntrada::Doacao),
            "aposentadoria" => Ok(TipoEntrada::Aposentadoria),
            "saldo" => Ok(TipoEntrada::Saldo),
            "contribuicao" => Ok(TipoEntrada::Contribuicao),
            other => Err(DomainError::Validation(format!(
                "Tipo de entrada inválido: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrada {
    pub id: i64,
    /// Ledger date, `YYYY-MM-DD`
    pub data: String,
    pub tipo: TipoEntrada,
    pub descricao: String,
    /// Person the income is attributed to; for approved contributions this
    /// holds the donor's real name and is only shown to admins
    pub pessoa: Option<String>,
    pub valor: f64,
    pub observacoes: Option<String>,
    pub criado_por: i64,
    /// Display name of the creating admin (joined on read)
    pub criador_nome: Option<String>,
    pub criado_em: String,
    /// Soft-delete timestamp; rows with a value are excluded from listings
    /// and aggregates by default
    pub deleted_at: Option<String>,
}

/// Fields for creating an entrada. The date is validated as a real
/// calendar date by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NovaEntrada {
    pub data: String,
    pub tipo: TipoEntrada,
    pub descricao: String,
    pub pessoa: Option<String>,
    pub valor: f64,
    pub observacoes: Option<String>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntradaUpdate {
    pub data: Option<String>,
    pub tipo: Option<TipoEntrada>,
    pub descricao: Option<String>,
    pub pessoa: Option<String>,
    pub valor: Option<f64>,
    pub observacoes: Option<String>,
}

/// Typed filter for entrada listings and counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntradaFiltro {
    pub tipo: Option<TipoEntrada>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    /// Substring match against descricao/observacoes
    pub busca: Option<String>,
    pub ordenar: Option<Ordenacao>,
    pub limite: Option<i64>,
    pub offset: Option<i64>,
    pub incluir_deletados: bool,
}
