//! Visitor-submitted contribution awaiting admin review.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Lifecycle of a pending contribution. `Aprovada` and `Rejeitada` are
/// terminal: there is no transition out of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusContribuicao {
    Pendente,
    Aprovada,
    Rejeitada,
}

impl StatusContribuicao {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusContribuicao::Pendente => "pendente",
            StatusContribuicao::Aprovada => "aprovada",
            StatusContribuicao::Rejeitada => "rejeitada",
        }
    }
}

impl fmt::Display for StatusContribuicao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusContribuicao {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(StatusContribuicao::Pendente),
            "aprovada" => Ok(StatusContribuicao::Aprovada),
            "rejeitada" => Ok(StatusContribuicao::Rejeitada),
            other => Err(DomainError::Validation(format!(
                "Status de contribuição inválido: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContribuicaoPendente {
    pub id: i64,
    /// Donor name as entered on submission, free text
    pub nome_doador: Option<String>,
    /// Name attached to the submitting visitor identity, when known
    pub nome_sessao: Option<String>,
    /// Donor explicitly opted out of name display. Independent of whether
    /// a name was even given.
    pub exibir_anonimo: bool,
    pub valor: f64,
    /// Carries the PIX txid for audit; rejection reasons are appended here
    pub observacoes: Option<String>,
    pub status: StatusContribuicao,
    /// Admin that resolved the row; set exactly when status is terminal
    pub aprovado_por: Option<i64>,
    /// Display name of the resolving admin (joined on read)
    pub aprovador_nome: Option<String>,
    pub aprovado_em: Option<String>,
    /// Ledger entry created on approval; stays NULL for rejected rows
    pub entrada_id: Option<i64>,
    pub criado_em: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovaContribuicao {
    pub nome_doador: Option<String>,
    pub nome_sessao: Option<String>,
    pub exibir_anonimo: bool,
    pub valor: f64,
    pub observacoes: Option<String>,
}

/// Partial update of a still-pending row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContribuicaoUpdate {
    pub nome_doador: Option<String>,
    pub exibir_anonimo: Option<bool>,
    pub valor: Option<f64>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContribuicaoFiltro {
    pub status: Option<StatusContribuicao>,
    /// Creation-date range, `YYYY-MM-DD`
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}
