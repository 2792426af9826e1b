//! Anonymous visitor identity tracked per browser fingerprint under a
//! given access token.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitante {
    pub id: i64,
    pub token_id: i64,
    /// Opaque fingerprint hash; one row per distinct hash per token. Only
    /// stable across visits when the client replays the same value.
    pub visitante_hash: String,
    /// Self-reported name; None when the visitor declined to identify
    pub nome: Option<String>,
    /// Whether the identification prompt was answered. Once true, stays
    /// true permanently.
    pub respondeu_modal: bool,
    pub primeiro_acesso: String,
    pub ultimo_acesso: String,
    pub total_acessos: i64,
    pub user_agent: Option<String>,
}

/// Aggregate counters for the visitors of one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitanteStats {
    pub total_visitantes: i64,
    pub identificados: i64,
    pub total_acessos: i64,
    pub ultimo_acesso_geral: Option<String>,
}
