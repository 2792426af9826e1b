//! Admin-issued guest access token.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAcesso {
    pub id: i64,
    /// 64 lowercase hex characters (32 random bytes)
    pub token: String,
    pub nome_convidado: String,
    pub ativo: bool,
    /// `YYYY-MM-DD HH:MM:SS` UTC; None means the token never expires
    /// until deactivated
    pub expira_em: Option<String>,
    /// Touched on every successful validation
    pub ultimo_acesso: Option<String>,
    pub criado_por: i64,
    /// Display name of the issuing admin (joined on read)
    pub criado_por_nome: Option<String>,
    pub criado_em: String,
}

/// Aggregate counters over all tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total: i64,
    pub ativos: i64,
    pub inativos: i64,
    pub expirados: i64,
    pub ja_acessados: i64,
}
