//! Expense classification tag (categoria).

use serde::{Deserialize, Serialize};

pub const COR_PADRAO: &str = "#6B7280";
pub const ICONE_PADRAO: &str = "fa-folder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categoria {
    pub id: i64,
    pub nome: String,
    pub descricao: Option<String>,
    pub cor: String,
    pub icone: String,
    pub ativa: bool,
    pub criado_em: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovaCategoria {
    pub nome: String,
    pub descricao: Option<String>,
    pub cor: Option<String>,
    pub icone: Option<String>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoriaUpdate {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub cor: Option<String>,
    pub icone: Option<String>,
    pub ativa: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoriaFiltro {
    pub busca: Option<String>,
    pub incluir_inativas: bool,
}
