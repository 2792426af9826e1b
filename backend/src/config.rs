//! Application configuration, resolved once from the environment at
//! startup and injected where needed.

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// PIX key the payloads point at (email, phone, CPF/CNPJ or random key)
    pub pix_chave: String,
    /// Recipient name embedded in the payload (truncated to 25 chars)
    pub pix_nome: String,
    /// Recipient city embedded in the payload (truncated to 15 chars)
    pub pix_cidade: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:caixa.db".into()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            pix_chave: env::var("PIX_CHAVE").unwrap_or_else(|_| "suachave@email.com".into()),
            pix_nome: env::var("PIX_NOME").unwrap_or_else(|_| "Caixa Familiar".into()),
            pix_cidade: env::var("PIX_CIDADE").unwrap_or_else(|_| "Sua Cidade".into()),
        }
    }
}
