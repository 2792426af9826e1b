//! Guest access: admin-issued tokens and the visitor identities that show
//! up under them.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC so expiry checks
//! reduce to plain string comparison, matching SQLite's `datetime('now')`.

use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::token_acesso::{TokenAcesso, TokenStats};
use crate::domain::models::visitante::{Visitante, VisitanteStats};
use crate::storage::repositories::{TokenRepository, VisitanteRepository};
use crate::storage::DbConnection;

const FORMATO_TS: &str = "%Y-%m-%d %H:%M:%S";

fn agora() -> String {
    Utc::now().format(FORMATO_TS).to_string()
}

/// 64 lowercase hex characters from 32 random bytes.
fn gerar_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Opaque visitor fingerprint derived from request headers. Stable only
/// as long as the client sends the same header set.
pub fn fingerprint(
    user_agent: Option<&str>,
    accept_language: Option<&str>,
    accept_encoding: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.unwrap_or(""));
    hasher.update("|");
    hasher.update(accept_language.unwrap_or(""));
    hasher.update("|");
    hasher.update(accept_encoding.unwrap_or(""));
    hex::encode(hasher.finalize())
}

pub struct AcessoService {
    tokens: TokenRepository,
    visitantes: VisitanteRepository,
}

impl AcessoService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            tokens: TokenRepository::new(db.clone()),
            visitantes: VisitanteRepository::new(db),
        }
    }

    /// Issue a new token. `dias_validade` of None means no expiration.
    pub async fn issue(
        &self,
        ctx: &RequestContext,
        nome_convidado: &str,
        dias_validade: Option<i64>,
    ) -> DomainResult<TokenAcesso> {
        let admin_id = ctx.require_admin()?;

        let nome_convidado = nome_convidado.trim();
        if nome_convidado.is_empty() {
            return Err(DomainError::Validation(
                "Nome do convidado é obrigatório".into(),
            ));
        }
        if let Some(dias) = dias_validade {
            if dias <= 0 {
                return Err(DomainError::Validation(
                    "Validade deve ser maior que zero".into(),
                ));
            }
        }

        let token = gerar_token();
        let expira_em = dias_validade
            .map(|dias| (Utc::now() + Duration::days(dias)).format(FORMATO_TS).to_string());

        let id = self
            .tokens
            .create(&token, nome_convidado, expira_em.as_deref(), admin_id)
            .await?;
        self.tokens
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao criar token".into()))
    }

    /// Resolve a presented token. Returns None for unknown, deactivated or
    /// expired tokens; a successful validation also records the access.
    pub async fn validate(&self, token: &str) -> DomainResult<Option<TokenAcesso>> {
        let Some(acesso) = self.tokens.find_by_token(token).await? else {
            return Ok(None);
        };
        if !acesso.ativo {
            return Ok(None);
        }
        if let Some(expira_em) = &acesso.expira_em {
            if *expira_em < agora() {
                return Ok(None);
            }
        }

        self.tokens.touch(token).await?;
        Ok(Some(acesso))
    }

    pub async fn get(&self, ctx: &RequestContext, id: i64) -> DomainResult<TokenAcesso> {
        ctx.require_admin()?;
        self.tokens
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Token não encontrado: {id}")))
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        apenas_ativos: bool,
    ) -> DomainResult<Vec<TokenAcesso>> {
        ctx.require_admin()?;
        Ok(self.tokens.list(apenas_ativos).await?)
    }

    pub async fn set_ativo(
        &self,
        ctx: &RequestContext,
        id: i64,
        ativo: bool,
    ) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.tokens.set_ativo(id, ativo).await?)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.tokens.delete(id).await?)
    }

    /// Drop every token already past its expiration.
    pub async fn purge_expired(&self, ctx: &RequestContext) -> DomainResult<u64> {
        ctx.require_admin()?;
        Ok(self.tokens.purge_expired(&agora()).await?)
    }

    pub async fn stats(&self, ctx: &RequestContext) -> DomainResult<TokenStats> {
        ctx.require_admin()?;
        Ok(self.tokens.stats(&agora()).await?)
    }

    /// Look up the visitor for a fingerprint under a token, creating the
    /// row on first sight and bumping the access counter otherwise.
    pub async fn get_or_create_visitante(
        &self,
        token_id: i64,
        visitante_hash: &str,
        user_agent: Option<&str>,
    ) -> DomainResult<Visitante> {
        if let Some(existente) = self
            .visitantes
            .find_by_token_and_hash(token_id, visitante_hash)
            .await?
        {
            self.visitantes.touch(existente.id).await?;
            return self
                .visitantes
                .find_by_id(existente.id)
                .await?
                .ok_or_else(|| DomainError::Integrity("Erro ao atualizar visitante".into()));
        }

        let id = self
            .visitantes
            .create(token_id, visitante_hash, user_agent)
            .await?;
        self.visitantes
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao registrar visitante".into()))
    }

    /// Store the identification answer. An empty or whitespace name counts
    /// as declining, but the prompt is still marked answered.
    pub async fn record_identification(
        &self,
        visitante_id: i64,
        nome: Option<&str>,
    ) -> DomainResult<Visitante> {
        let nome = nome.map(str::trim).filter(|n| !n.is_empty());

        if !self
            .visitantes
            .record_identification(visitante_id, nome)
            .await?
        {
            return Err(DomainError::NotFound(format!(
                "Visitante não encontrado: {visitante_id}"
            )));
        }

        self.visitantes
            .find_by_id(visitante_id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao atualizar visitante".into()))
    }

    pub async fn visitante(&self, id: i64) -> DomainResult<Visitante> {
        self.visitantes
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Visitante não encontrado: {id}")))
    }

    pub async fn visitantes_do_token(
        &self,
        ctx: &RequestContext,
        token_id: i64,
    ) -> DomainResult<Vec<Visitante>> {
        ctx.require_admin()?;
        Ok(self.visitantes.list_by_token(token_id).await?)
    }

    pub async fn stats_do_token(
        &self,
        ctx: &RequestContext,
        token_id: i64,
    ) -> DomainResult<VisitanteStats> {
        ctx.require_admin()?;
        Ok(self.visitantes.stats_by_token(token_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (AcessoService, RequestContext, DbConnection) {
        let db = DbConnection::init_test().await.expect("test database");
        let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
        (
            AcessoService::new(db.clone()),
            RequestContext::admin(admin_id),
            db,
        )
    }

    #[tokio::test]
    async fn issue_generates_unique_hex_tokens() {
        let (service, ctx, _) = setup().await;

        let a = service.issue(&ctx, "Tia Ana", Some(7)).await.unwrap();
        let b = service.issue(&ctx, "Tio Beto", None).await.unwrap();

        assert_eq!(a.token.len(), 64);
        assert!(a.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);
        assert!(a.expira_em.is_some());
        assert_eq!(b.expira_em, None);
        assert_eq!(a.criado_por_nome.as_deref(), Some("Admin"));

        let err = service.issue(&ctx, "  ", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.issue(&ctx, "Zé", Some(0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn validate_accepts_live_tokens_and_records_access() {
        let (service, ctx, _) = setup().await;

        let emitido = service.issue(&ctx, "Convidado", Some(30)).await.unwrap();
        assert_eq!(emitido.ultimo_acesso, None);

        let validado = service.validate(&emitido.token).await.unwrap().unwrap();
        assert_eq!(validado.id, emitido.id);

        let depois = service.get(&ctx, emitido.id).await.unwrap();
        assert!(depois.ultimo_acesso.is_some());

        assert!(service.validate("deadbeef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn validate_refuses_inactive_and_expired_tokens() {
        let (service, ctx, db) = setup().await;
        let admin_id = ctx.require_admin().unwrap();

        let inativo = service.issue(&ctx, "Inativo", None).await.unwrap();
        assert!(service.set_ativo(&ctx, inativo.id, false).await.unwrap());
        assert!(service.validate(&inativo.token).await.unwrap().is_none());

        // Active flag alone is not enough once past the expiration
        let tokens = TokenRepository::new(db);
        tokens
            .create(&gerar_token(), "Expirado", Some("2020-01-01 00:00:00"), admin_id)
            .await
            .unwrap();
        let expirado = tokens.list(true).await.unwrap().remove(0);
        assert!(expirado.ativo);
        assert!(service.validate(&expirado.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_and_stats_cover_expired_tokens() {
        let (service, ctx, db) = setup().await;
        let admin_id = ctx.require_admin().unwrap();

        service.issue(&ctx, "Vigente", Some(10)).await.unwrap();
        let tokens = TokenRepository::new(db);
        tokens
            .create(&gerar_token(), "Velho", Some("2020-01-01 00:00:00"), admin_id)
            .await
            .unwrap();

        let stats = service.stats(&ctx).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ativos, 2);
        assert_eq!(stats.expirados, 1);
        assert_eq!(stats.ja_acessados, 0);

        assert_eq!(service.purge_expired(&ctx).await.unwrap(), 1);
        assert_eq!(service.stats(&ctx).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn visitor_rows_are_keyed_by_fingerprint() {
        let (service, ctx, _) = setup().await;

        let token = service.issue(&ctx, "Família", None).await.unwrap();
        let hash = fingerprint(Some("Mozilla/5.0"), Some("pt-BR"), Some("gzip"));

        let primeiro = service
            .get_or_create_visitante(token.id, &hash, Some("Mozilla/5.0"))
            .await
            .unwrap();
        assert_eq!(primeiro.total_acessos, 1);
        assert!(!primeiro.respondeu_modal);

        let segundo = service
            .get_or_create_visitante(token.id, &hash, Some("Mozilla/5.0"))
            .await
            .unwrap();
        assert_eq!(segundo.id, primeiro.id);
        assert_eq!(segundo.total_acessos, 2);

        let outro_hash = fingerprint(Some("curl/8.0"), None, None);
        assert_ne!(hash, outro_hash);
        let outro = service
            .get_or_create_visitante(token.id, &outro_hash, Some("curl/8.0"))
            .await
            .unwrap();
        assert_ne!(outro.id, primeiro.id);

        let stats = service.stats_do_token(&ctx, token.id).await.unwrap();
        assert_eq!(stats.total_visitantes, 2);
        assert_eq!(stats.total_acessos, 3);
        assert_eq!(stats.identificados, 0);
    }

    #[tokio::test]
    async fn identical_fingerprints_stay_separate_across_tokens() {
        let (service, ctx, _) = setup().await;

        let token_a = service.issue(&ctx, "Casa da Ana", None).await.unwrap();
        let token_b = service.issue(&ctx, "Casa do Beto", None).await.unwrap();

        // Two guests whose browsers send the same headers
        let hash = fingerprint(Some("Mozilla/5.0"), Some("pt-BR"), Some("gzip"));

        let sob_a = service
            .get_or_create_visitante(token_a.id, &hash, Some("Mozilla/5.0"))
            .await
            .unwrap();
        service
            .record_identification(sob_a.id, Some("Ana"))
            .await
            .unwrap();

        let sob_b = service
            .get_or_create_visitante(token_b.id, &hash, Some("Mozilla/5.0"))
            .await
            .unwrap();
        assert_ne!(sob_b.id, sob_a.id);
        assert_eq!(sob_b.token_id, token_b.id);
        assert_eq!(sob_b.nome, None);
        assert!(!sob_b.respondeu_modal);

        // Each token sees only its own visitor
        let de_a = service.visitantes_do_token(&ctx, token_a.id).await.unwrap();
        let de_b = service.visitantes_do_token(&ctx, token_b.id).await.unwrap();
        assert_eq!(de_a.len(), 1);
        assert_eq!(de_b.len(), 1);
        assert_eq!(de_a[0].id, sob_a.id);
        assert_eq!(de_b[0].id, sob_b.id);
    }

    #[tokio::test]
    async fn identification_answer_is_recorded_once_asked() {
        let (service, ctx, _) = setup().await;

        let token = service.issue(&ctx, "Família", None).await.unwrap();
        let hash = fingerprint(Some("Mozilla/5.0"), None, None);
        let visitante = service
            .get_or_create_visitante(token.id, &hash, None)
            .await
            .unwrap();

        // Declining still marks the prompt answered
        let anonimo = service
            .record_identification(visitante.id, Some("  "))
            .await
            .unwrap();
        assert_eq!(anonimo.nome, None);
        assert!(anonimo.respondeu_modal);

        let nomeado = service
            .record_identification(visitante.id, Some("Dona Lúcia"))
            .await
            .unwrap();
        assert_eq!(nomeado.nome.as_deref(), Some("Dona Lúcia"));

        let err = service
            .record_identification(999, Some("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_gate_covers_token_management() {
        let (service, ctx, _) = setup().await;
        let anon = RequestContext::anonymous();

        let err = service.issue(&anon, "Zé", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
        let err = service.list(&anon, false).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
        let err = service.purge_expired(&anon).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        // Validation itself is the visitor-facing path, no gate
        let token = service.issue(&ctx, "Convidado", None).await.unwrap();
        assert!(service.validate(&token.token).await.unwrap().is_some());
    }
}
