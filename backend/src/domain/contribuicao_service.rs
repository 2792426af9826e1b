//! Pending-contribution workflow: visitor submission, admin review queue,
//! approval into the income ledger and rejection with a recorded reason.

use crate::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::contribuicao::{
    ContribuicaoFiltro, ContribuicaoPendente, ContribuicaoUpdate, NovaContribuicao,
    StatusContribuicao,
};
use crate::domain::models::entrada::{NovaEntrada, TipoEntrada};
use crate::storage::repositories::ContribuicaoRepository;
use crate::storage::DbConnection;

/// Name shown on the ledger when the donor opted out or never gave one.
const NOME_ANONIMO: &str = "Anonymous";

pub struct ContribuicaoService {
    repo: ContribuicaoRepository,
}

impl ContribuicaoService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repo: ContribuicaoRepository::new(db),
        }
    }

    /// Visitor-facing submission; no admin gate.
    pub async fn submit(&self, nova: NovaContribuicao) -> DomainResult<ContribuicaoPendente> {
        if nova.valor <= 0.0 {
            return Err(DomainError::Validation(
                "Valor deve ser maior que zero".into(),
            ));
        }

        let nova = NovaContribuicao {
            nome_doador: nova
                .nome_doador
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            ..nova
        };

        let id = self.repo.create(&nova).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao registrar contribuição".into()))
    }

    pub async fn get(&self, id: i64) -> DomainResult<ContribuicaoPendente> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Contribuição não encontrada: {id}")))
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        filtro: &ContribuicaoFiltro,
    ) -> DomainResult<Vec<ContribuicaoPendente>> {
        ctx.require_admin()?;
        Ok(self.repo.list(filtro).await?)
    }

    pub async fn count_pending(&self, ctx: &RequestContext) -> DomainResult<i64> {
        ctx.require_admin()?;
        Ok(self.repo.count_pending().await?)
    }

    /// Approve a pending contribution, creating its ledger entrada dated
    /// today. The entrada `pessoa` keeps the real name for the books; the
    /// submission note uses the public display name, which honors the
    /// donor's anonymity choice.
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> DomainResult<ContribuicaoPendente> {
        let admin_id = ctx.require_admin()?;

        let contribuicao = self.get(id).await?;
        if contribuicao.status != StatusContribuicao::Pendente {
            return Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            ));
        }

        let exibicao = nome_exibicao(&contribuicao);
        let pessoa = contribuicao
            .nome_sessao
            .clone()
            .or_else(|| contribuicao.nome_doador.clone());

        let entrada = NovaEntrada {
            data: chrono::Local::now().date_naive().to_string(),
            tipo: TipoEntrada::Contribuicao,
            descricao: "Contribuição".to_string(),
            pessoa,
            valor: contribuicao.valor,
            observacoes: Some(format!("Submitted by: {exibicao}")),
        };

        match self.repo.approve(id, admin_id, &entrada).await? {
            Some(_) => self.get(id).await,
            // Lost the race to a concurrent approve; nothing was written
            None => Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            )),
        }
    }

    /// Reject a pending contribution. The reason, when given, is appended
    /// to the existing observacoes; no ledger entrada is ever created.
    pub async fn reject(
        &self,
        ctx: &RequestContext,
        id: i64,
        motivo: Option<&str>,
    ) -> DomainResult<ContribuicaoPendente> {
        let admin_id = ctx.require_admin()?;

        let contribuicao = self.get(id).await?;
        if contribuicao.status != StatusContribuicao::Pendente {
            return Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            ));
        }

        let observacoes = match motivo.map(str::trim).filter(|m| !m.is_empty()) {
            Some(motivo) => Some(match &contribuicao.observacoes {
                Some(atuais) => format!("{atuais}\n\nMotivo da rejeição: {motivo}"),
                None => format!("Motivo da rejeição: {motivo}"),
            }),
            None => contribuicao.observacoes.clone(),
        };

        if !self
            .repo
            .reject(id, admin_id, observacoes.as_deref())
            .await?
        {
            return Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            ));
        }

        self.get(id).await
    }

    /// Edit a still-pending contribution.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        dados: ContribuicaoUpdate,
    ) -> DomainResult<bool> {
        ctx.require_admin()?;

        if let Some(valor) = dados.valor {
            if valor <= 0.0 {
                return Err(DomainError::Validation(
                    "Valor deve ser maior que zero".into(),
                ));
            }
        }

        let contribuicao = self.get(id).await?;
        if contribuicao.status != StatusContribuicao::Pendente {
            return Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            ));
        }

        Ok(self.repo.update(id, &dados).await?)
    }

    /// Discard a still-pending contribution.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;

        let contribuicao = self.get(id).await?;
        if contribuicao.status != StatusContribuicao::Pendente {
            return Err(DomainError::StateConflict(
                "Contribuição já foi processada".into(),
            ));
        }

        Ok(self.repo.delete(id).await?)
    }
}

/// Public display name: anonymity flag wins, then the donor-typed name,
/// then the visitor session name.
fn nome_exibicao(contribuicao: &ContribuicaoPendente) -> String {
    if contribuicao.exibir_anonimo {
        return NOME_ANONIMO.to_string();
    }
    contribuicao
        .nome_doador
        .clone()
        .or_else(|| contribuicao.nome_sessao.clone())
        .unwrap_or_else(|| NOME_ANONIMO.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entrada_service::EntradaService;
    use crate::domain::models::entrada::EntradaFiltro;

    async fn setup() -> (ContribuicaoService, EntradaService, RequestContext) {
        let db = DbConnection::init_test().await.expect("test database");
        let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
        (
            ContribuicaoService::new(db.clone()),
            EntradaService::new(db),
            RequestContext::admin(admin_id),
        )
    }

    fn nova(nome: Option<&str>, exibir_anonimo: bool, valor: f64) -> NovaContribuicao {
        NovaContribuicao {
            nome_doador: nome.map(str::to_string),
            nome_sessao: None,
            exibir_anonimo,
            valor,
            observacoes: None,
        }
    }

    #[tokio::test]
    async fn submit_then_approve_creates_ledger_entrada() {
        let (service, entradas, ctx) = setup().await;

        let pendente = service
            .submit(nova(Some("Maria"), false, 75.50))
            .await
            .unwrap();
        assert_eq!(pendente.status, StatusContribuicao::Pendente);

        let fila = service
            .list(
                &ctx,
                &ContribuicaoFiltro {
                    status: Some(StatusContribuicao::Pendente),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(fila.len(), 1);
        assert_eq!(service.count_pending(&ctx).await.unwrap(), 1);

        let aprovada = service.approve(&ctx, pendente.id).await.unwrap();
        assert_eq!(aprovada.status, StatusContribuicao::Aprovada);
        assert_eq!(aprovada.aprovador_nome.as_deref(), Some("Admin"));
        assert!(aprovada.aprovado_em.is_some());

        let entrada = entradas.get(aprovada.entrada_id.unwrap()).await.unwrap();
        assert_eq!(entrada.tipo, TipoEntrada::Contribuicao);
        assert_eq!(entrada.descricao, "Contribuição");
        assert_eq!(entrada.pessoa.as_deref(), Some("Maria"));
        assert_eq!(entrada.valor, 75.50);
        assert_eq!(
            entrada.observacoes.as_deref(),
            Some("Submitted by: Maria")
        );
        assert_eq!(service.count_pending(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn anonymous_flag_hides_name_in_note_but_not_in_pessoa() {
        let (service, entradas, ctx) = setup().await;

        let pendente = service
            .submit(NovaContribuicao {
                nome_doador: Some("Carlos".to_string()),
                nome_sessao: Some("Carlos Silva".to_string()),
                exibir_anonimo: true,
                valor: 20.0,
                observacoes: None,
            })
            .await
            .unwrap();

        let aprovada = service.approve(&ctx, pendente.id).await.unwrap();
        let entrada = entradas.get(aprovada.entrada_id.unwrap()).await.unwrap();
        assert_eq!(
            entrada.observacoes.as_deref(),
            Some("Submitted by: Anonymous")
        );
        // The books keep the real identity, session name first
        assert_eq!(entrada.pessoa.as_deref(), Some("Carlos Silva"));
    }

    #[tokio::test]
    async fn nameless_submission_falls_back_to_anonymous() {
        let (service, entradas, ctx) = setup().await;

        let pendente = service.submit(nova(Some("   "), false, 5.0)).await.unwrap();
        assert_eq!(pendente.nome_doador, None);

        let aprovada = service.approve(&ctx, pendente.id).await.unwrap();
        let entrada = entradas.get(aprovada.entrada_id.unwrap()).await.unwrap();
        assert_eq!(
            entrada.observacoes.as_deref(),
            Some("Submitted by: Anonymous")
        );
        assert_eq!(entrada.pessoa, None);
    }

    #[tokio::test]
    async fn approving_twice_conflicts_and_leaves_ledger_unchanged() {
        let (service, entradas, ctx) = setup().await;

        let pendente = service.submit(nova(Some("Ana"), false, 30.0)).await.unwrap();
        service.approve(&ctx, pendente.id).await.unwrap();

        let err = service.approve(&ctx, pendente.id).await.unwrap_err();
        assert!(matches!(err, DomainError::StateConflict(_)));

        let todas = entradas.list(&EntradaFiltro::default()).await.unwrap();
        assert_eq!(todas.len(), 1);
        assert_eq!(entradas.total_geral().await.unwrap(), 30.0);
    }

    #[tokio::test]
    async fn reject_records_reason_and_never_touches_ledger() {
        let (service, entradas, ctx) = setup().await;

        let pendente = service
            .submit(NovaContribuicao {
                nome_doador: Some("Bruno".to_string()),
                nome_sessao: None,
                exibir_anonimo: false,
                valor: 12.0,
                observacoes: Some("PIX txid: CONT1234".to_string()),
            })
            .await
            .unwrap();

        let rejeitada = service
            .reject(&ctx, pendente.id, Some("Valor não confirmado"))
            .await
            .unwrap();
        assert_eq!(rejeitada.status, StatusContribuicao::Rejeitada);
        assert_eq!(rejeitada.entrada_id, None);
        assert_eq!(
            rejeitada.observacoes.as_deref(),
            Some("PIX txid: CONT1234\n\nMotivo da rejeição: Valor não confirmado")
        );

        assert!(entradas.list(&EntradaFiltro::default()).await.unwrap().is_empty());

        let err = service.reject(&ctx, pendente.id, None).await.unwrap_err();
        assert!(matches!(err, DomainError::StateConflict(_)));
    }

    #[tokio::test]
    async fn update_and_delete_apply_to_pending_rows_only() {
        let (service, _, ctx) = setup().await;

        let pendente = service.submit(nova(Some("Rita"), false, 40.0)).await.unwrap();
        assert!(service
            .update(
                &ctx,
                pendente.id,
                ContribuicaoUpdate {
                    valor: Some(45.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap());
        assert_eq!(service.get(pendente.id).await.unwrap().valor, 45.0);

        let aprovada = service.approve(&ctx, pendente.id).await.unwrap();
        let err = service
            .update(
                &ctx,
                aprovada.id,
                ContribuicaoUpdate {
                    valor: Some(50.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StateConflict(_)));

        let err = service.delete(&ctx, aprovada.id).await.unwrap_err();
        assert!(matches!(err, DomainError::StateConflict(_)));

        let descartavel = service.submit(nova(None, false, 8.0)).await.unwrap();
        assert!(service.delete(&ctx, descartavel.id).await.unwrap());
        assert!(matches!(
            service.get(descartavel.id).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn submit_rejects_non_positive_values() {
        let (service, _, _) = setup().await;

        let err = service.submit(nova(None, false, 0.0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.submit(nova(None, false, -3.0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn review_operations_require_admin() {
        let (service, _, ctx) = setup().await;
        let visitante = RequestContext::visitor(1);

        let pendente = service.submit(nova(Some("Zé"), false, 10.0)).await.unwrap();

        let err = service.approve(&visitante, pendente.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
        let err = service
            .reject(&visitante, pendente.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
        let err = service
            .list(&visitante, &ContribuicaoFiltro::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        // Admin still can after the failed attempts
        assert!(service.approve(&ctx, pendente.id).await.is_ok());
    }
}
