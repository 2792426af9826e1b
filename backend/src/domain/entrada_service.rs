//! Income ledger service: CRUD with validation gates plus aggregate
//! queries.

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::entrada::{Entrada, EntradaFiltro, EntradaUpdate, NovaEntrada};
use crate::domain::models::{TotalMensal, TotalPorTipo};
use crate::domain::{periodo_mes, validar_data};
use crate::storage::repositories::EntradaRepository;
use crate::storage::DbConnection;

/// Monthly summary: total, per-type breakdown and row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumoMensalEntrada {
    pub total: f64,
    pub por_tipo: Vec<TotalPorTipo>,
    pub quantidade: i64,
}

pub struct EntradaService {
    repo: EntradaRepository,
}

impl EntradaService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repo: EntradaRepository::new(db),
        }
    }

    pub async fn create(&self, ctx: &RequestContext, nova: NovaEntrada) -> DomainResult<Entrada> {
        let admin_id = ctx.require_admin()?;

        validar_data(&nova.data)?;
        if nova.descricao.trim().is_empty() {
            return Err(DomainError::Validation("Descrição é obrigatória".into()));
        }
        if nova.valor <= 0.0 {
            return Err(DomainError::Validation(
                "Valor deve ser maior que zero".into(),
            ));
        }

        let id = self.repo.create(&nova, admin_id).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao criar entrada".into()))
    }

    pub async fn get(&self, id: i64) -> DomainResult<Entrada> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Entrada não encontrada: {id}")))
    }

    pub async fn list(&self, filtro: &EntradaFiltro) -> DomainResult<Vec<Entrada>> {
        Ok(self.repo.list(filtro).await?)
    }

    /// Latest entradas, newest first.
    pub async fn ultimas(&self, limite: i64) -> DomainResult<Vec<Entrada>> {
        let filtro = EntradaFiltro {
            limite: Some(limite),
            ..Default::default()
        };
        Ok(self.repo.list(&filtro).await?)
    }

    /// Partial update; false when nothing was supplied or no row matched.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        dados: EntradaUpdate,
    ) -> DomainResult<bool> {
        ctx.require_admin()?;

        if let Some(data) = &dados.data {
            validar_data(data)?;
        }
        if let Some(valor) = dados.valor {
            if valor <= 0.0 {
                return Err(DomainError::Validation(
                    "Valor deve ser maior que zero".into(),
                ));
            }
        }

        Ok(self.repo.update(id, &dados).await?)
    }

    /// Hard delete.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.repo.delete(id).await?)
    }

    pub async fn soft_delete(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.repo.soft_delete(id).await?)
    }

    pub async fn restore(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.repo.restore(id).await?)
    }

    pub async fn total_por_periodo(
        &self,
        data_inicio: &str,
        data_fim: &str,
        tipo: Option<&str>,
    ) -> DomainResult<f64> {
        Ok(self
            .repo
            .total_por_periodo(data_inicio, data_fim, tipo)
            .await?)
    }

    pub async fn total_geral(&self) -> DomainResult<f64> {
        Ok(self.repo.total_geral().await?)
    }

    pub async fn totais_por_tipo(
        &self,
        data_inicio: &str,
        data_fim: &str,
    ) -> DomainResult<Vec<TotalPorTipo>> {
        Ok(self.repo.totais_por_tipo(data_inicio, data_fim).await?)
    }

    pub async fn contar(&self, filtro: &EntradaFiltro) -> DomainResult<i64> {
        Ok(self.repo.contar(filtro).await?)
    }

    /// Totals for every month of a year; months without activity come back
    /// zero-filled so callers always see 12 entries.
    pub async fn por_mes(&self, ano: i32) -> DomainResult<Vec<TotalMensal>> {
        let parciais = self.repo.por_mes(ano).await?;

        Ok((1..=12)
            .map(|mes| {
                parciais
                    .iter()
                    .find(|t| t.mes == mes)
                    .cloned()
                    .unwrap_or(TotalMensal {
                        mes,
                        total: 0.0,
                        quantidade: 0,
                    })
            })
            .collect())
    }

    pub async fn resumo_mensal(&self, mes: u32, ano: i32) -> DomainResult<ResumoMensalEntrada> {
        let (inicio, fim) = periodo_mes(mes, ano)?;

        Ok(ResumoMensalEntrada {
            total: self.total_por_periodo(&inicio, &fim, None).await?,
            por_tipo: self.totais_por_tipo(&inicio, &fim).await?,
            quantidade: self
                .contar(&EntradaFiltro {
                    mes: Some(mes),
                    ano: Some(ano),
                    ..Default::default()
                })
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::entrada::TipoEntrada;

    async fn setup() -> (EntradaService, RequestContext) {
        let db = DbConnection::init_test().await.expect("test database");
        let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
        (EntradaService::new(db), RequestContext::admin(admin_id))
    }

    fn nova(data: &str, tipo: TipoEntrada, valor: f64) -> NovaEntrada {
        NovaEntrada {
            data: data.to_string(),
            tipo,
            descricao: "Entrada de teste".to_string(),
            pessoa: None,
            valor,
            observacoes: None,
        }
    }

    #[tokio::test]
    async fn create_validates_date_and_value() {
        let (service, ctx) = setup().await;

        let err = service
            .create(&ctx, nova("2025-02-30", TipoEntrada::Doacao, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .create(&ctx, nova("2025-01-15", TipoEntrada::Doacao, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let entrada = service
            .create(&ctx, nova("2025-01-15", TipoEntrada::Doacao, 10.0))
            .await
            .unwrap();
        assert_eq!(entrada.valor, 10.0);
        assert_eq!(entrada.tipo, TipoEntrada::Doacao);
        assert_eq!(entrada.criador_nome.as_deref(), Some("Admin"));
    }

    #[tokio::test]
    async fn create_requires_admin() {
        let (service, _) = setup().await;

        let err = service
            .create(
                &RequestContext::anonymous(),
                nova("2025-01-15", TipoEntrada::Doacao, 10.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }

    #[tokio::test]
    async fn totals_and_type_grouping() {
        let (service, ctx) = setup().await;

        service
            .create(&ctx, nova("2025-03-01", TipoEntrada::Doacao, 100.0))
            .await
            .unwrap();
        service
            .create(&ctx, nova("2025-03-10", TipoEntrada::Aposentadoria, 50.0))
            .await
            .unwrap();
        service
            .create(&ctx, nova("2025-04-01", TipoEntrada::Doacao, 30.0))
            .await
            .unwrap();

        let total = service
            .total_por_periodo("2025-03-01", "2025-03-31", None)
            .await
            .unwrap();
        assert_eq!(total, 150.0);

        let total_doacao = service
            .total_por_periodo("2025-03-01", "2025-03-31", Some("doacao"))
            .await
            .unwrap();
        assert_eq!(total_doacao, 100.0);

        assert_eq!(service.total_geral().await.unwrap(), 180.0);

        let por_tipo = service
            .totais_por_tipo("2025-03-01", "2025-03-31")
            .await
            .unwrap();
        assert_eq!(por_tipo.len(), 2);
    }

    #[tokio::test]
    async fn por_mes_zero_fills_all_twelve_months() {
        let (service, ctx) = setup().await;

        service
            .create(&ctx, nova("2025-03-05", TipoEntrada::Doacao, 40.0))
            .await
            .unwrap();

        let meses = service.por_mes(2025).await.unwrap();
        assert_eq!(meses.len(), 12);
        assert_eq!(meses[2].mes, 3);
        assert_eq!(meses[2].total, 40.0);
        assert_eq!(meses[0].total, 0.0);
        assert_eq!(meses[11].quantidade, 0);
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_excluded_by_default() {
        let (service, ctx) = setup().await;

        let entrada = service
            .create(&ctx, nova("2025-05-01", TipoEntrada::Saldo, 25.0))
            .await
            .unwrap();
        assert!(service.soft_delete(&ctx, entrada.id).await.unwrap());

        assert!(service
            .list(&EntradaFiltro::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.total_geral().await.unwrap(), 0.0);

        let com_deletados = service
            .list(&EntradaFiltro {
                incluir_deletados: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(com_deletados.len(), 1);

        assert!(service.restore(&ctx, entrada.id).await.unwrap());
        assert_eq!(service.total_geral().await.unwrap(), 25.0);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (service, ctx) = setup().await;

        let entrada = service
            .create(&ctx, nova("2025-06-01", TipoEntrada::Doacao, 80.0))
            .await
            .unwrap();

        let alterado = service
            .update(
                &ctx,
                entrada.id,
                EntradaUpdate {
                    valor: Some(90.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(alterado);

        let atualizada = service.get(entrada.id).await.unwrap();
        assert_eq!(atualizada.valor, 90.0);
        assert_eq!(atualizada.descricao, "Entrada de teste");

        // Empty update touches nothing
        let alterado = service
            .update(&ctx, entrada.id, EntradaUpdate::default())
            .await
            .unwrap();
        assert!(!alterado);
    }

    #[tokio::test]
    async fn delete_is_hard() {
        let (service, ctx) = setup().await;

        let entrada = service
            .create(&ctx, nova("2025-07-01", TipoEntrada::Doacao, 15.0))
            .await
            .unwrap();
        assert!(service.delete(&ctx, entrada.id).await.unwrap());
        assert!(!service.delete(&ctx, entrada.id).await.unwrap());

        let err = service.get(entrada.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
