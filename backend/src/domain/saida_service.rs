//! Expense ledger service. A saída always references an existing
//! categoria, and every aggregate excludes rows flagged
//! `nao_contabilizar`.

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::saida::{
    NovaSaida, Saida, SaidaFiltro, SaidaUpdate, TotalPorCategoria,
};
use crate::domain::models::{TotalMensal, TotalPorTipo};
use crate::domain::{periodo_mes, validar_data};
use crate::storage::repositories::{CategoriaRepository, SaidaRepository};
use crate::storage::DbConnection;

/// Monthly summary: total, per-type and per-category breakdowns plus the
/// row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumoMensalSaida {
    pub total: f64,
    pub por_tipo: Vec<TotalPorTipo>,
    pub por_categoria: Vec<TotalPorCategoria>,
    pub quantidade: i64,
}

pub struct SaidaService {
    repo: SaidaRepository,
    categorias: CategoriaRepository,
}

impl SaidaService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repo: SaidaRepository::new(db.clone()),
            categorias: CategoriaRepository::new(db),
        }
    }

    async fn require_categoria(&self, categoria_id: i64) -> DomainResult<()> {
        if self.categorias.find_by_id(categoria_id).await?.is_none() {
            return Err(DomainError::Validation(format!(
                "Categoria não encontrada: {categoria_id}"
            )));
        }
        Ok(())
    }

    pub async fn create(&self, ctx: &RequestContext, nova: NovaSaida) -> DomainResult<Saida> {
        let admin_id = ctx.require_admin()?;

        validar_data(&nova.data)?;
        if nova.item.trim().is_empty() {
            return Err(DomainError::Validation("Item é obrigatório".into()));
        }
        if nova.valor <= 0.0 {
            return Err(DomainError::Validation(
                "Valor deve ser maior que zero".into(),
            ));
        }
        self.require_categoria(nova.categoria_id).await?;

        let id = self.repo.create(&nova, admin_id).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao criar saída".into()))
    }

    pub async fn get(&self, id: i64) -> DomainResult<Saida> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Saída não encontrada: {id}")))
    }

    pub async fn list(&self, filtro: &SaidaFiltro) -> DomainResult<Vec<Saida>> {
        Ok(self.repo.list(filtro).await?)
    }

    /// Latest saídas, newest first.
    pub async fn ultimas(&self, limite: i64) -> DomainResult<Vec<Saida>> {
        let filtro = SaidaFiltro {
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
        dados: SaidaUpdate,
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
        if let Some(categoria_id) = dados.categoria_id {
            self.require_categoria(categoria_id).await?;
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
        categoria_id: Option<i64>,
    ) -> DomainResult<f64> {
        Ok(self
            .repo
            .total_por_periodo(data_inicio, data_fim, tipo, categoria_id)
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

    pub async fn totais_por_categoria(
        &self,
        data_inicio: &str,
        data_fim: &str,
    ) -> DomainResult<Vec<TotalPorCategoria>> {
        Ok(self.repo.totais_por_categoria(data_inicio, data_fim).await?)
    }

    pub async fn contar(&self, filtro: &SaidaFiltro) -> DomainResult<i64> {
        Ok(self.repo.contar(filtro).await?)
    }

    /// Totals for every month of a year, zero-filled to 12 entries.
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

    pub async fn resumo_mensal(&self, mes: u32, ano: i32) -> DomainResult<ResumoMensalSaida> {
        let (inicio, fim) = periodo_mes(mes, ano)?;

        Ok(ResumoMensalSaida {
            total: self.total_por_periodo(&inicio, &fim, None, None).await?,
            por_tipo: self.totais_por_tipo(&inicio, &fim).await?,
            por_categoria: self.totais_por_categoria(&inicio, &fim).await?,
            quantidade: self
                .contar(&SaidaFiltro {
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
    use crate::domain::models::categoria::NovaCategoria;
    use crate::domain::models::saida::TipoSaida;

    async fn setup() -> (SaidaService, RequestContext, i64) {
        let db = DbConnection::init_test().await.expect("test database");
        let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
        let categorias = CategoriaRepository::new(db.clone());
        let categoria_id = categorias
            .create(&NovaCategoria {
                nome: "Mercado".to_string(),
                ..Default::default()
            })
            .await
            .expect("insert categoria");
        (
            SaidaService::new(db),
            RequestContext::admin(admin_id),
            categoria_id,
        )
    }

    fn nova(data: &str, categoria_id: i64, valor: f64, nao_contabilizar: bool) -> NovaSaida {
        NovaSaida {
            data: data.to_string(),
            tipo: TipoSaida::Compra,
            categoria_id,
            item: "Compra de teste".to_string(),
            valor,
            fornecedor: None,
            observacoes: None,
            nao_contabilizar,
        }
    }

    #[tokio::test]
    async fn create_requires_existing_categoria() {
        let (service, ctx, categoria_id) = setup().await;

        let err = service
            .create(&ctx, nova("2025-01-10", 9999, 10.0, false))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let saida = service
            .create(&ctx, nova("2025-01-10", categoria_id, 10.0, false))
            .await
            .unwrap();
        assert_eq!(saida.categoria.as_deref(), Some("Mercado"));
    }

    #[tokio::test]
    async fn aggregates_exclude_do_not_count_rows() {
        let (service, ctx, categoria_id) = setup().await;

        service
            .create(&ctx, nova("2025-03-05", categoria_id, 100.0, false))
            .await
            .unwrap();
        service
            .create(&ctx, nova("2025-03-10", categoria_id, 50.0, true))
            .await
            .unwrap();

        // Flagged row is excluded from totals but still listed
        let total = service
            .total_por_periodo("2025-03-01", "2025-03-31", None, None)
            .await
            .unwrap();
        assert_eq!(total, 100.0);
        assert_eq!(service.total_geral().await.unwrap(), 100.0);
        assert_eq!(
            service.list(&SaidaFiltro::default()).await.unwrap().len(),
            2
        );

        let por_categoria = service
            .totais_por_categoria("2025-03-01", "2025-03-31")
            .await
            .unwrap();
        assert_eq!(por_categoria.len(), 1);
        assert_eq!(por_categoria[0].total, 100.0);
        assert_eq!(por_categoria[0].quantidade, 1);

        let meses = service.por_mes(2025).await.unwrap();
        assert_eq!(meses[2].total, 100.0);
    }

    #[tokio::test]
    async fn update_validates_categoria_and_value() {
        let (service, ctx, categoria_id) = setup().await;

        let saida = service
            .create(&ctx, nova("2025-04-01", categoria_id, 20.0, false))
            .await
            .unwrap();

        let err = service
            .update(
                &ctx,
                saida.id,
                SaidaUpdate {
                    categoria_id: Some(4242),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .update(
                &ctx,
                saida.id,
                SaidaUpdate {
                    valor: Some(-1.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert!(service
            .update(
                &ctx,
                saida.id,
                SaidaUpdate {
                    nao_contabilizar: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap());
        assert_eq!(service.total_geral().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn mutations_require_admin() {
        let (service, _, categoria_id) = setup().await;
        let anon = RequestContext::anonymous();

        let err = service
            .create(&anon, nova("2025-04-01", categoria_id, 20.0, false))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        let err = service.delete(&anon, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }

    #[tokio::test]
    async fn resumo_mensal_combines_breakdowns() {
        let (service, ctx, categoria_id) = setup().await;

        service
            .create(&ctx, nova("2025-05-02", categoria_id, 30.0, false))
            .await
            .unwrap();
        service
            .create(&ctx, nova("2025-05-20", categoria_id, 45.0, false))
            .await
            .unwrap();

        let resumo = service.resumo_mensal(5, 2025).await.unwrap();
        assert_eq!(resumo.total, 75.0);
        assert_eq!(resumo.quantidade, 2);
        assert_eq!(resumo.por_tipo.len(), 1);
        assert_eq!(resumo.por_categoria.len(), 1);
    }
}
