//! Category management. Deletion is blocked while any saída still
//! references the category; deactivation is the reversible alternative.

use crate::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::categoria::{
    Categoria, CategoriaFiltro, CategoriaUpdate, NovaCategoria,
};
use crate::storage::repositories::{CategoriaRepository, SaidaRepository};
use crate::storage::DbConnection;

pub struct CategoriaService {
    repo: CategoriaRepository,
    saidas: SaidaRepository,
}

impl CategoriaService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repo: CategoriaRepository::new(db.clone()),
            saidas: SaidaRepository::new(db),
        }
    }

    pub async fn create(&self, ctx: &RequestContext, nova: NovaCategoria) -> DomainResult<Categoria> {
        ctx.require_admin()?;

        if nova.nome.trim().is_empty() {
            return Err(DomainError::Validation("Nome é obrigatório".into()));
        }

        let id = self.repo.create(&nova).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Integrity("Erro ao criar categoria".into()))
    }

    pub async fn get(&self, id: i64) -> DomainResult<Categoria> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Categoria não encontrada: {id}")))
    }

    pub async fn list(&self, filtro: &CategoriaFiltro) -> DomainResult<Vec<Categoria>> {
        Ok(self.repo.list(filtro).await?)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        dados: CategoriaUpdate,
    ) -> DomainResult<bool> {
        ctx.require_admin()?;

        if let Some(nome) = &dados.nome {
            if nome.trim().is_empty() {
                return Err(DomainError::Validation("Nome é obrigatório".into()));
            }
        }

        Ok(self.repo.update(id, &dados).await?)
    }

    /// Hard delete, refused while saídas (soft-deleted included) still
    /// point at the category.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> DomainResult<bool> {
        ctx.require_admin()?;

        self.get(id).await?;

        let referencias = self.repo.count_referencing_saidas(id).await?;
        if referencias > 0 {
            return Err(DomainError::StateConflict(format!(
                "Não é possível excluir esta categoria pois existem {referencias} saída(s) associada(s)"
            )));
        }

        Ok(self.repo.delete(id).await?)
    }

    pub async fn set_ativa(&self, ctx: &RequestContext, id: i64, ativa: bool) -> DomainResult<bool> {
        ctx.require_admin()?;
        Ok(self.repo.set_ativa(id, ativa).await?)
    }

    /// Count of non-deleted saídas in the category.
    pub async fn contar_saidas(&self, id: i64) -> DomainResult<i64> {
        Ok(self.saidas.contar_por_categoria(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::saida::{NovaSaida, TipoSaida};

    async fn setup() -> (CategoriaService, RequestContext, DbConnection) {
        let db = DbConnection::init_test().await.expect("test database");
        let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
        (
            CategoriaService::new(db.clone()),
            RequestContext::admin(admin_id),
            db,
        )
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let (service, ctx, _) = setup().await;

        let categoria = service
            .create(
                &ctx,
                NovaCategoria {
                    nome: "Farmácia".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(categoria.cor, "#6B7280");
        assert_eq!(categoria.icone, "fa-folder");
        assert!(categoria.ativa);

        let err = service
            .create(&ctx, NovaCategoria::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_blocked_while_saidas_reference_it() {
        let (service, ctx, db) = setup().await;
        let admin_id = ctx.require_admin().unwrap();

        let categoria = service
            .create(
                &ctx,
                NovaCategoria {
                    nome: "Mercado".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let saidas = SaidaRepository::new(db);
        let saida_id = saidas
            .create(
                &NovaSaida {
                    data: "2025-01-10".to_string(),
                    tipo: TipoSaida::Compra,
                    categoria_id: categoria.id,
                    item: "Compras".to_string(),
                    valor: 12.5,
                    fornecedor: None,
                    observacoes: None,
                    nao_contabilizar: false,
                },
                admin_id,
            )
            .await
            .unwrap();

        let err = service.delete(&ctx, categoria.id).await.unwrap_err();
        match err {
            DomainError::StateConflict(msg) => assert!(msg.contains("1 saída(s)")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Soft-deleted saídas still block deletion
        saidas.soft_delete(saida_id).await.unwrap();
        assert!(service.delete(&ctx, categoria.id).await.is_err());
        assert_eq!(service.contar_saidas(categoria.id).await.unwrap(), 0);

        saidas.delete(saida_id).await.unwrap();
        assert!(service.delete(&ctx, categoria.id).await.unwrap());
        assert!(matches!(
            service.get(categoria.id).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn inactive_categories_hidden_by_default() {
        let (service, ctx, _) = setup().await;

        let ativa = service
            .create(
                &ctx,
                NovaCategoria {
                    nome: "Ativa".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let inativa = service
            .create(
                &ctx,
                NovaCategoria {
                    nome: "Inativa".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(service.set_ativa(&ctx, inativa.id, false).await.unwrap());

        let visiveis = service.list(&CategoriaFiltro::default()).await.unwrap();
        assert_eq!(visiveis.len(), 1);
        assert_eq!(visiveis[0].id, ativa.id);

        let todas = service
            .list(&CategoriaFiltro {
                incluir_inativas: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(todas.len(), 2);
    }

    #[tokio::test]
    async fn mutations_require_admin() {
        let (service, _, _) = setup().await;
        let anon = RequestContext::anonymous();

        let err = service
            .create(
                &anon,
                NovaCategoria {
                    nome: "X".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        let err = service.delete(&anon, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }
}
