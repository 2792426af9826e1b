//! Repository for expense categories.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::categoria::{
    Categoria, CategoriaFiltro, CategoriaUpdate, NovaCategoria, COR_PADRAO, ICONE_PADRAO,
};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct CategoriaRepository {
    db: DbConnection,
}

fn map_categoria(row: &SqliteRow) -> Categoria {
    Categoria {
        id: row.get("id"),
        nome: row.get("nome"),
        descricao: row.get("descricao"),
        cor: row.get("cor"),
        icone: row.get("icone"),
        ativa: row.get::<i64, _>("ativa") != 0,
        criado_em: row.get("criado_em"),
    }
}

impl CategoriaRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, nova: &NovaCategoria) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO categorias (nome, descricao, cor, icone)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&nova.nome)
        .bind(&nova.descricao)
        .bind(nova.cor.as_deref().unwrap_or(COR_PADRAO))
        .bind(nova.icone.as_deref().unwrap_or(ICONE_PADRAO))
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Categoria>> {
        let row = sqlx::query("SELECT * FROM categorias WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(map_categoria))
    }

    /// List categories ordered by name; inactive ones only when asked.
    pub async fn list(&self, filtro: &CategoriaFiltro) -> Result<Vec<Categoria>> {
        let mut clauses: Vec<&str> = Vec::new();

        if !filtro.incluir_inativas {
            clauses.push("ativa = 1");
        }
        if filtro.busca.is_some() {
            clauses.push("(nome LIKE ? OR descricao LIKE ?)");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!("SELECT * FROM categorias {where_clause} ORDER BY nome ASC");

        let mut query = sqlx::query(&sql);
        if let Some(busca) = &filtro.busca {
            let pattern = format!("%{busca}%");
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(map_categoria).collect())
    }

    /// Apply a partial update. Returns false when no field was supplied or
    /// no row matched.
    pub async fn update(&self, id: i64, dados: &CategoriaUpdate) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();

        if dados.nome.is_some() {
            sets.push("nome = ?");
        }
        if dados.descricao.is_some() {
            sets.push("descricao = ?");
        }
        if dados.cor.is_some() {
            sets.push("cor = ?");
        }
        if dados.icone.is_some() {
            sets.push("icone = ?");
        }
        if dados.ativa.is_some() {
            sets.push("ativa = ?");
        }

        if sets.is_empty() {
            return Ok(false);
        }

        let sql = format!("UPDATE categorias SET {} WHERE id = ?", sets.join(", "));

        let mut query = sqlx::query(&sql);
        if let Some(nome) = &dados.nome {
            query = query.bind(nome);
        }
        if let Some(descricao) = &dados.descricao {
            query = query.bind(descricao);
        }
        if let Some(cor) = &dados.cor {
            query = query.bind(cor);
        }
        if let Some(icone) = &dados.icone {
            query = query.bind(icone);
        }
        if let Some(ativa) = dados.ativa {
            query = query.bind(ativa as i64);
        }

        let result = query.bind(id).execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categorias WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_ativa(&self, id: i64, ativa: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE categorias SET ativa = ? WHERE id = ?")
            .bind(ativa as i64)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All saídas referencing the category, soft-deleted included. A
    /// non-zero count blocks deletion.
    pub async fn count_referencing_saidas(&self, id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as total FROM saidas WHERE categoria_id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.get("total"))
    }
}
