//! Repository for expense records (saídas).
//!
//! Every aggregate here excludes soft-deleted rows and rows flagged
//! `nao_contabilizar`; listings only exclude soft-deleted ones.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::saida::{
    NovaSaida, Saida, SaidaFiltro, SaidaUpdate, TotalPorCategoria,
};
use crate::domain::models::{Ordenacao, TotalMensal, TotalPorTipo};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct SaidaRepository {
    db: DbConnection,
}

const SELECT_COLS: &str = "SELECT s.id, s.data, s.tipo, s.categoria_id, c.nome as categoria, \
     c.icone as categoria_icone, s.item, s.valor, s.fornecedor, s.observacoes, \
     s.nao_contabilizar, s.criado_por, u.nome as criador_nome, s.criado_em, s.deleted_at \
     FROM saidas s \
     LEFT JOIN usuarios u ON s.criado_por = u.id \
     LEFT JOIN categorias c ON s.categoria_id = c.id";

fn map_saida(row: &SqliteRow) -> Result<Saida> {
    Ok(Saida {
        id: row.get("id"),
        data: row.get("data"),
        tipo: row.get::<String, _>("tipo").parse()?,
        categoria_id: row.get("categoria_id"),
        categoria: row.get("categoria"),
        categoria_icone: row.get("categoria_icone"),
        item: row.get("item"),
        valor: row.get("valor"),
        fornecedor: row.get("fornecedor"),
        observacoes: row.get("observacoes"),
        nao_contabilizar: row.get::<i64, _>("nao_contabilizar") != 0,
        criado_por: row.get("criado_por"),
        criador_nome: row.get("criador_nome"),
        criado_em: row.get("criado_em"),
        deleted_at: row.get("deleted_at"),
    })
}

impl SaidaRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a new saída, returning its id.
    pub async fn create(&self, nova: &NovaSaida, criado_por: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO saidas
                (data, tipo, categoria_id, item, valor, fornecedor, observacoes,
                 nao_contabilizar, criado_por)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&nova.data)
        .bind(nova.tipo.as_str())
        .bind(nova.categoria_id)
        .bind(&nova.item)
        .bind(nova.valor)
        .bind(&nova.fornecedor)
        .bind(&nova.observacoes)
        .bind(nova.nao_contabilizar as i64)
        .bind(criado_por)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Saida>> {
        let sql = format!("{SELECT_COLS} WHERE s.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(map_saida).transpose()
    }

    pub async fn list(&self, filtro: &SaidaFiltro) -> Result<Vec<Saida>> {
        let mut clauses: Vec<&str> = Vec::new();

        if !filtro.incluir_deletados {
            clauses.push("s.deleted_at IS NULL");
        }
        if filtro.tipo.is_some() {
            clauses.push("s.tipo = ?");
        }
        if filtro.categoria_id.is_some() {
            clauses.push("s.categoria_id = ?");
        }
        if filtro.data_inicio.is_some() {
            clauses.push("s.data >= ?");
        }
        if filtro.data_fim.is_some() {
            clauses.push("s.data <= ?");
        }
        if filtro.mes.is_some() && filtro.ano.is_some() {
            clauses.push(
                "CAST(strftime('%Y', s.data) AS INTEGER) = ? \
                 AND CAST(strftime('%m', s.data) AS INTEGER) = ?",
            );
        }
        if filtro.busca.is_some() {
            clauses.push("(s.item LIKE ? OR s.fornecedor LIKE ? OR s.observacoes LIKE ?)");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let order_by = match filtro.ordenar {
            Some(Ordenacao::DataAsc) => "s.data ASC, s.id ASC",
            Some(Ordenacao::ValorDesc) => "s.valor DESC",
            Some(Ordenacao::ValorAsc) => "s.valor ASC",
            None => "s.data DESC, s.id DESC",
        };

        let limit = if filtro.limite.is_some() {
            " LIMIT ? OFFSET ?"
        } else {
            ""
        };

        let sql = format!("{SELECT_COLS} {where_clause} ORDER BY {order_by}{limit}");

        let mut query = sqlx::query(&sql);
        if let Some(tipo) = filtro.tipo {
            query = query.bind(tipo.as_str());
        }
        if let Some(categoria_id) = filtro.categoria_id {
            query = query.bind(categoria_id);
        }
        if let Some(inicio) = &filtro.data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = &filtro.data_fim {
            query = query.bind(fim);
        }
        if let (Some(mes), Some(ano)) = (filtro.mes, filtro.ano) {
            query = query.bind(ano).bind(mes);
        }
        if let Some(busca) = &filtro.busca {
            let pattern = format!("%{busca}%");
            query = query
                .bind(pattern.clone())
                .bind(pattern.clone())
                .bind(pattern);
        }
        if let Some(limite) = filtro.limite {
            query = query.bind(limite).bind(filtro.offset.unwrap_or(0));
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(map_saida).collect()
    }

    /// Apply a partial update. Returns false when no field was supplied or
    /// no row matched.
    pub async fn update(&self, id: i64, dados: &SaidaUpdate) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();

        if dados.data.is_some() {
            sets.push("data = ?");
        }
        if dados.tipo.is_some() {
            sets.push("tipo = ?");
        }
        if dados.categoria_id.is_some() {
            sets.push("categoria_id = ?");
        }
        if dados.item.is_some() {
            sets.push("item = ?");
        }
        if dados.valor.is_some() {
            sets.push("valor = ?");
        }
        if dados.fornecedor.is_some() {
            sets.push("fornecedor = ?");
        }
        if dados.observacoes.is_some() {
            sets.push("observacoes = ?");
        }
        if dados.nao_contabilizar.is_some() {
            sets.push("nao_contabilizar = ?");
        }

        if sets.is_empty() {
            return Ok(false);
        }

        let sql = format!("UPDATE saidas SET {} WHERE id = ?", sets.join(", "));

        let mut query = sqlx::query(&sql);
        if let Some(data) = &dados.data {
            query = query.bind(data);
        }
        if let Some(tipo) = dados.tipo {
            query = query.bind(tipo.as_str());
        }
        if let Some(categoria_id) = dados.categoria_id {
            query = query.bind(categoria_id);
        }
        if let Some(item) = &dados.item {
            query = query.bind(item);
        }
        if let Some(valor) = dados.valor {
            query = query.bind(valor);
        }
        if let Some(fornecedor) = &dados.fornecedor {
            query = query.bind(fornecedor);
        }
        if let Some(observacoes) = &dados.observacoes {
            query = query.bind(observacoes);
        }
        if let Some(nao_contabilizar) = dados.nao_contabilizar {
            query = query.bind(nao_contabilizar as i64);
        }

        let result = query.bind(id).execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard delete.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saidas WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE saidas SET deleted_at = datetime('now') WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE saidas SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn total_por_periodo(
        &self,
        data_inicio: &str,
        data_fim: &str,
        tipo: Option<&str>,
        categoria_id: Option<i64>,
    ) -> Result<f64> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(valor), 0.0) as total FROM saidas \
             WHERE data BETWEEN ? AND ? AND deleted_at IS NULL AND nao_contabilizar = 0",
        );
        if tipo.is_some() {
            sql.push_str(" AND tipo = ?");
        }
        if categoria_id.is_some() {
            sql.push_str(" AND categoria_id = ?");
        }

        let mut query = sqlx::query(&sql).bind(data_inicio).bind(data_fim);
        if let Some(tipo) = tipo {
            query = query.bind(tipo);
        }
        if let Some(categoria_id) = categoria_id {
            query = query.bind(categoria_id);
        }

        let row = query.fetch_one(self.db.pool()).await?;
        Ok(row.get("total"))
    }

    pub async fn total_geral(&self) -> Result<f64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(valor), 0.0) as total FROM saidas \
             WHERE deleted_at IS NULL AND nao_contabilizar = 0",
        )
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get("total"))
    }

    pub async fn totais_por_categoria(
        &self,
        data_inicio: &str,
        data_fim: &str,
    ) -> Result<Vec<TotalPorCategoria>> {
        let rows = sqlx::query(
            r#"
            SELECT c.nome as categoria, c.icone as categoria_icone,
                   COALESCE(SUM(s.valor), 0.0) as total, COUNT(*) as quantidade
            FROM saidas s
            LEFT JOIN categorias c ON s.categoria_id = c.id
            WHERE s.data BETWEEN ? AND ?
              AND s.deleted_at IS NULL
              AND s.nao_contabilizar = 0
            GROUP BY s.categoria_id, c.nome, c.icone
            ORDER BY total DESC
            "#,
        )
        .bind(data_inicio)
        .bind(data_fim)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TotalPorCategoria {
                categoria: row.get("categoria"),
                categoria_icone: row.get("categoria_icone"),
                total: row.get("total"),
                quantidade: row.get("quantidade"),
            })
            .collect())
    }

    pub async fn totais_por_tipo(
        &self,
        data_inicio: &str,
        data_fim: &str,
    ) -> Result<Vec<TotalPorTipo>> {
        let rows = sqlx::query(
            r#"
            SELECT tipo, COALESCE(SUM(valor), 0.0) as total, COUNT(*) as quantidade
            FROM saidas
            WHERE data BETWEEN ? AND ?
              AND deleted_at IS NULL
              AND nao_contabilizar = 0
            GROUP BY tipo
            "#,
        )
        .bind(data_inicio)
        .bind(data_fim)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TotalPorTipo {
                tipo: row.get("tipo"),
                total: row.get("total"),
                quantidade: row.get("quantidade"),
            })
            .collect())
    }

    pub async fn contar(&self, filtro: &SaidaFiltro) -> Result<i64> {
        let mut clauses: Vec<&str> = Vec::new();

        if !filtro.incluir_deletados {
            clauses.push("deleted_at IS NULL");
        }
        if filtro.tipo.is_some() {
            clauses.push("tipo = ?");
        }
        if filtro.categoria_id.is_some() {
            clauses.push("categoria_id = ?");
        }
        if filtro.mes.is_some() && filtro.ano.is_some() {
            clauses.push(
                "CAST(strftime('%Y', data) AS INTEGER) = ? \
                 AND CAST(strftime('%m', data) AS INTEGER) = ?",
            );
        }
        if filtro.data_inicio.is_some() {
            clauses.push("data >= ?");
        }
        if filtro.data_fim.is_some() {
            clauses.push("data <= ?");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!("SELECT COUNT(*) as total FROM saidas {where_clause}");

        let mut query = sqlx::query(&sql);
        if let Some(tipo) = filtro.tipo {
            query = query.bind(tipo.as_str());
        }
        if let Some(categoria_id) = filtro.categoria_id {
            query = query.bind(categoria_id);
        }
        if let (Some(mes), Some(ano)) = (filtro.mes, filtro.ano) {
            query = query.bind(ano).bind(mes);
        }
        if let Some(inicio) = &filtro.data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = &filtro.data_fim {
            query = query.bind(fim);
        }

        let row = query.fetch_one(self.db.pool()).await?;
        Ok(row.get("total"))
    }

    /// Totals grouped by month for one year; absent months are zero-filled
    /// by the service.
    pub async fn por_mes(&self, ano: i32) -> Result<Vec<TotalMensal>> {
        let rows = sqlx::query(
            r#"
            SELECT CAST(strftime('%m', data) AS INTEGER) as mes,
                   COALESCE(SUM(valor), 0.0) as total,
                   COUNT(*) as quantidade
            FROM saidas
            WHERE CAST(strftime('%Y', data) AS INTEGER) = ?
              AND deleted_at IS NULL
              AND nao_contabilizar = 0
            GROUP BY mes
            ORDER BY mes
            "#,
        )
        .bind(ano)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TotalMensal {
                mes: row.get::<i64, _>("mes") as u32,
                total: row.get("total"),
                quantidade: row.get("quantidade"),
            })
            .collect())
    }

    /// Number of saídas (not soft-deleted) in a category, for display
    /// counters. The category deletion guard counts soft-deleted rows too
    /// and lives in the categoria repository.
    pub async fn contar_por_categoria(&self, categoria_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as total FROM saidas WHERE categoria_id = ? AND deleted_at IS NULL",
        )
        .bind(categoria_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get("total"))
    }
}
