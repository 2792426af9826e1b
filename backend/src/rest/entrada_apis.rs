//! Handlers for the income ledger (entradas).

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, CreateEntradaRequest, UpdateEntradaRequest};
use tracing::info;

use super::{contexto, erro_response, AppState};
use crate::domain::models::entrada::{EntradaFiltro, EntradaUpdate, NovaEntrada, TipoEntrada};
use crate::domain::models::Ordenacao;

#[derive(Deserialize, Debug, Default)]
pub struct EntradaListQuery {
    pub tipo: Option<TipoEntrada>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    pub busca: Option<String>,
    pub ordenar: Option<Ordenacao>,
    pub limite: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub incluir_deletados: bool,
}

impl From<EntradaListQuery> for EntradaFiltro {
    fn from(q: EntradaListQuery) -> Self {
        EntradaFiltro {
            tipo: q.tipo,
            data_inicio: q.data_inicio,
            data_fim: q.data_fim,
            mes: q.mes,
            ano: q.ano,
            busca: q.busca,
            ordenar: q.ordenar,
            limite: q.limite,
            offset: q.offset,
            incluir_deletados: q.incluir_deletados,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ResumoQuery {
    pub mes: u32,
    pub ano: i32,
}

#[derive(Deserialize, Debug)]
pub struct AnoQuery {
    pub ano: i32,
}

#[derive(Deserialize, Debug, Default)]
pub struct DeleteQuery {
    /// Hard delete instead of the default soft delete
    #[serde(default)]
    pub permanente: bool,
}

pub async fn list_entradas(
    State(state): State<AppState>,
    Query(query): Query<EntradaListQuery>,
) -> Response {
    info!("GET /api/entradas - query: {:?}", query);

    match state.entradas.list(&query.into()).await {
        Ok(entradas) => Json(ApiResponse::ok("Entradas listadas", entradas)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn create_entrada(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateEntradaRequest>,
) -> Response {
    info!("POST /api/entradas - tipo: {}", request.tipo);

    let tipo = match request.tipo.parse() {
        Ok(tipo) => tipo,
        Err(e) => return erro_response(e),
    };
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let nova = NovaEntrada {
        data: request.data,
        tipo,
        descricao: request.descricao,
        pessoa: request.pessoa,
        valor: request.valor,
        observacoes: request.observacoes,
    };

    match state.entradas.create(&ctx, nova).await {
        Ok(entrada) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok("Entrada criada com sucesso", entrada)),
        )
            .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn get_entrada(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    info!("GET /api/entradas/{id}");

    match state.entradas.get(id).await {
        Ok(entrada) => Json(ApiResponse::ok("Entrada encontrada", entrada)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn update_entrada(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEntradaRequest>,
) -> Response {
    info!("PUT /api/entradas/{id}");

    let tipo = match request.tipo.as_deref().map(str::parse).transpose() {
        Ok(tipo) => tipo,
        Err(e) => return erro_response(e),
    };
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let dados = EntradaUpdate {
        data: request.data,
        tipo,
        descricao: request.descricao,
        pessoa: request.pessoa,
        valor: request.valor,
        observacoes: request.observacoes,
    };

    match state.entradas.update(&ctx, id, dados).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Entrada atualizada")).into_response(),
        Ok(false) => erro_response(crate::domain::error::DomainError::NotFound(format!(
            "Entrada não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

/// DELETE soft-deletes by default, keeping the row restorable;
/// `?permanente=true` removes it for good.
pub async fn delete_entrada(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    info!("DELETE /api/entradas/{id} - permanente: {}", query.permanente);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let removido = if query.permanente {
        state.entradas.delete(&ctx, id).await
    } else {
        state.entradas.soft_delete(&ctx, id).await
    };

    match removido {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Entrada removida")).into_response(),
        Ok(false) => erro_response(crate::domain::error::DomainError::NotFound(format!(
            "Entrada não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

pub async fn restore_entrada(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("POST /api/entradas/{id}/restore");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.entradas.restore(&ctx, id).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Entrada restaurada")).into_response(),
        Ok(false) => erro_response(crate::domain::error::DomainError::NotFound(format!(
            "Entrada não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

pub async fn resumo_entradas(
    State(state): State<AppState>,
    Query(query): Query<ResumoQuery>,
) -> Response {
    info!("GET /api/entradas/resumo - {}/{}", query.mes, query.ano);

    match state.entradas.resumo_mensal(query.mes, query.ano).await {
        Ok(resumo) => Json(ApiResponse::ok("Resumo mensal", resumo)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn entradas_por_mes(
    State(state): State<AppState>,
    Query(query): Query<AnoQuery>,
) -> Response {
    info!("GET /api/entradas/por-mes - ano: {}", query.ano);

    match state.entradas.por_mes(query.ano).await {
        Ok(meses) => Json(ApiResponse::ok("Totais por mês", meses)).into_response(),
        Err(e) => erro_response(e),
    }
}
