//! Handlers for the expense ledger (saídas).

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, CreateSaidaRequest, UpdateSaidaRequest};
use tracing::info;

use super::entrada_apis::{AnoQuery, DeleteQuery, ResumoQuery};
use super::{contexto, erro_response, AppState};
use crate::domain::error::DomainError;
use crate::domain::models::saida::{NovaSaida, SaidaFiltro, SaidaUpdate, TipoSaida};
use crate::domain::models::Ordenacao;

#[derive(Deserialize, Debug, Default)]
pub struct SaidaListQuery {
    pub tipo: Option<TipoSaida>,
    pub categoria_id: Option<i64>,
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

impl From<SaidaListQuery> for SaidaFiltro {
    fn from(q: SaidaListQuery) -> Self {
        SaidaFiltro {
            tipo: q.tipo,
            categoria_id: q.categoria_id,
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

pub async fn list_saidas(
    State(state): State<AppState>,
    Query(query): Query<SaidaListQuery>,
) -> Response {
    info!("GET /api/saidas - query: {:?}", query);

    match state.saidas.list(&query.into()).await {
        Ok(saidas) => Json(ApiResponse::ok("Saídas listadas", saidas)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn create_saida(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSaidaRequest>,
) -> Response {
    info!("POST /api/saidas - tipo: {}", request.tipo);

    let tipo = match request.tipo.parse() {
        Ok(tipo) => tipo,
        Err(e) => return erro_response(e),
    };
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let nova = NovaSaida {
        data: request.data,
        tipo,
        categoria_id: request.categoria_id,
        item: request.item,
        valor: request.valor,
        fornecedor: request.fornecedor,
        observacoes: request.observacoes,
        nao_contabilizar: request.nao_contabilizar,
    };

    match state.saidas.create(&ctx, nova).await {
        Ok(saida) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok("Saída criada com sucesso", saida)),
        )
            .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn get_saida(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    info!("GET /api/saidas/{id}");

    match state.saidas.get(id).await {
        Ok(saida) => Json(ApiResponse::ok("Saída encontrada", saida)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn update_saida(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSaidaRequest>,
) -> Response {
    info!("PUT /api/saidas/{id}");

    let tipo = match request.tipo.as_deref().map(str::parse).transpose() {
        Ok(tipo) => tipo,
        Err(e) => return erro_response(e),
    };
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let dados = SaidaUpdate {
        data: request.data,
        tipo,
        categoria_id: request.categoria_id,
        item: request.item,
        valor: request.valor,
        fornecedor: request.fornecedor,
        observacoes: request.observacoes,
        nao_contabilizar: request.nao_contabilizar,
    };

    match state.saidas.update(&ctx, id, dados).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Saída atualizada")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!("Saída não encontrada: {id}"))),
        Err(e) => erro_response(e),
    }
}

/// DELETE soft-deletes by default, keeping the row restorable;
/// `?permanente=true` removes it for good.
pub async fn delete_saida(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    info!("DELETE /api/saidas/{id} - permanente: {}", query.permanente);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let removido = if query.permanente {
        state.saidas.delete(&ctx, id).await
    } else {
        state.saidas.soft_delete(&ctx, id).await
    };

    match removido {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Saída removida")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!("Saída não encontrada: {id}"))),
        Err(e) => erro_response(e),
    }
}

pub async fn restore_saida(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("POST /api/saidas/{id}/restore");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.saidas.restore(&ctx, id).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Saída restaurada")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!("Saída não encontrada: {id}"))),
        Err(e) => erro_response(e),
    }
}

pub async fn resumo_saidas(
    State(state): State<AppState>,
    Query(query): Query<ResumoQuery>,
) -> Response {
    info!("GET /api/saidas/resumo - {}/{}", query.mes, query.ano);

    match state.saidas.resumo_mensal(query.mes, query.ano).await {
        Ok(resumo) => Json(ApiResponse::ok("Resumo mensal", resumo)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn saidas_por_mes(
    State(state): State<AppState>,
    Query(query): Query<AnoQuery>,
) -> Response {
    info!("GET /api/saidas/por-mes - ano: {}", query.ano);

    match state.saidas.por_mes(query.ano).await {
        Ok(meses) => Json(ApiResponse::ok("Totais por mês", meses)).into_response(),
        Err(e) => erro_response(e),
    }
}
