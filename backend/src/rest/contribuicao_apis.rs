//! Handlers for PIX contributions: payload generation, visitor
//! submission and the admin review queue.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{
    ApiResponse, PixQrCodeRequest, PixQrCodeResponse, RejectContribuicaoRequest,
    SubmitContribuicaoRequest, UpdateContribuicaoRequest,
};
use tracing::info;

use super::{contexto, erro_response, AppState};
use crate::domain::models::contribuicao::{
    ContribuicaoFiltro, ContribuicaoUpdate, NovaContribuicao, StatusContribuicao,
};
use crate::domain::pix;

const QRCODE_RENDERER: &str = "https://api.qrserver.com/v1/create-qr-code/?size=300x300&data=";

#[derive(Deserialize, Debug, Default)]
pub struct ContribuicaoListQuery {
    pub status: Option<StatusContribuicao>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}

/// Build the EMV payload for the configured PIX key. No payment-network
/// call happens here or anywhere else; the payload is handed back for the
/// client to render.
pub async fn gerar_qrcode(
    State(state): State<AppState>,
    Json(request): Json<PixQrCodeRequest>,
) -> Response {
    info!("POST /api/pix/qrcode - valor: {:?}", request.valor);

    let txid = pix::gerar_txid();
    let payload = pix::gerar_payload(
        &state.config.pix_chave,
        &state.config.pix_nome,
        &state.config.pix_cidade,
        request.valor,
        Some(&txid),
    );

    let response = PixQrCodeResponse {
        qrcode_url: format!("{QRCODE_RENDERER}{}", urlencoding::encode(&payload)),
        pix_payload: payload,
        pix_chave: state.config.pix_chave.clone(),
        valor: request.valor.filter(|v| *v > 0.0),
        txid,
    };

    Json(ApiResponse::ok("Payload PIX gerado", response)).into_response()
}

/// Visitor-facing submission. The visitor's self-reported name, when one
/// was recorded, rides along as `nome_sessao`.
pub async fn submit_contribuicao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubmitContribuicaoRequest>,
) -> Response {
    info!("POST /api/contribuicoes - valor: {}", request.valor);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let nome_sessao = match ctx.visitor_id {
        Some(visitor_id) => match state.acesso.visitante(visitor_id).await {
            Ok(visitante) => visitante.nome,
            Err(e) => return erro_response(e),
        },
        None => None,
    };

    let nova = NovaContribuicao {
        nome_doador: request.nome,
        nome_sessao,
        exibir_anonimo: request.exibir_anonimo,
        valor: request.valor,
        observacoes: request.observacoes,
    };

    match state.contribuicoes.submit(nova).await {
        Ok(contribuicao) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(
                "Contribuição registrada, aguardando aprovação",
                contribuicao,
            )),
        )
            .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn list_contribuicoes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ContribuicaoListQuery>,
) -> Response {
    info!("GET /api/contribuicoes - query: {:?}", query);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let filtro = ContribuicaoFiltro {
        status: query.status,
        data_inicio: query.data_inicio,
        data_fim: query.data_fim,
    };

    match state.contribuicoes.list(&ctx, &filtro).await {
        Ok(contribuicoes) => {
            Json(ApiResponse::ok("Contribuições listadas", contribuicoes)).into_response()
        }
        Err(e) => erro_response(e),
    }
}

pub async fn count_pendentes(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.contribuicoes.count_pending(&ctx).await {
        Ok(total) => Json(ApiResponse::ok("Contribuições pendentes", total)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn aprovar_contribuicao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("POST /api/contribuicoes/{id}/aprovar");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.contribuicoes.approve(&ctx, id).await {
        Ok(contribuicao) => Json(ApiResponse::ok(
            "Contribuição aprovada e lançada no caixa",
            contribuicao,
        ))
        .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn rejeitar_contribuicao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<RejectContribuicaoRequest>,
) -> Response {
    info!("POST /api/contribuicoes/{id}/rejeitar");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state
        .contribuicoes
        .reject(&ctx, id, request.motivo.as_deref())
        .await
    {
        Ok(contribuicao) => {
            Json(ApiResponse::ok("Contribuição rejeitada", contribuicao)).into_response()
        }
        Err(e) => erro_response(e),
    }
}

pub async fn update_contribuicao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateContribuicaoRequest>,
) -> Response {
    info!("PUT /api/contribuicoes/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let dados = ContribuicaoUpdate {
        nome_doador: request.nome_doador,
        exibir_anonimo: request.exibir_anonimo,
        valor: request.valor,
        observacoes: request.observacoes,
    };

    match state.contribuicoes.update(&ctx, id, dados).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Contribuição atualizada")).into_response(),
        Ok(false) => erro_response(crate::domain::error::DomainError::NotFound(format!(
            "Contribuição não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

pub async fn delete_contribuicao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("DELETE /api/contribuicoes/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.contribuicoes.delete(&ctx, id).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Contribuição descartada")).into_response(),
        Ok(false) => erro_response(crate::domain::error::DomainError::NotFound(format!(
            "Contribuição não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}
