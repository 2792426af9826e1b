use serde::{Deserialize, Serialize};

/// Standard JSON success envelope returned by every API endpoint.
///
/// `{"success": true, "message": "...", "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Standard JSON error envelope.
///
/// `{"success": false, "message": "...", "errors": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entradas (income records)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEntradaRequest {
    /// Ledger date, `YYYY-MM-DD`
    pub data: String,
    /// One of: doacao, aposentadoria, saldo, contribuicao
    pub tipo: String,
    pub descricao: String,
    /// Person the income is attributed to (optional)
    pub pessoa: Option<String>,
    pub valor: f64,
    pub observacoes: Option<String>,
}

/// Partial update: only supplied fields are modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntradaRequest {
    pub data: Option<String>,
    pub tipo: Option<String>,
    pub descricao: Option<String>,
    pub pessoa: Option<String>,
    pub valor: Option<f64>,
    pub observacoes: Option<String>,
}

// ---------------------------------------------------------------------------
// Saídas (expense records)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSaidaRequest {
    /// Ledger date, `YYYY-MM-DD`
    pub data: String,
    /// One of: compra, pagamento
    pub tipo: String,
    pub categoria_id: i64,
    pub item: String,
    pub valor: f64,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    /// Excludes the row from aggregate totals while keeping it visible
    #[serde(default)]
    pub nao_contabilizar: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSaidaRequest {
    pub data: Option<String>,
    pub tipo: Option<String>,
    pub categoria_id: Option<i64>,
    pub item: Option<String>,
    pub valor: Option<f64>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub nao_contabilizar: Option<bool>,
}

// ---------------------------------------------------------------------------
// Categorias
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoriaRequest {
    pub nome: String,
    pub descricao: Option<String>,
    /// Hex color, defaults to #6B7280 when omitted
    pub cor: Option<String>,
    /// Icon name, defaults to fa-folder when omitted
    pub icone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCategoriaRequest {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub cor: Option<String>,
    pub icone: Option<String>,
    pub ativa: Option<bool>,
}

// ---------------------------------------------------------------------------
// Contribuições (PIX)
// ---------------------------------------------------------------------------

/// Request for a PIX QR-code payload. No payment-network call is made;
/// the payload is displayed as a QR code / copyable string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixQrCodeRequest {
    /// Fixed amount to embed in the payload (omitted when None or <= 0)
    pub valor: Option<f64>,
    /// Contributor name, echoed back for the confirmation step
    pub nome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixQrCodeResponse {
    /// Full EMV payload (copyable "PIX copia e cola" string)
    pub pix_payload: String,
    pub pix_chave: String,
    /// Public QR-code renderer URL for the payload
    pub qrcode_url: String,
    pub valor: Option<f64>,
    /// Transaction id to submit alongside the contribution
    pub txid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitContribuicaoRequest {
    /// Donor name as entered (optional, free text)
    pub nome: Option<String>,
    /// Donor explicitly asked to be displayed anonymously
    #[serde(default)]
    pub exibir_anonimo: bool,
    pub valor: f64,
    /// Carries the PIX txid for audit
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectContribuicaoRequest {
    pub motivo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateContribuicaoRequest {
    pub nome_doador: Option<String>,
    pub exibir_anonimo: Option<bool>,
    pub valor: Option<f64>,
    pub observacoes: Option<String>,
}

// ---------------------------------------------------------------------------
// Tokens de acesso / visitantes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub nome_convidado: String,
    /// Days until expiration; never expires when omitted
    pub dias_validade: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    pub token: String,
}

/// Visitor answer to the identification prompt. A None name means the
/// visitor declined; the prompt is never shown again either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentificacaoRequest {
    pub nome: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_absent_data() {
        let json = serde_json::to_value(ApiResponse::<()>::ok_empty("ok")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert!(json.get("data").is_none());

        let json = serde_json::to_value(ApiResponse::ok("ok", 42)).unwrap();
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn error_envelope_is_flagged_unsuccessful() {
        let json = serde_json::to_value(ApiError::new("falhou")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "falhou");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn submit_request_defaults_anonymity_off() {
        let request: SubmitContribuicaoRequest =
            serde_json::from_str(r#"{"valor": 75.5, "nome": "Maria"}"#).unwrap();
        assert!(!request.exibir_anonimo);
        assert_eq!(request.valor, 75.5);
        assert_eq!(request.nome.as_deref(), Some("Maria"));
    }
}
