//! Domain layer: models, services and the PIX codec.

pub mod acesso_service;
pub mod categoria_service;
pub mod contribuicao_service;
pub mod entrada_service;
pub mod error;
pub mod models;
pub mod pix;
pub mod saida_service;

use chrono::NaiveDate;

use error::{DomainError, DomainResult};

/// Validates a ledger date as a real calendar date in `YYYY-MM-DD` form.
pub(crate) fn validar_data(data: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(data, "%Y-%m-%d")
        .map_err(|_| DomainError::Validation(format!("Data inválida: {data}")))
}

/// First and last day of a month, both `YYYY-MM-DD`.
pub(crate) fn periodo_mes(mes: u32, ano: i32) -> DomainResult<(String, String)> {
    let inicio = NaiveDate::from_ymd_opt(ano, mes, 1)
        .ok_or_else(|| DomainError::Validation(format!("Mês inválido: {mes}/{ano}")))?;
    let proximo = if mes == 12 {
        NaiveDate::from_ymd_opt(ano + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(ano, mes + 1, 1)
    }
    .ok_or_else(|| DomainError::Validation(format!("Mês inválido: {mes}/{ano}")))?;
    let fim = proximo.pred_opt().unwrap_or(inicio);

    Ok((inicio.to_string(), fim.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validar_data_accepts_real_dates_only() {
        assert!(validar_data("2025-02-28").is_ok());
        assert!(validar_data("2024-02-29").is_ok());
        assert!(validar_data("2025-02-30").is_err());
        assert!(validar_data("30/01/2025").is_err());
        assert!(validar_data("").is_err());
    }

    #[test]
    fn periodo_mes_spans_whole_month() {
        assert_eq!(
            periodo_mes(2, 2024).unwrap(),
            ("2024-02-01".to_string(), "2024-02-29".to_string())
        );
        assert_eq!(
            periodo_mes(12, 2025).unwrap(),
            ("2025-12-01".to_string(), "2025-12-31".to_string())
        );
        assert!(periodo_mes(13, 2025).is_err());
    }
}
