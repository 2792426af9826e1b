//! PIX payload codec: EMV-style TLV encoding plus transaction id generation.
//!
//! Pure functions, no payment-network call. The payload is rendered by the
//! frontend as a QR code / copyable string and payment confirmation happens
//! manually through the pending-contribution approval flow.

use rand::{distributions::Alphanumeric, Rng};

/// GUI domain identifier nested inside the merchant account field.
const PIX_GUI: &str = "br.gov.bcb.pix";

/// Prefix for contribution transaction ids.
const TXID_PREFIX: &str = "CONT";

/// Hard upper bound imposed by the reference-label field of the payload.
const TXID_MAX_LEN: usize = 25;

/// Generates a unique transaction id for tracking a contribution.
///
/// Format: `CONT` + unix seconds (10 digits) + 11 uppercase alphanumeric
/// characters, 25 characters total.
pub fn gerar_txid() -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();

    let txid = format!("{TXID_PREFIX}{timestamp}{random}");
    txid.chars().take(TXID_MAX_LEN).collect()
}

/// Encodes one EMV field: tag (2 digits) + length (2 digits) + value.
///
/// Two length digits cap a value at 99 bytes; anything longer is cut on a
/// char boundary rather than emitting a malformed length.
fn emv_field(id: &str, value: &str) -> String {
    let mut fim = value.len().min(99);
    while !value.is_char_boundary(fim) {
        fim -= 1;
    }
    let value = &value[..fim];
    format!("{:0>2}{:02}{}", id, value.len(), value)
}

/// Builds the full PIX EMV payload.
///
/// * `chave` - PIX key (email, phone, CPF/CNPJ or random key); formatting
///   characters are stripped, keeping only letters, digits and `@ . _ + -`,
///   capped at 77 characters.
/// * `valor` - fixed amount; the amount field is only emitted when > 0.
/// * `txid` - reference label for the additional-data field; only emitted
///   when supplied.
///
/// Never fails: empty name/city are substituted with single-character
/// placeholders so a contribution flow is never blocked on formatting.
pub fn gerar_payload(
    chave: &str,
    nome: &str,
    cidade: &str,
    valor: Option<f64>,
    txid: Option<&str>,
) -> String {
    // 77 is the key ceiling in the BR Code spec; it also keeps the nested
    // merchant template (GUI + key) within its own two length digits.
    let chave_limpa: String = chave
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'))
        .take(77)
        .collect();

    // Payload Format Indicator (ID 00)
    let mut payload = emv_field("00", "01");

    // Merchant Account Information (ID 26), nested GUI + key
    let mut merchant_account = emv_field("00", PIX_GUI);
    merchant_account.push_str(&emv_field("01", &chave_limpa));
    payload.push_str(&emv_field("26", &merchant_account));

    // Merchant Category Code + Transaction Currency (986 = BRL)
    payload.push_str(&emv_field("52", "0000"));
    payload.push_str(&emv_field("53", "986"));

    // Transaction Amount (ID 54), only when a positive amount was given
    if let Some(v) = valor {
        if v > 0.0 {
            payload.push_str(&emv_field("54", &format!("{v:.2}")));
        }
    }

    // Country Code (ID 58)
    payload.push_str(&emv_field("58", "BR"));

    // Merchant Name (ID 59), max 25 chars, min 1
    let mut nome_limpo: String = nome.chars().take(25).collect();
    if nome_limpo.is_empty() {
        nome_limpo.push('N');
    }
    payload.push_str(&emv_field("59", &nome_limpo));

    // Merchant City (ID 60), max 15 chars, min 1
    let mut cidade_limpa: String = cidade.chars().take(15).collect();
    if cidade_limpa.is_empty() {
        cidade_limpa.push('C');
    }
    payload.push_str(&emv_field("60", &cidade_limpa));

    // Additional Data Field Template (ID 62) wrapping the Reference Label
    // sub-field (ID 05), only when a txid was supplied
    if let Some(txid) = txid {
        let txid_limpo: String = txid
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(TXID_MAX_LEN)
            .collect();
        let subcampo = emv_field("05", &txid_limpo);
        payload.push_str(&emv_field("62", &subcampo));
    }

    // CRC16 (ID 63): the tag+length prefix is included in the checksum input
    payload.push_str("6304");
    let crc = crc16_ccitt(&payload);
    payload.push_str(&format!("{crc:04X}"));

    payload
}

/// CRC-16/CCITT-FALSE: polynomial 0x1021, initial value 0xFFFF, MSB-first,
/// no final XOR.
pub fn crc16_ccitt(payload: &str) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for byte in payload.bytes() {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Decodes a flat TLV sequence into (tag, value) pairs.
    fn decode_tlv(payload: &str) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let mut rest = payload;
        while rest.len() >= 4 {
            let tag = &rest[..2];
            let len: usize = rest[2..4].parse().expect("length digits");
            let value = &rest[4..4 + len];
            fields.push((tag.to_string(), value.to_string()));
            rest = &rest[4 + len..];
        }
        assert!(rest.is_empty(), "trailing bytes after TLV decode");
        fields
    }

    fn field<'a>(fields: &'a [(String, String)], tag: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn crc16_known_vector() {
        // CRC-16/CCITT-FALSE check value for "123456789"
        assert_eq!(crc16_ccitt("123456789"), 0x29B1);
    }

    #[test]
    fn payload_roundtrip_recovers_fields() {
        let payload = gerar_payload(
            "doacoes@example.com",
            "Maria das Dores",
            "Sao Paulo",
            Some(150.0),
            Some("CONT1700000000ABCDEFGHIJK"),
        );

        let fields = decode_tlv(&payload);
        assert_eq!(field(&fields, "00"), Some("01"));
        assert_eq!(field(&fields, "52"), Some("0000"));
        assert_eq!(field(&fields, "53"), Some("986"));
        assert_eq!(field(&fields, "54"), Some("150.00"));
        assert_eq!(field(&fields, "58"), Some("BR"));
        assert_eq!(field(&fields, "59"), Some("Maria das Dores"));
        assert_eq!(field(&fields, "60"), Some("Sao Paulo"));

        // Nested merchant account: GUI + key
        let merchant = field(&fields, "26").expect("merchant account field");
        let nested = decode_tlv(merchant);
        assert_eq!(field(&nested, "00"), Some("br.gov.bcb.pix"));
        assert_eq!(field(&nested, "01"), Some("doacoes@example.com"));

        // Additional data wraps the reference label
        let adicional = field(&fields, "62").expect("additional data field");
        let nested = decode_tlv(adicional);
        assert_eq!(field(&nested, "05"), Some("CONT1700000000ABCDEFGHIJK"));
    }

    #[test]
    fn checksum_matches_independent_computation() {
        let payload = gerar_payload("chave@pix.br", "Nome", "Cidade", Some(10.5), None);
        let (prefix, crc_hex) = payload.split_at(payload.len() - 4);
        assert!(prefix.ends_with("6304"));

        // Table-driven reimplementation, independent of crc16_ccitt
        let mut crc: u16 = 0xFFFF;
        for byte in prefix.bytes() {
            let idx = ((crc >> 8) ^ byte as u16) & 0xFF;
            let mut entry = idx << 8;
            for _ in 0..8 {
                entry = if entry & 0x8000 != 0 {
                    (entry << 1) ^ 0x1021
                } else {
                    entry << 1
                };
            }
            crc = (crc << 8) ^ entry;
        }

        assert_eq!(crc_hex, format!("{crc:04X}"));
        // Re-running the production checksum reproduces the same digits
        assert_eq!(crc_hex, format!("{:04X}", crc16_ccitt(prefix)));
    }

    #[test]
    fn amount_field_absent_when_missing_or_non_positive() {
        for valor in [None, Some(0.0), Some(-5.0)] {
            let payload = gerar_payload("chave@pix.br", "Nome", "Cidade", valor, None);
            let fields = decode_tlv(&payload);
            assert_eq!(field(&fields, "54"), None, "valor={valor:?}");
        }
    }

    #[test]
    fn additional_data_absent_without_txid() {
        let payload = gerar_payload("chave@pix.br", "Nome", "Cidade", None, None);
        let fields = decode_tlv(&payload);
        assert_eq!(field(&fields, "62"), None);
    }

    #[test]
    fn key_is_sanitized_and_txid_stripped() {
        let payload = gerar_payload(
            "123.456.789-09",
            "Nome",
            "Cidade",
            None,
            Some("CONT/17000-00000 ABC"),
        );
        let fields = decode_tlv(&payload);

        let merchant = field(&fields, "26").unwrap();
        let nested = decode_tlv(merchant);
        // Dots and dashes are legal key characters; spaces/slashes are not
        assert_eq!(field(&nested, "01"), Some("123.456.789-09"));

        let adicional = field(&fields, "62").unwrap();
        let nested = decode_tlv(adicional);
        assert_eq!(field(&nested, "05"), Some("CONT1700000000ABC"));
    }

    #[test]
    fn name_and_city_are_truncated_and_never_empty() {
        let payload = gerar_payload(
            "chave@pix.br",
            "Um Nome Extremamente Longo Para O Recebedor",
            "Uma Cidade Com Nome Longo",
            None,
            None,
        );
        let fields = decode_tlv(&payload);
        assert_eq!(field(&fields, "59").unwrap().len(), 25);
        assert_eq!(field(&fields, "60").unwrap().len(), 15);

        let payload = gerar_payload("chave@pix.br", "", "", None, None);
        let fields = decode_tlv(&payload);
        assert_eq!(field(&fields, "59"), Some("N"));
        assert_eq!(field(&fields, "60"), Some("C"));
    }

    #[test]
    fn oversized_key_is_clamped_to_a_decodable_field() {
        let chave_longa = "a".repeat(150);
        let payload = gerar_payload(&chave_longa, "Nome", "Cidade", None, None);

        // Still a well-formed TLV stream end to end, nested template included
        let fields = decode_tlv(&payload);
        let merchant = field(&fields, "26").expect("merchant account field");
        assert!(merchant.len() <= 99);
        let nested = decode_tlv(merchant);
        assert_eq!(field(&nested, "01").unwrap().len(), 77);

        // Multi-byte chars never get split mid-sequence
        let nome_acentuado = "ãé".repeat(60);
        let payload = gerar_payload("chave@pix.br", &nome_acentuado, "Cidade", None, None);
        decode_tlv(&payload);
    }

    #[test]
    fn txids_are_unique_and_bounded() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let txid = gerar_txid();
            assert!(txid.len() <= 25, "txid too long: {txid}");
            assert!(txid.starts_with("CONT"));
            assert!(seen.insert(txid), "duplicate txid generated");
        }
    }

    #[test]
    fn payload_is_deterministic_for_identical_inputs() {
        let a = gerar_payload("chave@pix.br", "Nome", "Cidade", Some(75.5), Some("CONTX"));
        let b = gerar_payload("chave@pix.br", "Nome", "Cidade", Some(75.5), Some("CONTX"));
        assert_eq!(a, b);
    }
}
