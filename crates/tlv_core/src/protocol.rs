//! Protocolo TLV binário do link serial.
//!
//! Formato de cada registro:
//!
//! ```text
//! ┌─────────┬───────────┬──────────────────┐
//! │ Type(1) │ Length(1) │ Value (Length)   │
//! └─────────┴───────────┴──────────────────┘
//! ```
//!
//! - Sem magic byte, CRC ou delimitadores: o stream é só `record*`
//! - Valores multi-byte em little-endian (LSB primeiro)
//! - `Length` é explícito mesmo quando o tipo implica a largura, para
//!   permitir payloads de tamanho variável no futuro
//!
//! O [`TlvDecoder`] é uma máquina de estados byte a byte: pode ser
//! alimentado em chunks de qualquer tamanho e produz a mesma sequência de
//! registros. Fim de input no meio de um registro é só um estado suspenso.

use crate::registry::{Scalar, SignalType, ValueKind};
use crate::types::{TlvRecord, VehicleData};

/// Tamanho do header (type + length).
pub const HEADER_SIZE: usize = 2;

/// Erros do protocolo.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Tipo desconhecido: 0x{0:02X}")]
    UnknownType(u8),

    #[error("Valor muito grande ({0} bytes, máximo 255)")]
    OversizedValue(usize),

    #[error("Tamanho inválido para tipo 0x{tlv_type:02X}: {actual} bytes (esperado {expected})")]
    LengthMismatch {
        tlv_type: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Escalar {actual} incompatível com {signal} (esperado {expected})")]
    KindMismatch {
        signal: SignalType,
        expected: ValueKind,
        actual: ValueKind,
    },
}

// ──────────────────────────────────────────────
// Encoder
// ──────────────────────────────────────────────

/// Anexa um registro cru ao buffer.
///
/// Rejeita valores acima de 255 bytes. Valor vazio é válido (`[type, 0]`).
pub fn encode_record_into(
    buf: &mut Vec<u8>,
    tlv_type: u8,
    value: &[u8],
) -> Result<(), ProtocolError> {
    let len = u8::try_from(value.len()).map_err(|_| ProtocolError::OversizedValue(value.len()))?;
    buf.reserve(HEADER_SIZE + value.len());
    buf.push(tlv_type);
    buf.push(len);
    buf.extend_from_slice(value);
    Ok(())
}

/// Codifica um registro cru: `[type][len][value...]`.
pub fn encode_record(tlv_type: u8, value: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = Vec::with_capacity(HEADER_SIZE + value.len());
    encode_record_into(&mut frame, tlv_type, value)?;
    Ok(frame)
}

/// Anexa um escalar ao buffer. Nunca falha: larguras de 1–2 bytes.
///
/// Não valida faixa; serializa o padrão de bits da largura do escalar.
pub fn encode_scalar_into(buf: &mut Vec<u8>, tlv_type: u8, value: Scalar) {
    let width = value.kind().width();
    buf.reserve(HEADER_SIZE + width);
    buf.push(tlv_type);
    buf.push(width as u8);
    value.write_le(buf);
}

/// Codifica um escalar: `[type, 1, v]` ou `[type, 2, lo, hi]`.
pub fn encode_scalar(tlv_type: u8, value: Scalar) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_SIZE + value.kind().width());
    encode_scalar_into(&mut frame, tlv_type, value);
    frame
}

/// Como [`encode_scalar`], mas confere o escalar contra o registro.
pub fn encode_signal(signal: SignalType, value: Scalar) -> Result<Vec<u8>, ProtocolError> {
    if value.kind() != signal.kind() {
        return Err(ProtocolError::KindMismatch {
            signal,
            expected: signal.kind(),
            actual: value.kind(),
        });
    }
    Ok(encode_scalar(signal.id(), value))
}

impl TlvRecord {
    /// Serializa o registro (o invariante de tamanho já foi checado).
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_SIZE + self.value().len());
        frame.push(self.tlv_type());
        frame.push(self.len());
        frame.extend_from_slice(self.value());
        frame
    }
}

/// Codifica um ciclo completo: todos os sinais presentes no snapshot, na
/// ordem fixa do registro.
pub fn encode_frame(data: &VehicleData) -> Vec<u8> {
    let mut frame = Vec::with_capacity(SignalType::ALL.len() * (HEADER_SIZE + 2));
    for (signal, value) in data.readings() {
        encode_scalar_into(&mut frame, signal.id(), value);
    }
    frame
}

// ──────────────────────────────────────────────
// Interpretação
// ──────────────────────────────────────────────

/// Reinterpreta um registro decodificado via registro de tipos.
///
/// Um tipo desconhecido não afeta o framing: o registro já foi consumido
/// inteiro, só não há como dar significado ao payload.
pub fn interpret(record: &TlvRecord) -> Result<(SignalType, Scalar), ProtocolError> {
    let signal = SignalType::try_from(record.tlv_type())?;
    let kind = signal.kind();
    Scalar::from_le_bytes(kind, record.value())
        .map(|value| (signal, value))
        .ok_or(ProtocolError::LengthMismatch {
            tlv_type: record.tlv_type(),
            expected: kind.width(),
            actual: record.value().len(),
        })
}

// ──────────────────────────────────────────────
// Decoder
// ──────────────────────────────────────────────

/// Estado da máquina de framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeState {
    /// Próximo byte é o tipo.
    #[default]
    AwaitType,
    /// Próximo byte é o tamanho.
    AwaitLength { tlv_type: u8 },
    /// Acumulando `remaining` bytes de valor.
    AwaitValue { tlv_type: u8, remaining: u8 },
}

/// Decoder incremental de streams TLV.
///
/// Dono exclusivo do estado de framing; não é compartilhado entre threads.
#[derive(Debug, Default)]
pub struct TlvDecoder {
    state: DecodeState,
    value: Vec<u8>,
}

impl TlvDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avança um byte. Retorna o registro se este byte o completou.
    pub fn push(&mut self, byte: u8) -> Option<TlvRecord> {
        match self.state {
            DecodeState::AwaitType => {
                self.state = DecodeState::AwaitLength { tlv_type: byte };
                None
            }
            DecodeState::AwaitLength { tlv_type } => {
                if byte == 0 {
                    self.state = DecodeState::AwaitType;
                    return Some(TlvRecord::from_parts(tlv_type, Vec::new()));
                }
                self.value = Vec::with_capacity(byte as usize);
                self.state = DecodeState::AwaitValue {
                    tlv_type,
                    remaining: byte,
                };
                None
            }
            DecodeState::AwaitValue {
                tlv_type,
                remaining,
            } => {
                self.value.push(byte);
                if remaining == 1 {
                    self.state = DecodeState::AwaitType;
                    let value = std::mem::take(&mut self.value);
                    Some(TlvRecord::from_parts(tlv_type, value))
                } else {
                    self.state = DecodeState::AwaitValue {
                        tlv_type,
                        remaining: remaining - 1,
                    };
                    None
                }
            }
        }
    }

    /// Iterador preguiçoso sobre os registros completados por `chunk`.
    ///
    /// Bytes só são consumidos conforme o iterador avança. Bytes que
    /// sobrarem quando o iterador for descartado não entram no decoder
    /// (ver [`Records::remaining`]).
    pub fn decode<'d, 'b>(&'d mut self, chunk: &'b [u8]) -> Records<'d, 'b> {
        Records {
            decoder: self,
            bytes: chunk.iter(),
        }
    }

    /// Consome o chunk inteiro e retorna os registros completos.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<TlvRecord> {
        self.decode(chunk).collect()
    }

    /// Descarta registro parcial e volta a `AwaitType`.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitType;
        self.value.clear();
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// `true` quando está entre registros.
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::AwaitType
    }

    /// Bytes do registro parcial já consumidos (header incluso).
    pub fn pending_len(&self) -> usize {
        match self.state {
            DecodeState::AwaitType => 0,
            DecodeState::AwaitLength { .. } => 1,
            DecodeState::AwaitValue { .. } => HEADER_SIZE + self.value.len(),
        }
    }
}

/// Registros decodificados de um chunk. Ver [`TlvDecoder::decode`].
#[derive(Debug)]
pub struct Records<'d, 'b> {
    decoder: &'d mut TlvDecoder,
    bytes: std::slice::Iter<'b, u8>,
}

impl Records<'_, '_> {
    /// Bytes do chunk ainda não consumidos.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl Iterator for Records<'_, '_> {
    type Item = TlvRecord;

    fn next(&mut self) -> Option<TlvRecord> {
        for &byte in self.bytes.by_ref() {
            if let Some(record) = self.decoder.push(byte) {
                return Some(record);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Records<'_, '_> {}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
