//! Registro de tipos TLV – contrato compartilhado entre sender e receiver.
//!
//! Cada sinal do veículo possui um identificador de 8 bits fixo. Os IDs
//! nunca são reaproveitados para outro significado: o byte stream não
//! carrega schema, então ambos os lados precisam desta tabela idêntica.
//!
//! ```text
//! 0x01 RPM              u16    0x0B..=0x0E Pressão pneus  u16
//! 0x02 Boost (mbar)     u16    0x0F..=0x12 Temp. pneus    i16
//! 0x03 Pressão óleo     u16
//! 0x04 Combustível      u16
//! 0x05 Velocidade       u16
//! 0x06 Status flags     u8
//! 0x07 Ângulo volante   i16
//! 0x08 Pressão freio    u16
//! 0x09 Acelerador       u8
//! 0x0A Marcha           u8
//! ```

use crate::protocol::ProtocolError;
use std::fmt;

// ──────────────────────────────────────────────
// Sinais
// ──────────────────────────────────────────────

/// Sinal semântico transmitido no link TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SignalType {
    Rpm = 0x01,
    BoostPressure = 0x02,
    OilPressure = 0x03,
    FuelLevel = 0x04,
    Speed = 0x05,
    StatusFlags = 0x06,
    SteeringAngle = 0x07,
    BrakePressure = 0x08,
    ThrottlePosition = 0x09,
    GearPosition = 0x0A,
    TyrePressureFrontLeft = 0x0B,
    TyrePressureFrontRight = 0x0C,
    TyrePressureRearLeft = 0x0D,
    TyrePressureRearRight = 0x0E,
    TyreTempFrontLeft = 0x0F,
    TyreTempFrontRight = 0x10,
    TyreTempRearLeft = 0x11,
    TyreTempRearRight = 0x12,
}

impl SignalType {
    /// Todos os sinais, na ordem fixa de transmissão de cada ciclo.
    pub const ALL: [SignalType; 18] = [
        SignalType::Rpm,
        SignalType::BoostPressure,
        SignalType::OilPressure,
        SignalType::FuelLevel,
        SignalType::Speed,
        SignalType::StatusFlags,
        SignalType::SteeringAngle,
        SignalType::BrakePressure,
        SignalType::ThrottlePosition,
        SignalType::GearPosition,
        SignalType::TyrePressureFrontLeft,
        SignalType::TyrePressureFrontRight,
        SignalType::TyrePressureRearLeft,
        SignalType::TyrePressureRearRight,
        SignalType::TyreTempFrontLeft,
        SignalType::TyreTempFrontRight,
        SignalType::TyreTempRearLeft,
        SignalType::TyreTempRearRight,
    ];

    /// Identificador no fio.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Largura e sinal esperados do payload deste tipo.
    pub const fn kind(self) -> ValueKind {
        match self {
            SignalType::StatusFlags | SignalType::ThrottlePosition | SignalType::GearPosition => {
                ValueKind::U8
            }
            SignalType::SteeringAngle
            | SignalType::TyreTempFrontLeft
            | SignalType::TyreTempFrontRight
            | SignalType::TyreTempRearLeft
            | SignalType::TyreTempRearRight => ValueKind::I16,
            _ => ValueKind::U16,
        }
    }

    /// Nome estável em snake_case (usado em logs).
    pub const fn name(self) -> &'static str {
        match self {
            SignalType::Rpm => "rpm",
            SignalType::BoostPressure => "boost_pressure",
            SignalType::OilPressure => "oil_pressure",
            SignalType::FuelLevel => "fuel_level",
            SignalType::Speed => "speed",
            SignalType::StatusFlags => "status_flags",
            SignalType::SteeringAngle => "steering_angle",
            SignalType::BrakePressure => "brake_pressure",
            SignalType::ThrottlePosition => "throttle_position",
            SignalType::GearPosition => "gear_position",
            SignalType::TyrePressureFrontLeft => "tyre_pressure_fl",
            SignalType::TyrePressureFrontRight => "tyre_pressure_fr",
            SignalType::TyrePressureRearLeft => "tyre_pressure_rl",
            SignalType::TyrePressureRearRight => "tyre_pressure_rr",
            SignalType::TyreTempFrontLeft => "tyre_temp_fl",
            SignalType::TyreTempFrontRight => "tyre_temp_fr",
            SignalType::TyreTempRearLeft => "tyre_temp_rl",
            SignalType::TyreTempRearRight => "tyre_temp_rr",
        }
    }

    /// Posição do pneu (FL, FR, RL, RR → 0..4) para os sinais de pneu.
    pub const fn tyre_index(self) -> Option<usize> {
        match self {
            SignalType::TyrePressureFrontLeft | SignalType::TyreTempFrontLeft => Some(0),
            SignalType::TyrePressureFrontRight | SignalType::TyreTempFrontRight => Some(1),
            SignalType::TyrePressureRearLeft | SignalType::TyreTempRearLeft => Some(2),
            SignalType::TyrePressureRearRight | SignalType::TyreTempRearRight => Some(3),
            _ => None,
        }
    }
}

impl TryFrom<u8> for SignalType {
    type Error = ProtocolError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        SignalType::ALL
            .iter()
            .copied()
            .find(|s| s.id() == id)
            .ok_or(ProtocolError::UnknownType(id))
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.id())
    }
}

// ──────────────────────────────────────────────
// Escalares
// ──────────────────────────────────────────────

/// Schema de um payload: largura e sinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    U8,
    I8,
    U16,
    I16,
}

impl ValueKind {
    /// Quantidade de bytes no fio (vai no campo `length`).
    pub const fn width(self) -> usize {
        match self {
            ValueKind::U8 | ValueKind::I8 => 1,
            ValueKind::U16 | ValueKind::I16 => 2,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::U8 => "u8",
            ValueKind::I8 => "i8",
            ValueKind::U16 => "u16",
            ValueKind::I16 => "i16",
        };
        f.write_str(name)
    }
}

/// Valor escalar de um sinal. Multi-byte é sempre little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

impl Scalar {
    pub const fn kind(self) -> ValueKind {
        match self {
            Scalar::U8(_) => ValueKind::U8,
            Scalar::I8(_) => ValueKind::I8,
            Scalar::U16(_) => ValueKind::U16,
            Scalar::I16(_) => ValueKind::I16,
        }
    }

    /// Anexa o padrão de bits do valor (LSB primeiro) ao buffer.
    pub fn write_le(self, buf: &mut Vec<u8>) {
        match self {
            Scalar::U8(v) => buf.push(v),
            Scalar::I8(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Scalar::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Scalar::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Reinterpreta bytes crus segundo `kind`.
    ///
    /// Retorna `None` se a quantidade de bytes não bate com a largura.
    pub fn from_le_bytes(kind: ValueKind, bytes: &[u8]) -> Option<Scalar> {
        match (kind, bytes) {
            (ValueKind::U8, &[b]) => Some(Scalar::U8(b)),
            (ValueKind::I8, &[b]) => Some(Scalar::I8(i8::from_le_bytes([b]))),
            (ValueKind::U16, &[lo, hi]) => Some(Scalar::U16(u16::from_le_bytes([lo, hi]))),
            (ValueKind::I16, &[lo, hi]) => Some(Scalar::I16(i16::from_le_bytes([lo, hi]))),
            _ => None,
        }
    }

    /// Valor numérico com sinal, independente da largura.
    pub const fn as_i32(self) -> i32 {
        match self {
            Scalar::U8(v) => v as i32,
            Scalar::I8(v) => v as i32,
            Scalar::U16(v) => v as i32,
            Scalar::I16(v) => v as i32,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
