//! Tipos de dados do link de telemetria.
//!
//! - [`TlvRecord`] – registro cru `(type, value)` como trafega no fio
//! - [`StatusFlags`] – bitfield de luzes/avisos do painel (tipo 0x06)
//! - [`VehicleData`] – snapshot com a última leitura de cada sinal

use crate::protocol::{ProtocolError, interpret};
use crate::registry::{Scalar, SignalType};

/// Maior payload representável (campo `length` tem 1 byte).
pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

// ──────────────────────────────────────────────
// Registro TLV
// ──────────────────────────────────────────────

/// Registro TLV decodificado ou a ser codificado.
///
/// O `length` do fio é sempre `value.len()`, e nunca passa de
/// [`MAX_VALUE_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlvRecord {
    tlv_type: u8,
    value: Vec<u8>,
}

impl TlvRecord {
    /// Cria um registro, rejeitando payloads maiores que 255 bytes.
    pub fn new(tlv_type: u8, value: Vec<u8>) -> Result<Self, ProtocolError> {
        if value.len() > MAX_VALUE_LEN {
            return Err(ProtocolError::OversizedValue(value.len()));
        }
        Ok(Self { tlv_type, value })
    }

    /// Registro a partir de um escalar (sempre cabe).
    pub fn from_scalar(tlv_type: u8, value: Scalar) -> Self {
        let mut bytes = Vec::with_capacity(value.kind().width());
        value.write_le(&mut bytes);
        Self {
            tlv_type,
            value: bytes,
        }
    }

    /// Usado pelo decoder, que nunca acumula mais que `u8::MAX` bytes.
    pub(crate) fn from_parts(tlv_type: u8, value: Vec<u8>) -> Self {
        debug_assert!(value.len() <= MAX_VALUE_LEN);
        Self { tlv_type, value }
    }

    pub fn tlv_type(&self) -> u8 {
        self.tlv_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Valor do campo `length` no fio.
    pub fn len(&self) -> u8 {
        // Invariante garantida na construção.
        self.value.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Interpreta o payload via registro de tipos.
    pub fn interpret(&self) -> Result<(SignalType, Scalar), ProtocolError> {
        interpret(self)
    }
}

// ──────────────────────────────────────────────
// Status flags
// ──────────────────────────────────────────────

/// Luzes de aviso e estados do painel, um bit cada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    /// Luz de injeção (MIL)
    pub mil: bool,
    pub abs_warning: bool,
    pub airbag_warning: bool,
    pub left_turn: bool,
    pub right_turn: bool,
    pub high_beam: bool,
    pub parking_brake: bool,
    /// Reservado (bit 7)
    pub reserved: bool,
}

impl StatusFlags {
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            mil: byte & 0x01 != 0,
            abs_warning: byte & 0x02 != 0,
            airbag_warning: byte & 0x04 != 0,
            left_turn: byte & 0x08 != 0,
            right_turn: byte & 0x10 != 0,
            high_beam: byte & 0x20 != 0,
            parking_brake: byte & 0x40 != 0,
            reserved: byte & 0x80 != 0,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (self.mil as u8)
            | (self.abs_warning as u8) << 1
            | (self.airbag_warning as u8) << 2
            | (self.left_turn as u8) << 3
            | (self.right_turn as u8) << 4
            | (self.high_beam as u8) << 5
            | (self.parking_brake as u8) << 6
            | (self.reserved as u8) << 7
    }

    /// Algum aviso crítico aceso (MIL, ABS ou airbag).
    pub const fn any_warning(self) -> bool {
        self.mil || self.abs_warning || self.airbag_warning
    }
}

// ──────────────────────────────────────────────
// Snapshot do veículo
// ──────────────────────────────────────────────

/// Última leitura conhecida de cada sinal. `None` = nunca recebido.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleData {
    pub rpm: Option<u16>,
    /// Pressão do turbo (mbar)
    pub boost_pressure: Option<u16>,
    pub oil_pressure: Option<u16>,
    pub fuel_level: Option<u16>,
    /// Velocidade (km/h)
    pub speed: Option<u16>,
    pub status_flags: Option<StatusFlags>,
    /// Ângulo do volante (graus, negativo = esquerda)
    pub steering_angle: Option<i16>,
    pub brake_pressure: Option<u16>,
    /// Posição do acelerador (0–100%)
    pub throttle_position: Option<u8>,
    pub gear_position: Option<u8>,
    /// FL, FR, RL, RR
    pub tyre_pressures: [Option<u16>; 4],
    /// FL, FR, RL, RR (décimos de °C)
    pub tyre_temps: [Option<i16>; 4],
}

impl VehicleData {
    /// Atualiza o campo correspondente a `signal`.
    ///
    /// Falha com [`ProtocolError::KindMismatch`] se o escalar não tem o
    /// schema do sinal.
    pub fn set(&mut self, signal: SignalType, value: Scalar) -> Result<(), ProtocolError> {
        use SignalType as S;

        match (signal, value) {
            (S::Rpm, Scalar::U16(v)) => self.rpm = Some(v),
            (S::BoostPressure, Scalar::U16(v)) => self.boost_pressure = Some(v),
            (S::OilPressure, Scalar::U16(v)) => self.oil_pressure = Some(v),
            (S::FuelLevel, Scalar::U16(v)) => self.fuel_level = Some(v),
            (S::Speed, Scalar::U16(v)) => self.speed = Some(v),
            (S::StatusFlags, Scalar::U8(v)) => self.status_flags = Some(StatusFlags::from_byte(v)),
            (S::SteeringAngle, Scalar::I16(v)) => self.steering_angle = Some(v),
            (S::BrakePressure, Scalar::U16(v)) => self.brake_pressure = Some(v),
            (S::ThrottlePosition, Scalar::U8(v)) => self.throttle_position = Some(v),
            (S::GearPosition, Scalar::U8(v)) => self.gear_position = Some(v),
            (
                S::TyrePressureFrontLeft
                | S::TyrePressureFrontRight
                | S::TyrePressureRearLeft
                | S::TyrePressureRearRight,
                Scalar::U16(v),
            ) => {
                if let Some(i) = signal.tyre_index() {
                    self.tyre_pressures[i] = Some(v);
                }
            }
            (
                S::TyreTempFrontLeft
                | S::TyreTempFrontRight
                | S::TyreTempRearLeft
                | S::TyreTempRearRight,
                Scalar::I16(v),
            ) => {
                if let Some(i) = signal.tyre_index() {
                    self.tyre_temps[i] = Some(v);
                }
            }
            _ => {
                return Err(ProtocolError::KindMismatch {
                    signal,
                    expected: signal.kind(),
                    actual: value.kind(),
                });
            }
        }

        Ok(())
    }

    /// Valor atual de `signal`, se já recebido.
    pub fn get(&self, signal: SignalType) -> Option<Scalar> {
        use SignalType as S;

        match signal {
            S::Rpm => self.rpm.map(Scalar::U16),
            S::BoostPressure => self.boost_pressure.map(Scalar::U16),
            S::OilPressure => self.oil_pressure.map(Scalar::U16),
            S::FuelLevel => self.fuel_level.map(Scalar::U16),
            S::Speed => self.speed.map(Scalar::U16),
            S::StatusFlags => self.status_flags.map(|f| Scalar::U8(f.to_byte())),
            S::SteeringAngle => self.steering_angle.map(Scalar::I16),
            S::BrakePressure => self.brake_pressure.map(Scalar::U16),
            S::ThrottlePosition => self.throttle_position.map(Scalar::U8),
            S::GearPosition => self.gear_position.map(Scalar::U8),
            S::TyrePressureFrontLeft
            | S::TyrePressureFrontRight
            | S::TyrePressureRearLeft
            | S::TyrePressureRearRight => signal
                .tyre_index()
                .and_then(|i| self.tyre_pressures[i])
                .map(Scalar::U16),
            S::TyreTempFrontLeft
            | S::TyreTempFrontRight
            | S::TyreTempRearLeft
            | S::TyreTempRearRight => signal
                .tyre_index()
                .and_then(|i| self.tyre_temps[i])
                .map(Scalar::I16),
        }
    }

    /// Interpreta um registro e aplica no snapshot.
    ///
    /// Tipos desconhecidos retornam erro sem alterar nada; o chamador
    /// decide se loga ou ignora.
    pub fn apply(&mut self, record: &TlvRecord) -> Result<SignalType, ProtocolError> {
        let (signal, value) = interpret(record)?;
        self.set(signal, value)?;
        Ok(signal)
    }

    /// Sinais presentes, na ordem fixa de [`SignalType::ALL`].
    pub fn readings(&self) -> impl Iterator<Item = (SignalType, Scalar)> + '_ {
        SignalType::ALL
            .iter()
            .filter_map(|&signal| self.get(signal).map(|value| (signal, value)))
    }

    /// Quantidade de sinais já recebidos.
    pub fn populated(&self) -> usize {
        self.readings().count()
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_oversized_value() {
        assert!(TlvRecord::new(0x01, vec![0; 255]).is_ok());
        assert!(matches!(
            TlvRecord::new(0x01, vec![0; 256]),
            Err(ProtocolError::OversizedValue(256))
        ));
    }

    #[test]
    fn record_from_scalar_is_little_endian() {
        let record = TlvRecord::from_scalar(0x01, Scalar::U16(2000));
        assert_eq!(record.tlv_type(), 0x01);
        assert_eq!(record.len(), 2);
        assert_eq!(record.value(), &[0xD0, 0x07]);
    }

    #[test]
    fn status_flags_byte_roundtrip() {
        for byte in 0..=u8::MAX {
            assert_eq!(StatusFlags::from_byte(byte).to_byte(), byte);
        }
        let flags = StatusFlags::from_byte(0b0100_0010);
        assert!(flags.abs_warning);
        assert!(flags.parking_brake);
        assert!(!flags.mil);
        assert!(flags.any_warning());
    }

    #[test]
    fn default_snapshot_is_empty() {
        let data = VehicleData::default();
        assert_eq!(data.populated(), 0);
        assert!(data.get(SignalType::Rpm).is_none());
    }

    #[test]
    fn set_and_get_every_signal() {
        let mut data = VehicleData::default();
        for signal in SignalType::ALL {
            let value = match signal.kind() {
                crate::registry::ValueKind::U8 => Scalar::U8(7),
                crate::registry::ValueKind::I8 => Scalar::I8(-7),
                crate::registry::ValueKind::U16 => Scalar::U16(700),
                crate::registry::ValueKind::I16 => Scalar::I16(-700),
            };
            data.set(signal, value).unwrap();
            assert_eq!(data.get(signal), Some(value), "{signal}");
        }
        assert_eq!(data.populated(), SignalType::ALL.len());
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut data = VehicleData::default();
        let err = data.set(SignalType::SteeringAngle, Scalar::U16(10)).unwrap_err();
        assert!(matches!(err, ProtocolError::KindMismatch { .. }));
        assert!(data.steering_angle.is_none());
    }

    #[test]
    fn apply_updates_tyres() {
        let mut data = VehicleData::default();
        let record = TlvRecord::from_scalar(0x11, Scalar::I16(-15));
        assert_eq!(data.apply(&record).unwrap(), SignalType::TyreTempRearLeft);
        assert_eq!(data.tyre_temps, [None, None, Some(-15), None]);
    }

    #[test]
    fn apply_unknown_type_leaves_snapshot_untouched() {
        let mut data = VehicleData::default();
        let record = TlvRecord::new(0x42, vec![1, 2, 3]).unwrap();
        assert!(matches!(
            data.apply(&record),
            Err(ProtocolError::UnknownType(0x42))
        ));
        assert_eq!(data, VehicleData::default());
    }

    #[test]
    fn readings_follow_registry_order() {
        let mut data = VehicleData::default();
        data.gear_position = Some(3);
        data.rpm = Some(2000);
        data.speed = Some(80);
        let order: Vec<_> = data.readings().map(|(s, _)| s).collect();
        assert_eq!(
            order,
            vec![SignalType::Rpm, SignalType::Speed, SignalType::GearPosition]
        );
    }
}
