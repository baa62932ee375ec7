//! Gerador de leituras mock – ondas senoidais em faixas realistas.
//!
//! Substitui os sensores reais do veículo para testar o link ponta a ponta.

use std::time::Duration;
use tlv_core::types::{StatusFlags, VehicleData};

/// Pressões nominais dos pneus (FL, FR, RL, RR).
const TYRE_PRESSURES: [u16; 4] = [2200, 2200, 2100, 2100];
/// Temperaturas nominais dos pneus em décimos de °C (FL, FR, RL, RR).
const TYRE_TEMPS: [i16; 4] = [300, 305, 295, 290];

/// Fonte de dados mock que avança no tempo a cada amostra.
pub struct MockVehicle {
    t: f64,
    step: f64,
    include_tyres: bool,
}

impl MockVehicle {
    /// Cria o gerador; `step` é o tempo simulado entre amostras.
    pub fn new(step: Duration, include_tyres: bool) -> Self {
        Self {
            t: 0.0,
            step: step.as_secs_f64(),
            include_tyres,
        }
    }

    /// Gera a próxima amostra e avança o relógio simulado.
    pub fn next_sample(&mut self) -> VehicleData {
        let data = sample_at(self.t, self.include_tyres);
        self.t += self.step;
        data
    }

    /// Tempo simulado atual (s).
    pub fn elapsed_secs(&self) -> f64 {
        self.t
    }
}

/// Leituras do instante `t` (segundos).
///
/// Os casts truncam em direção a zero, como no firmware.
pub fn sample_at(t: f64, include_tyres: bool) -> VehicleData {
    let wave = |freq: f64, amplitude: f64| ((t * freq).sin() * amplitude) as i32;
    let cosine = |freq: f64, amplitude: f64| ((t * freq).cos() * amplitude) as i32;

    let mut data = VehicleData {
        rpm: Some((2000 + wave(1.5, 1500.0)) as u16),
        boost_pressure: Some((500.0 + (t * 0.3).sin() * 700.0) as u16),
        oil_pressure: Some((2000 + cosine(0.2, 200.0)) as u16),
        fuel_level: Some((3000 + wave(0.1, 500.0)) as u16),
        speed: Some((80 + wave(0.2, 40.0)) as u16),
        status_flags: Some(StatusFlags::default()),
        steering_angle: Some(wave(0.5, 300.0) as i16),
        brake_pressure: Some((1000 + cosine(0.7, 500.0)) as u16),
        throttle_position: Some((50 + wave(0.8, 40.0)) as u8),
        gear_position: Some((3 + wave(0.2, 2.0)) as u8),
        ..Default::default()
    };

    if include_tyres {
        data.tyre_pressures = TYRE_PRESSURES.map(Some);
        data.tyre_temps = TYRE_TEMPS.map(Some);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_range() {
        let mut mock = MockVehicle::new(Duration::from_millis(50), true);
        for _ in 0..2000 {
            let d = mock.next_sample();
            let rpm = d.rpm.unwrap();
            assert!((500..=3500).contains(&rpm), "rpm {rpm}");
            let steering = d.steering_angle.unwrap();
            assert!((-300..=300).contains(&steering), "steering {steering}");
            let throttle = d.throttle_position.unwrap();
            assert!((10..=90).contains(&throttle), "throttle {throttle}");
            let gear = d.gear_position.unwrap();
            assert!((1..=5).contains(&gear), "gear {gear}");
            let speed = d.speed.unwrap();
            assert!((40..=120).contains(&speed), "speed {speed}");
        }
    }

    #[test]
    fn initial_sample() {
        let d = sample_at(0.0, false);
        assert_eq!(d.rpm, Some(2000));
        assert_eq!(d.oil_pressure, Some(2200));
        assert_eq!(d.brake_pressure, Some(1500));
        assert_eq!(d.steering_angle, Some(0));
        assert_eq!(d.gear_position, Some(3));
        assert_eq!(d.status_flags, Some(StatusFlags::default()));
        assert_eq!(d.tyre_pressures, [None; 4]);
        assert_eq!(d.populated(), 10);
    }

    #[test]
    fn tyres_are_optional() {
        assert_eq!(sample_at(1.0, true).populated(), 18);
        assert_eq!(sample_at(1.0, false).populated(), 10);
    }

    #[test]
    fn clock_advances_by_step() {
        let mut mock = MockVehicle::new(Duration::from_millis(50), false);
        mock.next_sample();
        mock.next_sample();
        assert!((mock.elapsed_secs() - 0.1).abs() < 1e-9);
    }
}
