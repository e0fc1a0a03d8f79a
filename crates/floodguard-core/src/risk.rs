//! Rule-based flood risk classifier.

use crate::models::{CurrentWeather, Forecast, RiskLevel, RiskVerdict};
use crate::rules::RiskRules;

/// Rainfall used for classification: the 1-hour value when present and
/// non-zero, else the 3-hour value, else zero.
pub fn rainfall_mm(current: Option<&CurrentWeather>) -> f64 {
    let Some(current) = current else {
        return 0.0;
    };
    let one_hour = current.rain_1h_mm.filter(|v| *v != 0.0 && !v.is_nan());
    one_hour
        .or(current.rain_3h_mm)
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    rules: RiskRules,
}

impl RiskClassifier {
    pub fn new(rules: RiskRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RiskRules {
        &self.rules
    }

    /// Classify a site. The forecast is accepted for context but does not
    /// affect the verdict.
    pub fn assess(
        &self,
        current: Option<&CurrentWeather>,
        _forecast: Option<&Forecast>,
        elevation_m: Option<f64>,
    ) -> RiskVerdict {
        let rain = rainfall_mm(current);
        let elevation_m = elevation_m.filter(|e| e.is_finite());

        match self.rules.rules.iter().find(|rule| rule.matches(rain, elevation_m)) {
            Some(rule) => RiskVerdict {
                level: rule.level,
                reasons: vec![rule.reason.clone()],
                rainfall_mm: rain,
            },
            None => RiskVerdict {
                level: RiskLevel::Low,
                reasons: Vec::new(),
                rainfall_mm: rain,
            },
        }
    }

    /// Display radius in whole meters, scaled linearly with rainfall.
    pub fn radius_from_rain(&self, rain_mm: f64) -> u32 {
        let rules = &self.rules;
        let cap = rules.radius_rain_cap_mm;
        let rain = if rain_mm.is_nan() { 0.0 } else { rain_mm.clamp(0.0, cap) };
        let span = f64::from(rules.max_radius_m.saturating_sub(rules.min_radius_m));
        let scaled = if cap > 0.0 { span * rain / cap } else { 0.0 };
        (f64::from(rules.min_radius_m) + scaled) as u32
    }
}

/// Classify with the default risk table.
pub fn assess(
    current: Option<&CurrentWeather>,
    forecast: Option<&Forecast>,
    elevation_m: Option<f64>,
) -> RiskVerdict {
    RiskClassifier::default().assess(current, forecast, elevation_m)
}

/// Display radius with the default scaling: 1000 m dry up to 20000 m at 30 mm.
pub fn radius_from_rain(rain_mm: f64) -> u32 {
    RiskClassifier::default().radius_from_rain(rain_mm)
}
