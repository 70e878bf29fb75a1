use serde::{Deserialize, Serialize};

/// Scale a source reports its rating on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RatingScale {
    Ten,      // Douban: 0-10 with one decimal
    Thousand, // WeRead newRating: per-mille (856 = 85.6%)
}

impl RatingScale {
    fn divisor(&self) -> f64 {
        match self {
            RatingScale::Ten => 1.0,
            RatingScale::Thousand => 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RawRating {
    pub value: f64,
    pub scale: RatingScale,
}

impl RawRating {
    pub fn new(value: f64, scale: RatingScale) -> Self {
        Self { value, scale }
    }

    /// Rating on the canonical 0-10 scale, capped at 10.
    /// Non-finite or negative inputs collapse to 0.
    pub fn normalized(&self) -> f64 {
        if !self.value.is_finite() || self.value <= 0.0 {
            return 0.0;
        }
        (self.value / self.scale.divisor()).min(10.0)
    }
}

impl Default for RawRating {
    fn default() -> Self {
        Self::new(0.0, RatingScale::Ten)
    }
}
