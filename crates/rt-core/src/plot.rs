//! Plot geometry shared by the data and render layers

use serde::{Deserialize, Serialize};

/// Space between the canvas edge and the plot area, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            left: 56.0,
            right: 16.0,
            top: 20.0,
            bottom: 28.0,
        }
    }
}

/// Value range shown on the y axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YDomain {
    pub min: f64,
    pub max: f64,
}

impl YDomain {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}
