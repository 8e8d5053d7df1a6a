//! Delivery partner directory entries.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(pub String);

impl From<&str> for PartnerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for PartnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPartner {
    pub id: PartnerId,
    pub name: String,
    pub rating: f32,
    pub vehicle: String,
    pub location: GeoPoint,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl DeliveryPartner {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vehicle: impl Into<String>) -> Self {
        Self {
            id: PartnerId(id.into()),
            name: name.into(),
            rating: 5.0,
            vehicle: vehicle.into(),
            location: GeoPoint { lat: 0.0, lng: 0.0 },
            is_available: true,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.location = GeoPoint { lat, lng };
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}
