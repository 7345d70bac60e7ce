//! Claim photos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::PhotoId;

/// Where the photo was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoAngle {
    Front,
    Rear,
    DriverSide,
    PassengerSide,
    FrontDriverCorner,
    FrontPassengerCorner,
    RearDriverCorner,
    RearPassengerCorner,
    Closeup,
}

impl PhotoAngle {
    pub const ALL: [PhotoAngle; 9] = [
        PhotoAngle::Front,
        PhotoAngle::Rear,
        PhotoAngle::DriverSide,
        PhotoAngle::PassengerSide,
        PhotoAngle::FrontDriverCorner,
        PhotoAngle::FrontPassengerCorner,
        PhotoAngle::RearDriverCorner,
        PhotoAngle::RearPassengerCorner,
        PhotoAngle::Closeup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PhotoAngle::Front => "Front",
            PhotoAngle::Rear => "Rear",
            PhotoAngle::DriverSide => "Driver Side",
            PhotoAngle::PassengerSide => "Passenger Side",
            PhotoAngle::FrontDriverCorner => "Front Driver Corner",
            PhotoAngle::FrontPassengerCorner => "Front Passenger Corner",
            PhotoAngle::RearDriverCorner => "Rear Driver Corner",
            PhotoAngle::RearPassengerCorner => "Rear Passenger Corner",
            PhotoAngle::Closeup => "Close-up",
        }
    }
}

/// A photo attached to a claim
///
/// `uri` is an opaque reference to the image data; nothing in the core reads pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub uri: String,
    pub angle: Option<PhotoAngle>,
    pub timestamp: DateTime<Utc>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Photo {
    pub fn new(uri: impl Into<String>, angle: Option<PhotoAngle>) -> Self {
        Self {
            id: PhotoId::new(),
            uri: uri.into(),
            angle,
            timestamp: Utc::now(),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// The angle used for damage detection; untagged photos count as close-ups
    pub fn effective_angle(&self) -> PhotoAngle {
        self.angle.unwrap_or(PhotoAngle::Closeup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_serializes_snake_case() {
        let json = serde_json::to_string(&PhotoAngle::FrontDriverCorner).unwrap();
        assert_eq!(json, "\"front_driver_corner\"");
    }

    #[test]
    fn test_untagged_photo_is_closeup() {
        let photo = Photo::new("file:///tmp/1.jpg", None);
        assert_eq!(photo.effective_angle(), PhotoAngle::Closeup);
    }
}
