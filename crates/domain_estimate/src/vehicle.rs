//! Vehicle details captured at intake

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EstimateError;

/// The damaged vehicle
///
/// A freshly created claim carries an empty vehicle; `make` and `model`
/// must be filled in before the claim moves on to photos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub year: Option<i32>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<u32>,
    pub vin: Option<String>,
}

/// Partial vehicle update; `None` fields leave the current value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<u32>,
    pub vin: Option<String>,
}

impl Vehicle {
    pub fn new(year: i32, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            year: Some(year),
            make: make.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_vin(mut self, vin: impl Into<String>) -> Self {
        self.vin = Some(vin.into());
        self
    }

    pub fn with_mileage(mut self, mileage: u32) -> Self {
        self.mileage = Some(mileage);
        self
    }

    /// Merges the populated fields of `update` into this vehicle
    pub fn merge(&mut self, update: VehicleUpdate) {
        if let Some(year) = update.year {
            self.year = Some(year);
        }
        if let Some(make) = update.make {
            self.make = make;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if update.trim.is_some() {
            self.trim = update.trim;
        }
        if update.color.is_some() {
            self.color = update.color;
        }
        if update.mileage.is_some() {
            self.mileage = update.mileage;
        }
        if update.vin.is_some() {
            self.vin = update.vin;
        }
    }

    /// Checks that the fields required to proceed past vehicle intake are present
    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.make.trim().is_empty() {
            return Err(EstimateError::incomplete_vehicle("make is required"));
        }
        if self.model.trim().is_empty() {
            return Err(EstimateError::incomplete_vehicle("model is required"));
        }
        Ok(())
    }

    /// Age in whole model years as of `date`; zero when the year is unknown or in the future
    pub fn age(&self, as_of: NaiveDate) -> u32 {
        match self.year {
            Some(year) => (as_of.year() - year).max(0) as u32,
            None => 0,
        }
    }

    /// "2022 Toyota Camry SE"
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        for field in [Some(&self.make), Some(&self.model), self.trim.as_ref()] {
            if let Some(value) = field {
                if !value.trim().is_empty() {
                    parts.push(value.clone());
                }
            }
        }
        parts.join(" ")
    }
}
