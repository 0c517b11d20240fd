//! Types for product batches

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Server-assigned batch identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub i64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product types a batch can hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[default]
    Chicken,
    Beef,
    Pork,
    Seafood,
}

impl Product {
    /// Every product, in form order
    pub const ALL: [Product; 4] = [Product::Chicken, Product::Beef, Product::Pork, Product::Seafood];

    /// Name as sent to the server
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chicken => "Chicken",
            Self::Beef => "Beef",
            Self::Pork => "Pork",
            Self::Seafood => "Seafood",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Product::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown product '{}', expected one of Chicken, Beef, Pork, Seafood",
                    s
                ))
            })
    }
}

/// A tracked product lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub product: Product,
    pub batch_identifier: String,
    pub butcher_date: NaiveDate,
    pub arrival_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A batch as returned by the single-batch endpoint, with its shelf age
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWithFreshness {
    #[serde(flatten)]
    pub batch: Batch,
    pub days_on_shelf: i64,
}

/// Body of a batch creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    pub product: Product,
    pub batch_identifier: String,
    pub butcher_date: NaiveDate,
    pub arrival_date: NaiveDate,
}

impl NewBatch {
    /// True if `batch` carries the same four fields
    pub fn matches(&self, batch: &Batch) -> bool {
        self.product == batch.product
            && self.batch_identifier == batch.batch_identifier
            && self.butcher_date == batch.butcher_date
            && self.arrival_date == batch.arrival_date
    }
}

/// Raw state of the batch entry form.
///
/// Only required-field presence is checked here; the ordering of the two
/// dates is never validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchForm {
    pub product: Product,
    pub batch_identifier: String,
    pub butcher_date: String,
    pub arrival_date: String,
}

impl BatchForm {
    /// Names of the required fields left empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.batch_identifier.trim().is_empty() {
            missing.push("batch_identifier");
        }
        if self.butcher_date.trim().is_empty() {
            missing.push("butcher_date");
        }
        if self.arrival_date.trim().is_empty() {
            missing.push("arrival_date");
        }
        missing
    }

    /// Convert to a creation request; dates use the `YYYY-MM-DD` form
    pub fn to_new_batch(&self) -> Result<NewBatch> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "required fields missing: {}",
                missing.join(", ")
            )));
        }
        Ok(NewBatch {
            product: self.product,
            batch_identifier: self.batch_identifier.trim().to_string(),
            butcher_date: parse_date("butcher_date", &self.butcher_date)?,
            arrival_date: parse_date("arrival_date", &self.arrival_date)?,
        })
    }

    /// Back to the initial form state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("{} must be a YYYY-MM-DD date, got '{}'", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_parses_case_insensitively() {
        assert_eq!("beef".parse::<Product>().unwrap(), Product::Beef);
        assert_eq!(" Seafood ".parse::<Product>().unwrap(), Product::Seafood);
        assert!("Lamb".parse::<Product>().is_err());
    }

    #[test]
    fn batch_with_freshness_flattens() {
        let value = json!({
            "id": 12,
            "product": "Pork",
            "batch_identifier": "P-7",
            "butcher_date": "2024-03-01",
            "arrival_date": "2024-03-02",
            "created_at": "2024-03-02T08:00:00",
            "days_on_shelf": 3
        });
        let parsed: BatchWithFreshness = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.batch.id, BatchId(12));
        assert_eq!(parsed.batch.product, Product::Pork);
        assert_eq!(parsed.days_on_shelf, 3);
    }

    #[test]
    fn form_reports_missing_fields() {
        let form = BatchForm {
            batch_identifier: "  ".to_string(),
            butcher_date: "2024-01-01".to_string(),
            ..Default::default()
        };
        assert_eq!(form.missing_fields(), vec!["batch_identifier", "arrival_date"]);
        assert!(matches!(form.to_new_batch(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn form_accepts_arrival_before_butcher() {
        let form = BatchForm {
            product: Product::Chicken,
            batch_identifier: "C-1".to_string(),
            butcher_date: "2024-05-10".to_string(),
            arrival_date: "2024-05-01".to_string(),
        };
        let batch = form.to_new_batch().unwrap();
        assert!(batch.arrival_date < batch.butcher_date);
    }

    #[test]
    fn reset_restores_default_product() {
        let mut form = BatchForm {
            product: Product::Seafood,
            batch_identifier: "S-1".to_string(),
            ..Default::default()
        };
        form.reset();
        assert_eq!(form, BatchForm::default());
        assert_eq!(form.product, Product::Chicken);
    }
}
