//! Typed customer record validated at the system boundary

use crate::error::ChurnError;
use serde::{Deserialize, Serialize};

/// One customer as received from the training CSV or a prediction request.
///
/// Field names on the wire follow the upstream dataset column names, so the
/// serde renames map the Rust fields back to them. Every field is required;
/// a JSON body missing any of them fails deserialization before validation
/// even runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerRecord {
    #[serde(rename = "gender")]
    pub gender: String,
    pub senior_citizen: i64,
    pub partner: String,
    pub dependents: String,
    #[serde(rename = "tenure")]
    pub tenure: i64,
    pub phone_service: String,
    pub multiple_lines: String,
    pub internet_service: String,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    pub streaming_movies: String,
    pub contract: String,
    pub paperless_billing: String,
    pub payment_method: String,
    pub monthly_charges: f64,
    pub total_charges: f64,
}

impl CustomerRecord {
    /// Check the constraints a request must satisfy before it may reach the
    /// feature transform.
    pub fn validate(&self) -> Result<(), ChurnError> {
        if self.senior_citizen != 0 && self.senior_citizen != 1 {
            return Err(ChurnError::Validation(format!(
                "SeniorCitizen must be 0 or 1, got {}",
                self.senior_citizen
            )));
        }
        if self.tenure < 1 {
            return Err(ChurnError::Validation(format!(
                "tenure must be >= 1, got {}",
                self.tenure
            )));
        }
        for (name, value) in [
            ("MonthlyCharges", self.monthly_charges),
            ("TotalCharges", self.total_charges),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChurnError::Validation(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in self.categorical_fields() {
            if value.trim().is_empty() {
                return Err(ChurnError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// The raw string-valued fields, in declared column order. `SeniorCitizen`
    /// is excluded here because it is an integer on the wire; the feature
    /// assembler stringifies it into the categorical block itself.
    pub fn categorical_fields(&self) -> [(&'static str, &str); 15] {
        [
            ("gender", &self.gender),
            ("Partner", &self.partner),
            ("Dependents", &self.dependents),
            ("PhoneService", &self.phone_service),
            ("MultipleLines", &self.multiple_lines),
            ("InternetService", &self.internet_service),
            ("OnlineSecurity", &self.online_security),
            ("OnlineBackup", &self.online_backup),
            ("DeviceProtection", &self.device_protection),
            ("TechSupport", &self.tech_support),
            ("StreamingTV", &self.streaming_tv),
            ("StreamingMovies", &self.streaming_movies),
            ("Contract", &self.contract),
            ("PaperlessBilling", &self.paperless_billing),
            ("PaymentMethod", &self.payment_method),
        ]
    }
}

/// Test fixture: the sample customer from the serving contract.
#[cfg(test)]
pub(crate) fn sample_record() -> CustomerRecord {
    CustomerRecord {
        gender: "Female".to_string(),
        senior_citizen: 0,
        partner: "Yes".to_string(),
        dependents: "No".to_string(),
        tenure: 1,
        phone_service: "No".to_string(),
        multiple_lines: "No phone service".to_string(),
        internet_service: "DSL".to_string(),
        online_security: "No".to_string(),
        online_backup: "Yes".to_string(),
        device_protection: "No".to_string(),
        tech_support: "No".to_string(),
        streaming_tv: "No".to_string(),
        streaming_movies: "No".to_string(),
        contract: "Month-to-month".to_string(),
        paperless_billing: "Yes".to_string(),
        payment_method: "Electronic check".to_string(),
        monthly_charges: 29.85,
        total_charges: 29.85,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record_passes() {
        assert!(sample_record().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_senior_citizen() {
        let mut record = sample_record();
        record.senior_citizen = 2;
        let err = record.validate().unwrap_err();
        assert!(matches!(err, ChurnError::Validation(_)));
    }

    #[test]
    fn test_rejects_zero_tenure() {
        let mut record = sample_record();
        record.tenure = 0;
        assert!(matches!(
            record.validate(),
            Err(ChurnError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_negative_and_non_finite_charges() {
        let mut record = sample_record();
        record.total_charges = -1.0;
        assert!(record.validate().is_err());

        record.total_charges = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_categorical() {
        let mut record = sample_record();
        record.contract = "  ".to_string();
        assert!(matches!(
            record.validate(),
            Err(ChurnError::Validation(_))
        ));
    }

    #[test]
    fn test_json_round_trip_uses_wire_names() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["gender"], "Female");
        assert_eq!(json["SeniorCitizen"], 0);
        assert_eq!(json["tenure"], 1);
        assert_eq!(json["StreamingTV"], "No");
        assert_eq!(json["PaymentMethod"], "Electronic check");

        let back: CustomerRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_field_fails_deserialization() {
        let mut json = serde_json::to_value(sample_record()).unwrap();
        json.as_object_mut().unwrap().remove("Contract");
        assert!(serde_json::from_value::<CustomerRecord>(json).is_err());
    }
}
