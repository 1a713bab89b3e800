//! Text templates for the structured payloads the generator is usually fed with.
//!
//! Every template checks its required fields and renders a fixed line layout. Optional fields
//! render as empty values. A timestamp, when given, is appended as a final
//! `Generated on: YYYY-MM-DD HH:MM` line.

use std::fmt::Write;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::common::error::{QRError, QRResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// Required fields that are blank after trimming count as missing
fn require(value: &str, field: &'static str) -> QRResult<()> {
    if value.trim().is_empty() {
        return Err(QRError::MissingField(field));
    }
    Ok(())
}

fn finish(mut body: String, generated_on: Option<&NaiveDateTime>) -> String {
    if let Some(ts) = generated_on {
        let _ = write!(body, "\nGenerated on: {}", ts.format(TIMESTAMP_FORMAT));
    }
    body
}

/// Common interface of the payload templates
pub trait Template {
    fn validate(&self) -> QRResult<()>;

    // Layout without the trailing timestamp line
    fn body(&self) -> String;

    fn render(&self, generated_on: Option<&NaiveDateTime>) -> QRResult<String> {
        self.validate()?;
        Ok(finish(self.body(), generated_on))
    }
}

// Student profile
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub prn: String,
    pub name: String,
    pub department: String,
    pub division: String,
    pub year: String,
    pub contact: String,
}

impl Template for StudentProfile {
    fn validate(&self) -> QRResult<()> {
        require(&self.prn, "prn")?;
        require(&self.name, "name")?;
        require(&self.department, "department")?;
        require(&self.year, "year")
    }

    fn body(&self) -> String {
        format!(
            "STUDENT PROFILE\nPRN: {}\nName: {}\nDepartment: {}\nDivision: {}\nYear: {}\nContact: {}",
            self.prn, self.name, self.department, self.division, self.year, self.contact
        )
    }
}

// Business profile
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub business_name: String,
    pub owner_name: String,
    pub contact: String,
    pub location: String,
    pub specialty: String,
    pub social_media: String,
}

impl Template for BusinessProfile {
    fn validate(&self) -> QRResult<()> {
        require(&self.business_name, "business_name")?;
        require(&self.owner_name, "owner_name")?;
        require(&self.contact, "contact")?;
        require(&self.location, "location")
    }

    fn body(&self) -> String {
        format!(
            "BUSINESS PROFILE\nName: {}\nOwner: {}\nContact: {}\nLocation: {}\nSpecialty: {}\nSocial: {}",
            self.business_name,
            self.owner_name,
            self.contact,
            self.location,
            self.specialty,
            self.social_media
        )
    }
}

// Digital menu
//------------------------------------------------------------------------------

/// Free-form menu, one item per line. Items are embedded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalMenu {
    pub items: String,
}

impl Template for DigitalMenu {
    fn validate(&self) -> QRResult<()> {
        require(&self.items, "items")
    }

    fn body(&self) -> String {
        format!("DIGITAL MENU\n{}", self.items)
    }
}

// Payment options
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentOptions {
    pub upi: bool,
    pub paytm: bool,
    pub phonepe: bool,
    pub google_pay: bool,
    pub cash: bool,
    pub upi_id: String,
}

impl PaymentOptions {
    pub fn accepts_digital(&self) -> bool {
        self.upi || self.paytm || self.phonepe || self.google_pay
    }
}

impl Template for PaymentOptions {
    // The UPI id is only needed once a digital method is accepted
    fn validate(&self) -> QRResult<()> {
        if self.accepts_digital() {
            require(&self.upi_id, "upi_id")?;
        }
        Ok(())
    }

    fn body(&self) -> String {
        let mut out = String::from("PAYMENT OPTIONS\n");
        if self.accepts_digital() {
            out.push_str("Digital Payments Accepted:\n");
            let methods =
                [(self.upi, "UPI"), (self.paytm, "Paytm"), (self.phonepe, "PhonePe"), (self.google_pay, "Google Pay")];
            for (_, label) in methods.iter().filter(|(on, _)| *on) {
                let _ = writeln!(out, "• {label}");
            }
            let _ = writeln!(out, "\nUPI ID: {}", self.upi_id);
        }
        if self.cash {
            out.push_str("\n• Cash Payments Accepted\n");
        }
        // Every section ends its lines, the final one is dropped
        out.pop();
        out
    }
}

// Analytics tag
//------------------------------------------------------------------------------

/// Fixed label payload. Nothing is tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsTag;

impl Template for AnalyticsTag {
    fn validate(&self) -> QRResult<()> {
        Ok(())
    }

    fn body(&self) -> String {
        "ANALYTICS TRACKING\nThis QR code would track customer interactions".to_string()
    }
}

#[cfg(test)]
mod payload_tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use test_case::test_case;

    use super::{AnalyticsTag, BusinessProfile, DigitalMenu, PaymentOptions, StudentProfile, Template};
    use crate::common::error::QRError;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(14, 5, 59).unwrap()
    }

    fn student() -> StudentProfile {
        StudentProfile {
            prn: "12345".into(),
            name: "Jane Doe".into(),
            department: "Computer Science".into(),
            division: "".into(),
            year: "2024-25".into(),
            contact: "555-0100".into(),
        }
    }

    #[test]
    fn test_student_profile() {
        let text = student().render(Some(&ts())).unwrap();
        assert_eq!(
            text,
            "STUDENT PROFILE\nPRN: 12345\nName: Jane Doe\nDepartment: Computer Science\nDivision: \n\
             Year: 2024-25\nContact: 555-0100\nGenerated on: 2024-03-09 14:05"
        );
    }

    #[test]
    fn test_without_timestamp() {
        let text = student().render(None).unwrap();
        assert!(text.starts_with("STUDENT PROFILE\nPRN: 12345\n"));
        assert!(text.ends_with("Contact: 555-0100"));
    }

    #[test_case("prn")]
    #[test_case("name")]
    #[test_case("department")]
    #[test_case("year")]
    fn test_student_missing_field(field: &'static str) {
        let mut s = student();
        match field {
            "prn" => s.prn = "  ".into(),
            "name" => s.name.clear(),
            "department" => s.department.clear(),
            _ => s.year.clear(),
        }
        assert!(matches!(s.render(None), Err(QRError::MissingField(f)) if f == field));
    }

    #[test]
    fn test_business_profile() {
        let b = BusinessProfile {
            business_name: "Chai Point".into(),
            owner_name: "R. Mehta".into(),
            contact: "98200 00000".into(),
            location: "Pune".into(),
            specialty: "Tea".into(),
            social_media: "@chaipoint".into(),
        };
        assert_eq!(
            b.render(Some(&ts())).unwrap(),
            "BUSINESS PROFILE\nName: Chai Point\nOwner: R. Mehta\nContact: 98200 00000\n\
             Location: Pune\nSpecialty: Tea\nSocial: @chaipoint\nGenerated on: 2024-03-09 14:05"
        );

        let missing = BusinessProfile { location: String::new(), ..b };
        assert!(matches!(missing.render(None), Err(QRError::MissingField("location"))));
    }

    #[test]
    fn test_digital_menu() {
        let menu = DigitalMenu { items: "Idli - 40\nDosa - 60".into() };
        assert_eq!(
            menu.render(Some(&ts())).unwrap(),
            "DIGITAL MENU\nIdli - 40\nDosa - 60\nGenerated on: 2024-03-09 14:05"
        );
        let empty = DigitalMenu { items: "\n \n".into() };
        assert!(matches!(empty.render(None), Err(QRError::MissingField("items"))));
    }

    #[test]
    fn test_payment_digital_and_cash() {
        let p = PaymentOptions {
            upi: true,
            google_pay: true,
            cash: true,
            upi_id: "shop@upi".into(),
            ..Default::default()
        };
        assert_eq!(
            p.render(Some(&ts())).unwrap(),
            "PAYMENT OPTIONS\nDigital Payments Accepted:\n• UPI\n• Google Pay\n\nUPI ID: shop@upi\n\n\
             • Cash Payments Accepted\nGenerated on: 2024-03-09 14:05"
        );
    }

    #[test]
    fn test_payment_cash_only() {
        let p = PaymentOptions { cash: true, ..Default::default() };
        assert_eq!(p.render(None).unwrap(), "PAYMENT OPTIONS\n\n• Cash Payments Accepted");
        assert_eq!(PaymentOptions::default().render(None).unwrap(), "PAYMENT OPTIONS");
    }

    #[test]
    fn test_payment_requires_upi_id() {
        let p = PaymentOptions { paytm: true, upi_id: " ".into(), ..Default::default() };
        assert!(matches!(p.render(None), Err(QRError::MissingField("upi_id"))));
    }

    #[test]
    fn test_analytics() {
        assert_eq!(
            AnalyticsTag.render(Some(&ts())).unwrap(),
            "ANALYTICS TRACKING\nThis QR code would track customer interactions\nGenerated on: 2024-03-09 14:05"
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let s: StudentProfile = serde_json::from_str(r#"{"prn": "1", "name": "A"}"#).unwrap();
        assert_eq!(s.department, "");
        assert!(matches!(s.validate(), Err(QRError::MissingField("department"))));
    }
}
