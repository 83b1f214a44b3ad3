use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::domain::error::AppError;
use crate::domain::http_message::HttpResponse;

/// TestText destination for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Email,
    Sms,
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(ContentType::Email),
            "sms" => Ok(ContentType::Sms),
            _ => Err(AppError::ConfigurationError(
                "content_type must be either one of: [\"email\", \"sms\"]".to_string(),
            )),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Email => write!(f, "email"),
            ContentType::Sms => write!(f, "sms"),
        }
    }
}

/// Outcome of an accepted TestText upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// Per-row failure count. The portal reply is not parsed for it, so it is unknown.
    pub failures: Option<u32>,
    pub response: HttpResponse,
}

/// Touchstone date layouts. `Y` is a four digit year, `y` two digits.
/// Codes outside the known set are forwarded as given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateFormat {
    DayMonthYear,
    MonthDayYear,
    #[default]
    YearMonthDay,
    DayMonthShortYear,
    MonthDayShortYear,
    ShortYearMonthDay,
    Custom(String),
}

impl DateFormat {
    pub fn code(&self) -> &str {
        match self {
            DateFormat::DayMonthYear => "d-m-Y",
            DateFormat::MonthDayYear => "m-d-Y",
            DateFormat::YearMonthDay => "Y-m-d",
            DateFormat::DayMonthShortYear => "d-m-y",
            DateFormat::MonthDayShortYear => "m-d-y",
            DateFormat::ShortYearMonthDay => "y-m-d",
            DateFormat::Custom(code) => code,
        }
    }
}

impl FromStr for DateFormat {
    type Err = AppError;

    // Case matters: `Y` and `y` are different formats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d-m-Y" => Ok(DateFormat::DayMonthYear),
            "m-d-Y" => Ok(DateFormat::MonthDayYear),
            "Y-m-d" => Ok(DateFormat::YearMonthDay),
            "d-m-y" => Ok(DateFormat::DayMonthShortYear),
            "m-d-y" => Ok(DateFormat::MonthDayShortYear),
            "y-m-d" => Ok(DateFormat::ShortYearMonthDay),
            "" => Err(AppError::ConfigurationError(
                "date_format must not be empty".to_string(),
            )),
            other => {
                warn!(code = other, "Unrecognized date format, forwarding as given");
                Ok(DateFormat::Custom(other.to_string()))
            }
        }
    }
}

/// Column mapping reflected back to Touchstone to finish an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure {
    pub file_id: String,
    pub date_format: DateFormat,
    /// `columns[<n>]` -> selected field id, empty when the server made no guess.
    pub columns: BTreeMap<String, String>,
}

impl TableStructure {
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(self.columns.len() + 2);
        form.push(("fid".to_string(), self.file_id.clone()));
        form.push(("dateFormat".to_string(), self.date_format.code().to_string()));
        form.extend(self.columns.iter().map(|(k, v)| (k.clone(), v.clone())));
        form
    }

    pub fn unguessed_columns(&self) -> usize {
        self.columns.values().filter(|v| v.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("EMAIL".parse::<ContentType>().unwrap(), ContentType::Email);
        assert_eq!("sms".parse::<ContentType>().unwrap(), ContentType::Sms);
        let err = "fax".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }

    #[test]
    fn test_date_format_codes_are_case_sensitive() {
        assert_eq!("Y-m-d".parse::<DateFormat>().unwrap(), DateFormat::YearMonthDay);
        assert_eq!("y-m-d".parse::<DateFormat>().unwrap(), DateFormat::ShortYearMonthDay);
        assert_eq!(DateFormat::default().code(), "Y-m-d");
    }

    #[test]
    fn test_unknown_date_format_forwarded() {
        let format = "Y/m/d".parse::<DateFormat>().unwrap();
        assert_eq!(format, DateFormat::Custom("Y/m/d".to_string()));
        assert_eq!(format.code(), "Y/m/d");
        assert!("".parse::<DateFormat>().is_err());
    }

    #[test]
    fn test_table_structure_form_order() {
        let mut columns = BTreeMap::new();
        columns.insert("columns[0]".to_string(), "5".to_string());
        columns.insert("columns[1]".to_string(), String::new());
        let table = TableStructure {
            file_id: "42".to_string(),
            date_format: DateFormat::DayMonthYear,
            columns,
        };

        let form = table.to_form();
        assert_eq!(form[0], ("fid".to_string(), "42".to_string()));
        assert_eq!(form[1], ("dateFormat".to_string(), "d-m-Y".to_string()));
        assert_eq!(form.len(), 4);
        assert_eq!(table.unguessed_columns(), 1);
    }
}
