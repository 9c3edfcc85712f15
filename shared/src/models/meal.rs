//! Meal attendance models
//!
//! Attendance rows are written by the poll/attendance subsystem. Billing only
//! ever reads the billable subset (`present = true` and
//! `confirmation_status = confirmed_attended`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confirmation status that makes an attendance row billable
pub const CONFIRMED_ATTENDED: &str = "confirmed_attended";

/// Portion size / price tier of a meal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "portion_size", rename_all = "snake_case")
)]
pub enum PortionSize {
    Half,
    Full,
}

impl PortionSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Half => "half",
            Self::Full => "full",
        }
    }
}

/// Attendance row as stored by the poll subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MealAttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub portion_size: PortionSize,
    pub present: bool,
    pub confirmation_status: String,
}

impl MealAttendanceRecord {
    /// Present and confirmed by an admin
    pub fn is_billable(&self) -> bool {
        self.present && self.confirmation_status == CONFIRMED_ATTENDED
    }

    pub fn to_billable(&self) -> Option<BillableMeal> {
        self.is_billable().then(|| BillableMeal {
            id: self.id,
            user_id: self.user_id,
            date: self.date,
            portion_size: self.portion_size,
        })
    }
}

/// A confirmed, present meal attendance row (the billable subset)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BillableMeal {
    /// Poll response id, referenced by `MealPayment::poll_response_id`
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub portion_size: PortionSize,
}

/// Profile directory entry (owned by the auth/profile subsystem)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(present: bool, status: &str) -> MealAttendanceRecord {
        MealAttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            portion_size: PortionSize::Full,
            present,
            confirmation_status: status.to_string(),
        }
    }

    #[test]
    fn test_only_present_and_confirmed_is_billable() {
        assert!(record(true, CONFIRMED_ATTENDED).is_billable());
        assert!(!record(false, CONFIRMED_ATTENDED).is_billable());
        assert!(!record(true, "pending").is_billable());
        assert!(record(true, "pending").to_billable().is_none());
    }

    #[test]
    fn test_portion_size_serde() {
        assert_eq!(serde_json::to_string(&PortionSize::Half).unwrap(), "\"half\"");
        let full: PortionSize = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(full, PortionSize::Full);
        assert_eq!(full.as_str(), "full");
    }
}
