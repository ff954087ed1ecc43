//! User directory Model (read-only)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity directory entry for customers and sellers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Present for sellers
    pub business_name: Option<String>,
    /// Seller rating
    pub rating: Option<Decimal>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Seller display name: business name, falling back to the person's name
    pub fn display_name(&self) -> String {
        match &self.business_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.full_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(business_name: Option<&str>) -> UserProfile {
        UserProfile {
            id: "u-1".into(),
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            email: "ana@example.com".into(),
            business_name: business_name.map(Into::into),
            rating: None,
        }
    }

    #[test]
    fn test_display_name_prefers_business_name() {
        assert_eq!(profile(Some("Ana's Kitchen")).display_name(), "Ana's Kitchen");
        assert_eq!(profile(None).display_name(), "Ana Reyes");
        assert_eq!(profile(Some("  ")).display_name(), "Ana Reyes");
    }
}
