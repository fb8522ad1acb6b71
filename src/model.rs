//! Records consumed by the commission engine.
//!
//! Rows come from an external relational store and are mirrored here with
//! camelCase serde mappings. Monetary columns on sales and attendants stay
//! decimal strings on the wire (the store keeps them as `NUMERIC` text) and
//! are parsed into [`Money`](crate::money::Money) by the calculator.

use crate::error::{Error, Result};
use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A registered sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub attendant_id: String,
    /// Sale amount as a decimal string.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        id: impl Into<String>,
        attendant_id: impl Into<String>,
        value: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Sale {
            id: id.into(),
            attendant_id: attendant_id.into(),
            value: value.into(),
            client_name: None,
            client_email: None,
            client_phone: None,
            created_at,
        }
    }

    pub fn amount(&self) -> Result<Money> {
        Money::parse("value", &self.value)
    }
}

/// A sales attendant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    /// Cumulative earnings as a decimal string, maintained by sale processing.
    #[serde(deserialize_with = "string_or_number")]
    pub earnings: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, earnings: impl Into<String>) -> Self {
        let now = Utc::now();
        Attendant {
            id: id.into(),
            name: name.into(),
            image_url: String::new(),
            earnings: earnings.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn earnings_amount(&self) -> Result<Money> {
        Money::parse("earnings", &self.earnings)
    }
}

/// How a rule turns a sale value into a commission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// `value * baseValue / 100`
    Percentage,
    /// `baseValue`, regardless of the sale value
    Fixed,
    /// Percentage base plus a bonus percentage once `minTarget` is reached
    Tiered,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Percentage => write!(f, "percentage"),
            RuleType::Fixed => write!(f, "fixed"),
            RuleType::Tiered => write!(f, "tiered"),
        }
    }
}

/// A configured commission policy.
///
/// Percentages (`baseValue` for percentage/tiered rules, `bonusPercentage`)
/// are on a 0–100 scale. For fixed rules `baseValue` is an amount in BRL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRule {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub base_value: Decimal,
    #[serde(default)]
    pub min_target: Option<Decimal>,
    #[serde(default)]
    pub max_target: Option<Decimal>,
    #[serde(default)]
    pub bonus_percentage: Option<Decimal>,
    #[serde(with = "flag")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CommissionRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rule_type: RuleType,
        base_value: Decimal,
    ) -> Self {
        CommissionRule {
            id: id.into(),
            name: name.into(),
            rule_type,
            base_value,
            min_target: None,
            max_target: None,
            bonus_percentage: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_targets(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_target = min;
        self.max_target = max;
        self
    }

    pub fn with_bonus(mut self, bonus_percentage: Decimal) -> Self {
        self.bonus_percentage = Some(bonus_percentage);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether this rule may price a sale of the given value.
    ///
    /// Inactive rules never apply. Each target bound is checked only when set,
    /// and both bounds are inclusive.
    pub fn is_applicable(&self, sale_value: Money) -> bool {
        if !self.is_active {
            return false;
        }
        let value = sale_value.amount();
        let above_min = self.min_target.map_or(true, |min| value >= min);
        let below_max = self.max_target.map_or(true, |max| value <= max);
        above_min && below_max
    }
}

/// Payload accepted when an attendant registers a sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    #[serde(deserialize_with = "string_or_number")]
    pub attendant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
}

/// Checks applied to inbound payloads before they reach a handler.
pub trait Validate {
    /// # Errors
    ///
    /// Returns `Error::ValidationError` describing the first problem found.
    fn validate(&self) -> Result<()>;
}

const MAX_CLIENT_NAME_LEN: usize = 120;

impl Validate for SaleInput {
    fn validate(&self) -> Result<()> {
        if self.attendant_id.trim().is_empty() {
            return Err(Error::ValidationError("attendantId is required".into()));
        }

        let amount = Money::parse("value", &self.value)
            .map_err(|_| Error::ValidationError(format!("value must be numeric: {:?}", self.value)))?;
        if amount.amount() <= Decimal::ZERO {
            return Err(Error::ValidationError("value must be greater than zero".into()));
        }

        if let Some(name) = &self.client_name {
            if name.chars().count() > MAX_CLIENT_NAME_LEN {
                return Err(Error::ValidationError(format!(
                    "clientName must have at most {} characters",
                    MAX_CLIENT_NAME_LEN
                )));
            }
        }

        if let Some(email) = self.client_email.as_deref().filter(|e| !e.is_empty()) {
            let well_formed = email
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if !well_formed {
                return Err(Error::ValidationError(format!(
                    "clientEmail is not a valid address: {}",
                    email
                )));
            }
        }

        Ok(())
    }
}

impl Validate for CommissionRule {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ValidationError("rule name is required".into()));
        }
        if self.base_value < Decimal::ZERO {
            return Err(Error::ValidationError("baseValue must not be negative".into()));
        }
        let hundred = Decimal::ONE_HUNDRED;
        if self.rule_type != RuleType::Fixed && self.base_value > hundred {
            return Err(Error::ValidationError(
                "baseValue is a percentage and must be between 0 and 100".into(),
            ));
        }
        if let Some(bonus) = self.bonus_percentage {
            if bonus < Decimal::ZERO || bonus > hundred {
                return Err(Error::ValidationError(
                    "bonusPercentage must be between 0 and 100".into(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_target, self.max_target) {
            if min > max {
                return Err(Error::ValidationError(
                    "minTarget must not exceed maxTarget".into(),
                ));
            }
        }
        if self.rule_type == RuleType::Tiered
            && (self.min_target.is_none() || self.bonus_percentage.is_none())
        {
            return Err(Error::ValidationError(
                "tiered rules need minTarget and bonusPercentage".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// Accept `"12"` as well as `12` for id and decimal-string columns.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// `isActive` is an integer column (0/1); booleans are accepted too.
mod flag {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => b,
            Raw::Int(i) => i == 1,
        })
    }
}
