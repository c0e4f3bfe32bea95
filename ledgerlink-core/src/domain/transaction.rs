//! Ledger transaction model (Firefly III transaction groups and splits)

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction classification of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    /// Anything else Firefly reports (opening balance, reconciliation, ...)
    #[serde(other)]
    Other,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Other => "other",
        }
    }
}

/// A single split of a ledger entry
///
/// Updates address the parent entry, not the split, so splits handed out by
/// the classifier carry their parent's id in `top_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    #[serde(
        rename = "transaction_journal_id",
        default,
        skip_serializing_if = "Option::is_none",
        with = "string_id::option"
    )]
    pub journal_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub date: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<FixedOffset>>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "string_id::option"
    )]
    pub source_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "string_id::option"
    )]
    pub destination_id: Option<u64>,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "nullable_vec", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Id of the parent entry; set by the classifier, never sent to the ledger
    #[serde(skip)]
    pub top_id: Option<u64>,
}

impl LedgerTransaction {
    /// Build a transaction that does not exist in the ledger yet
    pub fn new(
        kind: TransactionType,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            journal_id: None,
            external_id: None,
            date: midnight(date),
            process_date: None,
            payment_date: None,
            kind,
            description: description.into(),
            source_name: None,
            source_id: None,
            destination_name: None,
            destination_id: None,
            amount,
            tags: Vec::new(),
            notes: None,
            top_id: None,
        }
    }

    /// Add a tag unless it is already present
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Source label for display: name if known, else the id
    fn source_label(&self) -> String {
        account_label(self.source_name.as_deref(), self.source_id)
    }

    fn destination_label(&self) -> String {
        account_label(self.destination_name.as_deref(), self.destination_id)
    }
}

fn account_label(name: Option<&str>, id: Option<u64>) -> String {
    match (name, id) {
        (Some(name), _) if !name.is_empty() => name.to_string(),
        (_, Some(id)) => format!("#{}", id),
        _ => "?".to_string(),
    }
}

/// Single-line rendering used by the candidate picker
impl fmt::Display for LedgerTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} · {} · {:?} ({} → {}) {:.2}",
            self.journal_id.unwrap_or_default(),
            self.date.format("%d %b %Y"),
            self.description,
            self.source_label(),
            self.destination_label(),
            self.amount
        )
    }
}

/// Convert a calendar date to the midnight UTC timestamp Firefly stores
pub fn midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

/// A ledger entry (transaction group): one id, one or more splits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(with = "string_id")]
    pub id: u64,
    pub attributes: EntryAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
}

impl LedgerEntry {
    pub fn splits(&self) -> &[LedgerTransaction] {
        &self.attributes.transactions
    }

    /// Consume the entry, stamping each split with the parent id
    pub fn into_splits(self) -> Vec<LedgerTransaction> {
        let id = self.id;
        self.attributes
            .transactions
            .into_iter()
            .map(|mut t| {
                t.top_id = Some(id);
                t
            })
            .collect()
    }
}

/// Body of a create/update request
#[derive(Debug, Clone, Serialize)]
pub struct TransactionStore<'a> {
    pub transactions: &'a [LedgerTransaction],
}

/// A relation between two transaction journals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLink {
    #[serde(rename = "link_type_id")]
    pub link_type: u64,
    pub inward_id: u64,
    pub outward_id: u64,
}

/// Firefly's built-in "Reimburses" link type
pub const LINK_TYPE_REIMBURSES: u64 = 3;

fn nullable_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids travel as strings on the wire but are numbers everywhere else
pub mod string_id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        parse(value)?.ok_or_else(|| D::Error::custom("expected number or string for id"))
    }

    fn parse<E: Error>(value: JsonValue) -> Result<Option<u64>, E> {
        match value {
            JsonValue::Number(n) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| E::custom(format!("invalid id: {}", n))),
            JsonValue::String(s) if s.is_empty() => Ok(None),
            JsonValue::String(s) => s
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid id: {}", s))),
            JsonValue::Null => Ok(None),
            _ => Err(E::custom("expected number or string for id")),
        }
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value as JsonValue;

        pub fn serialize<S: Serializer>(id: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
            match id {
                Some(id) => serializer.serialize_str(&id.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u64>, D::Error> {
            let value = Option::<JsonValue>::deserialize(deserializer)?;
            match value {
                Some(value) => super::parse(value),
                None => Ok(None),
            }
        }
    }
}
