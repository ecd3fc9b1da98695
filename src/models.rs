use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::constants::APPROVAL_STATUS_PENDING;
use crate::utils::parse_date;

// The backend is not consistent about ids (integers in some deployments,
// strings in others) and sometimes serializes decimals as strings.

fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn opt_id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn number_from_value<E: de::Error>(value: Value) -> Result<Option<f64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| E::custom(format!("invalid number: {}", s))),
        other => Err(E::custom(format!("invalid number: {}", other))),
    }
}

fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    number_from_value(Value::deserialize(deserializer)?)
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value::<D::Error>(Value::deserialize(deserializer)?)?.unwrap_or(0.0))
}

/// A list endpoint answers either with a bare array or with the array
/// wrapped in an object (`{"projects": [...]}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    List(Vec<T>),
    Wrapped(HashMap<String, Vec<T>>),
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::List(items) => items,
            Collection::Wrapped(map) => map.into_values().next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub budget: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetItem {
    // Items nested in approval responses come without ids.
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub unit_price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Server-computed total. Not trusted for display, see [`BudgetItem::line_total`].
    #[serde(default, deserialize_with = "opt_number")]
    pub total: Option<f64>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

impl BudgetItem {
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donation {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub donor_name: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub amount: f64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of a donation create/update request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonationPayload {
    pub donor_name: String,
    pub amount: f64,
    pub payment_method: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DonorStats {
    #[serde(default)]
    pub donation_count: u64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub total_donated: f64,
    #[serde(default)]
    pub first_donation: Option<String>,
    #[serde(default)]
    pub last_donation: Option<String>,
}

impl DonorStats {
    /// Aggregates stats from a donation history when the backend did not
    /// return them pre-computed.
    pub fn from_donations(donations: &[Donation]) -> Self {
        let mut dated: Vec<&str> = donations
            .iter()
            .map(|d| d.date.as_str())
            .filter(|d| parse_date(d).is_some())
            .collect();
        dated.sort_by_key(|d| parse_date(d));

        Self {
            donation_count: donations.len() as u64,
            total_donated: donations.iter().map(|d| d.amount).sum(),
            first_donation: dated.first().map(|d| d.to_string()),
            last_donation: dated.last().map(|d| d.to_string()),
        }
    }

    /// Like [`DonorStats::from_donations`], but the count and total come
    /// from the history's server aggregates when it has them.
    pub fn from_history(history: &DonorHistory) -> Self {
        Self {
            donation_count: history.count(),
            total_donated: history.total(),
            ..Self::from_donations(&history.donations)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donor {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub donor_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub stats: Option<DonorStats>,
}

/// Response of `/donors/{id}/donations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DonorHistory {
    #[serde(default)]
    pub donations: Vec<Donation>,
    #[serde(default, deserialize_with = "opt_number")]
    pub total_donations: Option<f64>,
    #[serde(default)]
    pub donation_count: Option<u64>,
}

impl DonorHistory {
    /// Server aggregate when present, otherwise the sum of the listed
    /// donations.
    pub fn total(&self) -> f64 {
        self.total_donations
            .unwrap_or_else(|| self.donations.iter().map(|d| d.amount).sum())
    }

    pub fn count(&self) -> u64 {
        self.donation_count
            .unwrap_or(self.donations.len() as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetApproval {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub requested_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub approved_amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub approver_notes: Option<String>,
}

impl BudgetApproval {
    pub fn requested(&self) -> f64 {
        self.requested_amount.or(self.approved_amount).unwrap_or(0.0)
    }

    /// A request without a status is treated as pending.
    pub fn is_pending(&self) -> bool {
        is_pending_status(self.status.as_deref())
    }
}

/// Case-insensitive check shared by every approval record.
pub fn is_pending_status(status: Option<&str>) -> bool {
    status.is_none_or(|s| s.eq_ignore_ascii_case(APPROVAL_STATUS_PENDING))
}

/// A request to fund one activity, decided by the Director.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityApproval {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub requested_amount: f64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub response_comments: Option<String>,
    #[serde(default)]
    pub budget_items: Vec<BudgetItem>,
}

impl ActivityApproval {
    pub fn is_pending(&self) -> bool {
        is_pending_status(self.status.as_deref())
    }
}

/// Decision sent for an activity approval.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApprovalDecision {
    pub decision: String,
    pub approved_by: String,
    pub response_comments: String,
}

/// Response of `/activities/{id}/budget-status/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BudgetStatus {
    #[serde(default)]
    pub status: Option<String>,
}

/// Response of `/activities/{id}/approved-budget/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ApprovedBudget {
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approval_date: Option<String>,
    #[serde(default)]
    pub items: Vec<BudgetItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub program_area: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub program_area_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub budget: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramArea {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_number")]
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FolderContents {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl FolderContents {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateFolderPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenamePayload {
    pub name: String,
}

/// Any `{id, name}` record, used to fill select options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRecord {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}
