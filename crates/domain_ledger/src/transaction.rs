//! Transaction types
//!
//! A transaction is a single income or expense event. Apart from the
//! owner-supplied fields it carries derived figures (platform tag, trip
//! efficiency, profitability ratio) that are recomputed on every write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ratio, round2, TransactionId, UserId};

/// Income or expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// Ride-hailing platform a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Uber,
    Didi,
    Indrive,
    #[default]
    Private,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Uber => "uber",
            Platform::Didi => "didi",
            Platform::Indrive => "indrive",
            Platform::Private => "private",
        }
    }

    /// Infers the platform from free text; anything unrecognised is private
    pub fn infer(category: &str, description: Option<&str>) -> Self {
        let text = format!("{} {}", category, description.unwrap_or_default()).to_lowercase();
        [Platform::Uber, Platform::Didi, Platform::Indrive]
            .into_iter()
            .find(|p| text.contains(p.as_str()))
            .unwrap_or_default()
    }
}

/// Settlement status; only completed records count toward totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
    Pending,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// Extra trip costs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toll: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking: Option<Decimal>,
}

impl TripExtras {
    /// Toll plus parking, `None` past the decimal range
    pub fn total(&self) -> Option<Decimal> {
        self.toll.unwrap_or_default().checked_add(self.parking.unwrap_or_default())
    }
}

/// Earnings efficiency of an income trip, two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_per_km: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_per_hour: Option<Decimal>,
}

/// A single financial event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<TripExtras>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profitability_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_metrics: Option<TripMetrics>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when recording a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit platform; inferred from the text when absent
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    #[serde(default)]
    pub duration_minutes: Option<Decimal>,
    #[serde(default)]
    pub extras: Option<TripExtras>,
}

impl NewTransaction {
    pub fn income(amount: Decimal, date: DateTime<Utc>, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Income, amount, date, category)
    }

    pub fn expense(amount: Decimal, date: DateTime<Utc>, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Expense, amount, date, category)
    }

    fn new(kind: TransactionKind, amount: Decimal, date: DateTime<Utc>, category: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            date,
            category: category.into(),
            description: None,
            platform: None,
            status: None,
            distance_km: None,
            duration_minutes: None,
            extras: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_trip(mut self, distance_km: Decimal, duration_minutes: Decimal) -> Self {
        self.distance_km = Some(distance_km);
        self.duration_minutes = Some(duration_minutes);
        self
    }

    pub fn with_extras(mut self, extras: TripExtras) -> Self {
        self.extras = Some(extras);
        self
    }
}

/// The editable subset of a transaction; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Transaction {
    /// Builds an unvalidated record from the submitted fields
    pub fn from_new(user_id: UserId, new: NewTransaction, now: DateTime<Utc>) -> Self {
        let category = new.category.trim().to_string();
        let description = new.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        let platform = new
            .platform
            .unwrap_or_else(|| Platform::infer(&category, description.as_deref()));

        let mut transaction = Self {
            id: TransactionId::new_v7(),
            user_id,
            kind: new.kind,
            amount: new.amount,
            date: new.date,
            category,
            description,
            platform,
            status: new.status.unwrap_or_default(),
            distance_km: new.distance_km,
            duration_minutes: new.duration_minutes,
            extras: new.extras,
            profitability_ratio: None,
            trip_metrics: None,
            created_at: now,
            updated_at: now,
        };
        transaction.refresh_derived();
        transaction
    }

    /// Applies an update; `kind` never changes
    pub fn apply(&mut self, update: TransactionUpdate, now: DateTime<Utc>) {
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(description) = update.description {
            let description = description.trim().to_string();
            self.description = (!description.is_empty()).then_some(description);
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
        self.refresh_derived();
    }

    /// Recomputes the profitability ratio and trip metrics
    pub fn refresh_derived(&mut self) {
        self.profitability_ratio = self
            .extras
            .and_then(|extras| extras.total())
            .and_then(|total| ratio(self.amount, total))
            .map(round2);
        self.trip_metrics = self.compute_trip_metrics();
    }

    fn compute_trip_metrics(&self) -> Option<TripMetrics> {
        if self.kind != TransactionKind::Income {
            return None;
        }
        let per_km = self
            .distance_km
            .and_then(|km| ratio(self.amount, km))
            .map(round2);
        let per_hour = self
            .duration_minutes
            .and_then(|minutes| ratio(minutes, Decimal::from(60)))
            .and_then(|hours| ratio(self.amount, hours))
            .map(round2);

        (per_km.is_some() || per_hour.is_some()).then_some(TripMetrics {
            earnings_per_km: per_km,
            earnings_per_hour: per_hour,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_platform_inferred_from_text() {
        assert_eq!(Platform::infer("Viajes Uber", None), Platform::Uber);
        assert_eq!(Platform::infer("viaje", Some("Servicio DiDi aeropuerto")), Platform::Didi);
        assert_eq!(Platform::infer("inDrive", None), Platform::Indrive);
        assert_eq!(Platform::infer("gasolina", Some("estación")), Platform::Private);
    }

    #[test]
    fn test_explicit_platform_wins() {
        let new = NewTransaction::income(dec!(100), day(), "uber").with_platform(Platform::Didi);
        let tx = Transaction::from_new(UserId::new(), new, day());
        assert_eq!(tx.platform, Platform::Didi);
    }

    #[test]
    fn test_trip_metrics_for_income() {
        let new = NewTransaction::income(dec!(150), day(), "viaje").with_trip(dec!(12), dec!(45));
        let tx = Transaction::from_new(UserId::new(), new, day());

        let metrics = tx.trip_metrics.unwrap();
        assert_eq!(metrics.earnings_per_km, Some(dec!(12.50)));
        assert_eq!(metrics.earnings_per_hour, Some(dec!(200.00)));
    }

    #[test]
    fn test_no_trip_metrics_for_expense_or_zero_distance() {
        let expense = NewTransaction::expense(dec!(50), day(), "fuel").with_trip(dec!(10), dec!(10));
        assert!(Transaction::from_new(UserId::new(), expense, day()).trip_metrics.is_none());

        let idle = NewTransaction::income(dec!(50), day(), "viaje").with_trip(dec!(0), dec!(0));
        assert!(Transaction::from_new(UserId::new(), idle, day()).trip_metrics.is_none());
    }

    #[test]
    fn test_profitability_ratio_needs_positive_extras() {
        let with_costs = NewTransaction::income(dec!(100), day(), "viaje").with_extras(TripExtras {
            toll: Some(dec!(20)),
            parking: Some(dec!(10)),
        });
        let tx = Transaction::from_new(UserId::new(), with_costs, day());
        assert_eq!(tx.profitability_ratio, Some(dec!(3.33)));

        let zero = NewTransaction::income(dec!(100), day(), "viaje").with_extras(TripExtras::default());
        assert!(Transaction::from_new(UserId::new(), zero, day()).profitability_ratio.is_none());
    }

    #[test]
    fn test_update_recomputes_and_keeps_kind() {
        let new = NewTransaction::income(dec!(100), day(), "viaje").with_trip(dec!(10), dec!(60));
        let mut tx = Transaction::from_new(UserId::new(), new, day());
        let later = day() + chrono::Duration::hours(1);

        tx.apply(
            TransactionUpdate {
                amount: Some(dec!(200)),
                description: Some("  ".into()),
                ..Default::default()
            },
            later,
        );

        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.trip_metrics.unwrap().earnings_per_km, Some(dec!(20.00)));
        assert_eq!(tx.description, None);
        assert_eq!(tx.updated_at, later);
        assert_eq!(tx.created_at, day());
    }

    #[test]
    fn test_document_shape_is_camel_case() {
        let new = NewTransaction::income(dec!(10), day(), "viaje").with_trip(dec!(2), dec!(5));
        let json = serde_json::to_value(Transaction::from_new(UserId::new(), new, day())).unwrap();

        assert_eq!(json["kind"], "income");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["platform"], "private");
        assert!(json.get("distanceKm").is_some());
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_missing_status_and_platform_default() {
        let json = serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "userId": uuid::Uuid::new_v4(),
            "kind": "expense",
            "amount": "12.5",
            "date": "2024-01-05T10:00:00Z",
            "category": "fuel",
            "createdAt": "2024-01-05T10:00:00Z",
            "updatedAt": "2024-01-05T10:00:00Z"
        });
        let tx: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.platform, Platform::Private);
    }
}
