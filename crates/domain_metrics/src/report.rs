//! Response shapes consumed by the request layer
//!
//! Field names are the Spanish keys the dashboard reads. Amounts serialize as
//! JSON numbers here, unlike the stored documents which keep decimal strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::DateWindow;

use crate::aggregate::{Bucket, CategoryStat, CpkSummary, Totals};
use crate::period::Period;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub ingresos: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gastos: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub utilidad: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cpk: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub utilidad_por_km: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_km: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub km_muertos: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub eficiencia_km: Decimal,
}

impl From<&CpkSummary> for SummaryReport {
    fn from(summary: &CpkSummary) -> Self {
        Self {
            ingresos: summary.income,
            gastos: summary.expense,
            utilidad: summary.net_profit,
            cpk: summary.cpk,
            utilidad_por_km: summary.profit_per_km,
            total_km: summary.total_km,
            km_muertos: summary.dead_km,
            eficiencia_km: summary.km_efficiency_percent,
        }
    }
}

/// Expense split between fuel and everything else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub combustible: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub otros: Decimal,
}

impl From<&Totals> for BreakdownReport {
    fn from(totals: &Totals) -> Self {
        Self {
            combustible: totals.fuel,
            otros: totals.other_expense,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Bucket key
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub ingresos: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gastos: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub utilidad: Decimal,
    pub registros: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_km: Decimal,
}

impl From<Bucket> for HistoryEntry {
    fn from(bucket: Bucket) -> Self {
        Self {
            utilidad: bucket.profit,
            date: bucket.key,
            ingresos: bucket.income,
            gastos: bucket.expense,
            registros: bucket.count,
            total_km: bucket.total_km,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub categoria: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub registros: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub minimo: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maximo: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub promedio: Decimal,
}

impl From<CategoryStat> for CategoryEntry {
    fn from(stat: CategoryStat) -> Self {
        Self {
            categoria: stat.category,
            total: stat.total,
            registros: stat.count,
            minimo: stat.min,
            maximo: stat.max,
            promedio: stat.average,
        }
    }
}

/// Everything the stats call site returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub window: DateWindow,
    pub period: Period,
    pub summary: SummaryReport,
    pub breakdown: BreakdownReport,
    pub categories: Vec<CategoryEntry>,
    /// Ascending by bucket key
    pub history: Vec<HistoryEntry>,
    /// True if either fetch hit the safety cap; totals are then a floor
    pub truncated: bool,
}

/// Bounded most-recent history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub window: DateWindow,
    pub period: Period,
    pub history: Vec<HistoryEntry>,
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_summary_serializes_numbers_with_spanish_keys() {
        let summary = SummaryReport::from(&CpkSummary {
            income: dec!(300),
            expense: dec!(50),
            net_profit: dec!(250),
            cpk: dec!(5.00),
            profit_per_km: dec!(25.00),
            total_km: dec!(10),
            dead_km: dec!(0),
            km_efficiency_percent: dec!(100.00),
        });
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["ingresos"], json!(300.0));
        assert_eq!(value["utilidad"], json!(250.0));
        assert_eq!(value["cpk"], json!(5.0));
        assert_eq!(value["totalKm"], json!(10.0));
        assert!(value.get("kmMuertos").is_some());
        assert!(value.get("eficienciaKm").is_some());
    }

    #[test]
    fn test_history_entry_from_bucket() {
        let entry = HistoryEntry::from(Bucket {
            key: "2024-01-05".into(),
            income: dec!(300),
            expense: dec!(50),
            profit: dec!(250),
            count: 2,
            total_km: dec!(10),
        });
        assert_eq!(entry.date, "2024-01-05");
        assert_eq!(entry.utilidad, dec!(250));
    }
}
