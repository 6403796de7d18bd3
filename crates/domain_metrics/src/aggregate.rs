//! Pure reducers over fetched records
//!
//! Everything here works on one in-memory snapshot and performs no I/O, so
//! the stats call site and the diagnostic binary share the exact same
//! arithmetic. Reducers sum whatever they are handed; status filtering is
//! the engine's decision. All sums are checked and overflow surfaces as
//! [`MetricsError::Overflow`].

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::HashMap;

use core_kernel::{ratio, round2, Timezone};
use domain_ledger::{Transaction, TransactionKind};
use domain_shift::Shift;

use crate::error::MetricsError;
use crate::period::Period;

/// Default reserved category for fuel expenses
pub const FUEL_CATEGORY: &str = "fuel";

/// Income and expense sums of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    /// Expenses whose category equals the fuel label, case-insensitively
    pub fuel: Decimal,
    /// `expense - fuel`
    pub other_expense: Decimal,
    pub count: usize,
}

/// Per-category statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStat {
    /// Case-folded category label
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    pub min: Decimal,
    pub max: Decimal,
    pub average: Decimal,
}

/// One history bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub income: Decimal,
    pub expense: Decimal,
    /// `income - expense`
    pub profit: Decimal,
    pub count: usize,
    /// Distance of closed shifts started in this bucket
    pub total_km: Decimal,
}

impl Bucket {
    fn empty(key: String) -> Self {
        Self {
            key,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            profit: Decimal::ZERO,
            count: 0,
            total_km: Decimal::ZERO,
        }
    }
}

/// Distance driven across closed shifts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftDistance {
    pub total_km: Decimal,
    pub dead_km: Decimal,
    pub shifts: usize,
}

/// The headline metric and its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpkSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net_profit: Decimal,
    /// `round2(expense / max(totalKm, 1))`
    pub cpk: Decimal,
    pub profit_per_km: Decimal,
    pub total_km: Decimal,
    pub dead_km: Decimal,
    /// `(totalKm - deadKm) / totalKm * 100`, zero without distance
    pub km_efficiency_percent: Decimal,
}

fn folded(category: &str) -> String {
    category.trim().to_lowercase()
}

fn add(acc: &mut Decimal, value: Decimal, figure: &'static str) -> Result<(), MetricsError> {
    *acc = acc.checked_add(value).ok_or(MetricsError::Overflow(figure))?;
    Ok(())
}

fn sub(lhs: Decimal, rhs: Decimal, figure: &'static str) -> Result<Decimal, MetricsError> {
    lhs.checked_sub(rhs).ok_or(MetricsError::Overflow(figure))
}

fn div(lhs: Decimal, rhs: Decimal, figure: &'static str) -> Result<Decimal, MetricsError> {
    lhs.checked_div(rhs).ok_or(MetricsError::Overflow(figure))
}

/// Sums a snapshot in one pass
pub fn totals(transactions: &[Transaction], fuel_label: &str) -> Result<Totals, MetricsError> {
    let fuel_label = folded(fuel_label);
    let mut totals = Totals::default();

    for tx in transactions {
        totals.count += 1;
        match tx.kind {
            TransactionKind::Income => add(&mut totals.income, tx.amount, "income")?,
            TransactionKind::Expense => {
                add(&mut totals.expense, tx.amount, "expense")?;
                if folded(&tx.category) == fuel_label {
                    add(&mut totals.fuel, tx.amount, "fuel")?;
                }
            }
        }
    }
    totals.other_expense = sub(totals.expense, totals.fuel, "other expense")?;
    Ok(totals)
}

/// Groups by case-folded category, largest total first
pub fn category_breakdown(transactions: &[Transaction]) -> Result<Vec<CategoryStat>, MetricsError> {
    let mut groups: HashMap<String, CategoryStat> = HashMap::new();

    for tx in transactions {
        let key = folded(&tx.category);
        let stat = groups.entry(key.clone()).or_insert_with(|| CategoryStat {
            category: key,
            total: Decimal::ZERO,
            count: 0,
            min: tx.amount,
            max: tx.amount,
            average: Decimal::ZERO,
        });
        add(&mut stat.total, tx.amount, "category total")?;
        stat.count += 1;
        stat.min = stat.min.min(tx.amount);
        stat.max = stat.max.max(tx.amount);
    }

    let mut stats = groups
        .into_values()
        .map(|mut stat| {
            stat.average = round2(div(stat.total, Decimal::from(stat.count), "category average")?);
            Ok(stat)
        })
        .collect::<Result<Vec<CategoryStat>, MetricsError>>()?;
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(stats)
}

/// Buckets transactions by date and merges shift distance into the same map
///
/// Transactions are keyed by their own date, shifts by their start. A bucket
/// may hold only one of the two.
pub fn history(
    transactions: &[Transaction],
    shifts: &[Shift],
    period: Period,
    tz: &Timezone,
) -> Result<BTreeMap<String, Bucket>, MetricsError> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for tx in transactions {
        let key = period.bucket_key(tz.date_of(tx.date));
        let bucket = buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::empty(key));
        bucket.count += 1;
        match tx.kind {
            TransactionKind::Income => add(&mut bucket.income, tx.amount, "bucket income")?,
            TransactionKind::Expense => add(&mut bucket.expense, tx.amount, "bucket expense")?,
        }
    }

    for shift in shifts {
        let key = period.bucket_key(tz.date_of(shift.started_at));
        let bucket = buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::empty(key));
        add(&mut bucket.total_km, shift.total_km_or_zero(), "bucket distance")?;
    }

    for bucket in buckets.values_mut() {
        bucket.profit = sub(bucket.income, bucket.expense, "bucket profit")?;
    }
    Ok(buckets)
}

/// The `limit` most recent buckets, ascending
pub fn recent_buckets(buckets: BTreeMap<String, Bucket>, limit: usize) -> Vec<Bucket> {
    let mut recent: Vec<Bucket> = buckets.into_values().rev().take(limit).collect();
    recent.reverse();
    recent
}

/// Sums distance over closed shifts; open shifts contribute nothing
pub fn shift_distance(shifts: &[Shift]) -> Result<ShiftDistance, MetricsError> {
    let mut distance = ShiftDistance::default();
    for shift in shifts.iter().filter(|shift| !shift.is_open()) {
        add(&mut distance.total_km, shift.total_km_or_zero(), "total distance")?;
        add(&mut distance.dead_km, shift.dead_km_or_zero(), "dead distance")?;
        distance.shifts += 1;
    }
    Ok(distance)
}

/// Derives the cost-per-kilometer summary
///
/// Without distance the denominator is 1, so `cpk` equals total expenses.
pub fn summarize(totals: &Totals, distance: &ShiftDistance) -> Result<CpkSummary, MetricsError> {
    let has_distance = distance.total_km > Decimal::ZERO;
    let denominator = if has_distance { distance.total_km } else { Decimal::ONE };
    let net_profit = sub(totals.income, totals.expense, "net profit")?;

    let km_efficiency_percent = if has_distance {
        let driven = sub(distance.total_km, distance.dead_km, "trip distance")?;
        ratio(driven, distance.total_km)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(round2)
            .ok_or(MetricsError::Overflow("km efficiency"))?
    } else {
        Decimal::ZERO
    };

    Ok(CpkSummary {
        income: totals.income,
        expense: totals.expense,
        net_profit,
        cpk: round2(div(totals.expense, denominator, "cpk")?),
        profit_per_km: round2(div(net_profit, denominator, "profit per km")?),
        total_km: distance.total_km,
        dead_km: distance.dead_km,
        km_efficiency_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use core_kernel::UserId;
    use domain_ledger::{NewTransaction, TransactionStatus};
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn tx(new: NewTransaction) -> Transaction {
        Transaction::from_new(UserId::new(), new, new_now())
    }

    fn new_now() -> DateTime<Utc> {
        at(2024, 2, 1, 0)
    }

    fn closed_shift(start: DateTime<Utc>, km: Decimal, trip: Decimal) -> Shift {
        let mut shift = Shift::open(UserId::new(), dec!(1000), start).unwrap();
        shift.close(dec!(1000) + km, trip, start).unwrap();
        shift
    }

    #[test]
    fn test_totals_split_fuel_case_insensitively() {
        let txs = vec![
            tx(NewTransaction::income(dec!(300), at(2024, 1, 5, 10), "viaje")),
            tx(NewTransaction::expense(dec!(50), at(2024, 1, 5, 11), "FUEL")),
            tx(NewTransaction::expense(dec!(30), at(2024, 1, 5, 12), "peaje")),
        ];
        let totals = totals(&txs, FUEL_CATEGORY).unwrap();

        assert_eq!(totals.income, dec!(300));
        assert_eq!(totals.expense, dec!(80));
        assert_eq!(totals.fuel, dec!(50));
        assert_eq!(totals.other_expense, dec!(30));
    }

    #[test]
    fn test_every_status_is_summed() {
        let txs = vec![
            tx(NewTransaction::income(dec!(100), at(2024, 1, 5, 10), "viaje")),
            tx(NewTransaction::income(dec!(20), at(2024, 1, 5, 10), "viaje").with_status(TransactionStatus::Pending)),
            tx(NewTransaction::expense(dec!(7), at(2024, 1, 5, 10), "fuel").with_status(TransactionStatus::Cancelled)),
        ];
        let totals = totals(&txs, FUEL_CATEGORY).unwrap();
        assert_eq!(totals.income, dec!(120));
        assert_eq!(totals.expense, dec!(7));
        assert_eq!(totals.count, 3);
    }

    #[test]
    fn test_category_breakdown_sorted_by_total() {
        let txs = vec![
            tx(NewTransaction::expense(dec!(20), at(2024, 1, 5, 10), "Fuel")),
            tx(NewTransaction::expense(dec!(40), at(2024, 1, 6, 10), "fuel ")),
            tx(NewTransaction::expense(dec!(15), at(2024, 1, 6, 10), "lavado")),
            tx(NewTransaction::income(dec!(300), at(2024, 1, 6, 10), "viaje")),
        ];
        let stats = category_breakdown(&txs).unwrap();

        let names: Vec<_> = stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["viaje", "fuel", "lavado"]);
        let fuel = &stats[1];
        assert_eq!((fuel.total, fuel.count, fuel.min, fuel.max, fuel.average), (dec!(60), 2, dec!(20), dec!(40), dec!(30)));
    }

    #[test]
    fn test_history_merges_shift_distance() {
        let txs = vec![
            tx(NewTransaction::income(dec!(300), at(2024, 1, 5, 10), "viaje")),
            tx(NewTransaction::expense(dec!(50), at(2024, 1, 5, 23), "fuel")),
        ];
        let shifts = vec![
            closed_shift(at(2024, 1, 5, 8), dec!(10), dec!(0)),
            closed_shift(at(2024, 1, 7, 8), dec!(25), dec!(0)),
        ];

        let buckets = history(&txs, &shifts, Period::Diario, &Timezone::utc()).unwrap();

        let day5 = &buckets["2024-01-05"];
        assert_eq!((day5.income, day5.expense, day5.profit, day5.total_km), (dec!(300), dec!(50), dec!(250), dec!(10)));
        let day7 = &buckets["2024-01-07"];
        assert_eq!((day7.count, day7.income, day7.total_km), (0, Decimal::ZERO, dec!(25)));
    }

    #[test]
    fn test_bucket_timezone_moves_late_records() {
        let txs = vec![tx(NewTransaction::income(dec!(10), at(2024, 1, 6, 3), "viaje"))];
        let bogota: Timezone = "America/Bogota".parse().unwrap();

        assert!(history(&txs, &[], Period::Diario, &Timezone::utc()).unwrap().contains_key("2024-01-06"));
        assert!(history(&txs, &[], Period::Diario, &bogota).unwrap().contains_key("2024-01-05"));
    }

    #[test]
    fn test_recent_buckets_keeps_latest_ascending() {
        let txs: Vec<_> = (1..=5)
            .map(|d| tx(NewTransaction::income(dec!(1), at(2024, 1, d, 10), "viaje")))
            .collect();
        let recent = recent_buckets(history(&txs, &[], Period::Diario, &Timezone::utc()).unwrap(), 3);

        let keys: Vec<_> = recent.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-03", "2024-01-04", "2024-01-05"]);
    }

    #[test]
    fn test_summary_with_distance() {
        let totals = Totals { income: dec!(300), expense: dec!(50), fuel: dec!(50), other_expense: dec!(0), count: 2 };
        let distance = ShiftDistance { total_km: dec!(10), dead_km: dec!(2.5), shifts: 1 };

        let summary = summarize(&totals, &distance).unwrap();
        assert_eq!(summary.cpk, dec!(5.00));
        assert_eq!(summary.net_profit, dec!(250));
        assert_eq!(summary.profit_per_km, dec!(25));
        assert_eq!(summary.km_efficiency_percent, dec!(75));
    }

    #[test]
    fn test_summary_without_distance_divides_by_one() {
        let totals = Totals { expense: dec!(120), other_expense: dec!(120), count: 1, ..Default::default() };
        let summary = summarize(&totals, &ShiftDistance::default()).unwrap();

        assert_eq!(summary.cpk, dec!(120.00));
        assert_eq!(summary.total_km, Decimal::ZERO);
        assert_eq!(summary.km_efficiency_percent, Decimal::ZERO);
    }

    #[test]
    fn test_open_shifts_add_no_distance() {
        let open = Shift::open(UserId::new(), dec!(0), at(2024, 1, 5, 8)).unwrap();
        let closed = closed_shift(at(2024, 1, 5, 8), dec!(42), dec!(40));
        let distance = shift_distance(&[open, closed]).unwrap();

        assert_eq!(distance.total_km, dec!(42));
        assert_eq!(distance.dead_km, dec!(2));
        assert_eq!(distance.shifts, 1);
    }

    #[test]
    fn test_sums_past_the_decimal_range_are_errors() {
        let txs = vec![
            tx(NewTransaction::income(Decimal::MAX, at(2024, 1, 5, 10), "viaje")),
            tx(NewTransaction::income(Decimal::MAX, at(2024, 1, 5, 11), "viaje")),
        ];

        assert!(matches!(totals(&txs, FUEL_CATEGORY), Err(MetricsError::Overflow("income"))));
        assert!(matches!(category_breakdown(&txs), Err(MetricsError::Overflow(_))));
        assert!(matches!(history(&txs, &[], Period::Diario, &Timezone::utc()), Err(MetricsError::Overflow(_))));
    }

    #[test]
    fn test_tiny_distance_quotient_is_an_error() {
        let totals = Totals { expense: Decimal::MAX, other_expense: Decimal::MAX, count: 1, ..Default::default() };
        let distance = ShiftDistance { total_km: dec!(0.001), dead_km: Decimal::ZERO, shifts: 1 };

        assert!(matches!(summarize(&totals, &distance), Err(MetricsError::Overflow("cpk"))));
    }
}
