//! Admin reporting
//!
//! Pure aggregation over donation rows. Everything here takes already-loaded
//! data and a reference "now", so the numbers are deterministic and the
//! functions are unit-testable without a database. Money arithmetic goes
//! through [`Decimal`] to keep sums exact; stored rows stay plain `f64`.

use std::collections::HashMap;
use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::Serialize;

use crate::db::models::{Campaign, Donation};
use crate::utils::time;

fn to_decimal(amount: f64) -> Decimal {
    Decimal::from_f64(amount).unwrap_or_default()
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

/// Identity key for "distinct donors": email first, phone as fallback.
/// Anonymous donations (neither field) don't count toward donor totals.
fn donor_key(donation: &Donation) -> Option<String> {
    donation
        .donor_email
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .or(donation
            .donor_phone
            .as_deref()
            .filter(|v| !v.trim().is_empty()))
        .map(|v| v.trim().to_lowercase())
}

fn sum_amounts(donations: &[Donation]) -> Decimal {
    donations.iter().map(|d| to_decimal(d.amount)).sum()
}

fn distinct_donors(donations: &[Donation]) -> usize {
    donations
        .iter()
        .filter_map(donor_key)
        .collect::<HashSet<_>>()
        .len()
}

/// Headline dashboard numbers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_raised: f64,
    pub total_donations: usize,
    pub unique_donors: usize,
    pub this_month_amount: f64,
    pub active_campaigns: usize,
    pub total_campaigns: usize,
}

/// `completed` must contain only COMPLETED donations
pub fn dashboard_stats(
    completed: &[Donation],
    campaigns: &[Campaign],
    now_millis: i64,
) -> DashboardStats {
    let month_start = time::month_start_millis(now_millis);
    let this_month: Decimal = completed
        .iter()
        .filter(|d| d.created_at >= month_start)
        .map(|d| to_decimal(d.amount))
        .sum();

    DashboardStats {
        total_raised: to_f64(sum_amounts(completed)),
        total_donations: completed.len(),
        unique_donors: distinct_donors(completed),
        this_month_amount: to_f64(this_month),
        active_campaigns: campaigns.iter().filter(|c| c.is_active).count(),
        total_campaigns: campaigns.len(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_amount: f64,
    pub total_donations: usize,
    pub unique_donors: usize,
    pub average_donation: f64,
    /// Percentage change against the preceding window of equal length
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    pub campaign_id: String,
    pub title: String,
    pub amount: f64,
    pub donations: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: String,
    pub amount: f64,
    pub donations: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodShare {
    pub method: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorInsights {
    pub total_donors: usize,
    pub repeat_donors: usize,
    pub repeat_rate: f64,
    pub average_per_donor: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: String,
    pub overview: AnalyticsOverview,
    pub top_campaigns: Vec<CampaignPerformance>,
    pub monthly_trend: Vec<MonthlyPoint>,
    pub payment_methods: Vec<MethodShare>,
    pub donor_insights: DonorInsights,
}

/// Build the full analytics report.
///
/// `window` holds COMPLETED donations from the requested range,
/// `previous_window` the preceding window of equal length (for growth), and
/// `all_completed` every COMPLETED donation (monthly trend and donor history
/// look further back than the range).
pub fn analytics_report(
    range: &str,
    window: &[Donation],
    previous_window: &[Donation],
    all_completed: &[Donation],
    campaigns: &[Campaign],
    now_millis: i64,
) -> AnalyticsReport {
    AnalyticsReport {
        range: range.to_string(),
        overview: overview(window, previous_window),
        top_campaigns: top_campaigns(window, campaigns, 5),
        monthly_trend: monthly_trend(all_completed, now_millis, 6),
        payment_methods: payment_method_shares(window),
        donor_insights: donor_insights(all_completed),
    }
}

fn overview(window: &[Donation], previous_window: &[Donation]) -> AnalyticsOverview {
    let total = sum_amounts(window);
    let previous = sum_amounts(previous_window);

    let average = if window.is_empty() {
        Decimal::ZERO
    } else {
        total / Decimal::from(window.len())
    };
    let growth = if previous.is_zero() {
        Decimal::ZERO
    } else {
        (total - previous) / previous * Decimal::from(100)
    };

    AnalyticsOverview {
        total_amount: to_f64(total),
        total_donations: window.len(),
        unique_donors: distinct_donors(window),
        average_donation: to_f64(average),
        growth_rate: to_f64(growth.round_dp(2)),
    }
}

fn top_campaigns(
    window: &[Donation],
    campaigns: &[Campaign],
    limit: usize,
) -> Vec<CampaignPerformance> {
    let titles: HashMap<String, &str> = campaigns
        .iter()
        .filter_map(|c| {
            c.id.as_ref()
                .map(|id| (id.to_string(), c.title.as_str()))
        })
        .collect();

    let mut grouped: HashMap<String, (Decimal, usize)> = HashMap::new();
    for donation in window {
        let entry = grouped
            .entry(donation.campaign.to_string())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += to_decimal(donation.amount);
        entry.1 += 1;
    }

    let mut performance: Vec<CampaignPerformance> = grouped
        .into_iter()
        .map(|(campaign_id, (amount, donations))| CampaignPerformance {
            title: titles
                .get(&campaign_id)
                .map(|t| t.to_string())
                .unwrap_or_else(|| "Unknown campaign".to_string()),
            campaign_id,
            amount: to_f64(amount),
            donations,
        })
        .collect();

    performance.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    performance.truncate(limit);
    performance
}

/// Per-month totals for the trailing `months` calendar months, oldest first
fn monthly_trend(all_completed: &[Donation], now_millis: i64, months: u32) -> Vec<MonthlyPoint> {
    let mut points = Vec::with_capacity(months as usize);
    for offset in (0..months).rev() {
        let start = time::month_start_offset_millis(now_millis, offset);
        let end = if offset == 0 {
            now_millis + 1
        } else {
            time::month_start_offset_millis(now_millis, offset - 1)
        };

        let in_month: Vec<&Donation> = all_completed
            .iter()
            .filter(|d| d.created_at >= start && d.created_at < end)
            .collect();
        let amount: Decimal = in_month.iter().map(|d| to_decimal(d.amount)).sum();

        points.push(MonthlyPoint {
            month: time::month_label(start),
            amount: to_f64(amount),
            donations: in_month.len(),
        });
    }
    points
}

fn payment_method_shares(window: &[Donation]) -> Vec<MethodShare> {
    let total = sum_amounts(window);

    let mut grouped: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for donation in window {
        let entry = grouped
            .entry(donation.payment_method.as_str())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += to_decimal(donation.amount);
        entry.1 += 1;
    }

    let mut shares: Vec<MethodShare> = grouped
        .into_iter()
        .map(|(method, (amount, count))| {
            let percentage = if total.is_zero() {
                Decimal::ZERO
            } else {
                amount / total * Decimal::from(100)
            };
            MethodShare {
                method: method.to_string(),
                amount: to_f64(amount),
                count,
                percentage: to_f64(percentage.round_dp(2)),
            }
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    shares
}

fn donor_insights(all_completed: &[Donation]) -> DonorInsights {
    let mut per_donor: HashMap<String, (Decimal, usize)> = HashMap::new();
    for donation in all_completed {
        if let Some(key) = donor_key(donation) {
            let entry = per_donor.entry(key).or_insert((Decimal::ZERO, 0));
            entry.0 += to_decimal(donation.amount);
            entry.1 += 1;
        }
    }

    let total_donors = per_donor.len();
    let repeat_donors = per_donor.values().filter(|(_, count)| *count > 1).count();
    let total_amount: Decimal = per_donor.values().map(|(amount, _)| *amount).sum();

    let repeat_rate = if total_donors == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(repeat_donors) / Decimal::from(total_donors) * Decimal::from(100)
    };
    let average = if total_donors == 0 {
        Decimal::ZERO
    } else {
        total_amount / Decimal::from(total_donors)
    };

    DonorInsights {
        total_donors,
        repeat_donors,
        repeat_rate: to_f64(repeat_rate.round_dp(2)),
        average_per_donor: to_f64(average.round_dp(2)),
    }
}
