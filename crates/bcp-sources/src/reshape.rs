//! Pure reshapers from raw JSON documents to domain records.
//!
//! Each function walks a `serde_json::Value` defensively: missing or
//! malformed fields default to zero or empty rather than failing, so a
//! drifting upstream schema degrades output instead of breaking fetches.
//! Randomized fields take the RNG as a parameter, which keeps every
//! reshaper deterministic under test.

use bcp_common::prediction::confidence_percent;
use bcp_common::{Category, HistoryEntry, Prediction, Timeframe};
use rand::Rng;
use serde_json::Value;

use crate::records::{
    ChartPoint, NotificationKind, NotificationRecord, PerformerRecord, PerformerScope,
};

/// Enquiry type names, cycled over posts in order.
pub const ENQUIRY_TYPES: [&str; 5] = ["Product Info", "Pricing", "Support", "Demos", "Partnerships"];

/// Chart reshaper dispatch for a category.
pub fn chart(
    category: Category,
    timeframe: Timeframe,
    doc: &Value,
    rng: &mut impl Rng,
) -> Vec<ChartPoint> {
    match category {
        Category::Ticket => ticket_chart(doc, timeframe.multiplier(), rng),
        Category::Sales => sales_chart(doc, timeframe),
        Category::Enquiry => enquiry_chart(doc, timeframe.multiplier()),
    }
}

/// Comments document -> ticket counts aggregated by complaint category.
///
/// The category is decided by the first matching keyword in the comment
/// body; per-comment values are random draws scaled by the timeframe.
pub fn ticket_chart(doc: &Value, multiplier: f64, rng: &mut impl Rng) -> Vec<ChartPoint> {
    let comments = items(doc, "comments");
    let mut totals: Vec<ChartPoint> = Vec::new();
    for comment in comments {
        let body = str_of(comment, "body");
        let name = if body.contains("help") {
            "Technical"
        } else if body.contains("install") {
            "Installation"
        } else if body.contains("tax") {
            "GST Issues"
        } else if body.contains("system") {
            "OS Issues"
        } else {
            "General"
        };
        let value = (rng.random_range(0..50) + 10) as f64 * multiplier;
        match totals.iter_mut().find(|point| point.name == name) {
            Some(point) => point.value += value,
            None => totals.push(ChartPoint {
                name: name.to_string(),
                value,
            }),
        }
    }
    totals
}

/// Products document -> one sales point per display period.
///
/// Periods depend on the timeframe; extra products beyond the period count
/// are dropped, and missing products leave trailing periods empty.
pub fn sales_chart(doc: &Value, timeframe: Timeframe) -> Vec<ChartPoint> {
    let products = items(doc, "products");
    let multiplier = timeframe.multiplier();
    sales_periods(timeframe)
        .iter()
        .zip(products.iter())
        .map(|(period, product)| ChartPoint {
            name: (*period).to_string(),
            value: f64_of(product, "price") * f64_of(product, "stock") * multiplier,
        })
        .collect()
}

/// Display period names for a timeframe.
pub fn sales_periods(timeframe: Timeframe) -> &'static [&'static str] {
    match timeframe {
        Timeframe::Weekly => &["Week 1", "Week 2", "Week 3", "Week 4"],
        Timeframe::Monthly => &["Jan", "Feb", "Mar", "Apr", "May", "Jun"],
        Timeframe::Quarterly => &["Q1", "Q2", "Q3", "Q4"],
    }
}

/// Posts document -> enquiry volume points, type names cycled in order.
pub fn enquiry_chart(doc: &Value, multiplier: f64) -> Vec<ChartPoint> {
    items(doc, "posts")
        .iter()
        .enumerate()
        .map(|(index, post)| ChartPoint {
            name: ENQUIRY_TYPES[index % ENQUIRY_TYPES.len()].to_string(),
            value: reactions_of(post) * 10.0 * multiplier,
        })
        .collect()
}

/// Todos document -> synthetic prediction history.
///
/// Completed todos trend high (base 0.7), open ones low (base 0.3), with
/// uniform jitter clamped to [0.1, 0.9]. The series is emitted newest label
/// first, mirroring the upstream ordering quirk.
pub fn history(doc: &Value, rng: &mut impl Rng) -> Vec<HistoryEntry> {
    let todos = items(doc, "todos");
    let mut series: Vec<HistoryEntry> = todos
        .iter()
        .enumerate()
        .map(|(index, todo)| {
            let base = if bool_of(todo, "completed") { 0.7 } else { 0.3 };
            let jitter = (rng.random::<f64>() - 0.5) * 0.2;
            let value = (base + jitter).clamp(0.1, 0.9);
            HistoryEntry {
                label: format!("{} min ago", 10_i64 - index as i64),
                value,
                confidence: confidence_percent(value),
            }
        })
        .collect();
    series.reverse();
    series
}

/// Users document -> notification feed.
///
/// The first user becomes a notification about the current prediction;
/// the rest become generic departmental updates.
pub fn notifications(
    doc: &Value,
    category: Category,
    prediction: &Prediction,
    rng: &mut impl Rng,
) -> Vec<NotificationRecord> {
    const GENERIC_KINDS: [NotificationKind; 4] = [
        NotificationKind::Bell,
        NotificationKind::Team,
        NotificationKind::Mail,
        NotificationKind::Revenue,
    ];

    let users = items(doc, "users");
    let mut records = Vec::with_capacity(users.len());

    for (index, user) in users.iter().enumerate() {
        if index == 0 {
            records.push(prediction_notification(category, prediction, user));
            continue;
        }

        let action = match category {
            Category::Ticket => "submitted a new ticket",
            Category::Sales => "closed a deal",
            Category::Enquiry => "sent an enquiry",
        };
        let minutes = rng.random_range(0..60);
        records.push(NotificationRecord {
            kind: GENERIC_KINDS[index % GENERIC_KINDS.len()],
            title: format!("Update from {}", department(user)),
            description: format!("{} has {action}.", full_name(user)),
            time: format!("{minutes} minutes ago"),
        });
    }
    records
}

fn prediction_notification(
    category: Category,
    prediction: &Prediction,
    user: &Value,
) -> NotificationRecord {
    let is_high = prediction.band().is_high();
    let confidence = prediction.confidence;

    let (kind, title, description) = match category {
        Category::Ticket => (
            if is_high {
                NotificationKind::Alert
            } else {
                NotificationKind::Clock
            },
            if is_high {
                "High Priority Ticket Alert"
            } else {
                "Low Priority Ticket"
            },
            format!(
                "Ticket from {} {} with {confidence}% confidence.",
                full_name(user),
                if is_high {
                    "requires immediate attention"
                } else {
                    "can be handled during standard hours"
                }
            ),
        ),
        Category::Sales => (
            if is_high {
                NotificationKind::TrendUp
            } else {
                NotificationKind::Chart
            },
            if is_high {
                "Sales Growth Detected"
            } else {
                "Moderate Sales Growth"
            },
            format!(
                "{} growth expected in {} department with {confidence}% confidence.",
                if is_high { "Strong" } else { "Moderate" },
                department(user)
            ),
        ),
        Category::Enquiry => (
            if is_high {
                NotificationKind::TrendUp
            } else {
                NotificationKind::Dismiss
            },
            if is_high {
                "High Conversion Potential"
            } else {
                "Low Conversion Potential"
            },
            format!(
                "Enquiry from {} has {} conversion potential with {confidence}% confidence.",
                full_name(user),
                if is_high { "high" } else { "low" }
            ),
        ),
    };

    NotificationRecord {
        kind,
        title: title.to_string(),
        description,
        time: "Just now".to_string(),
    }
}

/// Users document -> top three performers for the scope.
pub fn performers(doc: &Value, scope: PerformerScope, rng: &mut impl Rng) -> Vec<PerformerRecord> {
    let users = items(doc, "users");
    let mut rows: Vec<PerformerRecord> = users
        .iter()
        .map(|user| {
            let (score, metric) = match scope {
                PerformerScope::Category(Category::Sales) => {
                    let score = rng.random_range(0..500_000u64) + 100_000;
                    (score, format!("${:.1}k", score as f64 / 1000.0))
                }
                PerformerScope::Category(Category::Enquiry) => {
                    let score = rng.random_range(0..100u64) + 20;
                    (score, format!("{score}%"))
                }
                PerformerScope::Category(Category::Ticket) => {
                    let score = rng.random_range(0..150u64) + 50;
                    (score, score.to_string())
                }
                PerformerScope::Overall => {
                    let score = rng.random_range(0..100u64) + 50;
                    (score, score.to_string())
                }
            };
            PerformerRecord {
                id: u64_of(user, "id"),
                name: full_name(user),
                department: department(user).to_string(),
                score,
                metric,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.truncate(3);
    rows
}

// --- tolerant field access -------------------------------------------------

fn items<'a>(doc: &'a Value, key: &str) -> &'a [Value] {
    doc.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_of<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or("")
}

fn f64_of(item: &Value, key: &str) -> f64 {
    item.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn u64_of(item: &Value, key: &str) -> u64 {
    item.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn bool_of(item: &Value, key: &str) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Reaction count, tolerating both the legacy number shape and the newer
/// `{ "likes": n, "dislikes": m }` object.
fn reactions_of(post: &Value) -> f64 {
    match post.get("reactions") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Object(map)) => map.get("likes").and_then(Value::as_f64).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn full_name(user: &Value) -> String {
    format!("{} {}", str_of(user, "firstName"), str_of(user, "lastName"))
        .trim()
        .to_string()
}

fn department<'a>(user: &'a Value) -> &'a str {
    user.pointer("/company/department")
        .and_then(Value::as_str)
        .unwrap_or("")
}
