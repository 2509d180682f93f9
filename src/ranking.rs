use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Child, Medal, RankingEntry, ScoredResult};

/// Inclusive age bound applied to children before any total is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    AtMost(u8),
    AtLeast(u8),
}

impl AgeFilter {
    /// Children without a recorded age never match.
    pub fn matches(&self, age: Option<u8>) -> bool {
        match (self, age) {
            (_, None) => false,
            (AgeFilter::AtMost(limit), Some(age)) => age <= *limit,
            (AgeFilter::AtLeast(limit), Some(age)) => age >= *limit,
        }
    }
}

/// Sum of quantity x points per child. Children with no results total zero.
/// Totals beyond the decimal range saturate at `Decimal::MAX` / `Decimal::MIN`.
pub fn tally<'a>(children: &'a [Child], results: &[ScoredResult]) -> Vec<(&'a Child, Decimal)> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for result in results {
        let points = Decimal::from(result.quantity).saturating_mul(result.points);
        let total = totals.entry(result.child_id).or_insert(Decimal::ZERO);
        *total = total.saturating_add(points);
    }
    children
        .iter()
        .map(|child| {
            let total = totals.get(&child.id).copied().unwrap_or(Decimal::ZERO);
            (child, total)
        })
        .collect()
}

/// Competition ranking: highest total first, ties broken by name, tied totals
/// share a position and the next total takes its row number. The three highest
/// distinct positive totals earn gold, silver and bronze.
pub fn rank(
    children: &[Child],
    results: &[ScoredResult],
    filter: Option<AgeFilter>,
) -> Vec<RankingEntry> {
    let eligible: Vec<Child> = children
        .iter()
        .filter(|child| filter.map_or(true, |f| f.matches(child.age)))
        .cloned()
        .collect();

    let mut totals = tally(&eligible, results);
    totals.sort_by(|(a, a_total), (b, b_total)| {
        b_total.cmp(a_total).then_with(|| a.name.cmp(&b.name))
    });

    let podium = podium(totals.iter().map(|(_, total)| *total));

    let mut entries = Vec::with_capacity(totals.len());
    let mut position = 0;
    let mut previous: Option<Decimal> = None;
    for (index, (child, total)) in totals.into_iter().enumerate() {
        if previous != Some(total) {
            position = index + 1;
            previous = Some(total);
        }
        entries.push(RankingEntry {
            position,
            child_id: child.id,
            name: child.name.clone(),
            group_label: child.group_label.clone(),
            total,
            medal: medal_for(&podium, total),
        });
    }
    entries
}

fn podium(totals: impl Iterator<Item = Decimal>) -> Vec<Decimal> {
    let mut distinct: Vec<Decimal> = totals.filter(|total| *total > Decimal::ZERO).collect();
    distinct.sort_by(|a, b| b.cmp(a));
    distinct.dedup();
    distinct.truncate(3);
    distinct
}

fn medal_for(podium: &[Decimal], total: Decimal) -> Option<Medal> {
    match podium.iter().position(|top| *top == total)? {
        0 => Some(Medal::Gold),
        1 => Some(Medal::Silver),
        2 => Some(Medal::Bronze),
        _ => None,
    }
}
