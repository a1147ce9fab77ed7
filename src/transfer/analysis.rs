//! Spending category analysis
//!
//! Categories come from case-insensitive keyword matching on the transfer
//! description. Rules are checked in declaration order; the first hit wins.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::types::TransferRecord;

/// Fractional digits kept in category percentages
pub const PERCENTAGE_SCALE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Rent,
    Shopping,
    Bills,
    Salary,
    Dining,
    Transfer,
    Other,
}

const RULES: &[(Category, &[&str])] = &[
    (Category::Rent, &["rent", "housing", "kira"]),
    (Category::Shopping, &["market", "grocery", "shop", "migros"]),
    (Category::Bills, &["bill", "utility", "invoice", "fatura"]),
    (Category::Salary, &["salary", "maaş"]),
    (Category::Dining, &["restaurant", "food", "cafe", "yemek"]),
    (Category::Transfer, &["transfer", "eft", "fast"]),
];

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Rent => "Rent",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Salary => "Salary",
            Category::Dining => "Dining",
            Category::Transfer => "Transfer",
            Category::Other => "Other",
        }
    }

    /// Classify a free-text description; missing or unmatched is `Other`
    pub fn classify(description: Option<&str>) -> Category {
        let Some(text) = description else {
            return Category::Other;
        };
        let text = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map_or(Category::Other, |(category, _)| *category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One row of a category breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: Decimal,
    /// Share of total outgoing volume, 0..=100
    pub percentage: Decimal,
}

/// Group outgoing transfers by category.
///
/// Empty when there is nothing to divide by. Sorted by amount (largest
/// first), then by label.
pub fn breakdown(outgoing: &[TransferRecord]) -> Vec<CategoryShare> {
    let total: Decimal = outgoing.iter().map(|t| t.amount).sum();
    if total.is_zero() {
        return Vec::new();
    }

    let mut sums: HashMap<Category, Decimal> = HashMap::new();
    for t in outgoing {
        *sums
            .entry(Category::classify(t.description.as_deref()))
            .or_default() += t.amount;
    }

    let mut shares: Vec<CategoryShare> = sums
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category,
            amount,
            percentage: (amount * Decimal::ONE_HUNDRED / total)
                .round_dp_with_strategy(PERCENTAGE_SCALE, RoundingStrategy::MidpointAwayFromZero),
        })
        .collect();
    shares.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.label().cmp(b.category.label()))
    });
    shares
}
