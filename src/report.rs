//! Numbers the result views show, derived from a [`NutritionData`].
//!
//! Both the terminal report and the desktop results view render from these
//! helpers so the two always agree on percentages and rounding.

use crate::nutrition::{NutritionData, NutritionItem, Totals};

/// Which macronutrient a [`MacroShare`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Macro {
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 3] = [Macro::Protein, Macro::Carbs, Macro::Fat];

    pub fn label(self) -> &'static str {
        match self {
            Macro::Protein => "Protein",
            Macro::Carbs => "Carbs",
            Macro::Fat => "Fat",
        }
    }

    /// Chart colour as RGB, shared by the terminal and desktop charts.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Macro::Protein => (0x3b, 0x82, 0xf6),
            Macro::Carbs => (0xf9, 0x73, 0x16),
            Macro::Fat => (0xa8, 0x55, 0xf7),
        }
    }

    fn grams(self, data: &NutritionData) -> f64 {
        match self {
            Macro::Protein => data.protein,
            Macro::Carbs => data.carbs,
            Macro::Fat => data.fat,
        }
    }
}

/// One macro card: grams and its share of all macros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroShare {
    pub kind: Macro,
    pub grams: f64,
    /// Percentage of [`total_macros`], `0.0` when there are no macros at all.
    pub percent: f64,
}

impl MacroShare {
    /// Percentage rounded for display, e.g. `"34%"`.
    pub fn percent_label(&self) -> String {
        format!("{:.0}%", self.percent)
    }
}

/// Protein + carbs + fat, in grams.
pub fn total_macros(data: &NutritionData) -> f64 {
    (data.protein + data.carbs + data.fat).max(0.0)
}

/// Protein, carbs and fat shares, in that order.
pub fn macro_shares(data: &NutritionData) -> [MacroShare; 3] {
    let total = total_macros(data);
    Macro::ALL.map(|kind| {
        let grams = kind.grams(data);
        let percent = if total > 0.0 { grams / total * 100.0 } else { 0.0 };
        MacroShare {
            kind,
            grams,
            percent,
        }
    })
}

/// Total row of the itemized table.
///
/// Summed from the rows themselves, so it can differ from the aggregate when
/// the webhook sent its own totals.
pub fn item_totals(items: &[NutritionItem]) -> Totals {
    Totals::sum(items)
}

/// Whole numbers without decimals, anything else with one.
pub fn format_number(n: f64) -> String {
    let n = if n.is_finite() { n } else { 0.0 };
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n:.1}")
    }
}

pub fn format_grams(n: f64) -> String {
    format!("{}g", format_number(n))
}

/// Name cell for the itemized table.
pub fn item_label(item: &NutritionItem) -> &str {
    item.name.as_deref().unwrap_or("Unknown item")
}

/// Quantity cell for the itemized table.
pub fn quantity_label(item: &NutritionItem) -> &str {
    item.quantity.as_deref().unwrap_or("-")
}
