//! Legend aggregation

use crate::color::{ColorId, Palette, Rgb};
use crate::slot::Choice;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-color weight total shown next to a rendered result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Color name
    pub name: ColorId,
    /// Sum of the weights of every choice with this color
    pub total_weight: u32,
    /// Swatch, when the color is in the palette
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Rgb>,
}

/// Merge duplicate colors and sort by total weight, heaviest first
///
/// Ties keep the order in which colors first appear in `choices`.
#[must_use]
pub fn aggregate_legend(choices: &[Choice], palette: &Palette) -> Vec<LegendEntry> {
    let mut totals: IndexMap<&ColorId, u32> = IndexMap::new();
    for choice in choices {
        let total = totals.entry(&choice.color).or_insert(0);
        *total = total.saturating_add(choice.weight);
    }

    let mut legend: Vec<LegendEntry> = totals
        .into_iter()
        .map(|(name, total_weight)| LegendEntry {
            name: name.clone(),
            total_weight,
            rgb: palette.get(name),
        })
        .collect();
    legend.sort_by(|a, b| b.total_weight.cmp(&a.total_weight));
    legend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_merged() {
        let choices = vec![
            Choice::new("red", 30),
            Choice::new("red", 20),
            Choice::new("blue", 50),
        ];
        let legend = aggregate_legend(&choices, &Palette::dyes());
        assert_eq!(legend.len(), 2);
        assert_eq!(legend.iter().filter(|e| e.name.as_str() == "red").count(), 1);
        assert!(legend.iter().all(|e| e.total_weight == 50));
        // tie keeps first-seen order
        assert_eq!(legend[0].name.as_str(), "red");
    }

    #[test]
    fn heaviest_first() {
        let choices = vec![
            Choice::new("pink", 20),
            Choice::new("magenta", 40),
            Choice::new("purple", 40),
        ];
        let names: Vec<_> = aggregate_legend(&choices, &Palette::dyes())
            .into_iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(names, ["magenta", "purple", "pink"]);
    }

    #[test]
    fn unknown_color_has_no_swatch() {
        let legend = aggregate_legend(&[Choice::new("teal", 1)], &Palette::dyes());
        assert_eq!(legend[0].rgb, None);
    }
}
