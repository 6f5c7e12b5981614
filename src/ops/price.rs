use std::fmt;
use std::str::FromStr;

use crate::model::FilterSelection;

/// One-click price ranges offered next to the product filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePreset {
    Under300,
    From300To500,
    From500To1000,
    Over1000,
}

impl PricePreset {
    pub const ALL: [PricePreset; 4] = [
        PricePreset::Under300,
        PricePreset::From300To500,
        PricePreset::From500To1000,
        PricePreset::Over1000,
    ];

    /// `(min, max)` bounds, both inclusive; `None` is unbounded
    pub fn bounds(self) -> (Option<f64>, Option<f64>) {
        match self {
            PricePreset::Under300 => (Some(0.0), Some(300.0)),
            PricePreset::From300To500 => (Some(300.0), Some(500.0)),
            PricePreset::From500To1000 => (Some(500.0), Some(1000.0)),
            PricePreset::Over1000 => (Some(1000.0), None),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PricePreset::Under300 => "Less than $300",
            PricePreset::From300To500 => "$300 - $500",
            PricePreset::From500To1000 => "$500 - $1000",
            PricePreset::Over1000 => "More than $1000",
        }
    }

    /// A preset is active when the selection's bounds are exactly its bounds
    pub fn is_active(self, selection: &FilterSelection) -> bool {
        (selection.price_min, selection.price_max) == self.bounds()
    }

    /// The preset matching the current bounds, if any
    pub fn active(selection: &FilterSelection) -> Option<PricePreset> {
        PricePreset::ALL.into_iter().find(|p| p.is_active(selection))
    }
}

impl fmt::Display for PricePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PricePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under-300" => Ok(PricePreset::Under300),
            "300-500" => Ok(PricePreset::From300To500),
            "500-1000" => Ok(PricePreset::From500To1000),
            "over-1000" => Ok(PricePreset::Over1000),
            other => Err(format!(
                "unknown price preset \"{}\" (expected under-300, 300-500, 500-1000 or over-1000)",
                other
            )),
        }
    }
}

/// Format a price bound for display: `300`, `299.99`, or `any`
pub fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(v) => crate::ops::query::format_number(v),
        None => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_preset_detection() {
        let mut sel = FilterSelection::default();
        assert_eq!(PricePreset::active(&sel), None);

        sel.price_min = Some(300.0);
        sel.price_max = Some(500.0);
        assert_eq!(PricePreset::active(&sel), Some(PricePreset::From300To500));

        sel.price_max = None;
        assert_eq!(PricePreset::active(&sel), None);
    }

    #[test]
    fn under_300_requires_both_bounds() {
        let sel = FilterSelection {
            price_min: None,
            price_max: Some(300.0),
            ..Default::default()
        };
        assert!(!PricePreset::Under300.is_active(&sel));
    }

    #[test]
    fn parse_cli_names() {
        assert_eq!("over-1000".parse::<PricePreset>(), Ok(PricePreset::Over1000));
        assert!("cheap".parse::<PricePreset>().is_err());
    }

    #[test]
    fn bound_formatting() {
        assert_eq!(format_bound(Some(300.0)), "300");
        assert_eq!(format_bound(Some(299.99)), "299.99");
        assert_eq!(format_bound(None), "any");
    }
}
