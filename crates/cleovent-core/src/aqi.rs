//! US EPA air-quality index bands.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AqiBand {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiBand {
    /// Ordered by severity. Upper bounds are inclusive; `None` is unbounded.
    pub const ALL: [(AqiBand, Option<i64>); 6] = [
        (AqiBand::Good, Some(50)),
        (AqiBand::Moderate, Some(100)),
        (AqiBand::UnhealthyForSensitiveGroups, Some(150)),
        (AqiBand::Unhealthy, Some(200)),
        (AqiBand::VeryUnhealthy, Some(300)),
        (AqiBand::Hazardous, None),
    ];

    pub fn from_index(aqi: i64) -> AqiBand {
        Self::ALL
            .iter()
            .find(|(_, upper)| upper.map_or(true, |u| aqi <= u))
            .map(|(band, _)| *band)
            .unwrap_or(AqiBand::Hazardous)
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::VeryUnhealthy => "Very Unhealthy",
            AqiBand::Hazardous => "Hazardous",
        }
    }

    pub fn description(self) -> String {
        format!("Air quality is {}.", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_close_on_the_lower_band() {
        let cases = [
            (0, "Good"),
            (50, "Good"),
            (51, "Moderate"),
            (100, "Moderate"),
            (101, "Unhealthy for Sensitive Groups"),
            (150, "Unhealthy for Sensitive Groups"),
            (151, "Unhealthy"),
            (200, "Unhealthy"),
            (201, "Very Unhealthy"),
            (300, "Very Unhealthy"),
            (301, "Hazardous"),
            (999, "Hazardous"),
        ];
        for (aqi, label) in cases {
            assert_eq!(AqiBand::from_index(aqi).label(), label, "aqi {aqi}");
        }
    }

    #[test]
    fn bands_are_contiguous() {
        // every integer maps to exactly the first band whose bound admits it
        for aqi in -5..=400 {
            let hits = AqiBand::ALL
                .iter()
                .enumerate()
                .filter(|(i, (_, upper))| {
                    let lower = if *i == 0 { None } else { AqiBand::ALL[i - 1].1 };
                    lower.map_or(true, |l| aqi > l) && upper.map_or(true, |u| aqi <= u)
                })
                .count();
            assert_eq!(hits, 1, "aqi {aqi}");
        }
    }

    #[test]
    fn description_wraps_label() {
        assert_eq!(AqiBand::from_index(42).description(), "Air quality is Good.");
        assert_eq!(
            AqiBand::from_index(320).description(),
            "Air quality is Hazardous."
        );
    }
}
