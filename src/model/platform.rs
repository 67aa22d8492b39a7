use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Ride platform a trip was booked through. `Multiple` means the trip record
/// carries a per-platform breakdown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Uber,
    Indrive,
    Yatri,
    Rapido,
    Offline,
    Multiple,
}

impl Platform {
    /// Platforms that carry their own earnings column, in display order.
    pub const EARNING: [Platform; 5] = [
        Platform::Uber,
        Platform::Indrive,
        Platform::Yatri,
        Platform::Rapido,
        Platform::Offline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Platform::Uber => "Uber",
            Platform::Indrive => "InDrive",
            Platform::Yatri => "Yatri",
            Platform::Rapido => "Rapido",
            Platform::Offline => "Offline",
            Platform::Multiple => "Multiple",
        }
    }
}

/// One amount per earning platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformAmounts {
    pub uber: f64,
    pub indrive: f64,
    pub yatri: f64,
    pub rapido: f64,
    pub offline: f64,
}

impl PlatformAmounts {
    pub fn get(&self, platform: Platform) -> f64 {
        match platform {
            Platform::Uber => self.uber,
            Platform::Indrive => self.indrive,
            Platform::Yatri => self.yatri,
            Platform::Rapido => self.rapido,
            Platform::Offline => self.offline,
            Platform::Multiple => 0.0,
        }
    }

    /// `Multiple` has no bucket of its own and is ignored.
    pub fn add(&mut self, platform: Platform, amount: f64) {
        match platform {
            Platform::Uber => self.uber += amount,
            Platform::Indrive => self.indrive += amount,
            Platform::Yatri => self.yatri += amount,
            Platform::Rapido => self.rapido += amount,
            Platform::Offline => self.offline += amount,
            Platform::Multiple => {}
        }
    }

    pub fn merge(&mut self, other: &PlatformAmounts) {
        for platform in Platform::EARNING {
            self.add(platform, other.get(platform));
        }
    }

    pub fn total(&self) -> f64 {
        Platform::EARNING.iter().map(|p| self.get(*p)).sum()
    }

    /// Highest bucket; ties go to the earlier platform. `None` when nothing
    /// is above zero.
    pub fn top(&self) -> Option<Platform> {
        let mut best: Option<(Platform, f64)> = None;
        for platform in Platform::EARNING {
            let amount = self.get(platform);
            if amount <= 0.0 {
                continue;
            }
            match best {
                Some((_, current)) if current >= amount => {}
                _ => best = Some((platform, amount)),
            }
        }
        best.map(|(platform, _)| platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_lowercase_names() {
        assert_eq!(Platform::from_str("indrive").unwrap(), Platform::Indrive);
        assert_eq!(Platform::from_str("multiple").unwrap(), Platform::Multiple);
        assert!(Platform::from_str("ola").is_err());
        assert_eq!(Platform::Rapido.to_string(), "rapido");
    }

    #[test]
    fn multiple_has_no_bucket() {
        let mut amounts = PlatformAmounts::default();
        amounts.add(Platform::Multiple, 500.0);
        amounts.add(Platform::Uber, 200.0);
        assert_eq!(amounts.total(), 200.0);
    }

    #[test]
    fn top_prefers_earlier_platform_on_tie() {
        let amounts = PlatformAmounts {
            uber: 100.0,
            yatri: 300.0,
            rapido: 300.0,
            ..Default::default()
        };
        assert_eq!(amounts.top(), Some(Platform::Yatri));
        assert_eq!(PlatformAmounts::default().top(), None);
    }
}
