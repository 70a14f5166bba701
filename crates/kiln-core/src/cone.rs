//! Cone-fire profile generation.
//!
//! Builds a complete firing curve from an Orton pyrometric cone number and a
//! firing speed. The generated curve follows the usual ceramic schedule:
//! optional preheat, a slow water-smoke ramp through steam release, a faster
//! ramp through the quartz inversion zone, the final approach at the chosen
//! speed, and an optional controlled cool-down.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::{FiringProfile, FiringSegment, ProfileError};

/// Final-approach speed of a cone firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConeSpeed {
    Slow,
    Medium,
    Fast,
}

impl ConeSpeed {
    /// Final-segment ramp rate in °C per hour.
    pub fn rate_c_per_h(self) -> f32 {
        match self {
            ConeSpeed::Slow => 60.0,
            ConeSpeed::Medium => 150.0,
            ConeSpeed::Fast => 300.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConeSpeed::Slow => "slow",
            ConeSpeed::Medium => "medium",
            ConeSpeed::Fast => "fast",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConeError {
    #[error("unknown cone {0:?}")]
    UnknownCone(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// One row of the cone table: deformation temperature in °C at each speed.
#[derive(Debug, Clone, Copy)]
pub struct ConeEntry {
    pub cone: &'static str,
    pub slow_c: f32,
    pub medium_c: f32,
    pub fast_c: f32,
}

impl ConeEntry {
    pub fn target_c(&self, speed: ConeSpeed) -> f32 {
        match speed {
            ConeSpeed::Slow => self.slow_c,
            ConeSpeed::Medium => self.medium_c,
            ConeSpeed::Fast => self.fast_c,
        }
    }
}

/// Orton cone deformation temperatures, large cones, in °C.
///
/// The slow and medium columns are the published 60 °C/h and 150 °C/h
/// ratings; the fast column extrapolates the published trend to 300 °C/h.
pub const CONE_TABLE: [ConeEntry; 37] = [
    ConeEntry { cone: "022", slow_c: 586.0, medium_c: 600.0, fast_c: 610.0 },
    ConeEntry { cone: "021", slow_c: 614.0, medium_c: 617.0, fast_c: 627.0 },
    ConeEntry { cone: "020", slow_c: 635.0, medium_c: 638.0, fast_c: 648.0 },
    ConeEntry { cone: "019", slow_c: 683.0, medium_c: 695.0, fast_c: 705.0 },
    ConeEntry { cone: "018", slow_c: 717.0, medium_c: 734.0, fast_c: 744.0 },
    ConeEntry { cone: "017", slow_c: 747.0, medium_c: 763.0, fast_c: 773.0 },
    ConeEntry { cone: "016", slow_c: 792.0, medium_c: 796.0, fast_c: 806.0 },
    ConeEntry { cone: "015", slow_c: 804.0, medium_c: 818.0, fast_c: 828.0 },
    ConeEntry { cone: "014", slow_c: 838.0, medium_c: 852.0, fast_c: 862.0 },
    ConeEntry { cone: "013", slow_c: 852.0, medium_c: 861.0, fast_c: 871.0 },
    ConeEntry { cone: "012", slow_c: 872.0, medium_c: 884.0, fast_c: 894.0 },
    ConeEntry { cone: "011", slow_c: 883.0, medium_c: 894.0, fast_c: 904.0 },
    ConeEntry { cone: "010", slow_c: 891.0, medium_c: 905.0, fast_c: 915.0 },
    ConeEntry { cone: "09", slow_c: 907.0, medium_c: 923.0, fast_c: 933.0 },
    ConeEntry { cone: "08", slow_c: 922.0, medium_c: 942.0, fast_c: 952.0 },
    ConeEntry { cone: "07", slow_c: 962.0, medium_c: 976.0, fast_c: 986.0 },
    ConeEntry { cone: "06", slow_c: 981.0, medium_c: 998.0, fast_c: 1008.0 },
    ConeEntry { cone: "05", slow_c: 1012.0, medium_c: 1031.0, fast_c: 1041.0 },
    ConeEntry { cone: "04", slow_c: 1037.0, medium_c: 1063.0, fast_c: 1073.0 },
    ConeEntry { cone: "03", slow_c: 1061.0, medium_c: 1086.0, fast_c: 1096.0 },
    ConeEntry { cone: "02", slow_c: 1088.0, medium_c: 1102.0, fast_c: 1112.0 },
    ConeEntry { cone: "01", slow_c: 1109.0, medium_c: 1119.0, fast_c: 1129.0 },
    ConeEntry { cone: "1", slow_c: 1123.0, medium_c: 1137.0, fast_c: 1147.0 },
    ConeEntry { cone: "2", slow_c: 1131.0, medium_c: 1142.0, fast_c: 1152.0 },
    ConeEntry { cone: "3", slow_c: 1148.0, medium_c: 1152.0, fast_c: 1162.0 },
    ConeEntry { cone: "4", slow_c: 1162.0, medium_c: 1168.0, fast_c: 1178.0 },
    ConeEntry { cone: "5", slow_c: 1180.0, medium_c: 1186.0, fast_c: 1196.0 },
    ConeEntry { cone: "5.5", slow_c: 1196.0, medium_c: 1203.0, fast_c: 1213.0 },
    ConeEntry { cone: "6", slow_c: 1222.0, medium_c: 1243.0, fast_c: 1253.0 },
    ConeEntry { cone: "7", slow_c: 1239.0, medium_c: 1257.0, fast_c: 1267.0 },
    ConeEntry { cone: "8", slow_c: 1249.0, medium_c: 1271.0, fast_c: 1281.0 },
    ConeEntry { cone: "9", slow_c: 1260.0, medium_c: 1280.0, fast_c: 1290.0 },
    ConeEntry { cone: "10", slow_c: 1285.0, medium_c: 1305.0, fast_c: 1315.0 },
    ConeEntry { cone: "11", slow_c: 1294.0, medium_c: 1315.0, fast_c: 1325.0 },
    ConeEntry { cone: "12", slow_c: 1306.0, medium_c: 1326.0, fast_c: 1336.0 },
    ConeEntry { cone: "13", slow_c: 1331.0, medium_c: 1348.0, fast_c: 1358.0 },
    ConeEntry { cone: "14", slow_c: 1365.0, medium_c: 1384.0, fast_c: 1394.0 },
];

/// Looks up a cone by its number (e.g. `"06"`, `"6"`, `"5.5"`).
pub fn find_cone(cone: &str) -> Option<&'static ConeEntry> {
    CONE_TABLE.iter().find(|entry| entry.cone == cone)
}

/// Deterministically builds a 2-6 segment profile for `cone` at `speed`.
///
/// Intermediate segments are dropped when their target would meet or exceed
/// the cone target, so very low-fire cones produce shorter curves. The
/// slow-cool option only applies when the cone target is above 650 °C.
pub fn generate(
    cone: &str,
    speed: ConeSpeed,
    preheat: bool,
    slow_cool: bool,
) -> Result<FiringProfile, ConeError> {
    let entry = find_cone(cone).ok_or_else(|| ConeError::UnknownCone(cone.to_string()))?;
    let target_c = entry.target_c(speed);

    let mut segments = std::vec::Vec::new();
    let mut push = |name: &str, ramp: f32, target: f32, hold: u32| {
        segments.push(FiringSegment {
            id: segments.len() as u8,
            name: name.to_string(),
            ramp_rate_c_per_h: ramp,
            target_temp_c: target,
            hold_minutes: hold,
        });
    };

    if preheat {
        push("Preheat", 80.0, 120.0, 30);
    }
    if 220.0 < target_c {
        push("Water smoke", 60.0, 220.0, 0);
    }
    if 600.0 < target_c {
        push("Quartz zone", 100.0, 600.0, 0);
    }
    push("Final ramp", speed.rate_c_per_h(), target_c, 10);
    if slow_cool && target_c > 650.0 {
        push("Slow cool", -150.0, 650.0, 0);
        push("Anneal cool", -50.0, 500.0, 0);
    }

    let id = format!("cone_{}_{}", crate::profile::sanitize_id(cone), speed.label());
    let name = format!("Cone {} ({})", entry.cone, speed.label());
    let description = format!(
        "Generated cone-fire schedule to {:.0} °C at {:.0} °C/h",
        target_c,
        speed.rate_c_per_h()
    );

    FiringProfile::new(&id, &name, &description, &segments).map_err(ConeError::from)
}
