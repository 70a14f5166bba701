//! Firing profiles: ordered ramp/hold segments.

use heapless::Vec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of segments in one profile.
pub const MAX_SEGMENTS: usize = 16;

/// Maximum profile id length before sanitizing.
pub const MAX_ID_LEN: usize = 39;

/// Steepest ramp accepted in either direction, °C per hour.
pub const MAX_RAMP_C_PER_H: f32 = 600.0;

/// Ambient temperature assumed for duration estimates of the first segment.
pub const AMBIENT_C: f32 = 20.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile has no segments")]
    Empty,
    #[error("profile id is empty after sanitizing")]
    BadId,
    #[error("segment {0} has a non-finite numeric field")]
    NonFinite(usize),
    #[error("segment {0} ramp rate exceeds the 600 °C/h limit")]
    RampTooSteep(usize),
    #[error("too many segments")]
    TooManySegments,
}

/// One ramp-and-hold step of a firing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringSegment {
    pub id: u8,
    pub name: String,
    /// Signed ramp rate in °C per hour; negative means controlled cooling.
    pub ramp_rate_c_per_h: f32,
    pub target_temp_c: f32,
    /// Minutes to hold at the target. 0 holds indefinitely until an explicit
    /// skip command advances the firing.
    pub hold_minutes: u32,
}

/// A complete firing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringProfile {
    /// Identifier, sanitized to `[A-Za-z0-9_]` and at most 39 characters.
    pub id: String,
    pub name: String,
    pub description: String,
    pub segments: Vec<FiringSegment, MAX_SEGMENTS>,
    /// Cached maximum of the segment targets.
    pub max_temp_c: f32,
    /// Cached duration estimate, ramps plus holds.
    pub estimated_duration_minutes: u32,
}

impl FiringProfile {
    /// Creates a profile from segments, sanitizing the id and computing the
    /// cached fields.
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        segments: &[FiringSegment],
    ) -> Result<Self, ProfileError> {
        let mut bounded = Vec::new();
        for segment in segments {
            bounded
                .push(segment.clone())
                .map_err(|_| ProfileError::TooManySegments)?;
        }

        let mut profile = Self {
            id: sanitize_id(id),
            name: name.to_string(),
            description: description.to_string(),
            segments: bounded,
            max_temp_c: 0.0,
            estimated_duration_minutes: 0,
        };
        profile.recompute();
        profile.validate()?;
        Ok(profile)
    }

    /// Checks the structural invariants. Profiles from external sources must
    /// pass this before they are stored or fired.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.segments.is_empty() {
            return Err(ProfileError::Empty);
        }
        if self.id.is_empty() {
            return Err(ProfileError::BadId);
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if !segment.ramp_rate_c_per_h.is_finite() || !segment.target_temp_c.is_finite() {
                return Err(ProfileError::NonFinite(index));
            }
            if segment.ramp_rate_c_per_h.abs() > MAX_RAMP_C_PER_H {
                return Err(ProfileError::RampTooSteep(index));
            }
        }
        if !self.max_temp_c.is_finite() {
            return Err(ProfileError::NonFinite(0));
        }
        Ok(())
    }

    /// Recomputes the cached `max_temp_c` and `estimated_duration_minutes`.
    pub fn recompute(&mut self) {
        self.max_temp_c = self
            .segments
            .iter()
            .map(|s| s.target_temp_c)
            .fold(0.0, f32::max);
        self.estimated_duration_minutes = estimate_duration_minutes(&self.segments);
    }
}

/// Estimated minutes to run `segments`: for each segment, the time to reach
/// its target from the previous target (ambient before the first) at the
/// segment's ramp rate, plus its hold.
pub fn estimate_duration_minutes(segments: &[FiringSegment]) -> u32 {
    let mut minutes = 0.0f32;
    let mut previous_c = AMBIENT_C;
    for segment in segments {
        let rate = segment.ramp_rate_c_per_h.abs();
        if rate > 0.0 {
            minutes += (segment.target_temp_c - previous_c).abs() / rate * 60.0;
        }
        minutes += segment.hold_minutes as f32;
        previous_c = segment.target_temp_c;
    }
    minutes.round() as u32
}

/// Maps an identifier onto the persistence-safe alphabet `[A-Za-z0-9_]`,
/// truncated to [`MAX_ID_LEN`] characters.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .take(MAX_ID_LEN)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
