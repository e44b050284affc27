// Data-driven navigation configuration.
//
// All tunable parameters live in `NavConfig`, loaded from JSON or built from
// `NavConfig::default()`. The navigation code never hard-codes thresholds;
// it reads them from here. Tests shrink timers through the same fields.
//
// Parameters are grouped into nested structs:
// - `GoalPolicy`: per-producer enable flag and priority (lower = more urgent).
// - `OrbitParams`: the positional-advantage orbit (radius, angular stepping).
// - `MeshParams`: body/mesh geometry used by area queries (jump height, slop).
// - `LocomotionParams`: movement speeds and the stuck-recovery timers.
//
// Every struct carries `#[serde(default)]` (goal policies merge per field
// through `GoalPolicyFile`), so a config file only needs the fields it
// overrides. Defaults are tuned for a host where a running agent
// covers roughly 300 world units per second.
//
// See also: `navigator.rs` which owns a `NavConfig` reference per tick,
// `locomotion.rs` for how the thresholds drive the stuck phases, `goal.rs`
// for how priorities are compared.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Goal policy
// ---------------------------------------------------------------------------

/// Enable flag and priority for one goal producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerPolicy {
    pub enabled: bool,
    /// Lower values win arbitration.
    pub priority: i32,
}

impl ProducerPolicy {
    fn merged(self, overrides: ProducerOverride) -> Self {
        Self {
            enabled: overrides.enabled.unwrap_or(self.enabled),
            priority: overrides.priority.unwrap_or(self.priority),
        }
    }
}

/// Per-producer policies. Ties in priority are broken Capture > Positional
/// > Explore regardless of configuration.
///
/// Loaded through `GoalPolicyFile` so a file may set a single field of one
/// producer and keep that producer's own default for the other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "GoalPolicyFile")]
pub struct GoalPolicy {
    pub capture: ProducerPolicy,
    pub positional: ProducerPolicy,
    pub explore: ProducerPolicy,
}

impl Default for GoalPolicy {
    fn default() -> Self {
        Self {
            capture: ProducerPolicy {
                enabled: true,
                priority: 1,
            },
            positional: ProducerPolicy {
                enabled: true,
                priority: 2,
            },
            explore: ProducerPolicy {
                enabled: true,
                priority: 3,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct ProducerOverride {
    enabled: Option<bool>,
    priority: Option<i32>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct GoalPolicyFile {
    capture: ProducerOverride,
    positional: ProducerOverride,
    explore: ProducerOverride,
}

impl From<GoalPolicyFile> for GoalPolicy {
    fn from(file: GoalPolicyFile) -> Self {
        let base = GoalPolicy::default();
        Self {
            capture: base.capture.merged(file.capture),
            positional: base.positional.merged(file.positional),
            explore: base.explore.merged(file.explore),
        }
    }
}

// ---------------------------------------------------------------------------
// Positional orbit
// ---------------------------------------------------------------------------

/// Orbit used by the positional-advantage producer. The orbit angle is
/// `floor(now / step_time) * step_angle`, so the target point walks around
/// the opponent in discrete, predictable steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitParams {
    /// Distance from the opponent to the proposed point.
    pub radius: f32,
    /// Seconds per angular step.
    pub step_time: f32,
    /// Radians advanced per step.
    pub step_angle: f32,
    /// Minimum seconds between positional retargets while a route is active.
    pub retarget_cooldown: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            radius: 1500.0,
            step_time: 1.0,
            step_angle: 0.7,
            retarget_cooldown: 0.75,
        }
    }
}

// ---------------------------------------------------------------------------
// Mesh / body geometry
// ---------------------------------------------------------------------------

/// Body geometry consulted by area queries and the ledge-jump logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    /// Maximum height the agent can gain with a crouch-jump.
    pub jump_height: f32,
    /// Height the agent climbs without jumping.
    pub step_height: f32,
    /// Vertical tolerance when matching a point to an area's height range.
    pub z_slop: f32,
    /// Width of the agent's collision hull.
    pub hull_width: f32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            jump_height: 72.0,
            step_height: 18.0,
            z_slop: 18.0,
            hull_width: 49.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Locomotion
// ---------------------------------------------------------------------------

/// Movement output scaling and stuck-recovery timing. Times are seconds,
/// distances are world units, movement values are command units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionParams {
    /// Magnitude of the forward/side command when walking toward a node.
    pub move_speed: f32,
    /// Symmetric clamp applied to forward and side commands.
    pub max_move: f32,

    /// A new distance minimum must beat the baseline by this much to count
    /// as progress.
    pub progress_margin: f32,
    /// Baseline offset applied after a progress reset.
    pub progress_reset_slack: f32,
    /// How far the baseline may drift upward per tick without progress.
    pub baseline_drift: f32,
    /// Interval of the coarse raw-position progress check.
    pub position_sample_interval: f32,
    /// Planar displacement over one sample interval that counts as progress.
    pub position_sample_min_delta: f32,

    /// Commands below this magnitude on both axes are "not moving".
    pub min_command: f32,
    /// Stuck escalation is suspended this close to the next node.
    pub min_distance: f32,
    pub wiggle_after: f32,
    pub backoff_after: f32,
    pub replan_after: f32,
    /// When idle, a raised phase drops to normal if progress is this recent.
    pub settle_window: f32,

    pub wiggle_period: f32,
    pub wiggle_side: f32,
    /// Degrees of view-yaw scrub added while wiggling.
    pub wiggle_yaw_scrub: f32,
    pub backoff_forward: f32,
    pub unstuck_hop_cooldown: f32,
    /// Minimum spacing between any two crouch-jumps.
    pub jump_cooldown: f32,
    pub forced_replan_cooldown: f32,
    pub offpath_cooldown: f32,

    /// How many nodes past the cursor to search for an adjacent node.
    pub lookahead_window: usize,
    pub max_corner_skips: usize,
    /// Node-after-next must be this much closer than next to skip ahead.
    pub corner_skip_margin: f32,

    pub dwell_check_interval: f32,
    /// Seconds on the same route node before the watchdog skips or replans.
    pub dwell_timeout: f32,
    pub dwell_max_skips: usize,

    /// A crouch-jump is released after this many ticks at most.
    pub crouch_jump_max_ticks: u32,
    /// ...and never before this many ticks after leaving the ground.
    pub crouch_jump_min_ticks: u32,
    /// Extra height over `step_height` before a ledge needs a jump.
    pub step_jump_tolerance: f32,
    /// Added to `0.75 * hull_width` to get the ledge-jump trigger distance.
    pub edge_trigger_extra: f32,
}

impl Default for LocomotionParams {
    fn default() -> Self {
        Self {
            move_speed: 350.0,
            max_move: 450.0,
            progress_margin: 4.0,
            progress_reset_slack: 8.0,
            baseline_drift: 1.0,
            position_sample_interval: 0.2,
            position_sample_min_delta: 4.0,
            min_command: 10.0,
            min_distance: 48.0,
            wiggle_after: 0.8,
            backoff_after: 1.0,
            replan_after: 1.5,
            settle_window: 0.5,
            wiggle_period: 0.2,
            wiggle_side: 160.0,
            wiggle_yaw_scrub: 6.0,
            backoff_forward: 220.0,
            unstuck_hop_cooldown: 0.45,
            jump_cooldown: 0.2,
            forced_replan_cooldown: 1.5,
            offpath_cooldown: 0.75,
            lookahead_window: 4,
            max_corner_skips: 3,
            corner_skip_margin: 24.0,
            dwell_check_interval: 0.1,
            dwell_timeout: 1.2,
            dwell_max_skips: 3,
            crouch_jump_max_ticks: 20,
            crouch_jump_min_ticks: 3,
            step_jump_tolerance: 1.2,
            edge_trigger_extra: 8.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level navigation configuration. Never mutated by the navigator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Master switch. When off, the navigator clears all state and idles.
    pub enabled: bool,
    /// Emit movement commands. When off, goals and routes are still kept
    /// up to date but the agent is not driven.
    pub walk: bool,
    /// Write view angles that face along the route.
    pub look_along_path: bool,
    /// Divisor applied to the yaw delta each tick; values <= 0 mean snap.
    pub look_smoothness: f32,
    /// Promote goal-change logging from `debug` to `info`.
    pub debug_logging: bool,
    /// Capacity of the recently-visited area history.
    pub visited_capacity: usize,
    pub goals: GoalPolicy,
    pub positional: OrbitParams,
    pub mesh: MeshParams,
    pub locomotion: LocomotionParams,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            walk: true,
            look_along_path: false,
            look_smoothness: 50.0,
            debug_logging: false,
            visited_capacity: 512,
            goals: GoalPolicy::default(),
            positional: OrbitParams::default(),
            mesh: MeshParams::default(),
            locomotion: LocomotionParams::default(),
        }
    }
}

impl NavConfig {
    /// Parse a config from JSON and validate it. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject configurations the controller cannot run sensibly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.visited_capacity == 0 {
            return Err(invalid("visited_capacity", "must be at least 1"));
        }
        if !self.look_smoothness.is_finite() {
            return Err(invalid("look_smoothness", "must be finite"));
        }
        let loco = &self.locomotion;
        if !(loco.max_move > 0.0) {
            return Err(invalid("locomotion.max_move", "must be positive"));
        }
        if !(loco.wiggle_after <= loco.backoff_after && loco.backoff_after <= loco.replan_after) {
            return Err(invalid(
                "locomotion.wiggle_after",
                format!(
                    "stuck thresholds must be ordered (wiggle {} <= backoff {} <= replan {})",
                    loco.wiggle_after, loco.backoff_after, loco.replan_after
                ),
            ));
        }
        if loco.crouch_jump_max_ticks == 0 {
            return Err(invalid("locomotion.crouch_jump_max_ticks", "must be at least 1"));
        }
        if !(self.positional.step_time > 0.0) {
            return Err(invalid("positional.step_time", "must be positive"));
        }
        if self.mesh.jump_height < 0.0 || self.mesh.z_slop < 0.0 {
            return Err(invalid("mesh", "jump_height and z_slop must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = NavConfig::default();
        let json = config.to_json().unwrap();
        let restored = NavConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_partial_json() {
        let json = r#"{
            "look_along_path": true,
            "goals": {
                "explore": { "enabled": false, "priority": 9 }
            },
            "locomotion": {
                "wiggle_after": 0.1,
                "backoff_after": 0.2,
                "replan_after": 0.3
            }
        }"#;
        let config = NavConfig::from_json(json).unwrap();
        assert!(config.look_along_path);
        assert!(!config.goals.explore.enabled);
        assert_eq!(config.goals.explore.priority, 9);
        // Untouched siblings keep their defaults.
        assert_eq!(config.goals.capture.priority, 1);
        assert_eq!(config.locomotion.wiggle_after, 0.1);
        assert_eq!(config.locomotion.move_speed, 350.0);
        assert_eq!(config.mesh.jump_height, 72.0);
    }

    #[test]
    fn producer_policy_fields_default_individually() {
        let config = NavConfig::from_json(r#"{"goals":{"explore":{"enabled":false}}}"#).unwrap();
        assert!(!config.goals.explore.enabled);
        assert_eq!(config.goals.explore.priority, 3);
        assert_eq!(config.goals.capture, GoalPolicy::default().capture);

        let config = NavConfig::from_json(r#"{"goals":{"capture":{"priority":5}}}"#).unwrap();
        assert!(config.goals.capture.enabled);
        assert_eq!(config.goals.capture.priority, 5);
        assert_eq!(config.goals.positional.priority, 2);
    }

    #[test]
    fn validate_rejects_unordered_thresholds() {
        let mut config = NavConfig::default();
        config.locomotion.backoff_after = 2.0;
        config.locomotion.replan_after = 1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "locomotion.wiggle_after",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_zero_visited_capacity() {
        let json = r#"{ "visited_capacity": 0 }"#;
        assert!(NavConfig::from_json(json).is_err());
    }

    #[test]
    fn from_json_rejects_wrong_types() {
        let json = r#"{ "walk": "yes" }"#;
        assert!(matches!(
            NavConfig::from_json(json),
            Err(ConfigError::Json(_))
        ));
    }
}
