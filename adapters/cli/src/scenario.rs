//! Scenario files describing a scripted headless session.
//!
//! A scenario is a TOML document:
//!
//! ```toml
//! extra_players = 1
//!
//! [rules]
//! income_per_second = 50.0
//!
//! [field]
//! origin = [0.0, 0.0, 0.0]
//! far = [0.4, 0.0, 0.4]
//!
//! [[objects]]
//! kind = "spawn"
//! position = [0.0, 0.0, 0.0]
//!
//! [[waves]]
//! at = 1.0
//! count = 3
//! health = 10
//! damage = 2
//! speed = 0.5
//! ```

use std::{fs, path::Path, time::Duration};

use anchor_defence_core::{
    seconds_to_duration, Command, FieldCorner, GameRules, ObjectId, ObjectKind, PlayerNumber,
    TowerId, UpgradeAxis, Vec3,
};
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Parsed scenario file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Rule overrides; omitted fields keep their defaults.
    #[serde(default)]
    pub rules: GameRules,
    /// Corner anchors spanning the field.
    pub field: FieldSpec,
    /// Players joining in addition to the first one.
    #[serde(default)]
    pub extra_players: u32,
    /// Objects present from the start, in placement order.
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    /// Scripted anchor movements.
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
    /// Scripted enemy waves.
    #[serde(default)]
    pub waves: Vec<WaveSpec>,
    /// Scripted upgrade purchases.
    #[serde(default)]
    pub upgrades: Vec<UpgradeSpec>,
}

/// Corner anchors and orientation of the field.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Top-left anchor; becomes the grid root.
    pub origin: Vec3,
    /// Bottom-right anchor.
    pub far: Vec3,
    /// Rotation around the vertical axis in radians.
    #[serde(default)]
    pub yaw: f32,
}

/// Object placed when the session starts.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSpec {
    /// Classification of the object.
    pub kind: ObjectKind,
    /// Initial world position.
    pub position: Vec3,
}

/// Anchor that moves at a scheduled time.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveSpec {
    /// Simulated second at which the move is reported.
    pub at: f64,
    /// Zero-based index into `objects`.
    pub object: u32,
    /// Newly observed position.
    pub position: Vec3,
}

/// Batch of enemies spawned and sent together.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveSpec {
    /// Simulated second at which the wave starts.
    pub at: f64,
    /// Number of enemies in the wave.
    pub count: u32,
    /// Starting health of each enemy.
    pub health: i32,
    /// Damage each enemy deals on arrival.
    pub damage: i32,
    /// Seconds per grid step.
    pub speed: f64,
    /// Player whose base the wave attacks.
    #[serde(default = "first_player")]
    pub player: u32,
}

/// Upgrade bought at a scheduled time.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeSpec {
    /// Simulated second at which the purchase happens.
    pub at: f64,
    /// Buyer.
    #[serde(default = "first_player")]
    pub player: u32,
    /// Zero-based tower index in placement order.
    pub tower: u32,
    /// Upgraded attribute.
    pub axis: UpgradeAxis,
}

fn first_player() -> u32 {
    1
}

/// Command due at a point in simulated time.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledCommand {
    /// Simulated time at which the command is submitted.
    pub at: Duration,
    /// Command to submit.
    pub command: Command,
}

impl Scenario {
    /// Reads and parses the scenario stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses and validates scenario text.
    pub fn parse(text: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(text).context("failed to parse scenario TOML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        let times = self
            .moves
            .iter()
            .map(|entry| entry.at)
            .chain(self.waves.iter().map(|wave| wave.at))
            .chain(self.upgrades.iter().map(|upgrade| upgrade.at));
        for at in times {
            if !at.is_finite() || at < 0.0 {
                bail!("scheduled time {at} must be a non-negative number of seconds");
            }
        }

        let object_count = self.objects.len();
        for entry in &self.moves {
            if entry.object as usize >= object_count {
                bail!(
                    "move references object {} but only {object_count} objects are placed",
                    entry.object
                );
            }
        }
        Ok(())
    }

    /// Commands that establish the field, players and initial objects.
    #[must_use]
    pub fn setup_commands(&self) -> Vec<Command> {
        let mut commands = vec![
            Command::SetCorner {
                corner: FieldCorner::Origin,
                position: self.field.origin,
            },
            Command::SetCorner {
                corner: FieldCorner::Far,
                position: self.field.far,
            },
            Command::BuildField,
            Command::OrientObjects {
                yaw: self.field.yaw,
            },
        ];
        commands.extend((0..self.extra_players).map(|_| Command::AddPlayer));
        commands.extend(self.objects.iter().map(|object| Command::PlaceObject {
            kind: object.kind,
            position: object.position,
        }));
        commands
    }

    /// Scripted commands ordered by their due time.
    ///
    /// Entries due at the same instant keep file order, moves first, then
    /// waves, then upgrades.
    #[must_use]
    pub fn scripted_commands(&self) -> Vec<ScheduledCommand> {
        let mut scheduled = Vec::new();

        for entry in &self.moves {
            scheduled.push(ScheduledCommand {
                at: seconds_to_duration(entry.at),
                command: Command::MoveObject {
                    object: ObjectId::new(entry.object),
                    position: entry.position,
                },
            });
        }

        for wave in &self.waves {
            let at = seconds_to_duration(wave.at);
            for _ in 0..wave.count {
                scheduled.push(ScheduledCommand {
                    at,
                    command: Command::SpawnEnemy {
                        health: wave.health,
                        damage: wave.damage,
                        speed: wave.speed,
                        target_player: PlayerNumber::new(wave.player),
                    },
                });
            }
            scheduled.push(ScheduledCommand {
                at,
                command: Command::SendEnemies,
            });
        }

        for upgrade in &self.upgrades {
            scheduled.push(ScheduledCommand {
                at: seconds_to_duration(upgrade.at),
                command: Command::UpgradeTower {
                    player: PlayerNumber::new(upgrade.player),
                    tower: TowerId::new(upgrade.tower),
                    axis: upgrade.axis,
                },
            });
        }

        scheduled.sort_by_key(|entry| entry.at);
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        extra_players = 1

        [rules]
        income_per_second = 40.0

        [field]
        origin = [0.0, 0.0, 0.0]
        far = [0.4, 0.0, 0.4]

        [[objects]]
        kind = "spawn"
        position = [0.0, 0.0, 0.0]

        [[objects]]
        kind = "base"
        position = [0.4, 0.0, 0.4]

        [[moves]]
        at = 3.0
        object = 1
        position = [0.4, 0.0, 0.0]

        [[waves]]
        at = 1.0
        count = 2
        health = 10
        damage = 2
        speed = 0.5

        [[upgrades]]
        at = 0.5
        tower = 0
        axis = "range"
    "#;

    #[test]
    fn partial_rules_keep_defaults() {
        let scenario = Scenario::parse(SCENARIO).expect("valid scenario");
        assert!((scenario.rules.income_per_second - 40.0).abs() < f64::EPSILON);
        assert_eq!(scenario.rules.base_health, 20);
        assert_eq!(scenario.waves[0].player, 1);
    }

    #[test]
    fn setup_places_corners_players_and_objects() {
        let scenario = Scenario::parse(SCENARIO).expect("valid scenario");
        let commands = scenario.setup_commands();

        assert_eq!(commands[2], Command::BuildField);
        assert_eq!(
            commands
                .iter()
                .filter(|command| matches!(command, Command::AddPlayer))
                .count(),
            1
        );
        assert!(matches!(
            commands.last(),
            Some(Command::PlaceObject {
                kind: ObjectKind::Base,
                ..
            })
        ));
    }

    #[test]
    fn script_is_ordered_by_time() {
        let scenario = Scenario::parse(SCENARIO).expect("valid scenario");
        let script = scenario.scripted_commands();

        let times: Vec<u128> = script.iter().map(|entry| entry.at.as_millis()).collect();
        assert_eq!(times, vec![500, 1000, 1000, 1000, 3000]);
        assert!(matches!(script[0].command, Command::UpgradeTower { .. }));
        assert_eq!(script[3].command, Command::SendEnemies);
    }

    #[test]
    fn negative_times_are_rejected() {
        let text = SCENARIO.replace("at = 0.5", "at = -0.5");
        let error = Scenario::parse(&text).expect_err("negative time");
        assert!(error.to_string().contains("non-negative"));
    }

    #[test]
    fn moves_must_reference_placed_objects() {
        let text = SCENARIO.replace("object = 1", "object = 7");
        assert!(Scenario::parse(&text).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{SCENARIO}\nsurprise = true\n");
        assert!(Scenario::parse(&text).is_err());
    }
}
