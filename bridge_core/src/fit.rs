//! Per-player headset fit tracking.

use std::fmt;

use crate::player::PlayerId;

/// Contact quality of a single electrode.
///
/// Decoded from the headset's numeric horseshoe reading. Readings outside
/// the known set are kept verbatim as `Unrecognized`; they are stored, never
/// rejected, and never count as good.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactQuality {
    Good,
    Ok,
    Bad,
    Unrecognized(f32),
}

impl ContactQuality {
    /// 1 = good, 2 = ok, 3 or 4 = bad.
    pub fn from_reading(raw: f32) -> Self {
        if raw == 1.0 {
            Self::Good
        } else if raw == 2.0 {
            Self::Ok
        } else if raw == 3.0 || raw == 4.0 {
            Self::Bad
        } else {
            Self::Unrecognized(raw)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Ok => "ok",
            Self::Bad => "bad",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// The four electrode positions, in headset order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoints {
    pub left_ear: ContactQuality,
    pub left_front: ContactQuality,
    pub right_front: ContactQuality,
    pub right_ear: ContactQuality,
}

impl ContactPoints {
    pub fn as_array(&self) -> [ContactQuality; 4] {
        [
            self.left_ear,
            self.left_front,
            self.right_front,
            self.right_ear,
        ]
    }
}

impl Default for ContactPoints {
    fn default() -> Self {
        Self {
            left_ear: ContactQuality::Bad,
            left_front: ContactQuality::Bad,
            right_front: ContactQuality::Bad,
            right_ear: ContactQuality::Bad,
        }
    }
}

impl From<[ContactQuality; 4]> for ContactPoints {
    fn from(q: [ContactQuality; 4]) -> Self {
        Self {
            left_ear: q[0],
            left_front: q[1],
            right_front: q[2],
            right_ear: q[3],
        }
    }
}

/// Fit state of one headset.
///
/// `status_changed` starts out set so the first tick always reports, and is
/// only cleared by `clear_status_changed`.
#[derive(Debug, Clone)]
pub struct FitStatus {
    player: PlayerId,
    points: ContactPoints,
    touching_forehead: bool,
    status_changed: bool,
}

impl FitStatus {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            points: ContactPoints::default(),
            touching_forehead: false,
            status_changed: true,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn contact_points(&self) -> &ContactPoints {
        &self.points
    }

    pub fn touching_forehead(&self) -> bool {
        self.touching_forehead
    }

    pub fn status_changed(&self) -> bool {
        self.status_changed
    }

    /// Overwrite all four contact qualities. Does not touch `status_changed`.
    pub fn update_contact_points(&mut self, points: impl Into<ContactPoints>) {
        self.points = points.into();
        tracing::trace!(
            player = %self.player,
            points = ?self.points.as_array().map(|q| q.label()),
            "contact points updated"
        );
    }

    /// Store the forehead-contact flag (`raw != 0`), raising
    /// `status_changed` if it differs from the stored value.
    pub fn update_forehead_contact(&mut self, raw: i32) {
        let touching = raw != 0;
        if touching != self.touching_forehead {
            self.status_changed = true;
            tracing::debug!(player = %self.player, touching_forehead = touching, "forehead contact changed");
        }
        self.touching_forehead = touching;
    }

    /// True when at least `threshold` contact points are good.
    pub fn is_good(&self, threshold: usize) -> bool {
        let good = self
            .points
            .as_array()
            .iter()
            .filter(|q| matches!(q, ContactQuality::Good))
            .count();
        good >= threshold
    }

    /// One-line status for the operator. Leaves `status_changed` alone.
    pub fn report(&self) -> String {
        self.to_string()
    }

    pub fn clear_status_changed(&mut self) {
        self.status_changed = false;
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Player {} Touching Forehead? {}",
            self.player.number(),
            self.touching_forehead
        )
    }
}
