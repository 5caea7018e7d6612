use std::collections::HashMap;

/// A 2D point in frame pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Keypoint) -> Keypoint {
        Keypoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// The hand landmarks the gesture logic reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkName {
    Wrist,
    ThumbTip,
    IndexTip,
    MiddleTip,
    PinkyTip,
}

impl LandmarkName {
    pub const ALL: [LandmarkName; 5] = [
        Self::Wrist,
        Self::ThumbTip,
        Self::IndexTip,
        Self::MiddleTip,
        Self::PinkyTip,
    ];

    /// Index in the 21-point MediaPipe hand landmark layout.
    pub fn model_index(&self) -> usize {
        match self {
            Self::Wrist => 0,
            Self::ThumbTip => 4,
            Self::IndexTip => 8,
            Self::MiddleTip => 12,
            Self::PinkyTip => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbTip => "thumb_tip",
            Self::IndexTip => "index_tip",
            Self::MiddleTip => "middle_tip",
            Self::PinkyTip => "pinky_tip",
        }
    }
}

/// Named keypoints for one hand in one frame. Points the extractor could not
/// locate are simply absent.
#[derive(Debug, Clone, Default)]
pub struct HandSnapshot {
    points: HashMap<LandmarkName, Keypoint>,
}

impl HandSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: LandmarkName, point: Keypoint) -> Self {
        self.points.insert(name, point);
        self
    }

    pub fn insert(&mut self, name: LandmarkName, point: Keypoint) {
        self.points.insert(name, point);
    }

    pub fn get(&self, name: LandmarkName) -> Option<Keypoint> {
        self.points.get(&name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkName, Keypoint)> + '_ {
        self.points.iter().map(|(name, point)| (*name, *point))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_midpoint() {
        let a = Keypoint::new(0.0, 0.0);
        let b = Keypoint::new(30.0, 40.0);
        assert_eq!(a.distance(&b), 50.0);
        assert_eq!(a.midpoint(&b), Keypoint::new(15.0, 20.0));
    }

    #[test]
    fn test_snapshot_missing_points() {
        let snap = HandSnapshot::new().with(LandmarkName::ThumbTip, Keypoint::new(1.0, 2.0));
        assert_eq!(snap.get(LandmarkName::ThumbTip), Some(Keypoint::new(1.0, 2.0)));
        assert_eq!(snap.get(LandmarkName::IndexTip), None);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_model_indices_are_mediapipe_layout() {
        let indices: Vec<usize> = LandmarkName::ALL.iter().map(|n| n.model_index()).collect();
        assert_eq!(indices, vec![0, 4, 8, 12, 20]);
    }
}
