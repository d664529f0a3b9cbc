//! Named body keypoints located in one image.
//!
//! A `LandmarkSet` always holds every [`BodyPoint`]; there is no partially
//! populated state. Extractors either build a complete set or report
//! `PoseNotDetected`.

/// Body points the measurements are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPoint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftAnkle,
    RightAnkle,
}

impl BodyPoint {
    pub const COUNT: usize = 9;

    pub const ALL: [BodyPoint; Self::COUNT] = [
        BodyPoint::Nose,
        BodyPoint::LeftShoulder,
        BodyPoint::RightShoulder,
        BodyPoint::LeftElbow,
        BodyPoint::RightElbow,
        BodyPoint::LeftHip,
        BodyPoint::RightHip,
        BodyPoint::LeftAnkle,
        BodyPoint::RightAnkle,
    ];

    /// Index of this point in the 17-keypoint COCO layout.
    pub fn coco_index(self) -> usize {
        match self {
            BodyPoint::Nose => 0,
            BodyPoint::LeftShoulder => 5,
            BodyPoint::RightShoulder => 6,
            BodyPoint::LeftElbow => 7,
            BodyPoint::RightElbow => 8,
            BodyPoint::LeftHip => 11,
            BodyPoint::RightHip => 12,
            BodyPoint::LeftAnkle => 15,
            BodyPoint::RightAnkle => 16,
        }
    }

    /// Stable snake_case name, used in diagnostic output.
    pub fn name(self) -> &'static str {
        match self {
            BodyPoint::Nose => "nose",
            BodyPoint::LeftShoulder => "left_shoulder",
            BodyPoint::RightShoulder => "right_shoulder",
            BodyPoint::LeftElbow => "left_elbow",
            BodyPoint::RightElbow => "right_elbow",
            BodyPoint::LeftHip => "left_hip",
            BodyPoint::RightHip => "right_hip",
            BodyPoint::LeftAnkle => "left_ankle",
            BodyPoint::RightAnkle => "right_ankle",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A keypoint position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map a normalized `[0, 1]` coordinate onto an image of the given size.
    pub fn from_normalized(nx: f64, ny: f64, width: u32, height: u32) -> Self {
        Self {
            x: nx * width as f64,
            y: ny * height as f64,
        }
    }

    pub fn distance(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; BodyPoint::COUNT],
}

impl LandmarkSet {
    /// Build a complete set from a lookup that must answer for every point.
    pub fn from_fn(mut f: impl FnMut(BodyPoint) -> Landmark) -> Self {
        let mut points = [Landmark::new(0.0, 0.0); BodyPoint::COUNT];
        for bp in BodyPoint::ALL {
            points[bp.slot()] = f(bp);
        }
        Self { points }
    }

    /// Build a set only if every point is present.
    pub fn try_from_fn(mut f: impl FnMut(BodyPoint) -> Option<Landmark>) -> Option<Self> {
        let mut points = [Landmark::new(0.0, 0.0); BodyPoint::COUNT];
        for bp in BodyPoint::ALL {
            points[bp.slot()] = f(bp)?;
        }
        Some(Self { points })
    }

    pub fn get(&self, point: BodyPoint) -> Landmark {
        self.points[point.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyPoint, Landmark)> + '_ {
        BodyPoint::ALL.iter().map(move |bp| (*bp, self.get(*bp)))
    }
}
