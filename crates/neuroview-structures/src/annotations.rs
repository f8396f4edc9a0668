//! Borders, foci and fiber trajectories.
//!
//! Annotations come grouped in files. A pick on one reports the file index,
//! the item index within the file and, for polylines, the point index.

use glam::Vec3;

/// A named polyline drawn on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub name: String,
    pub points: Vec<Vec3>,
    /// Whether the last point joins back to the first.
    pub closed: bool,
    pub color: [u8; 4],
}

impl Border {
    #[must_use]
    pub fn new(name: impl Into<String>, points: Vec<Vec3>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            points,
            closed: false,
            color,
        }
    }

    #[must_use]
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Segments between consecutive points, including the closing segment.
    #[must_use]
    pub fn segments(&self) -> Vec<[u32; 2]> {
        let n = self.points.len() as u32;
        let mut segments: Vec<[u32; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        if self.closed && n > 2 {
            segments.push([n - 1, 0]);
        }
        segments
    }

    /// The point a segment starting at `index` ends on, wrapping to the
    /// first point on closed borders.
    #[must_use]
    pub fn segment_end(&self, index: usize) -> Option<usize> {
        let n = self.points.len();
        if index + 1 < n {
            Some(index + 1)
        } else if self.closed && n > 2 && index + 1 == n {
            Some(0)
        } else {
            None
        }
    }
}

/// A labelled point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Focus {
    pub name: String,
    pub position: Vec3,
    pub color: [u8; 4],
}

impl Focus {
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec3, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            position,
            color,
        }
    }
}

/// A fiber trajectory through the volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Fiber {
    pub points: Vec<Vec3>,
    pub color: [u8; 4],
}

/// A group of borders loaded together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderFile {
    pub name: String,
    pub borders: Vec<Border>,
    pub enabled: bool,
}

/// A group of foci loaded together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FociFile {
    pub name: String,
    pub foci: Vec<Focus>,
    pub enabled: bool,
}

/// A group of fibers loaded together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FiberFile {
    pub name: String,
    pub fibers: Vec<Fiber>,
    pub enabled: bool,
}

impl BorderFile {
    #[must_use]
    pub fn new(name: impl Into<String>, borders: Vec<Border>) -> Self {
        Self {
            name: name.into(),
            borders,
            enabled: true,
        }
    }
}

impl FociFile {
    #[must_use]
    pub fn new(name: impl Into<String>, foci: Vec<Focus>) -> Self {
        Self {
            name: name.into(),
            foci,
            enabled: true,
        }
    }
}

impl FiberFile {
    #[must_use]
    pub fn new(name: impl Into<String>, fibers: Vec<Fiber>) -> Self {
        Self {
            name: name.into(),
            fibers,
            enabled: true,
        }
    }
}

/// All annotation files shown with a view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotations {
    pub borders: Vec<BorderFile>,
    pub foci: Vec<FociFile>,
    pub fibers: Vec<FiberFile>,
}

impl Annotations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.borders.is_empty() && self.foci.is_empty() && self.fibers.is_empty()
    }

    /// Looks up a border point by its pick indices.
    #[must_use]
    pub fn border_point(&self, file: usize, border: usize, point: usize) -> Option<Vec3> {
        self.borders
            .get(file)?
            .borders
            .get(border)?
            .points
            .get(point)
            .copied()
    }

    #[must_use]
    pub fn focus(&self, file: usize, focus: usize) -> Option<&Focus> {
        self.foci.get(file)?.foci.get(focus)
    }

    #[must_use]
    pub fn fiber_point(&self, file: usize, fiber: usize, point: usize) -> Option<Vec3> {
        self.fibers
            .get(file)?
            .fibers
            .get(fiber)?
            .points
            .get(point)
            .copied()
    }
}
