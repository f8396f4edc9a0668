//! Color-encoded identification of drawn primitives.
//!
//! During an identification pass every selectable primitive is drawn in a
//! unique flat color. Reading back the pixel under the mouse and decoding its
//! color recovers what was drawn there. Ids are assigned from a monotonic
//! counter and packed into 24 bits:
//! - R contains bits 16-23
//! - G contains bits 8-15
//! - B contains bits 0-7
//!
//! Id 0 (black) is reserved for the background.

use serde::{Deserialize, Serialize};

/// Largest id that fits into an RGB triple.
pub const MAX_IDENTIFICATION_ID: u32 = 0x00FF_FFFF;

/// Color of pixels no primitive was drawn to.
pub const BACKGROUND_COLOR: [u8; 3] = [0, 0, 0];

/// Category of a selectable primitive.
///
/// The declaration order is the fixed identification order of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentificationKind {
    /// A surface vertex.
    SurfaceNode,
    /// A surface triangle.
    SurfaceTriangle,
    /// A point of a border polyline.
    BorderPoint,
    /// A focus.
    Focus,
    /// A node-identification symbol drawn on a surface.
    NodeSymbol,
    /// A point on a fiber trajectory.
    FiberPoint,
    /// A volume voxel.
    Voxel,
}

impl IdentificationKind {
    /// Every kind, in identification order.
    pub const ALL: [IdentificationKind; 7] = [
        IdentificationKind::SurfaceNode,
        IdentificationKind::SurfaceTriangle,
        IdentificationKind::BorderPoint,
        IdentificationKind::Focus,
        IdentificationKind::NodeSymbol,
        IdentificationKind::FiberPoint,
        IdentificationKind::Voxel,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            IdentificationKind::SurfaceNode => "surface node",
            IdentificationKind::SurfaceTriangle => "surface triangle",
            IdentificationKind::BorderPoint => "border point",
            IdentificationKind::Focus => "focus",
            IdentificationKind::NodeSymbol => "node symbol",
            IdentificationKind::FiberPoint => "fiber point",
            IdentificationKind::Voxel => "voxel",
        }
    }
}

/// Indices that locate an identified primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexTuple {
    /// A single index into a drawable (node, triangle).
    Single { model: usize, index: usize },
    /// File, item within the file, and sub-item (border point, focus, fiber point).
    Item {
        file: usize,
        item: usize,
        sub: usize,
    },
    /// A voxel of a volume layer.
    Voxel { layer: usize, ijk: [i64; 3] },
}

/// A decoded identification: what was drawn at a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identified {
    pub kind: IdentificationKind,
    pub indices: IndexTuple,
}

/// Encodes an id as a pick color.
#[must_use]
pub fn index_to_color(index: u32) -> [u8; 3] {
    [
        ((index >> 16) & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        (index & 0xFF) as u8,
    ]
}

/// Decodes a pick color back to an id.
#[must_use]
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// The per-pass color table.
///
/// Valid only within one identification pass; call [`Self::reset`] before
/// each pass.
#[derive(Debug, Clone, Default)]
pub struct ColorIdentification {
    entries: Vec<Identified>,
}

impl ColorIdentification {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every assigned color.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Number of ids assigned this pass.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigns the next id to `(kind, indices)` and returns its color.
    ///
    /// Once the 24-bit id space is exhausted the background color is
    /// returned, which makes the primitive unpickable for this pass.
    pub fn encode(&mut self, kind: IdentificationKind, indices: IndexTuple) -> [u8; 3] {
        let Ok(id) = u32::try_from(self.entries.len() + 1) else {
            return BACKGROUND_COLOR;
        };
        if id > MAX_IDENTIFICATION_ID {
            log::warn!("identification ids exhausted, {} not pickable", kind.name());
            return BACKGROUND_COLOR;
        }
        self.entries.push(Identified { kind, indices });
        index_to_color(id)
    }

    /// Convenience for RGBA targets: the encoded color with opaque alpha.
    pub fn encode_rgba(&mut self, kind: IdentificationKind, indices: IndexTuple) -> [u8; 4] {
        let [r, g, b] = self.encode(kind, indices);
        [r, g, b, 255]
    }

    /// Looks up the primitive drawn with `color`.
    ///
    /// Returns `None` for the background and for colors never assigned.
    #[must_use]
    pub fn decode(&self, color: [u8; 3]) -> Option<Identified> {
        let id = color_to_index(color[0], color[1], color[2]);
        if id == 0 {
            return None;
        }
        self.entries.get(id as usize - 1).copied()
    }
}
