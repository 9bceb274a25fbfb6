//! Layout descriptors and the canonical slot enumeration.
//!
//! The order produced by [`Layout::slots`] is the one canonical order:
//! hotbar rows first, then cross hotbar sets (left half before right half),
//! then expanded cross bars. The codec, the template builders, and every
//! positional index in an encoded string all refer to this order, so it
//! depends on nothing but the descriptor itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slots per keyboard hotbar row.
pub const HOTBAR_SLOTS: u8 = 12;
/// Slots per half of a cross hotbar set.
pub const CROSS_HALF_SLOTS: u8 = 8;
/// Slots per expanded (double-tap) cross bar.
pub const EXTRA_CROSS_SLOTS: u8 = 16;

/// Which bar arrangement a layout uses. Serialized as a small integer code
/// in URLs and stored records; unknown codes fall back to the default
/// arrangement rather than failing, so stale links keep opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Layout {
    /// Eight cross hotbar sets (gamepad).
    CrossHotbars,
    /// Ten keyboard hotbar rows.
    Hotbars,
    /// Eight keyboard rows plus one cross hotbar set.
    Hybrid,
    /// Eight cross hotbar sets plus both expanded cross bars.
    DualCross,
}

impl Layout {
    pub fn code(self) -> i64 {
        match self {
            Layout::CrossHotbars => 0,
            Layout::Hotbars => 1,
            Layout::Hybrid => 2,
            Layout::DualCross => 3,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Layout::CrossHotbars,
            1 => Layout::Hotbars,
            2 => Layout::Hybrid,
            3 => Layout::DualCross,
            _ => Layout::default(),
        }
    }

    pub fn hotbar_rows(self) -> u8 {
        match self {
            Layout::CrossHotbars | Layout::DualCross => 0,
            Layout::Hotbars => 10,
            Layout::Hybrid => 8,
        }
    }

    pub fn cross_sets(self) -> u8 {
        match self {
            Layout::CrossHotbars | Layout::DualCross => 8,
            Layout::Hotbars => 0,
            Layout::Hybrid => 1,
        }
    }

    pub fn extra_cross_bars(self) -> u8 {
        match self {
            Layout::DualCross => 2,
            _ => 0,
        }
    }

    /// Total addressable slots under this descriptor.
    pub fn slot_count(self) -> usize {
        self.hotbar_rows() as usize * HOTBAR_SLOTS as usize
            + self.cross_sets() as usize * CROSS_HALF_SLOTS as usize * 2
            + self.extra_cross_bars() as usize * EXTRA_CROSS_SLOTS as usize
    }

    /// Every slot of this layout, in canonical order.
    pub fn slots(self) -> impl Iterator<Item = Slot> {
        let hotbars = (0..self.hotbar_rows()).flat_map(|bar| {
            (0..HOTBAR_SLOTS).map(move |index| Slot {
                kind: BarKind::Hotbar,
                bar,
                index,
            })
        });
        let cross = (0..self.cross_sets()).flat_map(|bar| {
            let left = (0..CROSS_HALF_SLOTS).map(move |index| Slot {
                kind: BarKind::CrossLeft,
                bar,
                index,
            });
            let right = (0..CROSS_HALF_SLOTS).map(move |index| Slot {
                kind: BarKind::CrossRight,
                bar,
                index,
            });
            left.chain(right)
        });
        let extra = (0..self.extra_cross_bars()).flat_map(|bar| {
            (0..EXTRA_CROSS_SLOTS).map(move |index| Slot {
                kind: BarKind::ExtraCross,
                bar,
                index,
            })
        });
        hotbars.chain(cross).chain(extra)
    }

    /// The slot at a canonical position, or `None` past the end.
    pub fn slot_at(self, position: usize) -> Option<Slot> {
        let row = HOTBAR_SLOTS as usize;
        let set = CROSS_HALF_SLOTS as usize * 2;
        let extra = EXTRA_CROSS_SLOTS as usize;

        let hotbar_len = self.hotbar_rows() as usize * row;
        let cross_len = self.cross_sets() as usize * set;
        let extra_len = self.extra_cross_bars() as usize * extra;

        if position < hotbar_len {
            Some(Slot {
                kind: BarKind::Hotbar,
                bar: (position / row) as u8,
                index: (position % row) as u8,
            })
        } else if position < hotbar_len + cross_len {
            let rel = position - hotbar_len;
            let within = rel % set;
            let (kind, index) = if within < CROSS_HALF_SLOTS as usize {
                (BarKind::CrossLeft, within)
            } else {
                (BarKind::CrossRight, within - CROSS_HALF_SLOTS as usize)
            };
            Some(Slot {
                kind,
                bar: (rel / set) as u8,
                index: index as u8,
            })
        } else if position < hotbar_len + cross_len + extra_len {
            let rel = position - hotbar_len - cross_len;
            Some(Slot {
                kind: BarKind::ExtraCross,
                bar: (rel / extra) as u8,
                index: (rel % extra) as u8,
            })
        } else {
            None
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::CrossHotbars
    }
}

impl From<i64> for Layout {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<Layout> for i64 {
    fn from(layout: Layout) -> i64 {
        layout.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarKind {
    Hotbar,
    CrossLeft,
    CrossRight,
    ExtraCross,
}

impl BarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BarKind::Hotbar => "hotbar",
            BarKind::CrossLeft => "cross-left",
            BarKind::CrossRight => "cross-right",
            BarKind::ExtraCross => "extra-cross",
        }
    }
}

/// One slot identity: which kind of bar, which bar of that kind (zero
/// based), and the position within the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub kind: BarKind,
    pub bar: u8,
    pub index: u8,
}

impl Slot {
    /// Canonical position of this slot under `layout`, or `None` when the
    /// layout has no such bar or index.
    pub fn position(self, layout: Layout) -> Option<usize> {
        let row = HOTBAR_SLOTS as usize;
        let set = CROSS_HALF_SLOTS as usize * 2;
        let hotbar_len = layout.hotbar_rows() as usize * row;
        let cross_len = layout.cross_sets() as usize * set;

        match self.kind {
            BarKind::Hotbar => {
                if self.bar >= layout.hotbar_rows() || self.index >= HOTBAR_SLOTS {
                    return None;
                }
                Some(self.bar as usize * row + self.index as usize)
            }
            BarKind::CrossLeft | BarKind::CrossRight => {
                if self.bar >= layout.cross_sets() || self.index >= CROSS_HALF_SLOTS {
                    return None;
                }
                let half = if self.kind == BarKind::CrossRight {
                    CROSS_HALF_SLOTS as usize
                } else {
                    0
                };
                Some(hotbar_len + self.bar as usize * set + half + self.index as usize)
            }
            BarKind::ExtraCross => {
                if self.bar >= layout.extra_cross_bars() || self.index >= EXTRA_CROSS_SLOTS {
                    return None;
                }
                Some(hotbar_len + cross_len + self.bar as usize * EXTRA_CROSS_SLOTS as usize
                    + self.index as usize)
            }
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // One based, matching how the game numbers its bars.
        write!(f, "{}-{}-{}", self.kind.as_str(), self.bar + 1, self.index + 1)
    }
}

/// Compact URL form of a full assignment set. Opaque here; the grammar
/// lives in `crossbars_engine::codec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedSlots(String);

impl EncodedSlots {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncodedSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EncodedSlots {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
