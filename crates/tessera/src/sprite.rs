//! # Headless Sprite
//!
//! The presentation handle the scenes store in the handle column. It keeps
//! the last values a renderer would have been told, so runs can be checked
//! without a screen.

use tessera_core::Fixed;

/// A sprite that records position, rotation, scale and tile index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    x: Fixed,
    y: Fixed,
    rotation: i32,
    scale: Fixed,
    tiles: u32,
}

impl Sprite {
    /// Creates a sprite at a position, showing tile 0 at scale 1.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self {
            x,
            y,
            rotation: 0,
            scale: Fixed::ONE,
            tiles: 0,
        }
    }

    /// Creates a sprite at the origin showing `tiles`.
    #[must_use]
    pub const fn with_tiles(tiles: u32) -> Self {
        let mut sprite = Self::new(Fixed::ZERO, Fixed::ZERO);
        sprite.tiles = tiles;
        sprite
    }

    /// Horizontal position.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> Fixed {
        self.x
    }

    /// Vertical position.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> Fixed {
        self.y
    }

    /// Rotation in whole degrees.
    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Scale factor.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> Fixed {
        self.scale
    }

    /// Tile index currently shown.
    #[inline]
    #[must_use]
    pub const fn tiles(&self) -> u32 {
        self.tiles
    }

    /// Moves the sprite.
    #[inline]
    pub fn set_position(&mut self, x: Fixed, y: Fixed) {
        self.x = x;
        self.y = y;
    }

    /// Rotates the sprite.
    #[inline]
    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = degrees;
    }

    /// Scales the sprite.
    #[inline]
    pub fn set_scale(&mut self, scale: Fixed) {
        self.scale = scale;
    }

    /// Switches the tile index.
    #[inline]
    pub fn set_tiles(&mut self, tiles: u32) {
        self.tiles = tiles;
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new(Fixed::ZERO, Fixed::ZERO)
    }
}
