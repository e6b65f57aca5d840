//! # Colored Squares
//!
//! Four kinds of square bouncing around a 240x160 screen:
//!
//! | Model    | Velocity     | Fields                        | Tiles     |
//! |----------|--------------|-------------------------------|-----------|
//! | red      | (+0.5, +0.5) | scale                         | 0         |
//! | blue     | (-0.5, +0.5) | angle, visible                | 1         |
//! | yellow   | (-0.5, -0.5) | scale, angle                  | 2         |
//! | flashing | (+0.5, -0.5) | scale, angle, animation       | 0..=2     |
//!
//! The entity manager reacts to the keypad:
//!
//! - **up**: spawn one square of each kind
//! - **right**: speed up every blue square (cached apply)
//! - **down**: destroy everything
//! - **left**: destroy squares rotated past a half turn (cached query)
//! - **R**: freeze yellow squares in the middle band (ad-hoc query)
//! - **L**: destroy the first blue square (ad-hoc apply), then every red one
//!
//! **A** cycles the scale of scaled squares, **B** toggles the sprites of
//! blue squares.

use std::rc::Rc;

use tracing::{debug, error, warn};

use tessera_core::{
    BoolField, CachedApply, CachedQuery, Entity, EntityProcessor, EntityTable, Fixed, FixedField,
    IntField, Layout, Model, PackedField, Processor, Requirement, Rows, Subscriber, TableConfig,
    TableContext, TableError, TableProcessor, TableResult, Tag,
};

use crate::keypad::{Button, Keypad};
use crate::sprite::Sprite;

/// Table layout of the scene.
pub struct Squares;

/// Most squares alive at once.
pub const MAX_SQUARES: usize = 128;

impl Layout for Squares {
    const ENTITIES: usize = MAX_SQUARES;
    const MODELS: usize = 4;
    const FIXED_FIELDS: usize = 4;
    const INT_FIELDS: usize = 2;
    type Handle = Sprite;
}

// =============================================================================
// Schema
// =============================================================================

/// Red square.
pub const RED: Model = Model::new(0);
/// Blue square.
pub const BLUE: Model = Model::new(1);
/// Yellow square.
pub const YELLOW: Model = Model::new(2);
/// Flashing square.
pub const FLASHING: Model = Model::new(3);

/// Every square model.
pub const MODELS: [Model; 4] = [RED, BLUE, YELLOW, FLASHING];

/// Horizontal position.
pub const X: FixedField = FixedField::new(0);
/// Vertical position.
pub const Y: FixedField = FixedField::new(1);
/// Horizontal velocity.
pub const VX: FixedField = FixedField::new(2);
/// Vertical velocity.
pub const VY: FixedField = FixedField::new(3);

/// Scale divisor, 1 to 3.
pub const SCALE: IntField = IntField::new(0);
/// Rotation in whole degrees.
pub const ANGLE: IntField = IntField::new(1);

/// Whether the sprite exists.
pub const VISIBLE: BoolField = BoolField::new(0);

/// Current animation frame.
pub const ANIM_CURR: PackedField = PackedField::new(0, 2);
/// First animation frame.
pub const ANIM_FIRST: PackedField = PackedField::new(2, 2);
/// Last animation frame.
pub const ANIM_LAST: PackedField = PackedField::new(4, 2);
/// Ticks left on the current frame.
pub const ANIM_TIMER: PackedField = PackedField::new(6, 4);

// =============================================================================
// Tags
// =============================================================================

/// Movement processor.
pub const MOVEMENT: Tag = Tag::new(0);
/// Rotation processor.
pub const ROTATION: Tag = Tag::new(1);
/// Scaling processor.
pub const SCALING: Tag = Tag::new(2);
/// Visibility processor.
pub const VISIBILITY: Tag = Tag::new(3);
/// Entity manager.
pub const ENTITY_MANAGER: Tag = Tag::new(4);
/// Animation processor.
pub const ANIMATION: Tag = Tag::new(5);
/// Squares rotated past 180 degrees.
pub const PAST_HALF_TURN: Tag = Tag::new(6);
/// Blue-square speed-up.
pub const BOOST_BLUE: Tag = Tag::new(7);

const BOUND_X: Fixed = Fixed::from_int(120);
const BOUND_Y: Fixed = Fixed::from_int(80);
const FREEZE_BAND: Fixed = Fixed::from_int(64);
const FRAME_TICKS: u32 = 10;
const HALF: Fixed = Fixed::from_ratio(1, 2);

/// Declares the fields of every square model.
pub fn declare(table: &mut EntityTable<Squares>) {
    for model in MODELS {
        for field in [X, Y, VX, VY] {
            table.declare_fixed(model, field);
        }
    }
    for model in [RED, YELLOW, FLASHING] {
        table.declare_int(model, SCALE);
    }
    for model in [BLUE, YELLOW, FLASHING] {
        table.declare_int(model, ANGLE);
    }
    table.declare_bool(BLUE, VISIBLE);
    for field in [ANIM_CURR, ANIM_FIRST, ANIM_LAST, ANIM_TIMER] {
        table.declare_packed(FLASHING, field);
    }
}

/// Builds the scene: schema, every processor, then `init`.
///
/// # Errors
///
/// Propagates registration errors.
pub fn build(config: TableConfig, keypad: &Rc<Keypad>) -> TableResult<EntityTable<Squares>> {
    let mut table = EntityTable::with_config(config);
    declare(&mut table);

    table.add_entity_processor(Movement)?;
    table.add_entity_processor(Rotation)?;
    table.add_entity_processor(Scaling {
        keypad: Rc::clone(keypad),
    })?;
    table.add_entity_processor(Visibility {
        keypad: Rc::clone(keypad),
    })?;
    table.add_table_processor(EntityManager {
        keypad: Rc::clone(keypad),
    })?;
    table.add_entity_processor(Animation)?;
    table.add_query(PastHalfTurn)?;
    table.add_apply(BoostBlue)?;

    table.init();
    debug!("Squares scene ready");
    Ok(table)
}

/// Live squares per model, in [`MODELS`] order.
#[must_use]
pub fn census(rows: &Rows<Squares>) -> [usize; 4] {
    let mut counts = [0; 4];
    for entity in rows.iter() {
        counts[rows.model(entity).index()] += 1;
    }
    counts
}

// =============================================================================
// Spawning
// =============================================================================

fn launch(rows: &mut Rows<Squares>, e: Entity, vx: Fixed, vy: Fixed, tiles: u32) {
    rows.set_fixed(e, VX, vx);
    rows.set_fixed(e, VY, vy);
    rows.set_handle(e, Sprite::with_tiles(tiles));
}

/// Initializes a red square.
pub fn red_square(rows: &mut Rows<Squares>, e: Entity) {
    launch(rows, e, HALF, HALF, 0);
    rows.set_int(e, SCALE, 1);
}

/// Initializes a blue square. Its sprite exists but it starts flagged
/// invisible, so the first **B** recreates it.
pub fn blue_square(rows: &mut Rows<Squares>, e: Entity) {
    launch(rows, e, -HALF, HALF, 1);
    rows.set_flag(e, VISIBLE, false);
}

/// Initializes a yellow square.
pub fn yellow_square(rows: &mut Rows<Squares>, e: Entity) {
    launch(rows, e, -HALF, -HALF, 2);
    rows.set_int(e, SCALE, 1);
}

/// Initializes a flashing square cycling through frames 0 to 2.
pub fn flashing_square(rows: &mut Rows<Squares>, e: Entity) {
    launch(rows, e, HALF, -HALF, 0);
    rows.set_int(e, SCALE, 1);
    rows.set_packed(e, ANIM_CURR, 0);
    rows.set_packed(e, ANIM_FIRST, 0);
    rows.set_packed(e, ANIM_LAST, 2);
    rows.set_packed(e, ANIM_TIMER, FRAME_TICKS);
}

/// Spawns one square of each kind.
///
/// # Errors
///
/// [`tessera_core::TableError::CapacityExceeded`] once the table fills up.
/// Squares spawned before that stay.
pub fn spawn_wave(table: &mut TableContext<'_, Squares>) -> TableResult<()> {
    table.spawn(RED, red_square)?;
    table.spawn(BLUE, blue_square)?;
    table.spawn(YELLOW, yellow_square)?;
    table.spawn(FLASHING, flashing_square)?;
    Ok(())
}

// =============================================================================
// Entity processors
// =============================================================================

/// Moves squares and bounces them off the screen edges.
pub struct Movement;

impl Processor<Squares> for Movement {
    fn tag(&self) -> Tag {
        MOVEMENT
    }
}

impl Subscriber<Squares> for Movement {
    fn requirement(&self) -> Requirement {
        Requirement::new().fixed(X).fixed(Y).fixed(VX).fixed(VY)
    }
}

/// Clamps a coordinate to `[-bound, bound]`, flipping the velocity on contact.
fn bounce(position: Fixed, velocity: Fixed, bound: Fixed) -> (Fixed, Fixed) {
    if position < -bound {
        (-bound, -velocity)
    } else if position > bound {
        (bound, -velocity)
    } else {
        (position, velocity)
    }
}

impl EntityProcessor<Squares> for Movement {
    fn update(&mut self, rows: &mut Rows<Squares>, e: Entity) {
        let (x, vx) = bounce(rows.fixed(e, X) + rows.fixed(e, VX), rows.fixed(e, VX), BOUND_X);
        let (y, vy) = bounce(rows.fixed(e, Y) + rows.fixed(e, VY), rows.fixed(e, VY), BOUND_Y);

        if let Some(sprite) = rows.handle_mut(e) {
            sprite.set_position(x, y);
        }

        rows.set_fixed(e, X, x);
        rows.set_fixed(e, Y, y);
        rows.set_fixed(e, VX, vx);
        rows.set_fixed(e, VY, vy);
    }
}

/// Turns squares one degree per tick.
pub struct Rotation;

impl Processor<Squares> for Rotation {
    fn tag(&self) -> Tag {
        ROTATION
    }
}

impl Subscriber<Squares> for Rotation {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(ANGLE)
    }
}

impl EntityProcessor<Squares> for Rotation {
    fn update(&mut self, rows: &mut Rows<Squares>, e: Entity) {
        let angle = (rows.int(e, ANGLE) + 1) % 360;
        rows.set_int(e, ANGLE, angle);
        if let Some(sprite) = rows.handle_mut(e) {
            sprite.set_rotation(angle);
        }
    }
}

/// Cycles the scale divisor on **A**.
pub struct Scaling {
    keypad: Rc<Keypad>,
}

impl Processor<Squares> for Scaling {
    fn tag(&self) -> Tag {
        SCALING
    }
}

impl Subscriber<Squares> for Scaling {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(SCALE)
    }
}

impl EntityProcessor<Squares> for Scaling {
    fn update(&mut self, rows: &mut Rows<Squares>, e: Entity) {
        let mut scale = rows.int(e, SCALE);
        if self.keypad.pressed(Button::A) {
            scale = if scale < 3 { scale + 1 } else { 1 };
            rows.set_int(e, SCALE, scale);
        }
        if let Some(sprite) = rows.handle_mut(e) {
            sprite.set_scale(Fixed::ONE / Fixed::from_int(scale.max(1)));
        }
    }
}

/// Drops or recreates the sprite of blue squares on **B**.
pub struct Visibility {
    keypad: Rc<Keypad>,
}

impl Processor<Squares> for Visibility {
    fn tag(&self) -> Tag {
        VISIBILITY
    }
}

impl Subscriber<Squares> for Visibility {
    fn requirement(&self) -> Requirement {
        Requirement::new().boolean(VISIBLE)
    }
}

impl EntityProcessor<Squares> for Visibility {
    fn update(&mut self, rows: &mut Rows<Squares>, e: Entity) {
        if !self.keypad.pressed(Button::B) {
            return;
        }
        if rows.flag(e, VISIBLE) {
            rows.take_handle(e);
            rows.set_flag(e, VISIBLE, false);
        } else {
            let mut sprite = Sprite::new(rows.fixed(e, X), rows.fixed(e, Y));
            sprite.set_tiles(1);
            rows.set_handle(e, sprite);
            rows.set_flag(e, VISIBLE, true);
        }
    }
}

/// Steps flashing squares through their frames every ten ticks.
pub struct Animation;

impl Processor<Squares> for Animation {
    fn tag(&self) -> Tag {
        ANIMATION
    }
}

impl Subscriber<Squares> for Animation {
    fn requirement(&self) -> Requirement {
        Requirement::new()
            .packed(ANIM_CURR)
            .packed(ANIM_FIRST)
            .packed(ANIM_LAST)
            .packed(ANIM_TIMER)
    }
}

impl EntityProcessor<Squares> for Animation {
    fn update(&mut self, rows: &mut Rows<Squares>, e: Entity) {
        let mut curr = rows.packed(e, ANIM_CURR);
        let mut timer = rows.packed(e, ANIM_TIMER);

        if timer > 0 {
            timer -= 1;
        } else {
            curr = if curr < rows.packed(e, ANIM_LAST) {
                curr + 1
            } else {
                rows.packed(e, ANIM_FIRST)
            };
            timer = FRAME_TICKS;
        }

        if timer == 0 {
            if let Some(sprite) = rows.handle_mut(e) {
                sprite.set_tiles(curr);
            }
        }

        rows.set_packed(e, ANIM_CURR, curr);
        rows.set_packed(e, ANIM_TIMER, timer);
    }
}

// =============================================================================
// Table processor
// =============================================================================

/// Spawns and destroys squares in response to the keypad.
pub struct EntityManager {
    keypad: Rc<Keypad>,
}

impl EntityManager {
    fn react(&self, table: &mut TableContext<'_, Squares>) -> TableResult<()> {
        let keypad = &*self.keypad;

        if keypad.pressed(Button::Up) {
            spawn_wave(table)?;
        } else if keypad.pressed(Button::Right) {
            table.apply(BOOST_BLUE)?;
        } else if keypad.pressed(Button::Down) {
            table.clear();
        } else if keypad.pressed(Button::Left) {
            let turned = table.query::<MAX_SQUARES>(PAST_HALF_TURN)?;
            for e in turned {
                table.destroy(e);
            }
        } else if keypad.pressed(Button::R) {
            let frozen = table.query_with::<MAX_SQUARES, _>(|rows, e| {
                let x = rows.fixed(e, X);
                rows.model(e) == YELLOW && x > -FREEZE_BAND && x < FREEZE_BAND
            })?;
            let rows = table.rows_mut();
            for e in frozen {
                rows.set_fixed(e, VX, Fixed::ZERO);
                rows.set_fixed(e, VY, Fixed::ZERO);
            }
        } else if keypad.pressed(Button::L) {
            table.apply_with(|rows, e| rows.model(e) == BLUE && rows.destroy_later(e));
            let reds = table.query_with::<MAX_SQUARES, _>(|rows, e| rows.model(e) == RED)?;
            for e in reds {
                table.destroy(e);
            }
        }
        Ok(())
    }
}

impl Processor<Squares> for EntityManager {
    fn tag(&self) -> Tag {
        ENTITY_MANAGER
    }
}

impl TableProcessor<Squares> for EntityManager {
    fn update(&mut self, table: &mut TableContext<'_, Squares>) {
        match self.react(table) {
            Ok(()) => {}
            Err(error @ TableError::CapacityExceeded { .. }) => {
                warn!("Entity manager at tick {}: {}", self.keypad.tick(), error);
            }
            // Anything else is a wiring mistake in `build`.
            Err(error) => {
                error!("Entity manager at tick {}: {}", self.keypad.tick(), error);
                if cfg!(debug_assertions) {
                    panic!("entity manager misconfigured: {error}");
                }
            }
        }
    }
}

// =============================================================================
// Cached query and apply
// =============================================================================

/// Rotating squares whose angle is past 180 degrees.
pub struct PastHalfTurn;

impl Processor<Squares> for PastHalfTurn {
    fn tag(&self) -> Tag {
        PAST_HALF_TURN
    }
}

impl Subscriber<Squares> for PastHalfTurn {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(ANGLE)
    }
}

impl CachedQuery<Squares> for PastHalfTurn {
    fn filter(&self, rows: &Rows<Squares>, e: Entity) -> bool {
        rows.int(e, ANGLE) > 180
    }
}

/// Adds one unit of speed to both axes of every blue square. Never stops
/// early.
pub struct BoostBlue;

impl Processor<Squares> for BoostBlue {
    fn tag(&self) -> Tag {
        BOOST_BLUE
    }
}

impl Subscriber<Squares> for BoostBlue {
    fn requirement(&self) -> Requirement {
        Requirement::new().model(BLUE).fixed(VX).fixed(VY)
    }
}

fn faster(velocity: Fixed) -> Fixed {
    if velocity > Fixed::ZERO {
        velocity + Fixed::ONE
    } else {
        velocity - Fixed::ONE
    }
}

impl CachedApply<Squares> for BoostBlue {
    fn apply(&mut self, rows: &mut Rows<Squares>, e: Entity) -> bool {
        let vx = faster(rows.fixed(e, VX));
        let vy = faster(rows.fixed(e, VY));
        rows.set_fixed(e, VX, vx);
        rows.set_fixed(e, VY, vy);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::ScriptedPress;

    #[test]
    fn test_bounce() {
        let v = Fixed::ONE;
        assert_eq!(bounce(Fixed::from_int(10), v, BOUND_X), (Fixed::from_int(10), v));
        assert_eq!(bounce(Fixed::from_int(121), v, BOUND_X), (BOUND_X, -v));
        assert_eq!(bounce(Fixed::from_int(-81), -v, BOUND_Y), (-BOUND_Y, v));
    }

    #[test]
    fn test_faster_moves_away_from_zero() {
        assert_eq!(faster(HALF), Fixed::from_ratio(3, 2));
        assert_eq!(faster(-HALF), Fixed::from_ratio(-3, 2));
        assert_eq!(faster(Fixed::ZERO), -Fixed::ONE);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "entity manager misconfigured")]
    fn test_unregistered_query_is_a_bug() {
        let keypad = Rc::new(Keypad::new(vec![ScriptedPress {
            tick: 0,
            button: Button::Left,
        }]));
        let mut table = EntityTable::<Squares>::new();
        declare(&mut table);
        table
            .add_table_processor(EntityManager {
                keypad: Rc::clone(&keypad),
            })
            .unwrap();
        table.update();
    }

    #[test]
    fn test_schema_per_model() {
        let mut table = EntityTable::<Squares>::new();
        declare(&mut table);
        let rows = table.rows();

        assert!(rows.int_store().has(RED, SCALE));
        assert!(!rows.int_store().has(RED, ANGLE));
        assert!(rows.bool_store().has(BLUE, VISIBLE));
        assert!(!rows.bool_store().has(YELLOW, VISIBLE));
        assert!(rows.packed_store().has(FLASHING, ANIM_TIMER));
        assert!(!rows.packed_store().has(RED, ANIM_TIMER));
    }
}
