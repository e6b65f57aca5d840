//! # Tiny Galaxy
//!
//! A black hole with eight solar systems around it. Each star carries three
//! planets, some planets a moon. Positions are stored relative to the parent
//! body; the scene graph processor resolves the absolute position of every
//! body through the parent hierarchy and moves its sprite there.

use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use tessera_core::{
    Entity, EntityProcessor, EntityTable, Fixed, FixedField, Hierarchy, Layout, Model,
    PackedField, Processor, Requirement, Rows, Subscriber, TableConfig, TableContext,
    TableProcessor, TableResult, Tag,
};

use crate::sprite::Sprite;

/// Table layout of the scene.
pub struct Galaxy;

impl Layout for Galaxy {
    const ENTITIES: usize = 128;
    const MODELS: usize = 4;
    const FIXED_FIELDS: usize = 5;
    const INT_FIELDS: usize = 0;
    type Handle = Sprite;
}

/// The root body.
pub const BLACK_HOLE: Model = Model::new(0);
/// Orbits the black hole.
pub const STAR: Model = Model::new(1);
/// Orbits a star.
pub const PLANET: Model = Model::new(2);
/// Orbits a planet.
pub const MOON: Model = Model::new(3);

/// Horizontal position, relative to the parent.
pub const X: FixedField = FixedField::new(0);
/// Vertical position, relative to the parent.
pub const Y: FixedField = FixedField::new(1);
/// Orbit radius.
pub const DISTANCE: FixedField = FixedField::new(2);
/// Orbit angle in degrees.
pub const ANGLE: FixedField = FixedField::new(3);
/// Degrees per tick.
pub const VANGULAR: FixedField = FixedField::new(4);

/// Id of the parent body.
pub const PARENT: PackedField = PackedField::new(0, 8);

/// Orbit processor.
pub const ORBIT: Tag = Tag::new(0);
/// Scene graph processor.
pub const SCENEGRAPH: Tag = Tag::new(1);
/// Background scroller.
pub const BACKGROUND: Tag = Tag::new(2);

const SYSTEMS: i32 = 8;
const PLANETS_PER_STAR: i32 = 3;
const MOON_PERCENT: u32 = 40;
const FULL_TURN: Fixed = Fixed::from_int(360);

/// Declares the fields of every body model.
pub fn declare(table: &mut EntityTable<Galaxy>) {
    table.declare_fixed(BLACK_HOLE, X);
    table.declare_fixed(BLACK_HOLE, Y);
    for model in [STAR, PLANET, MOON] {
        for field in [X, Y, DISTANCE, ANGLE, VANGULAR] {
            table.declare_fixed(model, field);
        }
        table.declare_packed(model, PARENT);
    }
}

/// Builds the scene: schema, processors, then `init`.
///
/// # Errors
///
/// Propagates registration errors.
pub fn build(config: TableConfig, backdrop: &Rc<Backdrop>) -> TableResult<EntityTable<Galaxy>> {
    let hierarchy = Hierarchy::from_config(PARENT, &config);
    let mut table = EntityTable::with_config(config);
    declare(&mut table);

    table.add_entity_processor(Orbit)?;
    table.add_entity_processor(SceneGraph { hierarchy })?;
    table.add_table_processor(ScrollBackground {
        backdrop: Rc::clone(backdrop),
    })?;

    table.init();
    debug!("Galaxy scene ready");
    Ok(table)
}

// =============================================================================
// Spawning
// =============================================================================

fn body(rows: &mut Rows<Galaxy>, e: Entity, parent: Entity, distance: Fixed, angle: Fixed) {
    rows.set_fixed(e, DISTANCE, distance);
    rows.set_fixed(e, ANGLE, angle);
    rows.set_packed(e, PARENT, parent.raw());
}

fn random_fixed(rng: &mut ChaCha8Rng, low: i32, high: i32) -> Fixed {
    let span = Fixed::from_int(high - low).raw();
    Fixed::from_int(low) + Fixed::from_raw(rng.gen_range(0..span))
}

/// Spawns a black hole at `(x, y)` and eight solar systems around it.
///
/// # Errors
///
/// [`tessera_core::TableError::CapacityExceeded`] if the galaxy does not fit.
pub fn galaxy(
    table: &mut EntityTable<Galaxy>,
    rng: &mut ChaCha8Rng,
    x: Fixed,
    y: Fixed,
) -> TableResult<Entity> {
    let black_hole = table.spawn(BLACK_HOLE, |rows, e| {
        rows.set_fixed(e, X, x);
        rows.set_fixed(e, Y, y);
        rows.set_handle(e, Sprite::new(x, y));
    })?;

    for system in 0..SYSTEMS {
        solar_system(table, rng, black_hole, Fixed::from_int(360 / SYSTEMS * system))?;
    }
    debug!("Galaxy spawned: {} bodies", table.size());
    Ok(black_hole)
}

/// Spawns a star at a random distance from `parent`, with its planets.
///
/// # Errors
///
/// [`tessera_core::TableError::CapacityExceeded`] if the system does not fit.
pub fn solar_system(
    table: &mut EntityTable<Galaxy>,
    rng: &mut ChaCha8Rng,
    parent: Entity,
    angle: Fixed,
) -> TableResult<Entity> {
    let distance = random_fixed(rng, 48, 120);
    let scale = Fixed::ONE / Fixed::from_int(rng.gen_range(1..3));
    let star = table.spawn(STAR, |rows, e| {
        body(rows, e, parent, distance, angle);
        rows.set_fixed(e, VANGULAR, Fixed::from_ratio(1, 10));
        let mut sprite = Sprite::default();
        sprite.set_scale(scale);
        rows.set_handle(e, sprite);
    })?;

    for index in 0..PLANETS_PER_STAR {
        planet(table, rng, star, Fixed::from_int(360 / PLANETS_PER_STAR * index))?;
    }
    Ok(star)
}

/// Spawns a planet around `parent`, sometimes with a moon. The planet
/// inherits the scale of its star.
///
/// # Errors
///
/// [`tessera_core::TableError::CapacityExceeded`] if the planet does not fit.
pub fn planet(
    table: &mut EntityTable<Galaxy>,
    rng: &mut ChaCha8Rng,
    parent: Entity,
    angle: Fixed,
) -> TableResult<Entity> {
    let distance = random_fixed(rng, 8, 16);
    let scale = table.handle(parent).map_or(Fixed::ONE, Sprite::scale);
    let planet = table.spawn(PLANET, |rows, e| {
        body(rows, e, parent, distance, angle);
        rows.set_fixed(e, VANGULAR, Fixed::from_int(16) / distance);
        let mut sprite = Sprite::default();
        sprite.set_scale(scale);
        rows.set_handle(e, sprite);
    })?;

    if rng.gen_range(0..100) < MOON_PERCENT {
        moon(table, planet, Fixed::from_int(30))?;
    }
    Ok(planet)
}

/// Spawns a moon circling `parent` backwards.
///
/// # Errors
///
/// [`tessera_core::TableError::CapacityExceeded`] if the table is full.
pub fn moon(table: &mut EntityTable<Galaxy>, parent: Entity, angle: Fixed) -> TableResult<Entity> {
    table.spawn(MOON, |rows, e| {
        body(rows, e, parent, Fixed::from_int(3), angle);
        rows.set_fixed(e, VANGULAR, -Fixed::ONE);
        rows.set_handle(e, Sprite::default());
    })
}

// =============================================================================
// Processors
// =============================================================================

/// Advances each body along its orbit around the parent.
pub struct Orbit;

impl Processor<Galaxy> for Orbit {
    fn tag(&self) -> Tag {
        ORBIT
    }
}

impl Subscriber<Galaxy> for Orbit {
    fn requirement(&self) -> Requirement {
        Requirement::new().fixed(ANGLE).fixed(VANGULAR).fixed(DISTANCE)
    }
}

/// Wraps an angle into `[0, 360)`.
fn wrap_degrees(angle: Fixed) -> Fixed {
    if angle >= FULL_TURN {
        angle - FULL_TURN
    } else if angle < Fixed::ZERO {
        angle + FULL_TURN
    } else {
        angle
    }
}

impl EntityProcessor<Galaxy> for Orbit {
    fn update(&mut self, rows: &mut Rows<Galaxy>, e: Entity) {
        let angle = wrap_degrees(rows.fixed(e, ANGLE) + rows.fixed(e, VANGULAR));
        let distance = rows.fixed(e, DISTANCE).to_f32();
        let (sin, cos) = angle.to_f32().to_radians().sin_cos();

        rows.set_fixed(e, X, Fixed::from_f32(distance * cos));
        rows.set_fixed(e, Y, Fixed::from_f32(distance * sin));
        rows.set_fixed(e, ANGLE, angle);
    }
}

/// Moves each body's sprite to its absolute position.
pub struct SceneGraph {
    hierarchy: Hierarchy,
}

impl Processor<Galaxy> for SceneGraph {
    fn tag(&self) -> Tag {
        SCENEGRAPH
    }
}

impl Subscriber<Galaxy> for SceneGraph {
    fn requirement(&self) -> Requirement {
        Requirement::new().fixed(X).fixed(Y).packed(PARENT)
    }
}

impl EntityProcessor<Galaxy> for SceneGraph {
    fn update(&mut self, rows: &mut Rows<Galaxy>, e: Entity) {
        match self.hierarchy.accumulate(rows, e, [X, Y]) {
            Ok([x, y]) => {
                if let Some(sprite) = rows.handle_mut(e) {
                    sprite.set_position(x, y);
                }
            }
            Err(error) => warn!("Scene graph: {}", error),
        }
    }
}

/// Scroll offset of the backdrop, shared with whoever draws it.
#[derive(Debug, Default)]
pub struct Backdrop {
    x: Cell<Fixed>,
    y: Cell<Fixed>,
}

impl Backdrop {
    /// Current offset.
    #[must_use]
    pub fn offset(&self) -> (Fixed, Fixed) {
        (self.x.get(), self.y.get())
    }
}

/// Drifts the backdrop a little every tick.
pub struct ScrollBackground {
    backdrop: Rc<Backdrop>,
}

impl Processor<Galaxy> for ScrollBackground {
    fn tag(&self) -> Tag {
        BACKGROUND
    }
}

impl TableProcessor<Galaxy> for ScrollBackground {
    fn update(&mut self, _table: &mut TableContext<'_, Galaxy>) {
        let (x, y) = self.backdrop.offset();
        self.backdrop.x.set(x - Fixed::from_ratio(1, 40));
        self.backdrop.y.set(y + Fixed::from_ratio(1, 20));
    }
}
