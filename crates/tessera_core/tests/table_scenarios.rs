//! End-to-end behaviour of the entity table: identity recycling,
//! subscriptions, the tick, queries and applies.

#![allow(missing_docs)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tessera_core::{
    BoolField, CachedApply, CachedQuery, DestroyMode, Entity, EntityProcessor, EntityTable,
    Fixed, FixedField, IntField, Layout, Model, PackedField, Processor, ProcessorKind,
    Requirement, Rows, Subscriber, TableConfig, TableContext, TableError, TableProcessor, Tag,
};

// =============================================================================
// Layouts and schema
// =============================================================================

struct Four;

impl Layout for Four {
    const ENTITIES: usize = 4;
    const MODELS: usize = 1;
    const FIXED_FIELDS: usize = 0;
    const INT_FIELDS: usize = 0;
    type Handle = ();
}

struct Board;

impl Layout for Board {
    const ENTITIES: usize = 32;
    const MODELS: usize = 3;
    const FIXED_FIELDS: usize = 2;
    const INT_FIELDS: usize = 2;
    type Handle = Rc<()>;
}

const SQUARE: Model = Model::new(0);
const MARKER: Model = Model::new(1);
const SPINNER: Model = Model::new(2);

const X: FixedField = FixedField::new(0);
const VX: FixedField = FixedField::new(1);
const ANGLE: IntField = IntField::new(0);
const HITS: IntField = IntField::new(1);
const VISIBLE: BoolField = BoolField::new(0);
const TIMER: PackedField = PackedField::new(4, 3);

fn board() -> EntityTable<Board> {
    let mut table = EntityTable::new();
    table.declare_bool(SQUARE, VISIBLE);
    table.declare_int(SQUARE, ANGLE);
    table.declare_int(SQUARE, HITS);
    table.declare_fixed(SQUARE, X);
    table.declare_fixed(SQUARE, VX);
    table.declare_packed(SQUARE, TIMER);
    table.declare_bool(MARKER, VISIBLE);
    table.declare_int(MARKER, HITS);
    table.declare_int(SPINNER, ANGLE);
    table
}

// =============================================================================
// Test processors
// =============================================================================

/// Records every visit; optionally dooms the next id.
struct Recorder {
    tag: Tag,
    requirement: Requirement,
    seen: Rc<RefCell<Vec<Entity>>>,
    doom_next: bool,
}

impl Recorder {
    fn new(tag: u16, requirement: Requirement) -> (Self, Rc<RefCell<Vec<Entity>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = Self {
            tag: Tag::new(tag),
            requirement,
            seen: Rc::clone(&seen),
            doom_next: false,
        };
        (recorder, seen)
    }
}

impl Processor<Board> for Recorder {
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl Subscriber<Board> for Recorder {
    fn requirement(&self) -> Requirement {
        self.requirement
    }
}

impl EntityProcessor<Board> for Recorder {
    fn update(&mut self, rows: &mut Rows<Board>, entity: Entity) {
        self.seen.borrow_mut().push(entity);
        if self.doom_next {
            rows.destroy_later(Entity::new(entity.raw() + 1));
        }
    }
}

/// Rotating squares past half a turn.
struct PastHalfTurn;

impl Processor<Board> for PastHalfTurn {
    fn tag(&self) -> Tag {
        Tag::new(10)
    }
}

impl Subscriber<Board> for PastHalfTurn {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(ANGLE).model(SQUARE)
    }
}

impl CachedQuery<Board> for PastHalfTurn {
    fn filter(&self, rows: &Rows<Board>, entity: Entity) -> bool {
        rows.int(entity, ANGLE) > 180
    }
}

/// Counts hits on the first entity whose counter is below a limit.
struct HitFirstBelow {
    limit: i32,
    visits: Rc<Cell<usize>>,
}

impl Processor<Board> for HitFirstBelow {
    fn tag(&self) -> Tag {
        Tag::new(20)
    }
}

impl Subscriber<Board> for HitFirstBelow {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(HITS)
    }
}

impl CachedApply<Board> for HitFirstBelow {
    fn apply(&mut self, rows: &mut Rows<Board>, entity: Entity) -> bool {
        self.visits.set(self.visits.get() + 1);
        let hits = rows.int(entity, HITS);
        if hits < self.limit {
            rows.set_int(entity, HITS, hits + 1);
            true
        } else {
            false
        }
    }
}

/// Spawns one square per tick and destroys the given victim once.
struct Manager {
    victim: Option<Entity>,
    still_live_after_destroy: Rc<Cell<Option<bool>>>,
}

impl Processor<Board> for Manager {
    fn tag(&self) -> Tag {
        Tag::new(30)
    }
}

impl TableProcessor<Board> for Manager {
    fn update(&mut self, table: &mut TableContext<'_, Board>) {
        table
            .spawn(SQUARE, |rows, e| rows.set_int(e, ANGLE, 90))
            .unwrap();
        if let Some(victim) = self.victim.take() {
            assert!(table.destroy(victim));
            self.still_live_after_destroy
                .set(Some(table.rows().contains(victim)));
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn freed_ids_are_reused_lifo() {
    let mut table = EntityTable::<Four>::new();
    let ids: Vec<usize> = (0..4).map(|_| table.create(SQUARE).unwrap().index()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert!(table.full());
    assert_eq!(
        table.create(SQUARE),
        Err(TableError::CapacityExceeded { capacity: 4 })
    );

    assert!(table.destroy(Entity::new(1)));
    assert_eq!(table.create(SQUARE).unwrap(), Entity::new(1));

    assert!(table.destroy(Entity::new(3)));
    assert!(table.destroy(Entity::new(0)));
    assert_eq!(table.create(SQUARE).unwrap(), Entity::new(0));
    assert_eq!(table.create(SQUARE).unwrap(), Entity::new(3));
}

#[test]
fn ids_stay_unique_under_churn() {
    let mut table = board();
    let mut live: Vec<Entity> = Vec::new();
    for step in 0..200u32 {
        if step % 3 == 2 && !live.is_empty() {
            let victim = live.remove((step as usize * 7) % live.len());
            assert!(table.destroy(victim));
        } else if !table.full() {
            let e = table.create(MARKER).unwrap();
            assert!(e.index() < Board::ENTITIES);
            assert!(!live.contains(&e), "id {e} issued twice");
            live.push(e);
        }
        assert_eq!(table.size(), live.len());
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

#[test]
fn requirement_selects_models() {
    let mut table = board();
    let (recorder, _) = Recorder::new(1, Requirement::new().int(ANGLE));
    table.add_entity_processor(recorder).unwrap();

    let square = table.create(SQUARE).unwrap();
    let marker = table.create(MARKER).unwrap();
    assert!(table.is_subscribed(Tag::new(1), square).unwrap());
    assert!(!table.is_subscribed(Tag::new(1), marker).unwrap());
}

#[test]
fn destroy_clears_every_subscription() {
    let mut table = board();
    let (a, _) = Recorder::new(1, Requirement::ANY);
    let (b, _) = Recorder::new(2, Requirement::new().boolean(VISIBLE));
    table.add_entity_processor(a).unwrap();
    table.add_entity_processor(b).unwrap();
    table.add_query(PastHalfTurn).unwrap();

    let e = table.create(SQUARE).unwrap();
    for tag in [1, 2, 10] {
        assert!(table.is_subscribed(Tag::new(tag), e).unwrap());
    }
    table.destroy(e);
    for tag in [1, 2, 10] {
        assert!(!table.is_subscribed(Tag::new(tag), e).unwrap());
    }

    // A recycled id is evaluated afresh against its new model.
    let again = table.create(SPINNER).unwrap();
    assert_eq!(again, e);
    assert!(table.is_subscribed(Tag::new(1), again).unwrap());
    assert!(!table.is_subscribed(Tag::new(2), again).unwrap());
    assert!(!table.is_subscribed(Tag::new(10), again).unwrap());
}

#[test]
fn late_registration_sees_existing_entities() {
    let mut table = board();
    let square = table.create(SQUARE).unwrap();
    let spinner = table.create(SPINNER).unwrap();

    let (recorder, seen) = Recorder::new(1, Requirement::new().int(ANGLE));
    table.add_entity_processor(recorder).unwrap();
    table.update();
    assert_eq!(*seen.borrow(), vec![square, spinner]);
}

/// Selects on a field value rather than the schema.
struct Fast;

impl Processor<Board> for Fast {
    fn tag(&self) -> Tag {
        Tag::new(3)
    }
}

impl Subscriber<Board> for Fast {
    fn select(&self, rows: &Rows<Board>, entity: Entity) -> bool {
        rows.satisfies(entity, &Requirement::new().fixed(VX))
            && rows.fixed(entity, VX) > Fixed::from_int(2)
    }
}

impl EntityProcessor<Board> for Fast {
    fn update(&mut self, rows: &mut Rows<Board>, entity: Entity) {
        let x = rows.fixed(entity, X) + rows.fixed(entity, VX);
        rows.set_fixed(entity, X, x);
    }
}

#[test]
fn spawn_writes_fields_before_subscribing() {
    let mut table = board();
    table.add_entity_processor(Fast).unwrap();

    let slow = table.create(SQUARE).unwrap();
    let fast = table
        .spawn(SQUARE, |rows, e| rows.set_fixed(e, VX, Fixed::from_int(3)))
        .unwrap();
    assert!(!table.is_subscribed(Tag::new(3), slow).unwrap());
    assert!(table.is_subscribed(Tag::new(3), fast).unwrap());

    table.set_fixed(slow, VX, Fixed::from_int(5));
    assert!(!table.is_subscribed(Tag::new(3), slow).unwrap());
    table.resubscribe(slow);
    assert!(table.is_subscribed(Tag::new(3), slow).unwrap());

    table.update();
    assert_eq!(table.fixed(fast, X), Fixed::from_int(3));
    assert_eq!(table.fixed(slow, X), Fixed::from_int(5));
}

// =============================================================================
// Fields
// =============================================================================

#[test]
fn field_writes_are_isolated() {
    let mut table = board();
    let a = table.create(SQUARE).unwrap();
    let b = table.create(SQUARE).unwrap();

    table.set_int(a, ANGLE, 45);
    table.set_fixed(a, X, Fixed::from_int(-7));
    table.set_flag(a, VISIBLE, true);

    assert_eq!(table.int(a, HITS), 0);
    assert_eq!(table.fixed(a, VX), Fixed::ZERO);
    assert_eq!(table.int(b, ANGLE), 0);
    assert_eq!(table.fixed(b, X), Fixed::ZERO);
    assert!(!table.flag(b, VISIBLE));
    assert_eq!(table.int(a, ANGLE), 45);
}

#[test]
fn packed_write_keeps_neighbour_bits() {
    let mut table = board();
    let e = table.create(SQUARE).unwrap();

    table.set_packed(e, TIMER, 5);
    assert_eq!(table.packed(e, TIMER), 5);

    let word = table.rows().packed_store().word(e);
    table.set_packed(e, TIMER, 0);
    let after = table.rows().packed_store().word(e);
    assert_eq!(after & !TIMER.mask(), word & !TIMER.mask());
    assert_eq!(table.packed(e, TIMER), 0);
}

#[test]
fn destroy_drops_handle() {
    let mut table = board();
    let sprite = Rc::new(());
    let e = table.create(SQUARE).unwrap();
    table.set_handle(e, Rc::clone(&sprite));
    assert_eq!(Rc::strong_count(&sprite), 2);
    table.destroy(e);
    assert_eq!(Rc::strong_count(&sprite), 1);
}

// =============================================================================
// Tick
// =============================================================================

#[test]
fn update_visits_ascending_and_defers_destruction() {
    let mut table = board();
    let (mut recorder, seen) = Recorder::new(1, Requirement::ANY);
    recorder.doom_next = true;
    table.add_entity_processor(recorder).unwrap();
    let (after, seen_after) = Recorder::new(2, Requirement::ANY);
    table.add_entity_processor(after).unwrap();

    for _ in 0..6 {
        table.create(MARKER).unwrap();
    }
    table.init();
    table.update();

    let ids = |v: &Vec<Entity>| v.iter().map(|e| e.index()).collect::<Vec<_>>();
    assert_eq!(ids(&seen.borrow()), vec![0, 2, 4]);
    assert_eq!(ids(&seen_after.borrow()), vec![0, 2, 4]);
    assert_eq!(table.size(), 3);
    assert!(!table.contains(Entity::new(5)));
}

#[test]
fn inactive_processor_keeps_subscriptions() {
    let mut table = board();
    let (recorder, seen) = Recorder::new(1, Requirement::ANY);
    table.add_entity_processor(recorder).unwrap();
    let a = table.create(MARKER).unwrap();

    table.deactivate(Tag::new(1)).unwrap();
    assert!(!table.is_active(Tag::new(1)).unwrap());
    let b = table.create(MARKER).unwrap();
    table.update();
    assert!(seen.borrow().is_empty());
    assert!(table.is_subscribed(Tag::new(1), b).unwrap());

    table.activate(Tag::new(1)).unwrap();
    table.update();
    assert_eq!(*seen.borrow(), vec![a, b]);
}

#[test]
fn table_processor_runs_first_and_spawns_into_same_tick() {
    let mut table = board();
    let flag = Rc::new(Cell::new(None));
    table
        .add_table_processor(Manager {
            victim: None,
            still_live_after_destroy: Rc::clone(&flag),
        })
        .unwrap();
    let (recorder, seen) = Recorder::new(1, Requirement::new().int(ANGLE));
    table.add_entity_processor(recorder).unwrap();

    table.update();
    assert_eq!(table.size(), 1);
    assert_eq!(*seen.borrow(), vec![Entity::new(0)]);
    assert_eq!(table.int(Entity::new(0), ANGLE), 90);
}

fn destroy_in_mode(mode: DestroyMode) -> bool {
    let config = TableConfig {
        destroy_mode: mode,
        ..TableConfig::default()
    };
    let mut table = EntityTable::<Board>::with_config(config);
    table.declare_int(SQUARE, ANGLE);
    let victim = table.create(SQUARE).unwrap();
    let flag = Rc::new(Cell::new(None));
    table
        .add_table_processor(Manager {
            victim: Some(victim),
            still_live_after_destroy: Rc::clone(&flag),
        })
        .unwrap();
    table.update();
    assert!(!table.contains(victim));
    flag.get().unwrap()
}

#[test]
fn destroy_mode_controls_table_processor_destroys() {
    assert!(destroy_in_mode(DestroyMode::Deferred));
    assert!(!destroy_in_mode(DestroyMode::Immediate));
}

struct Counted {
    inits: Rc<Cell<usize>>,
}

impl Processor<Board> for Counted {
    fn tag(&self) -> Tag {
        Tag::new(40)
    }

    fn init(&mut self, _rows: &mut Rows<Board>) {
        self.inits.set(self.inits.get() + 1);
    }
}

impl TableProcessor<Board> for Counted {
    fn update(&mut self, _table: &mut TableContext<'_, Board>) {}
}

#[test]
fn init_runs_once() {
    let mut table = board();
    let inits = Rc::new(Cell::new(0));
    table
        .add_table_processor(Counted {
            inits: Rc::clone(&inits),
        })
        .unwrap();

    table.update();
    table.init();
    table.update();
    assert_eq!(inits.get(), 1);
}

/// Counts its own ticks; optionally pauses a tag and keeps the outcome.
struct Ticker {
    ticks: Rc<Cell<usize>>,
    pause: Option<Tag>,
    paused: Rc<Cell<Option<bool>>>,
}

impl Ticker {
    fn new(pause: Option<Tag>) -> (Self, Rc<Cell<usize>>, Rc<Cell<Option<bool>>>) {
        let ticks = Rc::new(Cell::new(0));
        let paused = Rc::new(Cell::new(None));
        let ticker = Self {
            ticks: Rc::clone(&ticks),
            pause,
            paused: Rc::clone(&paused),
        };
        (ticker, ticks, paused)
    }
}

impl Processor<Board> for Ticker {
    fn tag(&self) -> Tag {
        Tag::new(50)
    }
}

impl TableProcessor<Board> for Ticker {
    fn update(&mut self, table: &mut TableContext<'_, Board>) {
        self.ticks.set(self.ticks.get() + 1);
        if let Some(tag) = self.pause {
            self.paused.set(Some(table.deactivate(tag).is_ok()));
        }
    }
}

#[test]
fn inactive_table_processor_is_skipped() {
    let mut table = board();
    let (ticker, ticks, _) = Ticker::new(None);
    table.add_table_processor(ticker).unwrap();

    table.update();
    assert_eq!(ticks.get(), 1);

    table.deactivate(Tag::new(50)).unwrap();
    assert!(!table.is_active(Tag::new(50)).unwrap());
    table.update();
    table.update();
    assert_eq!(ticks.get(), 1);

    table.activate(Tag::new(50)).unwrap();
    table.update();
    assert_eq!(ticks.get(), 2);
}

#[test]
fn table_processors_are_not_toggled_from_inside_a_tick() {
    let mut table = board();
    let (ticker, ticks, paused) = Ticker::new(Some(Tag::new(50)));
    table.add_table_processor(ticker).unwrap();

    table.update();
    table.update();
    assert_eq!(paused.get(), Some(false));
    assert_eq!(ticks.get(), 2);
    assert!(table.is_active(Tag::new(50)).unwrap());
}

#[test]
fn table_processor_pauses_entity_processor_in_same_tick() {
    let mut table = board();
    let (ticker, ticks, paused) = Ticker::new(Some(Tag::new(1)));
    table.add_table_processor(ticker).unwrap();
    let (recorder, seen) = Recorder::new(1, Requirement::ANY);
    table.add_entity_processor(recorder).unwrap();
    let e = table.create(MARKER).unwrap();

    table.update();
    assert_eq!(ticks.get(), 1);
    assert_eq!(paused.get(), Some(true));
    assert!(seen.borrow().is_empty());
    assert!(!table.is_active(Tag::new(1)).unwrap());
    assert!(table.is_subscribed(Tag::new(1), e).unwrap());
}

// =============================================================================
// Queries and applies
// =============================================================================

#[test]
fn cached_query_filters_subscribed_set() {
    let mut table = board();
    table.add_query(PastHalfTurn).unwrap();
    for angle in [90, 200, 270, 10] {
        table
            .spawn(SQUARE, |rows, e| rows.set_int(e, ANGLE, angle))
            .unwrap();
    }
    let spinner = table.create(SPINNER).unwrap();
    table.set_int(spinner, ANGLE, 300);

    let hits = table.query::<4>(Tag::new(10)).unwrap();
    assert_eq!(hits.as_slice(), &[Entity::new(1), Entity::new(2)]);

    assert_eq!(
        table.query::<1>(Tag::new(10)),
        Err(TableError::QueryOverflow { limit: 1 })
    );

    table.deactivate(Tag::new(10)).unwrap();
    assert!(table.query::<4>(Tag::new(10)).unwrap().is_empty());
}

#[test]
fn apply_stops_at_first_handled() {
    let mut table = board();
    let visits = Rc::new(Cell::new(0));
    table
        .add_apply(HitFirstBelow {
            limit: 1,
            visits: Rc::clone(&visits),
        })
        .unwrap();
    let entities: Vec<Entity> = (0..4).map(|_| table.create(MARKER).unwrap()).collect();
    table.set_int(entities[0], HITS, 5);

    assert_eq!(table.apply(Tag::new(20)).unwrap(), Some(entities[1]));
    assert_eq!(visits.get(), 2);
    assert_eq!(table.int(entities[1], HITS), 1);
    assert_eq!(table.int(entities[2], HITS), 0);

    visits.set(0);
    assert_eq!(table.apply(Tag::new(20)).unwrap(), Some(entities[2]));
    assert_eq!(visits.get(), 3);
}

#[test]
fn inactive_apply_handles_nothing() {
    let mut table = board();
    let visits = Rc::new(Cell::new(0));
    table
        .add_apply(HitFirstBelow {
            limit: 1,
            visits: Rc::clone(&visits),
        })
        .unwrap();
    let e = table.create(MARKER).unwrap();

    table.deactivate(Tag::new(20)).unwrap();
    assert_eq!(table.apply(Tag::new(20)).unwrap(), None);
    assert_eq!(visits.get(), 0);
    assert_eq!(table.int(e, HITS), 0);
    assert!(table.is_subscribed(Tag::new(20), e).unwrap());

    table.activate(Tag::new(20)).unwrap();
    assert_eq!(table.apply(Tag::new(20)).unwrap(), Some(e));
}

#[test]
fn ad_hoc_apply_skips_entities_created_during_the_scan() {
    let mut table = board();
    let (recorder, _) = Recorder::new(1, Requirement::ANY);
    table.add_entity_processor(recorder).unwrap();
    for _ in 0..4 {
        table.create(MARKER).unwrap();
    }
    table.destroy(Entity::new(2));

    let mut visited = Vec::new();
    let mut created = None;
    let handled = table.apply_with(|rows, e| {
        visited.push(e.index());
        if e.index() == 0 {
            created = Some(rows.create(MARKER).unwrap());
        }
        false
    });

    assert_eq!(handled, None);
    assert_eq!(created, Some(Entity::new(2)));
    assert_eq!(visited, vec![0, 1, 3]);
    assert!(table.is_subscribed(Tag::new(1), Entity::new(2)).unwrap());
}

#[test]
fn ad_hoc_query_and_apply() {
    let mut table = board();
    for x in [-100, -10, 20, 90] {
        table
            .spawn(SQUARE, |rows, e| rows.set_fixed(e, X, Fixed::from_int(x)))
            .unwrap();
    }
    table.create(MARKER).unwrap();

    let (min, max) = (Fixed::from_int(-64), Fixed::from_int(64));
    let inside = table
        .query_with::<8, _>(|rows, e| {
            rows.model(e) == SQUARE && rows.fixed(e, X) > min && rows.fixed(e, X) < max
        })
        .unwrap();
    assert_eq!(inside.as_slice(), &[Entity::new(1), Entity::new(2)]);

    let destroyed = table.apply_with(|rows, e| rows.model(e) == SQUARE && rows.destroy_later(e));
    assert_eq!(destroyed, Some(Entity::new(0)));
    assert!(!table.contains(Entity::new(0)));
    assert_eq!(table.size(), 4);
}

// =============================================================================
// Errors and reset
// =============================================================================

#[test]
fn tag_errors() {
    let mut table = board();
    table.add_query(PastHalfTurn).unwrap();
    let (clash, _) = Recorder::new(10, Requirement::ANY);
    assert_eq!(
        table.add_entity_processor(clash),
        Err(TableError::DuplicateTag {
            kind: ProcessorKind::Query,
            tag: Tag::new(10)
        })
    );
    assert_eq!(
        table.query::<4>(Tag::new(99)),
        Err(TableError::UnknownTag {
            kind: ProcessorKind::Query,
            tag: Tag::new(99)
        })
    );
    assert_eq!(
        table.apply(Tag::new(10)),
        Err(TableError::UnknownTag {
            kind: ProcessorKind::Apply,
            tag: Tag::new(10)
        })
    );
    assert!(matches!(
        table.activate(Tag::new(77)),
        Err(TableError::UnknownTag { .. })
    ));
}

#[test]
fn clear_resets_ids_and_subscriptions() {
    let mut table = board();
    let (recorder, seen) = Recorder::new(1, Requirement::ANY);
    table.add_entity_processor(recorder).unwrap();
    for _ in 0..5 {
        table.create(MARKER).unwrap();
    }
    table.destroy(Entity::new(2));

    table.clear();
    assert_eq!(table.size(), 0);
    assert!(!table.is_subscribed(Tag::new(1), Entity::new(0)).unwrap());
    table.update();
    assert!(seen.borrow().is_empty());

    assert_eq!(table.create(MARKER).unwrap(), Entity::new(0));
    assert_eq!(table.create(MARKER).unwrap(), Entity::new(1));
}
