//! # Entity Table Benchmark
//!
//! Measures the three hot paths of a full 256-entity table:
//! 1. One tick with two entity processors
//! 2. A cached query over the subscribed set
//! 3. Create/destroy churn through the free-id stack

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_core::{
    CachedQuery, Entity, EntityProcessor, EntityTable, Fixed, FixedField, IntField, Layout,
    Model, Processor, Requirement, Rows, Subscriber, Tag,
};

struct Full;

impl Layout for Full {
    const ENTITIES: usize = 256;
    const MODELS: usize = 2;
    const FIXED_FIELDS: usize = 4;
    const INT_FIELDS: usize = 1;
    type Handle = ();
}

const MOVER: Model = Model::new(0);
const STILL: Model = Model::new(1);

const X: FixedField = FixedField::new(0);
const Y: FixedField = FixedField::new(1);
const VX: FixedField = FixedField::new(2);
const VY: FixedField = FixedField::new(3);
const ANGLE: IntField = IntField::new(0);

struct Movement;

impl Processor<Full> for Movement {
    fn tag(&self) -> Tag {
        Tag::new(0)
    }
}

impl Subscriber<Full> for Movement {
    fn requirement(&self) -> Requirement {
        Requirement::new().fixed(X).fixed(Y).fixed(VX).fixed(VY)
    }
}

impl EntityProcessor<Full> for Movement {
    fn update(&mut self, rows: &mut Rows<Full>, entity: Entity) {
        let x = rows.fixed(entity, X) + rows.fixed(entity, VX);
        let y = rows.fixed(entity, Y) + rows.fixed(entity, VY);
        rows.set_fixed(entity, X, x);
        rows.set_fixed(entity, Y, y);
    }
}

struct Rotation;

impl Processor<Full> for Rotation {
    fn tag(&self) -> Tag {
        Tag::new(1)
    }
}

impl Subscriber<Full> for Rotation {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(ANGLE)
    }
}

impl EntityProcessor<Full> for Rotation {
    fn update(&mut self, rows: &mut Rows<Full>, entity: Entity) {
        let angle = (rows.int(entity, ANGLE) + 1) % 360;
        rows.set_int(entity, ANGLE, angle);
    }
}

struct PastHalfTurn;

impl Processor<Full> for PastHalfTurn {
    fn tag(&self) -> Tag {
        Tag::new(2)
    }
}

impl Subscriber<Full> for PastHalfTurn {
    fn requirement(&self) -> Requirement {
        Requirement::new().int(ANGLE)
    }
}

impl CachedQuery<Full> for PastHalfTurn {
    fn filter(&self, rows: &Rows<Full>, entity: Entity) -> bool {
        rows.int(entity, ANGLE) > 180
    }
}

fn full_table() -> EntityTable<Full> {
    let mut table = EntityTable::new();
    for field in [X, Y, VX, VY] {
        table.declare_fixed(MOVER, field);
    }
    table.declare_int(MOVER, ANGLE);
    table.declare_int(STILL, ANGLE);
    table.add_entity_processor(Movement).unwrap();
    table.add_entity_processor(Rotation).unwrap();
    table.add_query(PastHalfTurn).unwrap();
    table.init();

    let mut i = 0;
    while !table.full() {
        let model = if i % 4 == 0 { STILL } else { MOVER };
        table
            .spawn(model, |rows, e| {
                rows.set_int(e, ANGLE, (i * 7) % 360);
                if model == MOVER {
                    rows.set_fixed(e, VX, Fixed::from_ratio(1, 2));
                    rows.set_fixed(e, VY, Fixed::from_ratio(-1, 4));
                }
            })
            .unwrap();
        i += 1;
    }
    table
}

fn bench_tick(c: &mut Criterion) {
    let mut table = full_table();
    c.bench_function("tick_256_entities_2_processors", |b| {
        b.iter(|| {
            table.update();
            black_box(table.size())
        });
    });
}

fn bench_cached_query(c: &mut Criterion) {
    let table = full_table();
    c.bench_function("cached_query_256", |b| {
        b.iter(|| black_box(table.query::<256>(Tag::new(2)).map(|r| r.len())));
    });
}

fn bench_churn(c: &mut Criterion) {
    let mut table = full_table();
    c.bench_function("destroy_create_churn_64", |b| {
        b.iter(|| {
            for index in (0..256).step_by(4) {
                table.destroy(Entity::new(index));
            }
            for _ in 0..64 {
                black_box(table.create(STILL).ok());
            }
        });
    });
}

criterion_group!(benches, bench_tick, bench_cached_query, bench_churn);
criterion_main!(benches);
