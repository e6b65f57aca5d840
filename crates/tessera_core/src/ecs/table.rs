//! # Entity Table
//!
//! The façade that owns every column and every registered processor.
//!
//! ## Tick
//!
//! `update()` runs, in registration order:
//!
//! 1. every active table processor, settling after each one
//! 2. every active entity processor over its subscribed set (ascending
//!    entity id), settling after each pass
//!
//! "Settling" subscribes entities created during the step and reclaims
//! entities destroyed during it. A scan therefore never skips a live
//! subscriber or visits one twice.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut table = EntityTable::<Squares>::new();
//! table.declare_fixed(SQUARE, X);
//! table.add_entity_processor(Movement)?;
//! table.init();
//!
//! let e = table.spawn(SQUARE, |rows, e| rows.set_fixed(e, X, Fixed::ONE))?;
//! table.update();
//! ```

use tracing::{debug, trace, warn};

use super::entity::{Entity, Model, Tag};
use super::field::{BoolField, FixedField, IntField, PackedField};
use super::processor::{CachedApply, CachedQuery, EntityProcessor, TableProcessor};
use super::query::QueryResults;
use super::rows::Rows;
use super::subscription::{Subscribers, Subscription, TableStage};
use crate::config::{DestroyMode, TableConfig};
use crate::error::{ProcessorKind, TableError, TableResult};
use crate::fixed::Fixed;
use crate::layout::Layout;

/// Fixed-capacity entity table with layout `L`.
pub struct EntityTable<L: Layout> {
    rows: Rows<L>,
    subscribers: Subscribers<L>,
    stages: Vec<TableStage<L>>,
    config: TableConfig,
    initialized: bool,
}

impl<L: Layout> EntityTable<L> {
    /// Creates an empty table with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    /// Creates an empty table. All storage is allocated here.
    #[must_use]
    pub fn with_config(config: TableConfig) -> Self {
        debug!(
            "Allocating entity table: {} entities, {} models, destroy mode {:?}",
            L::ENTITIES,
            L::MODELS,
            config.destroy_mode
        );
        Self {
            rows: Rows::new(),
            subscribers: Subscribers::new(),
            stages: Vec::new(),
            config,
            initialized: false,
        }
    }

    /// The runtime configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Read access to every column.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &Rows<L> {
        &self.rows
    }

    fn context(&mut self, mode: DestroyMode) -> TableContext<'_, L> {
        TableContext {
            rows: &mut self.rows,
            subscribers: &mut self.subscribers,
            mode,
        }
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Declares a fixed-point field for a model. Setup only.
    pub fn declare_fixed(&mut self, model: Model, field: FixedField) {
        self.rows.declare_fixed(model, field);
    }

    /// Declares an integer field for a model. Setup only.
    pub fn declare_int(&mut self, model: Model, field: IntField) {
        self.rows.declare_int(model, field);
    }

    /// Declares a boolean field for a model. Setup only.
    pub fn declare_bool(&mut self, model: Model, field: BoolField) {
        self.rows.declare_bool(model, field);
    }

    /// Declares a packed field for a model. Setup only.
    pub fn declare_packed(&mut self, model: Model, field: PackedField) {
        self.rows.declare_packed(model, field);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Creates an entity and subscribes it at once.
    ///
    /// Its fields are zero when subscribers evaluate it; use
    /// [`EntityTable::spawn`] when a selection depends on field values.
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityExceeded`] if the table is full.
    pub fn create(&mut self, model: Model) -> TableResult<Entity> {
        let entity = self.rows.create(model)?;
        self.subscribers.settle(&mut self.rows);
        Ok(entity)
    }

    /// Creates an entity, lets `init` write its fields, then subscribes it.
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityExceeded`] if the table is full.
    pub fn spawn<F>(&mut self, model: Model, init: F) -> TableResult<Entity>
    where
        F: FnOnce(&mut Rows<L>, Entity),
    {
        let entity = self.context(DestroyMode::Immediate).spawn(model, init)?;
        self.subscribers.settle(&mut self.rows);
        Ok(entity)
    }

    /// Destroys an entity now. Returns `false` if it was not live.
    ///
    /// Never call this from inside a processor; processors destroy through
    /// [`Rows::destroy_later`] or [`TableContext::destroy`].
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.subscribers.destroy_now(&mut self.rows, entity)
    }

    /// Destroys every entity. The next ids issued start from zero again.
    pub fn clear(&mut self) {
        self.context(DestroyMode::Immediate).clear();
    }

    /// Re-evaluates one entity against every subscriber.
    ///
    /// Needed after writing a field that a [`Subscriber::select`] override
    /// reads.
    ///
    /// [`Subscriber::select`]: super::processor::Subscriber::select
    pub fn resubscribe(&mut self, entity: Entity) {
        self.context(DestroyMode::Immediate).resubscribe(entity);
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.size()
    }

    /// Checks if every id is taken. Guard `create` with this.
    #[inline]
    #[must_use]
    pub fn full(&self) -> bool {
        self.rows.full()
    }

    /// Checks if an entity is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains(entity)
    }

    /// Returns the model of an entity.
    #[inline]
    #[must_use]
    pub fn model(&self, entity: Entity) -> Model {
        self.rows.model(entity)
    }

    // =========================================================================
    // Field access
    // =========================================================================

    /// Reads a fixed-point field.
    #[inline]
    #[must_use]
    pub fn fixed(&self, entity: Entity, field: FixedField) -> Fixed {
        self.rows.fixed(entity, field)
    }

    /// Writes a fixed-point field.
    #[inline]
    pub fn set_fixed(&mut self, entity: Entity, field: FixedField, value: Fixed) {
        self.rows.set_fixed(entity, field, value);
    }

    /// Reads an integer field.
    #[inline]
    #[must_use]
    pub fn int(&self, entity: Entity, field: IntField) -> i32 {
        self.rows.int(entity, field)
    }

    /// Writes an integer field.
    #[inline]
    pub fn set_int(&mut self, entity: Entity, field: IntField, value: i32) {
        self.rows.set_int(entity, field, value);
    }

    /// Reads a boolean field.
    #[inline]
    #[must_use]
    pub fn flag(&self, entity: Entity, field: BoolField) -> bool {
        self.rows.flag(entity, field)
    }

    /// Writes a boolean field.
    #[inline]
    pub fn set_flag(&mut self, entity: Entity, field: BoolField, value: bool) {
        self.rows.set_flag(entity, field, value);
    }

    /// Reads a packed field.
    #[inline]
    #[must_use]
    pub fn packed(&self, entity: Entity, field: PackedField) -> u32 {
        self.rows.packed(entity, field)
    }

    /// Writes a packed field.
    #[inline]
    pub fn set_packed(&mut self, entity: Entity, field: PackedField, value: u32) {
        self.rows.set_packed(entity, field, value);
    }

    /// Borrows the external handle of an entity.
    #[inline]
    #[must_use]
    pub fn handle(&self, entity: Entity) -> Option<&L::Handle> {
        self.rows.handle(entity)
    }

    /// Mutably borrows the external handle of an entity.
    #[inline]
    pub fn handle_mut(&mut self, entity: Entity) -> Option<&mut L::Handle> {
        self.rows.handle_mut(entity)
    }

    /// Attaches an external handle to an entity.
    #[inline]
    pub fn set_handle(&mut self, entity: Entity, handle: L::Handle) {
        self.rows.set_handle(entity, handle);
    }

    // =========================================================================
    // Registration
    // =========================================================================

    fn check_tag(&self, tag: Tag) -> TableResult<()> {
        let existing = if self.stages.iter().any(|s| s.processor.tag() == tag) {
            Some(ProcessorKind::Table)
        } else {
            self.subscribers.kind_of(tag)
        };
        match existing {
            Some(kind) => Err(TableError::DuplicateTag { kind, tag }),
            None => Ok(()),
        }
    }

    /// Registers an entity processor. Entities that already exist are
    /// evaluated against it immediately.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateTag`] if the tag is taken.
    pub fn add_entity_processor<P>(&mut self, processor: P) -> TableResult<()>
    where
        P: EntityProcessor<L> + 'static,
    {
        let tag = processor.tag();
        self.check_tag(tag)?;
        let boxed: Box<dyn EntityProcessor<L>> = Box::new(processor);
        let mut sub = Subscription::new(boxed, L::ENTITIES);
        sub.populate(&self.rows);
        self.subscribers.entity.push(sub);
        debug!("Registered {} {}", ProcessorKind::Entity, tag);
        Ok(())
    }

    /// Registers a table processor.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateTag`] if the tag is taken.
    pub fn add_table_processor<P>(&mut self, processor: P) -> TableResult<()>
    where
        P: TableProcessor<L> + 'static,
    {
        let tag = processor.tag();
        self.check_tag(tag)?;
        self.stages.push(TableStage {
            processor: Box::new(processor),
            active: true,
        });
        debug!("Registered {} {}", ProcessorKind::Table, tag);
        Ok(())
    }

    /// Registers a cached query.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateTag`] if the tag is taken.
    pub fn add_query<Q>(&mut self, query: Q) -> TableResult<()>
    where
        Q: CachedQuery<L> + 'static,
    {
        let tag = query.tag();
        self.check_tag(tag)?;
        let boxed: Box<dyn CachedQuery<L>> = Box::new(query);
        let mut sub = Subscription::new(boxed, L::ENTITIES);
        sub.populate(&self.rows);
        self.subscribers.queries.push(sub);
        debug!("Registered {} {}", ProcessorKind::Query, tag);
        Ok(())
    }

    /// Registers a cached apply.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateTag`] if the tag is taken.
    pub fn add_apply<A>(&mut self, apply: A) -> TableResult<()>
    where
        A: CachedApply<L> + 'static,
    {
        let tag = apply.tag();
        self.check_tag(tag)?;
        let boxed: Box<dyn CachedApply<L>> = Box::new(apply);
        let mut sub = Subscription::new(boxed, L::ENTITIES);
        sub.populate(&self.rows);
        self.subscribers.applies.push(sub);
        debug!("Registered {} {}", ProcessorKind::Apply, tag);
        Ok(())
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs every processor's `init` once. Later calls do nothing.
    pub fn init(&mut self) {
        if self.initialized {
            debug!("Entity table already initialized");
            return;
        }
        for sub in &mut self.subscribers.entity {
            sub.processor.init(&mut self.rows);
        }
        for sub in &mut self.subscribers.queries {
            sub.processor.init(&mut self.rows);
        }
        for sub in &mut self.subscribers.applies {
            sub.processor.init(&mut self.rows);
        }
        for stage in &mut self.stages {
            stage.processor.init(&mut self.rows);
        }
        self.subscribers.settle(&mut self.rows);
        self.initialized = true;
        debug!(
            "Entity table initialized: {} entity processors, {} table processors, {} queries, {} applies",
            self.subscribers.entity.len(),
            self.stages.len(),
            self.subscribers.queries.len(),
            self.subscribers.applies.len()
        );
    }

    /// Runs one tick: table processors, then entity processors.
    pub fn update(&mut self) {
        if !self.initialized {
            warn!("Entity table updated before init; initializing now");
            self.init();
        }

        let mode = self.config.destroy_mode;
        for stage in &mut self.stages {
            if !stage.active {
                continue;
            }
            let mut context = TableContext {
                rows: &mut self.rows,
                subscribers: &mut self.subscribers,
                mode,
            };
            stage.processor.update(&mut context);
            self.subscribers.settle(&mut self.rows);
        }

        for index in 0..self.subscribers.entity.len() {
            let sub = &mut self.subscribers.entity[index];
            if !sub.active {
                continue;
            }
            let Subscription {
                processor, members, ..
            } = sub;
            for entity in members.iter() {
                if !self.rows.is_doomed(entity) {
                    processor.update(&mut self.rows, entity);
                }
            }
            self.subscribers.settle(&mut self.rows);
        }
        trace!("Tick complete: {} live entities", self.rows.size());
    }

    // =========================================================================
    // Queries and applies
    // =========================================================================

    /// Runs a cached query.
    ///
    /// # Errors
    ///
    /// - [`TableError::UnknownTag`] if no query has the tag
    /// - [`TableError::QueryOverflow`] if more than `N` entities match
    pub fn query<const N: usize>(&self, tag: Tag) -> TableResult<QueryResults<N>> {
        run_query(&self.rows, &self.subscribers, tag)
    }

    /// Runs a cached apply and reports which entity handled it.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if no apply has the tag.
    pub fn apply(&mut self, tag: Tag) -> TableResult<Option<Entity>> {
        let handled = self.context(DestroyMode::Immediate).apply(tag)?;
        self.subscribers.settle(&mut self.rows);
        Ok(handled)
    }

    /// Scans every live entity with an ad-hoc predicate.
    ///
    /// # Errors
    ///
    /// [`TableError::QueryOverflow`] if more than `N` entities match.
    pub fn query_with<const N: usize, F>(&self, predicate: F) -> TableResult<QueryResults<N>>
    where
        F: Fn(&Rows<L>, Entity) -> bool,
    {
        run_query_with(&self.rows, predicate)
    }

    /// Scans every live entity with an ad-hoc action until it returns `true`.
    pub fn apply_with<F>(&mut self, action: F) -> Option<Entity>
    where
        F: FnMut(&mut Rows<L>, Entity) -> bool,
    {
        let handled = self.context(DestroyMode::Immediate).apply_with(action);
        self.subscribers.settle(&mut self.rows);
        handled
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Resumes a processor, query or apply.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if nothing has the tag.
    pub fn activate(&mut self, tag: Tag) -> TableResult<()> {
        self.set_active(tag, true)
    }

    /// Pauses a processor, query or apply. Its subscriptions are kept.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if nothing has the tag.
    pub fn deactivate(&mut self, tag: Tag) -> TableResult<()> {
        self.set_active(tag, false)
    }

    fn set_active(&mut self, tag: Tag, active: bool) -> TableResult<()> {
        if let Some(stage) = self.stages.iter_mut().find(|s| s.processor.tag() == tag) {
            stage.active = active;
            return Ok(());
        }
        self.context(DestroyMode::Immediate).set_active(tag, active)
    }

    /// Checks if a processor, query or apply is active.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if nothing has the tag.
    pub fn is_active(&self, tag: Tag) -> TableResult<bool> {
        if let Some(stage) = self.stages.iter().find(|s| s.processor.tag() == tag) {
            return Ok(stage.active);
        }
        self.subscribers.is_active(tag).ok_or(TableError::UnknownTag {
            kind: ProcessorKind::Any,
            tag,
        })
    }

    /// Checks if a subscriber currently holds an entity.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if no subscriber has the tag.
    pub fn is_subscribed(&self, tag: Tag, entity: Entity) -> TableResult<bool> {
        let members = self.subscribers.members(tag).ok_or(TableError::UnknownTag {
            kind: ProcessorKind::Any,
            tag,
        })?;
        Ok(self.rows.contains(entity) && members.contains(entity))
    }
}

impl<L: Layout> Default for EntityTable<L> {
    fn default() -> Self {
        Self::new()
    }
}

fn run_query<L: Layout, const N: usize>(
    rows: &Rows<L>,
    subscribers: &Subscribers<L>,
    tag: Tag,
) -> TableResult<QueryResults<N>> {
    let sub = &subscribers.queries[subscribers.query_index(tag)?];
    let mut results = QueryResults::new();
    if !sub.active {
        return Ok(results);
    }
    for entity in sub.members.iter() {
        if !rows.is_doomed(entity) && sub.processor.filter(rows, entity) {
            results.push(entity)?;
        }
    }
    Ok(results)
}

fn run_query_with<L, const N: usize, F>(rows: &Rows<L>, predicate: F) -> TableResult<QueryResults<N>>
where
    L: Layout,
    F: Fn(&Rows<L>, Entity) -> bool,
{
    let mut results = QueryResults::new();
    for entity in rows.iter() {
        if !rows.is_doomed(entity) && predicate(rows, entity) {
            results.push(entity)?;
        }
    }
    Ok(results)
}

/// What a table processor sees of the table during its update.
///
/// Entities created here join subscription sets once the processor
/// returns. Destroys follow the table's [`DestroyMode`].
pub struct TableContext<'a, L: Layout> {
    rows: &'a mut Rows<L>,
    subscribers: &'a mut Subscribers<L>,
    mode: DestroyMode,
}

impl<'a, L: Layout> TableContext<'a, L> {
    /// Read access to every column.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &Rows<L> {
        &*self.rows
    }

    /// Write access to every column.
    #[inline]
    pub fn rows_mut(&mut self) -> &mut Rows<L> {
        &mut *self.rows
    }

    /// The destroy mode in effect.
    #[inline]
    #[must_use]
    pub fn destroy_mode(&self) -> DestroyMode {
        self.mode
    }

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityExceeded`] if the table is full.
    pub fn create(&mut self, model: Model) -> TableResult<Entity> {
        self.rows.create(model)
    }

    /// Creates an entity and lets `init` write its fields.
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityExceeded`] if the table is full.
    pub fn spawn<F>(&mut self, model: Model, init: F) -> TableResult<Entity>
    where
        F: FnOnce(&mut Rows<L>, Entity),
    {
        let entity = self.rows.create(model)?;
        init(&mut *self.rows, entity);
        Ok(entity)
    }

    /// Destroys an entity. Returns `false` if it was not live.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        match self.mode {
            DestroyMode::Deferred => self.rows.destroy_later(entity),
            DestroyMode::Immediate => self.subscribers.destroy_now(&mut *self.rows, entity),
        }
    }

    /// Destroys every entity.
    pub fn clear(&mut self) {
        match self.mode {
            DestroyMode::Deferred => {
                let high_water = self.rows.high_water_mark();
                for index in 0..high_water {
                    self.rows.destroy_later(Entity::new(index as u32));
                }
            }
            DestroyMode::Immediate => {
                for entity in self.rows.iter() {
                    self.subscribers.unsubscribe(entity);
                }
                self.rows.release_all();
                debug!("Entity table cleared");
            }
        }
    }

    /// Re-evaluates one entity against every subscriber.
    pub fn resubscribe(&mut self, entity: Entity) {
        if self.rows.contains(entity) && !self.rows.is_doomed(entity) {
            self.subscribers.subscribe(&*self.rows, entity);
        }
    }

    /// Runs a cached query.
    ///
    /// # Errors
    ///
    /// - [`TableError::UnknownTag`] if no query has the tag
    /// - [`TableError::QueryOverflow`] if more than `N` entities match
    pub fn query<const N: usize>(&self, tag: Tag) -> TableResult<QueryResults<N>> {
        run_query(&*self.rows, &*self.subscribers, tag)
    }

    /// Runs a cached apply: visits its subscribed set in ascending order and
    /// stops at the first entity it handles.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if no apply has the tag.
    pub fn apply(&mut self, tag: Tag) -> TableResult<Option<Entity>> {
        let index = self.subscribers.apply_index(tag)?;
        let Subscription {
            processor,
            members,
            active,
        } = &mut self.subscribers.applies[index];
        if !*active {
            return Ok(None);
        }
        for entity in members.iter() {
            if !self.rows.is_doomed(entity) && processor.apply(&mut *self.rows, entity) {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    /// Scans every live entity with an ad-hoc predicate.
    ///
    /// # Errors
    ///
    /// [`TableError::QueryOverflow`] if more than `N` entities match.
    pub fn query_with<const N: usize, F>(&self, predicate: F) -> TableResult<QueryResults<N>>
    where
        F: Fn(&Rows<L>, Entity) -> bool,
    {
        run_query_with(&*self.rows, predicate)
    }

    /// Scans the subscribed, live entities with an ad-hoc action, stopping
    /// at the first `true`. Entities created during the scan are not visited.
    pub fn apply_with<F>(&mut self, mut action: F) -> Option<Entity>
    where
        F: FnMut(&mut Rows<L>, Entity) -> bool,
    {
        let high_water = self.rows.high_water_mark();
        for index in 0..high_water {
            let entity = Entity::new(index as u32);
            if self.rows.contains(entity)
                && !self.rows.is_pending(entity)
                && !self.rows.is_doomed(entity)
                && action(&mut *self.rows, entity)
            {
                return Some(entity);
            }
        }
        None
    }

    /// Resumes a subscriber.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if no subscriber has the tag. Table
    /// processors cannot be toggled from inside a tick.
    pub fn activate(&mut self, tag: Tag) -> TableResult<()> {
        self.set_active(tag, true)
    }

    /// Pauses a subscriber, keeping its subscriptions.
    ///
    /// # Errors
    ///
    /// [`TableError::UnknownTag`] if no subscriber has the tag.
    pub fn deactivate(&mut self, tag: Tag) -> TableResult<()> {
        self.set_active(tag, false)
    }

    fn set_active(&mut self, tag: Tag, active: bool) -> TableResult<()> {
        if self.subscribers.set_active(tag, active) {
            debug!("Processor {} active: {}", tag, active);
            Ok(())
        } else {
            Err(TableError::UnknownTag {
                kind: ProcessorKind::Any,
                tag,
            })
        }
    }
}
