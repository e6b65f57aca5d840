//! # Subscription Cache
//!
//! One [`EntityMask`] per subscribing processor, recording which entities
//! it currently handles. The masks are maintained incrementally:
//!
//! - on create (at the settle point after the creating call)
//! - on explicit re-subscription
//! - on destroy, where every bit of the entity is cleared
//!
//! Nothing here runs in the per-tick loop except the scans themselves.

use tracing::trace;

use super::entity::{Entity, Tag};
use super::processor::{
    CachedApply, CachedQuery, EntityProcessor, Processor, Subscriber, TableProcessor,
};
use super::rows::Rows;
use crate::error::{ProcessorKind, TableError, TableResult};
use crate::layout::Layout;
use crate::memory::EntityMask;

/// A registered subscriber with its cached set and activity flag.
pub(crate) struct Subscription<P: ?Sized> {
    pub(crate) processor: Box<P>,
    pub(crate) members: EntityMask,
    pub(crate) active: bool,
}

impl<P: ?Sized> Subscription<P> {
    pub(crate) fn new(processor: Box<P>, capacity: usize) -> Self {
        Self {
            processor,
            members: EntityMask::new(capacity),
            active: true,
        }
    }

    /// Re-evaluates one entity.
    fn evaluate<L: Layout>(&mut self, rows: &Rows<L>, entity: Entity)
    where
        P: Subscriber<L>,
    {
        if self.processor.select(rows, entity) {
            self.members.insert(entity);
        } else {
            self.members.remove(entity);
        }
    }

    /// Evaluates every live entity; used when registering after entities exist.
    pub(crate) fn populate<L: Layout>(&mut self, rows: &Rows<L>)
    where
        P: Subscriber<L>,
    {
        for entity in rows.iter() {
            if !rows.is_doomed(entity) {
                self.evaluate(rows, entity);
            }
        }
    }
}

/// A registered table processor with its activity flag.
pub(crate) struct TableStage<L: Layout> {
    pub(crate) processor: Box<dyn TableProcessor<L>>,
    pub(crate) active: bool,
}

/// The three subscribing registration lists.
pub(crate) struct Subscribers<L: Layout> {
    pub(crate) entity: Vec<Subscription<dyn EntityProcessor<L>>>,
    pub(crate) queries: Vec<Subscription<dyn CachedQuery<L>>>,
    pub(crate) applies: Vec<Subscription<dyn CachedApply<L>>>,
}

fn position<L, P>(list: &[Subscription<P>], tag: Tag) -> Option<usize>
where
    L: Layout,
    P: ?Sized + Processor<L>,
{
    list.iter().position(|s| s.processor.tag() == tag)
}

impl<L: Layout> Subscribers<L> {
    pub(crate) fn new() -> Self {
        Self {
            entity: Vec::new(),
            queries: Vec::new(),
            applies: Vec::new(),
        }
    }

    /// Evaluates an entity against every subscriber.
    pub(crate) fn subscribe(&mut self, rows: &Rows<L>, entity: Entity) {
        for sub in &mut self.entity {
            sub.evaluate(rows, entity);
        }
        for sub in &mut self.queries {
            sub.evaluate(rows, entity);
        }
        for sub in &mut self.applies {
            sub.evaluate(rows, entity);
        }
        trace!("Subscribed entity {}", entity);
    }

    /// Clears an entity's bit in every subscriber.
    pub(crate) fn unsubscribe(&mut self, entity: Entity) {
        for sub in &mut self.entity {
            sub.members.remove(entity);
        }
        for sub in &mut self.queries {
            sub.members.remove(entity);
        }
        for sub in &mut self.applies {
            sub.members.remove(entity);
        }
    }

    /// Subscribes pending entities, then reclaims doomed ones.
    pub(crate) fn settle(&mut self, rows: &mut Rows<L>) {
        while let Some(entity) = rows.pop_pending() {
            if rows.contains(entity) {
                self.subscribe(rows, entity);
            }
        }
        while let Some(entity) = rows.pop_doomed() {
            self.unsubscribe(entity);
            rows.release(entity);
        }
    }

    /// Unsubscribes and reclaims one entity now.
    pub(crate) fn destroy_now(&mut self, rows: &mut Rows<L>, entity: Entity) -> bool {
        if !rows.contains(entity) {
            return false;
        }
        self.unsubscribe(entity);
        rows.release(entity)
    }

    pub(crate) fn entity_index(&self, tag: Tag) -> Option<usize> {
        position::<L, _>(&self.entity, tag)
    }

    pub(crate) fn query_index(&self, tag: Tag) -> TableResult<usize> {
        position::<L, _>(&self.queries, tag).ok_or(TableError::UnknownTag {
            kind: ProcessorKind::Query,
            tag,
        })
    }

    pub(crate) fn apply_index(&self, tag: Tag) -> TableResult<usize> {
        position::<L, _>(&self.applies, tag).ok_or(TableError::UnknownTag {
            kind: ProcessorKind::Apply,
            tag,
        })
    }

    /// Finds which list holds a tag.
    pub(crate) fn kind_of(&self, tag: Tag) -> Option<ProcessorKind> {
        if self.entity_index(tag).is_some() {
            Some(ProcessorKind::Entity)
        } else if position::<L, _>(&self.queries, tag).is_some() {
            Some(ProcessorKind::Query)
        } else if position::<L, _>(&self.applies, tag).is_some() {
            Some(ProcessorKind::Apply)
        } else {
            None
        }
    }

    /// Sets the activity flag of a subscriber. Returns `false` if unknown.
    pub(crate) fn set_active(&mut self, tag: Tag, active: bool) -> bool {
        if let Some(i) = self.entity_index(tag) {
            self.entity[i].active = active;
        } else if let Some(i) = position::<L, _>(&self.queries, tag) {
            self.queries[i].active = active;
        } else if let Some(i) = position::<L, _>(&self.applies, tag) {
            self.applies[i].active = active;
        } else {
            return false;
        }
        true
    }

    /// Activity flag of a subscriber, if registered.
    pub(crate) fn is_active(&self, tag: Tag) -> Option<bool> {
        if let Some(i) = self.entity_index(tag) {
            Some(self.entity[i].active)
        } else if let Some(i) = position::<L, _>(&self.queries, tag) {
            Some(self.queries[i].active)
        } else {
            position::<L, _>(&self.applies, tag).map(|i| self.applies[i].active)
        }
    }

    /// Subscription set of a subscriber, if registered.
    pub(crate) fn members(&self, tag: Tag) -> Option<&EntityMask> {
        if let Some(i) = self.entity_index(tag) {
            Some(&self.entity[i].members)
        } else if let Some(i) = position::<L, _>(&self.queries, tag) {
            Some(&self.queries[i].members)
        } else {
            position::<L, _>(&self.applies, tag).map(|i| &self.applies[i].members)
        }
    }
}
