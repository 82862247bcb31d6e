//! The row reconstruction driver.
//!
//! `Hydrator` walks a forward-only row stream once and rebuilds the object
//! graph the shape describes: entities deduplicated per alias identity,
//! joined children attached through the collection rules, scalars coerced
//! into result records. `hydrate_all` materializes the whole set eagerly;
//! `iterate` emits one top-level result at a time with one-result
//! buffering.

use crate::coerce::coerce;
use crate::context::{HydrationContext, Resolution};
use crate::discriminator::resolve_concrete_type;
use crate::entity::{AssociationValue, Collection, EntityData, EntityRef};
use crate::proxy::{ProxyFactory, UninitializedProxyFactory};
use crate::result::{HydratedRow, HydratedSet, ResultItem, ResultLabel, ResultRecord};
use crate::source::RowSource;
use aquifer_core::{
    Error, FieldType, HydrationError, MappingError, Result, Row, Value, ValueKey,
};
use aquifer_mapping::{EntityResult, MetadataRegistry, ResultSetMapping};
use indexmap::IndexMap;
use std::collections::HashMap;

/// The state a root alias resolved to for one row.
enum RootState {
    /// The alias carries no field results; it never surfaces in results.
    Skipped,
    /// The root identity was entirely NULL.
    Absent,
    /// A present root with its identity hash.
    Entity(EntityRef, u64),
}

/// Everything one row contributed, before top-level emission.
struct RowOutcome {
    /// Parallel to the shape's root results, in declaration order.
    roots: Vec<RootState>,
    scalars: Vec<(String, Value)>,
}

/// Reconstructs object graphs from flat result-set rows.
pub struct Hydrator<'r> {
    registry: &'r MetadataRegistry,
    proxy_factory: Box<dyn ProxyFactory + 'r>,
}

impl<'r> Hydrator<'r> {
    /// Create a hydrator over a metadata registry.
    ///
    /// Lazy to-one associations produce inert placeholder proxies unless a
    /// custom factory is installed with [`with_proxy_factory`](Self::with_proxy_factory).
    #[must_use]
    pub fn new(registry: &'r MetadataRegistry) -> Self {
        Self {
            registry,
            proxy_factory: Box::new(UninitializedProxyFactory),
        }
    }

    /// Replace the proxy factory used for lazy to-one associations.
    #[must_use]
    pub fn with_proxy_factory(mut self, factory: Box<dyn ProxyFactory + 'r>) -> Self {
        self.proxy_factory = factory;
        self
    }

    /// Hydrate the whole source eagerly.
    ///
    /// The source is closed on every exit path. Results come back in
    /// first-seen root order, or keyed when the shape configures a root or
    /// scalar index-by.
    #[tracing::instrument(level = "debug", skip(self, source, rsm))]
    pub fn hydrate_all<S: RowSource>(
        &self,
        mut source: S,
        rsm: &ResultSetMapping,
    ) -> Result<HydratedSet> {
        let result = self.run_eager(&mut source, rsm);
        source.close();
        result
    }

    /// Hydrate lazily, one top-level result at a time.
    ///
    /// Requires a single root alias; rows for the same root identity must
    /// be contiguous or later rows start a fresh result. The source is
    /// closed when the iterator ends, fails, or is dropped.
    pub fn iterate<'h, S: RowSource>(
        &'h self,
        source: S,
        rsm: &'h ResultSetMapping,
    ) -> Result<ResultIterator<'h, 'r, S>> {
        let mut active_roots = rsm
            .root_results()
            .enumerate()
            .filter(|(_, er)| rsm.has_fields(&er.alias));
        let Some((root_index, root)) = active_roots.next() else {
            return Err(HydrationError::unsupported_result_shape(
                "lazy hydration requires one root entity result",
            )
            .into());
        };
        if active_roots.next().is_some() {
            return Err(HydrationError::unsupported_result_shape(
                "lazy hydration supports a single root entity result",
            )
            .into());
        }
        tracing::debug!(root = %root.alias, "starting lazy hydration pass");
        Ok(ResultIterator {
            hydrator: self,
            rsm,
            root: root.clone(),
            root_index,
            bare: !rsm.is_mixed(),
            source,
            ctx: HydrationContext::new(),
            pending: None,
            done: false,
        })
    }

    fn run_eager<S: RowSource>(
        &self,
        source: &mut S,
        rsm: &ResultSetMapping,
    ) -> Result<HydratedSet> {
        let mut ctx = HydrationContext::new();
        let roots: Vec<&EntityResult> = rsm.root_results().collect();
        let bare = !rsm.is_mixed();
        let keyed = roots.iter().any(|r| rsm.index_by(&r.alias).is_some())
            || rsm.scalar_index_by().is_some();

        let mut ordered: Vec<HydratedRow> = Vec::new();
        let mut keyed_out: IndexMap<ValueKey, HydratedRow> = IndexMap::new();
        let mut row_count = 0usize;

        while let Some(row) = source.next_row()? {
            row_count += 1;
            let outcome = self.hydrate_row(rsm, &mut ctx, &row)?;
            let mut scalars = Some(outcome.scalars);
            let mut scalar_carrier_found = false;

            for (root, state) in roots.iter().zip(outcome.roots) {
                match state {
                    RootState::Skipped => {}
                    RootState::Entity(entity, hash) => {
                        let attach_scalars = !scalar_carrier_found;
                        scalar_carrier_found = true;
                        if ctx.slot_for(&root.alias, hash).is_some() {
                            // Already emitted; children merged through the
                            // shared instance, first-seen scalars win.
                            continue;
                        }
                        let row_result = Self::build_result(
                            bare,
                            root,
                            Some(entity.clone()),
                            if attach_scalars { scalars.take() } else { None },
                        );
                        if keyed {
                            ctx.assign_slot(&root.alias, hash, keyed_out.len());
                            if let Some(key) = Self::result_key(rsm, &row, root, Some(&entity))? {
                                keyed_out.insert(key, row_result);
                            }
                        } else {
                            ctx.assign_slot(&root.alias, hash, ordered.len());
                            ordered.push(row_result);
                        }
                    }
                    RootState::Absent => {
                        let attach_scalars = !scalar_carrier_found;
                        scalar_carrier_found = true;
                        let row_result = Self::build_result(
                            bare,
                            root,
                            None,
                            if attach_scalars { scalars.take() } else { None },
                        );
                        if keyed {
                            // An absent root has no field to key on; only a
                            // scalar index-by can still place the result.
                            if rsm.index_by(&root.alias).is_none() {
                                if let Some(key) = Self::scalar_key(rsm, &row)? {
                                    keyed_out.insert(key, row_result);
                                }
                            }
                        } else {
                            ordered.push(row_result);
                        }
                    }
                }
            }

            // Scalar-only shapes: no entity result claimed the scalars.
            if !scalar_carrier_found {
                if let Some(values) = scalars.take() {
                    if !values.is_empty() {
                        let mut record = ResultRecord::new();
                        for (name, value) in values {
                            record.insert(ResultLabel::Name(name), ResultItem::Scalar(value));
                        }
                        let row_result = HydratedRow::Record(record);
                        if keyed {
                            if let Some(key) = Self::scalar_key(rsm, &row)? {
                                keyed_out.insert(key, row_result);
                            }
                        } else {
                            ordered.push(row_result);
                        }
                    }
                }
            }
        }

        ctx.complete_collections();
        let set = if keyed {
            HydratedSet::Keyed(keyed_out)
        } else {
            HydratedSet::Ordered(ordered)
        };
        tracing::debug!(
            rows = row_count,
            results = set.len(),
            "eager hydration pass complete"
        );
        Ok(set)
    }

    /// Hydrate every entity alias of one row and attach joined children.
    fn hydrate_row(
        &self,
        rsm: &ResultSetMapping,
        ctx: &mut HydrationContext,
        row: &Row,
    ) -> Result<RowOutcome> {
        let mut states: HashMap<&str, Option<(EntityRef, u64)>> = HashMap::new();

        for er in rsm.entity_results() {
            if !rsm.has_fields(&er.alias) {
                continue;
            }
            let state = self.hydrate_alias(rsm, ctx, er, row)?;
            states.insert(er.alias.as_str(), state);
        }

        for er in rsm.entity_results() {
            let Some((parent_alias, relation)) = &er.parent else {
                continue;
            };
            let Some(Some((parent, parent_hash))) = states.get(parent_alias.as_str()) else {
                continue;
            };
            let parent = parent.clone();
            let parent_hash = *parent_hash;
            let child = states.get(er.alias.as_str()).cloned().flatten();
            self.attach(rsm, ctx, er, parent_alias, relation, &parent, parent_hash, child)?;
        }

        let mut scalars = Vec::with_capacity(rsm.scalars().len());
        for scalar in rsm.scalars() {
            let raw = row.get_by_name(&scalar.column).cloned().unwrap_or(Value::Null);
            let value = match rsm.enum_override(&scalar.column) {
                Some(en) => coerce(&raw, &FieldType::Enum(en.clone())),
                None => coerce(&raw, &scalar.ty),
            }
            .map_err(|e| label_column(e, &scalar.column))?;
            scalars.push((scalar.name.clone(), value));
        }

        let roots = rsm
            .root_results()
            .map(|er| {
                if !rsm.has_fields(&er.alias) {
                    return RootState::Skipped;
                }
                match states.get(er.alias.as_str()) {
                    Some(Some((entity, hash))) => RootState::Entity(entity.clone(), *hash),
                    _ => RootState::Absent,
                }
            })
            .collect();

        Ok(RowOutcome { roots, scalars })
    }

    /// Resolve one alias for one row against the identity map.
    fn hydrate_alias(
        &self,
        rsm: &ResultSetMapping,
        ctx: &mut HydrationContext,
        er: &EntityResult,
        row: &Row,
    ) -> Result<Option<(EntityRef, u64)>> {
        let meta = self.registry.get(&er.entity)?;

        let mut id_values = Vec::with_capacity(meta.id_fields().len());
        for id_field in meta.id_fields() {
            let column = rsm
                .fields_for(&er.alias)
                .find(|(_, field, _)| *field == id_field.as_str())
                .map(|(column, _, _)| column);
            let raw = column
                .and_then(|c| row.get_by_name(c))
                .cloned()
                .unwrap_or(Value::Null);
            let ty = meta
                .field_type(id_field)
                .cloned()
                .unwrap_or(FieldType::Text);
            id_values.push(coerce(&raw, &ty)?);
        }

        match ctx.probe_identity(&er.alias, &id_values) {
            Resolution::Absent => Ok(None),
            Resolution::Existing(entity, hash) => Ok(Some((entity, hash))),
            Resolution::Vacant(hash) => {
                let entity = self.build_entity(rsm, ctx, er, row)?;
                ctx.register(&er.alias, hash, entity.clone());
                Ok(Some((entity, hash)))
            }
        }
    }

    /// Build a fresh entity for one row: resolve the concrete type, coerce
    /// and assign fields, create lazy proxies, pre-initialize association
    /// slots for every joined child alias.
    fn build_entity(
        &self,
        rsm: &ResultSetMapping,
        ctx: &mut HydrationContext,
        er: &EntityResult,
        row: &Row,
    ) -> Result<EntityRef> {
        let meta = self.registry.get(&er.entity)?;
        let concrete = resolve_concrete_type(rsm, meta, &er.alias, row)?;
        let mut data = EntityData::new(&concrete);

        for (column, field, declared_on) in rsm.fields_for(&er.alias) {
            if let Some(declared) = declared_on {
                // A field declared on a sibling subtype never bleeds into
                // this instance.
                if !self.registry.is_subtype_of(&concrete, declared) {
                    continue;
                }
            }
            let Some(raw) = row.get_by_name(column) else {
                continue;
            };
            let ty = match rsm.enum_override(column) {
                Some(en) => FieldType::Enum(en.clone()),
                None => self
                    .registry
                    .find_field_type(&concrete, field)
                    .cloned()
                    .unwrap_or(FieldType::Text),
            };
            let value = coerce(raw, &ty).map_err(|e| label_column(e, column))?;
            data.fields.insert(field.to_string(), value);
        }

        for m in rsm.metas_for(&er.alias) {
            if rsm.discriminator_column(&er.alias) == Some(m.column.as_str()) {
                continue;
            }
            let Some(assoc) = self.registry.find_association_by_fk(&concrete, &m.field) else {
                continue;
            };
            // A fetch-joined alias supplies the real instance for this
            // relation; no placeholder then.
            let fetch_joined = rsm.entity_results().iter().any(|c| {
                c.parent
                    .as_ref()
                    .is_some_and(|(p, rel)| p == &er.alias && rel == &assoc.name)
            });
            if fetch_joined {
                continue;
            }
            let Some(raw) = row.get_by_name(&m.column) else {
                continue;
            };
            if raw.is_null() {
                data.associations
                    .insert(assoc.name.clone(), AssociationValue::One(None));
                continue;
            }
            let target_meta = self.registry.get(&assoc.target)?;
            let Some(id_field) = target_meta.id_fields().first() else {
                continue;
            };
            let ty = target_meta
                .field_type(id_field)
                .cloned()
                .unwrap_or(FieldType::Text);
            let id_value = coerce(raw, &ty).map_err(|e| label_column(e, &m.column))?;
            let proxy = self
                .proxy_factory
                .create_proxy(&assoc.target, vec![(id_field.clone(), id_value)]);
            data.associations
                .insert(assoc.name.clone(), AssociationValue::One(Some(proxy)));
        }

        let mut tracked = Vec::new();
        for child in rsm.entity_results() {
            let Some((parent_alias, relation)) = &child.parent else {
                continue;
            };
            if parent_alias != &er.alias {
                continue;
            }
            let Some(info) = self.registry.find_association(&concrete, relation) else {
                return Err(MappingError::unknown_association(&concrete, relation).into());
            };
            if info.kind.is_to_many() {
                let collection = if rsm.index_by(&child.alias).is_some() {
                    Collection::keyed()
                } else {
                    Collection::ordered()
                };
                data.associations
                    .insert(relation.clone(), AssociationValue::Many(collection));
                tracked.push(relation.clone());
            } else {
                data.associations
                    .entry(relation.clone())
                    .or_insert(AssociationValue::One(None));
            }
        }

        let entity = data.into_ref();
        for relation in tracked {
            ctx.track_collection(entity.clone(), &relation);
        }
        Ok(entity)
    }

    /// Attach one joined child result to its parent for this row.
    #[allow(clippy::too_many_arguments)]
    fn attach(
        &self,
        rsm: &ResultSetMapping,
        ctx: &mut HydrationContext,
        child_er: &EntityResult,
        parent_alias: &str,
        relation: &str,
        parent: &EntityRef,
        parent_hash: u64,
        child: Option<(EntityRef, u64)>,
    ) -> Result<()> {
        let parent_type = parent.read().map_err(|_| poisoned())?.entity_type.clone();
        let info = self
            .registry
            .find_association(&parent_type, relation)
            .ok_or_else(|| MappingError::unknown_association(&parent_type, relation))?;

        if info.kind.is_to_many() {
            let Some((child_ref, child_hash)) = child else {
                return Ok(());
            };
            if !ctx.mark_attached(parent_alias, parent_hash, &child_er.alias, child_hash) {
                return Ok(());
            }
            // Read the child's key before locking the parent; a self-join
            // can resolve both aliases to the same instance.
            let key = match rsm.index_by(&child_er.alias) {
                Some(field) => {
                    let value = child_ref
                        .read()
                        .map_err(|_| poisoned())?
                        .field(field)
                        .cloned()
                        .unwrap_or(Value::Null);
                    Some(ValueKey::new(value))
                }
                None => None,
            };
            let mut parent_data = parent.write().map_err(|_| poisoned())?;
            let slot = parent_data
                .associations
                .entry(relation.to_string())
                .or_insert_with(|| {
                    AssociationValue::Many(if key.is_some() {
                        Collection::keyed()
                    } else {
                        Collection::ordered()
                    })
                });
            if let AssociationValue::Many(collection) = slot {
                match key {
                    Some(k) => collection.insert_keyed(k, child_ref),
                    None => collection.push(child_ref),
                }
            }
        } else {
            // A to-one target is set by the first row that carries it;
            // later rows leave the slot alone.
            let mut parent_data = parent.write().map_err(|_| poisoned())?;
            let slot = parent_data
                .associations
                .entry(relation.to_string())
                .or_insert(AssociationValue::One(None));
            if let Some((child_ref, _)) = child {
                if matches!(slot, AssociationValue::One(None)) {
                    *slot = AssociationValue::One(Some(child_ref));
                }
            }
        }
        Ok(())
    }

    /// Shape one root's contribution into a top-level result.
    fn build_result(
        bare: bool,
        root: &EntityResult,
        entity: Option<EntityRef>,
        scalars: Option<Vec<(String, Value)>>,
    ) -> HydratedRow {
        if bare {
            return HydratedRow::Entity(entity);
        }
        let mut record = ResultRecord::new();
        let label = root
            .result_name
            .clone()
            .map_or(ResultLabel::Position(0), ResultLabel::Name);
        record.insert(label, ResultItem::Entity(entity));
        if let Some(values) = scalars {
            for (name, value) in values {
                record.insert(ResultLabel::Name(name), ResultItem::Scalar(value));
            }
        }
        HydratedRow::Record(record)
    }

    /// The key placing a present root into a keyed set, if one applies.
    fn result_key(
        rsm: &ResultSetMapping,
        row: &Row,
        root: &EntityResult,
        entity: Option<&EntityRef>,
    ) -> Result<Option<ValueKey>> {
        if let Some(field) = rsm.index_by(&root.alias) {
            let Some(entity) = entity else {
                return Ok(None);
            };
            let value = entity
                .read()
                .map_err(|_| poisoned())?
                .field(field)
                .cloned()
                .unwrap_or(Value::Null);
            return Ok(Some(ValueKey::new(value)));
        }
        Self::scalar_key(rsm, row)
    }

    /// The key from the scalar index-by column, if one is configured.
    fn scalar_key(rsm: &ResultSetMapping, row: &Row) -> Result<Option<ValueKey>> {
        let Some(column) = rsm.scalar_index_by() else {
            return Ok(None);
        };
        let raw = row.get_by_name(column).cloned().unwrap_or(Value::Null);
        let value = match rsm.scalars().iter().find(|s| s.column == column) {
            Some(scalar) => coerce(&raw, &scalar.ty).map_err(|e| label_column(e, column))?,
            None => raw,
        };
        Ok(Some(ValueKey::new(value)))
    }
}

/// Lazy hydration over a row source.
///
/// Emits a completed top-level result when the root identity changes or
/// the source ends. Not restartable; the source is closed when iteration
/// finishes, fails, or the iterator is dropped.
pub struct ResultIterator<'h, 'r, S: RowSource> {
    hydrator: &'h Hydrator<'r>,
    rsm: &'h ResultSetMapping,
    root: EntityResult,
    root_index: usize,
    bare: bool,
    source: S,
    ctx: HydrationContext,
    /// The open result and its root identity hash; `None` hash for an
    /// absent root, which never merges.
    pending: Option<(Option<u64>, HydratedRow)>,
    done: bool,
}

impl<'h, 'r, S: RowSource> ResultIterator<'h, 'r, S> {
    fn finish(&mut self) {
        self.done = true;
        self.source.close();
    }

    /// Fold one row in; returns a result completed by this row, if any.
    fn step(&mut self, row: &Row) -> Result<Option<HydratedRow>> {
        let outcome = self.hydrator.hydrate_row(self.rsm, &mut self.ctx, row)?;
        let state = outcome
            .roots
            .into_iter()
            .nth(self.root_index)
            .unwrap_or(RootState::Absent);

        match state {
            RootState::Entity(entity, hash) => {
                if let Some((Some(open_hash), _)) = &self.pending {
                    if *open_hash == hash {
                        // Contiguous row for the open root; children were
                        // merged through the shared instance already.
                        return Ok(None);
                    }
                }
                let fresh = Hydrator::build_result(
                    self.bare,
                    &self.root,
                    Some(entity),
                    Some(outcome.scalars),
                );
                Ok(self.pending.replace((Some(hash), fresh)).map(|(_, r)| r))
            }
            RootState::Absent | RootState::Skipped => {
                let fresh =
                    Hydrator::build_result(self.bare, &self.root, None, Some(outcome.scalars));
                Ok(self.pending.replace((None, fresh)).map(|(_, r)| r))
            }
        }
    }
}

impl<'h, 'r, S: RowSource> Iterator for ResultIterator<'h, 'r, S> {
    type Item = Result<HydratedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.source.next_row() {
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.finish();
                    return self.pending.take().map(|(_, result)| Ok(result));
                }
                Ok(Some(row)) => match self.step(&row) {
                    Err(e) => {
                        self.finish();
                        return Some(Err(e));
                    }
                    Ok(Some(ready)) => return Some(Ok(ready)),
                    Ok(None) => {}
                },
            }
        }
    }
}

impl<'h, 'r, S: RowSource> Drop for ResultIterator<'h, 'r, S> {
    fn drop(&mut self) {
        self.source.close();
    }
}

fn label_column(err: Error, column: &str) -> Error {
    match err {
        Error::Type(mut te) => {
            te.column = Some(column.to_string());
            Error::Type(te)
        }
        other => other,
    }
}

fn poisoned() -> Error {
    Error::Custom("entity lock poisoned".to_string())
}
