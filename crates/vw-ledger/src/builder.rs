//! Change-set builder: turns per-item write results into item changes.
//!
//! `results[i]` must describe the write of `entities[i]`. Only entities
//! whose write succeeded produce a change, in their original order, so a
//! partially failed batch is logged exactly as far as it got.

use vw_entity::Entity;

use crate::change::{ItemChange, Operation};

/// Changes tagged `operation` for every entity whose result is `Ok`.
pub fn changes_from_results<E, T, X>(
    operation: Operation,
    entity_type: &str,
    entities: &[E],
    results: &[Result<T, X>],
) -> Vec<ItemChange>
where
    E: Entity,
{
    entities
        .iter()
        .zip(results)
        .filter(|(_, result)| result.is_ok())
        .map(|(entity, _)| ItemChange::new(operation, entity_type, entity))
        .collect()
}

/// `Add` changes for the successfully created entities.
pub fn created_changes<E: Entity, T, X>(
    entity_type: &str,
    entities: &[E],
    results: &[Result<T, X>],
) -> Vec<ItemChange> {
    changes_from_results(Operation::Add, entity_type, entities, results)
}

/// `Update` changes for the successfully updated entities.
pub fn updated_changes<E: Entity, T, X>(
    entity_type: &str,
    entities: &[E],
    results: &[Result<T, X>],
) -> Vec<ItemChange> {
    changes_from_results(Operation::Update, entity_type, entities, results)
}

/// `Delete` changes for the successfully deleted entities.
pub fn deleted_changes<E: Entity, T, X>(
    entity_type: &str,
    entities: &[E],
    results: &[Result<T, X>],
) -> Vec<ItemChange> {
    changes_from_results(Operation::Delete, entity_type, entities, results)
}
