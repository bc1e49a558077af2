//! End-to-end scenarios exercising a [`CollectionRegistry`] the way a host
//! embedding this crate would: create a collection, insert through both the
//! direct and batched paths, search, persist, and recover.

use std::sync::Arc;

use omendb_core::{
    CollectionRegistry, Config, Error, Metadata, NoopMetrics, QuantizationMode, SnapshotStore,
    DEFAULT_COLLECTION,
};

fn registry(buffer_size: usize) -> CollectionRegistry {
    CollectionRegistry::new(
        Config {
            buffer_size,
            ..Config::default()
        },
        Arc::new(NoopMetrics),
    )
}

fn meta(pairs: &[(&str, &str)]) -> Metadata {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Scenario 1: insert a handful of vectors directly, search finds the
/// nearest one first.
#[test]
fn basic_add_and_search() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();

    collection.add("doc-1".into(), vec![1.0, 0.0, 0.0], None).unwrap();
    collection.add("doc-2".into(), vec![0.0, 1.0, 0.0], None).unwrap();
    collection.add("doc-3".into(), vec![0.9, 0.1, 0.0], None).unwrap();

    let results = collection.search(&[1.0, 0.0, 0.0], 2).unwrap();
    assert_eq!(results[0].0, "doc-1");
    assert!((results[0].1 - 1.0).abs() < 1e-5, "exact match should score similarity 1.0, got {}", results[0].1);
    assert!(results[1].1 < 1.0);
    assert!(results.len() <= 2);
}

/// Scenario 2: a dimension mismatch is rejected without corrupting the
/// store's established dimension.
#[test]
fn dimension_mismatch_is_rejected() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();

    collection.add("a".into(), vec![1.0, 2.0], None).unwrap();
    let err = collection.add("b".into(), vec![1.0, 2.0, 3.0], None).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(collection.count(), 1);
}

/// Scenario 3: inserting the same id twice is rejected; the original
/// vector is kept.
#[test]
fn duplicate_id_is_rejected_and_original_kept() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();

    collection.add("a".into(), vec![1.0, 0.0], None).unwrap();
    let err = collection.add("a".into(), vec![0.0, 1.0], None).unwrap_err();
    assert!(matches!(err, Error::DuplicateId(_)));
    assert_eq!(collection.get_vector("a"), Some(vec![1.0, 0.0]));
}

/// Scenario 4: a batch larger than the configured buffer size spans
/// multiple internal flushes, and every item lands in the graph once
/// explicitly flushed.
#[test]
fn batch_past_buffer_capacity_flushes_in_multiple_passes() {
    let registry = registry(4);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();

    let items: Vec<_> = (0..25)
        .map(|i| (format!("id-{i}"), vec![i as f32, 1.0], None))
        .collect();
    let added = collection.add_batch(items).unwrap();
    assert_eq!(added, 25);

    collection.flush().unwrap();
    let stats = collection.stats();
    assert_eq!(stats.count, 25);
    assert_eq!(stats.buffered, 0);
    assert_eq!(stats.indexed, 25);
}

/// Scenario 5: checkpoint, then recover into a fresh store, preserving
/// vectors and metadata well enough for a filtered search to still work.
#[test]
fn checkpoint_and_recover_preserve_metadata_filtered_search() {
    let dir = tempfile::tempdir().unwrap();
    let original_registry = registry(16);
    let original = original_registry.get(DEFAULT_COLLECTION).unwrap();

    original
        .add("tech-1".into(), vec![1.0, 0.0], Some(meta(&[("category", "tech")])))
        .unwrap();
    original
        .add("food-1".into(), vec![0.0, 1.0], Some(meta(&[("category", "food")])))
        .unwrap();
    original
        .add_batch(vec![(
            "tech-2".into(),
            vec![0.9, 0.1],
            Some(meta(&[("category", "tech")])),
        )])
        .unwrap();

    original.set_persistence(Box::new(SnapshotStore::new(dir.path().join("snap.bin")).unwrap()));
    original.checkpoint().unwrap();

    let recovered_registry = registry(16);
    let recovered = recovered_registry.get(DEFAULT_COLLECTION).unwrap();
    recovered.set_persistence(Box::new(SnapshotStore::new(dir.path().join("snap.bin")).unwrap()));
    recovered.recover().unwrap();

    assert_eq!(recovered.count(), 3);
    let filter = meta(&[("category", "tech")]);
    let results = recovered.search_with_beam(&[1.0, 0.0], 5, None, Some(&filter)).unwrap();
    assert!(results.iter().all(|(id, _, _)| id.starts_with("tech")));
    assert!(results.iter().any(|(id, _, _)| id == "tech-1"));
}

/// Scenario 6: with scalar quantization enabled before any insert, a
/// query against a vector still finds itself as the nearest match despite
/// the lossy 8-bit round trip.
#[test]
fn scalar_quantization_on_empty_store_still_recalls_self() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();
    collection.enable_scalar_quantization().unwrap();

    let vectors: Vec<Vec<f32>> = (0..20)
        .map(|i| vec![i as f32 / 20.0, 1.0 - i as f32 / 20.0, 0.5])
        .collect();
    for (i, v) in vectors.iter().enumerate() {
        collection.add(format!("id-{i}"), v.clone(), None).unwrap();
    }

    let query = &vectors[10];
    let results = collection.search(query, 1).unwrap();
    assert_eq!(results[0].0, "id-10");
}

/// P1-ish: a reserved `"default"` collection always exists and cannot be
/// deleted; other collections can be created, used, and removed
/// independently.
#[test]
fn default_collection_is_reserved_and_collections_are_isolated() {
    let registry = registry(16);
    assert!(registry.exists(DEFAULT_COLLECTION));
    assert!(registry.delete(DEFAULT_COLLECTION).is_err());

    registry.create("alt").unwrap();
    let default_collection = registry.get(DEFAULT_COLLECTION).unwrap();
    let alt_collection = registry.get("alt").unwrap();

    default_collection.add("a".into(), vec![1.0], None).unwrap();
    assert!(!alt_collection.exists("a"));

    registry.delete("alt").unwrap();
    assert!(!registry.exists("alt"));
}

/// Binary quantization is rejected once the store already holds vectors,
/// matching the scalar-quantization lifecycle rule.
#[test]
fn binary_quantization_requires_an_empty_store() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();
    collection.add("a".into(), vec![1.0, 0.0], None).unwrap();
    let err = collection.enable_binary_quantization().unwrap_err();
    assert!(matches!(err, Error::State(_)));
}

/// With binary quantization enabled, `get_vector` on a live id returns the
/// reconstructed sign pattern instead of panicking.
#[test]
fn get_vector_on_binary_quantized_store_does_not_panic() {
    let registry = registry(16);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();
    collection.enable_binary_quantization().unwrap();
    collection.add("a".into(), vec![2.0, -2.0, 1.0], None).unwrap();

    let v = collection.get_vector("a").expect("id exists");
    assert_eq!(v, vec![1.0, -1.0, 1.0]);
}

/// Deleting an id removes it from search results without needing a flush
/// or checkpoint first, whether it lives in the buffer or the graph.
#[test]
fn delete_takes_effect_immediately_in_buffer_and_graph() {
    let registry = registry(2);
    let collection = registry.get(DEFAULT_COLLECTION).unwrap();

    collection.add("graph-item".into(), vec![1.0, 0.0], None).unwrap();
    collection
        .add_batch(vec![("buffer-item".into(), vec![0.9, 0.1], None)])
        .unwrap();

    assert!(collection.delete("graph-item"));
    assert!(collection.delete("buffer-item"));

    let results = collection.search(&[1.0, 0.0], 5).unwrap();
    assert!(results.is_empty());
    assert_eq!(collection.stats().quantization, QuantizationMode::None);
}
