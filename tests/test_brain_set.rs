use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array2;
use tempfile::tempdir;

use brainset::{
    read_scenes, read_spec, BrainSet, BrainSetEvent, CaretContext, CoordinateFile, FileEncoding, LoadState,
    NodeAttributeKind, NodeClassification, NodeDataFile, Preferences, SpecFileReadMode, SurfaceType,
    TopologyFile, TopologyType,
};

const NUM_NODES: usize = 500;

/// Two rows of `n / 2` nodes, triangulated into a strip.
fn strip_tiles(n: usize) -> Vec<[usize; 3]> {
    let half = n / 2;
    let mut tiles = Vec::new();
    for i in 0..half - 1 {
        tiles.push([i, i + 1, half + i]);
        tiles.push([i + 1, half + i + 1, half + i]);
    }
    tiles
}

fn write_metric(dir: &Path, name: &str, column: &str, num_nodes: usize) {
    let mut metric: NodeDataFile<f32> = NodeDataFile::new(NodeAttributeKind::Metric);
    metric.add_column(column, (0..num_nodes).map(|i| i as f32 * 0.5).collect()).unwrap();
    metric.to_file(dir.join(name), FileEncoding::Ascii, 3).unwrap();
}

/// A closed topology and a fiducial surface of 500 nodes, plus a metric file.
fn write_subject(dir: &Path) -> PathBuf {
    TopologyFile::new(TopologyType::Closed, strip_tiles(NUM_NODES))
        .to_file(dir.join("Human.colin.L.CLOSED.topo"), FileEncoding::Binary)
        .unwrap();

    let mut positions = Array2::<f32>::zeros((NUM_NODES, 3));
    for node in 0..NUM_NODES {
        positions[[node, 0]] = (node % (NUM_NODES / 2)) as f32;
        positions[[node, 1]] = (node / (NUM_NODES / 2)) as f32;
    }
    let mut coords = CoordinateFile::new(positions);
    coords.set_surface_type(SurfaceType::Fiducial);
    coords.to_file(dir.join("Human.colin.L.FIDUCIAL.coord"), FileEncoding::Ascii, 2).unwrap();

    write_metric(dir, "Human.colin.L.thickness.metric", "thickness", NUM_NODES);
    write_metric(dir, "Human.colin.L.depth.metric", "depth", NUM_NODES);

    let spec = dir.join("Human.colin.L.spec");
    std::fs::write(&spec, "BeginHeader\nEndHeader\n\
        CLOSEDtopo_file Human.colin.L.CLOSED.topo\n\
        FIDUCIALcoord_file Human.colin.L.FIDUCIAL.coord\n\
        metric_file Human.colin.L.thickness.metric\n\
        metric_file Human.colin.L.depth.metric\n").unwrap();
    spec
}


#[test]
fn a_spec_file_sets_the_node_count_and_rejects_mismatched_files() {
    let dir = tempdir().unwrap();
    let spec = read_spec(write_subject(dir.path())).unwrap();

    let bs = BrainSet::default();
    let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
    assert!(report.is_success(), "{}", report.error_message());
    assert_eq!(4, report.files_loaded);
    assert_eq!(LoadState::Loaded, bs.load_state());
    assert_eq!(NUM_NODES, bs.number_of_nodes());
    assert_eq!(NUM_NODES, bs.node_attributes().len());
    assert_eq!(vec!["thickness", "depth"], bs.column_names(NodeAttributeKind::Metric));

    let fiducial = bs.surface_of_type(SurfaceType::Fiducial).unwrap();
    let closed = bs.selected_topology(TopologyType::Closed).unwrap();
    assert!(fiducial.uses_topology(&closed));

    assert!(bs.nodes_classified());
    assert_eq!(Some(NodeClassification::Corner), bs.node_classification(0));
    assert_eq!(Some(NodeClassification::Edge), bs.node_classification(1));

    assert_eq!(Some(String::from("Human")), bs.species());
    assert_eq!(Some(String::from("colin")), bs.subject());
    assert_eq!(Some(String::from("left")), bs.structure());

    write_metric(dir.path(), "short.metric", "short", 400);
    let err = bs.read_node_attribute_file(NodeAttributeKind::Metric, dir.path().join("short.metric"), false, true).unwrap_err();
    assert!(err.to_string().contains("different number of nodes"));
    assert_eq!(2, bs.scalar_node_data(NodeAttributeKind::Metric).unwrap().num_columns());

    let err = bs.read_node_attribute_file(NodeAttributeKind::SurfaceShape, dir.path().join("short.metric"), true, true).unwrap_err();
    assert!(err.to_string().contains("different number of nodes"));
    assert!(bs.scalar_node_data(NodeAttributeKind::SurfaceShape).unwrap().is_empty());
}


#[test]
fn several_threads_load_the_same_data() {
    let dir = tempdir().unwrap();
    let spec = read_spec(write_subject(dir.path())).unwrap();

    let prefs = Preferences { number_of_file_reading_threads: 4, ..Preferences::default() };
    let bs = BrainSet::new(Arc::new(CaretContext::with_preferences(prefs)));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let progress = move |_done: usize, total: usize, _name: &str| {
        assert_eq!(4, total);
        counter.fetch_add(1, Ordering::SeqCst);
        true
    };
    let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, Some(&progress));

    assert!(report.is_success(), "{}", report.error_message());
    assert_eq!(4, calls.load(Ordering::SeqCst));
    assert_eq!(NUM_NODES, bs.number_of_nodes());
    assert_eq!(1, bs.number_of_topology_files());
    assert_eq!(1, bs.number_of_brain_models());
    // Files of one tag are read in order.
    assert_eq!(vec!["thickness", "depth"], bs.column_names(NodeAttributeKind::Metric));
}


#[test]
fn cancelling_a_load_keeps_the_files_read_so_far() {
    let dir = tempdir().unwrap();
    let spec = read_spec(write_subject(dir.path())).unwrap();

    let bs = BrainSet::default();
    let partial_loads = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&partial_loads);
    bs.add_observer(Box::new(move |e: &BrainSetEvent| {
        if *e == (BrainSetEvent::SpecFileLoaded { cancelled: true }) {
            sink.fetch_add(1, Ordering::SeqCst);
        }
    }));

    let stop_before_metrics = |done: usize, _total: usize, _name: &str| done < 2;
    let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, Some(&stop_before_metrics));
    assert!(report.cancelled);
    assert!(report.failures.is_empty());
    assert_eq!(2, report.files_loaded);
    assert_eq!(LoadState::PartiallyLoaded, bs.load_state());
    assert_eq!(NUM_NODES, bs.number_of_nodes());
    assert!(bs.scalar_node_data(NodeAttributeKind::Metric).unwrap().is_empty());
    assert_eq!(1, partial_loads.load(Ordering::SeqCst));
}


#[test]
fn a_saved_scene_restores_files_and_display_settings() {
    let dir = tempdir().unwrap();
    let spec = read_spec(write_subject(dir.path())).unwrap();

    let bs = BrainSet::default();
    bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
    bs.set_display_column_by_name(NodeAttributeKind::Metric, "depth").unwrap();
    bs.update_display_settings(NodeAttributeKind::Metric, |ds, _| ds.scalar.user_positive_threshold = 2.5).unwrap();

    let scene = bs.save_scene("depth view");
    bs.scene_file().add_scene(scene);
    let scene_path = dir.path().join("Human.colin.L.scene");
    bs.write_scene_file(&scene_path).unwrap();

    let scenes = read_scenes(&scene_path).unwrap();
    let restored = BrainSet::default();
    restored.read_scene_file(&scene_path, false, false).unwrap();
    let messages = restored.show_scene(scenes.scene("depth view").unwrap());
    assert!(messages.is_empty(), "{:?}", messages);

    assert_eq!(NUM_NODES, restored.number_of_nodes());
    assert_eq!(1, restored.number_of_topology_files());
    assert_eq!(vec!["thickness", "depth"], restored.column_names(NodeAttributeKind::Metric));
    let ds = restored.display_settings(NodeAttributeKind::Metric).unwrap();
    assert_eq!(Some(1), ds.display_column());
    assert_eq!(2.5, ds.scalar.user_positive_threshold);
    assert_eq!(Some(String::from("colin")), restored.subject());
}


#[test]
fn written_files_are_added_to_the_loaded_spec_file() {
    let dir = tempdir().unwrap();
    let spec = read_spec(write_subject(dir.path())).unwrap();
    let bs = BrainSet::default();
    bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);

    bs.write_node_attribute_file(NodeAttributeKind::Metric, dir.path().join("both.metric"), FileEncoding::Binary).unwrap();
    assert!(bs.write_node_attribute_file(NodeAttributeKind::Paint, dir.path().join("none.paint"), FileEncoding::Ascii).is_err());

    let out = dir.path().join("copy.spec");
    bs.write_spec_file(&out, true).unwrap();
    let copy = read_spec(&out).unwrap();
    let metrics: Vec<&str> = copy.entry("metric_file").unwrap().files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(vec!["Human.colin.L.thickness.metric", "Human.colin.L.depth.metric", "both.metric"], metrics);

    let other = BrainSet::default();
    let report = other.read_spec_file(&copy, SpecFileReadMode::Replace, None);
    assert!(report.is_success(), "{}", report.error_message());
    assert_eq!(vec!["thickness", "depth", "thickness", "depth"], other.column_names(NodeAttributeKind::Metric));
}


#[test]
fn topologies_larger_than_the_first_surface_are_dropped() {
    let dir = tempdir().unwrap();
    TopologyFile::new(TopologyType::Closed, strip_tiles(8))
        .to_file(dir.path().join("big.topo"), FileEncoding::Ascii)
        .unwrap();
    let mut coords = CoordinateFile::new(Array2::zeros((6, 3)));
    coords.set_surface_type(SurfaceType::Fiducial);
    coords.to_file(dir.path().join("small.coord"), FileEncoding::Ascii, 2).unwrap();
    let spec_path = dir.path().join("sizes.spec");
    std::fs::write(&spec_path, "CLOSEDtopo_file big.topo\nFIDUCIALcoord_file small.coord\n").unwrap();
    let spec = read_spec(&spec_path).unwrap();

    let bs = BrainSet::default();
    let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
    assert_eq!(1, report.failures.len(), "{}", report.error_message());
    assert_eq!("big.topo", report.failures[0].file_name);
    assert!(report.failures[0].message.contains("references 8 nodes"));
    assert_eq!(1, report.files_loaded);

    assert_eq!(6, bs.number_of_nodes());
    assert_eq!(0, bs.number_of_topology_files());
    assert!(bs.selected_topology(TopologyType::Closed).is_none());
    assert!(bs.surface_of_type(SurfaceType::Fiducial).unwrap().topology.is_none());
    assert!(!bs.nodes_classified());
    assert!(bs.loaded_spec_file().selected_files().all(|f| !f.filename.ends_with("big.topo")));

    // Adding the files one by one gives the same result.
    let bs = BrainSet::default();
    bs.read_topology_file(dir.path().join("big.topo"), None, true).unwrap();
    bs.read_coordinate_file(dir.path().join("small.coord"), Some(SurfaceType::Fiducial), true).unwrap();
    assert_eq!(0, bs.number_of_topology_files());
    assert!(bs.surface_of_type(SurfaceType::Fiducial).unwrap().topology.is_none());
}


#[test]
fn corrupt_files_are_reported_while_the_others_load() {
    let dir = tempdir().unwrap();
    let spec_path = write_subject(dir.path());

    let topo = std::fs::read(dir.path().join("Human.colin.L.CLOSED.topo")).unwrap();
    std::fs::write(dir.path().join("truncated.topo"), &topo[..topo.len() / 2]).unwrap();
    std::fs::write(dir.path().join("corrupt.coord"), "4000000000000000000\n0 1.0 2.0 3.0\n").unwrap();
    std::fs::write(dir.path().join("huge.metric"), "BeginHeader\nencoding ASCII\nEndHeader\ntag-version 2\n\
        tag-number-of-nodes 4294967296\ntag-number-of-columns 4294967296\ntag-BEGIN-DATA\n0 1.0\n").unwrap();
    let mut text = std::fs::read_to_string(&spec_path).unwrap();
    text.push_str("OPENtopo_file truncated.topo\nINFLATEDcoord_file corrupt.coord\nmetric_file huge.metric\n");
    std::fs::write(&spec_path, text).unwrap();
    let spec = read_spec(&spec_path).unwrap();

    let bs = BrainSet::default();
    let report = bs.read_spec_file(&spec, SpecFileReadMode::Replace, None);
    let mut failed: Vec<&str> = report.failures.iter().map(|f| f.file_name.as_str()).collect();
    failed.sort();
    assert_eq!(vec!["corrupt.coord", "huge.metric", "truncated.topo"], failed, "{}", report.error_message());
    assert_eq!(4, report.files_loaded);
    assert_eq!(LoadState::Loaded, bs.load_state());

    assert_eq!(NUM_NODES, bs.number_of_nodes());
    assert_eq!(1, bs.number_of_topology_files());
    assert_eq!(1, bs.number_of_brain_models());
    assert!(bs.surface_of_type(SurfaceType::Inflated).is_none());
    assert_eq!(vec!["thickness", "depth"], bs.column_names(NodeAttributeKind::Metric));
    assert!(bs.nodes_classified());
}
