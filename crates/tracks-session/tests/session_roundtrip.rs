use std::fs;

use tracks_core::{CHAMBER_DEPTH, Magnification, Pt2, ReferencePlane};
use tracks_session::{
    DecayKind, DecayVertexLines, MeasurementSession, SaveFormat, SessionError, Slice, SlicePoint,
    Vertex, ViewLayout, event_permutation,
};

fn picks(coords: [(f64, f64); 3], slice: Slice) -> [SlicePoint; 3] {
    coords.map(|(x, y)| SlicePoint::new(x, y, slice))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two charged decays with the unit and offset circles measured on them.
fn two_radius_session() -> MeasurementSession {
    let first = Slice::new(0, 2);
    let second = Slice::new(1, 5);
    let mut session = MeasurementSession::with_description("round trip");

    session.append_decay(DecayKind::SigmaPlusToProtonPiZero, Some(first));
    session
        .measure_radius(&picks([(0.0, 1.0), (1.0, 0.0), (0.0, -1.0)], first), Some(first))
        .unwrap();

    session.append_decay(DecayKind::SigmaMinusToNeutronPiMinus, Some(second));
    session
        .measure_radius(&picks([(-6.0, 3.0), (-3.0, 2.0), (0.0, 3.0)], second), Some(second))
        .unwrap();
    session
}

fn fully_measured_session() -> MeasurementSession {
    let mut session = two_radius_session();
    let slice = Slice::new(2, 1);
    session.append_decay(DecayKind::LambdaToProtonPiMinus, Some(slice));
    session
        .measure_length(
            &[SlicePoint::new(10.0, 10.0, slice), SlicePoint::new(13.0, 14.0, slice)],
            Some(slice),
        )
        .unwrap();
    session
        .measure_stereoshift(
            Vertex::Origin,
            &[
                Pt2::new(100.0, 40.0),
                Pt2::new(104.0, 40.0),
                Pt2::new(20.0, 30.0),
                Pt2::new(21.375, 30.0),
            ],
            [Pt2::new(60.0, 60.0), Pt2::new(61.0, 60.0)],
            ReferencePlane::Front,
        )
        .unwrap();
    session
        .measure_opening_angles(&DecayVertexLines {
            vertex: Pt2::new(13.0, 14.0),
            parent_end: Pt2::new(10.0, 10.0),
            proton_end: Pt2::new(20.0, 16.0),
            pion_end: Pt2::new(12.0, 25.0),
        })
        .unwrap();
    session.update_calibration(Magnification::new(0.031, 0.0004));
    session.apply_calibration_view(true);
    session.select(1).unwrap();
    session
}

#[test]
fn table_round_trip_keeps_radii() {
    init_logging();
    let session = two_radius_session();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decays.csv");
    session.save(&path, SaveFormat::Table).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with("name,kind_index,r1,r2,r3,radius_px"));

    let loaded = MeasurementSession::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    let radii: Vec<f64> = loaded
        .records()
        .iter()
        .map(|r| r.radius_px().unwrap())
        .collect();
    assert!((radii[0] - 1.0).abs() < 1e-6);
    assert!((radii[1] - 5.0).abs() < 5e-6);
    assert_eq!(loaded.records()[1].slice(), Some(Slice::new(1, 5)));
    assert_eq!(loaded.records()[1].kind(), DecayKind::SigmaMinusToNeutronPiMinus);
}

#[test]
fn table_round_trip_keeps_every_measurement() {
    let session = fully_measured_session();
    let mut buf = Vec::new();
    tracks_session::write_table(session.records(), &mut buf).unwrap();
    let records = tracks_session::read_table(buf.as_slice()).unwrap();
    assert_eq!(records.as_slice(), session.records());
}

#[test]
fn snapshot_round_trip_is_lossless() {
    init_logging();
    let session = fully_measured_session();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    session.save_as(&path).unwrap();

    let loaded = MeasurementSession::load(&path).unwrap();
    assert_eq!(loaded, session);
    assert_eq!(loaded.selected(), Some(1));
    assert!(loaded.calibrated_view());

    let from_string = MeasurementSession::from_json(&session.to_json().unwrap()).unwrap();
    assert_eq!(from_string, session);
}

#[test]
fn calibration_propagates_and_is_idempotent() {
    let mut session = fully_measured_session();
    let m = Magnification::new(0.05, 0.001);
    session.update_calibration(m);
    let once = session.records().to_vec();
    session.update_calibration(m);
    assert_eq!(session.records(), once.as_slice());
    assert_eq!(session.calibration(), Some(m));

    for record in session.records() {
        let z = record.origin_vertex_depth_cm().unwrap_or(0.0);
        assert_eq!(record.calibration(), Some(m));
        assert!((record.magnification().unwrap() - m.at(z)).abs() < 1e-15);
    }

    let lambda = &session.records()[2];
    let depth = lambda.origin_vertex_depth_cm().unwrap();
    assert!((depth - 0.125 * CHAMBER_DEPTH).abs() < 1e-12);
    assert!((lambda.decay_length_cm().unwrap() - 5.0 * m.at(depth)).abs() < 1e-12);
}

#[test]
fn unknown_extension_is_refused() {
    let session = two_radius_session();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decays.txt");
    assert!(matches!(session.save_as(&path), Err(SessionError::UnknownFormat(_))));
    assert!(!path.exists());
}

#[test]
fn data_folder_layout_and_shared_shuffle() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    for view in ["View1_left", "view2_right", "VIEW3_top"] {
        let sub = dir.path().join(view);
        fs::create_dir(&sub).unwrap();
        for event in 0..4 {
            fs::write(sub.join(format!("event_{event:02}.png")), b"").unwrap();
        }
        fs::write(sub.join(".DS_Store"), b"").unwrap();
    }

    let layout = ViewLayout::discover(dir.path()).unwrap();
    assert_eq!(layout.event_count(), 4);
    assert!(layout.views[1].path.ends_with("view2_right"));

    let events = layout.shuffled_events(1);
    let order = event_permutation(4, 1);
    for (k, files) in events.iter().enumerate() {
        let expected = format!("event_{:02}.png", order[k]);
        for file in files {
            assert_eq!(file.file_name().unwrap().to_str().unwrap(), expected);
        }
    }
}

#[test]
fn data_folder_layout_errors() {
    let dir = tempfile::tempdir().unwrap();
    for view in ["view1", "view2"] {
        fs::create_dir(dir.path().join(view)).unwrap();
    }
    assert!(matches!(
        ViewLayout::discover(dir.path()),
        Err(SessionError::Layout(_))
    ));

    fs::create_dir(dir.path().join("view3")).unwrap();
    for view in ["view1", "view2", "view3"] {
        fs::write(dir.path().join(view).join("a.png"), b"").unwrap();
        fs::write(dir.path().join(view).join("b.png"), b"").unwrap();
    }
    fs::write(dir.path().join("view3").join("c.png"), b"").unwrap();
    assert!(matches!(
        ViewLayout::discover(dir.path()),
        Err(SessionError::Layout(_))
    ));

    fs::remove_file(dir.path().join("view3").join("c.png")).unwrap();
    assert_eq!(ViewLayout::discover(dir.path()).unwrap().event_count(), 2);
}
