use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use paint_squares::config::GridConfig;
use paint_squares::ctx::Ctx;
use paint_squares::io::layout::RecordingPaths;
use paint_squares::io::matrices::TsvMatrixWriter;
use paint_squares::math::curve_fit::{DecayFitter, FitResult, HistogramPoint};
use paint_squares::pipeline::Pipeline;
use paint_squares::schema::v1::RecordingMeta;
use paint_squares::squares::{GridMatrices, GridObserver};
use tempfile::TempDir;

struct FixedFitter;

impl DecayFitter for FixedFitter {
    fn fit(&self, _histogram: &[HistogramPoint]) -> FitResult {
        FitResult::Converged {
            tau: 99.9,
            r_squared: 0.99,
        }
    }
}

struct Collect(Rc<RefCell<Vec<(String, GridMatrices)>>>);

impl GridObserver for Collect {
    fn on_matrices(&mut self, recording: &str, matrices: &GridMatrices) -> anyhow::Result<()> {
        self.0
            .borrow_mut()
            .push((recording.to_string(), matrices.clone()));
        Ok(())
    }
}

fn setup(tmp: &TempDir) -> Ctx {
    let exp = tmp.path();
    let name = "cell-threshold-10";
    let tracks_dir = exp.join(name).join("tracks");
    fs::create_dir_all(&tracks_dir).unwrap();
    let mut body = String::from(
        "TRACK_ID,TRACK_X_LOCATION,TRACK_Y_LOCATION,TRACK_DURATION,DIFFUSION_COEFFICIENT\n",
    );
    for i in 0..6 {
        body.push_str(&format!("{i},0.{},0.3,1.{i},0.5\n", i + 1));
    }
    body.push_str("6,1.5,1.5,2.0,0.5\n");
    fs::write(tracks_dir.join(format!("{name}-tracks.csv")), body).unwrap();

    let config = GridConfig {
        grid_size: 2,
        field_extent: 2.0,
        min_tracks_for_decay: 3,
        ..GridConfig::default()
    };
    let meta = RecordingMeta {
        ext_recording_name: name.to_string(),
        concentration: 1.0,
        ..RecordingMeta::default()
    };
    let mut ctx = Ctx::new(config, meta, RecordingPaths::new(exp, name));
    ctx.fitter = Rc::new(FixedFitter);
    ctx
}

#[test]
fn observers_receive_final_matrices() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = setup(&tmp);
    let seen = Rc::new(RefCell::new(Vec::new()));
    ctx.observers.push(Box::new(Collect(Rc::clone(&seen))));
    ctx.write_outputs = false;
    ctx.background_override = Some(2.0);

    Pipeline::recording().run(&mut ctx).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    let (recording, matrices) = &seen[0];
    assert_eq!(recording, "cell-threshold-10");
    assert_eq!(matrices.count, vec![6, 0, 0, 1]);
    assert_eq!(matrices.tau, vec![99, -1, -1, -1]);
    assert_eq!(matrices.rows(&matrices.count).count(), 2);

    let set = ctx.squares().unwrap();
    assert_eq!(set.background_track_count, 2.0);
    assert_eq!(set.squares[0].density_ratio, 3.0);
    assert!(!ctx.paths.squares.exists());
}

#[test]
fn matrix_writer_emits_tsv_files() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = setup(&tmp);
    let grid_dir = ctx.paths.grid_dir.clone();
    ctx.observers.push(Box::new(TsvMatrixWriter::new(grid_dir.clone())));

    Pipeline::recording().run(&mut ctx).unwrap();

    let tau = fs::read_to_string(grid_dir.join("cell-threshold-10-tau.tsv")).unwrap();
    assert_eq!(tau, "99\t-1\n-1\t-1\n");
    assert!(grid_dir.join("cell-threshold-10-percentage.tsv").is_file());
    assert!(ctx.paths.squares.is_file());
    assert!(ctx.paths.labelled_tracks.is_file());
    let image = ctx.image.unwrap();
    assert_eq!(image.nr_tracks, 6);
}

#[test]
fn mismatched_neighbour_mask_is_reported() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = setup(&tmp);
    ctx.write_outputs = false;
    ctx.neighbour_override = Some(vec![true; 3]);

    Pipeline::recording().run(&mut ctx).unwrap();
    assert_eq!(ctx.warnings.len(), 1);
    assert!(ctx.squares().unwrap().squares[0].visible);
}

#[test]
fn missing_track_file_fails_the_recording() {
    let tmp = TempDir::new().unwrap();
    let meta = RecordingMeta {
        ext_recording_name: "absent-threshold-1".to_string(),
        ..RecordingMeta::default()
    };
    let paths = RecordingPaths::new(tmp.path(), "absent-threshold-1");
    let mut ctx = Ctx::new(GridConfig::default(), meta, paths);
    assert!(Pipeline::recording().run(&mut ctx).is_err());
}
