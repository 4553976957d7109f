use paint_squares::config::GridConfig;
use paint_squares::math::curve_fit::{DecayFitter, FitResult, HistogramPoint, MonoExpFitter};
use paint_squares::squares::stats::{DENSITY_RATIO_UNDEFINED, density_ratio};
use paint_squares::squares::{
    Decay, NeighbourMode, RejectionCounts, SquareInputs, SquareSet, Track, VisibilityThresholds,
    compute_squares, estimate_decay, with_labels, with_validity, with_visibility,
};

struct FixedFitter(FitResult);

impl DecayFitter for FixedFitter {
    fn fit(&self, _histogram: &[HistogramPoint]) -> FitResult {
        self.0
    }
}

const GOOD_FIT: FixedFitter = FixedFitter(FitResult::Converged {
    tau: 250.0,
    r_squared: 0.95,
});

fn track(x: f64, y: f64, duration: f64) -> Track {
    Track {
        x,
        y,
        duration,
        diffusion_coefficient: 0.5,
    }
}

fn small_grid(grid_size: usize, min_tracks: usize) -> GridConfig {
    GridConfig {
        grid_size,
        field_extent: grid_size as f64,
        min_tracks_for_decay: min_tracks,
        min_r_squared: 0.8,
        min_density_ratio: 2.0,
        max_variability: 10.0,
        ..GridConfig::default()
    }
}

fn raw(tracks: &[Track], config: &GridConfig, background: Option<f64>) -> SquareSet {
    let inputs = SquareInputs {
        config,
        concentration: 1.0,
        background_track_count: background,
        fitter: &GOOD_FIT,
    };
    compute_squares(tracks, &inputs)
}

fn thresholds(config: &GridConfig) -> VisibilityThresholds {
    VisibilityThresholds {
        max_variability: config.max_variability,
        min_density_ratio: config.min_density_ratio,
        neighbour_mode: config.neighbour_mode,
    }
}

fn finished(tracks: &[Track], config: &GridConfig, background: Option<f64>) -> SquareSet {
    let set = with_validity(raw(tracks, config, background));
    with_labels(with_visibility(set, &thresholds(config), None))
}

#[test]
fn one_track_per_quadrant() {
    let config = small_grid(2, 1);
    let tracks = [
        track(0.5, 0.5, 1.0),
        track(1.5, 0.5, 1.0),
        track(0.5, 1.5, 1.0),
        track(1.5, 1.5, 1.0),
    ];
    let set = raw(&tracks, &config, None);
    assert_eq!(set.total(), 4);
    assert!(set.squares.iter().all(|s| s.nr_tracks == 1));
    assert_eq!(set.track_squares, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn empty_square_is_invalid_and_hidden() {
    let config = small_grid(2, 1);
    let tracks = [track(0.2, 0.2, 1.0), track(0.4, 0.4, 2.0), track(0.6, 0.6, 3.0)];
    let set = finished(&tracks, &config, None);
    let empty = &set.squares[1];
    assert_eq!(empty.nr_tracks, 0);
    assert_eq!(empty.density, 0.0);
    assert_eq!(empty.decay.code(), -1.0);
    assert!(!empty.valid_decay);
    assert!(!empty.visible);
}

#[test]
fn too_few_tracks_and_unreliable_fit() {
    let weak = FixedFitter(FitResult::Converged {
        tau: 250.0,
        r_squared: 0.5,
    });
    let durations: Vec<f64> = (0..20).map(|i| 0.1 * (i + 1) as f64).collect();

    let short = estimate_decay(&durations[..19], 20, 0.8, &weak);
    assert_eq!(short.decay, Decay::TooFewTracks);
    assert_eq!(short.decay.code(), -1.0);

    let enough = estimate_decay(&durations, 20, 0.8, &weak);
    assert_eq!(enough.decay, Decay::Unreliable);
    assert_eq!(enough.decay.code(), -3.0);
    assert_eq!(enough.r_squared, 0.5);

    let good = estimate_decay(&durations, 20, 0.8, &GOOD_FIT);
    assert_eq!(good.decay, Decay::Fitted(250.0));
}

#[test]
fn failed_fit_is_flagged() {
    let durations = vec![1.0; 30];
    let failed = estimate_decay(&durations, 20, 0.8, &FixedFitter(FitResult::Failed));
    assert_eq!(failed.decay.code(), -2.0);
    assert_eq!(failed.r_squared, 0.0);

    let negative = FixedFitter(FitResult::Converged {
        tau: -10.0,
        r_squared: 0.99,
    });
    assert_eq!(
        estimate_decay(&durations, 20, 0.8, &negative).decay,
        Decay::FitFailed
    );
}

#[test]
fn density_ratio_is_undefined_only_without_background() {
    let config = small_grid(2, 1);
    let tracks = [track(0.5, 0.5, 1.0), track(1.5, 1.5, 1.0), track(1.6, 1.6, 1.0)];

    let none = raw(&tracks, &config, Some(0.0));
    assert!(none.squares.iter().all(|s| s.density_ratio == DENSITY_RATIO_UNDEFINED));

    let derived = raw(&tracks, &config, None);
    assert_eq!(derived.background_track_count, 1.0);
    assert!(derived.squares.iter().all(|s| s.density_ratio != DENSITY_RATIO_UNDEFINED));
    assert_eq!(derived.squares[3].density_ratio, 2.0);

    assert_eq!(density_ratio(7, 3.0), 2.3);
}

#[test]
fn labels_follow_valid_squares_in_order() {
    let config = small_grid(2, 2);
    let tracks = [
        track(0.2, 0.2, 1.0),
        track(0.3, 0.3, 2.0),
        track(1.5, 0.5, 1.0),
        track(1.5, 1.5, 1.0),
        track(1.7, 1.7, 2.0),
        track(5.0, 5.0, 2.0),
    ];
    let set = finished(&tracks, &config, None);
    let labels: Vec<usize> = set.squares.iter().map(|s| s.label_nr).collect();
    assert_eq!(labels, vec![1, 0, 0, 2]);
    assert_eq!(set.track_squares[5], None);
    assert_eq!(set.track_labels(), vec![1, 1, 0, 2, 2, 0]);
}

#[test]
fn visible_and_invisible_cover_all_squares() {
    let config = small_grid(3, 2);
    let mut tracks = Vec::new();
    for i in 0..9 {
        let (row, col) = (i / 3, i % 3);
        for k in 0..=i {
            let offset = 0.05 * k as f64;
            tracks.push(track(col as f64 + 0.1 + offset, row as f64 + 0.1, 1.0 + k as f64));
        }
    }
    let set = finished(&tracks, &config, None);
    let visible = set.visible_count();
    let invisible = set.squares.iter().filter(|s| !s.visible).count();
    assert_eq!(visible + invisible, set.total());
    assert!(visible > 0);

    let counts = RejectionCounts::of(&set);
    assert_eq!(
        counts.too_few_tracks + counts.fit_failed + counts.unreliable + counts.valid,
        counts.total
    );
    assert_eq!(counts.too_few_tracks, 1);
}

#[test]
fn filtering_twice_changes_nothing() {
    let mut config = small_grid(3, 2);
    config.neighbour_mode = NeighbourMode::Strict;
    let tracks: Vec<Track> = (0..40)
        .map(|i| track((i % 7) as f64 * 0.4, (i % 5) as f64 * 0.55, 1.0 + (i % 4) as f64))
        .collect();

    let once = finished(&tracks, &config, None);
    let twice = with_labels(with_visibility(
        with_validity(once.clone()),
        &thresholds(&config),
        None,
    ));
    assert_eq!(once, twice);
}

#[test]
fn neighbour_mask_overrides_analysis() {
    let config = small_grid(2, 1);
    let tracks = [
        track(0.5, 0.5, 1.0),
        track(0.6, 0.6, 1.0),
        track(1.5, 1.5, 1.0),
        track(1.6, 1.6, 1.0),
    ];
    let set = with_validity(raw(&tracks, &config, Some(1.0)));
    let mask = [false, true, true, true];
    let set = with_visibility(set, &thresholds(&config), Some(&mask));
    assert!(!set.squares[0].neighbour_visible);
    assert!(!set.squares[0].visible);
    assert!(set.squares[3].visible);
}

#[test]
fn strict_mode_hides_isolated_squares() {
    let mut config = small_grid(2, 1);
    config.neighbour_mode = NeighbourMode::Strict;
    let tracks = [
        track(0.5, 0.5, 1.0),
        track(0.6, 0.6, 1.0),
        track(1.5, 1.5, 1.0),
        track(1.6, 1.6, 1.0),
    ];
    let strict = finished(&tracks, &config, Some(1.0));
    assert!(strict.squares.iter().all(|s| !s.visible));

    config.neighbour_mode = NeighbourMode::Relaxed;
    let relaxed = finished(&tracks, &config, Some(1.0));
    assert!(relaxed.squares[0].visible && relaxed.squares[3].visible);
}

#[test]
fn diffusion_uses_closed_bounds() {
    let config = small_grid(2, 1);
    let mut on_edge = track(1.0, 0.5, 1.0);
    on_edge.diffusion_coefficient = 2.0;
    let set = raw(&[on_edge], &config, None);
    assert_eq!(set.squares[1].nr_tracks, 1);
    assert_eq!(set.squares[0].nr_tracks, 0);
    assert_eq!(set.squares[0].diffusion_coefficient, 2.0);
    assert_eq!(set.squares[1].diffusion_coefficient, 2.0);
    assert_eq!(set.squares[2].diffusion_coefficient, -1.0);
}

#[test]
fn recomputing_with_the_real_fitter_is_stable() {
    let config = small_grid(2, 5);
    let mut tracks = Vec::new();
    for i in 0..60 {
        let duration = 0.1 * (1 + (i * i) % 13) as f64;
        tracks.push(track(0.05 + 0.015 * i as f64, 0.3 + 0.02 * (i % 7) as f64, duration));
    }
    let fitter = MonoExpFitter::default();
    let inputs = SquareInputs {
        config: &config,
        concentration: 1.0,
        background_track_count: None,
        fitter: &fitter,
    };
    let first = compute_squares(&tracks, &inputs);
    let second = compute_squares(&tracks, &inputs);
    assert_eq!(first, second);
    assert_eq!(
        with_labels(with_visibility(with_validity(first), &thresholds(&config), None)),
        with_labels(with_visibility(with_validity(second), &thresholds(&config), None)),
    );
}

#[test]
fn missing_diffusion_only_leaves_the_mean() {
    let config = small_grid(1, 1);
    let mut unknown = track(0.2, 0.2, 3.0);
    unknown.diffusion_coefficient = f64::NAN;
    let set = raw(&[track(0.5, 0.5, 1.0), unknown], &config, None);
    assert_eq!(set.squares[0].nr_tracks, 2);
    assert_eq!(set.squares[0].max_duration, 3.0);
    assert_eq!(set.squares[0].diffusion_coefficient, 0.5);
}
