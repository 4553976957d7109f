use paint_squares::math::geometry::{DEFAULT_FIELD_EXTENT, Grid, square_area, square_bounds};

#[test]
fn squares_tile_the_field() {
    let grid = Grid::new(20, DEFAULT_FIELD_EXTENT);
    assert_eq!(grid.square_count(), 400);
    let total: f64 = (0..grid.square_count())
        .map(|s| {
            let b = grid.square_bounds(s);
            b.width() * b.height()
        })
        .sum();
    let field = DEFAULT_FIELD_EXTENT * DEFAULT_FIELD_EXTENT;
    assert!((total - field).abs() < 1e-6 * field);
    assert!((square_area(20) * 400.0 - field).abs() < 1e-6 * field);
}

#[test]
fn bounds_are_row_major() {
    let b = square_bounds(2, 1);
    assert_eq!(b.x0, DEFAULT_FIELD_EXTENT / 2.0);
    assert_eq!(b.x1, DEFAULT_FIELD_EXTENT);
    assert_eq!(b.y0, 0.0);
    let grid = Grid::new(4, 8.0);
    assert_eq!(grid.row_col(6), (1, 2));
}

#[test]
fn every_point_in_the_field_has_exactly_one_square() {
    let grid = Grid::new(5, 10.0);
    for i in 0..=50 {
        for j in 0..=50 {
            let (x, y) = (i as f64 * 0.2, j as f64 * 0.2);
            let owners = (0..grid.square_count())
                .filter(|&s| grid.square_bounds(s).contains_half_open(x, y))
                .count();
            assert_eq!(owners, 1, "({x}, {y})");
            assert!(grid.locate(x, y).is_some());
        }
    }
}

#[test]
fn shared_edges_go_to_the_upper_square() {
    let grid = Grid::new(2, 2.0);
    assert_eq!(grid.locate(1.0, 0.5), Some(1));
    assert_eq!(grid.locate(0.5, 1.0), Some(2));
    assert_eq!(grid.locate(2.0, 2.0), Some(3));
}

#[test]
fn closed_bounds_match_both_sides_of_an_edge() {
    let grid = Grid::new(2, 2.0);
    assert!(grid.square_bounds(0).contains_closed(1.0, 0.5));
    assert!(grid.square_bounds(1).contains_closed(1.0, 0.5));
    assert!(!grid.square_bounds(0).contains_half_open(1.0, 0.5));
}

#[test]
fn points_outside_the_field_are_unassigned() {
    let grid = Grid::new(2, 2.0);
    assert_eq!(grid.locate(-0.01, 1.0), None);
    assert_eq!(grid.locate(1.0, 2.01), None);
    assert_eq!(grid.locate(f64::NAN, 1.0), None);
}
