use super::*;
use proptest::prelude::*;

#[test]
fn default_sizes_fill_rows_without_margin() {
    let grid = PageGrid::new(Dimensions::canvas(800, 600), Dimensions::page(80, 100)).unwrap();
    assert_eq!(grid.pages_per_row(), 10);
    assert_eq!(grid.margin(), 0);
    assert_eq!(grid.capacity(), 60);

    let p = grid.placements(12);
    assert_eq!(p[0], Placement { x: 0, y: 0 });
    assert_eq!(p[9], Placement { x: 720, y: 0 });
    assert_eq!(p[10], Placement { x: 0, y: 100 });
    assert_eq!(p[11], Placement { x: 80, y: 100 });
}

#[test]
fn leftover_width_is_split_evenly() {
    let grid = PageGrid::new(Dimensions::canvas(800, 600), Dimensions::page(90, 100)).unwrap();
    assert_eq!(grid.pages_per_row(), 8);
    assert_eq!(grid.margin(), 40);
    assert_eq!(grid.placement(0), Placement { x: 40, y: 0 });
    assert_eq!(grid.placement(7), Placement { x: 670, y: 0 });
}

#[test]
fn short_last_row_keeps_full_row_margin() {
    let grid = PageGrid::new(Dimensions::canvas(300, 300), Dimensions::page(100, 100)).unwrap();
    let p = grid.placements(4);
    assert_eq!(p[3], Placement { x: 0, y: 100 });
}

#[test]
fn pages_past_the_bottom_are_still_placed() {
    let grid = PageGrid::new(Dimensions::canvas(100, 100), Dimensions::page(50, 50)).unwrap();
    let p = grid.placements(6);
    assert_eq!(p.len(), 6);
    assert_eq!(p[5], Placement { x: 50, y: 100 });
}

#[test]
fn oversized_pages_are_rejected() {
    assert!(PageGrid::new(Dimensions::canvas(100, 100), Dimensions::page(120, 50)).is_err());
    assert!(PageGrid::new(Dimensions::canvas(100, 100), Dimensions::page(50, 120)).is_err());
    assert!(layout_pages(Dimensions::canvas(100, 100), Dimensions::page(101, 10), 1).is_err());
}

#[test]
fn zero_edges_are_rejected_instead_of_dividing() {
    let canvas = Dimensions::canvas(800, 600);
    let zero_page = Dimensions { width: 0, height: 0 };
    assert!(matches!(
        PageGrid::new(canvas, zero_page),
        Err(LapseError::Validation(_))
    ));
    assert!(layout_pages(canvas, Dimensions { width: 80, height: 0 }, 3).is_err());
    assert!(PageGrid::new(Dimensions { width: 0, height: 600 }, zero_page).is_err());
}

#[test]
fn empty_page_list_yields_no_placements() {
    let p = layout_pages(Dimensions::canvas(800, 600), Dimensions::page(80, 100), 0).unwrap();
    assert!(p.is_empty());
}

fn valid_sizes() -> impl Strategy<Value = (Dimensions, Dimensions)> {
    (100u32..2000, 100u32..2000).prop_flat_map(|(cw, ch)| {
        (10u32..=cw, 10u32..=ch).prop_map(move |(pw, ph)| {
            (Dimensions::canvas(cw, ch), Dimensions::page(pw, ph))
        })
    })
}

proptest! {
    #[test]
    fn first_page_sits_at_margin((canvas, page) in valid_sizes()) {
        let grid = PageGrid::new(canvas, page).unwrap();
        let per_row = canvas.width / page.width;
        let margin = (canvas.width - per_row * page.width) / 2;
        prop_assert!(per_row >= 1);
        prop_assert_eq!(grid.placement(0), Placement { x: u64::from(margin), y: 0 });
    }

    #[test]
    fn rows_wrap_in_row_major_order((canvas, page) in valid_sizes(), i in 0usize..500) {
        let grid = PageGrid::new(canvas, page).unwrap();
        let per_row = grid.pages_per_row() as usize;
        let a = grid.placement(i);
        let b = grid.placement(i + per_row);
        prop_assert_eq!(a.x, b.x);
        prop_assert_eq!(a.y + u64::from(page.height), b.y);
    }

    #[test]
    fn full_rows_stay_within_canvas_width((canvas, page) in valid_sizes(), i in 0usize..500) {
        let grid = PageGrid::new(canvas, page).unwrap();
        let p = grid.placement(i);
        prop_assert!(p.x + u64::from(page.width) <= u64::from(canvas.width));
    }
}
