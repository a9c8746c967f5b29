use super::*;
use proptest::prelude::*;

#[test]
fn dimensions_clamp_to_floors() {
    assert_eq!(Dimensions::canvas(10, 5), Dimensions { width: 100, height: 100 });
    assert_eq!(Dimensions::page(0, 3), Dimensions { width: 10, height: 10 });
    assert_eq!(Dimensions::canvas(800, 600), Dimensions { width: 800, height: 600 });
    assert_eq!(Dimensions::page(80, 100).to_string(), "80x100");
}

proptest! {
    #[test]
    fn canvas_never_below_floor(w in 0u32..400, h in 0u32..400) {
        let d = Dimensions::canvas(w, h);
        prop_assert_eq!(d.width, w.max(MIN_CANVAS_EDGE));
        prop_assert_eq!(d.height, h.max(MIN_CANVAS_EDGE));
    }

    #[test]
    fn page_never_below_floor(w in 0u32..40, h in 0u32..40) {
        let d = Dimensions::page(w, h);
        prop_assert_eq!(d.width, w.max(MIN_PAGE_EDGE));
        prop_assert_eq!(d.height, h.max(MIN_PAGE_EDGE));
    }
}

#[test]
fn page_range_rejects_inverted_and_zero_bounds() {
    assert!(PageRange::new(Some(3), Some(2)).is_err());
    assert!(PageRange::new(Some(0), None).is_err());
    assert!(PageRange::new(None, Some(0)).is_err());
    assert!(PageRange::new(Some(2), Some(2)).is_ok());
    assert!(PageRange::new(None, None).is_ok());
}

#[test]
fn page_range_resolves_against_page_count() {
    assert_eq!(PageRange::all().resolve(4), Some((1, 4)));
    assert_eq!(PageRange::all().resolve(0), None);
    let r = PageRange::new(Some(2), Some(9)).unwrap();
    assert_eq!(r.resolve(4), Some((2, 4)));
    let r = PageRange::new(Some(5), None).unwrap();
    assert_eq!(r.resolve(4), None);
}

#[test]
fn revision_sequence_numbers_in_order() {
    let revs = Revision::sequence(["a", "b", "c"]);
    assert_eq!(revs.len(), 3);
    assert_eq!(revs[0], Revision::new("a", 0));
    assert_eq!(revs[2].position, 2);
    assert_eq!(revs[1].to_string(), "b");
}
