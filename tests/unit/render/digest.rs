use super::*;

struct SolidPages {
    colors: Vec<[u8; 4]>,
}

impl Rasterizer for SolidPages {
    fn rasterize(
        &self,
        artifact: &Path,
        page_size: Dimensions,
        _pages: PageRange,
    ) -> LapseResult<Vec<PageImage>> {
        if !artifact.exists() {
            return Err(LapseError::unreadable_document("missing"));
        }
        Ok(self
            .colors
            .iter()
            .map(|c| RgbaImage::from_pixel(page_size.width, page_size.height, Rgba(*c)))
            .collect())
    }
}

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn renderer(dir: &Path, canvas: Dimensions, page: Dimensions, colors: Vec<[u8; 4]>) -> DocumentRenderer {
    let settings = RenderSettings {
        canvas,
        page,
        pages: PageRange::all(),
        output_dir: dir.to_path_buf(),
    };
    DocumentRenderer::new(settings, Box::new(SolidPages { colors })).unwrap()
}

#[test]
fn compose_places_pages_on_white_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let r = renderer(
        dir.path(),
        Dimensions::canvas(250, 200),
        Dimensions::page(100, 100),
        vec![],
    );
    let pages = vec![
        RgbaImage::from_pixel(100, 100, Rgba(RED)),
        RgbaImage::from_pixel(100, 100, Rgba(BLUE)),
        RgbaImage::from_pixel(100, 100, Rgba(RED)),
    ];
    let canvas = r.compose(&pages);
    assert_eq!(canvas.dimensions(), (250, 200));

    // two pages per row, 25px margin
    assert_eq!(canvas.get_pixel(10, 10).0, BACKGROUND_RGBA);
    assert_eq!(canvas.get_pixel(25, 0).0, RED);
    assert_eq!(canvas.get_pixel(125, 99).0, BLUE);
    assert_eq!(canvas.get_pixel(30, 150).0, RED);
    assert_eq!(canvas.get_pixel(200, 150).0, BACKGROUND_RGBA);
    assert_eq!(canvas.get_pixel(249, 199).0, BACKGROUND_RGBA);
}

#[test]
fn compose_clips_overflowing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let r = renderer(
        dir.path(),
        Dimensions::canvas(100, 100),
        Dimensions::page(100, 60),
        vec![],
    );
    let pages = vec![
        RgbaImage::from_pixel(100, 60, Rgba(RED)),
        RgbaImage::from_pixel(100, 60, Rgba(BLUE)),
        RgbaImage::from_pixel(100, 60, Rgba(RED)),
    ];
    let canvas = r.compose(&pages);
    assert_eq!(canvas.dimensions(), (100, 100));
    assert_eq!(canvas.get_pixel(0, 59).0, RED);
    assert_eq!(canvas.get_pixel(0, 99).0, BLUE);
}

#[test]
fn render_writes_prefixed_digest_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("doc.pdf");
    std::fs::write(&artifact, b"%PDF").unwrap();
    let out_dir = dir.path().join("digests");

    let r = renderer(
        &out_dir,
        Dimensions::canvas(800, 600),
        Dimensions::page(80, 100),
        vec![RED, BLUE],
    );
    let digest = r.render(&artifact, "7").unwrap();

    assert_eq!(digest.path, out_dir.join("7_digest.png"));
    assert!(digest.path.is_file());
    assert_eq!(digest.canvas.dimensions(), (800, 600));
    assert_eq!(digest.canvas.get_pixel(0, 0).0, RED);
    assert_eq!(digest.canvas.get_pixel(80, 0).0, BLUE);

    let on_disk = image::open(&digest.path).unwrap().to_rgba8();
    assert_eq!(on_disk, digest.canvas);
}

#[test]
fn render_propagates_unreadable_document() {
    let dir = tempfile::tempdir().unwrap();
    let r = renderer(
        dir.path(),
        Dimensions::canvas(800, 600),
        Dimensions::page(80, 100),
        vec![RED],
    );
    let err = r.render(&dir.path().join("nope.pdf"), "1").unwrap_err();
    assert!(err.is_unreadable_document());
    assert!(!dir.path().join("1_digest.png").exists());
}

#[test]
fn zero_pages_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("doc.pdf");
    std::fs::write(&artifact, b"%PDF").unwrap();
    let r = renderer(
        dir.path(),
        Dimensions::canvas(800, 600),
        Dimensions::page(80, 100),
        vec![],
    );
    assert!(r.render(&artifact, "1").unwrap_err().is_unreadable_document());
}

#[test]
fn oversized_page_is_rejected_at_construction() {
    let settings = RenderSettings {
        canvas: Dimensions::canvas(100, 100),
        page: Dimensions::page(200, 50),
        ..RenderSettings::default()
    };
    assert!(DocumentRenderer::new(settings, Box::new(SolidPages { colors: vec![] })).is_err());
}

#[test]
fn zero_page_edge_is_rejected_up_front() {
    let settings = RenderSettings {
        page: Dimensions { width: 0, height: 100 },
        ..RenderSettings::default()
    };
    let result = DocumentRenderer::new(settings, Box::new(SolidPages { colors: vec![RED] }));
    assert!(matches!(result, Err(LapseError::Validation(_))));
}
