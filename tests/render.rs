use std::fs;
use std::path::Path;
use std::sync::Arc;

use cardforge::{
    BatchReport, CardRenderer, CardSide, Field, FieldKind, FontBook, FontMetrics, FontStyle,
    MANIFEST_FILE, Project, Records, RenderError, Typeface, render_batch,
};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use pretty_assertions::assert_eq;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Every character is a box of the given width sitting on the baseline.
struct BoxFace(i32);

impl FontMetrics for BoxFace {
    fn text_width(&self, text: &str, _size: u32) -> i32 {
        text.chars().count() as i32 * self.0
    }
    fn ascent(&self, _size: u32) -> i32 {
        8
    }
    fn line_height(&self, _size: u32) -> i32 {
        10
    }
}

impl Typeface for BoxFace {
    fn metrics(&self) -> &dyn FontMetrics {
        self
    }

    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: i32,
        baseline: i32,
        size: u32,
        color: Rgba<u8>,
    ) {
        let width = self.text_width(text, size).max(1) as u32;
        draw_filled_rect_mut(image, Rect::at(x, baseline - 8).of_size(width, 8), color);
    }
}

fn fonts() -> FontBook {
    let mut book = FontBook::new();
    book.insert("Box", Arc::new(BoxFace(5)));
    book.insert("Box Bold", Arc::new(BoxFace(10)));
    book
}

/// A 100x20 front field overflowing into a 100x40 rear field.
fn project(root: &Path) -> Project {
    let mut project = Project::new("integration");
    project.set_root(root);
    project.card_size = Some([120, 60]);
    project
        .package
        .add(Field::new("body", (10, 10), (110, 30), CardSide::Front).indented(false))
        .unwrap();
    project
        .package
        .add(Field::new("more", (0, 0), (100, 40), CardSide::Rear).indented(false))
        .unwrap();
    project.package.link("body", "more").unwrap();
    project.add_mapping("body", "Text");
    project
}

fn records(csv: &str) -> Records {
    Records::from_reader(csv.as_bytes(), &Default::default()).unwrap()
}

fn solid_png(path: &Path, color: Rgba<u8>) {
    RgbaImage::from_pixel(120, 60, color).save(path).unwrap();
}

const LONG_TEXT: &str = "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj kkkk llll";

#[test]
fn overflow_continues_on_the_rear_side() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());
    let fonts = fonts();
    let data = records(&format!("Text\n{LONG_TEXT}\n"));

    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let surfaces = renderer.render(&data.record(0).unwrap()).unwrap();

    // First line sits on baseline 20 of the front, starting at x=10.
    assert_eq!(*surfaces.front.get_pixel(15, 15), BLACK);
    assert_eq!(*surfaces.front.get_pixel(5, 15), WHITE);
    // Third line is the first one on the rear, baseline 10.
    let rear = surfaces.rear.as_ref().unwrap();
    assert_eq!(*rear.get_pixel(5, 5), BLACK);
    assert_eq!(*rear.get_pixel(5, 15), WHITE);
}

#[test]
fn bold_successor_draws_with_the_bold_face() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = project(dir.path());
    project.package.get_mut("more").unwrap().style = FontStyle::Bold;
    let fonts = fonts();
    let data = records(&format!("Text\n{LONG_TEXT}\n"));

    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let surfaces = renderer.render(&data.record(0).unwrap()).unwrap();

    // The plain head keeps its 5px boxes: the gap after "aaaa" is blank.
    assert_eq!(*surfaces.front.get_pixel(32, 15), WHITE);
    // "iiii" is 40px wide in bold, so x=22 is inside it rather than in a gap.
    let rear = surfaces.rear.as_ref().unwrap();
    assert_eq!(*rear.get_pixel(22, 5), BLACK);
    // Bold wraps two words per line: "iiii jjjj" then "kkkk llll".
    assert_eq!(*rear.get_pixel(95, 5), WHITE);
    assert_eq!(*rear.get_pixel(5, 15), BLACK);
}

#[test]
fn short_text_leaves_the_rear_blank() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());
    let fonts = fonts();
    let data = records("Text\naaaa\n");

    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let surfaces = renderer.render(&data.record(0).unwrap()).unwrap();
    assert_eq!(*surfaces.front.get_pixel(15, 15), BLACK);
    assert!(surfaces.rear.unwrap().pixels().all(|p| *p == WHITE));
}

#[test]
fn batch_reports_failed_rows_and_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = project(dir.path());
    project
        .package
        .add(
            Field::new("portrait", (0, 40), (20, 60), CardSide::Front)
                .with_kind(FieldKind::Image),
        )
        .unwrap();
    project.add_mapping("portrait", "Portrait");
    solid_png(&dir.path().join("face.png"), Rgba([0xff, 0, 0, 0xff]));

    let fonts = fonts();
    let data = records("Text;Portrait\nfirst;face.png\nsecond;missing.png\nthird;\n");
    let out = dir.path().join("out");
    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let report = render_batch(&renderer, &data, &[0, 1, 2], &out, 2).unwrap();

    let mut written: Vec<String> = report
        .cards
        .iter()
        .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["1.png", "1_back.png", "3.png", "3_back.png"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row, 2);
    assert!(report.failures[0].error.contains("missing.png"));

    let first = image::open(out.join("1.png")).unwrap().to_rgba8();
    assert_eq!(*first.get_pixel(10, 50), Rgba([0xff, 0, 0, 0xff]));

    for card in &report.cards {
        assert_eq!(card.sha256.len(), 64);
        assert!(card.path.exists());
    }

    let manifest = report.write_manifest(&out).unwrap();
    assert_eq!(manifest, out.join(MANIFEST_FILE));
    let parsed: BatchReport = serde_json::from_str(&fs::read_to_string(manifest).unwrap()).unwrap();
    assert_eq!(parsed.project, "integration");
    assert_eq!(parsed.cards.len(), 4);
    assert_eq!(parsed.failures, report.failures);
}

#[test]
fn alternate_rear_is_selected_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = project(dir.path());
    let blue = Rgba([0, 0, 0xff, 0xff]);
    let green = Rgba([0, 0xff, 0, 0xff]);
    solid_png(&dir.path().join("front.png"), WHITE);
    solid_png(&dir.path().join("rear.png"), blue);
    solid_png(&dir.path().join("alt.png"), green);
    project.card_size = None;
    project.package.backgrounds.front = Some("front.png".into());
    project.package.backgrounds.rear = Some("rear.png".into());
    project.package.backgrounds.alternate_rear = Some("alt.png".into());
    project.alternate_rear_column = Some("Alt".into());

    let fonts = fonts();
    let data = records("Text;Alt\nx;yes\nx;\nx;false\n");
    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let rear_at = |row: usize| {
        let surfaces = renderer.render(&data.record(row).unwrap()).unwrap();
        *surfaces.rear.unwrap().get_pixel(110, 55)
    };
    assert_eq!(rear_at(0), green);
    assert_eq!(rear_at(1), blue);
    assert_eq!(rear_at(2), blue);
}

#[test]
fn calculated_fields_and_templates_drive_output_names() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = project(dir.path());
    project.file_name_template = "{Set}/{no}-{side}.png".into();
    project
        .package
        .add(
            Field::new("id", (0, 40), (100, 60), CardSide::Front)
                .indented(false)
                .calculated("#{no} {Set}"),
        )
        .unwrap();

    let fonts = fonts();
    let data = records("Text;Set\nhi;core\n");
    let out = dir.path().join("out");
    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let report = render_batch(&renderer, &data, &[0], &out, 1).unwrap();

    assert!(report.failures.is_empty());
    assert!(out.join("core/1-front.png").exists());
    assert!(out.join("core/1-back.png").exists());
    let front = image::open(out.join("core/1-front.png")).unwrap().to_rgba8();
    // "#1" is drawn on baseline 50 of the calculated field.
    assert_eq!(*front.get_pixel(2, 45), BLACK);
}

#[test]
fn missing_canvas_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = project(dir.path());
    project.card_size = None;
    let fonts = fonts();
    assert!(matches!(
        CardRenderer::new(&project, &fonts),
        Err(RenderError::NoCanvas)
    ));
}

#[test]
fn job_files_load_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.json");
    fs::write(
        &job,
        r#"{
            "name": "from-json",
            "card_size": [120, 60],
            "mapping": {"title": "Name"},
            "package": {
                "fields": [
                    {"name": "title", "rect": {"x": 0, "y": 0, "width": 120, "height": 20},
                     "horizontal_align": "right", "indented": false}
                ]
            }
        }"#,
    )
    .unwrap();
    let project = Project::load(&job).unwrap();
    let fonts = fonts();
    let data = records("Name\nab\n");
    let renderer = CardRenderer::new(&project, &fonts).unwrap();
    let surfaces = renderer.render(&data.record(0).unwrap()).unwrap();
    // "ab" is 10px wide, right aligned against x=120.
    assert_eq!(*surfaces.front.get_pixel(115, 6), BLACK);
    assert_eq!(*surfaces.front.get_pixel(105, 6), WHITE);
    assert!(surfaces.rear.is_none());
}
