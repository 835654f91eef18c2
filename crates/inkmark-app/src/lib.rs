//! Inkmark command line: flatten annotation sets into PDFs, preview ink
//! layers and shape-correct saved sketches.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkmark_core::{PageAnnotationSet, ShapeClassifier, SketchRecord};
use inkmark_export::pdf::{load_document, media_box};
use inkmark_export::{DEFAULT_PIXEL_DENSITY, ExportCompositor, ExportOptions, PageGeometry, annotated_file_name};
use kurbo::Size;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Page size assumed when a page carries no usable MediaBox (US Letter).
const FALLBACK_PAGE_SIZE: Size = Size::new(612.0, 792.0);

#[derive(Debug, Parser)]
#[command(name = "inkmark")]
#[command(about = "Freehand PDF annotation tools")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a copy of a PDF with its annotations drawn into the pages.
    Export {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        /// Annotation set JSON, keyed by 1-based page number.
        #[arg(value_name = "ANNOTATIONS")]
        annotations: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_PIXEL_DENSITY)]
        pixel_density: f64,
        /// Width the pages were displayed at while annotating.
        #[arg(long)]
        display_width: Option<f64>,
    },
    /// Render each annotated page's ink layer to a PNG.
    Preview {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(value_name = "ANNOTATIONS")]
        annotations: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PIXEL_DENSITY)]
        pixel_density: f64,
        #[arg(long)]
        display_width: Option<f64>,
    },
    /// Replace recognizable strokes of a sketch with clean shapes.
    Shapes {
        #[arg(value_name = "SKETCH")]
        sketch: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Export { pdf, annotations, output, pixel_density, display_width } => {
            run_export(&pdf, &annotations, output.as_deref(), pixel_density, display_width)
        }
        Commands::Preview { pdf, annotations, out_dir, pixel_density, display_width } => {
            run_preview(&pdf, &annotations, &out_dir, pixel_density, display_width)
        }
        Commands::Shapes { sketch, output } => run_shapes(&sketch, output.as_deref()),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_export(
    pdf: &Path,
    annotations: &Path,
    output: Option<&Path>,
    pixel_density: f64,
    display_width: Option<f64>,
) -> Result<()> {
    let document = read_file(pdf)?;
    let set = read_annotations(annotations)?;
    let geometry = document_geometry(&document, display_width)?;

    let compositor = ExportCompositor::new(ExportOptions::default().with_pixel_density(pixel_density));
    let bytes = pollster::block_on(compositor.export(&document, &set, &geometry))
        .with_context(|| format!("failed to export {}", pdf.display()))?;

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| default_export_output(pdf));
    write_file(&output, &bytes)?;
    println!("{}", output.display());
    Ok(())
}

fn run_preview(
    pdf: &Path,
    annotations: &Path,
    out_dir: &Path,
    pixel_density: f64,
    display_width: Option<f64>,
) -> Result<()> {
    let document = read_file(pdf)?;
    let set = read_annotations(annotations)?;
    let geometry = document_geometry(&document, display_width)?;

    let compositor = ExportCompositor::new(ExportOptions::default().with_pixel_density(pixel_density));
    let layers = compositor.rasterize(&set, &geometry).context("failed to rasterize annotations")?;
    if layers.is_empty() {
        log::info!("No ink to preview in {}", annotations.display());
    }

    fs::create_dir_all(out_dir)?;
    for layer in &layers {
        let png = layer
            .encode_png()
            .with_context(|| format!("failed to encode page {}", layer.page_number()))?;
        let path = out_dir.join(format!("page-{}.png", layer.page_number()));
        write_file(&path, &png)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn run_shapes(sketch: &Path, output: Option<&Path>) -> Result<()> {
    let json = fs::read_to_string(sketch)
        .with_context(|| format!("failed to read {}", sketch.display()))?;
    let mut record = SketchRecord::from_json(&json)
        .with_context(|| format!("invalid sketch {}", sketch.display()))?;

    let classifier = ShapeClassifier::new();
    let mut strokes = record.strokes.clone();
    let mut corrected = 0;
    for (i, stroke) in strokes.iter_mut().enumerate() {
        if let Some(kind) = classifier.apply(stroke) {
            println!("stroke {i}: {kind:?}");
            corrected += 1;
        }
    }
    if corrected > 0 {
        record.set_strokes(strokes);
    }
    log::info!("Corrected {corrected} of {} stroke(s)", record.strokes.len());

    let output = output.unwrap_or(sketch);
    write_file(output, record.to_json()?.as_bytes())?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        anyhow::bail!("file does not exist: {}", path.display());
    }
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_annotations(path: &Path) -> Result<PageAnnotationSet> {
    let json = String::from_utf8(read_file(path)?)
        .with_context(|| format!("{} is not UTF-8", path.display()))?;
    PageAnnotationSet::from_json(&json)
        .with_context(|| format!("invalid annotation set {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Geometry for every page of `document`, in page order.
///
/// Without `display_width` annotations are taken to be in native page units;
/// otherwise each page was shown `display_width` wide at its own aspect ratio.
fn document_geometry(document: &[u8], display_width: Option<f64>) -> Result<Vec<PageGeometry>> {
    let doc = load_document(document).context("failed to open PDF")?;
    let geometry = doc
        .get_pages()
        .into_iter()
        .map(|(number, page_id)| {
            let native = media_box(&doc, page_id).map(|r| r.size()).unwrap_or_else(|| {
                log::warn!("Page {number} has no MediaBox, assuming US Letter");
                FALLBACK_PAGE_SIZE
            });
            display_geometry(native, display_width)
        })
        .collect();
    Ok(geometry)
}

fn display_geometry(native: Size, display_width: Option<f64>) -> PageGeometry {
    match display_width {
        Some(width) if width > 0.0 && native.width > 0.0 => {
            PageGeometry::new(native, Size::new(width, width * native.height / native.width))
        }
        _ => PageGeometry::native(native),
    }
}

fn default_export_output(pdf: &Path) -> PathBuf {
    let name = pdf.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    pdf.with_file_name(annotated_file_name(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_core::{AnnotationStore, Stroke, TextAnnotation};
    use kurbo::Point;
    use lopdf::{Document, Object, Stream, dictionary};

    fn write_test_pdf(path: &Path) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 400.into(), 600.into()],
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 1,
                "Kids" => vec![Object::Reference(page_id)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn write_annotations(path: &Path, page: u32) {
        let mut store = AnnotationStore::new();
        store.add_stroke(page, Stroke::from_points(vec![Point::new(20.0, 20.0), Point::new(120.0, 80.0)]));
        store.add_text(page, TextAnnotation::new(Point::new(40.0, 40.0), "ok"));
        fs::write(path, store.annotation_set().to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_export_writes_annotated_copy() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        let annotations = dir.path().join("report.json");
        write_test_pdf(&pdf);
        write_annotations(&annotations, 1);

        run(["inkmark", "export", pdf.to_str().unwrap(), annotations.to_str().unwrap()]).unwrap();

        let output = dir.path().join("report_annotated.pdf");
        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_export_to_missing_page_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("one.pdf");
        let annotations = dir.path().join("one.json");
        let output = dir.path().join("out.pdf");
        write_test_pdf(&pdf);
        write_annotations(&annotations, 3);

        let result = run([
            "inkmark",
            "export",
            pdf.to_str().unwrap(),
            annotations.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_preview_writes_png_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        let annotations = dir.path().join("doc.json");
        let out_dir = dir.path().join("preview");
        write_test_pdf(&pdf);
        write_annotations(&annotations, 1);

        run([
            "inkmark",
            "preview",
            pdf.to_str().unwrap(),
            annotations.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--pixel-density",
            "1",
        ])
        .unwrap();

        let png = fs::read(out_dir.join("page-1.png")).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_shapes_straightens_line() {
        let dir = tempfile::tempdir().unwrap();
        let sketch = dir.path().join("sketch.json");
        let points: Vec<Point> = (0..10)
            .map(|i| Point::new(i as f64 * 10.0, if i % 2 == 0 { 0.0 } else { 0.5 }))
            .collect();
        let record = SketchRecord::new("wobbly", vec![Stroke::from_points(points)]);
        fs::write(&sketch, record.to_json().unwrap()).unwrap();

        run(["inkmark", "shapes", sketch.to_str().unwrap()]).unwrap();

        let corrected = SketchRecord::from_json(&fs::read_to_string(&sketch).unwrap()).unwrap();
        assert_eq!(corrected.strokes[0].points().len(), 2);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let error = run(["inkmark", "export", "/nonexistent/a.pdf", "/nonexistent/a.json"]).unwrap_err();
        assert!(format!("{error:#}").contains("file does not exist"));
    }

    #[test]
    fn test_display_geometry_keeps_aspect() {
        let g = display_geometry(Size::new(400.0, 600.0), Some(200.0));
        assert_eq!(g.display, Size::new(200.0, 300.0));
        assert_eq!(g.scale().x, 2.0);
        assert_eq!(display_geometry(Size::new(400.0, 600.0), None).scale().x, 1.0);
    }
}
