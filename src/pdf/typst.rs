use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SituationError};
use crate::render::{DrawOp, RenderedDocument, Rgb, TextAlign, TextStyle};

/// Cap height used to move a baseline coordinate to the top of a text box.
const CAP_HEIGHT: f64 = 0.75;
/// Width of the box used to center or right-align free text.
const ALIGN_BOX: f64 = 500.0;

const PREAMBLE: &str = r#"// Work situation report
// Every element is placed absolutely; the layout was computed upstream.

#set text(font: ("Roboto", "Arial", "Liberation Sans", "DejaVu Sans"), size: 10pt, lang: "ro")
"#;

/// Typst source for a rendered document, plus the image files it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypstSource {
    pub source: String,
    pub images: Vec<(String, Vec<u8>)>,
}

/// Translates recorded pages into Typst markup, one page per page.
pub fn typst_source(document: &RenderedDocument) -> TypstSource {
    let geometry = &document.geometry;
    let mut source = String::from(PREAMBLE);
    let mut images = Vec::new();

    let _ = writeln!(
        source,
        "#set page(width: {}, height: {}, margin: 0pt)\n",
        pt(geometry.width),
        pt(geometry.height)
    );

    for (index, page) in document.pages.iter().enumerate() {
        if index > 0 {
            source.push_str("#pagebreak()\n");
        }
        // Anchors the page even when nothing flows on it.
        source.push_str("#box()\n");
        for op in page {
            write_op(&mut source, &mut images, op);
        }
    }

    TypstSource { source, images }
}

fn write_op(out: &mut String, images: &mut Vec<(String, Vec<u8>)>, op: &DrawOp) {
    match op {
        DrawOp::Text(item) => {
            let text = styled_text(&item.text, &item.style);
            let top = item.at.y - item.style.font_size * CAP_HEIGHT;
            let (x, body) = match item.style.align {
                TextAlign::Left => (item.at.x, text),
                TextAlign::Center => (
                    item.at.x - ALIGN_BOX / 2.0,
                    format!("box(width: {}, align(center, {text}))", pt(ALIGN_BOX)),
                ),
                TextAlign::Right => (
                    item.at.x - ALIGN_BOX,
                    format!("box(width: {}, align(right, {text}))", pt(ALIGN_BOX)),
                ),
            };
            let _ = writeln!(out, "{}", place(x, top, &body));
        }
        DrawOp::Rect { rect, fill, stroke } => {
            let body = format!(
                "rect(width: {}, height: {}, fill: {}, stroke: {})",
                pt(rect.width),
                pt(rect.height),
                paint(*fill),
                stroke_of(*stroke)
            );
            let _ = writeln!(out, "{}", place(rect.x, rect.y, &body));
        }
        DrawOp::TableRow {
            x,
            y,
            height,
            columns,
            cells,
            font_size,
            padding,
            fill,
            stroke,
            bold,
            ..
        } => {
            let mut cell_x = *x;
            for (column, lines) in columns.iter().zip(cells) {
                let style = TextStyle {
                    font_size: *font_size,
                    align: column.align,
                    color: Rgb::BLACK,
                    bold: *bold,
                };
                let content = lines
                    .iter()
                    .map(|line| format!("#{}", styled_text(line, &style)))
                    .collect::<Vec<_>>()
                    .join("#linebreak()");
                let body = format!(
                    "box(width: {}, height: {}, fill: {}, stroke: {}, inset: {}, align({} + top)[{}])",
                    pt(column.width),
                    pt(*height),
                    paint(*fill),
                    stroke_of(Some(*stroke)),
                    pt(*padding),
                    alignment(column.align),
                    content
                );
                let _ = writeln!(out, "{}", place(cell_x, *y, &body));
                cell_x += column.width;
            }
        }
        DrawOp::Image { image, rect } => {
            let name = format!("image-{}.{}", images.len(), image.format.extension());
            let body = format!(
                "image(\"{}\", width: {}, height: {})",
                name,
                pt(rect.width),
                pt(rect.height)
            );
            let _ = writeln!(out, "{}", place(rect.x, rect.y, &body));
            images.push((name, image.data.clone()));
        }
    }
}

fn place(x: f64, y: f64, body: &str) -> String {
    format!("#place(top + left, dx: {}, dy: {}, {})", pt(x), pt(y), body)
}

fn styled_text(text: &str, style: &TextStyle) -> String {
    let weight = if style.bold { ", weight: \"bold\"" } else { "" };
    format!(
        "text(size: {}, fill: {}{}, \"{}\")",
        pt(style.font_size),
        color(style.color),
        weight,
        escape(text)
    )
}

fn alignment(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
    }
}

fn pt(value: f64) -> String {
    format!("{value:.2}pt")
}

fn color(rgb: Rgb) -> String {
    format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b)
}

fn paint(fill: Option<Rgb>) -> String {
    fill.map(color).unwrap_or_else(|| "none".to_string())
}

fn stroke_of(stroke: Option<Rgb>) -> String {
    stroke
        .map(|rgb| format!("0.5pt + {}", color(rgb)))
        .unwrap_or_else(|| "none".to_string())
}

/// Escapes a Typst string literal.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Compiles a rendered document to a PDF file using the Typst CLI.
pub fn compile_pdf(document: &RenderedDocument, output_path: &Path) -> Result<()> {
    // Check if typst is available
    let typst_check = Command::new("typst").arg("--version").output();
    if typst_check.is_err() {
        return Err(SituationError::TypstNotFound);
    }

    let work_dir = work_dir()?;
    let result = compile_in(&work_dir, document, output_path);
    let _ = std::fs::remove_dir_all(&work_dir);
    result
}

/// Compiles a rendered document and returns the PDF bytes without keeping
/// a file around.
pub fn compile_pdf_bytes(document: &RenderedDocument) -> Result<Vec<u8>> {
    let typst_check = Command::new("typst").arg("--version").output();
    if typst_check.is_err() {
        return Err(SituationError::TypstNotFound);
    }

    let work_dir = work_dir()?;
    let output_path = work_dir.join("preview.pdf");
    let result = compile_in(&work_dir, document, &output_path)
        .and_then(|()| std::fs::read(&output_path).map_err(SituationError::from));
    let _ = std::fs::remove_dir_all(&work_dir);
    result
}

fn work_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("situatie-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn compile_in(work_dir: &Path, document: &RenderedDocument, output_path: &Path) -> Result<()> {
    let TypstSource { source, images } = typst_source(document);

    for (name, data) in &images {
        std::fs::write(work_dir.join(name), data)?;
    }
    let template_path = work_dir.join("report.typ");
    std::fs::write(&template_path, &source)?;

    // Run typst compile with root set to the work directory
    let output = Command::new("typst")
        .arg("compile")
        .arg("--root")
        .arg(work_dir)
        .arg(&template_path)
        .arg(output_path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SituationError::PdfGeneration(stderr.to_string()));
    }

    Ok(())
}
