//! Draw primitives and the recording canvas.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page and y growing downwards. Text positions are baselines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::image::{decode_payload, EmbeddedImage, ImageError};
use crate::error::SituationError;
use crate::situation::ImagePayload;

/// Average advance of a glyph, as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;
const LINE_HEIGHT: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = SituationError;

    /// Parses `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SituationError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub font_size: f64,
    pub align: TextAlign,
    pub color: Rgb,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            align: TextAlign::Left,
            color: Rgb::BLACK,
            bold: false,
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A piece of text anchored at a baseline point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub text: String,
    pub at: Point,
    pub style: TextStyle,
}

/// Fixed page geometry shared by the canvas and the layout planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    /// Where content resumes on a continuation page.
    pub top_offset: f64,
    pub bottom_margin: f64,
}

impl PageGeometry {
    pub const A4_WIDTH: f64 = 595.28;
    pub const A4_HEIGHT: f64 = 841.89;

    pub fn a4() -> Self {
        Self {
            width: Self::A4_WIDTH,
            height: Self::A4_HEIGHT,
            margin_left: 40.0,
            top_offset: 40.0,
            bottom_margin: 10.0,
        }
    }

    /// Lowest y content may reach.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.bottom_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub width: f64,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRowSpec {
    pub cells: Vec<String>,
    pub bold: bool,
}

impl TableRowSpec {
    pub fn plain(cells: Vec<String>) -> Self {
        Self { cells, bold: false }
    }

    pub fn bold(cells: Vec<String>) -> Self {
        Self { cells, bold: true }
    }
}

/// A table to lay out from `start_y`, paginating body rows as needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub x: f64,
    pub start_y: f64,
    pub columns: Vec<Column>,
    pub header: Vec<String>,
    pub body: Vec<TableRowSpec>,
    pub repeat_header: bool,
    pub font_size: f64,
    pub padding: f64,
    pub header_fill: Option<Rgb>,
    pub stroke: Rgb,
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text(TextItem),
    Rect {
        rect: Rect,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    TableRow {
        x: f64,
        y: f64,
        height: f64,
        columns: Vec<Column>,
        /// Wrapped lines per cell.
        cells: Vec<Vec<String>>,
        font_size: f64,
        padding: f64,
        fill: Option<Rgb>,
        stroke: Rgb,
        bold: bool,
        header: bool,
    },
    Image {
        image: EmbeddedImage,
        rect: Rect,
    },
}

/// The drawing surface a report is rendered onto.
pub trait Canvas {
    fn geometry(&self) -> &PageGeometry;

    /// Elements redrawn at the top of every page added after this call.
    fn set_running_header(&mut self, items: Vec<TextItem>);

    fn place_text(&mut self, text: &str, at: Point, style: TextStyle);

    fn draw_filled_rect(&mut self, rect: Rect, fill: Option<Rgb>, stroke: Option<Rgb>);

    /// Embeds an image; a malformed payload leaves the page untouched.
    fn place_image(&mut self, payload: &ImagePayload, rect: Rect) -> Result<(), ImageError>;

    /// Lays out a table, breaking pages between rows, and returns the
    /// measured y where the table ends on the current page.
    fn draw_table(&mut self, table: &TableSpec) -> f64;

    fn add_page(&mut self);

    /// Number of pages so far, counting the current one.
    fn page_count(&self) -> usize;
}

/// The rendered output: one list of operations per page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Vec<DrawOp>>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Canvas that records operations page by page and measures text with
/// fixed average glyph metrics.
#[derive(Debug, Clone)]
pub struct DocumentCanvas {
    geometry: PageGeometry,
    finished: Vec<Vec<DrawOp>>,
    current: Vec<DrawOp>,
    running_header: Vec<TextItem>,
}

impl DocumentCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            finished: Vec::new(),
            current: Vec::new(),
            running_header: Vec::new(),
        }
    }

    /// Operations recorded on the current page.
    pub fn current_page(&self) -> &[DrawOp] {
        &self.current
    }

    pub fn finish(mut self) -> RenderedDocument {
        self.finished.push(self.current);
        RenderedDocument {
            geometry: self.geometry,
            pages: self.finished,
        }
    }

    fn layout_row(&self, cells: &[String], table: &TableSpec) -> (Vec<Vec<String>>, f64) {
        let lines: Vec<Vec<String>> = table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let text = cells.get(index).map(String::as_str).unwrap_or("");
                wrap_text(text, column.width - 2.0 * table.padding, table.font_size)
            })
            .collect();
        let max_lines = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = max_lines as f64 * table.font_size * LINE_HEIGHT + 2.0 * table.padding;
        (lines, height)
    }

    fn push_row(
        &mut self,
        table: &TableSpec,
        y: f64,
        laid_out: (Vec<Vec<String>>, f64),
        bold: bool,
        header: bool,
    ) -> f64 {
        let (cells, height) = laid_out;
        self.current.push(DrawOp::TableRow {
            x: table.x,
            y,
            height,
            columns: table.columns.clone(),
            cells,
            font_size: table.font_size,
            padding: table.padding,
            fill: if header { table.header_fill } else { None },
            stroke: table.stroke,
            bold,
            header,
        });
        y + height
    }
}

impl Canvas for DocumentCanvas {
    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn set_running_header(&mut self, items: Vec<TextItem>) {
        self.running_header = items;
    }

    fn place_text(&mut self, text: &str, at: Point, style: TextStyle) {
        self.current.push(DrawOp::Text(TextItem {
            text: text.to_string(),
            at,
            style,
        }));
    }

    fn draw_filled_rect(&mut self, rect: Rect, fill: Option<Rgb>, stroke: Option<Rgb>) {
        self.current.push(DrawOp::Rect { rect, fill, stroke });
    }

    fn place_image(&mut self, payload: &ImagePayload, rect: Rect) -> Result<(), ImageError> {
        let image = decode_payload(payload)?;
        self.current.push(DrawOp::Image { image, rect });
        Ok(())
    }

    fn draw_table(&mut self, table: &TableSpec) -> f64 {
        let bottom = self.geometry.content_bottom();
        let header = self.layout_row(&table.header, table);
        let header_height = header.1;

        let mut y = table.start_y;
        // Never leave the header row alone at the bottom of a page.
        if let Some(first) = table.body.first() {
            let first_height = self.layout_row(&first.cells, table).1;
            if y + header_height + first_height > bottom {
                debug!(start_y = y, "table header does not fit, starting a new page");
                self.add_page();
                y = self.geometry.top_offset;
            }
        }
        y = self.push_row(table, y, header.clone(), true, true);

        let mut rows_on_page = 0usize;
        for row in &table.body {
            let laid_out = self.layout_row(&row.cells, table);
            if y + laid_out.1 > bottom && rows_on_page > 0 {
                debug!(y, page = self.page_count(), "table row overflows, breaking page");
                self.add_page();
                y = self.geometry.top_offset;
                if table.repeat_header {
                    y = self.push_row(table, y, header.clone(), true, true);
                }
                rows_on_page = 0;
            }
            y = self.push_row(table, y, laid_out, row.bold, false);
            rows_on_page += 1;
        }

        y
    }

    fn add_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.finished.push(page);
        self.current = self
            .running_header
            .iter()
            .cloned()
            .map(DrawOp::Text)
            .collect();
    }

    fn page_count(&self) -> usize {
        self.finished.len() + 1
    }
}

/// Greedy word wrap against the average glyph width. Words longer than a
/// line are split. Always returns at least one line.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let glyph = (font_size * AVG_GLYPH_WIDTH).max(f64::EPSILON);
    let per_line = ((max_width / glyph).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > per_line {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(per_line);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let line_len = line.chars().count();
            let needed = if line.is_empty() { word.len() } else { line_len + 1 + word.len() };
            if needed > per_line && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}
