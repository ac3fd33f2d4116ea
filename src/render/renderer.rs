use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::canvas::{
    wrap_text, Canvas, Column, DocumentCanvas, Point, RenderedDocument, Rgb, TableRowSpec,
    TableSpec, TextAlign, TextItem, TextStyle,
};
use super::planner::{PageLayoutPlanner, Placement, SignatureLayout};
use crate::error::Result;
use crate::pdf::{compile_pdf, compile_pdf_bytes};
use crate::situation::{ReportDocument, VAT_RATE};

const TABLE_TOP: f64 = 170.0;
const TABLE_FONT_SIZE: f64 = 10.0;
const CELL_PADDING: f64 = 3.0;
const RUNNING_HEADER_Y: f64 = 24.0;
/// Space kept between banner text and whatever follows it.
const BANNER_TEXT_GAP: f64 = 8.0;
/// Advance of `…`, in ems.
const ELLIPSIS_WIDTH: f64 = 1.0;

/// Column widths in points, in table order.
const COLUMNS: [(f64, TextAlign); 7] = [
    (42.5, TextAlign::Center),
    (141.7, TextAlign::Left),
    (42.5, TextAlign::Center),
    (70.9, TextAlign::Right),
    (70.9, TextAlign::Right),
    (42.5, TextAlign::Right),
    (70.9, TextAlign::Right),
];

const TABLE_HEADER: [&str; 7] = [
    "NR. CRT",
    "DENUMIRE LUCRARI",
    "U.M.",
    "Cantitate totala",
    "Nr. Ore",
    "Tarif",
    "Valoare (RON)",
];

/// Colors of a report, passed in at render time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Theme {
    /// Banner fill.
    pub primary: Rgb,
    /// Text drawn on the banner.
    pub on_primary: Rgb,
    /// Table header fill.
    pub accent: Rgb,
    pub foreground: Rgb,
    /// Skips background fills to save ink.
    pub eco_mode: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Rgb::new(26, 189, 156),
            on_primary: Rgb::WHITE,
            accent: Rgb::new(240, 240, 240),
            foreground: Rgb::BLACK,
            eco_mode: false,
        }
    }
}

impl Theme {
    fn fill(&self, color: Rgb) -> Option<Rgb> {
        (!self.eco_mode).then_some(color)
    }

    fn banner_text(&self) -> Rgb {
        if self.eco_mode {
            self.foreground
        } else {
            self.on_primary
        }
    }
}

/// What the finished document is for. The draw sequence is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderIntent {
    Preview,
    Download,
}

/// A finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// PDF kept in memory for previewing.
    Preview { file_name: String, bytes: Vec<u8> },
    /// PDF written to disk.
    Download { path: PathBuf },
}

/// Facts about a render, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSummary {
    pub table_end_y: f64,
    pub placement: Placement,
    pub pages: usize,
    pub image_embedded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    theme: Theme,
    planner: PageLayoutPlanner,
}

impl ReportRenderer {
    pub fn new(theme: Theme, planner: PageLayoutPlanner) -> Self {
        Self { theme, planner }
    }

    pub fn planner(&self) -> &PageLayoutPlanner {
        &self.planner
    }

    /// Draws the whole report onto `canvas`: header, item table with
    /// totals, signature block and the optional image, in that order.
    pub fn render<C: Canvas>(&self, doc: &ReportDocument, canvas: &mut C) -> RenderSummary {
        let left = canvas.geometry().margin_left;
        canvas.set_running_header(self.running_header(doc, left));
        self.draw_header(doc, canvas);

        let table_end_y = canvas.draw_table(&self.item_table(doc, left));
        debug!(table_end_y, pages = canvas.page_count(), "item table laid out");

        let has_image = doc.footer_image().is_some();
        let layout = self.planner.plan(table_end_y, has_image);
        if layout.placement == Placement::NewPage {
            canvas.add_page();
        }
        self.draw_signatures(doc, &layout, canvas);

        let mut image_embedded = false;
        if let (Some(payload), Some(rect)) = (doc.footer_image(), layout.image) {
            match canvas.place_image(payload, rect) {
                Ok(()) => image_embedded = true,
                Err(error) => {
                    warn!(%error, "footer image could not be embedded, rendering without it")
                }
            }
        }

        RenderSummary {
            table_end_y,
            placement: layout.placement,
            pages: canvas.page_count(),
            image_embedded,
        }
    }

    /// Renders onto a fresh recording canvas.
    pub fn render_document(&self, doc: &ReportDocument) -> (RenderedDocument, RenderSummary) {
        let mut canvas = DocumentCanvas::new(*self.planner.geometry());
        let summary = self.render(doc, &mut canvas);
        (canvas.finish(), summary)
    }

    /// Renders and finalizes a report. A download lands in `output_dir`
    /// (or at `output_path` when given) under the report's file name.
    pub fn generate(
        &self,
        doc: &ReportDocument,
        intent: RenderIntent,
        output_dir: &Path,
        output_path: Option<PathBuf>,
    ) -> Result<Artifact> {
        let (rendered, summary) = self.render_document(doc);
        let file_name = doc.file_name("pdf");

        match intent {
            RenderIntent::Preview => {
                let bytes = compile_pdf_bytes(&rendered)?;
                info!(pages = summary.pages, size = bytes.len(), "preview ready");
                Ok(Artifact::Preview { file_name, bytes })
            }
            RenderIntent::Download => {
                let path = output_path.unwrap_or_else(|| output_dir.join(&file_name));
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                compile_pdf(&rendered, &path)?;
                info!(pages = summary.pages, path = %path.display(), "report written");
                Ok(Artifact::Download { path })
            }
        }
    }

    fn running_header(&self, doc: &ReportDocument, left: f64) -> Vec<TextItem> {
        let header = doc.header();
        vec![TextItem {
            text: format!(
                "Situație de lucrări · {} · Luna {}.{}",
                header.beneficiary, header.month, header.year
            ),
            at: Point::new(left, RUNNING_HEADER_Y),
            style: TextStyle::new(8.0).color(Rgb::new(120, 120, 120)),
        }]
    }

    fn draw_header<C: Canvas>(&self, doc: &ReportDocument, canvas: &mut C) {
        let header = doc.header();
        let geometry = *canvas.geometry();
        let left = geometry.margin_left;
        let center = geometry.width / 2.0;
        let text = TextStyle::new(12.0).color(self.theme.foreground);

        canvas.place_text(
            &format!("BENEFICIAR: {}", header.beneficiary),
            Point::new(left, 57.0),
            text,
        );
        if let Some(subcontractor) = &header.subcontractor {
            canvas.place_text(
                &format!("SUBANTREPRENOR: {subcontractor}"),
                Point::new(geometry.width * 0.6, 57.0),
                text,
            );
        }
        canvas.place_text(
            &format!("ȘANTIER: {}", header.site),
            Point::new(left, 71.0),
            text,
        );
        canvas.place_text(
            "Situație de lucrări",
            Point::new(center, 113.0),
            TextStyle::new(16.0)
                .align(TextAlign::Center)
                .color(self.theme.foreground)
                .bold(),
        );
        canvas.place_text(
            &format!("Luna {}.{}", header.month, header.year),
            Point::new(center, 142.0),
            text.align(TextAlign::Center),
        );
    }

    fn item_table(&self, doc: &ReportDocument, left: f64) -> TableSpec {
        let mut body: Vec<TableRowSpec> = doc
            .items()
            .iter()
            .map(|item| {
                TableRowSpec::plain(vec![
                    item.id.to_string(),
                    item.name.clone(),
                    item.unit.clone(),
                    item.total_quantity.normalize().to_string(),
                    item.quantity_this_month.normalize().to_string(),
                    item.rate.normalize().to_string(),
                    format!("{:.2}", item.value_this_month),
                ])
            })
            .collect();

        let totals = doc.totals();
        let vat_label = format!("TVA {}%", (VAT_RATE * Decimal::ONE_HUNDRED).normalize());
        body.push(totals_row("Total", totals.subtotal, false));
        body.push(totals_row(&vat_label, totals.tax, false));
        body.push(totals_row("Total general", totals.grand_total, true));
        body.push(totals_row("Rest de plata", totals.amount_due, true));

        TableSpec {
            x: left,
            start_y: TABLE_TOP,
            columns: COLUMNS
                .iter()
                .map(|&(width, align)| Column { width, align })
                .collect(),
            header: TABLE_HEADER.iter().map(|s| s.to_string()).collect(),
            body,
            repeat_header: true,
            font_size: TABLE_FONT_SIZE,
            padding: CELL_PADDING,
            header_fill: self.theme.fill(self.theme.accent),
            stroke: self.theme.foreground,
        }
    }

    fn draw_signatures<C: Canvas>(
        &self,
        doc: &ReportDocument,
        layout: &SignatureLayout,
        canvas: &mut C,
    ) {
        let header = doc.header();
        let theme = &self.theme;

        canvas.draw_filled_rect(
            layout.banner,
            theme.fill(theme.primary),
            Some(if theme.eco_mode { theme.primary } else { theme.foreground }),
        );
        let banner = TextStyle::new(12.0).color(theme.banner_text()).bold();
        let banner_right = if header.subcontractor.is_some() {
            layout.subcontractor_label.x - BANNER_TEXT_GAP
        } else {
            layout.banner.x + layout.banner.width - BANNER_TEXT_GAP
        };
        let beneficiary = clip_to_width(
            &header.beneficiary,
            banner_right - layout.banner_text.x,
            banner.font_size,
        );
        canvas.place_text(&beneficiary, layout.banner_text, banner);
        if header.subcontractor.is_some() {
            canvas.place_text("SUBANTREPRENOR", layout.subcontractor_label, banner);
        }

        let label = TextStyle::new(12.0).color(theme.foreground);
        let name = TextStyle::new(10.0).color(theme.foreground);
        let signatories = [
            ("Director:", &header.director, layout.director_label, layout.director_name),
            ("Executant:", &header.executor, layout.executor_label, layout.executor_name),
            (
                "Șef lucrări:",
                &header.site_manager,
                layout.site_manager_label,
                layout.site_manager_name,
            ),
        ];
        for (title, person, label_at, name_at) in signatories {
            canvas.place_text(title, label_at, label);
            canvas.place_text(person.as_deref().unwrap_or(""), name_at, name);
        }
    }
}

/// Fits `text` on one line of `max_width`, ending it with an ellipsis when
/// it had to be cut.
fn clip_to_width(text: &str, max_width: f64, font_size: f64) -> String {
    let lines = wrap_text(text, max_width, font_size);
    if lines.len() <= 1 {
        return text.trim().to_string();
    }
    let mut first = wrap_text(text, max_width - font_size * ELLIPSIS_WIDTH, font_size)
        .into_iter()
        .next()
        .unwrap_or_default();
    first.push('…');
    first
}

fn totals_row(label: &str, amount: Decimal, bold: bool) -> TableRowSpec {
    let cells = vec![
        String::new(),
        label.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        format!("{amount:.2} RON"),
    ];
    if bold {
        TableRowSpec::bold(cells)
    } else {
        TableRowSpec::plain(cells)
    }
}
