mod canvas;
mod image;
mod planner;
mod renderer;

pub use canvas::{
    wrap_text, Canvas, Column, DocumentCanvas, DrawOp, PageGeometry, Point, Rect, RenderedDocument,
    Rgb, TableRowSpec, TableSpec, TextAlign, TextItem, TextStyle,
};
pub use image::{decode_payload, encode_payload, EmbeddedImage, ImageError, ImageFormat};
pub use planner::{BlockMetrics, PageLayoutPlanner, Placement, SignatureLayout};
pub use renderer::{Artifact, RenderIntent, RenderSummary, ReportRenderer, Theme};
