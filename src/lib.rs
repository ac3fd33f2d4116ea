pub mod config;
pub mod error;
pub mod logging;
pub mod pdf;
pub mod render;
pub mod situation;

pub use config::{Config, LayoutSettings, ThemeSettings};
pub use error::{Result, SituationError};
pub use render::{
    Canvas, DocumentCanvas, PageLayoutPlanner, Placement, RenderIntent, ReportRenderer, Theme,
};
pub use situation::{
    compute_row_value, compute_totals, Factor, FactorFlags, ImagePayload, ReportDocument,
    ReportHeader, Totals, WorkItem, Worksheet,
};
