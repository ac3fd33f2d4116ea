mod model;
mod money;
mod worksheet;

pub use model::{Factor, FactorFlags, ImagePayload, ReportDocument, ReportHeader, WorkItem};
pub use money::{compute_row_value, compute_totals, round2, Totals, VAT_RATE};
pub use worksheet::{coerce_figure, HeaderFields, ImageSlot, ItemField, Worksheet};
