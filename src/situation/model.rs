use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{compute_row_value, compute_totals, Totals};
use crate::error::{Result, SituationError};

/// Which figures of a row take part in its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorFlags {
    #[serde(default)]
    pub include_total_quantity: bool,
    #[serde(default)]
    pub include_monthly_quantity: bool,
    #[serde(default)]
    pub include_rate: bool,
}

impl FactorFlags {
    pub fn all() -> Self {
        Self {
            include_total_quantity: true,
            include_monthly_quantity: true,
            include_rate: true,
        }
    }

    pub fn any(&self) -> bool {
        self.include_total_quantity || self.include_monthly_quantity || self.include_rate
    }

    pub fn is_enabled(&self, factor: Factor) -> bool {
        match factor {
            Factor::TotalQuantity => self.include_total_quantity,
            Factor::MonthlyQuantity => self.include_monthly_quantity,
            Factor::Rate => self.include_rate,
        }
    }

    pub fn toggle(&mut self, factor: Factor) {
        let flag = match factor {
            Factor::TotalQuantity => &mut self.include_total_quantity,
            Factor::MonthlyQuantity => &mut self.include_monthly_quantity,
            Factor::Rate => &mut self.include_rate,
        };
        *flag = !*flag;
    }
}

/// One of the three figures a row value can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    TotalQuantity,
    MonthlyQuantity,
    Rate,
}

impl FromStr for Factor {
    type Err = SituationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total-qty" => Ok(Factor::TotalQuantity),
            "month-qty" => Ok(Factor::MonthlyQuantity),
            "rate" => Ok(Factor::Rate),
            _ => Err(SituationError::InvalidFactor(s.to_string())),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Factor::TotalQuantity => "total-qty",
            Factor::MonthlyQuantity => "month-qty",
            Factor::Rate => "rate",
        };
        f.write_str(name)
    }
}

/// A billable line of the situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub total_quantity: Decimal,
    #[serde(default)]
    pub quantity_this_month: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    /// Derived from the other figures; refreshed by [`WorkItem::recompute`].
    #[serde(default)]
    pub value_this_month: Decimal,
    #[serde(default)]
    pub factors: FactorFlags,
}

impl WorkItem {
    /// A blank row, as a fresh form shows it.
    pub fn empty(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            unit: String::new(),
            total_quantity: Decimal::ZERO,
            quantity_this_month: Decimal::ZERO,
            rate: Decimal::ZERO,
            value_this_month: Decimal::ZERO,
            factors: FactorFlags::default(),
        }
    }

    pub fn recompute(&mut self) {
        self.value_this_month = compute_row_value(self);
    }
}

/// Opaque image source: a `data:image/...;base64,` URI or bare base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Header and signatory fields of a report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReportHeader {
    pub beneficiary: String,
    /// `None` unless the report names a subcontractor.
    pub subcontractor: Option<String>,
    pub site: String,
    pub month: String,
    pub year: String,
    pub director: Option<String>,
    pub executor: Option<String>,
    pub site_manager: Option<String>,
}

impl ReportHeader {
    fn validate(&self) -> Result<()> {
        let required = [
            ("beneficiary", &self.beneficiary),
            ("site", &self.site),
            ("month", &self.month),
            ("year", &self.year),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SituationError::MissingField(name));
            }
        }
        Ok(())
    }
}

/// Immutable snapshot of a filled-out form, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    header: ReportHeader,
    items: Vec<WorkItem>,
    footer_image: Option<ImagePayload>,
    totals: Totals,
}

impl ReportDocument {
    /// Builds a snapshot, refreshing every row value and the aggregates.
    ///
    /// Fails when a required header field is blank or there are no rows.
    pub fn new(
        header: ReportHeader,
        mut items: Vec<WorkItem>,
        footer_image: Option<ImagePayload>,
    ) -> Result<Self> {
        header.validate()?;
        if items.is_empty() {
            return Err(SituationError::NoItems);
        }

        items.iter_mut().for_each(WorkItem::recompute);
        let totals = compute_totals(&items);

        Ok(Self {
            header,
            items,
            footer_image,
            totals,
        })
    }

    pub fn header(&self) -> &ReportHeader {
        &self.header
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn footer_image(&self) -> Option<&ImagePayload> {
        self.footer_image.as_ref()
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// `Situatie_lucrari_<beneficiary>_<month>_<year>.<ext>`
    /// Name of the rendered file. Path separators and characters that
    /// filesystems reject are replaced with `_`, so the result is always a
    /// single path component.
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "Situatie_lucrari_{}_{}_{}.{}",
            file_safe(&self.header.beneficiary),
            file_safe(&self.header.month),
            file_safe(&self.header.year),
            extension
        )
    }
}

fn file_safe(part: &str) -> String {
    part.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn header() -> ReportHeader {
        ReportHeader {
            beneficiary: "SC Alfa SRL".to_string(),
            site: "Cluj".to_string(),
            month: "1-31.05".to_string(),
            year: "2026".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn toggle_flips_only_the_named_flag() {
        let mut flags = FactorFlags::default();

        flags.toggle(Factor::Rate);

        assert!(flags.include_rate);
        assert!(!flags.include_total_quantity);
        assert!(!flags.include_monthly_quantity);
        assert!(flags.is_enabled(Factor::Rate));

        flags.toggle(Factor::Rate);
        assert!(!flags.any());
    }

    #[test]
    fn factor_parses_cli_names() {
        assert_eq!("total-qty".parse::<Factor>().unwrap(), Factor::TotalQuantity);
        assert_eq!("Month-Qty".parse::<Factor>().unwrap(), Factor::MonthlyQuantity);
        assert_eq!("rate".parse::<Factor>().unwrap(), Factor::Rate);
        assert!("price".parse::<Factor>().is_err());
        assert!("hours".parse::<Factor>().is_err());
        assert!("tarif".parse::<Factor>().is_err());
    }

    #[test]
    fn snapshot_recomputes_stale_values() {
        let mut row = WorkItem::empty(1);
        row.total_quantity = dec!(10);
        row.quantity_this_month = dec!(5);
        row.rate = dec!(20);
        row.factors = FactorFlags::all();
        row.value_this_month = dec!(1);

        let doc = ReportDocument::new(header(), vec![row], None).unwrap();

        assert_eq!(doc.items()[0].value_this_month, dec!(1000));
        assert_eq!(doc.totals().grand_total, dec!(1210));
    }

    #[test]
    fn snapshot_requires_beneficiary() {
        let mut missing = header();
        missing.beneficiary = "  ".to_string();

        let err = ReportDocument::new(missing, vec![WorkItem::empty(1)], None).unwrap_err();

        assert!(matches!(err, SituationError::MissingField("beneficiary")));
    }

    #[test]
    fn snapshot_requires_rows() {
        let err = ReportDocument::new(header(), Vec::new(), None).unwrap_err();

        assert!(matches!(err, SituationError::NoItems));
    }

    #[test]
    fn file_name_follows_pattern() {
        let doc = ReportDocument::new(header(), vec![WorkItem::empty(1)], None).unwrap();

        assert_eq!(doc.file_name("pdf"), "Situatie_lucrari_SC Alfa SRL_1-31.05_2026.pdf");
    }

    #[test]
    fn file_name_stays_a_single_component() {
        let mut slashed = header();
        slashed.beneficiary = "SC A/B SRL".to_string();
        slashed.month = "../..\\05".to_string();
        let doc = ReportDocument::new(slashed, vec![WorkItem::empty(1)], None).unwrap();

        let name = doc.file_name("pdf");
        assert_eq!(name, "Situatie_lucrari_SC A_B SRL_.._.._05_2026.pdf");

        let path = std::path::Path::new("/out").join(&name);
        assert_eq!(path.parent(), Some(std::path::Path::new("/out")));
    }
}
