//! The editable form behind a report.
//!
//! A worksheet owns the rows while they are being edited. Every edit goes
//! through one of the operations below so that row values never go stale,
//! and a [`ReportDocument`] is only ever produced as a snapshot of it.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{Factor, ImagePayload, ReportDocument, ReportHeader, WorkItem};
use super::money::{compute_totals, Totals};
use crate::error::{Result, SituationError};

/// Header inputs exactly as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    #[serde(default)]
    pub beneficiary: String,
    #[serde(default)]
    pub has_subcontractor: bool,
    #[serde(default)]
    pub subcontractor: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub site_manager: String,
}

/// Footer image state: the loaded payload survives while it is excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    #[serde(default)]
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ImagePayload>,
}

/// Editable row fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Name,
    Unit,
    TotalQuantity,
    QuantityThisMonth,
    Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    #[serde(default)]
    pub header: HeaderFields,
    #[serde(default)]
    pub image: ImageSlot,
    #[serde(default)]
    items: Vec<WorkItem>,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self {
            header: HeaderFields::default(),
            image: ImageSlot::default(),
            items: vec![WorkItem::empty(1)],
        }
    }
}

impl Worksheet {
    /// A fresh form for `year`, with a single blank row.
    pub fn new(year: impl Into<String>) -> Self {
        let mut sheet = Self::default();
        sheet.header.year = year.into();
        sheet
    }

    /// Restores the worksheet invariants after deserialization: at least one
    /// row, dense ids in display order, and fresh row values.
    pub fn normalize(&mut self) {
        if self.items.is_empty() {
            self.items.push(WorkItem::empty(1));
        }
        self.items.sort_by_key(|item| item.id);
        for (index, item) in self.items.iter_mut().enumerate() {
            item.id = index as u32 + 1;
            item.recompute();
        }
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn item(&self, id: u32) -> Result<&WorkItem> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(SituationError::RowNotFound(id))
    }

    fn item_mut(&mut self, id: u32) -> Result<&mut WorkItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(SituationError::RowNotFound(id))
    }

    /// Appends a blank row and returns its id.
    pub fn add_row(&mut self) -> u32 {
        let id = self.items.iter().map(|item| item.id).max().unwrap_or(0) + 1;
        self.items.push(WorkItem::empty(id));
        id
    }

    /// Removes a row and renumbers the remaining rows from 1.
    pub fn delete_row(&mut self, id: u32) -> Result<WorkItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SituationError::RowNotFound(id))?;

        if self.items.len() == 1 {
            return Err(SituationError::LastRow(id));
        }

        let removed = self.items.remove(index);
        for (index, item) in self.items.iter_mut().enumerate() {
            item.id = index as u32 + 1;
        }
        Ok(removed)
    }

    /// Sets a row field from raw text. Figures that do not parse become 0.
    pub fn update_field(&mut self, id: u32, field: ItemField, value: &str) -> Result<&WorkItem> {
        let item = self.item_mut(id)?;
        match field {
            ItemField::Name => item.name = value.to_string(),
            ItemField::Unit => item.unit = value.to_string(),
            ItemField::TotalQuantity => item.total_quantity = coerce_figure(value),
            ItemField::QuantityThisMonth => item.quantity_this_month = coerce_figure(value),
            ItemField::Rate => item.rate = coerce_figure(value),
        }
        item.recompute();
        Ok(item)
    }

    /// Flips one factor flag; returns the row after recomputation.
    pub fn toggle_factor(&mut self, id: u32, factor: Factor) -> Result<&WorkItem> {
        let item = self.item_mut(id)?;
        item.factors.toggle(factor);
        item.recompute();
        Ok(item)
    }

    /// Live totals, as the form shows them while editing.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.items)
    }

    /// Stores a freshly loaded image and includes it in the report.
    pub fn set_image(&mut self, payload: ImagePayload) {
        self.image.payload = Some(payload);
        self.image.include = true;
    }

    pub fn set_include_image(&mut self, include: bool) -> Result<()> {
        if include && self.image.payload.is_none() {
            return Err(SituationError::NoImage);
        }
        self.image.include = include;
        Ok(())
    }

    /// Freezes the current form into a report document.
    ///
    /// The subcontractor is dropped entirely unless enabled, as is the image
    /// unless included. Blank signatory names become `None`.
    pub fn snapshot(&self) -> Result<ReportDocument> {
        let fields = &self.header;
        let header = ReportHeader {
            beneficiary: fields.beneficiary.trim().to_string(),
            subcontractor: fields
                .has_subcontractor
                .then(|| fields.subcontractor.trim().to_string()),
            site: fields.site.trim().to_string(),
            month: fields.month.trim().to_string(),
            year: fields.year.trim().to_string(),
            director: non_blank(&fields.director),
            executor: non_blank(&fields.executor),
            site_manager: non_blank(&fields.site_manager),
        };

        let footer_image = if self.image.include {
            self.image.payload.clone()
        } else {
            None
        };

        ReportDocument::new(header, self.items.clone(), footer_image)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Numeric coercion at the form boundary: anything that is not a
/// non-negative number becomes 0.
pub fn coerce_figure(input: &str) -> Decimal {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .filter(|value| !value.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}
