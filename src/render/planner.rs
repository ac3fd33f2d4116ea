//! Placement of the signature block after the item table.
//!
//! The block (beneficiary banner, signatories, optional image) is never
//! split: it either fits under the table or moves, whole, to a new page.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::canvas::{PageGeometry, Point, Rect};

/// Heights of the trailing blocks, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockMetrics {
    pub signature_block_height: f64,
    pub image_block_height: f64,
    /// Space left between the table and the signature block.
    pub gap: f64,
}

impl Default for BlockMetrics {
    fn default() -> Self {
        Self {
            signature_block_height: 55.0,
            image_block_height: 35.0,
            gap: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    SamePage,
    NewPage,
}

const BANNER_OUTSET: f64 = 4.0;
const BANNER_HEIGHT: f64 = 14.0;
const BANNER_BASELINE: f64 = 10.0;
const LABEL_ROW: f64 = 24.0;
const NAME_ROW: f64 = 34.0;
const SECOND_LABEL_ROW: f64 = 44.0;
const SECOND_NAME_ROW: f64 = 54.0;
const RIGHT_COLUMN: f64 = 0.6;
const IMAGE_TOP: f64 = 2.0;
const IMAGE_SIZE: f64 = 30.0;

/// Absolute positions of everything in the signature block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignatureLayout {
    pub placement: Placement,
    pub origin: Point,
    pub banner: Rect,
    pub banner_text: Point,
    pub subcontractor_label: Point,
    pub director_label: Point,
    pub director_name: Point,
    pub executor_label: Point,
    pub executor_name: Point,
    pub site_manager_label: Point,
    pub site_manager_name: Point,
    pub image: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageLayoutPlanner {
    geometry: PageGeometry,
    metrics: BlockMetrics,
}

impl PageLayoutPlanner {
    pub fn new(geometry: PageGeometry, metrics: BlockMetrics) -> Self {
        Self { geometry, metrics }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn metrics(&self) -> &BlockMetrics {
        &self.metrics
    }

    /// Height the trailing content needs below the gap.
    pub fn required_space(&self, has_image: bool) -> f64 {
        let image = if has_image {
            self.metrics.image_block_height
        } else {
            0.0
        };
        self.metrics.signature_block_height + image
    }

    /// Same page when the block fits exactly or with room to spare.
    pub fn decide(&self, table_end_y: f64, has_image: bool) -> Placement {
        let needed = table_end_y + self.metrics.gap + self.required_space(has_image);
        if needed > self.geometry.content_bottom() {
            Placement::NewPage
        } else {
            Placement::SamePage
        }
    }

    /// Decides the placement once and derives every coordinate from the
    /// chosen origin. `table_end_y` must be the measured end of the table.
    pub fn plan(&self, table_end_y: f64, has_image: bool) -> SignatureLayout {
        let placement = self.decide(table_end_y, has_image);
        let top = match placement {
            Placement::SamePage => table_end_y + self.metrics.gap,
            Placement::NewPage => self.geometry.top_offset,
        };
        debug!(table_end_y, top, ?placement, "placed signature block");

        let left = self.geometry.margin_left;
        let right = self.geometry.width * RIGHT_COLUMN;
        let at = |x: f64, dy: f64| Point::new(x, top + dy);

        SignatureLayout {
            placement,
            origin: Point::new(left, top),
            banner: Rect::new(
                left - BANNER_OUTSET,
                top,
                self.geometry.width - 2.0 * (left - BANNER_OUTSET),
                BANNER_HEIGHT,
            ),
            banner_text: at(left, BANNER_BASELINE),
            subcontractor_label: at(right, BANNER_BASELINE),
            director_label: at(left, LABEL_ROW),
            director_name: at(left, NAME_ROW),
            executor_label: at(right, LABEL_ROW),
            executor_name: at(right, NAME_ROW),
            site_manager_label: at(right, SECOND_LABEL_ROW),
            site_manager_name: at(right, SECOND_NAME_ROW),
            image: has_image.then(|| {
                Rect::new(
                    left,
                    top + self.metrics.signature_block_height + IMAGE_TOP,
                    IMAGE_SIZE,
                    IMAGE_SIZE,
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn planner() -> PageLayoutPlanner {
        PageLayoutPlanner::new(PageGeometry::a4(), BlockMetrics::default())
    }

    #[test]
    fn required_space_counts_image_only_when_present() {
        assert_eq!(planner().required_space(false), 55.0);
        assert_eq!(planner().required_space(true), 90.0);
    }

    #[test]
    fn fits_under_the_table() {
        // 700 + 15 + 90 = 805 <= 831.89
        let layout = planner().plan(700.0, true);

        assert_eq!(layout.placement, Placement::SamePage);
        assert_eq!(layout.origin, Point::new(40.0, 715.0));
        assert_eq!(layout.director_label, Point::new(40.0, 739.0));
    }

    #[test]
    fn breaks_when_block_overflows() {
        // 780 + 15 + 90 = 885 > 831.89
        let layout = planner().plan(780.0, true);

        assert_eq!(layout.placement, Placement::NewPage);
        assert_eq!(layout.origin.y, PageGeometry::a4().top_offset);
        assert_eq!(layout.image.map(|rect| rect.y), Some(40.0 + 55.0 + 2.0));
    }

    #[test]
    fn exact_fit_stays_on_page() {
        let geometry = PageGeometry {
            height: 841.0,
            ..PageGeometry::a4()
        };
        let planner = PageLayoutPlanner::new(geometry, BlockMetrics::default());

        // 726 + 15 + 90 = 831 = 841 - 10
        assert_eq!(planner.decide(726.0, true), Placement::SamePage);
        assert_eq!(planner.decide(726.5, true), Placement::NewPage);
    }

    #[test]
    fn image_changes_the_decision() {
        // 740 + 15 + 55 = 810 fits, + 35 does not
        assert_eq!(planner().decide(740.0, false), Placement::SamePage);
        assert_eq!(planner().decide(740.0, true), Placement::NewPage);
    }

    #[test]
    fn image_sits_inside_its_block() {
        let layout = planner().plan(100.0, true);
        let image = layout.image.unwrap();

        let block_bottom = layout.origin.y + 55.0 + 35.0;
        assert!(image.bottom() <= block_bottom);
        assert!(layout.site_manager_name.y <= layout.origin.y + 55.0);
    }

    #[test]
    fn no_image_rect_without_image() {
        assert_eq!(planner().plan(100.0, false).image, None);
    }
}
