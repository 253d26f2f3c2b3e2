//! Grid partitioning of decoded images.
//!
//! Cells tile the image exactly. When a dimension does not divide evenly the
//! trailing cells along that axis are one pixel larger, so every row (and
//! every column) of cells differs in size by at most one pixel.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::SplitError;
use crate::models::{CellIndex, SplitPlan, SubImage};

/// Pixel rectangle of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub index: CellIndex,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Split `length` pixels into `parts` spans of `(offset, size)`.
fn spans(length: u32, parts: u32) -> Vec<(u32, u32)> {
    let base = length / parts;
    let first_wide = parts - length % parts;
    (0..parts)
        .map(|i| {
            let offset = i * base + i.saturating_sub(first_wide);
            let size = if i >= first_wide { base + 1 } else { base };
            (offset, size)
        })
        .collect()
}

/// Cell rectangles for a `width`x`height` image in row-major order.
pub fn cell_rects(width: u32, height: u32, plan: SplitPlan) -> Vec<CellRect> {
    let rows = spans(height, plan.rows.get());
    let cols = spans(width, plan.cols.get());

    let mut cells = Vec::with_capacity(plan.cell_count());
    for (row, &(y, cell_height)) in rows.iter().enumerate() {
        for (col, &(x, cell_width)) in cols.iter().enumerate() {
            cells.push(CellRect {
                index: CellIndex {
                    row: row as u32,
                    col: col as u32,
                },
                x,
                y,
                width: cell_width,
                height: cell_height,
            });
        }
    }
    cells
}

/// Cut `image` into tiles following `plan`, in row-major order.
///
/// A 1x1 plan hands back the image itself. Plans with more rows or columns
/// than the image has pixels fail with [`SplitError::GridTooLarge`].
pub fn split_image(
    image: DynamicImage,
    plan: SplitPlan,
    source: &Path,
) -> Result<Vec<SubImage<'_>>, SplitError> {
    if plan.is_single() {
        return Ok(vec![SubImage {
            pixels: image,
            origin: CellIndex { row: 0, col: 0 },
            source_file: source,
        }]);
    }

    let (width, height) = image.dimensions();
    if width < plan.cols.get() || height < plan.rows.get() {
        return Err(SplitError::GridTooLarge {
            width,
            height,
            rows: plan.rows.get(),
            cols: plan.cols.get(),
        });
    }

    Ok(cell_rects(width, height, plan)
        .into_iter()
        .map(|cell| SubImage {
            pixels: image.crop_imm(cell.x, cell.y, cell.width, cell.height),
            origin: cell.index,
            source_file: source,
        })
        .collect())
}
