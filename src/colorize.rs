//! Per-pixel class argmax over a `[classes][height][width]` score tensor and
//! the mapping of winning classes to display colors.

use ndarray::ArrayView3;
use rayon::prelude::*;

use crate::errors::{Result, SegError};
use crate::palette::ClassColorTable;

/// Checks the tensor length against its declared shape and returns the
/// number of grid cells.
fn validate_dimensions(
    len: usize,
    width: usize,
    height: usize,
    num_classes: usize,
) -> Result<usize> {
    if width == 0 {
        return Err(SegError::invalid_argument("width", "must be positive"));
    }
    if height == 0 {
        return Err(SegError::invalid_argument("height", "must be positive"));
    }
    if num_classes == 0 {
        return Err(SegError::invalid_argument("num_classes", "must be positive"));
    }

    let plane = width
        .checked_mul(height)
        .ok_or_else(|| SegError::invalid_argument("width * height", "overflows usize"))?;
    let expected = plane.checked_mul(num_classes).ok_or_else(|| {
        SegError::invalid_argument("num_classes * width * height", "overflows usize")
    })?;

    if len != expected {
        return Err(SegError::invalid_argument(
            "scores",
            format!(
                "has {len} values, expected {num_classes} * {width} * {height} = {expected}"
            ),
        ));
    }

    Ok(plane)
}

/// Index of the highest score at `cell`. Only a strictly greater score
/// replaces the running best, so ties keep the lowest class index and NaN
/// never wins.
#[inline]
fn argmax_at(scores: &[f32], plane: usize, num_classes: usize, cell: usize) -> usize {
    let mut best_index = 0;
    let mut best_score = f32::MIN;
    for class in 0..num_classes {
        let score = scores[class * plane + cell];
        if score > best_score {
            best_score = score;
            best_index = class;
        }
    }
    best_index
}

/// Fills `out` row by row in parallel; rows are disjoint so no coordination
/// is needed.
fn fill_rows<T, F>(out: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, pixels)| {
            let offset = row * width;
            for (col, pixel) in pixels.iter_mut().enumerate() {
                *pixel = f(offset + col);
            }
        });
}

/// Winning class index for every cell, row-major.
pub fn argmax_classes(
    scores: &[f32],
    width: usize,
    height: usize,
    num_classes: usize,
) -> Result<Vec<usize>> {
    let plane = validate_dimensions(scores.len(), width, height, num_classes)?;

    let mut classes = vec![0; plane];
    fill_rows(&mut classes, width, |cell| {
        argmax_at(scores, plane, num_classes, cell)
    });
    Ok(classes)
}

/// Colors every cell with the table entry of its highest scoring class.
///
/// `scores` is laid out class-major: the score of class `c` at `(row, col)`
/// lives at `c * width * height + row * width + col`. The returned buffer
/// holds `width * height` packed `0xAARRGGBB` values, row-major.
///
/// # Errors
///
/// [`SegError::InvalidArgument`] if any dimension is zero or
/// `scores.len() != num_classes * width * height`.
pub fn colorize(
    scores: &[f32],
    width: usize,
    height: usize,
    num_classes: usize,
    table: &ClassColorTable,
) -> Result<Vec<u32>> {
    let plane = validate_dimensions(scores.len(), width, height, num_classes)?;

    let mut pixels = vec![table.default_color(); plane];
    fill_rows(&mut pixels, width, |cell| {
        table.color_for(argmax_at(scores, plane, num_classes, cell))
    });
    Ok(pixels)
}

/// [`colorize`] over a `(classes, height, width)` view, e.g. one item of a
/// model's output batch.
pub fn colorize_array(scores: ArrayView3<f32>, table: &ClassColorTable) -> Result<Vec<u32>> {
    let (num_classes, height, width) = scores.dim();
    let scores = scores.as_standard_layout();
    let flat = scores
        .as_slice()
        .ok_or_else(|| SegError::invalid_argument("scores", "is not contiguous"))?;
    colorize(flat, width, height, num_classes, table)
}

/// Colors an already computed class map.
pub fn paint_classes(classes: &[usize], table: &ClassColorTable) -> Vec<u32> {
    classes
        .par_iter()
        .map(|&class| table.color_for(class))
        .collect()
}

/// Pixel count per class. Classes at or beyond `num_classes` are ignored.
pub fn class_histogram(classes: &[usize], num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; num_classes];
    for &class in classes {
        if let Some(count) = counts.get_mut(class) {
            *count += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const BLACK: u32 = 0xFF00_0000;

    #[test]
    fn test_single_cell_picks_maximum() -> Result<()> {
        let table = ClassColorTable::new(BLACK).with_class(1, 0xFF00_FF00);
        let pixels = colorize(&[0.1, 0.9, 0.2], 1, 1, 3, &table)?;
        assert_eq!(pixels, vec![0xFF00_FF00]);
        Ok(())
    }

    #[test]
    fn test_tie_keeps_lowest_class() -> Result<()> {
        let table = ClassColorTable::new(BLACK).with_class(0, 0xFFAA_AAAA);
        let pixels = colorize(&[1.0, 2.0, 1.0, 0.5], 2, 1, 2, &table)?;
        assert_eq!(pixels, vec![0xFFAA_AAAA, 0xFFAA_AAAA]);

        let table = ClassColorTable::new(BLACK).with_class(1, 0xFF11_1111);
        let pixels = colorize(&[0.3, 0.3, 0.3], 1, 1, 3, &table)?;
        assert_eq!(pixels, vec![BLACK]);
        Ok(())
    }

    #[test]
    fn test_all_equal_scores_select_class_zero() -> Result<()> {
        let scores = vec![0.5_f32; 4 * 3 * 2];
        assert_eq!(argmax_classes(&scores, 3, 2, 4)?, vec![0; 6]);
        Ok(())
    }

    #[test]
    fn test_negative_scores_still_win() -> Result<()> {
        let table = ClassColorTable::new(BLACK).with_class(1, 0xFF00_00FF);
        let pixels = colorize(&[-50.0, -3.0, -7.5], 1, 1, 3, &table)?;
        assert_eq!(pixels, vec![0xFF00_00FF]);
        Ok(())
    }

    #[test]
    fn test_nan_never_wins() -> Result<()> {
        let classes = argmax_classes(&[f32::NAN, 0.1, 0.5, f32::NAN], 2, 1, 2)?;
        assert_eq!(classes, vec![1, 0]);
        Ok(())
    }

    #[test]
    fn test_class_major_layout() -> Result<()> {
        // 3 classes over a 2x2 grid; each cell has a different winner.
        let scores = [
            9.0, 0.0, 0.0, 0.0, // class 0
            0.0, 9.0, 0.0, 9.0, // class 1
            0.0, 0.0, 9.0, 0.0, // class 2
        ];
        assert_eq!(argmax_classes(&scores, 2, 2, 3)?, vec![0, 1, 2, 1]);
        Ok(())
    }

    #[test]
    fn test_invalid_dimensions() {
        let table = ClassColorTable::pascal_voc();
        let cases: [(&[f32], usize, usize, usize); 5] = [
            (&[0.0; 5], 2, 1, 2),
            (&[], 0, 1, 1),
            (&[], 1, 0, 1),
            (&[], 1, 1, 0),
            (&[0.0; 2], usize::MAX, 2, 1),
        ];
        for (scores, width, height, num_classes) in cases {
            let err = colorize(scores, width, height, num_classes, &table).unwrap_err();
            assert!(
                matches!(err, SegError::InvalidArgument { .. }),
                "unexpected error for {width}x{height}x{num_classes}: {err}"
            );
        }
    }

    #[test]
    fn test_deterministic_and_complete() -> Result<()> {
        let (width, height, num_classes) = (37, 23, 5);
        let scores: Vec<f32> = (0..width * height * num_classes)
            .map(|i| ((i * 7919) % 101) as f32 / 13.0)
            .collect();
        let table = ClassColorTable::new(BLACK)
            .with_class(1, 0xFFFF_0000)
            .with_class(3, 0xFF00_FF00);

        let first = colorize(&scores, width, height, num_classes, &table)?;
        let second = colorize(&scores, width, height, num_classes, &table)?;
        assert_eq!(first, second);
        assert_eq!(first.len(), width * height);
        assert!(first
            .iter()
            .all(|&c| c == BLACK || c == 0xFFFF_0000 || c == 0xFF00_FF00));

        let classes = argmax_classes(&scores, width, height, num_classes)?;
        assert_eq!(paint_classes(&classes, &table), first);
        Ok(())
    }

    #[test]
    fn test_colorize_array_matches_flat() -> Result<()> {
        let array = Array3::from_shape_fn((3, 4, 5), |(c, y, x)| ((c + 2 * y + 3 * x) % 4) as f32);
        let table = ClassColorTable::new(BLACK)
            .with_class(0, 1)
            .with_class(1, 2)
            .with_class(2, 3);

        let expected = colorize(array.as_slice().unwrap(), 5, 4, 3, &table)?;
        assert_eq!(colorize_array(array.view(), &table)?, expected);

        // a permuted view is not in standard layout
        let permuted = array.view().permuted_axes([0, 2, 1]);
        let owned = permuted.as_standard_layout().to_owned();
        assert_eq!(
            colorize_array(permuted, &table)?,
            colorize(owned.as_slice().unwrap(), 4, 5, 3, &table)?
        );
        Ok(())
    }

    #[test]
    fn test_class_histogram() {
        let counts = class_histogram(&[0, 2, 2, 5, 1, 2], 3);
        assert_eq!(counts, vec![1, 1, 3]);
    }
}
