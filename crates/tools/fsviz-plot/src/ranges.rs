//! Thread element ranges and their placement over cache lines.
//!
//! A [`ThreadRange`] is a half-open span of element indices owned by one
//! worker thread. [`layout`] places a list of ranges over a byte axis for the
//! range diagram; [`detect_false_sharing`] reports pairs of threads whose
//! ranges touch a common cache line.

use crate::error::RangeError;

/// Element size used by the range diagram (one `f64`).
pub const ELEMENT_SIZE: usize = 8;

/// Cache line size in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

/// Most cache lines [`layout`] will place.
pub const MAX_CACHE_LINES: usize = 512;

/// Most ranges [`detect_false_sharing`] will compare.
pub const MAX_RANGES: usize = 4096;

/// Half-open element index range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadRange {
    start: usize,
    end: usize,
}

impl ThreadRange {
    /// Build a range; `start` must not exceed `end`.
    pub fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// First element index.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last element index.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the range holds no elements.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte span `start * element_size .. end * element_size`.
    pub fn byte_span(&self, element_size: usize) -> Result<(usize, usize), RangeError> {
        Ok((
            byte_offset(self.start, element_size, 0)?,
            byte_offset(self.end, element_size, 0)?,
        ))
    }

    /// Inclusive cache-line indices touched when the data starts `base_offset`
    /// bytes into an aligned allocation. `None` for an empty range.
    pub fn cache_lines(
        &self,
        element_size: usize,
        line_size: usize,
        base_offset: usize,
    ) -> Result<Option<(usize, usize)>, RangeError> {
        if self.is_empty() {
            return Ok(None);
        }
        let line_size = line_size.max(1);
        let first = byte_offset(self.start, element_size, base_offset)?;
        let last = byte_offset(self.end - 1, element_size, base_offset)?;
        Ok(Some((first / line_size, last / line_size)))
    }
}

/// `base + index * element_size`, or [`RangeError::Overflow`].
fn byte_offset(index: usize, element_size: usize, base: usize) -> Result<usize, RangeError> {
    index
        .checked_mul(element_size)
        .and_then(|bytes| bytes.checked_add(base))
        .ok_or(RangeError::Overflow {
            index,
            element_size,
        })
}

/// Pair up a flat `[start, end, start, end, ...]` list as parsed from the CLI.
pub fn from_pairs(flat: &[usize]) -> Result<Vec<ThreadRange>, RangeError> {
    flat.chunks_exact(2)
        .map(|pair| ThreadRange::new(pair[0], pair[1]))
        .collect()
}

/// Split `total` elements across `threads` contiguous ranges.
///
/// Every thread gets `total / threads` elements and the first
/// `total % threads` threads one extra.
pub fn even_split(total: usize, threads: usize) -> Vec<ThreadRange> {
    if threads == 0 {
        return Vec::new();
    }
    let chunk = total / threads;
    let leftover = total % threads;

    let mut start = 0;
    (0..threads)
        .map(|i| {
            let end = start + chunk + usize::from(i < leftover);
            let range = ThreadRange { start, end };
            start = end;
            range
        })
        .collect()
}

/// Dashed outline for one cache line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBox {
    /// Cache-line index.
    pub index: usize,
    /// First byte of the line.
    pub start: usize,
}

/// Filled rectangle for one thread range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRect {
    /// Position of the range in the input list.
    pub thread: usize,
    /// Source range.
    pub range: ThreadRange,
    /// First byte covered.
    pub byte_start: usize,
    /// One past the last byte covered.
    pub byte_end: usize,
    /// Bottom edge, in diagram units where cache-line boxes span `0..1`.
    pub y: f64,
    /// Rectangle height in the same units.
    pub height: f64,
}

/// Placement of cache lines and thread ranges on the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeLayout {
    /// Largest `end * element_size` over all ranges.
    pub max_extent: usize,
    /// Cache-line size in bytes.
    pub line_size: usize,
    /// Cache lines from byte 0 up to `max_extent`.
    pub lines: Vec<LineBox>,
    /// One rectangle per range, in input order.
    pub rects: Vec<RangeRect>,
}

/// Lay out `ranges` over a byte axis.
///
/// Rectangles are stacked in input order, one lane per range, so that
/// overlapping ranges stay distinguishable. Lane `i` of `n` sits at
/// `y = (i + 0.2) / n` with height `0.6 / n`.
///
/// Fails if a byte offset overflows or the ranges reach past
/// [`MAX_CACHE_LINES`] cache lines.
pub fn layout(
    ranges: &[ThreadRange],
    element_size: usize,
    line_size: usize,
) -> Result<RangeLayout, RangeError> {
    let line_size = line_size.max(1);
    let spans = ranges
        .iter()
        .map(|r| r.byte_span(element_size))
        .collect::<Result<Vec<_>, _>>()?;
    let max_extent = spans.iter().map(|&(_, end)| end).max().unwrap_or(0);

    let line_count = max_extent.div_ceil(line_size);
    if line_count > MAX_CACHE_LINES {
        return Err(RangeError::TooManyLines {
            lines: line_count,
            max: MAX_CACHE_LINES,
        });
    }
    let lines = (0..line_count)
        .map(|index| LineBox {
            index,
            start: index * line_size,
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let lane = 1.0 / ranges.len().max(1) as f64;
    let rects = ranges
        .iter()
        .zip(spans)
        .enumerate()
        .map(|(thread, (&range, (byte_start, byte_end)))| {
            #[allow(clippy::cast_precision_loss)]
            let y = (thread as f64 + 0.2) * lane;
            RangeRect {
                thread,
                range,
                byte_start,
                byte_end,
                y,
                height: 0.6 * lane,
            }
        })
        .collect();

    Ok(RangeLayout {
        max_extent,
        line_size,
        lines,
        rects,
    })
}

/// Two threads whose ranges touch a common cache line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    /// Lower thread index.
    pub first: usize,
    /// Higher thread index.
    pub second: usize,
    /// Inclusive cache lines touched by `first`.
    pub first_lines: (usize, usize),
    /// Inclusive cache lines touched by `second`.
    pub second_lines: (usize, usize),
}

/// Report every pair of ranges whose cache-line spans overlap.
///
/// `base_offset` is the byte offset of element 0 from a cache-line boundary.
/// Empty ranges and lists of fewer than two ranges never conflict. Lists
/// longer than [`MAX_RANGES`] are rejected.
pub fn detect_false_sharing(
    ranges: &[ThreadRange],
    element_size: usize,
    line_size: usize,
    base_offset: usize,
) -> Result<Vec<Conflict>, RangeError> {
    if ranges.len() > MAX_RANGES {
        return Err(RangeError::TooManyRanges {
            ranges: ranges.len(),
            max: MAX_RANGES,
        });
    }
    let spans = ranges
        .iter()
        .map(|r| r.cache_lines(element_size, line_size, base_offset))
        .collect::<Result<Vec<_>, _>>()?;

    let mut conflicts = Vec::new();
    for (i, a) in spans.iter().enumerate() {
        let Some(a) = *a else { continue };
        for (j, b) in spans.iter().enumerate().skip(i + 1) {
            let Some(b) = *b else { continue };
            if a.1 >= b.0 && b.1 >= a.0 {
                conflicts.push(Conflict {
                    first: i,
                    second: j,
                    first_lines: a,
                    second_lines: b,
                });
            }
        }
    }
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: usize, end: usize) -> ThreadRange {
        ThreadRange::new(start, end).unwrap()
    }

    #[test]
    fn start_after_end_is_rejected() {
        assert_eq!(
            ThreadRange::new(9, 3),
            Err(RangeError::Reversed { start: 9, end: 3 })
        );
        assert!(ThreadRange::new(4, 4).unwrap().is_empty());
    }

    #[test]
    fn pairs_from_cli_values() {
        let ranges = from_pairs(&[0, 8, 7, 16]).unwrap();
        assert_eq!(ranges, vec![r(0, 8), r(7, 16)]);
        assert!(from_pairs(&[5, 1]).is_err());
    }

    #[test]
    fn overlapping_double_ranges() {
        let layout = layout(&[r(0, 8), r(7, 16)], ELEMENT_SIZE, CACHE_LINE_SIZE).unwrap();
        assert_eq!(layout.max_extent, 128);
        assert_eq!(
            layout.lines,
            vec![LineBox { index: 0, start: 0 }, LineBox { index: 1, start: 64 }]
        );
        assert_eq!((layout.rects[0].byte_start, layout.rects[0].byte_end), (0, 64));
        assert_eq!((layout.rects[1].byte_start, layout.rects[1].byte_end), (56, 128));
    }

    #[test]
    fn lanes_stack_in_input_order() {
        let layout = layout(&[r(0, 8), r(7, 16)], ELEMENT_SIZE, CACHE_LINE_SIZE).unwrap();
        assert!((layout.rects[0].y - 0.1).abs() < 1e-12);
        assert!((layout.rects[1].y - 0.6).abs() < 1e-12);
        assert!((layout.rects[0].height - 0.3).abs() < 1e-12);
        assert!(layout.rects[0].y + layout.rects[0].height <= layout.rects[1].y);
    }

    #[test]
    fn partial_line_still_gets_a_box() {
        let layout = layout(&[r(0, 9)], ELEMENT_SIZE, CACHE_LINE_SIZE).unwrap();
        assert_eq!(layout.max_extent, 72);
        assert_eq!(layout.lines.len(), 2);
    }

    #[test]
    fn empty_list_has_no_lines() {
        let layout = layout(&[], ELEMENT_SIZE, CACHE_LINE_SIZE).unwrap();
        assert_eq!(layout.max_extent, 0);
        assert!(layout.lines.is_empty());
        assert!(layout.rects.is_empty());
    }

    #[test]
    fn even_split_spreads_leftover() {
        let ranges = even_split(10, 4);
        assert_eq!(ranges, vec![r(0, 3), r(3, 6), r(6, 8), r(8, 10)]);
        assert!(even_split(10, 0).is_empty());
    }

    #[test]
    fn aligned_split_has_no_conflicts() {
        // 256 floats over 4 threads: 64 floats (4 lines) each.
        let ranges = even_split(256, 4);
        assert!(detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, 0).unwrap().is_empty());
    }

    #[test]
    fn misaligned_split_conflicts_at_boundaries() {
        let ranges = even_split(256, 4);
        let conflicts = detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, 32).unwrap();
        assert_eq!(conflicts.len(), 3);
        assert_eq!(
            conflicts[0],
            Conflict {
                first: 0,
                second: 1,
                first_lines: (0, 4),
                second_lines: (4, 8),
            }
        );
    }

    #[test]
    fn single_thread_never_conflicts() {
        let ranges = even_split(100, 1);
        assert!(detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, 4).unwrap().is_empty());
    }

    #[test]
    fn empty_ranges_are_ignored() {
        let ranges = [r(0, 0), r(0, 4)];
        assert!(detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, 0).unwrap().is_empty());
    }

    #[test]
    fn overflowing_extent_is_an_error() {
        let huge = usize::MAX / 4;
        assert_eq!(
            layout(&[r(0, huge)], ELEMENT_SIZE, CACHE_LINE_SIZE),
            Err(RangeError::Overflow {
                index: huge,
                element_size: ELEMENT_SIZE,
            })
        );
        assert!(r(0, huge).byte_span(ELEMENT_SIZE).is_err());
    }

    #[test]
    fn line_count_is_capped() {
        let err = layout(&[r(0, 100_000_000_000)], ELEMENT_SIZE, CACHE_LINE_SIZE).unwrap_err();
        assert!(matches!(err, RangeError::TooManyLines { max: MAX_CACHE_LINES, .. }));

        let per_line = CACHE_LINE_SIZE / ELEMENT_SIZE;
        let full = layout(&[r(0, MAX_CACHE_LINES * per_line)], ELEMENT_SIZE, CACHE_LINE_SIZE)
            .unwrap();
        assert_eq!(full.lines.len(), MAX_CACHE_LINES);
        assert!(layout(&[r(0, MAX_CACHE_LINES * per_line + 1)], ELEMENT_SIZE, CACHE_LINE_SIZE).is_err());
    }

    #[test]
    fn base_offset_overflow_is_an_error() {
        let ranges = even_split(16, 2);
        let err = detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, usize::MAX).unwrap_err();
        assert_eq!(err, RangeError::Overflow { index: 7, element_size: 4 });
    }

    #[test]
    fn too_many_ranges_are_rejected() {
        let ranges = even_split(10, MAX_RANGES + 1);
        assert_eq!(
            detect_false_sharing(&ranges, 4, CACHE_LINE_SIZE, 0),
            Err(RangeError::TooManyRanges {
                ranges: MAX_RANGES + 1,
                max: MAX_RANGES,
            })
        );
    }
}
