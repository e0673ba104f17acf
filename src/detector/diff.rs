//! # 差分引擎
//!
//! 逐像素计算 `|a - b|`，再按阈值二值化为掩码：差值严格大于阈值记 255，否则记 0。
//! 纯函数，相同输入必然得到逐位相同的输出。

use super::array::GrayArray;
use super::DetectError;

/// 掩码中“被篡改”像素的取值。
pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// 差分结果：原始差值与二值掩码，尺寸与输入一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceResult {
    pub mask: GrayArray,
    pub raw_diff: GrayArray,
}

impl DifferenceResult {
    /// 掩码中 255 的像素数量。
    pub fn changed_pixels(&self) -> usize {
        self.mask.count_value(MASK_ON)
    }
}

/// 计算差分与掩码。两张图尺寸不同返回 `ShapeMismatch`（调用方应先对齐）。
pub fn diff(a: &GrayArray, b: &GrayArray, threshold: u8) -> Result<DifferenceResult, DetectError> {
    if a.shape() != b.shape() {
        return Err(DetectError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }

    let (height, width) = a.shape();

    let raw: Vec<u8> = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(&left, &right)| left.abs_diff(right))
        .collect();

    let mask: Vec<u8> = raw
        .iter()
        .map(|&delta| if delta > threshold { MASK_ON } else { MASK_OFF })
        .collect();

    Ok(DifferenceResult {
        mask: GrayArray::new(height, width, mask)?,
        raw_diff: GrayArray::new(height, width, raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_diff_has_no_wraparound() {
        let a = GrayArray::new(1, 3, vec![0, 255, 100]).unwrap();
        let b = GrayArray::new(1, 3, vec![255, 0, 90]).unwrap();

        let result = diff(&a, &b, 10).unwrap();
        assert_eq!(result.raw_diff.as_bytes(), &[255, 255, 10]);
        // 10 不严格大于阈值 10
        assert_eq!(result.mask.as_bytes(), &[255, 255, 0]);
        assert_eq!(result.changed_pixels(), 2);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let a = GrayArray::filled(10, 20, 0);
        let b = GrayArray::filled(20, 10, 0);

        match diff(&a, &b, 10) {
            Err(DetectError::ShapeMismatch { left, right }) => {
                assert_eq!(left, (10, 20));
                assert_eq!(right, (20, 10));
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn threshold_255_never_marks() {
        let a = GrayArray::filled(3, 3, 0);
        let b = GrayArray::filled(3, 3, 255);
        let result = diff(&a, &b, 255).unwrap();
        assert_eq!(result.changed_pixels(), 0);
    }

    #[test]
    fn threshold_0_marks_any_change() {
        let a = GrayArray::filled(2, 2, 7);
        let b = GrayArray::from_fn(2, 2, |row, col| if row == 1 && col == 0 { 8 } else { 7 });
        let result = diff(&a, &b, 0).unwrap();
        assert_eq!(result.mask.as_bytes(), &[0, 0, 255, 0]);
    }
}
