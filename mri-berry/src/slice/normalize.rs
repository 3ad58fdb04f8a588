use itertools::{Itertools, MinMaxResult};
use ndarray::{Array, ArrayBase, Data, Dimension};

/// 线性归一化: `(v - min) / (max - min) * 255`, 截断为 `u8`.
///
/// 若图像为常数 (`max == min`) 或为空, 则返回同形状的全零图像, 不会产生除零或 NaN.
/// 非有限值 (NaN, inf) 不参与最小/最大值统计, 并映射为 0.
pub fn linear_normalization<S, D>(image: &ArrayBase<S, D>) -> Array<u8, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let (min, max) = match image
        .iter()
        .filter(|v| v.is_finite())
        .minmax_by(|a, b| a.total_cmp(b))
    {
        MinMaxResult::MinMax(&min, &max) => (min as f64, max as f64),
        // 空图像或仅有一个有效值.
        MinMaxResult::NoElements | MinMaxResult::OneElement(_) => {
            return Array::zeros(image.raw_dim())
        }
    };
    if max == min {
        return Array::zeros(image.raw_dim());
    }

    let range = max - min;
    image.map(|&v| {
        if v.is_finite() {
            // 255, not 256.
            ((v as f64 - min) / range * 255.0) as u8
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::linear_normalization;
    use ndarray::{arr1, arr2, Array2};

    #[test]
    fn test_normalize_constant_image() {
        let img = Array2::<f32>::from_elem((4, 6), 7.0);
        let out = linear_normalization(&img);
        assert_eq!(out, Array2::<u8>::zeros((4, 6)));
    }

    #[test]
    fn test_normalize_range() {
        let img = arr2(&[[-10.0f32, 0.0], [10.0, 5.0]]);
        let out = linear_normalization(&img);
        assert_eq!(out, arr2(&[[0u8, 127], [255, 191]]));
    }

    #[test]
    fn test_normalize_idempotent_on_full_range() {
        let img = arr1(&[0.0f32, 17.0, 128.0, 200.0, 255.0]);
        let once = linear_normalization(&img);
        let twice = linear_normalization(&once.mapv(f32::from));
        assert_eq!(once, twice);
        assert_eq!(once, arr1(&[0u8, 17, 128, 200, 255]));
    }

    /// 常数平移后相对顺序不变.
    #[test]
    fn test_normalize_shift_keeps_order() {
        let img = arr1(&[3.0f32, 1.0, 4.0, 1.5, 9.0, 2.6]);
        let a = linear_normalization(&img);
        let b = linear_normalization(&img.mapv(|v| v + 1000.0));
        for i in 0..img.len() {
            for j in 0..img.len() {
                if img[i] < img[j] {
                    assert!(a[i] <= a[j]);
                    assert!(b[i] <= b[j]);
                }
            }
        }
        assert_eq!(a[4], 255);
        assert_eq!(b[1], 0);
    }

    #[test]
    fn test_normalize_non_finite() {
        let img = arr1(&[f32::NAN, 1.0, 3.0, f32::INFINITY]);
        assert_eq!(linear_normalization(&img), arr1(&[0u8, 0, 255, 0]));

        let img = arr1(&[f32::NAN, 2.0]);
        assert_eq!(linear_normalization(&img), arr1(&[0u8, 0]));
    }
}
