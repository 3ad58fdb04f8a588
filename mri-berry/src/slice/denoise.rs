use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

use crate::{RoiError, RoiResult};

/// 以 "reflect" 模式 (`d c b a | a b c d | d c b a`) 将越界索引折回 `[0, n)`.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - 1 - m }) as usize
}

/// 中值滤波. 窗口为 `kernel x kernel` 的正方形, 边界按 "reflect" 模式延拓.
///
/// `kernel` 必须为正奇数, 否则返回 `Err(RoiError::InvalidKernel)`.
/// `kernel == 1` 时输出与输入相同.
pub fn median_filter(image: ArrayView2<f32>, kernel: usize) -> RoiResult<Array2<f32>> {
    if kernel == 0 || kernel % 2 == 0 {
        return Err(RoiError::InvalidKernel(kernel));
    }
    let (height, width) = image.dim();
    if kernel == 1 || height == 0 || width == 0 {
        return Ok(image.to_owned());
    }

    let r = (kernel / 2) as isize;
    let mid = kernel * kernel / 2;
    let mut window: Vec<OrderedFloat<f32>> = Vec::with_capacity(kernel * kernel);

    Ok(Array2::from_shape_fn((height, width), |(h, w)| {
        window.clear();
        for dh in -r..=r {
            let hh = reflect(h as isize + dh, height);
            for dw in -r..=r {
                let ww = reflect(w as isize + dw, width);
                window.push(OrderedFloat(image[(hh, ww)]));
            }
        }
        let (_, median, _) = window.select_nth_unstable(mid);
        median.0
    }))
}

#[cfg(test)]
mod tests {
    use super::{median_filter, reflect};
    use crate::RoiError;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_reflect() {
        // n = 4: ... 1 0 | 0 1 2 3 | 3 2 ...
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(0, 4), 0);
        assert_eq!(reflect(3, 4), 3);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        // 窗口比图像还大时继续折返.
        assert_eq!(reflect(-1, 1), 0);
        assert_eq!(reflect(2, 1), 0);
    }

    #[test]
    fn test_median_invalid_kernel() {
        let img = Array2::<f32>::zeros((3, 3));
        assert!(matches!(
            median_filter(img.view(), 0),
            Err(RoiError::InvalidKernel(0))
        ));
        assert!(matches!(
            median_filter(img.view(), 4),
            Err(RoiError::InvalidKernel(4))
        ));
    }

    #[test]
    fn test_median_removes_hot_pixel() {
        let mut img = Array2::<f32>::from_elem((5, 5), 10.0);
        img[(2, 2)] = 10_000.0;
        let out = median_filter(img.view(), 3).unwrap();
        assert!(out.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_median_kernel_one_is_identity() {
        let img = arr2(&[[1.0f32, 5.0], [3.0, -2.0]]);
        assert_eq!(median_filter(img.view(), 1).unwrap(), img);
    }

    #[test]
    fn test_median_edges_reflect() {
        let img = arr2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let out = median_filter(img.view(), 3).unwrap();
        // 左上角窗口: [1 1 2; 1 1 2; 4 4 5] -> 中值 2.
        assert_eq!(out[(0, 0)], 2.0);
        // 中心窗口即整幅图 -> 中值 5.
        assert_eq!(out[(1, 1)], 5.0);
        // 右下角窗口: [5 6 6; 8 9 9; 8 9 9] -> 中值 8.
        assert_eq!(out[(2, 2)], 8.0);
    }
}
