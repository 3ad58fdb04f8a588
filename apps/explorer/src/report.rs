//! 运行结果的文字报告.

use std::io::{self, Write};

use mri_berry::prelude::*;

const S4: &str = "    ";

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "{SEP}")
}

/// 毫米数组 -> `a x b x c`.
fn join_mm(v: &[f64], prec: usize) -> String {
    v.iter()
        .map(|x| format!("{x:.prec$}"))
        .collect::<Vec<_>>()
        .join(" x ")
}

fn describe_points_into<W: Write>(p: &DisplayPoints<Idx3d>, w: &mut W) -> io::Result<()> {
    if p.is_downsampled() {
        writeln!(
            w,
            "{S4}Display points: {} (downsampled from {}, cap {})",
            p.len(),
            p.total(),
            p.cap()
        )
    } else {
        writeln!(w, "{S4}Display points: {}", p.len())
    }
}

/// 将全脑 ROI 的结果写进 `w` 中.
pub fn describe_brain_into<W: Write>(roi: &BrainRoi, w: &mut W) -> io::Result<()> {
    writeln!(w, "Brain ROI:")?;
    writeln!(w, "{S4}{roi}")?;
    writeln!(w, "{S4}Bounds in scan: {}", roi.bounding_box())?;
    if roi.used_fallback() {
        writeln!(w, "{S4}Cropping fell back to the uncropped volume")?;
    }
    describe_points_into(roi.points(), w)
}

/// 将肿瘤测量结果写进 `w` 中. 没有肿瘤时同样是一份正常的报告.
pub fn describe_tumor_into<W: Write>(
    report: Result<&TumorReport, &RoiError>,
    w: &mut W,
) -> io::Result<()> {
    writeln!(w, "Tumor:")?;
    let report = match report {
        Ok(r) => r,
        Err(e) if e.is_empty_region() => return writeln!(w, "{S4}no tumor found"),
        Err(e) => return writeln!(w, "{S4}measurement failed: {e}"),
    };
    let m = report.measurement();
    writeln!(w, "{S4}Bounds in scan: {}", m.bounding_box())?;
    writeln!(w, "{S4}Size: {} mm", join_mm(m.extents_mm(), 1))?;
    writeln!(w, "{S4}Size: {} cm", join_mm(&m.extents_cm(), 2))?;
    writeln!(
        w,
        "{S4}Volume: {} voxels = {:.2} mm³ = {:.3} cm³",
        m.voxel_count(),
        m.volume_mm3(),
        m.volume_cm3()
    )?;
    describe_points_into(report.points(), w)
}

/// 将 2D 切片 ROI 的结果写进 `w` 中.
pub fn describe_slice_into<W: Write, A>(roi: &SliceRoi<A>, w: &mut W) -> io::Result<()> {
    let (height, width) = roi.shape();
    writeln!(w, "Slice ROI:")?;
    writeln!(w, "{S4}Bounds in image: {}", roi.bounding_box())?;
    writeln!(w, "{S4}ROI size: {height} x {width}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_no_tumor_report() {
        let seg = Array3::<u8>::zeros((4, 4, 4));
        let r = TumorReport::measure(
            &seg,
            &VoxelSpacing::unit(3),
            &ExploreConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        let text = render(|w| describe_tumor_into(r.as_ref(), w));
        assert_eq!(text, "Tumor:\n    no tumor found\n");
    }

    #[test]
    fn test_tumor_report() {
        let mut seg = Array3::<u8>::zeros((10, 10, 10));
        seg.slice_mut(s![2..5, 3..7, 1..6]).fill(BRATS_EDEMA);
        let r = TumorReport::measure(
            &seg,
            &VoxelSpacing::unit(3),
            &ExploreConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        let text = render(|w| describe_tumor_into(Ok(&r), w));
        assert!(text.contains("Size: 3.0 x 4.0 x 5.0 mm"));
        assert!(text.contains("Size: 0.30 x 0.40 x 0.50 cm"));
        assert!(text.contains("60 voxels = 60.00 mm³ = 0.060 cm³"));
        assert!(text.ends_with("Display points: 60\n"));
    }
}
