use fire_guard::{ConfidenceModel, Frame, FrameAnomalyDetector};
use image::{Rgb, RgbImage};

/// Black frame with white rectangles at the given (x, y, w, h) boxes.
fn frame_with_blocks(width: u32, height: u32, blocks: &[(u32, u32, u32, u32)]) -> Frame {
    let mut pixels = RgbImage::new(width, height);
    for &(bx, by, bw, bh) in blocks {
        for y in by..by + bh {
            for x in bx..bx + bw {
                pixels.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
    }
    Frame::new(pixels)
}

#[test]
fn absent_frame_is_no_signal() {
    let verdict = FrameAnomalyDetector::default().evaluate(None);
    assert!(!verdict.anomaly_detected);
    assert_eq!(verdict.confidence, 0.0);
    assert!(verdict.regions.is_empty());
}

#[test]
fn zero_sized_frame_is_no_signal() {
    let empty = Frame::new(RgbImage::new(0, 0));
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&empty));
    assert!(!verdict.anomaly_detected);
    assert_eq!(verdict.confidence, 0.0);
}

#[test]
fn all_black_frame_has_no_anomaly() {
    let frame = frame_with_blocks(100, 100, &[]);
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&frame));
    assert!(!verdict.anomaly_detected);
    assert_eq!(verdict.region_count(), 0);
}

#[test]
fn uniform_frame_below_cutoff_has_no_anomaly() {
    let frame = Frame::new(RgbImage::from_pixel(100, 100, Rgb([190, 190, 190])));
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&frame));
    assert!(!verdict.anomaly_detected);
}

#[test]
fn centred_white_block_is_detected() {
    let frame = frame_with_blocks(100, 100, &[(35, 35, 30, 30)]);
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&frame));

    assert!(verdict.anomaly_detected);
    assert_eq!(verdict.region_count(), 1);
    assert!((verdict.confidence - 0.7).abs() < f32::EPSILON);

    // The blur erodes the block, so the surviving core sits inside it
    let region = verdict.regions[0];
    assert!(region.x >= 35 && region.y >= 35);
    assert!(region.x + region.width <= 65 && region.y + region.height <= 65);
}

#[test]
fn small_speck_is_smoothed_away() {
    let frame = frame_with_blocks(100, 100, &[(48, 48, 5, 5)]);
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&frame));
    assert!(!verdict.anomaly_detected);
}

#[test]
fn separate_blocks_are_separate_regions() {
    let frame = frame_with_blocks(100, 100, &[(10, 40, 20, 20), (65, 40, 20, 20)]);
    let verdict = FrameAnomalyDetector::default().evaluate(Some(&frame));
    assert!(verdict.anomaly_detected);
    assert_eq!(verdict.region_count(), 2);
}

#[test]
fn evaluation_is_idempotent() {
    let detector = FrameAnomalyDetector::default();
    let frame = frame_with_blocks(100, 100, &[(35, 35, 30, 30)]);
    assert_eq!(detector.evaluate(Some(&frame)), detector.evaluate(Some(&frame)));
}

#[test]
fn coverage_model_reports_foreground_fraction() {
    let detector = FrameAnomalyDetector::new(ConfidenceModel::ForegroundCoverage);

    let block = frame_with_blocks(100, 100, &[(35, 35, 30, 30)]);
    let verdict = detector.evaluate(Some(&block));
    assert!(verdict.anomaly_detected);
    assert!(verdict.confidence > 0.0 && verdict.confidence < 0.2);

    let white = Frame::new(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
    let verdict = detector.evaluate(Some(&white));
    assert!(verdict.anomaly_detected);
    assert!(verdict.confidence > 0.5);

    let dark = frame_with_blocks(100, 100, &[]);
    assert_eq!(detector.evaluate(Some(&dark)).confidence, 0.0);
}

#[test]
fn fixed_confidence_is_clamped() {
    let detector = FrameAnomalyDetector::new(ConfidenceModel::Fixed(1.5));
    assert_eq!(detector.confidence_model(), ConfidenceModel::Fixed(1.0));
}

#[test]
fn decode_rejects_garbage_and_accepts_png() {
    assert!(Frame::decode(b"definitely not an image").is_err());

    let pixels = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
    let mut encoded = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(
            &mut std::io::Cursor::new(&mut encoded),
            image::ImageFormat::Png,
        )
        .expect("PNG encode failed");

    let frame = Frame::decode(&encoded).expect("PNG decode failed");
    assert_eq!((frame.width(), frame.height()), (8, 4));
    assert_eq!(frame.pixels().get_pixel(0, 0), &Rgb([10, 20, 30]));
}

#[test]
fn vertical_flip_moves_top_row_to_bottom() {
    let mut pixels = RgbImage::new(3, 3);
    pixels.put_pixel(1, 0, Rgb([255, 0, 0]));
    let flipped = Frame::new(pixels).flipped_vertical();
    assert_eq!(flipped.pixels().get_pixel(1, 2), &Rgb([255, 0, 0]));
    assert_eq!(flipped.pixels().get_pixel(1, 0), &Rgb([0, 0, 0]));
}

#[test]
fn saturated_frame_is_detected() {
    let detector = FrameAnomalyDetector::default();
    for (width, height) in [(100, 100), (50, 50), (3, 3), (1, 7), (2, 1), (1, 1)] {
        let white = Frame::new(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])));
        let verdict = detector.evaluate(Some(&white));
        assert!(verdict.anomaly_detected, "{}x{} white frame", width, height);
        assert_eq!(verdict.region_count(), 1);
        let region = verdict.regions[0];
        assert_eq!((region.x, region.y), (0, 0));
        assert_eq!((region.width, region.height), (width, height));
    }
}

#[test]
fn blocks_touching_each_edge_are_detected() {
    let detector = FrameAnomalyDetector::default();

    let left = detector.evaluate(Some(&frame_with_blocks(100, 100, &[(0, 30, 40, 40)])));
    assert!(left.anomaly_detected);
    assert_eq!(left.regions[0].x, 0);

    let corner = detector.evaluate(Some(&frame_with_blocks(100, 100, &[(0, 0, 40, 40)])));
    assert!(corner.anomaly_detected);
    assert_eq!((corner.regions[0].x, corner.regions[0].y), (0, 0));

    let top = detector.evaluate(Some(&frame_with_blocks(100, 100, &[(30, 0, 40, 40)])));
    assert!(top.anomaly_detected);
    assert_eq!(top.regions[0].y, 0);

    let right = detector.evaluate(Some(&frame_with_blocks(100, 100, &[(60, 30, 40, 40)])));
    assert!(right.anomaly_detected);
    assert_eq!(right.regions[0].x + right.regions[0].width, 100);

    let bottom = detector.evaluate(Some(&frame_with_blocks(100, 100, &[(30, 60, 40, 40)])));
    assert!(bottom.anomaly_detected);
    assert_eq!(bottom.regions[0].y + bottom.regions[0].height, 100);
}
