// 该文件是 Shouzhang （手掌） 项目的一部分。
// tests/pipeline.rs - 完整流水线测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use shouzhang::{
  FromUrl,
  config::HandDetectorConfig,
  detector::{DetectorError, HandDetector, HandDetectorBuilder},
  frame::{PaddingDescriptor, PalmFrame, RawTensorPair},
  model::{ImageSize, Model, NormalizedRect},
  stage::{Anchor, AnchorOptions, CropOptions, generate_anchors},
};
use url::Url;

const NUM_BOXES: usize = 2016;
const NUM_COORDS: usize = 18;
const INPUT_SIZE: f32 = 192.0;

/// 所有锚框都处于低分状态的空白帧
fn blank_tensors() -> RawTensorPair {
  RawTensorPair::new(vec![0.0; NUM_BOXES * NUM_COORDS], vec![-10.0; NUM_BOXES])
}

fn palm_anchors() -> Vec<Anchor> {
  generate_anchors(&AnchorOptions::default()).expect("palm anchors")
}

/// 在第 `index` 个锚框上放置一个手掌：
/// 框相对锚框中心偏移 `dx`，边长 `size`，关键点 0 在中心，关键点 2 在其下方 0.1 处
fn place_palm(tensors: &mut RawTensorPair, index: usize, logit: f32, dx: f32, size: f32) {
  let row = &mut tensors.regressions[index * NUM_COORDS..(index + 1) * NUM_COORDS];
  row[0] = dx * INPUT_SIZE;
  row[1] = 0.0;
  row[2] = size * INPUT_SIZE;
  row[3] = size * INPUT_SIZE;
  row[4] = dx * INPUT_SIZE;
  row[5] = 0.0;
  row[8] = dx * INPUT_SIZE;
  row[9] = 0.1 * INPUT_SIZE;
  tensors.scores[index] = logit;
}

fn detector(url: &str) -> HandDetector {
  let url = Url::parse(url).expect("valid url");
  HandDetectorBuilder::from_url(&url)
    .expect("known scheme")
    .build()
    .expect("valid config")
}

fn assert_close(actual: f32, expected: f32) {
  assert!(
    (actual - expected).abs() < 1e-4,
    "expected {expected}, got {actual}"
  );
}

#[test]
fn single_palm_becomes_expanded_hand_rect() {
  let anchors = palm_anchors();
  let index = 1500;
  let anchor = anchors[index];

  let mut tensors = blank_tensors();
  place_palm(&mut tensors, index, 9f32.ln(), 0.0, 0.2);

  let result = detector("palm:").infer(&PalmFrame::new(tensors)).expect("inference");

  assert_eq!(result.detections.len(), 1);
  let detection = &result.detections[0];
  assert_close(detection.score, 0.9);
  assert_eq!(detection.label.as_deref(), Some("Palm"));
  assert_eq!(detection.keypoints.len(), 7);

  assert_eq!(result.rects.len(), 1);
  let rect = result.rects[0];
  assert_close(rect.rotation, 0.0);
  assert_close(rect.x_center, anchor.x_center);
  assert_close(rect.y_center, anchor.y_center - 0.1);
  assert_close(rect.width, 0.52);
  assert_close(rect.height, 0.52);
}

#[test]
fn blank_frame_yields_single_zero_rect() {
  let result = detector("palm:")
    .infer(&PalmFrame::new(blank_tensors()))
    .expect("inference");

  assert!(result.detections.is_empty());
  assert_eq!(result.rects.len(), 1);
  // 零矩形经过扩展后尺寸仍为零
  assert_eq!(result.rects[0].width, 0.0);
  assert_eq!(result.rects[0].height, 0.0);
  assert_eq!(result.rects[0].rotation, 0.0);
}

#[test]
fn blank_frame_without_return_empty_is_skipped() {
  let result = detector("palm:?return_empty=false")
    .infer(&PalmFrame::new(blank_tensors()))
    .expect("inference");

  assert!(result.detections.is_empty());
  assert!(result.rects.is_empty());
}

#[test]
fn blank_frame_without_zero_rect_has_no_rects() {
  let result = detector("palm:?zero_rect=false")
    .infer(&PalmFrame::new(blank_tensors()))
    .expect("inference");

  assert!(result.rects.is_empty());
}

#[test]
fn letterbox_padding_is_removed_before_rects() {
  let anchors = palm_anchors();
  let index = 1500;
  let anchor = anchors[index];

  let mut tensors = blank_tensors();
  place_palm(&mut tensors, index, 9f32.ln(), 0.0, 0.2);
  let frame = PalmFrame::new(tensors).with_padding(PaddingDescriptor::new(0.0, 0.25, 0.0, 0.25));

  let result = detector("palm:").infer(&frame).expect("inference");

  let detection = &result.detections[0];
  assert_close(detection.bbox.y_center, (anchor.y_center - 0.25) / 0.5);
  assert_close(detection.bbox.height, 0.4);
  assert_close(detection.bbox.width, 0.2);

  let rect = result.rects[0];
  assert_close(rect.rotation, 0.0);
  assert_close(rect.y_center, (anchor.y_center - 0.25) / 0.5 - 0.2);
  assert_close(rect.width, 1.04);
  assert_close(rect.height, 1.04);
}

#[test]
fn invalid_padding_fails_the_frame() {
  let mut tensors = blank_tensors();
  place_palm(&mut tensors, 1500, 9f32.ln(), 0.0, 0.2);
  let frame = PalmFrame::new(tensors).with_padding(PaddingDescriptor::new(0.6, 0.0, 0.4, 0.0));

  assert!(detector("palm:").infer(&frame).is_err());
}

#[test]
fn rects_are_limited_to_num_hands_in_score_order() {
  let anchors = palm_anchors();
  let mut tensors = blank_tensors();
  place_palm(&mut tensors, 100, (7.0f32 / 3.0).ln(), 0.0, 0.1);
  place_palm(&mut tensors, 700, 9f32.ln(), 0.0, 0.1);
  place_palm(&mut tensors, 1100, 4f32.ln(), 0.0, 0.1);

  let result = detector("palm:").infer(&PalmFrame::new(tensors)).expect("inference");

  assert_eq!(result.detections.len(), 3);
  assert_eq!(result.rects.len(), 2);
  let scores: Vec<f32> = result.detections.iter().map(|d| d.score).collect();
  assert_close(scores[0], 0.9);
  assert_close(scores[1], 0.8);
  assert_close(scores[2], 0.7);
  assert_close(result.rects[0].x_center, anchors[700].x_center);
  assert_close(result.rects[1].x_center, anchors[1100].x_center);

  let single = detector("palm:?num_hands=1")
    .infer(&PalmFrame::new(blank_tensors()))
    .expect("inference");
  assert_eq!(single.rects.as_ref(), &[NormalizedRect::ZERO]);
}

#[test]
fn overlapping_anchors_are_merged_by_score_weight() {
  let anchors = palm_anchors();
  // 同一网格单元上的两个锚框
  let (a, b) = (600, 601);
  assert_eq!(anchors[a].x_center, anchors[b].x_center);

  let mut tensors = blank_tensors();
  place_palm(&mut tensors, a, 9f32.ln(), 0.0, 0.2);
  place_palm(&mut tensors, b, 1.5f32.ln(), 0.01, 0.2);

  let result = detector("palm:").infer(&PalmFrame::new(tensors)).expect("inference");

  assert_eq!(result.detections.len(), 1);
  let merged = &result.detections[0];
  assert_close(merged.score, 0.9);
  let expected_x = (0.9 * anchors[a].x_center + 0.6 * (anchors[b].x_center + 0.01)) / 1.5;
  assert_close(merged.bbox.x_center, expected_x);
  assert_close(merged.keypoints[0].x, expected_x);
  assert_close(result.rects[0].x_center, expected_x);
}

#[test]
fn detector_is_reusable_across_frames() {
  let detector = detector("palm:");
  let mut tensors = blank_tensors();
  place_palm(&mut tensors, 1500, 9f32.ln(), 0.0, 0.2);
  let frame = PalmFrame::new(tensors);

  let first = detector.infer(&frame).expect("inference");
  let second = detector.infer(&frame).expect("inference");
  assert_eq!(first.rects, second.rects);
}

#[test]
fn empty_image_size_fails_the_frame() {
  let mut tensors = blank_tensors();
  place_palm(&mut tensors, 1500, 9f32.ln(), 0.0, 0.2);
  let detector = detector("palm:");

  for size in [ImageSize::new(0, 0), ImageSize::new(640, 0)] {
    let frame = PalmFrame::new(tensors.clone()).with_image_size(size);
    assert!(matches!(
      detector.infer(&frame),
      Err(DetectorError::EmptyImageSize(s)) if s == size
    ));
  }

  let frame = PalmFrame::new(tensors).with_image_size(ImageSize::new(640, 480));
  let result = detector.infer(&frame).expect("inference");
  assert!(result.rects.iter().all(|r| r.width.is_finite() && r.rotation.is_finite()));
}

#[test]
fn crop_keeps_zero_rect_for_blank_frames() {
  let detector = HandDetectorBuilder::new()
    .config(HandDetectorConfig {
      crop: Some(CropOptions::default()),
      ..HandDetectorConfig::default()
    })
    .build()
    .expect("valid config");

  let blank = detector
    .infer(&PalmFrame::new(blank_tensors()))
    .expect("inference");
  assert_eq!(blank.rects.as_ref(), &[NormalizedRect::ZERO]);

  let anchors = palm_anchors();
  let mut tensors = blank_tensors();
  place_palm(&mut tensors, 1500, 9f32.ln(), 0.0, 0.2);
  let result = detector.infer(&PalmFrame::new(tensors)).expect("inference");
  let rect = result.rects[0];
  assert_close(rect.width, 0.3);
  assert_close(rect.height, 0.3);
  assert_close(rect.x_center, anchors[1500].x_center);
  assert_close(rect.y_center, (anchors[1500].y_center - 0.1) * 0.9);
}
