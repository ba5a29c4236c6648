// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/decode.rs - 检测张量解码
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::frame::RawTensorPair;
use crate::model::{BoundingBox, Detection, Keypoint};
use crate::stage::anchors::Anchor;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
  #[error("仅支持单类别解码，配置的类别数为 {0}")]
  UnsupportedClassCount(usize),
  #[error("num_coords={num_coords} 不足以容纳配置的框和关键点，至少需要 {required}")]
  CoordsTooSmall { num_coords: usize, required: usize },
  #[error("每个关键点至少需要 2 个值，配置为 {0}")]
  KeypointValuesTooSmall(usize),
  #[error("缩放系数必须为正数: {0}")]
  InvalidScale(f32),
  #[error("分数截断阈值必须为非负数: {0}")]
  InvalidClippingThreshold(f32),
  #[error("回归张量长度 {actual} 与期望 {expected} 不一致")]
  RegressionShape { expected: usize, actual: usize },
  #[error("分数张量长度 {actual} 与期望 {expected} 不一致")]
  ScoreShape { expected: usize, actual: usize },
  #[error("锚框数量 {actual} 与 num_boxes={expected} 不一致")]
  AnchorCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
  pub num_classes: usize,
  pub num_boxes: usize,
  pub num_coords: usize,
  pub box_coord_offset: usize,
  pub keypoint_coord_offset: usize,
  pub num_keypoints: usize,
  pub num_values_per_keypoint: usize,
  pub sigmoid_score: bool,
  pub score_clipping_thresh: Option<f32>,
  /// 为真时框按 x, y, w, h 排列，否则按 y, x, h, w
  pub reverse_output_order: bool,
  pub min_score_thresh: f32,
  pub x_scale: f32,
  pub y_scale: f32,
  pub w_scale: f32,
  pub h_scale: f32,
  pub apply_exponential_on_box_size: bool,
  pub flip_vertically: bool,
}

impl Default for DecoderOptions {
  fn default() -> Self {
    // 手掌检测模型输出: 2016 个框，每框 4 个坐标 + 7 个关键点
    Self {
      num_classes: 1,
      num_boxes: 2016,
      num_coords: 18,
      box_coord_offset: 0,
      keypoint_coord_offset: 4,
      num_keypoints: 7,
      num_values_per_keypoint: 2,
      sigmoid_score: true,
      score_clipping_thresh: Some(100.0),
      reverse_output_order: true,
      min_score_thresh: 0.5,
      x_scale: 192.0,
      y_scale: 192.0,
      w_scale: 192.0,
      h_scale: 192.0,
      apply_exponential_on_box_size: false,
      flip_vertically: false,
    }
  }
}

impl DecoderOptions {
  pub fn validate(&self) -> Result<(), DecodeError> {
    if self.num_classes != 1 {
      error!("解码配置错误: 不支持 {} 个类别", self.num_classes);
      return Err(DecodeError::UnsupportedClassCount(self.num_classes));
    }
    if self.num_keypoints > 0 && self.num_values_per_keypoint < 2 {
      return Err(DecodeError::KeypointValuesTooSmall(
        self.num_values_per_keypoint,
      ));
    }
    let box_end = self.box_coord_offset + 4;
    let keypoint_end = if self.num_keypoints == 0 {
      0
    } else {
      self.keypoint_coord_offset + self.num_keypoints * self.num_values_per_keypoint
    };
    let required = box_end.max(keypoint_end);
    if self.num_coords < required {
      error!(
        "解码配置错误: num_coords={} 小于所需的 {}",
        self.num_coords, required
      );
      return Err(DecodeError::CoordsTooSmall {
        num_coords: self.num_coords,
        required,
      });
    }
    for scale in [self.x_scale, self.y_scale, self.w_scale, self.h_scale] {
      if scale.is_nan() || scale <= 0.0 {
        return Err(DecodeError::InvalidScale(scale));
      }
    }
    if let Some(thresh) = self.score_clipping_thresh {
      if thresh.is_nan() || thresh < 0.0 {
        return Err(DecodeError::InvalidClippingThreshold(thresh));
      }
    }
    Ok(())
  }

  fn decode_score(&self, raw: f32) -> f32 {
    let raw = match self.score_clipping_thresh {
      Some(thresh) => raw.clamp(-thresh, thresh),
      None => raw,
    };
    if self.sigmoid_score {
      sigmoid(raw)
    } else {
      raw
    }
  }

  fn decode_box(&self, anchor: &Anchor, raw: &[f32]) -> BoundingBox {
    let (x, y, w, h) = if self.reverse_output_order {
      (raw[0], raw[1], raw[2], raw[3])
    } else {
      (raw[1], raw[0], raw[3], raw[2])
    };

    let x_center = x / self.x_scale * anchor.width + anchor.x_center;
    let mut y_center = y / self.y_scale * anchor.height + anchor.y_center;
    let (width, height) = if self.apply_exponential_on_box_size {
      (
        (w / self.w_scale).exp() * anchor.width,
        (h / self.h_scale).exp() * anchor.height,
      )
    } else {
      (
        w / self.w_scale * anchor.width,
        h / self.h_scale * anchor.height,
      )
    };
    if self.flip_vertically {
      y_center = 1.0 - y_center;
    }

    BoundingBox {
      x_center,
      y_center,
      width,
      height,
    }
  }

  fn decode_keypoint(&self, anchor: &Anchor, raw: &[f32]) -> Keypoint {
    let (x, y) = if self.reverse_output_order {
      (raw[0], raw[1])
    } else {
      (raw[1], raw[0])
    };
    let x = x / self.x_scale * anchor.width + anchor.x_center;
    let y = y / self.y_scale * anchor.height + anchor.y_center;
    Keypoint {
      x,
      y: if self.flip_vertically { 1.0 - y } else { y },
    }
  }
}

/// 一个锚框与其对应的网络输出行
#[derive(Debug, Clone, Copy)]
pub struct AnchoredRow<'a> {
  pub anchor: &'a Anchor,
  pub regression: &'a [f32],
  pub scores: &'a [f32],
}

/// 校验形状后把锚框、回归行与分数行按索引配对
pub fn anchored_rows<'a>(
  tensors: &'a RawTensorPair,
  anchors: &'a [Anchor],
  options: &DecoderOptions,
) -> Result<impl Iterator<Item = AnchoredRow<'a>> + 'a, DecodeError> {
  options.validate()?;

  let expected = options.num_boxes * options.num_coords;
  if tensors.regressions.len() != expected {
    error!(
      "回归张量长度 {} 与期望 {} 不一致",
      tensors.regressions.len(),
      expected
    );
    return Err(DecodeError::RegressionShape {
      expected,
      actual: tensors.regressions.len(),
    });
  }
  let expected = options.num_boxes * options.num_classes;
  if tensors.scores.len() != expected {
    return Err(DecodeError::ScoreShape {
      expected,
      actual: tensors.scores.len(),
    });
  }
  if anchors.len() != options.num_boxes {
    return Err(DecodeError::AnchorCount {
      expected: options.num_boxes,
      actual: anchors.len(),
    });
  }

  Ok(
    anchors
      .iter()
      .zip(tensors.regressions.chunks_exact(options.num_coords))
      .zip(tensors.scores.chunks_exact(options.num_classes))
      .map(|((anchor, regression), scores)| AnchoredRow {
        anchor,
        regression,
        scores,
      }),
  )
}

/// 把原始张量解码为候选检测，输出顺序与锚框顺序一致
pub fn decode_detections(
  tensors: &RawTensorPair,
  anchors: &[Anchor],
  options: &DecoderOptions,
) -> Result<Vec<Detection>, DecodeError> {
  let mut detections = Vec::new();

  for row in anchored_rows(tensors, anchors, options)? {
    let score = options.decode_score(row.scores[0]);
    if score.is_nan() || score < options.min_score_thresh {
      continue;
    }

    let box_start = options.box_coord_offset;
    let bbox = options.decode_box(row.anchor, &row.regression[box_start..box_start + 4]);
    let keypoints = (0..options.num_keypoints)
      .map(|k| {
        let offset = options.keypoint_coord_offset + k * options.num_values_per_keypoint;
        options.decode_keypoint(row.anchor, &row.regression[offset..offset + 2])
      })
      .collect();

    detections.push(Detection {
      class_id: 0,
      score,
      bbox,
      keypoints,
      label: None,
    });
  }

  debug!("解码得到 {} 个候选检测", detections.len());
  Ok(detections)
}

fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}
