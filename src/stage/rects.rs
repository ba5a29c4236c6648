// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/rects.rs - 由关键点构建旋转矩形
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

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{Detection, ImageSize, NormalizedRect};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RectError {
  #[error("检测只有 {available} 个关键点，无法读取第 {index} 个")]
  MissingKeypoint { index: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectOptions {
  /// 手腕中心
  pub rotation_vector_start_keypoint_index: usize,
  /// 中指根部
  pub rotation_vector_end_keypoint_index: usize,
  /// 目标角度（度）
  pub rotation_vector_target_angle: f32,
  pub output_zero_rect_for_empty_detections: bool,
}

impl Default for RectOptions {
  fn default() -> Self {
    Self {
      rotation_vector_start_keypoint_index: 0,
      rotation_vector_end_keypoint_index: 2,
      rotation_vector_target_angle: 90.0,
      output_zero_rect_for_empty_detections: true,
    }
  }
}

impl RectOptions {
  /// 计算旋转所需的最少关键点数量
  pub fn required_keypoints(&self) -> usize {
    self
      .rotation_vector_start_keypoint_index
      .max(self.rotation_vector_end_keypoint_index)
      + 1
  }
}

/// 把角度规整到 (-π, π]
pub fn normalize_radians(angle: f32) -> f32 {
  angle - TAU * ((angle - PI) / TAU).ceil()
}

fn keypoint_at(detection: &Detection, index: usize) -> Result<(f32, f32), RectError> {
  detection
    .keypoints
    .get(index)
    .map(|k| (k.x, k.y))
    .ok_or(RectError::MissingKeypoint {
      index,
      available: detection.keypoints.len(),
    })
}

fn compute_rotation(
  detection: &Detection,
  image_size: Option<ImageSize>,
  options: &RectOptions,
) -> Result<f32, RectError> {
  let (x0, y0) = keypoint_at(detection, options.rotation_vector_start_keypoint_index)?;
  let (x1, y1) = keypoint_at(detection, options.rotation_vector_end_keypoint_index)?;

  let (dx, dy) = match image_size {
    Some(size) => (
      (x1 - x0) * size.width as f32,
      (y1 - y0) * size.height as f32,
    ),
    None => (x1 - x0, y1 - y0),
  };

  let target = options.rotation_vector_target_angle.to_radians();
  Ok(normalize_radians(target - dy.atan2(dx)))
}

/// 每个检测生成一个旋转矩形
///
/// 输入为空且开启零矩形策略时输出唯一的 [`NormalizedRect::ZERO`]。
/// 空输入由列表本身判断，不根据矩形大小推断。
pub fn detections_to_rects(
  detections: &[Detection],
  image_size: Option<ImageSize>,
  options: &RectOptions,
) -> Result<Vec<NormalizedRect>, RectError> {
  if detections.is_empty() {
    if options.output_zero_rect_for_empty_detections {
      debug!("无检测结果，输出零矩形");
      return Ok(vec![NormalizedRect::ZERO]);
    }
    return Ok(Vec::new());
  }

  detections
    .iter()
    .map(|detection| {
      Ok(NormalizedRect {
        x_center: detection.bbox.x_center,
        y_center: detection.bbox.y_center,
        width: detection.bbox.width,
        height: detection.bbox.height,
        rotation: compute_rotation(detection, image_size, options)?,
      })
    })
    .collect()
}
