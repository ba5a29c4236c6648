// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/letterbox.rs - letterbox 坐标还原
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

use tracing::error;

use crate::frame::{PaddingDescriptor, PaddingError};
use crate::model::Detection;

/// 把 letterbox 画面上的归一化坐标映射回原图
///
/// 中心与关键点: `(v - pad_before) / (1 - pad_before - pad_after)`；
/// 宽高只做缩放，不减去填充。
pub fn remove_letterbox(
  mut detections: Vec<Detection>,
  padding: &PaddingDescriptor,
) -> Result<Vec<Detection>, PaddingError> {
  if let Err(e) = padding.validate() {
    error!("letterbox 填充无效: {}", e);
    return Err(e);
  }
  if padding.is_zero() {
    return Ok(detections);
  }

  let sx = padding.content_width();
  let sy = padding.content_height();
  let unpad_x = |x: f32| (x - padding.left) / sx;
  let unpad_y = |y: f32| (y - padding.top) / sy;

  for detection in detections.iter_mut() {
    let bbox = &mut detection.bbox;
    bbox.x_center = unpad_x(bbox.x_center);
    bbox.y_center = unpad_y(bbox.y_center);
    bbox.width /= sx;
    bbox.height /= sy;

    for keypoint in detection.keypoints.iter_mut() {
      keypoint.x = unpad_x(keypoint.x);
      keypoint.y = unpad_y(keypoint.y);
    }
  }

  Ok(detections)
}
