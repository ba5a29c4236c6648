// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/frame.rs - 网络输出张量与 letterbox 描述
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

use crate::model::ImageSize;

/// 检测网络的原始输出
///
/// `regressions` 按行展开为 `num_boxes * num_coords`，
/// `scores` 按行展开为 `num_boxes * num_classes`。
/// 形状由解码配置决定，在解码前校验。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTensorPair {
  pub regressions: Vec<f32>,
  pub scores: Vec<f32>,
}

impl RawTensorPair {
  pub fn new(regressions: Vec<f32>, scores: Vec<f32>) -> Self {
    Self {
      regressions,
      scores,
    }
  }

  /// 构造全零张量，便于测试和基准
  pub fn zeros(num_boxes: usize, num_coords: usize, num_classes: usize) -> Self {
    Self {
      regressions: vec![0.0; num_boxes * num_coords],
      scores: vec![0.0; num_boxes * num_classes],
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaddingError {
  #[error("填充值超出 [0, 1) 范围: {0:?}")]
  OutOfRange(PaddingDescriptor),
  #[error("同一轴上的填充之和不小于 1: {0:?}")]
  AxisFullyPadded(PaddingDescriptor),
}

/// letterbox 填充描述，四边均为相对推理输入尺寸的比例
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddingDescriptor {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl PaddingDescriptor {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  pub fn is_zero(&self) -> bool {
    self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
  }

  pub fn validate(&self) -> Result<(), PaddingError> {
    let in_range = |v: f32| (0.0..1.0).contains(&v);
    if ![self.left, self.top, self.right, self.bottom]
      .into_iter()
      .all(in_range)
    {
      return Err(PaddingError::OutOfRange(*self));
    }
    if self.left + self.right >= 1.0 || self.top + self.bottom >= 1.0 {
      return Err(PaddingError::AxisFullyPadded(*self));
    }
    Ok(())
  }

  /// 去除填充后 x 轴的有效比例
  pub fn content_width(&self) -> f32 {
    1.0 - self.left - self.right
  }

  /// 去除填充后 y 轴的有效比例
  pub fn content_height(&self) -> f32 {
    1.0 - self.top - self.bottom
  }
}

/// 一帧待后处理的数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PalmFrame {
  pub tensors: RawTensorPair,
  #[serde(default)]
  pub padding: PaddingDescriptor,
  #[serde(default)]
  pub image_size: Option<ImageSize>,
}

impl PalmFrame {
  pub fn new(tensors: RawTensorPair) -> Self {
    Self {
      tensors,
      padding: PaddingDescriptor::default(),
      image_size: None,
    }
  }

  pub fn with_padding(mut self, padding: PaddingDescriptor) -> Self {
    self.padding = padding;
    self
  }

  pub fn with_image_size(mut self, image_size: ImageSize) -> Self {
    self.image_size = Some(image_size);
    self
  }
}
