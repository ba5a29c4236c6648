// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/crop.rs - 手部裁剪矩形
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

use crate::model::NormalizedRect;

/// 固定尺寸裁剪框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
  pub crop_width: f32,
  pub crop_height: f32,
  /// 裁剪框中心 y 相对原矩形中心 y 的比例
  pub y_center_factor: f32,
}

impl Default for CropOptions {
  fn default() -> Self {
    Self {
      crop_width: 0.3,
      crop_height: 0.3,
      y_center_factor: 0.9,
    }
  }
}

/// 以矩形中心为基准生成不旋转的固定尺寸裁剪框
pub fn crop_rect(rect: NormalizedRect, options: &CropOptions) -> NormalizedRect {
  NormalizedRect {
    x_center: rect.x_center,
    y_center: rect.y_center * options.y_center_factor,
    width: options.crop_width,
    height: options.crop_height,
    rotation: 0.0,
  }
}
