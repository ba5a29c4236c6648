// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/transform.rs - 矩形扩展变换
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

use crate::model::{ImageSize, NormalizedRect};
use crate::stage::rects::normalize_radians;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
  pub scale_x: f32,
  pub scale_y: f32,
  /// 额外旋转（弧度），优先于 `rotation_degrees`
  pub rotation: Option<f32>,
  pub rotation_degrees: Option<f32>,
  /// 沿矩形自身 x 轴的平移，单位为矩形宽度
  pub shift_x: f32,
  /// 沿矩形自身 y 轴的平移，单位为矩形高度
  pub shift_y: f32,
  pub square_long: bool,
  pub square_short: bool,
}

impl Default for TransformOptions {
  fn default() -> Self {
    // 把手掌框扩展到整只手
    Self {
      scale_x: 2.6,
      scale_y: 2.6,
      rotation: None,
      rotation_degrees: None,
      shift_x: 0.0,
      shift_y: -0.5,
      square_long: true,
      square_short: false,
    }
  }
}

impl TransformOptions {
  /// 不做任何改变的变换
  pub fn identity() -> Self {
    Self {
      scale_x: 1.0,
      scale_y: 1.0,
      shift_y: 0.0,
      square_long: false,
      ..Self::default()
    }
  }

  fn extra_rotation(&self) -> Option<f32> {
    self
      .rotation
      .or_else(|| self.rotation_degrees.map(f32::to_radians))
  }
}

/// 缩放、平移并按需正方形化矩形
///
/// 平移沿矩形自身旋转后的坐标轴进行，使用缩放前的宽高。
/// 提供图像尺寸时平移和正方形化在像素空间计算后再归一化。
pub fn transform_rect(
  rect: NormalizedRect,
  image_size: Option<ImageSize>,
  options: &TransformOptions,
) -> NormalizedRect {
  let (image_w, image_h) = image_size
    .map(|size| (size.width as f32, size.height as f32))
    .unwrap_or((1.0, 1.0));

  let rotation = match options.extra_rotation() {
    Some(extra) => normalize_radians(rect.rotation + extra),
    None => rect.rotation,
  };

  let (sin, cos) = rotation.sin_cos();
  let shift_w = image_w * rect.width * options.shift_x;
  let shift_h = image_h * rect.height * options.shift_y;
  let x_center = rect.x_center + (shift_w * cos - shift_h * sin) / image_w;
  let y_center = rect.y_center + (shift_w * sin + shift_h * cos) / image_h;

  let mut width = rect.width * options.scale_x;
  let mut height = rect.height * options.scale_y;
  if options.square_long {
    let long_side = (width * image_w).max(height * image_h);
    width = long_side / image_w;
    height = long_side / image_h;
  } else if options.square_short {
    let short_side = (width * image_w).min(height * image_h);
    width = short_side / image_w;
    height = short_side / image_h;
  }

  NormalizedRect {
    x_center,
    y_center,
    width,
    height,
    rotation,
  }
}

#[cfg(test)]
mod tests {
  use std::f32::consts::PI;

  use super::*;

  fn rect(x_center: f32, y_center: f32, width: f32, height: f32, rotation: f32) -> NormalizedRect {
    NormalizedRect {
      x_center,
      y_center,
      width,
      height,
      rotation,
    }
  }

  fn assert_rect_close(a: NormalizedRect, b: NormalizedRect) {
    for (x, y) in [
      (a.x_center, b.x_center),
      (a.y_center, b.y_center),
      (a.width, b.width),
      (a.height, b.height),
      (a.rotation, b.rotation),
    ] {
      assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
    }
  }

  #[test]
  fn scale_then_square_long() {
    let options = TransformOptions {
      scale_x: 2.0,
      scale_y: 2.0,
      shift_y: 0.0,
      square_long: true,
      ..TransformOptions::default()
    };
    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.1, 0.0), None, &options);
    assert_rect_close(out, rect(0.5, 0.5, 0.4, 0.4, 0.0));
  }

  #[test]
  fn square_short_uses_min_side() {
    let options = TransformOptions {
      square_short: true,
      ..TransformOptions::identity()
    };
    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.1, 0.0), None, &options);
    assert_rect_close(out, rect(0.5, 0.5, 0.1, 0.1, 0.0));
  }

  #[test]
  fn shift_follows_rect_rotation() {
    let options = TransformOptions {
      shift_y: -0.5,
      ..TransformOptions::identity()
    };

    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.4, 0.0), None, &options);
    assert_rect_close(out, rect(0.5, 0.3, 0.2, 0.4, 0.0));

    // 旋转 90°，局部 y 轴指向图像 -x
    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.4, PI / 2.0), None, &options);
    assert_rect_close(out, rect(0.7, 0.5, 0.2, 0.4, PI / 2.0));
  }

  #[test]
  fn shift_x_moves_along_local_x() {
    let options = TransformOptions {
      shift_x: 1.0,
      ..TransformOptions::identity()
    };
    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.4, PI / 2.0), None, &options);
    assert_rect_close(out, rect(0.5, 0.7, 0.2, 0.4, PI / 2.0));
  }

  #[test]
  fn square_long_in_pixel_space() {
    let options = TransformOptions {
      square_long: true,
      ..TransformOptions::identity()
    };
    let out = transform_rect(
      rect(0.5, 0.5, 0.5, 0.5, 0.0),
      Some(ImageSize::new(200, 100)),
      &options,
    );
    // 长边 100 像素
    assert_rect_close(out, rect(0.5, 0.5, 0.5, 1.0, 0.0));
  }

  #[test]
  fn extra_rotation_is_normalized() {
    let options = TransformOptions {
      rotation_degrees: Some(270.0),
      ..TransformOptions::identity()
    };
    let out = transform_rect(rect(0.5, 0.5, 0.2, 0.2, 0.0), None, &options);
    assert!((out.rotation + PI / 2.0).abs() < 1e-5);
  }

  #[test]
  fn zero_rect_stays_zero() {
    let out = transform_rect(NormalizedRect::ZERO, None, &TransformOptions::default());
    assert_eq!(out, NormalizedRect::ZERO);
  }
}
