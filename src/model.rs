// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/model.rs - 检测结果与几何数据类型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 归一化关键点坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
}

impl Keypoint {
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

/// 轴对齐的归一化边界框（中心点 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
  pub x_center: f32,
  pub y_center: f32,
  pub width: f32,
  pub height: f32,
}

impl BoundingBox {
  pub fn new(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
    Self {
      x_center,
      y_center,
      width,
      height,
    }
  }

  pub fn xmin(&self) -> f32 {
    self.x_center - self.width / 2.0
  }

  pub fn ymin(&self) -> f32 {
    self.y_center - self.height / 2.0
  }

  pub fn xmax(&self) -> f32 {
    self.x_center + self.width / 2.0
  }

  pub fn ymax(&self) -> f32 {
    self.y_center + self.height / 2.0
  }

  pub fn area(&self) -> f32 {
    self.width.max(0.0) * self.height.max(0.0)
  }

  /// 两个框的交集面积，不相交时为 0
  pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
    let x1 = self.xmin().max(other.xmin());
    let y1 = self.ymin().max(other.ymin());
    let x2 = self.xmax().min(other.xmax());
    let y2 = self.ymax().min(other.ymax());

    (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
  }

  /// 同时包含两个框的最小外接框面积
  pub fn enclosing_area(&self, other: &BoundingBox) -> f32 {
    let x1 = self.xmin().min(other.xmin());
    let y1 = self.ymin().min(other.ymin());
    let x2 = self.xmax().max(other.xmax());
    let y2 = self.ymax().max(other.ymax());

    (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
  pub class_id: u32,
  /// 激活后的置信度
  pub score: f32,
  pub bbox: BoundingBox,
  pub keypoints: Vec<Keypoint>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

/// 带旋转的归一化矩形，rotation 为弧度
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
  pub x_center: f32,
  pub y_center: f32,
  pub width: f32,
  pub height: f32,
  pub rotation: f32,
}

impl NormalizedRect {
  /// 无检测结果时输出的零矩形
  pub const ZERO: NormalizedRect = NormalizedRect {
    x_center: 0.0,
    y_center: 0.0,
    width: 0.0,
    height: 0.0,
    rotation: 0.0,
  };
}

/// 原始图像尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
  pub width: u32,
  pub height: u32,
}

impl ImageSize {
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  /// 任一边为 0 时无法在像素空间换算
  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandDetectResult {
  /// 手掌检测结果（已去除 letterbox）
  pub detections: Box<[Detection]>,
  /// 覆盖整只手的 RoI 矩形
  pub rects: Box<[NormalizedRect]>,
}
