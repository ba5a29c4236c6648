// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/anchors.rs - SSD 锚框生成
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

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// SSD 锚框，中心与尺寸均为归一化坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Anchor {
  pub x_center: f32,
  pub y_center: f32,
  pub width: f32,
  pub height: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
  #[error("层数 {num_layers} 与步长数量 {num_strides} 不一致")]
  StrideCountMismatch { num_layers: usize, num_strides: usize },
  #[error("第 {0} 层步长为 0")]
  ZeroStride(usize),
  #[error("输入尺寸不能为 0")]
  ZeroInputSize,
  #[error("没有配置任何宽高比")]
  NoAspectRatio,
  #[error("特征图尺寸数量 {actual} 与层数 {expected} 不一致")]
  FeatureMapCountMismatch { expected: usize, actual: usize },
  #[error("特征图宽和高必须同时配置")]
  PartialFeatureMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
  pub num_layers: usize,
  pub strides: Vec<u32>,
  pub min_scale: f32,
  pub max_scale: f32,
  pub input_width: u32,
  pub input_height: u32,
  pub anchor_offset_x: f32,
  pub anchor_offset_y: f32,
  pub aspect_ratios: Vec<f32>,
  /// 为真时所有锚框宽高固定为 1.0
  pub fixed_anchor_size: bool,
  /// 每个网格额外补充一个插值尺度的锚框
  pub interpolated_scale_aspect_ratio: Option<f32>,
  pub reduce_boxes_in_lowest_layer: bool,
  /// 非空时按层覆盖 `ceil(input / stride)` 计算出的特征图尺寸
  pub feature_map_width: Vec<u32>,
  pub feature_map_height: Vec<u32>,
}

impl Default for AnchorOptions {
  fn default() -> Self {
    // 手掌检测模型 (192x192) 的锚框配置
    Self {
      num_layers: 4,
      strides: vec![8, 16, 16, 16],
      min_scale: 0.148_437_5,
      max_scale: 0.75,
      input_width: 192,
      input_height: 192,
      anchor_offset_x: 0.5,
      anchor_offset_y: 0.5,
      aspect_ratios: vec![1.0],
      fixed_anchor_size: true,
      interpolated_scale_aspect_ratio: Some(1.0),
      reduce_boxes_in_lowest_layer: false,
      feature_map_width: Vec::new(),
      feature_map_height: Vec::new(),
    }
  }
}

impl AnchorOptions {
  pub fn validate(&self) -> Result<(), AnchorError> {
    if self.strides.len() != self.num_layers {
      error!(
        "锚框配置错误: 层数 {} 与步长数量 {} 不一致",
        self.num_layers,
        self.strides.len()
      );
      return Err(AnchorError::StrideCountMismatch {
        num_layers: self.num_layers,
        num_strides: self.strides.len(),
      });
    }
    if let Some(layer) = self.strides.iter().position(|&s| s == 0) {
      return Err(AnchorError::ZeroStride(layer));
    }
    if self.input_width == 0 || self.input_height == 0 {
      return Err(AnchorError::ZeroInputSize);
    }
    if self.aspect_ratios.is_empty() && self.interpolated_scale_aspect_ratio.is_none() {
      return Err(AnchorError::NoAspectRatio);
    }
    if self.feature_map_width.is_empty() != self.feature_map_height.is_empty() {
      error!("锚框配置错误: 特征图宽高只配置了其中一项");
      return Err(AnchorError::PartialFeatureMap);
    }
    for sizes in [&self.feature_map_width, &self.feature_map_height] {
      if !sizes.is_empty() && sizes.len() != self.num_layers {
        return Err(AnchorError::FeatureMapCountMismatch {
          expected: self.num_layers,
          actual: sizes.len(),
        });
      }
    }
    Ok(())
  }

  /// 第 `layer` 层特征图的 (宽, 高)
  fn feature_map_size(&self, layer: usize) -> (u32, u32) {
    if !self.feature_map_width.is_empty() && !self.feature_map_height.is_empty() {
      return (self.feature_map_width[layer], self.feature_map_height[layer]);
    }
    let stride = self.strides[layer];
    (
      self.input_width.div_ceil(stride),
      self.input_height.div_ceil(stride),
    )
  }

  /// 按层收集每个网格上的锚框形状 (宽, 高)，步长相同的相邻层共用一个网格
  fn layer_groups(&self) -> Vec<(usize, Vec<(f32, f32)>)> {
    let num_strides = self.strides.len();
    let mut groups = Vec::new();
    let mut layer_id = 0;

    while layer_id < num_strides {
      let mut shapes = Vec::new();
      let mut last_same_stride = layer_id;

      while last_same_stride < num_strides
        && self.strides[last_same_stride] == self.strides[layer_id]
      {
        let scale = calculate_scale(self.min_scale, self.max_scale, last_same_stride, num_strides);
        if last_same_stride == 0 && self.reduce_boxes_in_lowest_layer {
          shapes.push(anchor_shape(0.1, 1.0));
          shapes.push(anchor_shape(scale, 2.0));
          shapes.push(anchor_shape(scale, 0.5));
        } else {
          for &ratio in &self.aspect_ratios {
            shapes.push(anchor_shape(scale, ratio));
          }
          if let Some(ratio) = self.interpolated_scale_aspect_ratio {
            let scale_next = if last_same_stride + 1 == num_strides {
              1.0
            } else {
              calculate_scale(
                self.min_scale,
                self.max_scale,
                last_same_stride + 1,
                num_strides,
              )
            };
            shapes.push(anchor_shape((scale * scale_next).sqrt(), ratio));
          }
        }
        last_same_stride += 1;
      }

      groups.push((layer_id, shapes));
      layer_id = last_same_stride;
    }

    groups
  }

  /// 不实际生成锚框，仅计算数量
  pub fn anchor_count(&self) -> usize {
    self
      .layer_groups()
      .iter()
      .map(|(layer, shapes)| {
        let (w, h) = self.feature_map_size(*layer);
        w as usize * h as usize * shapes.len()
      })
      .sum()
  }
}

fn calculate_scale(min_scale: f32, max_scale: f32, index: usize, count: usize) -> f32 {
  if count == 1 {
    (min_scale + max_scale) * 0.5
  } else {
    min_scale + (max_scale - min_scale) * index as f32 / (count - 1) as f32
  }
}

/// 由尺度和宽高比得到 (宽, 高)
fn anchor_shape(scale: f32, aspect_ratio: f32) -> (f32, f32) {
  let ratio_sqrt = aspect_ratio.sqrt();
  (scale * ratio_sqrt, scale / ratio_sqrt)
}

/// 生成锚框序列，顺序为 (层, 行, 列, 形状)，与网络输出行一一对应
pub fn generate_anchors(options: &AnchorOptions) -> Result<Vec<Anchor>, AnchorError> {
  options.validate()?;

  let mut anchors = Vec::with_capacity(options.anchor_count());
  for (layer, shapes) in options.layer_groups() {
    let (map_w, map_h) = options.feature_map_size(layer);
    for y in 0..map_h {
      for x in 0..map_w {
        let x_center = (x as f32 + options.anchor_offset_x) / map_w as f32;
        let y_center = (y as f32 + options.anchor_offset_y) / map_h as f32;
        for &(width, height) in &shapes {
          let (width, height) = if options.fixed_anchor_size {
            (1.0, 1.0)
          } else {
            (width, height)
          };
          anchors.push(Anchor {
            x_center,
            y_center,
            width,
            height,
          });
        }
      }
    }
  }

  debug!("生成锚框 {} 个", anchors.len());
  Ok(anchors)
}

/// 按配置只计算一次的锚框缓存，可在多个线程间只读共享
#[derive(Debug)]
pub struct AnchorCache {
  options: AnchorOptions,
  anchors: OnceLock<Arc<[Anchor]>>,
}

impl AnchorCache {
  pub fn new(options: AnchorOptions) -> Self {
    Self {
      options,
      anchors: OnceLock::new(),
    }
  }

  pub fn options(&self) -> &AnchorOptions {
    &self.options
  }

  pub fn get(&self) -> Result<Arc<[Anchor]>, AnchorError> {
    if let Some(anchors) = self.anchors.get() {
      return Ok(anchors.clone());
    }
    let generated: Arc<[Anchor]> = generate_anchors(&self.options)?.into();
    Ok(self.anchors.get_or_init(|| generated).clone())
  }
}
