// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/config.rs - 手掌检测配置
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

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::stage::{
  AnchorError, AnchorOptions, CropOptions, DecodeError, DecoderOptions, LabelOptions, NmsOptions,
  RectOptions, TransformOptions,
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("锚框配置错误: {0}")]
  Anchor(#[from] AnchorError),
  #[error("解码配置错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("锚框数量 {anchors} 与解码器 num_boxes={num_boxes} 不一致")]
  AnchorBoxMismatch { anchors: usize, num_boxes: usize },
  #[error("旋转向量需要 {required} 个关键点，解码器只输出 {num_keypoints} 个")]
  NotEnoughKeypoints { required: usize, num_keypoints: usize },
  #[error("NMS 阈值必须在 [0, 1] 内: {0}")]
  SuppressionThreshold(f32),
  #[error("最大手数必须大于 0")]
  ZeroHands,
  #[error("配置文件读取错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("配置文件解析错误: {0}")]
  Json(#[from] serde_json::Error),
}

/// 手掌检测后处理的完整配置，每个阶段一组参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandDetectorConfig {
  pub anchors: AnchorOptions,
  pub decoder: DecoderOptions,
  pub nms: NmsOptions,
  pub labels: LabelOptions,
  pub rects: RectOptions,
  pub transform: TransformOptions,
  /// 输出矩形的最大数量
  pub num_hands: usize,
  pub crop: Option<CropOptions>,
}

impl Default for HandDetectorConfig {
  fn default() -> Self {
    Self {
      anchors: AnchorOptions::default(),
      decoder: DecoderOptions::default(),
      nms: NmsOptions::default(),
      labels: LabelOptions::default(),
      rects: RectOptions::default(),
      transform: TransformOptions::default(),
      num_hands: 2,
      crop: None,
    }
  }
}

impl HandDetectorConfig {
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("读取配置文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Self::from_json_str(&content)
  }

  /// 构建前一次性检查所有阶段的配置
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.anchors.validate()?;
    self.decoder.validate()?;

    let anchors = self.anchors.anchor_count();
    if anchors != self.decoder.num_boxes {
      error!(
        "锚框数量 {} 与解码器 num_boxes={} 不一致",
        anchors, self.decoder.num_boxes
      );
      return Err(ConfigError::AnchorBoxMismatch {
        anchors,
        num_boxes: self.decoder.num_boxes,
      });
    }

    let required = self.rects.required_keypoints();
    if required > self.decoder.num_keypoints {
      return Err(ConfigError::NotEnoughKeypoints {
        required,
        num_keypoints: self.decoder.num_keypoints,
      });
    }

    let threshold = self.nms.min_suppression_threshold;
    if !(0.0..=1.0).contains(&threshold) {
      return Err(ConfigError::SuppressionThreshold(threshold));
    }

    if self.num_hands == 0 {
      return Err(ConfigError::ZeroHands);
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn palm_preset_is_valid() {
    HandDetectorConfig::default()
      .validate()
      .expect("palm preset validates");
  }

  #[test]
  fn partial_json_fills_defaults() {
    let config = HandDetectorConfig::from_json_str(
      r#"{"num_hands": 1, "nms": {"algorithm": "STANDARD"}, "decoder": {"min_score_thresh": 0.7}}"#,
    )
    .expect("valid json");
    assert_eq!(config.num_hands, 1);
    assert_eq!(config.nms.algorithm, crate::stage::NmsAlgorithm::Standard);
    assert_eq!(
      config.nms.overlap_type,
      crate::stage::OverlapType::IntersectionOverUnion
    );
    assert_eq!(config.decoder.min_score_thresh, 0.7);
    assert_eq!(config.decoder.num_boxes, 2016);
    config.validate().expect("still valid");
  }

  #[test]
  fn anchor_and_box_count_must_agree() {
    let mut config = HandDetectorConfig::default();
    config.decoder.num_boxes = 2000;
    assert!(matches!(
      config.validate(),
      Err(ConfigError::AnchorBoxMismatch {
        anchors: 2016,
        num_boxes: 2000
      })
    ));
  }

  #[test]
  fn multi_class_decoder_is_rejected() {
    let mut config = HandDetectorConfig::default();
    config.decoder.num_classes = 2;
    assert!(matches!(
      config.validate(),
      Err(ConfigError::Decode(DecodeError::UnsupportedClassCount(2)))
    ));
  }

  #[test]
  fn rotation_keypoints_must_be_decoded() {
    let mut config = HandDetectorConfig::default();
    config.rects.rotation_vector_end_keypoint_index = 7;
    assert!(matches!(
      config.validate(),
      Err(ConfigError::NotEnoughKeypoints {
        required: 8,
        num_keypoints: 7
      })
    ));
  }

  #[test]
  fn zero_hands_is_rejected() {
    let config = HandDetectorConfig {
      num_hands: 0,
      ..HandDetectorConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroHands)));
  }
}
